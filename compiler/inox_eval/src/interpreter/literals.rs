//! Scalar literals and interpolated path, URL and host expressions.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use inox_core::errors::{self, EvalError};
use inox_core::pattern::StringPattern;
use inox_core::quantity;
use inox_core::value::{FloatRange, IntRange, Port, QuantityRange, RuneRange};
use inox_core::{EvalResult, Pattern, Value};
use inox_ir::{NodeId, NodeKind};

use super::Interpreter;

pub(super) fn port(number: u16, scheme: Option<&str>) -> Value {
    Value::Port(Port {
        number,
        scheme: scheme.map(Arc::from),
    })
}

pub(super) fn quantity(values: &[f64], units: &[String]) -> EvalResult {
    Ok(quantity::evaluate(values, units)?)
}

pub(super) fn rate(quantity: &Value, div_unit: &str) -> EvalResult {
    Ok(quantity::evaluate_rate(quantity, div_unit)?)
}

pub(super) fn date(year: i32, month: u32, day: u32) -> EvalResult {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(Value::Date)
        .ok_or_else(|| errors::invalid_argument(format!("invalid date {year}-{month}-{day}")))
}

pub(super) fn datetime(text: &str) -> EvalResult {
    DateTime::parse_from_rfc3339(text)
        .map(Value::DateTime)
        .map_err(|error| errors::invalid_argument(format!("invalid datetime {text}: {error}")))
}

pub(super) fn regex(regex: &str) -> EvalResult {
    Ok(Value::pattern(Pattern::string(StringPattern::from_regex(regex)?)))
}

pub(super) fn int_range(lower: i64, upper: Option<i64>) -> Value {
    Value::IntRange(match upper {
        Some(upper) => IntRange::new(lower, upper),
        None => IntRange::from_start(lower),
    })
}

pub(super) fn float_range(lower: f64, upper: Option<f64>) -> Value {
    Value::FloatRange(FloatRange::new(lower, upper.unwrap_or(f64::MAX), true))
}

pub(super) fn rune_range(lower: char, upper: char) -> Value {
    Value::RuneRange(RuneRange::new(lower, upper))
}

/// Interpolated text must not escape the static part of a path or URL.
fn check_interpolation(text: &str) -> Result<(), EvalError> {
    if text.split('/').any(|segment| segment == "..") {
        return Err(errors::invalid_argument(format!(
            "interpolation '{text}' contains a '..' segment"
        )));
    }
    if text.contains(['?', '#']) {
        return Err(errors::invalid_argument(format!(
            "interpolation '{text}' contains a query or fragment delimiter"
        )));
    }
    Ok(())
}

impl Interpreter {
    pub(super) fn eval_quantity_range(&mut self, lower: NodeId, upper: Option<NodeId>) -> EvalResult {
        let start = self.eval(lower)?;
        let end = upper.map(|upper| self.eval(upper)).transpose()?;
        Ok(Value::quantity_range(QuantityRange::new(start, end, true)))
    }

    /// Static slices and interpolated values, concatenated.
    fn interpolate(&mut self, slices: &[NodeId]) -> Result<String, EvalError> {
        let ast = Arc::clone(&self.ast);
        let mut text = String::new();
        for slice in slices {
            match ast.kind(*slice) {
                NodeKind::PathSlice(s) | NodeKind::UrlQueryParameterValueSlice(s) => {
                    text.push_str(s);
                }
                _ => {
                    let value = self.eval(*slice)?;
                    let interpolated = match &value {
                        Value::Int(n) => n.raw().to_string(),
                        other => other
                            .as_str()
                            .ok_or_else(|| errors::type_mismatch("string-like value", other.type_name()))?
                            .to_string(),
                    };
                    check_interpolation(&interpolated)?;
                    text.push_str(&interpolated);
                }
            }
        }
        Ok(text)
    }

    pub(super) fn eval_path_expression(&mut self, slices: &[NodeId]) -> EvalResult {
        let path = self.interpolate(slices)?;
        Ok(Value::path(path))
    }

    pub(super) fn eval_host_expression(&mut self, scheme: &str, host: NodeId) -> EvalResult {
        let host = self.eval(host)?;
        let host = host
            .as_str()
            .ok_or_else(|| errors::type_mismatch("string", host.type_name()))?;
        Ok(Value::host(format!("{scheme}://{host}")))
    }

    /// Host, interpolated path and query; query values are percent-encoded.
    pub(super) fn eval_url_expression(
        &mut self,
        host_part: NodeId,
        path: &[NodeId],
        query: &[NodeId],
    ) -> EvalResult {
        let host = self.eval(host_part)?;
        let mut href = match &host {
            Value::Host(h) | Value::Url(h) => h.trim_end_matches('/').to_string(),
            other => return Err(errors::type_mismatch("host", other.type_name())),
        };
        href.push_str(&self.interpolate(path)?);

        let ast = Arc::clone(&self.ast);
        let mut parameters = Vec::with_capacity(query.len());
        for parameter in query {
            let NodeKind::UrlQueryParameter { name, value } = ast.kind(*parameter) else {
                continue;
            };
            let mut text = String::new();
            for slice in value {
                match ast.kind(*slice) {
                    NodeKind::UrlQueryParameterValueSlice(s) => text.push_str(s),
                    _ => {
                        let value = self.eval(*slice)?;
                        text.push_str(&value.to_text());
                    }
                }
            }
            let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
            parameters.push(format!("{name}={encoded}"));
        }
        if !parameters.is_empty() {
            href.push('?');
            href.push_str(&parameters.join("&"));
        }

        url::Url::parse(&href)
            .map_err(|error| errors::invalid_argument(format!("invalid URL {href}: {error}")))?;
        Ok(Value::url(href))
    }
}
