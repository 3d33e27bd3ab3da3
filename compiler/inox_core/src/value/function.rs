//! Callable values: user functions and host functions.

use std::fmt;
use std::sync::Arc;

use inox_ir::{NodeId, SharedAst};

use super::Value;
use crate::context::Context;
use crate::errors::{self, EvalError};

/// Function defined in Inox code.
///
/// The body is a `FunctionExpression` node of `ast`. Captured locals are the
/// values of the names listed in the expression's capture list at creation
/// time; captured globals are the globals the static checker found
/// referenced by the body.
#[derive(Clone)]
pub struct InoxFunction {
    pub ast: SharedAst,
    pub node: NodeId,
    pub name: Option<String>,
    pub captured_locals: Vec<(String, Value)>,
    pub captured_globals: Vec<(String, Value)>,
}

impl InoxFunction {
    pub fn new(ast: SharedAst, node: NodeId) -> Self {
        InoxFunction {
            ast,
            node,
            name: None,
            captured_locals: Vec::new(),
            captured_globals: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Debug for InoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InoxFunction")
            .field("node", &self.node)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Native implementation of a host function.
pub type HostFn = Arc<dyn Fn(&Context, &[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Declared parameter of a host function.
#[derive(Clone, Copy)]
pub struct HostParam {
    pub name: &'static str,
    pub type_name: &'static str,
    pub accepts: Option<fn(&Value) -> bool>,
    pub optional: bool,
}

impl HostParam {
    pub const fn any(name: &'static str) -> Self {
        HostParam {
            name,
            type_name: "any",
            accepts: None,
            optional: false,
        }
    }

    pub const fn typed(name: &'static str, type_name: &'static str, accepts: fn(&Value) -> bool) -> Self {
        HostParam {
            name,
            type_name,
            accepts: Some(accepts),
            optional: false,
        }
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Function implemented by the host.
///
/// With a declared signature, arguments are adapted before the call: option
/// arguments (`--name=value`) bind parameters by name, positional arguments
/// fill the remaining parameters in order, and each argument is checked
/// against its parameter. A fallible function reports its failures as an
/// error value instead of unwinding unless it is called with `must`.
#[derive(Clone)]
pub struct HostFunction {
    pub name: String,
    pub params: Option<Vec<HostParam>>,
    pub variadic: bool,
    pub fallible: bool,
    func: HostFn,
}

impl HostFunction {
    /// Function without a declared signature.
    pub fn new(name: impl Into<String>, func: HostFn) -> Self {
        HostFunction {
            name: name.into(),
            params: None,
            variadic: false,
            fallible: false,
            func,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<HostParam>) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    #[must_use]
    pub fn fallible(mut self) -> Self {
        self.fallible = true;
        self
    }

    /// Bind `args` to the declared parameters.
    pub fn adapt_arguments(&self, args: Vec<Value>) -> Result<Vec<Value>, EvalError> {
        let Some(params) = &self.params else {
            return Ok(args);
        };

        let mut bound: Vec<Option<Value>> = vec![None; params.len()];
        let mut positional = Vec::new();
        for arg in args {
            if let Value::Option(option) = &arg {
                if let Some(index) = params.iter().position(|p| p.name == option.name) {
                    if bound[index].is_some() {
                        return Err(errors::argument_given_twice(&option.name));
                    }
                    bound[index] = Some(option.value.clone());
                    continue;
                }
            }
            positional.push(arg);
        }

        let mut extra = Vec::new();
        let mut positional = positional.into_iter();
        for slot in &mut bound {
            if slot.is_none() {
                match positional.next() {
                    Some(arg) => *slot = Some(arg),
                    None => break,
                }
            }
        }
        extra.extend(positional);
        if !extra.is_empty() && !self.variadic {
            return Err(errors::invalid_argument(format!(
                "too many arguments for {}: expected at most {}",
                self.name,
                params.len()
            )));
        }

        let mut adapted = Vec::with_capacity(params.len() + extra.len());
        for (param, slot) in params.iter().zip(bound) {
            match slot {
                Some(value) => {
                    if let Some(accepts) = param.accepts {
                        if !accepts(&value) {
                            return Err(errors::type_mismatch(param.type_name, value.type_name()));
                        }
                    }
                    adapted.push(value);
                }
                None if param.optional => adapted.push(Value::Nil),
                None => return Err(errors::missing_argument(param.name)),
            }
        }
        adapted.extend(extra);
        Ok(adapted)
    }

    /// Adapt the arguments and run the function.
    pub fn call(&self, ctx: &Context, args: Vec<Value>) -> Result<Value, EvalError> {
        let args = self.adapt_arguments(args)?;
        (self.func)(ctx, &args)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .field("fallible", &self.fallible)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::ContextConfig;
    use crate::errors::EvalErrorKind;

    fn echo() -> HostFunction {
        HostFunction::new("echo", Arc::new(|_, args| Ok(Value::list(args.to_vec())))).with_params(
            vec![
                HostParam::typed("text", "string", |v| matches!(v, Value::Str(_))),
                HostParam::any("times").optional(),
            ],
        )
    }

    #[test]
    fn options_bind_by_name() {
        let adapted = echo()
            .adapt_arguments(vec![Value::option("times", Value::int(2)), Value::str("a")])
            .unwrap();
        assert_eq!(adapted.len(), 2);
        assert_eq!(adapted[0].as_str(), Some("a"));
        assert_eq!(adapted[1].as_int(), Some(2));
    }

    #[test]
    fn option_given_twice() {
        let err = echo()
            .adapt_arguments(vec![
                Value::option("times", Value::int(2)),
                Value::option("times", Value::int(3)),
                Value::str("a"),
            ])
            .unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::ArgumentGivenTwice { .. }));
    }

    #[test]
    fn missing_and_mistyped_arguments() {
        let err = echo().adapt_arguments(vec![]).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::MissingArgument { .. }));

        let err = echo().adapt_arguments(vec![Value::int(1)]).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn optional_parameters_default_to_nil() {
        let ctx = Context::new_root(ContextConfig::default());
        let result = echo().call(&ctx, vec![Value::str("a")]).unwrap();
        let Value::List(list) = result else {
            panic!("expected a list")
        };
        assert!(list.at(1).unwrap().is_nil());
    }

    #[test]
    fn too_many_arguments_unless_variadic() {
        let f = HostFunction::new("f", Arc::new(|_, _| Ok(Value::Nil)))
            .with_params(vec![HostParam::any("a")]);
        assert!(f.adapt_arguments(vec![Value::Nil, Value::Nil]).is_err());
        let adapted = f
            .variadic()
            .adapt_arguments(vec![Value::Nil, Value::Nil])
            .unwrap();
        assert_eq!(adapted.len(), 2);
    }
}
