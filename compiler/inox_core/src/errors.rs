//! Evaluation errors.
//!
//! # Structured Error Categories
//!
//! [`EvalErrorKind`] enumerates every failure the runtime reports. Factory
//! functions (e.g. [`division_by_zero`]) are the public way to build errors:
//! they fill both `kind` and `message`.
//!
//! # Source positions
//!
//! Errors leave the evaluator through the chunk root, which attaches a
//! [`SourcePositionStack`]: the position of the failing node, preceded by the
//! inclusion-import statements that led to it. The `Display` impl renders the
//! stack one position per line, followed by the message.

use std::fmt;

use inox_ir::{NodeId, SourcePosition};

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalErrorKind {
    // Names
    Undeclared {
        what: &'static str,
        name: String,
    },

    // Permissions and limits
    PermissionDenied {
        permission: String,
    },
    LimitReached {
        name: String,
    },

    // Comparison and arithmetic
    NotComparable {
        left: String,
        right: String,
    },
    ArithmeticOverflow {
        operation: String,
    },
    DivisionByZero,
    FloatSpecialOperand,
    FloatSpecialResult,

    // Arguments
    InvalidArgument {
        message: String,
    },
    MissingArgument {
        name: String,
    },
    ArgumentGivenTwice {
        name: String,
    },

    // Capabilities
    TypeMismatch {
        expected: String,
        got: String,
    },
    NotCallable {
        type_name: String,
    },
    PropertyNotFound {
        name: String,
    },
    IndexOutOfBounds {
        index: i64,
        len: usize,
    },
    CannotSetProp {
        name: String,
        type_name: String,
    },

    // Checks
    AssertionFailed {
        message: String,
    },
    TypeCheckFailed {
        value: String,
    },
    StaticCheck {
        errors: Vec<String>,
    },

    // Concurrency
    Cancelled,
    StreamEnded,
    WaitTimeout,
    StackOverflow {
        depth: usize,
    },

    // String patterns
    ParseFailure {
        message: String,
    },
    TestedStringTooLarge,

    // Quantities
    InvalidQuantity {
        message: String,
    },
    NegQuantityNotSupported,
    QuantityTooLarge,

    /// Error reported by a host function.
    Host {
        message: String,
    },

    /// Catch-all for errors without a dedicated category.
    Custom {
        message: String,
    },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undeclared { what, name } => write!(f, "{what} '{name}' is not declared"),
            Self::PermissionDenied { permission } => {
                write!(f, "not allowed, missing permission: {permission}")
            }
            Self::LimitReached { name } => write!(f, "limit '{name}' reached"),
            Self::NotComparable { left, right } => {
                write!(f, "values are not comparable: {left} and {right}")
            }
            Self::ArithmeticOverflow { operation } => {
                write!(f, "integer overflow in {operation}")
            }
            Self::DivisionByZero => write!(f, "integer division by zero"),
            Self::FloatSpecialOperand => {
                write!(f, "NaN or (+|-)infinity operand in floating point operation")
            }
            Self::FloatSpecialResult => {
                write!(f, "NaN or (+|-)infinity result in floating point operation")
            }
            Self::InvalidArgument { message } => write!(f, "invalid argument: {message}"),
            Self::MissingArgument { name } => write!(f, "missing argument: {name}"),
            Self::ArgumentGivenTwice { name } => write!(f, "argument {name} given twice"),
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::NotCallable { type_name } => write!(f, "{type_name} is not callable"),
            Self::PropertyNotFound { name } => write!(f, "property .{name} does not exist"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds (length {len})")
            }
            Self::CannotSetProp { name, type_name } => {
                write!(f, "cannot set property .{name} of a(n) {type_name}")
            }
            Self::AssertionFailed { message } => write!(f, "assertion is false: {message}"),
            Self::TypeCheckFailed { value } => {
                write!(f, "runtime check failed: value {value} does not match the expected pattern")
            }
            Self::StaticCheck { errors } => {
                write!(f, "static check failed:")?;
                for error in errors {
                    write!(f, "\n{error}")?;
                }
                Ok(())
            }
            Self::Cancelled => write!(f, "context is done"),
            Self::StreamEnded => write!(f, "end of stream"),
            Self::WaitTimeout => write!(f, "timeout while waiting for the next stream element"),
            Self::StackOverflow { depth } => {
                write!(f, "maximum call depth exceeded (limit: {depth})")
            }
            Self::ParseFailure { message } => write!(f, "failed to parse string: {message}"),
            Self::TestedStringTooLarge => write!(f, "tested string is too large"),
            Self::InvalidQuantity { message } => write!(f, "invalid quantity: {message}"),
            Self::NegQuantityNotSupported => write!(f, "negative quantities are not supported"),
            Self::QuantityTooLarge => write!(f, "quantity is too large"),
            Self::Host { message } | Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Secondary information attached to an error.
#[derive(Clone, Debug)]
pub struct EvalNote {
    pub message: String,
    pub position: Option<SourcePosition>,
}

impl EvalNote {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }
}

/// Positions of an error, outermost inclusion first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourcePositionStack(Vec<SourcePosition>);

impl SourcePositionStack {
    pub fn new(positions: Vec<SourcePosition>) -> Self {
        Self(positions)
    }

    pub fn positions(&self) -> &[SourcePosition] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prepend the position of an enclosing inclusion statement.
    pub fn push_outer(&mut self, position: SourcePosition) {
        self.0.insert(0, position);
    }
}

impl fmt::Display for SourcePositionStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, position) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{position}:")?;
        }
        Ok(())
    }
}

/// Values observed while evaluating an assertion, keyed by node.
#[derive(Clone, Debug, Default)]
pub struct AssertionData {
    pub assertion: Option<NodeId>,
    pub intermediary_values: Vec<(NodeId, Value)>,
}

impl AssertionData {
    pub fn value_of(&self, node: NodeId) -> Option<&Value> {
        self.intermediary_values
            .iter()
            .find(|(id, _)| *id == node)
            .map(|(_, v)| v)
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable message, equal to `kind.to_string()` for factory errors.
    pub message: String,
    /// Where the error happened, including the inclusion chain.
    pub positions: SourcePositionStack,
    pub notes: Vec<EvalNote>,
    /// Intermediary values recorded by a failed assertion.
    pub assertion_data: Option<Box<AssertionData>>,
    /// Set for assertion failures inside test suites and test cases.
    pub is_test_assertion: bool,
}

impl EvalError {
    /// Error with a free-form message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(EvalErrorKind::Custom { message })
    }

    /// Error from a structured kind; the message comes from `Display`.
    pub fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            positions: SourcePositionStack::default(),
            notes: Vec::new(),
            assertion_data: None,
            is_test_assertion: false,
        }
    }

    /// Attach the position stack if none is set yet.
    #[must_use]
    pub fn with_positions(mut self, positions: SourcePositionStack) -> Self {
        if self.positions.is_empty() {
            self.positions = positions;
        }
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }

    pub fn has_position(&self) -> bool {
        !self.positions.is_empty()
    }

    /// Message prefixed by the rendered position stack.
    pub fn located_message(&self) -> String {
        self.to_string()
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind, EvalErrorKind::Cancelled)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positions.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} {}", self.positions, self.message)
        }
    }
}

impl std::error::Error for EvalError {}

// Names

#[cold]
pub fn undeclared_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Undeclared {
        what: "variable",
        name: name.to_string(),
    })
}

#[cold]
pub fn undeclared_pattern(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Undeclared {
        what: "pattern",
        name: name.to_string(),
    })
}

#[cold]
pub fn undeclared_pattern_namespace(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Undeclared {
        what: "pattern namespace",
        name: name.to_string(),
    })
}

// Permissions

#[cold]
pub fn permission_denied(permission: &impl fmt::Display) -> EvalError {
    EvalError::from_kind(EvalErrorKind::PermissionDenied {
        permission: permission.to_string(),
    })
}

#[cold]
pub fn limit_reached(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::LimitReached {
        name: name.to_string(),
    })
}

// Arithmetic

#[cold]
pub fn not_comparable(left: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotComparable {
        left: left.to_string(),
        right: right.to_string(),
    })
}

#[cold]
pub fn arithmetic_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArithmeticOverflow {
        operation: operation.to_string(),
    })
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn float_special_operand() -> EvalError {
    EvalError::from_kind(EvalErrorKind::FloatSpecialOperand)
}

#[cold]
pub fn float_special_result() -> EvalError {
    EvalError::from_kind(EvalErrorKind::FloatSpecialResult)
}

// Arguments

#[cold]
pub fn invalid_argument(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidArgument {
        message: message.into(),
    })
}

#[cold]
pub fn missing_argument(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingArgument {
        name: name.to_string(),
    })
}

#[cold]
pub fn argument_given_twice(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArgumentGivenTwice {
        name: name.to_string(),
    })
}

// Capabilities

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn unresolved_extension_member(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Undeclared {
        what: "extension member",
        name: name.to_string(),
    })
}

#[cold]
pub fn property_not_found(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::PropertyNotFound {
        name: name.to_string(),
    })
}

#[cold]
pub fn index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index, len })
}

#[cold]
pub fn cannot_set_prop(name: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CannotSetProp {
        name: name.to_string(),
        type_name: type_name.to_string(),
    })
}

// Checks

#[cold]
pub fn assertion_failed(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::AssertionFailed {
        message: message.into(),
    })
}

#[cold]
pub fn type_check_failed(value: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeCheckFailed {
        value: value.to_string(),
    })
}

#[cold]
pub fn static_check_failed(errors: Vec<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StaticCheck { errors })
}

// Concurrency

#[cold]
pub fn cancelled() -> EvalError {
    EvalError::from_kind(EvalErrorKind::Cancelled)
}

#[cold]
pub fn stream_ended() -> EvalError {
    EvalError::from_kind(EvalErrorKind::StreamEnded)
}

#[cold]
pub fn wait_timeout() -> EvalError {
    EvalError::from_kind(EvalErrorKind::WaitTimeout)
}

#[cold]
pub fn stack_overflow(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth })
}

// Patterns and quantities

#[cold]
pub fn parse_failure(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ParseFailure {
        message: message.into(),
    })
}

#[cold]
pub fn tested_string_too_large() -> EvalError {
    EvalError::from_kind(EvalErrorKind::TestedStringTooLarge)
}

#[cold]
pub fn invalid_quantity(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidQuantity {
        message: message.into(),
    })
}

#[cold]
pub fn neg_quantity_not_supported() -> EvalError {
    EvalError::from_kind(EvalErrorKind::NegQuantityNotSupported)
}

#[cold]
pub fn quantity_too_large() -> EvalError {
    EvalError::from_kind(EvalErrorKind::QuantityTooLarge)
}

#[cold]
pub fn host_error(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Host {
        message: message.into(),
    })
}

#[cfg(test)]
mod tests;
