//! Operators appearing in binary, unary and assignment nodes.

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,

    // Equality and identity
    Equal,
    NotEqual,
    Is,
    IsNot,

    // Membership
    In,
    NotIn,
    Keyof,
    Urlof,
    Substrof,

    // Ranges
    Range,
    ExclEndRange,

    // Logical
    And,
    Or,

    // Patterns
    Match,
    NotMatch,
    SetDifference,

    // Other
    NilCoalescing,
    PairComma,
}

impl BinaryOp {
    /// Source-level spelling, used in error messages.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Is => "is",
            Self::IsNot => "is-not",
            Self::In => "in",
            Self::NotIn => "not-in",
            Self::Keyof => "keyof",
            Self::Urlof => "urlof",
            Self::Substrof => "substrof",
            Self::Range => "..",
            Self::ExclEndRange => "..<",
            Self::And => "and",
            Self::Or => "or",
            Self::Match => "match",
            Self::NotMatch => "not-match",
            Self::SetDifference => "\\",
            Self::NilCoalescing => "??",
            Self::PairComma => ",",
        }
    }

    /// `true` for `<`, `<=`, `>` and `>=`.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::LessThan | Self::LessOrEqual | Self::GreaterThan | Self::GreaterOrEqual
        )
    }

    /// `true` for `+`, `-`, `*` and `/`.
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div)
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// `-x`
    NumberNegate,
    /// `!x`
    BoolNegate,
}

/// Assignment operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssignmentOp {
    Assign,
    PlusAssign,
    MinusAssign,
    MulAssign,
    DivAssign,
}

impl AssignmentOp {
    /// Arithmetic operator an augmented assignment combines with.
    pub const fn arithmetic(self) -> Option<BinaryOp> {
        match self {
            Self::Assign => None,
            Self::PlusAssign => Some(BinaryOp::Add),
            Self::MinusAssign => Some(BinaryOp::Sub),
            Self::MulAssign => Some(BinaryOp::Mul),
            Self::DivAssign => Some(BinaryOp::Div),
        }
    }

    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
        }
    }
}

/// Occurrence modifier of an element in a string pattern piece.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PatternQuantifier {
    ExactlyOne,
    AtLeastOne,
    ZeroOrMore,
    Optional,
    /// Exact repetition count, stored next to the quantifier.
    ExactCount,
}
