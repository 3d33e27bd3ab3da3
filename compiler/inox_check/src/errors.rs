//! Static check errors.
//!
//! Every rule violation is a [`CheckErrorKind`] located by a position stack:
//! the inclusion-import statements that led to the offending chunk, then the
//! offending node. [`StaticCheckError`] aggregates them and converts into an
//! `EvalError` of kind `StaticCheck` so hosts see a single failure.

use std::fmt;

use inox_core::errors::{self as eval_errors, EvalError, SourcePositionStack};

/// Maximum length in bytes of a variable, property or pattern name.
pub const MAX_NAME_BYTE_LEN: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CheckErrorKind {
    // Names
    #[error("name '{0}' is too long")]
    NameTooLong(String),
    #[error("variable '{0}' is not declared")]
    VariableNotDeclared(String),
    #[error("local variable '{0}' is not declared")]
    LocalVariableNotDeclared(String),
    #[error("global variable '{0}' is not declared")]
    GlobalVariableNotDeclared(String),
    #[error("pattern %{0} is not declared")]
    PatternNotDeclared(String),
    #[error("pattern namespace %{0}. is not declared")]
    PatternNamespaceNotDeclared(String),

    // Declarations
    #[error("invalid constant declaration: '{0}' is already declared")]
    ConstantAlreadyDeclared(String),
    #[error("invalid local variable declaration: '{0}' is already declared")]
    LocalAlreadyDeclared(String),
    #[error("invalid global variable declaration: '{0}' is already declared")]
    GlobalAlreadyDeclared(String),
    #[error("cannot shadow global variable '{0}', use another name instead")]
    CannotShadowGlobal(String),
    #[error("cannot shadow local variable '{0}', use another name instead")]
    CannotShadowLocal(String),
    #[error("cannot shadow variable '{0}', use another name instead")]
    CannotShadowVariable(String),
    #[error("a parameter cannot shadow global variable '{0}', use another name instead")]
    ParameterShadowsGlobal(String),
    #[error("parameter '{0}' is already declared")]
    ParameterAlreadyDeclared(String),
    #[error("invalid function declaration: {0} is already declared")]
    FunctionAlreadyDeclared(String),
    #[error("invalid function declaration: a global variable named '{0}' exists")]
    FunctionNameIsGlobal(String),
    #[error(
        "invalid function declaration: a function declaration should be a top level statement in a module (embedded or not)"
    )]
    MisplacedFunctionDeclaration,
    #[error("cannot capture global variable '{0}': globals are captured automatically")]
    CannotCaptureGlobal(String),
    #[error("pattern %{0} is already declared")]
    PatternAlreadyDeclared(String),
    #[error("pattern namespace %{0}. is already declared")]
    PatternNamespaceAlreadyDeclared(String),

    // Assignments
    #[error("invalid assignment: anonymous variable '$' cannot be assigned")]
    AnonymousVariableAssigned,
    #[error("invalid assignment: '{0}' is a declared function's name")]
    FunctionNameAssigned(String),
    #[error("invalid global variable assignment: '{0}' is a constant")]
    ConstantAssigned(String),
    #[error("invalid global variable assignment: '{0}' does not exist")]
    AssignedGlobalDoesNotExist(String),
    #[error("invalid variable assignment: '{0}' does not exist")]
    AssignedVariableDoesNotExist(String),
    #[error("invalid member assignment: cannot modify metaproperty '{0}'")]
    MetapropertyAssigned(String),
    #[error("invalid assignment: '=' is the only supported assignment operator for slice expressions")]
    SliceAugmentedAssignment,

    // Placement
    #[error(
        "break statements are only allowed in the body of a 'for' or 'walk' statement, through if, switch and match statements"
    )]
    MisplacedBreak,
    #[error("continue statements are only allowed in the body of a 'for' or 'walk' statement")]
    MisplacedContinue,
    #[error("prune statements are only allowed in 'walk' statements")]
    MisplacedPrune,
    #[error("yield statements are only allowed in embedded modules and in the body of 'for' expressions")]
    MisplacedYield,
    #[error(
        "'self' is only accessible within object methods, metaproperty initialization blocks and lifetime jobs attached to objects"
    )]
    MisplacedSelf,
    #[error("sendval expressions are only allowed where 'self' is accessible")]
    MisplacedSendval,
    #[error("object does not have a property named '{0}'")]
    SelfPropertyNotFound(String),
    #[error("misplaced compute expression: compute expressions are only allowed on the right side of a dynamic mapping entry")]
    MisplacedCompute,
    #[error(
        "misplaced runtime typecheck expression: for now runtime typechecks are only supported as arguments in function calls"
    )]
    MisplacedRuntimeTypeCheck,
    #[error("following node type is not allowed in assertion: {0}")]
    NotAllowedInAssertion(&'static str),
    #[error("misplaced pattern definition: it should be located at the top level")]
    MisplacedPatternDefinition,
    #[error("misplaced pattern namespace definition: it should be located at the top level")]
    MisplacedPatternNamespaceDefinition,
    #[error("misplaced extend statement: it should be located at the top level")]
    MisplacedExtend,
    #[error("misplaced global variable declaration(s): declarations are only allowed at the top level")]
    MisplacedGlobalDeclaration,
    #[error("misplaced inclusion import statement: it should be located at the module's top level")]
    MisplacedInclusion,
    #[error("no chunk is included by this inclusion import statement")]
    MissingIncludedChunk,
    #[error("lifetime jobs without a subject pattern should be implicit-key properties of an object literal")]
    MissingLifetimeJobSubject,
    #[error("reception handler expressions should be implicit-key properties of an object literal")]
    MisplacedReceptionHandler,
    #[error("optional dynamic member expressions are not supported yet")]
    OptionalDynamicMember,

    // Literals
    #[error("duplicate key '{0}'")]
    DuplicateKey(String),
    #[error("duplicate dictionary key '{0}'")]
    DuplicateDictionaryKey(String),
    #[error("{literal} literal explicitly declares the property '{key}' that already has an implicit key")]
    ExplicitKeyAliasesImplicit { literal: &'static str, key: String },
    #[error(
        "object-like literals cannot have metaproperty keys, metaproperty keys have a (single) starting underscore '_' and a (single) trailing underscore"
    )]
    MetapropertyKey,
    #[error("type annotation of properties is not allowed")]
    PropertyTypeAnnotation,
    #[error("the lower bound of an integer range literal should be smaller than the upper bound")]
    InvalidIntRange,
    #[error("non supported unit: {0}")]
    UnsupportedUnit(String),
    #[error("invalid quantity")]
    InvalidQuantity,
    #[error("{0}")]
    Quantity(String),
    #[error("invalid rate")]
    InvalidRate,
    #[error("invalid mapping entry key: only simple value literals and pattern identifiers are supported")]
    InvalidMappingKey,

    // Spawn
    #[error(
        "invalid spawn expression: only object literals with no spread elements nor implicit-key properties are supported for meta's value"
    )]
    InvalidSpawnMeta,
    #[error(
        "invalid spawn expression: the description of globals should be a key list literal or an object literal with no implicit-key properties nor spread elements"
    )]
    InvalidSpawnGlobals,
    #[error("cannot pass global variable '{0}' to lthread, '{0}' is not declared")]
    SpawnGlobalNotDeclared(String),

    // Manifest
    #[error("the manifest should be an object literal")]
    ManifestNotObject,
    #[error("elements (values without a key) are not allowed in the manifest object")]
    ManifestImplicitKey,
    #[error("objects & lists in the manifest cannot contain spread elements")]
    ManifestSpread,
    #[error("unknown section '{0}' of manifest")]
    UnknownManifestSection(String),
    #[error("the 'permissions' section of the manifest should be an object")]
    PermissionsNotObject,
    #[error("elements are not allowed in the 'permissions' section")]
    PermissionsImplicitKey,
    #[error("'{0}' is not a valid permission kind")]
    InvalidPermissionKind(String),
    #[error("invalid permission listing: invalid node {0}")]
    ForbiddenNodeInPermissions(&'static str),
    #[error("the 'limits' section of the manifest should be an object")]
    LimitsNotObject,
    #[error("invalid limits section: invalid node {0}")]
    ForbiddenNodeInLimits(&'static str),
    #[error("the 'env' section of the manifest should be an object pattern literal")]
    EnvNotObjectPattern,
    #[error("the 'env' section is not available in embedded module manifests")]
    EnvInEmbeddedModule,
    #[error("invalid env section: invalid node {0}")]
    ForbiddenNodeInEnv(&'static str),
    #[error("the 'parameters' section of the manifest should be an object literal")]
    ParametersNotObject,
    #[error("the 'parameters' section is not available in embedded module manifests")]
    ParametersInEmbeddedModule,
    #[error("the 'host_resolution' section of the manifest should be a dictionary with host keys")]
    HostResolutionNotDictionary,
    #[error("invalid host resolution section: invalid node {0}")]
    ForbiddenNodeInHostResolution(&'static str),
}

/// A located rule violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckError {
    pub kind: CheckErrorKind,
    /// Inclusion statements first, offending node last.
    pub positions: SourcePositionStack,
}

impl CheckError {
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positions.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} {}", self.positions, self.kind)
        }
    }
}

/// Failure of a static check.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StaticCheckError {
    /// One or more rules are violated; evaluation must not start.
    #[error("{}", render(.0))]
    Invalid(Vec<CheckError>),
    #[error("a static check starts at a chunk or an embedded module, not at a {0}")]
    InvalidRoot(&'static str),
}

impl StaticCheckError {
    pub fn errors(&self) -> &[CheckError] {
        match self {
            StaticCheckError::Invalid(errors) => errors,
            StaticCheckError::InvalidRoot(_) => &[],
        }
    }
}

fn render(errors: &[CheckError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<StaticCheckError> for EvalError {
    fn from(error: StaticCheckError) -> Self {
        match error {
            StaticCheckError::Invalid(errors) => {
                eval_errors::static_check_failed(errors.iter().map(ToString::to_string).collect())
            }
            StaticCheckError::InvalidRoot(_) => EvalError::new(error.to_string()),
        }
    }
}
