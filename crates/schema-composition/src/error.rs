use crate::OperationType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    #[error("could not parse the schema: {0}")]
    Syntax(String),
    #[error("the schema has no query type")]
    MissingQueryType,
    #[error("the {operation} root type `{name}` is not an object type")]
    InvalidRootType { operation: OperationType, name: String },
    #[error("the type `{0}` is defined more than once")]
    DuplicateType(String),
    #[error("extensions of `{0}` are not supported in a remote schema")]
    UnsupportedExtension(String),
    #[error("invalid type reference `{0}`")]
    InvalidTypeReference(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtensionError {
    #[error("could not parse the schema extension: {0}")]
    Syntax(String),
    /// Anything other than `extend type X { ... }`.
    #[error("only object type extensions are supported, found: {0}")]
    Unsupported(String),
    #[error("the schema extension must extend a single type, found `{0}` and `{1}`")]
    MultipleTargets(String, String),
    #[error("the schema extension declares no fields")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompositionError {
    #[error("the schema extension targets `{target}` but the query root is `{query_type}`")]
    InvalidExtensionTarget { target: String, query_type: String },
    #[error("the field `{type_name}.{field}` is already defined by the remote schema")]
    DuplicateField { type_name: String, field: String },
    #[error("the field `{field}` references the unknown type `{type_name}`")]
    UnknownType { field: String, type_name: String },
    #[error("the argument `{field}({argument})` must be an input type, `{type_name}` is not one")]
    InvalidArgumentType {
        field: String,
        argument: String,
        type_name: String,
    },
    #[error("the extension field `{0}` has no resolver")]
    UnboundExtensionField(String),
    #[error("a resolver was provided for `{0}` which the schema extension does not declare")]
    UnknownBinding(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VisibilityError {
    #[error("no field of the query root `{0}` is visible")]
    EmptyQueryRoot(String),
}
