//! Schema composition for the gateway.
//!
//! The remote schema is described by a [`SchemaDescriptor`], obtained through introspection.
//! [`compose`] merges a locally declared [`SchemaExtension`] into its query root and binds every
//! root field either to the remote service or to a local resolver. [`restrict`] then hides every
//! root field a [`FieldWhitelist`] does not allow.
//!
//! All three steps are pure functions over immutable values.

mod compose;
mod descriptor;
mod error;
mod extension;
mod render_sdl;
mod type_ref;
mod visibility;

pub use compose::{compose, ComposedSchema, FieldBinding, ResolverMap};
pub use descriptor::{
    Deprecation, EnumType, EnumValueDefinition, FieldDefinition, InputObjectType, InputValueDefinition, InterfaceType,
    ObjectType, OperationType, SchemaDescriptor, TypeDefinition, TypeKind, UnionType, BUILTIN_SCALARS,
};
pub use error::{CompositionError, DescriptorError, ExtensionError, VisibilityError};
pub use extension::SchemaExtension;
pub use type_ref::TypeRef;
pub use visibility::{restrict, FieldWhitelist, RestrictedSchema};
