//! Execution of GraphQL requests against the restricted gateway schema.
//!
//! [`Engine::build`] turns a [`schema_composition::RestrictedSchema`] into an executable
//! `async-graphql` schema. Root fields of the upstream service are delegated to it through
//! [`UpstreamResolver`], fields of the schema extension are resolved locally, for example by the
//! [`RandomItemResolver`].

mod engine;
mod error;
mod resolver;
mod selection;
mod value;

pub use engine::Engine;
pub use error::{EngineError, ResolverError};
pub use resolver::{
    IndexSource, RandomItemQueries, RandomItemResolver, Resolver, ResolverRequest, SharedResolver, ThreadRngIndex,
    UpstreamResolver,
};
pub use selection::{Selection, SelectionItem};
