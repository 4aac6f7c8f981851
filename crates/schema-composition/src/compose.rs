use std::collections::BTreeMap;

use crate::{error::CompositionError, render_sdl, FieldDefinition, OperationType, SchemaDescriptor, SchemaExtension};

/// Resolvers of the extension fields, keyed by field name.
pub type ResolverMap<R> = BTreeMap<String, R>;

/// How a root field of the composed schema gets its value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldBinding<R> {
    /// The field comes from the remote schema and is forwarded to it.
    Upstream,
    /// The field comes from the schema extension.
    Local(R),
}

/// The remote schema with the extension fields merged into its query root, and a binding for
/// every root field.
#[derive(Debug, Clone)]
pub struct ComposedSchema<R> {
    descriptor: SchemaDescriptor,
    bindings: BTreeMap<(OperationType, String), FieldBinding<R>>,
}

/// Merges the extension into the remote schema.
///
/// Every field of the extension must be bound to exactly one resolver and every resolver must
/// match a field of the extension.
pub fn compose<R>(
    remote: SchemaDescriptor,
    extension: &SchemaExtension,
    mut resolvers: ResolverMap<R>,
) -> Result<ComposedSchema<R>, CompositionError> {
    let mut descriptor = remote;

    if extension.target() != descriptor.query_type() {
        return Err(CompositionError::InvalidExtensionTarget {
            target: extension.target().to_owned(),
            query_type: descriptor.query_type().to_owned(),
        });
    }

    let mut bindings = BTreeMap::new();

    for operation in OperationType::ALL {
        let Some(root) = descriptor.root_type(operation) else {
            continue;
        };

        for field in &root.fields {
            bindings.insert((operation, field.name.clone()), FieldBinding::Upstream);
        }
    }

    for field in extension.fields() {
        let key = (OperationType::Query, field.name.clone());

        if bindings.contains_key(&key) {
            return Err(CompositionError::DuplicateField {
                type_name: descriptor.query_type().to_owned(),
                field: field.name.clone(),
            });
        }

        validate_field(&descriptor, field)?;

        let resolver = resolvers
            .remove(&field.name)
            .ok_or_else(|| CompositionError::UnboundExtensionField(field.name.clone()))?;

        bindings.insert(key, FieldBinding::Local(resolver));
    }

    if let Some(name) = resolvers.into_keys().next() {
        return Err(CompositionError::UnknownBinding(name));
    }

    if let Some(query) = descriptor.root_type_mut(OperationType::Query) {
        query.fields.extend(extension.fields().iter().cloned());
    }

    tracing::debug!(
        "composed schema with {} root fields, {} from the extension",
        bindings.len(),
        extension.fields().len()
    );

    Ok(ComposedSchema { descriptor, bindings })
}

fn validate_field(descriptor: &SchemaDescriptor, field: &FieldDefinition) -> Result<(), CompositionError> {
    let return_type = field.ty.named_type();

    match descriptor.get(return_type).map(|ty| &ty.kind) {
        Some(kind) if !kind.is_output() => {
            return Err(CompositionError::UnknownType {
                field: field.name.clone(),
                type_name: return_type.to_owned(),
            })
        }
        None if !descriptor.has_type(return_type) => {
            return Err(CompositionError::UnknownType {
                field: field.name.clone(),
                type_name: return_type.to_owned(),
            })
        }
        _ => {}
    }

    for argument in &field.arguments {
        let type_name = argument.ty.named_type();

        if !descriptor.has_type(type_name) {
            return Err(CompositionError::UnknownType {
                field: field.name.clone(),
                type_name: type_name.to_owned(),
            });
        }

        if descriptor.get(type_name).is_some_and(|ty| !ty.kind.is_input()) {
            return Err(CompositionError::InvalidArgumentType {
                field: field.name.clone(),
                argument: argument.name.clone(),
                type_name: type_name.to_owned(),
            });
        }
    }

    Ok(())
}

impl<R> ComposedSchema<R> {
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    pub fn binding(&self, operation: OperationType, field: &str) -> Option<&FieldBinding<R>> {
        self.bindings.get(&(operation, field.to_owned()))
    }

    /// The fields of a root operation type, empty if the schema has no such root.
    pub fn root_fields(&self, operation: OperationType) -> &[FieldDefinition] {
        self.descriptor
            .root_type(operation)
            .map(|root| root.fields.as_slice())
            .unwrap_or_default()
    }

    /// Renders the schema as SDL, root types first and the remaining types sorted by name.
    pub fn to_sdl(&self) -> String {
        render_sdl::render(&self.descriptor)
    }

    /// Removes the root fields rejected by the predicate, with their bindings.
    pub(crate) fn retain_root_fields(&mut self, mut keep: impl FnMut(OperationType, &str) -> bool) {
        for operation in OperationType::ALL {
            let Some(root) = self.descriptor.root_type_mut(operation) else {
                continue;
            };

            let mut removed = Vec::new();

            root.fields.retain(|field| {
                let kept = keep(operation, &field.name);

                if !kept {
                    removed.push(field.name.clone());
                }

                kept
            });

            for name in removed {
                self.bindings.remove(&(operation, name));
            }
        }
    }

    pub(crate) fn detach_empty_roots(&mut self) -> Vec<OperationType> {
        let empty: Vec<_> = [OperationType::Mutation, OperationType::Subscription]
            .into_iter()
            .filter(|operation| {
                self.descriptor
                    .root_type(*operation)
                    .is_some_and(|root| root.fields.is_empty())
            })
            .collect();

        for operation in &empty {
            self.descriptor.detach_root(*operation);
        }

        empty
    }

    pub(crate) fn query_root_is_empty(&self) -> bool {
        self.root_fields(OperationType::Query).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn remote() -> SchemaDescriptor {
        SchemaDescriptor::from_sdl(indoc! {r#"
            type Query {
              allItems: [Item!]!
              _allItemsMeta: _QueryMeta!
              Item(id: ID!): Item
            }

            type Mutation {
              deleteItem(id: ID!): Item
            }

            type Item {
              id: ID!
              title: String
            }

            type _QueryMeta {
              count: Int!
            }

            input ItemFilter {
              title: String
            }
        "#})
        .unwrap()
    }

    fn random_item() -> SchemaExtension {
        SchemaExtension::parse("extend type Query { randomItem: Item }").unwrap()
    }

    fn resolvers(names: &[&str]) -> ResolverMap<&'static str> {
        names.iter().map(|name| ((*name).to_owned(), "local")).collect()
    }

    #[test]
    fn extension_fields_are_added_and_bound() {
        let composed = compose(remote(), &random_item(), resolvers(&["randomItem"])).unwrap();

        let names: Vec<_> = composed
            .root_fields(OperationType::Query)
            .iter()
            .map(|field| field.name.as_str())
            .collect();

        assert_eq!(vec!["allItems", "_allItemsMeta", "Item", "randomItem"], names);
        assert_eq!(
            Some(&FieldBinding::Local("local")),
            composed.binding(OperationType::Query, "randomItem")
        );
        assert_eq!(
            Some(&FieldBinding::Upstream),
            composed.binding(OperationType::Query, "allItems")
        );
        assert_eq!(
            Some(&FieldBinding::Upstream),
            composed.binding(OperationType::Mutation, "deleteItem")
        );
        assert_eq!(None, composed.binding(OperationType::Mutation, "randomItem"));
    }

    #[test]
    fn duplicate_field() {
        let extension = SchemaExtension::parse("extend type Query { allItems: [Item!]! }").unwrap();
        let error = compose(remote(), &extension, resolvers(&["allItems"])).unwrap_err();

        assert_eq!(
            CompositionError::DuplicateField {
                type_name: String::from("Query"),
                field: String::from("allItems")
            },
            error
        );
    }

    #[test]
    fn unknown_types() {
        let extension = SchemaExtension::parse("extend type Query { randomThing: Thing }").unwrap();
        let error = compose(remote(), &extension, resolvers(&["randomThing"])).unwrap_err();

        assert_eq!(
            CompositionError::UnknownType {
                field: String::from("randomThing"),
                type_name: String::from("Thing")
            },
            error
        );

        let extension = SchemaExtension::parse("extend type Query { randomItem(filter: Filter): Item }").unwrap();
        let error = compose(remote(), &extension, resolvers(&["randomItem"])).unwrap_err();

        assert_eq!(
            CompositionError::UnknownType {
                field: String::from("randomItem"),
                type_name: String::from("Filter")
            },
            error
        );
    }

    #[test]
    fn input_and_output_positions() {
        let extension = SchemaExtension::parse("extend type Query { randomItem: ItemFilter }").unwrap();
        let error = compose(remote(), &extension, resolvers(&["randomItem"])).unwrap_err();
        assert!(matches!(error, CompositionError::UnknownType { .. }));

        let extension = SchemaExtension::parse("extend type Query { randomItem(like: Item): Item }").unwrap();
        let error = compose(remote(), &extension, resolvers(&["randomItem"])).unwrap_err();
        assert!(matches!(error, CompositionError::InvalidArgumentType { .. }));

        let extension =
            SchemaExtension::parse("extend type Query { randomItem(filter: ItemFilter, seed: Int): Item }").unwrap();
        assert!(compose(remote(), &extension, resolvers(&["randomItem"])).is_ok());
    }

    #[test]
    fn bindings_must_match_the_extension() {
        let error = compose(remote(), &random_item(), resolvers(&[])).unwrap_err();
        assert_eq!(CompositionError::UnboundExtensionField(String::from("randomItem")), error);

        let error = compose(remote(), &random_item(), resolvers(&["randomItem", "randomUser"])).unwrap_err();
        assert_eq!(CompositionError::UnknownBinding(String::from("randomUser")), error);
    }

    #[test]
    fn extension_must_target_the_query_root() {
        let extension = SchemaExtension::parse("extend type Mutation { randomDelete: Item }").unwrap();
        let error = compose(remote(), &extension, resolvers(&["randomDelete"])).unwrap_err();

        assert_eq!(
            CompositionError::InvalidExtensionTarget {
                target: String::from("Mutation"),
                query_type: String::from("Query")
            },
            error
        );
    }

    #[test]
    fn composition_is_deterministic() {
        let first = compose(remote(), &random_item(), resolvers(&["randomItem"])).unwrap();
        let second = compose(remote(), &random_item(), resolvers(&["randomItem"])).unwrap();

        assert_eq!(first.to_sdl(), second.to_sdl());
        assert_eq!(first.descriptor(), second.descriptor());
    }
}
