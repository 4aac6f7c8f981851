use std::collections::HashMap;

use async_graphql::{dynamic::FieldValue, Name, Value};
use schema_composition::{SchemaDescriptor, TypeKind, TypeRef};

use crate::ResolverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputKind {
    Leaf,
    Enum,
    Object,
    /// Interfaces and unions, resolved through `__typename`.
    Abstract,
}

/// Turns the JSON returned by resolvers into values the executor understands. Objects are kept
/// as JSON and their fields read from it by response key.
#[derive(Debug, Default)]
pub(crate) struct OutputTypes {
    kinds: HashMap<String, OutputKind>,
}

impl OutputTypes {
    pub(crate) fn new(descriptor: &SchemaDescriptor) -> Self {
        let kinds = descriptor
            .types()
            .filter_map(|ty| {
                let kind = match ty.kind {
                    TypeKind::Object(_) => OutputKind::Object,
                    TypeKind::Interface(_) | TypeKind::Union(_) => OutputKind::Abstract,
                    TypeKind::Enum(_) => OutputKind::Enum,
                    TypeKind::Scalar => OutputKind::Leaf,
                    TypeKind::InputObject(_) => return None,
                };

                Some((ty.name.clone(), kind))
            })
            .collect();

        OutputTypes { kinds }
    }

    pub(crate) fn to_field_value<'a>(
        &self,
        value: serde_json::Value,
        ty: &TypeRef,
    ) -> Result<Option<FieldValue<'a>>, ResolverError> {
        // The executor reports nulls in non-null positions.
        if value.is_null() {
            return Ok(None);
        }

        let name = match ty {
            TypeRef::NonNull(inner) => return self.to_field_value(value, inner),
            TypeRef::List(inner) => {
                let serde_json::Value::Array(items) = value else {
                    return Err(ResolverError::UnexpectedShape(format!("expected a list of {inner}")));
                };

                let items = items
                    .into_iter()
                    .map(|item| Ok(self.to_field_value(item, inner)?.unwrap_or(FieldValue::NULL)))
                    .collect::<Result<Vec<_>, ResolverError>>()?;

                return Ok(Some(FieldValue::list(items)));
            }
            TypeRef::Named(name) => name,
        };

        let kind = self.kinds.get(name).copied().unwrap_or(OutputKind::Leaf);

        let value = match (kind, value) {
            (OutputKind::Leaf, value) => FieldValue::value(
                Value::from_json(value).map_err(|err| ResolverError::UnexpectedShape(err.to_string()))?,
            ),
            (OutputKind::Enum, serde_json::Value::String(item)) => FieldValue::value(Value::Enum(Name::new(item))),
            (OutputKind::Object, value @ serde_json::Value::Object(_)) => FieldValue::owned_any(value),
            (OutputKind::Abstract, value @ serde_json::Value::Object(_)) => {
                let typename = value
                    .get("__typename")
                    .and_then(serde_json::Value::as_str)
                    .map(ToOwned::to_owned)
                    .ok_or_else(|| ResolverError::UnexpectedShape(format!("a {name} value has no __typename")))?;

                FieldValue::owned_any(value).with_type(typename)
            }
            (_, value) => {
                return Err(ResolverError::UnexpectedShape(format!(
                    "expected a {name}, found {value}"
                )))
            }
        };

        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use schema_composition::{SchemaDescriptor, TypeRef};
    use serde_json::json;

    use super::OutputTypes;
    use crate::ResolverError;

    fn output_types() -> OutputTypes {
        let descriptor = SchemaDescriptor::from_sdl(
            r#"
            type Query { item: Item }
            type Item { id: ID! }
            union Result = Item
            enum Order { ASC DESC }
            "#,
        )
        .unwrap();

        OutputTypes::new(&descriptor)
    }

    #[test]
    fn nulls_and_lists() {
        let types = output_types();

        assert!(types
            .to_field_value(json!(null), &TypeRef::named("Item").non_null())
            .unwrap()
            .is_none());

        assert!(types
            .to_field_value(json!([{ "id": "1" }, null]), &TypeRef::named("Item").list())
            .unwrap()
            .is_some());
    }

    #[test]
    fn unexpected_shapes() {
        let types = output_types();

        let error = types
            .to_field_value(json!({ "id": "1" }), &TypeRef::named("Item").list())
            .err();
        assert_eq!(
            Some(ResolverError::UnexpectedShape(String::from("expected a list of Item"))),
            error
        );

        let error = types.to_field_value(json!({ "id": "1" }), &TypeRef::named("Result")).err();
        assert_eq!(
            Some(ResolverError::UnexpectedShape(String::from("a Result value has no __typename"))),
            error
        );

        let error = types.to_field_value(json!(3), &TypeRef::named("Order")).err();
        assert_eq!(
            Some(ResolverError::UnexpectedShape(String::from("expected a Order, found 3"))),
            error
        );
    }
}
