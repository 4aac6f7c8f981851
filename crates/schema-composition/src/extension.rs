use async_graphql_parser::types::{TypeKind as AstTypeKind, TypeSystemDefinition};

use crate::{descriptor::field_from_ast, error::ExtensionError, FieldDefinition};

/// Root fields declared locally on top of the remote schema, e.g.
///
/// ```graphql
/// extend type Query {
///   randomItem: Item
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaExtension {
    target: String,
    fields: Vec<FieldDefinition>,
}

impl SchemaExtension {
    /// Parses an extension document. Only `extend type` blocks over a single object type are
    /// accepted, repeated blocks are merged.
    pub fn parse(sdl: &str) -> Result<Self, ExtensionError> {
        let document = async_graphql_parser::parse_schema(sdl).map_err(|err| ExtensionError::Syntax(err.to_string()))?;

        let mut target: Option<String> = None;
        let mut fields = Vec::new();

        for definition in document.definitions {
            let ty = match definition {
                TypeSystemDefinition::Type(ty) if ty.node.extend => ty.node,
                TypeSystemDefinition::Type(ty) => {
                    return Err(ExtensionError::Unsupported(format!("type {}", ty.node.name.node)));
                }
                TypeSystemDefinition::Schema(_) => return Err(ExtensionError::Unsupported(String::from("schema"))),
                TypeSystemDefinition::Directive(directive) => {
                    return Err(ExtensionError::Unsupported(format!("directive @{}", directive.node.name.node)));
                }
            };

            let name = ty.name.node.to_string();

            let AstTypeKind::Object(object) = ty.kind else {
                return Err(ExtensionError::Unsupported(format!("extend {name}")));
            };

            match &target {
                Some(existing) if *existing != name => {
                    return Err(ExtensionError::MultipleTargets(existing.clone(), name));
                }
                Some(_) => {}
                None => target = Some(name),
            }

            fields.extend(object.fields.iter().map(|field| field_from_ast(&field.node)));
        }

        match target {
            Some(target) if !fields.is_empty() => Ok(SchemaExtension { target, fields }),
            _ => Err(ExtensionError::Empty),
        }
    }

    /// The name of the extended type.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::TypeRef;

    #[test]
    fn random_item_extension() {
        let extension = SchemaExtension::parse(indoc! {r#"
            extend type Query {
              "Any item of the collection."
              randomItem: Item
            }
        "#})
        .unwrap();

        assert_eq!("Query", extension.target());
        assert_eq!(1, extension.fields().len());

        let field = &extension.fields()[0];
        assert_eq!("randomItem", field.name);
        assert_eq!(TypeRef::named("Item"), field.ty);
        assert_eq!(Some("Any item of the collection."), field.description.as_deref());
    }

    #[test]
    fn blocks_on_the_same_type_are_merged() {
        let extension = SchemaExtension::parse(indoc! {r#"
            extend type Query { a: Int }
            extend type Query { b(id: ID!): String }
        "#})
        .unwrap();

        let names: Vec<_> = extension.fields().iter().map(|field| field.name.as_str()).collect();
        assert_eq!(vec!["a", "b"], names);
    }

    #[test]
    fn rejected_extensions() {
        let cases = [
            ("type Query { a: Int }", ExtensionError::Unsupported(String::from("type Query"))),
            ("extend enum Order { RANDOM }", ExtensionError::Unsupported(String::from("extend Order"))),
            (
                "extend type Query { a: Int } extend type Mutation { b: Int }",
                ExtensionError::MultipleTargets(String::from("Query"), String::from("Mutation")),
            ),
        ];

        for (sdl, expected) in cases {
            assert_eq!(Err(expected), SchemaExtension::parse(sdl), "{sdl}");
        }
    }

    #[test]
    fn syntax_errors() {
        let error = SchemaExtension::parse("extend type Query { randomItem: }").unwrap_err();
        assert!(matches!(error, ExtensionError::Syntax(_)));
    }
}
