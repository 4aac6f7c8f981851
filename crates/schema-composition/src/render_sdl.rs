use std::fmt::{self, Write};

use async_graphql_value::ConstValue;

use crate::{
    Deprecation, EnumValueDefinition, FieldDefinition, InputValueDefinition, OperationType, SchemaDescriptor,
    TypeDefinition, TypeKind,
};

const INDENT: &str = "  ";

pub(crate) fn render(descriptor: &SchemaDescriptor) -> String {
    let mut sdl = String::new();

    // Writing into a String never fails.
    let _ = write_schema(&mut sdl, descriptor);

    sdl
}

fn write_schema(sdl: &mut String, descriptor: &SchemaDescriptor) -> fmt::Result {
    let roots: Vec<&str> = OperationType::ALL
        .into_iter()
        .filter_map(|operation| descriptor.root_type_name(operation))
        .collect();

    let conventional = OperationType::ALL
        .into_iter()
        .all(|operation| match descriptor.root_type_name(operation) {
            Some(name) => name == conventional_root_name(operation),
            None => true,
        });

    if !conventional {
        writeln!(sdl, "schema {{")?;

        for operation in OperationType::ALL {
            if let Some(name) = descriptor.root_type_name(operation) {
                writeln!(sdl, "{INDENT}{operation}: {name}")?;
            }
        }

        writeln!(sdl, "}}\n")?;
    }

    let mut others: Vec<&TypeDefinition> = descriptor
        .types()
        .filter(|ty| !roots.contains(&ty.name.as_str()))
        .collect();

    others.sort_by(|a, b| a.name.cmp(&b.name));

    let ordered = roots.iter().filter_map(|name| descriptor.get(name)).chain(others);

    for (index, ty) in ordered.enumerate() {
        if index > 0 {
            sdl.push('\n');
        }

        write_type(sdl, ty)?;
    }

    Ok(())
}

fn conventional_root_name(operation: OperationType) -> &'static str {
    match operation {
        OperationType::Query => "Query",
        OperationType::Mutation => "Mutation",
        OperationType::Subscription => "Subscription",
    }
}

fn write_type(sdl: &mut String, ty: &TypeDefinition) -> fmt::Result {
    write_description(sdl, ty.description.as_deref(), "")?;

    let name = &ty.name;

    match &ty.kind {
        TypeKind::Scalar => writeln!(sdl, "scalar {name}"),
        TypeKind::Object(object) => {
            write!(sdl, "type {name}")?;
            write_implements(sdl, &object.interfaces)?;
            write_fields(sdl, &object.fields)
        }
        TypeKind::Interface(interface) => {
            write!(sdl, "interface {name}")?;
            write_implements(sdl, &interface.interfaces)?;
            write_fields(sdl, &interface.fields)
        }
        TypeKind::Union(union) => writeln!(sdl, "union {name} = {}", union.possible_types.join(" | ")),
        TypeKind::Enum(enum_type) => {
            writeln!(sdl, "enum {name} {{")?;

            for value in &enum_type.values {
                write_enum_value(sdl, value)?;
            }

            writeln!(sdl, "}}")
        }
        TypeKind::InputObject(input) => {
            writeln!(sdl, "input {name} {{")?;

            for field in &input.fields {
                write_description(sdl, field.description.as_deref(), INDENT)?;
                write!(sdl, "{INDENT}")?;
                write_input_value(sdl, field)?;
                sdl.push('\n');
            }

            writeln!(sdl, "}}")
        }
    }
}

fn write_implements(sdl: &mut String, interfaces: &[String]) -> fmt::Result {
    if !interfaces.is_empty() {
        write!(sdl, " implements {}", interfaces.join(" & "))?;
    }

    Ok(())
}

fn write_fields(sdl: &mut String, fields: &[FieldDefinition]) -> fmt::Result {
    writeln!(sdl, " {{")?;

    for field in fields {
        write_description(sdl, field.description.as_deref(), INDENT)?;
        write!(sdl, "{INDENT}{}", field.name)?;

        if !field.arguments.is_empty() {
            sdl.push('(');

            for (index, argument) in field.arguments.iter().enumerate() {
                if index > 0 {
                    sdl.push_str(", ");
                }

                write_input_value(sdl, argument)?;
            }

            sdl.push(')');
        }

        write!(sdl, ": {}", field.ty)?;
        write_deprecation(sdl, &field.deprecation)?;
        sdl.push('\n');
    }

    writeln!(sdl, "}}")
}

fn write_input_value(sdl: &mut String, value: &InputValueDefinition) -> fmt::Result {
    write!(sdl, "{}: {}", value.name, value.ty)?;

    if let Some(default) = &value.default_value {
        write!(sdl, " = {default}")?;
    }

    Ok(())
}

fn write_enum_value(sdl: &mut String, value: &EnumValueDefinition) -> fmt::Result {
    write_description(sdl, value.description.as_deref(), INDENT)?;
    write!(sdl, "{INDENT}{}", value.name)?;
    write_deprecation(sdl, &value.deprecation)?;
    sdl.push('\n');

    Ok(())
}

fn write_deprecation(sdl: &mut String, deprecation: &Deprecation) -> fmt::Result {
    match deprecation {
        Deprecation::NotDeprecated => Ok(()),
        Deprecation::Deprecated { reason: None } => sdl.write_str(" @deprecated"),
        Deprecation::Deprecated { reason: Some(reason) } => {
            write!(sdl, " @deprecated(reason: {})", ConstValue::String(reason.clone()))
        }
    }
}

fn write_description(sdl: &mut String, description: Option<&str>, indent: &str) -> fmt::Result {
    let Some(description) = description else {
        return Ok(());
    };

    if !description.contains('\n') {
        return writeln!(sdl, "{indent}{}", ConstValue::String(description.to_owned()));
    }

    writeln!(sdl, "{indent}\"\"\"")?;

    for line in description.lines() {
        if line.is_empty() {
            sdl.push('\n');
        } else {
            writeln!(sdl, "{indent}{}", line.replace("\"\"\"", "\\\"\"\""))?;
        }
    }

    writeln!(sdl, "{indent}\"\"\"")
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::SchemaDescriptor;

    #[test]
    fn renders_every_kind_of_type() {
        let descriptor = SchemaDescriptor::from_sdl(indoc! {r#"
            "Entry point"
            type Query {
              node(id: ID!): Node
              search(term: String, first: Int = 10, order: Order = DESC): [SearchResult!]!
            }

            """
            Something with an id.

            Every item has one.
            """
            interface Node {
              id: ID!
            }

            type Item implements Node {
              id: ID!
              title: String @deprecated(reason: "use \"name\"")
            }

            union SearchResult = Item

            enum Order {
              ASC
              DESC @deprecated
            }

            scalar DateTime

            input ItemFilter {
              title: String
              createdAfter: DateTime
            }
        "#})
        .unwrap();

        insta::assert_snapshot!(super::render(&descriptor), @r###"
        "Entry point"
        type Query {
          node(id: ID!): Node
          search(term: String, first: Int = 10, order: Order = DESC): [SearchResult!]!
        }

        scalar DateTime

        type Item implements Node {
          id: ID!
          title: String @deprecated(reason: "use \"name\"")
        }

        input ItemFilter {
          title: String
          createdAfter: DateTime
        }

        """
        Something with an id.

        Every item has one.
        """
        interface Node {
          id: ID!
        }

        enum Order {
          ASC
          DESC @deprecated
        }

        union SearchResult = Item
        "###);
    }

    #[test]
    fn unconventional_roots_get_a_schema_definition() {
        let descriptor = SchemaDescriptor::from_sdl(indoc! {r#"
            schema { query: RootQuery }
            type RootQuery { ping: String }
        "#})
        .unwrap();

        insta::assert_snapshot!(super::render(&descriptor), @r###"
        schema {
          query: RootQuery
        }

        type RootQuery {
          ping: String
        }
        "###);
    }
}
