use std::{
    collections::HashMap,
    fmt::{self, Write},
};

use async_graphql::{
    parser::types::{
        Directive, Field, FragmentDefinition, Selection as AstSelection, SelectionSet, VariableDefinition,
    },
    Context, Name, Positioned, Value,
};
use async_graphql_value::Value as InputValue;

/// A field of an incoming operation, with its variables already resolved.
///
/// Rendering a selection gives back GraphQL text that can be forwarded upstream. Fragments keep
/// their type condition, named fragments are inlined, and every nested selection set also requests
/// `__typename` so values of abstract types can be resolved from the upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: Vec<(String, Value)>,
    pub selection_set: Vec<SelectionItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionItem {
    Field(Selection),
    /// `... on Type { ... }`, or `... { ... }` without a type condition.
    Fragment {
        type_condition: Option<String>,
        selection_set: Vec<SelectionItem>,
    },
}

impl Selection {
    pub fn new(name: impl Into<String>) -> Self {
        Selection {
            name: name.into(),
            alias: None,
            arguments: Vec::new(),
            selection_set: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: Selection) -> Self {
        self.selection_set.push(SelectionItem::Field(field));
        self
    }

    #[must_use]
    pub fn with_fragment(
        mut self,
        type_condition: impl Into<String>,
        fields: impl IntoIterator<Item = Selection>,
    ) -> Self {
        self.selection_set.push(SelectionItem::Fragment {
            type_condition: Some(type_condition.into()),
            selection_set: fields.into_iter().map(SelectionItem::Field).collect(),
        });
        self
    }

    /// Captures the field currently being resolved from the operation document.
    pub fn from_context(ctx: &Context<'_>) -> async_graphql::Result<Self> {
        let walker = DocumentWalker {
            variable_definitions: &ctx.query_env.operation.node.variable_definitions,
            variables: &ctx.query_env.variables,
            fragments: &ctx.query_env.fragments,
        };

        walker.field(&ctx.item.node)
    }

    /// The key of this field in the response: its alias if it has one, its name otherwise.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Renders the sub-selection only, `{ __typename id title }`. `None` for leaf fields.
    pub fn render_selection_set(&self) -> Option<String> {
        if self.selection_set.is_empty() {
            return None;
        }

        let mut out = String::new();
        // Writing into a String never fails.
        let _ = self.write_selection_set(&mut out);

        Some(out)
    }

    fn write_selection_set(&self, out: &mut impl Write) -> fmt::Result {
        out.write_str("{ __typename")?;
        write_items(out, &self.selection_set)?;
        out.write_str(" }")
    }
}

fn write_items(out: &mut impl Write, items: &[SelectionItem]) -> fmt::Result {
    for item in items {
        match item {
            SelectionItem::Field(field) => write!(out, " {field}")?,
            SelectionItem::Fragment {
                type_condition,
                selection_set,
            } => {
                out.write_str(" ...")?;

                if let Some(type_condition) = type_condition {
                    write!(out, " on {type_condition}")?;
                }

                out.write_str(" {")?;
                write_items(out, selection_set)?;
                out.write_str(" }")?;
            }
        }
    }

    Ok(())
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{alias}: ")?;
        }

        f.write_str(&self.name)?;

        if !self.arguments.is_empty() {
            f.write_char('(')?;

            for (index, (name, value)) in self.arguments.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }

                write!(f, "{name}: {value}")?;
            }

            f.write_char(')')?;
        }

        if !self.selection_set.is_empty() {
            f.write_char(' ')?;
            self.write_selection_set(f)?;
        }

        Ok(())
    }
}

struct DocumentWalker<'a> {
    variable_definitions: &'a [Positioned<VariableDefinition>],
    variables: &'a async_graphql::Variables,
    fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
}

impl DocumentWalker<'_> {
    fn field(&self, field: &Field) -> async_graphql::Result<Selection> {
        let arguments = field
            .arguments
            .iter()
            .map(|(name, value)| -> async_graphql::Result<(String, Value)> {
                Ok((name.node.to_string(), self.resolve(&value.node)?))
            })
            .collect::<async_graphql::Result<_>>()?;

        Ok(Selection {
            name: field.name.node.to_string(),
            alias: field.alias.as_ref().map(|alias| alias.node.to_string()),
            arguments,
            selection_set: self.selection_set(&field.selection_set.node)?,
        })
    }

    fn selection_set(&self, selection_set: &SelectionSet) -> async_graphql::Result<Vec<SelectionItem>> {
        let mut items = Vec::with_capacity(selection_set.items.len());

        for selection in &selection_set.items {
            match &selection.node {
                AstSelection::Field(field) => {
                    if self.is_included(&field.node.directives)? {
                        items.push(SelectionItem::Field(self.field(&field.node)?));
                    }
                }
                AstSelection::FragmentSpread(spread) => {
                    if !self.is_included(&spread.node.directives)? {
                        continue;
                    }

                    let name = &spread.node.fragment_name.node;
                    let fragment = self
                        .fragments
                        .get(name)
                        .ok_or_else(|| async_graphql::Error::new(format!("unknown fragment `{name}`")))?;

                    self.push_fragment(
                        &mut items,
                        Some(fragment.node.type_condition.node.on.node.to_string()),
                        &fragment.node.selection_set.node,
                    )?;
                }
                AstSelection::InlineFragment(fragment) => {
                    if !self.is_included(&fragment.node.directives)? {
                        continue;
                    }

                    let type_condition = fragment
                        .node
                        .type_condition
                        .as_ref()
                        .map(|condition| condition.node.on.node.to_string());

                    self.push_fragment(&mut items, type_condition, &fragment.node.selection_set.node)?;
                }
            }
        }

        Ok(items)
    }

    fn push_fragment(
        &self,
        items: &mut Vec<SelectionItem>,
        type_condition: Option<String>,
        selection_set: &SelectionSet,
    ) -> async_graphql::Result<()> {
        let selection_set = self.selection_set(selection_set)?;

        // `... on T { }` is not valid GraphQL.
        if !selection_set.is_empty() {
            items.push(SelectionItem::Fragment {
                type_condition,
                selection_set,
            });
        }

        Ok(())
    }

    /// Evaluates `@skip` and `@include`, the only executable directives of the gateway schema.
    fn is_included(&self, directives: &[Positioned<Directive>]) -> async_graphql::Result<bool> {
        for directive in directives {
            let skip_when = match directive.node.name.node.as_str() {
                "skip" => true,
                "include" => false,
                _ => continue,
            };

            let condition = match directive.node.get_argument("if") {
                Some(value) => self.resolve(&value.node)?,
                None => continue,
            };

            if condition == Value::Boolean(skip_when) {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn resolve(&self, value: &InputValue) -> async_graphql::Result<Value> {
        value.clone().into_const_with(|name| {
            self.variable_definitions
                .iter()
                .find(|definition| definition.node.name.node == name)
                .and_then(|definition| {
                    self.variables
                        .get(&definition.node.name.node)
                        .or_else(|| definition.node.default_value())
                })
                .cloned()
                .ok_or_else(|| async_graphql::Error::new(format!("variable `${name}` is not defined")))
        })
    }
}

#[cfg(test)]
mod tests {
    use async_graphql::{Name, Value};

    use super::Selection;

    #[test]
    fn renders_aliases_arguments_and_nested_fields() {
        let selection = Selection::new("Item")
            .with_alias("pick")
            .with_argument("id", "item-1")
            .with_argument("order", Value::Enum(Name::new("DESC")))
            .with_field(Selection::new("id"))
            .with_field(
                Selection::new("owner")
                    .with_field(Selection::new("name").with_alias("fullName"))
                    .with_field(Selection::new("tags").with_argument("first", 2)),
            );

        assert_eq!(
            r#"pick: Item(id: "item-1", order: DESC) { __typename id owner { __typename fullName: name tags(first: 2) } }"#,
            selection.to_string()
        );
        assert_eq!("pick", selection.response_key());
    }

    #[test]
    fn renders_type_conditions() {
        let selection = Selection::new("node")
            .with_argument("id", "u1")
            .with_field(Selection::new("id"))
            .with_fragment("User", [Selection::new("name")])
            .with_fragment("Item", [Selection::new("title").with_alias("headline")]);

        assert_eq!(
            r#"node(id: "u1") { __typename id ... on User { name } ... on Item { headline: title } }"#,
            selection.to_string()
        );
    }

    #[test]
    fn leaf_fields() {
        let selection = Selection::new("count");

        assert_eq!("count", selection.to_string());
        assert_eq!("count", selection.response_key());
        assert_eq!(None, selection.render_selection_set());
    }

    #[test]
    fn selection_set_only() {
        let selection = Selection::new("randomItem")
            .with_field(Selection::new("id"))
            .with_field(Selection::new("title"));

        assert_eq!(
            Some(String::from("{ __typename id title }")),
            selection.render_selection_set()
        );
    }
}
