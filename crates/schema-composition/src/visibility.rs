use std::{collections::BTreeMap, ops::Deref};

use serde::Deserialize;

use crate::{error::VisibilityError, ComposedSchema, OperationType};

/// Which root fields are exposed, as a wildcard default plus exact-name overrides:
///
/// ```toml
/// [visibility]
/// "*" = false
/// randomItem = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, bool>")]
pub struct FieldWhitelist {
    default: bool,
    overrides: BTreeMap<String, bool>,
}

impl FieldWhitelist {
    pub const WILDCARD: &'static str = "*";

    /// Hides every root field except the given ones.
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldWhitelist {
            default: false,
            overrides: fields.into_iter().map(|field| (field.into(), true)).collect(),
        }
    }

    pub fn is_visible(&self, field: &str) -> bool {
        self.overrides.get(field).copied().unwrap_or(self.default)
    }
}

impl Default for FieldWhitelist {
    fn default() -> Self {
        FieldWhitelist {
            default: true,
            overrides: BTreeMap::new(),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for FieldWhitelist {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        let mut overrides: BTreeMap<String, bool> = iter.into_iter().map(|(name, visible)| (name.into(), visible)).collect();
        let default = overrides.remove(Self::WILDCARD).unwrap_or(true);

        FieldWhitelist { default, overrides }
    }
}

impl From<BTreeMap<String, bool>> for FieldWhitelist {
    fn from(map: BTreeMap<String, bool>) -> Self {
        map.into_iter().collect()
    }
}

/// A composed schema with the hidden root fields removed.
#[derive(Debug, Clone)]
pub struct RestrictedSchema<R>(ComposedSchema<R>);

impl<R> Deref for RestrictedSchema<R> {
    type Target = ComposedSchema<R>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<R> RestrictedSchema<R> {
    pub fn into_inner(self) -> ComposedSchema<R> {
        self.0
    }
}

/// Removes every root field the whitelist hides, with its binding. Mutation and subscription
/// roots left without fields are detached from the schema.
pub fn restrict<R>(schema: ComposedSchema<R>, whitelist: &FieldWhitelist) -> Result<RestrictedSchema<R>, VisibilityError> {
    let mut schema = schema;

    schema.retain_root_fields(|operation, field| {
        let visible = whitelist.is_visible(field);

        if !visible {
            tracing::debug!("hiding {operation} field `{field}`");
        }

        visible
    });

    if schema.query_root_is_empty() {
        return Err(VisibilityError::EmptyQueryRoot(schema.descriptor().query_type().to_owned()));
    }

    for operation in schema.detach_empty_roots() {
        tracing::debug!("no {operation} field is visible, the {operation} root is detached");
    }

    let visible = OperationType::ALL
        .into_iter()
        .map(|operation| schema.root_fields(operation).len())
        .sum::<usize>();

    tracing::debug!("{visible} root fields are visible");

    Ok(RestrictedSchema(schema))
}
