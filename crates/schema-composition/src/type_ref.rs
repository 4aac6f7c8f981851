use std::fmt;

use async_graphql_parser::types::{BaseType, Type};

/// A reference to a type from a field, argument or input field, including its list and
/// non-null wrappers: `[Item!]!` is `NonNull(List(NonNull(Named("Item"))))`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn non_null(self) -> Self {
        TypeRef::NonNull(Box::new(self))
    }

    pub fn list(self) -> Self {
        TypeRef::List(Box::new(self))
    }

    /// The innermost type name, with all wrappers removed.
    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// Parses the GraphQL notation of a type reference, e.g. `[String!]!`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();

        if let Some(inner) = input.strip_suffix('!') {
            let inner = Self::parse(inner)?;

            // `String!!` is not a thing.
            if inner.is_non_null() {
                return None;
            }

            return Some(inner.non_null());
        }

        if let Some(inner) = input.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            return Self::parse(inner).map(Self::list);
        }

        is_name(input).then(|| Self::named(input))
    }
}

fn is_name(input: &str) -> bool {
    let mut chars = input.chars();

    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

impl From<&Type> for TypeRef {
    fn from(ty: &Type) -> Self {
        let base = match &ty.base {
            BaseType::Named(name) => TypeRef::named(name.as_str()),
            BaseType::List(inner) => TypeRef::from(inner.as_ref()).list(),
        };

        if ty.nullable {
            base
        } else {
            base.non_null()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TypeRef;

    #[test]
    fn parse_and_display() {
        for input in ["Item", "Item!", "[Item]", "[Item!]!", "[[ID!]]"] {
            let parsed = TypeRef::parse(input).unwrap();
            assert_eq!(input, parsed.to_string());
        }
    }

    #[test]
    fn named_type_strips_wrappers() {
        let ty = TypeRef::parse("[[_QueryMeta!]]!").unwrap();
        assert_eq!("_QueryMeta", ty.named_type());
        assert!(ty.is_non_null());
    }

    #[test]
    fn invalid_references() {
        for input in ["", "[Item", "Item]", "Item!!", "1Item", "It em"] {
            assert_eq!(None, TypeRef::parse(input), "{input}");
        }
    }
}
