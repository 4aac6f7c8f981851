//! The in-memory type system of the upstream service.
//!
//! A [`SchemaDescriptor`] is built either from an introspection response or from SDL. Types of
//! the introspection system (`__Schema`, `__Type`...) and the built-in scalars are not part of
//! the descriptor: every GraphQL executor provides them on its own.

use std::{collections::BTreeMap, fmt};

use async_graphql_parser::{
    types::{self as ast, ConstDirective, ServiceDocument, TypeSystemDefinition},
    Positioned,
};
use indexmap::IndexMap;

use crate::{error::DescriptorError, TypeRef};

/// The scalars every GraphQL schema provides.
pub const BUILTIN_SCALARS: &[&str] = &["Boolean", "Float", "ID", "Int", "String"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    pub const ALL: [OperationType; 3] = [
        OperationType::Query,
        OperationType::Mutation,
        OperationType::Subscription,
    ];
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub(crate) query_type: String,
    pub(crate) mutation_type: Option<String>,
    pub(crate) subscription_type: Option<String>,
    pub(crate) types: IndexMap<String, TypeDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub description: Option<String>,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    Scalar,
    InputObject(InputObjectType),
}

impl TypeKind {
    /// Whether a value of this type can be returned from a field.
    pub fn is_output(&self) -> bool {
        !matches!(self, TypeKind::InputObject(_))
    }

    /// Whether a value of this type can be passed as an argument.
    pub fn is_input(&self) -> bool {
        matches!(self, TypeKind::Enum(_) | TypeKind::Scalar | TypeKind::InputObject(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectType {
    pub fields: Vec<FieldDefinition>,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceType {
    pub fields: Vec<FieldDefinition>,
    pub interfaces: Vec<String>,
    pub possible_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnionType {
    pub possible_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumType {
    pub values: Vec<EnumValueDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputObjectType {
    pub fields: Vec<InputValueDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDefinition>,
    pub ty: TypeRef,
    pub deprecation: Deprecation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    /// The default value in GraphQL notation, e.g. `OPEN` or `{limit: 10}`.
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Deprecation,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Deprecation {
    #[default]
    NotDeprecated,
    Deprecated {
        reason: Option<String>,
    },
}

impl SchemaDescriptor {
    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_deref()
    }

    pub fn root_type_name(&self, operation: OperationType) -> Option<&str> {
        match operation {
            OperationType::Query => Some(&self.query_type),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }
    }

    /// The object type backing the given root operation, if the schema has one.
    pub fn root_type(&self, operation: OperationType) -> Option<&ObjectType> {
        let name = self.root_type_name(operation)?;

        match self.types.get(name).map(|ty| &ty.kind) {
            Some(TypeKind::Object(object)) => Some(object),
            _ => None,
        }
    }

    pub(crate) fn root_type_mut(&mut self, operation: OperationType) -> Option<&mut ObjectType> {
        let name = self.root_type_name(operation)?.to_owned();

        match self.types.get_mut(&name).map(|ty| &mut ty.kind) {
            Some(TypeKind::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Removes the operation from the schema roots. The backing object type stays registered.
    pub(crate) fn detach_root(&mut self, operation: OperationType) {
        match operation {
            OperationType::Query => {}
            OperationType::Mutation => self.mutation_type = None,
            OperationType::Subscription => self.subscription_type = None,
        }
    }

    pub fn types(&self) -> impl ExactSizeIterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// True for the types registered in the descriptor and the built-in scalars.
    pub fn has_type(&self, name: &str) -> bool {
        BUILTIN_SCALARS.contains(&name) || self.types.contains_key(name)
    }

    /// Builds a descriptor out of an introspection response.
    pub fn from_introspection(schema: cynic_introspection::Schema) -> Result<Self, DescriptorError> {
        use cynic_introspection::Type;

        let types = schema
            .types
            .into_iter()
            .filter(|ty| !is_builtin(ty.name()))
            .map(|ty| -> Result<(String, TypeDefinition), DescriptorError> {
                let (name, description, kind) = match ty {
                    Type::Object(object) => (
                        object.name,
                        object.description,
                        TypeKind::Object(ObjectType {
                            fields: fields_from_introspection(object.fields)?,
                            interfaces: object.interfaces,
                        }),
                    ),
                    Type::Interface(interface) => (
                        interface.name,
                        interface.description,
                        TypeKind::Interface(InterfaceType {
                            fields: fields_from_introspection(interface.fields)?,
                            interfaces: interface.interfaces,
                            possible_types: interface.possible_types,
                        }),
                    ),
                    Type::Union(union) => (
                        union.name,
                        union.description,
                        TypeKind::Union(UnionType {
                            possible_types: union.possible_types,
                        }),
                    ),
                    Type::Enum(enum_type) => (
                        enum_type.name,
                        enum_type.description,
                        TypeKind::Enum(EnumType {
                            values: enum_type
                                .values
                                .into_iter()
                                .map(|value| EnumValueDefinition {
                                    name: value.name,
                                    description: value.description,
                                    deprecation: deprecation_from_introspection(value.deprecated),
                                })
                                .collect(),
                        }),
                    ),
                    Type::Scalar(scalar) => (scalar.name, scalar.description, TypeKind::Scalar),
                    Type::InputObject(input) => (
                        input.name,
                        input.description,
                        TypeKind::InputObject(InputObjectType {
                            fields: input_values_from_introspection(input.fields)?,
                        }),
                    ),
                };

                Ok((name.clone(), TypeDefinition { name, description, kind }))
            })
            .collect::<Result<IndexMap<_, _>, DescriptorError>>()?;

        Self::new(
            schema.query_type,
            schema.mutation_type,
            schema.subscription_type,
            types,
        )
    }

    /// Builds a descriptor out of a GraphQL SDL document.
    ///
    /// Without a `schema` definition, the root types are the ones named `Query`, `Mutation` and
    /// `Subscription`.
    pub fn from_sdl(sdl: &str) -> Result<Self, DescriptorError> {
        let document = async_graphql_parser::parse_schema(sdl).map_err(|err| DescriptorError::Syntax(err.to_string()))?;

        Self::from_document(document)
    }

    fn from_document(document: ServiceDocument) -> Result<Self, DescriptorError> {
        let mut roots = BTreeMap::new();
        let mut types = IndexMap::new();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(Positioned { node: schema, .. }) => {
                    if schema.extend {
                        return Err(DescriptorError::UnsupportedExtension(String::from("schema")));
                    }

                    for (operation, name) in [
                        (OperationType::Query, schema.query),
                        (OperationType::Mutation, schema.mutation),
                        (OperationType::Subscription, schema.subscription),
                    ] {
                        if let Some(name) = name {
                            roots.insert(operation, name.node.to_string());
                        }
                    }
                }
                TypeSystemDefinition::Type(Positioned { node: ty, .. }) => {
                    let name = ty.name.node.to_string();

                    if ty.extend {
                        return Err(DescriptorError::UnsupportedExtension(name));
                    }

                    let kind = match ty.kind {
                        ast::TypeKind::Scalar => TypeKind::Scalar,
                        ast::TypeKind::Object(object) => TypeKind::Object(ObjectType {
                            fields: object.fields.iter().map(|field| field_from_ast(&field.node)).collect(),
                            interfaces: object.implements.iter().map(|name| name.node.to_string()).collect(),
                        }),
                        ast::TypeKind::Interface(interface) => TypeKind::Interface(InterfaceType {
                            fields: interface.fields.iter().map(|field| field_from_ast(&field.node)).collect(),
                            interfaces: interface.implements.iter().map(|name| name.node.to_string()).collect(),
                            possible_types: Vec::new(),
                        }),
                        ast::TypeKind::Union(union) => TypeKind::Union(UnionType {
                            possible_types: union.members.iter().map(|name| name.node.to_string()).collect(),
                        }),
                        ast::TypeKind::Enum(enum_type) => TypeKind::Enum(EnumType {
                            values: enum_type
                                .values
                                .iter()
                                .map(|value| EnumValueDefinition {
                                    name: value.node.value.node.to_string(),
                                    description: value.node.description.as_ref().map(|d| d.node.clone()),
                                    deprecation: deprecation_from_directives(&value.node.directives),
                                })
                                .collect(),
                        }),
                        ast::TypeKind::InputObject(input) => TypeKind::InputObject(InputObjectType {
                            fields: input.fields.iter().map(|field| input_value_from_ast(&field.node)).collect(),
                        }),
                    };

                    let definition = TypeDefinition {
                        name: name.clone(),
                        description: ty.description.map(|d| d.node),
                        kind,
                    };

                    if types.insert(name.clone(), definition).is_some() {
                        return Err(DescriptorError::DuplicateType(name));
                    }
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        link_possible_types(&mut types);

        let root = |operation: OperationType, default: &str| {
            roots
                .get(&operation)
                .cloned()
                .or_else(|| types.contains_key(default).then(|| default.to_owned()))
        };

        let query_type = root(OperationType::Query, "Query").ok_or(DescriptorError::MissingQueryType)?;
        let mutation_type = root(OperationType::Mutation, "Mutation");
        let subscription_type = root(OperationType::Subscription, "Subscription");

        Self::new(query_type, mutation_type, subscription_type, types)
    }

    fn new(
        query_type: String,
        mutation_type: Option<String>,
        subscription_type: Option<String>,
        types: IndexMap<String, TypeDefinition>,
    ) -> Result<Self, DescriptorError> {
        let descriptor = SchemaDescriptor {
            query_type,
            mutation_type,
            subscription_type,
            types,
        };

        for operation in OperationType::ALL {
            let Some(name) = descriptor.root_type_name(operation) else {
                continue;
            };

            if descriptor.root_type(operation).is_none() {
                return Err(DescriptorError::InvalidRootType {
                    operation,
                    name: name.to_owned(),
                });
            }
        }

        Ok(descriptor)
    }
}

fn is_builtin(name: &str) -> bool {
    // See: <http://spec.graphql.org/October2021/#sec-Names.Reserved-Names>
    name.starts_with("__") || BUILTIN_SCALARS.contains(&name)
}

fn type_from_introspection(ty: &cynic_introspection::FieldType) -> Result<TypeRef, DescriptorError> {
    let notation = ty.to_string();
    TypeRef::parse(&notation).ok_or(DescriptorError::InvalidTypeReference(notation))
}

fn fields_from_introspection(fields: Vec<cynic_introspection::Field>) -> Result<Vec<FieldDefinition>, DescriptorError> {
    fields
        .into_iter()
        .map(|field| {
            Ok(FieldDefinition {
                ty: type_from_introspection(&field.ty)?,
                arguments: input_values_from_introspection(field.args)?,
                name: field.name,
                description: field.description,
                deprecation: deprecation_from_introspection(field.deprecated),
            })
        })
        .collect()
}

fn input_values_from_introspection(
    values: Vec<cynic_introspection::InputValue>,
) -> Result<Vec<InputValueDefinition>, DescriptorError> {
    values
        .into_iter()
        .map(|value| {
            Ok(InputValueDefinition {
                ty: type_from_introspection(&value.ty)?,
                name: value.name,
                description: value.description,
                default_value: value.default_value,
            })
        })
        .collect()
}

fn deprecation_from_introspection(deprecated: cynic_introspection::Deprecated) -> Deprecation {
    match deprecated {
        cynic_introspection::Deprecated::No => Deprecation::NotDeprecated,
        cynic_introspection::Deprecated::Yes(reason) => Deprecation::Deprecated { reason },
    }
}

pub(crate) fn field_from_ast(field: &ast::FieldDefinition) -> FieldDefinition {
    FieldDefinition {
        name: field.name.node.to_string(),
        description: field.description.as_ref().map(|d| d.node.clone()),
        arguments: field
            .arguments
            .iter()
            .map(|argument| input_value_from_ast(&argument.node))
            .collect(),
        ty: TypeRef::from(&field.ty.node),
        deprecation: deprecation_from_directives(&field.directives),
    }
}

fn input_value_from_ast(value: &ast::InputValueDefinition) -> InputValueDefinition {
    InputValueDefinition {
        name: value.name.node.to_string(),
        description: value.description.as_ref().map(|d| d.node.clone()),
        ty: TypeRef::from(&value.ty.node),
        default_value: value.default_value.as_ref().map(|value| value.node.to_string()),
    }
}

fn deprecation_from_directives(directives: &[Positioned<ConstDirective>]) -> Deprecation {
    let Some(directive) = directives.iter().find(|d| d.node.name.node.as_str() == "deprecated") else {
        return Deprecation::NotDeprecated;
    };

    let reason = directive.node.get_argument("reason").and_then(|value| match &value.node {
        async_graphql_value::ConstValue::String(reason) => Some(reason.clone()),
        _ => None,
    });

    Deprecation::Deprecated { reason }
}

/// SDL only states which interfaces an object implements, introspection also lists the
/// implementors of every interface.
fn link_possible_types(types: &mut IndexMap<String, TypeDefinition>) {
    let implementations: Vec<(String, String)> = types
        .values()
        .flat_map(|ty| {
            let interfaces = match &ty.kind {
                TypeKind::Object(object) => object.interfaces.as_slice(),
                _ => &[],
            };

            interfaces
                .iter()
                .map(move |interface| (interface.clone(), ty.name.clone()))
        })
        .collect();

    for (interface, implementor) in implementations {
        if let Some(TypeKind::Interface(interface)) = types.get_mut(&interface).map(|ty| &mut ty.kind) {
            interface.possible_types.push(implementor);
        }
    }
}
