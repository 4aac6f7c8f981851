use std::sync::Arc;

use async_graphql::{
    dynamic::{
        self, Enum, EnumItem, Field, FieldFuture, InputObject, InputValue, Interface, InterfaceField, Object, Scalar,
        Union,
    },
    parser::types::{DocumentOperations, Selection as AstSelection},
    ErrorExtensions, Value,
};
use schema_composition::{
    Deprecation, FieldBinding, FieldDefinition, InputValueDefinition, OperationType, RestrictedSchema, TypeKind, TypeRef,
};

use crate::{value::OutputTypes, EngineError, ResolverRequest, Selection, SharedResolver};

/// The executable form of a restricted schema.
///
/// Root fields are resolved by their binding: upstream fields by the delegating resolver, local
/// fields by their own resolver. Nested fields are read from the JSON value of their parent.
#[derive(Clone)]
pub struct Engine {
    schema: dynamic::Schema,
}

impl Engine {
    /// Builds the executable schema. Subscriptions are not served.
    pub fn build(schema: &RestrictedSchema<SharedResolver>, upstream: SharedResolver) -> Result<Self, EngineError> {
        let descriptor = schema.descriptor();
        let output_types = Arc::new(OutputTypes::new(descriptor));

        let query_type = descriptor.query_type();
        let mutation_type = descriptor.mutation_type();

        let mut builder = dynamic::Schema::build(query_type, mutation_type, None);

        for ty in descriptor.types() {
            let name = ty.name.as_str();

            let root_operation = [OperationType::Query, OperationType::Mutation]
                .into_iter()
                .find(|operation| descriptor.root_type_name(*operation) == Some(name));

            builder = match &ty.kind {
                TypeKind::Object(object) => {
                    // Detached roots are left without fields.
                    if object.fields.is_empty() {
                        continue;
                    }

                    let mut dynamic_object = Object::new(name);

                    for interface in &object.interfaces {
                        dynamic_object = dynamic_object.implement(interface);
                    }

                    for field in &object.fields {
                        let dynamic_field = match root_operation {
                            Some(operation) => {
                                let resolver = match schema.binding(operation, &field.name) {
                                    Some(FieldBinding::Upstream) => Arc::clone(&upstream),
                                    Some(FieldBinding::Local(resolver)) => Arc::clone(resolver),
                                    None => return Err(EngineError::UnboundField(field.name.clone())),
                                };

                                root_field(field, operation, resolver, &output_types)?
                            }
                            None => nested_field(field, &output_types)?,
                        };

                        dynamic_object = dynamic_object.field(dynamic_field);
                    }

                    builder.register(with_description(dynamic_object, ty.description.as_deref(), |object, description| {
                        object.description(description)
                    }))
                }
                TypeKind::Interface(interface) => {
                    let mut dynamic_interface = Interface::new(name);

                    for implemented in &interface.interfaces {
                        dynamic_interface = dynamic_interface.implement(implemented);
                    }

                    for field in &interface.fields {
                        let mut interface_field = InterfaceField::new(&field.name, dynamic_type(&field.ty));

                        for argument in &field.arguments {
                            interface_field = interface_field.argument(input_value(argument, &field.name)?);
                        }

                        if let Some(description) = &field.description {
                            interface_field = interface_field.description(description);
                        }

                        if let Deprecation::Deprecated { reason } = &field.deprecation {
                            interface_field = interface_field.deprecation(reason.as_deref());
                        }

                        dynamic_interface = dynamic_interface.field(interface_field);
                    }

                    builder.register(with_description(
                        dynamic_interface,
                        ty.description.as_deref(),
                        |interface, description| interface.description(description),
                    ))
                }
                TypeKind::Union(union) => {
                    let dynamic_union = union
                        .possible_types
                        .iter()
                        .fold(Union::new(name), |dynamic_union, member| dynamic_union.possible_type(member));

                    builder.register(with_description(dynamic_union, ty.description.as_deref(), |union, description| {
                        union.description(description)
                    }))
                }
                TypeKind::Enum(enum_type) => {
                    let dynamic_enum = enum_type.values.iter().fold(Enum::new(name), |dynamic_enum, value| {
                        let mut item = EnumItem::new(&value.name);

                        if let Some(description) = &value.description {
                            item = item.description(description);
                        }

                        if let Deprecation::Deprecated { reason } = &value.deprecation {
                            item = item.deprecation(reason.as_deref());
                        }

                        dynamic_enum.item(item)
                    });

                    builder.register(with_description(dynamic_enum, ty.description.as_deref(), |enum_type, description| {
                        enum_type.description(description)
                    }))
                }
                TypeKind::Scalar => builder.register(with_description(
                    Scalar::new(name),
                    ty.description.as_deref(),
                    |scalar, description| scalar.description(description),
                )),
                TypeKind::InputObject(input) => {
                    let mut dynamic_input = InputObject::new(name);

                    for field in &input.fields {
                        dynamic_input = dynamic_input.field(input_value(field, name)?);
                    }

                    builder.register(with_description(
                        dynamic_input,
                        ty.description.as_deref(),
                        |input, description| input.description(description),
                    ))
                }
            };
        }

        let schema = builder.finish().map_err(|err| EngineError::Schema(err.to_string()))?;

        Ok(Engine { schema })
    }

    pub async fn execute(&self, request: impl Into<async_graphql::Request>) -> async_graphql::Response {
        self.schema.execute(request).await
    }

    /// The schema served to clients, as SDL.
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    pub fn schema(&self) -> &dynamic::Schema {
        &self.schema
    }
}

fn with_description<T>(ty: T, description: Option<&str>, describe: impl FnOnce(T, &str) -> T) -> T {
    match description {
        Some(description) => describe(ty, description),
        None => ty,
    }
}

fn dynamic_type(ty: &TypeRef) -> dynamic::TypeRef {
    match ty {
        TypeRef::Named(name) => dynamic::TypeRef::named(name),
        TypeRef::List(inner) => dynamic::TypeRef::List(Box::new(dynamic_type(inner))),
        TypeRef::NonNull(inner) => dynamic::TypeRef::NonNull(Box::new(dynamic_type(inner))),
    }
}

fn input_value(definition: &InputValueDefinition, parent: &str) -> Result<InputValue, EngineError> {
    let mut value = InputValue::new(&definition.name, dynamic_type(&definition.ty));

    if let Some(description) = &definition.description {
        value = value.description(description);
    }

    if let Some(default) = &definition.default_value {
        let parsed = parse_default_value(default).ok_or_else(|| EngineError::InvalidDefaultValue {
            location: format!("{parent}.{}", definition.name),
            value: default.clone(),
        })?;

        value = value.default_value(parsed);
    }

    Ok(value)
}

/// Default values come in GraphQL notation, e.g. `DESC` or `{first: 10}`. The parser only
/// exposes values as part of a document, so the value is parsed as an argument.
fn parse_default_value(default: &str) -> Option<Value> {
    let document = async_graphql::parser::parse_query(format!("{{ f(v: {default}) }}")).ok()?;

    let DocumentOperations::Single(operation) = document.operations else {
        return None;
    };

    let selection = operation.node.selection_set.node.items.into_iter().next()?;

    let AstSelection::Field(field) = selection.node else {
        return None;
    };

    let (_, value) = field.node.arguments.into_iter().next()?;

    value.node.into_const()
}

fn with_field_metadata(mut dynamic_field: Field, field: &FieldDefinition) -> Result<Field, EngineError> {
    for argument in &field.arguments {
        dynamic_field = dynamic_field.argument(input_value(argument, &field.name)?);
    }

    if let Some(description) = &field.description {
        dynamic_field = dynamic_field.description(description);
    }

    if let Deprecation::Deprecated { reason } = &field.deprecation {
        dynamic_field = dynamic_field.deprecation(reason.as_deref());
    }

    Ok(dynamic_field)
}

fn root_field(
    field: &FieldDefinition,
    operation: OperationType,
    resolver: SharedResolver,
    output_types: &Arc<OutputTypes>,
) -> Result<Field, EngineError> {
    let ty = field.ty.clone();
    let output_types = Arc::clone(output_types);

    let dynamic_field = Field::new(&field.name, dynamic_type(&field.ty), move |ctx| {
        let ty = ty.clone();
        let output_types = Arc::clone(&output_types);
        let resolver = Arc::clone(&resolver);

        FieldFuture::new(async move {
            let selection = Selection::from_context(ctx.ctx)?;

            let value = resolver
                .resolve(ResolverRequest {
                    operation,
                    field: &selection,
                })
                .await
                .map_err(|err| {
                    tracing::warn!("resolving `{}` failed: {err}", selection.name);
                    err.extend()
                })?;

            output_types.to_field_value(value, &ty).map_err(|err| err.extend())
        })
    });

    with_field_metadata(dynamic_field, field)
}

fn nested_field(field: &FieldDefinition, output_types: &Arc<OutputTypes>) -> Result<Field, EngineError> {
    let ty = field.ty.clone();
    let name = field.name.clone();
    let output_types = Arc::clone(output_types);

    let dynamic_field = Field::new(&field.name, dynamic_type(&field.ty), move |ctx| {
        let ty = ty.clone();
        let name = name.clone();
        let output_types = Arc::clone(&output_types);

        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<serde_json::Value>()?;
            let field = ctx.field();
            let key = field.alias().unwrap_or(&name);

            let value = parent
                .get(key)
                .or_else(|| parent.get(&name))
                .cloned()
                .unwrap_or_default();

            output_types.to_field_value(value, &ty).map_err(|err| err.extend())
        })
    });

    with_field_metadata(dynamic_field, field)
}

#[cfg(test)]
mod tests {
    use async_graphql::{Name, Value};

    use super::parse_default_value;

    #[test]
    fn default_values() {
        assert_eq!(Some(Value::from(10)), parse_default_value("10"));
        assert_eq!(Some(Value::Enum(Name::new("DESC"))), parse_default_value("DESC"));
        assert_eq!(Some(Value::from("a \"b\"")), parse_default_value(r#""a \"b\"""#));
        assert_eq!(
            Some(Value::List(vec![Value::from(1), Value::from(2)])),
            parse_default_value("[1, 2]")
        );
        assert_eq!(None, parse_default_value("$variable"));
        assert_eq!(None, parse_default_value("{"));
    }
}
