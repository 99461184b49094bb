//! Executable schema construction from SDL text.
//!
//! This module parses an SDL document and builds an `async-graphql` dynamic
//! schema from it. Type extensions are merged into their base definitions
//! first, then every definition is translated to its dynamic counterpart.
//! Object fields resolve through the [`ResolverRegistry`] populated by the
//! bind step; fields with no registered resolver fall back to a key lookup
//! in the parent object value.
//!
//! Directive declarations and applications are accepted in the SDL but not
//! re-emitted into the dynamic schema; execution does not depend on them.

use crate::binding::{Bindable, ResolverRegistry};
use crate::error::{Error, Result};
use crate::types::{ResolveInfo, ResolvedValue, ResolverParams};
use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, ResolverContext, Scalar, Schema as AsyncSchema, TypeRef, Union,
};
use async_graphql::indexmap::IndexMap;
use async_graphql::parser::parse_schema;
use async_graphql::parser::types::{
    BaseType, FieldDefinition, InputValueDefinition, SchemaDefinition, ServiceDocument,
    Type as AstType, TypeDefinition, TypeKind, TypeSystemDefinition,
};
use async_graphql::{Name, Value as GqlValue};
use std::sync::Arc;

/// Dynamic schema wrapper
#[derive(Clone)]
pub struct DynamicSchema {
    inner: AsyncSchema,
}

impl std::fmt::Debug for DynamicSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicSchema").finish_non_exhaustive()
    }
}

impl DynamicSchema {
    /// Execute a GraphQL request
    pub async fn execute(&self, request: async_graphql::Request) -> async_graphql::Response {
        self.inner.execute(request).await
    }

    /// Access the executor (used for HTTP/WS integration)
    pub fn executor(&self) -> AsyncSchema {
        self.inner.clone()
    }
}

/// Build an executable schema from SDL text and a set of bindable types.
///
/// Runs in order: parse the SDL, merge type extensions into their base
/// definitions, run every bindable's bind hook once, translate each
/// definition into its dynamic counterpart. Parse errors, duplicate type
/// definitions, extensions of undeclared types, and a missing query root
/// all fail the build.
pub fn build_executable_schema(sdl: &str, bindables: &[&dyn Bindable]) -> Result<DynamicSchema> {
    let document = parse_schema(sdl)?;
    let merged = merge_document(&document)?;

    if merged.subscription_root.is_some() {
        return Err(Error::Schema("subscription roots are not supported".into()));
    }

    let query_name = merged.query_root.unwrap_or("Query");
    if !matches!(
        merged.types.get(query_name),
        Some(MergedKind::Object { .. })
    ) {
        return Err(Error::Schema(format!(
            "query root type {query_name} is not defined"
        )));
    }

    let mutation_name = match merged.mutation_root {
        Some(name) => {
            if !matches!(merged.types.get(name), Some(MergedKind::Object { .. })) {
                return Err(Error::Schema(format!(
                    "mutation root type {name} is not defined"
                )));
            }
            Some(name)
        }
        None => merged
            .types
            .get("Mutation")
            .and_then(|kind| matches!(kind, MergedKind::Object { .. }).then_some("Mutation")),
    };

    let mut registry = ResolverRegistry::default();
    for bindable in bindables {
        if !merged.types.contains_key(bindable.name()) {
            tracing::warn!(
                type_name = bindable.name(),
                "bindable type is not declared in the schema"
            );
        }
        tracing::debug!(type_name = bindable.name(), "running bind hook");
        bindable.bind(&mut registry)?;
    }
    let registry = Arc::new(registry);

    let mut builder = AsyncSchema::build(query_name, mutation_name, None::<&str>);

    for (name, kind) in &merged.types {
        builder = match kind {
            MergedKind::Scalar => builder.register(Scalar::new(*name)),
            MergedKind::Object { implements, fields } => {
                builder.register(build_object(name, implements, fields, &registry))
            }
            MergedKind::Interface { fields } => builder.register(build_interface(name, fields)),
            MergedKind::Union { members } => {
                let mut union = Union::new(*name);
                for member in members {
                    union = union.possible_type(*member);
                }
                builder.register(union)
            }
            MergedKind::Enum { values } => {
                let mut en = Enum::new(*name);
                for value in values {
                    en = en.item(EnumItem::new(*value));
                }
                builder.register(en)
            }
            MergedKind::InputObject { fields } => {
                let mut input = InputObject::new(*name);
                for field in fields {
                    input = input.field(input_value(field));
                }
                builder.register(input)
            }
        };
    }

    let schema = builder
        .finish()
        .map_err(|e| Error::Schema(format!("failed to build schema: {e}")))?;

    Ok(DynamicSchema { inner: schema })
}

#[derive(Default)]
struct MergedDocument<'a> {
    types: IndexMap<&'a str, MergedKind<'a>>,
    query_root: Option<&'a str>,
    mutation_root: Option<&'a str>,
    subscription_root: Option<&'a str>,
}

enum MergedKind<'a> {
    Scalar,
    Object {
        implements: Vec<&'a str>,
        fields: Vec<&'a FieldDefinition>,
    },
    Interface {
        fields: Vec<&'a FieldDefinition>,
    },
    Union {
        members: Vec<&'a str>,
    },
    Enum {
        values: Vec<&'a str>,
    },
    InputObject {
        fields: Vec<&'a InputValueDefinition>,
    },
}

/// Collect base definitions first, then fold every `extend` into its base.
/// Extensions may appear before the definition they extend.
fn merge_document(document: &ServiceDocument) -> Result<MergedDocument<'_>> {
    let mut merged = MergedDocument::default();

    for definition in &document.definitions {
        match definition {
            TypeSystemDefinition::Schema(schema_def) => merged.apply_roots(&schema_def.node),
            TypeSystemDefinition::Type(ty) if !ty.node.extend => {
                let name = ty.node.name.node.as_str();
                if merged.types.contains_key(name) {
                    return Err(Error::Schema(format!("duplicate type definition: {name}")));
                }
                merged.types.insert(name, MergedKind::from_definition(&ty.node));
            }
            _ => {}
        }
    }

    for definition in &document.definitions {
        let TypeSystemDefinition::Type(ty) = definition else {
            continue;
        };
        if !ty.node.extend {
            continue;
        }
        let name = ty.node.name.node.as_str();
        let Some(base) = merged.types.get_mut(name) else {
            return Err(Error::Schema(format!(
                "cannot extend undeclared type: {name}"
            )));
        };
        base.extend_with(&ty.node)?;
    }

    Ok(merged)
}

impl<'a> MergedDocument<'a> {
    fn apply_roots(&mut self, definition: &'a SchemaDefinition) {
        if let Some(query) = &definition.query {
            self.query_root = Some(query.node.as_str());
        }
        if let Some(mutation) = &definition.mutation {
            self.mutation_root = Some(mutation.node.as_str());
        }
        if let Some(subscription) = &definition.subscription {
            self.subscription_root = Some(subscription.node.as_str());
        }
    }
}

impl<'a> MergedKind<'a> {
    fn from_definition(definition: &'a TypeDefinition) -> Self {
        match &definition.kind {
            TypeKind::Scalar => MergedKind::Scalar,
            TypeKind::Object(object) => MergedKind::Object {
                implements: object.implements.iter().map(|n| n.node.as_str()).collect(),
                fields: object.fields.iter().map(|f| &f.node).collect(),
            },
            TypeKind::Interface(interface) => MergedKind::Interface {
                fields: interface.fields.iter().map(|f| &f.node).collect(),
            },
            TypeKind::Union(union) => MergedKind::Union {
                members: union.members.iter().map(|n| n.node.as_str()).collect(),
            },
            TypeKind::Enum(en) => MergedKind::Enum {
                values: en.values.iter().map(|v| v.node.value.node.as_str()).collect(),
            },
            TypeKind::InputObject(input) => MergedKind::InputObject {
                fields: input.fields.iter().map(|f| &f.node).collect(),
            },
        }
    }

    fn extend_with(&mut self, definition: &'a TypeDefinition) -> Result<()> {
        let name = definition.name.node.as_str();
        match (self, &definition.kind) {
            (MergedKind::Object { implements, fields }, TypeKind::Object(object)) => {
                implements.extend(object.implements.iter().map(|n| n.node.as_str()));
                fields.extend(object.fields.iter().map(|f| &f.node));
            }
            (MergedKind::Interface { fields }, TypeKind::Interface(interface)) => {
                fields.extend(interface.fields.iter().map(|f| &f.node));
            }
            (MergedKind::Union { members }, TypeKind::Union(union)) => {
                members.extend(union.members.iter().map(|n| n.node.as_str()));
            }
            (MergedKind::Enum { values }, TypeKind::Enum(en)) => {
                values.extend(en.values.iter().map(|v| v.node.value.node.as_str()));
            }
            (MergedKind::InputObject { fields }, TypeKind::InputObject(input)) => {
                fields.extend(input.fields.iter().map(|f| &f.node));
            }
            (MergedKind::Scalar, TypeKind::Scalar) => {}
            _ => {
                return Err(Error::Schema(format!(
                    "type extension kind mismatch for {name}"
                )))
            }
        }
        Ok(())
    }
}

fn build_object(
    name: &str,
    implements: &[&str],
    fields: &[&FieldDefinition],
    registry: &Arc<ResolverRegistry>,
) -> Object {
    let mut object = Object::new(name);
    for interface in implements {
        object = object.implement(*interface);
    }
    for field in fields {
        object = object.field(build_field(name, field, registry));
    }
    object
}

fn build_field(
    type_name: &str,
    definition: &FieldDefinition,
    registry: &Arc<ResolverRegistry>,
) -> Field {
    let field_name = definition.name.node.to_string();
    let resolver = registry.field_resolver(type_name, &field_name);
    let info = ResolveInfo::new(type_name, field_name.as_str(), Arc::clone(registry));
    let lookup_key = Name::new(&field_name);

    let mut field = Field::new(field_name, type_ref(&definition.ty.node), move |ctx| {
        let resolver = resolver.clone();
        let info = info.clone();
        let lookup_key = lookup_key.clone();
        FieldFuture::new(async move {
            let Some(resolver) = resolver else {
                return Ok(default_resolve(&ctx, &lookup_key));
            };

            let parent = ctx
                .parent_value
                .as_value()
                .filter(|value| **value != GqlValue::Null)
                .cloned();
            let mut args = IndexMap::new();
            for (name, value) in ctx.args.iter() {
                args.insert(name.clone(), value.as_value().clone());
            }

            let resolved = resolver(ResolverParams { parent, args, info })
                .await
                .map_err(|e| async_graphql::Error::new(e.to_string()))?;
            Ok(resolved_field_value(resolved))
        })
    });

    for argument in &definition.arguments {
        field = field.argument(input_value(&argument.node));
    }
    field
}

/// Default resolution rule: look the field up by name in the parent object
/// value.
fn default_resolve(ctx: &ResolverContext<'_>, field: &Name) -> Option<FieldValue<'static>> {
    let Some(GqlValue::Object(map)) = ctx.parent_value.as_value() else {
        return None;
    };
    match map.get(field) {
        Some(GqlValue::Null) | None => None,
        Some(value) => Some(FieldValue::value(value.clone())),
    }
}

fn resolved_field_value(resolved: ResolvedValue) -> Option<FieldValue<'static>> {
    match resolved {
        ResolvedValue::None => None,
        ResolvedValue::Value(GqlValue::Null) => None,
        ResolvedValue::Value(value) => Some(FieldValue::value(value)),
        ResolvedValue::Typed(value, type_name) => {
            Some(FieldValue::value(value).with_type(type_name))
        }
        ResolvedValue::List(items) => Some(FieldValue::list(
            items
                .into_iter()
                .map(|item| resolved_field_value(item).unwrap_or(FieldValue::NULL)),
        )),
    }
}

fn build_interface(name: &str, fields: &[&FieldDefinition]) -> Interface {
    let mut interface = Interface::new(name);
    for field in fields {
        let mut interface_field =
            InterfaceField::new(field.name.node.to_string(), type_ref(&field.ty.node));
        for argument in &field.arguments {
            interface_field = interface_field.argument(input_value(&argument.node));
        }
        interface = interface.field(interface_field);
    }
    interface
}

fn input_value(definition: &InputValueDefinition) -> InputValue {
    let mut input = InputValue::new(
        definition.name.node.to_string(),
        type_ref(&definition.ty.node),
    );
    if let Some(default) = &definition.default_value {
        input = input.default_value(default.node.clone());
    }
    input
}

fn type_ref(ty: &AstType) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::named(name.as_str()),
        BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };
    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}
