//! Bindable type descriptors and the resolver registry
//!
//! Bindable types are named descriptors the caller hands to the schema
//! build step. Each one contributes its resolvers to a [`ResolverRegistry`]
//! during the bind step; the registry is the single lookup surface used at
//! request time. Compiled type objects are never mutated - resolvers live
//! in this side-table keyed by type name.

use crate::error::Result;
use crate::resolver::{IntoBatchResolver, IntoSingleResolver, ReferenceResolver};
use crate::types::{FieldResolverFn, ResolvedValue, ResolverParams, TypeResolverFn};
use async_graphql::indexmap::IndexMap;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Side-table of resolvers attached during the schema-build bind step.
///
/// Read-only once the executable schema exists; request-time dispatch only
/// performs lookups.
#[derive(Default)]
pub struct ResolverRegistry {
    reference_resolvers: HashMap<String, Arc<dyn ReferenceResolver>>,
    field_resolvers: HashMap<String, HashMap<String, FieldResolverFn>>,
    type_resolvers: HashMap<String, TypeResolverFn>,
}

impl ResolverRegistry {
    /// Attach a reference resolver to a type name
    pub fn bind_reference_resolver(
        &mut self,
        type_name: impl Into<String>,
        resolver: Arc<dyn ReferenceResolver>,
    ) {
        self.reference_resolvers.insert(type_name.into(), resolver);
    }

    /// Look up the reference resolver bound to a type name
    pub fn reference_resolver(&self, type_name: &str) -> Option<Arc<dyn ReferenceResolver>> {
        self.reference_resolvers.get(type_name).cloned()
    }

    /// Attach a field resolver to a (type, field) pair
    pub fn bind_field_resolver(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: FieldResolverFn,
    ) {
        self.field_resolvers
            .entry(type_name.into())
            .or_default()
            .insert(field_name.into(), resolver);
    }

    /// Look up the field resolver bound to a (type, field) pair
    pub fn field_resolver(&self, type_name: &str, field_name: &str) -> Option<FieldResolverFn> {
        self.field_resolvers
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
            .cloned()
    }

    /// Attach a type resolver to an abstract type name
    pub fn bind_type_resolver(&mut self, type_name: impl Into<String>, resolver: TypeResolverFn) {
        self.type_resolvers.insert(type_name.into(), resolver);
    }

    /// Look up the type resolver bound to an abstract type name
    pub fn type_resolver(&self, type_name: &str) -> Option<TypeResolverFn> {
        self.type_resolvers.get(type_name).cloned()
    }
}

/// A named type descriptor that can be registered with the schema build
/// step.
///
/// `bind` runs exactly once per build, after the composed SDL has parsed,
/// and contributes the descriptor's resolvers to the registry. A descriptor
/// with nothing registered binds as a no-op.
pub trait Bindable: Send + Sync {
    /// The GraphQL type name this descriptor binds to
    fn name(&self) -> &str;

    /// Contribute resolvers to the registry
    fn bind(&self, registry: &mut ResolverRegistry) -> Result<()>;
}

/// An ordinary object type with per-field resolvers
#[derive(Clone)]
pub struct ObjectType {
    name: String,
    fields: IndexMap<String, FieldResolverFn>,
}

impl ObjectType {
    /// Create a descriptor for the object type with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Register a resolver for one of this type's fields
    pub fn field<F, Fut, R>(self, field_name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(ResolverParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
        R: Into<ResolvedValue> + Send + 'static,
    {
        let resolver: FieldResolverFn = Arc::new(move |params| {
            let fut = resolver(params);
            async move { fut.await.map(Into::into) }.boxed()
        });
        self.field_fn(field_name, resolver)
    }

    pub(crate) fn field_fn(mut self, field_name: impl Into<String>, resolver: FieldResolverFn) -> Self {
        self.fields.insert(field_name.into(), resolver);
        self
    }
}

impl Bindable for ObjectType {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&self, registry: &mut ResolverRegistry) -> Result<()> {
        for (field_name, resolver) in &self.fields {
            registry.bind_field_resolver(&self.name, field_name, Arc::clone(resolver));
        }
        Ok(())
    }
}

/// An object type that participates in federation.
///
/// Wraps [`ObjectType`] and optionally carries one reference resolver,
/// registered in either single or batch mode. Registering a second time
/// replaces the stored resolver - last write wins, whichever mode it used.
#[derive(Clone)]
pub struct FederatedObjectType {
    object: ObjectType,
    reference_resolver: Option<Arc<dyn ReferenceResolver>>,
}

impl FederatedObjectType {
    /// Create a descriptor for the federated object type with the given
    /// name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: ObjectType::new(name),
            reference_resolver: None,
        }
    }

    /// Register a resolver for one of this type's fields
    pub fn field<F, Fut, R>(mut self, field_name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(ResolverParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
        R: Into<ResolvedValue> + Send + 'static,
    {
        self.object = self.object.field(field_name, resolver);
        self
    }

    /// Register a single-mode reference resolver.
    ///
    /// The resolver is called once per representation in a group; results
    /// are collected in input order.
    pub fn register_single<Shape>(mut self, resolver: impl IntoSingleResolver<Shape>) -> Self {
        self.reference_resolver = Some(resolver.into_reference_resolver());
        self
    }

    /// Register a batch-mode reference resolver.
    ///
    /// The resolver is called once with the full ordered representation
    /// list for its group and must return entities in matching order.
    pub fn register_batch<Shape>(mut self, resolver: impl IntoBatchResolver<Shape>) -> Self {
        self.reference_resolver = Some(resolver.into_reference_resolver());
        self
    }

    /// Register an already-normalized reference resolver
    pub fn register_reference_resolver(mut self, resolver: Arc<dyn ReferenceResolver>) -> Self {
        self.reference_resolver = Some(resolver);
        self
    }
}

impl Bindable for FederatedObjectType {
    fn name(&self) -> &str {
        self.object.name()
    }

    fn bind(&self, registry: &mut ResolverRegistry) -> Result<()> {
        self.object.bind(registry)?;
        if let Some(resolver) = &self.reference_resolver {
            registry.bind_reference_resolver(self.object.name(), Arc::clone(resolver));
        }
        Ok(())
    }
}

/// A union type with an optional type resolver
#[derive(Clone)]
pub struct UnionType {
    name: String,
    type_resolver: Option<TypeResolverFn>,
}

impl UnionType {
    /// Create a descriptor for the union type with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_resolver: None,
        }
    }

    /// Register the function mapping a resolved value to its member type
    /// name
    pub fn with_type_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&async_graphql::Value, &str) -> String + Send + Sync + 'static,
    {
        self.type_resolver = Some(Arc::new(resolver));
        self
    }
}

impl Bindable for UnionType {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&self, registry: &mut ResolverRegistry) -> Result<()> {
        if let Some(resolver) = &self.type_resolver {
            registry.bind_type_resolver(&self.name, Arc::clone(resolver));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{Representation, ResolveInfo};
    use async_graphql::{Name, Value};

    fn info_with(registry: ResolverRegistry) -> ResolveInfo {
        ResolveInfo::new("Query", "_entities", Arc::new(registry))
    }

    #[tokio::test]
    async fn bind_attaches_reference_resolver_under_type_name() {
        let user = FederatedObjectType::new("User").register_single(
            |representation: Representation| async move {
                Ok::<_, Error>(Value::Object(representation))
            },
        );

        let mut registry = ResolverRegistry::default();
        user.bind(&mut registry).unwrap();

        assert!(registry.reference_resolver("User").is_some());
        assert!(registry.reference_resolver("Photo").is_none());
    }

    #[tokio::test]
    async fn bind_without_reference_resolver_is_a_no_op() {
        let user = FederatedObjectType::new("User");
        let mut registry = ResolverRegistry::default();
        user.bind(&mut registry).unwrap();
        assert!(registry.reference_resolver("User").is_none());
    }

    #[tokio::test]
    async fn second_registration_wins() {
        let user = FederatedObjectType::new("User")
            .register_single(|_representation: Representation| async move {
                Ok::<_, Error>(Value::String("single".into()))
            })
            .register_batch(|representations: Vec<Representation>| async move {
                Ok::<_, Error>(vec![Value::String("batch".into()); representations.len()])
            });

        let mut registry = ResolverRegistry::default();
        user.bind(&mut registry).unwrap();

        let resolver = registry.reference_resolver("User").unwrap();
        let mut representation = Representation::new();
        representation.insert(Name::new("id"), Value::from(1));
        let entities = resolver
            .resolve_references(vec![representation], info_with(ResolverRegistry::default()))
            .await
            .unwrap();
        assert_eq!(entities, vec![Value::String("batch".into())]);
    }

    #[test]
    fn object_type_field_resolvers_bind_per_field() {
        let query = ObjectType::new("Query").field("hello", |_params| async move {
            Ok::<_, Error>(Value::String("world".into()))
        });

        let mut registry = ResolverRegistry::default();
        query.bind(&mut registry).unwrap();

        assert!(registry.field_resolver("Query", "hello").is_some());
        assert!(registry.field_resolver("Query", "missing").is_none());
    }
}
