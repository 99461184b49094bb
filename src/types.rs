//! Shared type definitions for federated schema composition and dispatch

use crate::binding::ResolverRegistry;
use crate::error::Result;
use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value as GqlValue};
use futures::future::BoxFuture;
use std::sync::Arc;

/// An entity representation supplied by a client request.
///
/// The gateway sends one map per entity reference. The `__typename` key
/// identifies the GraphQL type and is stripped before the map reaches a
/// reference resolver; all remaining keys pass through verbatim.
pub type Representation = IndexMap<Name, GqlValue>;

/// Request-scoped information handed to resolvers.
///
/// Carries the position being resolved plus a handle to the resolver
/// registry populated at schema-build time, so reference resolvers can
/// inspect what else is bound (the equivalent of walking the schema's
/// type map).
#[derive(Clone)]
pub struct ResolveInfo {
    parent_type: String,
    field_name: String,
    registry: Arc<ResolverRegistry>,
}

impl ResolveInfo {
    pub(crate) fn new(
        parent_type: impl Into<String>,
        field_name: impl Into<String>,
        registry: Arc<ResolverRegistry>,
    ) -> Self {
        Self {
            parent_type: parent_type.into(),
            field_name: field_name.into(),
            registry,
        }
    }

    /// Name of the type whose field is being resolved
    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }

    /// Name of the field being resolved
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The resolver registry built during the schema-build bind step
    pub fn registry(&self) -> &ResolverRegistry {
        &self.registry
    }

    pub(crate) fn registry_handle(&self) -> Arc<ResolverRegistry> {
        Arc::clone(&self.registry)
    }
}

impl std::fmt::Debug for ResolveInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveInfo")
            .field("parent_type", &self.parent_type)
            .field("field_name", &self.field_name)
            .finish_non_exhaustive()
    }
}

/// Arguments passed to a registered field resolver
pub struct ResolverParams {
    /// The parent object value, if the field is not on a root type
    pub parent: Option<GqlValue>,

    /// The field arguments, in declaration order
    pub args: IndexMap<Name, GqlValue>,

    /// Request-scoped resolve information
    pub info: ResolveInfo,
}

/// Output of a field resolver.
///
/// A plain [`GqlValue`] covers most fields; `Typed` tags a value with a
/// concrete object type name so abstract types (unions, interfaces) can be
/// resolved to a member type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    /// No value (the field resolves to null)
    None,
    /// A plain value
    Value(GqlValue),
    /// A value tagged with its concrete GraphQL type name
    Typed(GqlValue, String),
    /// A list of resolved values
    List(Vec<ResolvedValue>),
}

impl From<GqlValue> for ResolvedValue {
    fn from(value: GqlValue) -> Self {
        ResolvedValue::Value(value)
    }
}

/// Boxed field resolver stored in the registry
pub type FieldResolverFn =
    Arc<dyn Fn(ResolverParams) -> BoxFuture<'static, Result<ResolvedValue>> + Send + Sync>;

/// Maps a resolved entity value to its concrete GraphQL type name.
///
/// Receives the entity and the type name of the representation group it was
/// resolved for; returns the name to resolve the abstract type to.
pub type TypeResolverFn = Arc<dyn Fn(&GqlValue, &str) -> String + Send + Sync>;
