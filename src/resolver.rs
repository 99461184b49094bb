//! Reference-resolver signature normalization
//!
//! Reference resolvers come in two call shapes (with or without
//! [`ResolveInfo`]) and two modes (single representation or full batch).
//! This module converts every accepted shape into one uniform internal
//! calling convention, the [`ReferenceResolver`] trait, so the entity
//! dispatcher only ever deals with batches.
//!
//! Shape detection happens at registration time through the trait system:
//! a callable that matches neither accepted shape is rejected by the
//! compiler instead of being miscalled at runtime.

use crate::error::Result;
use crate::types::{Representation, ResolveInfo};
use async_graphql::Value as GqlValue;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

/// Uniform internal calling convention for entity reference resolution.
///
/// Implementors receive the full ordered representation list for one
/// `__typename` group and must return entities in the same order.
#[async_trait::async_trait]
pub trait ReferenceResolver: Send + Sync {
    /// Resolve a group of representations into entities
    async fn resolve_references(
        &self,
        representations: Vec<Representation>,
        info: ResolveInfo,
    ) -> Result<Vec<GqlValue>>;
}

type SingleFn =
    Box<dyn Fn(Representation, ResolveInfo) -> BoxFuture<'static, Result<GqlValue>> + Send + Sync>;

type BatchFn = Box<
    dyn Fn(Vec<Representation>, ResolveInfo) -> BoxFuture<'static, Result<Vec<GqlValue>>>
        + Send
        + Sync,
>;

/// Marker for resolvers that take only the representation(s)
pub enum PlainShape {}

/// Marker for resolvers that also take [`ResolveInfo`]
pub enum InfoShape {}

/// Conversion of a single-mode resolver callable into the uniform
/// convention.
///
/// Implemented for `Fn(Representation) -> Future<Result<Value>>` and
/// `Fn(Representation, ResolveInfo) -> Future<Result<Value>>`. The
/// resulting adapter applies the callable to each representation in a
/// group individually and collects the entities in input order.
pub trait IntoSingleResolver<Shape> {
    fn into_reference_resolver(self) -> Arc<dyn ReferenceResolver>;
}

/// Conversion of a batch-mode resolver callable into the uniform
/// convention.
///
/// Implemented for `Fn(Vec<Representation>) -> Future<Result<Vec<Value>>>`
/// and `Fn(Vec<Representation>, ResolveInfo) -> Future<Result<Vec<Value>>>`.
/// The callable already expects the full group, so it is stored directly.
pub trait IntoBatchResolver<Shape> {
    fn into_reference_resolver(self) -> Arc<dyn ReferenceResolver>;
}

/// Adapter that applies a single-mode resolver once per representation
struct SingleAdapter {
    inner: SingleFn,
}

#[async_trait::async_trait]
impl ReferenceResolver for SingleAdapter {
    async fn resolve_references(
        &self,
        representations: Vec<Representation>,
        info: ResolveInfo,
    ) -> Result<Vec<GqlValue>> {
        let mut entities = Vec::with_capacity(representations.len());
        for representation in representations {
            entities.push((self.inner)(representation, info.clone()).await?);
        }
        Ok(entities)
    }
}

/// Adapter around a resolver that already accepts the full group
struct BatchAdapter {
    inner: BatchFn,
}

#[async_trait::async_trait]
impl ReferenceResolver for BatchAdapter {
    async fn resolve_references(
        &self,
        representations: Vec<Representation>,
        info: ResolveInfo,
    ) -> Result<Vec<GqlValue>> {
        (self.inner)(representations, info).await
    }
}

impl<F, Fut> IntoSingleResolver<PlainShape> for F
where
    F: Fn(Representation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<GqlValue>> + Send + 'static,
{
    fn into_reference_resolver(self) -> Arc<dyn ReferenceResolver> {
        let inner: SingleFn = Box::new(move |representation, _info| self(representation).boxed());
        Arc::new(SingleAdapter { inner })
    }
}

impl<F, Fut> IntoSingleResolver<InfoShape> for F
where
    F: Fn(Representation, ResolveInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<GqlValue>> + Send + 'static,
{
    fn into_reference_resolver(self) -> Arc<dyn ReferenceResolver> {
        let inner: SingleFn = Box::new(move |representation, info| self(representation, info).boxed());
        Arc::new(SingleAdapter { inner })
    }
}

impl<F, Fut> IntoBatchResolver<PlainShape> for F
where
    F: Fn(Vec<Representation>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<GqlValue>>> + Send + 'static,
{
    fn into_reference_resolver(self) -> Arc<dyn ReferenceResolver> {
        let inner: BatchFn = Box::new(move |representations, _info| self(representations).boxed());
        Arc::new(BatchAdapter { inner })
    }
}

impl<F, Fut> IntoBatchResolver<InfoShape> for F
where
    F: Fn(Vec<Representation>, ResolveInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<GqlValue>>> + Send + 'static,
{
    fn into_reference_resolver(self) -> Arc<dyn ReferenceResolver> {
        let inner: BatchFn =
            Box::new(move |representations, info| self(representations, info).boxed());
        Arc::new(BatchAdapter { inner })
    }
}
