//! Federated schema manager
//!
//! Owns the base SDL text, its parsed document, and the list of bindable
//! types, and produces the executable schema. Every build re-runs
//! composition and the bind step from scratch; schema evolution means
//! constructing a new manager.

use crate::binding::{Bindable, ObjectType, UnionType};
use crate::dispatch;
use crate::error::Result;
use crate::schema::{build_executable_schema, DynamicSchema};
use crate::sdl::{self, ENTITY_UNION};
use async_graphql::parser::parse_schema;
use async_graphql::parser::types::ServiceDocument;
use std::path::Path;

/// Top-level orchestrator for a federated subgraph schema.
///
/// Construction parses the base SDL and scans it for `@key`-annotated
/// object types. Bindable types accumulate through [`add_type`] and
/// [`add_types`]; [`get_schema`] composes the federation SDL and delegates
/// to the executable-schema builder with the full list.
///
/// [`add_type`]: FederatedSchemaManager::add_type
/// [`add_types`]: FederatedSchemaManager::add_types
/// [`get_schema`]: FederatedSchemaManager::get_schema
pub struct FederatedSchemaManager {
    sdl: String,
    document: ServiceDocument,
    federated_types: Vec<String>,
    query_binding: ObjectType,
    bindables: Vec<Box<dyn Bindable>>,
}

impl std::fmt::Debug for FederatedSchemaManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederatedSchemaManager")
            .field("federated_types", &self.federated_types)
            .field("bindables", &self.bindables.len())
            .finish_non_exhaustive()
    }
}

impl FederatedSchemaManager {
    /// Parse the base SDL and scan it for federated types.
    ///
    /// Fails fast on unparsable SDL; no partially-constructed manager
    /// exists afterwards.
    pub fn new(sdl: impl Into<String>, query_binding: ObjectType) -> Result<Self> {
        let sdl = sdl.into();
        let document = parse_schema(&sdl)?;
        let federated_types = sdl::federated_type_names(&document);

        tracing::info!(
            federated_types = federated_types.len(),
            "parsed base schema"
        );

        Ok(Self {
            sdl,
            document,
            federated_types,
            query_binding,
            bindables: Vec::new(),
        })
    }

    /// Read the base SDL from a file
    pub fn from_file(path: impl AsRef<Path>, query_binding: ObjectType) -> Result<Self> {
        let sdl = std::fs::read_to_string(path)?;
        Self::new(sdl, query_binding)
    }

    /// The original base SDL text, as handed to the constructor
    pub fn sdl(&self) -> &str {
        &self.sdl
    }

    /// Names of the `@key`-annotated object types, in discovery order
    pub fn federated_types(&self) -> &[String] {
        &self.federated_types
    }

    /// Add a bindable type.
    ///
    /// Takes effect on the next [`get_schema`] call.
    ///
    /// [`get_schema`]: FederatedSchemaManager::get_schema
    pub fn add_type(&mut self, bindable: impl Bindable + 'static) -> &mut Self {
        self.bindables.push(Box::new(bindable));
        self
    }

    /// Add several bindable types at once
    pub fn add_types<I>(&mut self, bindables: I) -> &mut Self
    where
        I: IntoIterator<Item = Box<dyn Bindable>>,
    {
        self.bindables.extend(bindables);
        self
    }

    /// Compose the federation SDL and build the executable schema.
    ///
    /// Attaches the `_service` resolver to the query root and, when
    /// federated types exist, the `_entities` dispatcher and the `_Entity`
    /// union with its type resolver. Nothing is cached between calls.
    pub fn get_schema(&self) -> Result<DynamicSchema> {
        let mut query = self
            .query_binding
            .clone()
            .field_fn("_service", dispatch::service_resolver(self.sdl.clone()));

        let mut entity_union = None;
        if !self.federated_types.is_empty() {
            query = query.field_fn("_entities", dispatch::entities_resolver());
            entity_union =
                Some(UnionType::new(ENTITY_UNION).with_type_resolver(dispatch::entity_type_name));
        }

        let composed = sdl::compose(
            &self.sdl,
            &self.federated_types,
            sdl::has_query_type(&self.document),
        );

        let mut bindables: Vec<&dyn Bindable> = Vec::with_capacity(self.bindables.len() + 2);
        bindables.push(&query);
        bindables.extend(self.bindables.iter().map(|bindable| bindable.as_ref()));
        if let Some(union) = &entity_union {
            bindables.push(union);
        }

        build_executable_schema(&composed, &bindables)
    }
}
