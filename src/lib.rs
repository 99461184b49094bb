//! # graphql_federation
//!
//! Apollo Federation support for SDL-first GraphQL services built on `async-graphql`.
//!
//! ## Features
//!
//! - **Schema Composition**: Injects the federation directives, `_Any`/`_FieldSet`
//!   scalars, `_Service` type, and (when `@key`-annotated types exist) the `_Entity`
//!   union into a base SDL schema
//! - **Entity Resolution**: Routes heterogeneous `_entities` representation batches
//!   to per-type reference resolvers
//! - **Resolver Normalization**: Accepts single-reference and batch reference
//!   resolvers, with or without a [`ResolveInfo`] argument, behind one calling
//!   convention
//! - **Service Metadata**: `_service { sdl }` returns the original base SDL verbatim
//!
//! ## Main Components
//!
//! - [`FederatedSchemaManager`]: The main entry point; owns the base SDL and the
//!   bindable type list and builds the executable schema.
//! - [`FederatedObjectType`]: An object type carrying an optional reference resolver.
//! - [`ObjectType`]: An ordinary object type with per-field resolvers.
//! - [`build_executable_schema`]: Low-level builder turning SDL text plus bindable
//!   types into a [`DynamicSchema`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use graphql_federation::{FederatedObjectType, FederatedSchemaManager, ObjectType, Representation};
//! use async_graphql::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sdl = r#"
//!         type User @key(fields: "id") {
//!             id: ID!
//!             email: String!
//!         }
//!     "#;
//!
//!     let mut manager = FederatedSchemaManager::new(sdl, ObjectType::new("Query"))?;
//!
//!     let user = FederatedObjectType::new("User").register_single(
//!         |representation: Representation| async move {
//!             Ok::<_, graphql_federation::Error>(Value::Object(representation))
//!         },
//!     );
//!     manager.add_type(user);
//!
//!     let schema = manager.get_schema()?;
//!     let response = schema
//!         .execute(async_graphql::Request::new("{ _service { sdl } }"))
//!         .await;
//!     println!("{}", serde_json::to_string(&response)?);
//!
//!     Ok(())
//! }
//! ```

pub mod binding;
mod dispatch;
pub mod error;
pub mod manager;
pub mod resolver;
pub mod schema;
pub mod sdl;
pub mod types;

pub use binding::{Bindable, FederatedObjectType, ObjectType, ResolverRegistry, UnionType};
pub use error::{Error, GraphQLError, Result};
pub use manager::FederatedSchemaManager;
pub use resolver::{IntoBatchResolver, IntoSingleResolver, ReferenceResolver};
pub use schema::{build_executable_schema, DynamicSchema};
pub use types::{Representation, ResolveInfo, ResolvedValue, ResolverParams};
