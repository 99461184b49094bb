//! Entity resolution dispatch
//!
//! Implements the `_entities` root-field resolver: groups the incoming
//! representation list by `__typename`, routes each group to the reference
//! resolver bound for that type, and concatenates the results. Groups whose
//! type has no bound resolver contribute nothing - the gateway owns strict
//! validation if it wants it.
//!
//! Ordering: entities within one group keep the group's input order (and
//! the resolver's return order); groups are emitted in the order their type
//! name first appeared in the input. There is no stable interleave across
//! groups.

use crate::error::{Error, Result};
use crate::sdl::ENTITY_UNION;
use crate::types::{FieldResolverFn, Representation, ResolvedValue, ResolverParams};
use async_graphql::indexmap::IndexMap;
use async_graphql::Value as GqlValue;
use futures::FutureExt;
use std::sync::Arc;

/// Build the `_entities` field resolver
pub(crate) fn entities_resolver() -> FieldResolverFn {
    Arc::new(|params| resolve_entities(params).boxed())
}

/// Build the `_service` field resolver returning the original SDL verbatim
pub(crate) fn service_resolver(sdl: String) -> FieldResolverFn {
    let sdl = Arc::new(sdl);
    Arc::new(move |_params| {
        let sdl = Arc::clone(&sdl);
        async move {
            let mut service = IndexMap::new();
            service.insert(
                async_graphql::Name::new("sdl"),
                GqlValue::String(sdl.as_ref().clone()),
            );
            Ok(ResolvedValue::Value(GqlValue::Object(service)))
        }
        .boxed()
    })
}

/// Default `_Entity` type resolver: an entity that carries its own
/// `__typename` string resolves to that name, otherwise to the type name of
/// the representation group it was resolved for.
pub(crate) fn entity_type_name(entity: &GqlValue, group_type: &str) -> String {
    if let GqlValue::Object(map) = entity {
        if let Some(GqlValue::String(name)) = map.get("__typename") {
            return name.clone();
        }
    }
    group_type.to_string()
}

async fn resolve_entities(params: ResolverParams) -> Result<ResolvedValue> {
    let representations = match params.args.get("representations") {
        Some(GqlValue::List(items)) => items.clone(),
        _ => {
            return Err(Error::InvalidRequest(
                "missing representations argument".into(),
            ))
        }
    };

    let groups = group_representations(representations)?;
    let registry = params.info.registry_handle();

    let mut entities = Vec::new();
    for (type_name, group) in groups {
        let Some(resolver) = registry.reference_resolver(&type_name) else {
            tracing::warn!(
                type_name = %type_name,
                "no reference resolver bound for representation group, skipping"
            );
            continue;
        };

        tracing::debug!(
            type_name = %type_name,
            count = group.len(),
            "dispatching representation group"
        );

        let resolved = resolver.resolve_references(group, params.info.clone()).await?;
        for entity in resolved {
            if entity == GqlValue::Null {
                entities.push(ResolvedValue::Value(GqlValue::Null));
                continue;
            }
            let member = registry
                .type_resolver(ENTITY_UNION)
                .map(|resolve| resolve(&entity, &type_name))
                .unwrap_or_else(|| type_name.clone());
            entities.push(ResolvedValue::Typed(entity, member));
        }
    }

    Ok(ResolvedValue::List(entities))
}

/// Group representations by their stripped `__typename`, preserving input
/// order within each group and first-appearance order across groups.
fn group_representations(
    representations: Vec<GqlValue>,
) -> Result<IndexMap<String, Vec<Representation>>> {
    let mut groups: IndexMap<String, Vec<Representation>> = IndexMap::new();
    for representation in representations {
        let GqlValue::Object(mut map) = representation else {
            return Err(Error::InvalidRequest(
                "representation must be an object".into(),
            ));
        };
        let type_name = match map.shift_remove("__typename") {
            Some(GqlValue::String(name)) => name,
            _ => {
                return Err(Error::InvalidRequest(
                    "missing __typename in representation".into(),
                ))
            }
        };
        groups.entry(type_name).or_default().push(map);
    }
    Ok(groups)
}
