use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Request, Value as GqlValue};
use graphql_federation::{
    DynamicSchema, Error, FederatedObjectType, FederatedSchemaManager, ObjectType, Representation,
    ResolverParams,
};
use tracing::info;

const SCHEMA_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/subgraph.graphql");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .compact()
        .init();

    let users = Arc::new(seed_users());
    let reviews = Arc::new(seed_reviews());

    let me_users = Arc::clone(&users);
    let query = ObjectType::new("Query").field("me", move |_params: ResolverParams| {
        let users = Arc::clone(&me_users);
        async move { Ok::<_, Error>(users.get("u1").cloned().unwrap_or(GqlValue::Null)) }
    });

    let mut manager = FederatedSchemaManager::from_file(SCHEMA_PATH, query)?;
    info!(types = ?manager.federated_types(), "discovered federated types");

    let user_store = Arc::clone(&users);
    let user = FederatedObjectType::new("User").register_single(
        move |representation: Representation| {
            let users = Arc::clone(&user_store);
            async move {
                let id = required_str(&representation, "id")?;
                Ok(users.get(&id).cloned().unwrap_or(GqlValue::Null))
            }
        },
    );

    let review_store = Arc::clone(&reviews);
    let review = FederatedObjectType::new("Review").register_batch(
        move |representations: Vec<Representation>| {
            let reviews = Arc::clone(&review_store);
            async move {
                representations
                    .iter()
                    .map(|representation| {
                        let id = required_str(representation, "id")?;
                        Ok(reviews.get(&id).cloned().unwrap_or(GqlValue::Null))
                    })
                    .collect::<Result<Vec<_>, Error>>()
            }
        },
    );

    manager.add_type(user);
    manager.add_type(review);

    let schema = manager.get_schema()?;

    run(&schema, "{ me { id email name } }").await?;
    run(&schema, "{ _service { sdl } }").await?;
    run(
        &schema,
        r#"{
            _entities(representations: [
                { __typename: "User", id: "u1" },
                { __typename: "Review", id: "r1" },
                { __typename: "User", id: "u2" }
            ]) {
                __typename
                ... on User { id email name }
                ... on Review { id body rating }
            }
        }"#,
    )
    .await?;

    Ok(())
}

async fn run(schema: &DynamicSchema, query: &str) -> Result<()> {
    info!(%query, "executing");
    let response = schema.execute(Request::new(query)).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn required_str(representation: &Representation, key: &str) -> Result<String, Error> {
    match representation.get(key) {
        Some(GqlValue::String(value)) => Ok(value.clone()),
        _ => Err(Error::InvalidRequest(format!(
            "missing key {key} in representation"
        ))),
    }
}

fn seed_users() -> HashMap<String, GqlValue> {
    let mut users = HashMap::new();
    users.insert(
        "u1".to_string(),
        user_value("u1", "alice@example.com", "Alice"),
    );
    users.insert(
        "u2".to_string(),
        user_value("u2", "bob@example.com", "Bob"),
    );
    users
}

fn seed_reviews() -> HashMap<String, GqlValue> {
    let mut reviews = HashMap::new();
    reviews.insert(
        "r1".to_string(),
        review_value("r1", "Launches straight and true.", 5, "u2"),
    );
    reviews.insert(
        "r2".to_string(),
        review_value("r2", "Fits every mission checklist.", 4, "u1"),
    );
    reviews
}

fn user_value(id: &str, email: &str, name: &str) -> GqlValue {
    let mut map = IndexMap::new();
    map.insert(Name::new("id"), GqlValue::from(id));
    map.insert(Name::new("email"), GqlValue::from(email));
    map.insert(Name::new("name"), GqlValue::from(name));
    GqlValue::Object(map)
}

fn review_value(id: &str, body: &str, rating: i64, author_id: &str) -> GqlValue {
    let mut map = IndexMap::new();
    map.insert(Name::new("id"), GqlValue::from(id));
    map.insert(Name::new("body"), GqlValue::from(body));
    map.insert(Name::new("rating"), GqlValue::from(rating));
    map.insert(Name::new("authorId"), GqlValue::from(author_id));
    GqlValue::Object(map)
}
