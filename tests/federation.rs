//! End-to-end tests for federated schema composition and entity resolution.

use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Request, Value as GqlValue};
use graphql_federation::{
    DynamicSchema, Error, FederatedObjectType, FederatedSchemaManager, ObjectType, Representation,
};
use serde_json::json;

const USER_SDL: &str = r#"type User @key(fields: "id") {
    id: ID!
    email: String!
}

type Photo {
    id: ID!
    url: String!
}
"#;

const PLAIN_SDL: &str = r#"type Query {
    photo: Photo
}

type Photo {
    id: ID!
    url: String!
}
"#;

fn user_value(id: &str) -> GqlValue {
    let mut map = IndexMap::new();
    map.insert(Name::new("id"), GqlValue::from(id));
    map.insert(
        Name::new("email"),
        GqlValue::from(format!("user{id}@example.com")),
    );
    GqlValue::Object(map)
}

fn representation_id(representation: &Representation) -> Result<String, Error> {
    match representation.get("id") {
        Some(GqlValue::String(id)) => Ok(id.clone()),
        _ => Err(Error::InvalidRequest("missing id in representation".into())),
    }
}

fn single_mode_user() -> FederatedObjectType {
    FederatedObjectType::new("User").register_single(
        |representation: Representation| async move {
            let id = representation_id(&representation)?;
            Ok(user_value(&id))
        },
    )
}

fn batch_mode_user() -> FederatedObjectType {
    FederatedObjectType::new("User").register_batch(
        |representations: Vec<Representation>| async move {
            representations
                .iter()
                .map(|representation| {
                    let id = representation_id(representation)?;
                    Ok(user_value(&id))
                })
                .collect::<Result<Vec<_>, Error>>()
        },
    )
}

async fn execute(schema: &DynamicSchema, query: &str) -> serde_json::Value {
    let response = schema.execute(Request::new(query)).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data.into_json().unwrap()
}

const ENTITIES_QUERY: &str = r#"{
    _entities(representations: [
        { __typename: "User", id: "1" },
        { __typename: "User", id: "2" },
        { __typename: "Photo", id: "3" }
    ]) {
        __typename
        ... on User { id email }
    }
}"#;

#[tokio::test]
async fn schema_without_federated_types_has_service_but_no_entities() {
    let manager = FederatedSchemaManager::new(PLAIN_SDL, ObjectType::new("Query")).unwrap();
    let schema = manager.get_schema().unwrap();

    let data = execute(
        &schema,
        r#"{
            query: __type(name: "Query") { fields { name } }
            entity: __type(name: "_Entity") { name }
        }"#,
    )
    .await;

    let fields: Vec<&str> = data["query"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|field| field["name"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"_service"));
    assert!(fields.contains(&"photo"));
    assert!(!fields.contains(&"_entities"));

    assert_eq!(data["entity"], serde_json::Value::Null);
}

#[tokio::test]
async fn base_schema_without_query_type_gets_a_fresh_one() {
    let manager = FederatedSchemaManager::new(USER_SDL, ObjectType::new("Query")).unwrap();
    let schema = manager.get_schema().unwrap();

    let data = execute(
        &schema,
        r#"{ __type(name: "Query") { fields { name } } }"#,
    )
    .await;

    let fields: Vec<&str> = data["__type"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|field| field["name"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"_service"));
    assert!(fields.contains(&"_entities"));
}

#[tokio::test]
async fn entity_union_contains_only_key_annotated_types() {
    let manager = FederatedSchemaManager::new(USER_SDL, ObjectType::new("Query")).unwrap();
    let schema = manager.get_schema().unwrap();

    let data = execute(
        &schema,
        r#"{ __type(name: "_Entity") { possibleTypes { name } } }"#,
    )
    .await;

    assert_eq!(
        data["__type"]["possibleTypes"],
        json!([{ "name": "User" }]),
        "Photo carries no @key and must stay out of the union"
    );
}

#[tokio::test]
async fn service_sdl_is_the_original_text_verbatim() {
    let manager = FederatedSchemaManager::new(USER_SDL, ObjectType::new("Query")).unwrap();
    let schema = manager.get_schema().unwrap();

    let data = execute(&schema, "{ _service { sdl } }").await;
    assert_eq!(data["_service"]["sdl"].as_str().unwrap(), USER_SDL);
}

#[tokio::test]
async fn service_sdl_is_verbatim_without_federated_types_too() {
    let manager = FederatedSchemaManager::new(PLAIN_SDL, ObjectType::new("Query")).unwrap();
    let schema = manager.get_schema().unwrap();

    let data = execute(&schema, "{ _service { sdl } }").await;
    assert_eq!(data["_service"]["sdl"].as_str().unwrap(), PLAIN_SDL);
}

#[tokio::test]
async fn empty_representations_resolve_to_an_empty_list() {
    let mut manager = FederatedSchemaManager::new(USER_SDL, ObjectType::new("Query")).unwrap();
    manager.add_type(single_mode_user());
    let schema = manager.get_schema().unwrap();

    let data = execute(&schema, "{ _entities(representations: []) { __typename } }").await;
    assert_eq!(data, json!({ "_entities": [] }));
}

#[tokio::test]
async fn groups_without_a_resolver_are_dropped_not_errored() {
    let mut manager = FederatedSchemaManager::new(USER_SDL, ObjectType::new("Query")).unwrap();
    manager.add_type(single_mode_user());
    let schema = manager.get_schema().unwrap();

    // Photo has no reference resolver bound, so its group contributes
    // nothing and does not fail the request.
    let data = execute(&schema, ENTITIES_QUERY).await;
    assert_eq!(
        data,
        json!({
            "_entities": [
                { "__typename": "User", "id": "1", "email": "user1@example.com" },
                { "__typename": "User", "id": "2", "email": "user2@example.com" }
            ]
        })
    );
}

#[tokio::test]
async fn single_and_batch_registration_behave_identically() {
    let mut single = FederatedSchemaManager::new(USER_SDL, ObjectType::new("Query")).unwrap();
    single.add_type(single_mode_user());

    let mut batch = FederatedSchemaManager::new(USER_SDL, ObjectType::new("Query")).unwrap();
    batch.add_type(batch_mode_user());

    let single_data = execute(&single.get_schema().unwrap(), ENTITIES_QUERY).await;
    let batch_data = execute(&batch.get_schema().unwrap(), ENTITIES_QUERY).await;

    assert_eq!(single_data, batch_data);
}

#[tokio::test]
async fn second_resolver_registration_replaces_the_first() {
    let user = FederatedObjectType::new("User")
        .register_single(|representation: Representation| async move {
            let id = representation_id(&representation)?;
            let mut map = IndexMap::new();
            map.insert(Name::new("id"), GqlValue::from(id));
            map.insert(Name::new("email"), GqlValue::from("single"));
            Ok(GqlValue::Object(map))
        })
        .register_batch(|representations: Vec<Representation>| async move {
            representations
                .iter()
                .map(|representation| {
                    let id = representation_id(representation)?;
                    let mut map = IndexMap::new();
                    map.insert(Name::new("id"), GqlValue::from(id));
                    map.insert(Name::new("email"), GqlValue::from("batch"));
                    Ok(GqlValue::Object(map))
                })
                .collect::<Result<Vec<_>, Error>>()
        });

    let mut manager = FederatedSchemaManager::new(USER_SDL, ObjectType::new("Query")).unwrap();
    manager.add_type(user);
    let schema = manager.get_schema().unwrap();

    let data = execute(
        &schema,
        r#"{ _entities(representations: [{ __typename: "User", id: "1" }]) { ... on User { email } } }"#,
    )
    .await;

    assert_eq!(data, json!({ "_entities": [{ "email": "batch" }] }));
}

#[tokio::test]
async fn types_added_after_a_build_apply_to_the_next_build() {
    let mut manager = FederatedSchemaManager::new(USER_SDL, ObjectType::new("Query")).unwrap();

    let query = r#"{ _entities(representations: [{ __typename: "User", id: "1" }]) { ... on User { id } } }"#;

    let before = manager.get_schema().unwrap();
    let data = execute(&before, query).await;
    assert_eq!(data, json!({ "_entities": [] }));

    manager.add_type(single_mode_user());

    let after = manager.get_schema().unwrap();
    let data = execute(&after, query).await;
    assert_eq!(data, json!({ "_entities": [{ "id": "1" }] }));
}

#[tokio::test]
async fn query_root_fields_survive_federation_injection() {
    let query = ObjectType::new("Query").field("photo", |_params| async move {
        let mut photo = IndexMap::new();
        photo.insert(Name::new("id"), GqlValue::from("p1"));
        photo.insert(Name::new("url"), GqlValue::from("https://example.com/p1"));
        Ok::<_, Error>(GqlValue::Object(photo))
    });

    let manager = FederatedSchemaManager::new(PLAIN_SDL, query).unwrap();
    let schema = manager.get_schema().unwrap();

    let data = execute(&schema, "{ photo { id url } }").await;
    assert_eq!(
        data,
        json!({ "photo": { "id": "p1", "url": "https://example.com/p1" } })
    );
}
