//! Federation SDL composition
//!
//! Scans the parsed base schema document for `@key`-annotated object types
//! and synthesizes the federation preamble (directive declarations, the
//! `_Any`/`_FieldSet` scalars, the `_Service` type, and - when federated
//! types exist - the `_Entity` union and the `_entities` query field). The
//! preamble is concatenated with the original SDL as text; the schema build
//! step re-parses the combined document.

use async_graphql::parser::types::{ServiceDocument, TypeKind, TypeSystemDefinition};

/// Name of the synthesized entity union
pub const ENTITY_UNION: &str = "_Entity";

/// Names of object-type definitions carrying a `@key` directive, in order
/// of first appearance in the document.
///
/// Type extensions are not scanned; a type federates through the directive
/// on its definition.
pub fn federated_type_names(document: &ServiceDocument) -> Vec<String> {
    let mut names = Vec::new();
    for definition in &document.definitions {
        let TypeSystemDefinition::Type(ty) = definition else {
            continue;
        };
        if ty.node.extend || !matches!(ty.node.kind, TypeKind::Object(_)) {
            continue;
        }
        let has_key = ty
            .node
            .directives
            .iter()
            .any(|directive| directive.node.name.node.as_str() == "key");
        if has_key {
            names.push(ty.node.name.node.to_string());
        }
    }
    names
}

/// Whether the document declares an object type named `Query`
pub fn has_query_type(document: &ServiceDocument) -> bool {
    document.definitions.iter().any(|definition| {
        matches!(
            definition,
            TypeSystemDefinition::Type(ty)
                if !ty.node.extend
                    && matches!(ty.node.kind, TypeKind::Object(_))
                    && ty.node.name.node.as_str() == "Query"
        )
    })
}

/// Compose the federation SDL for a base schema.
///
/// Pure function of the base SDL text, the federated type name set, and
/// whether the base document already declares `Query`. The output is the
/// federation preamble followed by the original SDL, unmodified.
pub fn compose(base_sdl: &str, federated_types: &[String], base_has_query: bool) -> String {
    let entity_union = if federated_types.is_empty() {
        String::new()
    } else {
        format!("union {ENTITY_UNION} = {}\n\n", federated_types.join(" | "))
    };

    let entities_field = if federated_types.is_empty() {
        ""
    } else {
        "_entities(representations: [_Any!]!): [_Entity]!\n  "
    };

    let extend = if base_has_query { "extend " } else { "" };

    format!(
        "directive @external on FIELD_DEFINITION\n\
         directive @requires(fields: _FieldSet!) on FIELD_DEFINITION\n\
         directive @provides(fields: _FieldSet!) on FIELD_DEFINITION\n\
         directive @key(fields: _FieldSet!) on OBJECT | INTERFACE\n\
         directive @extends on OBJECT\n\
         \n\
         scalar _Any\n\
         scalar _FieldSet\n\
         \n\
         {entity_union}\
         {extend}type Query {{\n  \
         {entities_field}_service: _Service!\n\
         }}\n\
         \n\
         type _Service {{\n  \
         sdl: String\n\
         }}\n\
         \n\
         {base_sdl}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::parser::parse_schema;

    const FEDERATED_SDL: &str = r#"
type User @key(fields: "id") @extends {
    id: ID! @external
    photos: [Photo]!
}

type Photo {
    id: ID!
    url: String!
    description: String
}
"#;

    const PLAIN_SDL: &str = r#"
type Query {
    photo(id: ID!): Photo
}

type Photo {
    id: ID!
    url: String!
}
"#;

    #[test]
    fn federated_types_are_key_annotated_objects_in_order() {
        let document = parse_schema(
            r#"
            type B @key(fields: "id") { id: ID! }
            interface I @key(fields: "id") { id: ID! }
            type A @key(fields: "id") { id: ID! }
            type C { id: ID! }
            "#,
        )
        .unwrap();

        assert_eq!(federated_type_names(&document), vec!["B", "A"]);
    }

    #[test]
    fn extensions_are_not_scanned_for_keys() {
        let document = parse_schema(
            r#"
            type User { id: ID! }
            extend type User @key(fields: "id") { name: String }
            "#,
        )
        .unwrap();

        assert!(federated_type_names(&document).is_empty());
    }

    #[test]
    fn query_detection_ignores_extensions() {
        let document = parse_schema("extend type Query { x: Int }\ntype Photo { id: ID! }").unwrap();
        assert!(!has_query_type(&document));

        let document = parse_schema("type Query { x: Int }").unwrap();
        assert!(has_query_type(&document));
    }

    #[test]
    fn compose_with_federated_types_declares_entity_machinery() {
        let document = parse_schema(FEDERATED_SDL).unwrap();
        let names = federated_type_names(&document);
        let composed = compose(FEDERATED_SDL, &names, has_query_type(&document));

        assert!(composed.contains("union _Entity = User"));
        assert!(composed.contains("_entities(representations: [_Any!]!): [_Entity]!"));
        assert!(composed.contains("_service: _Service!"));
        assert!(composed.contains("type Query {"));
        assert!(!composed.contains("extend type Query"));
        assert!(composed.ends_with(&format!("{FEDERATED_SDL}\n")));

        parse_schema(&composed).expect("composed SDL parses");
    }

    #[test]
    fn compose_without_federated_types_omits_entity_machinery() {
        let document = parse_schema(PLAIN_SDL).unwrap();
        let names = federated_type_names(&document);
        let composed = compose(PLAIN_SDL, &names, has_query_type(&document));

        assert!(!composed.contains("_Entity"));
        assert!(!composed.contains("_entities"));
        assert!(composed.contains("_service: _Service!"));
        assert!(composed.contains("extend type Query"));

        parse_schema(&composed).expect("composed SDL parses");
    }

    #[test]
    fn multiple_federated_types_join_in_discovery_order() {
        let sdl = r#"
            type User @key(fields: "id") { id: ID! }
            type Review @key(fields: "id") { id: ID! }
        "#;
        let document = parse_schema(sdl).unwrap();
        let composed = compose(sdl, &federated_type_names(&document), false);
        assert!(composed.contains("union _Entity = User | Review"));
    }
}
