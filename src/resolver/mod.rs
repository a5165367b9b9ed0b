use tracing::debug;

use crate::ast::{Cardinality, EntityKind, RelationPoint, Schema};
use crate::error::{GeneratorError, Result};

/// Cross-link every relation with its counterpart declaration.
///
/// For a relation declared on `S` pointing at `T`, exactly one relation on
/// `T` must point back at `S`; its target point becomes the source point of
/// the relation on `S`. Enum-cardinality relations at enum entities have no
/// counterpart to look up (enums only hold scalar members), their source
/// point is synthesised instead.
pub fn resolve_relations(schema: &mut Schema) -> Result<()> {
    let mut resolved: Vec<(String, String, RelationPoint)> = Vec::new();

    for (source_name, source) in &schema.entities {
        for (relation_name, relation) in &source.relations {
            let target_name = &relation.target.entity;

            let target = schema
                .entities
                .get(target_name)
                .ok_or_else(|| GeneratorError::UnknownEntity {
                    entity: target_name.clone(),
                    referenced_by: format!("{}.{}", source_name, relation_name),
                })?;

            if relation.target.cardinality == Cardinality::Enum && target.kind == EntityKind::Enum {
                let point = RelationPoint::new(source_name.clone(), "", Cardinality::Many);
                resolved.push((source_name.clone(), relation_name.clone(), point));
                continue;
            }

            let mut counterparts = target
                .relations
                .values()
                .filter(|candidate| &candidate.target.entity == source_name);

            let counterpart = match (counterparts.next(), counterparts.next()) {
                (Some(counterpart), None) => counterpart,
                (None, _) => {
                    return Err(GeneratorError::MissingRelation {
                        entity: source_name.clone(),
                        target: target_name.clone(),
                    })
                }
                (Some(_), Some(_)) => {
                    return Err(GeneratorError::AmbiguousRelation {
                        entity: source_name.clone(),
                        target: target_name.clone(),
                    })
                }
            };

            debug!(
                relation = %format!("{}.{}", source_name, relation_name),
                inverse = %counterpart.target,
                "resolved relation"
            );

            resolved.push((
                source_name.clone(),
                relation_name.clone(),
                counterpart.target.clone(),
            ));
        }
    }

    for (entity_name, relation_name, point) in resolved {
        if let Some(relation) = schema
            .entities
            .get_mut(&entity_name)
            .and_then(|entity| entity.relations.get_mut(&relation_name))
        {
            relation.source.inverse(&point);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_entities;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn resolved(raw: serde_json::Value) -> Result<Schema> {
        let mut schema = parse_entities(&raw)?;
        resolve_relations(&mut schema)?;
        Ok(schema)
    }

    #[test]
    fn test_one_to_many_is_symmetric() {
        let schema = resolved(json!({
            "User": {
                "name": {"type": "string"},
                "posts": {"relation": "many", "target": "Post"},
            },
            "Post": {
                "title": {"type": "string"},
                "author": {"relation": "one", "target": "User"},
            },
        }))
        .unwrap();

        let posts = &schema.entities["User"].relations["posts"];
        let author = &schema.entities["Post"].relations["author"];

        assert_eq!(posts.source, RelationPoint::new("User", "author", Cardinality::One));
        assert_eq!(posts.target, RelationPoint::new("Post", "posts", Cardinality::Many));

        // equal and opposite
        assert_eq!(author.source, posts.target);
        assert_eq!(author.target, posts.source);
        assert_eq!(posts.canonical_id(), author.canonical_id());
    }

    #[test]
    fn test_missing_inverse_fails() {
        let err = resolved(json!({
            "User": {"posts": {"relation": "many", "target": "Post"}},
            "Post": {"title": {"type": "string"}},
        }))
        .unwrap_err();

        match err {
            GeneratorError::MissingRelation { entity, target } => {
                assert_eq!(entity, "User");
                assert_eq!(target, "Post");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ambiguous_inverse_fails() {
        let err = resolved(json!({
            "User": {"posts": {"relation": "many", "target": "Post"}},
            "Post": {
                "author": {"relation": "one", "target": "User"},
                "editor": {"relation": "one", "target": "User"},
            },
        }))
        .unwrap_err();

        assert!(matches!(err, GeneratorError::AmbiguousRelation { .. }));
    }

    #[test]
    fn test_ambiguous_inverse_fails_regardless_of_order() {
        let err = resolved(json!({
            "Post": {
                "author": {"relation": "one", "target": "User"},
                "editor": {"relation": "one", "target": "User"},
            },
            "User": {"posts": {"relation": "many", "target": "Post"}},
        }))
        .unwrap_err();

        assert!(matches!(err, GeneratorError::AmbiguousRelation { .. }));
    }

    #[test]
    fn test_unknown_target_fails() {
        let err = resolved(json!({
            "User": {"posts": {"relation": "many", "target": "Ghost"}},
        }))
        .unwrap_err();

        assert!(matches!(err, GeneratorError::UnknownEntity { .. }));
    }

    #[test]
    fn test_enum_relation_needs_no_inverse() {
        let schema = resolved(json!({
            "Status": {"ACTIVE": 1, "BLOCKED": 2},
            "User": {"status": {"relation": "enum", "target": "Status"}},
        }))
        .unwrap();

        let status = &schema.entities["User"].relations["status"];
        assert_eq!(status.source.entity, "User");
        assert_eq!(status.source.cardinality, Cardinality::Many);
        assert_eq!(status.target.cardinality, Cardinality::Enum);
    }

    #[test]
    fn test_many_to_many() {
        let schema = resolved(json!({
            "Tag": {"posts": {"relation": "many", "target": "Post"}},
            "Post": {"tags": {"relation": "many", "target": "Tag"}},
        }))
        .unwrap();

        let tags = &schema.entities["Post"].relations["tags"];
        assert_eq!(tags.source, RelationPoint::new("Post", "posts", Cardinality::Many));
        assert_eq!(tags.target, RelationPoint::new("Tag", "tags", Cardinality::Many));
    }
}
