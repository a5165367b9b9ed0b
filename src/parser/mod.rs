use serde_json::{Map, Value};
use tracing::debug;

use crate::ast::{
    Cardinality, Entity, EntityField, EntityKind, EntityRelation, Modifier, RelationPoint, Schema,
    FIELD_TYPE_BOOLEAN, FIELD_TYPE_INTEGER, FIELD_TYPE_STRING, FIELD_TYPE_UNKNOWN,
};
use crate::error::{GeneratorError, Result};

/// Parse the raw `entities` mapping into an unresolved schema.
///
/// Relations come out one-sided: only their `target` point is filled in.
/// Run [`crate::resolver::resolve_relations`] afterwards.
pub fn parse_entities(raw: &Value) -> Result<Schema> {
    let raw_entities = raw.as_object().ok_or_else(|| {
        GeneratorError::InvalidSchema("`entities` must be a mapping of entity names".to_string())
    })?;

    let mut schema = Schema::new();

    for (entity_name, raw_fields) in raw_entities {
        let entity = parse_entity(entity_name, raw_fields)?;
        debug!(
            entity = %entity.name,
            kind = %entity.kind,
            fields = entity.fields.len(),
            relations = entity.relations.len(),
            "parsed entity"
        );
        schema.add_entity(entity);
    }

    Ok(schema)
}

fn parse_entity(entity_name: &str, raw_fields: &Value) -> Result<Entity> {
    // `Foo: ~` is an enum without members
    let empty = Map::new();
    let raw_fields = match raw_fields {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return Err(GeneratorError::InvalidSchema(format!(
                "entity `{}` must be a mapping of fields",
                entity_name
            )))
        }
    };

    let mut fields = Vec::new();
    let mut relations = Vec::new();
    let mut seen_scalar = false;
    let mut seen_structured = false;

    for (field_name, raw_field) in raw_fields {
        match raw_field {
            Value::Object(definition) => {
                if seen_scalar {
                    return Err(mix_error(entity_name, field_name));
                }
                seen_structured = true;

                if let Some(relation) = parse_relation(entity_name, field_name, definition)? {
                    relations.push(relation);
                } else {
                    fields.push(parse_field(entity_name, field_name, definition)?);
                }
            }
            scalar => {
                if seen_structured {
                    return Err(mix_error(entity_name, field_name));
                }
                seen_scalar = true;

                fields.push(parse_enum_member(entity_name, field_name, scalar)?);
            }
        }
    }

    let kind = if seen_structured {
        EntityKind::Entity
    } else {
        EntityKind::Enum
    };

    let mut entity = Entity::new(entity_name.to_string(), kind);
    for field in fields {
        entity.add_field(field);
    }
    for relation in relations {
        entity.add_relation(relation);
    }

    Ok(entity)
}

fn mix_error(entity: &str, field: &str) -> GeneratorError {
    GeneratorError::EnumEntityMix {
        entity: entity.to_string(),
        field: field.to_string(),
    }
}

/// A bare scalar is an enum member, exposed later as a class constant
fn parse_enum_member(entity: &str, field_name: &str, raw: &Value) -> Result<EntityField> {
    let field_type = match raw {
        Value::String(_) => FIELD_TYPE_STRING,
        Value::Number(_) => FIELD_TYPE_INTEGER,
        Value::Bool(_) => FIELD_TYPE_BOOLEAN,
        _ => FIELD_TYPE_UNKNOWN,
    };

    let value = serde_json::to_string(raw).map_err(|e| GeneratorError::InvalidScalar {
        entity: entity.to_string(),
        field: field_name.to_string(),
        message: e.to_string(),
    })?;

    Ok(EntityField {
        name: field_name.to_string(),
        field_type: field_type.to_string(),
        nullable: false,
        size: None,
        modifier: Modifier::Public,
        value: Some(value),
        raw_data: None,
    })
}

fn parse_relation(
    entity: &str,
    field_name: &str,
    definition: &Map<String, Value>,
) -> Result<Option<EntityRelation>> {
    let raw_relation = match definition.get("relation") {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let target_entity = require_str(entity, field_name, definition, "target")?;

    let cardinality = match raw_relation {
        Value::String(s) => Cardinality::parse(s),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).map(Cardinality::Fixed),
        _ => None,
    }
    .ok_or_else(|| GeneratorError::InvalidCardinality {
        entity: entity.to_string(),
        field: field_name.to_string(),
        value: raw_relation.to_string(),
    })?;

    Ok(Some(EntityRelation {
        // completed by the resolver
        source: RelationPoint::new(entity, "", Cardinality::One),
        target: RelationPoint::new(target_entity, field_name, cardinality),
    }))
}

fn parse_field(entity: &str, field_name: &str, definition: &Map<String, Value>) -> Result<EntityField> {
    let field_type = require_str(entity, field_name, definition, "type")?;

    let size = match definition.get("size") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(parse_size(raw).ok_or_else(|| GeneratorError::InvalidScalar {
            entity: entity.to_string(),
            field: field_name.to_string(),
            message: format!("`size` must be a positive integer, got {}", raw),
        })?),
    };

    let nullable = match definition.get("nullable") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s == "true" => true,
        Some(Value::String(s)) if s == "false" => false,
        Some(raw) => {
            return Err(GeneratorError::InvalidScalar {
                entity: entity.to_string(),
                field: field_name.to_string(),
                message: format!("`nullable` must be a boolean, got {}", raw),
            })
        }
    };

    let modifier = match definition.get("modifier") {
        None | Some(Value::Null) => Modifier::Protected,
        Some(raw) => {
            let text = scalar_to_string(raw).unwrap_or_default();
            Modifier::parse(&text).ok_or_else(|| GeneratorError::InvalidModifier {
                entity: entity.to_string(),
                field: field_name.to_string(),
                value: raw.to_string(),
            })?
        }
    };

    let value = definition
        .get("value")
        .and_then(scalar_to_string)
        .or_else(|| definition.get("target").and_then(scalar_to_string));

    Ok(EntityField {
        name: field_name.to_string(),
        field_type,
        nullable,
        size,
        modifier,
        value,
        raw_data: Some(definition.clone()),
    })
}

fn require_str(
    entity: &str,
    field_name: &str,
    definition: &Map<String, Value>,
    property: &str,
) -> Result<String> {
    match definition.get(property) {
        None | Some(Value::Null) => Err(GeneratorError::MissingProperty {
            entity: entity.to_string(),
            field: field_name.to_string(),
            property: property.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(raw) => Err(GeneratorError::InvalidScalar {
            entity: entity.to_string(),
            field: field_name.to_string(),
            message: format!("`{}` must be a string, got {}", property, raw),
        }),
    }
}

fn parse_size(raw: &Value) -> Option<u32> {
    match raw {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strings verbatim, numbers and booleans in their JSON spelling
fn scalar_to_string(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
