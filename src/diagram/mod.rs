//! PlantUML class diagram of the resolved entity graph
//!
//! Entities render as `class` blocks, enums as `enum` blocks. Every relation
//! becomes a single `A "1" -up- "n" B` line, however many sides declare it.

use indexmap::IndexMap;

use crate::ast::{Cardinality, Entity, EntityKind, Schema};
use crate::error::{GeneratorError, Result};

const PLANT_FIELD: &str = "field";
const PLANT_METHOD: &str = "method";

/// Generate the PlantUML text for a resolved schema.
///
/// Fails with [`GeneratorError::IncompatibleRelation`] when two declarations
/// of the same relation disagree about its cardinalities.
pub fn generate_plantuml(schema: &Schema) -> Result<String> {
    let mut lines: Vec<String> = vec![
        "@startuml".to_string(),
        String::new(),
        "title Entities".to_string(),
        String::new(),
        String::new(),
    ];

    for entity in schema.entities.values() {
        lines.extend(entity_block(entity));
    }

    lines.push(String::new());
    lines.push(String::new());

    lines.extend(relation_lines(schema)?);

    lines.push(String::new());
    lines.push("@enduml".to_string());

    Ok(lines.join("\n"))
}

fn entity_block(entity: &Entity) -> Vec<String> {
    let keyword = match entity.kind {
        EntityKind::Enum => "enum",
        EntityKind::Entity => "class",
    };

    let mut lines = vec![format!("{} {} {{", keyword, entity.name)];

    if entity.kind == EntityKind::Entity {
        lines.push(format!("  {{{}}}+integer id", PLANT_FIELD));
    }

    for field in entity.fields.values() {
        if entity.kind == EntityKind::Enum {
            lines.push(format!(
                "  {} = {}",
                field.name.to_uppercase(),
                enum_member_value(field.value.as_deref())
            ));
            continue;
        }

        let (plant_type, mut field_type) = if field.is_enum_reference() {
            (PLANT_METHOD, field.value.clone().unwrap_or_default())
        } else {
            (PLANT_FIELD, field.field_type.clone())
        };

        if let Some(size) = field.size.filter(|s| *s > 0) {
            field_type.push_str(&format!("({})", size));
        }

        let mut name = field.name.clone();
        if field.nullable {
            name.push_str(" [null]");
        }

        lines.push(format!(
            "  {{{}}}{}{} {}",
            plant_type,
            field.modifier.symbol(),
            field_type,
            name
        ));
    }

    for relation in entity.relations.values() {
        let target = &relation.target;
        let suffix = if target.cardinality.is_many() { "[]" } else { "" };

        lines.push(format!(
            "  {{{}}}#{}{} {}",
            PLANT_METHOD, target.entity, suffix, target.name
        ));
    }

    lines.push("}".to_string());
    lines.push(String::new());
    lines
}

/// Enum members are stored JSON encoded; show strings without quotes
fn enum_member_value(value: Option<&str>) -> String {
    let raw = value.unwrap_or("null");
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => raw.to_string(),
    }
}

fn relation_lines(schema: &Schema) -> Result<Vec<String>> {
    let mut relations: IndexMap<String, String> = IndexMap::new();

    for entity in schema.entities.values() {
        for relation in entity.relations.values() {
            let line = relation_line(
                (relation.source.entity.as_str(), relation.source.cardinality),
                (relation.target.entity.as_str(), relation.target.cardinality),
            );
            let id = relation.pair_id();

            if let Some(existing) = relations.get(&id) {
                if existing != &line {
                    return Err(GeneratorError::IncompatibleRelation { relation: line });
                }
            }

            relations.insert(id, line);
        }

        for field in entity.fields.values().filter(|f| f.is_enum_reference()) {
            let enum_name = field.value.as_deref().unwrap_or_default();
            let id = format!("{}.{} [enum]", entity.name, enum_name);

            relations.insert(
                id,
                relation_line(
                    (entity.name.as_str(), Cardinality::Many),
                    (enum_name, Cardinality::One),
                ),
            );
        }
    }

    let mut lines: Vec<String> = Vec::new();
    for line in relations.into_values() {
        if !lines.contains(&line) {
            lines.push(line);
        }
    }

    Ok(lines)
}

/// `A "1" -up- "n" B`, endpoints ordered by entity name
fn relation_line(a: (&str, Cardinality), b: (&str, Cardinality)) -> String {
    let (first, second) = if a.0 <= b.0 { (a, b) } else { (b, a) };

    format!(
        "{} \"{}\" -up- \"{}\" {}",
        first.0,
        first.1.marker(),
        second.1.marker(),
        second.0
    )
}
