use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field type marker for a reference to an enum entity (`type: enum, target: Status`)
pub const FIELD_TYPE_ENUM: &str = "enum";

pub const FIELD_TYPE_STRING: &str = "string";
pub const FIELD_TYPE_INTEGER: &str = "integer";
pub const FIELD_TYPE_BOOLEAN: &str = "boolean";
pub const FIELD_TYPE_UNKNOWN: &str = "unknown";

/// The whole entity graph, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub entities: IndexMap<String, Entity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub fields: IndexMap<String, EntityField>,
    pub relations: IndexMap<String, EntityRelation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Entity,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityField {
    pub name: String,
    pub field_type: String,
    pub nullable: bool,
    pub size: Option<u32>,
    pub modifier: Modifier,
    pub value: Option<String>,
    pub raw_data: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    Public,
    Protected,
    Private,
}

/// How many entities sit on one end of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    One,
    Many,
    Enum,
    /// Literal count, e.g. `relation: 2`
    Fixed(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationPoint {
    pub entity: String,
    pub name: String,
    pub cardinality: Cardinality,
}

/// One declared relation, seen from its owner entity.
///
/// `target` describes the far side as declared (`posts: {relation: many, target: Post}`
/// gives `Post posts [many]`). `source` describes the owner side; it is only
/// complete once the resolver copied it over from the counterpart declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRelation {
    pub source: RelationPoint,
    pub target: RelationPoint,
}

impl Schema {
    pub fn new() -> Self {
        Schema {
            entities: IndexMap::new(),
        }
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.name.clone(), entity);
    }

    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }
}

impl Entity {
    pub fn new(name: String, kind: EntityKind) -> Self {
        Entity {
            name,
            kind,
            fields: IndexMap::new(),
            relations: IndexMap::new(),
        }
    }

    pub fn add_field(&mut self, field: EntityField) {
        self.fields.insert(field.name.clone(), field);
    }

    /// Relations are keyed by the name of the field they create on this entity
    pub fn add_relation(&mut self, relation: EntityRelation) {
        self.relations.insert(relation.target.name.clone(), relation);
    }

    pub fn is_enum(&self) -> bool {
        self.kind == EntityKind::Enum
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Entity => write!(f, "entity"),
            EntityKind::Enum => write!(f, "enum"),
        }
    }
}

impl EntityField {
    /// A field pointing at an enum entity; its `value` holds the enum name
    pub fn is_enum_reference(&self) -> bool {
        self.field_type == FIELD_TYPE_ENUM
    }
}

impl Modifier {
    /// Parse `public`/`protected`/`private` or the UML symbols `+`/`#`/`-`
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "public" | "+" => Some(Modifier::Public),
            "protected" | "#" => Some(Modifier::Protected),
            "private" | "-" => Some(Modifier::Private),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Modifier::Public => '+',
            Modifier::Protected => '#',
            Modifier::Private => '-',
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
        }
    }
}

impl Cardinality {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "one" => Some(Cardinality::One),
            "many" => Some(Cardinality::Many),
            "enum" => Some(Cardinality::Enum),
            other => other.parse::<u32>().ok().map(Cardinality::Fixed),
        }
    }

    /// Collapse a literal count into `One` or `Many`
    pub fn normalized(&self) -> Cardinality {
        match self {
            Cardinality::Fixed(n) if *n <= 1 => Cardinality::One,
            Cardinality::Fixed(_) => Cardinality::Many,
            other => *other,
        }
    }

    pub fn is_many(&self) -> bool {
        self.normalized() == Cardinality::Many
    }

    /// Marker used on diagram relationship lines
    pub fn marker(&self) -> String {
        match self {
            Cardinality::One | Cardinality::Enum => "1".to_string(),
            Cardinality::Many => "n".to_string(),
            Cardinality::Fixed(n) => n.to_string(),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::One => write!(f, "one"),
            Cardinality::Many => write!(f, "many"),
            Cardinality::Enum => write!(f, "enum"),
            Cardinality::Fixed(n) => write!(f, "{}", n),
        }
    }
}

impl RelationPoint {
    pub fn new(entity: impl Into<String>, name: impl Into<String>, cardinality: Cardinality) -> Self {
        RelationPoint {
            entity: entity.into(),
            name: name.into(),
            cardinality,
        }
    }

    /// Take over the identity of the matching point of the counterpart relation
    pub fn inverse(&mut self, other: &RelationPoint) {
        self.name = other.name.clone();
        self.entity = other.entity.clone();
        self.cardinality = other.cardinality;
    }
}

impl fmt::Display for RelationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.entity, self.name, self.cardinality)
    }
}

impl EntityRelation {
    /// Identity of the relation that does not depend on the side it is seen from
    pub fn canonical_id(&self) -> String {
        let mut members = [self.source.to_string(), self.target.to_string()];
        members.sort();
        members.join(" -> ")
    }

    /// Like [`EntityRelation::canonical_id`] but blind to cardinalities, so two
    /// declarations disagreeing about them still map onto the same pair
    pub fn pair_id(&self) -> String {
        let mut members = [
            format!("{}.{}", self.source.entity, self.source.name),
            format!("{}.{}", self.target.entity, self.target.name),
        ];
        members.sort();
        members.join(" <-> ")
    }
}
