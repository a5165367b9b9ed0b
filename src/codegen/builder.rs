use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use super::model::{ClassProperty, EntityClass, Import};
use super::render::{indent_lines, INDENT};
use super::types::{literal_value, php_type, zero_value, COLLECTION_DEFAULT};
use crate::ast::{Cardinality, Entity, EntityField, EntityKind, EntityRelation};
use crate::config::{join_namespace, GeneratorConfig};
use crate::error::{GeneratorError, Result};

const IMPORT_ORM: &str = "Doctrine\\ORM\\Mapping as ORM";
const IMPORT_ARRAY_COLLECTION: &str = "Doctrine\\Common\\Collections\\ArrayCollection";
const IMPORT_COLLECTION: &str = "Doctrine\\Common\\Collections\\Collection";
const IMPORT_SERVICE_REPOSITORY: &str =
    "Doctrine\\Bundle\\DoctrineBundle\\Repository\\ServiceEntityRepository";
const IMPORT_REGISTRY: &str = "Symfony\\Bridge\\Doctrine\\RegistryInterface";

/// Enum members are mapped as integer constants
const ENUM_CONSTANT_TYPE: &str = "int";

/// Raw field keys consumed by the generator itself, never passed through
const RESERVED_FIELD_KEYS: &[&str] = &[
    "type", "size", "nullable", "modifier", "value", "target", "relation",
];

/// Doctrine association, from the owner side's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// Which side of a symmetric association a property ends up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owning,
    Inverse,
}

/// Remembers symmetric associations already emitted during one run.
///
/// The first class to claim a canonical relation id owns it, whoever claims it
/// afterwards is the inverse side.
#[derive(Debug, Default)]
pub struct OwnershipTracker {
    seen: HashSet<String>,
}

/// Turns resolved entities into class models; one builder per generation run
#[derive(Debug)]
pub struct ClassBuilder<'a> {
    config: &'a GeneratorConfig,
    ownership: OwnershipTracker,
}

impl AssociationKind {
    /// `source` is the cardinality of the owner entity, `target` the one of
    /// the related entity. Enum cardinalities are not associations.
    pub fn from_cardinalities(source: Cardinality, target: Cardinality) -> Option<Self> {
        match (source.normalized(), target.normalized()) {
            (Cardinality::One, Cardinality::One) => Some(AssociationKind::OneToOne),
            (Cardinality::Many, Cardinality::One) => Some(AssociationKind::ManyToOne),
            (Cardinality::One, Cardinality::Many) => Some(AssociationKind::OneToMany),
            (Cardinality::Many, Cardinality::Many) => Some(AssociationKind::ManyToMany),
            _ => None,
        }
    }

    pub fn annotation_name(&self) -> &'static str {
        match self {
            AssociationKind::OneToOne => "OneToOne",
            AssociationKind::ManyToOne => "ManyToOne",
            AssociationKind::OneToMany => "OneToMany",
            AssociationKind::ManyToMany => "ManyToMany",
        }
    }
}

impl OwnershipTracker {
    pub fn new() -> Self {
        OwnershipTracker {
            seen: HashSet::new(),
        }
    }

    pub fn claim(&mut self, canonical_id: &str) -> Ownership {
        if self.seen.insert(canonical_id.to_string()) {
            Ownership::Owning
        } else {
            Ownership::Inverse
        }
    }
}

impl<'a> ClassBuilder<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        ClassBuilder {
            config,
            ownership: OwnershipTracker::new(),
        }
    }

    /// Build the regenerated class of an entity or enum
    pub fn build(&mut self, entity: &Entity) -> Result<EntityClass> {
        let class = match entity.kind {
            EntityKind::Enum => self.build_enum(entity)?,
            EntityKind::Entity => self.build_entity(entity)?,
        };

        debug!(
            class = %class.qualified_name(),
            properties = class.properties.len(),
            "built class"
        );

        Ok(class)
    }

    /// Enum members become class constants
    pub fn build_enum(&self, entity: &Entity) -> Result<EntityClass> {
        expect_kind(entity, EntityKind::Enum)?;

        let mut class = EntityClass::new(entity.name.clone(), self.config.enum_namespace());

        for field in entity.fields.values() {
            insert_property(
                &mut class,
                ClassProperty::constant(field.name.clone(), ENUM_CONSTANT_TYPE, field.value.clone()),
            )?;
        }

        Ok(class)
    }

    /// Abstract base class carrying fields, associations and accessors
    pub fn build_entity(&mut self, entity: &Entity) -> Result<EntityClass> {
        expect_kind(entity, EntityKind::Entity)?;

        let name = format!("{}{}", entity.name, self.config.class_postfix.entity);
        let mut class = EntityClass::new(name, self.config.base_namespace());
        class.annotations.push("@ORM\\MappedSuperclass()".to_string());

        class.imports.add(IMPORT_ORM)?;

        let has_collections = entity
            .relations
            .values()
            .any(|r| r.target.cardinality != Cardinality::Enum && r.target.cardinality.is_many());
        if has_collections {
            class.imports.add(IMPORT_ARRAY_COLLECTION)?;
            class.imports.add(IMPORT_COLLECTION)?;
        }

        for import in &self.config.imports {
            class.imports.add(import)?;
        }

        class.add_property(ClassProperty::new(
            "id",
            "int|null",
            None,
            vec![
                "@ORM\\Id()".to_string(),
                "@ORM\\GeneratedValue()".to_string(),
                "@ORM\\Column(type=\"integer\")".to_string(),
            ],
        ));

        for field in entity.fields.values() {
            let property = self.field_property(entity, field, &mut class)?;
            insert_property(&mut class, property)?;
        }

        for relation in entity.relations.values() {
            let property = self.relation_property(entity, relation, &mut class)?;
            insert_property(&mut class, property)?;
        }

        Ok(class)
    }

    /// Hand-maintained entity class extending the generated base
    pub fn build_final_entity(&self, entity: &Entity) -> Result<EntityClass> {
        expect_kind(entity, EntityKind::Entity)?;

        let base_name = format!("{}{}", entity.name, self.config.class_postfix.entity);
        let alias = format!("{}Generated", entity.name);
        let repository = join_namespace(&[
            &self.config.repository_namespace(),
            &self.repository_name(entity),
        ]);

        let mut class = EntityClass::new(entity.name.clone(), self.config.entity_namespace());
        class.modifiers.clear();
        class.generated_hint = false;
        class.imports.add(IMPORT_ORM)?;
        class.imports.register(Import {
            path: join_namespace(&[&self.config.base_namespace(), &base_name]),
            alias: alias.clone(),
        })?;
        class
            .annotations
            .push(format!("@ORM\\Entity(repositoryClass=\"{}\")", repository));
        class.extends = Some(alias);

        Ok(class)
    }

    /// Repository scaffold for an entity
    pub fn build_repository(&self, entity: &Entity) -> Result<EntityClass> {
        expect_kind(entity, EntityKind::Entity)?;

        let mut class = EntityClass::new(self.repository_name(entity), self.config.repository_namespace());
        class.modifiers.clear();
        class.generated_hint = false;
        class.imports.add(IMPORT_SERVICE_REPOSITORY)?;
        class.imports.add(IMPORT_REGISTRY)?;
        class
            .imports
            .add(&join_namespace(&[&self.config.entity_namespace(), &entity.name]))?;
        class.extends = Some("ServiceEntityRepository".to_string());

        let body = indent_lines(vec![
            "public function __construct(RegistryInterface $registry)".to_string(),
            "{".to_string(),
            format!("{}parent::__construct($registry, {}::class);", INDENT, entity.name),
            "}".to_string(),
        ]);
        class.body = Some(body.join("\n"));

        Ok(class)
    }

    pub fn repository_name(&self, entity: &Entity) -> String {
        format!("{}{}", entity.name, self.config.class_postfix.repository)
    }

    fn field_property(
        &self,
        entity: &Entity,
        field: &EntityField,
        class: &mut EntityClass,
    ) -> Result<ClassProperty> {
        let mut column: Vec<(String, String)> = Vec::new();
        let mut annotations = Vec::new();

        let (type_name, default) = if field.is_enum_reference() {
            let enum_name = field.value.clone().ok_or_else(|| GeneratorError::MissingProperty {
                entity: entity.name.clone(),
                field: field.name.clone(),
                property: "target".to_string(),
            })?;
            class
                .imports
                .add(&join_namespace(&[&self.config.enum_namespace(), &enum_name]))?;

            column.push(("type".to_string(), "\"integer\"".to_string()));
            annotations.push(format!("@see {}", enum_name));

            let default = if field.nullable { None } else { zero_value("int") };
            ("int".to_string(), default)
        } else {
            column.push(("type".to_string(), Value::String(field.field_type.clone()).to_string()));
            if let Some(size) = field.size {
                let key = match field.field_type.as_str() {
                    "decimal" | "float" => "precision",
                    _ => "length",
                };
                column.push((key.to_string(), size.to_string()));
            }
            column.extend(passthrough_attributes(field));

            let php = php_type(&field.field_type).to_string();
            let default = match &field.value {
                Some(value) => Some(literal_value(&php, value)),
                None if !field.nullable => zero_value(&php),
                None => None,
            };
            (php, default)
        };

        if field.nullable {
            column.push(("nullable".to_string(), "true".to_string()));
        }

        let column = column
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(", ");
        annotations.insert(0, format!("@ORM\\Column({})", column));

        let type_name = if field.nullable {
            format!("{}|null", type_name)
        } else {
            type_name
        };

        Ok(ClassProperty::new(field.name.clone(), type_name, default, annotations))
    }

    fn relation_property(
        &mut self,
        entity: &Entity,
        relation: &EntityRelation,
        class: &mut EntityClass,
    ) -> Result<ClassProperty> {
        let source = &relation.source;
        let target = &relation.target;

        if target.cardinality == Cardinality::Enum {
            class
                .imports
                .add(&join_namespace(&[&self.config.enum_namespace(), &target.entity]))?;

            return Ok(ClassProperty::new(
                target.name.clone(),
                "int|null",
                None,
                vec![
                    "@ORM\\Column(type=\"integer\", nullable=true)".to_string(),
                    format!("@see {}", target.entity),
                ],
            ));
        }

        class
            .imports
            .add(&join_namespace(&[&self.config.entity_namespace(), &target.entity]))?;

        let kind = AssociationKind::from_cardinalities(source.cardinality, target.cardinality)
            .ok_or_else(|| GeneratorError::UnsupportedAssociation {
                entity: entity.name.clone(),
                relation: format!("{} -> {}", source, target),
            })?;

        let mapping = match kind {
            AssociationKind::ManyToOne => "inversedBy",
            AssociationKind::OneToMany => "mappedBy",
            AssociationKind::OneToOne | AssociationKind::ManyToMany => {
                match self.ownership.claim(&relation.canonical_id()) {
                    Ownership::Owning => "inversedBy",
                    Ownership::Inverse => "mappedBy",
                }
            }
        };

        let annotation = format!(
            "@ORM\\{}(targetEntity=\"{}\", {}=\"{}\")",
            kind.annotation_name(),
            target.entity,
            mapping,
            source.name
        );

        let (type_name, default) = if target.cardinality.is_many() {
            (format!("{}[]|Collection", target.entity), Some(COLLECTION_DEFAULT.to_string()))
        } else {
            (format!("{}|null", target.entity), None)
        };

        Ok(ClassProperty::new(target.name.clone(), type_name, default, vec![annotation]))
    }
}

/// Property names are unique per class; a schema field named `id` would
/// otherwise replace the identifier column
fn insert_property(class: &mut EntityClass, property: ClassProperty) -> Result<()> {
    if class.properties.contains_key(&property.name) {
        return Err(GeneratorError::DuplicateProperty {
            class: class.name.clone(),
            property: property.name,
        });
    }

    class.add_property(property);
    Ok(())
}

fn expect_kind(entity: &Entity, expected: EntityKind) -> Result<()> {
    if entity.kind == expected {
        Ok(())
    } else {
        Err(GeneratorError::UnexpectedEntityType {
            entity: entity.name.clone(),
            kind: entity.kind.to_string(),
        })
    }
}

/// Extra mapping attributes from the raw definition, e.g. `unique: true`
fn passthrough_attributes(field: &EntityField) -> Vec<(String, String)> {
    let raw = match &field.raw_data {
        Some(raw) => raw,
        None => return Vec::new(),
    };

    raw.iter()
        .filter(|(key, _)| !RESERVED_FIELD_KEYS.contains(&key.as_str()))
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Schema;
    use crate::codegen::render::render_class;
    use crate::parser::parse_entities;
    use crate::resolver::resolve_relations;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config() -> GeneratorConfig {
        GeneratorConfig::from_value(json!({"entities": {}})).unwrap()
    }

    fn schema(raw: Value) -> Schema {
        let mut schema = parse_entities(&raw).unwrap();
        resolve_relations(&mut schema).unwrap();
        schema
    }

    fn blog() -> Schema {
        schema(json!({
            "User": {
                "name": {"type": "string", "size": 120},
                "posts": {"relation": "many", "target": "Post"},
            },
            "Post": {
                "title": {"type": "string"},
                "author": {"relation": "one", "target": "User"},
            },
        }))
    }

    #[test]
    fn test_association_table() {
        use Cardinality::*;
        assert_eq!(AssociationKind::from_cardinalities(One, One), Some(AssociationKind::OneToOne));
        assert_eq!(AssociationKind::from_cardinalities(Many, One), Some(AssociationKind::ManyToOne));
        assert_eq!(AssociationKind::from_cardinalities(One, Many), Some(AssociationKind::OneToMany));
        assert_eq!(AssociationKind::from_cardinalities(Many, Many), Some(AssociationKind::ManyToMany));
        assert_eq!(AssociationKind::from_cardinalities(Fixed(3), One), Some(AssociationKind::ManyToOne));
        assert_eq!(AssociationKind::from_cardinalities(Enum, One), None);
    }

    #[test]
    fn test_ownership_tracker() {
        let mut tracker = OwnershipTracker::new();
        assert_eq!(tracker.claim("a"), Ownership::Owning);
        assert_eq!(tracker.claim("b"), Ownership::Owning);
        assert_eq!(tracker.claim("a"), Ownership::Inverse);
    }

    #[test]
    fn test_entity_class() {
        let config = config();
        let schema = blog();
        let mut builder = ClassBuilder::new(&config);

        let class = builder.build(&schema.entities["User"]).unwrap();

        assert_eq!(class.name, "UserGenerated");
        assert_eq!(class.namespace, "App\\Entity\\Generated");
        assert_eq!(class.modifiers, vec!["abstract"]);

        let names: Vec<_> = class.properties.keys().cloned().collect();
        assert_eq!(names, vec!["id", "name", "posts"]);

        let name = &class.properties["name"];
        assert_eq!(name.type_name, "string");
        assert_eq!(name.default.as_deref(), Some("\"\""));
        assert_eq!(name.annotations, vec!["@ORM\\Column(type=\"string\", length=120)"]);

        let posts = &class.properties["posts"];
        assert_eq!(posts.type_name, "Post[]|Collection");
        assert_eq!(posts.default.as_deref(), Some("new ArrayCollection()"));
        assert_eq!(
            posts.annotations,
            vec!["@ORM\\OneToMany(targetEntity=\"Post\", mappedBy=\"author\")"]
        );

        assert!(class.imports.get("Post").is_some());
        assert!(class.imports.get("ArrayCollection").is_some());
        assert!(class.imports.get("ORM").is_some());
    }

    #[test]
    fn test_many_to_one_side() {
        let config = config();
        let schema = blog();
        let mut builder = ClassBuilder::new(&config);

        let class = builder.build(&schema.entities["Post"]).unwrap();
        let author = &class.properties["author"];

        assert_eq!(author.type_name, "User|null");
        assert_eq!(author.default, None);
        assert_eq!(
            author.annotations,
            vec!["@ORM\\ManyToOne(targetEntity=\"User\", inversedBy=\"posts\")"]
        );
        assert!(class.imports.get("Collection").is_none());
    }

    #[test]
    fn test_many_to_many_ownership_across_entities() {
        let config = config();
        let schema = schema(json!({
            "Post": {"tags": {"relation": "many", "target": "Tag"}},
            "Tag": {"posts": {"relation": "many", "target": "Post"}},
        }));
        let mut builder = ClassBuilder::new(&config);

        let post = builder.build(&schema.entities["Post"]).unwrap();
        let tag = builder.build(&schema.entities["Tag"]).unwrap();

        assert_eq!(
            post.properties["tags"].annotations,
            vec!["@ORM\\ManyToMany(targetEntity=\"Tag\", inversedBy=\"posts\")"]
        );
        assert_eq!(
            tag.properties["posts"].annotations,
            vec!["@ORM\\ManyToMany(targetEntity=\"Post\", mappedBy=\"tags\")"]
        );
    }

    #[test]
    fn test_enum_class() {
        let config = config();
        let schema = schema(json!({"Status": {"active": 1, "label": "x"}}));
        let mut builder = ClassBuilder::new(&config);

        let class = builder.build(&schema.entities["Status"]).unwrap();

        assert_eq!(class.namespace, "App\\Enum");
        assert!(class.properties.values().all(|p| p.constant));
        assert_eq!(class.properties["active"].type_name, "int");
        assert_eq!(class.properties["active"].default.as_deref(), Some("1"));
        assert_eq!(class.properties["label"].type_name, "int");
        assert_eq!(class.properties["label"].default.as_deref(), Some("\"x\""));
    }

    #[test]
    fn test_enum_constants_are_int_typed() {
        let config = config();
        let schema = schema(json!({"Status": {"LABEL": "on", "FLAG": true, "NONE": null}}));
        let mut builder = ClassBuilder::new(&config);

        let class = builder.build(&schema.entities["Status"]).unwrap();
        let types: Vec<_> = class.properties.values().map(|p| p.type_name.as_str()).collect();
        assert_eq!(types, vec!["int", "int", "int"]);

        let out = render_class(&class);
        assert!(!out.contains("@var string"));
        assert!(!out.contains("@var bool"));
    }

    #[test]
    fn test_required_enum_reference_defaults_to_zero() {
        let config = config();
        let schema = schema(json!({
            "Status": {"ACTIVE": 1},
            "User": {"state": {"type": "enum", "target": "Status"}},
        }));
        let mut builder = ClassBuilder::new(&config);

        let class = builder.build(&schema.entities["User"]).unwrap();
        let state = &class.properties["state"];
        assert_eq!(state.type_name, "int");
        assert_eq!(state.default.as_deref(), Some("0"));

        let out = render_class(&class);
        assert!(out.contains("        $this->state = 0;\n"));
        assert!(out.contains("    public function getState(): int\n"));
    }

    #[test]
    fn test_duplicate_property_is_rejected() {
        let config = config();
        let schema = schema(json!({"User": {"id": {"type": "string"}}}));
        let mut builder = ClassBuilder::new(&config);

        let err = builder.build(&schema.entities["User"]).unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::DuplicateProperty { ref class, ref property }
                if class == "UserGenerated" && property == "id"
        ));
    }

    #[test]
    fn test_passthrough_cannot_close_comment() {
        let config = config();
        let schema = schema(json!({
            "User": {
                "name": {"type": "string", "comment": "x **// public function pwn() {} /**"},
            },
        }));
        let mut builder = ClassBuilder::new(&config);

        let class = builder.build(&schema.entities["User"]).unwrap();
        let out = render_class(&class);

        let column = out
            .lines()
            .find(|line| line.contains("@ORM\\Column(type=\"string\""))
            .unwrap();
        assert!(!column.contains("*/"), "{column}");
        assert!(!out.contains("*/ public function pwn"));
    }

    #[test]
    fn test_enum_references() {
        let config = config();
        let schema = schema(json!({
            "Status": {"ACTIVE": 1},
            "User": {
                "state": {"type": "enum", "target": "Status", "nullable": true},
                "status": {"relation": "enum", "target": "Status"},
            },
        }));
        let mut builder = ClassBuilder::new(&config);

        let class = builder.build(&schema.entities["User"]).unwrap();

        let state = &class.properties["state"];
        assert_eq!(state.type_name, "int|null");
        assert_eq!(
            state.annotations,
            vec!["@ORM\\Column(type=\"integer\", nullable=true)", "@see Status"]
        );

        let status = &class.properties["status"];
        assert_eq!(status.type_name, "int|null");
        assert_eq!(status.annotations[1], "@see Status");
        assert_eq!(class.imports.get("Status").unwrap().path, "App\\Enum\\Status");
    }

    #[test]
    fn test_field_defaults_and_passthrough() {
        let config = config();
        let schema = schema(json!({
            "Product": {
                "price": {"type": "decimal", "size": 10, "scale": 2},
                "stock": {"type": "integer", "value": 5},
                "note": {"type": "text", "nullable": true},
                "sku": {"type": "string", "unique": true},
                "createdAt": {"type": "datetime"},
            },
        }));
        let mut builder = ClassBuilder::new(&config);

        let class = builder.build(&schema.entities["Product"]).unwrap();

        let price = &class.properties["price"];
        assert_eq!(price.type_name, "float");
        assert_eq!(price.default.as_deref(), Some("0.0"));
        assert_eq!(
            price.annotations[0],
            "@ORM\\Column(type=\"decimal\", precision=10, scale=2)"
        );

        assert_eq!(class.properties["stock"].default.as_deref(), Some("5"));

        let note = &class.properties["note"];
        assert_eq!(note.type_name, "string|null");
        assert_eq!(note.default, None);
        assert_eq!(note.annotations[0], "@ORM\\Column(type=\"text\", nullable=true)");

        assert_eq!(
            class.properties["sku"].annotations[0],
            "@ORM\\Column(type=\"string\", unique=true)"
        );
        assert_eq!(
            class.properties["createdAt"].default.as_deref(),
            Some("new \\DateTime()")
        );
    }

    #[test]
    fn test_import_conflict_between_entity_and_enum() {
        let config = config();
        let schema = schema(json!({
            "Kind": {"A": 1},
            "Thing": {
                "kind": {"type": "enum", "target": "Kind"},
                "parent": {"relation": "one", "target": "Other"},
            },
            "Other": {"thing": {"relation": "one", "target": "Thing"}},
        }));
        let mut builder = ClassBuilder::new(&config);
        assert!(builder.build(&schema.entities["Thing"]).is_ok());

        let mut config = config.clone();
        config.imports.push("Vendor\\Other".to_string());
        let mut builder = ClassBuilder::new(&config);

        let err = builder.build(&schema.entities["Thing"]).unwrap_err();
        assert!(matches!(err, GeneratorError::ImportConflict { ref alias, .. } if alias == "Other"));
    }

    #[test]
    fn test_scaffolds() {
        let config = config();
        let schema = blog();
        let builder = ClassBuilder::new(&config);
        let user = &schema.entities["User"];

        let entity = builder.build_final_entity(user).unwrap();
        assert_eq!(entity.namespace, "App\\Entity");
        assert_eq!(entity.extends.as_deref(), Some("UserGenerated"));
        assert_eq!(
            entity.annotations,
            vec!["@ORM\\Entity(repositoryClass=\"App\\Repository\\UserRepository\")"]
        );
        assert!(!entity.generated_hint);

        let repository = builder.build_repository(user).unwrap();
        assert_eq!(repository.name, "UserRepository");
        assert_eq!(repository.extends.as_deref(), Some("ServiceEntityRepository"));
        assert!(repository
            .body
            .as_deref()
            .unwrap()
            .contains("        parent::__construct($registry, User::class);"));
    }

    #[test]
    fn test_enum_has_no_scaffolds() {
        let config = config();
        let schema = schema(json!({"Status": {"ON": 1}}));
        let builder = ClassBuilder::new(&config);

        let err = builder.build_repository(&schema.entities["Status"]).unwrap_err();
        assert!(matches!(err, GeneratorError::UnexpectedEntityType { .. }));
    }
}
