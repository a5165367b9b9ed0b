use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[derive(Error, Debug)]
pub enum GeneratorError {
    // ─── SCHEMA ───
    #[error("The property `{property}` of `{entity}.{field}` is required but missing!")]
    MissingProperty {
        entity: String,
        field: String,
        property: String,
    },

    #[error("Invalid configuration in `{entity}.{field}`, enum and entity mixes are not allowed!")]
    EnumEntityMix { entity: String, field: String },

    #[error("Invalid value for `{entity}.{field}`: {message}")]
    InvalidScalar {
        entity: String,
        field: String,
        message: String,
    },

    #[error("Unknown relation cardinality `{value}` in `{entity}.{field}`")]
    InvalidCardinality {
        entity: String,
        field: String,
        value: String,
    },

    #[error("Unknown modifier `{value}` in `{entity}.{field}`")]
    InvalidModifier {
        entity: String,
        field: String,
        value: String,
    },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Unknown entity `{entity}` referenced from `{referenced_by}`")]
    UnknownEntity {
        entity: String,
        referenced_by: String,
    },

    #[error("The path `{0}` is missing in the configuration!")]
    MissingConfig(String),

    // ─── GRAPH ───
    #[error("Missing relation `{target}` -> `{entity}`!")]
    MissingRelation { entity: String, target: String },

    #[error("Ambiguous relation `{target}` -> `{entity}`: more than one inverse relation is not supported!")]
    AmbiguousRelation { entity: String, target: String },

    #[error("Incompatible relation `{relation}`!")]
    IncompatibleRelation { relation: String },

    #[error("Unexpected relation `{relation}` on `{entity}`!")]
    UnsupportedAssociation { entity: String, relation: String },

    // ─── CODE MODEL ───
    #[error("Import conflict for `{alias}`: `{existing}` is already imported, cannot import `{requested}`!")]
    ImportConflict {
        alias: String,
        existing: String,
        requested: String,
    },

    #[error("Duplicate property `{property}` in class `{class}`!")]
    DuplicateProperty { class: String, property: String },

    #[error("Unexpected entity type `{kind}` for `{entity}`!")]
    UnexpectedEntityType { entity: String, kind: String },

    // ─── AMBIENT ───
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GeneratorError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeneratorError::Io {
            path: path.into(),
            source,
        }
    }
}
