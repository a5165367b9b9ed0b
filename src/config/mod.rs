use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{GeneratorError, Result};

const CONFIG_KEY_ENTITIES: &str = "entities";

/// Generator input: the raw entity schema plus naming conventions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Raw `entity -> field -> definition` mapping, parsed by [`crate::parser`]
    pub entities: Value,
    #[serde(default)]
    pub namespace: Namespaces,
    #[serde(default, rename = "classPostfix")]
    pub class_postfix: ClassPostfix,
    /// Extra symbols imported into every generated entity class,
    /// e.g. `Symfony\Component\Validator\Constraints as Assert`
    #[serde(default)]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Namespaces {
    pub app: String,
    pub base: String,
    #[serde(rename = "enum")]
    pub enumeration: String,
    pub entity: String,
    pub repository: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassPostfix {
    pub entity: String,
    pub repository: String,
}

impl Default for Namespaces {
    fn default() -> Self {
        Namespaces {
            app: "App".to_string(),
            base: "Generated".to_string(),
            enumeration: "Enum".to_string(),
            entity: "Entity".to_string(),
            repository: "Repository".to_string(),
        }
    }
}

impl Default for ClassPostfix {
    fn default() -> Self {
        ClassPostfix {
            entity: "Generated".to_string(),
            repository: "Repository".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_value(value: Value) -> Result<Self> {
        match value.get(CONFIG_KEY_ENTITIES) {
            Some(Value::Object(_)) => {}
            _ => return Err(GeneratorError::MissingConfig(CONFIG_KEY_ENTITIES.to_string())),
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(input)?;
        Self::from_value(value)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Load a `.json` file as JSON, anything else as YAML
    pub fn from_path(path: &Path) -> Result<Self> {
        let input = std::fs::read_to_string(path).map_err(|e| GeneratorError::io(path, e))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&input),
            _ => Self::from_yaml_str(&input),
        }
    }

    pub fn app_namespace(&self) -> String {
        self.namespace.app.clone()
    }

    pub fn entity_namespace(&self) -> String {
        join_namespace(&[&self.namespace.app, &self.namespace.entity])
    }

    /// Namespace of the regenerated base classes, e.g. `App\Entity\Generated`
    pub fn base_namespace(&self) -> String {
        join_namespace(&[&self.namespace.app, &self.namespace.entity, &self.namespace.base])
    }

    pub fn enum_namespace(&self) -> String {
        join_namespace(&[&self.namespace.app, &self.namespace.enumeration])
    }

    pub fn repository_namespace(&self) -> String {
        join_namespace(&[&self.namespace.app, &self.namespace.repository])
    }
}

/// Join namespace segments with `\`, skipping empty ones
pub fn join_namespace<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|segment| segment.as_ref().trim_matches('\\'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\\")
}
