//! Mapping of schema field types onto PHP types

/// Schema type → PHP doc type. Unmapped types are used verbatim.
const TYPE_MAPPING: &[(&str, &str)] = &[
    ("integer", "int"),
    ("smallint", "int"),
    ("bigint", "string"),
    ("boolean", "bool"),
    ("decimal", "float"),
    ("float", "float"),
    ("string", "string"),
    ("text", "string"),
    ("guid", "string"),
    ("date", "\\DateTime"),
    ("datetime", "\\DateTime"),
    ("time", "\\DateTime"),
    ("json", "array"),
    ("array", "array"),
    ("simple_array", "array"),
];

pub const NULL_TYPE: &str = "null";
pub const COLLECTION_DEFAULT: &str = "new ArrayCollection()";

pub fn php_type(field_type: &str) -> &str {
    TYPE_MAPPING
        .iter()
        .find(|(schema_type, _)| *schema_type == field_type)
        .map(|(_, php)| *php)
        .unwrap_or(field_type)
}

/// Zero value assigned in the constructor of a non-nullable property
pub fn zero_value(php_type: &str) -> Option<String> {
    let literal = match php_type {
        "int" => "0",
        "float" => "0.0",
        "string" => "\"\"",
        "bool" => "false",
        "\\DateTime" => "new \\DateTime()",
        "array" => "[]",
        _ => return None,
    };
    Some(literal.to_string())
}

/// Turn an explicit schema value into a PHP literal for the given type
pub fn literal_value(php_type: &str, value: &str) -> String {
    match php_type {
        "string" => serde_json::Value::String(value.to_string()).to_string(),
        "bool" => value.to_ascii_lowercase(),
        _ => value.to_string(),
    }
}

/// Accessor signature derived from a declared (possibly union) type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    /// The type hint says everything: `?User`, `string`
    Exact(String),
    /// The type hint is wider than the declared type (`Post[]` → `array`),
    /// the doc comment keeps the precise one
    Collapsed(String),
    /// No type hint expressible, documented only
    Untyped,
}

impl TypeSignature {
    pub fn parse(declared: &str) -> Self {
        let mut members: Vec<&str> = Vec::new();
        for member in declared.split('|').map(str::trim).filter(|m| !m.is_empty()) {
            if !members.contains(&member) {
                members.push(member);
            }
        }

        let nullable = members.contains(&NULL_TYPE);
        members.retain(|m| *m != NULL_TYPE);
        let prefix = if nullable { "?" } else { "" };

        match members.as_slice() {
            [single] if is_array(single) => TypeSignature::Collapsed(format!("{}array", prefix)),
            [single] => TypeSignature::Exact(format!("{}{}", prefix, single)),
            [first, second] if !nullable && (is_array(first) != is_array(second)) => {
                TypeSignature::Collapsed("iterable".to_string())
            }
            _ => TypeSignature::Untyped,
        }
    }

    pub fn type_hint(&self) -> Option<&str> {
        match self {
            TypeSignature::Exact(hint) | TypeSignature::Collapsed(hint) => Some(hint),
            TypeSignature::Untyped => None,
        }
    }

    /// The declared type has to be spelled out in a doc comment
    pub fn needs_doc(&self) -> bool {
        !matches!(self, TypeSignature::Exact(_))
    }
}

fn is_array(type_name: &str) -> bool {
    type_name.ends_with("[]")
}
