use lazy_static::lazy_static;
use regex::Regex;

use super::model::{ClassProperty, EntityClass};
use super::naming::{accessor_suffix, constant_name};
use super::types::TypeSignature;

pub const INDENT: &str = "    ";

pub const GENERATED_BANNER: &str = "This class was generated automatically, do not modify it here!";

lazy_static! {
    /// Characters allowed in a literal default taken from configuration
    static ref FILTER_VALUE: Regex = Regex::new(r#"[^A-Za-z0-9\\\s.()\[\],\r\n"]"#).unwrap();
    static ref FILTER_EXTENDS: Regex = Regex::new(r"[^A-Za-z0-9\\]").unwrap();
    static ref FILTER_IMPORT: Regex = Regex::new(r"[^A-Za-z0-9\\\s]").unwrap();
}

/// Render a class into PHP source.
///
/// Pure function of the model: the same model always renders to the same bytes.
pub fn render_class(class: &EntityClass) -> String {
    let mut lines: Vec<String> = vec![
        "<?php".to_string(),
        String::new(),
        format!("namespace {};", class.namespace),
        String::new(),
    ];

    for import in import_lines(class) {
        lines.push(format!("use {};", import));
    }
    lines.push(String::new());

    lines.extend(class_doc(class));

    let modifiers = class.modifiers.join(" ");
    let modifiers = if modifiers.is_empty() {
        modifiers
    } else {
        format!("{} ", modifiers)
    };
    lines.push(format!("{}class {}{}", modifiers, class.name, extends_clause(class)));
    lines.push("{".to_string());

    lines.extend(render_constants(class));
    lines.extend(render_properties(class));
    lines.extend(render_constructor(class));
    lines.extend(render_accessors(class));

    if let Some(body) = class.body.as_deref().filter(|b| !b.is_empty()) {
        lines.push(body.to_string());
    }

    if lines.last().map(|l| l.is_empty()).unwrap_or(false) {
        lines.pop();
    }

    lines.push("}".to_string());
    lines.push(String::new());

    lines.join("\n")
}

/// Strip everything but plain literal characters; empty becomes `null`
pub fn sanitize_value(value: &str) -> String {
    let filtered = FILTER_VALUE.replace_all(value, "");
    if filtered.is_empty() {
        "null".to_string()
    } else {
        filtered.into_owned()
    }
}

/// Keep annotation text from closing the surrounding doc comment.
///
/// Removal repeats until stable, `**//` would collapse into `*/` otherwise.
pub fn sanitize_annotation(annotation: &str) -> String {
    let mut sanitized = annotation.to_string();
    while sanitized.contains("*/") {
        sanitized = sanitized.replace("*/", "");
    }
    sanitized
}

/// Indent every non-empty line one level
pub fn indent_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| {
            if line.is_empty() {
                line
            } else {
                format!("{}{}", INDENT, line)
            }
        })
        .collect()
}

/// Import statements minus the ones living in the class' own namespace
fn import_lines(class: &EntityClass) -> Vec<String> {
    class
        .imports
        .iter()
        .filter(|import| import.namespace() != class.namespace)
        .map(|import| FILTER_IMPORT.replace_all(&import.statement(), "").into_owned())
        .collect()
}

fn extends_clause(class: &EntityClass) -> String {
    let parent = class.extends.as_deref().unwrap_or("");
    let parent = FILTER_EXTENDS.replace_all(parent, "");
    if parent.is_empty() {
        String::new()
    } else {
        format!(" extends {}", parent)
    }
}

fn class_doc(class: &EntityClass) -> Vec<String> {
    let mut lines = Vec::new();
    let has_annotations = !class.annotations.is_empty();

    if !class.generated_hint && !has_annotations {
        return lines;
    }

    lines.push("/**".to_string());
    if class.generated_hint {
        lines.push(format!(" * {}", GENERATED_BANNER));
    }
    if has_annotations {
        if class.generated_hint {
            lines.push(" *".to_string());
        }
        for annotation in &class.annotations {
            lines.push(format!(" * {}", sanitize_annotation(annotation)));
        }
    }
    lines.push(" */".to_string());
    lines
}

/// `/** annotations, @var type */` block shared by constants and properties
fn member_doc(property: &ClassProperty) -> Vec<String> {
    let mut lines = vec!["/**".to_string()];
    if !property.annotations.is_empty() {
        for annotation in &property.annotations {
            lines.push(format!(" * {}", sanitize_annotation(annotation)));
        }
        lines.push(" *".to_string());
    }
    lines.push(format!(" * @var {}", property.type_name));
    lines.push(" */".to_string());
    lines
}

fn render_constants(class: &EntityClass) -> Vec<String> {
    let mut lines = Vec::new();

    for property in class.constants() {
        let value = sanitize_value(property.default.as_deref().unwrap_or(""));

        lines.extend(member_doc(property));
        lines.push(format!("const {} = {};", constant_name(&property.name), value));
        lines.push(String::new());
    }

    indent_lines(lines)
}

fn render_properties(class: &EntityClass) -> Vec<String> {
    let mut lines = Vec::new();

    for property in class.members() {
        lines.extend(member_doc(property));
        lines.push(format!("protected ${};", property.name));
        lines.push(String::new());
    }

    indent_lines(lines)
}

fn render_constructor(class: &EntityClass) -> Vec<String> {
    let defaults: Vec<(&str, String)> = class
        .members()
        .filter_map(|p| p.default.as_deref().map(|d| (p.name.as_str(), sanitize_value(d))))
        .collect();

    if defaults.is_empty() {
        return Vec::new();
    }

    let mut lines = vec!["public function __construct()".to_string(), "{".to_string()];
    for (name, value) in defaults {
        lines.push(format!("{}$this->{} = {};", INDENT, name, value));
    }
    lines.push("}".to_string());
    lines.push(String::new());

    indent_lines(lines)
}

fn render_accessors(class: &EntityClass) -> Vec<String> {
    let mut lines = Vec::new();

    for property in class.members() {
        let name = &property.name;
        let suffix = accessor_suffix(name);
        let signature = TypeSignature::parse(&property.type_name);

        let return_type = signature
            .type_hint()
            .map(|hint| format!(": {}", hint))
            .unwrap_or_default();
        let parameter_type = signature
            .type_hint()
            .map(|hint| format!("{} ", hint))
            .unwrap_or_default();

        // getter
        if signature.needs_doc() {
            lines.push("/**".to_string());
            lines.push(format!(" * @return {}", property.type_name));
            lines.push(" */".to_string());
        }
        lines.push(format!("public function get{}(){}", suffix, return_type));
        lines.push("{".to_string());
        lines.push(format!("{}return $this->{};", INDENT, name));
        lines.push("}".to_string());
        lines.push(String::new());

        // setter
        if signature.needs_doc() {
            lines.push("/**".to_string());
            lines.push(format!(" * @param {} ${}", property.type_name, name));
            lines.push(" */".to_string());
        }
        lines.push(format!(
            "public function set{}({}${}): void",
            suffix, parameter_type, name
        ));
        lines.push("{".to_string());
        lines.push(format!("{}$this->{} = ${};", INDENT, name, name));
        lines.push("}".to_string());
        lines.push(String::new());
    }

    indent_lines(lines)
}
