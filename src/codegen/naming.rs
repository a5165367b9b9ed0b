//! Naming conventions of the generated PHP code
//!
//! Accessors:  name      → getName / setName
//!             createdAt → getCreatedAt / setCreatedAt
//!
//! Constants:  active    → ACTIVE
//!
//! Files:      App\Entity\Generated + UserGenerated
//!             → src/Entity/Generated/UserGenerated.php

use std::path::PathBuf;

/// Upper-case the first character: "createdAt" → "CreatedAt"
pub fn accessor_suffix(property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "active" → "ACTIVE"
pub fn constant_name(property: &str) -> String {
    property.to_uppercase()
}

/// PSR-4 style location of a class below the application root.
///
/// The application namespace maps onto `src/`, every further namespace
/// segment onto a directory.
pub fn class_path(app_namespace: &str, namespace: &str, class_name: &str) -> PathBuf {
    let mut path = namespace_dir(app_namespace, namespace);
    path.push(format!("{}.php", class_name));
    path
}

/// Directory holding the classes of a namespace, e.g. `src/Entity/Generated`
pub fn namespace_dir(app_namespace: &str, namespace: &str) -> PathBuf {
    let mut path = PathBuf::from("src");

    let relative = if namespace == app_namespace {
        ""
    } else {
        namespace
            .strip_prefix(&format!("{}\\", app_namespace))
            .unwrap_or(namespace)
    };

    for segment in relative.split('\\').filter(|s| !s.is_empty()) {
        path.push(segment);
    }

    path
}
