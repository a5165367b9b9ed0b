use indexmap::IndexMap;

use crate::error::{GeneratorError, Result};

/// A render-ready description of one output class
#[derive(Debug, Clone, PartialEq)]
pub struct EntityClass {
    pub name: String,
    /// Fully qualified namespace, e.g. `App\Entity\Generated`
    pub namespace: String,
    pub imports: ImportTable,
    /// Class level doc annotations, e.g. `@ORM\Entity()`
    pub annotations: Vec<String>,
    pub properties: IndexMap<String, ClassProperty>,
    pub modifiers: Vec<String>,
    pub extends: Option<String>,
    /// Appended verbatim after the generated members
    pub body: Option<String>,
    /// Emit the "generated automatically" banner
    pub generated_hint: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassProperty {
    pub name: String,
    /// Declared type, possibly a `|` delimited union such as `Post[]|Collection`
    pub type_name: String,
    /// Literal default value, sanitized at render time
    pub default: Option<String>,
    pub annotations: Vec<String>,
    pub constant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Fully qualified symbol
    pub path: String,
    pub alias: String,
}

/// Alias keyed import table, in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportTable {
    imports: IndexMap<String, Import>,
}

impl EntityClass {
    /// An abstract, generated class; the common case
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        EntityClass {
            name: name.into(),
            namespace: namespace.into(),
            imports: ImportTable::new(),
            annotations: Vec::new(),
            properties: IndexMap::new(),
            modifiers: vec!["abstract".to_string()],
            extends: None,
            body: None,
            generated_hint: true,
        }
    }

    pub fn add_property(&mut self, property: ClassProperty) {
        self.properties.insert(property.name.clone(), property);
    }

    pub fn qualified_name(&self) -> String {
        format!("{}\\{}", self.namespace, self.name)
    }

    pub fn constants(&self) -> impl Iterator<Item = &ClassProperty> {
        self.properties.values().filter(|p| p.constant)
    }

    pub fn members(&self) -> impl Iterator<Item = &ClassProperty> {
        self.properties.values().filter(|p| !p.constant)
    }
}

impl ClassProperty {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        default: Option<String>,
        annotations: Vec<String>,
    ) -> Self {
        ClassProperty {
            name: name.into(),
            type_name: type_name.into(),
            default,
            annotations,
            constant: false,
        }
    }

    pub fn constant(
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        ClassProperty {
            constant: true,
            ..ClassProperty::new(name, type_name, value, Vec::new())
        }
    }
}

impl Import {
    /// Parse `Foo\Bar` (alias `Bar`) or `Foo\Bar as Baz` (alias `Baz`)
    pub fn parse(statement: &str) -> Self {
        let statement = statement.trim().trim_start_matches('\\');

        if let Some((path, alias)) = statement.split_once(" as ") {
            return Import {
                path: path.trim().to_string(),
                alias: alias.trim().to_string(),
            };
        }

        let alias = statement.rsplit('\\').next().unwrap_or(statement).to_string();
        Import {
            path: statement.to_string(),
            alias,
        }
    }

    /// Namespace part of the path, without the symbol itself
    pub fn namespace(&self) -> &str {
        match self.path.rfind('\\') {
            Some(index) => &self.path[..index],
            None => "",
        }
    }

    /// `use` statement body, with ` as Alias` when the alias differs from the symbol
    pub fn statement(&self) -> String {
        let symbol = self.path.rsplit('\\').next().unwrap_or(&self.path);
        if symbol == self.alias {
            self.path.clone()
        } else {
            format!("{} as {}", self.path, self.alias)
        }
    }
}

impl ImportTable {
    pub fn new() -> Self {
        ImportTable {
            imports: IndexMap::new(),
        }
    }

    /// Register an import under its alias.
    ///
    /// Registering the same alias twice is fine as long as both point at the
    /// same symbol; anything else is an import conflict.
    pub fn register(&mut self, import: Import) -> Result<()> {
        if let Some(existing) = self.imports.get(&import.alias) {
            if existing.path != import.path {
                return Err(GeneratorError::ImportConflict {
                    alias: import.alias,
                    existing: existing.path.clone(),
                    requested: import.path,
                });
            }
            return Ok(());
        }

        self.imports.insert(import.alias.clone(), import);
        Ok(())
    }

    /// Shorthand for `register(Import::parse(statement))`
    pub fn add(&mut self, statement: &str) -> Result<()> {
        self.register(Import::parse(statement))
    }

    pub fn get(&self, alias: &str) -> Option<&Import> {
        self.imports.get(alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Import> {
        self.imports.values()
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_import_parse() {
        let import = Import::parse("Doctrine\\ORM\\Mapping as ORM");
        assert_eq!(import.path, "Doctrine\\ORM\\Mapping");
        assert_eq!(import.alias, "ORM");
        assert_eq!(import.namespace(), "Doctrine\\ORM");
        assert_eq!(import.statement(), "Doctrine\\ORM\\Mapping as ORM");

        let import = Import::parse("\\App\\Entity\\Post");
        assert_eq!(import.alias, "Post");
        assert_eq!(import.statement(), "App\\Entity\\Post");
    }

    #[test]
    fn test_import_conflict() {
        let mut imports = ImportTable::new();
        imports.add("NamespaceA\\X").unwrap();

        let err = imports.add("NamespaceB\\X").unwrap_err();
        match err {
            GeneratorError::ImportConflict { alias, existing, requested } => {
                assert_eq!(alias, "X");
                assert_eq!(existing, "NamespaceA\\X");
                assert_eq!(requested, "NamespaceB\\X");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reregistering_same_import_is_fine() {
        let mut imports = ImportTable::new();
        imports.add("App\\Entity\\Post").unwrap();
        imports.add("App\\Entity\\Post").unwrap();
        assert_eq!(imports.len(), 1);
    }

    #[test]
    fn test_class_defaults() {
        let class = EntityClass::new("UserGenerated", "App\\Entity\\Generated");
        assert_eq!(class.modifiers, vec!["abstract"]);
        assert!(class.generated_hint);
        assert_eq!(class.qualified_name(), "App\\Entity\\Generated\\UserGenerated");
    }
}
