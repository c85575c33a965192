//! Named type environments.

use indexmap::IndexMap;

use crate::ast::{KeywordType, TypeDeclaration};
use crate::error::TypeError;

/// Generic types provided by the language.
pub const BUILTIN_GENERICS: [&str; 5] = ["Partial", "Pick", "Omit", "Record", "Array"];

/// Returns true for names that cannot be declared.
pub fn is_reserved(name: &str) -> bool {
    BUILTIN_GENERICS.contains(&name)
        || KeywordType::from_ident(name).is_some()
        || matches!(name, "true" | "false" | "type" | "export" | "default")
}

/// Named type declarations visible to an endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeEnv {
    declarations: IndexMap<String, TypeDeclaration>,
}

impl TypeEnv {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment from declarations in source order.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::DuplicateType`] or [`TypeError::ReservedName`].
    pub fn from_declarations(
        declarations: impl IntoIterator<Item = TypeDeclaration>,
    ) -> Result<Self, TypeError> {
        let mut env = Self::new();
        env.extend(declarations)?;
        Ok(env)
    }

    /// Adds declarations.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::DuplicateType`] when a name is already declared
    /// and [`TypeError::ReservedName`] for built-in names.
    pub fn extend(
        &mut self,
        declarations: impl IntoIterator<Item = TypeDeclaration>,
    ) -> Result<(), TypeError> {
        for declaration in declarations {
            if is_reserved(&declaration.name) {
                return Err(TypeError::ReservedName {
                    name: declaration.name,
                    position: declaration.position,
                });
            }
            if self.declarations.contains_key(&declaration.name) {
                return Err(TypeError::DuplicateType {
                    name: declaration.name,
                    position: declaration.position,
                });
            }
            self.declarations
                .insert(declaration.name.clone(), declaration);
        }
        Ok(())
    }

    /// Looks up a declaration.
    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.get(name)
    }

    /// Returns whether a name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Iterates declarations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.declarations.values()
    }

    /// Returns the number of declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Returns true when nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
