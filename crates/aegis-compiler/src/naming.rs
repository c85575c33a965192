//! Definition naming.
//!
//! Source type names may contain characters that are awkward in schema
//! documents (`Partial<Node>`). Output names are restricted to ASCII
//! alphanumerics and `_`, and are unique within one document.

use std::collections::HashSet;

/// Root definition name of a request schema.
pub const REQUEST_ROOT: &str = "Request";

/// Root definition name of a method schema.
pub const METHOD_ROOT: &str = "RequestMethod";

/// Converts a source type name into a schema-safe identifier.
///
/// # Example
///
/// ```
/// use aegis_compiler::sanitize_name;
///
/// assert_eq!(sanitize_name("Partial<Node>"), "Partial_Node");
/// assert_eq!(sanitize_name("Pick<User, \"id\">"), "Pick_User_id");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("Definition");
    } else if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'T');
    }
    out
}

/// Allocates unique output names.
#[derive(Debug, Clone)]
pub(crate) struct NameTable {
    taken: HashSet<String>,
}

impl NameTable {
    /// Creates a table with the root names already taken.
    pub(crate) fn new() -> Self {
        Self {
            taken: [REQUEST_ROOT, METHOD_ROOT]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Returns a unique name derived from `source`.
    pub(crate) fn allocate(&mut self, source: &str) -> String {
        let base = sanitize_name(source);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Node"), "Node");
        assert_eq!(sanitize_name("Partial<Partial<Node>>"), "Partial_Partial_Node");
        assert_eq!(sanitize_name("<>"), "Definition");
        assert_eq!(sanitize_name("1st"), "T1st");
        assert_eq!(sanitize_name("snake_case"), "snake_case");
    }

    #[test]
    fn test_allocate_avoids_roots_and_collisions() {
        let mut names = NameTable::new();
        assert_eq!(names.allocate("Request"), "Request_2");
        assert_eq!(names.allocate("Partial<Node>"), "Partial_Node");
        assert_eq!(names.allocate("Partial_Node"), "Partial_Node_2");
        assert_eq!(names.allocate("Partial Node"), "Partial_Node_3");
    }
}
