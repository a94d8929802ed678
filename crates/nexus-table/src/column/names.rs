//! Case-insensitive column name groups.
//!
//! Column names are unique by exact case, but several columns may share a
//! case-insensitive name. Each group records how many columns fall into it
//! and their exact-case spellings, so a lookup in the wrong case can tell a
//! single match from an ambiguous one.

use std::collections::HashMap;

/// Outcome of a case-insensitive name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameLookup<'a> {
    /// Exactly one column matches; carries its exact-case name.
    Unique(&'a str),
    /// Several columns match in different case.
    Ambiguous,
    /// No column matches.
    Missing,
}

#[derive(Debug, Clone, Default)]
struct NameGroup {
    count: usize,
    variants: Vec<String>,
}

/// Map from folded name to its group.
#[derive(Debug, Clone, Default)]
pub struct NameGroups {
    groups: HashMap<String, NameGroup>,
}

impl NameGroups {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    fn fold(name: &str) -> String {
        name.to_lowercase()
    }

    /// Records `name` in its group.
    pub fn register(&mut self, name: &str) {
        let group = self.groups.entry(Self::fold(name)).or_default();
        group.count += 1;
        group.variants.push(name.to_string());
    }

    /// Removes `name` from its group, dropping the group when it empties.
    ///
    /// Returns false if `name` was not registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let key = Self::fold(name);
        let Some(group) = self.groups.get_mut(&key) else {
            return false;
        };
        let Some(pos) = group.variants.iter().position(|v| v == name) else {
            return false;
        };

        group.variants.swap_remove(pos);
        group.count -= 1;
        if group.count == 0 {
            self.groups.remove(&key);
        }
        true
    }

    /// Number of registered names that fold to the same key as `name`.
    pub fn count(&self, name: &str) -> usize {
        self.groups
            .get(&Self::fold(name))
            .map_or(0, |group| group.count)
    }

    /// Looks `name` up ignoring case.
    pub fn lookup(&self, name: &str) -> NameLookup<'_> {
        match self.groups.get(&Self::fold(name)) {
            None => NameLookup::Missing,
            Some(group) if group.count == 1 => match group.variants.first() {
                Some(exact) => NameLookup::Unique(exact),
                None => NameLookup::Missing,
            },
            Some(_) => NameLookup::Ambiguous,
        }
    }

    /// Returns true if no names are registered.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut names = NameGroups::new();
        names.register("Name");
        assert_eq!(names.count("NAME"), 1);
        assert_eq!(names.lookup("name"), NameLookup::Unique("Name"));
        assert_eq!(names.lookup("other"), NameLookup::Missing);
    }

    #[test]
    fn test_ambiguous_group() {
        let mut names = NameGroups::new();
        names.register("Name");
        names.register("NAME");
        assert_eq!(names.count("name"), 2);
        assert_eq!(names.lookup("name"), NameLookup::Ambiguous);

        assert!(names.unregister("NAME"));
        assert_eq!(names.lookup("name"), NameLookup::Unique("Name"));
    }

    #[test]
    fn test_unregister_drops_empty_group() {
        let mut names = NameGroups::new();
        names.register("a");
        assert!(names.unregister("a"));
        assert!(names.is_empty());
        assert!(!names.unregister("a"));
    }

    #[test]
    fn test_unregister_requires_exact_case() {
        let mut names = NameGroups::new();
        names.register("Id");
        assert!(!names.unregister("ID"));
        assert_eq!(names.count("id"), 1);
    }
}
