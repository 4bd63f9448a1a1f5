//! Category Visibility Store
//!
//! One shared hidden-set for location subcategories and route categories.
//! Category identity is a canonical-cased string: subcategory keys appear in
//! mixed case across data sources, so every name passes through
//! [`canonical_category`] exactly once on the way in.

use std::collections::BTreeSet;

/// Canonical casing for a category name: first letter uppercased, rest kept.
pub fn canonical_category(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// The set of currently hidden category names.
#[derive(Debug, Clone, Default)]
pub struct VisibilityStore {
    hidden: BTreeSet<String>,
}

impl VisibilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted hidden names.
    pub fn from_hidden<I: IntoIterator<Item = String>>(names: I) -> Self {
        Self {
            hidden: names
                .into_iter()
                .map(|n| canonical_category(&n))
                .collect(),
        }
    }

    pub fn is_visible(&self, name: &str) -> bool {
        !self.hidden.contains(&canonical_category(name))
    }

    /// Flip one category; returns whether it is visible afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        let canonical = canonical_category(name);
        if self.hidden.remove(&canonical) {
            true
        } else {
            self.hidden.insert(canonical);
            false
        }
    }

    /// Hide every known category (union of location subcategories across all
    /// floors plus route categories - one shared namespace).
    pub fn hide_all<I, S>(&mut self, all_known: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in all_known {
            self.hidden.insert(canonical_category(name.as_ref()));
        }
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    /// Hidden names for persistence.
    pub fn hidden_names(&self) -> Vec<String> {
        self.hidden.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_casing() {
        assert_eq!(canonical_category("stairs"), "Stairs");
        assert_eq!(canonical_category("Stairs"), "Stairs");
        assert_eq!(canonical_category("first circle"), "First circle");
        assert_eq!(canonical_category(""), "");
    }

    #[test]
    fn test_toggle_twice_restores_visibility() {
        let mut store = VisibilityStore::new();
        assert!(store.is_visible("Stairs"));
        store.toggle("Stairs");
        assert!(!store.is_visible("Stairs"));
        store.toggle("Stairs");
        assert!(store.is_visible("Stairs"));
    }

    #[test]
    fn test_mixed_case_names_share_identity() {
        let mut store = VisibilityStore::new();
        store.toggle("stairs");
        assert!(!store.is_visible("Stairs"));
        assert!(!store.is_visible("stairs"));
    }

    #[test]
    fn test_hide_all_then_show_all() {
        let mut store = VisibilityStore::new();
        store.hide_all(["Stairs", "portals", "farming"]);
        assert!(!store.is_visible("Stairs"));
        assert!(!store.is_visible("Portals"));
        assert!(!store.is_visible("Farming"));
        store.show_all();
        assert!(store.is_visible("Stairs"));
        assert!(store.is_visible("Farming"));
    }

    #[test]
    fn test_persistence_round_trip() {
        let mut store = VisibilityStore::new();
        store.toggle("Runes");
        store.toggle("stairs");
        let restored = VisibilityStore::from_hidden(store.hidden_names());
        assert!(!restored.is_visible("Runes"));
        assert!(!restored.is_visible("Stairs"));
        assert!(restored.is_visible("Portals"));
    }
}
