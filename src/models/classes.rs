//! Ordered list of class names.
//!
//! The position of a name in the list is its numeric id in label files, so the
//! order must stay stable while labels exist. Removing or reordering classes
//! after annotating silently remaps the ids already on disk.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from names, dropping blanks and duplicates while keeping
    /// first-seen order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for name in names {
            let _ = list.add(name.as_ref());
        }
        list
    }

    /// Append a class. Returns `Ok(false)` if it was already present.
    pub fn add(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Class name cannot be empty");
        }
        if self.contains(name) {
            return Ok(false);
        }
        self.names.push(name.to_string());
        Ok(true)
    }

    /// Remove a class. Returns `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Numeric id of a class name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Class name for a numeric id; ids outside the list get a synthesized
    /// `Class_{id}` name.
    pub fn name_for(&self, id: i64) -> Cow<'_, str> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.names.get(idx))
            .map(|n| Cow::Borrowed(n.as_str()))
            .unwrap_or_else(|| Cow::Owned(format!("Class_{id}")))
    }

    /// Resolve the selected class: the saved selection if it still exists,
    /// otherwise the first class.
    pub fn resolve_selected<'a>(&'a self, saved: Option<&str>) -> Option<&'a str> {
        match saved {
            Some(sel) if self.contains(sel) => self.names.iter().find(|n| n.as_str() == sel),
            _ => self.names.first(),
        }
        .map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Apply the additions and removals `ours` made relative to `base`.
    /// Names `self` gained elsewhere stay in place.
    pub fn apply_changes(&mut self, base: &ClassList, ours: &ClassList) {
        for name in &base.names {
            if !ours.contains(name) {
                self.remove(name);
            }
        }
        for name in &ours.names {
            if !base.contains(name) && !self.contains(name) {
                self.names.push(name.clone());
            }
        }
    }

    /// Comma-joined form passed to the trainer.
    pub fn joined(&self) -> String {
        self.names.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_changes_keeps_names_added_elsewhere() {
        let base = ClassList::from_names(["cat", "bird"]);
        let ours = ClassList::from_names(["cat", "horse"]);
        let mut disk = ClassList::from_names(["cat", "bird", "dog"]);

        disk.apply_changes(&base, &ours);
        assert_eq!(disk.names(), ["cat", "dog", "horse"]);
    }

    #[test]
    fn test_add_trims_and_dedupes() {
        let mut list = ClassList::new();
        assert!(list.add(" cat ").unwrap());
        assert!(!list.add("cat").unwrap());
        assert_eq!(list.names(), &["cat".to_string()]);
    }

    #[test]
    fn test_add_rejects_blank() {
        let mut list = ClassList::new();
        assert!(list.add("   ").is_err());
        assert!(list.is_empty());
    }

    #[test]
    fn test_index_is_positional() {
        let list = ClassList::from_names(["dog", "cat"]);
        assert_eq!(list.index_of("dog"), Some(0));
        assert_eq!(list.index_of("cat"), Some(1));
        assert_eq!(list.index_of("bird"), None);
    }

    #[test]
    fn test_name_for_out_of_range_is_synthesized() {
        let list = ClassList::from_names(["dog"]);
        assert_eq!(list.name_for(0), "dog");
        assert_eq!(list.name_for(3), "Class_3");
        assert_eq!(list.name_for(-1), "Class_-1");
    }

    #[test]
    fn test_remove_shifts_ids() {
        let mut list = ClassList::from_names(["dog", "cat", "bird"]);
        assert!(list.remove("cat"));
        assert!(!list.remove("cat"));
        assert_eq!(list.index_of("bird"), Some(1));
    }

    #[test]
    fn test_resolve_selected_falls_back_to_first() {
        let list = ClassList::from_names(["dog", "cat"]);
        assert_eq!(list.resolve_selected(Some("cat")), Some("cat"));
        assert_eq!(list.resolve_selected(Some("gone")), Some("dog"));
        assert_eq!(list.resolve_selected(None), Some("dog"));
        assert_eq!(ClassList::new().resolve_selected(None), None);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let list = ClassList::from_names(["dog", "cat"]);
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["dog","cat"]"#);
        let back: ClassList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);
    }
}
