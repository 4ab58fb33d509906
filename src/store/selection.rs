use std::collections::BTreeSet;

/// Identifiers of the currently selected spaces.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the selection to exactly `ids` (plain click).
    pub fn replace<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
    }

    /// Adds `id` if absent, removes it otherwise (modifier click).
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drops every id for which `exists` returns false.
    pub fn retain(&mut self, mut exists: impl FnMut(&str) -> bool) {
        self.ids.retain(|id| exists(id));
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The selected id when exactly one space is selected.
    #[must_use]
    pub fn single(&self) -> Option<&str> {
        if self.ids.len() == 1 {
            self.ids.iter().next().map(String::as_str)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn toggle_twice_is_noop() {
        let mut selection = Selection::new();
        selection.replace(["a", "b"]);
        let before = selection.clone();

        selection.toggle("c");
        assert!(selection.contains("c"));
        selection.toggle("c");
        assert_eq!(selection, before);

        selection.toggle("a");
        selection.toggle("a");
        assert_eq!(selection, before);
    }

    #[test]
    fn replace_discards_previous() {
        let mut selection = Selection::new();
        selection.replace(["a", "b"]);
        selection.replace(["c"]);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["c"]);
        assert_eq!(selection.single(), Some("c"));
    }

    #[test]
    fn retain_prunes_dangling_ids() {
        let mut selection = Selection::new();
        selection.replace(["a", "b", "c"]);
        selection.retain(|id| id != "b");
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["a", "c"]);
        selection.clear();
        assert!(selection.is_empty());
    }
}
