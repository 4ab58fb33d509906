//! The single mutable source of truth for the loaded model.
//!
//! Derived views (filtered, grouped, selected) are recomputed from the
//! current spaces on every call; nothing derived is cached here.

use super::filter::{filter_spaces, SpaceFilters};
use super::grouping::{group_spaces, GroupingConfig, SpaceGroup};
use super::selection::Selection;
use crate::model::{ModelInfo, PropertyMap, Space};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// A property merge addressed to one space.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
    pub id: String,
    pub properties: PropertyMap,
}

#[derive(Debug, Default)]
pub struct SpaceRepository {
    model_info: Option<ModelInfo>,
    spaces: Vec<Space>,
    selection: Selection,
    filters: SpaceFilters,
    grouping: GroupingConfig,
    color_by: Option<String>,
}

impl SpaceRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the spaces and model metadata in one step. Selected ids that
    /// no longer exist are dropped.
    pub fn load(&mut self, spaces: Vec<Space>, info: ModelInfo) {
        debug!(model_id = %info.model_id, spaces = spaces.len(), "loading model");
        self.spaces = spaces;
        self.model_info = Some(info);
        let ids: BTreeSet<&str> = self.spaces.iter().map(|s| s.id.as_str()).collect();
        self.selection.retain(|id| ids.contains(id));
    }

    /// Merges `delta` into the properties of space `id`; returns false if absent.
    pub fn mutate_properties(&mut self, id: &str, delta: &PropertyMap) -> bool {
        match self.spaces.iter_mut().find(|s| s.id == id) {
            Some(space) => {
                space.merge_properties(delta);
                true
            }
            None => false,
        }
    }

    /// Applies several merges in one pass, keeping every space in place.
    /// Returns the number of spaces that were amended.
    pub fn mutate_many(&mut self, updates: &[PropertyUpdate]) -> usize {
        let by_id: HashMap<&str, &PropertyMap> = updates
            .iter()
            .map(|u| (u.id.as_str(), &u.properties))
            .collect();

        let mut amended = 0;
        for space in &mut self.spaces {
            if let Some(delta) = by_id.get(space.id.as_str()) {
                space.merge_properties(delta);
                amended += 1;
            }
        }
        debug!(requested = updates.len(), amended, "merged property updates");
        amended
    }

    /// Swaps in a fresh copy of a space fetched from the backend.
    /// Returns false if no space has that id.
    pub fn replace_space(&mut self, space: Space) -> bool {
        match self.spaces.iter_mut().find(|s| s.id == space.id) {
            Some(slot) => {
                *slot = space;
                true
            }
            None => false,
        }
    }

    /// Back to an empty project: spaces, metadata, selection, filters,
    /// grouping and color-by all return to their defaults.
    pub fn reset(&mut self) {
        debug!("resetting repository");
        *self = Self::default();
    }

    #[must_use]
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    #[must_use]
    pub fn space(&self, id: &str) -> Option<&Space> {
        self.spaces.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.model_info.as_ref()
    }

    #[must_use]
    pub fn model_id(&self) -> Option<&str> {
        self.model_info.as_ref().map(|i| i.model_id.as_str())
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model_info.is_some()
    }

    // ── selection ────────────────────────────────────────────

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selects exactly the given ids, ignoring ids of unknown spaces.
    pub fn select_only<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let known: Vec<String> = ids
            .into_iter()
            .filter(|id| self.space(id.as_ref()).is_some())
            .map(|id| id.as_ref().to_string())
            .collect();
        self.selection.replace(known);
    }

    pub fn toggle_selected(&mut self, id: &str) {
        if self.selection.contains(id) || self.space(id).is_some() {
            self.selection.toggle(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected spaces in repository order.
    #[must_use]
    pub fn selected_spaces(&self) -> Vec<&Space> {
        self.spaces
            .iter()
            .filter(|s| self.selection.contains(&s.id))
            .collect()
    }

    // ── filtering / grouping / coloring configuration ────────

    #[must_use]
    pub fn filters(&self) -> &SpaceFilters {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: SpaceFilters) {
        self.filters = filters;
    }

    pub fn filters_mut(&mut self) -> &mut SpaceFilters {
        &mut self.filters
    }

    pub fn reset_filters(&mut self) {
        self.filters = SpaceFilters::default();
    }

    #[must_use]
    pub fn grouping(&self) -> &GroupingConfig {
        &self.grouping
    }

    /// Turning grouping off also clears the color-by property.
    pub fn set_grouping(&mut self, grouping: GroupingConfig) {
        if !grouping.enabled {
            self.color_by = None;
        }
        self.grouping = grouping;
    }

    #[must_use]
    pub fn color_by(&self) -> Option<&str> {
        self.color_by.as_deref()
    }

    pub fn set_color_by_property(&mut self, key: Option<String>) {
        self.color_by = key.filter(|k| !k.is_empty());
    }

    // ── derived views ────────────────────────────────────────

    #[must_use]
    pub fn filtered_spaces(&self) -> Vec<&Space> {
        filter_spaces(&self.spaces, &self.filters)
    }

    #[must_use]
    pub fn grouped_spaces(&self) -> Vec<SpaceGroup<'_>> {
        group_spaces(&self.filtered_spaces(), &self.grouping)
    }

    #[must_use]
    pub fn available_floor_levels(&self) -> Vec<String> {
        self.spaces
            .iter()
            .filter_map(|s| s.floor_level.clone())
            .filter(|l| !l.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn available_property_keys(&self) -> Vec<String> {
        self.spaces
            .iter()
            .flat_map(|s| s.properties.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn available_property_values(&self, key: &str) -> Vec<String> {
        self.spaces
            .iter()
            .filter_map(|s| s.property_text(key))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn model_info(model_id: &str) -> ModelInfo {
    ModelInfo {
        model_id: model_id.to_string(),
        filename: "model.ifc".to_string(),
        uploaded_at: "2024-01-01T00:00:00".to_string(),
        space_count: 0,
        equipment_count: 0,
        building_element_count: 0,
        project_info: serde_json::Map::new(),
        metadata: serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::filter::Range;
    use pretty_assertions::assert_eq;

    fn repo_with(ids: &[&str]) -> SpaceRepository {
        let mut repo = SpaceRepository::new();
        let spaces = ids.iter().map(|id| Space::new(*id, *id)).collect();
        repo.load(spaces, model_info("m1"));
        repo
    }

    fn delta(key: &str, value: &str) -> PropertyMap {
        let mut map = PropertyMap::new();
        map.insert(key.into(), value.into());
        map
    }

    #[test]
    fn mutate_properties_targets_one_space() {
        let mut repo = repo_with(&["a", "b"]);
        assert!(repo.mutate_properties("b", &delta("Zone", "N")));
        assert!(!repo.mutate_properties("zzz", &delta("Zone", "N")));

        assert_eq!(repo.space("a").unwrap().property_text("Zone"), None);
        assert_eq!(
            repo.space("b").unwrap().property_text("Zone").as_deref(),
            Some("N")
        );
    }

    #[test]
    fn mutate_many_preserves_order_and_ignores_unknown() {
        let mut repo = repo_with(&["a", "b", "c"]);
        let updates = vec![
            PropertyUpdate {
                id: "c".into(),
                properties: delta("k", "1"),
            },
            PropertyUpdate {
                id: "x".into(),
                properties: delta("k", "2"),
            },
            PropertyUpdate {
                id: "a".into(),
                properties: delta("k", "3"),
            },
        ];

        assert_eq!(repo.mutate_many(&updates), 2);
        let order: Vec<&str> = repo.spaces().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(repo.spaces()[0].property_text("k").as_deref(), Some("3"));
        assert_eq!(repo.spaces()[1].property_text("k"), None);
    }

    #[test]
    fn reset_clears_everything() {
        let mut repo = repo_with(&["a", "b"]);
        repo.select_only(["a"]);
        repo.filters_mut().area = Range::new(Some(1.0), None);
        repo.set_grouping(GroupingConfig {
            enabled: true,
            property_key: Some("k".into()),
        });
        repo.set_color_by_property(Some("k".into()));

        repo.reset();

        assert!(repo.spaces().is_empty());
        assert!(repo.model_info().is_none());
        assert!(repo.selection().is_empty());
        assert!(repo.filters().is_empty());
        assert_eq!(repo.grouping(), &GroupingConfig::default());
        assert_eq!(repo.color_by(), None);
    }

    #[test]
    fn selection_never_dangles() {
        let mut repo = repo_with(&["a", "b"]);
        repo.select_only(["a", "ghost"]);
        assert_eq!(repo.selection().iter().collect::<Vec<_>>(), vec!["a"]);

        repo.toggle_selected("ghost");
        assert!(!repo.selection().contains("ghost"));

        repo.toggle_selected("b");
        repo.load(vec![Space::new("b", "b")], model_info("m2"));
        assert_eq!(repo.selection().iter().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn disabling_grouping_clears_color_by() {
        let mut repo = repo_with(&["a"]);
        repo.set_grouping(GroupingConfig {
            enabled: true,
            property_key: Some("k".into()),
        });
        repo.set_color_by_property(Some("k".into()));
        assert_eq!(repo.color_by(), Some("k"));

        repo.set_grouping(GroupingConfig {
            enabled: false,
            property_key: Some("k".into()),
        });
        assert_eq!(repo.color_by(), None);
    }

    #[test]
    fn derived_views_follow_mutations() {
        let mut repo = repo_with(&["a", "b"]);
        repo.filters_mut().set_custom("Zone", "N");
        assert!(repo.filtered_spaces().is_empty());

        repo.mutate_properties("b", &delta("Zone", "N"));
        let filtered: Vec<&str> = repo.filtered_spaces().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(filtered, vec!["b"]);
        assert_eq!(repo.available_property_keys(), vec!["Zone".to_string()]);
        assert_eq!(repo.available_property_values("Zone"), vec!["N".to_string()]);
    }

    #[test]
    fn replace_space_only_touches_known_ids() {
        let mut repo = repo_with(&["a"]);
        let mut fresh = Space::new("a", "Renamed");
        fresh.area = Some(12.0);
        assert!(repo.replace_space(fresh.clone()));
        assert_eq!(repo.space("a"), Some(&fresh));
        assert!(!repo.replace_space(Space::new("zz", "zz")));
        assert_eq!(repo.spaces().len(), 1);
    }
}
