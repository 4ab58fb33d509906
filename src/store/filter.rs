//! Declarative space filtering.

use crate::model::Space;
use std::collections::BTreeMap;

/// Inclusive numeric bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    #[must_use]
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// A missing metric never fails the range.
    #[must_use]
    pub fn admits(&self, metric: Option<f64>) -> bool {
        let Some(value) = metric else {
            return true;
        };
        if self.min.is_some_and(|min| value < min) {
            return false;
        }
        if self.max.is_some_and(|max| value > max) {
            return false;
        }
        true
    }
}

/// Filter criteria applied to the space list. The default admits everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpaceFilters {
    pub floor_levels: Vec<String>,
    pub area: Range,
    pub volume: Range,
    pub height: Range,
    /// property key → required display value; empty values are ignored
    pub custom: BTreeMap<String, String>,
}

impl SpaceFilters {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.floor_levels.is_empty()
            && self.area.is_unbounded()
            && self.volume.is_unbounded()
            && self.height.is_unbounded()
            && self.custom.values().all(String::is_empty)
    }

    /// Adds the level to the include-set, or removes it if already present.
    pub fn toggle_floor_level(&mut self, level: &str) {
        if let Some(pos) = self.floor_levels.iter().position(|l| l == level) {
            self.floor_levels.remove(pos);
        } else {
            self.floor_levels.push(level.to_string());
        }
    }

    /// Sets or (with an empty value) removes a custom equality constraint.
    pub fn set_custom(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.custom.remove(key);
        } else {
            self.custom.insert(key.to_string(), value.to_string());
        }
    }

    #[must_use]
    pub fn matches(&self, space: &Space) -> bool {
        if !self.floor_levels.is_empty() {
            // an empty label counts as no level
            if let Some(level) = space.floor_level.as_deref().filter(|l| !l.is_empty()) {
                if !self.floor_levels.iter().any(|l| l == level) {
                    return false;
                }
            }
        }

        if !self.area.admits(space.area)
            || !self.volume.admits(space.volume)
            || !self.height.admits(space.height)
        {
            return false;
        }

        self.custom
            .iter()
            .filter(|(_, required)| !required.is_empty())
            .all(|(key, required)| space.property_text(key).as_deref() == Some(required.as_str()))
    }
}

/// Spaces passing `filters`, in their original order.
#[must_use]
pub fn filter_spaces<'a>(spaces: &'a [Space], filters: &SpaceFilters) -> Vec<&'a Space> {
    spaces.iter().filter(|s| filters.matches(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn space(id: &str, area: Option<f64>) -> Space {
        let mut s = Space::new(id, id);
        s.area = area;
        s
    }

    fn ids(spaces: &[&Space]) -> Vec<String> {
        spaces.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn empty_filter_is_identity() {
        let spaces = vec![space("a", Some(1.0)), space("b", None), space("c", Some(3.0))];
        let result = filter_spaces(&spaces, &SpaceFilters::default());
        assert_eq!(ids(&result), vec!["a", "b", "c"]);
    }

    #[test]
    fn area_range_passes_undefined_area() {
        let spaces = vec![
            space("30", Some(30.0)),
            space("75", Some(75.0)),
            space("150", Some(150.0)),
            space("none", None),
        ];
        let filters = SpaceFilters {
            area: Range::new(Some(50.0), Some(100.0)),
            ..SpaceFilters::default()
        };
        assert_eq!(ids(&filter_spaces(&spaces, &filters)), vec!["75", "none"]);
    }

    #[test]
    fn bounds_are_inclusive() {
        let spaces = vec![space("50", Some(50.0)), space("100", Some(100.0))];
        let filters = SpaceFilters {
            area: Range::new(Some(50.0), Some(100.0)),
            ..SpaceFilters::default()
        };
        assert_eq!(filter_spaces(&spaces, &filters).len(), 2);
    }

    #[test]
    fn floor_filter_keeps_spaces_without_level() {
        let mut a = space("a", None);
        a.floor_level = Some("1F".into());
        let mut b = space("b", None);
        b.floor_level = Some("2F".into());
        let c = space("c", None);
        let spaces = vec![a, b, c];

        let mut filters = SpaceFilters::default();
        filters.toggle_floor_level("2F");
        assert_eq!(ids(&filter_spaces(&spaces, &filters)), vec!["b", "c"]);

        filters.toggle_floor_level("2F");
        assert!(filters.is_empty());
    }

    #[test]
    fn floor_filter_keeps_spaces_with_blank_level() {
        let mut a = space("a", None);
        a.floor_level = Some("1F".into());
        let mut b = space("b", None);
        b.floor_level = Some(String::new());
        let spaces = vec![a, b];

        let mut filters = SpaceFilters::default();
        filters.toggle_floor_level("1F");
        assert_eq!(ids(&filter_spaces(&spaces, &filters)), vec!["a", "b"]);
    }

    #[test]
    fn custom_filter_compares_display_strings() {
        let mut a = space("a", None);
        a.properties.insert("Rooms".into(), 2.0.into());
        let mut b = space("b", None);
        b.properties.insert("Rooms".into(), "3".into());
        let c = space("c", None);
        let spaces = vec![a, b, c];

        let mut filters = SpaceFilters::default();
        filters.set_custom("Rooms", "2");
        assert_eq!(ids(&filter_spaces(&spaces, &filters)), vec!["a"]);

        filters.set_custom("Rooms", "");
        assert_eq!(filter_spaces(&spaces, &filters).len(), 3);
    }

    #[test]
    fn relaxing_a_constraint_never_shrinks_result() {
        let mut spaces = Vec::new();
        for i in 0..20 {
            let mut s = space(&i.to_string(), if i % 4 == 0 { None } else { Some(f64::from(i) * 10.0) });
            s.height = if i % 3 == 0 { None } else { Some(f64::from(i % 5)) };
            s.floor_level = Some(format!("{}F", i % 3));
            spaces.push(s);
        }

        let strict = SpaceFilters {
            floor_levels: vec!["1F".into()],
            area: Range::new(Some(20.0), Some(150.0)),
            height: Range::new(Some(1.0), None),
            ..SpaceFilters::default()
        };
        let strict_count = filter_spaces(&spaces, &strict).len();

        let mut relaxed = strict.clone();
        relaxed.floor_levels.clear();
        assert!(filter_spaces(&spaces, &relaxed).len() >= strict_count);

        let mut relaxed = strict.clone();
        relaxed.area = Range::default();
        assert!(filter_spaces(&spaces, &relaxed).len() >= strict_count);

        let mut relaxed = strict;
        relaxed.height.min = None;
        assert!(filter_spaces(&spaces, &relaxed).len() >= strict_count);
    }
}
