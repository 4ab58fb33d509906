//! Partitioning of the filtered spaces by a property, with per-group totals.

use crate::model::Space;

/// Label of the single group emitted when grouping is disabled.
pub const ALL_GROUP: &str = "All";
/// Label of the group collecting spaces without the grouping property.
pub const UNSET_GROUP: &str = "(unset)";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupingConfig {
    pub enabled: bool,
    pub property_key: Option<String>,
}

impl GroupingConfig {
    /// The key to group by, if grouping is both enabled and configured.
    #[must_use]
    pub fn active_key(&self) -> Option<&str> {
        if self.enabled {
            self.property_key.as_deref().filter(|k| !k.is_empty())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpaceGroup<'a> {
    pub label: String,
    pub spaces: Vec<&'a Space>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupStats {
    pub count: usize,
    pub total_area: f64,
    pub total_volume: f64,
    pub average_height: f64,
}

impl SpaceGroup<'_> {
    /// Totals over the group. Missing metrics count as zero, and the height
    /// average divides by the full member count.
    #[must_use]
    pub fn stats(&self) -> GroupStats {
        let count = self.spaces.len();
        let total_area = self.spaces.iter().filter_map(|s| s.area).sum();
        let total_volume = self.spaces.iter().filter_map(|s| s.volume).sum();
        let height_sum: f64 = self.spaces.iter().filter_map(|s| s.height).sum();
        let average_height = if count > 0 {
            height_sum / count as f64
        } else {
            0.0
        };

        GroupStats {
            count,
            total_area,
            total_volume,
            average_height,
        }
    }
}

/// Groups `spaces` by the stringified value of the configured property.
/// Groups appear in order of their first member.
#[must_use]
pub fn group_spaces<'a>(spaces: &[&'a Space], config: &GroupingConfig) -> Vec<SpaceGroup<'a>> {
    let Some(key) = config.active_key() else {
        return vec![SpaceGroup {
            label: ALL_GROUP.to_string(),
            spaces: spaces.to_vec(),
        }];
    };

    let mut groups: Vec<SpaceGroup<'a>> = Vec::new();
    for &space in spaces {
        let label = space
            .property_text(key)
            .unwrap_or_else(|| UNSET_GROUP.to_string());
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.spaces.push(space),
            None => groups.push(SpaceGroup {
                label,
                spaces: vec![space],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn with_p(id: &str, p: Option<&str>) -> Space {
        let mut s = Space::new(id, id);
        if let Some(value) = p {
            s.properties.insert("p".into(), value.into());
        }
        s
    }

    #[test]
    fn groups_by_property_with_unset_bucket() {
        let spaces = vec![
            with_p("1", Some("A")),
            with_p("2", Some("A")),
            with_p("3", Some("B")),
            with_p("4", None),
        ];
        let refs: Vec<&Space> = spaces.iter().collect();
        let config = GroupingConfig {
            enabled: true,
            property_key: Some("p".into()),
        };

        let groups = group_spaces(&refs, &config);
        let summary: Vec<(String, usize)> = groups
            .iter()
            .map(|g| (g.label.clone(), g.spaces.len()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A".to_string(), 2),
                ("B".to_string(), 1),
                (UNSET_GROUP.to_string(), 1)
            ]
        );
    }

    #[test]
    fn disabled_grouping_yields_single_group() {
        let spaces = vec![with_p("1", Some("A")), with_p("2", None)];
        let refs: Vec<&Space> = spaces.iter().collect();
        let config = GroupingConfig {
            enabled: false,
            property_key: Some("p".into()),
        };

        let groups = group_spaces(&refs, &config);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, ALL_GROUP);
        assert_eq!(groups[0].spaces.len(), 2);
    }

    #[test]
    fn null_values_fall_into_unset() {
        let mut s = Space::new("1", "1");
        s.properties.insert("p".into(), crate::model::PropertyValue::Null);
        let refs = vec![&s];
        let config = GroupingConfig {
            enabled: true,
            property_key: Some("p".into()),
        };
        assert_eq!(group_spaces(&refs, &config)[0].label, UNSET_GROUP);
    }

    #[test]
    fn average_height_divides_by_member_count() {
        let mut a = Space::new("a", "a");
        a.height = Some(3.0);
        a.area = Some(10.0);
        let mut b = Space::new("b", "b");
        b.area = Some(5.5);
        b.volume = Some(12.0);

        let group = SpaceGroup {
            label: ALL_GROUP.into(),
            spaces: vec![&a, &b],
        };
        let stats = group.stats();
        assert_eq!(stats.count, 2);
        assert_relative_eq!(stats.total_area, 15.5);
        assert_relative_eq!(stats.total_volume, 12.0);
        assert_relative_eq!(stats.average_height, 1.5);
    }
}
