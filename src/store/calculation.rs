use crate::model::{ComplianceStatus, VentilationResult};
use std::collections::HashMap;

/// Ventilation results keyed by space id.
#[derive(Debug, Clone, Default)]
pub struct CalculationCache {
    results: HashMap<String, VentilationResult>,
    pub is_calculating: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplianceSummary {
    pub ok: usize,
    pub warning: usize,
    pub ng: usize,
}

impl CalculationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_result(&mut self, result: VentilationResult) {
        self.results.insert(result.space_id.clone(), result);
    }

    /// Replaces every cached result with `results`.
    pub fn set_results(&mut self, results: Vec<VentilationResult>) {
        self.results = results
            .into_iter()
            .map(|r| (r.space_id.clone(), r))
            .collect();
    }

    pub fn clear(&mut self) {
        self.results.clear();
        self.is_calculating = false;
    }

    #[must_use]
    pub fn result_for(&self, space_id: &str) -> Option<&VentilationResult> {
        self.results.get(space_id)
    }

    #[must_use]
    pub fn status_for(&self, space_id: &str) -> Option<ComplianceStatus> {
        self.result_for(space_id).map(|r| r.compliance_status)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn summary(&self) -> ComplianceSummary {
        let mut summary = ComplianceSummary::default();
        for result in self.results.values() {
            match result.compliance_status {
                ComplianceStatus::Ok => summary.ok += 1,
                ComplianceStatus::Warning => summary.warning += 1,
                ComplianceStatus::Ng => summary.ng += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
pub(crate) fn result(space_id: &str, status: ComplianceStatus) -> VentilationResult {
    VentilationResult {
        space_id: space_id.to_string(),
        space_name: space_id.to_string(),
        required_ventilation: 100.0,
        air_change_rate: 0.5,
        method: crate::model::VentilationMethod::BuildingCode,
        used_area: None,
        used_volume: None,
        used_occupancy: None,
        used_usage: None,
        standard_air_change_rate: None,
        standard_fresh_air_per_person: None,
        compliance_status: status,
        compliance_notes: None,
        calculation_details: serde_json::Map::new(),
        applied_standard: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_results_replaces_previous_batch() {
        let mut cache = CalculationCache::new();
        cache.set_result(result("old", ComplianceStatus::Ng));
        cache.set_results(vec![
            result("a", ComplianceStatus::Ok),
            result("b", ComplianceStatus::Warning),
            result("c", ComplianceStatus::Ok),
        ]);

        assert!(cache.result_for("old").is_none());
        assert_eq!(cache.status_for("b"), Some(ComplianceStatus::Warning));
        assert_eq!(
            cache.summary(),
            ComplianceSummary {
                ok: 2,
                warning: 1,
                ng: 0
            }
        );
    }

    #[test]
    fn clear_resets_flag() {
        let mut cache = CalculationCache::new();
        cache.is_calculating = true;
        cache.set_result(result("a", ComplianceStatus::Ok));
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.is_calculating);
    }
}
