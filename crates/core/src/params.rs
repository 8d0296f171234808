//! Live parameter store.
//!
//! One flat map over `(group, key)` seeded from every experiment's schema
//! defaults. Kernels read, never write; writes come from the parameter panel
//! through the controller and are clamped to the schema bounds here. An
//! out-of-range write is stored at the nearest bound, never dropped.

use hashbrown::HashMap;

use crate::registry;

#[derive(Debug, Clone)]
pub struct ParameterSet {
    values: HashMap<(&'static str, &'static str), f32>,
}

impl ParameterSet {
    /// Seed every group from its schema defaults.
    pub fn defaults() -> Self {
        let mut values = HashMap::new();
        for desc in registry::experiments() {
            for spec in desc.schema {
                values.insert((spec.group, spec.key), spec.default);
            }
        }
        Self { values }
    }

    /// Current value, falling back to the schema default for a known key
    /// that was never written. Unknown keys read as 0.
    pub fn get(&self, group: &str, key: &str) -> f32 {
        if let Some(spec) = registry::find_spec(group, key) {
            return *self
                .values
                .get(&(spec.group, spec.key))
                .unwrap_or(&spec.default);
        }
        0.0
    }

    /// Clamped write. Returns the stored value, or `None` when `(group, key)`
    /// names no schema entry.
    pub fn set(&mut self, group: &str, key: &str, value: f32) -> Option<f32> {
        let spec = registry::find_spec(group, key)?;
        let clamped = if value.is_finite() {
            value.clamp(spec.min, spec.max)
        } else {
            spec.default
        };
        self.values.insert((spec.group, spec.key), clamped);
        Some(clamped)
    }

    /// Snapshot of one group in schema order, for the panel and the HUD.
    pub fn group_values(&self, group: &str) -> Vec<(&'static str, f32)> {
        registry::experiments()
            .iter()
            .flat_map(|d| d.schema.iter())
            .filter(|s| s.group == group)
            .map(|s| (s.key, self.get(s.group, s.key)))
            .collect()
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_from_schema_defaults() {
        let p = ParameterSet::defaults();
        assert_eq!(p.get("flow", "particles"), 520.0);
        assert_eq!(p.get("kalman", "sigma"), 13.0);
        assert_eq!(p.get("plasma", "warp"), 0.8);
    }

    #[test]
    fn in_bounds_write_is_stored_verbatim() {
        let mut p = ParameterSet::defaults();
        assert_eq!(p.set("flow", "speed", 1.7), Some(1.7));
        assert_eq!(p.get("flow", "speed"), 1.7);
    }

    #[test]
    fn out_of_bounds_write_clamps_to_nearest_bound() {
        let mut p = ParameterSet::defaults();
        assert_eq!(p.set("flow", "particles", 10_000.0), Some(1200.0));
        assert_eq!(p.get("flow", "particles"), 1200.0);
        assert_eq!(p.set("flow", "particles", -5.0), Some(120.0));
        assert_eq!(p.get("flow", "particles"), 120.0);
    }

    #[test]
    fn non_finite_write_falls_back_to_default() {
        let mut p = ParameterSet::defaults();
        assert_eq!(p.set("kalman", "sigma", f32::NAN), Some(13.0));
        assert_eq!(p.get("kalman", "sigma"), 13.0);
    }

    #[test]
    fn unknown_key_is_rejected_not_stored() {
        let mut p = ParameterSet::defaults();
        assert_eq!(p.set("flow", "gravity", 9.8), None);
        assert_eq!(p.get("flow", "gravity"), 0.0);
    }

    #[test]
    fn group_values_follow_schema_order() {
        let p = ParameterSet::defaults();
        let keys: Vec<&str> = p.group_values("cursor").iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["spacing", "influence", "arrow_length"]);
    }
}
