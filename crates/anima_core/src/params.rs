//! The flat `name → f32` parameter map consumed by the renderer binding.
//!
//! There is deliberately no schema beyond "named float": micro-expression,
//! eye and physics outputs all merge into one of these before hand-off.
//! Writes are sanitized; iteration order is stable for deterministic output.

use crate::math::sanitize_f32;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamMap {
    values: BTreeMap<String, f32>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, sanitizing non-finite input to 0.
    pub fn set(&mut self, name: impl Into<String>, value: f32) {
        self.values.insert(name.into(), sanitize_f32(value, 0.0));
    }

    /// Insert a value clamped to [min, max].
    pub fn set_clamped(&mut self, name: impl Into<String>, value: f32, min: f32, max: f32) {
        self.set(name, sanitize_f32(value, 0.0).clamp(min, max));
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }

    /// Merge another map; `other`'s entries win on key collision.
    pub fn merge(&mut self, other: &ParamMap) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), *v);
        }
    }

    /// Merge another map additively: colliding keys sum.
    pub fn merge_add(&mut self, other: &ParamMap) {
        for (k, v) in &other.values {
            let entry = self.values.entry(k.clone()).or_insert(0.0);
            *entry = sanitize_f32(*entry + *v, 0.0);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_sanitizes() {
        let mut p = ParamMap::new();
        p.set("a", f32::NAN);
        assert_eq!(p.get("a"), Some(0.0));
    }

    #[test]
    fn test_set_clamped() {
        let mut p = ParamMap::new();
        p.set_clamped("brow", 2.5, -1.0, 1.0);
        assert_eq!(p.get("brow"), Some(1.0));
        p.set_clamped("brow", -2.5, -1.0, 1.0);
        assert_eq!(p.get("brow"), Some(-1.0));
    }

    #[test]
    fn test_merge_override_wins() {
        let mut a = ParamMap::new();
        a.set("x", 1.0);
        let mut b = ParamMap::new();
        b.set("x", 2.0);
        b.set("y", 3.0);
        a.merge(&b);
        assert_eq!(a.get("x"), Some(2.0));
        assert_eq!(a.get("y"), Some(3.0));
    }

    #[test]
    fn test_merge_add_sums() {
        let mut a = ParamMap::new();
        a.set("x", 0.3);
        let mut b = ParamMap::new();
        b.set("x", 0.2);
        a.merge_add(&b);
        assert!((a.get("x").unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic_iteration() {
        let mut p = ParamMap::new();
        p.set("z", 1.0);
        p.set("a", 2.0);
        let keys: Vec<&str> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "z"]);
    }
}
