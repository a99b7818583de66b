//! Expression memory: learned transition naturalness and variant choice.
//!
//! The transition engine decides *when* to move between emotions; this
//! module remembers *which* moves have looked natural and which concrete
//! expression asset (a "variant") should display a given emotion next, so
//! the avatar doesn't play the same happy face three times in a row.

use crate::distance::{CompatibilityTable, DistanceTable};
use anima_core::{clamp01, Emotion};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// A concrete expression asset for an emotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionVariant {
    pub id: String,
    /// Base selection weight; defaults to 1.
    pub weight: f32,
}

impl ExpressionVariant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            weight: 1.0,
        }
    }

    pub fn with_weight(id: impl Into<String>, weight: f32) -> Self {
        Self {
            id: id.into(),
            weight: weight.max(0.0),
        }
    }
}

/// How far back "recently shown" reaches.
const RECENT_EMOTIONS: usize = 8;
const RECENT_VARIANTS: usize = 6;

pub struct ExpressionMemory {
    distances: DistanceTable,
    compatibility: CompatibilityTable,

    /// Learned naturalness per directed transition, EMA in [0, 1].
    naturalness: HashMap<(Emotion, Emotion), f32>,
    transition_counts: HashMap<(Emotion, Emotion), u32>,

    recent_emotions: VecDeque<Emotion>,
    recent_variant_ids: VecDeque<String>,

    variants: HashMap<Emotion, Vec<ExpressionVariant>>,
    /// Learned per-variant preference multiplier, around 1.0.
    preference: HashMap<String, f32>,
}

impl Default for ExpressionMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionMemory {
    pub fn new() -> Self {
        Self {
            distances: DistanceTable::default(),
            compatibility: CompatibilityTable::default(),
            naturalness: HashMap::new(),
            transition_counts: HashMap::new(),
            recent_emotions: VecDeque::new(),
            recent_variant_ids: VecDeque::new(),
            variants: HashMap::new(),
            preference: HashMap::new(),
        }
    }

    /// Prior naturalness before any observation: the inverse of distance.
    fn prior(&self, from: Emotion, to: Emotion) -> f32 {
        1.0 - self.distances.distance(from, to)
    }

    /// Learned (or prior) naturalness of a directed transition.
    pub fn naturalness(&self, from: Emotion, to: Emotion) -> f32 {
        self.naturalness
            .get(&(from, to))
            .copied()
            .unwrap_or_else(|| self.prior(from, to))
    }

    /// Record that a transition was displayed. Each observation pulls the
    /// learned naturalness up — transitions we keep making are, for this
    /// avatar, natural.
    pub fn record_transition(&mut self, from: Emotion, to: Emotion) {
        let prior = self.prior(from, to);
        let entry = self.naturalness.entry((from, to)).or_insert(prior);
        *entry = clamp01(*entry * 0.9 + 0.1);
        *self.transition_counts.entry((from, to)).or_insert(0) += 1;

        self.recent_emotions.push_back(to);
        while self.recent_emotions.len() > RECENT_EMOTIONS {
            self.recent_emotions.pop_front();
        }
    }

    pub fn transition_count(&self, from: Emotion, to: Emotion) -> u32 {
        self.transition_counts
            .get(&(from, to))
            .copied()
            .unwrap_or(0)
    }

    /// Score every candidate next emotion from the current one, informed by
    /// the conversational context emotion. Higher is more fitting.
    pub fn score_candidates(&self, current: Emotion, context: Emotion) -> Vec<(Emotion, f32)> {
        let mut scores: Vec<(Emotion, f32)> = Emotion::all()
            .iter()
            .filter(|e| **e != current)
            .map(|&candidate| {
                let naturalness = self.naturalness(current, candidate);
                let affinity = 0.4 + 0.6 * self.compatibility.compatibility(candidate, context);
                let recency = if self.recent_emotions.contains(&candidate) {
                    0.6
                } else {
                    1.0
                };
                (candidate, naturalness * affinity * recency)
            })
            .collect();
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        scores
    }

    /// Weighted-random choice among the top-scored candidates.
    pub fn suggest_next(&self, current: Emotion, context: Emotion) -> Emotion {
        self.suggest_next_with(current, context, &mut rand::thread_rng())
    }

    pub fn suggest_next_with(
        &self,
        current: Emotion,
        context: Emotion,
        rng: &mut impl Rng,
    ) -> Emotion {
        let scores = self.score_candidates(current, context);
        let pool: Vec<&(Emotion, f32)> = scores.iter().take(5).collect();
        weighted_pick(rng, &pool, |(_, s)| *s)
            .map(|(e, _)| *e)
            .unwrap_or(current)
    }

    /// Register the display variants available for an emotion.
    pub fn register_variants(&mut self, emotion: Emotion, variants: Vec<ExpressionVariant>) {
        self.variants.insert(emotion, variants);
    }

    /// Pick which asset should display `emotion` this time.
    ///
    /// Weighted random over the registered set, biased away from recently
    /// shown variants and toward ones the user has responded well to.
    /// Returns `None` when no variants are registered (documented
    /// lookup-miss default).
    pub fn select_variant(&mut self, emotion: Emotion) -> Option<String> {
        self.select_variant_with(emotion, &mut rand::thread_rng())
    }

    pub fn select_variant_with(&mut self, emotion: Emotion, rng: &mut impl Rng) -> Option<String> {
        let candidates = self.variants.get(&emotion)?;
        if candidates.is_empty() {
            return None;
        }
        let recent = &self.recent_variant_ids;
        let preference = &self.preference;
        let chosen = weighted_pick(rng, candidates, |v| {
            let pref = preference.get(&v.id).copied().unwrap_or(1.0);
            let recency = if recent.contains(&v.id) { 0.3 } else { 1.0 };
            (v.weight * pref * recency).max(0.001)
        })?
        .id
        .clone();

        self.recent_variant_ids.push_back(chosen.clone());
        while self.recent_variant_ids.len() > RECENT_VARIANTS {
            self.recent_variant_ids.pop_front();
        }
        Some(chosen)
    }

    /// Feed back whether a displayed variant landed well.
    pub fn record_variant_feedback(&mut self, variant_id: &str, positive: bool) {
        let entry = self.preference.entry(variant_id.to_string()).or_insert(1.0);
        let target = if positive { 1.6 } else { 0.5 };
        *entry = (*entry * 0.8 + target * 0.2).clamp(0.2, 2.0);
    }

    pub fn reset(&mut self) {
        self.naturalness.clear();
        self.transition_counts.clear();
        self.recent_emotions.clear();
        self.recent_variant_ids.clear();
        self.preference.clear();
    }
}

/// Roll a weighted random element. Returns `None` for an empty slice or an
/// all-zero weight sum.
fn weighted_pick<'a, T>(
    rng: &mut impl Rng,
    items: &'a [T],
    weight: impl Fn(&T) -> f32,
) -> Option<&'a T> {
    let total: f32 = items.iter().map(&weight).filter(|w| w.is_finite()).sum();
    if total <= 0.0 || !total.is_finite() {
        return items.first();
    }
    let mut roll = rng.gen::<f32>() * total;
    for item in items {
        let w = weight(item);
        if !w.is_finite() {
            continue;
        }
        roll -= w;
        if roll <= 0.0 {
            return Some(item);
        }
    }
    items.last()
}
