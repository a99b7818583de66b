//! The touch interaction engine.
//!
//! Wires the gesture classifier to the rule table through an affection
//! economy: classified events pass the excessive-touch breaker, then
//! per-(area, gesture) cooldowns, then affection-gated rule matching and
//! two-stage weighted reaction selection. Affection decays over wall-clock
//! time; every mutation notifies fault-isolated observers.

use crate::gesture::{
    GestureThresholds, GestureTracker, TouchArea, TouchEvent, TouchGesture, TouchPoint,
};
use crate::rules::{default_rules, InteractionRule, Reaction};
use anima_core::{config::TouchConfig, Emotion, FrameTask, ObserverId, ObserverSet};
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// What an interaction produced, delivered to observers and the caller.
#[derive(Debug, Clone)]
pub struct TouchOutcome {
    pub area: TouchArea,
    pub gesture: TouchGesture,
    pub expression: String,
    pub emotion: Emotion,
    pub dialogue: Option<String>,
    pub affection: f32,
    pub affection_delta: f32,
    /// True when the excessive-touch breaker fired instead of a rule.
    pub excessive: bool,
}

pub struct TouchEngine {
    config: TouchConfig,
    tracker: GestureTracker,
    rules: Vec<InteractionRule>,

    /// Affection scalar in [0, 100], decaying over wall-clock time.
    affection: f32,
    last_decay: Option<Instant>,

    /// Next-allowed time per (area, gesture).
    cooldowns: HashMap<(TouchArea, TouchGesture), Instant>,
    /// Trailing event times per area, for the breaker.
    recent: HashMap<TouchArea, VecDeque<Instant>>,

    emotional_state: Emotion,
    observers: ObserverSet<TouchOutcome>,
}

impl Default for TouchEngine {
    fn default() -> Self {
        Self::new(TouchConfig::default())
    }
}

impl TouchEngine {
    pub fn new(config: TouchConfig) -> Self {
        let thresholds = GestureThresholds {
            long_press_ms: config.long_press_ms,
            double_tap_ms: config.double_tap_ms,
            drag_threshold: config.drag_threshold,
            rub_threshold: config.rub_threshold,
        };
        let affection = config.initial_affection.clamp(0.0, 100.0);
        Self {
            config,
            tracker: GestureTracker::new(thresholds),
            rules: default_rules(),
            affection,
            last_decay: None,
            cooldowns: HashMap::new(),
            recent: HashMap::new(),
            emotional_state: Emotion::Neutral,
            observers: ObserverSet::new(),
        }
    }

    // === Input surface ===

    pub fn press(&mut self, area: &str, position: TouchPoint, now: Instant) {
        self.tracker.press(TouchArea::from_label(area), position, now);
    }

    pub fn move_to(&mut self, position: TouchPoint, now: Instant) {
        self.tracker.move_to(position, now);
    }

    /// Release the touch; classification and rule processing happen here.
    pub fn release(&mut self, now: Instant) -> Option<TouchOutcome> {
        let event = self.tracker.release(now)?;
        self.process_event(event, &mut rand::thread_rng())
    }

    /// Feed an already-classified event (also the deterministic test path).
    pub fn process_event(
        &mut self,
        event: TouchEvent,
        rng: &mut impl Rng,
    ) -> Option<TouchOutcome> {
        self.decay_affection(event.at);

        // Breaker bookkeeping first: every classified event counts toward
        // the trailing window, suppressed or not.
        let window = Duration::from_secs(self.config.breaker_window_secs);
        let recent = self.recent.entry(event.area).or_default();
        recent.push_back(event.at);
        while let Some(front) = recent.front() {
            if event.at.saturating_duration_since(*front) > window {
                recent.pop_front();
            } else {
                break;
            }
        }
        if recent.len() > self.config.breaker_limit {
            return Some(self.trip_breaker(event));
        }

        // Cooldown gate.
        if let Some(until) = self.cooldowns.get(&(event.area, event.gesture)) {
            if event.at < *until {
                tracing::trace!("touch {}:{:?} suppressed by cooldown", event.area, event.gesture);
                return None;
            }
        }

        // Rule filtering and two-stage weighted selection.
        let affection = self.affection;
        let candidates: Vec<&InteractionRule> = self
            .rules
            .iter()
            .filter(|r| r.matches(event.area, event.gesture, affection))
            .collect();
        if candidates.is_empty() {
            tracing::trace!("no rule for {}:{:?}", event.area, event.gesture);
            return None;
        }
        let rule = *weighted_pick(rng, &candidates, |r| r.weight)?;
        let rule_id = rule.id.clone();

        let current_emotion = self.emotional_state;
        let reaction = weighted_pick(rng, &rule.reactions, |r| {
            let mut w = r.weight.max(0.001);
            // High affection favors affection-raising reactions.
            if affection > 70.0 && r.emotional_change > 0.0 {
                w *= 1.5;
            }
            // Mild bias toward reactions matching the current mood.
            if Emotion::from_label(&r.expression) == current_emotion {
                w *= 1.3;
            }
            w
        })?
        .clone();

        let outcome = self.apply_reaction(event, &rule_id, reaction);
        Some(outcome)
    }

    fn apply_reaction(
        &mut self,
        event: TouchEvent,
        rule_id: &str,
        reaction: Reaction,
    ) -> TouchOutcome {
        let before = self.affection;
        self.affection = (self.affection + reaction.emotional_change).clamp(0.0, 100.0);

        let cooldown_ms =
            (reaction.cooldown_ms.max(1) as f32 * self.config.cooldown_multiplier.max(0.0)) as u64;
        self.cooldowns.insert(
            (event.area, event.gesture),
            event.at + Duration::from_millis(cooldown_ms.max(1)),
        );

        self.emotional_state = Emotion::from_label(&reaction.expression);

        let outcome = TouchOutcome {
            area: event.area,
            gesture: event.gesture,
            expression: reaction.expression,
            emotion: self.emotional_state,
            dialogue: reaction.dialogue,
            affection: self.affection,
            affection_delta: self.affection - before,
            excessive: false,
        };
        tracing::debug!(
            "touch rule '{}' fired: {} ({:+.1} affection -> {:.1})",
            rule_id,
            outcome.emotion,
            outcome.affection_delta,
            outcome.affection
        );
        self.observers.emit(&outcome);
        outcome
    }

    /// The excessive-touch breaker always overrides rule matching: canned
    /// annoyed dialogue, a fixed affection penalty, and a forced emotional
    /// state.
    fn trip_breaker(&mut self, event: TouchEvent) -> TouchOutcome {
        let before = self.affection;
        self.affection = (self.affection - self.config.breaker_penalty).clamp(0.0, 100.0);
        self.emotional_state = Emotion::from_label("annoyed");

        let outcome = TouchOutcome {
            area: event.area,
            gesture: event.gesture,
            expression: "annoyed".to_string(),
            emotion: self.emotional_state,
            dialogue: Some("够了啦！再这样我要生气了！".to_string()),
            affection: self.affection,
            affection_delta: self.affection - before,
            excessive: true,
        };
        tracing::debug!(
            "excessive-touch breaker tripped on {} ({:.1} affection)",
            event.area,
            self.affection
        );
        self.observers.emit(&outcome);
        outcome
    }

    // === Affection economy ===

    pub fn affection(&self) -> f32 {
        self.affection
    }

    pub fn set_affection(&mut self, value: f32) {
        self.affection = anima_core::sanitize_f32(value, self.affection).clamp(0.0, 100.0);
    }

    /// Continuous wall-clock decay, also driven by the frame loop.
    pub fn decay_affection(&mut self, now: Instant) {
        if let Some(last) = self.last_decay {
            let hours = now.saturating_duration_since(last).as_secs_f32() / 3600.0;
            if hours > 0.0 {
                self.affection = (self.affection
                    - hours * self.config.affection_decay_per_hour.max(0.0))
                .clamp(0.0, 100.0);
            }
        }
        self.last_decay = Some(now);
    }

    pub fn emotional_state(&self) -> Emotion {
        self.emotional_state
    }

    // === Rule management ===

    pub fn add_rule(&mut self, rule: InteractionRule) {
        self.rules.push(rule);
    }

    pub fn remove_rule(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        self.rules.len() != before
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn on_outcome(
        &mut self,
        callback: impl Fn(&TouchOutcome) + Send + Sync + 'static,
    ) -> ObserverId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }
}

/// Weighted random pick; degenerate weights fall back to the first element.
fn weighted_pick<'a, T>(
    rng: &mut impl Rng,
    items: &'a [T],
    weight: impl Fn(&T) -> f32,
) -> Option<&'a T> {
    let total: f32 = items
        .iter()
        .map(&weight)
        .filter(|w| w.is_finite() && *w > 0.0)
        .sum();
    if total <= 0.0 || !total.is_finite() {
        return items.first();
    }
    let mut roll = rng.gen::<f32>() * total;
    for item in items {
        let w = weight(item);
        if !w.is_finite() || w <= 0.0 {
            continue;
        }
        roll -= w;
        if roll <= 0.0 {
            return Some(item);
        }
    }
    items.last()
}

impl FrameTask for TouchEngine {
    fn tick(&mut self, now: Instant) {
        self.decay_affection(now);
    }

    fn reset(&mut self) {
        self.tracker.cancel();
        self.rules = default_rules();
        self.affection = self.config.initial_affection.clamp(0.0, 100.0);
        self.last_decay = None;
        self.cooldowns.clear();
        self.recent.clear();
        self.emotional_state = Emotion::Neutral;
        self.observers.clear();
    }
}
