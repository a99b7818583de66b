//! Conversational context tracking.
//!
//! The context engine sits between raw per-message detection and the
//! transition engine: it blends what was just detected with what the
//! conversation has been like, so a sad conversation followed by a filler
//! "好的" does not instantly snap the avatar back to neutral.
//!
//! Resolution is a weighted-influence vote: each source (detection, intent
//! bias, topic bias, emotional inertia, tone baseline) contributes
//! `(emotion, weight)` tuples; the emotion with the highest summed weight
//! wins and its share of the total becomes the output intensity.

use crate::intent::Intent;
use anima_core::{clamp01, config::ContextConfig, Emotion};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

/// Conversation atmosphere, derived from the resolved emotion each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Atmosphere {
    Warm,
    Tense,
    Casual,
    Serious,
    Playful,
    Melancholy,
    Neutral,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Atmosphere::Neutral
    }
}

fn atmosphere_of(emotion: Emotion) -> Atmosphere {
    use Emotion::*;
    match emotion {
        Loving | Grateful | Happy | Hopeful | Relieved => Atmosphere::Warm,
        Angry | Fear | Anxious | Disgust | Contempt => Atmosphere::Tense,
        Calm | Bored | Neutral => Atmosphere::Casual,
        Thinking | Determined | Confused | Curious => Atmosphere::Serious,
        Playful | Amused | Excited | Surprised | Proud => Atmosphere::Playful,
        Sad | Lonely | Disappointed | Embarrassed => Atmosphere::Melancholy,
    }
}

/// Where an influence tuple came from, kept for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceSource {
    Detection,
    IntentBias,
    TopicBias,
    Inertia,
    ToneBaseline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence {
    pub emotion: Emotion,
    pub weight: f32,
    pub source: InfluenceSource,
}

/// The running tone of the conversation.
#[derive(Debug, Clone)]
pub struct ConversationTone {
    pub base_emotion: Emotion,
    /// How settled the baseline is, in [0, 1]. Decays on mismatches,
    /// grows on repetition.
    pub stability: f32,
    /// Most recent topics, newest last, bounded.
    pub topic_stack: VecDeque<String>,
    pub last_significant_emotion: Option<Emotion>,
    pub atmosphere: Atmosphere,
    pub engagement: f32,
    pub last_intent: Intent,
}

impl Default for ConversationTone {
    fn default() -> Self {
        Self {
            base_emotion: Emotion::Neutral,
            stability: 0.5,
            topic_stack: VecDeque::new(),
            last_significant_emotion: None,
            atmosphere: Atmosphere::Neutral,
            engagement: 0.5,
            last_intent: Intent::Unknown,
        }
    }
}

/// Output of one `process_text` call.
#[derive(Debug, Clone)]
pub struct ResolvedContext {
    pub emotion: Emotion,
    pub intensity: f32,
    pub intent: Intent,
    pub atmosphere: Atmosphere,
    pub engagement: f32,
    /// The full influence list that produced the resolution.
    pub influences: Vec<Influence>,
}

/// Per-emotion inertia constants: how strongly a recent emotion of this
/// kind lingers. Strong emotions hold on longer than neutral/thinking.
fn inertia_constant(emotion: Emotion) -> f32 {
    use Emotion::*;
    match emotion {
        Sad | Lonely => 0.9,
        Angry | Fear => 0.85,
        Anxious | Disappointed => 0.8,
        Loving | Happy | Excited => 0.7,
        Grateful | Proud | Hopeful => 0.6,
        Surprised | Embarrassed | Confused => 0.5,
        Disgust | Contempt | Determined | Amused | Playful | Curious | Relieved => 0.55,
        Calm | Bored => 0.4,
        Thinking => 0.35,
        Neutral => 0.3,
    }
}

/// Topic keyword rule: a matching message biases the vote toward `emotion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub emotion: Emotion,
    pub weight: f32,
}

fn default_topics() -> Vec<TopicRule> {
    let rule = |name: &str, keywords: &[&str], emotion, weight| TopicRule {
        name: name.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        emotion,
        weight,
    };
    vec![
        rule(
            "work",
            &["工作", "加班", "上班", "老板", "deadline", "work", "boss"],
            Emotion::Anxious,
            0.3,
        ),
        rule(
            "food",
            &["好吃", "美食", "吃饭", "零食", "food", "delicious", "yummy"],
            Emotion::Happy,
            0.3,
        ),
        rule(
            "games",
            &["游戏", "打游戏", "通关", "game", "play", "gaming"],
            Emotion::Playful,
            0.35,
        ),
        rule(
            "weather_bad",
            &["下雨", "阴天", "台风", "rainy", "storm", "gloomy weather"],
            Emotion::Calm,
            0.2,
        ),
        rule(
            "pets",
            &["猫", "狗", "宠物", "cat", "dog", "puppy", "kitten"],
            Emotion::Loving,
            0.35,
        ),
        rule(
            "study",
            &["考试", "学习", "作业", "论文", "exam", "study", "homework"],
            Emotion::Thinking,
            0.3,
        ),
        rule(
            "memories",
            &["以前", "小时候", "怀念", "回忆", "remember when", "miss those"],
            Emotion::Lonely,
            0.25,
        ),
    ]
}

struct HistoryEntry {
    emotion: Emotion,
    intensity: f32,
    at: Instant,
}

/// The context engine. One instance per conversation; construct explicitly,
/// no shared global.
pub struct ContextEngine {
    config: ContextConfig,
    tone: ConversationTone,
    topics: Vec<TopicRule>,
    history: VecDeque<HistoryEntry>,
}

impl Default for ContextEngine {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

impl ContextEngine {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            tone: ConversationTone::default(),
            topics: default_topics(),
            history: VecDeque::new(),
        }
    }

    pub fn tone(&self) -> &ConversationTone {
        &self.tone
    }

    pub fn set_topics(&mut self, topics: Vec<TopicRule>) {
        self.topics = topics;
    }

    /// Process one message together with its per-message detection.
    pub fn process_text(
        &mut self,
        text: &str,
        detected: Emotion,
        detected_intensity: f32,
        now: Instant,
    ) -> ResolvedContext {
        let detected_intensity = clamp01(detected_intensity);
        let intent = Intent::classify(text);
        let lower = text.to_lowercase();

        let mut influences: Vec<Influence> = Vec::new();

        // (1) Raw detection: weight grows with detected intensity.
        influences.push(Influence {
            emotion: detected,
            weight: 0.4 + detected_intensity * 0.8,
            source: InfluenceSource::Detection,
        });

        // (2) Intent bias.
        if let Some((emotion, weight)) = intent.emotion_bias() {
            influences.push(Influence {
                emotion,
                weight,
                source: InfluenceSource::IntentBias,
            });
        }

        // (3) Topic bias; first matching topic rule wins.
        let matched_topic = self
            .topics
            .iter()
            .find(|t| t.keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|t| (t.name.clone(), t.emotion, t.weight));
        if let Some((_, emotion, weight)) = &matched_topic {
            influences.push(Influence {
                emotion: *emotion,
                weight: *weight,
                source: InfluenceSource::TopicBias,
            });
        }

        // (4) Inertia from the previous entry, decayed over the window and
        // scaled by that emotion's stickiness.
        if let Some(prev) = self.history.back() {
            let elapsed = now.saturating_duration_since(prev.at).as_secs_f32();
            let window = self.config.inertia_window_secs.max(1.0);
            if elapsed < window {
                let decay = (-3.0 * elapsed / window).exp();
                let weight = prev.intensity * inertia_constant(prev.emotion) * decay;
                if weight > 0.01 {
                    influences.push(Influence {
                        emotion: prev.emotion,
                        weight,
                        source: InfluenceSource::Inertia,
                    });
                }
            }
        }

        // (5) Tone baseline, weighted by its own stability.
        if self.tone.base_emotion != Emotion::Neutral {
            influences.push(Influence {
                emotion: self.tone.base_emotion,
                weight: self.tone.stability * 0.6,
                source: InfluenceSource::ToneBaseline,
            });
        }

        let (emotion, intensity) = Self::resolve_influences(&influences);

        self.update_tone(emotion, intensity, intent, matched_topic.map(|(n, _, _)| n));
        self.history.push_back(HistoryEntry {
            emotion,
            intensity,
            at: now,
        });
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }

        tracing::trace!(
            "context resolved: {} ({:.2}) intent={:?} atmosphere={:?}",
            emotion,
            intensity,
            intent,
            self.tone.atmosphere
        );

        ResolvedContext {
            emotion,
            intensity,
            intent,
            atmosphere: self.tone.atmosphere,
            engagement: self.tone.engagement,
            influences,
        }
    }

    /// Sum weights per emotion; highest total wins. Output intensity is the
    /// winner's share of the total weight.
    fn resolve_influences(influences: &[Influence]) -> (Emotion, f32) {
        if influences.is_empty() {
            return (Emotion::Neutral, 0.1);
        }
        let mut sums: Vec<(Emotion, f32)> = Vec::new();
        let mut total = 0.0;
        for inf in influences {
            total += inf.weight;
            match sums.iter_mut().find(|(e, _)| *e == inf.emotion) {
                Some((_, w)) => *w += inf.weight,
                None => sums.push((inf.emotion, inf.weight)),
            }
        }
        let (winner, weight) = sums
            .into_iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((Emotion::Neutral, 0.0));
        if total <= f32::EPSILON {
            return (Emotion::Neutral, 0.1);
        }
        (winner, clamp01(weight / total))
    }

    fn update_tone(
        &mut self,
        resolved: Emotion,
        intensity: f32,
        intent: Intent,
        topic: Option<String>,
    ) {
        let cfg = &self.config;
        self.tone.last_intent = intent;

        // Engagement: exponentially-smoothed nudge by intent.
        let nudged = clamp01(self.tone.engagement + intent.engagement_delta());
        self.tone.engagement = anima_core::lerp(
            self.tone.engagement,
            nudged,
            cfg.engagement_smoothing.max(0.05),
        );

        // Topic stack: push on change, grow stability on repetition.
        if let Some(topic) = topic {
            if self.tone.topic_stack.back() == Some(&topic) {
                self.tone.stability = clamp01(self.tone.stability + 0.05);
            } else {
                self.tone.stability *= 0.8; // topic change unsettles the tone
                self.tone.topic_stack.push_back(topic);
                while self.tone.topic_stack.len() > cfg.topic_stack_limit {
                    self.tone.topic_stack.pop_front();
                }
            }
        }

        self.tone.atmosphere = atmosphere_of(resolved);

        if intensity > cfg.tone_update_threshold {
            self.tone.last_significant_emotion = Some(resolved);
        }

        // Baseline update: only significant resolutions touch it at all, and
        // the base emotion only *switches* once stability has eroded (or on
        // an overwhelming reading). This is the anti-flicker mechanism.
        if resolved == self.tone.base_emotion {
            if intensity > cfg.tone_update_threshold {
                self.tone.stability = clamp01(self.tone.stability + 0.1);
            }
            return;
        }

        if intensity > cfg.tone_force_intensity
            || (intensity > cfg.tone_update_threshold
                && self.tone.stability < cfg.tone_switch_stability)
        {
            tracing::debug!(
                "tone baseline switch: {} -> {} (stability {:.2}, intensity {:.2})",
                self.tone.base_emotion,
                resolved,
                self.tone.stability,
                intensity
            );
            self.tone.base_emotion = resolved;
            self.tone.stability = 0.4;
        } else {
            // Mismatch erodes stability without switching.
            self.tone.stability *= cfg.stability_decay;
        }
    }

    /// Drop all conversation state back to defaults.
    pub fn reset(&mut self) {
        self.tone = ConversationTone::default();
        self.history.clear();
    }
}
