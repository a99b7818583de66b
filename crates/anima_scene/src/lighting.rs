//! Lighting scene construction.
//!
//! A scene is fully recomputed from `(emotion, time-of-day, weather)` by
//! merging three independent partial-override tables — never incrementally
//! mutated. Light lists concatenate, exposure/contrast/saturation combine
//! multiplicatively, and colors override-wins. Only per-light animation
//! phase (see [`crate::animate`]) carries frame-to-frame state.

use anima_core::{clamp01, Emotion};
use serde::{Deserialize, Serialize};

/// Linear RGB in [0, 1] per channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: clamp01(r),
            g: clamp01(g),
            b: clamp01(b),
        }
    }

    /// CSS-style rgb() string for the filter/overlay layer.
    pub fn to_css(&self) -> String {
        format!(
            "rgb({}, {}, {})",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    Key,
    Fill,
    Rim,
    Ambient,
}

/// Procedural per-light animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LightAnimation {
    /// Sinusoidal intensity modulation.
    Pulse { speed: f32, depth: f32 },
    /// Random intensity jitter, re-rolled every tick.
    Flicker { speed: f32, depth: f32 },
    /// Horizontal position sway.
    Sway { speed: f32, radius: f32 },
    /// Circular position orbit.
    Rotate { speed: f32, radius: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub position: (f32, f32),
    pub animation: Option<LightAnimation>,
}

impl Light {
    pub fn new(name: &str, kind: LightKind, color: Color, intensity: f32) -> Self {
        Self {
            name: name.to_string(),
            kind,
            color,
            intensity: intensity.max(0.0),
            position: (0.0, 0.0),
            animation: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = (x, y);
        self
    }

    pub fn animated(mut self, animation: LightAnimation) -> Self {
        self.animation = Some(animation);
        self
    }
}

/// The fully merged scene handed to the renderer binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingScene {
    pub lights: Vec<Light>,
    pub tint: Color,
    pub exposure: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub shadow_opacity: f32,
    pub bloom: f32,
    pub volumetric: f32,
    /// CSS/shader filter composite, derived once per scene change.
    pub filter: String,
}

impl LightingScene {
    pub(crate) fn compose_filter(exposure: f32, contrast: f32, saturation: f32) -> String {
        format!(
            "brightness({:.2}) contrast({:.2}) saturate({:.2})",
            exposure, contrast, saturation
        )
    }
}

/// A partial contribution from one of the three override tables.
#[derive(Debug, Clone, Default)]
pub struct ScenePartial {
    pub lights: Vec<Light>,
    /// Multiplicative factors; 1.0 = no contribution.
    pub exposure: f32,
    pub contrast: f32,
    pub saturation: f32,
    /// Override-wins fields; `None` leaves the previous value.
    pub tint: Option<Color>,
    pub shadow_opacity: Option<f32>,
    pub bloom: Option<f32>,
    pub volumetric: Option<f32>,
}

impl ScenePartial {
    fn neutral() -> Self {
        Self {
            lights: Vec::new(),
            exposure: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            tint: None,
            shadow_opacity: None,
            bloom: None,
            volumetric: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Day,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour % 24 {
            5..=9 => TimeOfDay::Morning,
            10..=16 => TimeOfDay::Day,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Storm,
}

/// Base three-point rig present in every scene.
fn base_partial() -> ScenePartial {
    ScenePartial {
        lights: vec![
            Light::new("key", LightKind::Key, Color::WHITE, 1.0).at(-0.3, 0.4),
            Light::new("fill", LightKind::Fill, Color::new(0.9, 0.9, 1.0), 0.5).at(0.4, 0.1),
            Light::new("rim", LightKind::Rim, Color::new(1.0, 0.95, 0.9), 0.35).at(0.0, -0.5),
        ],
        ..ScenePartial::neutral()
    }
}

fn emotion_partial(emotion: Emotion) -> ScenePartial {
    use Emotion::*;
    let mut p = ScenePartial::neutral();
    match emotion {
        Happy | Amused | Playful | Grateful | Hopeful | Proud => {
            p.exposure = 1.1;
            p.saturation = 1.15;
            p.tint = Some(Color::new(1.0, 0.96, 0.88));
            p.bloom = Some(0.3);
        }
        Excited | Surprised => {
            p.exposure = 1.15;
            p.contrast = 1.1;
            p.saturation = 1.2;
            p.lights.push(
                Light::new("sparkle", LightKind::Rim, Color::new(1.0, 0.9, 0.7), 0.5)
                    .at(0.3, 0.6)
                    .animated(LightAnimation::Pulse {
                        speed: 2.0,
                        depth: 0.4,
                    }),
            );
        }
        Loving | Relieved | Calm => {
            p.exposure = 1.05;
            p.saturation = 1.05;
            p.tint = Some(Color::new(1.0, 0.9, 0.92));
            p.bloom = Some(0.4);
        }
        Sad | Lonely | Disappointed => {
            p.exposure = 0.85;
            p.saturation = 0.75;
            p.tint = Some(Color::new(0.8, 0.85, 1.0));
            p.shadow_opacity = Some(0.5);
        }
        Angry | Contempt | Disgust => {
            p.exposure = 0.95;
            p.contrast = 1.2;
            p.saturation = 0.9;
            p.tint = Some(Color::new(1.0, 0.85, 0.8));
        }
        Fear | Anxious => {
            p.exposure = 0.8;
            p.contrast = 1.15;
            p.saturation = 0.7;
            p.shadow_opacity = Some(0.6);
            p.lights.push(
                Light::new("unease", LightKind::Ambient, Color::new(0.7, 0.75, 0.9), 0.3)
                    .animated(LightAnimation::Flicker {
                        speed: 6.0,
                        depth: 0.3,
                    }),
            );
        }
        Embarrassed => {
            p.tint = Some(Color::new(1.0, 0.9, 0.9));
            p.exposure = 1.02;
        }
        Thinking | Confused | Curious | Determined => {
            p.contrast = 1.05;
            p.saturation = 0.95;
        }
        Bored => {
            p.exposure = 0.95;
            p.saturation = 0.85;
        }
        Neutral => {}
    }
    p
}

fn time_partial(time: TimeOfDay) -> ScenePartial {
    let mut p = ScenePartial::neutral();
    match time {
        TimeOfDay::Morning => {
            p.exposure = 1.08;
            p.tint = Some(Color::new(1.0, 0.95, 0.85));
            p.lights.push(
                Light::new("morning_sun", LightKind::Key, Color::new(1.0, 0.92, 0.8), 0.6)
                    .at(-0.7, 0.7),
            );
        }
        TimeOfDay::Day => {
            p.exposure = 1.0;
        }
        TimeOfDay::Evening => {
            p.exposure = 0.92;
            p.saturation = 1.08;
            p.tint = Some(Color::new(1.0, 0.8, 0.6));
            p.lights.push(
                Light::new("sunset", LightKind::Rim, Color::new(1.0, 0.6, 0.35), 0.5).at(0.8, 0.3),
            );
        }
        TimeOfDay::Night => {
            p.exposure = 0.75;
            p.saturation = 0.85;
            p.contrast = 1.05;
            p.tint = Some(Color::new(0.7, 0.78, 1.0));
            p.lights.push(
                Light::new("moonlight", LightKind::Fill, Color::new(0.75, 0.8, 1.0), 0.4)
                    .at(0.5, 0.8)
                    .animated(LightAnimation::Pulse {
                        speed: 0.3,
                        depth: 0.1,
                    }),
            );
        }
    }
    p
}

fn weather_partial(weather: Weather) -> ScenePartial {
    let mut p = ScenePartial::neutral();
    match weather {
        Weather::Clear => {}
        Weather::Cloudy => {
            p.exposure = 0.92;
            p.saturation = 0.9;
            p.shadow_opacity = Some(0.25);
        }
        Weather::Rain => {
            p.exposure = 0.85;
            p.saturation = 0.8;
            p.contrast = 0.95;
            p.volumetric = Some(0.4);
            p.tint = Some(Color::new(0.85, 0.9, 1.0));
        }
        Weather::Snow => {
            p.exposure = 1.05;
            p.saturation = 0.85;
            p.volumetric = Some(0.5);
            p.tint = Some(Color::new(0.95, 0.97, 1.0));
        }
        Weather::Storm => {
            p.exposure = 0.7;
            p.contrast = 1.25;
            p.saturation = 0.75;
            p.shadow_opacity = Some(0.7);
            p.lights.push(
                Light::new("lightning", LightKind::Ambient, Color::new(0.9, 0.92, 1.0), 0.2)
                    .animated(LightAnimation::Flicker {
                        speed: 9.0,
                        depth: 0.9,
                    }),
            );
        }
    }
    p
}

/// Build the full scene for the current emotional and environmental state.
pub fn build_scene(emotion: Emotion, time: TimeOfDay, weather: Weather) -> LightingScene {
    let partials = [
        base_partial(),
        emotion_partial(emotion),
        time_partial(time),
        weather_partial(weather),
    ];

    let mut lights = Vec::new();
    let mut exposure = 1.0;
    let mut contrast = 1.0;
    let mut saturation = 1.0;
    let mut tint = Color::WHITE;
    let mut shadow_opacity = 0.3;
    let mut bloom = 0.2;
    let mut volumetric = 0.0;

    for partial in partials {
        lights.extend(partial.lights);
        exposure *= partial.exposure;
        contrast *= partial.contrast;
        saturation *= partial.saturation;
        if let Some(c) = partial.tint {
            tint = c;
        }
        if let Some(s) = partial.shadow_opacity {
            shadow_opacity = s;
        }
        if let Some(b) = partial.bloom {
            bloom = b;
        }
        if let Some(v) = partial.volumetric {
            volumetric = v;
        }
    }

    let exposure = exposure.clamp(0.2, 2.0);
    let contrast = contrast.clamp(0.5, 2.0);
    let saturation = saturation.clamp(0.0, 2.0);

    LightingScene {
        filter: LightingScene::compose_filter(exposure, contrast, saturation),
        lights,
        tint,
        exposure,
        contrast,
        saturation,
        shadow_opacity: clamp01(shadow_opacity),
        bloom: clamp01(bloom),
        volumetric: clamp01(volumetric),
    }
}
