//! Voice-feature → emotion mapping.
//!
//! Consumes already-extracted spectral/pitch features (audio capture is out
//! of scope) and projects them onto the valence/arousal circumplex, with a
//! few special-case pattern overrides that a plain projection misses.
//!
//! The mapper must be calibrated with the speaker's pitch baseline first;
//! analyzing before calibration is a contract violation and fails loudly —
//! the one loud error in this workspace.

use anima_core::{clamp01, Affect, AnimaError, Emotion};
use serde::{Deserialize, Serialize};

/// Fixed feature record supplied by the audio front-end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceFeatures {
    pub pitch_hz: f32,
    pub pitch_variance: f32,
    /// RMS volume in [0, 1].
    pub volume: f32,
    pub volume_variance: f32,
    /// Syllables per second.
    pub speech_rate: f32,
    pub spectral_flux: f32,
    /// Fraction of the window that was silent, in [0, 1].
    pub silence_ratio: f32,
    pub high_freq_ratio: f32,
    pub low_freq_ratio: f32,
}

impl Default for VoiceFeatures {
    fn default() -> Self {
        Self {
            pitch_hz: 180.0,
            pitch_variance: 10.0,
            volume: 0.5,
            volume_variance: 0.05,
            speech_rate: 4.0,
            spectral_flux: 0.3,
            silence_ratio: 0.2,
            high_freq_ratio: 0.3,
            low_freq_ratio: 0.4,
        }
    }
}

/// Emotion inferred from one voice window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSignal {
    pub emotion: Emotion,
    pub intensity: f32,
    pub affect: Affect,
}

/// Valence/arousal projector with speaker calibration.
#[derive(Debug, Clone)]
pub struct VoiceEmotionMapper {
    baseline_pitch: Option<f32>,
    /// Typical speech rate for this speaker; refined by calibration.
    baseline_rate: f32,
}

impl Default for VoiceEmotionMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceEmotionMapper {
    pub fn new() -> Self {
        Self {
            baseline_pitch: None,
            baseline_rate: 4.0,
        }
    }

    /// Record the speaker's neutral baseline. Must run before `analyze`.
    pub fn calibrate(&mut self, features: &VoiceFeatures) {
        self.baseline_pitch = Some(features.pitch_hz.max(1.0));
        if features.speech_rate > 0.0 {
            self.baseline_rate = features.speech_rate;
        }
        tracing::debug!(
            "voice mapper calibrated: pitch={:.1}Hz rate={:.1}",
            features.pitch_hz,
            self.baseline_rate
        );
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline_pitch.is_some()
    }

    /// Map one feature window to an emotion.
    ///
    /// Errors only when uncalibrated (programmer contract); every runtime
    /// oddity in the features themselves degrades through clamping.
    pub fn analyze(&self, features: &VoiceFeatures) -> anyhow::Result<VoiceSignal> {
        let baseline = self
            .baseline_pitch
            .ok_or(AnimaError::NotInitialized("voice emotion mapper"))?;

        // Relative pitch offset: +1 ≈ an octave above baseline.
        let pitch_offset = ((features.pitch_hz - baseline) / baseline).clamp(-1.0, 1.0);
        let rate_offset = ((features.speech_rate - self.baseline_rate) / self.baseline_rate)
            .clamp(-1.0, 1.0);

        // Arousal: loud, fast, pitch-varied, spectrally busy speech.
        let arousal = clamp01(
            0.2 + features.volume * 0.35
                + (features.pitch_variance / 60.0).min(1.0) * 0.25
                + rate_offset.max(0.0) * 0.2
                + features.spectral_flux.clamp(0.0, 1.0) * 0.15
                - features.silence_ratio * 0.3,
        );

        // Valence: raised pitch and bright spectrum read positive; slow,
        // quiet, silence-heavy speech reads negative.
        let valence = (pitch_offset * 0.45 + features.high_freq_ratio.clamp(0.0, 1.0) * 0.3
            - features.silence_ratio * 0.4
            - (-rate_offset).max(0.0) * 0.3)
            .clamp(-1.0, 1.0);

        let affect = Affect::new(valence, arousal);
        let mut emotion = Emotion::nearest(affect);
        let mut intensity = clamp01(affect.intensity() + features.volume_variance.clamp(0.0, 0.3));

        // === Special-case overrides ===
        // High pitch variance on a raised pitch is surprise/excitement even
        // when the projection lands elsewhere.
        if features.pitch_variance > 50.0 && pitch_offset > 0.15 {
            emotion = if valence > 0.3 {
                Emotion::Excited
            } else {
                Emotion::Surprised
            };
            intensity = intensity.max(0.6);
        }
        // Quiet, slow, silence-heavy speech floors to sadness.
        else if features.volume < 0.25 && rate_offset < -0.3 && features.silence_ratio > 0.4 {
            emotion = Emotion::Sad;
            intensity = intensity.max(0.4);
        }

        Ok(VoiceSignal {
            emotion,
            intensity,
            affect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibrated() -> VoiceEmotionMapper {
        let mut m = VoiceEmotionMapper::new();
        m.calibrate(&VoiceFeatures::default());
        m
    }

    #[test]
    fn test_uncalibrated_analyze_fails() {
        let m = VoiceEmotionMapper::new();
        assert!(m.analyze(&VoiceFeatures::default()).is_err());
        assert!(!m.is_calibrated());
    }

    #[test]
    fn test_neutral_baseline_maps_near_neutral() {
        let m = calibrated();
        let signal = m.analyze(&VoiceFeatures::default()).unwrap();
        assert!(signal.affect.valence.abs() < 0.5);
        assert!(signal.intensity <= 1.0);
    }

    #[test]
    fn test_surprise_override() {
        let m = calibrated();
        let features = VoiceFeatures {
            pitch_hz: 260.0, // well above 180 baseline
            pitch_variance: 80.0,
            ..VoiceFeatures::default()
        };
        let signal = m.analyze(&features).unwrap();
        assert!(
            matches!(signal.emotion, Emotion::Surprised | Emotion::Excited),
            "got {:?}",
            signal.emotion
        );
        assert!(signal.intensity >= 0.6);
    }

    #[test]
    fn test_quiet_slow_speech_floors_to_sad() {
        let m = calibrated();
        let features = VoiceFeatures {
            volume: 0.1,
            speech_rate: 1.5,
            silence_ratio: 0.6,
            pitch_variance: 5.0,
            ..VoiceFeatures::default()
        };
        let signal = m.analyze(&features).unwrap();
        assert_eq!(signal.emotion, Emotion::Sad);
        assert!(signal.intensity >= 0.4);
    }

    #[test]
    fn test_loud_fast_bright_reads_positive_high_arousal() {
        let m = calibrated();
        let features = VoiceFeatures {
            pitch_hz: 230.0,
            volume: 0.9,
            speech_rate: 7.0,
            spectral_flux: 0.8,
            high_freq_ratio: 0.7,
            silence_ratio: 0.05,
            ..VoiceFeatures::default()
        };
        let signal = m.analyze(&features).unwrap();
        assert!(signal.affect.arousal > 0.6, "arousal {}", signal.affect.arousal);
        assert!(signal.affect.valence > 0.0, "valence {}", signal.affect.valence);
    }

    #[test]
    fn test_pathological_features_stay_bounded() {
        let m = calibrated();
        let features = VoiceFeatures {
            pitch_hz: 10_000.0,
            pitch_variance: 1e6,
            volume: 50.0,
            volume_variance: -3.0,
            speech_rate: 1000.0,
            spectral_flux: f32::MAX,
            silence_ratio: -1.0,
            high_freq_ratio: 99.0,
            low_freq_ratio: -99.0,
        };
        let signal = m.analyze(&features).unwrap();
        assert!(signal.intensity >= 0.0 && signal.intensity <= 1.0);
        assert!(signal.affect.valence.is_finite());
        assert!(signal.affect.arousal >= 0.0 && signal.affect.arousal <= 1.0);
    }
}
