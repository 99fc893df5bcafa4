//! Audio Signal - Loudness bands from microphone frequency data
//!
//! The analyser node hands us byte frequency bins (0..=255 per bin). We
//! reduce them to three unit scalars: overall volume, bass and treble.
//! The user-facing sensitivity multiplies all three before clamping.

use mimic_core::{attack_release, unit};
use serde::{Deserialize, Serialize};

/// Audio band levels, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSignal {
    /// Is the microphone being listened to?
    pub listening: bool,
    pub volume: f32,
    pub bass: f32,
    pub treble: f32,
}

impl AudioSignal {
    /// Microphone off
    pub fn silent() -> Self {
        Self::default()
    }
}

/// Audio analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// User-adjustable multiplier
    pub sensitivity: f32,
    /// Extra gain on the all-bin mean (speech rarely fills the spectrum)
    pub volume_gain: f32,
    /// Bass band lower edge (Hz)
    pub bass_low_hz: f32,
    /// Bass band upper edge (Hz)
    pub bass_high_hz: f32,
    /// Treble band lower edge (Hz); upper edge is the last bin
    pub treble_low_hz: f32,
    /// Smoothing factor when a level rises
    pub attack: f32,
    /// Smoothing factor when a level falls
    pub release: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            volume_gain: 2.0,
            bass_low_hz: 20.0,
            bass_high_hz: 250.0,
            treble_low_hz: 4000.0,
            attack: 0.6,
            release: 0.15,
        }
    }
}

/// Sensitivity bounds accepted from the settings panel
pub const SENSITIVITY_RANGE: (f32, f32) = (0.1, 10.0);

/// Turns frequency bins into an AudioSignal
#[derive(Debug, Clone, Default)]
pub struct AudioAnalyzer {
    config: AudioConfig,
    signal: AudioSignal,
}

impl AudioAnalyzer {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            signal: AudioSignal::silent(),
        }
    }

    /// Begin listening (levels start from zero)
    pub fn start(&mut self) {
        self.signal = AudioSignal {
            listening: true,
            ..AudioSignal::silent()
        };
    }

    /// Stop listening; every level resets to zero
    pub fn stop(&mut self) {
        self.signal = AudioSignal::silent();
    }

    pub fn is_listening(&self) -> bool {
        self.signal.listening
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        let (lo, hi) = SENSITIVITY_RANGE;
        if sensitivity.is_finite() {
            self.config.sensitivity = sensitivity.clamp(lo, hi);
        }
    }

    pub fn sensitivity(&self) -> f32 {
        self.config.sensitivity
    }

    /// Last computed signal
    pub fn signal(&self) -> AudioSignal {
        self.signal
    }

    /// Analyse one batch of byte frequency bins.
    ///
    /// `bin_hz` is the width of one bin (sample rate / FFT size). Ignored
    /// while not listening.
    pub fn analyze(&mut self, bins: &[u8], bin_hz: f32) -> AudioSignal {
        if !self.signal.listening {
            return self.signal;
        }
        let cfg = &self.config;
        let gain = cfg.sensitivity;

        let volume = unit(band_mean(bins, 0, bins.len()) * cfg.volume_gain * gain);
        let bass = unit(band_mean_hz(bins, bin_hz, cfg.bass_low_hz, cfg.bass_high_hz) * gain);
        let treble = unit(band_mean_hz(bins, bin_hz, cfg.treble_low_hz, f32::INFINITY) * gain);

        let s = &mut self.signal;
        s.volume = attack_release(s.volume, volume, cfg.attack, cfg.release);
        s.bass = attack_release(s.bass, bass, cfg.attack, cfg.release);
        s.treble = attack_release(s.treble, treble, cfg.attack, cfg.release);
        *s
    }
}

/// Mean of bins[start..end] scaled to [0, 1]; empty ranges give 0
pub fn band_mean(bins: &[u8], start: usize, end: usize) -> f32 {
    let end = end.min(bins.len());
    if start >= end {
        return 0.0;
    }
    let sum: u32 = bins[start..end].iter().map(|&b| b as u32).sum();
    sum as f32 / ((end - start) as f32 * 255.0)
}

/// Mean of the bins covering [low_hz, high_hz)
pub fn band_mean_hz(bins: &[u8], bin_hz: f32, low_hz: f32, high_hz: f32) -> f32 {
    if !bin_hz.is_finite() || bin_hz <= 0.0 {
        return 0.0;
    }
    let start = ((low_hz / bin_hz).floor().max(0.0) as usize).min(bins.len());
    let end = if high_hz.is_finite() {
        ((high_hz / bin_hz).ceil().max(0.0) as usize)
            .min(bins.len())
            .max(start.saturating_add(1))
    } else {
        bins.len()
    };
    band_mean(bins, start, end)
}
