//! Viseme Signal - Vowel mouth shapes from formant analysis
//!
//! Lip-sync does not need phoneme recognition. The first two formants
//! (F1, F2) of a voiced sound separate the five vowels well enough to pick
//! a mouth shape. We locate both peaks in the spectrum, score every vowel
//! by its distance to a reference formant pair, and scale the result by
//! how loud the voice is. Quiet input becomes silence.

use mimic_core::{attack_release, remap_unit, unit};
use serde::{Deserialize, Serialize};

use crate::band_mean_hz;

/// Vowel mouth shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Viseme {
    /// "a" as in "father"
    Aa,
    /// "i" as in "see"
    Ih,
    /// "u" as in "boot"
    Ou,
    /// "e" as in "bed"
    Ee,
    /// "o" as in "boat"
    Oh,
}

impl Viseme {
    pub const ALL: [Viseme; 5] = [Viseme::Aa, Viseme::Ih, Viseme::Ou, Viseme::Ee, Viseme::Oh];

    /// Reference (F1, F2) in Hz
    pub fn formants(&self) -> (f32, f32) {
        match self {
            Viseme::Aa => (750.0, 1200.0),
            Viseme::Ih => (300.0, 2300.0),
            Viseme::Ou => (350.0, 1250.0),
            Viseme::Ee => (500.0, 1900.0),
            Viseme::Oh => (500.0, 850.0),
        }
    }

    /// How far the jaw opens for this vowel [0.0 - 1.0]
    pub fn openness(&self) -> f32 {
        match self {
            Viseme::Aa => 1.0,
            Viseme::Oh => 0.75,
            Viseme::Ee => 0.55,
            Viseme::Ou => 0.45,
            Viseme::Ih => 0.35,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Viseme::Aa => "aa",
            Viseme::Ih => "ih",
            Viseme::Ou => "ou",
            Viseme::Ee => "ee",
            Viseme::Oh => "oh",
        }
    }
}

/// Per-vowel weights, each in [0, 1], summing to at most 1
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VisemeWeights {
    pub aa: f32,
    pub ih: f32,
    pub ou: f32,
    pub ee: f32,
    pub oh: f32,
}

impl VisemeWeights {
    pub fn get(&self, viseme: Viseme) -> f32 {
        match viseme {
            Viseme::Aa => self.aa,
            Viseme::Ih => self.ih,
            Viseme::Ou => self.ou,
            Viseme::Ee => self.ee,
            Viseme::Oh => self.oh,
        }
    }

    pub fn set(&mut self, viseme: Viseme, weight: f32) {
        let w = unit(weight);
        match viseme {
            Viseme::Aa => self.aa = w,
            Viseme::Ih => self.ih = w,
            Viseme::Ou => self.ou = w,
            Viseme::Ee => self.ee = w,
            Viseme::Oh => self.oh = w,
        }
    }

    pub fn total(&self) -> f32 {
        Viseme::ALL.iter().map(|v| self.get(*v)).sum()
    }

    /// Strongest vowel, if any weight is non-zero
    pub fn dominant(&self) -> Option<(Viseme, f32)> {
        Viseme::ALL
            .iter()
            .map(|v| (*v, self.get(*v)))
            .filter(|(_, w)| *w > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Openness-weighted jaw opening
    pub fn mouth_open(&self) -> f32 {
        unit(Viseme::ALL.iter().map(|v| self.get(*v) * v.openness()).sum())
    }

    /// Clamp every weight and rescale so the total stays within 1
    pub fn sanitized(&self) -> VisemeWeights {
        let mut out = VisemeWeights::default();
        for v in Viseme::ALL {
            out.set(v, self.get(v));
        }
        let total = out.total();
        if total > 1.0 {
            for v in Viseme::ALL {
                out.set(v, out.get(v) / total);
            }
        }
        out
    }
}

/// Total vowel weight below which the signal counts as silence
pub const MIN_VOICED_WEIGHT: f32 = 0.05;

/// Shaped viseme signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisemeSignal {
    /// Is lip-sync analysis running?
    pub active: bool,
    pub weights: VisemeWeights,
    /// Silence weight [0.0 - 1.0]
    pub silence: f32,
}

impl Default for VisemeSignal {
    fn default() -> Self {
        Self::silent()
    }
}

impl VisemeSignal {
    pub fn silent() -> Self {
        Self {
            active: false,
            weights: VisemeWeights::default(),
            silence: 1.0,
        }
    }

    /// True when no vowel carries meaningful weight
    pub fn is_silent(&self) -> bool {
        self.weights.total() < MIN_VOICED_WEIGHT
    }

    pub fn mouth_open(&self) -> f32 {
        self.weights.mouth_open()
    }
}

/// Formant analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisemeConfig {
    /// Voice band used for loudness (Hz)
    pub voice_low_hz: f32,
    pub voice_high_hz: f32,
    /// Loudness below this is silence
    pub silence_threshold: f32,
    /// Loudness at which vowels reach full weight
    pub full_level: f32,
    /// Search window for F1 (Hz)
    pub f1_range: (f32, f32),
    /// Search window for F2 (Hz)
    pub f2_range: (f32, f32),
    /// Minimum F1→F2 separation (Hz)
    pub min_formant_gap: f32,
    /// Gaussian width for F1 / F2 distance (Hz)
    pub f1_sigma: f32,
    pub f2_sigma: f32,
    /// Smoothing factor when a weight rises
    pub attack: f32,
    /// Smoothing factor when a weight falls
    pub release: f32,
}

impl Default for VisemeConfig {
    fn default() -> Self {
        Self {
            voice_low_hz: 100.0,
            voice_high_hz: 4000.0,
            silence_threshold: 0.08,
            full_level: 0.35,
            f1_range: (200.0, 1000.0),
            f2_range: (700.0, 3000.0),
            min_formant_gap: 200.0,
            f1_sigma: 150.0,
            f2_sigma: 400.0,
            attack: 0.5,
            release: 0.25,
        }
    }
}

/// Derives viseme weights from microphone frequency bins
#[derive(Debug, Clone, Default)]
pub struct VisemeAnalyzer {
    config: VisemeConfig,
    signal: VisemeSignal,
}

impl VisemeAnalyzer {
    pub fn new(config: VisemeConfig) -> Self {
        Self {
            config,
            signal: VisemeSignal::silent(),
        }
    }

    /// Enable lip-sync
    pub fn start(&mut self) {
        self.signal = VisemeSignal {
            active: true,
            ..VisemeSignal::silent()
        };
    }

    /// Disable lip-sync and clear weights
    pub fn stop(&mut self) {
        self.signal = VisemeSignal::silent();
    }

    pub fn signal(&self) -> VisemeSignal {
        self.signal
    }

    /// Analyse one batch of byte frequency bins
    pub fn analyze(&mut self, bins: &[u8], bin_hz: f32) -> VisemeSignal {
        if !self.signal.active {
            return self.signal;
        }
        let target = self.target_weights(bins, bin_hz);
        let cfg = &self.config;

        let mut smoothed = VisemeWeights::default();
        for v in Viseme::ALL {
            let current = self.signal.weights.get(v);
            smoothed.set(v, attack_release(current, target.get(v), cfg.attack, cfg.release));
        }
        let weights = smoothed.sanitized();

        self.signal = VisemeSignal {
            active: true,
            weights,
            silence: unit(1.0 - weights.total()),
        };
        self.signal
    }

    /// Unsmoothed vowel weights for one spectrum
    pub fn target_weights(&self, bins: &[u8], bin_hz: f32) -> VisemeWeights {
        let cfg = &self.config;
        let loudness = band_mean_hz(bins, bin_hz, cfg.voice_low_hz, cfg.voice_high_hz);
        if loudness < cfg.silence_threshold {
            return VisemeWeights::default();
        }
        let voiced = remap_unit(loudness, cfg.silence_threshold, cfg.full_level);

        let Some(f1) = peak_frequency(bins, bin_hz, cfg.f1_range.0, cfg.f1_range.1) else {
            return VisemeWeights::default();
        };
        let f2_low = cfg.f2_range.0.max(f1 + cfg.min_formant_gap);
        let Some(f2) = peak_frequency(bins, bin_hz, f2_low, cfg.f2_range.1) else {
            return VisemeWeights::default();
        };

        let scores = Viseme::ALL.map(|v| {
            let (r1, r2) = v.formants();
            let d1 = (f1 - r1) / cfg.f1_sigma;
            let d2 = (f2 - r2) / cfg.f2_sigma;
            (-(d1 * d1 + d2 * d2)).exp()
        });
        let total: f32 = scores.iter().sum();
        if !total.is_finite() || total < f32::EPSILON {
            return VisemeWeights::default();
        }

        let mut weights = VisemeWeights::default();
        for (v, score) in Viseme::ALL.iter().zip(scores) {
            weights.set(*v, score / total * voiced);
        }
        weights
    }
}

/// Centre frequency of the strongest bin in [low_hz, high_hz].
/// None when the window is empty or holds only zeros.
pub fn peak_frequency(bins: &[u8], bin_hz: f32, low_hz: f32, high_hz: f32) -> Option<f32> {
    if !bin_hz.is_finite() || bin_hz <= 0.0 || high_hz <= low_hz {
        return None;
    }
    let start = (low_hz / bin_hz).ceil().max(0.0) as usize;
    let end = ((high_hz / bin_hz).floor() as usize).saturating_add(1).min(bins.len());
    if start >= end {
        return None;
    }
    // First maximum wins on ties
    let (offset, &level) = bins[start..end]
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|(_, b)| **b)?;
    if level == 0 {
        return None;
    }
    Some((start + offset) as f32 * bin_hz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BIN_HZ: f32 = 10.0;

    /// Spectrum with a voice-band floor and two formant peaks
    fn vowel_spectrum(f1: f32, f2: f32) -> Vec<u8> {
        let mut bins = vec![0u8; 512];
        for (i, b) in bins.iter_mut().enumerate() {
            let hz = i as f32 * BIN_HZ;
            if (100.0..4000.0).contains(&hz) {
                *b = 120;
            }
        }
        bins[(f1 / BIN_HZ) as usize] = 255;
        bins[(f2 / BIN_HZ) as usize] = 250;
        bins
    }

    fn instant() -> VisemeAnalyzer {
        let mut analyzer = VisemeAnalyzer::new(VisemeConfig {
            attack: 1.0,
            release: 1.0,
            ..VisemeConfig::default()
        });
        analyzer.start();
        analyzer
    }

    #[test]
    fn test_each_vowel_dominates_at_its_formants() {
        for v in Viseme::ALL {
            let (f1, f2) = v.formants();
            let mut analyzer = instant();
            let signal = analyzer.analyze(&vowel_spectrum(f1, f2), BIN_HZ);
            let (dominant, _) = signal.weights.dominant().unwrap();
            assert_eq!(dominant, v, "expected {} to dominate", v.name());
            assert!(!signal.is_silent());
        }
    }

    #[test]
    fn test_quiet_input_is_silent() {
        let mut analyzer = instant();
        let signal = analyzer.analyze(&[3u8; 512], BIN_HZ);
        assert!(signal.is_silent());
        assert_eq!(signal.silence, 1.0);
        assert_eq!(signal.mouth_open(), 0.0);
    }

    #[test]
    fn test_inactive_ignores_input() {
        let mut analyzer = VisemeAnalyzer::default();
        let signal = analyzer.analyze(&vowel_spectrum(750.0, 1200.0), BIN_HZ);
        assert!(!signal.active);
        assert!(signal.is_silent());
    }

    #[test]
    fn test_weights_bounded() {
        let mut analyzer = instant();
        let signal = analyzer.analyze(&[255u8; 512], BIN_HZ);
        assert!(signal.weights.total() <= 1.0 + 1e-5);
        assert!((0.0..=1.0).contains(&signal.mouth_open()));
        assert!((0.0..=1.0).contains(&signal.silence));
    }

    #[test]
    fn test_sanitized_rescales() {
        let w = VisemeWeights { aa: 0.8, ih: 0.8, ou: f32::NAN, ee: 0.0, oh: 0.4 }.sanitized();
        assert!((w.total() - 1.0).abs() < 1e-5);
        assert_eq!(w.ou, 0.0);
    }

    #[test]
    fn test_peak_frequency() {
        let mut bins = vec![0u8; 100];
        bins[30] = 200;
        assert_eq!(peak_frequency(&bins, BIN_HZ, 200.0, 500.0), Some(300.0));
        assert_eq!(peak_frequency(&bins, BIN_HZ, 400.0, 500.0), None);
    }

    #[test]
    fn test_tiny_bin_width() {
        let mut analyzer = instant();
        let signal = analyzer.analyze(&[200u8; 64], 1e-30);
        assert!(signal.is_silent());
        assert_eq!(peak_frequency(&[200u8; 64], 1e-30, 200.0, 1000.0), None);
    }

    proptest! {
        #[test]
        fn prop_weights_stay_bounded(
            bins in prop::collection::vec(any::<u8>(), 0..1024),
            bin_hz in prop::num::f32::ANY,
        ) {
            let mut analyzer = instant();
            for _ in 0..3 {
                let s = analyzer.analyze(&bins, bin_hz);
                prop_assert!(s.weights.total() <= 1.0 + 1e-5);
                prop_assert!((0.0..=1.0).contains(&s.silence));
                prop_assert!((0.0..=1.0).contains(&s.mouth_open()));
            }
        }
    }
}
