//! Studio configuration
//!
//! One JSON document carries every tunable. Missing fields fall back to
//! defaults; out-of-range values are rejected by `validate`.

use mimic_core::{MimicError, MimicResult};
use mimic_fusion::FusionConfig;
use mimic_retarget::{ArmConfig, RetargetConfig};
use mimic_signal::{
    AudioConfig, FaceShaperConfig, HandShaperConfig, HotkeyMap, VisemeConfig, SENSITIVITY_RANGE,
};
use serde::{Deserialize, Serialize};

use crate::{LoggingConfig, StudioResult};

/// Aggregated studio configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub fusion: FusionConfig,
    pub face: FaceShaperConfig,
    pub hands: HandShaperConfig,
    pub audio: AudioConfig,
    pub viseme: VisemeConfig,
    pub hotkeys: HotkeyMap,
    pub retarget: RetargetConfig,
    pub arms: ArmConfig,
    pub logging: LoggingConfig,
    /// Lip-sync enabled at startup
    pub lip_sync: bool,
    /// Audio-reactive breathing enabled at startup
    pub audio_reactive: bool,
}

impl StudioConfig {
    /// Parse and validate
    pub fn from_json(json: &str) -> StudioResult<Self> {
        let config: StudioConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> StudioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the frame loop cannot work with
    pub fn validate(&self) -> MimicResult<()> {
        let fusion = &self.fusion;
        let idle = &fusion.idle;

        check(fusion.transition_ms > 0, "fusion.transition_ms must be > 0")?;
        check(
            fusion.head_smoothing > 0.0 && fusion.head_smoothing <= 1.0,
            "fusion.head_smoothing must be in (0, 1]",
        )?;
        check(
            fusion.breath_boost_gain.is_finite() && fusion.breath_boost_gain >= 0.0,
            "fusion.breath_boost_gain must be >= 0",
        )?;
        check(
            fusion.head_limits.is_valid(),
            "fusion.head_limits must be finite and >= 0",
        )?;
        check(
            idle.blink_interval_min > 0.0 && idle.blink_interval_min <= idle.blink_interval_max,
            "idle blink interval must satisfy 0 < min <= max",
        )?;
        check(idle.breath_period > 0.0, "idle.breath_period must be > 0")?;

        let (lo, hi) = SENSITIVITY_RANGE;
        check(
            (lo..=hi).contains(&self.audio.sensitivity),
            "audio.sensitivity out of range",
        )?;
        check(
            self.face.jaw_floor < self.face.jaw_ceiling,
            "face.jaw_floor must be below face.jaw_ceiling",
        )?;
        check(
            self.face.blink_floor < self.face.blink_ceiling,
            "face.blink_floor must be below face.blink_ceiling",
        )?;
        check(
            (0.0..=1.0).contains(&self.hands.min_score),
            "hands.min_score must be in [0, 1]",
        )?;
        Ok(())
    }
}

fn check(ok: bool, message: &str) -> MimicResult<()> {
    if ok {
        Ok(())
    } else {
        tracing::warn!("rejected config: {}", message);
        Err(MimicError::InvalidConfig(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StudioError;

    #[test]
    fn test_default_is_valid() {
        assert!(StudioConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"lip_sync": true, "fusion": {"transition_ms": 250}}"#;
        let config = StudioConfig::from_json(json).unwrap();
        assert!(config.lip_sync);
        assert_eq!(config.fusion.transition_ms, 250);
        assert_eq!(config.fusion.head_smoothing, FusionConfig::default().head_smoothing);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = StudioConfig::default();
        let parsed = StudioConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed.hotkeys, config.hotkeys);
        assert_eq!(parsed.logging, config.logging);
    }

    #[test]
    fn test_rejects_zero_transition() {
        let err = StudioConfig::from_json(r#"{"fusion": {"transition_ms": 0}}"#).unwrap_err();
        assert!(matches!(err, StudioError::Mimic(MimicError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_smoothing() {
        let mut config = StudioConfig::default();
        config.fusion.head_smoothing = 1.5;
        assert!(config.validate().is_err());
        config.fusion.head_smoothing = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_head_limits() {
        let json = r#"{"fusion": {"head_limits": {"pitch": -0.5, "yaw": 1.3, "roll": 0.7}}}"#;
        let err = StudioConfig::from_json(json).unwrap_err();
        assert!(matches!(err, StudioError::Mimic(MimicError::InvalidConfig(_))));

        let mut config = StudioConfig::default();
        config.fusion.head_limits.yaw = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = StudioConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, StudioError::Json(_)));
    }

    #[test]
    fn test_unknown_hotkey_expression() {
        let json = r#"{"hotkeys": {"bindings": {"1": "smug"}}}"#;
        let err = StudioConfig::from_json(json).unwrap_err();
        assert!(matches!(err, StudioError::Json(_)));
    }
}
