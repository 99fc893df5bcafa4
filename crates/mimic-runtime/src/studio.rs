//! Studio - Per-frame coordinator
//!
//! Owns the fusion engine and the active avatar, and hands out tracker
//! handles that write into the shared hub. Every rendered frame runs the
//! same short pipeline: read all sources once, fuse, drive the avatar.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mimic_fusion::{AnimationState, FusionEngine, FusionInputs};
use mimic_retarget::{
    create_avatar, Avatar, AvatarKind, AvatarProfile, HumanoidRetargeter, HumanoidRig,
    RetargetReport, RigHandle,
};
use mimic_signal::{HandPair, IdleState};

use crate::{
    AudioListener, FaceTracker, HandTracker, HotkeyTrigger, SignalHub, StudioConfig,
    StudioResult, Toggles,
};

#[derive(Clone, Debug, Default)]
pub struct StudioStats {
    pub frames: u64,
    /// Frames fused with a tracked face
    pub tracked_frames: u64,
    pub avatar_loads: u64,
    pub last_frame_duration: Duration,
}

/// The studio runtime
pub struct Studio {
    /// Configuration
    config: StudioConfig,

    /// Shared source slots
    hub: Arc<SignalHub>,

    /// Fusion engine
    engine: FusionEngine,

    /// Retargeter for external rigs
    retargeter: HumanoidRetargeter,

    /// Active avatar, if any
    avatar: Option<Box<dyn Avatar>>,

    /// Hands read on the last frame
    hands: HandPair,

    stats: StudioStats,
}

impl Studio {
    /// Validate the configuration and build a studio
    pub fn new(config: StudioConfig) -> StudioResult<Self> {
        config.validate()?;

        let hub = Arc::new(SignalHub::with_toggles(Toggles {
            lip_sync: config.lip_sync,
            audio_reactive: config.audio_reactive,
        }));
        let engine = FusionEngine::with_config(config.fusion.clone());
        let retargeter = HumanoidRetargeter::new(config.retarget.clone());

        Ok(Self {
            config,
            hub,
            engine,
            retargeter,
            avatar: None,
            hands: HandPair::default(),
            stats: StudioStats::default(),
        })
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn hub(&self) -> Arc<SignalHub> {
        Arc::clone(&self.hub)
    }

    pub fn face_tracker(&self) -> FaceTracker {
        FaceTracker::new(self.hub(), self.config.face.clone())
    }

    pub fn hand_tracker(&self) -> HandTracker {
        HandTracker::new(self.hub(), self.config.hands.clone())
    }

    pub fn audio_listener(&self) -> AudioListener {
        AudioListener::new(self.hub(), self.config.audio.clone(), self.config.viseme.clone())
    }

    pub fn hotkey_trigger(&self) -> HotkeyTrigger {
        HotkeyTrigger::new(self.hub(), self.config.hotkeys.clone())
    }

    /// Replace the active avatar
    pub fn set_avatar(&mut self, avatar: Box<dyn Avatar>) {
        tracing::debug!(kind = %avatar.kind(), "avatar set");
        self.avatar = Some(avatar);
        self.stats.avatar_loads += 1;
    }

    /// Build an avatar from a profile; the current one stays on failure
    pub fn load_avatar(
        &mut self,
        profile: &AvatarProfile,
        rig: Option<RigHandle>,
    ) -> StudioResult<()> {
        let avatar = create_avatar(profile, rig)?;
        self.set_avatar(avatar);
        Ok(())
    }

    /// Build an avatar of the given kind using the studio's arm and
    /// retarget settings
    pub fn load_avatar_kind(
        &mut self,
        kind: AvatarKind,
        rig: Option<RigHandle>,
    ) -> StudioResult<()> {
        let profile = AvatarProfile {
            arms: self.config.arms.clone(),
            retarget: self.config.retarget.clone(),
            ..AvatarProfile::new(kind)
        };
        self.load_avatar(&profile, rig)
    }

    pub fn clear_avatar(&mut self) {
        if self.avatar.take().is_some() {
            tracing::debug!("avatar cleared");
        }
    }

    pub fn avatar(&self) -> Option<&dyn Avatar> {
        self.avatar.as_deref()
    }

    /// Run one frame with an explicit delta
    pub fn frame(&mut self, dt: Duration) -> &AnimationState {
        let start = Instant::now();

        // Stage 1: Read every source once
        let snapshot = self.hub.snapshot();

        // Stage 2: Fuse
        let state = *self.engine.update(&snapshot.inputs, dt);

        self.finish_frame(&snapshot.inputs, snapshot.hands, &state, start);
        self.engine.state()
    }

    /// Run one frame timed by the OS clock
    pub fn tick(&mut self) -> &AnimationState {
        let start = Instant::now();
        let snapshot = self.hub.snapshot();
        let state = *self.engine.tick(&snapshot.inputs);
        self.finish_frame(&snapshot.inputs, snapshot.hands, &state, start);
        self.engine.state()
    }

    fn finish_frame(
        &mut self,
        inputs: &FusionInputs,
        hands: HandPair,
        state: &AnimationState,
        start: Instant,
    ) {
        // Stage 3: Publish frame time for hotkey stamping
        self.hub.publish_frame_time(state.time);

        // Stage 4: Drive the avatar
        if let Some(avatar) = self.avatar.as_mut() {
            avatar.apply_pose(state);
            avatar.apply_hand_pose(&hands);
        }
        self.hands = hands;

        self.stats.frames += 1;
        if inputs.face.tracked {
            self.stats.tracked_frames += 1;
        }
        self.stats.last_frame_duration = start.elapsed();
    }

    /// Last fused state
    pub fn animation_state(&self) -> AnimationState {
        *self.engine.state()
    }

    pub fn blend_factor(&self) -> f32 {
        self.engine.blend_factor()
    }

    /// Idle motion sampled on the last frame
    pub fn idle_state(&self) -> IdleState {
        self.engine.idle_state()
    }

    /// Hands as read on the last frame
    pub fn hands(&self) -> &HandPair {
        &self.hands
    }

    /// Write the last fused state onto an external rig
    pub fn retarget<R>(&self, rig: &mut R, ignore_mouth: bool) -> RetargetReport
    where
        R: HumanoidRig + ?Sized,
    {
        self.retargeter.retarget(self.engine.state(), rig, ignore_mouth)
    }

    pub fn stats(&self) -> &StudioStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_core::{Expression, MimicError};
    use mimic_fusion::{BlendPhase, MouthSource};
    use mimic_retarget::{ExpressionChannel, RecordingRig};
    use mimic_signal::FaceSignal;

    use crate::StudioError;

    const FRAME: Duration = Duration::from_millis(16);

    fn studio() -> Studio {
        Studio::new(StudioConfig::default()).unwrap()
    }

    #[test]
    fn test_studio_rejects_invalid_config() {
        let mut config = StudioConfig::default();
        config.fusion.transition_ms = 0;
        let err = Studio::new(config).err().unwrap();
        assert!(matches!(err, StudioError::Mimic(MimicError::InvalidConfig(_))));
    }

    #[test]
    fn test_studio_frame_idle() {
        let mut studio = studio();
        for _ in 0..10 {
            studio.frame(FRAME);
        }
        let state = studio.animation_state();
        assert_eq!(state.blend.phase, BlendPhase::Idle);
        assert_eq!(state.mouth_source, MouthSource::Idle);
        assert_eq!(studio.stats().frames, 10);
        assert_eq!(studio.stats().tracked_frames, 0);
        assert_eq!(studio.hub().frame_time(), state.time);
    }

    #[test]
    fn test_studio_blends_in_tracking() {
        let mut studio = studio();
        studio.hub().publish_face(FaceSignal { tracked: true, ..FaceSignal::default() });
        for _ in 0..40 {
            studio.frame(FRAME);
        }
        assert_eq!(studio.blend_factor(), 1.0);
        assert_eq!(studio.stats().tracked_frames, 40);

        studio.hub().publish_face(FaceSignal::not_tracked());
        studio.frame(FRAME);
        assert_eq!(studio.blend_factor(), 0.0);
    }

    #[test]
    fn test_studio_hotkey_flows_to_state() {
        let mut studio = studio();
        let trigger = studio.hotkey_trigger();
        studio.frame(FRAME);
        assert!(trigger.on_key("3"));
        for _ in 0..30 {
            studio.frame(FRAME);
        }
        let state = studio.animation_state();
        assert_eq!(state.expression, Expression::Sad);
        assert_eq!(state.expression_weight, 1.0);
    }

    #[test]
    fn test_studio_drives_avatar_and_rig() {
        let mut studio = studio();
        studio.load_avatar_kind(AvatarKind::Cat, None).unwrap();
        assert_eq!(studio.avatar().map(|a| a.kind()), Some(AvatarKind::Cat));

        studio.frame(FRAME);
        let mut rig = RecordingRig::new();
        let report = studio.retarget(&mut rig, false);
        assert!(report.head);
        assert!(rig.expression(ExpressionChannel::BlinkLeft).is_some());
    }

    #[test]
    fn test_failed_load_keeps_current_avatar() {
        let mut studio = studio();
        studio.load_avatar_kind(AvatarKind::Robot, None).unwrap();
        let err = studio.load_avatar_kind(AvatarKind::Vrm, None).err().unwrap();
        assert!(matches!(err, StudioError::Mimic(MimicError::MissingRig(_))));
        assert_eq!(studio.avatar().map(|a| a.kind()), Some(AvatarKind::Robot));
        assert_eq!(studio.stats().avatar_loads, 1);

        studio.clear_avatar();
        assert!(studio.avatar().is_none());
    }

    #[test]
    fn test_rigged_avatar_receives_frames() {
        let mut studio = studio();
        studio
            .load_avatar_kind(AvatarKind::Vrm, Some(Box::new(RecordingRig::new())))
            .unwrap();
        studio.frame(FRAME);
        assert!(studio.avatar().map(|a| a.mirror_hands()).unwrap_or(false));
    }
}
