//! Blend State Machine - Idle ↔ tracking hand-over
//!
//! ```text
//!   idle ──(tracking starts)──► transitioning ──(factor = 1)──► tracking
//!    ▲                               │                            │
//!    └───────(tracking lost: snap to 0, no ramp)─────────────────┘
//! ```
//!
//! The factor ramps linearly over the transition window while tracking
//! stays active. Losing tracking snaps straight back to idle so control
//! is visibly handed back without a lingering blend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Blend phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendPhase {
    #[default]
    Idle,
    Transitioning,
    Tracking,
}

/// Phase plus factor (0 = fully idle, 1 = fully tracked)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlendState {
    pub phase: BlendPhase,
    pub factor: f32,
}

impl BlendState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == BlendPhase::Idle
    }
}

/// Drives BlendState from the per-frame tracking flag
#[derive(Debug, Clone)]
pub struct BlendController {
    window: Duration,
    /// Time spent ramping since tracking started
    elapsed: Duration,
    state: BlendState,
}

impl BlendController {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            elapsed: Duration::ZERO,
            state: BlendState::idle(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn state(&self) -> BlendState {
        self.state
    }

    pub fn factor(&self) -> f32 {
        self.state.factor
    }

    /// Advance one frame
    pub fn update(&mut self, tracking: bool, dt: Duration) -> BlendState {
        if !tracking {
            if !self.state.is_idle() {
                tracing::debug!(factor = self.state.factor, "tracking lost, snapping to idle");
            }
            self.elapsed = Duration::ZERO;
            self.state = BlendState::idle();
            return self.state;
        }

        match self.state.phase {
            BlendPhase::Idle => {
                tracing::debug!("tracking acquired, blending in");
                self.elapsed = dt;
            }
            BlendPhase::Transitioning => self.elapsed += dt,
            BlendPhase::Tracking => return self.state,
        }

        if self.elapsed >= self.window {
            tracing::debug!("blend complete");
            self.state = BlendState {
                phase: BlendPhase::Tracking,
                factor: 1.0,
            };
        } else {
            let factor = self.elapsed.as_secs_f32() / self.window.as_secs_f32();
            self.state = BlendState {
                phase: BlendPhase::Transitioning,
                factor: factor.clamp(0.0, 1.0).max(self.state.factor),
            };
        }
        self.state
    }

    /// Return to idle without logging a loss
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.state = BlendState::idle();
    }
}
