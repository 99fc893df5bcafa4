//! Blendshape channels - the 52 ARKit-style face coefficients
//!
//! Detectors report coefficients by camelCase name. We keep them in a
//! fixed-size array indexed by channel so the per-frame path never hashes
//! strings.

use mimic_core::unit;

macro_rules! blendshape_channels {
    ($($variant:ident => $name:literal,)+) => {
        /// Named ARKit blendshape channel, in canonical detector order
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum BlendshapeChannel {
            $($variant,)+
        }

        impl BlendshapeChannel {
            /// All channels in index order
            pub const ALL: [BlendshapeChannel; BLENDSHAPE_COUNT] = [
                $(BlendshapeChannel::$variant,)+
            ];

            /// camelCase name as reported by detectors
            pub fn name(&self) -> &'static str {
                match self {
                    $(BlendshapeChannel::$variant => $name,)+
                }
            }

            /// Parse a detector name. Unknown names (including the
            /// detector's `_neutral` entry) return None.
            pub fn from_name(name: &str) -> Option<BlendshapeChannel> {
                match name {
                    $($name => Some(BlendshapeChannel::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

/// Number of blendshape channels
pub const BLENDSHAPE_COUNT: usize = 52;

blendshape_channels! {
    BrowDownLeft => "browDownLeft",
    BrowDownRight => "browDownRight",
    BrowInnerUp => "browInnerUp",
    BrowOuterUpLeft => "browOuterUpLeft",
    BrowOuterUpRight => "browOuterUpRight",
    CheekPuff => "cheekPuff",
    CheekSquintLeft => "cheekSquintLeft",
    CheekSquintRight => "cheekSquintRight",
    EyeBlinkLeft => "eyeBlinkLeft",
    EyeBlinkRight => "eyeBlinkRight",
    EyeLookDownLeft => "eyeLookDownLeft",
    EyeLookDownRight => "eyeLookDownRight",
    EyeLookInLeft => "eyeLookInLeft",
    EyeLookInRight => "eyeLookInRight",
    EyeLookOutLeft => "eyeLookOutLeft",
    EyeLookOutRight => "eyeLookOutRight",
    EyeLookUpLeft => "eyeLookUpLeft",
    EyeLookUpRight => "eyeLookUpRight",
    EyeSquintLeft => "eyeSquintLeft",
    EyeSquintRight => "eyeSquintRight",
    EyeWideLeft => "eyeWideLeft",
    EyeWideRight => "eyeWideRight",
    JawForward => "jawForward",
    JawLeft => "jawLeft",
    JawOpen => "jawOpen",
    JawRight => "jawRight",
    MouthClose => "mouthClose",
    MouthDimpleLeft => "mouthDimpleLeft",
    MouthDimpleRight => "mouthDimpleRight",
    MouthFrownLeft => "mouthFrownLeft",
    MouthFrownRight => "mouthFrownRight",
    MouthFunnel => "mouthFunnel",
    MouthLeft => "mouthLeft",
    MouthLowerDownLeft => "mouthLowerDownLeft",
    MouthLowerDownRight => "mouthLowerDownRight",
    MouthPressLeft => "mouthPressLeft",
    MouthPressRight => "mouthPressRight",
    MouthPucker => "mouthPucker",
    MouthRight => "mouthRight",
    MouthRollLower => "mouthRollLower",
    MouthRollUpper => "mouthRollUpper",
    MouthShrugLower => "mouthShrugLower",
    MouthShrugUpper => "mouthShrugUpper",
    MouthSmileLeft => "mouthSmileLeft",
    MouthSmileRight => "mouthSmileRight",
    MouthStretchLeft => "mouthStretchLeft",
    MouthStretchRight => "mouthStretchRight",
    MouthUpperUpLeft => "mouthUpperUpLeft",
    MouthUpperUpRight => "mouthUpperUpRight",
    NoseSneerLeft => "noseSneerLeft",
    NoseSneerRight => "noseSneerRight",
    TongueOut => "tongueOut",
}

impl BlendshapeChannel {
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Full blendshape coefficient vector, every entry in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blendshapes {
    weights: [f32; BLENDSHAPE_COUNT],
}

impl Default for Blendshapes {
    fn default() -> Self {
        Self::neutral()
    }
}

impl Blendshapes {
    /// All channels at rest
    pub fn neutral() -> Self {
        Self { weights: [0.0; BLENDSHAPE_COUNT] }
    }

    /// Build from detector (name, score) pairs.
    /// Unknown names are ignored; scores are clamped.
    pub fn from_named<'a, I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut shapes = Self::neutral();
        for (name, score) in scores {
            if let Some(channel) = BlendshapeChannel::from_name(name) {
                shapes.set(channel, score);
            }
        }
        shapes
    }

    #[inline]
    pub fn get(&self, channel: BlendshapeChannel) -> f32 {
        self.weights[channel.index()]
    }

    #[inline]
    pub fn set(&mut self, channel: BlendshapeChannel, weight: f32) {
        self.weights[channel.index()] = unit(weight);
    }

    /// Raw coefficient slice in channel order
    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }

    /// Mean of two channels (left/right pairs)
    pub fn pair(&self, a: BlendshapeChannel, b: BlendshapeChannel) -> f32 {
        (self.get(a) + self.get(b)) * 0.5
    }

    /// Iterate (channel, weight) for non-zero channels
    pub fn active(&self) -> impl Iterator<Item = (BlendshapeChannel, f32)> + '_ {
        BlendshapeChannel::ALL
            .iter()
            .map(move |c| (*c, self.get(*c)))
            .filter(|(_, w)| *w > 0.0)
    }
}
