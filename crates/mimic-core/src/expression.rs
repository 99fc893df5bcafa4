//! Discrete expressions
//!
//! An expression is selected by a hotkey and persists until another key
//! changes it. It never replaces the continuous channels, it perturbs them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MimicError;

/// Named expression preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
    Relaxed,
}

impl Expression {
    /// All expressions in preset order
    pub fn all() -> &'static [Expression] {
        &[
            Expression::Neutral,
            Expression::Happy,
            Expression::Sad,
            Expression::Angry,
            Expression::Surprised,
            Expression::Relaxed,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Expression::Neutral => "neutral",
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Angry => "angry",
            Expression::Surprised => "surprised",
            Expression::Relaxed => "relaxed",
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, Expression::Neutral)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expression {
    type Err = MimicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neutral" | "none" => Ok(Expression::Neutral),
            "happy" | "joy" | "fun" => Ok(Expression::Happy),
            "sad" | "sorrow" => Ok(Expression::Sad),
            "angry" => Ok(Expression::Angry),
            "surprised" => Ok(Expression::Surprised),
            "relaxed" => Ok(Expression::Relaxed),
            other => Err(MimicError::UnknownExpression(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Joy".parse::<Expression>().unwrap(), Expression::Happy);
        assert_eq!(" sorrow ".parse::<Expression>().unwrap(), Expression::Sad);
        assert!("smirk".parse::<Expression>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for e in Expression::all() {
            assert_eq!(e.to_string().parse::<Expression>().unwrap(), *e);
        }
    }
}
