//! Hotkey Expressions - Discrete keyboard-driven expression selection
//!
//! A key press either selects an expression or clears back to neutral.
//! The selection persists until another key changes it; there is no
//! timeout.

use std::collections::BTreeMap;

use mimic_core::{Expression, FrameTime, MimicError, MimicResult};
use serde::{Deserialize, Serialize};

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    Set(Expression),
    Clear,
}

/// Key → expression bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyMap {
    pub bindings: BTreeMap<String, Expression>,
    /// Keys that return to neutral
    pub clear_keys: Vec<String>,
}

impl Default for HotkeyMap {
    fn default() -> Self {
        let bindings = Expression::all()
            .iter()
            .enumerate()
            .map(|(i, e)| ((i + 1).to_string(), *e))
            .collect();
        Self {
            bindings,
            clear_keys: vec!["0".to_string(), "Escape".to_string()],
        }
    }
}

impl HotkeyMap {
    /// Map with no bindings at all
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
            clear_keys: Vec::new(),
        }
    }

    /// Build from (key, expression name) pairs, rejecting unknown names
    pub fn from_names<'a, I>(pairs: I) -> MimicResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = Self::empty();
        for (key, name) in pairs {
            let key = key.trim();
            if key.is_empty() {
                return Err(MimicError::InvalidConfig(format!(
                    "empty hotkey for expression '{}'",
                    name
                )));
            }
            map.bindings.insert(key.to_string(), name.parse()?);
        }
        map.clear_keys = vec!["0".to_string(), "Escape".to_string()];
        Ok(map)
    }

    pub fn bind(&mut self, key: impl Into<String>, expression: Expression) {
        self.bindings.insert(key.into(), expression);
    }

    /// Resolve a key press; unbound keys give None
    pub fn resolve(&self, key: &str) -> Option<HotkeyEvent> {
        if self.clear_keys.iter().any(|k| k == key) {
            return Some(HotkeyEvent::Clear);
        }
        self.bindings.get(key).copied().map(HotkeyEvent::Set)
    }

    /// Key bound to an expression, if any
    pub fn key_for(&self, expression: Expression) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, e)| **e == expression)
            .map(|(k, _)| k.as_str())
    }
}

/// Current hotkey-selected expression
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExpressionOverride {
    pub expression: Expression,
    /// When the expression last changed
    pub changed_at: FrameTime,
}

impl ExpressionOverride {
    pub fn new(expression: Expression, changed_at: FrameTime) -> Self {
        Self { expression, changed_at }
    }

    /// Apply an event; returns true if the expression changed
    pub fn apply(&mut self, event: HotkeyEvent, now: FrameTime) -> bool {
        let next = match event {
            HotkeyEvent::Set(e) => e,
            HotkeyEvent::Clear => Expression::Neutral,
        };
        if next == self.expression {
            return false;
        }
        self.expression = next;
        self.changed_at = now;
        true
    }
}
