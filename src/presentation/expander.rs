//! Focus-time widening of text inputs.
//!
//! Inputs are registered explicitly when the form is set up. While an input
//! is expanded it shows a character counter; Enter submits the form and
//! Escape restores the value the input had when it gained focus.

use std::collections::{HashMap, HashSet};

use crate::domain::fields::CanaryField;

pub const MONOSPACE_FONT: &str = "Monaco, Menlo, \"Ubuntu Mono\", monospace";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter { shift: bool },
    Escape,
    Other,
}

/// What the caller should do after a key press on an expanded input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    None,
    /// Submit the enclosing form.
    Submit,
    /// Put this value back into the input.
    Restore(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct InputState {
    original_value: Option<String>,
    /// `None` until the input is first expanded.
    counter: Option<String>,
    monospace: bool,
}

#[derive(Debug, Default)]
pub struct InputExpander {
    inputs: HashMap<String, InputState>,
    expanded: HashSet<String>,
}

impl InputExpander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>) {
        self.inputs.entry(name.into()).or_default();
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    pub fn is_expanded(&self, name: &str) -> bool {
        self.expanded.contains(name)
    }

    pub fn counter(&self, name: &str) -> Option<&str> {
        self.inputs.get(name)?.counter.as_deref()
    }

    pub fn is_monospace(&self, name: &str) -> bool {
        self.inputs.get(name).is_some_and(|state| state.monospace)
    }

    /// Font override for the input while it is expanded.
    pub fn font_family(&self, name: &str) -> Option<&'static str> {
        self.is_monospace(name).then_some(MONOSPACE_FONT)
    }

    pub fn on_focus(&mut self, name: &str, value: &str) {
        let Some(state) = self.inputs.get_mut(name) else {
            return;
        };
        if !self.expanded.insert(name.to_string()) {
            return;
        }

        state.original_value = Some(value.to_string());
        if state.counter.is_none() {
            state.counter = Some(counter_text(value));
        }
        state.monospace = name == CanaryField::HeaderPattern.as_str();
    }

    pub fn on_blur(&mut self, name: &str) {
        if !self.expanded.remove(name) {
            return;
        }
        if let Some(state) = self.inputs.get_mut(name) {
            state.monospace = false;
        }
    }

    pub fn on_input(&mut self, name: &str, value: &str) {
        if let Some(state) = self.inputs.get_mut(name)
            && state.counter.is_some()
        {
            state.counter = Some(counter_text(value));
        }
    }

    pub fn on_key(&mut self, name: &str, key: Key) -> KeyAction {
        if !self.inputs.contains_key(name) {
            return KeyAction::None;
        }

        match key {
            Key::Enter { shift: false } => {
                self.on_blur(name);
                KeyAction::Submit
            }
            Key::Escape => {
                let original = self
                    .inputs
                    .get(name)
                    .and_then(|state| state.original_value.clone());
                self.on_blur(name);
                original.map_or(KeyAction::None, KeyAction::Restore)
            }
            Key::Enter { shift: true } | Key::Other => KeyAction::None,
        }
    }
}

fn counter_text(value: &str) -> String {
    format!("{} chars", value.chars().count())
}
