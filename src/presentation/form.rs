//! In-memory model of the canary rule form and its inline error markers.

use std::collections::HashMap;

use crate::{
    application::submit::SubmitControl,
    domain::{
        fields::{CanaryField, CanaryFields},
        validation::ValidationError,
    },
};

pub const ERROR_BORDER_COLOR: &str = "#dc3545";
pub const ERROR_BOX_SHADOW: &str = "0 0 0 3px rgba(220, 53, 69, 0.25)";

/// Inline marker attached to a field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAnnotation {
    pub message: String,
    pub border_color: &'static str,
    pub box_shadow: &'static str,
}

impl FieldAnnotation {
    fn for_error(error: &ValidationError) -> Self {
        Self {
            message: error.message(),
            border_color: ERROR_BORDER_COLOR,
            box_shadow: ERROR_BOX_SHADOW,
        }
    }
}

/// A GET form: its action URL, the fields in document order, and the
/// control that submits it.
#[derive(Debug, Clone)]
pub struct CanaryForm {
    action: String,
    fields: Vec<(String, String)>,
    annotations: HashMap<CanaryField, FieldAnnotation>,
    control: SubmitControl,
}

impl CanaryForm {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            fields: Vec::new(),
            annotations: HashMap::new(),
            control: SubmitControl::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field value, appending the field if it is not present yet.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn canary_fields(&self) -> CanaryFields {
        CanaryFields::from_pairs(&self.fields)
    }

    pub fn control(&self) -> &SubmitControl {
        &self.control
    }

    /// Replace any previous markers with one marker per violation.
    pub fn show_errors(&mut self, errors: &[ValidationError]) {
        self.clear_errors();
        for error in errors {
            self.annotations
                .entry(error.field())
                .or_insert_with(|| FieldAnnotation::for_error(error));
        }
    }

    pub fn clear_errors(&mut self) {
        self.annotations.clear();
    }

    /// Focusing a field clears its marker.
    pub fn focus(&mut self, field: CanaryField) {
        self.annotations.remove(&field);
    }

    pub fn annotation(&self, field: CanaryField) -> Option<&FieldAnnotation> {
        self.annotations.get(&field)
    }

    pub fn has_errors(&self) -> bool {
        !self.annotations.is_empty()
    }
}
