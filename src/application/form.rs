//! Submission pipeline for the canary rule form: validate, mark the form,
//! then send.

use tracing::debug;

use crate::{
    domain::validation::{ValidationError, validate},
    presentation::form::CanaryForm,
};

use super::{
    submit::{SubmitClient, SubmitOutcome},
    toast::ToastStack,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitDisposition {
    /// Validation failed; nothing was sent.
    Rejected(Vec<ValidationError>),
    Sent(SubmitOutcome),
}

#[derive(Clone)]
pub struct FormController {
    submit: SubmitClient,
    toasts: ToastStack,
}

impl FormController {
    pub fn new(submit: SubmitClient, toasts: ToastStack) -> Self {
        Self { submit, toasts }
    }

    pub async fn handle_submit(&self, form: &mut CanaryForm) -> SubmitDisposition {
        let errors = validate(&form.canary_fields());
        form.show_errors(&errors);

        if let Some(first) = errors.first() {
            debug!(count = errors.len(), first = %first, "form rejected by validation");
            self.toasts.error(first.message());
            return SubmitDisposition::Rejected(errors);
        }

        let outcome = self
            .submit
            .submit_form_as_query(form.action(), form.pairs(), Some(form.control()))
            .await;
        SubmitDisposition::Sent(outcome)
    }
}
