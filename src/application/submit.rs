//! Rule updates sent as GET requests carrying the form as a query string.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use metrics::counter;
use tracing::{info, warn};
use url::Url;

use crate::{infra::http::ConsoleClient, util::lock::mutex_lock};

use super::{
    page::{Page, UPDATE_RELOAD_DELAY},
    reply::ReplyBody,
    toast::ToastStack,
};

pub const IDLE_LABEL: &str = "Update";
pub const BUSY_LABEL: &str = "Saving...";

pub const UPDATE_SUCCESS_MESSAGE: &str = "Update successful!";
pub const LOCK_REQUIRED_MESSAGE: &str = "Please lock this ingress before making changes";
pub const NETWORK_FAILURE_MESSAGE: &str = "Update failed, please check your network connection";

/// How the settings endpoint answered a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Success,
    /// The caller does not hold the lock for the resource.
    Forbidden { message: String },
    /// `status` is `None` when no response was received.
    Failure {
        status: Option<u16>,
        message: String,
    },
}

impl SubmitOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Forbidden { .. } => "forbidden",
            Self::Failure { .. } => "failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Text shown to the user for this outcome.
    pub fn message(&self) -> &str {
        match self {
            Self::Success => UPDATE_SUCCESS_MESSAGE,
            Self::Forbidden { message } | Self::Failure { message, .. } => message,
        }
    }

    fn network_failure() -> Self {
        Self::Failure {
            status: None,
            message: NETWORK_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Map a response to an outcome.
///
/// Status `0` stands for an opaque or redirected response and counts as
/// success alongside `302` and any 2xx. `body` is `None` when the body could
/// not be read.
pub fn classify_response(status: u16, body: Option<&str>) -> SubmitOutcome {
    match status {
        0 | 302 => SubmitOutcome::Success,
        403 => {
            let message = body
                .map(|text| ReplyBody::parse(text.as_bytes()))
                .and_then(|reply| reply.error_message().map(str::to_string))
                .unwrap_or_else(|| LOCK_REQUIRED_MESSAGE.to_string());
            SubmitOutcome::Forbidden { message }
        }
        200..=299 => SubmitOutcome::Success,
        _ => match body {
            Some(text) => SubmitOutcome::Failure {
                status: Some(status),
                message: format!("Update failed ({status}): {text}"),
            },
            None => SubmitOutcome::network_failure(),
        },
    }
}

/// The control that triggers a submission. Cloning yields another handle to
/// the same control.
#[derive(Clone, Debug)]
pub struct SubmitControl {
    inner: Arc<ControlState>,
}

#[derive(Debug)]
struct ControlState {
    disabled: AtomicBool,
    label: Mutex<String>,
}

impl Default for SubmitControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitControl {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ControlState {
                disabled: AtomicBool::new(false),
                label: Mutex::new(IDLE_LABEL.to_string()),
            }),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.inner.disabled.load(Ordering::Acquire)
    }

    pub fn label(&self) -> String {
        mutex_lock(&self.inner.label, "application::submit", "label").clone()
    }

    /// Disable the control until the returned guard is dropped.
    pub fn disable(&self) -> ControlGuard<'_> {
        self.set(true, BUSY_LABEL);
        ControlGuard { control: self }
    }

    fn set(&self, disabled: bool, label: &str) {
        *mutex_lock(&self.inner.label, "application::submit", "label") = label.to_string();
        self.inner.disabled.store(disabled, Ordering::Release);
    }
}

/// Re-enables the control on drop, whichever way the request ended.
#[must_use = "the control is re-enabled as soon as the guard is dropped"]
pub struct ControlGuard<'a> {
    control: &'a SubmitControl,
}

impl Drop for ControlGuard<'_> {
    fn drop(&mut self) {
        self.control.set(false, IDLE_LABEL);
    }
}

/// Sends rule updates and reports the outcome.
#[derive(Clone)]
pub struct SubmitClient {
    client: ConsoleClient,
    toasts: ToastStack,
    page: Page,
}

impl SubmitClient {
    pub fn new(client: ConsoleClient, toasts: ToastStack, page: Page) -> Self {
        Self {
            client,
            toasts,
            page,
        }
    }

    /// Send `fields` as the query string of a GET to `action_url`.
    ///
    /// Success shows a toast and reloads the page after
    /// [`UPDATE_RELOAD_DELAY`]; anything else shows an error toast. `control`
    /// stays disabled for the duration of the request.
    pub async fn submit_form_as_query<K, V>(
        &self,
        action_url: &str,
        fields: &[(K, V)],
        control: Option<&SubmitControl>,
    ) -> SubmitOutcome
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let _guard = control.map(SubmitControl::disable);

        let outcome = self.send(action_url, fields).await;
        counter!("canary_submit_total", "outcome" => outcome.kind()).increment(1);

        match &outcome {
            SubmitOutcome::Success => {
                info!(action = action_url, "rule update accepted");
                self.toasts.success(UPDATE_SUCCESS_MESSAGE);
                self.page.schedule_reload(UPDATE_RELOAD_DELAY);
            }
            SubmitOutcome::Forbidden { message } => {
                warn!(action = action_url, message = %message, "rule update forbidden");
                self.toasts.error(message.clone());
            }
            SubmitOutcome::Failure { status, message } => {
                warn!(action = action_url, status = ?status, message = %message, "rule update failed");
                self.toasts.error(message.clone());
            }
        }

        outcome
    }

    async fn send<K, V>(&self, action_url: &str, fields: &[(K, V)]) -> SubmitOutcome
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = match self.client.url(action_url) {
            Ok(url) => with_form_query(url, fields),
            Err(err) => {
                warn!(action = action_url, error = %err, "invalid form action");
                return SubmitOutcome::Failure {
                    status: None,
                    message: format!("Update failed: invalid form action `{action_url}`"),
                };
            }
        };

        let response = match self.client.http().get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(action = action_url, error = %err, "rule update request failed");
                return SubmitOutcome::network_failure();
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(action = action_url, status, error = %err, "failed to read response body");
                None
            }
        };

        classify_response(status, body.as_deref())
    }
}

/// The form fields replace whatever query the action URL carried.
fn with_form_query<K, V>(mut url: Url, fields: &[(K, V)]) -> Url
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    url.set_query(None);
    if !fields.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(fields.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
    }
    url
}
