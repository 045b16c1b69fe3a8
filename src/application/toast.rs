//! Transient notifications shown to the operator.
//!
//! A [`ToastStack`] owns every active toast. Each toast stays visible for its
//! display duration, then enters the hiding phase for [`FADE_OUT`] before it
//! is detached from the container. Expiry runs on the Tokio timer, so tests
//! drive it with a paused clock.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use askama::Template;
use metrics::counter;
use tokio::{runtime::Handle, sync::broadcast};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    presentation::toast::{ToastItem, ToastStackTemplate},
    util::lock::mutex_lock,
};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);
pub const SUCCESS_DURATION: Duration = Duration::from_millis(3000);
pub const WARNING_DURATION: Duration = Duration::from_millis(4000);
pub const ERROR_DURATION: Duration = Duration::from_millis(5000);
/// Time between a toast starting to hide and its removal.
pub const FADE_OUT: Duration = Duration::from_millis(300);

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Map a severity name to a variant. Unknown names fall back to
    /// [`Severity::Info`], which renders with the neutral style.
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "success" => Self::Success,
            "warning" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    pub fn style(self) -> ToastStyle {
        match self {
            Self::Success => ToastStyle {
                background: "linear-gradient(135deg, #28a745 0%, #20c997 100%)",
                color: "white",
            },
            Self::Error => ToastStyle {
                background: "linear-gradient(135deg, #dc3545 0%, #fd7e14 100%)",
                color: "white",
            },
            Self::Warning => ToastStyle {
                background: "linear-gradient(135deg, #ffc107 0%, #fd7e14 100%)",
                color: "#212529",
            },
            Self::Info => ToastStyle::NEUTRAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastStyle {
    pub background: &'static str,
    pub color: &'static str,
}

impl ToastStyle {
    pub const NEUTRAL: ToastStyle = ToastStyle {
        background: "#6c757d",
        color: "white",
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Hiding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: Uuid,
    pub text: String,
    pub severity: Severity,
    pub duration: Duration,
    pub phase: ToastPhase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastEvent {
    Shown(Toast),
    Hiding { id: Uuid },
    Removed { id: Uuid },
}

/// Container of active toasts. Cloning yields another handle to the same
/// container.
#[derive(Clone)]
pub struct ToastStack {
    inner: Arc<ToastStackInner>,
}

struct ToastStackInner {
    /// `None` until the first toast is shown.
    container: Mutex<Option<Vec<Toast>>>,
    events: broadcast::Sender<ToastEvent>,
}

impl Default for ToastStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastStack {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ToastStackInner {
                container: Mutex::new(None),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.inner.events.subscribe()
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.notify(message, Severity::Info, DEFAULT_DURATION)
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.notify(message, Severity::Success, SUCCESS_DURATION)
    }

    pub fn warning(&self, message: impl Into<String>) -> Uuid {
        self.notify(message, Severity::Warning, WARNING_DURATION)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.notify(message, Severity::Error, ERROR_DURATION)
    }

    /// Append a toast and schedule its expiry.
    ///
    /// Expiry needs a Tokio runtime; outside one the toast is shown but never
    /// removed.
    pub fn notify(&self, message: impl Into<String>, severity: Severity, duration: Duration) -> Uuid {
        let toast = Toast {
            id: Uuid::new_v4(),
            text: message.into(),
            severity,
            duration,
            phase: ToastPhase::Visible,
        };
        let id = toast.id;

        {
            let mut container = self.container();
            container.get_or_insert_with(Vec::new).push(toast.clone());
        }
        counter!("canary_toasts_total", "severity" => severity.as_str()).increment(1);
        debug!(toast_id = %id, severity = severity.as_str(), text = %toast.text, "toast shown");
        let _ = self.inner.events.send(ToastEvent::Shown(toast));

        match Handle::try_current() {
            Ok(handle) => {
                let stack = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(duration).await;
                    stack.mark_hiding(id);
                    tokio::time::sleep(FADE_OUT).await;
                    stack.remove(id);
                });
            }
            Err(_) => warn!(toast_id = %id, "no runtime available; toast will not expire"),
        }

        id
    }

    pub fn container_created(&self) -> bool {
        self.container().is_some()
    }

    /// Snapshot of the active toasts in display order.
    pub fn toasts(&self) -> Vec<Toast> {
        self.container().as_ref().cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.container().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the container and its toasts to HTML.
    pub fn render(&self) -> Result<String, askama::Error> {
        let toasts = self
            .toasts()
            .into_iter()
            .map(|toast| {
                let style = toast.severity.style();
                ToastItem {
                    id: toast.id.to_string(),
                    kind: toast.severity.as_str(),
                    text: toast.text,
                    ttl_ms: u64::try_from(toast.duration.as_millis()).unwrap_or(u64::MAX),
                    background: style.background,
                    color: style.color,
                    hiding: toast.phase == ToastPhase::Hiding,
                }
            })
            .collect();

        ToastStackTemplate { toasts }.render()
    }

    fn mark_hiding(&self, id: Uuid) {
        let mut container = self.container();
        if let Some(toast) = container
            .as_mut()
            .and_then(|toasts| toasts.iter_mut().find(|toast| toast.id == id))
        {
            toast.phase = ToastPhase::Hiding;
            let _ = self.inner.events.send(ToastEvent::Hiding { id });
        }
    }

    fn remove(&self, id: Uuid) {
        let mut container = self.container();
        if let Some(toasts) = container.as_mut() {
            let before = toasts.len();
            toasts.retain(|toast| toast.id != id);
            if toasts.len() != before {
                debug!(toast_id = %id, "toast removed");
                let _ = self.inner.events.send(ToastEvent::Removed { id });
            }
        }
    }

    fn container(&self) -> std::sync::MutexGuard<'_, Option<Vec<Toast>>> {
        mutex_lock(&self.inner.container, "application::toast", "container")
    }
}
