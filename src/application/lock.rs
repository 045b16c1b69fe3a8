//! Acquire and release the server-side edit lock for an ingress.
//!
//! The console keeps no lock state of its own. Each call is a round trip to
//! `/lock` or `/unlock`; on success the page is reloaded to show the server's
//! view.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use metrics::counter;
use tracing::{info, warn};

use crate::infra::http::ConsoleClient;

use super::{
    page::{LOCK_RELOAD_DELAY, Page},
    reply::ReplyBody,
    toast::ToastStack,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAction {
    Lock,
    Unlock,
}

impl LockAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Lock => "/lock",
            Self::Unlock => "/unlock",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Lock => "Lock",
            Self::Unlock => "Unlock",
        }
    }

    pub fn success_message(self) -> String {
        format!("{} successful!", self.label())
    }

    pub fn failure_message(self) -> String {
        format!("{} failed", self.label())
    }

    pub fn network_failure_message(self) -> String {
        format!("{} failed due to network error", self.label())
    }
}

#[derive(Clone)]
pub struct LockService {
    client: ConsoleClient,
    toasts: ToastStack,
    page: Page,
    in_flight: Arc<AtomicBool>,
}

impl LockService {
    pub fn new(client: ConsoleClient, toasts: ToastStack, page: Page) -> Self {
        Self {
            client,
            toasts,
            page,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn acquire_lock(&self, namespace: &str, resource: &str) -> bool {
        self.request(LockAction::Lock, namespace, resource).await
    }

    pub async fn release_lock(&self, namespace: &str, resource: &str) -> bool {
        self.request(LockAction::Unlock, namespace, resource).await
    }

    /// Whether a lock or unlock request is currently awaiting its response.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    async fn request(&self, action: LockAction, namespace: &str, ingress: &str) -> bool {
        let Some(_in_flight) = InFlight::enter(&self.in_flight) else {
            warn!(action = action.as_str(), namespace, ingress, "lock request already in flight");
            self.toasts
                .warning(format!("A {} request is already in progress", action.as_str()));
            record(action, "busy");
            return false;
        };

        let url = match self.client.url(action.path()) {
            Ok(url) => url,
            Err(err) => {
                warn!(action = action.as_str(), error = %err, "failed to build lock URL");
                self.toasts.error(action.network_failure_message());
                record(action, "network_error");
                return false;
            }
        };

        let form = [("namespace", namespace), ("ingress", ingress)];
        let sent = self.client.http().post(url).form(&form).send().await;
        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                warn!(action = action.as_str(), namespace, ingress, error = %err, "lock request failed");
                self.toasts.error(action.network_failure_message());
                record(action, "network_error");
                return false;
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => ReplyBody::parse(&bytes),
            Err(err) => {
                warn!(action = action.as_str(), status = status.as_u16(), error = %err, "failed to read lock response");
                self.toasts.error(action.network_failure_message());
                record(action, "network_error");
                return false;
            }
        };

        if !status.is_success() {
            let message = match &body {
                ReplyBody::Json { error: Some(error) } => error.clone(),
                ReplyBody::Json { error: None } => action.failure_message(),
                ReplyBody::Malformed { .. } => format!(
                    "{} ({}): unexpected response from server",
                    action.failure_message(),
                    status.as_u16()
                ),
            };
            warn!(
                action = action.as_str(),
                namespace,
                ingress,
                status = status.as_u16(),
                message = %message,
                "lock request rejected"
            );
            self.toasts.error(message);
            record(action, "rejected");
            return false;
        }

        if let ReplyBody::Malformed { reason } = &body {
            warn!(action = action.as_str(), reason = %reason, "lock succeeded with a malformed body");
        }
        info!(action = action.as_str(), namespace, ingress, "lock request accepted");
        self.toasts.success(action.success_message());
        self.page.schedule_reload(LOCK_RELOAD_DELAY);
        record(action, "ok");
        true
    }
}

fn record(action: LockAction, result: &'static str) {
    counter!("canary_lock_requests_total", "action" => action.as_str(), "result" => result)
        .increment(1);
}

/// Marks a lock request as in flight for as long as it is held.
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_paths_and_messages() {
        assert_eq!(LockAction::Lock.path(), "/lock");
        assert_eq!(LockAction::Unlock.path(), "/unlock");
        assert_eq!(LockAction::Unlock.failure_message(), "Unlock failed");
        assert_eq!(
            LockAction::Lock.network_failure_message(),
            "Lock failed due to network error"
        );
    }

    #[test]
    fn in_flight_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = InFlight::enter(&flag).expect("first entry");
        assert!(InFlight::enter(&flag).is_none());
        drop(first);
        assert!(InFlight::enter(&flag).is_some());
    }
}
