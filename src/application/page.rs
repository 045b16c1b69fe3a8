//! Page reload signalling.
//!
//! Lock state and rule values are never tracked locally; after a successful
//! change the front end reloads the page to pick up the server's view. A
//! reload is a bump of the generation counter published on a watch channel.

use std::time::Duration;

use tokio::{runtime::Handle, sync::watch};
use tracing::{debug, warn};

/// Delay before reloading after a rule update, so the success toast is seen.
pub const UPDATE_RELOAD_DELAY: Duration = Duration::from_millis(3000);
/// Delay before reloading after a lock or unlock.
pub const LOCK_RELOAD_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone)]
pub struct Page {
    generation: watch::Sender<u64>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self { generation }
    }

    /// Receiver that observes every completed reload.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Number of reloads performed so far.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Reload the page once `delay` has elapsed. Scheduled reloads cannot be
    /// cancelled.
    pub fn schedule_reload(&self, delay: Duration) {
        let generation = self.generation.clone();
        match Handle::try_current() {
            Ok(handle) => {
                debug!(delay_ms = delay.as_millis() as u64, "page reload scheduled");
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    generation.send_modify(|value| *value += 1);
                });
            }
            Err(_) => warn!("no runtime available; page reload skipped"),
        }
    }
}
