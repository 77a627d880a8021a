use crate::application::ports::connectivity::{BackgroundWake, ConnectivityMonitor, WakeTrigger};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Watch-channel-backed connectivity feed. The host application holds a
/// clone and calls [`ChannelConnectivity::set_online`] from whatever
/// network observer its platform provides; subscribers only see actual
/// transitions.
#[derive(Clone)]
pub struct ChannelConnectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl ChannelConnectivity {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }
}

impl ConnectivityMonitor for ChannelConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Fallback for platforms without background execution. Registration
/// succeeds and does nothing; correctness never depends on the hook.
pub struct NoopBackgroundWake;

#[async_trait]
impl BackgroundWake for NoopBackgroundWake {
    fn is_available(&self) -> bool {
        false
    }

    async fn register(&self, _trigger: WakeTrigger) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeated_set_does_not_notify() {
        let connectivity = ChannelConnectivity::new(true);
        let mut rx = connectivity.subscribe();
        rx.borrow_and_update();

        connectivity.set_online(true);
        assert!(!rx.has_changed().expect("channel open"));

        connectivity.set_online(false);
        assert!(rx.has_changed().expect("channel open"));
        assert!(!*rx.borrow_and_update());
    }
}
