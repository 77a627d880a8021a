use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Platform online/offline signal. The coordinator subscribes to
/// transitions (edge-triggered); it never polls.
pub trait ConnectivityMonitor: Send + Sync {
    fn is_online(&self) -> bool;

    /// Channel carrying the current online flag; receivers observe every
    /// transition.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

pub type WakeTrigger = Arc<dyn Fn() + Send + Sync>;

/// Opportunistic platform hook that may wake a drain pass while the
/// application is backgrounded. Absence never breaks correctness, only
/// timeliness.
#[async_trait]
pub trait BackgroundWake: Send + Sync {
    fn is_available(&self) -> bool;

    async fn register(&self, trigger: WakeTrigger) -> Result<(), AppError>;
}
