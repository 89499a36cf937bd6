pub mod telegram;

use std::future::Future;

/// Fire and forget delivery of operator messages. Delivery failures are the
/// implementation's to log; they never reach the pipeline.
pub trait Notifier {
    fn notify(&self, message: &str) -> impl Future<Output = ()> + Send;
}

/// Notifications disabled
impl Notifier for () {
    async fn notify(&self, message: &str) {
        tracing::debug!(%message, "Notifications disabled, skipping");
    }
}

impl<N: Notifier + Sync> Notifier for Option<N> {
    async fn notify(&self, message: &str) {
        if let Some(notifier) = self {
            notifier.notify(message).await;
        }
    }
}
