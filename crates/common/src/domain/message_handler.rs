use async_trait::async_trait;

/// Callback registered against a message source subscription
///
/// Implementations own their error handling: one message must never be able
/// to stop the subscription loop.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, topic: &str, payload: &[u8]);
}
