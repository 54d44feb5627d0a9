/// Progress delivery abstraction.
///
/// The search invoker reports progress through this seam without knowing
/// whether anyone is listening. Sinks must never fail: delivery problems are
/// the sink's to log and swallow, since progress is telemetry rather than
/// part of the request contract.
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    /// Report progress out of `total` with a human-readable message.
    async fn emit(&self, progress: f64, total: f64, message: &str);
}

/// Sink used when the caller did not subscribe to progress.
pub struct NoopProgress;

#[async_trait::async_trait]
impl ProgressSink for NoopProgress {
    async fn emit(&self, _progress: f64, _total: f64, _message: &str) {}
}
