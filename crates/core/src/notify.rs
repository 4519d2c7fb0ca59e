use tracing::info;

/// Platform notification seam. The poller calls this when an alert fires
/// and the user has notifications enabled; what "platform" means (desktop
/// toast, webhook, nothing) is the embedder's choice.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Writes notifications to the log. Useful default for headless runs.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(title, body, "notification");
    }
}

/// Drops notifications entirely.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}
