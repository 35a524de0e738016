use super::Notifier;
use crate::error::EffectError;

/// Emits notifications as log records.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, title: &str, message: &str) -> Result<(), EffectError> {
        tracing::info!(target: "notification", title, message, "notify");
        Ok(())
    }
}
