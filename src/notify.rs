use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

pub type DynNotifier = Arc<dyn NotifierTrait + Send + Sync>;

/// Delivers messages to users outside of the request that triggered them.
///
/// Delivery is best-effort: callers spawn the send and only log a failure.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotifierTrait {
    async fn send_welcome(&self, email: &str, username: &str) -> anyhow::Result<()>;
}

/// Spawn the welcome message for a freshly registered user without waiting on it.
pub fn spawn_welcome(notifier: DynNotifier, email: String, username: String) {
    tokio::spawn(async move {
        if let Err(e) = notifier.send_welcome(&email, &username).await {
            log::warn!("failed to send welcome message to {}: {:?}", email, e);
        }
    });
}

/// Writes outgoing messages to the log instead of handing them to a mail server.
pub struct LogNotifier {
    from: String,
}

impl LogNotifier {
    pub fn new(from: String) -> Self {
        Self { from }
    }
}

#[async_trait]
impl NotifierTrait for LogNotifier {
    async fn send_welcome(&self, email: &str, username: &str) -> anyhow::Result<()> {
        log::info!(
            "from: {} to: {} subject: Successful account registration with Authors Haven\n\
             Welcome {}, you have successfully created an account with Authors Haven.",
            self.from,
            email,
            username
        );
        Ok(())
    }
}
