//! Implements the `Notifier` trait.

use crate::api::Notifier;
use crate::Result;
use anyhow::Context;
use tracing::{debug, info};
use url::Url;

/// Calls a webhook with a single GET. The response is not inspected beyond logging its status.
pub(super) struct WebhookNotifier {
    url: Url,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub(super) fn new(url: Url) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&mut self) -> Result<()> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .context("Failed to call the notification webhook")?;
        debug!("Notification webhook answered {}", response.status());
        Ok(())
    }
}

/// Stands in for the webhook in test mode.
pub(super) struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&mut self) -> Result<()> {
        info!("Categories are needed, a notification would be sent now");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_webhook_sends_get() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n")
                .await
                .unwrap();
            request
        });

        let url = Url::parse(&format!("http://127.0.0.1:{port}/whatsapp.php?text=hi")).unwrap();
        let mut notifier = WebhookNotifier::new(url);
        // A failing status is still a delivered notification.
        notifier.notify().await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /whatsapp.php?text=hi HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_webhook_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let mut notifier = WebhookNotifier::new(url);
        assert!(notifier.notify().await.is_err());
    }
}
