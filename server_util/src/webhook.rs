// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::Serialize;
use std::time::Duration;

/// Posts moderation notices to a chat webhook (e.g. Discord's "execute webhook" endpoint).
/// Cheap to clone, since the client is shared.
#[derive(Clone)]
pub struct AuditWebhook {
    url: String,
    client: reqwest::Client,
}

impl AuditWebhook {
    pub fn new(url: String) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Best effort; callers are expected to log and swallow the error.
    pub async fn post(&self, content: &str) -> Result<(), String> {
        #[derive(Serialize)]
        struct ExecuteWebhook<'a> {
            content: &'a str,
        }

        self.client
            .post(&self.url)
            .json(&ExecuteWebhook { content })
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::webhook::AuditWebhook;

    #[tokio::test]
    async fn unreachable() {
        let webhook = AuditWebhook::new(String::from("http://127.0.0.1:9/webhook")).unwrap();
        assert_eq!(webhook.url(), "http://127.0.0.1:9/webhook");
        assert!(webhook.post("test").await.is_err());
    }
}
