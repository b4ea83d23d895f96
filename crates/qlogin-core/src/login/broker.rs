//! HTTP client for the slider-ticket broker.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{errors::Error, ports::TicketBroker, Result};

#[derive(Clone, Debug)]
pub struct HttpTicketBroker {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpTicketBroker {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn ticket_url(&self, id: &str) -> String {
        format!(
            "{}/captcha/ticket?id={id}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TicketBroker for HttpTicketBroker {
    async fn fetch_ticket(&self, id: &str) -> Result<Option<String>> {
        let url = self.ticket_url(id);
        let transport = |e: reqwest::Error| Error::Transport {
            url: url.clone(),
            message: e.to_string(),
        };

        let v: serde_json::Value = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport)?
            .json()
            .await
            .map_err(|e| Error::Decode(format!("broker response is not json: {e}")))?;

        Ok(v.get("ticket")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string()))
    }
}
