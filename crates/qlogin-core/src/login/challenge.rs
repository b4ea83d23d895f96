use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::{
    login::LoginSettings,
    ports::{Operator, TicketBroker},
    utils::random_id,
};

/// Prefix of the slider page the protocol hands out; automatic mode swaps it for the broker.
pub const SLIDER_PAGE_PREFIX: &str =
    "https://ssl.captcha.qq.com/template/wireless_mqq_captcha.html?";

const BROKER_ID_LEN: usize = 8;

/// Obtains the operator input (or broker data) each challenge kind needs.
///
/// An empty string is the "give up" sentinel: the caller stops instead of
/// resubmitting.
#[derive(Clone)]
pub struct ChallengeResolver {
    operator: Arc<dyn Operator>,
    broker: Arc<dyn TicketBroker>,
    broker_url: Url,
    settings: LoginSettings,
}

impl ChallengeResolver {
    pub fn new(
        operator: Arc<dyn Operator>,
        broker: Arc<dyn TicketBroker>,
        broker_url: Url,
        settings: LoginSettings,
    ) -> Self {
        Self {
            operator,
            broker,
            broker_url,
            settings,
        }
    }

    /// Slider ticket, either fetched from the broker or pasted by the operator.
    pub async fn slider_ticket(&self, verify_url: &str) -> String {
        warn!("choose how to submit the slider ticket:");
        warn!("1. automatic");
        warn!("2. manual");
        warn!("enter (1 - 2):");
        let choice = self.operator.read_if_interactive("1").await;
        let auto = !choice.contains('2');

        let id = random_id(BROKER_ID_LEN);
        let url = if auto {
            rewrite_verify_url(verify_url, &self.broker_url, &id)
        } else {
            verify_url.to_string()
        };
        warn!("complete the verification at -> {url}");

        if !auto {
            warn!("enter the ticket: (Enter to submit)");
            return self.operator.read_line().await;
        }
        self.poll_broker(&id).await
    }

    async fn poll_broker(&self, id: &str) -> String {
        for _ in 0..self.settings.slider_poll_attempts {
            match self.broker.fetch_ticket(id).await {
                Ok(Some(ticket)) => return ticket,
                Ok(None) => {}
                Err(e) => debug!("error while fetching ticket: {e}"),
            }
            sleep(self.settings.slider_poll_interval).await;
        }
        warn!("verification timed out");
        String::new()
    }

    /// Free-text answer for an image captcha the caller has already put on disk.
    pub async fn captcha_text(&self, image_hint: &str) -> String {
        warn!("enter the captcha ({image_hint}): (Enter to submit)");
        self.operator.read_line().await
    }

    pub async fn sms_code(&self) -> String {
        warn!("enter the SMS code: (Enter to submit)");
        self.operator.read_line().await
    }

    /// Pick an option; unattended runs take `default` without blocking.
    pub async fn choose(&self, default: &str) -> String {
        self.operator.read_if_interactive(default).await
    }
}

/// Point the slider page at the broker so the solved ticket can be picked up by `id`.
pub fn rewrite_verify_url(verify_url: &str, broker_url: &Url, id: &str) -> String {
    let broker = broker_url.as_str().trim_end_matches('/');
    verify_url.replace(SLIDER_PAGE_PREFIX, &format!("{broker}/captcha?id={id}&"))
}
