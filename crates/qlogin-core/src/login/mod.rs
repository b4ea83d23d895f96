//! Login negotiation: the challenge loop, its resolvers and the QR sub-flow.

pub mod broker;
pub mod challenge;
pub mod orchestrator;
pub mod qrcode;

#[cfg(test)]
pub(crate) mod testing;

use std::{sync::Arc, time::Duration};

use crate::ports::{ArtifactStore, LoginClient, Operator};

pub use challenge::ChallengeResolver;
pub use orchestrator::{failure_hint, LoginOrchestrator};
pub use qrcode::{QrContext, QrLoginFlow};

/// File names of the transient images shown to the operator.
pub const QR_CODE_FILE: &str = "qrcode.png";
pub const CAPTCHA_FILE: &str = "captcha.jpg";

/// Timing knobs for the negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoginSettings {
    pub slider_poll_attempts: u32,
    pub slider_poll_interval: Duration,
    pub qr_poll_interval: Duration,
    pub unsafe_device_wait: Duration,
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            slider_poll_attempts: 120,
            slider_poll_interval: Duration::from_secs(1),
            qr_poll_interval: Duration::from_secs(1),
            unsafe_device_wait: Duration::from_secs(5),
        }
    }
}

/// Everything one login negotiation needs, built once and handed down the call chain.
#[derive(Clone)]
pub struct LoginContext {
    pub client: Arc<dyn LoginClient>,
    pub operator: Arc<dyn Operator>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub settings: LoginSettings,
}

impl LoginContext {
    pub fn new(
        client: Arc<dyn LoginClient>,
        operator: Arc<dyn Operator>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            client,
            operator,
            artifacts,
            settings: LoginSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: LoginSettings) -> Self {
        self.settings = settings;
        self
    }
}
