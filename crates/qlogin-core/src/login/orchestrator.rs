//! Top-level login loop.
//!
//! Each iteration classifies the latest attempt, resolves the challenge it
//! carries and resubmits. The loop only ends on success or on a typed
//! [`Termination`], which the caller turns into a clean process exit.

use tracing::{info, warn};

use crate::{
    domain::{LoginAttempt, LoginErrorKind},
    errors::{Error, Termination},
    login::{ChallengeResolver, LoginContext, QrLoginFlow, CAPTCHA_FILE},
    Result,
};

/// Advisory messages for well-known failure codes.
const FAILURE_HINTS: &[(i32, &str)] = &[
    (
        235,
        "device information has been banned, delete the stored device identity and retry.",
    ),
    (
        237,
        "logging in too often, finish the verification prompted in the mobile app, wait a while, then retry.",
    ),
    (
        45,
        "this account is restricted from logging in, configure a sign server and retry.",
    ),
];

pub fn failure_hint(code: i32) -> Option<&'static str> {
    FAILURE_HINTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, hint)| *hint)
}

pub struct LoginOrchestrator {
    ctx: LoginContext,
    resolver: ChallengeResolver,
}

impl LoginOrchestrator {
    pub fn new(ctx: LoginContext, resolver: ChallengeResolver) -> Self {
        Self { ctx, resolver }
    }

    pub async fn login_with_password(&self) -> Result<()> {
        let attempt = self.ctx.client.login().await?;
        self.run(attempt).await
    }

    pub async fn login_with_qr(&self) -> Result<()> {
        let attempt = QrLoginFlow::new(self.ctx.clone()).run().await?;
        self.run(attempt).await
    }

    /// Drive the challenge loop starting from `attempt`.
    pub async fn run(&self, mut attempt: LoginAttempt) -> Result<()> {
        loop {
            let Some(kind) = attempt.error else {
                info!("login succeeded");
                return Ok(());
            };

            attempt = match kind {
                LoginErrorKind::SliderChallenge => self.on_slider(&attempt).await?,
                LoginErrorKind::ImageCaptchaChallenge => self.on_captcha(&attempt).await?,
                LoginErrorKind::SmsChallenge => {
                    warn!(
                        "device lock is enabled, press Enter to send an SMS code to {}.",
                        attempt.sms_phone.as_deref().unwrap_or_default()
                    );
                    self.acknowledge().await;
                    self.sms_exchange().await?
                }
                LoginErrorKind::SmsOrQrChallenge => {
                    warn!("device lock is enabled, choose a verification method:");
                    warn!(
                        "1. send an SMS code to {}",
                        attempt.sms_phone.as_deref().unwrap_or_default()
                    );
                    warn!("2. verify by scanning in the mobile app.");
                    warn!("enter (1 - 2):");
                    let choice = self.resolver.choose("2").await;
                    if choice.contains('1') {
                        self.sms_exchange().await?
                    } else {
                        return Err(self.stop_for_device_lock(&attempt).await);
                    }
                }
                LoginErrorKind::UnsafeDevice => {
                    return Err(self.stop_for_device_lock(&attempt).await);
                }
                LoginErrorKind::OtherFailure
                | LoginErrorKind::UnknownFailure
                | LoginErrorKind::TooManySmsRequests => {
                    return Err(self.stop_for_failure(&attempt).await);
                }
            };
        }
    }

    async fn on_slider(&self, attempt: &LoginAttempt) -> Result<LoginAttempt> {
        warn!("login requires a slider captcha, complete it and retry.");
        let verify_url = attempt.verify_url.as_deref().unwrap_or_default();
        let ticket = self.resolver.slider_ticket(verify_url).await;
        if ticket.is_empty() {
            warn!("no slider ticket was submitted, stopping login.");
            self.acknowledge().await;
            return Err(Error::Terminated(Termination::SliderUnresolved));
        }
        self.ctx.client.submit_ticket(&ticket).await
    }

    async fn on_captcha(&self, attempt: &LoginAttempt) -> Result<LoginAttempt> {
        warn!("login requires a captcha.");
        let image = attempt.captcha_image.as_deref().unwrap_or_default();
        if let Err(e) = self.ctx.artifacts.save(CAPTCHA_FILE, image) {
            warn!("failed to write {CAPTCHA_FILE}: {e}");
        }
        let text = self.resolver.captcha_text(CAPTCHA_FILE).await;
        self.ctx.artifacts.remove(CAPTCHA_FILE);

        let token = attempt.captcha_token.clone().unwrap_or_default();
        self.ctx.client.submit_captcha(&text, &token).await
    }

    async fn sms_exchange(&self) -> Result<LoginAttempt> {
        if !self.ctx.client.request_sms().await? {
            warn!("failed to send the SMS code, requests may be too frequent.");
            return Err(Error::SmsRequestFailed);
        }
        let code = self.resolver.sms_code().await;
        self.ctx.client.submit_sms(&code).await
    }

    async fn stop_for_device_lock(&self, attempt: &LoginAttempt) -> Error {
        let verify_url = attempt.verify_url.clone().unwrap_or_default();
        warn!("device lock is enabled, verify at -> {verify_url} <- and restart.");
        let wait = self.ctx.settings.unsafe_device_wait;
        info!("press Enter or wait {}s to continue....", wait.as_secs());
        self.ctx.operator.read_line_timeout(wait).await;
        Error::Terminated(Termination::UnsafeDevice { verify_url })
    }

    async fn stop_for_failure(&self, attempt: &LoginAttempt) -> Error {
        warn!(
            "login failed: {} code: {}",
            attempt.error_message, attempt.code
        );
        if let Some(hint) = failure_hint(attempt.code) {
            warn!("{hint}");
        }
        self.acknowledge().await;
        Error::Terminated(Termination::LoginFailed {
            code: attempt.code,
            message: attempt.error_message.clone(),
        })
    }

    /// Wait for Enter when attended. Unattended input may never deliver a line.
    async fn acknowledge(&self) {
        if !self.ctx.operator.is_interactive() {
            return;
        }
        info!("press Enter to continue....");
        self.ctx.operator.read_line().await;
    }
}
