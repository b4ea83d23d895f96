use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;

use crate::{domain::*, Result};

/// Hexagonal port for the chat protocol client.
///
/// Packet encoding and session keys live entirely behind this trait; the login
/// state machine only sees attempts, challenges and QR status.
#[async_trait]
pub trait LoginClient: Send + Sync {
    /// Account number, if the client was configured with one.
    fn uin(&self) -> Option<i64>;

    async fn login(&self) -> Result<LoginAttempt>;

    async fn fetch_qr_code(&self) -> Result<QrCode>;
    async fn query_qr_status(&self, sig: &[u8]) -> Result<QrStatusReport>;
    async fn qr_login(&self, info: &QrLoginInfo) -> Result<LoginAttempt>;

    async fn submit_ticket(&self, ticket: &str) -> Result<LoginAttempt>;
    async fn submit_captcha(&self, text: &str, token: &CaptchaToken) -> Result<LoginAttempt>;

    /// Ask the server to send an SMS code. `false` means the server refused.
    async fn request_sms(&self) -> Result<bool>;
    async fn submit_sms(&self, code: &str) -> Result<LoginAttempt>;
}

/// The human (or the absence of one) on the other side of the console.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Whether input comes from an attended terminal.
    fn is_interactive(&self) -> bool;

    /// Read one trimmed line. Returns an empty string on end of input.
    async fn read_line(&self) -> String;

    /// Read one trimmed line, giving up after `timeout`.
    async fn read_line_timeout(&self, timeout: Duration) -> Option<String>;

    /// Read a line when attended, otherwise answer `default` without blocking.
    async fn read_if_interactive(&self, default: &str) -> String {
        if self.is_interactive() {
            return self.read_line().await;
        }
        tracing::warn!("no input terminal detected, choosing {default} automatically.");
        default.to_string()
    }
}

/// Transient files shown to the operator (QR code, captcha image).
pub trait ArtifactStore: Send + Sync {
    fn save(&self, name: &str, data: &[u8]) -> Result<PathBuf>;

    /// Best effort; a missing file is not an error.
    fn remove(&self, name: &str);

    /// Show a QR code image to the operator. Adapters without a display may skip this.
    fn render_qr(&self, _image: &[u8]) {}
}

/// Lookup service that hands out slider tickets solved in a browser.
#[async_trait]
pub trait TicketBroker: Send + Sync {
    /// `Ok(None)` means the ticket is not ready yet.
    async fn fetch_ticket(&self, id: &str) -> Result<Option<String>>;
}

/// Opens (and immediately closes) a connection to prove an endpoint is reachable.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, addr: &str) -> std::io::Result<()>;
}
