//! QR-code login: fetch a code, show it, poll until the phone confirms.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    domain::{LoginAttempt, QrStatus},
    errors::{Error, Termination},
    login::{LoginContext, QR_CODE_FILE},
    Result,
};

/// Handle for a QR code that is currently on display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrContext {
    pub sig: Vec<u8>,
    pub baseline: QrStatus,
}

/// Remembers the last reported status so repeated reports act only once.
#[derive(Clone, Copy, Debug)]
pub struct QrStateTracker {
    last: QrStatus,
}

impl QrStateTracker {
    pub fn new(baseline: QrStatus) -> Self {
        Self { last: baseline }
    }

    /// Returns `true` when `status` differs from the previous report.
    pub fn advance(&mut self, status: QrStatus) -> bool {
        if status == self.last {
            return false;
        }
        self.last = status;
        true
    }
}

fn scan_prompt(uin: Option<i64>) -> String {
    match uin {
        Some(uin) => format!("scan the QR code ({QR_CODE_FILE}) with account {uin} in the mobile app:"),
        None => format!("scan the QR code ({QR_CODE_FILE}) in the mobile app:"),
    }
}

pub struct QrLoginFlow {
    ctx: LoginContext,
}

impl QrLoginFlow {
    pub fn new(ctx: LoginContext) -> Self {
        Self { ctx }
    }

    /// Full QR sub-flow; the code image is removed however it ends.
    pub async fn run(&self) -> Result<LoginAttempt> {
        let out = match self.start().await {
            Ok(qr) => self.poll_until_resolved(qr).await,
            Err(e) => Err(e),
        };
        self.ctx.artifacts.remove(QR_CODE_FILE);
        out
    }

    /// Fetch a code, put it in front of the operator and record the baseline status.
    pub async fn start(&self) -> Result<QrContext> {
        let code = self.ctx.client.fetch_qr_code().await?;
        if let Err(e) = self.ctx.artifacts.save(QR_CODE_FILE, &code.image) {
            warn!("failed to write {QR_CODE_FILE}: {e}");
        }

        info!("{}", scan_prompt(self.ctx.client.uin()));
        self.ctx.artifacts.render_qr(&code.image);

        let baseline = self.ctx.client.query_qr_status(&code.sig).await?.status;
        Ok(QrContext {
            sig: code.sig,
            baseline,
        })
    }

    /// Poll once per interval until the code is confirmed, canceled or expired.
    ///
    /// Query failures are skipped; QR status is best effort.
    pub async fn poll_until_resolved(&self, qr: QrContext) -> Result<LoginAttempt> {
        let mut tracker = QrStateTracker::new(qr.baseline);
        loop {
            sleep(self.ctx.settings.qr_poll_interval).await;

            let report = match self.ctx.client.query_qr_status(&qr.sig).await {
                Ok(r) => r,
                Err(e) => {
                    debug!("qr status query failed: {e}");
                    continue;
                }
            };
            if !tracker.advance(report.status) {
                continue;
            }

            match report.status {
                QrStatus::Canceled => {
                    warn!("QR code scan was canceled by the user.");
                    return Err(Error::Terminated(Termination::QrCanceled));
                }
                QrStatus::Timeout => {
                    warn!("QR code expired.");
                    return Err(Error::Terminated(Termination::QrExpired));
                }
                QrStatus::WaitingForConfirm => {
                    info!("scanned, confirm the login on your phone.");
                }
                QrStatus::Confirmed => {
                    let Some(info) = report.login_info else {
                        warn!("QR code was confirmed but the status carried no login info.");
                        return Err(Error::Decode(
                            "confirmed qr status without login info".to_string(),
                        ));
                    };
                    return self.ctx.client.qr_login(&info).await;
                }
                QrStatus::ImageFetch | QrStatus::WaitingForScan => {}
            }
        }
    }
}
