//! In-memory fakes for the login ports.

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    domain::*,
    errors::Error,
    ports::{ArtifactStore, LoginClient, Operator, TicketBroker},
    Result,
};

pub(crate) struct ScriptedOperator {
    interactive: bool,
    lines: Mutex<VecDeque<String>>,
    reads: AtomicUsize,
}

impl ScriptedOperator {
    pub(crate) fn interactive(lines: &[&str]) -> Self {
        Self {
            interactive: true,
            lines: Mutex::new(lines.iter().map(|s| s.to_string()).collect()),
            reads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn unattended() -> Self {
        Self {
            interactive: false,
            lines: Mutex::new(VecDeque::new()),
            reads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn pop(&self) -> Option<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.lines.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    async fn read_line(&self) -> String {
        self.pop().unwrap_or_default()
    }

    async fn read_line_timeout(&self, timeout: Duration) -> Option<String> {
        match self.pop() {
            Some(line) => Some(line),
            None => {
                tokio::time::sleep(timeout).await;
                None
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingArtifacts {
    pub(crate) saved: Mutex<Vec<(String, Vec<u8>)>>,
    pub(crate) removed: Mutex<Vec<String>>,
    pub(crate) rendered: AtomicUsize,
}

impl ArtifactStore for RecordingArtifacts {
    fn save(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((name.to_string(), data.to_vec()));
        Ok(PathBuf::from(name))
    }

    fn remove(&self, name: &str) {
        self.removed.lock().unwrap().push(name.to_string());
    }

    fn render_qr(&self, _image: &[u8]) {
        self.rendered.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct ScriptedBroker {
    replies: Mutex<VecDeque<Result<Option<String>>>>,
    calls: AtomicUsize,
}

impl ScriptedBroker {
    pub(crate) fn with(replies: Vec<Result<Option<String>>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TicketBroker for ScriptedBroker {
    async fn fetch_ticket(&self, _id: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}

/// Protocol client that replays scripted attempts and records every call.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    pub(crate) uin: Option<i64>,
    pub(crate) sms_accepted: bool,
    attempts: Mutex<VecDeque<LoginAttempt>>,
    qr_statuses: Mutex<VecDeque<Result<QrStatusReport>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub(crate) fn with_attempts(attempts: Vec<LoginAttempt>) -> Self {
        Self {
            sms_accepted: true,
            attempts: Mutex::new(attempts.into()),
            ..Self::default()
        }
    }

    pub(crate) fn with_qr_statuses(mut self, statuses: Vec<Result<QrStatusReport>>) -> Self {
        self.qr_statuses = Mutex::new(statuses.into());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_attempt(&self) -> Result<LoginAttempt> {
        self.attempts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::External("no scripted attempt left".to_string()))
    }
}

pub(crate) fn status(status: QrStatus) -> Result<QrStatusReport> {
    let login_info = (status == QrStatus::Confirmed).then(|| QrLoginInfo(vec![7, 7]));
    Ok(QrStatusReport { status, login_info })
}

#[async_trait]
impl LoginClient for ScriptedClient {
    fn uin(&self) -> Option<i64> {
        self.uin
    }

    async fn login(&self) -> Result<LoginAttempt> {
        self.record("login".to_string());
        self.next_attempt()
    }

    async fn fetch_qr_code(&self) -> Result<QrCode> {
        self.record("fetch_qr".to_string());
        Ok(QrCode {
            image: vec![0x89, b'P', b'N', b'G'],
            sig: vec![1, 2, 3],
        })
    }

    async fn query_qr_status(&self, sig: &[u8]) -> Result<QrStatusReport> {
        assert_eq!(sig, &[1, 2, 3]);
        self.record("query_qr".to_string());
        self.qr_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| status(QrStatus::WaitingForScan))
    }

    async fn qr_login(&self, info: &QrLoginInfo) -> Result<LoginAttempt> {
        self.record(format!("qr_login:{}", hex::encode(&info.0)));
        self.next_attempt()
    }

    async fn submit_ticket(&self, ticket: &str) -> Result<LoginAttempt> {
        self.record(format!("ticket:{ticket}"));
        self.next_attempt()
    }

    async fn submit_captcha(&self, text: &str, token: &CaptchaToken) -> Result<LoginAttempt> {
        self.record(format!("captcha:{text}:{}", hex::encode(&token.0)));
        self.next_attempt()
    }

    async fn request_sms(&self) -> Result<bool> {
        self.record("request_sms".to_string());
        Ok(self.sms_accepted)
    }

    async fn submit_sms(&self, code: &str) -> Result<LoginAttempt> {
        self.record(format!("sms:{code}"));
        self.next_attempt()
    }
}
