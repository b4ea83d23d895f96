/// Core error type for the login and signing stack.
///
/// Adapter crates map their specific errors into this type so the hosting
/// process can tell a clean, operator-acknowledged stop from a real failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {message} (server: {url})")]
    Transport { url: String, message: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("sign server returned an empty payload")]
    EmptyPayload,

    #[error("sign server rejected the request: {message} (code {code})")]
    Rejected { code: i64, message: String },

    #[error("sms request error")]
    SmsRequestFailed,

    #[error("login stopped: {0}")]
    Terminated(Termination),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// A termination is a deliberate stop after the operator has been told why.
    pub fn is_clean_exit(&self) -> bool {
        matches!(self, Error::Terminated(_))
    }
}

/// Why the login negotiation gave up.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Termination {
    #[error("slider ticket could not be obtained")]
    SliderUnresolved,

    #[error("device lock requires verification at {verify_url}")]
    UnsafeDevice { verify_url: String },

    #[error("login failed: {message} (code {code})")]
    LoginFailed { code: i32, message: String },

    #[error("qr code scan was canceled")]
    QrCanceled,

    #[error("qr code expired")]
    QrExpired,
}

pub type Result<T> = std::result::Result<T, Error>;
