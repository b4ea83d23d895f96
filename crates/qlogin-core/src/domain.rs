use url::Url;

/// Device identity presented to the signing service. Fixed for the process lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub android_id: Vec<u8>,
    pub guid: Vec<u8>,
}

/// Where the signing service lives and which parameter set it speaks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignServiceConfig {
    pub base_url: Url,
    /// Older services accept a reduced parameter set and have no `/register`.
    pub legacy_protocol_mode: bool,
}

/// Output of the delegated `sign` operation. Any field may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignedPacket {
    pub sign: Vec<u8>,
    pub extra: Vec<u8>,
    pub token: Vec<u8>,
}

/// Challenge or failure reported by the protocol client for a login attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoginErrorKind {
    SliderChallenge,
    ImageCaptchaChallenge,
    SmsChallenge,
    SmsOrQrChallenge,
    UnsafeDevice,
    OtherFailure,
    UnknownFailure,
    TooManySmsRequests,
}

/// Opaque token the protocol client hands out with an image captcha.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptchaToken(pub Vec<u8>);

/// Result of a login or challenge resubmission.
///
/// `error == None` means the login succeeded; the remaining fields are only
/// meaningful for the failure kind that populated them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginAttempt {
    pub error: Option<LoginErrorKind>,
    pub code: i32,
    pub error_message: String,
    pub verify_url: Option<String>,
    pub captcha_image: Option<Vec<u8>>,
    pub captcha_token: Option<CaptchaToken>,
    pub sms_phone: Option<String>,
}

impl LoginAttempt {
    pub fn succeeded() -> Self {
        Self::default()
    }

    pub fn failed(kind: LoginErrorKind) -> Self {
        Self {
            error: Some(kind),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn with_code(mut self, code: i32, message: impl Into<String>) -> Self {
        self.code = code;
        self.error_message = message.into();
        self
    }

    pub fn with_verify_url(mut self, url: impl Into<String>) -> Self {
        self.verify_url = Some(url.into());
        self
    }

    pub fn with_captcha(mut self, image: Vec<u8>, token: CaptchaToken) -> Self {
        self.captcha_image = Some(image);
        self.captcha_token = Some(token);
        self
    }

    pub fn with_sms_phone(mut self, phone: impl Into<String>) -> Self {
        self.sms_phone = Some(phone.into());
        self
    }
}

/// QR negotiation progress as reported by the protocol client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QrStatus {
    ImageFetch,
    WaitingForScan,
    WaitingForConfirm,
    Confirmed,
    Canceled,
    Timeout,
}

/// Opaque confirmation payload exchanged for a session once the QR code is confirmed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QrLoginInfo(pub Vec<u8>);

/// A freshly fetched QR code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrCode {
    pub image: Vec<u8>,
    pub sig: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrStatusReport {
    pub status: QrStatus,
    /// Present once `status == Confirmed`.
    pub login_info: Option<QrLoginInfo>,
}
