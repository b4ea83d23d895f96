use std::{collections::HashMap, env, fs, path::Path, path::PathBuf, time::Duration};

use url::Url;

use crate::{
    connectivity::DEFAULT_RETRY_INTERVAL,
    domain::{DeviceIdentity, SignServiceConfig},
    errors::Error,
    login::LoginSettings,
    Result,
};

pub const DEFAULT_CAPTCHA_BROKER: &str = "https://captcha.go-cqhttp.org";

/// Typed configuration for the login process.
#[derive(Clone, Debug)]
pub struct Config {
    // Signing service
    pub sign_server: Option<SignServiceConfig>,
    pub sign_server_key: String,

    // Device / account
    pub device: DeviceIdentity,
    pub uin: Option<i64>,
    pub qimei36: String,

    // Login negotiation
    pub captcha_broker_url: Url,
    pub artifact_dir: PathBuf,
    pub login: LoginSettings,

    // Runtime constants
    pub http_timeout: Duration,
    pub connect_retry_interval: Duration,
}

impl Config {
    /// Process env first, then `./.env` for keys the env does not set.
    pub fn load() -> Result<Self> {
        let dotenv = fs::read_to_string(Path::new(".env"))
            .map(|contents| parse_dotenv(&contents))
            .unwrap_or_default();
        Self::from_lookup(|key| env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let sign_server = match get("SIGN_SERVER_URL") {
            Some(raw) => Some(SignServiceConfig {
                base_url: parse_url("SIGN_SERVER_URL", &raw)?,
                legacy_protocol_mode: get("SIGN_SERVER_LEGACY")
                    .map(|s| parse_bool(&s))
                    .unwrap_or(false),
            }),
            None => None,
        };
        let sign_server_key = get("SIGN_SERVER_KEY").unwrap_or_default();

        let device = DeviceIdentity {
            android_id: parse_hex("DEVICE_ANDROID_ID", get("DEVICE_ANDROID_ID"))?,
            guid: parse_hex("DEVICE_GUID", get("DEVICE_GUID"))?,
        };

        // 0 means "not configured", same as an absent value.
        let uin = match get("ACCOUNT_UIN") {
            Some(raw) => {
                let n = raw.trim().parse::<i64>().map_err(|e| {
                    Error::Config(format!("ACCOUNT_UIN must be a number: {e}"))
                })?;
                (n != 0).then_some(n)
            }
            None => None,
        };
        let qimei36 = get("DEVICE_QIMEI36").unwrap_or_default();

        let captcha_broker_url = parse_url(
            "CAPTCHA_BROKER_URL",
            &get("CAPTCHA_BROKER_URL").unwrap_or_else(|| DEFAULT_CAPTCHA_BROKER.to_string()),
        )?;
        let artifact_dir = PathBuf::from(get("ARTIFACT_DIR").unwrap_or_else(|| ".".to_string()));

        let http_timeout = Duration::from_millis(
            get("HTTP_TIMEOUT_MS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(10_000),
        );

        Ok(Self {
            sign_server,
            sign_server_key,
            device,
            uin,
            qimei36,
            captcha_broker_url,
            artifact_dir,
            login: LoginSettings::default(),
            http_timeout,
            connect_retry_interval: DEFAULT_RETRY_INTERVAL,
        })
    }
}

/// `KEY=value` pairs from a dotenv file. Blank lines, comments and keyless
/// lines are skipped; one level of matching quotes is stripped.
fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .filter(|(k, _)| !k.trim().is_empty())
        .map(|(k, v)| (k.trim().to_string(), unquote(v.trim()).to_string()))
        .collect()
}

fn unquote(v: &str) -> &str {
    for q in ['"', '\''] {
        if v.len() >= 2 && v.starts_with(q) && v.ends_with(q) {
            return &v[1..v.len() - 1];
        }
    }
    v
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_url(key: &str, raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| Error::Config(format!("{key} is not a valid URL: {e}")))
}

fn parse_hex(key: &str, v: Option<String>) -> Result<Vec<u8>> {
    let Some(v) = v else {
        return Ok(Vec::new());
    };
    hex::decode(v.trim()).map_err(|e| Error::Config(format!("{key} must be hex: {e}")))
}
