//! Sign server adapter.
//!
//! Delegates packet signing to an external HTTP service: `custom_energy`,
//! `sign` and `register`. Payloads travel hex-encoded inside JSON envelopes.

use std::time::Duration;

use qlogin_core::{
    domain::{DeviceIdentity, SignServiceConfig, SignedPacket},
    errors::Error,
    Result,
};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct SignServiceClient {
    base: String,
    legacy: bool,
    device: DeviceIdentity,
    http: reqwest::Client,
}

impl SignServiceClient {
    pub fn new(cfg: &SignServiceConfig, device: DeviceIdentity, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;

        let mut base = cfg.base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            base,
            legacy: cfg.legacy_protocol_mode,
            device,
            http,
        })
    }

    /// Server base URL, always with a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// T544 energy for `data_id`.
    pub async fn energy(&self, uin: u64, data_id: &str, salt: &[u8]) -> Result<Vec<u8>> {
        let mut query = vec![
            ("data", data_id.to_string()),
            ("salt", hex::encode(salt)),
        ];
        if !self.legacy {
            query.push(("uin", uin.to_string()));
            query.push(("android_id", hex::encode(&self.device.android_id)));
            query.push(("guid", hex::encode(&self.device.guid)));
        }

        let body = self
            .fetch(self.http.get(self.endpoint("custom_energy")).query(&query))
            .await
            .map_err(|e| {
                warn!("failed to get T544 sign: {e} server: {}", self.base);
                e
            })?;

        let v: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            warn!("failed to get T544 sign: {e}");
            Error::Decode(format!("energy response is not json: {e}"))
        })?;
        let data = hex::decode(str_at(&v, &["data"])).map_err(|e| {
            warn!("failed to get T544 sign: {e}");
            Error::Decode(format!("energy data is not hex: {e}"))
        })?;
        if data.is_empty() {
            warn!("failed to get T544 sign: data is empty");
            return Err(Error::EmptyPayload);
        }
        Ok(data)
    }

    /// SSO sign for one outgoing packet.
    ///
    /// Only a transport failure is an error. A missing or malformed field comes
    /// back empty.
    pub async fn sign(
        &self,
        seq: u64,
        uin: &str,
        cmd: &str,
        qua: &str,
        buffer: &[u8],
    ) -> Result<SignedPacket> {
        let form = [
            ("uin", uin.to_string()),
            ("qua", qua.to_string()),
            ("cmd", cmd.to_string()),
            ("seq", seq.to_string()),
            ("buffer", hex::encode(buffer)),
        ];

        let body = self
            .fetch(self.http.post(self.endpoint("sign")).form(&form))
            .await
            .map_err(|e| {
                warn!("failed to get sso sign: {e} server: {}", self.base);
                e
            })?;

        let v: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();
        let field = |name: &str| hex::decode(str_at(&v, &["data", name])).unwrap_or_default();
        Ok(SignedPacket {
            sign: field("sign"),
            extra: field("extra"),
            token: field("token"),
        })
    }

    /// Register this client instance. Skipped entirely in legacy mode.
    pub async fn register(
        &self,
        uin: i64,
        android_id: &[u8],
        guid: &[u8],
        qimei36: &str,
        key: &str,
    ) -> Result<()> {
        if self.legacy {
            warn!("sign server predates instance registration, skipping register");
            return Ok(());
        }

        let query = [
            ("uin", uin.to_string()),
            ("android_id", hex::encode(android_id)),
            ("guid", hex::encode(guid)),
            ("qimei36", qimei36.to_string()),
            ("key", key.to_string()),
        ];
        let body = self
            .fetch(self.http.get(self.endpoint("register")).query(&query))
            .await
            .map_err(|e| {
                warn!("failed to register instance: {e} server: {}", self.base);
                e
            })?;

        let v: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| Error::Decode(format!("register response is not json: {e}")))?;
        let msg = str_at(&v, &["msg"]).to_string();
        let code = v.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        if code != 0 {
            warn!("failed to register instance: {msg} server: {}", self.base);
            return Err(Error::Rejected { code, message: msg });
        }

        info!("registered instance {uin}: {msg}");
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn fetch(&self, req: reqwest::RequestBuilder) -> Result<Vec<u8>> {
        let transport = |e: reqwest::Error| Error::Transport {
            url: self.base.clone(),
            message: e.to_string(),
        };
        let resp = req
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport)?;
        let bytes = resp.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

/// String at a JSON path, or "" when absent or not a string.
fn str_at<'a>(v: &'a serde_json::Value, path: &[&str]) -> &'a str {
    path.iter()
        .try_fold(v, |cur, key| cur.get(*key))
        .and_then(|x| x.as_str())
        .unwrap_or("")
}
