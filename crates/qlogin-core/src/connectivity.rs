//! Startup gate that waits for the signing service to accept TCP connections.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{net::TcpStream, sync::oneshot, time::sleep};
use tracing::{info, warn};
use url::Url;

use crate::{errors::Error, ports::Dialer, Result};

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Plain TCP dialer; the probe connection is dropped as soon as it opens.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, addr: &str) -> std::io::Result<()> {
        let stream = TcpStream::connect(addr).await?;
        drop(stream);
        Ok(())
    }
}

/// Blocks until an endpoint is reachable. Proves reachability only, not protocol health.
#[derive(Clone)]
pub struct ConnectivityWaiter {
    dialer: Arc<dyn Dialer>,
    retry_interval: Duration,
}

impl ConnectivityWaiter {
    pub fn new(dialer: Arc<dyn Dialer>, retry_interval: Duration) -> Self {
        Self {
            dialer,
            retry_interval,
        }
    }

    pub fn tcp() -> Self {
        Self::new(Arc::new(TcpDialer), DEFAULT_RETRY_INTERVAL)
    }

    /// Dial `endpoint` until it answers, retrying forever every `retry_interval`.
    ///
    /// The probe loop runs as its own task and signals completion once.
    pub async fn wait_until_reachable(&self, endpoint: &Url) -> Result<()> {
        let addr = dial_address(endpoint)?;
        let dialer = self.dialer.clone();
        let interval = self.retry_interval;
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                match dialer.dial(&addr).await {
                    Ok(()) => break,
                    Err(e) => {
                        warn!("failed to connect to sign server: {e}");
                        sleep(interval).await;
                    }
                }
            }
            let _ = done_tx.send(());
        });

        done_rx
            .await
            .map_err(|_| Error::External("connectivity probe task ended unexpectedly".to_string()))?;
        info!("connected to sign server: {endpoint}");
        Ok(())
    }
}

/// `host:port` for a URL, falling back to the scheme's default port.
pub fn dial_address(endpoint: &Url) -> Result<String> {
    let host = endpoint
        .host_str()
        .ok_or_else(|| Error::Config(format!("sign server URL has no host: {endpoint}")))?;
    let port = endpoint
        .port_or_known_default()
        .ok_or_else(|| Error::Config(format!("sign server URL has no port: {endpoint}")))?;
    // IPv6 literals come back bracketed from `host_str`, which `connect` accepts.
    Ok(format!("{host}:{port}"))
}
