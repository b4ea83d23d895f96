//! Process wiring for hosts that own a concrete [`LoginClient`].
//!
//! The binary only prepares the sign server; a host with a protocol client
//! calls [`run_login`] and hands the outcome to [`exit_status`].

use std::sync::Arc;

use qlogin_console::{ConsoleOperator, FsArtifacts};
use qlogin_core::{
    config::Config,
    connectivity::{ConnectivityWaiter, TcpDialer},
    login::{broker::HttpTicketBroker, ChallengeResolver, LoginContext, LoginOrchestrator},
    ports::{LoginClient, Operator},
    Error, Result,
};
use qlogin_sign::SignServiceClient;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginMode {
    Password,
    QrCode,
}

/// Block until the sign server answers, then register this instance when a
/// uin is configured. Returns `None` when no sign server is configured.
pub async fn prepare_sign_server(cfg: &Config) -> Result<Option<SignServiceClient>> {
    let Some(sign_cfg) = cfg.sign_server.as_ref() else {
        return Ok(None);
    };

    ConnectivityWaiter::new(Arc::new(TcpDialer), cfg.connect_retry_interval)
        .wait_until_reachable(&sign_cfg.base_url)
        .await?;

    let signer = SignServiceClient::new(sign_cfg, cfg.device.clone(), cfg.http_timeout)?;

    if let Some(uin) = cfg.uin {
        // Registration problems are logged by the client; startup continues regardless.
        if let Err(e) = signer
            .register(
                uin,
                &cfg.device.android_id,
                &cfg.device.guid,
                &cfg.qimei36,
                &cfg.sign_server_key,
            )
            .await
        {
            warn!("continuing without instance registration: {e}");
        }
    }

    Ok(Some(signer))
}

/// Wire the login state machine with the configured broker, artifact
/// directory and timings.
pub fn orchestrator(
    client: Arc<dyn LoginClient>,
    operator: Arc<dyn Operator>,
    cfg: &Config,
) -> Result<LoginOrchestrator> {
    let broker = HttpTicketBroker::new(cfg.captcha_broker_url.clone(), cfg.http_timeout)?;
    let broker_url = broker.base_url().clone();

    let ctx = LoginContext::new(
        client,
        operator.clone(),
        Arc::new(FsArtifacts::new(&cfg.artifact_dir)),
    )
    .with_settings(cfg.login);
    let resolver = ChallengeResolver::new(operator, Arc::new(broker), broker_url, cfg.login);

    Ok(LoginOrchestrator::new(ctx, resolver))
}

/// Run a full login negotiation with the operator on stdin.
pub async fn run_login(client: Arc<dyn LoginClient>, cfg: &Config, mode: LoginMode) -> Result<()> {
    let login = orchestrator(client, Arc::new(ConsoleOperator::stdin()), cfg)?;
    match mode {
        LoginMode::Password => login.login_with_password().await,
        LoginMode::QrCode => login.login_with_qr().await,
    }
}

/// Exit status for a finished run. Terminations were already explained to the
/// operator, so they stop the process cleanly.
pub fn exit_status(outcome: &anyhow::Result<()>) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(e) if e.is_clean_exit() => 0,
            _ => 1,
        },
    }
}
