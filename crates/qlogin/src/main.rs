use std::process::ExitCode;

use anyhow::Context;
use qlogin_core::config::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let outcome = run().await;
    let status = qlogin::exit_status(&outcome);
    match &outcome {
        Err(e) if status != 0 => error!("{e:#}"),
        _ => {}
    }
    ExitCode::from(status)
}

async fn run() -> anyhow::Result<()> {
    qlogin_core::logging::init("qlogin")?;

    let cfg = Config::load().context("load config")?;
    if qlogin::prepare_sign_server(&cfg).await?.is_none() {
        info!("no sign server configured, nothing to prepare");
    }
    Ok(())
}
