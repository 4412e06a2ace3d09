#![forbid(unsafe_code)]

mod config;
mod setup;
mod status;

use arbor_core::model::ReadinessState;
use arbor_gate::{BootstrapGate, ChangeOriginRegistry, GateConfig};
use arbor_storage::APP_DB_VERSION;
use config::NodeConfig;
use status::StatusReport;
use std::sync::Arc;

const NODE_NAME: &str = "arbor_node";
const NODE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage() -> &'static str {
    "arbor_node: local document store host\n\n\
USAGE:\n\
  arbor_node [--data-dir DIR] [--setup-username NAME] [--log-level LEVEL] [--status]\n\
\n\
FLAGS:\n\
  --data-dir DIR          Store directory (env ARBOR_DATA_DIR, default .arbor)\n\
  --setup-username NAME   Complete user setup for a new store (env ARBOR_SETUP_USERNAME)\n\
  --log-level LEVEL       Log filter, e.g. info or arbor_gate=debug (env ARBOR_LOG)\n\
  --status                Print store status as JSON without modifying it, then exit\n\
  -h, --help              Print this help and exit\n\
  -V, --version           Print version and exit\n"
}

fn version_line() -> String {
    format!("{NODE_NAME} {NODE_VERSION} db_version={APP_DB_VERSION}")
}

fn init_logger(config: &NodeConfig) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = config.log_level.as_deref() {
        builder.parse_filters(level);
    }
    builder.init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = std::env::args().collect::<Vec<_>>();
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print!("{}", usage());
        return Ok(());
    }
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        println!("{}", version_line());
        return Ok(());
    }

    let config = NodeConfig::from_process();
    init_logger(&config);

    if config.status_only {
        if config.setup_username.is_some() {
            log::warn!("--status is read-only; ignoring setup username");
        }
        let report = match StatusReport::inspect(&config.data_dir, APP_DB_VERSION) {
            Ok(report) => report,
            Err(err) => {
                log::error!("cannot inspect store: {err}");
                std::process::exit(1);
            }
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let gate = BootstrapGate::new(GateConfig::new(&config.data_dir));
    let registry = Arc::new(ChangeOriginRegistry::new(gate.clone()));
    let persist_origin = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.persist_current_when_ready().await })
    };

    let bootstrap = {
        let gate = gate.clone();
        tokio::task::spawn_blocking(move || gate.start_bootstrap())
    };
    let mut state = match bootstrap.await? {
        Ok(state) => state,
        Err(err) if err.is_fatal() => {
            log::error!("store bootstrap failed: {err}");
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    if state == ReadinessState::AwaitingUserSetup
        && let Some(username) = config.setup_username.as_deref()
    {
        state = setup::complete_user_setup(&gate, username)?;
    }

    let report = StatusReport::collect(&gate, &registry)?;
    if let Some(reason) = report.blocked_reason() {
        log::warn!("startup blocked in state {state}: {reason}");
    }

    tokio::select! {
        ready = gate.await_ready() => {
            ready?;
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("shutdown requested before the store became ready");
            return Ok(());
        }
    }

    if let Err(err) = persist_origin.await? {
        log::error!("cannot record process origin: {err}");
        std::process::exit(1);
    }
    log::info!(
        "store ready in {}; origin id={}",
        config.data_dir.display(),
        registry.current_origin()
    );

    tokio::signal::ctrl_c().await?;
    log::info!("shutting down");
    Ok(())
}
