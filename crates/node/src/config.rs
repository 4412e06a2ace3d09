#![forbid(unsafe_code)]

use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = ".arbor";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodeConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) setup_username: Option<String>,
    pub(crate) log_level: Option<String>,
    pub(crate) status_only: bool,
}

impl NodeConfig {
    pub(crate) fn from_process() -> Self {
        let args = std::env::args().skip(1).collect::<Vec<_>>();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// CLI flags win over environment variables.
    pub(crate) fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = flag_value(args, "--data-dir")
            .or_else(|| env("ARBOR_DATA_DIR"))
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let setup_username = flag_value(args, "--setup-username")
            .or_else(|| env("ARBOR_SETUP_USERNAME"))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let log_level = flag_value(args, "--log-level")
            .or_else(|| env("ARBOR_LOG"))
            .filter(|value| !value.trim().is_empty());
        let status_only = args.iter().any(|arg| arg.as_str() == "--status");

        Self {
            data_dir,
            setup_username,
            log_level,
            status_only,
        }
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        if arg.as_str() == flag
            && let Some(value) = args.next()
        {
            return Some(value.clone());
        }
    }
    None
}
