use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flow-transaction-service")]
#[command(about = "Dispatches Flow transactions from a pool of leased proposer keys", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Log filters: a level, optionally followed by `crate=level` entries
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Also write rolling log files into this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Print the proposer key leases and exit
    #[arg(long)]
    pub leases: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn apply_to_env(&self) {
        if let Some(config_path) = &self.config {
            std::env::set_var(flowtx_core::infrastructure::config::CONFIG_PATH_ENV, config_path);
        }

        if let Some(data_dir) = &self.data_dir {
            std::env::set_var(flowtx_core::infrastructure::config::DATA_DIR_ENV, data_dir);
        }
    }
}
