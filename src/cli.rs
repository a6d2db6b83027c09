use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;

use crate::config::{ProbeConfig, DEFAULT_WATCH_DIR};

#[derive(Parser)]
#[command(name = "watchprobe")]
#[command(version)]
#[command(about = "Check whether native file system events reach a docs live-reload tool")]
#[command(long_about = "WatchProbe watches a directory first with the operating system's native change notifications and then by polling, prints every change it sees, and compares the two counts to tell whether live-reload failures come from the OS event mechanism or from the live-reload tool's configuration.")]
pub struct Cli {
    /// Directory to watch for changes
    #[arg(value_name = "DIRECTORY", help = "Directory to watch (defaults to ./docs)")]
    pub path: Option<PathBuf>,

    /// Polling interval in milliseconds (for the polling session)
    #[arg(long, default_value = "1000", help = "Polling interval in ms")]
    pub poll_interval: u64,

    /// Disable colors in output
    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Cli {
    pub fn get_watch_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WATCH_DIR))
    }

    pub fn to_config(&self) -> ProbeConfig {
        ProbeConfig::default()
            .with_watch_path(self.get_watch_path())
            .with_poll_interval(Duration::from_millis(self.poll_interval))
            .with_color(!self.no_color)
    }

    pub fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}
