//! Remove daily log files older than the retention window.

use clap::Parser;
use std::process::ExitCode;
use zocalo_log::LogRetention;

/// Delete old `<prefix>.<date>.log` files
#[derive(Parser)]
#[command(name = "clean-logs")]
#[command(version)]
#[command(about = "Delete daily log files older than the retention window")]
struct Cli {
    /// Directory holding the log files
    #[arg(long, env = "LOG_DIR", default_value = "logs")]
    dir: String,

    /// File name prefix of the daily logs
    #[arg(long, default_value = "app")]
    prefix: String,

    /// Keep files modified within this many days
    #[arg(long, env = "LOG_RETENTION_DAYS", default_value_t = 7)]
    days: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let retention = LogRetention::new(&cli.dir, &cli.prefix).max_age_days(cli.days);

    match retention.clean_old_logs() {
        Ok(removed) => {
            println!(
                "Removed {} log file(s) older than {} day(s) from {}",
                removed, cli.days, cli.dir
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("clean-logs: {}", e);
            ExitCode::FAILURE
        }
    }
}
