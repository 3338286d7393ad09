use clap::Args;
use keel_admin::{AdminConfig, AdminService};
use tracing::info;

#[derive(Debug, Args)]
pub(crate) struct Monitor {
    #[arg(long, help = "Report topics with more unconsumed messages than this")]
    threshold: Option<u64>,
    #[arg(long, help = "Seconds between two scans")]
    interval: Option<u64>,
}

impl Monitor {
    /// Forces the scan on, with any thresholds given on the command line.
    pub(crate) fn apply(&self, config: &mut AdminConfig) {
        config.monitor.enabled = true;
        if let Some(threshold) = self.threshold {
            config.monitor.accumulate_threshold = threshold;
        }
        if let Some(interval) = self.interval {
            config.monitor.scan_interval_seconds = interval;
        }
    }
}

/// Keeps the scheduled scan running until Ctrl-C.
pub(crate) async fn run(service: &AdminService) -> anyhow::Result<()> {
    let monitor = &service.config().monitor;
    println!(
        "Monitoring message accumulation over {} every {}s, press Ctrl-C to stop",
        monitor.accumulate_threshold, monitor.scan_interval_seconds
    );
    tokio::signal::ctrl_c().await?;
    info!("interrupted, stopping monitor");
    Ok(())
}
