use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

use kube_converge::domain::settings::Settings;
use kube_converge::logger;

/// Converges a set of hosts into a Kubernetes cluster. Safe to re-run.
#[derive(Parser, Debug)]
#[command(name = "kube-converge", version, about)]
struct Cli {
    /// Node file listing the cluster hosts (YAML or JSON).
    #[arg(short, long, default_value = "config/kubernetes-setup.yml")]
    config: PathBuf,

    /// Optional settings file overriding the defaults.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Local path the cluster admin kubeconfig is copied to.
    #[arg(long)]
    kubeconfig: Option<String>,

    /// Maximum number of concurrent remote operations.
    #[arg(long)]
    pool_size: Option<usize>,

    /// Timeout for a single remote call, in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Drop unreachable nodes from every later step instead of only reporting them.
    #[arg(long)]
    exclude_unreachable: bool,

    #[arg(long)]
    log_level: Option<LevelFilter>,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut dto = Settings::load_dto(self.settings.as_deref()).context("could not read settings")?;

        if let Some(path) = &self.kubeconfig {
            dto.kubeconfig_path = path.clone();
        }
        if let Some(pool_size) = self.pool_size {
            dto.pool_size = pool_size;
        }
        if let Some(timeout) = self.timeout {
            dto.remote_timeout_secs = timeout;
        }
        if self.exclude_unreachable {
            dto.liveness_policy = "exclude".to_string();
        }

        Settings::try_from(dto).context("invalid settings")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.log_level);

    let settings = cli.settings()?;
    log::info!("Converging cluster described in '{}'.", cli.config.display());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping after in-flight remote calls are cancelled.");
            on_interrupt.cancel();
        }
    });

    let report = kube_converge::converge(&cli.config, settings, cancel)
        .await
        .with_context(|| format!("convergence of '{}' failed", cli.config.display()))?;

    if report.is_converged() {
        log::info!("Cluster was already converged, nothing to do.");
    } else {
        log::info!("Cluster converged, {} step(s) made changes.", report.executed().count());
    }

    Ok(())
}
