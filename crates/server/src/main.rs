//! statusfeed-server: HTTP trigger for change-gated incident ingestion.
//!
//! Every request to `/` fetches the incidents feed, compares its digest with
//! the stored fingerprint and, if it changed, appends the snapshot to the
//! warehouse table before storing the new fingerprint.

mod api;
mod router;
mod startup;
mod state;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use statusfeed_core::config::load_dotenv;
use statusfeed_core::Config;

// ── CLI ─────────────────────────────────────────────────────────────

/// Flags override the environment (and the active profile).
#[derive(Parser, Debug)]
#[command(name = "statusfeed-server", version, about)]
struct Cli {
    /// Listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Warehouse dataset.
    #[arg(long = "bq-dataset", alias = "bqDataset")]
    bq_dataset: Option<String>,

    /// Warehouse table.
    #[arg(long = "bq-table", alias = "bqTable")]
    bq_table: Option<String>,

    /// Warehouse project id.
    #[arg(long = "bq-project-id", alias = "bqProjectID")]
    bq_project_id: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dataset) = self.bq_dataset {
            config.warehouse.dataset = dataset;
        }
        if let Some(table) = self.bq_table {
            config.warehouse.table = table;
        }
        if let Some(project_id) = self.bq_project_id {
            config.warehouse.project_id = project_id;
        }
    }
}

// ── main ────────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    init_tracing();

    let mut config = Config::from_env();
    Cli::parse().apply(&mut config);
    config.validate()?;
    config.log_summary();

    let state = startup::build_app_state(&config)?;
    let app = router::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }

    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut config = Config::for_profile("CLI_TEST_UNUSED");
        let cli = Cli::try_parse_from([
            "statusfeed-server",
            "--port",
            "9090",
            "--bq-dataset",
            "ops",
            "--bq-table",
            "incidents",
            "--bq-project-id",
            "acme",
        ])
        .unwrap();

        cli.apply(&mut config);

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.warehouse.table_path(), "acme.ops.incidents");
    }

    #[test]
    fn camel_case_flag_spellings_are_accepted() {
        let mut config = Config::for_profile("CLI_TEST_UNUSED");
        let cli = Cli::try_parse_from([
            "statusfeed-server",
            "--bqDataset",
            "ops",
            "--bqTable",
            "incidents",
            "--bqProjectID",
            "acme",
        ])
        .unwrap();

        cli.apply(&mut config);

        assert_eq!(config.warehouse.table_path(), "acme.ops.incidents");
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let mut config = Config::for_profile("CLI_TEST_UNUSED");
        let before = config.warehouse.table.clone();

        Cli::try_parse_from(["statusfeed-server"]).unwrap().apply(&mut config);

        assert_eq!(config.warehouse.table, before);
    }
}
