use std::sync::Arc;

use anyhow::Result;
use cloud_usage::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("{}", version::banner());

    let app_config = config::AppConfig::load()?;
    let rows = input::load_rows(&app_config.input.path)?;
    tracing::info!(rows = rows.len(), input = %app_config.input.path, "loaded billing export");

    let resolver = Arc::new(domain_cache::StaticDomainResolver::new(
        app_config.domains.clone(),
    ));
    let mut domains = domain_cache::DomainCache::new(resolver);

    let mut licensing = licensing::Licensing::from_config(&app_config.licensing)?;
    let mut summary = app_config
        .summary
        .as_ref()
        .map(|s| summary::Summary::new(&s.project_id_column, &s.cost_column, &s.group_by));

    for row in &rows {
        licensing.ingest(row, &mut domains).await;
        if let Some(summary) = summary.as_mut() {
            summary.ingest(row, &mut domains).await;
        }
    }
    tracing::info!(domains = domains.len(), "resolved domains");

    print!("{}", licensing.output());
    if let Some(summary) = summary {
        print!(
            "{}",
            summary.output(&app_config.input.path, chrono::Utc::now().naive_utc())
        );
    }

    Ok(())
}
