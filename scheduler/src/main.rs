use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use scheduler::cloud::{CloudApi, GatewayClient};
use scheduler::config::ConfigManager;
use scheduler::fleet::FleetTransitionController;
use scheduler::metrics::MetricsSink;
use scheduler::runner::ScheduleRunner;
use scheduler::schedule::ScheduleDefaults;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("scheduler=info".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting fleet start/stop scheduler");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/scheduler.toml".to_string());
    let config_manager = ConfigManager::new(&config_path).await?;
    let config = config_manager.get_current_config();
    info!(
        "Configuration loaded: {}m granularity, {} configured regions, group support: {}, database support: {}",
        config.schedule.granularity_minutes,
        config.cloud.regions.len(),
        config.fleet.group_support,
        config.database.enabled
    );

    let defaults = ScheduleDefaults::from_config(&config.schedule)?;

    let api: Arc<dyn CloudApi> = Arc::new(GatewayClient::new(&config.cloud)?);
    info!("Cloud gateway client initialized: {}", config.cloud.gateway_url);

    let metrics = Arc::new(MetricsSink::new(config.metrics.endpoint.clone()));
    if metrics.is_enabled() {
        info!("Metrics sink enabled: {}", config.metrics.endpoint);
    } else {
        info!("Metrics sink disabled");
    }

    let fleet = FleetTransitionController::new(
        api.clone(),
        Duration::from_secs(config.fleet.poll_interval_seconds),
        Duration::from_secs(config.fleet.poll_timeout_seconds),
    );

    let runner = ScheduleRunner::new(config.clone(), defaults, api, fleet, metrics);

    // One evaluation per granularity window; the window width and the
    // invocation cadence are the same setting.
    let cadence = Duration::from_secs(u64::from(config.schedule.granularity_minutes) * 60);
    info!("Evaluation cadence: {:?}", cadence);

    let mut interval = tokio::time::interval(cadence);
    loop {
        interval.tick().await;

        let report = runner.run_cycle().await;
        info!(
            "Cycle {} finished: {} started, {} stopped, {} errors across {} regions",
            report.cycle_id,
            report.total_started(),
            report.total_stopped(),
            report.total_errors(),
            report.regions.len()
        );

        for region in &report.regions {
            for e in &region.errors {
                error!("[{}] {}", region.region, e);
            }
        }
    }
}
