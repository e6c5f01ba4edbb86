//! kindex: keeps the MeteoAgent K-index readings fresh and logs them.
//!
//! Configuration comes from `KINDEX_*` environment variables, logging from
//! `RUST_LOG`. Runs until Ctrl-C.

use std::sync::Arc;

use tracing::{info, warn};

use kindex::{Config, KIndexSensor, MeteoAgentClient, RefreshCoordinator, spawn_refresh_loop};

#[tokio::main]
async fn main() -> kindex::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kindex=info".into()),
        )
        .with_target(true)
        .init();

    let config = Config::from_env()?;
    info!(
        endpoint = %config.endpoint,
        timeout_secs = config.timeout.as_secs(),
        refresh_secs = config.refresh_interval.as_secs(),
        "starting K-index service"
    );

    let client = MeteoAgentClient::new(&config)?;
    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::new(client),
        config.refresh_interval,
    ));
    let sensors = KIndexSensor::all();

    if let Err(err) = coordinator.first_refresh().await {
        warn!(error = %err, "initial K-index refresh failed, sensors unavailable until next cycle");
    }
    report(&coordinator, &sensors);

    let mut updates = coordinator.subscribe();
    // The first refresh already ran, so the loop's immediate tick is skipped as not due.
    let task = spawn_refresh_loop(Arc::clone(&coordinator));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                report(&coordinator, &sensors);
            }
        }
    }

    task.shutdown();
    let metrics = coordinator.metrics();
    info!(
        metrics = %serde_json::to_string(&metrics).unwrap_or_default(),
        "K-index service stopped"
    );
    Ok(())
}

fn report(coordinator: &RefreshCoordinator, sensors: &[KIndexSensor]) {
    for sensor in sensors {
        let state = sensor.state(coordinator);
        match state.value {
            Some(value) => info!(
                sensor = %state.unique_id,
                value,
                unit = state.unit,
                severity = state.attributes["severity"].as_str().unwrap_or_default(),
                "{}",
                state.name
            ),
            None => info!(sensor = %state.unique_id, "{}: unavailable", state.name),
        }
    }
}
