use anyhow::Context;
use solarsite::config::Config;
use solarsite::kernel::state::StepStatus;
use solarsite::services::BackendClient;
use solarsite::solar::SunPosition;
use solarsite::SiteReactor;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Slider position used for the summary overlay.
const SUMMARY_HOUR: f64 = 15.0;
const SUMMARY_MONTH: u32 = 12;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    // 2. Config + Backend
    let config = Config::from_env().context("invalid SOLARSITE_* environment")?;
    let client = BackendClient::new(&config);
    tracing::info!("Assessing site {:.4}, {:.4} via {}", config.latitude, config.longitude, client.base_url());

    let mut reactor = SiteReactor::new(config);
    let ticket = reactor.begin_run();

    // 3. Ctrl+C cancels the run (idle, not an error)
    let stop = ticket.token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.cancel();
        }
    });

    let outcome = reactor.drive_run(&client, &ticket).await;
    tracing::info!("Stream ended: {:?}, agent state {:?}", outcome, reactor.agent_state());

    // 4. Summary
    for step in reactor.agent.steps() {
        let mark = match step.status {
            StepStatus::Done => "done",
            StepStatus::Running => "running",
            StepStatus::Pending => "pending",
        };
        tracing::info!("  {:<28} {}", step.tool, mark);
    }
    if let Some(err) = reactor.agent.error() {
        tracing::warn!("Agent error: {}", err);
    }

    if let Some(grid) = reactor.panel_grid_preview() {
        tracing::info!("Grid preview: {} rows x {} cols ({} panels)", grid.n_rows, grid.n_cols, grid.len());
    }

    let sun = SunPosition::at(SUMMARY_HOUR, SUMMARY_MONTH, reactor.site_latitude());
    let shadows = reactor.shadow_overlay(SUMMARY_HOUR, SUMMARY_MONTH);
    tracing::info!(
        "Sun at {:.0}h month {}: elevation {:.1}°, azimuth {:.1}° -> {} shadow bands",
        SUMMARY_HOUR,
        SUMMARY_MONTH,
        sun.elevation_deg,
        sun.azimuth_deg,
        shadows.len()
    );

    let snap = reactor.telemetry.snapshot();
    tracing::info!("Dropped agent frames: {}", snap.agent.dropped_frames);

    Ok(())
}
