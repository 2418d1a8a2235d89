use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;
use crate::tasks::deadlines;

pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = tokio::spawn(deadline_loop(state.clone(), shutdown_rx));

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    if let Err(err) = sweeper.await {
        tracing::error!(error = %err, "Background task join failed");
    }

    Ok(())
}

async fn deadline_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let period = state.settings().grading().deadline_sweep_interval_seconds;
    let mut tick = interval(Duration::from_secs(period));

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = deadlines::force_submit_overdue(&state).await {
                    tracing::error!(error = %err, "force_submit_overdue failed");
                }
            }
        }
    }
}
