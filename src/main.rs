/*!
 * memscavd - Main Entry Point
 *
 * Loads the RAM map, discovers hidden memory blocks and publishes the
 * control surface on a Unix socket. Nothing is published unless start-up
 * completes.
 */

use std::sync::Arc;
use tracing::{error, info};

use memscav::core::lifecycle::wait_for_unload;
use memscav::{
    init_tracing, ControlSurface, Lifecycle, LinuxPlatform, ScavengerConfig, ScavengerError,
    ScavengerResult,
};

#[tokio::main]
async fn main() -> ScavengerResult<()> {
    let config = ScavengerConfig::load()?;
    init_tracing(config.trace_json);

    info!("memscavd starting...");

    let platform = LinuxPlatform::from_config(&config).map_err(|e| {
        error!(error = %e, "Failed to read host memory layout");
        e
    })?;

    let lifecycle = Arc::new(Lifecycle::new());
    let scavenger = platform
        .into_builder(&config, lifecycle.clone())
        .build()
        .map_err(|e| {
            error!(error = %e, "Start-up failed");
            e
        })?;

    info!(
        block_size = scavenger.block_size().get(),
        ranges = scavenger.ranges().len(),
        hidden_blocks = scavenger.hidden_count(),
        "Scavenger initialized"
    );

    let surface = ControlSurface::new(Arc::new(scavenger), config.report_capacity);
    let socket_path = config.socket_path.clone();

    let server = tokio::spawn(async move {
        let shutdown = wait_for_unload(lifecycle, tokio::signal::ctrl_c);
        memscav::control::serve(surface, &socket_path, shutdown).await
    });

    server
        .await
        .map_err(|e| ScavengerError::Io(std::io::Error::other(e)))??;
    info!("memscavd stopped");
    Ok(())
}
