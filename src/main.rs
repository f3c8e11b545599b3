use std::sync::Arc;

use anyhow::Context;
use lms_launch::{
    cli::config_path_from_args,
    config::Config,
    launch::routes::{LaunchViews, build_default_dispatcher},
    logging::init_tracing,
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let _logging_guard = init_tracing(&config.logging)?;

    let views = LaunchViews::from_config(&config).context("failed to wire launch views")?;
    let dispatcher =
        build_default_dispatcher(views).context("failed to build launch dispatcher")?;
    tracing::info!(
        target: "server",
        routes = dispatcher.routes().count(),
        config = %config_path.display(),
        "launch_dispatcher_ready"
    );

    server::run(&config.server, Arc::new(dispatcher)).await
}
