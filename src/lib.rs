pub mod api;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod models;
pub mod prediction;
pub mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

pub use core_state::StartupError;

/// Load settings, open the store, load the model and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = config::Settings::load()?;
    tracing::info!(
        data_dir = %settings.storage.data_dir.display(),
        model_dir = %settings.model.dir.display(),
        frontend_dir = %settings.frontend.dir.display(),
        "Settings loaded"
    );
    if settings.auth.password_iterations < crypto::PBKDF2_ITERATIONS {
        tracing::warn!(
            iterations = settings.auth.password_iterations,
            "Password hashing below the recommended iteration count"
        );
    }

    let core = Arc::new(core_state::CoreState::initialize(settings)?);
    let mut server = api::start_server(core).await?;
    tracing::info!(addr = %server.addr, "Listening");

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    server.stopped().await;
    Ok(())
}
