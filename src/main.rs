use std::error::Error;

use chat_llm_service::telemetry;
use tracing::Level;
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file.
    // Fails if .env file not found, not readable or invalid.
    dotenvy::dotenv()?;

    // Global filter from RUST_LOG, with the LLM service crate raised to
    // DEBUG so provider traffic is visible by default.
    let env_filter = telemetry::env_filter_with_level("info", Level::DEBUG);

    // The service crate gets its own scoped layer (timestamps, file:line,
    // span durations); everything else goes through the plain layer.
    let outside_llm_service =
        filter::filter_fn(|meta| !meta.target().starts_with(telemetry::TARGET_PREFIX));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry::layer())
        .with(fmt::layer().with_target(false).with_filter(outside_llm_service))
        .init();

    api::start().await?;

    Ok(())
}
