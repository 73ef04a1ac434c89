use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured logging on stderr.
///
/// stdout belongs to the board display, so logs never go there. `RUST_LOG`
/// overrides `log_level` when set.
pub fn init_telemetry(log_level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }

    tracing::info!("Stageboard telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking the log lines of one tick
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one poll cycle of a display client
pub fn create_tick_span(client_id: &str, tick: u64, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "poll_tick",
        client.id = client_id,
        tick = tick,
        correlation.id = correlation_id,
    )
}

pub fn shutdown_telemetry() {
    tracing::info!("Stageboard telemetry shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique() {
        let a = generate_correlation_id();
        let b = generate_correlation_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
