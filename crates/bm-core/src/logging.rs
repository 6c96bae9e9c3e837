use tracing_subscriber::EnvFilter;

/// Initialize tracing for a service. `LOG_FORMAT=text` switches the JSON
/// output to a human-readable format for local runs.
pub fn init(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let text = std::env::var("LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("text"))
        .unwrap_or(false);
    if text {
        builder.init();
    } else {
        builder.json().init();
    }

    tracing::info!(service = service_name, "logging initialized");
}
