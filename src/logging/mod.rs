//! Structured logging helpers
//!
//! Filter construction for `tracing-subscriber`, request IDs and the opt-in
//! message preview attached to routing logs.

pub mod fields;

pub use fields::{generate_request_id, preview_message};

/// Build filter directives string from LoggingConfig
///
/// Component levels are scoped to this crate's modules, so
/// `{ circuit = "debug" }` becomes `llm_router::circuit=debug`.
///
/// # Examples
///
/// ```
/// use llm_router::config::LoggingConfig;
/// use llm_router::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config.component_levels.insert("routing".to_string(), "debug".to_string());
/// config.component_levels.insert("circuit".to_string(), "trace".to_string());
///
/// assert_eq!(
///     build_filter_directives(&config),
///     "info,llm_router::circuit=trace,llm_router::routing=debug"
/// );
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    for (component, level) in &config.component_levels {
        filter_str.push_str(&format!(",llm_router::{}={}", component, level));
    }

    filter_str
}
