use crate::Environment;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Production keeps the facade's lifecycle events (create, drop, insert
/// counts) and the degraded-read warnings; per-call debug lines stay off.
const PRODUCTION_FILTER: &str = "warn,domain_milvus=info,axum_helpers=info,tower_http=info";

const DEVELOPMENT_FILTER: &str = "info,domain_milvus=debug,tower_http=debug,hyper_util=info,reqwest=info";

/// Installs the color-eyre report hook for startup failures.
///
/// The env section stays off: the process environment carries
/// `MILVUS_PASSWORD`.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

fn default_directives(environment: &Environment) -> &'static str {
    if environment.is_production() {
        PRODUCTION_FILTER
    } else {
        DEVELOPMENT_FILTER
    }
}

/// Builds the filter, letting `RUST_LOG` replace the per-environment default.
pub fn env_filter(environment: &Environment) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(environment)))
}

/// Sets up the global subscriber: flattened JSON in production, pretty
/// output otherwise. Both carry an `ErrorLayer` so `eyre` reports include
/// the `collection` spans opened by the Milvus facade.
///
/// JSON events keep their target and current span, which is what log
/// queries filter on (`target = "domain_milvus::registry"`,
/// `span.collection = "docs"`). Later calls are no-ops.
pub fn init_tracing(environment: &Environment) {
    let filter = env_filter(environment);

    let installed = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().pretty().with_file(false).with_line_number(false))
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    if installed.is_ok() {
        tracing::info!(environment = ?environment, "Tracing initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_follow_environment() {
        assert!(default_directives(&Environment::Production).contains("domain_milvus=info"));
        assert!(default_directives(&Environment::Development).contains("domain_milvus=debug"));
    }

    #[test]
    fn test_default_directives_parse() {
        for env in [Environment::Production, Environment::Development] {
            assert!(EnvFilter::try_new(default_directives(&env)).is_ok());
        }
    }

    #[test]
    fn test_rust_log_replaces_default_filter() {
        temp_env::with_var("RUST_LOG", Some("domain_milvus=trace"), || {
            let filter = env_filter(&Environment::Production);
            assert!(filter.to_string().contains("domain_milvus=trace"));
            assert!(!filter.to_string().contains("tower_http"));
        });
    }

    #[test]
    fn test_unset_rust_log_uses_environment_default() {
        temp_env::with_var_unset("RUST_LOG", || {
            let filter = env_filter(&Environment::Development);
            assert!(filter.to_string().contains("domain_milvus=debug"));
        });
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing(&Environment::Development);
        init_tracing(&Environment::Production);
    }
}
