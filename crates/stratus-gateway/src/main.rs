//! Stratus gateway entry point.
//!
//! Loads settings and starts the axum-based HTTP gateway service.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STRATUS_CONFIG` | `stratus.yaml` | Settings file, unless given as the first argument. |
//! | `STRATUS_LOG_FORMAT` | *(text)* | `json` switches to JSON log lines. |
//! | `RUST_LOG` | `stratus_gateway=info` | Log filter directives. |
//! | `STRATUS__<SECTION>__<KEY>` | *(none)* | Overrides a settings value, e.g. `STRATUS__SERVER__PORT`. |

use stratus_gateway::server::GatewayServer;
use stratus_gateway::settings::GatewaySettings;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "stratus.yaml";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stratus_gateway=info"));
    let json = std::env::var("STRATUS_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("STRATUS_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let settings = match GatewaySettings::load(&config_path) {
        Ok(s) => s,
        Err(e) => {
            error!(path = %config_path, error = %e, "failed to load settings");
            std::process::exit(1);
        }
    };

    info!(
        path = %config_path,
        port = settings.server.port,
        key_gate = settings.api_key_gate.is_some(),
        jwt = settings.auth.jwt.is_some(),
        "Stratus gateway configuration loaded"
    );

    if let Err(e) = GatewayServer::new(settings).start().await {
        error!(error = %e, "gateway stopped");
        std::process::exit(1);
    }
}
