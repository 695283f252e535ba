pub mod config;
pub mod http_server;
pub mod process;
pub mod state;

pub use config::Config as GatewayConfig;
pub use process::{init_logging, spawn_service};
pub use state::State as ServiceState;
