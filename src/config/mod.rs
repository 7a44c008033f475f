//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → copied into the pipeline stages at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the encryption switch is
//!   toggled at runtime, through the settings provider
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CaptchaConfig, EncryptionConfig, GatewayConfig, ListenerConfig, ObservabilityConfig,
    SecurityConfig, SessionConfig, TimeoutConfig, UpstreamConfig,
};
