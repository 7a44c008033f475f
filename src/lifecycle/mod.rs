//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Load RSA key → Build pipeline → Start listener + session sweeper
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl+C / SIGTERM / Shutdown::trigger → Stop sweeper → Stop accepting → Drain in-flight requests → Exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
