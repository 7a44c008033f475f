//! System settings consulted per request.

use std::sync::atomic::{AtomicBool, Ordering};

/// Exposes switches that administrators can flip while the gateway runs.
pub trait SettingsProvider: Send + Sync {
    fn payload_encryption_enabled(&self) -> bool;
}

/// Settings held in memory, seeded from configuration.
#[derive(Debug, Default)]
pub struct SystemSettings {
    payload_encryption: AtomicBool,
}

impl SystemSettings {
    pub fn new(payload_encryption: bool) -> Self {
        Self {
            payload_encryption: AtomicBool::new(payload_encryption),
        }
    }

    pub fn set_payload_encryption(&self, enabled: bool) {
        self.payload_encryption.store(enabled, Ordering::Relaxed);
        tracing::info!(enabled, "Payload encryption switched");
    }
}

impl SettingsProvider for SystemSettings {
    fn payload_encryption_enabled(&self) -> bool {
        self.payload_encryption.load(Ordering::Relaxed)
    }
}
