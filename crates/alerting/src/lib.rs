//! Alerting System
//!
//! Maps the time since the subject last looked at the camera onto an
//! attention status, and counts lapse episodes.

mod manager;

pub use manager::{AlertConfig, AlertError, AlertManager, AttentionStatus};
