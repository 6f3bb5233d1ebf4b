//! OpenTelemetry conventions shared by the encoders.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Convert nanoseconds since Unix epoch to SystemTime.
#[inline(always)]
pub fn nanos_to_system_time(nanos: u64) -> SystemTime {
    let secs = nanos / 1_000_000_000;
    let subsec_nanos = (nanos % 1_000_000_000) as u32;
    UNIX_EPOCH + Duration::new(secs, subsec_nanos)
}

/// Convert SystemTime to nanoseconds since Unix epoch.
///
/// Times before the epoch map to 0.
#[inline(always)]
pub fn system_time_to_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Semantic convention keys for resource attributes.
pub mod attributes {
    pub const SERVICE_NAME: &str = "service.name";
    pub const SERVICE_VERSION: &str = "service.version";
    pub const SERVICE_NAMESPACE: &str = "service.namespace";

    pub const TELEMETRY_SDK_NAME: &str = "telemetry.sdk.name";
    pub const TELEMETRY_SDK_LANGUAGE: &str = "telemetry.sdk.language";
    pub const TELEMETRY_SDK_VERSION: &str = "telemetry.sdk.version";
}
