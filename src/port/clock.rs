//! Time and request-id sources, swappable for deterministic tests.

use chrono::Utc;

/// Source of the `timestamp` query parameter.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn unix_timestamp(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn unix_timestamp(&self) -> i64 {
        self.0
    }
}

/// Source of the `requestid` query parameter.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Always returns the same id.
#[derive(Debug, Clone)]
pub struct FixedId(pub String);

impl IdGenerator for FixedId {
    fn next_id(&self) -> String {
        self.0.clone()
    }
}
