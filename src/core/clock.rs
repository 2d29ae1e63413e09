use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::time::Duration;

/// Monotonic host timestamp in milliseconds.
///
/// The host owns the clock; the core only compares timestamps it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is in the future.
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let ms = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_since() {
        let a = Timestamp::from_millis(1_000);
        let b = Timestamp::from_millis(1_250);

        assert_eq!(b.saturating_since(a), Duration::from_millis(250));
        assert_eq!(a.saturating_since(b), Duration::ZERO);
    }

    #[test]
    fn test_add_duration() {
        let t = Timestamp::from_millis(500) + Duration::from_millis(150);
        assert_eq!(t.as_millis(), 650);

        let saturated = Timestamp::from_millis(u64::MAX - 1) + Duration::from_secs(10);
        assert_eq!(saturated.as_millis(), u64::MAX);
    }
}
