//! Memory clock sensor.

use super::{field, settle, SensorSource};
use crate::memo::Memoized;
use crate::platform::Platform;
use std::sync::Arc;

/// Memory clock in MHz. Read once, then served from cache.
pub struct MemoryClockSpeed {
    platform: Arc<dyn Platform>,
    memo: Memoized,
    last: f64,
}

impl MemoryClockSpeed {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            memo: Memoized::new("memory clock"),
            last: f64::NAN,
        }
    }
}

impl SensorSource for MemoryClockSpeed {
    fn id(&self) -> &str {
        "MemoryClockSpeed"
    }

    fn numeric(&mut self) -> f64 {
        let result = self.memo.get_or_try(|| self.platform.memory_clock());
        self.last = settle("MemoryClockSpeed", result);
        self.last
    }

    fn text(&self) -> String {
        format!("{} MHz", field(self.last, 4, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::ScriptedPlatform;
    use crate::Error;

    #[test]
    fn test_cached_value_wins_over_later_failure() {
        let platform = Arc::new(ScriptedPlatform::with_values([3200.0, 0.0]));
        let mut sensor = MemoryClockSpeed::new(platform.clone());
        assert_eq!(sensor.numeric(), 3200.0);
        assert_eq!(sensor.numeric(), 3200.0);
        assert_eq!(platform.reads(), 1);
        assert_eq!(sensor.text(), "3200 MHz");
    }

    #[test]
    fn test_zero_is_retried() {
        let platform = Arc::new(ScriptedPlatform::default());
        platform.push(Ok(0.0));
        platform.push(Err(Error::CommandTimeout {
            command: "dmidecode".into(),
            timeout: std::time::Duration::from_secs(5),
        }));
        platform.push(Ok(2666.0));
        let mut sensor = MemoryClockSpeed::new(platform.clone());

        assert_eq!(sensor.numeric(), 0.0);
        assert!(sensor.numeric().is_nan());
        assert_eq!(sensor.text(), " N/A MHz");
        assert_eq!(sensor.numeric(), 2666.0);
        assert_eq!(platform.reads(), 3);
    }

    #[test]
    fn test_has_no_history() {
        let sensor = MemoryClockSpeed::new(Arc::new(ScriptedPlatform::default()));
        assert!(sensor.history().is_none());
    }
}
