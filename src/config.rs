use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-tick time budget, small enough to keep a 60 fps view smooth
pub const DEFAULT_TICK_BUDGET: Duration = Duration::from_millis(12);

/// Tunables for a search session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Longest a single scan tick may keep the thread
    #[serde(with = "millis")]
    pub tick_budget: Duration,

    /// Select the first match as soon as a scan completes
    pub auto_select_first: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tick_budget: DEFAULT_TICK_BUDGET,
            auto_select_first: false,
        }
    }
}

impl SearchConfig {
    pub fn with_budget_ms(mut self, ms: u64) -> Self {
        self.tick_budget = Duration::from_millis(ms);
        self
    }

    pub fn with_auto_select(mut self, auto_select_first: bool) -> Self {
        self.auto_select_first = auto_select_first;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.tick_budget, Duration::from_millis(12));
        assert!(!config.auto_select_first);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SearchConfig = serde_json::from_str(r#"{"tick_budget": 4}"#).unwrap();
        assert_eq!(config.tick_budget, Duration::from_millis(4));
        assert!(!config.auto_select_first);
    }

    #[test]
    fn test_builders() {
        let config = SearchConfig::default().with_budget_ms(30).with_auto_select(true);
        assert_eq!(config.tick_budget, Duration::from_millis(30));
        assert!(config.auto_select_first);
    }
}
