use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the job lifecycle components.
///
/// Defaults reproduce the unbounded behaviour of the provider clients: no
/// limit on operation polls and no limit on listing pages.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Interval between polls of a long-running start operation, in
    /// milliseconds.
    pub operation_poll_interval_ms: u64,
    /// Maximum number of operation polls before a wait-mode launch gives up.
    pub max_operation_polls: Option<u32>,
    /// Maximum number of pages read from a single listing.
    pub max_list_pages: Option<u32>,
}

impl OrchestratorConfig {
    pub fn operation_poll_interval(&self) -> Duration {
        Duration::from_millis(self.operation_poll_interval_ms)
    }

    pub fn with_operation_poll_interval(mut self, ms: u64) -> Self {
        self.operation_poll_interval_ms = ms;
        self
    }

    pub fn with_max_operation_polls(mut self, polls: u32) -> Self {
        self.max_operation_polls = Some(polls);
        self
    }

    pub fn with_max_list_pages(mut self, pages: u32) -> Self {
        self.max_list_pages = Some(pages);
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            operation_poll_interval_ms: 1000,
            max_operation_polls: None,
            max_list_pages: None,
        }
    }
}

/// How the batch workflow waits between creating a job and inspecting it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PollingStrategy {
    /// Sleep for `BatchConfig::poll_delay_seconds` once, then inspect.
    FixedDelay,
    /// Poll the job state until it is terminal or attempts run out.
    UntilTerminal { interval_ms: u64, max_attempts: u32 },
}

/// Configuration for the batch workflow.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Fixed delay between job creation and result inspection, in seconds.
    pub poll_delay_seconds: u64,
    /// Waiting strategy; the fixed delay unless overridden.
    pub strategy: PollingStrategy,
    /// Delete the job once it has been inspected.
    pub delete_after_inspection: bool,
}

impl BatchConfig {
    pub fn poll_delay(&self) -> Duration {
        Duration::from_secs(self.poll_delay_seconds)
    }

    pub fn with_poll_delay_seconds(mut self, seconds: u64) -> Self {
        self.poll_delay_seconds = seconds;
        self
    }

    pub fn with_strategy(mut self, strategy: PollingStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            poll_delay_seconds: 30,
            strategy: PollingStrategy::FixedDelay,
            delete_after_inspection: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_defaults_to_thirty_second_fixed_delay() {
        let config = BatchConfig::default();
        assert_eq!(config.poll_delay(), Duration::from_secs(30));
        assert_eq!(config.strategy, PollingStrategy::FixedDelay);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: OrchestratorConfig =
            serde_json::from_str(r#"{"max_operation_polls": 5}"#).unwrap();
        assert_eq!(config.max_operation_polls, Some(5));
        assert_eq!(config.operation_poll_interval_ms, 1000);
        assert!(config.max_list_pages.is_none());
    }

    #[test]
    fn strategy_is_tagged() {
        let config: BatchConfig = serde_json::from_str(
            r#"{"strategy": {"type": "until_terminal", "interval_ms": 10, "max_attempts": 3}}"#,
        )
        .unwrap();
        assert_eq!(
            config.strategy,
            PollingStrategy::UntilTerminal {
                interval_ms: 10,
                max_attempts: 3
            }
        );
        assert_eq!(config.poll_delay_seconds, 30);
    }
}
