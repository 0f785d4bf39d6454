//! Engine configuration
//!
//! Defines all tunable parameters of the engine: where the job API lives,
//! where local state is persisted, poll pacing and UI-facing delays.

use std::path::PathBuf;
use std::time::Duration;

use crate::scheduler::PollTiming;

/// Default job API location
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Engine configuration
///
/// All intervals are configurable so pacing can be tuned per deployment
/// (local runner vs. a shared one behind a slow link).
#[derive(Debug, Clone)]
pub struct Config {
    /// Job API base URL (e.g., "http://127.0.0.1:8000")
    pub api_url: String,

    /// Directory holding persisted console state
    pub state_dir: PathBuf,

    /// Poll pacing
    pub poll: PollTiming,

    /// Debounce applied to log buffer writes
    pub log_write_delay: Duration,

    /// How long a success/error badge stays on an action before reverting to idle
    pub status_reset_delay: Duration,

    /// Maximum number of stories to request
    pub story_limit: Option<usize>,

    /// Quick owner shortcut names to request aggregates for
    pub quick_owners: Vec<String>,
}

impl Config {
    /// Creates a configuration with defaults
    pub fn new(api_url: String, state_dir: PathBuf) -> Self {
        Self {
            api_url,
            state_dir,
            poll: PollTiming::default(),
            log_write_delay: Duration::from_millis(250),
            status_reset_delay: Duration::from_millis(1600),
            story_limit: None,
            quick_owners: Vec::new(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - JOBDECK_API_URL (default: http://127.0.0.1:8000)
    /// - JOBDECK_STATE_DIR (default: platform state dir + /jobdeck)
    /// - JOBDECK_POLL_BASE_MS (default: 1500)
    /// - JOBDECK_POLL_INCREMENT_MS (default: 1500)
    /// - JOBDECK_POLL_MAX_MS (default: 10000)
    /// - JOBDECK_LOG_WRITE_DELAY_MS (default: 250)
    /// - JOBDECK_STATUS_RESET_MS (default: 1600)
    /// - JOBDECK_STORY_LIMIT (default: unset)
    /// - JOBDECK_QUICK_OWNERS (comma separated, default: none)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let api_url = std::env::var("JOBDECK_API_URL").unwrap_or(defaults.api_url);

        let state_dir = std::env::var_os("JOBDECK_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.state_dir);

        let poll = PollTiming {
            base: env_millis("JOBDECK_POLL_BASE_MS")?.unwrap_or(defaults.poll.base),
            increment: env_millis("JOBDECK_POLL_INCREMENT_MS")?
                .unwrap_or(defaults.poll.increment),
            max: env_millis("JOBDECK_POLL_MAX_MS")?.unwrap_or(defaults.poll.max),
        };

        let log_write_delay =
            env_millis("JOBDECK_LOG_WRITE_DELAY_MS")?.unwrap_or(defaults.log_write_delay);

        let status_reset_delay =
            env_millis("JOBDECK_STATUS_RESET_MS")?.unwrap_or(defaults.status_reset_delay);

        let story_limit = match std::env::var("JOBDECK_STORY_LIMIT") {
            Ok(raw) => Some(
                raw.parse::<usize>()
                    .map_err(|_| anyhow::anyhow!("JOBDECK_STORY_LIMIT must be a number"))?,
            ),
            Err(_) => None,
        };

        let quick_owners = std::env::var("JOBDECK_QUICK_OWNERS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();

        Ok(Self {
            api_url,
            state_dir,
            poll,
            log_write_delay,
            status_reset_delay,
            story_limit,
            quick_owners,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.poll.base.is_zero() {
            anyhow::bail!("poll base interval must be greater than 0");
        }

        if self.poll.base > self.poll.max {
            anyhow::bail!("poll base interval cannot exceed the maximum interval");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let state_dir = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|dir| dir.join("jobdeck"))
            .unwrap_or_else(|| PathBuf::from(".jobdeck"));

        Self::new(DEFAULT_API_URL.to_string(), state_dir)
    }
}

fn env_millis(name: &str) -> anyhow::Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| anyhow::anyhow!("{} must be a number of milliseconds", name)),
        Err(_) => Ok(None),
    }
}

/// Split a comma separated list, dropping blanks
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
