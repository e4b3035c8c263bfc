//! Pool configuration schema and file loading.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, Result};
use crate::factory::{LaunchParams, LaunchRequest, Viewport, WorkerKind};

/// Default maximum number of concurrently pooled sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10;
/// Default idle threshold before a session becomes reclaimable (30 minutes).
pub const DEFAULT_MAX_IDLE_TIME_MS: u64 = 30 * 60 * 1000;
/// Default period between background reaper sweeps (5 minutes).
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 5 * 60 * 1000;
/// Default worker launch timeout forwarded to the factory.
pub const DEFAULT_LAUNCH_TIMEOUT_MS: u64 = 30_000;

/// Tuning knobs for the session pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolConfig {
	/// Maximum number of concurrently live sessions.
	pub max_sessions: usize,
	/// Idle duration after which a session becomes reclaimable.
	pub max_idle_time_ms: u64,
	/// Period between background reaper sweeps.
	pub cleanup_interval_ms: u64,
	/// Launch defaults applied to requests that leave fields unset.
	pub defaults: LaunchDefaults,
}

impl Default for PoolConfig {
	fn default() -> Self {
		Self {
			max_sessions: DEFAULT_MAX_SESSIONS,
			max_idle_time_ms: DEFAULT_MAX_IDLE_TIME_MS,
			cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
			defaults: LaunchDefaults::default(),
		}
	}
}

/// Launch defaults merged into under-specified requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchDefaults {
	/// Browser engine used when the request names none.
	pub kind: WorkerKind,
	/// Headless mode used when the request names none.
	pub headless: bool,
	/// Viewport used when the request names none.
	pub viewport: Option<Viewport>,
	/// User-agent override used when the request names none.
	pub user_agent: Option<String>,
	/// Launch timeout used when the request names none.
	pub timeout_ms: u64,
}

impl Default for LaunchDefaults {
	fn default() -> Self {
		Self {
			kind: WorkerKind::default(),
			headless: true,
			viewport: None,
			user_agent: None,
			timeout_ms: DEFAULT_LAUNCH_TIMEOUT_MS,
		}
	}
}

impl PoolConfig {
	/// Loads and validates configuration from a JSON file.
	pub fn from_file(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path)?;
		let config: Self = serde_json::from_str(&raw)?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects values the pool cannot operate with.
	pub fn validate(&self) -> Result<()> {
		if self.max_sessions == 0 {
			return Err(PoolError::Config("maxSessions must be at least 1".to_string()));
		}
		if self.max_idle_time_ms == 0 {
			return Err(PoolError::Config("maxIdleTimeMs must be positive".to_string()));
		}
		if self.cleanup_interval_ms == 0 {
			return Err(PoolError::Config("cleanupIntervalMs must be positive".to_string()));
		}
		Ok(())
	}

	/// Idle threshold as a duration.
	pub fn max_idle_time(&self) -> Duration {
		Duration::from_millis(self.max_idle_time_ms)
	}

	/// Reaper period as a duration.
	pub fn cleanup_interval(&self) -> Duration {
		Duration::from_millis(self.cleanup_interval_ms)
	}

	/// Resolves a request into effective launch parameters.
	pub fn effective_params(&self, request: LaunchRequest) -> LaunchParams {
		LaunchParams {
			kind: request.kind.unwrap_or(self.defaults.kind),
			headless: request.headless.unwrap_or(self.defaults.headless),
			viewport: request.viewport.or(self.defaults.viewport),
			user_agent: request.user_agent.or_else(|| self.defaults.user_agent.clone()),
			timeout_ms: request.timeout_ms.unwrap_or(self.defaults.timeout_ms),
			owner_tag: request.owner_tag,
		}
	}
}
