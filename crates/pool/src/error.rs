//! Pool error types shared across the session subsystem.

use thiserror::Error;

use crate::factory::{TeardownStep, WorkerKind};

/// Convenience result alias for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors surfaced by session pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
	/// Capacity reached even after an on-demand idle sweep.
	#[error("session pool exhausted: all {limit} slots are in use by active sessions")]
	Exhausted {
		/// Configured `maxSessions` limit.
		limit: usize,
	},

	/// The referenced session id is unknown or already closed.
	#[error("no session with id {id}")]
	SessionNotFound {
		/// Identifier the caller supplied.
		id: String,
	},

	/// Worker creation failed inside the injected factory.
	#[error("failed to launch {kind} worker ({in_use}/{limit} sessions in use): {source}")]
	Factory {
		/// Requested worker variant.
		kind: WorkerKind,
		/// Registry occupancy at the time of the attempt.
		in_use: usize,
		/// Configured `maxSessions` limit.
		limit: usize,
		#[source]
		source: anyhow::Error,
	},

	/// A graceful teardown step failed; the session record remains until a
	/// forced close or reaper sweep resolves it.
	#[error("teardown step `{step}` failed for session {id}: {source}")]
	Teardown {
		/// Session being closed.
		id: String,
		/// The failing teardown stage.
		step: TeardownStep,
		#[source]
		source: anyhow::Error,
	},

	/// Pool configuration rejected by validation.
	#[error("invalid pool configuration: {0}")]
	Config(String),

	/// Filesystem error while loading configuration.
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// JSON error while parsing configuration.
	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
	use anyhow::anyhow;

	use super::*;

	#[test]
	fn exhausted_names_the_configured_limit() {
		let err = PoolError::Exhausted { limit: 10 };
		assert_eq!(err.to_string(), "session pool exhausted: all 10 slots are in use by active sessions");
	}

	#[test]
	fn not_found_names_the_requested_id() {
		let err = PoolError::SessionNotFound { id: "abc-123".to_string() };
		assert_eq!(err.to_string(), "no session with id abc-123");
	}

	#[test]
	fn factory_error_reports_variant_and_occupancy() {
		let err = PoolError::Factory {
			kind: WorkerKind::Firefox,
			in_use: 3,
			limit: 10,
			source: anyhow!("driver missing"),
		};
		assert_eq!(err.to_string(), "failed to launch firefox worker (3/10 sessions in use): driver missing");
	}

	#[test]
	fn teardown_error_names_the_failing_step() {
		let err = PoolError::Teardown {
			id: "abc-123".to_string(),
			step: TeardownStep::Context,
			source: anyhow!("target closed"),
		};
		assert_eq!(err.to_string(), "teardown step `context` failed for session abc-123: target closed");
	}
}
