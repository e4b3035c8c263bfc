//! Ordered worker teardown with per-step failure capture.
//!
//! Teardown is a tagged sequence of stages (page, context, browser) rather
//! than nested try/catch chains: every stage is attempted regardless of
//! earlier failures, and the outcome is a list of `(step, error)` pairs for
//! diagnostics.

use std::sync::Arc;

use tracing::warn;

use crate::factory::{TeardownStep, WorkerHandle};

/// Failure of one teardown stage.
pub(crate) struct StepFailure {
	pub step: TeardownStep,
	pub error: anyhow::Error,
}

/// Attempts every teardown stage in order, collecting failures.
pub(crate) async fn run(handle: &Arc<dyn WorkerHandle>) -> Vec<StepFailure> {
	let mut failures = Vec::new();
	for step in TeardownStep::ORDER {
		let result = match step {
			TeardownStep::Page => handle.close_page().await,
			TeardownStep::Context => handle.close_context().await,
			TeardownStep::Browser => handle.close_browser().await,
		};
		if let Err(error) = result {
			failures.push(StepFailure { step, error });
		}
	}
	failures
}

/// Logs swallowed failures on forced teardown paths.
pub(crate) fn log_swallowed(id: &str, failures: &[StepFailure]) {
	for failure in failures {
		warn!(
			target = "bw.pool",
			session = %id,
			step = %failure.step,
			error = %failure.error,
			"ignoring teardown failure on forced close"
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::PoolConfig;
	use crate::factory::{LaunchRequest, WorkerFactory};
	use crate::testing::FakeFactory;

	async fn fake_handle(factory: &FakeFactory) -> Arc<dyn WorkerHandle> {
		let params = PoolConfig::default().effective_params(LaunchRequest::default());
		Arc::from(factory.create(&params).await.expect("fake create should succeed"))
	}

	#[tokio::test]
	async fn all_stages_run_in_order_on_success() {
		let factory = FakeFactory::new();
		let handle = fake_handle(&factory).await;

		let failures = run(&handle).await;
		assert!(failures.is_empty());
		assert!(!handle.is_live(), "browser stage shuts the worker down");

		let steps: Vec<TeardownStep> = factory.closed_steps().into_iter().map(|(_, step)| step).collect();
		assert_eq!(steps, TeardownStep::ORDER.to_vec());
	}

	#[tokio::test]
	async fn failing_stage_does_not_stop_later_stages() {
		let factory = FakeFactory::new();
		factory.fail_step(TeardownStep::Page);
		factory.fail_step(TeardownStep::Context);
		let handle = fake_handle(&factory).await;

		let failures = run(&handle).await;
		assert_eq!(failures.len(), 2);
		assert_eq!(failures[0].step, TeardownStep::Page);
		assert_eq!(failures[1].step, TeardownStep::Context);

		// The browser stage still ran.
		let steps: Vec<TeardownStep> = factory.closed_steps().into_iter().map(|(_, step)| step).collect();
		assert_eq!(steps, TeardownStep::ORDER.to_vec());
		assert!(!handle.is_live());
	}
}
