//! Fake worker factory for exercising pool behavior without browsers.
//!
//! Provides in-memory workers with scriptable create/teardown failures plus
//! counters for asserting lifecycle behavior from tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::factory::{LaunchParams, TeardownStep, WorkerFactory, WorkerHandle};

#[derive(Default)]
struct FakeState {
	fail_create: AtomicBool,
	failing_steps: Mutex<Vec<TeardownStep>>,
	created: AtomicUsize,
	closed: Mutex<Vec<(usize, TeardownStep)>>,
}

/// Factory producing in-memory workers with scriptable failures.
#[derive(Default)]
pub struct FakeFactory {
	state: Arc<FakeState>,
}

impl FakeFactory {
	/// Creates a factory whose workers launch and close cleanly.
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Makes every subsequent `create` call fail.
	pub fn fail_create(&self, fail: bool) {
		self.state.fail_create.store(fail, Ordering::SeqCst);
	}

	/// Makes the given teardown step fail on every handle.
	pub fn fail_step(&self, step: TeardownStep) {
		self.state.failing_steps.lock().push(step);
	}

	/// Number of workers created so far.
	pub fn created(&self) -> usize {
		self.state.created.load(Ordering::SeqCst)
	}

	/// Teardown steps executed so far, in call order, tagged by worker index.
	pub fn closed_steps(&self) -> Vec<(usize, TeardownStep)> {
		self.state.closed.lock().clone()
	}
}

#[async_trait]
impl WorkerFactory for FakeFactory {
	async fn create(&self, params: &LaunchParams) -> anyhow::Result<Box<dyn WorkerHandle>> {
		if self.state.fail_create.load(Ordering::SeqCst) {
			return Err(anyhow!("simulated launch failure for {}", params.kind));
		}
		let worker = self.state.created.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(FakeHandle {
			worker,
			state: Arc::clone(&self.state),
			live: AtomicBool::new(true),
		}))
	}
}

/// In-memory stand-in for a browser worker.
pub struct FakeHandle {
	worker: usize,
	state: Arc<FakeState>,
	live: AtomicBool,
}

impl FakeHandle {
	fn close_step(&self, step: TeardownStep) -> anyhow::Result<()> {
		self.state.closed.lock().push((self.worker, step));
		if self.state.failing_steps.lock().contains(&step) {
			return Err(anyhow!("simulated {step} close failure"));
		}
		if step == TeardownStep::Browser {
			self.live.store(false, Ordering::SeqCst);
		}
		Ok(())
	}
}

#[async_trait]
impl WorkerHandle for FakeHandle {
	async fn close_page(&self) -> anyhow::Result<()> {
		self.close_step(TeardownStep::Page)
	}

	async fn close_context(&self) -> anyhow::Result<()> {
		self.close_step(TeardownStep::Context)
	}

	async fn close_browser(&self) -> anyhow::Result<()> {
		self.close_step(TeardownStep::Browser)
	}

	fn is_live(&self) -> bool {
		self.live.load(Ordering::SeqCst)
	}
}
