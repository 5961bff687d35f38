use std::{
	sync::Arc,
	time::{Duration, Instant},
};

use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::{
	ChannelResults, Error, FusionContext, FusionEngine, ItemCandidate, RecallDiagnostics,
	RecallPlan, RecallPlanner, RecallRequest, RecallResponse, RecallStrategy, Result, StrategyId,
	StrategyRegistry, UserContext, UserContextFactory,
};
use feed_domain::ScoreMapping;

#[derive(Clone, Copy, Debug)]
pub struct EngineSettings {
	/// Permits in the worker pool shared by every request served by this engine.
	pub max_concurrency: usize,
	/// Per-strategy deadline. `None` waits for every strategy to finish.
	pub strategy_timeout: Option<Duration>,
	pub score_mapping: ScoreMapping,
}
impl Default for EngineSettings {
	fn default() -> Self {
		Self { max_concurrency: 16, strategy_timeout: None, score_mapping: ScoreMapping::Off }
	}
}

/// Orchestrates one recall request: context, plan, concurrent dispatch, and fusion.
pub struct RecallEngine {
	registry: StrategyRegistry,
	planner: RecallPlanner,
	context_factory: Arc<dyn UserContextFactory>,
	fusion: FusionEngine,
	settings: EngineSettings,
	pool: Arc<Semaphore>,
}
impl RecallEngine {
	pub fn new(
		registry: StrategyRegistry,
		planner: RecallPlanner,
		context_factory: Arc<dyn UserContextFactory>,
		fusion: FusionEngine,
		settings: EngineSettings,
	) -> Self {
		let pool = Arc::new(Semaphore::new(settings.max_concurrency.max(1)));

		Self { registry, planner, context_factory, fusion, settings, pool }
	}

	pub fn registry(&self) -> &StrategyRegistry {
		&self.registry
	}

	/// Always produces a response. Failed, panicked, or timed-out strategies contribute an empty
	/// list and never affect their siblings.
	pub async fn recall(&self, request: &RecallRequest) -> RecallResponse {
		let started = Instant::now();
		let context = match self.context_factory.create(request).await {
			Ok(context) => context,
			Err(err) => {
				tracing::warn!(
					error = %err,
					user_id = request.user_id,
					"User context build failed; continuing with an empty context."
				);

				UserContext::from_request(request, Vec::new())
			},
		};
		let available = self.registry.available(&request.scene);
		let plan = self.planner.plan(request, &available);
		let dispatched = self.dispatch(Arc::new(context), &plan).await;
		let fusion_context = FusionContext { request, config: &plan.fusion_config };
		let outcome =
			self.fusion.fuse_with_sources(&dispatched.channel_results, &fusion_context).await;
		let latency = started.elapsed();

		tracing::debug!(
			user_id = request.user_id,
			scene = %request.scene,
			top_k = request.top_k,
			channels = dispatched.channel_results.len(),
			failed = dispatched.failed.len(),
			fused = outcome.candidates.len(),
			elapsed_ms = latency.as_millis() as u64,
			"Recall finished."
		);

		let diagnostics = request.diagnostics_requested.then(|| RecallDiagnostics {
			trace_id: Uuid::new_v4(),
			quotas: plan.quotas.clone(),
			per_channel_counts: dispatched
				.channel_results
				.iter()
				.map(|(id, candidates)| (*id, candidates.len()))
				.collect(),
			failed_channels: dispatched.failed.clone(),
			contributing_sources: outcome.contributing_sources,
		});

		RecallResponse {
			fused: outcome.candidates,
			channel_results: dispatched.channel_results,
			latency,
			diagnostics,
		}
	}

	async fn dispatch(&self, context: Arc<UserContext>, plan: &RecallPlan) -> Dispatched {
		let mut dispatched = Dispatched::default();
		let mut handles = Vec::with_capacity(plan.quotas.len());

		for (&id, &quota) in &plan.quotas {
			if quota == 0 {
				continue;
			}

			let strategy = match self.registry.get(id) {
				Ok(strategy) => strategy,
				Err(err) => {
					tracing::warn!(error = %err, strategy = %id, "Strategy lookup failed.");

					dispatched.fail(id);

					continue;
				},
			};
			let handle = tokio::spawn(run_strategy(
				strategy,
				Arc::clone(&context),
				quota,
				Arc::clone(&self.pool),
				self.settings.strategy_timeout,
			));

			handles.push((id, quota, handle));
		}

		for (id, quota, handle) in handles {
			match handle.await {
				Ok(Ok(run)) => {
					tracing::info!(
						strategy = %id,
						quota,
						size = run.candidates.len(),
						elapsed_ms = run.elapsed.as_millis() as u64,
						"Strategy finished."
					);

					let mapped = run
						.candidates
						.into_iter()
						.map(|candidate| {
							let score = self.settings.score_mapping.map(candidate.score);

							candidate.with_score(score)
						})
						.collect();

					dispatched.channel_results.insert(id, mapped);
				},
				Ok(Err(err)) => {
					tracing::warn!(error = %err, strategy = %id, quota, "Strategy failed.");

					dispatched.fail(id);
				},
				Err(err) => {
					tracing::warn!(error = %err, strategy = %id, quota, "Strategy task aborted.");

					dispatched.fail(id);
				},
			}
		}

		dispatched
	}
}

#[derive(Debug, Default)]
struct Dispatched {
	channel_results: ChannelResults,
	failed: Vec<StrategyId>,
}
impl Dispatched {
	fn fail(&mut self, id: StrategyId) {
		self.channel_results.insert(id, Vec::new());
		self.failed.push(id);
	}
}

struct StrategyRun {
	candidates: Vec<ItemCandidate>,
	elapsed: Duration,
}

async fn run_strategy(
	strategy: Arc<dyn RecallStrategy>,
	context: Arc<UserContext>,
	quota: usize,
	pool: Arc<Semaphore>,
	timeout: Option<Duration>,
) -> Result<StrategyRun> {
	let _permit = pool
		.acquire_owned()
		.await
		.map_err(|_| Error::collaborator("Recall worker pool is closed."))?;
	let started = Instant::now();
	let recall = strategy.recall(&context, quota);
	let candidates = match timeout {
		Some(limit) => tokio::time::timeout(limit, recall).await.map_err(|_| Error::Timeout {
			strategy: strategy.id(),
			after_ms: limit.as_millis() as u64,
		})??,
		None => recall.await?,
	};

	Ok(StrategyRun { candidates, elapsed: started.elapsed() })
}
