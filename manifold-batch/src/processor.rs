//! Batch orchestration
//!
//! `BatchProcessor` takes an ordered list of raw sub-requests and runs the
//! full pipeline: lenient parse, priority classification, deduplication,
//! bounded concurrent execution with cache-first reads and retries, fan-out
//! to every id sharing a canonical execution, and aggregation back into
//! submission order.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, span, warn, Instrument, Level};

use manifold_caching::{CacheStats, ResponseCache};
use manifold_config::ManifoldConfig;
use manifold_core::DedupKey;
use manifold_resilience::{BackoffStrategy, RetryExecutor, RetryPolicy};
use manifold_routing::{Dispatch, Dispatched};

use crate::envelope::{BatchEnvelope, BatchReport, BatchStats, ItemResponse};
use crate::request::{RequestDefaults, SubRequest};
use crate::stats::{LifetimeCounters, LifetimeStats};

/// Outcome of one canonical execution, shared by every id on its key
#[derive(Debug, Clone)]
struct CanonicalOutcome {
    status: u16,
    payload: Option<Value>,
    error: Option<String>,
    duration: Duration,
    from_cache: bool,
    success: bool,
}

impl CanonicalOutcome {
    /// Fallback for ids that lost their result. Reaching this means the
    /// fan-out invariant broke, so it is logged as an error, not routine.
    fn invariant_failure() -> Self {
        Self {
            status: 500,
            payload: None,
            error: Some("Request processing failed".to_string()),
            duration: Duration::ZERO,
            from_cache: false,
            success: false,
        }
    }
}

/// Batch request processor.
///
/// One instance owns the response cache and lifetime counters; construct it
/// once at startup and hand it to whatever accepts batch payloads.
pub struct BatchProcessor {
    dispatcher: Arc<dyn Dispatch>,
    cache: Option<Arc<ResponseCache<DedupKey, Dispatched>>>,
    retry_policy: RetryPolicy,
    max_concurrent: usize,
    defaults: RequestDefaults,
    housekeeping_interval: u64,
    counters: LifetimeCounters,
}

impl BatchProcessor {
    /// Build a processor from configuration, delegating execution to
    /// `dispatcher`
    pub fn from_config(config: &ManifoldConfig, dispatcher: Arc<dyn Dispatch>) -> Self {
        let cache = config.cache.enabled.then(|| {
            Arc::new(ResponseCache::new(
                config.cache.max_entries,
                config.cache.default_ttl,
            ))
        });

        let retry_policy = RetryPolicy {
            max_retries: config.batch.default_max_retries,
            initial_delay: config.retry.initial_delay,
            max_delay: config.retry.max_delay,
            backoff_strategy: backoff_from_name(&config.retry.backoff),
            jitter: config.retry.jitter,
        };

        Self {
            dispatcher,
            cache,
            retry_policy,
            max_concurrent: config.batch.max_concurrent,
            defaults: RequestDefaults {
                max_retries: config.batch.default_max_retries,
                timeout: config.batch.default_timeout,
            },
            housekeeping_interval: config.batch.housekeeping_interval,
            counters: LifetimeCounters::default(),
        }
    }

    /// Build a processor with default configuration
    pub fn new(dispatcher: Arc<dyn Dispatch>) -> Self {
        Self::from_config(&ManifoldConfig::default(), dispatcher)
    }

    /// Process a raw JSON batch payload.
    ///
    /// A payload without a `requests` array fails at the top level before
    /// any item is parsed or any counter moves.
    pub async fn process_json(&self, payload: &Value) -> BatchEnvelope {
        match payload.get("requests").and_then(Value::as_array) {
            Some(requests) => BatchEnvelope::ok(self.process_batch(requests).await),
            None => BatchEnvelope::failure("Missing requests array"),
        }
    }

    /// Execute a batch of raw sub-requests.
    ///
    /// Responses come back one per submitted request, in submission order,
    /// regardless of priority or completion order. Per-item failures never
    /// abort sibling items.
    pub async fn process_batch(&self, raw_requests: &[Value]) -> BatchReport {
        let batch_started = Instant::now();
        let batch_size = raw_requests.len();
        let span = span!(Level::INFO, "batch_processing", batch_size);

        async {
            let requests: Vec<SubRequest> = raw_requests
                .iter()
                .enumerate()
                .map(|(ordinal, raw)| SubRequest::from_value(raw, ordinal, self.defaults))
                .collect();
            let submission_order: Vec<String> =
                requests.iter().map(|r| r.id.clone()).collect();

            // Scheduling order only; responses are reassembled in submission
            // order below. The sort is stable, so equal tiers keep their
            // submission order.
            let mut scheduled = requests;
            scheduled.sort_by_key(|request| request.priority);

            let (canonical, sharers) = deduplicate(scheduled);
            let canonical_count = canonical.len();
            if canonical_count < batch_size {
                debug!(
                    canonical_count,
                    "deduplication collapsed {} requests", batch_size
                );
            }

            let outcomes = self.execute_canonical(canonical).await;

            let mut fanned: HashMap<String, ItemResponse> = HashMap::with_capacity(batch_size);
            let mut cache_hits = 0u64;
            for (key, ids) in &sharers {
                let outcome = outcomes.get(key).cloned().unwrap_or_else(|| {
                    error!(?key, "canonical execution produced no outcome");
                    CanonicalOutcome::invariant_failure()
                });

                if outcome.from_cache {
                    cache_hits += ids.len() as u64;
                }
                for id in ids {
                    fanned.insert(id.clone(), item_response(id.clone(), &outcome));
                }
            }

            let responses: Vec<ItemResponse> = submission_order
                .iter()
                .map(|id| {
                    fanned.get(id).cloned().unwrap_or_else(|| {
                        error!(id = %id, "sub-request lost its result during fan-out");
                        item_response(id.clone(), &CanonicalOutcome::invariant_failure())
                    })
                })
                .collect();

            let errors = responses.iter().filter(|r| !r.success).count() as u64;
            let elapsed = batch_started.elapsed();
            debug!(errors, ?elapsed, "batch complete");

            let previous_total = self.counters.add_requests(batch_size as u64);
            self.counters.add_cache_hits(cache_hits);
            self.counters
                .add_deduplicated((batch_size - canonical_count) as u64);
            self.counters.add_errors(errors);
            self.counters.add_duration(elapsed);

            self.run_housekeeping(previous_total, batch_size as u64).await;

            let stats = BatchStats::from_batch(
                elapsed.as_secs_f64(),
                batch_size,
                &self.counters.snapshot(),
            );

            BatchReport {
                responses,
                count: batch_size,
                timestamp: Utc::now().to_rfc3339(),
                stats,
            }
        }
        .instrument(span)
        .await
    }

    /// Lifetime statistics snapshot
    pub fn stats(&self) -> LifetimeStats {
        self.counters.snapshot()
    }

    /// Response cache statistics, when caching is enabled
    pub async fn cache_stats(&self) -> Option<CacheStats> {
        match &self.cache {
            Some(cache) => Some(cache.stats().await),
            None => None,
        }
    }

    /// Run the canonical executions under the concurrency bound.
    ///
    /// Permits are taken here, in priority order, so execution starts in
    /// priority order even though completions interleave freely.
    async fn execute_canonical(
        &self,
        canonical: Vec<(DedupKey, SubRequest)>,
    ) -> HashMap<DedupKey, CanonicalOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles: Vec<(DedupKey, JoinHandle<CanonicalOutcome>)> =
            Vec::with_capacity(canonical.len());

        for (key, request) in canonical {
            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let dispatcher = Arc::clone(&self.dispatcher);
            let cache = self.cache.clone();
            let mut policy = self.retry_policy.clone();
            policy.max_retries = request.max_retries;
            let task_key = key.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                run_one(dispatcher, cache, RetryExecutor::new(policy), task_key, request).await
            });
            handles.push((key, handle));
        }

        let mut outcomes = HashMap::with_capacity(handles.len());
        for (key, handle) in handles {
            match handle.await {
                Ok(outcome) => {
                    outcomes.insert(key, outcome);
                }
                Err(join_error) => {
                    error!("canonical execution task failed: {}", join_error);
                    outcomes.insert(key, CanonicalOutcome::invariant_failure());
                }
            }
        }

        outcomes
    }

    /// Clear expired cache entries whenever the lifetime request count
    /// crosses a multiple of the housekeeping interval
    async fn run_housekeeping(&self, previous_total: u64, added: u64) {
        let Some(cache) = &self.cache else { return };

        let interval = self.housekeeping_interval.max(1);
        if (previous_total + added) / interval > previous_total / interval {
            let removed = cache.clear_expired().await;
            if removed > 0 {
                debug!(removed, "housekeeping removed expired cache entries");
            }
        }
    }
}

/// Split priority-ordered requests into canonical executions plus the ids
/// sharing each one. The first request seen for a key is the canonical one.
fn deduplicate(
    scheduled: Vec<SubRequest>,
) -> (Vec<(DedupKey, SubRequest)>, HashMap<DedupKey, Vec<String>>) {
    let mut canonical = Vec::with_capacity(scheduled.len());
    let mut sharers: HashMap<DedupKey, Vec<String>> = HashMap::with_capacity(scheduled.len());

    for request in scheduled {
        let key = request.dedup_key();
        match sharers.get_mut(&key) {
            Some(ids) => ids.push(request.id.clone()),
            None => {
                sharers.insert(key.clone(), vec![request.id.clone()]);
                canonical.push((key, request));
            }
        }
    }

    (canonical, sharers)
}

/// One canonical execution: cache-first for shared keys, dispatch under the
/// retry policy, cache the successful result
async fn run_one(
    dispatcher: Arc<dyn Dispatch>,
    cache: Option<Arc<ResponseCache<DedupKey, Dispatched>>>,
    retry: RetryExecutor,
    key: DedupKey,
    request: SubRequest,
) -> CanonicalOutcome {
    let started = Instant::now();
    let cacheable = key.is_shared();

    if cacheable {
        if let Some(cache) = &cache {
            if let Some(hit) = cache.get(&key).await {
                debug!(id = %request.id, endpoint = %request.endpoint, "served from cache");
                return CanonicalOutcome {
                    status: hit.status,
                    payload: Some(hit.payload),
                    error: None,
                    duration: started.elapsed(),
                    from_cache: true,
                    success: true,
                };
            }
        }
    }

    let dispatch_request = request.to_dispatch();
    let result = retry
        .execute(|| {
            let dispatcher = Arc::clone(&dispatcher);
            let request = dispatch_request.clone();
            async move { dispatcher.dispatch(request).await }
        })
        .await;

    match result {
        Ok(retried) => {
            let dispatched = retried.value;
            let success = dispatched.status < 400;
            if success && cacheable {
                if let Some(cache) = &cache {
                    cache.set(key, dispatched.clone()).await;
                }
            }

            CanonicalOutcome {
                status: dispatched.status,
                payload: Some(dispatched.payload),
                error: None,
                duration: started.elapsed(),
                from_cache: false,
                success,
            }
        }
        Err(retry_error) => {
            let cause = retry_error.into_inner();
            warn!(
                id = %request.id,
                endpoint = %request.endpoint,
                "sub-request failed: {}", cause
            );

            CanonicalOutcome {
                status: cause.status(),
                payload: None,
                error: Some(cause.to_string()),
                duration: started.elapsed(),
                from_cache: false,
                success: false,
            }
        }
    }
}

/// Materialize one id's response record from its canonical outcome
fn item_response(id: String, outcome: &CanonicalOutcome) -> ItemResponse {
    ItemResponse {
        id,
        status: outcome.status,
        success: outcome.success,
        data: outcome.payload.clone(),
        error: outcome.error.clone(),
        timestamp: Utc::now().to_rfc3339(),
        duration: outcome.duration.as_secs_f64(),
        from_cache: outcome.from_cache,
    }
}

fn backoff_from_name(name: &str) -> BackoffStrategy {
    match name {
        "fixed" => BackoffStrategy::Fixed,
        "exponential" => BackoffStrategy::Exponential { base: 2.0 },
        _ => BackoffStrategy::Linear,
    }
}
