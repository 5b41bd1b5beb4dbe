//! Bounded-parallel regeneration of documentation payloads.
//!
//! Tasks run on a `JoinSet`, gated by a semaphore sized to `max_workers`.
//! Only the collector loop touches the [`MetaTree`]; tasks return their text
//! and never see the tree.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use super::{DocGenerator, DocRequest, GenerationTask};
use crate::error::{DocError, DocResult};
use crate::meta::MetaTree;
use crate::ports::{ReferenceQuery, ReferenceResolver, ReferenceScope};

/// Cooperative stop signal shared with whoever wants to interrupt a run.
///
/// Once stopped, no new task is started; running tasks finish normally.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests a stop.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`StopHandle::stop`] has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome counts of a scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Nodes whose payload was written.
    pub succeeded: usize,
    /// Nodes whose generation failed; payload left unchanged.
    pub failed: usize,
    /// Nodes never started because of a stop request.
    pub skipped: usize,
    /// `(target, message)` for every failure.
    pub failures: Vec<(String, String)>,
}

impl GenerationReport {
    /// Returns `true` if every scheduled node was generated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

/// Runs generation tasks with a fixed concurrency limit.
#[derive(Debug, Clone)]
pub struct GenerationScheduler {
    max_workers: usize,
    scope: ReferenceScope,
    stop: StopHandle,
}

impl GenerationScheduler {
    /// Scheduler running at most `max_workers` tasks at once (at least one).
    #[must_use]
    pub fn new(max_workers: usize, scope: ReferenceScope) -> Self {
        Self { max_workers: max_workers.max(1), scope, stop: StopHandle::default() }
    }

    /// Handle that stops this scheduler from starting further tasks.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Generates documentation for every task and writes it into `tree`.
    ///
    /// Tasks naming the same `(file, declaration)` are run once. A failing
    /// task is logged and counted; it never cancels its siblings. The caller
    /// checkpoints the tree afterwards.
    pub async fn run(
        &self,
        tree: &mut MetaTree,
        tasks: Vec<GenerationTask>,
        resolver: Arc<dyn ReferenceResolver>,
        generator: Arc<dyn DocGenerator>,
    ) -> GenerationReport {
        let mut seen = HashSet::new();
        let tasks: Vec<GenerationTask> = tasks
            .into_iter()
            .filter(|t| seen.insert((t.file_path.clone(), t.name.clone())))
            .collect();
        info!(tasks = tasks.len(), max_workers = self.max_workers, "starting generation");

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut join_set = JoinSet::new();
        let mut report = GenerationReport::default();

        for task in tasks {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            if self.stop.is_stopped() {
                debug!(target = %task.target(), "stop requested; not starting");
                report.skipped += 1;
                continue;
            }
            let resolver = Arc::clone(&resolver);
            let generator = Arc::clone(&generator);
            let scope = self.scope;
            join_set.spawn(async move {
                let _permit = permit;
                let file_path = task.file_path.clone();
                let name = task.name.clone();
                let outcome = generate_one(task, scope, resolver, generator).await;
                (file_path, name, outcome)
            });

            while let Some(joined) = join_set.try_join_next() {
                collect(tree, joined, &mut report);
            }
        }

        while let Some(joined) = join_set.join_next().await {
            collect(tree, joined, &mut report);
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "generation finished"
        );
        report
    }
}

async fn generate_one(
    task: GenerationTask,
    scope: ReferenceScope,
    resolver: Arc<dyn ReferenceResolver>,
    generator: Arc<dyn DocGenerator>,
) -> DocResult<String> {
    let target = task.target();
    let failed = |message: String| DocError::Generation { target: target.clone(), message };

    let query = ReferenceQuery {
        name: task.name.clone(),
        file_path: task.file_path.clone(),
        line: task.span.start_line,
        column: task.name_column,
        scope,
    };
    let referencers = tokio::task::spawn_blocking(move || {
        resolver.find_referencers(&query).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| failed(e.to_string()))?
    .map_err(|e| failed(format!("reference lookup failed: {e}")))?;

    let request = DocRequest { task, referencers };
    let text = generator.generate(&request).await.map_err(|e| failed(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(failed("generator returned no text".to_string()));
    }
    Ok(text)
}

fn collect(
    tree: &mut MetaTree,
    joined: Result<(String, String, DocResult<String>), JoinError>,
    report: &mut GenerationReport,
) {
    match joined {
        Ok((file_path, name, Ok(text))) => {
            if tree.set_doc(&file_path, &name, text) {
                debug!(file = %file_path, name = %name, "documented");
                report.succeeded += 1;
            } else {
                warn!(file = %file_path, name = %name, "declaration vanished before its documentation arrived");
                report.failed += 1;
                report.failures.push((format!("{file_path}/{name}"), "node missing".to_string()));
            }
        }
        Ok((file_path, name, Err(e))) => {
            warn!(file = %file_path, name = %name, error = %e, "generation failed");
            report.failed += 1;
            report.failures.push((format!("{file_path}/{name}"), e.to_string()));
        }
        Err(e) => {
            warn!(error = %e, "generation task aborted");
            report.failed += 1;
            report.failures.push(("<task>".to_string(), e.to_string()));
        }
    }
}
