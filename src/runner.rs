//! Orchestrates a documentation run over a repository.
//!
//! Updates are processed file by file: diff, attribution and reconciliation
//! for every staged file complete before any generation task starts. The
//! record is checkpointed once per run.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::attribution::attribute_with_snapshots;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::diff::parse_diff_text;
use crate::error::{DocError, DocResult};
use crate::generate::{
    DocGenerator, GenerationReport, GenerationScheduler, GenerationTask, LlmDocGenerator,
    StopHandle,
};
use crate::meta::{CodeSpan, ItemType, MetaTree};
use crate::ports::{ChangeStatus, StagedFile};
use crate::reconcile::reconcile;
use crate::render::write_docs;
use crate::structure::{Declaration, FileStructure};

/// Result of [`Runner::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Files whose subtree was reconciled.
    pub reconciled: Vec<String>,
    /// Files removed from the record.
    pub removed: Vec<String>,
    /// Files left untouched because of a diff or extraction error.
    pub failed: Vec<(String, String)>,
    /// Files skipped because they are empty or were never recorded.
    pub skipped: Vec<String>,
    /// Generation outcome.
    pub generation: GenerationReport,
    /// Paths added to the git index.
    pub staged: Vec<String>,
}

enum FileOutcome {
    Reconciled(Vec<GenerationTask>),
    Removed,
    Skipped,
}

/// Drives init, full generation and incremental updates.
pub struct Runner<'a> {
    ctx: &'a ServiceContext,
    settings: &'a Settings,
    scheduler: GenerationScheduler,
    generator: Arc<dyn DocGenerator>,
}

impl<'a> Runner<'a> {
    /// Runner generating through the context's LLM client.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, settings: &'a Settings) -> Self {
        let generator = Arc::new(LlmDocGenerator::new(
            Arc::clone(&ctx.llm),
            settings.model.clone(),
            settings.max_tokens,
        ));
        Self::with_generator(ctx, settings, generator)
    }

    /// Runner using a specific generator.
    #[must_use]
    pub fn with_generator(
        ctx: &'a ServiceContext,
        settings: &'a Settings,
        generator: Arc<dyn DocGenerator>,
    ) -> Self {
        let scheduler = GenerationScheduler::new(settings.max_workers, settings.reference_scope);
        Self { ctx, settings, scheduler, generator }
    }

    /// Handle that stops the current generation from starting new tasks.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.scheduler.stop_handle()
    }

    /// Builds the record from source and checkpoints it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file list is unavailable or the checkpoint
    /// cannot be written.
    pub fn init(&self) -> DocResult<MetaTree> {
        let tree = MetaTree::init_from_source(self.ctx, self.settings)?;
        tree.checkpoint(self.ctx.fs.as_ref(), &self.settings.hierarchy_file())?;
        Ok(tree)
    }

    /// Restores the record, or builds and checkpoints it if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if restoring or initializing fails.
    pub fn load_or_init(&self) -> DocResult<MetaTree> {
        let path = self.settings.hierarchy_file();
        if self.ctx.fs.exists(&path) {
            MetaTree::restore(self.ctx.fs.as_ref(), &path)
        } else {
            info!(path = %path.display(), "no documentation record yet; building one");
            self.init()
        }
    }

    /// Documents every declaration that has no documentation yet.
    ///
    /// The tree's version is bumped only if every task succeeded; otherwise
    /// the pass can be resumed by running it again.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Checkpoint`] if the record cannot be written, or
    /// an I/O error if rendering fails.
    pub async fn first_generate(&self, tree: &mut MetaTree) -> DocResult<GenerationReport> {
        let (tasks, unreadable) = self.pending_tasks(tree);
        let mut report = self
            .scheduler
            .run(tree, tasks, Arc::clone(&self.ctx.resolver), Arc::clone(&self.generator))
            .await;
        for (path, message) in unreadable {
            report.failed += 1;
            report.failures.push((path, message));
        }

        if report.is_complete() {
            tree.bump_version();
            info!(version = tree.version_tag(), "full generation pass complete");
        } else {
            warn!(
                failed = report.failed,
                skipped = report.skipped,
                "generation pass incomplete; run again to resume"
            );
        }

        tree.checkpoint(self.ctx.fs.as_ref(), &self.settings.hierarchy_file())?;
        write_docs(self.ctx.fs.as_ref(), self.settings, tree, &tree.file_paths())?;
        Ok(report)
    }

    /// Undocumented declarations in generation order, plus files that could
    /// not be read.
    fn pending_tasks(&self, tree: &MetaTree) -> (Vec<GenerationTask>, Vec<(String, String)>) {
        let mut sources: HashMap<String, Option<String>> = HashMap::new();
        let mut tasks = Vec::new();
        let mut unreadable = Vec::new();

        for entry in tree.topological_order() {
            if entry.node.item_type() != ItemType::Declaration || entry.node.is_documented() {
                continue;
            }
            let Some(file_path) = entry.owning_file() else {
                continue;
            };
            if self.settings.is_ignored(file_path) {
                continue;
            }
            let source = sources.entry(file_path.to_string()).or_insert_with(|| {
                match self.ctx.fs.read_to_string(&self.settings.repo_path.join(file_path)) {
                    Ok(source) => Some(source),
                    Err(e) => {
                        warn!(path = %file_path, error = %e, "cannot read source; skipping its declarations");
                        unreadable.push((file_path.to_string(), e.to_string()));
                        None
                    }
                }
            });
            if let (Some(source), Some(decl)) = (source.as_deref(), entry.node.to_declaration()) {
                tasks.push(GenerationTask::from_declaration(file_path, &decl, source));
            }
        }
        (tasks, unreadable)
    }

    /// Applies staged changes to the record and regenerates what they touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the staged change list is unavailable, the
    /// checkpoint cannot be written, or rendering or staging fails. Per-file
    /// diff and extraction errors are reported in the summary instead.
    pub async fn update(&self, tree: &mut MetaTree) -> DocResult<UpdateSummary> {
        let staged = self.ctx.git.staged_changes().map_err(|e| DocError::Git(e.to_string()))?;
        let mut summary = UpdateSummary::default();
        let mut tasks = Vec::new();

        for change in staged.into_iter().filter(|c| self.settings.tracks(&c.path)) {
            match self.apply_change(tree, &change) {
                Ok(FileOutcome::Reconciled(file_tasks)) => {
                    tasks.extend(file_tasks);
                    summary.reconciled.push(change.path);
                }
                Ok(FileOutcome::Removed) => summary.removed.push(change.path),
                Ok(FileOutcome::Skipped) => summary.skipped.push(change.path),
                Err(e) => {
                    warn!(path = %change.path, error = %e, "leaving file unchanged");
                    summary.failed.push((change.path, e.to_string()));
                }
            }
        }
        info!(
            reconciled = summary.reconciled.len(),
            removed = summary.removed.len(),
            failed = summary.failed.len(),
            dirty = tasks.len(),
            "reconciliation complete"
        );

        summary.generation = self
            .scheduler
            .run(tree, tasks, Arc::clone(&self.ctx.resolver), Arc::clone(&self.generator))
            .await;

        tree.checkpoint(self.ctx.fs.as_ref(), &self.settings.hierarchy_file())?;
        let mut outputs = write_docs(self.ctx.fs.as_ref(), self.settings, tree, &summary.reconciled)?;

        if self.settings.stage_outputs {
            outputs.push(self.settings.hierarchy_path.to_string_lossy().into_owned());
            self.ctx.git.stage(&outputs).map_err(|e| DocError::Git(e.to_string()))?;
            summary.staged = outputs;
        }
        Ok(summary)
    }

    fn apply_change(&self, tree: &mut MetaTree, change: &StagedFile) -> DocResult<FileOutcome> {
        let path = change.path.as_str();
        if change.status == ChangeStatus::Deleted {
            return Ok(if tree.remove_file(path).is_some() {
                FileOutcome::Removed
            } else {
                FileOutcome::Skipped
            });
        }

        let source = self
            .ctx
            .fs
            .read_to_string(&self.settings.repo_path.join(path))
            .map_err(|e| DocError::Io(std::io::Error::other(e.to_string())))?;
        if source.trim().is_empty() {
            debug!(path = %path, "skipping empty file");
            return Ok(FileOutcome::Skipped);
        }

        let is_new = change.status == ChangeStatus::Added;
        let diff = self.ctx.git.file_diff(path, is_new).map_err(|e| DocError::Git(e.to_string()))?;
        let changed = parse_diff_text(&diff)?;

        let previous = if is_new { Vec::new() } else { self.previous_declarations(tree, path)? };
        let current = FileStructure::extract(self.ctx.extractor.as_ref(), path, &source)?;
        let attribution = attribute_with_snapshots(&changed, &previous, &current.declarations);
        debug!(
            path = %path,
            added = attribution.added.len(),
            removed = attribution.removed.len(),
            "attributed changes"
        );

        let newly_recorded = tree.file(path).is_none();
        let file = tree.file_entry(path, CodeSpan::for_line_count(current.line_count));
        let dirty = reconcile(file, &previous, Ok(current.declarations.as_slice()), &attribution)?;

        // A file the record has never seen gets every declaration documented,
        // not only the ones the diff touches.
        let selected: Vec<&Declaration> = if newly_recorded {
            let mut last_by_name = IndexMap::new();
            for decl in &current.declarations {
                last_by_name.insert(decl.name.as_str(), decl);
            }
            debug!(path = %path, declarations = last_by_name.len(), "file new to the record");
            last_by_name.into_values().collect()
        } else {
            dirty
                .iter()
                .filter_map(|id| current.declarations.iter().rev().find(|d| d.name == id.name))
                .collect()
        };
        let tasks = selected
            .into_iter()
            .map(|decl| GenerationTask::from_declaration(path, decl, &source))
            .collect();
        Ok(FileOutcome::Reconciled(tasks))
    }

    /// Declarations of `path` at `HEAD`, falling back to the record when the
    /// old content is unavailable or does not parse.
    fn previous_declarations(&self, tree: &MetaTree, path: &str) -> DocResult<Vec<Declaration>> {
        let head = self.ctx.git.previous_version(path).map_err(|e| DocError::Git(e.to_string()))?;
        if let Some(old_source) = head {
            match FileStructure::extract(self.ctx.extractor.as_ref(), path, &old_source) {
                Ok(structure) => return Ok(structure.declarations),
                Err(e) => warn!(path = %path, error = %e, "previous version unparsable; using recorded structure"),
            }
        }
        Ok(tree
            .file(path)
            .map(|f| f.children.values().filter_map(|c| c.to_declaration()).collect())
            .unwrap_or_default())
    }
}
