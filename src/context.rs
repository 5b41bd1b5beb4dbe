//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::Arc;

use crate::adapters::live::extractor::PythonExtractor;
use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::git::LiveGitRepo;
use crate::adapters::live::llm::LiveLlmClient;
use crate::adapters::live::resolver::LexicalResolver;
use crate::adapters::recording::{
    RecordingFileSystem, RecordingGitRepo, RecordingLlmClient, RecordingResolver,
};
use crate::adapters::replaying::{
    ReplayingFileSystem, ReplayingGitRepo, ReplayingLlmClient, ReplayingResolver,
};
use crate::cassette::config::CassetteConfig;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::Settings;
use crate::error::PortError;
use crate::ports::{
    CompletionRequest, FileSystem, GitRepo, LlmClient, LlmFuture, ReferenceQuery,
    ReferenceResolver, Referencer, StagedFile, StructureExtractor,
};

/// Bundles all port trait objects into a single context.
///
/// Constructors wire up live, recording or replaying adapters. Structure
/// extraction is pure and always runs live.
pub struct ServiceContext {
    /// Source, record and Markdown file access.
    pub fs: Arc<dyn FileSystem>,
    /// Staged changes, diffs and the index.
    pub git: Arc<dyn GitRepo>,
    /// Declaration extraction from source text.
    pub extractor: Arc<dyn StructureExtractor>,
    /// Cross-reference lookups.
    pub resolver: Arc<dyn ReferenceResolver>,
    /// Completion service used to write documentation.
    pub llm: Arc<dyn LlmClient>,
}

impl ServiceContext {
    /// Live context rooted at the settings' repository.
    #[must_use]
    pub fn live(settings: &Settings) -> Self {
        Self {
            fs: Arc::new(LiveFileSystem),
            git: Arc::new(LiveGitRepo::new(&settings.repo_path)),
            extractor: Arc::new(PythonExtractor),
            resolver: Arc::new(LexicalResolver::new(
                &settings.repo_path,
                &settings.source_extension,
            )),
            llm: Arc::new(LiveLlmClient::new()),
        }
    }

    /// Live context whose port traffic is recorded into a new session
    /// directory under `dir`.
    ///
    /// Drop the context before calling [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be created.
    pub fn recording_at(
        settings: &Settings,
        dir: &Path,
    ) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new_at(dir)?;
        let ctx = Self {
            fs: Arc::new(RecordingFileSystem::new(
                Box::new(LiveFileSystem),
                Arc::clone(&session.fs),
            )),
            git: Arc::new(RecordingGitRepo::new(
                Box::new(LiveGitRepo::new(&settings.repo_path)),
                Arc::clone(&session.git),
            )),
            extractor: Arc::new(PythonExtractor),
            resolver: Arc::new(RecordingResolver::new(
                Box::new(LexicalResolver::new(&settings.repo_path, &settings.source_extension)),
                Arc::clone(&session.resolver),
            )),
            llm: Arc::new(RecordingLlmClient::new(
                Box::new(LiveLlmClient::new()),
                Arc::clone(&session.llm),
            )),
        };
        Ok((ctx, session))
    }

    /// Replaying context serving every port from one cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = Cassette::load(path)
            .map_err(|e| format!("Failed to load cassette {}: {e}", path.display()))?;
        let replayer = || CassetteReplayer::new(&cassette);
        Ok(Self {
            fs: Arc::new(ReplayingFileSystem::new(replayer())),
            git: Arc::new(ReplayingGitRepo::new(replayer())),
            extractor: Arc::new(PythonExtractor),
            resolver: Arc::new(ReplayingResolver::new(replayer())),
            llm: Arc::new(ReplayingLlmClient::new(replayer())),
        })
    }

    /// Replaying context from per-port cassettes. Ports without one panic
    /// when called.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured cassette cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        Ok(Self {
            fs: match replayers.fs {
                Some(r) => Arc::new(ReplayingFileSystem::new(r)),
                None => Arc::new(PanickingFileSystem),
            },
            git: match replayers.git {
                Some(r) => Arc::new(ReplayingGitRepo::new(r)),
                None => Arc::new(PanickingGitRepo),
            },
            extractor: Arc::new(PythonExtractor),
            resolver: match replayers.resolver {
                Some(r) => Arc::new(ReplayingResolver::new(r)),
                None => Arc::new(PanickingResolver),
            },
            llm: match replayers.llm {
                Some(r) => Arc::new(ReplayingLlmClient::new(r)),
                None => Arc::new(PanickingLlmClient),
            },
        })
    }
}

// Stand-ins for ports that have no cassette.

struct PanickingFileSystem;
impl FileSystem for PanickingFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        panic!("fs port not configured in CassetteConfig (read_to_string {})", path.display());
    }
    fn write(&self, path: &Path, _contents: &str) -> Result<(), PortError> {
        panic!("fs port not configured in CassetteConfig (write {})", path.display());
    }
    fn exists(&self, path: &Path) -> bool {
        panic!("fs port not configured in CassetteConfig (exists {})", path.display());
    }
    fn list_dir(&self, path: &Path) -> Result<Vec<String>, PortError> {
        panic!("fs port not configured in CassetteConfig (list_dir {})", path.display());
    }
}

struct PanickingGitRepo;
impl GitRepo for PanickingGitRepo {
    fn list_files(&self) -> Result<Vec<String>, PortError> {
        panic!("git port not configured in CassetteConfig (list_files)");
    }
    fn staged_changes(&self) -> Result<Vec<StagedFile>, PortError> {
        panic!("git port not configured in CassetteConfig (staged_changes)");
    }
    fn file_diff(&self, path: &str, _is_new: bool) -> Result<String, PortError> {
        panic!("git port not configured in CassetteConfig (file_diff {path})");
    }
    fn previous_version(&self, path: &str) -> Result<Option<String>, PortError> {
        panic!("git port not configured in CassetteConfig (previous_version {path})");
    }
    fn stage(&self, _paths: &[String]) -> Result<(), PortError> {
        panic!("git port not configured in CassetteConfig (stage)");
    }
}

struct PanickingResolver;
impl ReferenceResolver for PanickingResolver {
    fn find_referencers(&self, query: &ReferenceQuery) -> Result<Vec<Referencer>, PortError> {
        panic!("resolver port not configured in CassetteConfig (find_referencers {})", query.name);
    }
}

struct PanickingLlmClient;
impl LlmClient for PanickingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> LlmFuture<'_> {
        panic!("llm port not configured in CassetteConfig (complete)");
    }
}
