//! The engine ties one FASTA file to its index.
//!
//! A [`FastaEngine`] is opened on a source path. Initializing it either loads
//! the persisted index next to the source or starts a background build; the
//! build runs on a blocking tokio task while the caller keeps going and
//! watches progress through its [`EngineObserver`](events::EngineObserver).
//!
//! While a build is running the engine is `Busy` and rejects both queries and
//! further builds. The index only becomes visible once it is complete.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fasta_extract::engine::config::{EngineConfig, ExtractOptions};
//! use fasta_extract::engine::events::TracingObserver;
//! use fasta_extract::engine::FastaEngine;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), fasta_extract::engine::EngineError> {
//! let engine = FastaEngine::open("genome.fa.gz", EngineConfig::default(), Arc::new(TracingObserver))?;
//! if let Some(build) = engine.initialize()? {
//!     build.wait().await?;
//! }
//!
//! let mut out = Vec::new();
//! engine.run_script("Baby Chr0 200 100\n", ExtractOptions::default(), &mut out)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod events;
pub mod interpreter;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::core::record::SequenceRecord;
use crate::index::builder::{BuildError, IndexBuilder};
use crate::index::locator::{LocateError, RecordLocator};
use crate::index::store::{index_path_for, SeqIndex, StoreError};
use crate::parsing::gzip::{decompress_to, is_gzipped, working_path_for, DecompressError};

use config::{ConfigError, EngineConfig, ExtractOptions};
use events::{EngineObserver, EngineState};
use interpreter::{ScriptError, ScriptInterpreter, ScriptSummary};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Cannot find target FASTA file {}, enter a valid one", .0.display())]
    SourceNotFound(PathBuf),

    #[error("The FASTA index is being built, please wait")]
    Busy,

    #[error("No FASTA index is available yet; initialize the engine first")]
    NotReady,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Decompress(#[from] DecompressError),

    #[error("Index build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Index store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("Script failed: {0}")]
    Script(#[from] ScriptError),

    #[error("Index builds need a tokio runtime: {0}")]
    Runtime(String),

    #[error("Index build task failed: {0}")]
    Task(String),
}

/// Outcome of a completed index build
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    /// Number of records in the new index
    pub records: usize,
    /// Size of the scanned working file
    pub working_len: u64,
    /// Whether a compressed source was extracted during the build
    pub extracted: bool,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Handle to a background index build
pub struct BuildTask {
    handle: JoinHandle<Result<BuildSummary, EngineError>>,
}

impl BuildTask {
    /// Wait for the build to finish
    ///
    /// # Errors
    ///
    /// Returns the build's own error, or `EngineError::Task` if the task
    /// panicked or was cancelled.
    pub async fn wait(self) -> Result<BuildSummary, EngineError> {
        self.handle
            .await
            .map_err(|e| EngineError::Task(e.to_string()))?
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

struct EngineInner {
    source: PathBuf,
    working: PathBuf,
    index_path: PathBuf,
    config: EngineConfig,
    observer: Arc<dyn EngineObserver>,
    state: Mutex<EngineState>,
    index: RwLock<Option<Arc<SeqIndex>>>,
}

/// An opened FASTA file and its index
///
/// Cloning is cheap; clones share the same state and index.
#[derive(Clone)]
pub struct FastaEngine {
    inner: Arc<EngineInner>,
}

impl FastaEngine {
    /// Open `source` without touching any index yet
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SourceNotFound` if `source` is not a readable
    /// file, or `EngineError::Config` for an invalid configuration.
    pub fn open(
        source: impl AsRef<Path>,
        config: EngineConfig,
        observer: Arc<dyn EngineObserver>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let source = source.as_ref();
        if !source.is_file() {
            return Err(EngineError::SourceNotFound(source.to_path_buf()));
        }

        Ok(Self {
            inner: Arc::new(EngineInner {
                source: source.to_path_buf(),
                working: working_path_for(source),
                index_path: index_path_for(source),
                config,
                observer,
                state: Mutex::new(EngineState::Uninitialized),
                index: RwLock::new(None),
            }),
        })
    }

    /// Load the persisted index, or start building one.
    ///
    /// Returns `None` when a persisted index was loaded and the engine is
    /// ready, or the handle of the background build otherwise. With
    /// `EngineConfig::rebuild` set, a build is always started.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Busy` if a build is already running, or
    /// `EngineError::Runtime` when called outside a tokio runtime and a build
    /// is needed.
    pub fn initialize(&self) -> Result<Option<BuildTask>, EngineError> {
        if !self.inner.config.rebuild {
            // Builds cannot start while the loaded index is being published
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == EngineState::Busy {
                return Err(EngineError::Busy);
            }

            match self.load_persisted() {
                Ok(index) => {
                    info!(
                        "Loaded index with {} record(s) from {}",
                        index.len(),
                        self.inner.index_path.display()
                    );
                    self.publish(index);
                    *state = EngineState::Ready;
                    drop(state);
                    self.inner
                        .observer
                        .on_status(EngineState::Ready, "Initialized, Ready for Execution");
                    return Ok(None);
                }
                Err(StoreError::NotFound(_)) => {
                    info!("Target FASTA does not have a valid index, rebuilding");
                }
                Err(e) => {
                    warn!("Ignoring unreadable index: {e}");
                }
            }
        }

        self.start_build(self.inner.config.rebuild).map(Some)
    }

    /// Start a build that ignores the persisted index and, for compressed
    /// sources, re-extracts the working copy.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Busy` if a build is already running.
    pub fn rebuild(&self) -> Result<BuildTask, EngineError> {
        self.start_build(true)
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The published index, if any
    pub fn index(&self) -> Option<Arc<SeqIndex>> {
        self.inner
            .index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn source(&self) -> &Path {
        &self.inner.source
    }

    /// The plain-text file that is indexed and read
    pub fn working_path(&self) -> &Path {
        &self.inner.working
    }

    pub fn index_path(&self) -> &Path {
        &self.inner.index_path
    }

    /// A locator with its own read handle on the working file
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Busy` during a build, `EngineError::NotReady`
    /// without an index, or an I/O error opening the working file.
    pub fn locator(&self) -> Result<RecordLocator, EngineError> {
        let index = self.ready_index()?;
        Ok(RecordLocator::open(&self.inner.working, index)?)
    }

    /// Retrieve one record by exact name
    ///
    /// # Errors
    ///
    /// See [`RecordLocator::find_one`] and [`FastaEngine::locator`].
    pub fn find_one(&self, name: &str) -> Result<SequenceRecord, EngineError> {
        Ok(self.locator()?.find_one(name)?)
    }

    /// Retrieve every record matching a glob
    ///
    /// # Errors
    ///
    /// See [`RecordLocator::find_many`] and [`FastaEngine::locator`].
    pub fn find_many(
        &self,
        pattern: &str,
        match_description: bool,
        ignore_case: bool,
    ) -> Result<Vec<SequenceRecord>, EngineError> {
        Ok(self
            .locator()?
            .find_many(pattern, match_description, ignore_case)?)
    }

    /// Run an extraction script, streaming FASTA output into `sink`
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Busy` / `EngineError::NotReady` when no index is
    /// usable, `EngineError::Config` for invalid options, or the script's own
    /// I/O error.
    pub fn run_script<W: Write + ?Sized>(
        &self,
        script: &str,
        options: ExtractOptions,
        sink: &mut W,
    ) -> Result<ScriptSummary, EngineError> {
        options.validate()?;
        let locator = self.locator()?;
        let interpreter = ScriptInterpreter::new(&locator, options, self.inner.observer.as_ref());
        Ok(interpreter.run(script, sink)?)
    }

    fn ready_index(&self) -> Result<Arc<SeqIndex>, EngineError> {
        match self.state() {
            EngineState::Busy => Err(EngineError::Busy),
            EngineState::Ready => self.index().ok_or(EngineError::NotReady),
            EngineState::Uninitialized | EngineState::Error => Err(EngineError::NotReady),
        }
    }

    fn load_persisted(&self) -> Result<SeqIndex, StoreError> {
        let inner = &self.inner;
        // A persisted index is useless without the file it points into
        let working_len = match std::fs::metadata(&inner.working) {
            Ok(meta) => meta.len(),
            Err(_) => return Err(StoreError::NotFound(inner.working.clone())),
        };

        let index = SeqIndex::load_from_file(&inner.index_path)?;
        if index.source_len != working_len {
            warn!(
                "Index {} was built for {} bytes but {} is {} bytes; it may be stale (use --rebuild)",
                inner.index_path.display(),
                index.source_len,
                inner.working.display(),
                working_len
            );
        }
        Ok(index)
    }

    fn start_build(&self, force: bool) -> Result<BuildTask, EngineError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| EngineError::Runtime(e.to_string()))?;

        {
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == EngineState::Busy {
                return Err(EngineError::Busy);
            }
            *state = EngineState::Busy;
        }
        self.inner
            .observer
            .on_status(EngineState::Busy, "Building the FASTA index");

        let engine = self.clone();
        let handle = runtime.spawn_blocking(move || {
            let result = engine.build_blocking(force);
            match &result {
                Ok(summary) => engine.set_state(
                    EngineState::Ready,
                    &format!("Initialized ({} records)", summary.records),
                ),
                Err(e) => engine.set_state(EngineState::Error, &e.to_string()),
            }
            result
        });

        Ok(BuildTask { handle })
    }

    fn build_blocking(&self, force: bool) -> Result<BuildSummary, EngineError> {
        let inner = &self.inner;
        let started = Instant::now();

        let mut extracted = false;
        if is_gzipped(&inner.source) && (force || !inner.working.exists()) {
            decompress_to(&inner.source, &inner.working, inner.observer.as_ref())?;
            extracted = true;
        }

        let index = IndexBuilder::new(
            &inner.working,
            inner.config.threads,
            inner.config.block_size,
            inner.observer.as_ref(),
        )
        .build_and_save(&inner.index_path)?;

        let summary = BuildSummary {
            records: index.len(),
            working_len: index.source_len,
            extracted,
            elapsed: started.elapsed(),
        };
        self.publish(index);

        info!(
            "Built index with {} record(s) in {:.2?}",
            summary.records, summary.elapsed
        );
        Ok(summary)
    }

    fn publish(&self, index: SeqIndex) {
        *self
            .inner
            .index
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(index));
    }

    fn set_state(&self, state: EngineState, message: &str) {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        self.inner.observer.on_status(state, message);
    }
}
