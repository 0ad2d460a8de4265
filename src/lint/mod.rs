//! Lint orchestration
//!
//! A [`Lint`] run owns everything it touches: the check registry, the message
//! sink and the cancellation token. The flow is:
//!
//! ```text
//! load checks -> resolve targets -> rayon pool dispatches work items
//!                                        |
//!                                        v  (crossbeam channel)
//!                                  consumer thread owns MessageSink
//!                                        |
//!                            join -> sort -> RunResult
//! ```

mod cancel;
mod dispatch;
mod targets;

pub use cancel::InterruptWatcher;
pub use targets::{Target, WorkItem, STDIN_TARGET};

use crate::artifact::ArtifactSource;
use crate::checks::CheckRegistry;
use crate::config::{ArtifactOverrides, ConfigError, Configuration};
use crate::models::RunResult;
use crate::sink::{self, Emitter, MessageSink};
use dispatch::{Dispatcher, Outcome};
use rayon::prelude::*;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Upper bound for automatically sized pools
const MAX_AUTO_WORKERS: usize = 16;

/// Progress callback: (finished target, done, total)
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Reasons a run stops without a result
#[derive(Error, Debug)]
pub enum LintError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Usage(String),

    #[error("interrupted, exiting while reading {target}")]
    Interrupted { target: String },

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// One lint run over a set of targets
pub struct Lint {
    config: Arc<Configuration>,
    source: Arc<dyn ArtifactSource>,
    registry: CheckRegistry,
    overrides: ArtifactOverrides,
    workers: Option<usize>,
    verbose: bool,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
    stdin: Option<Box<dyn Read + Send>>,
}

impl Lint {
    /// Run with the built-in checks, reading artifacts from `source`
    pub fn new(config: Configuration, source: Arc<dyn ArtifactSource>) -> Self {
        Self {
            verbose: config.settings().verbose,
            config: Arc::new(config),
            source,
            registry: CheckRegistry::new(),
            overrides: ArtifactOverrides::default(),
            workers: None,
            cancel: CancellationToken::new(),
            progress: None,
            stdin: None,
        }
    }

    /// Use a custom registry (extra or replacement check factories)
    pub fn with_registry(mut self, registry: CheckRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Override file applied to every artifact
    pub fn with_overrides(mut self, overrides: ArtifactOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Worker count; 0 picks one from available parallelism
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Reader used for the `-` target (defaults to the process stdin)
    pub fn with_stdin(mut self, reader: impl Read + Send + 'static) -> Self {
        self.stdin = Some(Box::new(reader));
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Effective worker count
    pub fn workers(&self) -> usize {
        let requested = self.workers.unwrap_or(self.config.settings().workers);
        if requested > 0 {
            return requested;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .min(MAX_AUTO_WORKERS)
    }

    /// Check every target and aggregate the findings
    pub fn run(mut self, targets: &[String]) -> Result<RunResult, LintError> {
        if targets.is_empty() {
            return Err(LintError::Usage("no packages or spec files given".into()));
        }

        let (tx, rx) = sink::channel();
        let mut sink = MessageSink::new(Arc::clone(&self.config));
        let root = Emitter::run_level(tx, Arc::clone(&self.config));

        let stdin = self
            .stdin
            .take()
            .unwrap_or_else(|| Box::new(std::io::stdin()));
        let work = targets::Resolver::new(
            self.source.as_ref(),
            &root,
            &self.config,
            &self.overrides,
            &self.cancel,
            Some(stdin),
        )?
        .resolve(targets)?;

        // Override files may enable checks the run configuration does not
        let mut names: Vec<String> = self.config.checks().to_vec();
        for target in &work {
            for name in target.config.checks() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        let loaded = self.registry.load(&names, &self.config, &mut sink);
        debug!("Loaded {} checks", loaded);

        let workers = self.workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("rpmlint-worker-{}", i))
            .build()?;
        info!("Checking {} targets with {} workers", work.len(), workers);

        let dispatcher = Dispatcher {
            registry: &self.registry,
            source: self.source.as_ref(),
            cancel: &self.cancel,
        };
        let progress = self.progress.as_ref();
        let completed = AtomicUsize::new(0);
        let total = work.len();

        let (sink, interrupted) = std::thread::scope(|scope| {
            let consumer = scope.spawn(move || {
                sink.consume(&rx);
                sink
            });

            let cancelled: Vec<&str> = pool.install(|| {
                work.par_iter()
                    .filter_map(|target| {
                        let outcome = dispatcher.dispatch(target, &root);
                        if outcome == Outcome::Cancelled {
                            return Some(target.label.as_str());
                        }
                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        if let Some(callback) = progress {
                            callback(&target.label, done, total);
                        }
                        None
                    })
                    .collect()
            });
            drop(root);

            let sink = consumer
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            (sink, cancelled.first().map(|label| label.to_string()))
        });

        if self.cancel.is_cancelled() {
            let target = interrupted
                .or_else(|| work.last().map(|t| t.label.clone()))
                .unwrap_or_else(|| crate::models::RUN_SCOPE.to_string());
            return Err(LintError::Interrupted { target });
        }

        Ok(sink.into_result(self.verbose))
    }
}
