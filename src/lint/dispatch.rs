//! Per-artifact dispatch: open, run every applicable check, close

use super::targets::{Target, WorkItem};
use crate::artifact::{
    Artifact, ArtifactError, ArtifactGuard, ArtifactKind, ArtifactSource, RecipeFile,
};
use crate::checks::{Check, CheckRegistry};
use crate::sink::{Checked, Emitter};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How one work item ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Checked,
    /// Could not be opened; reported as `read-error`
    Unreadable,
    /// Stopped, or never started, because the run was cancelled
    Cancelled,
}

pub(crate) struct Dispatcher<'a> {
    pub registry: &'a CheckRegistry,
    pub source: &'a dyn ArtifactSource,
    pub cancel: &'a CancellationToken,
}

impl Dispatcher<'_> {
    pub fn dispatch(&self, target: &Target, out: &Emitter) -> Outcome {
        if self.cancel.is_cancelled() {
            return Outcome::Cancelled;
        }

        let artifact = match self.open(target) {
            Ok(artifact) => ArtifactGuard::new(artifact),
            Err(e) => {
                warn!("Cannot read {}: {}", target.label, e);
                out.for_artifact(&target.label, Arc::clone(&target.config))
                    .warning("read-error", vec![e.to_string()]);
                return Outcome::Unreadable;
            }
        };

        let kind = artifact.kind();
        let emitter = out.for_artifact(artifact.name(), Arc::clone(&target.config));
        let checks = self.registry.applicable(target.config.checks(), kind);
        debug!("Checking {} ({}) with {} checks", artifact.name(), kind, checks.len());

        for check in &checks {
            if self.cancel.is_cancelled() {
                return Outcome::Cancelled;
            }
            run_check(check.as_ref(), &*artifact, &emitter);
        }

        emitter.checked(match kind {
            ArtifactKind::Recipe => Checked::Specfile,
            ArtifactKind::Source | ArtifactKind::Binary => Checked::Package,
        });
        Outcome::Checked
    }

    fn open(&self, target: &Target) -> Result<Box<dyn Artifact>, ArtifactError> {
        let extract_dir = target.config.extract_dir();
        match &target.item {
            WorkItem::Recipe(path) => Ok(Box::new(RecipeFile::from_path(path)?)),
            WorkItem::Stdin(recipe) => Ok(Box::new(recipe.clone())),
            WorkItem::Archive(path) => self.source.open(path, &extract_dir),
            WorkItem::Installed(installed) => self.source.open_installed(installed, &extract_dir),
        }
    }
}

/// Run one check; errors and panics become a `check-failed` warning
fn run_check(check: &dyn Check, artifact: &dyn Artifact, out: &Emitter) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| check.inspect(artifact, out)));
    let failure = match result {
        Ok(Ok(())) => return,
        Ok(Err(e)) => format!("{:#}", e),
        Err(payload) => panic_message(payload.as_ref()),
    };
    warn!("{} failed on {}: {}", check.name(), artifact.name(), failure);
    out.warning("check-failed", vec![check.name().to_string(), failure]);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{MemoryArtifact, MemorySource};
    use crate::checks::{Capability, PACKAGES};
    use crate::config::Configuration;
    use crate::models::Message;
    use crate::sink::{channel, MessageSink};
    use anyhow::{bail, Result};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Exploding;

    impl Check for Exploding {
        fn name(&self) -> &'static str {
            "Exploding"
        }

        fn capabilities(&self) -> &'static [Capability] {
            PACKAGES
        }

        fn inspect_binary(&self, _pkg: &dyn Artifact, _out: &Emitter) -> Result<()> {
            panic!("boom");
        }

        fn inspect_source(&self, _pkg: &dyn Artifact, _out: &Emitter) -> Result<()> {
            bail!("cannot parse header")
        }
    }

    struct Quiet;

    impl Check for Quiet {
        fn name(&self) -> &'static str {
            "Quiet"
        }

        fn capabilities(&self) -> &'static [Capability] {
            PACKAGES
        }

        fn inspect_binary(&self, _pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
            out.info("quiet-ran", vec![]);
            Ok(())
        }
    }

    fn registry() -> (CheckRegistry, Arc<Configuration>) {
        let mut registry = CheckRegistry::empty();
        registry.register_factory("Exploding", |_| Arc::new(Exploding) as Arc<dyn Check>);
        registry.register_factory("Quiet", |_| Arc::new(Quiet) as Arc<dyn Check>);
        let config = Arc::new(
            crate::config::resolve(&[crate::config::ConfigLayer::inline(
                "test",
                "checks = [\"Exploding\", \"Quiet\"]",
            )])
            .unwrap(),
        );
        let mut sink = MessageSink::new(Arc::clone(&config));
        registry.load(config.checks(), &config, &mut sink);
        (registry, config)
    }

    fn run(
        source: &MemorySource,
        target: Target,
        cancel: &CancellationToken,
    ) -> (Outcome, Vec<Message>) {
        let (registry, config) = registry();
        let (tx, rx) = channel();
        let out = Emitter::run_level(tx, Arc::clone(&config));
        let dispatcher = Dispatcher {
            registry: &registry,
            source,
            cancel,
        };
        let outcome = dispatcher.dispatch(&target, &out);
        drop(out);

        let mut sink = MessageSink::new(config);
        sink.consume(&rx);
        (outcome, sink.into_result(false).messages)
    }

    fn archive(path: &str, config: &Arc<Configuration>) -> Target {
        Target {
            label: path.to_string(),
            item: WorkItem::Archive(PathBuf::from(path)),
            config: Arc::clone(config),
        }
    }

    #[test]
    fn test_panicking_check_does_not_stop_dispatch() {
        let closes = Arc::new(AtomicUsize::new(0));
        let source = MemorySource::new().with_archive(
            "foo.rpm",
            MemoryArtifact::binary("foo").track_close(Arc::clone(&closes)),
        );
        let (_, config) = registry();

        let (outcome, messages) =
            run(&source, archive("foo.rpm", &config), &CancellationToken::new());

        assert_eq!(outcome, Outcome::Checked);
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["foo: W: check-failed Exploding boom", "foo: I: quiet-ran"]);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_check_is_reported() {
        let source = MemorySource::new().with_archive("foo.src.rpm", MemoryArtifact::source("foo"));
        let (_, config) = registry();

        let (_, messages) =
            run(&source, archive("foo.src.rpm", &config), &CancellationToken::new());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "foo: W: check-failed Exploding cannot parse header");
    }

    #[test]
    fn test_unreadable_artifact() {
        let source = MemorySource::new().with_broken("bad.rpm", "not an rpm");
        let (_, config) = registry();

        let (outcome, messages) =
            run(&source, archive("bad.rpm", &config), &CancellationToken::new());
        assert_eq!(outcome, Outcome::Unreadable);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "bad.rpm: W: read-error bad.rpm: not an rpm");
    }

    #[test]
    fn test_cancelled_before_open() {
        let closes = Arc::new(AtomicUsize::new(0));
        let source = MemorySource::new().with_archive(
            "foo.rpm",
            MemoryArtifact::binary("foo").track_close(Arc::clone(&closes)),
        );
        let (_, config) = registry();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (outcome, messages) = run(&source, archive("foo.rpm", &config), &cancel);
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(messages.is_empty());
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }
}
