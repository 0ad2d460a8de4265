//! Orchestrator tests against in-memory packages
//!
//! Package archives are empty files on disk (so target classification sees
//! real paths); their content comes from a `MemorySource`.

use rpmlint::artifact::{Artifact, MemoryArtifact, MemorySource};
use rpmlint::checks::{Capability, Check, CheckRegistry, BINARY_ONLY};
use rpmlint::config::{resolve, ConfigLayer, Configuration};
use rpmlint::lint::{Lint, LintError};
use rpmlint::models::{exit_code, RunResult, Severity};
use rpmlint::sink::Emitter;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn config(extra: &str) -> Configuration {
    resolve(&[ConfigLayer::Defaults, ConfigLayer::inline("test", extra)]).unwrap()
}

/// Create an empty archive file and register its in-memory content
fn add_package(
    dir: &Path,
    source: MemorySource,
    file: &str,
    artifact: MemoryArtifact,
) -> MemorySource {
    let path = dir.join(file);
    std::fs::write(&path, "").unwrap();
    source.with_archive(path, artifact)
}

fn target(dir: &TempDir, file: &str) -> String {
    dir.path().join(file).display().to_string()
}

fn noisy_package(name: &str) -> MemoryArtifact {
    MemoryArtifact::binary(name)
        .with_file("/usr/weird/file", 0o644)
        .with_file("/usr/share/man/man1/foo.1", 0o644)
        .with_header("URL", "https://example.org")
}

fn batch(dir: &Path, workers: usize) -> RunResult {
    let mut source = MemorySource::new();
    let mut targets = Vec::new();
    for i in 0..12 {
        let file = format!("pkg{:02}-1.0-1.x86_64.rpm", i);
        source = add_package(dir, source, &file, noisy_package(&format!("pkg{:02}", i)));
        targets.push(dir.join(&file).display().to_string());
    }
    std::fs::write(dir.join("broken.rpm"), "").unwrap();
    source = source.with_broken(dir.join("broken.rpm"), "truncated header");
    targets.push(dir.join("broken.rpm").display().to_string());

    Lint::new(config("default_score = 3"), Arc::new(source))
        .with_workers(workers)
        .run(&targets)
        .unwrap()
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let sequential = batch(dir.path(), 1);
    let parallel = batch(dir.path(), 4);

    assert_eq!(sequential.messages, parallel.messages);
    assert_eq!(sequential.counts, parallel.counts);
    assert_eq!(sequential.score, parallel.score);
    assert_eq!(sequential.packages_checked, 12);
    assert_eq!(parallel.packages_checked, 12);
    // 12 x (non-standard-dir-in-usr, manpage-not-compressed, network-checks-disabled) + read-error
    assert_eq!(sequential.messages.len(), 37);
    assert_eq!(sequential.score, 25 * 3);
}

#[test]
fn test_bad_artifact_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemorySource::new().with_broken(dir.path().join("bad.rpm"), "not an rpm");
    std::fs::write(dir.path().join("bad.rpm"), "").unwrap();
    let source = add_package(
        dir.path(),
        source,
        "good.rpm",
        MemoryArtifact::binary("good").with_header("URL", "https://example.org"),
    );

    let result = Lint::new(config(""), Arc::new(source))
        .run(&[target(&dir, "bad.rpm"), target(&dir, "good.rpm")])
        .unwrap();

    let warnings: Vec<_> = result
        .messages
        .iter()
        .filter(|m| m.id == "read-error")
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert!(warnings[0].artifact.as_deref().unwrap().ends_with("bad.rpm"));
    assert_eq!(result.packages_checked, 1);
}

#[test]
fn test_single_error_exits_64() {
    let dir = tempfile::tempdir().unwrap();
    let source = add_package(
        dir.path(),
        MemorySource::new(),
        "foo.src.rpm",
        MemoryArtifact::source("foo")
            .with_file("foo.spec", 0o644)
            .with_file("foo-old.spec", 0o644)
            .with_header("URL", "https://example.org"),
    );

    let result = Lint::new(config(""), Arc::new(source))
        .run(&[target(&dir, "foo.src.rpm")])
        .unwrap();
    assert_eq!(result.counts.errors, 1);
    assert_eq!(result.exit_code(), exit_code::ERRORS);
}

#[test]
fn test_score_over_threshold_exits_66() {
    let dir = tempfile::tempdir().unwrap();
    let source = add_package(
        dir.path(),
        MemorySource::new(),
        "foo.rpm",
        MemoryArtifact::binary("foo"),
    );

    let result = Lint::new(
        config("badness_threshold = 50\n[scoring]\nno-url-tag = 80\n"),
        Arc::new(source),
    )
    .run(&[target(&dir, "foo.rpm")])
    .unwrap();

    assert_eq!(result.counts.errors, 0);
    assert_eq!(result.score, 80);
    assert_eq!(result.exit_code(), exit_code::BADNESS);
}

#[test]
fn test_score_suppression_keeps_raw_counts() {
    let dir = tempfile::tempdir().unwrap();
    let source = add_package(
        dir.path(),
        MemorySource::new(),
        "foo.rpm",
        MemoryArtifact::binary("foo"),
    );
    let targets = [target(&dir, "foo.rpm")];

    let scored = Lint::new(config("default_score = 7"), Arc::new(source.clone()))
        .run(&targets)
        .unwrap();
    let suppressed = Lint::new(
        config("default_score = 7\nscore_filters = [\"no-url-tag\"]"),
        Arc::new(source),
    )
    .run(&targets)
    .unwrap();

    assert_eq!(scored.score, 7);
    assert_eq!(suppressed.score, 0);
    assert_eq!(scored.counts, suppressed.counts);
    // Score-only suppression leaves the report untouched
    assert_eq!(suppressed.displayed.len(), 1);
}

#[test]
fn test_display_suppression_keeps_score() {
    let dir = tempfile::tempdir().unwrap();
    let source = add_package(
        dir.path(),
        MemorySource::new(),
        "foo.rpm",
        MemoryArtifact::binary("foo"),
    );

    let result = Lint::new(
        config("default_score = 7\ndisplay_filters = [\"foo: W: no-url\"]"),
        Arc::new(source),
    )
    .run(&[target(&dir, "foo.rpm")])
    .unwrap();

    assert_eq!(result.score, 7);
    assert!(result.displayed.is_empty());
    assert_eq!(result.messages.len(), 1);
}

#[test]
fn test_installed_packages() {
    let source = MemorySource::new()
        .with_installed("x86_64", MemoryArtifact::binary("zsh"))
        .with_installed("noarch", MemoryArtifact::binary("zsh"));

    let result = Lint::new(config(""), Arc::new(source))
        .run(&["zsh".to_string(), "nosuchpackage".to_string()])
        .unwrap();

    assert_eq!(result.packages_checked, 2);
    assert!(result
        .messages
        .iter()
        .any(|m| m.text == "(none): E: no-installed-packages nosuchpackage"));
    assert_eq!(result.exit_code(), exit_code::ERRORS);
}

#[test]
fn test_every_artifact_is_closed() {
    let dir = tempfile::tempdir().unwrap();
    let closes = Arc::new(AtomicUsize::new(0));
    let mut source = MemorySource::new();
    let mut targets = Vec::new();
    for i in 0..5 {
        let file = format!("p{}.rpm", i);
        source = add_package(
            dir.path(),
            source,
            &file,
            MemoryArtifact::binary(&format!("p{}", i)).track_close(Arc::clone(&closes)),
        );
        targets.push(target(&dir, &file));
    }

    Lint::new(config(""), Arc::new(source))
        .with_workers(3)
        .run(&targets)
        .unwrap();
    assert_eq!(closes.load(Ordering::SeqCst), 5);
}

static SEEN: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn recording_factory(_: &Configuration) -> Arc<dyn Check> {
    struct Global;
    impl Check for Global {
        fn name(&self) -> &'static str {
            "Global"
        }
        fn capabilities(&self) -> &'static [Capability] {
            BINARY_ONLY
        }
        fn inspect_binary(&self, pkg: &dyn Artifact, _out: &Emitter) -> anyhow::Result<()> {
            SEEN.lock().unwrap().push(pkg.name().to_string());
            Ok(())
        }
    }
    Arc::new(Global)
}

#[test]
fn test_custom_check_only_sees_its_kind() {
    let dir = tempfile::tempdir().unwrap();
    let source = add_package(
        dir.path(),
        MemorySource::new(),
        "bin.rpm",
        MemoryArtifact::binary("bin"),
    );
    let source = add_package(dir.path(), source, "src.src.rpm", MemoryArtifact::source("src"));
    std::fs::write(dir.path().join("foo.spec"), "Name: foo\n").unwrap();

    let mut registry = CheckRegistry::empty();
    registry.register_factory("Global", recording_factory);

    let result = Lint::new(config("checks = [\"Global\"]"), Arc::new(source))
        .with_registry(registry)
        .run(&[
            target(&dir, "bin.rpm"),
            target(&dir, "src.src.rpm"),
            target(&dir, "foo.spec"),
        ])
        .unwrap();

    assert_eq!(*SEEN.lock().unwrap(), vec!["bin".to_string()]);
    assert_eq!(result.packages_checked, 2);
    assert_eq!(result.specfiles_checked, 1);
    // Built-ins were not registered in this registry
    assert_eq!(
        result
            .messages
            .iter()
            .filter(|m| m.id == "unknown-check")
            .count(),
        7
    );
}

static BUILT: AtomicUsize = AtomicUsize::new(0);

fn counted_factory(_: &Configuration) -> Arc<dyn Check> {
    struct Counted;
    impl Check for Counted {
        fn name(&self) -> &'static str {
            "Counted"
        }
        fn capabilities(&self) -> &'static [Capability] {
            BINARY_ONLY
        }
    }
    BUILT.fetch_add(1, Ordering::SeqCst);
    Arc::new(Counted)
}

#[test]
fn test_each_run_builds_its_own_checks() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(add_package(
        dir.path(),
        MemorySource::new(),
        "foo.rpm",
        MemoryArtifact::binary("foo"),
    ));
    let targets = [target(&dir, "foo.rpm")];

    let run = || {
        let mut registry = CheckRegistry::new();
        registry.register_factory("Counted", counted_factory);
        Lint::new(config("checks = [\"Counted\", \"Counted\"]"), source.clone())
            .with_registry(registry)
            .run(&targets)
            .unwrap()
    };
    let first = run();
    let second = run();

    assert_eq!(BUILT.load(Ordering::SeqCst), 2);
    assert_eq!(first.messages, second.messages);
    assert_eq!(first.score, second.score);
}

#[test]
fn test_per_artifact_override_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = add_package(
        dir.path(),
        MemorySource::new(),
        "foo-1.0-1.x86_64.rpm",
        MemoryArtifact::binary("foo"),
    );
    let source = add_package(
        dir.path(),
        source,
        "bar-1.0-1.x86_64.rpm",
        MemoryArtifact::binary("bar"),
    );
    std::fs::write(
        dir.path().join("foo-1.0-1-rpmlintrc"),
        "filters = [\"no-url-tag\"]\n",
    )
    .unwrap();

    let result = Lint::new(config(""), Arc::new(source))
        .run(&[dir.path().display().to_string()])
        .unwrap();

    let shown: Vec<&str> = result.displayed.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(shown, vec!["bar: W: no-url-tag"]);
    assert_eq!(result.counts.warnings, 2);
}

#[test]
fn test_explicit_overrides_can_enable_checks() {
    let dir = tempfile::tempdir().unwrap();
    let source = add_package(
        dir.path(),
        MemorySource::new(),
        "foo.rpm",
        MemoryArtifact::binary("foo"),
    );
    let overrides =
        rpmlint::config::ArtifactOverrides::parse("test", r#"disable_checks = ["TagsCheck"]"#)
            .unwrap();

    let result = Lint::new(config(""), Arc::new(source))
        .with_overrides(overrides)
        .run(&[target(&dir, "foo.rpm")])
        .unwrap();
    assert!(result.messages.is_empty());
    assert_eq!(result.packages_checked, 1);
}

#[test]
fn test_recipe_from_reader() {
    let result = Lint::new(config(""), Arc::new(MemorySource::new()))
        .with_stdin("Name: foo\nPrefix: /opt\n".as_bytes())
        .run(&["-".to_string()])
        .unwrap();

    assert_eq!(result.specfiles_checked, 1);
    assert_eq!(result.messages[0].text, "(standard input): W: hardcoded-prefix-tag /opt");
}

#[test]
fn test_no_targets() {
    let result = Lint::new(config(""), Arc::new(MemorySource::new())).run(&[]);
    assert!(matches!(result, Err(LintError::Usage(_))));
}

#[test]
fn test_missing_directory_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "").unwrap();
    let result = Lint::new(config(""), Arc::new(MemorySource::new()))
        .run(&[dir.path().display().to_string()])
        .unwrap();
    assert_eq!(
        result.summary_line(),
        "0 packages and 0 specfiles checked; 0 errors, 0 warnings."
    );
    assert_eq!(result.exit_code(), exit_code::OK);
}
