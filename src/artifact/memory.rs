//! In-memory artifacts and source

use super::{Artifact, ArtifactError, ArtifactKind, ArtifactSource, InstalledArtifact};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A package described entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryArtifact {
    name: String,
    kind: ArtifactKind,
    filename: String,
    files: Vec<String>,
    modes: HashMap<String, u32>,
    ghosts: BTreeSet<String>,
    docs: BTreeSet<String>,
    headers: BTreeMap<String, String>,
    recipe: Option<Vec<String>>,
    closes: Option<Arc<AtomicUsize>>,
}

impl MemoryArtifact {
    pub fn binary(name: &str) -> Self {
        Self::new(name, ArtifactKind::Binary, format!("{}.rpm", name))
    }

    pub fn source(name: &str) -> Self {
        Self::new(name, ArtifactKind::Source, format!("{}.src.rpm", name))
    }

    fn new(name: &str, kind: ArtifactKind, filename: String) -> Self {
        Self {
            name: name.to_string(),
            kind,
            filename,
            files: Vec::new(),
            modes: HashMap::new(),
            ghosts: BTreeSet::new(),
            docs: BTreeSet::new(),
            headers: BTreeMap::new(),
            recipe: None,
            closes: None,
        }
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = filename.to_string();
        self
    }

    pub fn with_file(mut self, path: &str, mode: u32) -> Self {
        self.files.push(path.to_string());
        self.modes.insert(path.to_string(), mode);
        self
    }

    pub fn with_ghost(mut self, path: &str) -> Self {
        self.files.push(path.to_string());
        self.ghosts.insert(path.to_string());
        self
    }

    pub fn with_doc(mut self, path: &str, mode: u32) -> Self {
        self.docs.insert(path.to_string());
        self.with_file(path, mode)
    }

    pub fn with_header(mut self, tag: &str, value: &str) -> Self {
        self.headers.insert(tag.to_ascii_uppercase(), value.to_string());
        self
    }

    pub fn with_recipe(mut self, text: &str) -> Self {
        self.recipe = Some(text.lines().map(str::to_string).collect());
        self
    }

    /// Count `close()` calls into `counter`
    pub fn track_close(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.closes = Some(counter);
        self
    }
}

impl Artifact for MemoryArtifact {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ArtifactKind {
        self.kind
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn files(&self) -> &[String] {
        &self.files
    }

    fn ghost_files(&self) -> BTreeSet<String> {
        self.ghosts.clone()
    }

    fn doc_files(&self) -> BTreeSet<String> {
        self.docs.clone()
    }

    fn file_mode(&self, path: &str) -> Option<u32> {
        self.modes.get(path).copied()
    }

    fn header(&self, tag: &str) -> Option<String> {
        self.headers.get(&tag.to_ascii_uppercase()).cloned()
    }

    fn recipe_lines(&self) -> Option<&[String]> {
        self.recipe.as_deref()
    }

    fn close(&mut self) -> Result<(), ArtifactError> {
        if let Some(counter) = &self.closes {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Artifact(MemoryArtifact),
    Broken(String),
}

/// Artifact source backed by a path -> artifact map
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    archives: HashMap<PathBuf, Entry>,
    installed: Vec<(InstalledArtifact, MemoryArtifact)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_archive(mut self, path: impl Into<PathBuf>, artifact: MemoryArtifact) -> Self {
        self.archives.insert(path.into(), Entry::Artifact(artifact));
        self
    }

    /// An archive whose open fails with `reason`
    pub fn with_broken(mut self, path: impl Into<PathBuf>, reason: &str) -> Self {
        self.archives
            .insert(path.into(), Entry::Broken(reason.to_string()));
        self
    }

    pub fn with_installed(mut self, arch: &str, artifact: MemoryArtifact) -> Self {
        let entry = InstalledArtifact::new(artifact.name.clone(), arch);
        self.installed.push((entry, artifact));
        self
    }
}

impl ArtifactSource for MemorySource {
    fn open(&self, path: &Path, _extract_dir: &Path) -> Result<Box<dyn Artifact>, ArtifactError> {
        match self.archives.get(path) {
            Some(Entry::Artifact(artifact)) => Ok(Box::new(artifact.clone())),
            Some(Entry::Broken(reason)) => Err(ArtifactError::Unreadable {
                path: path.to_path_buf(),
                reason: reason.clone(),
            }),
            None => Err(ArtifactError::Unreadable {
                path: path.to_path_buf(),
                reason: "no such package".to_string(),
            }),
        }
    }

    fn installed(&self, name: &str) -> Result<Vec<InstalledArtifact>, ArtifactError> {
        Ok(self
            .installed
            .iter()
            .filter(|(entry, _)| entry.name == name)
            .map(|(entry, _)| entry.clone())
            .collect())
    }

    fn open_installed(
        &self,
        installed: &InstalledArtifact,
        _extract_dir: &Path,
    ) -> Result<Box<dyn Artifact>, ArtifactError> {
        self.installed
            .iter()
            .find(|(entry, _)| entry == installed)
            .map(|(_, artifact)| Box::new(artifact.clone()) as Box<dyn Artifact>)
            .ok_or_else(|| ArtifactError::Unreadable {
                path: installed.label().into(),
                reason: "not installed".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_artifact_accessors() {
        let pkg = MemoryArtifact::binary("foo")
            .with_file("/usr/bin/foo", 0o755)
            .with_ghost("/var/run/foo.pid")
            .with_doc("/usr/share/doc/foo/README", 0o644)
            .with_header("url", "https://example.org");

        assert_eq!(pkg.files().len(), 3);
        assert_eq!(pkg.file_mode("/usr/bin/foo"), Some(0o755));
        assert!(pkg.ghost_files().contains("/var/run/foo.pid"));
        assert!(pkg.doc_files().contains("/usr/share/doc/foo/README"));
        assert_eq!(pkg.header("URL").as_deref(), Some("https://example.org"));
        assert_eq!(pkg.filename(), "foo.rpm");
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new()
            .with_archive("/pkgs/foo.rpm", MemoryArtifact::binary("foo"))
            .with_broken("/pkgs/bad.rpm", "truncated header")
            .with_installed("x86_64", MemoryArtifact::binary("bash"));
        let tmp = std::env::temp_dir();

        assert!(source.open(Path::new("/pkgs/foo.rpm"), &tmp).is_ok());
        let err = source
            .open(Path::new("/pkgs/bad.rpm"), &tmp)
            .err()
            .unwrap();
        assert!(err.to_string().contains("truncated header"));

        let matches = source.installed("bash").unwrap();
        assert_eq!(matches, vec![InstalledArtifact::new("bash", "x86_64")]);
        assert!(source.installed("zsh").unwrap().is_empty());
        assert_eq!(source.open_installed(&matches[0], &tmp).unwrap().name(), "bash");
    }
}
