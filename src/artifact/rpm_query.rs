//! Artifact source backed by `rpm` queries
//!
//! Package headers and file lists are read with a single `rpm --queryformat`
//! call per artifact:
//!
//! ```text
//! NAME<TAB>foo
//! ARCH<TAB>x86_64
//! ...
//! FILE<TAB>100755<TAB>0<TAB>/usr/bin/foo
//! ```

use super::{run_tool, Artifact, ArtifactError, ArtifactKind, ArtifactSource, InstalledArtifact};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const HEADER_TAGS: &[&str] = &[
    "NAME",
    "VERSION",
    "RELEASE",
    "ARCH",
    "VENDOR",
    "DISTRIBUTION",
    "URL",
    "PACKAGER",
    "LICENSE",
    "SUMMARY",
    "SOURCERPM",
];

const RPMFILE_DOC: u32 = 1 << 1;
const RPMFILE_GHOST: u32 = 1 << 6;

/// Value rpm prints for an unset tag
const UNSET: &str = "(none)";

fn query_format() -> String {
    let mut fmt = String::new();
    for tag in HEADER_TAGS {
        fmt.push_str(&format!("{}\\t%{{{}}}\\n", tag, tag));
    }
    fmt.push_str("[FILE\\t%{FILEMODES:octal}\\t%{FILEFLAGS}\\t%{FILENAMES}\\n]");
    fmt
}

#[derive(Debug, Clone)]
pub struct RpmQuerySource {
    program: String,
    timeout: Duration,
}

impl RpmQuerySource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "rpm".to_string(),
            timeout,
        }
    }

    /// Use a different `rpm` executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn query(&self, args: &[&str]) -> Result<String, ArtifactError> {
        let mut cmd = vec![self.program.as_str()];
        cmd.extend_from_slice(args);
        let out = run_tool(&cmd, self.timeout)?;
        if !out.success() {
            let message = if out.stderr.trim().is_empty() {
                out.stdout.trim().to_string()
            } else {
                out.stderr.trim().to_string()
            };
            return Err(ArtifactError::ToolFailed {
                tool: self.program.clone(),
                message,
            });
        }
        Ok(out.stdout)
    }
}

impl ArtifactSource for RpmQuerySource {
    fn open(&self, path: &Path, _extract_dir: &Path) -> Result<Box<dyn Artifact>, ArtifactError> {
        let path_arg = path.to_string_lossy();
        let fmt = query_format();
        let output = self
            .query(&["-qp", "--nosignature", "--qf", &fmt, &path_arg])
            .map_err(|e| match e {
                ArtifactError::ToolFailed { message, .. } => ArtifactError::Unreadable {
                    path: path.to_path_buf(),
                    reason: message,
                },
                other => other,
            })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path_arg.to_string());
        QueriedPackage::parse(&output, filename)
            .map(|pkg| Box::new(pkg) as Box<dyn Artifact>)
            .ok_or_else(|| ArtifactError::Unreadable {
                path: path.to_path_buf(),
                reason: "not a package (no NAME in header)".to_string(),
            })
    }

    fn installed(&self, name: &str) -> Result<Vec<InstalledArtifact>, ArtifactError> {
        let cmd = [self.program.as_str(), "-q", "--qf", "%{NAME}\\t%{ARCH}\\n", name];
        let out = run_tool(&cmd, self.timeout)?;
        if !out.success() {
            // "package foo is not installed"
            debug!("No installed package matches {}", name);
            return Ok(Vec::new());
        }
        Ok(out
            .stdout
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(n, arch)| InstalledArtifact::new(n, arch))
            .collect())
    }

    fn open_installed(
        &self,
        installed: &InstalledArtifact,
        _extract_dir: &Path,
    ) -> Result<Box<dyn Artifact>, ArtifactError> {
        let label = installed.label();
        let fmt = query_format();
        let output = self.query(&["-q", "--qf", &fmt, &label])?;
        QueriedPackage::parse(&output, format!("{}.rpm", label))
            .map(|pkg| Box::new(pkg) as Box<dyn Artifact>)
            .ok_or_else(|| ArtifactError::Unreadable {
                path: label.into(),
                reason: "empty header".to_string(),
            })
    }
}

/// Header and file list of a queried package
#[derive(Debug, Clone)]
struct QueriedPackage {
    name: String,
    kind: ArtifactKind,
    filename: String,
    headers: BTreeMap<String, String>,
    files: Vec<String>,
    modes: HashMap<String, u32>,
    ghosts: BTreeSet<String>,
    docs: BTreeSet<String>,
}

impl QueriedPackage {
    fn parse(output: &str, filename: String) -> Option<Self> {
        let mut headers = BTreeMap::new();
        let mut files = Vec::new();
        let mut modes = HashMap::new();
        let mut ghosts = BTreeSet::new();
        let mut docs = BTreeSet::new();

        for line in output.lines() {
            if let Some(rest) = line.strip_prefix("FILE\t") {
                let mut parts = rest.splitn(3, '\t');
                let (Some(mode), Some(flags), Some(path)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    continue;
                };
                let flags: u32 = flags.parse().unwrap_or(0);
                if let Ok(mode) = u32::from_str_radix(mode, 8) {
                    modes.insert(path.to_string(), mode);
                }
                if flags & RPMFILE_GHOST != 0 {
                    ghosts.insert(path.to_string());
                }
                if flags & RPMFILE_DOC != 0 {
                    docs.insert(path.to_string());
                }
                files.push(path.to_string());
            } else if let Some((tag, value)) = line.split_once('\t') {
                if value != UNSET && !value.is_empty() {
                    headers.insert(tag.to_string(), value.to_string());
                }
            }
        }

        let base = headers.get("NAME")?.clone();
        let kind = if headers.contains_key("SOURCERPM") {
            ArtifactKind::Binary
        } else {
            ArtifactKind::Source
        };
        let name = match kind {
            ArtifactKind::Source => format!("{}.src", base),
            _ => match headers.get("ARCH") {
                Some(arch) => format!("{}.{}", base, arch),
                None => base,
            },
        };

        Some(Self {
            name,
            kind,
            filename,
            headers,
            files,
            modes,
            ghosts,
            docs,
        })
    }
}

impl Artifact for QueriedPackage {
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
}
