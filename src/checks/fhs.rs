//! Filesystem Hierarchy Standard conformity of /usr and /var

use super::base::{Capability, Check, FileMatcher, BINARY_ONLY};
use crate::artifact::Artifact;
use crate::config::Configuration;
use crate::sink::Emitter;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::OnceLock;

const USR_SUBDIRS: &[&str] = &[
    "X11R6", "bin", "games", "include", "lib", "lib64", "local", "sbin", "share", "src", "tmp",
];

const VAR_FSSTND: &[&str] = &["adm", "catman", "local", "named", "nis", "preserve"];

const VAR_SUBDIRS: &[&str] = &[
    "account", "cache", "crash", "games", "lib", "lock", "log", "mail", "opt", "run", "spool",
    "tmp", "yp", "www", "ftp",
];

static FHS_PATHS: OnceLock<FileMatcher> = OnceLock::new();

fn fhs_paths() -> &'static FileMatcher {
    FHS_PATHS.get_or_init(|| FileMatcher::new(r"^/(usr|var)/[^/]+/").expect("valid regex"))
}

/// `/usr/<dir>/...` -> `dir`; only paths below a subdirectory count
fn subdir<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(root)?;
    let (dir, _) = rest.split_once('/')?;
    (!dir.is_empty()).then_some(dir)
}

pub struct FhsCheck;

impl FhsCheck {
    pub fn new(_config: &Configuration) -> Self {
        Self
    }
}

impl Check for FhsCheck {
    fn name(&self) -> &'static str {
        "FHSCheck"
    }

    fn capabilities(&self) -> &'static [Capability] {
        BINARY_ONLY
    }

    fn explanations(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "non-standard-dir-in-usr",
                format!(
                    "Your package is creating a non-standard subdirectory in /usr. The
                    standard directories are: {}.",
                    USR_SUBDIRS.join(", ")
                ),
            ),
            (
                "FSSTND-dir-in-var",
                format!(
                    "Your package is creating an illegal directory in /var. The FSSTND
                    (illegal) ones are: {}.",
                    VAR_FSSTND.join(", ")
                ),
            ),
            (
                "non-standard-dir-in-var",
                format!(
                    "Your package is creating a non-standard subdirectory in /var. The
                    standard directories are: {}.",
                    VAR_SUBDIRS.join(", ")
                ),
            ),
        ]
    }

    fn inspect_binary(&self, pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
        let mut seen_usr = HashSet::new();
        let mut seen_var = HashSet::new();

        for fname in fhs_paths().matching(pkg) {
            if let Some(dir) = subdir(fname, "/usr/") {
                if !USR_SUBDIRS.contains(&dir) && seen_usr.insert(dir) {
                    out.warning("non-standard-dir-in-usr", vec![dir.to_string()]);
                }
            } else if let Some(dir) = subdir(fname, "/var/") {
                if seen_var.contains(dir) {
                    continue;
                }
                if VAR_FSSTND.contains(&dir) {
                    out.warning("FSSTND-dir-in-var", vec![fname.clone()]);
                    seen_var.insert(dir);
                } else if !VAR_SUBDIRS.contains(&dir) {
                    out.warning("non-standard-dir-in-var", vec![dir.to_string()]);
                    seen_var.insert(dir);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MemoryArtifact;
    use crate::checks::testing::{config_with, inspect};

    #[test]
    fn test_subdir() {
        assert_eq!(subdir("/usr/foo/bar", "/usr/"), Some("foo"));
        assert_eq!(subdir("/usr/foo", "/usr/"), None);
        assert_eq!(subdir("/opt/x/y", "/usr/"), None);
    }

    #[test]
    fn test_non_standard_dirs_reported_once() {
        let config = config_with("");
        let pkg = MemoryArtifact::binary("foo")
            .with_file("/usr/bin/foo", 0o755)
            .with_file("/usr/weird/a", 0o644)
            .with_file("/usr/weird/b", 0o644)
            .with_file("/var/adm/foo/log", 0o644)
            .with_file("/var/adm/foo/other", 0o644)
            .with_file("/var/strange/x", 0o644)
            .with_file("/var/log/foo.log", 0o644);

        let texts: Vec<String> = inspect(&FhsCheck, &pkg, &config)
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(
            texts,
            vec![
                "foo: W: FSSTND-dir-in-var /var/adm/foo/log",
                "foo: W: non-standard-dir-in-usr weird",
                "foo: W: non-standard-dir-in-var strange",
            ]
        );
    }

    #[test]
    fn test_ghost_paths_are_ignored() {
        let config = config_with("");
        let pkg = MemoryArtifact::binary("foo")
            .with_ghost("/usr/weird/a")
            .with_ghost("/var/strange/x")
            .with_file("/usr/bin/foo", 0o755);

        assert!(inspect(&FhsCheck, &pkg, &config).is_empty());
    }
}
