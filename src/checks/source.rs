//! Source package sanity: spec count, compression of sources and patches,
//! file permissions

use super::base::{Capability, Check, SOURCE_ONLY};
use crate::artifact::Artifact;
use crate::config::Configuration;
use crate::sink::Emitter;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static SOURCE_FILE: OnceLock<Regex> = OnceLock::new();

fn source_file() -> &'static Regex {
    SOURCE_FILE.get_or_init(|| Regex::new(r"\.(tar|patch|tgz|diff)$").expect("valid regex"))
}

pub struct SourceCheck {
    compress_ext: String,
    valid_perms: Vec<u32>,
}

impl SourceCheck {
    pub fn new(config: &Configuration) -> Self {
        let perms: Vec<String> = config.option_or("valid_src_perms", Vec::new());
        Self {
            compress_ext: config.option_or("compress_extension", String::new()),
            valid_perms: perms
                .iter()
                .filter_map(|p| u32::from_str_radix(p.trim_start_matches("0o"), 8).ok())
                .collect(),
        }
    }
}

impl Check for SourceCheck {
    fn name(&self) -> &'static str {
        "SourceCheck"
    }

    fn capabilities(&self) -> &'static [Capability] {
        SOURCE_ONLY
    }

    fn explanations(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "multiple-specfiles",
                "Your package contains multiple spec files. To build a correct package,
                you need to have only one spec file containing all your RPM information."
                    .into(),
            ),
            (
                "source-or-patch-not-compressed",
                format!(
                    "A source archive or file in your package is not compressed using the
                    {ext} compression method (doesn't have the {ext} extension).",
                    ext = self.compress_ext
                ),
            ),
            (
                "strange-permission",
                "A file that you listed to include in your package has strange
                permissions. Usually, a file should have 0644 permissions."
                    .into(),
            ),
        ]
    }

    fn inspect_source(&self, pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
        let mut spec_file: Option<&str> = None;

        for fname in pkg.files() {
            if fname.ends_with(".spec") {
                match spec_file {
                    Some(first) => {
                        out.error("multiple-specfiles", vec![first.to_string(), fname.clone()])
                    }
                    None => spec_file = Some(fname.as_str()),
                }
            } else if !self.compress_ext.is_empty()
                && source_file().is_match(fname)
                && !fname.ends_with(&self.compress_ext)
            {
                out.warning(
                    "source-or-patch-not-compressed",
                    vec![self.compress_ext.clone(), fname.clone()],
                );
            }

            if let Some(mode) = pkg.file_mode(fname) {
                let perm = mode & 0o7777;
                if !self.valid_perms.contains(&perm) {
                    out.warning("strange-permission", vec![fname.clone(), format!("{:o}", perm)]);
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
    use crate::models::Severity;

    #[test]
    fn test_source_package_problems() {
        let config = config_with("");
        let check = SourceCheck::new(&config);
        let pkg = MemoryArtifact::source("foo")
            .with_file("foo.spec", 0o644)
            .with_file("foo-extra.spec", 0o644)
            .with_file("fix-build.patch", 0o644)
            .with_file("foo-1.0.tar.gz", 0o100600);

        let messages = inspect(&check, &pkg, &config);
        let errors: Vec<_> = messages
            .iter()
            .filter(|m| m.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "foo: E: multiple-specfiles foo.spec foo-extra.spec");

        assert!(messages
            .iter()
            .any(|m| m.text == "foo: W: source-or-patch-not-compressed gz fix-build.patch"));
        assert!(messages
            .iter()
            .any(|m| m.text == "foo: W: strange-permission foo-1.0.tar.gz 600"));
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn test_binary_is_ignored() {
        let config = config_with("");
        let check = SourceCheck::new(&config);
        let pkg = MemoryArtifact::binary("foo").with_file("a.spec", 0o600);
        assert!(!check.handles(pkg.kind()));
    }
}
