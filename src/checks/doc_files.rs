//! Documentation files in binary packages

use super::base::{Capability, Check, BINARY_ONLY};
use crate::artifact::Artifact;
use crate::config::Configuration;
use crate::sink::Emitter;
use anyhow::Result;

pub struct DocFilesCheck;

impl DocFilesCheck {
    pub fn new(_config: &Configuration) -> Self {
        Self
    }
}

impl Check for DocFilesCheck {
    fn name(&self) -> &'static str {
        "DocFilesCheck"
    }

    fn capabilities(&self) -> &'static [Capability] {
        BINARY_ONLY
    }

    fn explanations(&self) -> Vec<(&'static str, String)> {
        vec![(
            "install-file-in-docs",
            "A file whose name suggests that it contains installation instructions is
            included in the package. Such instructions are often not relevant for
            already installed packages; if this is the case for this file and it does
            not contain any information that is of interest after the package has
            been built and installed, do not include the file in the binary package."
                .into(),
        )]
    }

    fn inspect_binary(&self, pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
        for doc in pkg.doc_files() {
            if doc.ends_with("/INSTALL") {
                out.warning("install-file-in-docs", vec![doc]);
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
    fn test_install_file() {
        let config = config_with("");
        let pkg = MemoryArtifact::binary("foo")
            .with_doc("/usr/share/doc/foo/INSTALL", 0o644)
            .with_doc("/usr/share/doc/foo/README", 0o644)
            .with_file("/usr/lib/foo/INSTALL", 0o644);

        let messages = inspect(&DocFilesCheck, &pkg, &config);
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].text,
            "foo: W: install-file-in-docs /usr/share/doc/foo/INSTALL"
        );
    }
}
