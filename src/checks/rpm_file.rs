//! Checks on the package file itself

use super::base::{Capability, Check, PACKAGES};
use crate::artifact::Artifact;
use crate::config::Configuration;
use crate::sink::Emitter;
use anyhow::Result;
use std::path::Path;

/// Joliet file systems cap names at 64 unicode characters
const JOLIET_MAX: usize = 64;

pub struct RpmFileCheck;

impl RpmFileCheck {
    pub fn new(_config: &Configuration) -> Self {
        Self
    }

    fn check_filename(&self, pkg: &dyn Artifact, out: &Emitter) {
        let filename = Path::new(pkg.filename())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| pkg.filename().to_string());
        if filename.chars().count() > JOLIET_MAX {
            out.warning("filename-too-long-for-joliet", vec![filename]);
        }
    }
}

impl Check for RpmFileCheck {
    fn name(&self) -> &'static str {
        "RpmFileCheck"
    }

    fn capabilities(&self) -> &'static [Capability] {
        PACKAGES
    }

    fn explanations(&self) -> Vec<(&'static str, String)> {
        vec![(
            "filename-too-long-for-joliet",
            "This filename is too long to fit on a joliet filesystem (limit is 64
            unicode chars)."
                .into(),
        )]
    }

    fn inspect_source(&self, pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
        self.check_filename(pkg, out);
        Ok(())
    }

    fn inspect_binary(&self, pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
        self.check_filename(pkg, out);
        Ok(())
    }
}
