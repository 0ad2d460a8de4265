//! Distribution specifics of binary packages
//!
//! Vendor and distribution header values, and compression of manual and
//! info pages.

use super::base::{Capability, Check, FileMatcher, BINARY_ONLY};
use crate::artifact::Artifact;
use crate::config::Configuration;
use crate::sink::Emitter;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static MAN_PAGE: OnceLock<Regex> = OnceLock::new();
static INFO_PAGE: OnceLock<Regex> = OnceLock::new();
static DOC_PAGES: OnceLock<FileMatcher> = OnceLock::new();

fn man_page() -> &'static Regex {
    MAN_PAGE.get_or_init(|| Regex::new(r"/man(?:\d[px]?|n)/").expect("valid regex"))
}

fn info_page() -> &'static Regex {
    INFO_PAGE.get_or_init(|| Regex::new(r"(/usr/share|/usr)/info/").expect("valid regex"))
}

/// Manual and info pages that are actually shipped
fn doc_pages() -> &'static FileMatcher {
    DOC_PAGES.get_or_init(|| {
        FileMatcher::new(r"/man(?:\d[px]?|n)/|(/usr/share|/usr)/info/").expect("valid regex")
    })
}

pub struct DistributionCheck {
    vendor: String,
    distribution: String,
    compress_ext: String,
}

impl DistributionCheck {
    pub fn new(config: &Configuration) -> Self {
        Self {
            vendor: config.option_or("vendor", String::new()),
            distribution: config.option_or("distribution", String::new()),
            compress_ext: config.option_or("compress_extension", String::new()),
        }
    }
}

impl Check for DistributionCheck {
    fn name(&self) -> &'static str {
        "DistributionCheck"
    }

    fn capabilities(&self) -> &'static [Capability] {
        BINARY_ONLY
    }

    fn explanations(&self) -> Vec<(&'static str, String)> {
        let not_compressed = |what: &str| {
            format!(
                "This {what} is not compressed with the {ext} compression method
                (does not have the {ext} extension). If the compression does not
                happen automatically when the package is rebuilt, make sure that you
                have the appropriate rpm helper and/or config packages for your target
                distribution installed and try rebuilding again; if it still does not
                happen automatically, you can compress this file in the %install
                section of the spec file.",
                what = what,
                ext = self.compress_ext
            )
        };
        vec![
            (
                "invalid-vendor",
                format!(
                    "In the '{}' distribution, vendor should be '{}'.",
                    self.distribution, self.vendor
                ),
            ),
            (
                "invalid-distribution",
                format!("The distribution value should be '{}'.", self.distribution),
            ),
            ("manpage-not-compressed", not_compressed("manual page")),
            ("infopage-not-compressed", not_compressed("info page")),
        ]
    }

    fn inspect_binary(&self, pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
        let vendor = pkg.header("VENDOR").unwrap_or_default();
        if !self.vendor.is_empty() && vendor != self.vendor {
            out.warning("invalid-vendor", vec![vendor]);
        }

        let distribution = pkg.header("DISTRIBUTION").unwrap_or_default();
        if !self.distribution.is_empty() && distribution != self.distribution {
            out.warning("invalid-distribution", vec![distribution]);
        }

        if self.compress_ext.is_empty() {
            return Ok(());
        }

        for fname in doc_pages().matching(pkg) {
            if man_page().is_match(fname) {
                if !fname.ends_with(&self.compress_ext) {
                    out.warning(
                        "manpage-not-compressed",
                        vec![self.compress_ext.clone(), fname.clone()],
                    );
                }
            } else if info_page().is_match(fname)
                && !fname.ends_with("/info/dir")
                && !fname.ends_with(&self.compress_ext)
            {
                out.warning(
                    "infopage-not-compressed",
                    vec![self.compress_ext.clone(), fname.clone()],
                );
            }
        }
        Ok(())
    }
}
