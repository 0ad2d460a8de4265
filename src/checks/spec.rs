//! Build recipe (spec file) checks
//!
//! Preamble tags are only inspected outside of script and description
//! sections; indentation is checked over the whole file.

use super::base::{Capability, Check};
use crate::artifact::Artifact;
use crate::config::Configuration;
use crate::sink::Emitter;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

const CAPABILITIES: &[Capability] = &[Capability::InspectsRecipe, Capability::InspectsSource];

struct Patterns {
    packager: Regex,
    prefix: Regex,
    obsolete: Regex,
    prereq: Regex,
    section: Regex,
    indent_spaces: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn tag(name: &str) -> Regex {
    Regex::new(&format!(r"(?i)^{}\s*:\s*(\S.*?)\s*$", name)).expect("valid tag regex")
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        packager: tag("Packager"),
        prefix: tag("Prefix"),
        obsolete: tag("(Serial|Copyright)"),
        prereq: tag(r"PreReq(?:\([^)]*\))?"),
        section: Regex::new(r"^%(\w+)").expect("valid regex"),
        indent_spaces: Regex::new(
            r"( \t|(^|\t)([^\t]{8})*[^\t]{4}[^\t]?([^\t][^\t.!?]|[^\t]?[.!?] )  )",
        )
        .expect("valid regex"),
    })
}

/// Sections whose body is script or free text rather than tags
const BODY_SECTIONS: &[&str] = &[
    "description",
    "prep",
    "build",
    "install",
    "check",
    "clean",
    "files",
    "changelog",
    "pre",
    "post",
    "preun",
    "postun",
    "pretrans",
    "posttrans",
    "trigger",
    "triggerin",
    "triggerun",
    "triggerpostun",
    "verifyscript",
];

pub struct SpecCheck;

impl SpecCheck {
    pub fn new(_config: &Configuration) -> Self {
        Self
    }

    fn check_lines(&self, lines: &[String], out: &Emitter) {
        let p = patterns();
        let mut in_preamble = true;
        let mut first_tab = None;
        let mut first_spaces = None;

        for (idx, line) in lines.iter().enumerate() {
            let linenum = idx + 1;

            if let Some(caps) = p.section.captures(line) {
                let section = caps[1].to_ascii_lowercase();
                if section == "package" {
                    in_preamble = true;
                } else if BODY_SECTIONS.contains(&section.as_str()) {
                    in_preamble = false;
                }
            }

            if in_preamble {
                if let Some(caps) = p.packager.captures(line) {
                    out.warning("hardcoded-packager-tag", vec![caps[1].to_string()]);
                }
                if let Some(caps) = p.prefix.captures(line) {
                    if !caps[1].starts_with('%') {
                        out.warning("hardcoded-prefix-tag", vec![caps[1].to_string()]);
                    }
                }
                if let Some(caps) = p.obsolete.captures(line) {
                    out.warning("obsolete-tag", vec![caps[1].to_string()]);
                }
                if let Some(caps) = p.prereq.captures(line) {
                    out.error("prereq-use", vec![caps[1].to_string()]);
                }
            }

            if first_tab.is_none() && line.contains('\t') {
                first_tab = Some(linenum);
            }
            if first_spaces.is_none() && p.indent_spaces.is_match(line) {
                first_spaces = Some(linenum);
            }
        }

        if let (Some(spaces), Some(tab)) = (first_spaces, first_tab) {
            out.warning(
                "mixed-use-of-spaces-and-tabs",
                vec![format!("(spaces: line {}, tab: line {})", spaces, tab)],
            );
        }
    }
}

impl Check for SpecCheck {
    fn name(&self) -> &'static str {
        "SpecCheck"
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    fn explanations(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "hardcoded-packager-tag",
                "The Packager tag is hardcoded in your spec file. It should be removed, so
                as to use rebuilder's own defaults."
                    .into(),
            ),
            (
                "hardcoded-prefix-tag",
                "The Prefix tag is hardcoded in your spec file. It should be removed, so as
                to allow package relocation."
                    .into(),
            ),
            (
                "obsolete-tag",
                "The following tags are obsolete: Copyright and Serial. They must be
                replaced by License and Epoch respectively."
                    .into(),
            ),
            (
                "prereq-use",
                "The use of PreReq is deprecated. In the majority of cases, a plain
                Requires is enough and the right thing to do. Sometimes Requires(pre),
                Requires(post), Requires(preun) and/or Requires(postun) can also be used
                instead of PreReq."
                    .into(),
            ),
            (
                "mixed-use-of-spaces-and-tabs",
                "The specfile mixes use of spaces and tabs for indentation, which is a
                cosmetic annoyance. Use either spaces or tabs for indentation, not both."
                    .into(),
            ),
        ]
    }

    /// Source packages are checked through the recipe they carry, if any
    fn inspect_source(&self, pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
        if let Some(lines) = pkg.recipe_lines() {
            self.check_lines(lines, out);
        }
        Ok(())
    }

    fn inspect_recipe(
        &self,
        _recipe: &dyn Artifact,
        lines: Option<&[String]>,
        out: &Emitter,
    ) -> Result<()> {
        if let Some(lines) = lines {
            self.check_lines(lines, out);
        }
        Ok(())
    }
}
