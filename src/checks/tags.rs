//! Header tag checks: URL presence, shape and reachability

use super::base::{Capability, Check, PACKAGES};
use super::network::NetworkProbe;
use crate::artifact::Artifact;
use crate::config::Configuration;
use crate::sink::Emitter;
use anyhow::Result;
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;
use tracing::warn;

const URL_TAGS: &[&str] = &["URL", "DistURL", "BugURL"];

static URL_PARTS: OnceLock<Regex> = OnceLock::new();

/// scheme://netloc
fn url_parts() -> &'static Regex {
    URL_PARTS.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*)://([^/?#]*)").expect("valid regex")
    })
}

fn has_valid_shape(url: &str) -> bool {
    let Some(caps) = url_parts().captures(url) else {
        return false;
    };
    let scheme = caps[1].to_ascii_lowercase();
    let netloc = &caps[2];
    matches!(scheme.as_str(), "http" | "https" | "ftp")
        && !netloc.is_empty()
        && netloc.contains('.')
}

pub struct TagsCheck {
    invalid_url: Option<Regex>,
    probe: NetworkProbe,
}

impl TagsCheck {
    pub fn new(config: &Configuration) -> Self {
        let pattern: String = config.option_or("invalid_url", String::new());
        let invalid_url = if pattern.is_empty() {
            None
        } else {
            match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Ignoring invalid_url pattern {:?}: {}", pattern, e);
                    None
                }
            }
        };
        Self {
            invalid_url,
            probe: NetworkProbe::from_config(config),
        }
    }

    /// Replace the probe (tests use a disabled one regardless of config)
    pub fn with_probe(mut self, probe: NetworkProbe) -> Self {
        self.probe = probe;
        self
    }

    fn check_tags(&self, pkg: &dyn Artifact, out: &Emitter) {
        for tag in URL_TAGS {
            match pkg.header(tag) {
                Some(url) => {
                    let blocked = self
                        .invalid_url
                        .as_ref()
                        .is_some_and(|re| re.is_match(&url));
                    if !has_valid_shape(&url) || blocked {
                        out.warning("invalid-url", vec![format!("{}:", tag), url]);
                    } else {
                        self.probe.check_url(out, tag, &url);
                    }
                }
                None if *tag == "URL" => out.warning("no-url-tag", vec![]),
                None => {}
            }
        }
    }
}

impl Check for TagsCheck {
    fn name(&self) -> &'static str {
        "TagsCheck"
    }

    fn capabilities(&self) -> &'static [Capability] {
        PACKAGES
    }

    fn explanations(&self) -> Vec<(&'static str, String)> {
        vec![(
            "no-url-tag",
            "The URL tag is missing. Please add a http or ftp link to the project
            location."
                .into(),
        )]
    }

    fn inspect_source(&self, pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
        self.check_tags(pkg, out);
        Ok(())
    }

    fn inspect_binary(&self, pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
        self.check_tags(pkg, out);
        Ok(())
    }
}
