//! rpmlint - quality gate for RPM packages and spec files
//!
//! Runs a configurable set of checks over packages, installed packages and
//! spec files, then folds their findings into a deterministic report, a
//! badness score and an exit status.
//!
//! ```no_run
//! use rpmlint::artifact::RpmQuerySource;
//! use rpmlint::config::ConfigStore;
//! use rpmlint::lint::Lint;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = ConfigStore::standard(None).resolve()?;
//! let source = Arc::new(RpmQuerySource::new(Duration::from_secs(60)));
//! let result = Lint::new(config, source).run(&["foo.spec".to_string()])?;
//! println!("{}", result.summary_line());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod artifact;
pub mod checks;
pub mod cli;
pub mod config;
pub mod lint;
pub mod models;
pub mod reporters;
pub mod sink;
