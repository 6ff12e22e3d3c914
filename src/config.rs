// ABOUTME: Configuration module for the rstslide converter
// ABOUTME: Provides install locations, default policy and collaborator commands

use crate::resources::ResourcePolicy;
use log::warn;
use std::env;
use std::path::PathBuf;

/// Directory holding themes and stylesheets shipped with the crate.
const DEFAULT_SHARE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/share");

/// Global configuration for the converter
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the shared themes, stylesheets and bundled libraries
    pub share_root: PathBuf,
    pub resources: ResourcePolicy,
    /// Command producing highlighting stylesheets
    pub pygmentize: String,
    /// Command writing docutils XML from reStructuredText
    pub rst2xml: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            share_root: PathBuf::from(DEFAULT_SHARE_ROOT),
            resources: ResourcePolicy::Central,
            pygmentize: "pygmentize".to_string(),
            rst2xml: "rst2xml".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let share_root = env::var("RSTSLIDE_ROOT")
            .ok()
            .map(PathBuf::from)
            .unwrap_or(defaults.share_root);
        let resources = env::var("RSTSLIDE_RESOURCES")
            .ok()
            .and_then(|s| match s.parse() {
                Ok(policy) => Some(policy),
                Err(e) => {
                    warn!("Ignoring RSTSLIDE_RESOURCES: {}", e);
                    None
                }
            })
            .unwrap_or(defaults.resources);
        let pygmentize = env::var("PYGMENTIZE").unwrap_or(defaults.pygmentize);
        let rst2xml = env::var("RST2XML").unwrap_or(defaults.rst2xml);

        Self {
            share_root,
            resources,
            pygmentize,
            rst2xml,
        }
    }

    pub fn with_share_root(mut self, share_root: impl Into<PathBuf>) -> Self {
        self.share_root = share_root.into();
        self
    }

    pub fn with_resources(mut self, resources: ResourcePolicy) -> Self {
        self.resources = resources;
        self
    }
}
