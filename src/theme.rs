// ABOUTME: Theme lookup and theme settings overlay
// ABOUTME: Locates theme.rst files and merges their docinfo over current settings

use crate::errors::{Result, SlideError};
use crate::fieldlist::FieldListParser;
use crate::metadata;
use crate::parser::DocumentParser;
use crate::settings::Settings;
use log::{info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File holding a theme definition inside a theme directory.
pub const THEME_FILE: &str = "theme.rst";

/// Setting that holds the theme directory while the theme is read.
pub const THEME_PATH_KEY: &str = "theme_path";

/// How current settings are made visible to the theme source.
#[derive(Clone, Copy, Default)]
pub enum ThemeMode<'a> {
    /// Seed the built-in reader with the settings as substitutions.
    #[default]
    Overlay,
    /// Prepend substitution definitions to the theme text and hand the
    /// result to `parser`, for themes that need a full markup parser.
    Preamble(&'a dyn DocumentParser),
}

/// Looks up themes, first under `./themes`, then under the shared themes
/// directory.
#[derive(Debug, Clone)]
pub struct ThemeResolver {
    search_dirs: Vec<PathBuf>,
}

impl ThemeResolver {
    pub fn new(share_root: &Path) -> Self {
        Self {
            search_dirs: vec![PathBuf::from("themes"), share_root.join("themes")],
        }
    }

    /// Explicit search directories, in priority order.
    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Directory of the named theme, if any search directory holds it.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|dir| dir.join(THEME_FILE).is_file())
    }

    /// Overlay the named theme onto `settings`. Returns `false` (after a
    /// warning) when the theme does not exist; settings are then untouched.
    pub fn apply(&self, name: &str, settings: &mut Settings, mode: ThemeMode<'_>) -> Result<bool> {
        let Some(theme_dir) = self.locate(name) else {
            warn!("theme {} does not exist", name);
            return Ok(false);
        };
        info!("Loading theme {} from {:?}", name, theme_dir);

        let source = fs::read_to_string(theme_dir.join(THEME_FILE))
            .map_err(|e| SlideError::theme(name, e.into()))?;

        settings.set(THEME_PATH_KEY, theme_dir.to_string_lossy().into_owned());
        let tree = match mode {
            ThemeMode::Overlay => FieldListParser::new()
                .with_substitutions(settings.substitutions())
                .parse(&source),
            ThemeMode::Preamble(parser) => {
                let text = substitution_preamble(settings) + &source;
                parser.parse(&text)
            }
        };

        // The theme pass must not leak its directory, successful or not.
        let merged = tree.and_then(|tree| {
            let mut merged = settings.clone();
            metadata::extract(&tree, &mut merged)?;
            Ok(merged)
        });
        settings.remove(THEME_PATH_KEY);

        let mut merged = merged.map_err(|e| SlideError::theme(name, e))?;
        merged.remove(THEME_PATH_KEY);
        *settings = merged;
        Ok(true)
    }
}

/// One substitution definition per setting, in store order. Newlines become
/// indented continuation lines and emphasis markers are escaped; values with
/// no text are defined as an escaped space.
pub fn substitution_preamble(settings: &Settings) -> String {
    let mut text = String::new();
    for (key, value) in settings.substitutions() {
        if value.is_empty() {
            text.push_str(&format!(".. |{}| replace:: \\ \n\n", key));
        } else {
            let value = value.replace('\n', "\n  ").replace('*', "\\*");
            text.push_str(&format!(".. |{}| replace:: {}\n\n", key, value));
        }
    }
    text
}

/// Names of every theme found locally or in the shared directory.
pub fn available_themes(share_root: &Path) -> Result<Vec<String>> {
    let mut names = BTreeSet::new();
    for dir in [PathBuf::from("themes"), share_root.join("themes")] {
        let pattern = format!("{}/*/{}", dir.to_string_lossy(), THEME_FILE);
        let entries = glob::glob(&pattern)
            .map_err(|e| SlideError::ConfigError(format!("Invalid theme pattern: {}", e)))?;
        for entry in entries.flatten() {
            if let Some(name) = entry
                .parent()
                .and_then(Path::file_name)
                .and_then(|n| n.to_str())
            {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names.into_iter().collect())
}
