// ABOUTME: Library module for the rstslide converter.
// ABOUTME: Contains metadata extraction, theming, resource resolution and page rendering.

// Reexport modules
pub mod config;
pub mod deck;
pub mod doctree;
pub mod errors;
pub mod fieldlist;
pub mod highlight;
pub mod html;
pub mod metadata;
pub mod parser;
pub mod resources;
pub mod settings;
pub mod template;
pub mod theme;
pub mod translate;
pub mod utils;

// Reexport common types and functions
pub use config::Config;
pub use deck::{render_document, SlideDeck};
pub use doctree::Node;
pub use errors::{Result, SlideError};
pub use fieldlist::FieldListParser;
pub use metadata::{extract, FieldOp, MetadataEntry};
pub use parser::{Docutils, DocumentParser, XmlParser};
pub use resources::{Asset, AssetKind, AssetLibrary, Inclusion, ResourcePolicy, ResourceResolver};
pub use settings::{Settings, Value};
pub use theme::{available_themes, substitution_preamble, ThemeMode, ThemeResolver};
pub use translate::Parts;

#[cfg(test)]
mod tests;
