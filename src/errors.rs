// ABOUTME: Error types for the rstslide converter
// ABOUTME: Provides structured error handling for each stage of the pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlideError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Malformed document XML: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Document parse error: {0}")]
    ParseError(String),

    #[error("Document parser not available: {0}")]
    ParserUnavailable(String),

    /// A docinfo field does not have the shape its name asks for.
    #[error("Metadata extraction error in field '{field}': {reason}")]
    MalformedMetadata { field: String, reason: String },

    #[error("Theme resolution error for '{theme}': {source}")]
    ThemeError {
        theme: String,
        #[source]
        source: Box<SlideError>,
    },

    #[error("Resource resolution error for asset '{asset}': {source}")]
    ResourceError {
        asset: String,
        #[source]
        source: Box<SlideError>,
    },

    #[error("Invalid resource path: {0}")]
    InvalidResourcePath(String),

    #[error("Render error: template '{template}' references missing key '{key}'")]
    MissingPlaceholder { template: String, key: String },

    #[error("Render error: template '{template}' is malformed: {reason}")]
    TemplateSyntax { template: String, reason: String },

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl SlideError {
    /// Wrap an error raised while materializing `asset`.
    pub fn resource(asset: impl Into<String>, source: SlideError) -> Self {
        SlideError::ResourceError {
            asset: asset.into(),
            source: Box::new(source),
        }
    }

    /// Wrap an error raised while loading the theme `theme`.
    pub fn theme(theme: impl Into<String>, source: SlideError) -> Self {
        SlideError::ThemeError {
            theme: theme.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn malformed(field: &str, reason: impl Into<String>) -> Self {
        SlideError::MalformedMetadata {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// Implement conversion from anyhow::Error to our SlideError
impl From<anyhow::Error> for SlideError {
    fn from(err: anyhow::Error) -> Self {
        SlideError::UnknownError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SlideError>;
