// ABOUTME: Conversion pipeline from a document tree to a reveal.js deck
// ABOUTME: Orders settings layers, resolves assets and writes the final page

use crate::config::Config;
use crate::doctree::Node;
use crate::errors::Result;
use crate::highlight;
use crate::html;
use crate::metadata;
use crate::parser::{Docutils, DocumentParser, XmlParser};
use crate::resources::{default_assets, AssetLibrary, IncludedAssets, ResourcePolicy, ResourceResolver};
use crate::settings::{Settings, Value};
use crate::template;
use crate::theme::{ThemeMode, ThemeResolver};
use crate::translate::Parts;
use crate::utils;
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Converts documents into slide decks.
pub struct SlideDeck<'a> {
    config: Config,
    overrides: Vec<(String, Value)>,
    theme_mode: ThemeMode<'a>,
}

impl<'a> SlideDeck<'a> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            overrides: Vec::new(),
            theme_mode: ThemeMode::Overlay,
        }
    }

    pub fn policy(mut self, policy: ResourcePolicy) -> Self {
        self.config.resources = policy;
        self
    }

    /// Setting applied after document and theme; later calls win.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    pub fn theme_mode(mut self, mode: ThemeMode<'a>) -> Self {
        self.theme_mode = mode;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read `input`, convert it, and write the deck to `output`. Files with
    /// an `.xml` extension are read as docutils XML, anything else goes
    /// through the docutils command.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<String> {
        info!("Converting {:?} to {:?}", input, output);
        utils::validate_file_exists(input)?;
        let source = fs::read_to_string(input)?;

        let is_xml = input
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        let tree = if is_xml {
            XmlParser.parse(&source)?
        } else {
            Docutils::new(&self.config.rst2xml).parse(&source)?
        };

        self.render_tree(&tree, output)
    }

    /// Build the deck for an already parsed tree and write it to `output`.
    pub fn render_tree(&self, tree: &Node, output: &Path) -> Result<String> {
        let parts = Parts::from_tree(tree);
        let mut settings = self.settings_for(tree, &parts)?;

        let resolver = ResourceResolver::setup(self.config.resources, output)?;
        self.add_highlighting(&mut settings, &resolver)?;
        debug!("Configuration: {:#?}", settings);

        let mut library = AssetLibrary::for_policy(self.config.resources, &self.config.share_root);
        let inclusions = resolver.resolve_all(&default_assets(&library, &settings))?;
        library.plugins = resolver.plugins_root(&library)?;
        let assets = IncludedAssets::collect(&inclusions, &settings);

        let document = render_document(&settings, &parts, &assets, &library)?;
        html::write_html_to_file(&document, output)?;
        Ok(document)
    }

    /// Settings in layer order: defaults, document metadata, document title,
    /// theme, then explicit overrides.
    pub fn settings_for(&self, tree: &Node, parts: &Parts) -> Result<Settings> {
        let mut settings = Settings::with_defaults();
        metadata::extract(tree, &mut settings)?;

        if !parts.title.is_empty() || !settings.contains("title") {
            settings.set("title", parts.title.clone());
        }
        if !parts.subtitle.is_empty() || !settings.contains("subtitle") {
            settings.set("subtitle", parts.subtitle.clone());
        }

        if let Some(theme) = settings.text("theme").map(str::to_string) {
            ThemeResolver::new(&self.config.share_root).apply(&theme, &mut settings, self.theme_mode)?;
        }

        for (key, value) in &self.overrides {
            settings.set(key, value.clone());
        }
        Ok(settings)
    }

    fn add_highlighting(&self, settings: &mut Settings, resolver: &ResourceResolver) -> Result<()> {
        let style = settings.text("pygments_style").unwrap_or("").to_string();
        let Some(css) = highlight::pygments_css(&self.config.pygmentize, &style) else {
            return Ok(());
        };

        match resolver.resource_dir() {
            Some(dir) => {
                fs::write(dir.path.join("pygments.css"), css)?;
                settings.append("css_files", [dir.reference("pygments.css")]);
            }
            None => settings.append("css_embedd", [css]),
        }
        Ok(())
    }
}

/// Render all three fragments from merged settings and assemble them.
pub fn render_document(
    settings: &Settings,
    parts: &Parts,
    assets: &IncludedAssets,
    library: &AssetLibrary,
) -> Result<String> {
    let context = template::title_context(settings);
    let title_slide = html::generate_title_slide(settings, &context)?;
    let footer_bar = html::generate_footer_bar(settings, &context)?;

    let header = html::generate_header(settings, parts, assets)?;
    let body = html::generate_body(&title_slide, parts)?;
    let footer = html::generate_footer(settings, library, &footer_bar)?;

    Ok(html::assemble(&header, &body, &footer))
}
