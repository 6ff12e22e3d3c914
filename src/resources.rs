// ABOUTME: Resource handling for the rstslide converter
// ABOUTME: Resolves script and stylesheet assets under central, local, inline or online policies

use crate::errors::{Result, SlideError};
use crate::settings::Settings;
use crate::utils;
use log::{debug, info};
use reqwest::blocking::Client;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Suffix of the per-output resource directory.
pub const RESOURCE_DIR_SUFFIX: &str = "_rstslide";

/// Plugin directory name, both in the share root and in a resource directory.
const PLUGIN_DIR: &str = "reveal-plugins";

const REVEAL_CDN: &str = "https://cdn.jsdelivr.net/npm/reveal.js@4.6.1/dist";
const MATHJAX_CDN: &str = "https://cdn.jsdelivr.net/npm/mathjax@3.2.2/es5";

/// How external assets end up in the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ResourcePolicy {
    /// Reference the shared installed copies
    #[default]
    Central,
    /// Copy assets next to the output
    Local,
    /// Embed every asset in the document; reveal.js plugins stay at the
    /// installed location
    Inline,
    /// Reference network-hosted copies where available
    Online,
}

impl FromStr for ResourcePolicy {
    type Err = SlideError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "central" => Ok(ResourcePolicy::Central),
            "local" => Ok(ResourcePolicy::Local),
            "inline" => Ok(ResourcePolicy::Inline),
            "online" => Ok(ResourcePolicy::Online),
            other => Err(SlideError::ConfigError(format!(
                "Unknown resource policy: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ResourcePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourcePolicy::Central => "central",
            ResourcePolicy::Local => "local",
            ResourcePolicy::Inline => "inline",
            ResourcePolicy::Online => "online",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Stylesheet,
}

/// A script or stylesheet the document needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub source: String,
    pub kind: AssetKind,
    /// Element id for the generated tag, used for the reveal theme.
    pub id: Option<String>,
}

impl Asset {
    pub fn script(source: &str) -> Self {
        Self {
            source: source.to_string(),
            kind: AssetKind::Script,
            id: None,
        }
    }

    pub fn stylesheet(source: &str) -> Self {
        Self {
            source: source.to_string(),
            kind: AssetKind::Stylesheet,
            id: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Whether the source is an http(s) URL rather than a file.
    pub fn is_remote(&self) -> bool {
        Url::parse(&self.source)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    /// Final path component of the source, used as the copy name.
    pub fn file_name(&self) -> Result<String> {
        let name = if self.is_remote() {
            Url::parse(&self.source).ok().and_then(|u| {
                u.path_segments()
                    .and_then(|segments| segments.last())
                    .map(str::to_string)
            })
        } else {
            Path::new(&self.source)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        };
        name.filter(|n| !n.is_empty())
            .ok_or_else(|| SlideError::InvalidResourcePath(self.source.clone()))
    }

    /// Read the asset, fetching it when remote.
    pub fn content(&self) -> Result<String> {
        if self.is_remote() {
            fetch_remote_content(&self.source)
        } else {
            read_local_content(&self.source)
        }
    }
}

/// Base locations of the bundled libraries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLibrary {
    pub reveal: String,
    pub mathjax: String,
    pub plugins: String,
    pub css: String,
}

impl AssetLibrary {
    /// Locally installed copies under the share directory.
    pub fn central(share_root: &Path) -> Self {
        let join = |parts: &[&str]| {
            parts
                .iter()
                .fold(share_root.to_path_buf(), |p, part| p.join(part))
                .to_string_lossy()
                .into_owned()
        };
        Self {
            reveal: join(&["external", "reveal.js", "dist"]),
            mathjax: join(&["external", "mathjax", "es5"]),
            plugins: join(&[PLUGIN_DIR]),
            css: join(&["css"]),
        }
    }

    /// Network-hosted reveal.js and MathJax; our own files stay local.
    pub fn online(share_root: &Path) -> Self {
        Self {
            reveal: REVEAL_CDN.to_string(),
            mathjax: MATHJAX_CDN.to_string(),
            ..Self::central(share_root)
        }
    }

    pub fn for_policy(policy: ResourcePolicy, share_root: &Path) -> Self {
        match policy {
            ResourcePolicy::Online => Self::online(share_root),
            _ => Self::central(share_root),
        }
    }
}

fn join_location(base: &str, parts: &[&str]) -> String {
    let mut location = base.trim_end_matches('/').to_string();
    for part in parts {
        location.push('/');
        location.push_str(part);
    }
    location
}

/// Built-in assets followed by the user-declared ones, in inclusion order.
pub fn default_assets(library: &AssetLibrary, settings: &Settings) -> Vec<Asset> {
    let reveal_theme = settings.text("reveal_theme").unwrap_or("white");

    let mut assets = vec![
        Asset::script(&join_location(&library.mathjax, &["tex-svg.js"])),
        Asset::script(&join_location(&library.reveal, &["reveal.js"])),
    ];
    assets.extend(settings.list("js_files").iter().map(|s| Asset::script(s)));

    assets.push(Asset::stylesheet(&join_location(&library.reveal, &["reveal.css"])));
    assets.push(
        Asset::stylesheet(&join_location(
            &library.reveal,
            &["theme", &format!("{}.css", reveal_theme)],
        ))
        .with_id("theme"),
    );
    assets.push(Asset::stylesheet(&join_location(&library.css, &["rstslide.css"])));
    assets.extend(settings.list("css_files").iter().map(|s| Asset::stylesheet(s)));

    if let Some(stylesheet) = settings.text("stylesheet").filter(|s| !s.is_empty()) {
        assets.push(Asset::stylesheet(stylesheet));
    }

    assets
}

/// How one asset is included in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inclusion {
    Link {
        href: String,
        kind: AssetKind,
        id: Option<String>,
    },
    Inline {
        origin: String,
        content: String,
        kind: AssetKind,
    },
}

impl Inclusion {
    pub fn kind(&self) -> AssetKind {
        match self {
            Inclusion::Link { kind, .. } | Inclusion::Inline { kind, .. } => *kind,
        }
    }

    /// Link tag for a referenced asset; `None` for inlined content.
    pub fn tag(&self) -> Option<String> {
        match self {
            Inclusion::Link { href, kind, id } => Some(match (kind, id) {
                (AssetKind::Script, _) => format!(r#"<script src="{}"></script>"#, href),
                (AssetKind::Stylesheet, Some(id)) => {
                    format!(r#"<link rel="stylesheet" href="{}" id="{}" />"#, href, id)
                }
                (AssetKind::Stylesheet, None) => {
                    format!(r#"<link rel="stylesheet" href="{}" />"#, href)
                }
            }),
            Inclusion::Inline { .. } => None,
        }
    }
}

/// The per-output directory assets are copied into under the local policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDir {
    /// Where the directory lives on disk.
    pub path: PathBuf,
    /// How the output document refers to it.
    pub relative: String,
}

impl ResourceDir {
    /// `<output dir>/<output stem>_rstslide`.
    pub fn for_output(output: &Path) -> Result<Self> {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                SlideError::ValidationError(format!("Output path has no file name: {:?}", output))
            })?;
        let relative = format!("{}{}", stem, RESOURCE_DIR_SUFFIX);
        let parent = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Ok(Self {
            path: parent.join(&relative),
            relative,
        })
    }

    /// Remove any previous directory of the same name and create it empty.
    pub fn recreate(&self) -> Result<()> {
        utils::recreate_directory(&self.path)
    }

    /// Relative reference to a file inside the directory.
    pub fn reference(&self, file_name: &str) -> String {
        format!("{}/{}", self.relative, file_name)
    }
}

/// Turns assets into inclusions according to the active policy.
pub struct ResourceResolver {
    policy: ResourcePolicy,
    resource_dir: Option<ResourceDir>,
}

impl ResourceResolver {
    /// Prepare a resolver for `output`. Under the local policy this
    /// recreates the resource directory.
    pub fn setup(policy: ResourcePolicy, output: &Path) -> Result<Self> {
        let resource_dir = match policy {
            ResourcePolicy::Local => {
                let dir = ResourceDir::for_output(output)?;
                info!("Recreating resource directory {:?}", dir.path);
                dir.recreate()?;
                Some(dir)
            }
            _ => None,
        };
        Ok(Self {
            policy,
            resource_dir,
        })
    }

    pub fn policy(&self) -> ResourcePolicy {
        self.policy
    }

    pub fn resource_dir(&self) -> Option<&ResourceDir> {
        self.resource_dir.as_ref()
    }

    /// Resolve a single asset. Errors name the asset.
    pub fn resolve(&self, asset: &Asset) -> Result<Inclusion> {
        self.resolve_inner(asset)
            .map_err(|e| SlideError::resource(asset.source.clone(), e))
    }

    /// Resolve assets in order.
    pub fn resolve_all(&self, assets: &[Asset]) -> Result<Vec<Inclusion>> {
        assets.iter().map(|a| self.resolve(a)).collect()
    }

    /// Base path of the reveal.js plugins loaded by the init script. Under
    /// the local policy an installed plugin directory is copied into the
    /// resource directory; every other policy, inline included, keeps the
    /// library location.
    pub fn plugins_root(&self, library: &AssetLibrary) -> Result<String> {
        let plugins = Path::new(&library.plugins);
        match &self.resource_dir {
            Some(dir) if plugins.is_dir() => {
                let destination = dir.path.join(PLUGIN_DIR);
                debug!("Copying plugins from {:?} to {:?}", plugins, destination);
                utils::copy_directory(plugins, &destination)
                    .map_err(|e| SlideError::resource(library.plugins.clone(), e))?;
                Ok(dir.reference(PLUGIN_DIR))
            }
            _ => Ok(library.plugins.clone()),
        }
    }

    fn resolve_inner(&self, asset: &Asset) -> Result<Inclusion> {
        match (self.policy, &self.resource_dir) {
            (ResourcePolicy::Inline, _) => {
                debug!("Inlining {}", asset.source);
                Ok(Inclusion::Inline {
                    origin: asset.source.clone(),
                    content: asset.content()?,
                    kind: asset.kind,
                })
            }
            (ResourcePolicy::Local, Some(dir)) => {
                let file_name = asset.file_name()?;
                let destination = dir.path.join(&file_name);
                if destination.exists() {
                    debug!("{:?} already present, not copying {}", destination, asset.source);
                } else if asset.is_remote() {
                    fs::write(&destination, asset.content()?)?;
                } else {
                    utils::validate_file_exists(Path::new(&asset.source))?;
                    fs::copy(&asset.source, &destination)?;
                }
                Ok(Inclusion::Link {
                    href: dir.reference(&file_name),
                    kind: asset.kind,
                    id: asset.id.clone(),
                })
            }
            (ResourcePolicy::Local, None) => Err(SlideError::ConfigError(
                "local resource policy used without a resource directory".to_string(),
            )),
            (ResourcePolicy::Central | ResourcePolicy::Online, _) => Ok(Inclusion::Link {
                href: asset.source.clone(),
                kind: asset.kind,
                id: asset.id.clone(),
            }),
        }
    }
}

/// Link tags and inline payloads of a resolved asset list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludedAssets {
    pub script_tags: String,
    pub stylesheet_tags: String,
    pub inline_scripts: String,
    pub inline_styles: String,
}

impl IncludedAssets {
    /// Group inclusions by kind, then append the raw `js_embedd` and
    /// `css_embedd` blocks.
    pub fn collect(inclusions: &[Inclusion], settings: &Settings) -> Self {
        let mut included = Self::default();
        for inclusion in inclusions {
            if let Some(tag) = inclusion.tag() {
                let tags = match inclusion.kind() {
                    AssetKind::Script => &mut included.script_tags,
                    AssetKind::Stylesheet => &mut included.stylesheet_tags,
                };
                tags.push_str(&tag);
                tags.push('\n');
            } else if let Inclusion::Inline { origin, content, kind } = inclusion {
                let payload = match kind {
                    AssetKind::Script => &mut included.inline_scripts,
                    AssetKind::Stylesheet => &mut included.inline_styles,
                };
                payload.push_str(&format!("\n<!-- inlining {} --->\n\n", origin));
                payload.push_str(content);
                payload.push_str("\n\n");
            }
        }
        included
            .inline_scripts
            .push_str(&settings.list("js_embedd").join("\n"));
        included
            .inline_styles
            .push_str(&settings.list("css_embedd").join("\n"));
        included
    }
}

/// Fetch content from a remote URL with retry capability
fn fetch_remote_content(url: &str) -> Result<String> {
    info!("Fetching remote resource: {}", url);

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(SlideError::FetchError)?;

    // Try up to 3 times with increasing backoff
    let mut retry_delay = 1000;
    let mut last_error = None;

    for attempt in 1..=3 {
        match client.get(url).send() {
            Ok(response) => {
                if response.status().is_success() {
                    return response.text().map_err(SlideError::FetchError);
                }
                last_error = Some(SlideError::ValidationError(format!(
                    "HTTP error: {}",
                    response.status()
                )));
            }
            Err(e) => last_error = Some(SlideError::FetchError(e)),
        }

        if attempt < 3 {
            info!(
                "Fetch attempt {} failed, retrying in {} ms",
                attempt, retry_delay
            );
            std::thread::sleep(Duration::from_millis(retry_delay));
            retry_delay *= 2;
        }
    }

    Err(last_error.unwrap_or_else(|| {
        SlideError::ValidationError("Unknown error fetching resource".to_string())
    }))
}

/// Read content from a local file
fn read_local_content(path: &str) -> Result<String> {
    debug!("Reading local resource: {}", path);
    utils::validate_file_exists(Path::new(path))?;
    fs::read_to_string(path).map_err(SlideError::FileReadError)
}
