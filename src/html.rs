// ABOUTME: HTML generation module for the rstslide converter
// ABOUTME: Builds the header, body and footer fragments and assembles the page

use crate::errors::{Result, SlideError};
use crate::resources::{AssetLibrary, IncludedAssets};
use crate::settings::Settings;
use crate::template::{self, Context, DEFAULT_FOOTER, DEFAULT_TITLE_SLIDE};
use crate::translate::Parts;
use crate::utils;
use log::info;
use quick_xml::escape::escape;
use std::fs;
use std::path::Path;

const HEADER_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
    <head>
        <meta charset="utf-8">
        <title>%(title)s</title>
        <meta name="description" content="%(title)s">
        %(meta)s
        %(extra_meta)s
        %(custom_js)s
        %(custom_stylesheets)s
        <script>
            %(js_embedd)s
        </script>
        <style>
            %(css_embedd)s

            .reveal section {
              text-align: %(horizontal_center)s;
            }

            .reveal h2 {
              text-align: %(title_center)s;
            }
        </style>
    </head>
"#;

const BODY_TEMPLATE: &str = r#"
    <body>
        <div class="static-content"></div>
        <div class="reveal">
            <div class="slides">
%(titleslide)s
%(body)s
            </div>
        </div>
"#;

const INIT_SCRIPT: &str = r#"
        <script>
            // Full list of configuration options available here:
            // https://revealjs.com/config/
            Reveal.initialize({
                controls: %(controls)s,
                progress: false,
                hash: true,
                overview: true,
                keyboard: {
                    37: 'prev',
                    39: 'next',
                    33: 'prev',
                    34: 'next',
                    38: 'prev',
                    40: 'next',
                    109: function() { Reveal.left(); Reveal.slide(Reveal.getIndices()['h'], 0, 0); },
                    107: function() { Reveal.right(); Reveal.slide(Reveal.getIndices()['h'], 0, 0); },
                },
                loop: false,
                touch: true,
                rtl: false,
                center: %(vertical_center)s,
                mouseWheel: false,
                fragments: true,
                transition: '%(transition)s',
                transitionSpeed: 'fast',
                slideNumber: '',
                menu: {
                    side: 'right',
                    width: 'normal',
                    numbers: false,
                    titleSelector: 'h1, h2, h3, h4, h5, h6',
                    markers: true,
                    themes: false,
                    transitions: false,
                    openButton: true,
                    keyboard: true,
                    loadIcons: true,
                },
                dependencies: [
                    { src: '%(plugins_root)s/reveal.js-menu/menu.js', async: true },
                    { src: '%(plugins_root)s/toc-progress/toc-progress.js',
                      async: true,
                      callback: function() {
                          toc_progress.initialize(null, null, '{ background-color: white; color: black;}');
                          toc_progress.create();
                      }
                    }
                ]
            });
        </script>"#;

const CLOSING_TEMPLATE: &str = r#"

        %(footer)s
    </body>
</html>"#;

fn alignment(centered: bool) -> String {
    let align = if centered { "center" } else { "left" };
    align.to_string()
}

/// `<meta>` tags for the abstract, the author and every listed author.
fn extra_meta(settings: &Settings) -> String {
    let mut meta = String::new();
    if let Some(abstract_text) = settings.text("abstract") {
        meta.push_str(&format!(
            "<meta name=\"description\" content=\"{}\" />\n",
            escape(abstract_text)
        ));
    }
    if let Some(author) = settings.text("author") {
        meta.push_str(&format!("<meta name=\"author\" content=\"{}\" />\n", escape(author)));
    }
    for author in settings.list("authors") {
        meta.push_str(&format!(
            "<meta name=\"author\" content=\"{}\" />\n",
            escape(author.as_str())
        ));
    }
    meta
}

/// Document shell opening, metadata, asset inclusions and alignment styles.
pub fn generate_header(settings: &Settings, parts: &Parts, assets: &IncludedAssets) -> Result<String> {
    let mut context = Context::new();
    let title = settings.text("title").unwrap_or(&parts.title);
    context.insert("title".to_string(), escape(title).into_owned());
    context.insert("meta".to_string(), parts.meta.clone());
    context.insert("extra_meta".to_string(), extra_meta(settings));
    context.insert("custom_js".to_string(), assets.script_tags.clone());
    context.insert("custom_stylesheets".to_string(), assets.stylesheet_tags.clone());
    context.insert("js_embedd".to_string(), assets.inline_scripts.clone());
    context.insert("css_embedd".to_string(), assets.inline_styles.clone());
    context.insert(
        "horizontal_center".to_string(),
        alignment(settings.flag("horizontal_center")),
    );
    context.insert("title_center".to_string(), alignment(settings.flag("title_center")));

    template::render("header", HEADER_TEMPLATE, &context)
}

/// The title slide: the user's `firstslide_template` or the built-in one.
pub fn generate_title_slide(settings: &Settings, context: &Context) -> Result<String> {
    let title_slide = template::template_or_default(settings, "firstslide_template", DEFAULT_TITLE_SLIDE);
    template::render("firstslide_template", &title_slide, context)
}

/// The footer bar shown on every slide, empty unless enabled.
pub fn generate_footer_bar(settings: &Settings, context: &Context) -> Result<String> {
    if settings.flag("footer") {
        let footer = template::template_or_default(settings, "footer_template", DEFAULT_FOOTER);
        let line = template::render("footer_template", &footer, context)?;
        Ok(format!(
            "<footer id=\"footer\">{}<b id=\"slide_number\" style=\"padding: 1em;\"></b></footer>",
            line
        ))
    } else if settings.flag("page_number") {
        Ok("<footer><b id=\"slide_number\"></b></footer>".to_string())
    } else {
        Ok(String::new())
    }
}

/// Slide container wrapping the title slide and the converted body.
pub fn generate_body(title_slide: &str, parts: &Parts) -> Result<String> {
    let mut context = Context::new();
    context.insert("titleslide".to_string(), title_slide.to_string());
    context.insert("body".to_string(), parts.body.clone());
    template::render("body", BODY_TEMPLATE, &context)
}

/// Deck initialization script, footer bar and closing tags. A non-empty
/// `init_html` setting replaces the built-in initialization script.
pub fn generate_footer(settings: &Settings, library: &AssetLibrary, footer_bar: &str) -> Result<String> {
    let init = template::template_or_default(settings, "init_html", INIT_SCRIPT);
    let footer_template = format!("{}{}", init, CLOSING_TEMPLATE);

    let mut context = settings.template_context();
    context.insert("transition".to_string(), settings.text("transition").unwrap_or("fade").to_string());
    context.insert("footer".to_string(), footer_bar.to_string());
    context.insert("plugins_root".to_string(), library.plugins.clone());
    context.insert("reveal_root".to_string(), library.reveal.clone());
    context.insert("vertical_center".to_string(), settings.flag("vertical_center").to_string());
    context.insert("controls".to_string(), settings.flag("controls").to_string());

    template::render("footer", &footer_template, &context)
}

/// Concatenate the three fragments in order.
pub fn assemble(header: &str, body: &str, footer: &str) -> String {
    let mut document = String::with_capacity(header.len() + body.len() + footer.len());
    document.push_str(header);
    document.push_str(body);
    document.push_str(footer);
    document
}

/// Utility function to write HTML content to a file
pub fn write_html_to_file(html_content: &str, output_path: &Path) -> Result<()> {
    info!("Writing HTML to file: {:?}", output_path);

    utils::ensure_parent_directory_exists(output_path)?;
    fs::write(output_path, html_content).map_err(SlideError::FileReadError)?;

    Ok(())
}
