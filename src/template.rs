// ABOUTME: Percent-style template rendering for title slide and footer
// ABOUTME: Substitutes %(name)s placeholders and builds the title context

use crate::errors::{Result, SlideError};
use crate::settings::Settings;
use indexmap::IndexMap;
use quick_xml::escape::{escape, unescape_with};
use std::borrow::Cow;

/// Built-in title slide.
pub const DEFAULT_TITLE_SLIDE: &str = r#"
    <section class="titleslide" data-state="no-toc-progress">
    <h1>%(title)s</h1>
    <h3>%(subtitle)s</h3>
    <br>
    <p><a href="mailto:%(email)s">%(author)s</a> %(is_institution)s %(institution)s</p>
    <p><small>%(email)s</small></p>
    <p>%(date)s</p>
    </section>
"#;

/// Built-in footer line.
pub const DEFAULT_FOOTER: &str = "<b>%(title)s %(is_subtitle)s %(subtitle)s.</b> %(author)s%(is_institution)s %(institution)s. %(date)s";

/// Fields every title context carries, empty unless set.
const TITLE_FIELDS: [&str; 6] = ["title", "subtitle", "author", "institution", "email", "date"];

/// Values a template can refer to.
pub type Context = IndexMap<String, String>;

/// Substitute every `%(name)s` in `template` from `context`. `%%` stands for
/// a literal percent sign; any other `%` is copied as is. `name` only
/// identifies the template in errors.
pub fn render(name: &str, template: &str, context: &Context) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('%') {
            out.push('%');
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('(') {
            let close = tail.find(')').ok_or_else(|| SlideError::TemplateSyntax {
                template: name.to_string(),
                reason: "unterminated %( placeholder".to_string(),
            })?;
            let key = &tail[..close];
            let tail = tail[close + 1..]
                .strip_prefix('s')
                .ok_or_else(|| SlideError::TemplateSyntax {
                    template: name.to_string(),
                    reason: format!("placeholder %({}) must end with 's'", key),
                })?;
            let value = context.get(key).ok_or_else(|| SlideError::MissingPlaceholder {
                template: name.to_string(),
                key: key.to_string(),
            })?;
            out.push_str(value);
            rest = tail;
        } else {
            out.push('%');
            rest = after;
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Reverse the HTML escaping applied to user-supplied template text.
pub fn unescape_template(text: &str) -> Cow<'_, str> {
    unescape_with(text, |entity| match entity {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        "nbsp" => Some("\u{a0}"),
        _ => None,
    })
    .unwrap_or(Cow::Borrowed(text))
}

/// The user override stored under `key`, unescaped, or `default` when empty.
pub fn template_or_default<'a>(settings: &'a Settings, key: &str, default: &'a str) -> Cow<'a, str> {
    match settings.text(key) {
        Some(text) if !text.is_empty() => unescape_template(text),
        _ => Cow::Borrowed(default),
    }
}

/// Context for the title slide and footer: every setting, the title fields
/// and the one-character separator flags. Values are HTML-escaped; the
/// template text itself is markup and is not.
pub fn title_context(settings: &Settings) -> Context {
    let mut context: Context = settings
        .template_context()
        .into_iter()
        .map(|(key, value)| {
            let value = escape(value.as_str()).into_owned();
            (key, value)
        })
        .collect();
    for field in TITLE_FIELDS {
        context.entry(field.to_string()).or_default();
    }

    let marker = |key: &str, mark: &str| {
        if context.get(key).is_some_and(|v| !v.is_empty()) {
            mark.to_string()
        } else {
            String::new()
        }
    };
    let is_institution = marker("institution", "-");
    let is_author = marker("author", ".");
    let is_subtitle = marker("subtitle", ".");

    context.insert("is_institution".to_string(), is_institution);
    context.insert("is_author".to_string(), is_author);
    context.insert("is_subtitle".to_string(), is_subtitle);
    context
}
