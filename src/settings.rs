// ABOUTME: Settings store holding every presentation option for one run
// ABOUTME: Seeded with defaults, then overlaid by document, theme and CLI values

use crate::errors::{Result, SlideError};
use indexmap::IndexMap;

/// A single setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    List(Vec<String>),
    /// Only built-in defaults and command-line overlays produce flags;
    /// document fields always arrive as text.
    Flag(bool),
}

impl Value {
    /// Boolean reading of a value. Text counts as false when empty or one of
    /// `false`, `no`, `off`, `0`; any other text is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Flag(b) => *b,
            Value::List(items) => !items.is_empty(),
            Value::Text(text) => !matches!(
                text.trim().to_lowercase().as_str(),
                "" | "false" | "no" | "off" | "0"
            ),
        }
    }

    /// The value as substitution text. Lists are concatenated without a
    /// separator; flags have no textual form and become empty.
    pub fn substitution_text(&self) -> String {
        match self {
            Value::Text(text) => text.clone(),
            Value::List(items) => items.concat(),
            Value::Flag(_) => String::new(),
        }
    }

    /// The value as it appears inside a rendered template.
    pub fn display_text(&self) -> String {
        match self {
            Value::Text(text) => text.clone(),
            Value::List(items) => items.join(", "),
            Value::Flag(b) => b.to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Flag(b)
    }
}

/// Insertion-ordered mapping from setting name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: IndexMap<String, Value>,
}

impl Settings {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the built-in presentation defaults.
    pub fn with_defaults() -> Self {
        let mut settings = Self::new();

        // Inline content and extra asset files
        settings.set("css_embedd", Vec::<String>::new());
        settings.set("css_files", Vec::<String>::new());
        settings.set("js_embedd", Vec::<String>::new());
        settings.set("js_files", Vec::<String>::new());

        // Style
        settings.set("reveal_theme", "white");
        settings.set("transition", "fade");
        settings.set("pygments_style", "default");
        settings.set("stylesheet", "");
        settings.set("vertical_center", false);
        settings.set("horizontal_center", false);
        settings.set("title_center", false);
        settings.set("footer", false);
        settings.set("page_number", false);
        settings.set("controls", false);

        // Templates; empty means the built-in one
        settings.set("firstslide_template", "");
        settings.set("footer_template", "");
        settings.set("init_html", "");

        settings
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Text of a scalar setting; `None` when absent or not text.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(Value::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Items of a list setting. A scalar reads as a one-element list.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::List(items)) => items.clone(),
            Some(Value::Text(text)) if !text.is_empty() => vec![text.clone()],
            _ => Vec::new(),
        }
    }

    /// Boolean reading of a setting, false when absent.
    pub fn flag(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(Value::is_truthy)
    }

    /// Bare write: always replaces.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn set_text(&mut self, key: &str, text: &str) {
        self.set(key, text);
    }

    pub fn set_list(&mut self, key: &str, items: Vec<String>) {
        self.set(key, items);
    }

    /// Append to a list setting, creating it when absent. A scalar already
    /// stored under the key becomes the first list entry.
    pub fn append(&mut self, key: &str, items: impl IntoIterator<Item = String>) {
        let entry = self
            .values
            .entry(key.to_string())
            .or_insert_with(|| Value::List(Vec::new()));
        if !matches!(entry, Value::List(_)) {
            let previous = entry.substitution_text();
            *entry = Value::List(if previous.is_empty() {
                Vec::new()
            } else {
                vec![previous]
            });
        }
        if let Value::List(list) = entry {
            list.extend(items);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Overlay `other` onto this store; keys in `other` win.
    pub fn merge(&mut self, other: Settings) {
        for (key, value) in other.values {
            self.values.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Substitution table: one entry per setting, serialized as text.
    pub fn substitutions(&self) -> IndexMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.substitution_text()))
            .collect()
    }

    /// Every setting as display text, the base of a template context.
    pub fn template_context(&self) -> IndexMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.display_text()))
            .collect()
    }
}

/// Parse a `key=value` overlay. `true`/`false` become flags.
pub fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let (key, value) = assignment.split_once('=').ok_or_else(|| {
        SlideError::ConfigError(format!("expected key=value, got '{}'", assignment))
    })?;
    let key = key.trim().to_lowercase();
    if key.is_empty() {
        return Err(SlideError::ConfigError(format!(
            "empty setting name in '{}'",
            assignment
        )));
    }
    let value = match value.trim() {
        "true" => Value::Flag(true),
        "false" => Value::Flag(false),
        other => Value::Text(other.to_string()),
    };
    Ok((key, value))
}
