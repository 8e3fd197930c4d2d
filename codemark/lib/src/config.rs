//! Host-persisted settings.
//!
//! The host owns persistence and the settings screen; this module only
//! describes the key/value document and its defaults. Keys use the host's
//! camelCase names so a stored settings blob deserializes directly.
//!
//! ## Examples
//!
//! ```
//! use codemark_lib::Settings;
//!
//! let settings = Settings::from_json(r#"{ "excludeLangs": ["todoist"], "showLineNumber": false }"#).unwrap();
//! assert!(settings.is_excluded("todoist"));
//! assert!(!settings.show_line_number);
//! assert_eq!(settings.highlight_color, "#2d82cc20");
//! ```

use crate::types::{CodemarkError, CodemarkResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Title background used when the configured value is missing or blank.
pub const DEFAULT_TITLE_BACKGROUND: &str = "#00000020";

/// Highlighted line background used when nothing else is configured.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#2d82cc20";

/// Settings controlling which blocks are decorated and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Languages whose blocks are left completely unprocessed.
    #[serde(deserialize_with = "deserialize_lang_list")]
    pub exclude_langs: Vec<String>,
    /// Background of the title bar.
    pub title_background_color: String,
    /// Font color of the title bar (inherits when unset).
    pub title_font_color: Option<String>,
    /// Background of highlighted lines.
    #[serde(rename = "highLightColor")]
    pub highlight_color: String,
    /// Whether to show a line-number column / gutter widget.
    pub show_line_number: bool,
    /// Whether the line numbers get a dividing border on their right.
    pub show_dividing_line: bool,
    /// Whether the capitalized language name appears in the title bar.
    pub show_lang_name_in_top_right: bool,
    /// Token replaced by a space everywhere in a parsed title.
    pub substitution_token_for_space: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exclude_langs: Vec::new(),
            title_background_color: DEFAULT_TITLE_BACKGROUND.to_string(),
            title_font_color: None,
            highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_string(),
            show_line_number: true,
            show_dividing_line: false,
            show_lang_name_in_top_right: true,
            substitution_token_for_space: None,
        }
    }
}

impl Settings {
    /// Parses settings from a JSON document. Missing keys take their defaults.
    pub fn from_json(json: &str) -> CodemarkResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses settings from a YAML document. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> CodemarkResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads settings from a `.json`, `.yaml` or `.yml` file.
    ///
    /// ## Errors
    ///
    /// Returns an error if the file cannot be read, does not decode, or has
    /// any other extension.
    pub fn load(path: &Path) -> CodemarkResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("yaml" | "yml") => Self::from_yaml(&content),
            other => Err(CodemarkError::SettingsFormat(format!(
                "{} (extension {:?})",
                path.display(),
                other.unwrap_or("")
            ))),
        }
    }

    /// Checks a host-emitted language tag against the exclusion list.
    ///
    /// Exact string comparison; the host already lower-cases the tag.
    pub fn is_excluded(&self, language: &str) -> bool {
        self.exclude_langs.iter().any(|lang| lang == language)
    }

    /// Title bar background, falling back to the default when blank.
    pub fn title_background(&self) -> &str {
        non_blank(Some(&self.title_background_color)).unwrap_or(DEFAULT_TITLE_BACKGROUND)
    }

    /// Title font color, if one is configured.
    pub fn title_font(&self) -> Option<&str> {
        non_blank(self.title_font_color.as_ref())
    }

    /// Replaces every occurrence of the substitution token in `title` with a space.
    pub fn substitute_spaces(&self, title: &str) -> String {
        match non_blank(self.substitution_token_for_space.as_ref()) {
            Some(token) => title.replace(token, " "),
            None => title.to_string(),
        }
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Accepts either a list of languages or the comma-separated string the
/// host's settings screen stores. Blank entries are dropped.
fn deserialize_lang_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LangList {
        List(Vec<String>),
        Joined(String),
    }

    let langs = match LangList::deserialize(deserializer)? {
        LangList::List(list) => list,
        LangList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
    };

    Ok(langs
        .into_iter()
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
        .collect())
}
