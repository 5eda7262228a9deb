//! The plugin definition record and its load-time validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::{Diagnostic, Diagnostics};

/// Whitelist of names, or the wildcard sentinel allowing everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList {
    /// The `"*"` sentinel: everything passes.
    All,
    /// Only the named entries pass; names match case-insensitively.
    Named(Vec<String>),
}

impl AllowList {
    /// Build from a list of names; a `"*"` entry anywhere means allow all.
    pub fn from_names(names: Vec<String>) -> Self {
        if names.iter().any(|n| n == "*") {
            AllowList::All
        } else {
            AllowList::Named(names)
        }
    }

    pub fn permits(&self, name: &str) -> bool {
        match self {
            AllowList::All => true,
            AllowList::Named(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
        }
    }
}

/// Outcome of filtering one candidate attribute against a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrFilter {
    Allowed,
    /// Rejected by `deny_attrs`; wins over every allow rule.
    Denied,
    /// Absent from the effective whitelist.
    NotAllowed,
}

/// Configuration record describing how one DSL tag compiles to HTML/CSS/JS.
///
/// Both loader kinds produce this same shape; the registry is agnostic to
/// origin.
#[derive(Debug, Clone, Default)]
pub struct PluginDefinition {
    /// Output element name; defaults to the plugin name, lower-cased.
    pub tag: Option<String>,
    /// Content template. When present, the resolved template is the whole
    /// output for the element; when absent, the default
    /// `<tag attrs>text+children</tag>` rendering applies.
    pub content: Option<String>,
    /// Render as a void element and discard any children.
    pub selfclosing: bool,
    /// Recognized attribute names; fallback whitelist when `allow_attrs`
    /// is absent.
    pub attrs: Vec<String>,
    /// Stylesheet injected at most once per compiled document.
    pub default_css: Option<String>,
    /// Script template resolved once per element instance.
    pub default_script: Option<String>,
    pub allow_children: Option<AllowList>,
    pub allow_attrs: Option<AllowList>,
    /// Blacklist; always takes precedence over any whitelist.
    pub deny_attrs: Vec<String>,
}

impl PluginDefinition {
    /// Output element name, falling back to the registry key.
    pub fn effective_tag(&self, key: &str) -> String {
        self.tag
            .clone()
            .unwrap_or_else(|| key.to_ascii_lowercase())
    }

    /// Decide the fate of one candidate attribute. `deny_attrs` is checked
    /// first; then `allow_attrs` (wildcard or whitelist), falling back to
    /// `attrs` when `allow_attrs` is absent. No restriction at all allows
    /// everything.
    pub fn filter_attr(&self, name: &str) -> AttrFilter {
        if self.deny_attrs.iter().any(|d| d.eq_ignore_ascii_case(name)) {
            return AttrFilter::Denied;
        }
        let allowed = match &self.allow_attrs {
            Some(list) => list.permits(name),
            None => {
                self.attrs.is_empty() || self.attrs.iter().any(|a| a.eq_ignore_ascii_case(name))
            }
        };
        if allowed {
            AttrFilter::Allowed
        } else {
            AttrFilter::NotAllowed
        }
    }

    /// Whether a child with the given tag name survives `allow_children`.
    pub fn permits_child(&self, name: &str) -> bool {
        match &self.allow_children {
            Some(list) => list.permits(name),
            None => true,
        }
    }
}

/// Informational plugin metadata; has no effect on compilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginMetadata {
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: String,
}

/// Build a definition from a scripted registration object, validating field
/// names and types. Unknown fields and mis-typed fields are ignored with a
/// warning diagnostic; a non-object entry is skipped entirely.
pub(crate) fn definition_from_value(
    name: &str,
    value: &Value,
    source: &str,
    diagnostics: &mut Diagnostics,
) -> Option<PluginDefinition> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            diagnostics.push(
                Diagnostic::warning(
                    "W102",
                    format!("entry '{name}' is not an object; skipping"),
                )
                .with_source(source),
            );
            return None;
        }
    };

    let mut def = PluginDefinition::default();
    for (key, val) in obj {
        match key.as_str() {
            "tag" => def.tag = expect_string(name, key, val, source, diagnostics),
            "content" => def.content = expect_string(name, key, val, source, diagnostics),
            "selfclosing" => {
                if let Some(b) = val.as_bool() {
                    def.selfclosing = b;
                } else {
                    mistyped(name, key, "a boolean", source, diagnostics);
                }
            }
            "attrs" => {
                if let Some(list) = expect_string_list(name, key, val, source, diagnostics) {
                    def.attrs = list;
                }
            }
            "default_css" => {
                def.default_css = expect_string(name, key, val, source, diagnostics)
            }
            "default_script" => {
                def.default_script = expect_string(name, key, val, source, diagnostics)
            }
            "allow_children" => {
                if let Some(list) = expect_string_list(name, key, val, source, diagnostics) {
                    def.allow_children = Some(AllowList::from_names(list));
                }
            }
            "allow_attrs" => {
                if let Some(list) = expect_string_list(name, key, val, source, diagnostics) {
                    def.allow_attrs = Some(AllowList::from_names(list));
                }
            }
            "deny_attrs" => {
                if let Some(list) = expect_string_list(name, key, val, source, diagnostics) {
                    def.deny_attrs = list;
                }
            }
            _ => diagnostics.push(
                Diagnostic::warning(
                    "W103",
                    format!("unknown field '{key}' in definition '{name}'; ignored"),
                )
                .with_source(source),
            ),
        }
    }
    Some(def)
}

fn expect_string(
    name: &str,
    key: &str,
    val: &Value,
    source: &str,
    diagnostics: &mut Diagnostics,
) -> Option<String> {
    match val.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            mistyped(name, key, "a string", source, diagnostics);
            None
        }
    }
}

fn expect_string_list(
    name: &str,
    key: &str,
    val: &Value,
    source: &str,
    diagnostics: &mut Diagnostics,
) -> Option<Vec<String>> {
    let arr = match val.as_array() {
        Some(arr) => arr,
        None => {
            mistyped(name, key, "an array of strings", source, diagnostics);
            return None;
        }
    };
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        match item.as_str() {
            Some(s) => out.push(s.to_string()),
            None => {
                mistyped(name, key, "an array of strings", source, diagnostics);
                return None;
            }
        }
    }
    Some(out)
}

fn mistyped(name: &str, key: &str, expected: &str, source: &str, diagnostics: &mut Diagnostics) {
    diagnostics.push(
        Diagnostic::warning(
            "W104",
            format!("field '{key}' in definition '{name}' must be {expected}; ignored"),
        )
        .with_source(source),
    );
}
