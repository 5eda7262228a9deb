//! Placeholder resolution with an exact two-phase order.
//!
//! Indexed tokens (`data[n]`, `data_json[n]`, `data_json_esc[n]`) resolve
//! first over the raw template; general tokens (`children`, `text`, `*`,
//! `data`, `data_list`, `data_json`, `data_json_esc`) resolve over what
//! remains. Unknown tokens pass through unchanged: the engine never fails,
//! to keep authoring forgiving.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// What an element instance supplies to template resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContext<'a> {
    /// Compiled HTML of the element's surviving children.
    pub children: &'a str,
    /// Value of the reserved `text` property, or empty.
    pub text: &'a str,
    /// Inline literal data values, in call-site order.
    pub data: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Content,
    /// Script templates share the data context, but `children`/`text`/`*`
    /// are not meaningful there and are left untouched.
    Script,
}

/// Resolve a `content` template.
pub fn resolve_content(template: &str, ctx: &TemplateContext) -> String {
    resolve(template, ctx, Mode::Content)
}

/// Resolve a `default_script` template for one element instance.
pub fn resolve_script(template: &str, ctx: &TemplateContext) -> String {
    resolve(template, ctx, Mode::Script)
}

fn indexed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*(data|data_json|data_json_esc)\[(\d+)\]\s*\}\}").unwrap()
    })
}

fn general_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*(\*|[A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap())
}

fn resolve(template: &str, ctx: &TemplateContext, mode: Mode) -> String {
    let after_indexed = indexed_re().replace_all(template, |caps: &Captures| {
        let index: usize = caps[2].parse().unwrap_or(usize::MAX);
        let value = match ctx.data.get(index) {
            Some(value) => value,
            // Index out of range substitutes empty text, non-fatally.
            None => return String::new(),
        };
        match &caps[1] {
            "data" => value.clone(),
            "data_json" => json_string(value),
            _ => escape_embedded(&json_string(value)),
        }
    });

    general_re()
        .replace_all(&after_indexed, |caps: &Captures| {
            match (mode, &caps[1]) {
                (Mode::Content, "children") => ctx.children.to_string(),
                (Mode::Content, "text") => ctx.text.to_string(),
                (Mode::Content, "*") => format!("{}{}", ctx.text, ctx.children),
                (_, "data") => ctx.data.join(","),
                (_, "data_list") => data_list(ctx.data),
                (_, "data_json") => json_array(ctx.data),
                (_, "data_json_esc") => escape_embedded(&json_array(ctx.data)),
                // Unknown (or mode-inapplicable) token: pass through.
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn data_list(data: &[String]) -> String {
    let mut out = String::from("<ul>");
    for value in data {
        out.push_str("<li>");
        out.push_str(value);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn json_array(data: &[String]) -> String {
    serde_json::to_string(data).unwrap_or_default()
}

/// Escape a JSON value for embedding inside an enclosing quoted string
/// literal in the surrounding script text.
fn escape_embedded(json: &str) -> String {
    json.replace('\\', "\\\\").replace('"', "\\\"")
}
