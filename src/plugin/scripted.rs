//! Loader for scripted plugin modules (JavaScript, evaluated with Boa).
//!
//! A module is expected to define a global `register(registry)` function
//! that inserts name → definition-shaped objects into the passed object.
//! The loader evaluates the module in a fresh context, drives `register`
//! against an empty object, serializes the result to JSON inside the JS
//! context and validates it into [`PluginDefinition`]s on the Rust side.
//! An optional `metadata()` function (or `meta` object) supplies display
//! metadata and has no effect on compilation.

use boa_engine::{Context, Source};
use serde_json::Value;
use tracing::debug;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::PluginError;

use super::definition::{definition_from_value, PluginMetadata};
use super::loader::ParsedSource;

const REGISTER_DRIVER: &str = r#"(function () {
    if (typeof register !== "function") { return "__missing_register__"; }
    var registry = {};
    register(registry);
    return JSON.stringify(registry);
})()"#;

const METADATA_DRIVER: &str = r#"(function () {
    if (typeof metadata === "function") { return JSON.stringify(metadata()); }
    if (typeof meta === "object" && meta !== null) { return JSON.stringify(meta); }
    return "null";
})()"#;

/// Execute one scripted module. Evaluation failure or a missing `register`
/// export fails the whole source; individual malformed entries are skipped
/// with diagnostics.
pub(crate) fn parse_source(
    label: &str,
    code: &str,
    diagnostics: &mut Diagnostics,
) -> Result<ParsedSource, PluginError> {
    let mut context = Context::default();
    context
        .eval(Source::from_bytes(code))
        .map_err(|e| PluginError::Script(format!("eval error: {e}")))?;

    let registry_json = eval_to_string(&mut context, REGISTER_DRIVER)?;
    if registry_json == "__missing_register__" {
        return Err(PluginError::MissingExport("register".into()));
    }
    let value: Value = serde_json::from_str(&registry_json)
        .map_err(|e| PluginError::Script(format!("invalid registration payload: {e}")))?;
    let entries = value
        .as_object()
        .ok_or_else(|| PluginError::Script("register() must populate an object".into()))?;

    let mut parsed = ParsedSource::default();
    for (name, entry) in entries {
        if let Some(definition) = definition_from_value(name, entry, label, diagnostics) {
            parsed.definitions.push((name.clone(), definition));
        }
    }
    debug!(
        source = %label,
        definitions = parsed.definitions.len(),
        "scripted module registered definitions"
    );

    // Metadata is display-only; a broken metadata entry point must not
    // throw away the definitions register() already produced.
    match eval_to_string(&mut context, METADATA_DRIVER) {
        Ok(metadata_json) if metadata_json != "null" => {
            match serde_json::from_str::<PluginMetadata>(&metadata_json) {
                Ok(metadata) => parsed.metadata = Some(metadata),
                Err(e) => diagnostics.push(
                    Diagnostic::warning("W105", format!("invalid metadata: {e}"))
                        .with_source(label),
                ),
            }
        }
        Ok(_) => {}
        Err(e) => diagnostics.push(
            Diagnostic::warning("W105", format!("metadata lookup failed: {e}"))
                .with_source(label),
        ),
    }

    Ok(parsed)
}

fn eval_to_string(context: &mut Context, code: &str) -> Result<String, PluginError> {
    let result = context
        .eval(Source::from_bytes(code))
        .map_err(|e| PluginError::Script(format!("eval error: {e}")))?;
    result
        .as_string()
        .map(|s| s.to_std_string_escaped())
        .ok_or_else(|| PluginError::Script("expected string result".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::definition::AllowList;

    const ADVANCED_MODULE: &str = r#"
        var meta = {
            name: "Advanced Component",
            author: "Plugin Author",
            version: "1.0",
            description: "Provides an advanced component"
        };

        function register(registry) {
            registry["Hej"] = {
                tag: "div",
                content: "<div>{{data_list}}</div>{{children}}",
                selfclosing: false,
                attrs: ["class"],
                default_css: ".card{padding:10px;border:1px solid #ddd}",
                default_script: "alert({{data_json[0]}})",
                allow_children: ["*"],
                allow_attrs: ["*"],
                deny_attrs: []
            };
        }

        function metadata() { return meta; }
    "#;

    #[test]
    fn test_register_and_metadata() {
        let mut diags = Diagnostics::new();
        let parsed = parse_source("advanced.js", ADVANCED_MODULE, &mut diags).unwrap();
        assert_eq!(parsed.definitions.len(), 1);
        let (name, def) = &parsed.definitions[0];
        assert_eq!(name, "Hej");
        assert_eq!(def.tag.as_deref(), Some("div"));
        assert_eq!(def.allow_attrs, Some(AllowList::All));
        assert_eq!(
            def.default_script.as_deref(),
            Some("alert({{data_json[0]}})")
        );
        let meta = parsed.metadata.unwrap();
        assert_eq!(meta.name, "Advanced Component");
        assert_eq!(meta.version, "1.0");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_throwing_metadata_keeps_definitions() {
        let module = r#"
            function register(registry) { registry["Card"] = { tag: "div" }; }
            function metadata() { throw new Error("meta boom"); }
        "#;
        let mut diags = Diagnostics::new();
        let parsed = parse_source("m.js", module, &mut diags).unwrap();
        assert_eq!(parsed.definitions.len(), 1);
        assert_eq!(parsed.definitions[0].0, "Card");
        assert!(parsed.metadata.is_none());
        assert_eq!(diags.warnings().len(), 1);
        assert_eq!(diags.warnings()[0].code, "W105");
    }

    #[test]
    fn test_meta_object_without_metadata_function() {
        let module = r#"
            var meta = { name: "Bare", version: "0.1" };
            function register(registry) { registry["X"] = { tag: "span" }; }
        "#;
        let mut diags = Diagnostics::new();
        let parsed = parse_source("bare.js", module, &mut diags).unwrap();
        assert_eq!(parsed.metadata.unwrap().name, "Bare");
    }

    #[test]
    fn test_multiple_registrations_keep_order() {
        let module = r#"
            function register(registry) {
                registry["Zeta"] = { tag: "div" };
                registry["Alpha"] = { tag: "span" };
            }
        "#;
        let mut diags = Diagnostics::new();
        let parsed = parse_source("m.js", module, &mut diags).unwrap();
        let names: Vec<&str> = parsed.definitions.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_syntax_error_fails_source() {
        let mut diags = Diagnostics::new();
        let err = parse_source("broken.js", "function register( {", &mut diags).unwrap_err();
        assert!(matches!(err, PluginError::Script(_)));
    }

    #[test]
    fn test_missing_register_fails_source() {
        let mut diags = Diagnostics::new();
        let err = parse_source("empty.js", "var x = 1;", &mut diags).unwrap_err();
        assert!(matches!(err, PluginError::MissingExport(_)));
    }

    #[test]
    fn test_register_throw_fails_source() {
        let module = r#"function register(registry) { throw new Error("boom"); }"#;
        let mut diags = Diagnostics::new();
        let err = parse_source("throw.js", module, &mut diags).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_bad_entry_skipped_with_diagnostic() {
        let module = r#"
            function register(registry) {
                registry["Good"] = { tag: "div" };
                registry["Bad"] = 42;
            }
        "#;
        let mut diags = Diagnostics::new();
        let parsed = parse_source("mixed.js", module, &mut diags).unwrap();
        assert_eq!(parsed.definitions.len(), 1);
        assert_eq!(parsed.definitions[0].0, "Good");
        assert_eq!(diags.warnings().len(), 1);
        assert_eq!(diags.warnings()[0].code, "W102");
    }

    #[test]
    fn test_no_metadata() {
        let module = r#"function register(registry) { registry["X"] = { tag: "b" }; }"#;
        let mut diags = Diagnostics::new();
        let parsed = parse_source("m.js", module, &mut diags).unwrap();
        assert!(parsed.metadata.is_none());
    }
}
