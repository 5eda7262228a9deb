//! The emitter: walks the element tree depth-first, resolves each node
//! against the registry, enforces attribute/children filtering, invokes the
//! substitution engine, and hands the pieces to the assembler.

use tracing::debug;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dsl::{parse_document, Element};
use crate::error::CompileError;
use crate::plugin::definition::{AttrFilter, PluginDefinition};
use crate::plugin::PluginRegistry;
use crate::template::{resolve_content, resolve_script, TemplateContext};

use super::assembler;
use super::{CompileOptions, CompileOutput, UnknownTagPolicy};

/// One compilation run over a registry. The registry and the element tree
/// are exclusively owned by the run; nothing is shared across runs.
pub struct Compiler {
    registry: PluginRegistry,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(registry: PluginRegistry) -> Self {
        Self::with_options(registry, CompileOptions::default())
    }

    pub fn with_options(registry: PluginRegistry, options: CompileOptions) -> Self {
        Compiler { registry, options }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Compile one DSL source into a finished document.
    ///
    /// A DSL syntax error aborts with no output; everything non-fatal is
    /// reported through `CompileOutput::diagnostics`.
    pub fn compile(&self, source: &str) -> Result<CompileOutput, CompileError> {
        let mut diagnostics = Diagnostics::new();
        let roots = parse_document(source, self.options.max_depth)?;
        debug!(roots = roots.len(), "parsed DSL source");

        let mut state = EmitState::default();
        let mut fragment = String::new();
        for root in &roots {
            fragment.push_str(&self.emit(root, 0, &mut state, &mut diagnostics)?);
        }

        let css: Vec<String> = state
            .used
            .iter()
            .filter_map(|name| self.registry.get(name))
            .filter_map(|def| def.default_css.as_deref())
            .map(str::trim)
            .filter(|css| !css.is_empty())
            .map(str::to_string)
            .collect();

        let html = assembler::assemble(&fragment, &css, &state.scripts);
        Ok(CompileOutput {
            html,
            used_plugins: state.used,
            diagnostics: diagnostics.into_vec(),
        })
    }

    fn emit(
        &self,
        element: &Element,
        depth: usize,
        state: &mut EmitState,
        diagnostics: &mut Diagnostics,
    ) -> Result<String, CompileError> {
        if depth >= self.options.max_depth {
            return Err(CompileError::MaxDepth(self.options.max_depth));
        }
        let key = element.name.to_ascii_lowercase();
        match self.registry.get(&key) {
            Some(definition) => {
                self.emit_plugin(element, &key, definition, depth, state, diagnostics)
            }
            None => match self.options.unknown_tags {
                UnknownTagPolicy::Error => Err(CompileError::UnknownTag(element.name.clone())),
                UnknownTagPolicy::Passthrough => {
                    diagnostics.push(Diagnostic::warning(
                        "W301",
                        format!(
                            "tag '<{}>' has no registered plugin; passing through",
                            element.name
                        ),
                    ));
                    self.emit_passthrough(element, depth, state, diagnostics)
                }
            },
        }
    }

    fn emit_plugin(
        &self,
        element: &Element,
        key: &str,
        definition: &PluginDefinition,
        depth: usize,
        state: &mut EmitState,
        diagnostics: &mut Diagnostics,
    ) -> Result<String, CompileError> {
        // Pre-order bookkeeping: CSS is keyed by plugin (once per document),
        // scripts are per instance and depend only on this instance's data.
        if !state.used.iter().any(|used| used == key) {
            state.used.push(key.to_string());
        }
        if let Some(script) = definition
            .default_script
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            let ctx = TemplateContext {
                children: "",
                text: "",
                data: &element.data,
            };
            state.scripts.push(resolve_script(script, &ctx));
        }

        let mut children_html = String::new();
        if definition.selfclosing {
            if !element.children.is_empty() {
                diagnostics.push(Diagnostic::warning(
                    "W302",
                    format!(
                        "'<{key}>' is self-closing; {} child(ren) discarded",
                        element.children.len()
                    ),
                ));
            }
        } else {
            // Filtered before compiling: a dropped child contributes no
            // output, no CSS, no script.
            for child in &element.children {
                if !definition.permits_child(&child.name) {
                    diagnostics.push(Diagnostic::warning(
                        "W303",
                        format!(
                            "child '<{}>' not allowed inside '<{key}>'; dropped",
                            child.name
                        ),
                    ));
                    continue;
                }
                children_html.push_str(&self.emit(child, depth + 1, state, diagnostics)?);
            }
        }

        let attrs = self.render_attrs(element, key, Some(definition), diagnostics);
        let text = element.text();

        match definition.content.as_deref().filter(|c| !c.is_empty()) {
            Some(template) => {
                let ctx = TemplateContext {
                    children: &children_html,
                    text,
                    data: &element.data,
                };
                Ok(resolve_content(template, &ctx))
            }
            None => {
                let tag = definition.effective_tag(key);
                let mut attrs = attrs;
                if wants_default_class(element, definition) {
                    attrs.push_str(" class=\"");
                    attrs.push_str(key);
                    attrs.push('"');
                }
                if definition.selfclosing {
                    Ok(format!("<{tag}{attrs} />"))
                } else {
                    Ok(format!("<{tag}{attrs}>{text}{children_html}</{tag}>"))
                }
            }
        }
    }

    fn emit_passthrough(
        &self,
        element: &Element,
        depth: usize,
        state: &mut EmitState,
        diagnostics: &mut Diagnostics,
    ) -> Result<String, CompileError> {
        let mut children_html = String::new();
        for child in &element.children {
            children_html.push_str(&self.emit(child, depth + 1, state, diagnostics)?);
        }
        let attrs = self.render_attrs(element, &element.name, None, diagnostics);
        let text = element.text();
        let name = &element.name;
        Ok(format!("<{name}{attrs}>{text}{children_html}</{name}>"))
    }

    fn render_attrs(
        &self,
        element: &Element,
        key: &str,
        definition: Option<&PluginDefinition>,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let mut attrs = String::new();
        for (name, value) in element.attr_candidates() {
            let decision = definition
                .map(|d| d.filter_attr(name))
                .unwrap_or(AttrFilter::Allowed);
            match decision {
                AttrFilter::Allowed => {
                    attrs.push(' ');
                    attrs.push_str(name);
                    attrs.push_str("=\"");
                    attrs.push_str(value);
                    attrs.push('"');
                }
                AttrFilter::Denied => diagnostics.push(Diagnostic::warning(
                    "W304",
                    format!("attribute '{name}' on '<{key}>' denied by plugin rules; dropped"),
                )),
                AttrFilter::NotAllowed => diagnostics.push(Diagnostic::warning(
                    "W305",
                    format!("attribute '{name}' not allowed on '<{key}>'; dropped"),
                )),
            }
        }
        attrs
    }
}

/// A plugin that ships CSS and recognizes `class` in its `attrs` stamps
/// `class="<plugin name>"` on instances that supply none, so the injected
/// stylesheet has a stable selector target. Content templates control their
/// own markup and are unaffected.
fn wants_default_class(element: &Element, definition: &PluginDefinition) -> bool {
    definition
        .default_css
        .as_deref()
        .is_some_and(|css| !css.trim().is_empty())
        && definition
            .attrs
            .iter()
            .any(|a| a.eq_ignore_ascii_case("class"))
        && !element
            .attr_candidates()
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("class"))
}

#[derive(Default)]
struct EmitState {
    /// Plugins instantiated so far, deduplicated, first-use order.
    used: Vec<String>,
    /// Per-instance resolved scripts, instantiation order.
    scripts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::definition::AllowList;

    fn registry(entries: Vec<(&str, PluginDefinition)>) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        for (name, def) in entries {
            registry.insert(name, def);
        }
        registry
    }

    #[test]
    fn test_hej_scenario() {
        let reg = registry(vec![(
            "Hej",
            PluginDefinition {
                content: Some("<div>{{data_list}}</div>{{children}}".into()),
                attrs: vec!["class".into()],
                ..Default::default()
            },
        )]);
        let compiler = Compiler::new(reg);
        let out = compiler
            .compile(r#"Hej{"q1","q2"}(h1(text("Hello")))"#)
            .unwrap();
        assert_eq!(
            out.html,
            "<div><ul><li>q1</li><li>q2</li></ul></div><h1>Hello</h1>"
        );
        assert_eq!(out.used_plugins, vec!["hej".to_string()]);
    }

    #[test]
    fn test_unregistered_tag_passthrough() {
        let compiler = Compiler::new(PluginRegistry::new());
        let out = compiler.compile(r#"Foo(text("hi"))"#).unwrap();
        assert_eq!(out.html, "<Foo>hi</Foo>");
        assert!(out.used_plugins.is_empty());
        assert!(out.diagnostics.iter().any(|d| d.code == "W301"));
    }

    #[test]
    fn test_unregistered_tag_error_policy() {
        let compiler = Compiler::with_options(
            PluginRegistry::new(),
            CompileOptions {
                unknown_tags: UnknownTagPolicy::Error,
                ..Default::default()
            },
        );
        let err = compiler.compile(r#"Foo(text("hi"))"#).unwrap_err();
        assert!(matches!(err, CompileError::UnknownTag(name) if name == "Foo"));
    }

    #[test]
    fn test_case_insensitive_tag_resolution() {
        let reg = registry(vec![(
            "Card",
            PluginDefinition {
                tag: Some("div".into()),
                ..Default::default()
            },
        )]);
        let compiler = Compiler::new(reg);
        let out = compiler.compile(r#"CARD(text("x")) card(text("y"))"#).unwrap();
        assert_eq!(out.html, "<div>x</div><div>y</div>");
        assert_eq!(out.used_plugins, vec!["card".to_string()]);
    }

    #[test]
    fn test_selfclosing_discards_children() {
        let reg = registry(vec![(
            "Divider",
            PluginDefinition {
                tag: Some("hr".into()),
                selfclosing: true,
                attrs: vec!["class".into()],
                ..Default::default()
            },
        )]);
        let compiler = Compiler::new(reg);
        let out = compiler
            .compile(r#"Divider(class("wide") p(text("ignored")))"#)
            .unwrap();
        assert_eq!(out.html, r#"<hr class="wide" />"#);
        assert!(out.diagnostics.iter().any(|d| d.code == "W302"));
    }

    #[test]
    fn test_attr_filtering_with_diagnostics() {
        let reg = registry(vec![(
            "Card",
            PluginDefinition {
                tag: Some("div".into()),
                allow_attrs: Some(AllowList::Named(vec!["class".into(), "onclick".into()])),
                deny_attrs: vec!["onclick".into()],
                ..Default::default()
            },
        )]);
        let compiler = Compiler::new(reg);
        let out = compiler
            .compile(r#"Card(class("c") onclick("evil()") style("x") text("t"))"#)
            .unwrap();
        assert_eq!(out.html, r#"<div class="c">t</div>"#);
        let codes: Vec<&str> = out.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert!(codes.contains(&"W304")); // onclick denied
        assert!(codes.contains(&"W305")); // style not allowed
    }

    #[test]
    fn test_children_filtering() {
        let reg = registry(vec![
            (
                "List",
                PluginDefinition {
                    tag: Some("ul".into()),
                    allow_children: Some(AllowList::Named(vec!["Item".into()])),
                    ..Default::default()
                },
            ),
            (
                "Item",
                PluginDefinition {
                    tag: Some("li".into()),
                    default_css: Some(".item{}".into()),
                    ..Default::default()
                },
            ),
            (
                "Rogue",
                PluginDefinition {
                    tag: Some("div".into()),
                    default_css: Some(".rogue{}".into()),
                    ..Default::default()
                },
            ),
        ]);
        let compiler = Compiler::new(reg);
        let out = compiler
            .compile(r#"List(Item(text("a")) Rogue(text("b")) item(text("c")))"#)
            .unwrap();
        assert!(out.html.contains("<ul><li>a</li><li>c</li></ul>"));
        assert!(out.diagnostics.iter().any(|d| d.code == "W303"));
        // The dropped child contributes nothing, including CSS.
        assert_eq!(out.used_plugins, vec!["list".to_string(), "item".to_string()]);
        assert!(!out.html.contains(".rogue"));
    }

    #[test]
    fn test_css_once_script_per_instance() {
        let reg = registry(vec![(
            "Alert",
            PluginDefinition {
                tag: Some("div".into()),
                default_css: Some(".alert{color:red}".into()),
                default_script: Some("alert({{data_json[0]}});".into()),
                ..Default::default()
            },
        )]);
        let compiler = Compiler::new(reg);
        let out = compiler
            .compile(r#"Alert{"one"}(text("a")) Alert{"two"}(text("b"))"#)
            .unwrap();
        assert_eq!(out.html.matches(".alert{color:red}").count(), 1);
        assert!(out.html.contains("alert(\"one\");"));
        assert!(out.html.contains("alert(\"two\");"));
        assert_eq!(out.used_plugins, vec!["alert".to_string()]);
    }

    #[test]
    fn test_script_order_is_pre_order() {
        let reg = registry(vec![
            (
                "Outer",
                PluginDefinition {
                    tag: Some("div".into()),
                    default_script: Some("outer({{data[0]}});".into()),
                    ..Default::default()
                },
            ),
            (
                "Inner",
                PluginDefinition {
                    tag: Some("span".into()),
                    default_script: Some("inner({{data[0]}});".into()),
                    ..Default::default()
                },
            ),
        ]);
        let compiler = Compiler::new(reg);
        let out = compiler
            .compile(r#"Outer{"1"}(Inner{"2"}(text("x")))"#)
            .unwrap();
        let outer_pos = out.html.find("outer(1);").unwrap();
        let inner_pos = out.html.find("inner(2);").unwrap();
        assert!(outer_pos < inner_pos);
    }

    #[test]
    fn test_default_rendering_without_content() {
        let reg = registry(vec![(
            "Card",
            PluginDefinition {
                attrs: vec!["class".into()],
                ..Default::default()
            },
        )]);
        let compiler = Compiler::new(reg);
        let out = compiler
            .compile(r#"Card(class("c") text("hi") p(text("child")))"#)
            .unwrap();
        assert_eq!(out.html, r#"<card class="c">hi<p>child</p></card>"#);
    }

    #[test]
    fn test_default_class_targets_plugin_css() {
        let reg = registry(vec![(
            "Card",
            PluginDefinition {
                tag: Some("div".into()),
                attrs: vec!["class".into()],
                default_css: Some(".card{border:1px solid #ddd}".into()),
                ..Default::default()
            },
        )]);
        let compiler = Compiler::new(reg);

        let out = compiler.compile(r#"Card(text("x"))"#).unwrap();
        assert!(out.html.contains(r#"<div class="card">x</div>"#));

        // An explicit class always wins over the stamped default.
        let out = compiler.compile(r#"Card(class("mine") text("x"))"#).unwrap();
        assert!(out.html.contains(r#"<div class="mine">x</div>"#));
    }

    #[test]
    fn test_no_default_class_without_css_or_class_attr() {
        let reg = registry(vec![
            (
                "Plain",
                PluginDefinition {
                    tag: Some("div".into()),
                    attrs: vec!["class".into()],
                    ..Default::default()
                },
            ),
            (
                "NoClass",
                PluginDefinition {
                    tag: Some("em".into()),
                    default_css: Some(".x{}".into()),
                    ..Default::default()
                },
            ),
        ]);
        let compiler = Compiler::new(reg);
        let out = compiler
            .compile(r#"Plain(text("a")) NoClass(text("b"))"#)
            .unwrap();
        assert!(out.html.contains("<div>a</div>"));
        assert!(out.html.contains("<em>b</em>"));
    }

    #[test]
    fn test_empty_content_treated_as_absent() {
        let reg = registry(vec![(
            "Box",
            PluginDefinition {
                tag: Some("div".into()),
                content: Some(String::new()),
                ..Default::default()
            },
        )]);
        let compiler = Compiler::new(reg);
        let out = compiler.compile(r#"Box(text("x"))"#).unwrap();
        assert_eq!(out.html, "<div>x</div>");
    }

    #[test]
    fn test_syntax_error_aborts_with_no_output() {
        let compiler = Compiler::new(PluginRegistry::new());
        let err = compiler.compile(r#"Hej{"q1","q2"}(h1(text("Hello"))"#).unwrap_err();
        assert!(matches!(err, CompileError::DslSyntax { .. }));
    }

    #[test]
    fn test_head_and_body_injection() {
        let reg = registry(vec![
            (
                "Page",
                PluginDefinition {
                    content: Some(
                        "<html><head><title>{{text}}</title></head><body>{{children}}</body></html>"
                            .into(),
                    ),
                    default_css: Some("body{margin:0}".into()),
                    ..Default::default()
                },
            ),
            (
                "Counter",
                PluginDefinition {
                    tag: Some("div".into()),
                    default_script: Some("count({{data[0]}});".into()),
                    ..Default::default()
                },
            ),
        ]);
        let compiler = Compiler::new(reg);
        let out = compiler
            .compile(r#"Page(text("Home") Counter{"3"}(text("c")))"#)
            .unwrap();
        assert!(out.html.contains("<head>\n<style>\nbody{margin:0}\n</style>"));
        let script_pos = out.html.find("<script>").unwrap();
        let body_close = out.html.find("</body>").unwrap();
        assert!(script_pos < body_close);
        assert!(out.html.contains("count(3);"));
    }
}
