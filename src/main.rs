use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{error, warn};

use boxc::{load_plugins, Compiler, DiagnosticLevel, Diagnostics, PluginSource};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input, plugin_dir) = match parse_args(&args) {
        Some(parsed) => parsed,
        None => {
            eprintln!("Usage: boxc <file.box> [--plugins <dir>]");
            return ExitCode::from(1);
        }
    };

    let source = match fs::read_to_string(&input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Cannot read {}: {err}", input.display());
            return ExitCode::from(1);
        }
    };

    let mut diagnostics = Diagnostics::new();
    let plugin_sources = collect_plugin_sources(&plugin_dir);
    let registry = load_plugins(&plugin_sources, &mut diagnostics);

    println!("Loaded plugins:");
    for meta in registry.metadata() {
        println!("- {} v{} by {}", meta.name, meta.version, meta.author);
    }

    let compiler = Compiler::new(registry);
    let output = match compiler.compile(&source) {
        Ok(output) => output,
        Err(err) => {
            report(&diagnostics);
            eprintln!("Error: {err}");
            return ExitCode::from(2);
        }
    };

    report(&diagnostics);
    for diagnostic in &output.diagnostics {
        emit_diagnostic(diagnostic);
    }

    let out_path = input.with_extension("html");
    if let Err(err) = fs::write(&out_path, &output.html) {
        eprintln!("Cannot write {}: {err}", out_path.display());
        return ExitCode::from(2);
    }

    println!("Compiled {} -> {}", input.display(), out_path.display());
    ExitCode::SUCCESS
}

fn parse_args(args: &[String]) -> Option<(PathBuf, PathBuf)> {
    let mut input: Option<PathBuf> = None;
    let mut plugin_dir = PathBuf::from("plugins");
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--plugins" {
            plugin_dir = PathBuf::from(iter.next()?);
        } else if input.is_none() {
            input = Some(PathBuf::from(arg));
        } else {
            return None;
        }
    }
    input.map(|input| (input, plugin_dir))
}

/// Discovery order mirrors precedence: `default.box` first, then the
/// remaining declarative files (sorted), then scripted modules (sorted).
/// Later sources override earlier ones on name conflicts.
fn collect_plugin_sources(dir: &Path) -> Vec<PluginSource> {
    let mut declarative: Vec<PathBuf> = Vec::new();
    let mut scripted: Vec<PathBuf> = Vec::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            warn!(dir = %dir.display(), "plugin directory not readable; compiling without plugins");
            return Vec::new();
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("box") => declarative.push(path),
            Some("js") => scripted.push(path),
            _ => {}
        }
    }
    declarative.sort();
    scripted.sort();

    let default_box = dir.join("default.box");
    let mut ordered: Vec<PathBuf> = Vec::new();
    if declarative.contains(&default_box) {
        ordered.push(default_box.clone());
    }
    ordered.extend(declarative.into_iter().filter(|p| *p != default_box));
    let scripted_start = ordered.len();
    ordered.extend(scripted);

    let mut sources = Vec::new();
    for (index, path) in ordered.iter().enumerate() {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match fs::read_to_string(path) {
            Ok(content) => {
                if index < scripted_start {
                    sources.push(PluginSource::declarative(label, content));
                } else {
                    sources.push(PluginSource::scripted(label, content));
                }
            }
            Err(err) => warn!(file = %path.display(), %err, "skipping unreadable plugin file"),
        }
    }
    sources
}

fn report(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        emit_diagnostic(diagnostic);
    }
}

fn emit_diagnostic(diagnostic: &boxc::Diagnostic) {
    let source = diagnostic.source.as_deref().unwrap_or("<input>");
    match diagnostic.level {
        DiagnosticLevel::Error => {
            error!(code = %diagnostic.code, source, "{}", diagnostic.message)
        }
        DiagnosticLevel::Warning => {
            warn!(code = %diagnostic.code, source, "{}", diagnostic.message)
        }
    }
}
