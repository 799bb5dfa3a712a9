//! jsonhome CLI
//!
//! Command-line interface for building, inspecting and querying json-home
//! documents.

mod manifest;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use jsonhome_document::{Document, JsonCodec, Location, Resource};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsonhome")]
#[command(version, about = "Build and query json-home API discovery documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a json-home document from a resource manifest
    #[command(after_help = "EXAMPLES:\n  \
        # Print the document built from a YAML manifest\n  \
        jsonhome build --manifest resources.yaml --pretty\n\n  \
        # Write it to a file\n  \
        jsonhome build --manifest resources.yaml --output home.json")]
    Build {
        /// Path to the manifest (YAML or JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Indent the printed document
        #[arg(long)]
        pretty: bool,
    },

    /// List the resources of a document
    Show {
        /// Path to the json-home document
        document: PathBuf,
    },

    /// Resolve the URI of a resource
    #[command(after_help = "EXAMPLES:\n  \
        jsonhome resolve home.json \\\n    \
        --rel http://mysite.com/rel/widgets \\\n    \
        --var widget_id=1234")]
    Resolve {
        /// Path to the json-home document
        document: PathBuf,

        /// Link relation of the resource
        #[arg(short, long)]
        rel: String,

        /// Template variable binding (name=value), repeatable
        #[arg(long = "var", value_parser = parse_binding)]
        vars: Vec<(String, String)>,
    },

    /// Validate a document and compare it with its canonical form
    Check {
        /// Path to the json-home document
        document: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    tracing::debug!("verbose mode enabled");

    match cli.command {
        Commands::Build {
            manifest,
            output,
            pretty,
        } => build_command(&manifest, output.as_deref(), pretty)?,
        Commands::Show { document } => show_command(&document)?,
        Commands::Resolve {
            document,
            rel,
            vars,
        } => resolve_command(&document, &rel, &vars)?,
        Commands::Check { document } => check_command(&document)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

fn parse_binding(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{}'", raw)),
    }
}

fn load_document(path: &Path) -> Result<Document> {
    Document::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn build_command(manifest_path: &Path, output: Option<&Path>, pretty: bool) -> Result<()> {
    let doc = manifest::load_manifest(manifest_path)?;

    match output {
        Some(output) => {
            doc.save(output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "{} Wrote {} resource(s) to {}",
                "✓".green().bold(),
                doc.len(),
                output.display()
            );
        }
        None => {
            let text = if pretty {
                doc.to_json_with(&JsonCodec::pretty())
            } else {
                doc.to_json()
            }
            .context("Failed to serialize document")?;
            println!("{}", text);
        }
    }

    Ok(())
}

fn show_command(path: &Path) -> Result<()> {
    let doc = load_document(path)?;

    println!("{}", "Resources:".bold());
    if doc.is_empty() {
        println!("  (none)");
    }
    for resource in &doc {
        print_resource(resource);
    }

    Ok(())
}

fn print_resource(resource: &Resource) {
    println!("  • {}", resource.rel().cyan());

    match resource.location() {
        Location::Href(href) => println!("    href: {}", href.yellow()),
        Location::Template { template, .. } => {
            println!("    href-template: {}", template.as_str().yellow());
            for (name, uri) in resource.href_vars() {
                println!("      {} → {}", name, uri);
            }
        }
    }

    let hints = resource.hints();
    let allow: Vec<&str> = hints.allow().collect();
    if !allow.is_empty() {
        println!("    allow: {}", allow.join(", "));
    }
    for (label, values) in [
        ("accept-post", hints.accept_post()),
        ("accept-put", hints.accept_put()),
        ("accept-patch", hints.accept_patch()),
        ("accept-prefer", hints.accept_prefer()),
        ("accept-ranges", hints.accept_ranges()),
        ("precondition-req", hints.precondition_req()),
        ("auth-req", hints.auth_req()),
    ] {
        if !values.is_empty() {
            println!("    {}: {}", label, values.join(", "));
        }
    }
    if let Some(docs) = hints.docs() {
        println!("    docs: {}", docs);
    }
    if !hints.status().is_unspecified() {
        println!("    status: {}", hints.status().to_string().red());
    }
}

fn resolve_command(path: &Path, rel: &str, vars: &[(String, String)]) -> Result<()> {
    let doc = load_document(path)?;
    let uri = doc
        .get_uri(rel, vars)
        .with_context(|| format!("Failed to resolve {}", rel))?;
    println!("{}", uri);
    Ok(())
}

fn check_command(path: &Path) -> Result<()> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let tree: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))?;
    let doc = Document::from_value(&tree).context("Invalid json-home document")?;

    println!(
        "{} Valid json-home document with {} resource(s)",
        "✓".green().bold(),
        doc.len()
    );

    if doc.to_value() == tree {
        println!("  Canonical form matches input");
        Ok(())
    } else {
        println!(
            "  {} Canonical form differs from input (sorted allow, dropped empty hints)",
            "!".yellow().bold()
        );
        bail!("{} is not in canonical form", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binding() {
        assert_eq!(
            parse_binding("widget_id=1234").unwrap(),
            ("widget_id".to_string(), "1234".to_string())
        );
        assert_eq!(
            parse_binding("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_binding("novalue").is_err());
        assert!(parse_binding("=x").is_err());
    }

    #[test]
    fn test_verbose_build_keeps_stdout_for_document() {
        let cli = Cli::try_parse_from([
            "jsonhome",
            "build",
            "--manifest",
            "resources.yaml",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);

        // verbose diagnostics go through the subscriber, which writes to stderr
        assert!(init_tracing(cli.verbose).is_ok());
        tracing::debug!("verbose mode enabled");
    }

    #[test]
    fn test_cli_parses_resolve() {
        let cli = Cli::try_parse_from([
            "jsonhome",
            "resolve",
            "home.json",
            "--rel",
            "http://mysite.com/rel/widgets",
            "--var",
            "widget_id=1234",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve { rel, vars, .. } => {
                assert_eq!(rel, "http://mysite.com/rel/widgets");
                assert_eq!(vars, vec![("widget_id".to_string(), "1234".to_string())]);
            }
            _ => panic!("expected resolve command"),
        }
    }
}
