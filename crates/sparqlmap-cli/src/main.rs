//! sparqlmap CLI
//!
//! Inspect what the mapper sees for a subject:
//! - `describe`: fetch every triple of one subject from an RDF file or a SPARQL endpoint
//! - `prefixes`: print the effective prefix table

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use sparqlmap_core::{InMemoryGraph, Node, PrefixTable, TemplateConfig, Triple, TripleSource};
use sparqlmap_transport::{graph_from_file, SparqlEndpoint};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sparqlmap")]
#[command(author, version, about = "Typed, lazily loaded entities over RDF")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON configuration file (prefixes, endpoint, language, timeout).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra prefix binding `name=namespace` (repeatable).
    #[arg(long = "prefix", value_name = "NAME=NS")]
    prefixes: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every triple whose subject is IRI.
    Describe {
        /// Subject IRI, absolute or prefixed (`dbr:Paris`).
        iri: String,

        /// Read triples from an N-Triples (.nt) or Turtle (.ttl) file.
        #[arg(long, conflicts_with = "endpoint")]
        data: Option<PathBuf>,

        /// Query this SPARQL endpoint (overrides the configured one).
        #[arg(long)]
        endpoint: Option<String>,

        /// Print IRIs in prefixed form where a binding matches.
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the effective prefix table as SPARQL PREFIX declarations.
    Prefixes {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Describe {
            iri,
            data,
            endpoint,
            compact,
            config,
        } => cmd_describe(&iri, data, endpoint, compact, &config),
        Commands::Prefixes { config } => {
            let (_, prefixes) = load_config(&config)?;
            print!("{prefixes}");
            Ok(())
        }
    }
}

/// Config file (or defaults) with environment overrides, and the prefix
/// table with `--prefix` bindings applied last.
fn load_config(args: &ConfigArgs) -> Result<(TemplateConfig, PrefixTable)> {
    let config = match &args.config {
        Some(path) => TemplateConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TemplateConfig::default(),
    }
    .with_env_overrides();

    let mut prefixes = config.prefix_table();
    for binding in &args.prefixes {
        prefixes.insert_binding(binding)?;
    }
    Ok((config, prefixes))
}

fn cmd_describe(
    iri: &str,
    data: Option<PathBuf>,
    endpoint: Option<String>,
    compact: bool,
    args: &ConfigArgs,
) -> Result<()> {
    let (mut config, prefixes) = load_config(args)?;
    let subject = prefixes.expand(iri).into_owned();
    debug!(subject = %subject, "resolved subject IRI");

    let source: Box<dyn TripleSource> = match (data, endpoint) {
        (Some(path), _) => {
            let graph: InMemoryGraph = graph_from_file(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            eprintln!(
                "{} {} ({} triples)",
                "Loaded".green().bold(),
                path.display(),
                graph.len()
            );
            Box::new(graph)
        }
        (None, endpoint) => {
            if endpoint.is_some() {
                config.endpoint = endpoint;
            }
            if config.endpoint.is_none() {
                return Err(anyhow!(
                    "no triple source: pass --data FILE or --endpoint URL (or set SPARQLMAP_ENDPOINT)"
                ));
            }
            Box::new(SparqlEndpoint::from_config(&config)?)
        }
    };

    let mut triples = source.fetch_triples(&subject, &prefixes)?;
    triples.sort_by(|a, b| {
        (a.predicate.as_str(), a.object.to_string()).cmp(&(b.predicate.as_str(), b.object.to_string()))
    });

    if triples.is_empty() {
        eprintln!("{} no triples for {}", "warning:".yellow().bold(), subject);
        return Ok(());
    }
    eprintln!(
        "{} {} ({} triples)",
        "Describing".green().bold(),
        subject.bold(),
        triples.len()
    );
    for triple in &triples {
        println!("{}", render_triple(triple, &prefixes, compact));
    }
    Ok(())
}

fn render_triple(triple: &Triple, prefixes: &PrefixTable, compact: bool) -> String {
    if !compact {
        return triple.to_string();
    }
    let iri = |iri: &str| prefixes.compact(iri).unwrap_or_else(|| format!("<{iri}>"));
    let object = match &triple.object {
        Node::Iri(o) => iri(o),
        other => other.to_string(),
    };
    format!(
        "{} {} {} .",
        iri(&triple.subject),
        iri(&triple.predicate),
        object
    )
}
