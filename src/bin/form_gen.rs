//! Form Generation CLI
//!
//! Generates field definitions from a schema, optionally merged with a
//! hand-authored definition list.
//!
//! Usage:
//!   form-gen generate --schema user.schema.json --definition user.form.json
//!   form-gen lookup --schema user.schema.json
//!   form-gen config show --toml

use std::fs;
use std::path::{Path as FsPath, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use familiar_forms::{
    FieldDefinition, FormConfig, Generator, OverrideEntry, RuleRegistry, SchemaNode, Walker,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "form-gen")]
#[command(about = "Generate form field definitions from a JSON schema")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the field tree
    Generate {
        /// Schema file (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Override definition list (JSON array)
        #[arg(short, long)]
        definition: Option<PathBuf>,

        /// Write output here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// List every generated path with its resolved type
    Lookup {
        /// Schema file (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// View and manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path
        #[arg(short, long, default_value = "forms.toml")]
        output: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate {
            schema,
            definition,
            out,
            config,
            compact,
        } => generate(&schema, definition.as_deref(), out.as_deref(), config.as_deref(), compact),

        Commands::Lookup { schema, config } => lookup(&schema, config.as_deref()),

        Commands::Config { command } => match command {
            ConfigCommands::Show { config, toml, json } => show_config(config.as_deref(), toml, json),
            ConfigCommands::Init { output } => {
                FormConfig::default().save(&output)?;
                println!("✅ Created config file: {}", output);
                Ok(())
            }
        },
    }
}

fn load_config(path: Option<&str>) -> Result<FormConfig> {
    FormConfig::load_from(path).context("failed to load configuration")
}

fn read_schema(path: &FsPath) -> Result<SchemaNode> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    SchemaNode::from_json(&source).with_context(|| format!("invalid schema {}", path.display()))
}

fn read_definition(path: &FsPath) -> Result<Vec<OverrideEntry>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read definition {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&source)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    Ok(OverrideEntry::list_from_value(value)?)
}

fn generate(
    schema_path: &FsPath,
    definition_path: Option<&FsPath>,
    out: Option<&FsPath>,
    config_path: Option<&str>,
    compact: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let schema = read_schema(schema_path)?;
    let definition = match definition_path {
        Some(path) => read_definition(path)?,
        None => Vec::new(),
    };

    let registry = RuleRegistry::with_builtins();
    let mut generator = Generator::new(&registry);
    let report = generator.parse_report(&schema, definition, &config.form_item_defaults(), None)?;

    if !report.diagnostics.is_empty() {
        eprint!("{}", report.diagnostics);
    }

    let rendered = if compact || config.compact() {
        serde_json::to_string(&report.fields)?
    } else {
        serde_json::to_string_pretty(&report.fields)?
    };

    match out {
        Some(path) => {
            fs::write(path, rendered + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("✅ Wrote {} field(s) to {}", count(&report.fields), path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn lookup(schema_path: &FsPath, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let schema = read_schema(schema_path)?;

    let registry = RuleRegistry::with_builtins();
    let defaults = config.form_item_defaults();
    let mut walker = Walker::new(&registry, &defaults);
    let (_, table) = walker.walk(&schema)?;

    let width = table.keys().map(str::len).max().unwrap_or(0);
    for (key, def) in table.iter() {
        println!("{:<width$}  {}", key, def.field_type().unwrap_or("-"), width = width);
    }

    if !walker.diagnostics().is_empty() {
        eprint!("\n{}", walker.diagnostics());
    }

    Ok(())
}

fn show_config(config_path: Option<&str>, toml: bool, json: bool) -> Result<()> {
    let cfg = load_config(config_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
    } else if toml {
        println!("{}", ::toml::to_string_pretty(&cfg)?);
    } else {
        println!("📋 Form Configuration\n");
        println!("Layout:");
        println!("  Mode: {:?}", cfg.layout.mode);
        println!("  Label col: {} (offset {})", cfg.layout.label_col.span, cfg.layout.label_col.offset);
        println!("  Wrapper col: {} (offset {})", cfg.layout.wrapper_col.span, cfg.layout.wrapper_col.offset);
        println!("  Colon: {}", cfg.layout.colon);
        println!("  Label align: {}", cfg.layout.label_align.as_str());

        println!("\nOutput:");
        println!("  Format: {:?}", cfg.output.format);

        println!("\nForm item defaults:");
        println!("  {}", serde_json::Value::Object(cfg.form_item_defaults()));
    }

    Ok(())
}

fn count(fields: &[FieldDefinition]) -> usize {
    fields.iter().map(FieldDefinition::count).sum()
}
