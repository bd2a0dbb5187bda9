//! Blueprint CLI
//!
//! Compiles image packages and tasks into wire payloads, and decompiles task
//! payloads back into declarative source.

#![warn(missing_docs)]
#![warn(clippy::all)]

use blueprint_compile::{Compiler, ConfigSource, ReferenceResolver, Task, read_spec, vm_disk_package};
use blueprint_core::{BlueprintError, ErrorClass, Payload, RefKind, SchemaKind};
use blueprint_decompile::{
    Binding, CredentialTable, Decompiler, EmbeddedTemplates, RunbookActionMap, ScriptDir, binding_for,
    check_bindings,
};
use blueprint_schema::standard_registry;
use clap::{Parser, Subcommand};
use color_eyre::{Report, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blueprint")]
#[command(about = "Blueprint DSL - compile entities to payloads and decompile them back", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a disk image package from a config file
    CompileImage {
        /// Path to the package config (JSON or YAML)
        #[arg(short, long)]
        config: PathBuf,
        /// Package name, overriding the config
        #[arg(short, long)]
        name: Option<String>,
        /// Package description, overriding the config
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Compile a task
    CompileTask {
        /// Path to the task source (JSON or YAML)
        #[arg(short, long)]
        file: PathBuf,
        /// Declare a referenceable name, as kind:name
        #[arg(long = "declare", value_parser = parse_declared)]
        declared: Vec<(RefKind, String)>,
    },
    /// Decompile a task payload into source
    DecompileTask {
        /// Path to the task payload
        #[arg(short, long)]
        payload: PathBuf,
        /// Directory externalized scripts are written to
        #[arg(short, long, default_value = "specs")]
        scripts: PathBuf,
        /// Runbook to action map (JSON or YAML)
        #[arg(short, long)]
        action_map: Option<PathBuf>,
        /// Credential known to the blueprint
        #[arg(short = 'c', long = "credential")]
        credentials: Vec<String>,
    },
    /// List schema kinds and their templates
    Kinds,
}

/// Parse `kind:name`; kinds may be short (`credential`) or wire (`app_credential`)
fn parse_declared(value: &str) -> std::result::Result<(RefKind, String), String> {
    let (kind, name) = value
        .split_once(':')
        .filter(|(kind, name)| !kind.is_empty() && !name.is_empty())
        .ok_or_else(|| format!("expected kind:name, found '{}'", value))?;
    let kind = if kind.starts_with("app_") {
        RefKind::from_wire(kind)
    } else {
        RefKind::from_wire(&format!("app_{}", kind))
    };
    Ok((kind, name.to_string()))
}

fn exit_code(report: &Report) -> u8 {
    match report.downcast_ref::<BlueprintError>().map(BlueprintError::class) {
        Some(ErrorClass::Defect) => 70,
        Some(ErrorClass::Io) => 74,
        Some(ErrorClass::UserInput) | None => 1,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_payload(payload: &Payload) -> Result<()> {
    println!("{}", payload.to_string_pretty()?);
    info!(fingerprint = %payload.fingerprint(), "compiled");
    Ok(())
}

fn load_task(path: &Path) -> Result<Task> {
    let value = read_spec(path)?;
    let task = serde_json::from_value(value).map_err(|err| BlueprintError::ParseError {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    Ok(task)
}

fn load_payload(path: &Path) -> Result<Payload> {
    let payload = Payload::from_value(read_spec(path)?).ok_or_else(|| BlueprintError::TypeMismatch {
        entity: path.display().to_string(),
        found: "non-object payload".to_string(),
    })?;
    Ok(payload)
}

fn load_actions(path: Option<&Path>) -> Result<RunbookActionMap> {
    let Some(path) = path else {
        return Ok(RunbookActionMap::new());
    };
    let actions = serde_json::from_value(read_spec(path)?).map_err(|err| BlueprintError::ParseError {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    Ok(actions)
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::CompileImage {
            config,
            name,
            description,
        } => {
            let entity = vm_disk_package(name.as_deref(), description.as_deref(), &ConfigSource::file(config))?;
            print_payload(&Compiler::standard()?.compile(&entity)?)
        }
        Commands::CompileTask { file, declared } => {
            let task = load_task(&file)?;
            let resolver = declared
                .into_iter()
                .fold(ReferenceResolver::new(), |resolver, (kind, name)| {
                    resolver.with_declared(kind, name)
                });
            let compiler = Compiler::standard()?.with_resolver(resolver);
            print_payload(&compiler.compile(&task.to_descriptor())?)
        }
        Commands::DecompileTask {
            payload,
            scripts,
            action_map,
            credentials,
        } => {
            let renderer = EmbeddedTemplates::new()?;
            check_bindings(&standard_registry()?, &renderer)?;
            let decompiler = Decompiler::new(renderer, ScriptDir::new(scripts))
                .with_credentials(CredentialTable::from_names(&credentials));
            let source = decompiler.decompile(&load_payload(&payload)?, &load_actions(action_map.as_deref())?)?;
            println!("{}", source);
            Ok(())
        }
        Commands::Kinds => {
            let renderer = EmbeddedTemplates::new()?;
            let checked = check_bindings(&standard_registry()?, &renderer)?;
            for kind in SchemaKind::ALL {
                match binding_for(kind) {
                    Binding::CompileOnly => println!("{:<28} compile-only", kind.tag()),
                    Binding::Templates(templates) => {
                        let names: Vec<&str> = templates.iter().map(|t| t.name()).collect();
                        println!("{:<28} {}", kind.tag(), names.join(", "));
                    }
                }
            }
            info!(templates = checked, "bindings complete");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = color_eyre::install() {
        eprintln!("Error: {:?}", report);
        return ExitCode::from(70);
    }
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("Error: {:?}", report);
            ExitCode::from(exit_code(&report))
        }
    }
}
