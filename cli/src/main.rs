use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use field_schema_core::{
    Projection, ResolvedSchema, apply_subset, project, sorted_by_priority, split_by,
};
use field_schema_loader::{
    DEFAULT_CONFIG_FILE, FragmentLoader, GENERATED_DIR, GenerationManifest, GeneratorConfig,
    MANIFEST_FILE, load_subsets, read_version, write_intermediate,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Group names per line in the `validate` listing.
const LISTING_COLUMNS: usize = 6;

#[derive(Debug, Parser)]
#[command(name = "field-schema")]
#[command(about = "Assemble field-group fragments into nested and flat schemas")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve fragments, optionally subset them, and write intermediate files.
    Generate(GenerateArgs),
    /// Print the field or container at a dotted path.
    Lookup(LookupArgs),
    /// Assemble and resolve fragments, then report what was found.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Directory of default fragment documents.
    #[arg(long)]
    schemas: Option<PathBuf>,
    /// Additional fragment file or directory (repeatable).
    #[arg(long, action = ArgAction::Append)]
    include: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Generator configuration file (defaults to ./field-schema.yml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    sources: SourceArgs,
    /// Subset declaration file or directory (repeatable).
    #[arg(long, action = ArgAction::Append)]
    subset: Vec<PathBuf>,
    /// Output root directory.
    #[arg(long)]
    out: Option<PathBuf>,
    /// File holding the schema version string.
    #[arg(long)]
    version_file: Option<PathBuf>,
    /// Write only the nested and flat intermediate files, no manifest.
    #[arg(long)]
    intermediate_only: bool,
}

#[derive(Debug, Args)]
struct LookupArgs {
    #[command(flatten)]
    sources: SourceArgs,
    /// Dotted field path, starting with the group name (e.g. host.os.name).
    path: String,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[command(flatten)]
    sources: SourceArgs,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Lookup(args) => run_lookup(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    let config = merge_config(load_config(args.config.as_deref())?, args);

    let version = read_version(&config.version_file).map_err(|err| {
        format!(
            "Failed to read version file '{}': {err}",
            config.version_file.display()
        )
    })?;
    info!(version = %version, "running generator");

    let schema = resolve_schema(&config.schemas, &config.include)?;
    let schema = if config.has_subset() {
        let spec = load_subsets(&config.subset).map_err(|err| err.to_string())?;
        apply_subset(&spec, &schema).map_err(|err| err.to_string())?
    } else {
        schema
    };

    let projection = project(schema).map_err(|err| err.to_string())?;
    let files = write_intermediate(&projection, &config.out).map_err(|err| {
        format!(
            "Failed to write intermediate files under '{}': {err}",
            config.out.display()
        )
    })?;

    if config.intermediate_only {
        debug!("intermediate-only run, skipping manifest");
    } else {
        let manifest = GenerationManifest::new(&version, &projection, config.has_subset())
            .map_err(|err| err.to_string())?;
        let manifest_path = files.dir.join(MANIFEST_FILE);
        manifest
            .save(&manifest_path)
            .map_err(|err| format!("Failed to write '{}': {err}", manifest_path.display()))?;
    }

    print_summary(&projection, &config.out.join(GENERATED_DIR));
    Ok(())
}

fn run_lookup(args: LookupArgs) -> Result<(), String> {
    let schemas = args
        .sources
        .schemas
        .unwrap_or_else(|| GeneratorConfig::default().schemas);
    let schema = resolve_schema(&schemas, &args.sources.include)?;

    let node = schema.lookup(&args.path).map_err(|err| err.to_string())?;
    let raw = serde_yaml::to_string(node)
        .map_err(|err| format!("Failed to serialize '{}': {err}", args.path))?;
    print!("{raw}");
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let schemas = args
        .sources
        .schemas
        .unwrap_or_else(|| GeneratorConfig::default().schemas);
    let schema = resolve_schema(&schemas, &args.sources.include)?;

    println!(
        "Resolved {} group(s) with {} field(s).",
        schema.len(),
        schema.leaf_count()
    );
    let names: Vec<&str> = sorted_by_priority(&schema)
        .into_iter()
        .map(|group| group.name.as_str())
        .collect();
    for line in split_by(&names, LISTING_COLUMNS) {
        println!("  {}", line.join(", "));
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig, String> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                debug!("no configuration file, using defaults");
                return Ok(GeneratorConfig::default());
            }
            default
        }
    };

    GeneratorConfig::load(&path)
        .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))
}

/// Applies command-line overrides on top of the configuration file.
fn merge_config(mut config: GeneratorConfig, args: GenerateArgs) -> GeneratorConfig {
    if let Some(schemas) = args.sources.schemas {
        config.schemas = schemas;
    }
    if !args.sources.include.is_empty() {
        config.include = args.sources.include;
    }
    if !args.subset.is_empty() {
        config.subset = args.subset;
    }
    if let Some(out) = args.out {
        config.out = out;
    }
    if let Some(version_file) = args.version_file {
        config.version_file = version_file;
    }
    if args.intermediate_only {
        config.intermediate_only = true;
    }
    config
}

fn resolve_schema(schemas: &Path, include: &[PathBuf]) -> Result<ResolvedSchema, String> {
    let loader = include
        .iter()
        .fold(FragmentLoader::new().schemas(schemas), |loader, path| {
            loader.include(path)
        });

    let assembler = loader.build().map_err(|err| err.to_string())?;
    assembler.resolve().map_err(|err| err.to_string())
}

fn print_summary(projection: &Projection, dir: &Path) {
    println!(
        "Generated {} group(s) and {} field(s) into '{}'.",
        projection.nested.len(),
        projection.flat.len(),
        dir.display()
    );
}
