use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use apitk_core::config::{
    self, CONFIG_FILE_NAME, ClassNameStrategy, CliOverrides, FormatterKind, OpenApiConfig,
    ProjectConfig,
};
use apitk_core::ir::APIGroup;
use apitk_core::parse::spec::OpenApiSpec;
use apitk_core::transform::{self, StrategyRegistry};
use apitk_core::{CodeGenerator, GeneratedFile};
use apitk_python::{PythonConfig, PythonGenerator};

#[derive(Parser)]
#[command(name = "apitk", about = "Typed Python API clients from OpenAPI documents", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one Python package per tag
    Generate(GenerateArgs),

    /// Adapt, validate and parse a document, then print a summary
    Validate {
        /// URL or path of the OpenAPI/Swagger document
        spec: String,
    },

    /// Print the groups, endpoints and models parsed from a document
    Inspect {
        /// URL or path of the OpenAPI/Swagger document
        spec: String,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(clap::Args, Default)]
struct GenerateArgs {
    /// URL or path of the OpenAPI/Swagger document
    #[arg(short, long)]
    spec: Option<String>,

    /// Directory the packages are written to
    #[arg(short, long)]
    output: Option<String>,

    /// How endpoint class names are derived
    #[arg(short = 'c', long)]
    class_name_strategy: Option<StrategyArg>,

    /// Registered naming strategy; takes precedence over --class-name-strategy
    #[arg(long, visible_alias = "cs")]
    custom_strategy: Option<String>,

    /// Dotted import path of the base class of generated request classes
    #[arg(long)]
    base_api_class: Option<String>,

    /// Local name the base class is imported as
    #[arg(long)]
    base_api_class_alias: Option<String>,

    /// Source formatter applied to every generated file
    #[arg(long)]
    formatter: Option<FormatterArg>,

    /// Project config file
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
#[value(rename_all = "snake_case")]
enum StrategyArg {
    OperationId,
    Summary,
    Tags,
}

impl From<StrategyArg> for ClassNameStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::OperationId => ClassNameStrategy::OperationId,
            StrategyArg::Summary => ClassNameStrategy::Summary,
            StrategyArg::Tags => ClassNameStrategy::Tags,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatterArg {
    Builtin,
    Ruff,
}

impl From<FormatterArg> for FormatterKind {
    fn from(arg: FormatterArg) -> Self {
        match arg {
            FormatterArg::Builtin => FormatterKind::Builtin,
            FormatterArg::Ruff => FormatterKind::Ruff,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => cmd_generate(args),

        Commands::Validate { spec } => cmd_validate(&spec),

        Commands::Inspect { spec, format } => cmd_inspect(&spec, format),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "apitk", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn try_load_config(path: &Path) -> Result<Option<ProjectConfig>> {
    config::load_config(path).map_err(|e| anyhow::anyhow!(e))
}

/// Combine the config file section with command-line values; the command
/// line wins.
fn resolve_options(file: Option<ProjectConfig>, args: &GenerateArgs) -> OpenApiConfig {
    let base = file.unwrap_or_default().openapi;
    let mut resolved = base.merge_cli(CliOverrides {
        spec: args.spec.clone(),
        output: args.output.clone(),
        class_name_strategy: args.class_name_strategy.map(Into::into),
        custom_strategy: args.custom_strategy.clone(),
        base_api_class: args.base_api_class.clone(),
        base_api_class_alias: args.base_api_class_alias.clone(),
    });
    if let Some(formatter) = args.formatter {
        resolved.formatter = formatter.into();
    }
    resolved
}

fn load(source: &str) -> Result<OpenApiSpec> {
    apitk_core::load_spec(source).with_context(|| format!("failed to load {source}"))
}

fn build_groups(spec: &OpenApiSpec, config: &OpenApiConfig) -> Result<Vec<APIGroup>> {
    let registry = StrategyRegistry::new();
    transform::transform(spec, &registry, config).context("failed to build API groups")
}

/// Write generated files under `base`. Every file is rendered before the
/// first write, so a failed run leaves nothing behind.
fn write_files(base: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = file
            .write_to(base)
            .with_context(|| format!("failed to write {}", base.join(&file.path).display()))?;
        eprintln!("  wrote {}", path.display());
    }
    Ok(())
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let config = resolve_options(try_load_config(&args.config)?, &args);
    log::debug!("resolved options: {config:?}");
    let source = config.spec.clone().with_context(|| {
        format!(
            "no spec given; pass --spec or set `openapi.spec` in {}",
            args.config.display()
        )
    })?;

    let spec = load(&source)?;
    let groups = build_groups(&spec, &config)?;

    let python = PythonConfig::from(&config);
    let files = PythonGenerator::for_config(&python)
        .generate(&groups, &python)
        .context("failed to generate Python packages")?;

    let output_dir = PathBuf::from(&config.output);
    eprintln!("Generating {} → {}", spec.info.title, output_dir.display());
    write_files(&output_dir, &files)?;
    eprintln!(
        "Generated {} packages ({} files) in {}",
        groups.len(),
        files.len(),
        output_dir.display()
    );
    Ok(())
}

fn cmd_validate(source: &str) -> Result<()> {
    let spec = load(source)?;

    eprintln!("Valid OpenAPI {} spec: {}", spec.openapi, spec.info.title);
    eprintln!("  Version: {}", spec.info.version);
    eprintln!("  Paths: {}", spec.paths.len());
    eprintln!("  Schemas: {}", spec.components.schemas.len());

    let groups = build_groups(&spec, &OpenApiConfig::default())?;
    let endpoints: usize = groups.iter().map(|g| g.endpoints.len()).sum();
    eprintln!("  Tags: {}", groups.len());
    eprintln!("  Endpoints: {endpoints}");

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(source: &str, format: InspectFormat) -> Result<()> {
    let spec = load(source)?;
    let groups = build_groups(&spec, &OpenApiConfig::default())?;

    let summary = build_inspect_summary(&spec, &groups);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(spec: &OpenApiSpec, groups: &[APIGroup]) -> serde_json::Value {
    let groups: Vec<serde_json::Value> = groups
        .iter()
        .map(|group| {
            let endpoints: Vec<serde_json::Value> = group
                .endpoints
                .iter()
                .map(|ep| {
                    serde_json::json!({
                        "class_name": ep.class_name,
                        "method": ep.method.as_str(),
                        "path": ep.path,
                        "endpoint_id": ep.endpoint_id,
                        "response": ep.response_type.as_ref().map(|t| t.type_hint.as_str()),
                    })
                })
                .collect();
            let models: Vec<serde_json::Value> = group
                .models
                .values()
                .map(|m| {
                    serde_json::json!({
                        "name": m.normalized_name,
                        "kind": if m.is_enum { "enum" } else { "class" },
                        "fields": m.fields.iter().map(|f| &f.name).collect::<Vec<_>>(),
                    })
                })
                .collect();
            serde_json::json!({
                "tag": group.tag,
                "package": group.package,
                "endpoints": endpoints,
                "models": models,
            })
        })
        .collect();

    serde_json::json!({
        "info": {
            "title": spec.info.title,
            "version": spec.info.version,
        },
        "groups": groups,
    })
}
