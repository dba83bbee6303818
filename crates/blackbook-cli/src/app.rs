//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use blackbook_compose::{
    BuildOutput, Composer, ComposerConfig, TemplateCatalog, TemplateDescriptor,
};

use crate::request::ReportRequest;

/// Config file names looked up in the working directory
const CONFIG_CANDIDATES: [&str; 2] = ["blackbook.toml", ".blackbook.toml"];

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

#[derive(Parser)]
#[command(name = "blackbook")]
#[command(author, version, about = "Project report composer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a report from a template and a request file
    Generate {
        /// Template catalog (JSON)
        #[arg(long, default_value = "templates.json")]
        catalog: PathBuf,

        /// Template id (catalog file entry) or name
        #[arg(short, long)]
        template: String,

        /// Report request (JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// Output directory, overrides the config
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the templates in a catalog
    Templates {
        /// Template catalog (JSON)
        #[arg(long, default_value = "templates.json")]
        catalog: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Run the CLI application
///
/// Parses arguments, installs the log subscriber and dispatches to the
/// command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Generate {
            catalog,
            template,
            request,
            output_dir,
            config,
            format,
        } => {
            let output = generate_command(
                &catalog,
                &template,
                &request,
                output_dir.as_deref(),
                config.as_deref(),
            )?;
            print_output(&output, format)?;
        }
        Commands::Templates { catalog, format } => {
            let templates = templates_command(&catalog)?;
            print_templates(&templates, format)?;
        }
    }

    Ok(())
}

/// Log records from the libraries go to stderr; `RUST_LOG` overrides the
/// default INFO level.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Log subscriber already installed");
    }
}

/// Execute the generate command
pub fn generate_command(
    catalog: &Path,
    template_id: &str,
    request: &Path,
    output_dir: Option<&Path>,
    config: Option<&Path>,
) -> Result<BuildOutput> {
    let mut config = load_config(config)?;
    if let Some(dir) = output_dir {
        config = config.with_output_dir(dir);
    }

    let template = resolve_template(catalog, template_id)?;
    let base_dir = request.parent().unwrap_or_else(|| Path::new("."));
    let build = ReportRequest::load(request)?
        .into_build_request(template, base_dir)
        .with_context(|| format!("Failed to prepare request: {}", request.display()))?;

    tracing::info!(
        "Building report for '{}' with template '{}'",
        build.student.name,
        build.template.name
    );
    Composer::new(config)
        .generate(&build)
        .with_context(|| format!("Failed to build report from template '{}'", template_id))
}

/// Execute the templates command
pub fn templates_command(catalog: &Path) -> Result<Vec<TemplateDescriptor>> {
    let catalog = TemplateCatalog::load(catalog)
        .with_context(|| format!("Failed to load catalog: {}", catalog.display()))?;
    Ok(catalog.descriptors())
}

fn resolve_template(catalog_path: &Path, template_id: &str) -> Result<TemplateDescriptor> {
    let catalog = TemplateCatalog::load(catalog_path)
        .with_context(|| format!("Failed to load catalog: {}", catalog_path.display()))?;
    match catalog.get(template_id) {
        Some(template) => Ok(template),
        None => anyhow::bail!(
            "Template '{}' not found in {} ({} templates)",
            template_id,
            catalog_path.display(),
            catalog.len()
        ),
    }
}

fn load_config(config_path: Option<&Path>) -> Result<ComposerConfig> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            ComposerConfig::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        }
        None => {
            for candidate in CONFIG_CANDIDATES {
                let path = Path::new(candidate);
                if path.exists() {
                    tracing::info!("Loading config: {}", path.display());
                    return ComposerConfig::load(path)
                        .with_context(|| format!("Failed to parse config: {}", candidate));
                }
            }
            Ok(ComposerConfig::default())
        }
    }
}

fn print_output(output: &BuildOutput, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Report complete!");
            println!("  File: {}", output.filename);
            println!("  Path: {}", output.path.display());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(output)?);
        }
    }
    Ok(())
}

fn print_templates(templates: &[TemplateDescriptor], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if templates.is_empty() {
                println!("No templates found");
            }
            for template in templates {
                let status = if template.path.is_file() { "" } else { " (missing)" };
                println!("{}  {}{}", template.id, template.name, status);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(templates)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_generate() {
        let args = vec![
            "blackbook",
            "generate",
            "--catalog",
            "data/templates.json",
            "--template",
            "classic.docx",
            "--request",
            "req.json",
            "--output-dir",
            "out",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Generate {
                catalog,
                template,
                request,
                output_dir,
                config,
                format,
            } => {
                assert_eq!(catalog, PathBuf::from("data/templates.json"));
                assert_eq!(template, "classic.docx");
                assert_eq!(request, PathBuf::from("req.json"));
                assert_eq!(output_dir, Some(PathBuf::from("out")));
                assert!(config.is_none());
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_parse_generate_requires_template() {
        let args = vec!["blackbook", "generate", "--request", "req.json"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_parse_templates_json() {
        let args = vec!["blackbook", "templates", "--format", "json"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Templates { catalog, format } => {
                assert_eq!(catalog, PathBuf::from("templates.json"));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("Expected Templates command"),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/blackbook.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blackbook.toml");
        fs::write(&path, "file_prefix = \"report\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.file_prefix, "report");
    }

    #[test]
    fn test_unknown_template() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("templates.json");
        fs::write(&catalog, r#"[{"name": "Classic", "file": "classic.docx"}]"#).unwrap();
        let err = resolve_template(&catalog, "Modern").unwrap_err();
        assert!(err.to_string().contains("'Modern' not found"));
    }
}
