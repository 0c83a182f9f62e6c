use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

use requel_codegen::{module_name, TypeScriptBindings};
use requel_core::{Config, Diagnostic, DiagnosticCode, Location, Report, Schema, Severity};
use requel_sql::{AnalysisError, Analyzer, SqlParser};

const CONFIG_FILE: &str = "requel.toml";

/// Requel - typed bindings for plain SQL files
#[derive(Parser)]
#[command(name = "requel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: requel.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a `.d.ts` declaration for every SQL file
    Generate {
        /// Files or directories to scan (default: configured sources)
        paths: Vec<PathBuf>,

        /// Schema file, overrides the configured one
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Directory receiving the declarations
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Save a JSON report of all diagnostics
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Print the analysis of one SQL file as JSON
    Inspect {
        /// SQL file to analyze
        file: PathBuf,

        /// Schema file, overrides the configured one
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Write a default requel.toml
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Generate {
            paths,
            schema,
            out_dir,
            report,
        } => {
            let config = load_config(cli.config.as_deref(), cli.verbose)?;
            let failed = generate_command(
                &config,
                &paths,
                schema.as_deref(),
                out_dir.as_deref(),
                report.as_deref(),
                cli.verbose,
            )?;
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Inspect { file, schema } => {
            let config = load_config(cli.config.as_deref(), cli.verbose)?;
            inspect_command(&config, &file, schema.as_deref())
        }
        Commands::Init => init_command(cli.config.as_deref().unwrap_or(Path::new(CONFIG_FILE))),
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let mut config = if let Some(config_path) = path {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else if Path::new(CONFIG_FILE).exists() {
        Config::from_file(Path::new(CONFIG_FILE))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    config.project_root = absolute(&config.project_root)?;

    if verbose {
        eprintln!("{} dialect: {:?}", "Using".cyan(), config.dialect);
    }

    Ok(config)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn schema_path(config: &Config, schema: Option<&Path>) -> Result<PathBuf> {
    match schema {
        Some(path) => absolute(path),
        None => Ok(config.schema_path()),
    }
}

/// Generate command - analyze SQL files and write their declarations
///
/// Returns whether any file failed.
fn generate_command(
    config: &Config,
    paths: &[PathBuf],
    schema: Option<&Path>,
    out_dir: Option<&Path>,
    report_path: Option<&Path>,
    verbose: bool,
) -> Result<bool> {
    let mut report = Report::new();

    let schema_path = schema_path(config, schema)?;
    tracing::info!(schema = %schema_path.display(), "loading schema");
    let schema = match Schema::from_file(&schema_path) {
        Ok(schema) => schema,
        Err(err) => {
            let diag = err.to_diagnostic(&schema_path);
            eprintln!("{} {}", "✗".red(), diag);
            report.add_diagnostic(diag);
            save_report(&report, report_path)?;
            return Ok(true);
        }
    };

    if schema.is_empty() {
        tracing::warn!(schema = %schema_path.display(), "schema declares no relations");
    }
    if verbose {
        eprintln!("{} {}", "Relations:".cyan(), schema.table_names().join(", "));
    }

    let analyzer = Analyzer::new(SqlParser::from_dialect(config.dialect), &schema);
    let bindings = TypeScriptBindings::from_config(&config.bindings);

    let roots: Vec<PathBuf> = if paths.is_empty() {
        config.sources.iter().map(|p| config.resolve_path(p)).collect()
    } else {
        paths.iter().map(|p| absolute(p)).collect::<Result<_>>()?
    };
    let out_dir = match out_dir {
        Some(dir) => Some(absolute(dir)?),
        None => config.out_dir.as_ref().map(|dir| config.resolve_path(dir)),
    };

    let files = discover_sql_files(&roots);
    if verbose {
        eprintln!("{} {} SQL file(s)", "Found".cyan(), files.len());
    }

    let mut failed = 0;

    for file in &files {
        let module = module_name(file, &config.project_root);

        let written = match generate_file(&analyzer, &bindings, file, &module, out_dir.as_deref()) {
            Ok((declaration, diagnostics)) => {
                tracing::info!(module = %module, out = %declaration.display(), "declaration written");
                if verbose {
                    eprintln!("  {} {}", "✓".green(), module);
                }
                for diag in diagnostics {
                    eprintln!("  {} {}", "⚠".yellow(), diag);
                    report.add_diagnostic(diag);
                }
                true
            }
            Err(GenerateError::Analysis(err)) => {
                eprintln!("{} {}: {}", "✗".red(), module, err);
                report.add_diagnostic(err.to_diagnostic(Some(&module)));
                failed += 1;
                false
            }
            Err(GenerateError::Io(err)) => {
                eprintln!("{} {}: {:#}", "✗".red(), module, err);
                report.add_diagnostic(
                    Diagnostic::new(DiagnosticCode::FileIoError, Severity::Error, format!("{:#}", err))
                        .with_location(Location::new(&module)),
                );
                failed += 1;
                false
            }
        };

        report.record_file(written);
    }

    print_summary(&report, failed);
    save_report(&report, report_path)?;

    Ok(failed > 0)
}

fn save_report(report: &Report, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report {}", path.display()))?;
        eprintln!("{} {}", "Report saved to:".green(), path.display());
    }
    Ok(())
}

enum GenerateError {
    Analysis(AnalysisError),
    Io(anyhow::Error),
}

/// Analyze one file and write its declaration
fn generate_file(
    analyzer: &Analyzer<'_>,
    bindings: &TypeScriptBindings,
    file: &Path,
    module: &str,
    out_dir: Option<&Path>,
) -> Result<(PathBuf, Vec<Diagnostic>), GenerateError> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))
        .map_err(GenerateError::Io)?;

    let analyzed = analyzer
        .analyze(&source, Some(file))
        .map_err(GenerateError::Analysis)?;

    let declaration = declaration_path(file, module, out_dir);
    write_declaration(&declaration, &bindings.render(module, &analyzed))
        .map_err(GenerateError::Io)?;

    let shadowed = bindings.diagnostics(&analyzed);
    let diagnostics = analyzed
        .diagnostics
        .into_iter()
        .chain(shadowed)
        .map(|diag| diag.with_location(Location::new(module)))
        .collect();

    Ok((declaration, diagnostics))
}

fn write_declaration(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// `<out_dir>/<module>.d.ts`, or `<file>.d.ts` next to the SQL file
fn declaration_path(file: &Path, module: &str, out_dir: Option<&Path>) -> PathBuf {
    match out_dir {
        Some(dir) => dir.join(format!("{}.d.ts", module)),
        None => {
            let mut path = file.as_os_str().to_owned();
            path.push(".d.ts");
            PathBuf::from(path)
        }
    }
}

/// All `.sql` files under the given files or directories, sorted and deduplicated
fn discover_sql_files(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for root in roots {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                if let Some(ext) = entry.path().extension() {
                    if ext == "sql" {
                        files.push(entry.path().to_path_buf());
                    }
                }
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

fn print_summary(report: &Report, failed: usize) {
    println!();
    println!("{}", "Summary:".bold());
    println!("  Files analyzed:       {}", report.summary.files_analyzed);
    println!("  Declarations written: {}", report.summary.declarations_written);

    if failed > 0 {
        println!("  Failed:               {}", failed.to_string().red().bold());
    } else {
        println!("  Failed:               {}", failed.to_string().green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings:             {}", report.summary.warnings.to_string().yellow());
    }
    println!();
}

/// Inspect command - print the analysis of one file
fn inspect_command(config: &Config, file: &Path, schema: Option<&Path>) -> Result<()> {
    let schema_path = schema_path(config, schema)?;
    let schema = Schema::from_file(&schema_path)
        .with_context(|| format!("Failed to load schema {}", schema_path.display()))?;
    let analyzer = Analyzer::new(SqlParser::from_dialect(config.dialect), &schema);

    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let analyzed = analyzer.analyze(&source, Some(file))?;

    println!("{}", serde_json::to_string_pretty(&analyzed)?);
    Ok(())
}

/// Init command - write a default config
fn init_command(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }

    Config::default().save_to_file(path)?;
    eprintln!("{} {}", "Created".green(), path.display());
    Ok(())
}
