//! CLI for the log-codemod tool.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log_codemod::prelude::*;
use log_codemod::telemetry;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "log-codemod")]
#[command(author, version, about = "Migrate console logging to the structured error logger", long_about = None)]
struct Cli {
    /// Increase diagnostic output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite every configured group under a root directory
    Run {
        /// Project root the group directories are relative to
        #[arg(default_value = ".")]
        root: PathBuf,

        /// YAML or JSON configuration (defaults to the built-in groups)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preview changes without writing files
        #[arg(long)]
        dry_run: bool,

        /// Print a colorized diff of each rewritten file
        #[arg(long)]
        diff: bool,
    },

    /// Show the rewrite of a single file without touching it
    Preview {
        /// File to rewrite
        file: PathBuf,

        /// Role of the file (controller, server-service, panel-service)
        #[arg(short, long)]
        role: Role,

        /// YAML or JSON configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the built-in configuration
    Config {
        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose).context("Failed to initialise logging")?;

    match cli.command {
        Commands::Run {
            root,
            config,
            dry_run,
            diff,
        } => cmd_run(&root, config.as_deref(), dry_run, diff),
        Commands::Preview { file, role, config } => cmd_preview(&file, role, config.as_deref()),
        Commands::Config { format } => cmd_config(format),
    }
}

fn load_config(path: Option<&Path>) -> Result<CodemodConfig> {
    let config = match path {
        Some(path) => CodemodConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CodemodConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn cmd_run(root: &Path, config: Option<&Path>, dry_run: bool, diff: bool) -> Result<()> {
    let config = load_config(config)?;
    let engine = RewriteEngine::from_config(&config).context("Failed to compile rules")?;
    let runner = BatchRunner::new(engine).dry_run(dry_run);
    let groups = groups_from_config(root, &config);

    let report = runner.run(&groups, &mut |event| match event {
        RunEvent::GroupStarted(group) => {
            println!("\n🔧 Fixing error logging in {}...", group.name);
        }
        RunEvent::File(_, file) => {
            println!("{file}");
            if let (true, FileOutcome::Transformed(change)) = (diff, &file.outcome) {
                print!(
                    "{}",
                    colorized_diff(&change.original, &change.transformed, &change.path)
                );
            }
        }
        RunEvent::GroupFinished(group) => {
            println!("  {}: {}", group.name, group.counts());
        }
    });

    println!("\nSummary:");
    for group in &report.groups {
        println!("  {:<16} {}", group.name, group.counts());
        for file in &group.files {
            println!("    {} {}", file.outcome.marker(), file.name());
        }
    }
    let mut changes = DiffSummary::default();
    for group in &report.groups {
        changes.merge(&group.diff_summary());
    }
    println!("  {changes}");

    if let Some(reason) = &report.aborted {
        bail!("Run aborted: {reason}");
    }

    if dry_run {
        println!("\nDry run: no files were written.");
    } else {
        match &config.follow_up {
            Some(command) => println!("\n✅ Done! Please review changes and run: {command}"),
            None => println!("\n✅ Done! Please review changes."),
        }
    }

    if report.totals().failed > 0 {
        bail!("{} file(s) failed", report.totals().failed);
    }
    Ok(())
}

fn cmd_preview(file: &Path, role: Role, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let engine = RewriteEngine::from_config(&config).context("Failed to compile rules")?;
    let original = FsStore.read(file)?;

    let rewrite = engine
        .rewrite(&original, role)
        .with_context(|| format!("Failed to rewrite {}", file.display()))?;

    if rewrite.changed {
        print!("{}", unified_diff(&original, &rewrite.text, file));
        println!(
            "\n{} replacement(s){}",
            rewrite.replacements,
            if rewrite.directive_inserted {
                ", import added"
            } else {
                ""
            }
        );
    } else {
        println!("No changes for {} as {role}", file.display());
    }
    Ok(())
}

fn cmd_config(format: Format) -> Result<()> {
    let config = CodemodConfig::default();
    let rendered = match format {
        Format::Yaml => config.to_yaml_string()?,
        Format::Json => config.to_json_string()?,
    };
    println!("{rendered}");
    Ok(())
}
