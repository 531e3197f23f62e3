//! Command line front end.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabimpute::config::DEFAULT_CONFIG_FILE;
use tabimpute::{
    write_csv, CovariancePreservationStrategy, ImputationInstruction, ImputeConfig, ImputedView,
    MeanMedianModeStrategy, MemoryTable, SharedView, StatsArtifact, TableView,
};

#[derive(Parser)]
#[command(name = "tabimpute")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Impute missing values in CSV tables with disk-cached statistics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the missing cells of a CSV table and write the result
    Impute {
        /// Input CSV with a header row
        input: PathBuf,

        /// Output CSV
        output: PathBuf,

        /// Configuration file (.toml or .json); tabimpute.toml is used when present
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Imputation strategy
        #[arg(short, long, value_enum, default_value_t = Strategy::MeanMedianMode)]
        strategy: Strategy,

        /// Instruction for columns the configuration does not assign
        /// (mean, median, mode, none, err); unassigned columns fail the build
        #[arg(short, long)]
        default_instruction: Option<ImputationInstruction>,
    },

    /// Print the header and contents of a statistics artifact
    Inspect {
        /// Artifact file (*.stats)
        artifact: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Per-column mean, median or mode
    #[value(name = "mean-median-mode", alias = "mmm")]
    MeanMedianMode,
    /// Projection on the pairwise covariance
    Covariance,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Commands::Impute {
            input,
            output,
            config,
            strategy,
            default_instruction,
        } => {
            let config = load_config(config.as_deref(), default_instruction)?;
            impute(&input, &output, strategy, &config)
        }
        Commands::Inspect { artifact } => inspect(&artifact),
    }
}

fn load_config(
    explicit: Option<&Path>,
    default_instruction: Option<ImputationInstruction>,
) -> anyhow::Result<ImputeConfig> {
    let mut config = match explicit {
        Some(path) => ImputeConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            ImputeConfig::load_from_file(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("loading {}", DEFAULT_CONFIG_FILE))?
        }
        None => ImputeConfig::default(),
    };
    config.apply_environment_overrides()?;

    if let Some(instruction) = default_instruction {
        config.mean_median_mode.default_instruction = Some(instruction.token().to_string());
    }
    Ok(config)
}

fn impute(input: &Path, output: &Path, strategy: Strategy, config: &ImputeConfig) -> anyhow::Result<()> {
    let table: SharedView = Arc::new(
        MemoryTable::from_csv(input).with_context(|| format!("reading {}", input.display()))?,
    );

    match strategy {
        Strategy::MeanMedianMode => {
            let strategy = MeanMedianModeStrategy::build_with_cache(
                table.as_ref(),
                &config.mean_median_mode,
                &config.cache,
            )?;
            let view = ImputedView::new(table, strategy)?;
            write_view(&view, output)
        }
        Strategy::Covariance => {
            let strategy =
                CovariancePreservationStrategy::build_with_cache(table.as_ref(), &config.cache)?;
            let view = ImputedView::new(table, strategy)?;
            write_view(&view, output)
        }
    }
}

fn write_view(view: &dyn TableView, output: &Path) -> anyhow::Result<()> {
    write_csv(view, output).with_context(|| format!("writing {}", output.display()))?;
    log::info!(
        "Wrote {} rows x {} columns to {}",
        view.num_rows(),
        view.num_columns(),
        output.display()
    );
    Ok(())
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let artifact =
        StatsArtifact::read(path).with_context(|| format!("reading {}", path.display()))?;
    println!("{}", artifact);
    for (i, row) in artifact.data().rows().into_iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:.6}", v)).collect();
        println!("row {:>3}: {}", i, cells.join(" "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_impute() {
        let cli = Cli::try_parse_from([
            "tabimpute", "impute", "in.csv", "out.csv", "--strategy", "mmm", "-d", "median",
        ])
        .unwrap();
        match cli.command {
            Commands::Impute {
                input,
                strategy,
                default_instruction,
                config,
                ..
            } => {
                assert_eq!(input, PathBuf::from("in.csv"));
                assert_eq!(strategy, Strategy::MeanMedianMode);
                assert_eq!(default_instruction, Some(ImputationInstruction::Median));
                assert!(config.is_none());
            }
            Commands::Inspect { .. } => panic!("expected impute"),
        }
    }

    #[test]
    fn test_rejects_unknown_strategy_and_missing_output() {
        assert!(Cli::try_parse_from(["tabimpute", "impute", "in.csv", "out.csv", "-s", "knn"]).is_err());
        assert!(Cli::try_parse_from(["tabimpute", "impute", "in.csv"]).is_err());
    }

    #[test]
    fn test_no_silent_default_instruction() {
        let config = load_config(None, None).unwrap();
        if !Path::new(DEFAULT_CONFIG_FILE).exists() && std::env::var("TABIMPUTE_DEFAULT_INSTRUCTION").is_err() {
            assert!(config.mean_median_mode.default_instruction.is_none());
        }
        let config = load_config(None, Some(ImputationInstruction::Mode)).unwrap();
        assert_eq!(config.mean_median_mode.default_instruction.as_deref(), Some("mode"));
    }
}
