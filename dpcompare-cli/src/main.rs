use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dpcompare_core::{
    build_threshold_table, reverse_complement, AlignContext, BranchPoint, CompareMode,
    CompareParams, OverlapReport,
};
use std::path::PathBuf;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "dpcompare")]
#[command(about = "dpcompare - Pairwise overlap detection for shotgun fragments")]
#[command(version)]
#[command(long_about = "
dpcompare finds the best overlap between two DNA fragments using a thresholded
bit-vector scan, then aligns it with an O(ND) or affine-gap aligner.

Examples:
  dpcompare compare --a ACGTACGTACGT --b ACGTACGTACGA --erate 0.1 --minlen 8
  dpcompare compare --a <SEQ> --b <SEQ> --opposite --mode affine --show
  dpcompare thresholds --erate 0.06 --max 100
  dpcompare branch-point --a <SEQ> --b <SEQ> --erate 0.12
  dpcompare config > dpcompare.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find and align the overlap between two sequences
    Compare(CompareArgs),

    /// Print the difference threshold for each overlap length
    Thresholds {
        /// Error rate (defaults to the configured one)
        #[arg(long)]
        erate: Option<f64>,

        /// Probability cutoff (defaults to the configured one)
        #[arg(long)]
        thresh: Option<f64>,

        /// Largest length to print
        #[arg(long, default_value = "100")]
        max: usize,
    },

    /// Score how quickly an alignment decays past a matrix point
    TailScore {
        #[arg(long)]
        a: String,

        #[arg(long)]
        b: String,

        /// Column in A to start from
        #[arg(long, default_value = "0")]
        imax: i64,

        /// Row in B to start from
        #[arg(long, default_value = "0")]
        jmax: i64,

        /// Score at the starting point
        #[arg(long, default_value = "1.0")]
        score: f64,
    },

    /// Find where two sequences that share a prefix start to diverge
    BranchPoint(BranchArgs),

    /// Print an example configuration file
    Config {
        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First sequence
    #[arg(long)]
    pub a: String,

    /// Second sequence
    #[arg(long)]
    pub b: String,

    /// Lowest start diagonal (defaults to -len(B))
    #[arg(long, allow_hyphen_values = true)]
    pub beg: Option<i64>,

    /// Highest start diagonal (defaults to len(A))
    #[arg(long, allow_hyphen_values = true)]
    pub end: Option<i64>,

    /// Compare against the reverse complement of B
    #[arg(long)]
    pub opposite: bool,

    #[arg(long)]
    pub erate: Option<f64>,

    #[arg(long)]
    pub thresh: Option<f64>,

    #[arg(long)]
    pub minlen: Option<i64>,

    #[arg(long)]
    pub mode: Option<ModeArg>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the alignment picture
    #[arg(long)]
    pub show: bool,
}

#[derive(Args, Debug)]
pub struct BranchArgs {
    #[arg(long)]
    pub a: String,

    #[arg(long)]
    pub b: String,

    /// Lowest start diagonal
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub beg: i64,

    /// Highest start diagonal
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub end: i64,

    /// Compare against the reverse complement of B
    #[arg(long)]
    pub opposite: bool,

    /// Error rate (usually twice the sequencing error rate)
    #[arg(long)]
    pub erate: Option<f64>,

    #[arg(long)]
    pub thresh: Option<f64>,

    /// Aligned columns required before the branch point
    #[arg(long, default_value = "20")]
    pub minprefix: i64,

    /// Bases required after the branch point
    #[arg(long, default_value = "20")]
    pub minsuffix: i64,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Overlap,
    Align,
    AlignNoTrace,
    Affine,
}

impl From<ModeArg> for CompareMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Overlap => CompareMode::Overlap,
            ModeArg::Align => CompareMode::Align,
            ModeArg::AlignNoTrace => CompareMode::AlignNoTrace,
            ModeArg::Affine => CompareMode::AffineAlign,
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Merge configured defaults with command line overrides.
fn build_params(config: &Config, args: &CompareArgs) -> CompareParams {
    let full = CompareParams::full_range(args.a.len(), args.b.len());
    CompareParams {
        beg: args.beg.unwrap_or(full.beg),
        end: args.end.unwrap_or(full.end),
        opposite: args.opposite,
        erate: args.erate.unwrap_or(config.compare.erate),
        thresh: args.thresh.unwrap_or(config.compare.thresh),
        minlen: args.minlen.unwrap_or(config.compare.minlen),
        mode: args.mode.map(CompareMode::from).unwrap_or(config.compare.mode),
    }
}

fn cmd_compare(config: &Config, args: CompareArgs) -> Result<()> {
    let params = build_params(config, &args);
    let (a, b) = (args.a.as_bytes(), args.b.as_bytes());
    log::info!(
        "Comparing {} bp vs {} bp ({}, diagonals {}..{})",
        a.len(),
        b.len(),
        params.mode,
        params.beg,
        params.end
    );

    let mut ctx = AlignContext::new();
    let result = ctx
        .compare(a, b, &params)
        .with_context(|| format!("Comparison failed with erate {}", params.erate))?;

    if args.json || config.output.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
        return Ok(());
    }

    match result {
        Some(overlap) => {
            println!(
                "begin {}\tend {}\tdiffs {}\tlength {}\t{:?}{}",
                overlap.begin_offset,
                overlap.end_offset,
                overlap.diffs,
                overlap.length,
                overlap.kind(),
                if overlap.reverse_complement { "\topposite" } else { "" }
            );
            if let Some(trace) = &overlap.trace {
                log::debug!("Trace: {:?}", trace.entries());
            }
            if args.show || config.output.show_alignment {
                print!("{}", OverlapReport::new(a, b, &overlap));
            }
        }
        None => println!("no overlap"),
    }

    Ok(())
}

fn cmd_thresholds(config: &Config, erate: Option<f64>, thresh: Option<f64>, max: usize) -> Result<()> {
    let erate = erate.unwrap_or(config.compare.erate);
    let thresh = thresh.unwrap_or(config.compare.thresh);
    if !(0.0..1.0).contains(&erate) {
        bail!("Error rate {} is outside [0, 1)", erate);
    }

    let table = build_threshold_table(max, erate, thresh);
    for n in 1..=max {
        println!("{}\t{}", n, table.threshold(n as i64));
    }
    Ok(())
}

fn cmd_tail_score(a: &str, b: &str, imax: i64, jmax: i64, score: f64) -> Result<()> {
    if imax < 0 || imax > a.len() as i64 || jmax < 0 || jmax > b.len() as i64 {
        bail!(
            "Start point ({}, {}) lies outside the {}x{} matrix",
            imax,
            jmax,
            a.len(),
            b.len()
        );
    }

    let mut ctx = AlignContext::new();
    let value = ctx.tail_score(a.as_bytes(), b.as_bytes(), imax, jmax, score);
    println!("{}", value);
    Ok(())
}

fn cmd_branch_point(config: &Config, args: &BranchArgs) -> Result<Option<BranchPoint>> {
    let erate = args.erate.unwrap_or(config.compare.erate);
    let thresh = args.thresh.unwrap_or(config.compare.thresh);
    if !(0.0..1.0).contains(&erate) {
        bail!("Error rate {} is outside [0, 1)", erate);
    }

    let a = args.a.as_bytes();
    let b = if args.opposite {
        reverse_complement(args.b.as_bytes())
    } else {
        args.b.as_bytes().to_vec()
    };

    let mut ctx = AlignContext::new();
    ctx.prepare(a.len().max(b.len()), erate, thresh);
    let found = ctx.branch_point(a, &b, args.beg, args.end, args.minprefix, args.minsuffix);
    match &found {
        Some(bp) => println!(
            "a {}\tb {}\tascent {:.4}\tdescent {:.4}",
            bp.a_position, bp.b_position, bp.ascent, bp.descent
        ),
        None => println!("no branch point"),
    }
    Ok(found)
}

fn cmd_config(output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            Config::default().save_to_file(&path)?;
            log::info!("Wrote example configuration to {}", path.display());
        }
        None => print!("{}", Config::example_toml()?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Compare(args) => cmd_compare(&config, args)?,
        Commands::Thresholds { erate, thresh, max } => cmd_thresholds(&config, erate, thresh, max)?,
        Commands::TailScore { a, b, imax, jmax, score } => cmd_tail_score(&a, &b, imax, jmax, score)?,
        Commands::BranchPoint(args) => {
            cmd_branch_point(&config, &args)?;
        }
        Commands::Config { output } => cmd_config(output)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn compare_args(cli: Cli) -> CompareArgs {
        match cli.command {
            Commands::Compare(args) => args,
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compare_defaults_to_full_range() {
        let args = compare_args(parse(&["dpcompare", "compare", "--a", "ACGTAC", "--b", "ACG"]));
        let params = build_params(&Config::default(), &args);
        assert_eq!((params.beg, params.end), (-3, 6));
        assert_eq!(params.erate, 0.06);
        assert_eq!(params.mode, CompareMode::Align);
        assert!(!params.opposite);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.compare.erate = 0.02;
        config.compare.mode = CompareMode::Overlap;

        let args = compare_args(parse(&[
            "dpcompare", "compare", "--a", "ACGT", "--b", "ACGT", "--beg", "-2", "--end", "0",
            "--erate", "0.1", "--mode", "affine", "--opposite",
        ]));
        let params = build_params(&config, &args);
        assert_eq!((params.beg, params.end), (-2, 0));
        assert_eq!(params.erate, 0.1);
        assert_eq!(params.mode, CompareMode::AffineAlign);
        assert!(params.opposite);

        let args = compare_args(parse(&["dpcompare", "compare", "--a", "ACGT", "--b", "ACGT"]));
        let params = build_params(&config, &args);
        assert_eq!(params.erate, 0.02);
        assert_eq!(params.mode, CompareMode::Overlap);
    }

    #[test]
    fn test_verbosity_and_global_config() {
        let cli = parse(&["dpcompare", "-vv", "thresholds", "--config", "my.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
    }

    #[test]
    fn test_mode_names() {
        let args = compare_args(parse(&[
            "dpcompare", "compare", "--a", "A", "--b", "A", "--mode", "align-no-trace",
        ]));
        assert_eq!(args.mode, Some(ModeArg::AlignNoTrace));
        assert!(Cli::try_parse_from(["dpcompare", "compare", "--a", "A", "--b", "A", "--mode", "quality"]).is_err());
    }

    #[test]
    fn test_thresholds_rejects_bad_rate() {
        assert!(cmd_thresholds(&Config::default(), Some(1.5), None, 10).is_err());
    }

    #[test]
    fn test_branch_point_command() {
        let shared = "ACGTTGCAACGGTACCATGAACGTTGCAACGGTACCATGA";
        let a = format!("{}{}", shared, "A".repeat(30));
        let b = format!("{}{}", shared, "C".repeat(30));
        let cli = parse(&["dpcompare", "branch-point", "--a", &a, "--b", &b, "--erate", "0.12"]);
        let args = match cli.command {
            Commands::BranchPoint(args) => args,
            _ => panic!("expected branch-point"),
        };
        assert_eq!((args.beg, args.end, args.minprefix), (0, 0, 20));

        let bp = cmd_branch_point(&Config::default(), &args).unwrap().unwrap();
        assert_eq!((bp.a_position, bp.b_position), (40, 40));

        let bad = BranchArgs {
            erate: Some(1.0),
            ..args
        };
        assert!(cmd_branch_point(&Config::default(), &bad).is_err());
    }

    #[test]
    fn test_tail_score_rejects_out_of_range_start() {
        assert!(cmd_tail_score("ACGT", "ACGT", 5, 0, 1.0).is_err());
        assert!(cmd_tail_score("ACGT", "ACGT", 0, 0, 1.0).is_ok());
    }
}
