use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "strucflow CLI - Runs structural-bioinformatics pipelines (alignment, CASP QA export, structure fetch, animation) against an analysis engine and external tools.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    /// Defaults to `strucflow.toml` in the user's configuration directory, if present.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S tools.tmalign=/opt/bin/TMalign
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Superimpose a model structure onto a target structure with TMalign.
    Tmalign(TmalignArgs),
    /// Score a model for CASP quality assessment and write the submission line.
    CaspQa(CaspQaArgs),
    /// Download a structure from the RCSB PDB archive.
    Fetch(FetchArgs),
    /// Export a full-circle rotation of a structure as an animated image.
    Spin(SpinArgs),
    /// Export a seamlessly looping back-and-forth rotation as an animated image.
    Turntable(TurntableArgs),
}

/// Arguments for the `tmalign` subcommand.
#[derive(Args, Debug)]
pub struct TmalignArgs {
    /// Path to the target structure (PDB format).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub target: PathBuf,

    /// Path to the model structure that is moved onto the target (PDB format).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub model: PathBuf,

    /// Path for the superimposed model.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Restrict the target atoms used for alignment (engine selection expression).
    #[arg(long = "target-sel", value_name = "SELECTION")]
    pub target_selection: Option<String>,

    /// Restrict the model atoms used for alignment (engine selection expression).
    #[arg(long = "model-sel", value_name = "SELECTION")]
    pub model_selection: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QaMethod {
    /// Neural-network VoroMQA.
    #[default]
    Dark,
    /// Classic VoroMQA.
    Light,
}

/// Arguments for the `casp-qa` subcommand.
#[derive(Args, Debug)]
pub struct CaspQaArgs {
    /// Path to the target sequence file.
    #[arg(long, required = true, value_name = "PATH")]
    pub sequence: PathBuf,

    /// Path to the model structure (PDB format).
    #[arg(long, required = true, value_name = "PATH")]
    pub model: PathBuf,

    /// Prefix prepended to every output file name, e.g. `results/T1000TS001_1_`.
    #[arg(long, required = true, value_name = "PREFIX")]
    pub output_prefix: String,

    /// Scoring method.
    #[arg(long, value_enum, default_value_t = QaMethod::Dark)]
    pub method: QaMethod,

    /// Rebuild side chains with Scwrl4 before scoring.
    #[arg(long)]
    pub rebuild_side_chains: bool,
}

/// Arguments for the `fetch` subcommand.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Four-character PDB ID, e.g. 1CRN.
    #[arg(required = true, value_name = "PDB_ID")]
    pub pdb_id: String,

    /// Path for the downloaded structure.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Biological assembly number, 0 for the asymmetric unit.
    /// Without it, assembly 1 is tried first, then the asymmetric unit.
    #[arg(long, value_name = "INT")]
    pub assembly: Option<u32>,

    /// Do not include heteroatoms.
    #[arg(long)]
    pub no_heteroatoms: bool,
}

/// Options shared by the animation subcommands.
#[derive(Args, Debug)]
pub struct AnimationArgs {
    /// Path to the structure to animate (PDB format).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the animated image.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Override the inter-frame delay, in hundredths of a second.
    #[arg(long, value_name = "INT")]
    pub delay: Option<u32>,

    /// Save the GUI state and disable widgets while frames are captured.
    #[arg(long)]
    pub hide_gui: bool,
}

/// Arguments for the `spin` subcommand.
#[derive(Args, Debug)]
pub struct SpinArgs {
    #[command(flatten)]
    pub animation: AnimationArgs,

    /// Rotation per frame, in degrees.
    #[arg(long, value_name = "DEGREES")]
    pub angle: Option<f64>,
}

/// Arguments for the `turntable` subcommand.
#[derive(Args, Debug)]
pub struct TurntableArgs {
    #[command(flatten)]
    pub animation: AnimationArgs,

    /// Total number of rotation steps; odd values are rounded down.
    #[arg(long, value_name = "INT")]
    pub steps: Option<usize>,

    /// Rotation per step, in degrees.
    #[arg(long, value_name = "DEGREES")]
    pub angle: Option<f64>,

    /// Override how many times each extremity frame is repeated.
    #[arg(long = "pause", value_name = "INT")]
    pub pause_frames: Option<usize>,

    /// Capture only the two outward arcs instead of replaying through the start frame.
    #[arg(long)]
    pub sweep: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_carries_no_author_line() {
        let mut command = Cli::command();
        assert!(command.get_author().is_none());
        assert!(!command.render_help().to_string().contains("Tony Kan"));
    }

    #[test]
    fn global_options_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "strucflow",
            "fetch",
            "1crn",
            "-o",
            "out.pdb",
            "-vv",
            "-S",
            "tools.curl=/usr/local/bin/curl",
            "-S",
            "animation.delay=4",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.set_values.len(), 2);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.pdb_id, "1crn");
        assert_eq!(args.assembly, None);
    }

    #[test]
    fn casp_qa_method_defaults_to_dark() {
        let cli = Cli::try_parse_from([
            "strucflow",
            "casp-qa",
            "--sequence",
            "t.fasta",
            "--model",
            "m.pdb",
            "--output-prefix",
            "out/m_",
        ])
        .unwrap();

        let Commands::CaspQa(args) = cli.command else {
            panic!("expected casp-qa");
        };
        assert_eq!(args.method, QaMethod::Dark);
        assert!(!args.rebuild_side_chains);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["strucflow", "-q", "-v", "spin", "-i", "a", "-o", "b"]);
        assert!(result.is_err());
    }
}
