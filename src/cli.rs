//! Command-line interface definitions using clap.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Sum an array across forked workers that deliver partial results over
/// queued signals.
#[derive(Parser, Debug)]
#[command(name = "sigtally")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log format: pretty, compact, json.
    #[arg(long)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fork workers, sum the array, and print the final total.
    Run(RunArgs),

    /// Show how the array would be split without forking anything.
    Plan(PlanArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the run command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Array length; the array holds 1..=N.
    #[arg(short = 'n', long, env = "SIGTALLY_ARRAY_LEN", default_value_t = 4096)]
    pub array_len: usize,

    /// Number of shares; one fewer worker is forked, the coordinator
    /// keeps the last share.
    #[arg(short = 'p', long, env = "SIGTALLY_SHARES", default_value_t = 4)]
    pub shares: usize,

    /// Offset from SIGRTMIN for the delivery signal.
    #[arg(long, env = "SIGTALLY_RT_OFFSET", default_value_t = 0)]
    pub rt_offset: i32,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormatArg::Plain)]
    pub format: OutputFormatArg,
}

/// Arguments for the plan command.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Array length; the array holds 1..=N.
    #[arg(short = 'n', long, env = "SIGTALLY_ARRAY_LEN", default_value_t = 4096)]
    pub array_len: usize,

    /// Number of shares.
    #[arg(short = 'p', long, env = "SIGTALLY_SHARES", default_value_t = 4)]
    pub shares: usize,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormatArg::Plain)]
    pub format: OutputFormatArg,
}

/// Arguments for shell completions.
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate and print completions to stdout.
    pub fn generate(&self) {
        clap_complete::generate(
            self.shell,
            &mut Cli::command(),
            "sigtally",
            &mut std::io::stdout(),
        );
    }
}

/// Output format argument.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormatArg {
    /// Plain text output.
    #[default]
    Plain,
    /// JSON output.
    Json,
}

/// Verbosity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Default: run progress and arrival notices.
    Normal,
    /// -v: per-worker detail.
    Debug,
    /// -vv: everything.
    Trace,
}

impl From<u8> for Verbosity {
    fn from(count: u8) -> Self {
        match count {
            0 => Verbosity::Normal,
            1 => Verbosity::Debug,
            _ => Verbosity::Trace,
        }
    }
}

impl Verbosity {
    /// Tracing level corresponding to this verbosity.
    pub fn level(&self) -> tracing::Level {
        match self {
            Verbosity::Normal => tracing::Level::INFO,
            Verbosity::Debug => tracing::Level::DEBUG,
            Verbosity::Trace => tracing::Level::TRACE,
        }
    }
}

impl Cli {
    /// Get the verbosity level based on -v flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from(self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parsing() {
        // Verify the CLI definition is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let args = Cli::try_parse_from(["sigtally", "run"]).unwrap();
        match args.command {
            Commands::Run(run) => {
                assert_eq!(run.array_len, 4096);
                assert_eq!(run.shares, 4);
                assert_eq!(run.rt_offset, 0);
                assert_eq!(run.format, OutputFormatArg::Plain);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_with_options() {
        let args =
            Cli::try_parse_from(["sigtally", "run", "-n", "10", "-p", "3", "--rt-offset", "2"])
                .unwrap();
        match args.command {
            Commands::Run(run) => {
                assert_eq!(run.array_len, 10);
                assert_eq!(run.shares, 3);
                assert_eq!(run.rt_offset, 2);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_json_format() {
        let args = Cli::try_parse_from(["sigtally", "run", "--format", "json"]).unwrap();
        match args.command {
            Commands::Run(run) => {
                assert_eq!(run.format, OutputFormatArg::Json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_plan_command() {
        let args = Cli::try_parse_from(["sigtally", "plan", "--array-len", "100", "--shares", "5"])
            .unwrap();
        match args.command {
            Commands::Plan(plan) => {
                assert_eq!(plan.array_len, 100);
                assert_eq!(plan.shares, 5);
            }
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_global_options() {
        let args = Cli::try_parse_from(["sigtally", "-vv", "--no-color", "run"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(args.no_color);
        assert_eq!(args.verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["sigtally", "-v", "-q", "run"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Verbosity::from(0), Verbosity::Normal);
        assert_eq!(Verbosity::from(1), Verbosity::Debug);
        assert_eq!(Verbosity::from(5), Verbosity::Trace);
        assert_eq!(Verbosity::Normal.level(), tracing::Level::INFO);
        assert_eq!(Verbosity::Debug.level(), tracing::Level::DEBUG);
    }
}
