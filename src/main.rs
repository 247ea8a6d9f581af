//! sigtally - parallel array summation over queued signals

mod cli;

use anyhow::Result;
use clap::Parser;
use owo_colors::{OwoColorize, Stream::Stderr};

use cli::{Cli, Commands};
use sigtally::logging::{self, LogConfig, LogFormat};
use sigtally::partition::partition;
use sigtally::report::PlanReport;
use sigtally::sum::{self, RunConfig};

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    init_logging(&cli);

    let result = match &cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Plan(args) => cmd_plan(args),
        Commands::Completions(args) => {
            args.generate();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!(
            "{}: {}",
            "error"
                .if_supports_color(Stderr, |text| text.red())
                .if_supports_color(Stderr, |text| text.bold()),
            e
        );
        // Print the error chain if there are causes
        for cause in e.chain().skip(1) {
            eprintln!(
                "  {}: {}",
                "caused by".if_supports_color(Stderr, |text| text.yellow()),
                cause
            );
        }
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber from CLI flags and environment.
///
/// Must happen before the first fork so workers inherit the subscriber.
fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        cli.verbosity().level()
    };

    let mut config = LogConfig::new().with_level(level);
    if let Some(ref format) = cli.log_format {
        match format.parse::<LogFormat>() {
            Ok(format) => config = config.with_format(format),
            Err(e) => eprintln!("Warning: {}", e),
        }
    }

    logging::init(config.with_env_overrides());
}

/// Execute a summation run and print the report.
fn cmd_run(args: &cli::RunArgs) -> Result<()> {
    let config = RunConfig {
        array_len: args.array_len,
        shares: args.shares,
        rt_offset: args.rt_offset,
    };

    let report = sum::run(&config)?;

    match args.format {
        cli::OutputFormatArg::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        cli::OutputFormatArg::Plain => {
            println!("{}", report);
        }
    }

    Ok(())
}

/// Show the partition a run would use, without forking.
fn cmd_plan(args: &cli::PlanArgs) -> Result<()> {
    let config = RunConfig {
        array_len: args.array_len,
        shares: args.shares,
        rt_offset: 0,
    };
    config.validate()?;

    let report = PlanReport::new(
        args.array_len,
        args.shares,
        partition(args.array_len, args.shares),
    );

    match args.format {
        cli::OutputFormatArg::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        cli::OutputFormatArg::Plain => {
            println!("{}", report);
        }
    }

    Ok(())
}
