/*!
 * Tripwire CLI - Command Line Interface
 *
 * Validates breaker configuration files and replays scripted call outcomes
 * against a named breaker so thresholds can be checked before deployment.
 */

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tripwire::{
    config::{LogLevel, TripwireConfig},
    error::{Result, EXIT_SUCCESS},
    logging, report, script,
};
use tripwire_core_breaker::ProtectedCaller;

#[derive(Parser)]
#[command(name = "tripwire")]
#[command(version, about = "Validate circuit breaker configurations and replay call outcomes against them", long_about = None)]
struct Cli {
    /// Breaker configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Write logs to a file (JSON lines) instead of stdout
    #[arg(long = "log-file", value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Log level
    #[arg(long = "log-level", value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print each breaker's resolved settings
    Check,

    /// Replay a script of call outcomes against one breaker
    Replay {
        /// Breaker name (unknown names use the [defaults] settings)
        #[arg(short = 'b', long = "breaker")]
        breaker: String,

        /// Steps, e.g. "ok*5, fail*5, wait=30000, ok"
        #[arg(short = 's', long = "script")]
        script: String,

        /// Emit one JSON object per step instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => TripwireConfig::from_file(path)?,
        None => TripwireConfig::default(),
    };

    // CLI flags override the [logging] table
    if let Some(level) = cli.log_level {
        config.logging.level = level.into();
    }
    if cli.log_file.is_some() {
        config.logging.file = cli.log_file.clone();
    }
    config.logging.verbose |= cli.verbose;

    logging::init_logging(&config.logging)?;
    config.validate()?;

    match cli.command {
        Commands::Check => check(&config),
        Commands::Replay {
            breaker,
            script,
            json,
        } => run_replay(&config, &breaker, &script, json),
    }
}

fn check(config: &TripwireConfig) -> Result<()> {
    println!("{}", report::describe_config("[defaults]", &config.defaults.resolve()));
    for name in config.breakers.keys() {
        println!("{}", report::describe_config(name, &config.breaker_config(name)));
    }
    println!("Configuration OK ({} named breakers)", config.breakers.len());
    Ok(())
}

fn run_replay(config: &TripwireConfig, breaker: &str, script: &str, json: bool) -> Result<()> {
    let steps = script::parse_script(script)?;
    let breaker_config = config.breaker_config(breaker);
    let caller = ProtectedCaller::new(config.build_registry()?);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    if !json {
        println!("{}", report::describe_config(breaker, &breaker_config));
    }

    let mut encode_error = None;
    runtime.block_on(script::replay(
        &caller,
        breaker,
        &breaker_config,
        &steps,
        |step| {
            if json {
                match serde_json::to_string(step) {
                    Ok(line) => println!("{}", line),
                    Err(e) => {
                        encode_error.get_or_insert(e);
                    }
                }
            } else {
                println!("{}", step);
            }
        },
    ))?;

    match encode_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
