use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{deploy, init, paths, validate};
use vaadin_deploy::defaults::DEFAULT_CONFIG_FILE;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "vaadin-deploy")]
#[command(version = VERSION)]
#[command(about = "Stage and deploy Vaadin applications to Docker Compose servers over SSH")]
struct Cli {
    /// Path to the deployment config
    #[arg(long, global = true, env = "VAADIN_DEPLOY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level for messages written to stderr
    #[arg(short, long, global = true, env = "VAADIN_DEPLOY_VERBOSITY", default_value_t = LevelFilter::INFO)]
    verbosity: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the local deployment folders for every server
    Init(init::InitArgs),
    /// Deploy to every server of an environment class
    Deploy(deploy::DeployArgs),
    /// Check the config without touching anything
    Validate(validate::ValidateArgs),
    /// Show the resolved local and remote paths of each server
    Paths(paths::PathsArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let global = GlobalArgs { config: cli.config };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    if let Err(err) = output::print_json_result(json_result) {
        tracing::error!(code = err.code.as_str(), "{}", err.message);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
