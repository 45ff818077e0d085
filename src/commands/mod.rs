use std::path::PathBuf;

use vaadin_deploy::config::{self, DeployConfig};
use vaadin_deploy::deploy::RunSummary;
use vaadin_deploy::Error;

pub type CmdResult<T> = vaadin_deploy::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    pub config: PathBuf,
}

impl GlobalArgs {
    pub fn load_config(&self) -> vaadin_deploy::Result<DeployConfig> {
        config::load(&self.config)
    }
}

/// Exit code for a multi-server run. When every attempted server failed the
/// first error decides; a partial result is 1.
pub(crate) fn run_exit_code(summary: &RunSummary, first_failure: Option<&Error>) -> i32 {
    if summary.failed == 0 {
        return 0;
    }
    match first_failure {
        Some(err) if summary.succeeded == 0 => crate::output::exit_code_for_error(err.code),
        _ => 1,
    }
}

pub mod deploy;
pub mod init;
pub mod paths;
pub mod validate;

macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (vaadin_deploy::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Init(args) => dispatch!(args, global, init),
        crate::Commands::Deploy(args) => dispatch!(args, global, deploy),
        crate::Commands::Validate(args) => dispatch!(args, global, validate),
        crate::Commands::Paths(args) => dispatch!(args, global, paths),
    }
}
