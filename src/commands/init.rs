use clap::Args;

use vaadin_deploy::init::{self, InitOrchestrationResult};

use super::{run_exit_code, CmdResult, GlobalArgs};

#[derive(Args)]
pub struct InitArgs {}

pub fn run(_args: InitArgs, global: &GlobalArgs) -> CmdResult<InitOrchestrationResult> {
    let config = global.load_config()?;
    let result = init::run(&config)?;
    let exit_code = run_exit_code(&result.summary, result.first_failure());
    Ok((result, exit_code))
}
