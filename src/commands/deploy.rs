use clap::{Args, ValueEnum};

use vaadin_deploy::deploy::{self, DeployOptions, DeployOrchestrationResult};
use vaadin_deploy::server::EnvironmentClass;
use vaadin_deploy::ssh::{SshOptions, SshSessionFactory};

use super::{run_exit_code, CmdResult, GlobalArgs};

#[derive(Args)]
pub struct DeployArgs {
    /// Environment class to deploy
    #[arg(value_enum)]
    pub environment: DeployTarget,

    /// Continue with the remaining servers after a failure
    #[arg(long)]
    pub keep_going: bool,
}

/// Deployable environment classes. LOCAL is run with docker compose directly.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DeployTarget {
    Test,
    Qa,
    Staging,
    Prod,
}

impl From<DeployTarget> for EnvironmentClass {
    fn from(target: DeployTarget) -> Self {
        match target {
            DeployTarget::Test => EnvironmentClass::Test,
            DeployTarget::Qa => EnvironmentClass::Qa,
            DeployTarget::Staging => EnvironmentClass::Staging,
            DeployTarget::Prod => EnvironmentClass::Prod,
        }
    }
}

pub fn run(args: DeployArgs, global: &GlobalArgs) -> CmdResult<DeployOrchestrationResult> {
    let config = global.load_config()?;
    let sessions = SshSessionFactory {
        options: SshOptions::from_settings(&config.settings),
    };

    let result = deploy::run(
        &config,
        args.environment.into(),
        DeployOptions {
            keep_going: args.keep_going,
        },
        &sessions,
    )?;

    let exit_code = run_exit_code(&result.summary, result.first_failure());
    Ok((result, exit_code))
}
