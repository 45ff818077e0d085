use clap::Args;

use vaadin_deploy::validator::{ValidationReport, ValidationRules, Validator};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ValidateArgs {}

pub fn run(_args: ValidateArgs, global: &GlobalArgs) -> CmdResult<ValidationReport> {
    let config = global.load_config()?;
    let report = Validator::new(ValidationRules::default())?
        .validate(config.certbot_email.as_deref(), &config.servers)?;
    Ok((report, 0))
}
