use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use vaadin_deploy::paths::ResolvedPaths;
use vaadin_deploy::server::{EnvironmentClass, ServerEntry};
use vaadin_deploy::{Error, Result};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct PathsArgs {
    /// Only show servers of this environment class
    #[arg(long = "env", value_name = "CLASS")]
    pub environment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPaths {
    pub domain: String,
    pub environment: EnvironmentClass,
    pub already_initialized: bool,
    pub paths: ResolvedPaths,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsOutput {
    pub project_base_dir: PathBuf,
    pub servers: Vec<ServerPaths>,
}

pub fn run(args: PathsArgs, global: &GlobalArgs) -> CmdResult<PathsOutput> {
    let config = global.load_config()?;
    let filter = args.environment.as_deref().map(parse_class).transpose()?;

    let mut servers = Vec::new();
    for raw in &config.servers {
        let server = ServerEntry::from_config(raw)?;
        if filter.is_some_and(|class| class != server.environment_class) {
            continue;
        }
        let paths =
            ResolvedPaths::resolve(&server, &config.project_base_dir, &config.vaadin_project_dir);
        servers.push(ServerPaths {
            already_initialized: paths.already_initialized(),
            domain: server.domain,
            environment: server.environment_class,
            paths,
        });
    }

    Ok((
        PathsOutput {
            project_base_dir: config.project_base_dir,
            servers,
        },
        0,
    ))
}

fn parse_class(raw: &str) -> Result<EnvironmentClass> {
    EnvironmentClass::parse(raw).ok_or_else(|| {
        Error::validation_invalid_argument(
            "env",
            format!("Unknown environment class `{}`", raw),
            Some(raw.to_string()),
            Some(
                EnvironmentClass::ALL
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            ),
        )
    })
}
