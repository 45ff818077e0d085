mod common;

use std::fs;

use common::{server, MockRemote, Project};
use serde_json::json;
use vaadin_deploy::deploy::{self, DeployOptions, ServerStatus};
use vaadin_deploy::init;
use vaadin_deploy::pipeline::StepStatus;
use vaadin_deploy::server::EnvironmentClass;

fn initialized(project: &Project, servers: serde_json::Value) -> vaadin_deploy::config::DeployConfig {
    let config = project.config(servers);
    let report = init::run(&config).unwrap();
    assert_eq!(report.summary.failed, 0);
    config
}

#[test]
fn fresh_server_receives_everything_and_starts() {
    let project = Project::new();
    let config = initialized(&project, json!([server("PROD", "app.example.com")]));
    let remote = MockRemote::new();

    let result = deploy::run(
        &config,
        EnvironmentClass::Prod,
        DeployOptions::default(),
        &remote,
    )
    .unwrap();

    assert_eq!(result.summary.succeeded, 1);
    assert_eq!(result.results[0].status, ServerStatus::Succeeded);

    let log = remote.log();
    assert_eq!(log.first().map(String::as_str), Some("open deploy@10.0.0.5"));
    assert_eq!(log.last().map(String::as_str), Some("close"));
    assert!(log.contains(&"exec docker compose version".to_string()));
    assert!(log.contains(&"upload /opt/app/docker-compose.yaml".to_string()));
    assert!(log.contains(&"upload /opt/app/.env".to_string()));
    assert!(log.contains(&"upload /opt/app/configs/nginx/app.conf".to_string()));
    assert!(log.contains(&"upload /opt/data/README.md".to_string()));
    assert!(log.contains(&"upload /opt/app/target/app-1.0.jar".to_string()));
    assert!(!log.iter().any(|e| e.contains("down -v")));

    let up = "exec docker compose -f '/opt/app/docker-compose.yaml' up -d --build";
    assert_eq!(log[log.len() - 2], up);

    // No backupDir configured
    assert!(result.warnings.iter().any(|w| w.contains("backupDir")));
}

#[test]
fn existing_deployment_is_stopped_and_backed_up() {
    let project = Project::new();
    let mut entry = server("PROD", "app.example.com");
    entry["backupDir"] = json!("/opt/backup/");
    let config = initialized(&project, json!([entry]));
    let remote =
        MockRemote::new().with_existing(&["/opt/app", "/opt/app/docker-compose.yaml"]);

    let result = deploy::run(
        &config,
        EnvironmentClass::Prod,
        DeployOptions::default(),
        &remote,
    )
    .unwrap();
    assert_eq!(result.summary.succeeded, 1);

    let backup_dir = result.results[0]
        .paths
        .remote_backup_dir
        .clone()
        .unwrap();
    assert!(backup_dir.starts_with("/opt/backup/"));

    let log = remote.remote_calls();
    let down = log
        .iter()
        .position(|e| e == "exec docker compose -f '/opt/app/docker-compose.yaml' down -v")
        .unwrap();
    let copy = log
        .iter()
        .position(|e| *e == format!("exec cp -r '/opt/app' '{}'", backup_dir))
        .unwrap();
    let mkdir = log
        .iter()
        .position(|e| *e == format!("mkdir {}", backup_dir))
        .unwrap();
    let first_upload = log.iter().position(|e| e.starts_with("upload ")).unwrap();

    assert!(down < mkdir && mkdir < copy && copy < first_upload);
}

#[test]
fn non_empty_apps_data_is_left_alone() {
    let project = Project::new();
    let config = initialized(&project, json!([server("TEST", "test.example.com")]));
    let remote = MockRemote::new().with_non_empty("/opt/data");

    let result = deploy::run(
        &config,
        EnvironmentClass::Test,
        DeployOptions::default(),
        &remote,
    )
    .unwrap();

    assert_eq!(result.summary.succeeded, 1);
    assert!(!remote
        .log()
        .iter()
        .any(|e| e.starts_with("upload /opt/data")));

    let pipeline = result.results[0].pipeline.as_ref().unwrap();
    let apps = pipeline
        .steps
        .iter()
        .find(|s| s.id == "upload_apps_data")
        .unwrap();
    assert_eq!(apps.status, StepStatus::Skipped);
}

#[test]
fn ambiguous_artifacts_fail_before_touching_the_server() {
    let project = Project::new();
    fs::write(project.vaadin().join("target/app-1.0-sources.jar"), b"PK").unwrap();
    let config = initialized(&project, json!([server("QA", "qa.example.com")]));
    let remote = MockRemote::new();

    let result = deploy::run(&config, EnvironmentClass::Qa, DeployOptions::default(), &remote)
        .unwrap();

    assert_eq!(result.summary.failed, 1);
    let failure = result.first_failure().unwrap();
    assert_eq!(failure.code.as_str(), "precondition.artifact_ambiguous");
    assert!(remote.remote_calls().is_empty());
}

#[test]
fn missing_compose_halts_remaining_servers() {
    let project = Project::new();
    let config = initialized(
        &project,
        json!([
            server("STAGING", "one.example.com"),
            server("STAGING", "two.example.com"),
        ]),
    );
    let remote = MockRemote::new();
    remote.state.borrow_mut().compose_version = None;

    let result = deploy::run(
        &config,
        EnvironmentClass::Staging,
        DeployOptions::default(),
        &remote,
    )
    .unwrap();

    let statuses: Vec<_> = result.results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![ServerStatus::Failed, ServerStatus::Skipped]);
    assert_eq!(
        result.first_failure().unwrap().code.as_str(),
        "precondition.compose_unavailable"
    );
    let opened = remote.log().iter().filter(|e| e.starts_with("open ")).count();
    assert_eq!(opened, 1);
}

#[test]
fn keep_going_deploys_every_server() {
    let project = Project::new();
    let config = initialized(
        &project,
        json!([
            server("STAGING", "one.example.com"),
            server("STAGING", "two.example.com"),
        ]),
    );
    let remote = MockRemote::new();
    remote.state.borrow_mut().compose_version = None;

    let result = deploy::run(
        &config,
        EnvironmentClass::Staging,
        DeployOptions { keep_going: true },
        &remote,
    )
    .unwrap();

    assert_eq!(result.summary.failed, 2);
    assert_eq!(result.summary.skipped, 0);
}

#[test]
fn unusable_session_is_an_ssh_error() {
    let project = Project::new();
    let config = initialized(&project, json!([server("PROD", "app.example.com")]));
    let remote = MockRemote::new();
    remote.state.borrow_mut().invalid_session = true;

    let result = deploy::run(
        &config,
        EnvironmentClass::Prod,
        DeployOptions::default(),
        &remote,
    )
    .unwrap();

    assert_eq!(
        result.first_failure().unwrap().code.as_str(),
        "ssh.connect_failed"
    );
    assert!(result.results[0].pipeline.is_none());
}

#[test]
fn deploy_without_init_reports_missing_deployment() {
    let project = Project::new();
    let config = project.config(json!([server("PROD", "app.example.com")]));
    let remote = MockRemote::new();

    let result = deploy::run(
        &config,
        EnvironmentClass::Prod,
        DeployOptions::default(),
        &remote,
    )
    .unwrap();

    assert_eq!(
        result.first_failure().unwrap().code.as_str(),
        "precondition.deployment_missing"
    );
    assert!(!remote.log().iter().any(|e| e.starts_with("upload ")));
}

#[test]
fn invalid_config_aborts_before_any_session() {
    let project = Project::new();
    let mut entry = server("PROD", "https://app.example.com");
    entry["deployDir"] = json!("");
    let config = project.config(json!([entry]));
    let remote = MockRemote::new();

    let err = deploy::run(
        &config,
        EnvironmentClass::Prod,
        DeployOptions::default(),
        &remote,
    )
    .unwrap_err();

    assert_eq!(err.code.as_str(), "config.invalid_value");
    assert!(err.hints.len() >= 2);
    assert!(remote.log().is_empty());
}

#[test]
fn local_environment_cannot_be_deployed() {
    let project = Project::new();
    let config = project.config(json!([]));
    let err = deploy::run(
        &config,
        EnvironmentClass::Local,
        DeployOptions::default(),
        &MockRemote::new(),
    )
    .unwrap_err();
    assert_eq!(err.code.as_str(), "validation.invalid_argument");
}

#[test]
fn environment_without_servers_is_skipped() {
    let project = Project::new();
    let config = initialized(&project, json!([server("TEST", "test.example.com")]));
    let remote = MockRemote::new();

    let result = deploy::run(
        &config,
        EnvironmentClass::Prod,
        DeployOptions::default(),
        &remote,
    )
    .unwrap();

    assert!(result.results.is_empty());
    assert_eq!(result.summary.total, 0);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("`PROD` server type. Skipping deployment process")));
    assert!(remote.log().is_empty());
}

#[test]
fn backup_is_skipped_until_the_deploy_dir_exists() {
    let project = Project::new();
    let mut entry = server("PROD", "app.example.com");
    entry["backupDir"] = json!("/opt/backup/");
    let config = initialized(&project, json!([entry]));
    let remote = MockRemote::new();

    let result = deploy::run(
        &config,
        EnvironmentClass::Prod,
        DeployOptions::default(),
        &remote,
    )
    .unwrap();
    assert_eq!(result.summary.succeeded, 1);

    let pipeline = result.results[0].pipeline.as_ref().unwrap();
    let backup = pipeline.steps.iter().find(|s| s.id == "backup").unwrap();
    assert_eq!(backup.status, StepStatus::Skipped);

    let log = remote.remote_calls();
    assert!(!log.iter().any(|e| e.starts_with("mkdir /opt/backup")));
    assert!(!log.iter().any(|e| e.contains("cp ")));
}
