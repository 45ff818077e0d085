use super::{RemoteSession, SessionFactory};
use crate::defaults::Settings;
use crate::error::{
    Error, RemoteCommandFailedDetails, RemoteIoErrorDetails, Result, SshConnectDetails,
    TargetDetails,
};
use crate::server::{SshAuth, SshConnection};
use crate::utils::shell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

const CONTROL_SOCKET: &str = "cm.sock";
const MASTER_LOG: &str = "master.log";
const ASKPASS_SCRIPT: &str = "askpass.sh";
const ASKPASS_SECRET_ENV: &str = "VAADIN_DEPLOY_ASKPASS_SECRET";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SshOptions {
    pub connect_timeout_secs: u64,
    pub server_alive_interval_secs: u64,
}

impl SshOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            connect_timeout_secs: settings.connect_timeout_secs,
            server_alive_interval_secs: settings.server_alive_interval_secs,
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
            "-o".to_string(),
            format!("ServerAliveInterval={}", self.server_alive_interval_secs),
            "-o".to_string(),
            "ServerAliveCountMax=3".to_string(),
        ]
    }
}

impl Default for SshOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// An OpenSSH master connection that every operation multiplexes over.
///
/// The master is started once in [`SshSession::open`] and stopped by
/// [`SshSession::close`] or on drop.
pub struct SshSession {
    host: String,
    user: String,
    port: u16,
    control_path: PathBuf,
    // Owns the control socket; removed after the master exits.
    _control_dir: TempDir,
    closed: bool,
}

impl SshSession {
    pub fn open(connection: &SshConnection, options: SshOptions) -> Result<Self> {
        let control_dir = tempfile::Builder::new()
            .prefix("vaadin-deploy-ssh")
            .tempdir()
            .map_err(|e| Error::internal_io(e.to_string(), Some("create ssh control dir".into())))?;
        let control_path = control_dir.path().join(CONTROL_SOCKET);
        let log_path = control_dir.path().join(MASTER_LOG);

        let mut cmd = Command::new("ssh");
        cmd.args(["-M", "-f", "-N", "-S"])
            .arg(&control_path)
            .args(options.args());

        let secret = match &connection.auth {
            SshAuth::IdentityFile { path, passphrase } => {
                let expanded = shellexpand::tilde(path).to_string();
                if !Path::new(&expanded).exists() {
                    return Err(Error::ssh_identity_file_not_found(
                        connection.host.clone(),
                        expanded,
                    ));
                }
                cmd.arg("-i")
                    .arg(&expanded)
                    .args(["-o", "IdentitiesOnly=yes"]);
                passphrase.as_deref()
            }
            SshAuth::Password(password) => {
                cmd.args([
                    "-o",
                    "PreferredAuthentications=password,keyboard-interactive",
                    "-o",
                    "PubkeyAuthentication=no",
                ]);
                Some(password.as_str())
            }
        };

        match secret {
            Some(secret) => {
                let script = write_askpass_script(control_dir.path())?;
                cmd.env("SSH_ASKPASS", script)
                    .env("SSH_ASKPASS_REQUIRE", "force")
                    .env(ASKPASS_SECRET_ENV, secret);
            }
            None => {
                cmd.args(["-o", "BatchMode=yes"]);
            }
        }

        cmd.arg("-p")
            .arg(connection.port.to_string())
            .arg(connection.target());

        // The backgrounded master inherits these handles, so they go to a file
        // instead of a pipe that would never close.
        let log = File::create(&log_path)
            .map_err(|e| Error::internal_io(e.to_string(), Some("create ssh log".into())))?;
        let log_err = log
            .try_clone()
            .map_err(|e| Error::internal_io(e.to_string(), Some("create ssh log".into())))?;
        cmd.stdin(Stdio::null()).stdout(log).stderr(log_err);

        tracing::debug!(
            host = %connection.host,
            user = %connection.user,
            port = connection.port,
            "Opening SSH master connection"
        );

        let connect_details = |error: String| SshConnectDetails {
            host: connection.host.clone(),
            user: connection.user.clone(),
            port: connection.port,
            error,
        };

        let status = cmd
            .status()
            .map_err(|e| Error::ssh_connect_failed(connect_details(format!("SSH error: {}", e))))?;

        if !status.success() {
            let log_text = fs::read_to_string(&log_path).unwrap_or_default();
            let details = connect_details(log_text.trim().to_string());
            return Err(if log_text.contains("Permission denied") {
                Error::ssh_auth_failed(details)
            } else {
                Error::ssh_connect_failed(details)
            });
        }

        Ok(Self {
            host: connection.host.clone(),
            user: connection.user.clone(),
            port: connection.port,
            control_path,
            _control_dir: control_dir,
            closed: false,
        })
    }

    /// Stop the master connection. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let result = self
            .control_command()
            .args(["-O", "exit"])
            .arg(self.target())
            .stdin(Stdio::null())
            .output();
        match result {
            Ok(out) if out.status.success() => {
                tracing::debug!(host = %self.host, "SSH master connection closed");
            }
            Ok(out) => tracing::debug!(
                host = %self.host,
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "SSH master was already gone"
            ),
            Err(e) => tracing::debug!(host = %self.host, error = %e, "Failed to stop SSH master"),
        }
    }

    fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn control_command(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-S")
            .arg(&self.control_path)
            .args(["-o", "ControlMaster=no", "-o", "BatchMode=yes"])
            .arg("-p")
            .arg(self.port.to_string());
        cmd
    }

    fn run(&self, command: &str, stdin_file: Option<&Path>) -> Result<CommandOutput> {
        let mut cmd = self.control_command();
        cmd.arg(self.target()).arg(command);

        match stdin_file {
            Some(path) => {
                let file = File::open(path).map_err(|e| {
                    Error::internal_io(e.to_string(), Some(format!("open {}", path.display())))
                })?;
                cmd.stdin(file);
            }
            None => {
                cmd.stdin(Stdio::null());
            }
        }

        tracing::debug!(host = %self.host, command, "Remote command");

        let out = cmd
            .output()
            .map_err(|e| Error::internal_io(e.to_string(), Some("spawn ssh".into())))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
        })
    }

    fn target_details(&self) -> TargetDetails {
        TargetDetails {
            host: Some(self.host.clone()),
            user: Some(self.user.clone()),
        }
    }

    fn io_error(&self, operation: &str, path: &str, output: &CommandOutput) -> Error {
        let error = match output.stderr.trim() {
            "" => format!("exit status {}", output.exit_code),
            stderr => stderr.to_string(),
        };
        Error::remote_io(RemoteIoErrorDetails {
            operation: operation.to_string(),
            path: path.to_string(),
            error,
            target: self.target_details(),
        })
    }
}

impl RemoteSession for SshSession {
    fn execute(&self, command: &str) -> Result<String> {
        let output = self.run(command, None)?;
        if !output.success {
            return Err(Error::remote_command_failed(RemoteCommandFailedDetails {
                command: command.to_string(),
                exit_code: output.exit_code,
                output: output.combined(),
                target: self.target_details(),
            }));
        }
        Ok(output.combined())
    }

    fn exists(&self, remote_path: &str) -> Result<bool> {
        let output = self.run(&format!("test -e {}", shell::quote_path(remote_path)), None)?;
        match output.exit_code {
            0 => Ok(true),
            1 => Ok(false),
            _ => Err(self.io_error("stat", remote_path, &output)),
        }
    }

    fn is_empty(&self, remote_dir: &str) -> Result<bool> {
        let quoted = shell::quote_path(remote_dir);
        let output = self.run(&format!("[ ! -e {0} ] || ls -A {0}", quoted), None)?;
        if !output.success {
            return Err(self.io_error("list", remote_dir, &output));
        }
        Ok(output.stdout.trim().is_empty())
    }

    fn ensure_dir(&self, remote_dir: &str) -> Result<()> {
        let output = self.run(&format!("mkdir -p {}", shell::quote_path(remote_dir)), None)?;
        if !output.success {
            return Err(self.io_error("mkdir", remote_dir, &output));
        }
        Ok(())
    }

    fn upload_file(&self, local_file: &Path, remote_dir: &str) -> Result<()> {
        let name = local_file.file_name().ok_or_else(|| {
            Error::internal_unexpected(format!("{} has no file name", local_file.display()))
        })?;
        self.ensure_dir(remote_dir)?;

        let remote_path = format!(
            "{}/{}",
            remote_dir.trim_end_matches('/'),
            name.to_string_lossy()
        );
        let output = self.run(
            &format!("cat > {}", shell::quote_path(&remote_path)),
            Some(local_file),
        )?;
        if !output.success {
            return Err(self.io_error("upload", &remote_path, &output));
        }
        Ok(())
    }

    fn is_session_valid(&self) -> bool {
        if self.closed {
            return false;
        }
        self.control_command()
            .args(["-O", "check"])
            .arg(self.target())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Writes a helper that prints the secret passed through the environment.
fn write_askpass_script(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(ASKPASS_SCRIPT);
    let script = format!("#!/bin/sh\nprintf '%s\\n' \"${}\"\n", ASKPASS_SECRET_ENV);
    fs::write(&path, script)
        .map_err(|e| Error::internal_io(e.to_string(), Some("write askpass helper".into())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o700))
            .map_err(|e| Error::internal_io(e.to_string(), Some("chmod askpass helper".into())))?;
    }

    Ok(path)
}

pub struct SshSessionFactory {
    pub options: SshOptions,
}

impl SessionFactory for SshSessionFactory {
    fn open(&self, connection: &SshConnection) -> Result<Box<dyn RemoteSession>> {
        Ok(Box::new(SshSession::open(connection, self.options)?))
    }
}
