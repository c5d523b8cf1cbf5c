//! Git command execution.
//!
//! A trait-based abstraction over the git CLI, decoupling the shard daemon
//! from actual process spawning so its logic is testable without a git
//! installation. The CLI implementation captures combined output the way
//! operators need it for diagnosis.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

/// Authentication options for operations that touch a remote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOpts {
    /// Password for HTTPS remotes, supplied to git via an askpass helper.
    pub https_pass: Option<String>,

    /// Private key file for SSH remotes.
    pub ssh_key_file: Option<PathBuf>,
}

/// Captured result of a git command.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Whether the command exited successfully.
    pub success: bool,
    /// Combined stdout + stderr.
    pub output: String,
}

impl From<std::process::Output> for GitOutput {
    fn from(output: std::process::Output) -> Self {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Self {
            success: output.status.success(),
            output: combined,
        }
    }
}

/// Executes git commands on behalf of the shard daemon.
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Run `git <args>` in `cwd` (or the process working directory),
    /// applying `opt` for remote authentication, and capture combined
    /// output. An `Err` means the command could not be spawned at all;
    /// command failure is reported through [`GitOutput::success`].
    async fn run(
        &self,
        cwd: Option<&Path>,
        args: &[&str],
        opt: Option<&RemoteOpts>,
    ) -> io::Result<GitOutput>;
}

/// The real CLI-backed runner.
pub struct CliGitRunner;

#[async_trait]
impl GitRunner for CliGitRunner {
    async fn run(
        &self,
        cwd: Option<&Path>,
        args: &[&str],
        opt: Option<&RemoteOpts>,
    ) -> io::Result<GitOutput> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        // The askpass helper file must outlive the child process.
        let mut _askpass: Option<tempfile::NamedTempFile> = None;
        if let Some(opt) = opt {
            if let Some(key) = &opt.ssh_key_file {
                cmd.env(
                    "GIT_SSH_COMMAND",
                    format!("ssh -i {} -o IdentitiesOnly=yes", key.display()),
                );
            }
            if let Some(pass) = &opt.https_pass {
                let helper = write_askpass_helper()?;
                cmd.env("GIT_ASKPASS", helper.path());
                cmd.env("ALDER_GIT_PASS", pass);
                _askpass = Some(helper);
            }
        }

        let output = cmd.output().await?;
        Ok(output.into())
    }
}

/// Write a one-line askpass helper that echoes the password env var, so
/// the password never appears on a command line.
fn write_askpass_helper() -> io::Result<tempfile::NamedTempFile> {
    use std::io::Write;

    let mut helper = tempfile::NamedTempFile::new()?;
    helper.write_all(b"#!/bin/sh\nexec echo \"$ALDER_GIT_PASS\"\n")?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = helper.as_file().metadata()?.permissions();
        perms.set_mode(0o700);
        helper.as_file().set_permissions(perms)?;
    }
    Ok(helper)
}
