//! Per-repository transport handles.
//!
//! A [`RepoTransport`] wraps one repository for the duration of one verb.
//! The storage-location lookup behind [`RepoStorageResolver`] is an
//! external collaborator; the disk resolver here maps names straight to
//! directories under the repos root.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::error::GitTransportError;
use super::events::PushEvent;
use super::pktline;

/// The two smart-protocol services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitService {
    UploadPack,
    ReceivePack,
}

impl GitService {
    /// Parse a service token, with or without the `git-` prefix.
    pub fn parse(s: &str) -> Option<Self> {
        match s.strip_prefix("git-").unwrap_or(s) {
            "upload-pack" => Some(GitService::UploadPack),
            "receive-pack" => Some(GitService::ReceivePack),
            _ => None,
        }
    }

    /// The git subcommand implementing this service.
    pub fn subcommand(&self) -> &'static str {
        match self {
            GitService::UploadPack => "upload-pack",
            GitService::ReceivePack => "receive-pack",
        }
    }
}

impl fmt::Display for GitService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git-{}", self.subcommand())
    }
}

/// One repository's transport, for the duration of one request.
#[async_trait]
pub trait RepoTransport: Send + Sync {
    /// Produce the ref-advertisement payload for the requested service.
    async fn info_refs(&self, service: GitService) -> Result<Vec<u8>, GitTransportError>;

    /// Run fetch negotiation against the repository.
    async fn upload_pack(&self, body: &[u8]) -> Result<Vec<u8>, GitTransportError>;

    /// Execute a push, returning the raw response bytes and the push
    /// events in the order git produced them.
    async fn receive_pack(&self, body: &[u8])
        -> Result<(Vec<u8>, Vec<PushEvent>), GitTransportError>;
}

/// Resolves a repository name to its transport.
#[async_trait]
pub trait RepoStorageResolver: Send + Sync {
    async fn open(&self, repo: &str) -> Result<Arc<dyn RepoTransport>, GitTransportError>;
}

/// Resolver mapping repository names to directories under a repos root.
pub struct DiskRepoResolver {
    repos_dir: PathBuf,
}

impl DiskRepoResolver {
    pub fn new(repos_dir: impl Into<PathBuf>) -> Self {
        Self {
            repos_dir: repos_dir.into(),
        }
    }
}

#[async_trait]
impl RepoStorageResolver for DiskRepoResolver {
    async fn open(&self, repo: &str) -> Result<Arc<dyn RepoTransport>, GitTransportError> {
        // A name that cannot be a storage path cannot name a repository.
        let escapes = repo.is_empty()
            || repo.starts_with('/')
            || repo.contains('\\')
            || repo.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
        if escapes {
            return Err(GitTransportError::NotFound {
                repo: repo.to_string(),
            });
        }

        let dir = self.repos_dir.join(repo);
        let exists = tokio::fs::try_exists(&dir)
            .await
            .map_err(|e| GitTransportError::Internal {
                message: format!("stat {}: {e}", dir.display()),
            })?;
        if !exists {
            return Err(GitTransportError::NotFound {
                repo: repo.to_string(),
            });
        }
        Ok(Arc::new(CliRepoTransport::new(dir)))
    }
}

/// Transport shelling out to the stateless-rpc modes of the git service
/// commands.
pub struct CliRepoTransport {
    dir: PathBuf,
}

impl CliRepoTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl RepoTransport for CliRepoTransport {
    async fn info_refs(&self, service: GitService) -> Result<Vec<u8>, GitTransportError> {
        let output = Command::new("git")
            .arg(service.subcommand())
            .arg("--stateless-rpc")
            .arg("--advertise-refs")
            .arg(&self.dir)
            .output()
            .await
            .map_err(|e| spawn_error(service, &e))?;
        if !output.status.success() {
            return Err(service_failed(service, &output.stderr));
        }

        let mut response = pktline::advertisement_header(service);
        response.extend_from_slice(&output.stdout);
        Ok(response)
    }

    async fn upload_pack(&self, body: &[u8]) -> Result<Vec<u8>, GitTransportError> {
        run_stateless(GitService::UploadPack, &self.dir, body).await
    }

    async fn receive_pack(
        &self,
        body: &[u8],
    ) -> Result<(Vec<u8>, Vec<PushEvent>), GitTransportError> {
        // The command section is parsed before the push runs so the
        // events reflect exactly what the client asked for.
        let events = pktline::parse_receive_pack_commands(body)?;
        let response = run_stateless(GitService::ReceivePack, &self.dir, body).await?;
        Ok((response, events))
    }
}

/// Run a git service in stateless-rpc mode, feeding `body` on stdin and
/// capturing the response from stdout.
async fn run_stateless(
    service: GitService,
    dir: &Path,
    body: &[u8],
) -> Result<Vec<u8>, GitTransportError> {
    let mut child = Command::new("git")
        .arg(service.subcommand())
        .arg("--stateless-rpc")
        .arg(dir)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(service, &e))?;

    // Feed stdin on its own task so a large pack cannot deadlock against
    // the child filling its stdout pipe.
    let mut stdin = child.stdin.take().ok_or_else(|| GitTransportError::Internal {
        message: "child stdin unavailable".to_string(),
    })?;
    let body = body.to_vec();
    let writer = tokio::spawn(async move {
        let _ = stdin.write_all(&body).await;
        let _ = stdin.shutdown().await;
    });

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| spawn_error(service, &e))?;
    let _ = writer.await;

    if !output.status.success() {
        return Err(service_failed(service, &output.stderr));
    }
    Ok(output.stdout)
}

fn spawn_error(service: GitService, err: &std::io::Error) -> GitTransportError {
    GitTransportError::Internal {
        message: format!("spawning {service}: {err}"),
    }
}

fn service_failed(service: GitService, stderr: &[u8]) -> GitTransportError {
    GitTransportError::ServiceFailed {
        service: service.to_string(),
        output: String::from_utf8_lossy(stderr).into_owned(),
    }
}
