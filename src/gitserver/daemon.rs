//! The shard daemon: lifecycle operations against local storage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::sharding::rpc::{ShardConn, TransportError};

use super::error::ShardError;
use super::git::{GitRunner, RemoteOpts};
use super::protocol::{ShardReply, ShardRequest, ShardResponse};

/// One git-storage daemon, owning a directory of bare repositories keyed
/// by repository name.
pub struct ShardDaemon {
    repos_dir: PathBuf,
    git: Arc<dyn GitRunner>,
}

impl ShardDaemon {
    /// Create a daemon serving repositories under `repos_dir`.
    pub fn new(repos_dir: impl Into<PathBuf>, git: Arc<dyn GitRunner>) -> Self {
        Self {
            repos_dir: repos_dir.into(),
            git,
        }
    }

    /// Execute one request against local storage.
    pub async fn handle(&self, request: ShardRequest) -> ShardReply {
        debug!(method = request.method(), repo = request.repo(), "shard request");
        match request {
            ShardRequest::Create {
                repo,
                mirror_remote,
                opt,
            } => self.create(&repo, mirror_remote.as_deref(), opt.as_ref()).await,
            ShardRequest::Remove { repo } => self.remove(&repo).await,
            ShardRequest::Exists { repo } => self.exists(&repo).await,
        }
    }

    async fn create(
        &self,
        repo: &str,
        mirror_remote: Option<&str>,
        opt: Option<&RemoteOpts>,
    ) -> ShardReply {
        let dir = self.repo_dir(repo)?;
        if path_exists(&dir).await? {
            return Err(ShardError::AlreadyExists {
                repo: repo.to_string(),
            });
        }
        let dir_str = dir.to_string_lossy().into_owned();

        let (action, args): (&str, Vec<&str>) = match mirror_remote {
            Some(remote) if !remote.is_empty() => {
                ("cloning", vec!["clone", "--mirror", remote, &dir_str])
            }
            _ => ("initializing", vec!["init", "--bare", &dir_str]),
        };

        let out = self
            .git
            .run(None, &args, opt)
            .await
            .map_err(|e| internal(repo, &e))?;
        if !out.success {
            return Err(ShardError::CommandFailed {
                action: action.to_string(),
                repo: repo.to_string(),
                output: out.output,
            });
        }

        info!(repo, mirror = mirror_remote.is_some(), "repository created");
        Ok(ShardResponse::Created)
    }

    async fn remove(&self, repo: &str) -> ShardReply {
        let dir = self.repo_dir(repo)?;
        if !path_exists(&dir).await? {
            return Ok(ShardResponse::Removed { existed: false });
        }

        // Refuse to delete a directory that is not actually a repository.
        let probe = self
            .git
            .run(Some(&dir), &["remote"], None)
            .await
            .map_err(|e| internal(repo, &e))?;
        if !probe.success {
            return Err(ShardError::NotARepository {
                repo: repo.to_string(),
            });
        }

        tokio::fs::remove_dir_all(&dir)
            .await
            .map_err(|e| internal(repo, &e))?;
        info!(repo, "repository removed");
        Ok(ShardResponse::Removed { existed: true })
    }

    async fn exists(&self, repo: &str) -> ShardReply {
        let dir = self.repo_dir(repo)?;
        if !path_exists(&dir).await? {
            return Ok(ShardResponse::Exists { exists: false });
        }
        let probe = self
            .git
            .run(Some(&dir), &["remote"], None)
            .await
            .map_err(|e| internal(repo, &e))?;
        Ok(ShardResponse::Exists {
            exists: probe.success,
        })
    }

    /// Storage path for a repository name, rejecting names that would
    /// escape `repos_dir`.
    fn repo_dir(&self, repo: &str) -> Result<PathBuf, ShardError> {
        validate_repo_name(repo)?;
        Ok(self.repos_dir.join(repo))
    }
}

fn validate_repo_name(repo: &str) -> Result<(), ShardError> {
    let invalid = repo.is_empty()
        || repo.starts_with('/')
        || repo.contains('\\')
        || repo.contains('\0')
        || repo.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if invalid {
        return Err(ShardError::InvalidName {
            repo: repo.to_string(),
        });
    }
    Ok(())
}

async fn path_exists(path: &Path) -> Result<bool, ShardError> {
    tokio::fs::try_exists(path).await.map_err(|e| ShardError::Internal {
        message: format!("stat {}: {e}", path.display()),
    })
}

fn internal(repo: &str, err: &dyn std::fmt::Display) -> ShardError {
    ShardError::Internal {
        message: format!("{repo}: {err}"),
    }
}

// In-process transport: a daemon reached through a handle in the same
// process never fails at the transport layer.
#[async_trait]
impl ShardConn for ShardDaemon {
    async fn call(&self, request: ShardRequest) -> Result<ShardReply, TransportError> {
        Ok(self.handle(request).await)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::Path;
    use std::sync::Mutex;

    use super::super::git::GitOutput;
    use super::*;

    /// Scripted git runner: creates directories for init/clone, answers
    /// the `remote` probe per configuration, and records every call.
    struct FakeGit {
        fail_clone: bool,
        valid_repo: bool,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeGit {
        fn new() -> Self {
            Self {
                fail_clone: false,
                valid_repo: true,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GitRunner for FakeGit {
        async fn run(
            &self,
            _cwd: Option<&Path>,
            args: &[&str],
            _opt: Option<&RemoteOpts>,
        ) -> io::Result<GitOutput> {
            self.calls
                .lock()
                .unwrap()
                .push(args.iter().map(|s| s.to_string()).collect());
            match args[0] {
                "init" => {
                    std::fs::create_dir_all(args[args.len() - 1])?;
                    Ok(GitOutput {
                        success: true,
                        output: String::new(),
                    })
                }
                "clone" => {
                    if self.fail_clone {
                        return Ok(GitOutput {
                            success: false,
                            output: "fatal: could not read from remote repository\n".to_string(),
                        });
                    }
                    std::fs::create_dir_all(args[args.len() - 1])?;
                    Ok(GitOutput {
                        success: true,
                        output: String::new(),
                    })
                }
                "remote" => Ok(GitOutput {
                    success: self.valid_repo,
                    output: String::new(),
                }),
                other => panic!("unexpected git invocation: {other}"),
            }
        }
    }

    fn daemon_with(git: FakeGit) -> (ShardDaemon, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        (ShardDaemon::new(dir.path(), Arc::new(git)), dir)
    }

    #[tokio::test]
    async fn create_initializes_then_rejects_duplicate() {
        let (daemon, _dir) = daemon_with(FakeGit::new());

        let reply = daemon
            .handle(ShardRequest::Create {
                repo: "github.com/o/r".to_string(),
                mirror_remote: None,
                opt: None,
            })
            .await;
        assert_eq!(reply, Ok(ShardResponse::Created));

        let reply = daemon
            .handle(ShardRequest::Create {
                repo: "github.com/o/r".to_string(),
                mirror_remote: None,
                opt: None,
            })
            .await;
        assert_eq!(
            reply,
            Err(ShardError::AlreadyExists {
                repo: "github.com/o/r".to_string()
            })
        );
    }

    #[tokio::test]
    async fn failed_clone_reports_combined_output() {
        let (daemon, _dir) = daemon_with(FakeGit {
            fail_clone: true,
            ..FakeGit::new()
        });

        let reply = daemon
            .handle(ShardRequest::Create {
                repo: "github.com/o/r".to_string(),
                mirror_remote: Some("https://example.com/o/r".to_string()),
                opt: None,
            })
            .await;
        match reply {
            Err(ShardError::CommandFailed { action, output, .. }) => {
                assert_eq!(action, "cloning");
                assert!(output.contains("could not read from remote"));
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn remove_is_a_noop_for_missing_repo() {
        let (daemon, _dir) = daemon_with(FakeGit::new());
        let reply = daemon
            .handle(ShardRequest::Remove {
                repo: "github.com/o/r".to_string(),
            })
            .await;
        assert_eq!(reply, Ok(ShardResponse::Removed { existed: false }));
    }

    #[tokio::test]
    async fn remove_deletes_then_reports_missing() {
        let (daemon, _dir) = daemon_with(FakeGit::new());
        daemon
            .handle(ShardRequest::Create {
                repo: "github.com/o/r".to_string(),
                mirror_remote: None,
                opt: None,
            })
            .await
            .expect("created");

        let reply = daemon
            .handle(ShardRequest::Remove {
                repo: "github.com/o/r".to_string(),
            })
            .await;
        assert_eq!(reply, Ok(ShardResponse::Removed { existed: true }));

        let reply = daemon
            .handle(ShardRequest::Remove {
                repo: "github.com/o/r".to_string(),
            })
            .await;
        assert_eq!(reply, Ok(ShardResponse::Removed { existed: false }));
    }

    #[tokio::test]
    async fn remove_refuses_non_repository() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("not-a-repo")).unwrap();
        let daemon = ShardDaemon::new(
            dir.path(),
            Arc::new(FakeGit {
                valid_repo: false,
                ..FakeGit::new()
            }),
        );

        let reply = daemon
            .handle(ShardRequest::Remove {
                repo: "not-a-repo".to_string(),
            })
            .await;
        assert_eq!(
            reply,
            Err(ShardError::NotARepository {
                repo: "not-a-repo".to_string()
            })
        );
    }

    #[tokio::test]
    async fn traversal_names_are_rejected() {
        let (daemon, _dir) = daemon_with(FakeGit::new());
        for name in ["", "/etc/passwd", "a/../b", ".", "a//b"] {
            let reply = daemon
                .handle(ShardRequest::Exists {
                    repo: name.to_string(),
                })
                .await;
            assert!(
                matches!(reply, Err(ShardError::InvalidName { .. })),
                "{name:?} must be rejected"
            );
        }
    }
}
