//! Shared fixtures: in-process shard clusters with a scripted git runner.
#![allow(dead_code)] // not every test binary uses every fixture

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use alder::gitserver::{GitOutput, GitRunner, RemoteOpts, ShardDaemon, ShardReply, ShardRequest};
use alder::sharding::rpc::{ShardConn, TransportError};
use alder::sharding::{ShardAddr, ShardHandle, ShardRouter};

/// Git runner that simulates the commands the daemon issues: `init` and
/// `clone` create the target directory, `remote` succeeds for any
/// existing directory.
pub struct ScriptedGit;

#[async_trait]
impl GitRunner for ScriptedGit {
    async fn run(
        &self,
        _cwd: Option<&Path>,
        args: &[&str],
        _opt: Option<&RemoteOpts>,
    ) -> io::Result<GitOutput> {
        match args[0] {
            "init" | "clone" => {
                std::fs::create_dir_all(args[args.len() - 1])?;
                Ok(GitOutput {
                    success: true,
                    output: String::new(),
                })
            }
            "remote" => Ok(GitOutput {
                success: true,
                output: String::new(),
            }),
            other => panic!("unexpected git invocation: {other}"),
        }
    }
}

/// A connection that always fails at the transport layer.
pub struct FailingConn {
    pub addr: ShardAddr,
}

#[async_trait]
impl ShardConn for FailingConn {
    async fn call(&self, _request: ShardRequest) -> Result<ShardReply, TransportError> {
        Err(TransportError::Connection {
            addr: self.addr.clone(),
            message: "connection refused".to_string(),
        })
    }
}

/// One in-process shard: its daemon handle and its repos directory.
pub struct TestShard {
    pub addr: ShardAddr,
    pub repos_dir: PathBuf,
    _tempdir: tempfile::TempDir,
}

/// Spin up `count` in-process shard daemons and a router over them.
pub fn in_process_cluster(count: usize) -> (Arc<ShardRouter>, Vec<TestShard>) {
    let mut handles = Vec::with_capacity(count);
    let mut shards = Vec::with_capacity(count);
    for i in 0..count {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let addr = ShardAddr::from(format!("shard-{i}"));
        let daemon = ShardDaemon::new(tempdir.path(), Arc::new(ScriptedGit));
        handles.push(ShardHandle::spawn(addr.clone(), Arc::new(daemon)));
        shards.push(TestShard {
            addr,
            repos_dir: tempdir.path().to_path_buf(),
            _tempdir: tempdir,
        });
    }
    (Arc::new(ShardRouter::new(handles)), shards)
}
