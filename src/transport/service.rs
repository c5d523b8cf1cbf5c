//! The transport service: verbs, gating, and hook fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::auth::AccessGate;
use crate::context::RequestContext;

use super::encoding::{self, ContentEncoding};
use super::error::GitTransportError;
use super::events::{collapse_duplicate_events, PushEvent};
use super::handle::{GitService, RepoStorageResolver};

/// Operation name the receive-pack write check is made against.
pub const RECEIVE_PACK_OPERATION: &str = "GitTransport.ReceivePack";

/// The receive-pack operation as hooks see it.
#[derive(Debug, Clone)]
pub struct ReceivePackOp {
    /// Repository the push targeted.
    pub repo: String,
    /// Content encoding the request negotiated, if any.
    pub content_encoding: Option<String>,
}

/// A post-push hook. Hooks run synchronously, in registration order,
/// exactly once per receive-pack, after event deduplication. Their
/// failures are their own problem: the transport logs and moves on.
#[async_trait]
pub trait PostPushHook: Send + Sync {
    /// Hook name for logging.
    fn name(&self) -> &str;

    /// Observe one completed push.
    async fn on_push(&self, op: &ReceivePackOp, events: &[PushEvent]) -> anyhow::Result<()>;
}

/// The git smart-transport service. No cross-request state: every verb
/// resolves its repository handle fresh.
pub struct GitTransportService {
    gate: AccessGate,
    resolver: Arc<dyn RepoStorageResolver>,
    hooks: Vec<Arc<dyn PostPushHook>>,
}

impl GitTransportService {
    pub fn new(gate: AccessGate, resolver: Arc<dyn RepoStorageResolver>) -> Self {
        Self {
            gate,
            resolver,
            hooks: Vec::new(),
        }
    }

    /// Register a post-push hook. Hooks run in registration order.
    pub fn register_post_push_hook(&mut self, hook: Arc<dyn PostPushHook>) {
        self.hooks.push(hook);
    }

    /// Ref advertisement for the requested service. Reads are allowed
    /// unauthenticated at this layer; read authorization, if any, is
    /// enforced upstream.
    pub async fn info_refs(
        &self,
        _ctx: &RequestContext,
        repo: &str,
        service: GitService,
    ) -> Result<Vec<u8>, GitTransportError> {
        let transport = self.resolver.open(repo).await?;
        transport.info_refs(service).await
    }

    /// Fetch negotiation: decode the client's request per the negotiated
    /// encoding, run the fetch, encode the packfile response the same
    /// way.
    pub async fn upload_pack(
        &self,
        _ctx: &RequestContext,
        repo: &str,
        body: Vec<u8>,
        content_encoding: Option<&str>,
    ) -> Result<Vec<u8>, GitTransportError> {
        let encoding = ContentEncoding::parse(content_encoding)?;
        let body = encoding::decode_body(encoding, body)?;

        let transport = self.resolver.open(repo).await?;
        let response = transport.upload_pack(&body).await?;
        encoding::encode_body(encoding, response)
    }

    /// Execute a push. The write check runs before storage is touched;
    /// hooks observe the deduplicated events after the push and cannot
    /// turn it into a failure.
    pub async fn receive_pack(
        &self,
        ctx: &RequestContext,
        repo: &str,
        body: Vec<u8>,
        content_encoding: Option<&str>,
    ) -> Result<Vec<u8>, GitTransportError> {
        self.gate.check_write(ctx, RECEIVE_PACK_OPERATION).await?;

        let encoding = ContentEncoding::parse(content_encoding)?;
        let body = encoding::decode_body(encoding, body)?;

        let transport = self.resolver.open(repo).await?;
        let (response, events) = transport.receive_pack(&body).await?;

        let events = collapse_duplicate_events(events);
        debug!(repo, events = events.len(), "push completed");

        let op = ReceivePackOp {
            repo: repo.to_string(),
            content_encoding: content_encoding.map(String::from),
        };
        for hook in &self.hooks {
            if let Err(err) = hook.on_push(&op, &events).await {
                warn!(hook = hook.name(), repo, error = %err, "post-push hook failed");
            }
        }

        encoding::encode_body(encoding, response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use crate::auth::{AccessError, Actor};
    use crate::config::{AuthConfig, AuthSource, FederationConfig};
    use crate::services::{MockPermissionService, MockUserService, Services};
    use crate::transport::events::PushEventKind;
    use crate::transport::handle::RepoTransport;

    use super::*;

    struct MockTransport {
        events: Vec<PushEvent>,
        receive_packs: AtomicUsize,
        last_upload_body: Mutex<Vec<u8>>,
    }

    impl MockTransport {
        fn new(events: Vec<PushEvent>) -> Self {
            Self {
                events,
                receive_packs: AtomicUsize::new(0),
                last_upload_body: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RepoTransport for MockTransport {
        async fn info_refs(&self, _service: GitService) -> Result<Vec<u8>, GitTransportError> {
            Ok(b"001e# service=git-upload-pack\n0000".to_vec())
        }

        async fn upload_pack(&self, body: &[u8]) -> Result<Vec<u8>, GitTransportError> {
            *self.last_upload_body.lock().await = body.to_vec();
            Ok(b"PACKDATA".to_vec())
        }

        async fn receive_pack(
            &self,
            _body: &[u8],
        ) -> Result<(Vec<u8>, Vec<PushEvent>), GitTransportError> {
            self.receive_packs.fetch_add(1, Ordering::SeqCst);
            Ok((b"unpack ok".to_vec(), self.events.clone()))
        }
    }

    struct MockResolver {
        transport: Arc<MockTransport>,
        opened: AtomicUsize,
    }

    #[async_trait]
    impl RepoStorageResolver for MockResolver {
        async fn open(&self, _repo: &str) -> Result<Arc<dyn RepoTransport>, GitTransportError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::clone(&self.transport) as Arc<dyn RepoTransport>)
        }
    }

    struct RecordingHook {
        seen: Mutex<Vec<Vec<PushEvent>>>,
    }

    #[async_trait]
    impl PostPushHook for RecordingHook {
        fn name(&self) -> &str {
            "recording"
        }

        async fn on_push(&self, _op: &ReceivePackOp, events: &[PushEvent]) -> anyhow::Result<()> {
            self.seen.lock().await.push(events.to_vec());
            Ok(())
        }
    }

    struct FailingHook;

    #[async_trait]
    impl PostPushHook for FailingHook {
        fn name(&self) -> &str {
            "failing"
        }

        async fn on_push(&self, _op: &ReceivePackOp, _events: &[PushEvent]) -> anyhow::Result<()> {
            anyhow::bail!("downstream unavailable")
        }
    }

    fn event(ref_name: &str) -> PushEvent {
        PushEvent {
            ref_name: ref_name.to_string(),
            old: "a".repeat(40),
            new: "b".repeat(40),
            kind: PushEventKind::Update,
        }
    }

    fn gate(source: AuthSource) -> AccessGate {
        AccessGate::from_parts(
            AuthConfig {
                source,
                restrict_write_access: false,
            },
            FederationConfig::default(),
        )
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Services::mock(
            Arc::new(MockUserService::new()),
            Arc::new(MockPermissionService::new(false)),
        ))
    }

    fn service_with(
        source: AuthSource,
        events: Vec<PushEvent>,
    ) -> (GitTransportService, Arc<MockTransport>, Arc<MockResolver>) {
        let transport = Arc::new(MockTransport::new(events));
        let resolver = Arc::new(MockResolver {
            transport: Arc::clone(&transport),
            opened: AtomicUsize::new(0),
        });
        let service = GitTransportService::new(
            gate(source),
            Arc::clone(&resolver) as Arc<dyn RepoStorageResolver>,
        );
        (service, transport, resolver)
    }

    #[tokio::test]
    async fn denied_push_never_touches_storage_or_hooks() {
        let (mut service, transport, resolver) =
            service_with(AuthSource::Local, vec![event("refs/heads/main")]);
        let hook = Arc::new(RecordingHook {
            seen: Mutex::new(Vec::new()),
        });
        service.register_post_push_hook(Arc::clone(&hook) as Arc<dyn PostPushHook>);

        let err = service
            .receive_pack(&ctx(), "github.com/o/r", b"body".to_vec(), None)
            .await
            .expect_err("anonymous actor denied");

        assert!(matches!(
            err,
            GitTransportError::Access(AccessError::Unauthenticated { .. })
        ));
        assert_eq!(resolver.opened.load(Ordering::SeqCst), 0);
        assert_eq!(transport.receive_packs.load(Ordering::SeqCst), 0);
        assert!(hook.seen.lock().await.is_empty());
    }

    #[tokio::test]
    async fn hooks_see_deduplicated_events_once() {
        let a = event("refs/heads/a");
        let b = event("refs/heads/b");
        let (mut service, _transport, _resolver) = service_with(
            AuthSource::Local,
            vec![a.clone(), a.clone(), b.clone(), b.clone(), a.clone()],
        );
        let hook = Arc::new(RecordingHook {
            seen: Mutex::new(Vec::new()),
        });
        service.register_post_push_hook(Arc::clone(&hook) as Arc<dyn PostPushHook>);

        let ctx = ctx().with_actor(Actor::with_scopes(["internal:cli"]));
        let response = service
            .receive_pack(&ctx, "github.com/o/r", b"body".to_vec(), None)
            .await
            .expect("push accepted");
        assert_eq!(response, b"unpack ok");

        let seen = hook.seen.lock().await;
        assert_eq!(seen.len(), 1, "hook runs exactly once");
        assert_eq!(seen[0], vec![a, b, event("refs/heads/a")]);
    }

    #[tokio::test]
    async fn hook_failure_is_not_a_transport_error() {
        let (mut service, _transport, _resolver) =
            service_with(AuthSource::Local, vec![event("refs/heads/main")]);
        let recording = Arc::new(RecordingHook {
            seen: Mutex::new(Vec::new()),
        });
        service.register_post_push_hook(Arc::new(FailingHook));
        service.register_post_push_hook(Arc::clone(&recording) as Arc<dyn PostPushHook>);

        let ctx = ctx().with_actor(Actor::with_scopes(["internal:cli"]));
        service
            .receive_pack(&ctx, "github.com/o/r", b"body".to_vec(), None)
            .await
            .expect("hook failures stay invisible");

        // Later hooks still ran.
        assert_eq!(recording.seen.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn info_refs_is_unauthenticated_friendly() {
        let (service, _transport, _resolver) = service_with(AuthSource::Local, Vec::new());
        let bytes = service
            .info_refs(&ctx(), "github.com/o/r", GitService::UploadPack)
            .await
            .expect("reads need no actor");
        assert!(bytes.starts_with(b"001e# service="));
    }

    #[tokio::test]
    async fn upload_pack_honors_gzip_symmetrically() {
        let (service, transport, _resolver) = service_with(AuthSource::None, Vec::new());

        let want = b"0032want 0123456789012345678901234567890123456789\n".to_vec();
        let encoded = super::encoding::encode_body(Some(ContentEncoding::Gzip), want.clone())
            .expect("encode request");

        let response = service
            .upload_pack(&ctx(), "github.com/o/r", encoded, Some("gzip"))
            .await
            .expect("fetch");

        // The transport saw the decoded body, and the response came back
        // encoded.
        assert_eq!(*transport.last_upload_body.lock().await, want);
        let decoded = super::encoding::decode_body(Some(ContentEncoding::Gzip), response)
            .expect("decode response");
        assert_eq!(decoded, b"PACKDATA");
    }

    #[tokio::test]
    async fn unknown_encoding_is_rejected_before_storage() {
        let (service, _transport, resolver) = service_with(AuthSource::None, Vec::new());
        let err = service
            .upload_pack(&ctx(), "github.com/o/r", Vec::new(), Some("zstd"))
            .await
            .expect_err("unsupported encoding");
        assert!(matches!(err, GitTransportError::InvalidRequest { .. }));
        assert_eq!(resolver.opened.load(Ordering::SeqCst), 0);
    }
}
