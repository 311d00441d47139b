//! gRPC transport for the audit log batch service.
//!
//! Requires the `grpc` feature. Uses tonic for the server and prost for
//! message serialization (standard protobuf wire format, no `.proto` file).
//!
//! ## RPCs
//!
//! - `List` - up to 65 audit records keyed by ID.
//! - `Delete` - remove 1 to 64 audit records atomically.
//!
//! Errors map to `INVALID_ARGUMENT` (do not retry) and `UNAVAILABLE`
//! (retry with backoff).
//!
//! ## Example
//!
//! ```ignore
//! let kv = InMemoryKv::new();
//! let service = Arc::new(AuditBatchService::new(KvAuditLogStore::new(kv.clone()), kv));
//!
//! // Compose with other tonic routes
//! let grpc_svc = configkv::grpc::grpc_server(service.clone());
//!
//! // Or serve directly
//! configkv::grpc::serve_grpc(service, "[::1]:50051".parse()?).await?;
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tonic::{Code, Request, Response, Status};

use crate::audit::{AuditBatchService, AuditLogProto, AuditLogStore, ServiceError};
use crate::kv::Txner;

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListResponse {
    #[prost(map = "string, message", tag = "1")]
    pub audit_logs: HashMap<String, AuditLogProto>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeleteRequest {
    #[prost(string, repeated, tag = "1")]
    pub audit_log_ids: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeleteResponse {}

// ---------------------------------------------------------------------------
// Generated service trait + server/client
// ---------------------------------------------------------------------------

include!(concat!(
    env!("OUT_DIR"),
    "/configkv.auditlog.AuditLogService.rs"
));

pub use audit_log_service_client::AuditLogServiceClient;
pub use audit_log_service_server::{AuditLogService, AuditLogServiceServer};

// ---------------------------------------------------------------------------
// Handler implementation
// ---------------------------------------------------------------------------

impl From<ServiceError> for Status {
    fn from(err: ServiceError) -> Self {
        let code = match err {
            ServiceError::InvalidArgument(_) => Code::InvalidArgument,
            ServiceError::Unavailable(_) => Code::Unavailable,
        };
        Status::new(code, err.to_string())
    }
}

/// gRPC handler wrapping a shared [`AuditBatchService`].
pub struct AuditLogGrpc<S, T> {
    service: Arc<AuditBatchService<S, T>>,
}

impl<S, T> AuditLogGrpc<S, T> {
    pub fn new(service: Arc<AuditBatchService<S, T>>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl<S, T> AuditLogService for AuditLogGrpc<S, T>
where
    S: AuditLogStore + 'static,
    T: Txner + 'static,
{
    async fn list(
        &self,
        _request: Request<ListRequest>,
    ) -> Result<Response<ListResponse>, Status> {
        let audit_logs = self
            .service
            .list()?
            .into_iter()
            .map(|(id, log)| (id.to_string(), log.to_wire()))
            .collect();

        Ok(Response::new(ListResponse { audit_logs }))
    }

    async fn delete(
        &self,
        request: Request<DeleteRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        let req = request.into_inner();
        self.service.delete(&req.audit_log_ids)?;
        Ok(Response::new(DeleteResponse {}))
    }
}

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

/// Create an `AuditLogServiceServer` from a shared service.
pub fn grpc_server<S, T>(
    service: Arc<AuditBatchService<S, T>>,
) -> AuditLogServiceServer<AuditLogGrpc<S, T>>
where
    S: AuditLogStore + 'static,
    T: Txner + 'static,
{
    AuditLogServiceServer::new(AuditLogGrpc::new(service))
}

/// Bind and serve the gRPC transport at `addr`.
pub async fn serve_grpc<S, T>(
    service: Arc<AuditBatchService<S, T>>,
    addr: SocketAddr,
) -> Result<(), tonic::transport::Error>
where
    S: AuditLogStore + 'static,
    T: Txner + 'static,
{
    tracing::info!(%addr, "serving audit log gRPC");
    tonic::transport::Server::builder()
        .add_service(grpc_server(service))
        .serve(addr)
        .await
}
