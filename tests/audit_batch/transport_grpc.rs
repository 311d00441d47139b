//! gRPC transport integration tests.
//!
//! Starts a tonic server over a seeded backend and drives it with the
//! generated client.

use std::sync::Arc;

use configkv::audit::AuditLog;
use configkv::grpc::{AuditLogServiceClient, DeleteRequest, ListRequest};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::Code;

use crate::support::{seeded_service, stored_count, Service};

/// Bind to port 0, spawn the gRPC server, and return a connected client.
async fn start_server(service: Arc<Service>) -> AuditLogServiceClient<tonic::transport::Channel> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let grpc_svc = configkv::grpc::grpc_server(service);
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(grpc_svc)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    let endpoint = format!("http://{addr}");
    AuditLogServiceClient::connect(endpoint).await.unwrap()
}

#[tokio::test]
async fn list_returns_capped_wire_records() {
    let (_, service, ids) = seeded_service(100);
    let mut client = start_server(Arc::new(service)).await;

    let resp = client.list(ListRequest {}).await.unwrap().into_inner();
    assert_eq!(resp.audit_logs.len(), 65);

    for id in &ids[..65] {
        let proto = resp.audit_logs.get(id).expect("lowest IDs are listed");
        assert_eq!(proto.event_type, "CONFIG_CHANGED");
        assert_eq!(proto.schema_version, 1);
        assert!(proto.timestamp.ends_with('Z'));
        assert!(!proto.timestamp.contains('.'));

        let log = AuditLog::from_wire(proto.clone()).unwrap();
        assert_eq!(log.to_wire(), *proto);
    }
}

#[tokio::test]
async fn delete_removes_batch() {
    let (kv, service, ids) = seeded_service(10);
    let mut client = start_server(Arc::new(service)).await;

    client
        .delete(DeleteRequest {
            audit_log_ids: ids[..4].to_vec(),
        })
        .await
        .unwrap();

    assert_eq!(stored_count(&kv), 6);
    let resp = client.list(ListRequest {}).await.unwrap().into_inner();
    assert!(ids[..4].iter().all(|id| !resp.audit_logs.contains_key(id)));
}

#[tokio::test]
async fn empty_delete_is_invalid_argument() {
    let (_, service, _) = seeded_service(1);
    let mut client = start_server(Arc::new(service)).await;

    let status = client
        .delete(DeleteRequest {
            audit_log_ids: vec![],
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn oversized_delete_is_invalid_argument() {
    let (kv, service, ids) = seeded_service(65);
    let mut client = start_server(Arc::new(service)).await;

    let status = client
        .delete(DeleteRequest { audit_log_ids: ids })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(stored_count(&kv), 65);
}

#[tokio::test]
async fn backend_failure_is_unavailable() {
    let (kv, service, ids) = seeded_service(3);
    let mut client = start_server(Arc::new(service)).await;
    kv.fail_commits(true);

    let status = client
        .delete(DeleteRequest { audit_log_ids: ids })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
    assert_eq!(stored_count(&kv), 3);
}
