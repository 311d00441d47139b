fn main() {
    // Only run gRPC codegen when the "grpc" feature is enabled.
    if std::env::var("CARGO_FEATURE_GRPC").is_ok() {
        let service = tonic_build::manual::Service::builder()
            .name("AuditLogService")
            .package("configkv.auditlog")
            .method(
                tonic_build::manual::Method::builder()
                    .name("list")
                    .route_name("List")
                    .input_type("crate::grpc::ListRequest")
                    .output_type("crate::grpc::ListResponse")
                    .codec_path("tonic::codec::ProstCodec")
                    .build(),
            )
            .method(
                tonic_build::manual::Method::builder()
                    .name("delete")
                    .route_name("Delete")
                    .input_type("crate::grpc::DeleteRequest")
                    .output_type("crate::grpc::DeleteResponse")
                    .codec_path("tonic::codec::ProstCodec")
                    .build(),
            )
            .build();

        tonic_build::manual::Builder::new().compile(&[service]);
    }
}
