use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Milvus Console API",
        version = "0.1.0",
        description = "Collection management, record browsing and similarity search over Milvus"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/milvus", api = domain_milvus::MilvusApiDoc)
    )
)]
pub struct ApiDoc;
