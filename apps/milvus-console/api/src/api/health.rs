use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use domain_milvus::{MilvusClient, MilvusService};

/// Ready when Milvus answers a collection listing.
pub async fn ready_handler<C: MilvusClient>(
    State(service): State<Arc<MilvusService<C>>>,
) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "milvus",
        Box::pin(async {
            service
                .client()
                .show_collections()
                .await
                .map(|_| ())
                .map_err(|e| e.to_string())
        }),
    )];

    match run_health_checks(checks).await {
        Ok(response) => response.into_response(),
        Err(response) => response.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ready_router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain_milvus::{MilvusConfig, MilvusRestClient};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_ready_reports_unreachable_milvus() {
        let config = MilvusConfig::new("127.0.0.1", 1).with_timeout(1);
        let client = MilvusRestClient::new(&config).unwrap();
        let app = ready_router(Arc::new(MilvusService::new(client)));

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "not ready");
        assert_eq!(body["milvus"], "disconnected");
    }
}
