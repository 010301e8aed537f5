use std::sync::Arc;

use aide::{
    axum::{
        routing::{get, get_with},
        ApiRouter, IntoApiResponse,
    },
    openapi::{OpenApi, Tag},
    redoc::Redoc,
    transform::TransformOpenApi,
};
use axum::{response::IntoResponse, Extension, Json};

pub fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("PassKit web service")
        .summary("Update notifications for wallet passes")
        .description("Server side of the wallet pass update protocol. Storage, pass signing and push delivery are provided by the registered handlers.")
        .tag(Tag {
            name: "registrations".into(),
            description: Some("Device registrations for pass updates".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "passes".into(),
            description: Some("Pass delivery".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "log".into(),
            description: Some("Client diagnostics".into()),
            ..Default::default()
        })
        .security_scheme(
            "ApplePass",
            aide::openapi::SecurityScheme::ApiKey {
                location: aide::openapi::ApiKeyLocation::Header,
                name: "Authorization".into(),
                description: Some("`ApplePass <authenticationToken>` as embedded in the pass.".into()),
                extensions: Default::default(),
            },
        )
}

pub fn docs_routes() -> ApiRouter {
    // The redoc route infers its `text/html` response, the protocol routes
    // document their responses explicitly.
    aide::gen::infer_responses(true);

    let router = ApiRouter::new()
        .api_route(
            "/",
            get_with(
                Redoc::new("/docs/api.json")
                    .with_title("passkit-webservice")
                    .axum_handler(),
                |op| op.description("This documentation page."),
            ),
        )
        .route("/api.json", get(serve_docs));

    aide::gen::infer_responses(false);

    router
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_serve_api_json() {
        let mut api = OpenApi::default();
        let app = ApiRouter::new()
            .nest_api_service("/docs", docs_routes())
            .finish_api_with(&mut api, api_docs)
            .layer(Extension(Arc::new(api)));

        let response = app
            .oneshot(Request::get("/docs/api.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let api: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(api["info"]["title"], "PassKit web service");
        assert_eq!(
            api["components"]["securitySchemes"]["ApplePass"]["name"],
            "Authorization"
        );
    }
}
