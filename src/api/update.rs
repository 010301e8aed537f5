use std::future::Future;
use std::sync::Arc;

use aide::axum::routing::get_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use futures::future::BoxFuture;
use futures::FutureExt;
use log::debug;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::authorization::{AuthorizationPipeline, GuardOutcome, TokenVerifier};
use crate::endpoints::{EndpointTable, Operation};
use crate::error::{HandlerNotFoundError, HandlerResult, ServiceResult};
use crate::request_state::RequestAuthorization;

use super::{unauthorized_responses, WebServiceResponse};

pub const MODULE_NAME: &str = "UpdateModule";

/// Called with `(passTypeIdentifier, serialNumber)`, resolves to the pass archive.
pub type UpdateHandler =
    Arc<dyn Fn(String, String) -> BoxFuture<'static, HandlerResult<Vec<u8>>> + Send + Sync>;

#[derive(Default, Clone)]
pub struct UpdateOptions {
    on_update_request: Option<UpdateHandler>,
    token_verifier: Option<TokenVerifier>,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// See https://developer.apple.com/documentation/walletpasses/send_an_updated_pass
    pub fn on_update_request<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Vec<u8>>> + Send + 'static,
    {
        self.on_update_request = Some(Arc::new(move |pass_type_id, serial_number| {
            handler(pass_type_id, serial_number).boxed()
        }));
        self
    }

    /// Checked after the scheme guard, a `false` or an error rejects the request.
    pub fn token_verifier(mut self, verifier: TokenVerifier) -> Self {
        self.token_verifier = Some(verifier);
        self
    }
}

struct UpdateModule {
    on_update_request: UpdateHandler,
    guards: AuthorizationPipeline,
}

pub fn router(
    table: &EndpointTable,
    options: UpdateOptions,
) -> Result<ApiRouter, HandlerNotFoundError> {
    let on_update_request = options
        .on_update_request
        .ok_or_else(|| HandlerNotFoundError::new("onUpdateRequest", MODULE_NAME))?;

    let endpoint = table.endpoint(Operation::Update);
    let module = Arc::new(UpdateModule {
        on_update_request,
        guards: AuthorizationPipeline::for_endpoint(table, endpoint, options.token_verifier),
    });

    Ok(ApiRouter::new()
        .api_route(endpoint.path, get_with(send_updated_pass, send_updated_pass_docs))
        .with_state(module))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassPath {
    pub pass_type_identifier: String,
    pub serial_number: String,
}

/// Pass delivery
///
/// GET /v1/passes/{passTypeIdentifier}/{serialNumber}
/// Header: Authorization: ApplePass <authentication_token>
///
/// The archive returned by the handler is sent as is. A failing handler ends
/// up in the generic service error response.
async fn send_updated_pass(
    State(module): State<Arc<UpdateModule>>,
    authorization: RequestAuthorization,
    Path(path): Path<PassPath>,
) -> ServiceResult<WebServiceResponse> {
    if let GuardOutcome::Reject(status) = module.guards.run(&authorization).await {
        return Ok(WebServiceResponse::Rejected(status));
    }

    debug!(
        "Send updated pass {}/{}",
        path.pass_type_identifier, path.serial_number
    );

    let pass = (module.on_update_request)(path.pass_type_identifier, path.serial_number).await?;
    Ok(WebServiceResponse::Pass(pass))
}

fn send_updated_pass_docs(op: TransformOperation) -> TransformOperation {
    op.description("Send the latest version of a pass as `application/vnd.apple.pkpass`.")
        .tag("passes")
        .response_with::<200, (), _>(|res| res.description("The signed pass archive."))
        .with(unauthorized_responses)
        .security_requirement("ApplePass")
}
