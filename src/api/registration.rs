use std::future::Future;
use std::sync::Arc;

use aide::axum::routing::post_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use axum::Json;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::debug;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::authorization::{AuthorizationPipeline, GuardOutcome, TokenVerifier};
use crate::endpoints::{EndpointTable, Operation};
use crate::error::{HandlerNotFoundError, HandlerResult};
use crate::request_state::RequestAuthorization;

use super::{settle_fire_and_forget, unauthorized_responses, WebServiceResponse};

pub const MODULE_NAME: &str = "RegistrationModule";

/// Called with `(deviceLibraryIdentifier, passTypeIdentifier, serialNumber)`.
pub type RegistrationHandler =
    Arc<dyn Fn(String, String, String) -> BoxFuture<'static, HandlerResult<()>> + Send + Sync>;

fn registration_handler<F, Fut>(handler: F) -> RegistrationHandler
where
    F: Fn(String, String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    Arc::new(move |device_id, pass_type_id, serial_number| {
        handler(device_id, pass_type_id, serial_number).boxed()
    })
}

#[derive(Default, Clone)]
pub struct RegistrationOptions {
    on_register: Option<RegistrationHandler>,
    on_unregister: Option<RegistrationHandler>,
    token_verifier: Option<TokenVerifier>,
}

impl RegistrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// See https://developer.apple.com/documentation/walletpasses/register_a_pass_for_update_notifications
    pub fn on_register<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(String, String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        self.on_register = Some(registration_handler(handler));
        self
    }

    /// See https://developer.apple.com/documentation/walletpasses/unregister_a_pass_for_update_notifications
    pub fn on_unregister<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(String, String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        self.on_unregister = Some(registration_handler(handler));
        self
    }

    pub fn token_verifier(mut self, verifier: TokenVerifier) -> Self {
        self.token_verifier = Some(verifier);
        self
    }
}

struct RegistrationModule {
    on_register: RegistrationHandler,
    on_unregister: RegistrationHandler,
    register_guards: AuthorizationPipeline,
    unregister_guards: AuthorizationPipeline,
}

pub fn router(
    table: &EndpointTable,
    options: RegistrationOptions,
) -> Result<ApiRouter, HandlerNotFoundError> {
    let on_register = options
        .on_register
        .ok_or_else(|| HandlerNotFoundError::new("onRegister", MODULE_NAME))?;
    let on_unregister = options
        .on_unregister
        .ok_or_else(|| HandlerNotFoundError::new("onUnregister", MODULE_NAME))?;

    let register = table.endpoint(Operation::Register);
    let unregister = table.endpoint(Operation::Unregister);

    let module = Arc::new(RegistrationModule {
        on_register,
        on_unregister,
        register_guards: AuthorizationPipeline::for_endpoint(
            table,
            register,
            options.token_verifier.clone(),
        ),
        unregister_guards: AuthorizationPipeline::for_endpoint(
            table,
            unregister,
            options.token_verifier,
        ),
    });

    Ok(ApiRouter::new()
        .api_route(
            register.path,
            post_with(register_device, register_device_docs)
                .delete_with(unregister_device, unregister_device_docs),
        )
        .with_state(module))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPath {
    pub device_library_identifier: String,
    pub pass_type_identifier: String,
    pub serial_number: String,
}

/// See https://developer.apple.com/documentation/walletpasses/pushtoken
#[derive(Debug, Default, PartialEq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenPayload {
    #[serde(default)]
    pub push_token: Option<String>,
}

/// Registration
/// register a device to receive push notifications for a pass
///
/// POST /v1/devices/{deviceLibraryIdentifier}/registrations/{passTypeIdentifier}/{serialNumber}
/// Header: Authorization: ApplePass <authentication_token>
/// JSON payload: { "pushToken" : <push token> }
///
/// The push token is not part of the handler contract, it is only logged.
/// A missing or unreadable body counts as "no push token", so the guards
/// decide the status and not the body.
/// The client always gets a `200` once the guards pass, handler failures are
/// logged but never reported back.
async fn register_device(
    State(module): State<Arc<RegistrationModule>>,
    authorization: RequestAuthorization,
    Path(path): Path<RegistrationPath>,
    payload: Option<Json<PushTokenPayload>>,
) -> WebServiceResponse {
    if let GuardOutcome::Reject(status) = module.register_guards.run(&authorization).await {
        return WebServiceResponse::Rejected(status);
    }

    debug!(
        "Register device {} for {}/{} (push token present: {})",
        path.device_library_identifier,
        path.pass_type_identifier,
        path.serial_number,
        payload.and_then(|Json(payload)| payload.push_token).is_some()
    );

    settle_fire_and_forget(
        "onRegister",
        (module.on_register)(
            path.device_library_identifier,
            path.pass_type_identifier,
            path.serial_number,
        ),
    )
    .await;

    WebServiceResponse::Ok
}

fn register_device_docs(op: TransformOperation) -> TransformOperation {
    op.description("Register a device to receive push notifications for a pass.")
        .tag("registrations")
        .response_with::<200, (), _>(|res| res.description("The request was handed to the registration handler."))
        .with(unauthorized_responses)
        .security_requirement("ApplePass")
}

/// Unregister
/// unregister a device to receive push notifications for a pass
///
/// DELETE /v1/devices/{deviceLibraryIdentifier}/registrations/{passTypeIdentifier}/{serialNumber}
/// Header: Authorization: ApplePass <authentication_token>
async fn unregister_device(
    State(module): State<Arc<RegistrationModule>>,
    authorization: RequestAuthorization,
    Path(path): Path<RegistrationPath>,
) -> WebServiceResponse {
    if let GuardOutcome::Reject(status) = module.unregister_guards.run(&authorization).await {
        return WebServiceResponse::Rejected(status);
    }

    settle_fire_and_forget(
        "onUnregister",
        (module.on_unregister)(
            path.device_library_identifier,
            path.pass_type_identifier,
            path.serial_number,
        ),
    )
    .await;

    WebServiceResponse::Ok
}

fn unregister_device_docs(op: TransformOperation) -> TransformOperation {
    op.description("Unregister a device from push notifications for a pass.")
        .tag("registrations")
        .response_with::<200, (), _>(|res| res.description("The request was handed to the unregistration handler."))
        .with(unauthorized_responses)
        .security_requirement("ApplePass")
}
