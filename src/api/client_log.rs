use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use aide::axum::routing::post_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::Json;
use log::{error, warn};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::authorization::{AuthorizationPipeline, GuardOutcome};
use crate::endpoints::{EndpointTable, Operation};
use crate::error::{HandlerNotFoundError, HandlerResult};
use crate::request_state::RequestAuthorization;

use super::WebServiceResponse;

pub const MODULE_NAME: &str = "LogModule";

pub type LogHandler = Arc<dyn Fn(Vec<String>) -> HandlerResult<()> + Send + Sync>;

/// See https://developer.apple.com/documentation/walletpasses/logentries
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct LogEntries {
    pub logs: Vec<String>,
}

#[derive(Default, Clone)]
pub struct LogOptions {
    on_incoming_log: Option<LogHandler>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// See https://developer.apple.com/documentation/walletpasses/log_a_message
    pub fn on_incoming_log<F>(mut self, handler: F) -> Self
    where
        F: Fn(Vec<String>) -> HandlerResult<()> + Send + Sync + 'static,
    {
        self.on_incoming_log = Some(Arc::new(handler));
        self
    }
}

struct LogModule {
    on_incoming_log: LogHandler,
    guards: AuthorizationPipeline,
}

pub fn router(table: &EndpointTable, options: LogOptions) -> Result<ApiRouter, HandlerNotFoundError> {
    let on_incoming_log = options
        .on_incoming_log
        .ok_or_else(|| HandlerNotFoundError::new("onIncomingLog", MODULE_NAME))?;

    let endpoint = table.endpoint(Operation::Log);
    let module = Arc::new(LogModule {
        on_incoming_log,
        guards: AuthorizationPipeline::for_endpoint(table, endpoint, None),
    });

    Ok(ApiRouter::new()
        .api_route(endpoint.path, post_with(log_messages, log_messages_docs))
        .with_state(module))
}

/// Logging
///
/// POST /v1/log
/// JSON payload: { "logs" : [ <log message>, ... ] }
///
/// The handler runs inline, its outcome never changes the `200`.
async fn log_messages(
    State(module): State<Arc<LogModule>>,
    authorization: RequestAuthorization,
    Json(entries): Json<LogEntries>,
) -> WebServiceResponse {
    if let GuardOutcome::Reject(status) = module.guards.run(&authorization).await {
        return WebServiceResponse::Rejected(status);
    }

    match catch_unwind(AssertUnwindSafe(|| (module.on_incoming_log)(entries.logs))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("onIncomingLog failed: {e:#}"),
        Err(_) => error!("onIncomingLog panicked"),
    }

    WebServiceResponse::Ok
}

fn log_messages_docs(op: TransformOperation) -> TransformOperation {
    op.description("Record diagnostic messages sent by the wallet client.")
        .tag("log")
        .response_with::<200, (), _>(|res| res.description("The messages were handed to the log handler."))
}
