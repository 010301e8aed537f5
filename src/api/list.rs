use std::future::Future;
use std::sync::Arc;

use aide::axum::routing::post_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Path, Query, State};
use axum::Json;
use futures::future::BoxFuture;
use futures::FutureExt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::authorization::{AuthorizationPipeline, GuardOutcome};
use crate::endpoints::{EndpointTable, Operation};
use crate::error::{HandlerNotFoundError, HandlerResult, ServiceResult};
use crate::request_state::RequestAuthorization;

use super::WebServiceResponse;

pub const MODULE_NAME: &str = "ListModule";

/// See https://developer.apple.com/documentation/walletpasses/serialnumbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SerialNumbers {
    pub serial_numbers: Vec<String>,
    /// Tag describing the modification time of the returned passes. Clients
    /// send it back as `previousLastUpdated`.
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub previous_last_updated: Option<String>,
}

/// Called with `(deviceLibraryIdentifier, passTypeIdentifier, filters)`.
/// `None` means there is nothing to update.
pub type ListHandler = Arc<
    dyn Fn(String, String, ListFilters) -> BoxFuture<'static, HandlerResult<Option<SerialNumbers>>>
        + Send
        + Sync,
>;

#[derive(Default, Clone)]
pub struct ListOptions {
    on_list_retrieve: Option<ListHandler>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// See https://developer.apple.com/documentation/walletpasses/get_the_list_of_updatable_passes
    pub fn on_list_retrieve<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(String, String, ListFilters) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Option<SerialNumbers>>> + Send + 'static,
    {
        self.on_list_retrieve = Some(Arc::new(move |device_id, pass_type_id, filters| {
            handler(device_id, pass_type_id, filters).boxed()
        }));
        self
    }
}

struct ListModule {
    on_list_retrieve: ListHandler,
    guards: AuthorizationPipeline,
}

pub fn router(table: &EndpointTable, options: ListOptions) -> Result<ApiRouter, HandlerNotFoundError> {
    let on_list_retrieve = options
        .on_list_retrieve
        .ok_or_else(|| HandlerNotFoundError::new("onListRetrieve", MODULE_NAME))?;

    let endpoint = table.endpoint(Operation::ListUpdatable);
    let module = Arc::new(ListModule {
        on_list_retrieve,
        guards: AuthorizationPipeline::for_endpoint(table, endpoint, None),
    });

    Ok(ApiRouter::new()
        .api_route(
            endpoint.path,
            post_with(list_updatable_passes, list_updatable_passes_docs),
        )
        .with_state(module))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListPath {
    pub device_library_identifier: String,
    pub pass_type_identifier: String,
}

/// Apple's documentation names the tag `passesUpdatedSince`, the protocol
/// sends `previousLastUpdated`. Both are accepted, `previousLastUpdated` wins.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub previous_last_updated: Option<String>,
    pub passes_updated_since: Option<String>,
}

impl From<ListQuery> for ListFilters {
    fn from(query: ListQuery) -> Self {
        let non_empty = |tag: &String| !tag.is_empty();

        Self {
            previous_last_updated: query
                .previous_last_updated
                .filter(non_empty)
                .or_else(|| query.passes_updated_since.filter(non_empty)),
        }
    }
}

/// Updatable passes
///
/// POST /v1/devices/{deviceLibraryIdentifier}/registrations/{passTypeIdentifier}
/// POST /v1/devices/{deviceLibraryIdentifier}/registrations/{passTypeIdentifier}?previousLastUpdated=<tag>
///
/// server response:
/// --> if the handler returns serial numbers: 200, with JSON payload: { "lastUpdated" : <new tag>, "serialNumbers" : [ <array of serial #s> ] }
/// --> if the handler returns nothing: 204
async fn list_updatable_passes(
    State(module): State<Arc<ListModule>>,
    authorization: RequestAuthorization,
    Path(path): Path<ListPath>,
    Query(query): Query<ListQuery>,
) -> ServiceResult<WebServiceResponse> {
    if let GuardOutcome::Reject(status) = module.guards.run(&authorization).await {
        return Ok(WebServiceResponse::Rejected(status));
    }

    let retrieved = (module.on_list_retrieve)(
        path.device_library_identifier,
        path.pass_type_identifier,
        query.into(),
    )
    .await?;

    Ok(match retrieved {
        Some(list) => WebServiceResponse::SerialNumbers(list),
        None => WebServiceResponse::NoContent,
    })
}

fn list_updatable_passes_docs(op: TransformOperation) -> TransformOperation {
    op.description("List the serial numbers of passes updated since the given tag.")
        .tag("registrations")
        .response::<200, Json<SerialNumbers>>()
        .response_with::<204, (), _>(|res| res.description("There are no updated passes."))
}
