use std::panic::AssertUnwindSafe;

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{error, info, warn};

use crate::endpoints::{EndpointTable, Operation};
use crate::error::{HandlerNotFoundError, HandlerResult};

pub mod client_log;
pub mod list;
pub mod registration;
mod response;
pub mod update;


pub use client_log::{LogEntries, LogOptions};
pub use list::{ListFilters, ListOptions, SerialNumbers};
pub use registration::{PushTokenPayload, RegistrationOptions};
pub use response::WebServiceResponse;
pub use update::UpdateOptions;

/// Wait for a handler whose outcome never reaches the client.
///
/// Failures and panics are logged and swallowed, the caller answers `200` in any case.
pub(crate) async fn settle_fire_and_forget(
    handler: &'static str,
    future: BoxFuture<'static, HandlerResult<()>>,
) {
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("{handler} failed: {e:#}"),
        Err(_) => error!("{handler} panicked"),
    }
}

/// Failed authorization answers with the status pinned by the endpoint
/// table, so both possible pins are documented.
pub(crate) fn unauthorized_responses(op: TransformOperation) -> TransformOperation {
    op.response_with::<401, (), _>(|res| {
        res.description("Missing, malformed or rejected authorization (default pin).")
    })
    .response_with::<403, (), _>(|res| {
        res.description("Missing, malformed or rejected authorization, for tables pinned to 403.")
    })
}

/// Composition of the protocol modules a deployment enables.
///
/// Only configured modules are installed. Building the router fails as a
/// whole when one of them lacks a required handler.
pub struct WebService {
    table: EndpointTable,
    registration: Option<RegistrationOptions>,
    update: Option<UpdateOptions>,
    list: Option<ListOptions>,
    log: Option<LogOptions>,
}

impl WebService {
    pub fn new(table: EndpointTable) -> Self {
        Self {
            table,
            registration: None,
            update: None,
            list: None,
            log: None,
        }
    }

    pub fn registration(mut self, options: RegistrationOptions) -> Self {
        self.registration = Some(options);
        self
    }

    pub fn update(mut self, options: UpdateOptions) -> Self {
        self.update = Some(options);
        self
    }

    pub fn list(mut self, options: ListOptions) -> Self {
        self.list = Some(options);
        self
    }

    pub fn log(mut self, options: LogOptions) -> Self {
        self.log = Some(options);
        self
    }

    pub fn table(&self) -> &EndpointTable {
        &self.table
    }

    pub fn router(self) -> Result<ApiRouter, HandlerNotFoundError> {
        let mut router = ApiRouter::new();
        let mut installed = Vec::new();

        if let Some(options) = self.registration {
            router = router.merge(registration::router(&self.table, options)?);
            installed.extend([Operation::Register, Operation::Unregister]);
        }

        if let Some(options) = self.update {
            router = router.merge(update::router(&self.table, options)?);
            installed.push(Operation::Update);
        }

        if let Some(options) = self.list {
            router = router.merge(list::router(&self.table, options)?);
            installed.push(Operation::ListUpdatable);
        }

        if let Some(options) = self.log {
            router = router.merge(client_log::router(&self.table, options)?);
            installed.push(Operation::Log);
        }

        for endpoint in self
            .table
            .iter()
            .filter(|endpoint| installed.contains(&endpoint.operation))
        {
            info!(
                "Added route {} {} ({}, auth: {})",
                endpoint.method, endpoint.path, endpoint.operation, endpoint.requires_auth
            );
        }

        Ok(router)
    }
}
