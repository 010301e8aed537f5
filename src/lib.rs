//! Server side of the wallet pass update web service.
//!
//! The crate routes the protocol requests, checks their authorization and
//! calls the handlers a deployment registers. Storage, pass signing and push
//! delivery stay with those handlers.

pub mod api;
pub mod authorization;
pub mod docs;
pub mod endpoints;
pub mod error;
pub mod request_state;

pub use api::{
    ListFilters, ListOptions, LogEntries, LogOptions, RegistrationOptions, SerialNumbers,
    UpdateOptions, WebService, WebServiceResponse,
};
pub use authorization::{token_verifier, AuthorizationPipeline, GuardOutcome, GuardStage, TokenVerifier};
pub use endpoints::{EndpointDefinition, EndpointTable, Operation, PASS_CONTENT_TYPE};
pub use error::{
    HandlerError, HandlerNotFoundError, HandlerResult, ServiceError, ServiceResult,
    UnsupportedStatusError,
};
