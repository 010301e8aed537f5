use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::warn;

use crate::endpoints::{EndpointDefinition, EndpointTable};
use crate::error::HandlerResult;
use crate::request_state::RequestAuthorization;

/// Externally supplied predicate deciding whether an authentication token is valid.
pub type TokenVerifier = Arc<dyn Fn(String) -> BoxFuture<'static, HandlerResult<bool>> + Send + Sync>;

/// Box an async token predicate into a [`TokenVerifier`].
pub fn token_verifier<F, Fut>(verifier: F) -> TokenVerifier
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<bool>> + Send + 'static,
{
    Arc::new(move |token| verifier(token).boxed())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Continue,
    Reject(StatusCode),
}

#[derive(Clone)]
pub enum GuardStage {
    /// Header must be `<scheme> <token>` with the pinned scheme and a non empty token.
    Scheme(&'static str),
    VerifyToken(TokenVerifier),
}

impl std::fmt::Debug for GuardStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardStage::Scheme(scheme) => f.debug_tuple("Scheme").field(scheme).finish(),
            GuardStage::VerifyToken(_) => f.write_str("VerifyToken"),
        }
    }
}

impl GuardStage {
    async fn check(&self, authorization: &RequestAuthorization) -> bool {
        match self {
            GuardStage::Scheme(scheme) => authorization
                .credentials()
                .map(|credentials| credentials.scheme == *scheme)
                .unwrap_or(false),
            GuardStage::VerifyToken(verifier) => {
                let token = match authorization.credentials() {
                    Some(credentials) => credentials.token.to_owned(),
                    None => return false,
                };

                match verifier(token).await {
                    Ok(true) => true,
                    Ok(false) => {
                        warn!("Token verification failed");
                        false
                    }
                    Err(e) => {
                        warn!("Token verification failed: {e:#}");
                        false
                    }
                }
            }
        }
    }
}

/// Ordered guard stages executed before a module handler.
///
/// Stages run one after another, the first failing stage ends the request
/// with the pipeline's unauthorized status.
#[derive(Debug, Clone)]
pub struct AuthorizationPipeline {
    stages: Vec<GuardStage>,
    unauthorized_status: StatusCode,
}

impl AuthorizationPipeline {
    pub fn new(unauthorized_status: StatusCode) -> Self {
        Self {
            stages: Vec::new(),
            unauthorized_status,
        }
    }

    /// Build the guards an endpoint asks for.
    ///
    /// Endpoints without `requires_auth` get an empty pipeline, the verifier
    /// is only consulted behind the scheme guard.
    pub fn for_endpoint(
        table: &EndpointTable,
        endpoint: &EndpointDefinition,
        verifier: Option<TokenVerifier>,
    ) -> Self {
        let mut pipeline = Self::new(table.unauthorized_status());

        if endpoint.requires_auth {
            pipeline = pipeline.stage(GuardStage::Scheme(table.auth_scheme()));

            if let Some(verifier) = verifier {
                pipeline = pipeline.stage(GuardStage::VerifyToken(verifier));
            }
        }

        pipeline
    }

    pub fn stage(mut self, stage: GuardStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[GuardStage] {
        &self.stages
    }

    pub async fn run(&self, authorization: &RequestAuthorization) -> GuardOutcome {
        for stage in &self.stages {
            if !stage.check(authorization).await {
                return GuardOutcome::Reject(self.unauthorized_status);
            }
        }

        GuardOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::endpoints::Operation;

    use super::*;

    fn header(value: &str) -> RequestAuthorization {
        RequestAuthorization(Some(value.to_owned()))
    }

    fn scheme_only() -> AuthorizationPipeline {
        AuthorizationPipeline::new(StatusCode::UNAUTHORIZED).stage(GuardStage::Scheme("ApplePass"))
    }

    #[tokio::test]
    async fn test_scheme_guard() {
        let pipeline = scheme_only();

        assert_eq!(
            pipeline.run(&header("ApplePass token")).await,
            GuardOutcome::Continue
        );
        assert_eq!(
            pipeline.run(&RequestAuthorization(None)).await,
            GuardOutcome::Reject(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            pipeline.run(&header("ApplePass")).await,
            GuardOutcome::Reject(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            pipeline.run(&header("ApplePass ")).await,
            GuardOutcome::Reject(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            pipeline.run(&header("Bearer token")).await,
            GuardOutcome::Reject(StatusCode::UNAUTHORIZED)
        );
    }

    #[tokio::test]
    async fn test_verifier_receives_token() {
        let pipeline = scheme_only().stage(GuardStage::VerifyToken(token_verifier(
            |token| async move { Ok(token == "secret") },
        )));

        assert_eq!(
            pipeline.run(&header("ApplePass secret")).await,
            GuardOutcome::Continue
        );
        assert_eq!(
            pipeline.run(&header("ApplePass other")).await,
            GuardOutcome::Reject(StatusCode::UNAUTHORIZED)
        );
    }

    #[tokio::test]
    async fn test_verifier_error_rejects() {
        let pipeline = scheme_only().stage(GuardStage::VerifyToken(token_verifier(|_| async {
            Err(anyhow::anyhow!("token store unavailable"))
        })));

        assert_eq!(
            pipeline.run(&header("ApplePass secret")).await,
            GuardOutcome::Reject(StatusCode::UNAUTHORIZED)
        );
    }

    #[tokio::test]
    async fn test_scheme_guard_runs_before_verifier() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let pipeline = scheme_only().stage(GuardStage::VerifyToken(token_verifier(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(true) }
        })));

        assert_eq!(
            pipeline.run(&RequestAuthorization(None)).await,
            GuardOutcome::Reject(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(
            pipeline.run(&header("ApplePass token")).await,
            GuardOutcome::Continue
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_for_endpoint() {
        let table = EndpointTable::v1()
            .with_unauthorized_status(StatusCode::FORBIDDEN)
            .unwrap();
        let verifier = token_verifier(|_| async { Ok(true) });

        let update = AuthorizationPipeline::for_endpoint(
            &table,
            table.endpoint(Operation::Update),
            Some(verifier.clone()),
        );
        assert_eq!(update.stages().len(), 2);
        assert!(matches!(update.stages()[0], GuardStage::Scheme("ApplePass")));
        assert!(matches!(update.stages()[1], GuardStage::VerifyToken(_)));
        assert_eq!(
            update.run(&RequestAuthorization(None)).await,
            GuardOutcome::Reject(StatusCode::FORBIDDEN)
        );

        let list = AuthorizationPipeline::for_endpoint(
            &table,
            table.endpoint(Operation::ListUpdatable),
            Some(verifier),
        );
        assert!(list.stages().is_empty());
        assert_eq!(
            list.run(&RequestAuthorization(None)).await,
            GuardOutcome::Continue
        );
    }
}
