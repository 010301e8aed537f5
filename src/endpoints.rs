use axum::http::{Method, StatusCode};

use crate::error::UnsupportedStatusError;

/// MIME type of a signed pass archive.
pub const PASS_CONTENT_TYPE: &str = "application/vnd.apple.pkpass";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Operations of the pass update web service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Register,
    Unregister,
    Update,
    ListUpdatable,
    Log,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::Unregister => "unregister",
            Operation::Update => "update",
            Operation::ListUpdatable => "listUpdatable",
            Operation::Log => "log",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDefinition {
    pub operation: Operation,
    /// Path template, placeholders are written as `:name`.
    pub path: &'static str,
    pub method: Method,
    pub path_params: &'static [&'static str],
    pub requires_auth: bool,
    pub content_type: Option<&'static str>,
}

impl EndpointDefinition {
    /// Placeholder names in the order they appear in the path template.
    pub fn placeholders(&self) -> impl Iterator<Item = &'static str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
    }
}

/// Endpoints of one protocol version together with its authorization pins.
///
/// Built once while composing the router and passed around by reference.
#[derive(Debug, Clone)]
pub struct EndpointTable {
    version: &'static str,
    auth_scheme: &'static str,
    unauthorized_status: StatusCode,
    register: EndpointDefinition,
    unregister: EndpointDefinition,
    update: EndpointDefinition,
    list_updatable: EndpointDefinition,
    log: EndpointDefinition,
}

impl EndpointTable {
    /// Version 1 of the wallet pass web service.
    ///
    /// See https://developer.apple.com/documentation/walletpasses/adding_a_web_service_to_update_passes
    pub fn v1() -> Self {
        Self {
            version: "v1",
            auth_scheme: "ApplePass",
            unauthorized_status: StatusCode::UNAUTHORIZED,
            register: EndpointDefinition {
                operation: Operation::Register,
                path: "/v1/devices/:deviceLibraryIdentifier/registrations/:passTypeIdentifier/:serialNumber",
                method: Method::POST,
                path_params: &["deviceLibraryIdentifier", "passTypeIdentifier", "serialNumber"],
                requires_auth: true,
                content_type: None,
            },
            unregister: EndpointDefinition {
                operation: Operation::Unregister,
                path: "/v1/devices/:deviceLibraryIdentifier/registrations/:passTypeIdentifier/:serialNumber",
                method: Method::DELETE,
                path_params: &["deviceLibraryIdentifier", "passTypeIdentifier", "serialNumber"],
                requires_auth: true,
                content_type: None,
            },
            update: EndpointDefinition {
                operation: Operation::Update,
                path: "/v1/passes/:passTypeIdentifier/:serialNumber",
                method: Method::GET,
                path_params: &["passTypeIdentifier", "serialNumber"],
                requires_auth: true,
                content_type: Some(PASS_CONTENT_TYPE),
            },
            list_updatable: EndpointDefinition {
                operation: Operation::ListUpdatable,
                path: "/v1/devices/:deviceLibraryIdentifier/registrations/:passTypeIdentifier",
                method: Method::POST,
                path_params: &["deviceLibraryIdentifier", "passTypeIdentifier"],
                requires_auth: false,
                content_type: Some(JSON_CONTENT_TYPE),
            },
            log: EndpointDefinition {
                operation: Operation::Log,
                path: "/v1/log",
                method: Method::POST,
                path_params: &[],
                requires_auth: false,
                content_type: None,
            },
        }
    }

    /// Pin a different status for failed authorization. Only `401` and
    /// `403` are accepted.
    pub fn with_unauthorized_status(
        mut self,
        status: StatusCode,
    ) -> Result<Self, UnsupportedStatusError> {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                self.unauthorized_status = status;
                Ok(self)
            }
            _ => Err(UnsupportedStatusError(status.as_u16())),
        }
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn auth_scheme(&self) -> &'static str {
        self.auth_scheme
    }

    pub fn unauthorized_status(&self) -> StatusCode {
        self.unauthorized_status
    }

    pub fn endpoint(&self, operation: Operation) -> &EndpointDefinition {
        match operation {
            Operation::Register => &self.register,
            Operation::Unregister => &self.unregister,
            Operation::Update => &self.update,
            Operation::ListUpdatable => &self.list_updatable,
            Operation::Log => &self.log,
        }
    }

    /// All endpoints in table order.
    pub fn iter(&self) -> impl Iterator<Item = &EndpointDefinition> {
        [
            &self.register,
            &self.unregister,
            &self.update,
            &self.list_updatable,
            &self.log,
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_covers_every_operation() {
        let table = EndpointTable::v1();
        let operations = table.iter().map(|e| e.operation).collect::<Vec<_>>();

        assert_eq!(
            operations,
            vec![
                Operation::Register,
                Operation::Unregister,
                Operation::Update,
                Operation::ListUpdatable,
                Operation::Log,
            ]
        );
    }

    #[test]
    fn test_path_params_match_placeholders() {
        for endpoint in EndpointTable::v1().iter() {
            let placeholders = endpoint.placeholders().collect::<Vec<_>>();
            assert_eq!(placeholders, endpoint.path_params, "{}", endpoint.operation);
        }
    }

    #[test]
    fn test_v1_auth_pins() {
        let table = EndpointTable::v1();
        assert_eq!(table.auth_scheme(), "ApplePass");
        assert_eq!(table.unauthorized_status(), StatusCode::UNAUTHORIZED);

        let table = table.with_unauthorized_status(StatusCode::FORBIDDEN).unwrap();
        assert_eq!(table.unauthorized_status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_unauthorized_status_must_reject() {
        for status in [StatusCode::OK, StatusCode::NO_CONTENT, StatusCode::NOT_FOUND] {
            let error = EndpointTable::v1()
                .with_unauthorized_status(status)
                .unwrap_err();
            assert_eq!(error, UnsupportedStatusError(status.as_u16()));
        }

        let table = EndpointTable::v1()
            .with_unauthorized_status(StatusCode::UNAUTHORIZED)
            .unwrap();
        assert_eq!(table.unauthorized_status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_v1_auth_requirements() {
        let table = EndpointTable::v1();

        assert!(table.endpoint(Operation::Register).requires_auth);
        assert!(table.endpoint(Operation::Unregister).requires_auth);
        assert!(table.endpoint(Operation::Update).requires_auth);
        assert!(!table.endpoint(Operation::ListUpdatable).requires_auth);
        assert!(!table.endpoint(Operation::Log).requires_auth);

        assert_eq!(
            table.endpoint(Operation::Update).content_type,
            Some(PASS_CONTENT_TYPE)
        );
    }
}
