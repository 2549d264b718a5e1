//! HTTP middleware for RBAC authorization
//!
//! [`PrincipalLoader`] resolves the caller from the `X-User-Id` header and
//! stores a [`Principal`] in the request extensions. [`PermissionGuard`]
//! then rejects the request before the handler runs unless the principal
//! holds the required permission codes.
//!
//! ```ignore
//! let guard = PermissionGuard::require(service.clone(), codes::STUDENT_VIEW);
//! let app = Router::new()
//!     .route("/students", get(list_students))
//!     .layer(from_fn_with_state(guard, PermissionGuard::enforce))
//!     .layer(from_fn_with_state(PrincipalLoader::new(service), PrincipalLoader::load));
//! ```

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    error::{RbacError, RbacResult},
    models::{Principal, RequestContext},
    service::RbacService,
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const BRANCH_ID_HEADER: &str = "x-branch-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// How a guard combines its permission codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Every code must be granted
    All(Vec<String>),
    /// At least one code must be granted
    Any(Vec<String>),
}

impl Requirement {
    pub fn codes(&self) -> &[String] {
        match self {
            Requirement::All(codes) | Requirement::Any(codes) => codes,
        }
    }
}

/// Route guard state for `axum::middleware::from_fn_with_state`
#[derive(Clone)]
pub struct PermissionGuard {
    service: RbacService,
    requirement: Requirement,
}

impl PermissionGuard {
    pub fn require(service: RbacService, permission_code: &str) -> Self {
        Self::require_all(service, &[permission_code])
    }

    pub fn require_any(service: RbacService, permission_codes: &[&str]) -> Self {
        Self {
            service,
            requirement: Requirement::Any(permission_codes.iter().map(|c| c.to_string()).collect()),
        }
    }

    pub fn require_all(service: RbacService, permission_codes: &[&str]) -> Self {
        Self {
            service,
            requirement: Requirement::All(permission_codes.iter().map(|c| c.to_string()).collect()),
        }
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Evaluate the requirement, auditing every code checked with the
    /// request details. A guard without codes denies everyone.
    pub async fn authorize(
        &self,
        principal: &Principal,
        branch_id: Option<i32>,
        ctx: &RequestContext,
    ) -> RbacResult<bool> {
        if self.requirement.codes().is_empty() {
            warn!(path = ?ctx.path, "Permission guard has no codes, denying");
            return Ok(false);
        }

        match &self.requirement {
            Requirement::All(codes) => {
                for code in codes {
                    if !self.service.check_permission(principal, code, branch_id, Some(ctx)).await? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Requirement::Any(codes) => {
                for code in codes {
                    if self.service.check_permission(principal, code, branch_id, Some(ctx)).await? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Middleware function for route-level authorization
    pub async fn enforce(State(guard): State<PermissionGuard>, request: Request, next: Next) -> Response {
        let Some(principal) = request.extensions().get::<Principal>().cloned() else {
            return AuthResponse::unauthorized();
        };

        let branch_id = match HttpAuthExtractor::extract_branch_id(request.headers()) {
            Ok(branch_id) => branch_id,
            Err(e) => return AuthResponse::bad_request(&e.to_string()),
        };

        let ctx = HttpAuthExtractor::request_context(&request);

        match guard.authorize(&principal, branch_id, &ctx).await {
            Ok(true) => next.run(request).await,
            Ok(false) if !principal.is_authenticated() => AuthResponse::unauthorized(),
            Ok(false) => {
                let required = guard.requirement.codes().join(", ");
                AuthResponse::forbidden(&RbacError::denied(principal.label(), required).to_string())
            }
            Err(e) => {
                error!(error = %e, path = ?ctx.path, "Permission check failed");
                AuthResponse::internal_error()
            }
        }
    }
}

/// Resolves `X-User-Id` into a [`Principal`] request extension
#[derive(Clone)]
pub struct PrincipalLoader {
    service: RbacService,
}

impl PrincipalLoader {
    pub fn new(service: RbacService) -> Self {
        Self { service }
    }

    /// Requests without the header continue as [`Principal::Anonymous`]
    pub async fn load(State(loader): State<PrincipalLoader>, mut request: Request, next: Next) -> Response {
        let principal = match HttpAuthExtractor::extract_user_id(request.headers()) {
            Ok(None) => Principal::Anonymous,
            Ok(Some(user_id)) => match loader.service.load_principal(user_id).await {
                Ok(principal) => principal,
                Err(e) if e.is_not_found() || e.is_permission_denied() => {
                    warn!(user_id, error = %e, "Rejected request principal");
                    return AuthResponse::unauthorized();
                }
                Err(e) => {
                    error!(user_id, error = %e, "Failed to load principal");
                    return AuthResponse::internal_error();
                }
            },
            Err(e) => return AuthResponse::bad_request(&e.to_string()),
        };

        request.extensions_mut().insert(principal);
        next.run(request).await
    }
}

/// A header that is present but not a valid id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {header} header")]
pub struct InvalidHeader {
    pub header: &'static str,
}

/// Helper functions for extracting context from HTTP headers
pub struct HttpAuthExtractor;

impl HttpAuthExtractor {
    pub fn extract_user_id(headers: &HeaderMap) -> Result<Option<i32>, InvalidHeader> {
        Self::id_header(headers, USER_ID_HEADER)
    }

    /// Branch scope for the check. A malformed value is an error rather
    /// than an unscoped check.
    pub fn extract_branch_id(headers: &HeaderMap) -> Result<Option<i32>, InvalidHeader> {
        Self::id_header(headers, BRANCH_ID_HEADER)
    }

    /// Client address from the connection, else the first forwarded hop
    pub fn extract_ip(request: &Request) -> Option<String> {
        if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
            return Some(addr.ip().to_string());
        }

        request
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
    }

    pub fn request_context(request: &Request) -> RequestContext {
        let ctx = RequestContext::default().with_path(request.uri().path());
        match Self::extract_ip(request) {
            Some(ip) => ctx.with_ip(ip),
            None => ctx,
        }
    }

    fn id_header(headers: &HeaderMap, header: &'static str) -> Result<Option<i32>, InvalidHeader> {
        let Some(value) = headers.get(header) else {
            return Ok(None);
        };

        value
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .map(Some)
            .ok_or(InvalidHeader { header })
    }
}

/// Response helpers for authorization errors
pub struct AuthResponse;

impl AuthResponse {
    pub fn unauthorized() -> Response {
        Self::json(StatusCode::UNAUTHORIZED, "Unauthorized", "Authentication required")
    }

    pub fn forbidden(message: &str) -> Response {
        Self::json(StatusCode::FORBIDDEN, "Forbidden", message)
    }

    pub fn bad_request(message: &str) -> Response {
        Self::json(StatusCode::BAD_REQUEST, "BadRequest", message)
    }

    pub fn internal_error() -> Response {
        Self::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            "InternalError",
            "Authorization could not be evaluated",
        )
    }

    fn json(status: StatusCode, error: &str, message: &str) -> Response {
        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}
