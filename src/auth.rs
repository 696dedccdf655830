use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::Role,
    repository::RepositoryState,
};

/// Claims
///
/// The payload structure expected inside a JSON Web Token issued by the
/// session collaborator. Claims are signed by the server's secret and
/// validated upon every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user, used to fetch the profile row
    /// carrying the current role and department.
    pub sub: Uuid,
    /// Expiration Time (exp): timestamp after which the JWT must not be accepted.
    pub exp: usize,
    /// Issued At (iat): timestamp when the JWT was issued.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved principal of an authenticated request: identity, role, and the
/// department the role is bound to. Created at authentication, immutable for
/// the request's lifetime. Handlers use this struct for every scope derivation
/// and mutation guard.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    /// `None` only for ADMIN accounts, which are not bound to a department.
    pub department_id: Option<Uuid>,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler, and keeping authentication
/// cleanly separated from handler business logic.
///
/// The flow:
/// 1. Dependency resolution: Repository and AppConfig from the shared state.
/// 2. Local bypass: development-time access via the `x-user-id` header,
///    available only when running under `Env::Local`.
/// 3. Token validation: standard Bearer extraction and JWT decoding.
/// 4. DB lookup: the user's current role and department are re-read on every
///    request, so a deleted or re-roled account takes effect immediately.
///
/// Rejection: StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local Development Bypass Check.
        // The UUID in the header must still map to an actual profile row so
        // that role and department are loaded correctly.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        if let Ok(Some(user)) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                role: user.role,
                                department_id: user.department_id,
                            });
                        }
                    }
                }
            }
        }
        // In Production, or if the bypass failed, fall through to JWT validation.

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => match e.kind() {
                // Expired tokens are the common failure for a valid-but-old session.
                ErrorKind::ExpiredSignature => return Err(StatusCode::UNAUTHORIZED),
                // Bad signature, malformed token, etc.
                _ => return Err(StatusCode::UNAUTHORIZED),
            },
        };

        // Final verification: the token subject must still exist. This also
        // picks up the authoritative role/department for scope derivation.
        // A storage failure here is a server fault, not a bad credential.
        let user = repo
            .get_user(token_data.claims.sub)
            .await
            .map_err(|e| {
                tracing::error!("profile lookup failed during auth: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
            department_id: user.department_id,
        })
    }
}
