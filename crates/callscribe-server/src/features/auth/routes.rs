//! Auth routes

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::commands::{
    login::handle as handle_login, register::handle as handle_register, LoginCommand, LoginError,
    RegisterCommand, RegisterError,
};
use super::queries::{me::handle as handle_profile, GetProfileError, GetProfileQuery};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::auth::AuthUser;
use crate::features::FeatureState;

/// Create auth routes
pub fn auth_routes() -> Router<FeatureState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

/// Register a new account
///
/// POST /auth/register
async fn register(
    State(state): State<FeatureState>,
    Json(command): Json<RegisterCommand>,
) -> Result<Response, AuthApiError> {
    let response = handle_register(state.db.clone(), &state.jwt, command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

/// Exchange credentials for a token
///
/// POST /auth/login
async fn login(
    State(state): State<FeatureState>,
    Json(command): Json<LoginCommand>,
) -> Result<Response, AuthApiError> {
    let response = handle_login(state.db.clone(), &state.jwt, command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// Current user's profile
///
/// GET /auth/me
async fn me(
    State(state): State<FeatureState>,
    user: AuthUser,
) -> Result<Response, AuthApiError> {
    let profile = handle_profile(state.db.clone(), GetProfileQuery { user_id: user.id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(profile))).into_response())
}

#[derive(Debug)]
enum AuthApiError {
    Register(RegisterError),
    Login(LoginError),
    Profile(GetProfileError),
}

impl From<RegisterError> for AuthApiError {
    fn from(err: RegisterError) -> Self {
        Self::Register(err)
    }
}

impl From<LoginError> for AuthApiError {
    fn from(err: LoginError) -> Self {
        Self::Login(err)
    }
}

impl From<GetProfileError> for AuthApiError {
    fn from(err: GetProfileError) -> Self {
        Self::Profile(err)
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        match self {
            AuthApiError::Register(RegisterError::NameValidation(_))
            | AuthApiError::Register(RegisterError::IdentifierValidation(_))
            | AuthApiError::Register(RegisterError::PasswordValidation(_)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            AuthApiError::Register(RegisterError::DuplicateIdentifier) => {
                let error = ErrorResponse::new("CONFLICT", self.to_string());
                (StatusCode::CONFLICT, Json(error)).into_response()
            },
            AuthApiError::Login(LoginError::InvalidCredentials) => {
                let error = ErrorResponse::new("UNAUTHORIZED", self.to_string());
                (StatusCode::UNAUTHORIZED, Json(error)).into_response()
            },
            AuthApiError::Profile(GetProfileError::NotFound) => {
                let error = ErrorResponse::new("NOT_FOUND", self.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            AuthApiError::Register(RegisterError::Auth(_))
            | AuthApiError::Register(RegisterError::Database(_))
            | AuthApiError::Login(LoginError::Auth(_))
            | AuthApiError::Login(LoginError::Database(_))
            | AuthApiError::Profile(GetProfileError::Database(_)) => {
                tracing::error!("Auth feature error: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

impl std::fmt::Display for AuthApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register(e) => write!(f, "{}", e),
            Self::Login(e) => write!(f, "{}", e),
            Self::Profile(e) => write!(f, "{}", e),
        }
    }
}
