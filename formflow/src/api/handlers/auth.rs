use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    api::models::{
        auth::{
            AuthResponse, AuthSuccessResponse, ChangePasswordRequest, LoginRequest, LoginResponse, LogoutResponse,
            PasswordStrengthRequest, RegisterRequest, RegisterResponse, SessionResponse,
        },
        users::CurrentUser,
    },
    auth::{password, session},
    db::{
        handlers::{OrganizationSettings, Profiles, Subscriptions, Users},
        models::{profiles::ProfileCreateDBRequest, users::UserCreateDBRequest},
    },
    errors::Error,
    validation::{PasswordStrength, password_strength, require_email, validate_password},
};

fn required(value: &str, label: &str) -> Result<String, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::BadRequest {
            message: format!("{label} is required"),
        });
    }
    Ok(value.to_string())
}

fn start_session(user: CurrentUser, status: StatusCode, message: &str, state: &AppState) -> Result<SessionResponse<AuthResponse>, Error> {
    let token = session::create_session_token(&user, &state.config)?;
    let cookie = session::session_cookie(&token, &state.config);
    Ok(SessionResponse {
        status,
        body: AuthResponse {
            user,
            message: message.to_string(),
            token,
        },
        cookie,
    })
}

/// Register a new organization account
#[utoipa::path(
    post,
    path = "/authentication/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "Account created and session started", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "An account with this email already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<RegisterResponse, Error> {
    if !state.config.auth.native.allow_registration {
        return Err(Error::BadRequest {
            message: "Registration is disabled".to_string(),
        });
    }

    let first_name = required(&request.first_name, "First name")?;
    let last_name = required(&request.last_name, "Last name")?;
    let email = request.email.trim().to_lowercase();
    require_email(&email)?;
    validate_password(&request.password, &state.config.auth.native.password)?;
    if request.password != request.confirm_password {
        return Err(Error::BadRequest {
            message: "Passwords do not match".to_string(),
        });
    }
    let organization_name = request
        .organization_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let password_hash = password::hash_password_blocking(request.password).await?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut tx)
        .create(&UserCreateDBRequest {
            email: email.clone(),
            password_hash,
        })
        .await?;

    Profiles::new(&mut tx)
        .create(&ProfileCreateDBRequest {
            id: user.id,
            email: user.email.clone(),
            full_name: Some(format!("{first_name} {last_name}")),
            organization_name: organization_name.clone(),
        })
        .await?;
    Subscriptions::new(&mut tx).create_default(user.id).await?;
    OrganizationSettings::new(&mut tx)
        .create_default(user.id, organization_name.as_deref())
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    tracing::info!("Registered account {}", crate::types::abbrev_uuid(&user.id));

    let current_user = CurrentUser {
        id: user.id,
        email: user.email,
    };
    start_session(current_user, StatusCode::CREATED, "Registration successful", &state)
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let invalid = || Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    };

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut pool_conn)
        .get_user_by_email(request.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password_blocking(request.password, user.password_hash).await? {
        return Err(invalid());
    }

    let current_user = CurrentUser {
        id: user.id,
        email: user.email,
    };
    start_session(current_user, StatusCode::OK, "Login successful", &state)
}

/// Logout (clear the session cookie)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    Ok(SessionResponse {
        status: StatusCode::OK,
        body: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
        cookie: session::clear_session_cookie(&state.config),
    })
}

/// Change the signed-in user's password
#[utoipa::path(
    post,
    path = "/authentication/password-change",
    request_body = ChangePasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password changed", body = AuthSuccessResponse),
        (status = 400, description = "New password does not meet requirements"),
        (status = 401, description = "Not signed in, or current password is wrong"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<AuthSuccessResponse>, Error> {
    validate_password(&request.new_password, &state.config.auth.native.password)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut pool_conn);
    let user = users.get_by_id(current_user.id).await?.ok_or(Error::Unauthenticated { message: None })?;

    if !password::verify_password_blocking(request.current_password, user.password_hash).await? {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    let password_hash = password::hash_password_blocking(request.new_password).await?;
    users.update_password_hash(user.id, &password_hash).await?;

    Ok(Json(AuthSuccessResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// Report which strength rules a candidate password meets
#[utoipa::path(
    post,
    path = "/authentication/password-strength",
    request_body = PasswordStrengthRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Strength report", body = PasswordStrength),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn check_password_strength(
    State(state): State<AppState>,
    Json(request): Json<PasswordStrengthRequest>,
) -> Json<PasswordStrength> {
    Json(password_strength(&request.password, state.config.auth.native.password.min_length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{lazy_pool, test_config, test_state};
    use axum::routing::post;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn auth_router(state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/authentication/register", post(register))
            .route("/authentication/login", post(login))
            .route("/authentication/logout", post(logout))
            .route("/authentication/password-change", post(change_password))
            .route("/authentication/password-strength", post(check_password_strength))
            .with_state(state)
    }

    fn registration(email: &str) -> Value {
        json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": email,
            "password": "Engines1843",
            "confirm_password": "Engines1843",
            "organization_name": "Analytical Aid",
        })
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_passwords() {
        let server = TestServer::new(auth_router(test_state(lazy_pool()))).unwrap();

        let mut body = registration("ada@example.org");
        body["confirm_password"] = json!("Engines1844");
        let response = server.post("/authentication/register").json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["message"], "Passwords do not match");
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password_and_bad_email() {
        let server = TestServer::new(auth_router(test_state(lazy_pool()))).unwrap();

        let mut body = registration("ada@example.org");
        body["password"] = json!("short");
        body["confirm_password"] = json!("short");
        server
            .post("/authentication/register")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let body = registration("not-an-email");
        server
            .post("/authentication/register")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let mut body = registration("ada@example.org");
        body["first_name"] = json!("   ");
        server
            .post("/authentication/register")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_disabled() {
        let mut config = test_config();
        config.auth.native.allow_registration = false;
        let state = AppState::builder().db(lazy_pool()).config(config).build();
        let server = TestServer::new(auth_router(state)).unwrap();

        server
            .post("/authentication/register")
            .json(&registration("ada@example.org"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_password_strength_report() {
        let server = TestServer::new(auth_router(test_state(lazy_pool()))).unwrap();

        let response = server
            .post("/authentication/password-strength")
            .json(&json!({"password": "abcdefgh"}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["score"], 2);
        assert_eq!(body["checks"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let server = TestServer::new(auth_router(test_state(lazy_pool()))).unwrap();

        let response = server.post("/authentication/logout").await;
        response.assert_status_ok();
        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap().to_string();
        assert!(cookie.starts_with("formflow_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_change_password_requires_session() {
        let server = TestServer::new(auth_router(test_state(lazy_pool()))).unwrap();

        server
            .post("/authentication/password-change")
            .json(&json!({"current_password": "Engines1843", "new_password": "Engines1844"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_register_then_login(pool: PgPool) {
        let server = TestServer::new(auth_router(test_state(pool))).unwrap();

        let response = server
            .post("/authentication/register")
            .json(&registration("Ada@Example.org"))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert!(response.headers().get("set-cookie").is_some());
        let body: AuthResponse = response.json();
        assert_eq!(body.user.email, "ada@example.org");
        assert_eq!(body.message, "Registration successful");

        server
            .post("/authentication/register")
            .json(&registration("ada@example.org"))
            .await
            .assert_status(StatusCode::CONFLICT);

        server
            .post("/authentication/login")
            .json(&json!({"email": "ada@example.org", "password": "wrong-Password1"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/authentication/login")
            .json(&json!({"email": "ada@example.org", "password": "Engines1843"}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<AuthResponse>().user.id, body.user.id);
    }

    #[sqlx::test]
    async fn test_change_password(pool: PgPool) {
        let server = TestServer::new(auth_router(test_state(pool))).unwrap();
        let token = server
            .post("/authentication/register")
            .json(&registration("grace@example.org"))
            .await
            .json::<AuthResponse>()
            .token;

        server
            .post("/authentication/password-change")
            .authorization_bearer(&token)
            .json(&json!({"current_password": "nope", "new_password": "Compilers1952"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .post("/authentication/password-change")
            .authorization_bearer(&token)
            .json(&json!({"current_password": "Engines1843", "new_password": "Compilers1952"}))
            .await
            .assert_status_ok();

        server
            .post("/authentication/login")
            .json(&json!({"email": "grace@example.org", "password": "Compilers1952"}))
            .await
            .assert_status_ok();
    }
}
