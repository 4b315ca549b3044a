//! Authentication route handlers.
//!
//! Handles login, registration, logout, and password reset with
//! email/password accounts. Signing in folds the guest cart into the
//! account's cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, safe_next, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthError, AuthService, Registration, merge_guest_cart};
use crate::state::AppState;
use crate::views::{Layout, redirect_with_error, redirect_with_success};

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub next: Option<String>,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Where to go after signing in.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Reset link parameters.
#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub next: String,
    pub email: String,
    pub form_error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub next: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub form_error: Option<String>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub layout: Layout,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub layout: Layout,
    pub token: String,
    /// False when the link is unknown, used, or expired.
    pub valid: bool,
    pub form_error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in users go straight to `next`.
#[instrument(skip(layout, user))]
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    layout: Layout,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref()).to_owned();
    if user.is_some() {
        return Redirect::to(&next).into_response();
    }
    LoginTemplate {
        layout,
        next,
        email: String::new(),
        form_error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, layout, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).to_owned();

    let user = match AuthService::new(state.pool())
        .login_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) if e.is_user_error() => {
            tracing::info!(error = %e, "Login failed");
            return Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    layout,
                    next,
                    email: form.email,
                    form_error: Some(e.user_message()),
                },
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    sign_in(&state, &session, &user).await?;
    tracing::info!(user_id = %user.id, "User signed in");
    Ok(Redirect::to(&next).into_response())
}

/// Store the user in the session and merge their guest cart.
async fn sign_in(state: &AppState, session: &Session, user: &User) -> Result<()> {
    if let Err(e) = merge_guest_cart(state.pool(), session, user.id).await {
        // The account cart still works; the guest cart stays in the session.
        tracing::warn!(user_id = %user.id, error = %e, "Failed to merge guest cart");
    }

    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        role: user.role,
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(layout, user))]
pub async fn register_page(
    OptionalAuth(user): OptionalAuth,
    layout: Layout,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref()).to_owned();
    if user.is_some() {
        return Redirect::to(&next).into_response();
    }
    RegisterTemplate {
        layout,
        next,
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        form_error: None,
    }
    .into_response()
}

/// Handle registration form submission. New accounts are signed in at once.
#[instrument(skip(state, session, layout, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).to_owned();

    let result = AuthService::new(state.pool())
        .register_with_password(Registration {
            first_name: &form.first_name,
            last_name: &form.last_name,
            email: &form.email,
            password: &form.password,
            confirm_password: &form.password_confirm,
        })
        .await;

    let user = match result {
        Ok(user) => user,
        Err(e) if e.is_user_error() => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                RegisterTemplate {
                    layout,
                    next,
                    first_name: form.first_name,
                    last_name: form.last_name,
                    email: form.email,
                    form_error: Some(e.user_message()),
                },
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    sign_in(&state, &session, &user).await?;
    tracing::info!(user_id = %user.id, "User registered");
    Ok(redirect_with_success(&next, "Welcome! Your account has been created.").into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout. The whole session is destroyed.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    // Also destroy the entire session
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page(layout: Layout) -> impl IntoResponse {
    ForgotPasswordTemplate { layout }
}

/// Send a reset link if the account exists.
///
/// The response is the same whether or not an account matched.
#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Redirect> {
    let issued = match AuthService::new(state.pool())
        .request_password_reset(&form.email)
        .await
    {
        Ok(issued) => issued,
        Err(AuthError::InvalidEmail(_)) => {
            return Ok(redirect_with_error(
                "/auth/forgot-password",
                "Please enter a valid email address",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some((user, token)) = issued {
        let reset_url = state.config().absolute_url(&format!(
            "/auth/reset-password?token={}",
            urlencoding::encode(&token)
        ));
        match state.email() {
            Some(email) => {
                if let Err(e) = email
                    .send_password_reset(user.email.as_str(), &user.first_name, &reset_url)
                    .await
                {
                    tracing::error!(user_id = %user.id, error = %e, "Failed to send password reset email");
                }
            }
            None => {
                tracing::info!(user_id = %user.id, %reset_url, "Password reset requested (email disabled)");
            }
        }
    }

    Ok(redirect_with_success(
        "/auth/login",
        "If an account exists for that email, a reset link is on its way.",
    ))
}

/// Display the reset password page.
#[instrument(skip(state, layout, query))]
pub async fn reset_password_page(
    State(state): State<AppState>,
    layout: Layout,
    Query(query): Query<ResetQuery>,
) -> Result<ResetPasswordTemplate> {
    let token = query.token.unwrap_or_default();
    let valid = !token.is_empty()
        && AuthService::new(state.pool())
            .reset_token_is_valid(&token)
            .await?;

    Ok(ResetPasswordTemplate {
        layout,
        token,
        valid,
        form_error: None,
    })
}

/// Handle reset password form submission.
#[instrument(skip(state, layout, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    layout: Layout,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .reset_password(&form.token, &form.password, &form.password_confirm)
        .await
    {
        Ok(user_id) => {
            tracing::info!(user_id = %user_id, "Password reset");
            Ok(redirect_with_success(
                "/auth/login",
                "Your password has been updated. Please sign in.",
            )
            .into_response())
        }
        Err(e) if e.is_user_error() => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            ResetPasswordTemplate {
                layout,
                valid: !matches!(e, AuthError::InvalidResetToken),
                token: form.token,
                form_error: Some(e.user_message()),
            },
        )
            .into_response()),
        Err(e) => Err(AppError::from(e)),
    }
}
