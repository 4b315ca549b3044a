//! Authentication route handlers for admin.
//!
//! Admins sign in with their store account's email and password.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::services::{AdminAuthError, AdminAuthService};
use crate::state::AppState;
use crate::views::Layout;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<&'static str>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page. Signed-in admins go straight to the dashboard.
///
/// GET /auth/login
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth, layout: Layout) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginPageTemplate {
        layout,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Check credentials and start an admin session.
///
/// POST /auth/login
#[instrument(skip(state, session, layout, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AdminAuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(admin) => {
            set_current_admin(&session, &admin).await?;
            set_sentry_user(&admin.id, Some(admin.email.as_str()));
            tracing::info!(admin_id = %admin.id, "Admin signed in");
            Ok(Redirect::to("/").into_response())
        }
        Err(AdminAuthError::Repository(e)) => Err(AdminAuthError::Repository(e).into()),
        Err(e) => {
            tracing::warn!(error = %e, "Admin sign-in rejected");
            Ok((
                StatusCode::UNAUTHORIZED,
                LoginPageTemplate {
                    layout,
                    email: form.email.trim().to_owned(),
                    error: Some(e.user_message()),
                },
            )
                .into_response())
        }
    }
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/auth/login"))
}
