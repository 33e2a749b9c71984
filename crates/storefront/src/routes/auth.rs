//! Authentication route handlers.
//!
//! `POST /auth` dispatches on its `action` field. Every action that signs a
//! user in answers with the identity and a fresh `session` cookie; logout
//! answers with a removal cookie.

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

use dorodango_core::{AccountId, Email, SessionUser};

use super::json::JsonBody;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalSession, RequireSession};
use crate::models::{Account, Profile};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "action")]
enum AuthAction {
    #[serde(rename = "signup")]
    Signup(Credentials),
    #[serde(rename = "login")]
    Login(Credentials),
    #[serde(rename = "logout")]
    Logout,
    #[serde(rename = "setSession")]
    SetSession {
        #[serde(default)]
        user: Option<IdentityInput>,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Credentials {
    name: String,
    email: String,
    password: String,
}

/// An identity authenticated by another provider.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IdentityInput {
    uid: String,
    name: String,
    email: String,
}

/// `POST /auth`
#[instrument(skip(state, body))]
pub async fn action(State(state): State<AppState>, JsonBody(body): JsonBody<Value>) -> Result<Response> {
    let action: AuthAction = serde_json::from_value(body)
        .map_err(|_| AppError::BadRequest("Invalid action".to_owned()))?;

    match action {
        AuthAction::Signup(c) => {
            let account = state.auth().signup(&c.name, &c.email, &c.password).await?;
            info!(email = %account.email, "Account created");
            Ok(signed_in(&state, &account, false))
        }
        AuthAction::Login(c) => {
            let account = state.auth().login(&c.email, &c.password).await?;
            info!(email = %account.email, "Signed in");
            Ok(signed_in(&state, &account, false))
        }
        AuthAction::SetSession { user } => set_session(&state, user.unwrap_or_default()).await,
        AuthAction::Logout => {
            clear_sentry_user();
            Ok((
                [(header::SET_COOKIE, state.signer().clear_cookie())],
                Json(json!({ "ok": true })),
            )
                .into_response())
        }
    }
}

async fn set_session(state: &AppState, identity: IdentityInput) -> Result<Response> {
    let uid = identity.uid.trim();
    let email = identity.email.trim();
    if uid.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest("Invalid user data".to_owned()));
    }
    let email = Email::parse(email).map_err(|_| AppError::BadRequest("Invalid user data".to_owned()))?;
    let name = match identity.name.trim() {
        "" => email.local_part().to_owned(),
        name => name.to_owned(),
    };

    let account = state
        .auth()
        .upsert_profile(&AccountId::new(uid), &name, &email)
        .await?;
    info!(uid = %account.uid, "Session set for external identity");
    Ok(signed_in(state, &account, true))
}

/// Respond with the identity and a `session` cookie for `account`.
fn signed_in(state: &AppState, account: &Account, include_uid: bool) -> Response {
    let session = SessionUser::new(account.uid.as_str(), &account.name, account.email.as_str());
    set_sentry_user(session.uid.as_deref(), &session.email);

    let user = if include_uid {
        json!({ "uid": session.uid, "name": session.name, "email": session.email })
    } else {
        json!({ "name": session.name, "email": session.email })
    };

    (
        [(header::SET_COOKIE, state.signer().set_cookie(&session))],
        Json(json!({ "user": user })),
    )
        .into_response()
}

/// `GET /auth`
pub async fn current(OptionalSession(session): OptionalSession) -> impl IntoResponse {
    Json(json!({ "user": session }))
}

/// `GET /auth/profile`
#[instrument(skip(state, user), fields(user_email = %user.email))]
pub async fn profile(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
) -> Result<impl IntoResponse> {
    let uid = user
        .uid
        .ok_or_else(|| AppError::NotFound("Profile not found".to_owned()))?;
    let account = state.auth().profile(&AccountId::new(uid)).await?;
    Ok(Json(json!({ "profile": Profile::from(account) })))
}
