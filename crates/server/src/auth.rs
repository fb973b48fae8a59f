//! Login, session and password endpoints.

use api_types::{
    Message,
    admin::PaginaView,
    auth::{ChangePassword, LoginRequest, ResetPassword, TokenCheck, TokenResponse},
    user::UsuarioView,
};
use axum::{Extension, Json, extract::State};
use engine::User;

use crate::{
    Claims, ServerError,
    admin::map_page,
    server::ServerState,
    users::map_user,
};

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ServerError> {
    let Some(user) = state
        .engine
        .authenticate(&payload.username, &payload.password)
        .await?
    else {
        return Err(ServerError::Unauthorized(
            "incorrect username or password".to_string(),
        ));
    };

    let issued = state.jwt.issue(&user.username).map_err(|err| {
        tracing::error!("could not sign token: {err}");
        ServerError::Internal("could not issue token".to_string())
    })?;

    Ok(Json(TokenResponse {
        access_token: issued.token,
        token_type: "bearer".to_string(),
        expires_in: issued.expires_in,
        user: map_user(user),
    }))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UsuarioView> {
    Json(map_user(user))
}

pub async fn my_pages(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<PaginaView>>, ServerError> {
    let pages = state
        .engine
        .user_pages(user.id)
        .await?
        .into_iter()
        .map(map_page)
        .collect();
    Ok(Json(pages))
}

pub async fn change_password(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<ChangePassword>,
) -> Result<Json<Message>, ServerError> {
    state
        .engine
        .change_password(user.id, &payload.password_actual, &payload.password_nueva)
        .await?;
    Ok(Json(Message::new("password changed")))
}

pub async fn reset_password(
    State(state): State<ServerState>,
    Json(payload): Json<ResetPassword>,
) -> Result<Json<Message>, ServerError> {
    state
        .engine
        .reset_password(payload.user_id, &payload.password_nueva, payload.forzar_cambio)
        .await?;
    Ok(Json(Message::new("password reset")))
}

/// Tokens are stateless; the client simply discards its copy.
pub async fn logout(Extension(user): Extension<User>) -> Json<Message> {
    tracing::info!(username = %user.username, "user logged out");
    Json(Message::new("logged out"))
}

pub async fn check_token(
    Extension(user): Extension<User>,
    Extension(claims): Extension<Claims>,
) -> Json<TokenCheck> {
    Json(TokenCheck {
        valid: true,
        username: user.username,
        expires_at: claims.expires_at(),
    })
}
