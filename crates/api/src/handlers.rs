//! REST-Handler

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use draugar_protocol::{AktuellesMitglied, RegisterKeyRequest, WrappedGroupKeyPackage};

use crate::auth::AuthMitglied;
use crate::error::{ApiError, ApiResult};
use crate::ApiState;

/// POST /api/crypto/register-key
pub async fn register_key(
    State(state): State<ApiState>,
    AuthMitglied(mitglied): AuthMitglied,
    body: Result<Json<RegisterKeyRequest>, JsonRejection>,
) -> ApiResult<Json<WrappedGroupKeyPackage>> {
    let Json(anfrage) = body.map_err(|e| ApiError::UngueltigerBody(e.body_text()))?;

    let paket = state
        .key_service
        .register_member_key(mitglied.user_id, &mitglied.name, &anfrage.public_key)
        .await?;

    state.ausgabe_zaehlen("register");
    Ok(Json(paket))
}

/// GET /api/crypto/group-key
pub async fn group_key(
    State(state): State<ApiState>,
    AuthMitglied(mitglied): AuthMitglied,
) -> ApiResult<Json<WrappedGroupKeyPackage>> {
    let paket = state.key_service.fetch_wrapped_key(mitglied.user_id).await?;
    state.ausgabe_zaehlen("fetch");
    Ok(Json(paket))
}

/// GET /api/auth/me
///
/// Prueft nur das Token; Name und ID kommen aus den Claims.
pub async fn ich(AuthMitglied(mitglied): AuthMitglied) -> Json<AktuellesMitglied> {
    Json(AktuellesMitglied {
        id: mitglied.user_id,
        name: mitglied.name,
    })
}
