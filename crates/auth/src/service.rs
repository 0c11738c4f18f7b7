//! Auth-Service fuer Draugar
//!
//! Stellt Identitaets-Tokens aus und prueft sie. REST-Schicht und
//! Echtzeit-Handshake rufen beide [`AuthService::verifizieren`] auf, bevor
//! sie Zugriff gewaehren.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use draugar_core::MemberId;

use crate::{
    error::{AuthError, AuthResult},
    token::{IdentityToken, TokenSigner},
};

/// Mindestlaenge des Deployment-Secrets in Bytes
pub const MIN_SECRET_LAENGE: usize = 32;

/// Standard-Lebensdauer eines Tokens
pub const STANDARD_LEBENSDAUER_TAGE: i64 = 30;

/// Obergrenze fuer abweichende Lebensdauern
pub const MAX_LEBENSDAUER_TAGE: i64 = 365;

/// Auth-Service (guenstig zu klonen)
#[derive(Debug, Clone)]
pub struct AuthService {
    signer: Arc<TokenSigner>,
    lebensdauer: Duration,
}

impl AuthService {
    /// Erstellt einen AuthService mit dem Deployment-Secret
    ///
    /// Secrets unter [`MIN_SECRET_LAENGE`] Bytes werden abgelehnt.
    pub fn neu(secret: impl Into<Vec<u8>>) -> AuthResult<Self> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LAENGE {
            return Err(AuthError::SecretZuKurz {
                minimum: MIN_SECRET_LAENGE,
                erhalten: secret.len(),
            });
        }
        Ok(Self {
            signer: Arc::new(TokenSigner::neu(secret)),
            lebensdauer: Duration::days(STANDARD_LEBENSDAUER_TAGE),
        })
    }

    /// Setzt eine abweichende Token-Lebensdauer
    ///
    /// Wird auf `0..=MAX_LEBENSDAUER_TAGE` begrenzt.
    pub fn mit_lebensdauer_tagen(mut self, tage: i64) -> Self {
        let begrenzt = tage.clamp(0, MAX_LEBENSDAUER_TAGE);
        if begrenzt != tage {
            tracing::warn!(tage, begrenzt, "Token-Lebensdauer begrenzt");
        }
        self.lebensdauer = Duration::days(begrenzt);
        self
    }

    pub fn lebensdauer(&self) -> Duration {
        self.lebensdauer
    }

    /// Stellt ein Token fuer ein Mitglied aus
    pub fn ausstellen(&self, member_id: MemberId, display_name: &str) -> AuthResult<String> {
        self.ausstellen_zum(member_id, display_name, Utc::now())
    }

    /// Wie [`Self::ausstellen`], mit explizitem Ausstellungszeitpunkt
    pub fn ausstellen_zum(
        &self,
        member_id: MemberId,
        display_name: &str,
        jetzt: DateTime<Utc>,
    ) -> AuthResult<String> {
        let iat = jetzt.timestamp();
        let claims = IdentityToken {
            user_id: member_id,
            name: display_name.to_string(),
            iat,
            exp: iat + self.lebensdauer.num_seconds(),
        };
        let token = self.signer.signieren(&claims)?;
        tracing::debug!(member_id = %member_id, exp = claims.exp, "Token ausgestellt");
        Ok(token)
    }

    /// Prueft ein Token gegen die aktuelle Zeit
    ///
    /// Jeder Fehler ergibt [`AuthError::NichtAuthentifiziert`].
    pub fn verifizieren(&self, token: &str) -> AuthResult<IdentityToken> {
        self.verifizieren_zum(token, Utc::now())
    }

    /// Wie [`Self::verifizieren`], mit explizitem Pruefzeitpunkt
    pub fn verifizieren_zum(&self, token: &str, jetzt: DateTime<Utc>) -> AuthResult<IdentityToken> {
        let claims = self.signer.pruefen(token).map_err(|grund| {
            tracing::debug!(?grund, "Token abgelehnt");
            AuthError::NichtAuthentifiziert
        })?;

        if claims.ist_abgelaufen(jetzt) {
            tracing::debug!(member_id = %claims.user_id, "Token abgelaufen");
            return Err(AuthError::NichtAuthentifiziert);
        }

        Ok(claims)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
