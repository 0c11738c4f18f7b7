//! HTTP-Client fuer die Schluessel-API

use async_trait::async_trait;
use draugar_crypto::PublicKey;
use draugar_protocol::{AktuellesMitglied, RegisterKeyRequest, WrappedGroupKeyPackage};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

/// Schluessel-Operationen des Servers aus Sicht des Geraets
#[async_trait]
pub trait KeyApi: Send + Sync {
    /// `register-key`: liefert das eingewickelte Paket fuer den neuen Schluessel
    async fn schluessel_registrieren(
        &self,
        public_key: &PublicKey,
    ) -> ClientResult<WrappedGroupKeyPackage>;

    /// `group-key`: `None` wenn kein Schluessel registriert oder keine Gruppe existiert
    async fn gruppen_schluessel_abrufen(&self) -> ClientResult<Option<WrappedGroupKeyPackage>>;
}

/// Antwort von `GET /api/health`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Deserialize)]
struct FehlerHuelle {
    error: FehlerInhalt,
}

#[derive(Deserialize)]
struct FehlerInhalt {
    message: String,
}

pub struct KeyApiClient {
    http: Client,
    basis_url: String,
    token: String,
}

impl KeyApiClient {
    /// `basis_url` ohne abschliessenden Slash, z.B. `http://127.0.0.1:3000`
    pub fn neu(basis_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            basis_url: basis_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, pfad: &str) -> String {
        format!("{}{}", self.basis_url, pfad)
    }

    pub async fn health(&self) -> ClientResult<ServerStatus> {
        let antwort = self.http.get(self.url("/api/health")).send().await?;
        Ok(Self::pruefen(antwort).await?.json().await?)
    }

    /// `GET /api/auth/me`: prueft das Token beim Server
    ///
    /// [`ClientError::NichtAuthentifiziert`] bei ungueltigem oder
    /// abgelaufenem Token.
    pub async fn ich(&self) -> ClientResult<AktuellesMitglied> {
        let antwort = self
            .http
            .get(self.url("/api/auth/me"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(Self::pruefen(antwort).await?.json().await?)
    }

    /// Wandelt Fehlerstatus in [`ClientError`] um
    async fn pruefen(antwort: Response) -> ClientResult<Response> {
        let status = antwort.status();
        if status.is_success() {
            return Ok(antwort);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::NichtAuthentifiziert);
        }
        let meldung = match antwort.json::<FehlerHuelle>().await {
            Ok(huelle) => huelle.error.message,
            Err(_) => status.canonical_reason().unwrap_or("unbekannt").to_string(),
        };
        Err(ClientError::Server {
            status: status.as_u16(),
            meldung,
        })
    }
}

#[async_trait]
impl KeyApi for KeyApiClient {
    async fn schluessel_registrieren(
        &self,
        public_key: &PublicKey,
    ) -> ClientResult<WrappedGroupKeyPackage> {
        let antwort = self
            .http
            .post(self.url("/api/crypto/register-key"))
            .bearer_auth(&self.token)
            .json(&RegisterKeyRequest {
                public_key: public_key.als_base64(),
            })
            .send()
            .await?;
        Ok(Self::pruefen(antwort).await?.json().await?)
    }

    async fn gruppen_schluessel_abrufen(&self) -> ClientResult<Option<WrappedGroupKeyPackage>> {
        let antwort = self
            .http
            .get(self.url("/api/crypto/group-key"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if antwort.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::pruefen(antwort).await?.json().await?))
    }
}
