//! Schluesselspeicher des Geraets
//!
//! ```text
//! KeinSchluesselpaar --erzeugen--> SchluesselpaarOhneGruppenSchluessel
//!         ^                                 |
//!         |                           auswickeln (ok)
//!      loeschen                             v
//!         +------------------------ HatGruppenSchluessel
//! ```
//!
//! Alle Werte liegen URL-sicher Base64-kodiert im [`SecretStore`].

use draugar_crypto::{b64_dekodieren, CryptoContext, GroupKey, PublicKey, SecretKey};
use draugar_protocol::WrappedGroupKeyPackage;

use crate::error::{ClientError, ClientResult};
use crate::secret_store::SecretStore;

/// Geheimer X25519-Schluessel des Geraets
pub const SECRET_KEY_EINTRAG: &str = "draugar_sk";
/// Oeffentlicher X25519-Schluessel des Geraets
pub const PUBLIC_KEY_EINTRAG: &str = "draugar_pk";
/// Ausgewickelter Gruppen-Schluessel
pub const GROUP_KEY_EINTRAG: &str = "draugar_gk";

/// Zustand des Schluesselspeichers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStoreZustand {
    KeinSchluesselpaar,
    SchluesselpaarOhneGruppenSchluessel,
    HatGruppenSchluessel,
}

impl KeyStoreZustand {
    /// Ob Standorte ver- und entschluesselt werden koennen
    pub fn ist_bereit(&self) -> bool {
        matches!(self, Self::HatGruppenSchluessel)
    }
}

pub struct ClientKeyStore<S: SecretStore> {
    store: S,
    crypto: CryptoContext,
}

impl<S: SecretStore> ClientKeyStore<S> {
    pub fn neu(store: S, crypto: CryptoContext) -> Self {
        Self { store, crypto }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn crypto(&self) -> &CryptoContext {
        &self.crypto
    }

    /// Erzeugt ein neues Schluesselpaar und gibt nur die oeffentliche Haelfte zurueck
    ///
    /// Ein vorhandener Gruppen-Schluessel wird verworfen, er muss fuer das
    /// neue Paar erneut ausgewickelt werden.
    pub async fn schluesselpaar_erzeugen_und_speichern(&self) -> ClientResult<PublicKey> {
        let paar = self.crypto.wrapping_schluesselpaar_erzeugen()?;

        self.store.loeschen(GROUP_KEY_EINTRAG).await?;
        self.store
            .schreiben(SECRET_KEY_EINTRAG, &paar.secret.als_base64())
            .await?;
        if let Err(e) = self
            .store
            .schreiben(PUBLIC_KEY_EINTRAG, &paar.public.als_base64())
            .await
        {
            // Kein halbes Paar zuruecklassen
            let _ = self.store.loeschen(SECRET_KEY_EINTRAG).await;
            return Err(e);
        }

        tracing::info!("Neues Geraete-Schluesselpaar gespeichert");
        Ok(paar.public)
    }

    /// Oeffentlicher Schluessel, falls ein vollstaendiges Paar existiert
    pub async fn public_key(&self) -> ClientResult<Option<PublicKey>> {
        if !self.hat_schluesselpaar().await? {
            return Ok(None);
        }
        match self.store.lesen(PUBLIC_KEY_EINTRAG).await? {
            Some(b64) => Ok(PublicKey::aus_base64(&b64).ok()),
            None => Ok(None),
        }
    }

    /// Oeffnet ein Paket vom Server und speichert den Gruppen-Schluessel
    ///
    /// Gibt `false` zurueck statt zu scheitern: beschaedigte Pakete, falsche
    /// Schluessel oder ein fehlendes Paar bedeuten nur "noch nicht bereit".
    pub async fn gruppen_schluessel_auswickeln_und_speichern(
        &self,
        paket: &WrappedGroupKeyPackage,
    ) -> bool {
        match self.auswickeln_und_speichern(paket).await {
            Ok(()) => {
                tracing::info!(key_version = paket.key_version, "Gruppen-Schluessel gespeichert");
                true
            }
            Err(e) => {
                tracing::warn!(fehler = %e, "Gruppen-Schluessel konnte nicht ausgewickelt werden");
                false
            }
        }
    }

    async fn auswickeln_und_speichern(&self, paket: &WrappedGroupKeyPackage) -> ClientResult<()> {
        let secret = self
            .store
            .lesen(SECRET_KEY_EINTRAG)
            .await?
            .ok_or(ClientError::KeinSchluesselpaar)?;
        let secret = SecretKey::aus_base64(&secret)?;
        let server_public = PublicKey::aus_base64(&paket.wrapping_public_key)?;
        let bytes = b64_dekodieren(&paket.package)?;

        let group_key = self
            .crypto
            .gruppen_schluessel_auswickeln(&bytes, &secret, &server_public)?;
        self.store
            .schreiben(GROUP_KEY_EINTRAG, &group_key.als_base64())
            .await
    }

    pub async fn hat_schluesselpaar(&self) -> ClientResult<bool> {
        Ok(self.store.lesen(SECRET_KEY_EINTRAG).await?.is_some()
            && self.store.lesen(PUBLIC_KEY_EINTRAG).await?.is_some())
    }

    /// Gespeicherter Gruppen-Schluessel; ein unlesbarer Eintrag zaehlt als fehlend
    pub async fn gruppen_schluessel(&self) -> ClientResult<Option<GroupKey>> {
        let Some(b64) = self.store.lesen(GROUP_KEY_EINTRAG).await? else {
            return Ok(None);
        };
        match GroupKey::aus_base64(&b64) {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                tracing::warn!(fehler = %e, "Gespeicherter Gruppen-Schluessel unlesbar");
                Ok(None)
            }
        }
    }

    pub async fn zustand(&self) -> ClientResult<KeyStoreZustand> {
        if !self.hat_schluesselpaar().await? {
            return Ok(KeyStoreZustand::KeinSchluesselpaar);
        }
        if self.gruppen_schluessel().await?.is_none() {
            return Ok(KeyStoreZustand::SchluesselpaarOhneGruppenSchluessel);
        }
        Ok(KeyStoreZustand::HatGruppenSchluessel)
    }

    /// Entfernt Schluesselpaar und Gruppen-Schluessel
    ///
    /// Alle drei Eintraege werden versucht, auch wenn einer scheitert.
    pub async fn alle_schluessel_loeschen(&self) -> ClientResult<()> {
        let mut erster_fehler = None;
        for eintrag in [SECRET_KEY_EINTRAG, PUBLIC_KEY_EINTRAG, GROUP_KEY_EINTRAG] {
            if let Err(e) = self.store.loeschen(eintrag).await {
                tracing::error!(eintrag, fehler = %e, "Schluessel konnte nicht geloescht werden");
                erster_fehler.get_or_insert(e);
            }
        }
        match erster_fehler {
            Some(e) => Err(e),
            None => {
                tracing::info!("Alle Schluessel geloescht");
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
