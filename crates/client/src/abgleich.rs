//! Abgleich des Schluesselspeichers beim Sitzungsstart und Abmeldung

use crate::error::ClientResult;
use crate::key_api::KeyApi;
use crate::key_store::{ClientKeyStore, KeyStoreZustand};
use crate::realtime::RealtimeClient;
use crate::secret_store::SecretStore;

/// Bringt den Schluesselspeicher so weit wie moeglich in `HatGruppenSchluessel`
///
/// - ohne Schluesselpaar: erzeugen, registrieren, auswickeln
/// - mit Paar ohne Gruppen-Schluessel: abrufen, auswickeln
///
/// Fehler der API oder der Kryptografie werden nur geloggt; der
/// zurueckgegebene Zustand sagt dann "noch nicht bereit". Nur Fehler des
/// Secret-Stores werden weitergereicht.
pub async fn sitzung_abgleichen<S, A>(
    key_store: &ClientKeyStore<S>,
    api: &A,
) -> ClientResult<KeyStoreZustand>
where
    S: SecretStore,
    A: KeyApi + ?Sized,
{
    match key_store.zustand().await? {
        KeyStoreZustand::HatGruppenSchluessel => {
            tracing::debug!("Gruppen-Schluessel bereits vorhanden");
        }
        KeyStoreZustand::SchluesselpaarOhneGruppenSchluessel => {
            match api.gruppen_schluessel_abrufen().await {
                Ok(Some(paket)) => {
                    key_store
                        .gruppen_schluessel_auswickeln_und_speichern(&paket)
                        .await;
                }
                Ok(None) => {
                    tracing::info!("Server hat noch keinen Gruppen-Schluessel fuer dieses Geraet");
                }
                Err(e) => tracing::warn!(fehler = %e, "Gruppen-Schluessel-Abruf fehlgeschlagen"),
            }
        }
        KeyStoreZustand::KeinSchluesselpaar => {
            let public = key_store.schluesselpaar_erzeugen_und_speichern().await?;
            match api.schluessel_registrieren(&public).await {
                Ok(paket) => {
                    key_store
                        .gruppen_schluessel_auswickeln_und_speichern(&paket)
                        .await;
                }
                Err(e) => tracing::warn!(fehler = %e, "Schluessel-Registrierung fehlgeschlagen"),
            }
        }
    }

    let zustand = key_store.zustand().await?;
    tracing::info!(?zustand, "Schluessel-Abgleich abgeschlossen");
    Ok(zustand)
}

/// Trennt die Echtzeit-Verbindung und loescht alles Schluesselmaterial
pub async fn abmelden<S: SecretStore + 'static>(
    key_store: &ClientKeyStore<S>,
    realtime: Option<RealtimeClient<S>>,
) -> ClientResult<()> {
    if let Some(client) = realtime {
        client.trennen().await;
    }
    key_store.alle_schluessel_loeschen().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use draugar_crypto::{b64_kodieren, CryptoContext, GroupKey, PublicKey, WrappingKeypair};
    use draugar_protocol::WrappedGroupKeyPackage;
    use parking_lot::Mutex;

    use crate::error::ClientError;
    use crate::secret_store::SpeicherSecretStore;

    /// Server-Attrappe mit echtem Wrapping
    struct FakeApi {
        crypto: CryptoContext,
        group_key: GroupKey,
        wrapping: WrappingKeypair,
        registriert: Mutex<Option<PublicKey>>,
        ausfall: bool,
        aufrufe: AtomicUsize,
    }

    impl FakeApi {
        fn neu() -> Self {
            let crypto = CryptoContext::neu().unwrap();
            Self {
                group_key: crypto.gruppen_schluessel_erzeugen().unwrap(),
                wrapping: crypto.wrapping_schluesselpaar_erzeugen().unwrap(),
                crypto,
                registriert: Mutex::new(None),
                ausfall: false,
                aufrufe: AtomicUsize::new(0),
            }
        }

        fn paket(&self, public: &PublicKey) -> WrappedGroupKeyPackage {
            let bytes = self
                .crypto
                .gruppen_schluessel_einwickeln(&self.group_key, public, &self.wrapping.secret)
                .unwrap();
            WrappedGroupKeyPackage {
                package: b64_kodieren(bytes),
                wrapping_public_key: self.wrapping.public.als_base64(),
                key_version: 1,
            }
        }
    }

    #[async_trait]
    impl KeyApi for FakeApi {
        async fn schluessel_registrieren(
            &self,
            public_key: &PublicKey,
        ) -> ClientResult<WrappedGroupKeyPackage> {
            self.aufrufe.fetch_add(1, Ordering::SeqCst);
            if self.ausfall {
                return Err(ClientError::verbindung("Server nicht erreichbar"));
            }
            *self.registriert.lock() = Some(*public_key);
            Ok(self.paket(public_key))
        }

        async fn gruppen_schluessel_abrufen(
            &self,
        ) -> ClientResult<Option<WrappedGroupKeyPackage>> {
            self.aufrufe.fetch_add(1, Ordering::SeqCst);
            if self.ausfall {
                return Err(ClientError::verbindung("Server nicht erreichbar"));
            }
            let registriert = *self.registriert.lock();
            Ok(registriert.map(|pk| self.paket(&pk)))
        }
    }

    fn key_store() -> ClientKeyStore<SpeicherSecretStore> {
        ClientKeyStore::neu(SpeicherSecretStore::neu(), CryptoContext::neu().unwrap())
    }

    #[tokio::test]
    async fn neues_geraet_registriert_und_wird_bereit() {
        let ks = key_store();
        let api = FakeApi::neu();
        let zustand = sitzung_abgleichen(&ks, &api).await.unwrap();
        assert_eq!(zustand, KeyStoreZustand::HatGruppenSchluessel);
        assert_eq!(ks.gruppen_schluessel().await.unwrap(), Some(api.group_key.clone()));
    }

    #[tokio::test]
    async fn vorhandenes_paar_ruft_nur_ab() {
        let ks = key_store();
        let api = FakeApi::neu();
        let public = ks.schluesselpaar_erzeugen_und_speichern().await.unwrap();
        *api.registriert.lock() = Some(public);

        let zustand = sitzung_abgleichen(&ks, &api).await.unwrap();
        assert_eq!(zustand, KeyStoreZustand::HatGruppenSchluessel);
        assert_eq!(ks.public_key().await.unwrap(), Some(public));
    }

    #[tokio::test]
    async fn bereites_geraet_fragt_server_nicht() {
        let ks = key_store();
        let api = FakeApi::neu();
        sitzung_abgleichen(&ks, &api).await.unwrap();
        let vorher = api.aufrufe.load(Ordering::SeqCst);

        sitzung_abgleichen(&ks, &api).await.unwrap();
        assert_eq!(api.aufrufe.load(Ordering::SeqCst), vorher);
    }

    #[tokio::test]
    async fn serverausfall_blockiert_sitzung_nicht() {
        let ks = key_store();
        let mut api = FakeApi::neu();
        api.ausfall = true;

        let zustand = sitzung_abgleichen(&ks, &api).await.unwrap();
        assert_eq!(zustand, KeyStoreZustand::SchluesselpaarOhneGruppenSchluessel);
        assert!(!zustand.ist_bereit());
    }

    #[tokio::test]
    async fn kein_paket_auf_dem_server_laesst_zustand_stehen() {
        let ks = key_store();
        let api = FakeApi::neu();
        ks.schluesselpaar_erzeugen_und_speichern().await.unwrap();

        let zustand = sitzung_abgleichen(&ks, &api).await.unwrap();
        assert_eq!(zustand, KeyStoreZustand::SchluesselpaarOhneGruppenSchluessel);
    }

    #[tokio::test]
    async fn abmelden_loescht_alle_schluessel() {
        let ks = key_store();
        let api = FakeApi::neu();
        sitzung_abgleichen(&ks, &api).await.unwrap();

        abmelden(&ks, None).await.unwrap();
        assert_eq!(ks.zustand().await.unwrap(), KeyStoreZustand::KeinSchluesselpaar);
    }
}
