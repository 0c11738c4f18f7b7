//! Key-Service
//!
//! Besitzt das Schluesselmaterial der Gruppe und wickelt den
//! Gruppen-Schluessel fuer anfragende Mitglieder ein. Die erste erfolgreiche
//! Registrierung legt die Gruppe an; gleichzeitige Erstregistrierungen
//! entscheidet `gruppe_einfuegen_falls_fehlt`.

use std::sync::Arc;

use draugar_core::MemberId;
use draugar_crypto::{b64_kodieren, CryptoContext, GroupKey, PublicKey, SecretKey};
use draugar_db::{
    GroupRecord, GroupRepository, MemberRepository, NeueGruppe, ERSTE_KEY_VERSION, GRUPPEN_NAME,
};
use draugar_protocol::WrappedGroupKeyPackage;

use crate::error::{KeyError, KeyResult};

/// Key-Service (serverseitig)
#[derive(Clone)]
pub struct KeyService {
    crypto: CryptoContext,
    mitglieder: Arc<dyn MemberRepository>,
    gruppen: Arc<dyn GroupRepository>,
}

impl KeyService {
    pub fn neu(
        crypto: CryptoContext,
        mitglieder: Arc<dyn MemberRepository>,
        gruppen: Arc<dyn GroupRepository>,
    ) -> Self {
        Self {
            crypto,
            mitglieder,
            gruppen,
        }
    }

    /// Registriert den oeffentlichen Schluessel eines Mitglieds
    ///
    /// Der Schluessel wird vor jeder Zustandsaenderung geprueft. Existiert
    /// noch keine Gruppe, wird sie hier angelegt.
    pub async fn register_member_key(
        &self,
        member_id: MemberId,
        display_name: &str,
        public_key: &str,
    ) -> KeyResult<WrappedGroupKeyPackage> {
        let public_key = PublicKey::aus_base64(public_key).map_err(|_| {
            tracing::debug!(member_id = %member_id, "Ungueltiger oeffentlicher Schluessel");
            KeyError::UngueltigerPublicKey
        })?;

        self.mitglieder
            .mitglied_sicherstellen(member_id, display_name)
            .await?;
        self.mitglieder
            .public_key_setzen(member_id, &public_key.als_base64())
            .await?;

        let gruppe = self.gruppe_sicherstellen().await?;
        let paket = self.einwickeln(&gruppe, &public_key)?;

        tracing::info!(
            member_id = %member_id,
            key_version = gruppe.key_version,
            "Mitglieds-Schluessel registriert"
        );
        Ok(paket)
    }

    /// Wickelt den aktuellen Gruppen-Schluessel erneut ein
    ///
    /// Aendert keinen Zustand.
    pub async fn fetch_wrapped_key(&self, member_id: MemberId) -> KeyResult<WrappedGroupKeyPackage> {
        let gespeichert = self
            .mitglieder
            .mitglied_laden(member_id)
            .await?
            .and_then(|m| m.public_key)
            .ok_or(KeyError::KeinSchluessel)?;
        let gruppe = self.gruppen.gruppe_laden().await?.ok_or(KeyError::KeineGruppe)?;

        let public_key = PublicKey::aus_base64(&gespeichert)
            .map_err(|e| KeyError::BeschaedigtesMaterial(e.to_string()))?;

        let paket = self.einwickeln(&gruppe, &public_key)?;
        tracing::debug!(member_id = %member_id, "Gruppen-Schluessel erneut ausgegeben");
        Ok(paket)
    }

    /// Aktuelle Schluesselversion, `None` solange keine Gruppe existiert
    pub async fn key_version(&self) -> KeyResult<Option<u32>> {
        Ok(self.gruppen.gruppe_laden().await?.map(|g| g.key_version))
    }

    async fn gruppe_sicherstellen(&self) -> KeyResult<GroupRecord> {
        if let Some(gruppe) = self.gruppen.gruppe_laden().await? {
            return Ok(gruppe);
        }

        let group_key = self.crypto.gruppen_schluessel_erzeugen()?;
        let wrapping = self.crypto.wrapping_schluesselpaar_erzeugen()?;
        let kandidat = NeueGruppe {
            name: GRUPPEN_NAME.to_string(),
            group_key: group_key.als_base64(),
            key_version: ERSTE_KEY_VERSION,
            wrapping_public_key: wrapping.public.als_base64(),
            wrapping_secret_key: wrapping.secret.als_base64(),
        };

        let (gruppe, angelegt) = self.gruppen.gruppe_einfuegen_falls_fehlt(kandidat).await?;
        if !angelegt {
            tracing::debug!("Gruppe wurde parallel angelegt, Kandidat verworfen");
        }
        Ok(gruppe)
    }

    fn einwickeln(
        &self,
        gruppe: &GroupRecord,
        public_key: &PublicKey,
    ) -> KeyResult<WrappedGroupKeyPackage> {
        let group_key = GroupKey::aus_base64(&gruppe.group_key)
            .map_err(|e| KeyError::BeschaedigtesMaterial(e.to_string()))?;
        let server_secret = SecretKey::aus_base64(&gruppe.wrapping_secret_key)
            .map_err(|e| KeyError::BeschaedigtesMaterial(e.to_string()))?;

        let paket = self
            .crypto
            .gruppen_schluessel_einwickeln(&group_key, public_key, &server_secret)?;

        Ok(WrappedGroupKeyPackage {
            package: b64_kodieren(paket),
            wrapping_public_key: gruppe.wrapping_public_key.clone(),
            key_version: gruppe.key_version,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use draugar_crypto::{b64_dekodieren, WrappingKeypair};
    use draugar_db::InMemoryStore;

    fn service() -> (KeyService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::neu());
        let ctx = CryptoContext::neu().unwrap();
        (KeyService::neu(ctx, store.clone(), store.clone()), store)
    }

    fn geraet() -> WrappingKeypair {
        CryptoContext::neu()
            .unwrap()
            .wrapping_schluesselpaar_erzeugen()
            .unwrap()
    }

    fn auswickeln(paket: &WrappedGroupKeyPackage, geraet: &WrappingKeypair) -> GroupKey {
        let server_public = PublicKey::aus_base64(&paket.wrapping_public_key).unwrap();
        CryptoContext::neu()
            .unwrap()
            .gruppen_schluessel_auswickeln(
                &b64_dekodieren(&paket.package).unwrap(),
                &geraet.secret,
                &server_public,
            )
            .unwrap()
    }

    #[tokio::test]
    async fn erste_registrierung_legt_gruppe_an() {
        let (svc, store) = service();
        assert_eq!(svc.key_version().await.unwrap(), None);

        let a = geraet();
        let paket = svc
            .register_member_key(MemberId::new(), "Anna", &a.public.als_base64())
            .await
            .unwrap();

        assert_eq!(paket.key_version, 1);
        assert_eq!(store.gruppe_laden().await.unwrap().unwrap().name, "Family");
        assert_eq!(auswickeln(&paket, &a).as_bytes().len(), 32);
    }

    #[tokio::test]
    async fn zweites_mitglied_erhaelt_denselben_schluessel() {
        let (svc, _) = service();
        let a = geraet();
        let b = geraet();

        let paket_a = svc
            .register_member_key(MemberId::new(), "Anna", &a.public.als_base64())
            .await
            .unwrap();
        let paket_b = svc
            .register_member_key(MemberId::new(), "Bjarki", &b.public.als_base64())
            .await
            .unwrap();

        assert_eq!(paket_a.wrapping_public_key, paket_b.wrapping_public_key);
        assert_eq!(auswickeln(&paket_a, &a), auswickeln(&paket_b, &b));
    }

    #[tokio::test]
    async fn ungueltiger_schluessel_aendert_nichts() {
        let (svc, store) = service();
        let id = MemberId::new();

        let zu_lang = "A".repeat(60);
        let kein_base64 = "!".repeat(43);
        for kaputt in ["", "zu-kurz", zu_lang.as_str(), kein_base64.as_str()] {
            assert!(matches!(
                svc.register_member_key(id, "Anna", kaputt).await,
                Err(KeyError::UngueltigerPublicKey)
            ));
        }

        assert!(store.gruppe_laden().await.unwrap().is_none());
        assert!(store.mitglied_laden(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn schluessel_kleiner_ordnung_aendert_nichts() {
        let null_punkt = "A".repeat(43);

        // Frisches Deployment: keine Gruppe, kein Mitglied
        let (svc, store) = service();
        let id = MemberId::new();
        assert!(matches!(
            svc.register_member_key(id, "Anna", &null_punkt).await,
            Err(KeyError::UngueltigerPublicKey)
        ));
        assert!(store.gruppe_laden().await.unwrap().is_none());
        assert!(store.mitglied_laden(id).await.unwrap().is_none());

        // Registriertes Mitglied behaelt seinen gueltigen Schluessel
        let a = geraet();
        svc.register_member_key(id, "Anna", &a.public.als_base64())
            .await
            .unwrap();
        assert!(matches!(
            svc.register_member_key(id, "Anna", &null_punkt).await,
            Err(KeyError::UngueltigerPublicKey)
        ));
        let gespeichert = store.mitglied_laden(id).await.unwrap().unwrap().public_key;
        assert_eq!(gespeichert, Some(a.public.als_base64()));
        let paket = svc.fetch_wrapped_key(id).await.unwrap();
        assert_eq!(auswickeln(&paket, &a).as_bytes().len(), 32);
    }

    #[tokio::test]
    async fn abruf_ohne_registrierung_ist_nicht_gefunden() {
        let (svc, store) = service();
        let id = MemberId::new();

        assert!(matches!(
            svc.fetch_wrapped_key(id).await,
            Err(KeyError::KeinSchluessel)
        ));

        // Mitglied existiert, hat aber keinen Schluessel
        store.mitglied_sicherstellen(id, "Anna").await.unwrap();
        assert!(matches!(
            svc.fetch_wrapped_key(id).await,
            Err(KeyError::KeinSchluessel)
        ));
    }

    #[tokio::test]
    async fn abruf_ohne_gruppe_ist_nicht_gefunden() {
        let (svc, store) = service();
        let id = MemberId::new();
        store.mitglied_sicherstellen(id, "Anna").await.unwrap();
        store
            .public_key_setzen(id, &geraet().public.als_base64())
            .await
            .unwrap();

        assert!(matches!(
            svc.fetch_wrapped_key(id).await,
            Err(KeyError::KeineGruppe)
        ));
    }

    #[tokio::test]
    async fn abruf_ist_idempotent() {
        let (svc, store) = service();
        let a = geraet();
        let id = MemberId::new();
        let registriert = svc
            .register_member_key(id, "Anna", &a.public.als_base64())
            .await
            .unwrap();
        let gruppe_vorher = store.gruppe_laden().await.unwrap();

        let erneut = svc.fetch_wrapped_key(id).await.unwrap();
        let nochmal = svc.fetch_wrapped_key(id).await.unwrap();

        // Frische Nonce pro Paket, gleicher Inhalt
        assert_ne!(erneut.package, nochmal.package);
        assert_eq!(auswickeln(&erneut, &a), auswickeln(&registriert, &a));
        assert_eq!(auswickeln(&nochmal, &a), auswickeln(&registriert, &a));
        assert_eq!(store.gruppe_laden().await.unwrap(), gruppe_vorher);
    }

    #[tokio::test]
    async fn neu_registrierter_schluessel_ersetzt_alten() {
        let (svc, _) = service();
        let id = MemberId::new();
        let alt = geraet();
        let neu = geraet();

        svc.register_member_key(id, "Anna", &alt.public.als_base64())
            .await
            .unwrap();
        svc.register_member_key(id, "Anna", &neu.public.als_base64())
            .await
            .unwrap();

        let paket = svc.fetch_wrapped_key(id).await.unwrap();
        let server_public = PublicKey::aus_base64(&paket.wrapping_public_key).unwrap();
        let ctx = CryptoContext::neu().unwrap();
        let bytes = b64_dekodieren(&paket.package).unwrap();
        assert!(ctx
            .gruppen_schluessel_auswickeln(&bytes, &alt.secret, &server_public)
            .is_err());
        assert!(ctx
            .gruppen_schluessel_auswickeln(&bytes, &neu.secret, &server_public)
            .is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn gleichzeitige_erstregistrierung_ergibt_einen_schluessel() {
        let (svc, _) = service();

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    let g = geraet();
                    let paket = svc
                        .register_member_key(MemberId::new(), &format!("M{i}"), &g.public.als_base64())
                        .await
                        .unwrap();
                    auswickeln(&paket, &g)
                })
            })
            .collect();

        let mut schluessel = Vec::new();
        for t in tasks {
            schluessel.push(t.await.unwrap());
        }
        assert!(schluessel.iter().all(|k| *k == schluessel[0]));
    }
}
