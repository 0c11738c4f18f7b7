//! Krypto-Kontext
//!
//! Ein explizit uebergebener Handle statt globaler Initialisierung. Der
//! Konstruktor prueft einmal, ob die Zufallsquelle verfuegbar ist; danach
//! koennen alle Operationen den Kontext als Nachweis der Bereitschaft nehmen.

use draugar_protocol::{EncryptedPayload, LocationRecord};

use crate::e2e::{self, PayloadVersion};
use crate::error::CryptoResult;
use crate::types::{Entschluesselt, Fehlschlag, GroupKey, PublicKey, SecretKey, WrappingKeypair};

/// Bereiter Krypto-Kontext (guenstig zu klonen)
#[derive(Debug, Clone, Copy)]
pub struct CryptoContext {
    schreib_version: PayloadVersion,
    akzeptiert: &'static [PayloadVersion],
}

impl CryptoContext {
    /// Erstellt den Kontext und prueft die Zufallsquelle
    pub fn neu() -> CryptoResult<Self> {
        let mut test_bytes = [0u8; 16];
        e2e::zufall_fuellen(&mut test_bytes)?;
        tracing::debug!("Krypto-Kontext bereit");
        Ok(Self {
            schreib_version: PayloadVersion::AKTUELL,
            akzeptiert: &[PayloadVersion::V1],
        })
    }

    /// Version, mit der dieser Kontext Payloads schreibt
    pub fn schreib_version(&self) -> PayloadVersion {
        self.schreib_version
    }

    /// Payload-Versionen, die dieser Kontext entschluesseln kann
    pub fn akzeptierte_versionen(&self) -> &'static [PayloadVersion] {
        self.akzeptiert
    }

    pub fn gruppen_schluessel_erzeugen(&self) -> CryptoResult<GroupKey> {
        e2e::gruppen_schluessel_erzeugen()
    }

    /// X25519-Paar fuer den Server (Wrapping) oder ein Geraet (Mitglied)
    pub fn wrapping_schluesselpaar_erzeugen(&self) -> CryptoResult<WrappingKeypair> {
        e2e::schluesselpaar_erzeugen()
    }

    pub fn gruppen_schluessel_einwickeln(
        &self,
        gruppen_schluessel: &GroupKey,
        mitglied_public: &PublicKey,
        server_secret: &SecretKey,
    ) -> CryptoResult<Vec<u8>> {
        e2e::gruppen_schluessel_einwickeln(gruppen_schluessel, mitglied_public, server_secret)
    }

    pub fn gruppen_schluessel_auswickeln(
        &self,
        paket: &[u8],
        mitglied_secret: &SecretKey,
        server_public: &PublicKey,
    ) -> CryptoResult<GroupKey> {
        e2e::gruppen_schluessel_auswickeln(paket, mitglied_secret, server_public)
    }

    pub fn payload_verschluesseln(
        &self,
        record: &LocationRecord,
        key: &GroupKey,
    ) -> CryptoResult<EncryptedPayload> {
        e2e::standort_verschluesseln(record, key, self.schreib_version)
    }

    /// Entschluesselt einen Standort
    ///
    /// Versionen ausserhalb von [`Self::akzeptierte_versionen`] werden ohne
    /// Entschluesselungsversuch als `UnbekannteVersion` gemeldet.
    pub fn payload_entschluesseln(
        &self,
        payload: &EncryptedPayload,
        key: &GroupKey,
    ) -> Entschluesselt<LocationRecord> {
        let akzeptiert = PayloadVersion::aus_nummer(payload.v)
            .is_some_and(|v| self.akzeptiert.contains(&v));
        if !akzeptiert {
            tracing::debug!(version = payload.v, "Payload-Version nicht akzeptiert");
            return Entschluesselt::Fehlgeschlagen(Fehlschlag::UnbekannteVersion(payload.v));
        }
        e2e::standort_entschluesseln(payload, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kontext_schreibt_aktuelle_version() {
        let ctx = CryptoContext::neu().unwrap();
        assert_eq!(ctx.schreib_version(), PayloadVersion::V1);
        assert!(ctx.akzeptierte_versionen().contains(&ctx.schreib_version()));
    }

    #[test]
    fn zwei_geraete_teilen_einen_gruppen_schluessel() {
        let ctx = CryptoContext::neu().unwrap();
        let server = ctx.wrapping_schluesselpaar_erzeugen().unwrap();
        let gruppe = ctx.gruppen_schluessel_erzeugen().unwrap();

        let a = ctx.wrapping_schluesselpaar_erzeugen().unwrap();
        let b = ctx.wrapping_schluesselpaar_erzeugen().unwrap();
        let paket_a = ctx
            .gruppen_schluessel_einwickeln(&gruppe, &a.public, &server.secret)
            .unwrap();
        let paket_b = ctx
            .gruppen_schluessel_einwickeln(&gruppe, &b.public, &server.secret)
            .unwrap();

        let key_a = ctx
            .gruppen_schluessel_auswickeln(&paket_a, &a.secret, &server.public)
            .unwrap();
        let key_b = ctx
            .gruppen_schluessel_auswickeln(&paket_b, &b.secret, &server.public)
            .unwrap();
        assert_eq!(key_a, key_b);

        let record = LocationRecord {
            lat: 64.1,
            lon: -21.9,
            accuracy: 5.0,
            ts: 1_700_000_000_000,
        };
        let payload = ctx.payload_verschluesseln(&record, &key_a).unwrap();
        assert_eq!(ctx.payload_entschluesseln(&payload, &key_b).ok(), Some(record));
    }

    #[test]
    fn nur_akzeptierte_versionen_werden_entschluesselt() {
        let ctx = CryptoContext::neu().unwrap();
        let key = ctx.gruppen_schluessel_erzeugen().unwrap();
        let record = LocationRecord {
            lat: 1.0,
            lon: 2.0,
            accuracy: 3.0,
            ts: 4,
        };
        let payload = ctx.payload_verschluesseln(&record, &key).unwrap();
        assert!(ctx.payload_entschluesseln(&payload, &key).ist_erfolg());

        // Gueltiger v1-Payload, aber der Kontext nimmt v1 nicht an
        let streng = CryptoContext {
            akzeptiert: &[],
            ..ctx
        };
        assert_eq!(
            streng.payload_entschluesseln(&payload, &key),
            Entschluesselt::Fehlgeschlagen(Fehlschlag::UnbekannteVersion(1))
        );

        let unbekannt = EncryptedPayload { v: 9, ..payload };
        assert_eq!(
            ctx.payload_entschluesseln(&unbekannt, &key),
            Entschluesselt::Fehlgeschlagen(Fehlschlag::UnbekannteVersion(9))
        );
    }
}
