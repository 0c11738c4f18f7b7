//! Sicherer Schluesselspeicher des Geraets
//!
//! Werte sind kurze Strings (Base64-Schluessel, Flags). Jede Operation
//! laeuft vollstaendig durch, auch im Fehlerfall bleibt kein halb
//! geschriebenes Secret zurueck.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{ClientError, ClientResult};

/// Schluessel-Wert-Speicher fuer Geheimnisse
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn lesen(&self, schluessel: &str) -> ClientResult<Option<String>>;
    async fn schreiben(&self, schluessel: &str, wert: &str) -> ClientResult<()>;
    /// Entfernt einen Eintrag; fehlende Eintraege sind kein Fehler
    async fn loeschen(&self, schluessel: &str) -> ClientResult<()>;
}

// ---------------------------------------------------------------------------
// SpeicherSecretStore
// ---------------------------------------------------------------------------

/// Fluechtiger Speicher im Prozess
#[derive(Default)]
pub struct SpeicherSecretStore {
    eintraege: RwLock<HashMap<String, String>>,
}

impl SpeicherSecretStore {
    pub fn neu() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for SpeicherSecretStore {
    async fn lesen(&self, schluessel: &str) -> ClientResult<Option<String>> {
        Ok(self.eintraege.read().get(schluessel).cloned())
    }

    async fn schreiben(&self, schluessel: &str, wert: &str) -> ClientResult<()> {
        self.eintraege
            .write()
            .insert(schluessel.to_string(), wert.to_string());
        Ok(())
    }

    async fn loeschen(&self, schluessel: &str) -> ClientResult<()> {
        self.eintraege.write().remove(schluessel);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DateiSecretStore
// ---------------------------------------------------------------------------

/// Eine Datei pro Eintrag in einem Verzeichnis
///
/// Geschrieben wird in eine temporaere Datei, die anschliessend atomar
/// umbenannt wird. Unter Unix sind die Dateien nur fuer den Besitzer lesbar.
#[derive(Debug, Clone)]
pub struct DateiSecretStore {
    verzeichnis: PathBuf,
}

impl DateiSecretStore {
    /// Oeffnet (und erstellt bei Bedarf) das Speicherverzeichnis
    pub async fn neu(verzeichnis: impl Into<PathBuf>) -> ClientResult<Self> {
        let verzeichnis = verzeichnis.into();
        tokio::fs::create_dir_all(&verzeichnis).await?;
        tracing::debug!(verzeichnis = %verzeichnis.display(), "Datei-Secret-Store geoeffnet");
        Ok(Self { verzeichnis })
    }

    pub fn verzeichnis(&self) -> &Path {
        &self.verzeichnis
    }

    /// Nur `[a-z0-9_]`, damit kein Name aus dem Verzeichnis fuehrt
    fn pfad(&self, schluessel: &str) -> ClientResult<PathBuf> {
        let gueltig = !schluessel.is_empty()
            && schluessel
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if !gueltig {
            return Err(ClientError::UngueltigerSchluesselName(schluessel.to_string()));
        }
        Ok(self.verzeichnis.join(schluessel))
    }

    async fn temp_schreiben(pfad: &Path, wert: &str) -> std::io::Result<()> {
        tokio::fs::write(pfad, wert.as_bytes()).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(pfad, std::fs::Permissions::from_mode(0o600)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for DateiSecretStore {
    async fn lesen(&self, schluessel: &str) -> ClientResult<Option<String>> {
        let pfad = self.pfad(schluessel)?;
        match tokio::fs::read_to_string(&pfad).await {
            Ok(wert) => Ok(Some(wert)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn schreiben(&self, schluessel: &str, wert: &str) -> ClientResult<()> {
        let ziel = self.pfad(schluessel)?;
        let temp = self.verzeichnis.join(format!(".{schluessel}.tmp"));

        let ergebnis = match Self::temp_schreiben(&temp, wert).await {
            Ok(()) => tokio::fs::rename(&temp, &ziel).await,
            Err(e) => Err(e),
        };

        if let Err(e) = ergebnis {
            let _ = tokio::fs::remove_file(&temp).await;
            tracing::warn!(schluessel, fehler = %e, "Secret konnte nicht geschrieben werden");
            return Err(e.into());
        }
        Ok(())
    }

    async fn loeschen(&self, schluessel: &str) -> ClientResult<()> {
        let pfad = self.pfad(schluessel)?;
        match tokio::fs::remove_file(&pfad).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn speicher_store_grundfunktionen() {
        let store = SpeicherSecretStore::neu();
        assert_eq!(store.lesen("draugar_sk").await.unwrap(), None);

        store.schreiben("draugar_sk", "abc").await.unwrap();
        assert_eq!(store.lesen("draugar_sk").await.unwrap().as_deref(), Some("abc"));

        store.loeschen("draugar_sk").await.unwrap();
        store.loeschen("draugar_sk").await.unwrap();
        assert_eq!(store.lesen("draugar_sk").await.unwrap(), None);
    }

    #[tokio::test]
    async fn datei_store_ueberlebt_neues_oeffnen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DateiSecretStore::neu(dir.path()).await.unwrap();
            store.schreiben("draugar_gk", "c2Nobw").await.unwrap();
        }
        let store = DateiSecretStore::neu(dir.path()).await.unwrap();
        assert_eq!(
            store.lesen("draugar_gk").await.unwrap().as_deref(),
            Some("c2Nobw")
        );
    }

    #[tokio::test]
    async fn datei_store_hinterlaesst_keine_temp_dateien() {
        let dir = tempfile::tempdir().unwrap();
        let store = DateiSecretStore::neu(dir.path()).await.unwrap();
        store.schreiben("draugar_pk", "eins").await.unwrap();
        store.schreiben("draugar_pk", "zwei").await.unwrap();

        let namen: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(namen, vec!["draugar_pk".to_string()]);
        assert_eq!(store.lesen("draugar_pk").await.unwrap().as_deref(), Some("zwei"));
    }

    #[tokio::test]
    async fn datei_store_loeschen_ist_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DateiSecretStore::neu(dir.path()).await.unwrap();
        store.schreiben("draugar_sk", "x").await.unwrap();
        store.loeschen("draugar_sk").await.unwrap();
        store.loeschen("draugar_sk").await.unwrap();
        assert_eq!(store.lesen("draugar_sk").await.unwrap(), None);
    }

    #[tokio::test]
    async fn datei_store_lehnt_pfad_namen_ab() {
        let dir = tempfile::tempdir().unwrap();
        let store = DateiSecretStore::neu(dir.path()).await.unwrap();
        for name in ["../draugar_sk", "a/b", "", "Gross"] {
            assert!(matches!(
                store.schreiben(name, "x").await,
                Err(ClientError::UngueltigerSchluesselName(_))
            ));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn datei_store_nur_fuer_besitzer_lesbar() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = DateiSecretStore::neu(dir.path()).await.unwrap();
        store.schreiben("draugar_sk", "geheim").await.unwrap();
        let modus = std::fs::metadata(dir.path().join("draugar_sk"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(modus & 0o777, 0o600);
    }
}
