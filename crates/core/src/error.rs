//! Fehlertypen fuer Draugar
//!
//! Getaggte Fehler-Taxonomie an allen Service-Grenzen. Jedes Crate definiert
//! eigene Fehler und konvertiert via `From` in [`DraugarError`]; Aufrufer
//! entscheiden per erschoepfendem `match` ueber [`FehlerArt`].

use thiserror::Error;

/// Globaler Result-Alias fuer Draugar
pub type Result<T> = std::result::Result<T, DraugarError>;

/// Alle Fehlerklassen an den Grenzen des Kerns
#[derive(Debug, Error)]
pub enum DraugarError {
    /// Fehlerhafte Eingabe, abgelehnt bevor ein Zustand veraendert wurde
    #[error("Validierungsfehler: {0}")]
    Validierung(String),

    /// Fehlendes, abgelaufenes oder ungueltiges Token (bewusst ohne Grund)
    #[error("Nicht authentifiziert")]
    NichtAuthentifiziert,

    /// Ver- oder Entschluesselung fehlgeschlagen
    #[error("Kryptografiefehler: {0}")]
    Krypto(String),

    /// Mitglied ohne Schluessel oder keine Gruppe vorhanden
    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Diskriminante von [`DraugarError`] ohne Nutzdaten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FehlerArt {
    Validierung,
    NichtAuthentifiziert,
    Krypto,
    NichtGefunden,
    Intern,
}

impl DraugarError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Erstellt einen Validierungsfehler
    pub fn validierung(msg: impl Into<String>) -> Self {
        Self::Validierung(msg.into())
    }

    /// Erstellt einen Nicht-gefunden-Fehler
    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }

    /// Klassifiziert den Fehler
    pub fn art(&self) -> FehlerArt {
        match self {
            Self::Validierung(_) => FehlerArt::Validierung,
            Self::NichtAuthentifiziert => FehlerArt::NichtAuthentifiziert,
            Self::Krypto(_) => FehlerArt::Krypto,
            Self::NichtGefunden(_) => FehlerArt::NichtGefunden,
            Self::Intern(_) | Self::Anyhow(_) => FehlerArt::Intern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = DraugarError::validierung("Invalid public key format");
        assert_eq!(
            e.to_string(),
            "Validierungsfehler: Invalid public key format"
        );
    }

    #[test]
    fn auth_fehler_verraet_keinen_grund() {
        assert_eq!(
            DraugarError::NichtAuthentifiziert.to_string(),
            "Nicht authentifiziert"
        );
    }

    #[test]
    fn art_klassifizierung() {
        assert_eq!(
            DraugarError::nicht_gefunden("x").art(),
            FehlerArt::NichtGefunden
        );
        assert_eq!(DraugarError::Krypto("x".into()).art(), FehlerArt::Krypto);
        assert_eq!(
            DraugarError::from(anyhow::anyhow!("boom")).art(),
            FehlerArt::Intern
        );
    }
}
