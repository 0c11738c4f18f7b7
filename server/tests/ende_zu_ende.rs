//! Ende-zu-Ende: zwei Geraete ueber echte Sockets
//!
//! A registriert sich und erzeugt damit die Gruppe, B registriert sich und
//! erhaelt denselben Gruppen-Schluessel. Ein Standort von A kommt bei B
//! entschluesselt und unveraendert an.

use std::sync::Arc;
use std::time::Duration;

use draugar_client::{
    sitzung_abgleichen, ClientKeyStore, EmpfangenerStandort, KeyApi, KeyApiClient,
    KeyStoreZustand, RealtimeClient, RealtimeKonfig, SpeicherSecretStore,
};
use draugar_core::MemberId;
use draugar_crypto::CryptoContext;
use draugar_protocol::LocationRecord;
use draugar_server::config::{ServerConfig, TOKEN_SECRET_ENV};
use draugar_server::{LaufenderServer, Server};
use tokio::sync::mpsc;

const SECRET: &str = "ende-zu-ende-secret-mit-mehr-als-32-bytes";

fn test_config() -> ServerConfig {
    let mut cfg = ServerConfig::default();
    cfg.netzwerk.bind_adresse = "127.0.0.1".into();
    cfg.netzwerk.api_port = 0;
    cfg.netzwerk.realtime_port = 0;
    cfg.observability.aktiviert = false;
    cfg.auth.token_secret = Some(SECRET.into());
    cfg
}

async fn server_starten() -> LaufenderServer {
    Server::neu(test_config()).binden().await.unwrap()
}

struct Geraet {
    id: MemberId,
    token: String,
    api: KeyApiClient,
    key_store: Arc<ClientKeyStore<SpeicherSecretStore>>,
}

fn geraet(server: &LaufenderServer, name: &str) -> Geraet {
    let id = MemberId::new();
    let token = server.auth_service.ausstellen(id, name).unwrap();
    Geraet {
        id,
        api: KeyApiClient::neu(server.api_url(), token.clone()),
        token,
        key_store: Arc::new(ClientKeyStore::neu(
            SpeicherSecretStore::neu(),
            CryptoContext::neu().unwrap(),
        )),
    }
}

async fn echtzeit(
    server: &LaufenderServer,
    g: &Geraet,
) -> (
    RealtimeClient<SpeicherSecretStore>,
    mpsc::Receiver<EmpfangenerStandort>,
) {
    let konfig = RealtimeKonfig::neu(server.realtime_addr.to_string(), g.token.clone());
    RealtimeClient::verbinden(konfig, Arc::clone(&g.key_store))
        .await
        .unwrap()
}

#[tokio::test]
async fn standort_kommt_beim_anderen_mitglied_an() {
    let server = server_starten().await;
    let a = geraet(&server, "Anna");
    let b = geraet(&server, "Bjarki");

    assert_eq!(a.api.health().await.unwrap().status, "ok");
    let ich = a.api.ich().await.unwrap();
    assert_eq!((ich.id, ich.name.as_str()), (a.id, "Anna"));

    assert_eq!(
        sitzung_abgleichen(&a.key_store, &a.api).await.unwrap(),
        KeyStoreZustand::HatGruppenSchluessel
    );
    assert_eq!(
        sitzung_abgleichen(&b.key_store, &b.api).await.unwrap(),
        KeyStoreZustand::HatGruppenSchluessel
    );

    let paket_a = a.api.gruppen_schluessel_abrufen().await.unwrap().unwrap();
    assert_eq!(paket_a.key_version, 1);

    let k_a = a.key_store.gruppen_schluessel().await.unwrap().unwrap();
    let k_b = b.key_store.gruppen_schluessel().await.unwrap().unwrap();
    assert_eq!(k_a, k_b);

    let (client_a, mut eingang_a) = echtzeit(&server, &a).await;
    let (client_b, mut eingang_b) = echtzeit(&server, &b).await;
    assert_eq!(client_b.identitaet().member_id, b.id);
    assert_eq!(client_b.identitaet().display_name, "Bjarki");

    let record = LocationRecord {
        lat: 64.1,
        lon: -21.9,
        accuracy: 5.0,
        ts: 1_760_000_000_000,
    };

    // Bis B tatsaechlich im Relay angemeldet ist, wiederholen
    let empfangen = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            assert!(client_a.standort_senden(&record).await.unwrap());
            if let Ok(Some(s)) =
                tokio::time::timeout(Duration::from_millis(200), eingang_b.recv()).await
            {
                return s;
            }
        }
    })
    .await
    .expect("B hat keinen Standort erhalten");

    assert_eq!(empfangen.sender_id, a.id);
    assert_eq!(empfangen.sender_name, "Anna");
    assert_eq!(empfangen.record, record);

    // Der Absender bekommt sein eigenes Update nicht zurueck
    assert!(eingang_a.try_recv().is_err());

    client_a.trennen().await;
    client_b.trennen().await;
    server.beenden().await.unwrap();
}

#[tokio::test]
async fn geistermodus_sendet_nichts() {
    let server = server_starten().await;
    let a = geraet(&server, "Anna");
    sitzung_abgleichen(&a.key_store, &a.api).await.unwrap();

    let (client_a, _eingang) = echtzeit(&server, &a).await;
    client_a.geistermodus_setzen(true).await.unwrap();

    let record = LocationRecord {
        lat: 1.0,
        lon: 2.0,
        accuracy: 3.0,
        ts: 4,
    };
    assert!(!client_a.standort_senden(&record).await.unwrap());

    client_a.trennen().await;
    server.beenden().await.unwrap();
}

#[tokio::test]
async fn fremdes_token_wird_ueberall_abgelehnt() {
    let server = server_starten().await;
    let fremd = draugar_auth::AuthService::neu(vec![9u8; 32])
        .unwrap()
        .ausstellen(MemberId::new(), "Eindringling")
        .unwrap();

    let api = KeyApiClient::neu(server.api_url(), fremd.clone());
    assert!(matches!(
        api.ich().await,
        Err(draugar_client::ClientError::NichtAuthentifiziert)
    ));
    assert!(matches!(
        api.gruppen_schluessel_abrufen().await,
        Err(draugar_client::ClientError::NichtAuthentifiziert)
    ));

    let store = Arc::new(ClientKeyStore::neu(
        SpeicherSecretStore::neu(),
        CryptoContext::neu().unwrap(),
    ));
    let konfig = RealtimeKonfig::neu(server.realtime_addr.to_string(), fremd);
    assert!(matches!(
        RealtimeClient::verbinden(konfig, store).await,
        Err(draugar_client::ClientError::NichtAuthentifiziert)
    ));
    assert_eq!(server.signaling.online_anzahl(), 0);

    server.beenden().await.unwrap();
}

#[tokio::test]
async fn ohne_secret_startet_der_server_nicht() {
    if std::env::var(TOKEN_SECRET_ENV).is_ok() {
        return;
    }
    let mut cfg = test_config();
    cfg.auth.token_secret = None;
    assert!(Server::neu(cfg).binden().await.is_err());

    let mut cfg = test_config();
    cfg.auth.token_secret = Some("zu-kurz".into());
    assert!(Server::neu(cfg).binden().await.is_err());
}
