//! End-to-end archive and retrieve against mock HTTP storage.

#![cfg(feature = "http-transport")]

use std::sync::OnceLock;

use evidence_lib::keys::KeyPair;
use evidence_lib::transfer::{FailoverTransfer, TransferConfig};
use evidence_lib::vault::EvidenceVault;
use evidence_lib::{fingerprint, EvidenceError};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn recipient() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| KeyPair::generate().unwrap())
}

async fn uploaded_body(server: &MockServer) -> Vec<u8> {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    requests[0].body.clone()
}

fn vault(pin: &MockServer, gateway: &MockServer) -> EvidenceVault<FailoverTransfer> {
    let config = TransferConfig::new(vec![pin.uri()], vec![format!("{}/ipfs", gateway.uri())]).with_timeout(5);
    EvidenceVault::new(FailoverTransfer::from_config(&config).unwrap())
}

#[tokio::test]
async fn test_sealed_archive_and_retrieve() {
    let pin = MockServer::start().await;
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "cid": "bafyevidence" })))
        .mount(&pin)
        .await;

    let vault = vault(&pin, &gateway);
    let archived = vault
        .archive(b"internal audit, draft 3", Some(recipient().public_key()))
        .await
        .unwrap();
    assert_eq!(archived.handle, "bafyevidence");

    let stored = uploaded_body(&pin).await;
    assert_eq!(fingerprint(&stored), archived.fingerprint);
    assert!(!stored
        .windows(b"internal audit".len())
        .any(|w| w == b"internal audit"));

    Mock::given(method("GET"))
        .and(path("/ipfs/bafyevidence"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(stored))
        .mount(&gateway)
        .await;

    let opened = vault
        .retrieve("bafyevidence", &archived.fingerprint, Some(recipient().private_key()))
        .await
        .unwrap();
    assert_eq!(opened, b"internal audit, draft 3");
}

#[tokio::test]
async fn test_gateway_serving_altered_bytes_is_caught() {
    let pin = MockServer::start().await;
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "cid": "bafyevidence" })))
        .mount(&pin)
        .await;

    let vault = vault(&pin, &gateway);
    let archived = vault
        .archive(b"ledger export", Some(recipient().public_key()))
        .await
        .unwrap();

    let mut altered = uploaded_body(&pin).await;
    let last = altered.len() - 1;
    altered[last] ^= 0x01;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(altered))
        .mount(&gateway)
        .await;

    let result = vault
        .retrieve("bafyevidence", &archived.fingerprint, Some(recipient().private_key()))
        .await;
    assert!(matches!(result, Err(EvidenceError::FingerprintMismatch { .. })));
}

#[tokio::test]
async fn test_unsealed_archive_fingerprints_plaintext() {
    let pin = MockServer::start().await;
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("QmPublic"))
        .mount(&pin)
        .await;

    let vault = vault(&pin, &gateway);
    let archived = vault.archive(b"press release", None).await.unwrap();

    assert!(!archived.sealed);
    assert_eq!(archived.fingerprint, fingerprint(b"press release"));
    assert_eq!(uploaded_body(&pin).await, b"press release");
}
