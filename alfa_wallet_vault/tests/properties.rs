//! End-to-end checks of the vault's security properties.

use std::collections::BTreeMap;

use alfa_wallet_vault::carrier;
use alfa_wallet_vault::crypto::{derive_key, open, seal, CipherSuite, KdfParams};
use alfa_wallet_vault::store::{CollectionSchema, IndexSchema, PartitionLocks, PartitionManager};
use alfa_wallet_vault::{
    handle_for, DatabaseVault, NewWallet, SecretWallet, VaultError, VaultSnapshot, WalletVaultApi,
    WalletVaultConfig,
};
use proptest::prelude::*;
use serde_json::json;
use tempfile::{tempdir, TempDir};

const PASS: &str = "correct horse battery staple";

fn cheap_kdf() -> KdfParams {
    KdfParams::argon2id(1024, 1, 1)
}

fn sealer() -> SecretWallet {
    SecretWallet::new(cheap_kdf(), CipherSuite::Aes256Gcm)
}

fn api() -> (TempDir, WalletVaultApi) {
    let dir = tempdir().unwrap();
    let mut config = WalletVaultConfig::with_data_dir(dir.path());
    config.secret_kdf = cheap_kdf();
    config.vault_kdf = cheap_kdf();
    config.storage_retry_backoff_ms = 1;
    (dir, WalletVaultApi::new(config).unwrap())
}

fn vault(dir: &TempDir) -> DatabaseVault {
    DatabaseVault::new(
        PartitionManager::new(dir.path()).unwrap(),
        PartitionLocks::new(),
        cheap_kdf(),
    )
}

/// Records of every collection, order-insensitive
fn record_multiset(snapshot: &VaultSnapshot) -> BTreeMap<String, Vec<String>> {
    snapshot
        .records
        .iter()
        .map(|(name, records)| {
            let mut rows: Vec<String> = records.iter().map(|r| r.to_string()).collect();
            rows.sort();
            (name.clone(), rows)
        })
        .collect()
}

// 1. round-trip
proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn secret_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 1..64), upper in any::<bool>()) {
        let mut hex = hex::encode(&bytes);
        if upper {
            hex = format!("0x{}", hex.to_uppercase());
        }
        let sealed = sealer().seal_secret(&hex, PASS).unwrap();
        let revealed = sealer().unseal_secret(&sealed, PASS).unwrap();
        prop_assert_eq!(revealed.expose(), hex::encode(&bytes));
    }
}

// 2. wrong-key rejection
#[test]
fn wrong_passphrase_is_rejected() {
    let sealed = sealer().seal_secret("0x1234", PASS).unwrap();
    for wrong in ["", "correct horse battery stapl", "Correct horse battery staple"] {
        assert!(matches!(
            sealer().unseal_secret(&sealed, wrong),
            Err(VaultError::Decryption) | Err(VaultError::InvalidInput(_))
        ));
    }
    let err = sealer().unseal_secret(&sealed, "wrong").unwrap_err();
    assert_eq!(err.to_string(), "Incorrect passphrase or corrupted data");
}

// 3. salt and nonce freshness
#[test]
fn salts_and_nonces_never_repeat() {
    let mut salts = std::collections::HashSet::new();
    let mut nonces = std::collections::HashSet::new();
    for _ in 0..16 {
        let sealed = sealer().seal_secret("ab", PASS).unwrap();
        assert!(salts.insert(sealed.salt));
        assert!(nonces.insert(sealed.nonce));
    }
}

// 4. tamper detection at the AEAD layer
#[test]
fn any_flipped_byte_fails_authentication() {
    let salt = [7u8; 16];
    let nonce = [9u8; 12];
    let key = derive_key(PASS, &salt, &cheap_kdf()).unwrap();
    for suite in [CipherSuite::Aes256Gcm, CipherSuite::ChaCha20Poly1305] {
        let sealed = seal(suite, &key, &nonce, b"wallet secret").unwrap();
        for i in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            assert!(matches!(
                open(suite, &key, &nonce, &tampered),
                Err(VaultError::Decryption)
            ));
        }
        assert!(matches!(
            open(suite, &key, &nonce, &sealed[..15]),
            Err(VaultError::Decryption)
        ));
    }
}

// 5. handle determinism and alphabet
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn handles_are_deterministic_and_storage_safe(passphrase in ".*") {
        let a = handle_for(&passphrase);
        let b = handle_for(&passphrase);
        prop_assert_eq!(&a, &b);
        prop_assert!(a.as_str().starts_with("bp_"));
        prop_assert_eq!(a.as_str().len(), 46);
        prop_assert!(a
            .as_str()
            .bytes()
            .all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_'));
    }
}

// 6. vault round-trip
#[test]
fn vault_roundtrip_preserves_schemas_and_records() {
    let dir = tempdir().unwrap();
    let vault = vault(&dir);
    let manager = PartitionManager::new(dir.path()).unwrap();

    let partition = manager
        .create(
            "bp_roundtrip",
            4,
            &[
                CollectionSchema::keyed("wallets", "id")
                    .with_index("network", IndexSchema::new("network"))
                    .with_index("address", IndexSchema::new("address").unique()),
                CollectionSchema::keyed("history", "seq")
                    .auto_increment()
                    .with_index("tags", IndexSchema::new("tags").multi_entry()),
            ],
        )
        .unwrap();
    for i in 0..25 {
        partition
            .put(
                "wallets",
                json!({"id": format!("w{}", i), "network": "eth", "address": format!("0x{:02x}", i)}),
            )
            .unwrap();
        partition
            .add("history", json!({"kind": "tx", "tags": ["in", format!("n{}", i % 3)]}))
            .unwrap();
    }
    let before = VaultSnapshot::capture(&partition).unwrap();
    drop(partition);

    let blob = vault.export_vault("bp_roundtrip", PASS).unwrap();
    manager.delete("bp_roundtrip").unwrap();
    assert_eq!(vault.import_vault(&blob, PASS).unwrap(), "bp_roundtrip");

    let after = VaultSnapshot::capture(&manager.open("bp_roundtrip").unwrap()).unwrap();
    assert_eq!(after.collections, before.collections);
    assert_eq!(after.schema_version, 4);
    assert_eq!(record_multiset(&after), record_multiset(&before));

    let restored = manager.open("bp_roundtrip").unwrap();
    assert_eq!(
        restored.find_by_index("history", "tags", &json!("n1")).unwrap().len(),
        8
    );
}

// 7. vault wrong passphrase is non-destructive
#[test]
fn vault_wrong_passphrase_changes_nothing() {
    let (dir, api) = api();
    let handle = api.create_account(PASS).unwrap();
    api.unlock(PASS).unwrap();
    api.add_wallet(&NewWallet::new("0xabc", "ethereum", "0x01")).unwrap();
    api.lock();

    let transport = api.export_vault(handle.as_str(), "backup passphrase").unwrap();
    let db = dir.path().join(format!("{}.db", handle));
    let before = std::fs::read(&db).unwrap();

    let err = api.import_vault(&transport, "not the backup passphrase").unwrap_err();
    assert!(matches!(err, VaultError::Decryption));
    assert!(!err.is_data_loss());
    assert_eq!(std::fs::read(&db).unwrap(), before);
}

// 8. image round-trip
proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn image_roundtrip(payload in "[A-Za-z0-9+/=]{0,4096}") {
        let carrier_png = carrier::generate_carrier(4096).unwrap();
        let stego = carrier::embed(&carrier_png, &payload).unwrap();
        prop_assert_eq!(carrier::extract(&stego).unwrap(), payload);
    }
}

#[test]
fn image_roundtrip_edge_sizes() {
    let carrier_png = carrier::generate_carrier(8 * 1024).unwrap();
    let multi_kb = "Zm9v".repeat(2048);
    for payload in ["", "A", multi_kb.as_str()] {
        let stego = carrier::embed(&carrier_png, payload).unwrap();
        assert_eq!(carrier::extract(&stego).unwrap(), payload);
    }
}

// 9. image negative case
#[test]
fn plain_png_has_no_backup() {
    let plain = carrier::generate_carrier(64).unwrap();
    assert!(matches!(carrier::extract(&plain), Err(VaultError::NotFound)));

    let (_dir, api) = api();
    assert!(matches!(
        api.import_from_image(&plain, PASS),
        Err(VaultError::NotFound)
    ));
}

// 10. the reference scenario
#[test]
fn correct_horse_battery_staple() {
    let secret = format!("0x{}", "ab".repeat(32));
    let blob = sealer().seal_secret(&secret, PASS).unwrap();

    let revealed = sealer().unseal_secret(&blob, PASS).unwrap();
    assert_eq!(revealed.expose(), "ab".repeat(32));
    assert!(matches!(
        sealer().unseal_secret(&blob, "wrong"),
        Err(VaultError::Decryption)
    ));

    let handle = handle_for(PASS);
    assert_eq!(handle, handle_for(PASS));
    assert!(handle.as_str().starts_with("bp_"));
    assert_eq!(handle.as_str().len(), 46);
}

#[test]
fn full_backup_through_image_restores_wallets() {
    let (_dir, api) = api();
    let handle = api.create_account(PASS).unwrap();
    api.unlock(PASS).unwrap();
    let wallet = api
        .add_wallet(
            &NewWallet::new("0xabc", "ethereum", &"ab".repeat(32))
                .with_mnemonic("abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about"),
        )
        .unwrap();
    api.lock();

    let png = api.export_to_image(handle.as_str(), "backup passphrase", None).unwrap();
    api.accounts().delete_account(&handle).unwrap();
    assert!(matches!(api.unlock(PASS), Err(VaultError::Decryption)));

    api.import_from_image(&png, "backup passphrase").unwrap();
    api.unlock(PASS).unwrap();
    assert_eq!(api.reveal_private_key(&wallet.id).unwrap().expose(), "ab".repeat(32));
    assert!(api.reveal_mnemonic(&wallet.id).unwrap().is_some());
}

#[tokio::test]
async fn async_export_import_roundtrip() {
    let (_dir, api) = api();
    let handle = api.create_account(PASS).unwrap();

    let transport = api
        .export_vault_async(handle.to_string(), "backup passphrase".to_string())
        .await
        .unwrap();
    let restored = api
        .import_vault_async(transport, "backup passphrase".to_string())
        .await
        .unwrap();
    assert_eq!(restored, handle.as_str());

    let png = api
        .export_to_image_async(handle.to_string(), "backup passphrase".to_string(), None)
        .await
        .unwrap();
    let restored = api
        .import_from_image_async(png, "backup passphrase".to_string())
        .await
        .unwrap();
    assert_eq!(restored, handle.as_str());
}
