use core_logic::{CoreError, SecurityError, SecurityUtils, WalletError, WalletManager};
use std::fs;
use tempfile::tempdir;

const KEY_A: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const KEY_B: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

#[test]
fn test_load_plain_keys_skips_comments_and_blanks() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wallets.txt");
    fs::write(&path, format!("# main wallets\n{}\n\n  0x{}  \n", KEY_A, KEY_B)).unwrap();

    let keys = WalletManager::load_keys(&path, None).unwrap();

    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].private_key, KEY_A);
    assert_eq!(keys[1].private_key, format!("0x{}", KEY_B));
    assert!(!WalletManager::has_encrypted_keys(&path).unwrap());
}

#[test]
fn test_load_mixed_encrypted_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wallets.txt");
    let encrypted = SecurityUtils::encrypt_key(KEY_B, "secret").unwrap();
    fs::write(&path, format!("{}\n{}\n", KEY_A, encrypted)).unwrap();

    assert!(WalletManager::has_encrypted_keys(&path).unwrap());

    let keys = WalletManager::load_keys(&path, Some("secret")).unwrap();
    assert_eq!(keys[0].private_key, KEY_A);
    assert_eq!(keys[1].private_key, KEY_B);
}

#[test]
fn test_encrypted_key_without_password() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wallets.txt");
    let encrypted = SecurityUtils::encrypt_key(KEY_A, "secret").unwrap();
    fs::write(&path, encrypted).unwrap();

    let result = WalletManager::load_keys(&path, None);
    assert!(matches!(
        result,
        Err(CoreError::Security(SecurityError::PasswordRequired))
    ));
}

#[test]
fn test_wrong_password_names_the_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wallets.txt");
    let encrypted = SecurityUtils::encrypt_key(KEY_A, "secret").unwrap();
    fs::write(&path, format!("# header\n{}\n", encrypted)).unwrap();

    match WalletManager::load_keys(&path, Some("wrong")) {
        Err(CoreError::Wallet(WalletError::DecryptionFailed { line, .. })) => assert_eq!(line, 2),
        other => panic!("Expected DecryptionFailed, got {:?}", other),
    }
}

#[test]
fn test_garbage_key_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wallets.txt");
    fs::write(&path, format!("{}\nnot-a-key\n", KEY_A)).unwrap();

    assert!(matches!(
        WalletManager::load_keys(&path, None),
        Err(CoreError::Wallet(WalletError::InvalidKeyFormat { line: 2 }))
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let result = WalletManager::load_addresses(&dir.path().join("nope.txt"));
    assert!(matches!(result, Err(CoreError::Config(_))));
}

#[test]
fn test_load_addresses() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("addresses.txt");
    fs::write(&path, "fuel1abc\n\n# skip\nfuel1def\n").unwrap();

    let addresses = WalletManager::load_addresses(&path).unwrap();
    assert_eq!(addresses, vec!["fuel1abc", "fuel1def"]);
}

#[test]
fn test_encrypt_key_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt");
    let output = dir.path().join("encrypted.txt");
    fs::write(&input, format!("{}\n{}\n", KEY_A, KEY_B)).unwrap();

    let written = WalletManager::encrypt_key_file(&input, &output, "secret").unwrap();
    assert_eq!(written, 2);

    let content = fs::read_to_string(&output).unwrap();
    assert!(!content.contains(KEY_A));

    let keys = WalletManager::load_keys(&output, Some("secret")).unwrap();
    assert_eq!(keys[0].private_key, KEY_A);
    assert_eq!(keys[1].private_key, KEY_B);
}
