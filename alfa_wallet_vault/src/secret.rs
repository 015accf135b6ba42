//! ALFA Wallet Vault - Sealed Wallet Secrets
//!
//! Seals one private key (hex) or mnemonic phrase under a passphrase. Every
//! seal draws a fresh salt and a fresh nonce, so sealing the same secret twice
//! never produces the same envelope.

use serde::{Deserialize, Serialize};

use crate::crypto::{
    derive_key, generate_nonce, generate_salt, open, seal, secure_erase_string, CipherSuite,
    KdfParams, SecretBytes, NONCE_LEN, SALT_LEN,
};
use crate::error::{VaultError, VaultResult};

/// Current envelope layout version
pub const SECRET_ENVELOPE_VERSION: u8 = 1;

/// A sealed private key or mnemonic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedSecret {
    #[serde(default = "default_version")]
    pub version: u8,
    #[serde(with = "crate::encoding")]
    pub salt: [u8; SALT_LEN],
    #[serde(with = "crate::encoding")]
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the 16-byte tag appended
    #[serde(with = "crate::encoding")]
    pub ciphertext: Vec<u8>,
    /// KDF used at seal time; unsealing always follows the envelope
    #[serde(default = "KdfParams::secret_default")]
    pub kdf: KdfParams,
    #[serde(default)]
    pub cipher: CipherSuite,
}

fn default_version() -> u8 {
    SECRET_ENVELOPE_VERSION
}

/// Decrypted secret text. Scrubbed on [`RevealedSecret::erase`] and on drop.
pub struct RevealedSecret {
    bytes: SecretBytes,
}

impl RevealedSecret {
    fn from_string(text: String) -> Self {
        Self {
            bytes: SecretBytes::new(text.into_bytes()),
        }
    }

    /// Borrow the secret text (lowercase hex for keys, the phrase for mnemonics)
    pub fn expose(&self) -> &str {
        // Only constructed from `String`, so always valid UTF-8.
        std::str::from_utf8(self.bytes.as_slice()).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Decode a hex secret into raw key bytes
    pub fn to_key_bytes(&self) -> VaultResult<SecretBytes> {
        decode_secret_hex(self.expose())
    }

    /// Scrub the plaintext now
    pub fn erase(&mut self) {
        self.bytes.erase();
    }

    pub fn is_erased(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for RevealedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RevealedSecret([REDACTED])")
    }
}

/// Seals and unseals wallet secrets
#[derive(Debug, Clone)]
pub struct SecretWallet {
    kdf: KdfParams,
    cipher: CipherSuite,
}

impl Default for SecretWallet {
    fn default() -> Self {
        Self::new(KdfParams::secret_default(), CipherSuite::default())
    }
}

impl SecretWallet {
    /// Create a sealer using `kdf` and `cipher` for new envelopes
    pub fn new(kdf: KdfParams, cipher: CipherSuite) -> Self {
        Self { kdf, cipher }
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Seal a hex private key (optional `0x`, odd length allowed)
    pub fn seal_secret(&self, secret_hex: &str, passphrase: &str) -> VaultResult<EncryptedSecret> {
        let raw = decode_secret_hex(secret_hex)?;
        self.seal_bytes(raw.as_slice(), passphrase)
    }

    /// Unseal a private key, returning normalized lowercase hex without prefix
    pub fn unseal_secret(
        &self,
        blob: &EncryptedSecret,
        passphrase: &str,
    ) -> VaultResult<RevealedSecret> {
        let raw = self.unseal_bytes(blob, passphrase)?;
        Ok(RevealedSecret::from_string(hex::encode(raw.as_slice())))
    }

    /// Seal a mnemonic phrase exactly as given; the words are opaque here
    pub fn seal_phrase(&self, phrase: &str, passphrase: &str) -> VaultResult<EncryptedSecret> {
        if phrase.trim().is_empty() {
            return Err(VaultError::InvalidInput("mnemonic phrase is empty".into()));
        }
        self.seal_bytes(phrase.as_bytes(), passphrase)
    }

    /// Unseal a mnemonic phrase
    pub fn unseal_phrase(
        &self,
        blob: &EncryptedSecret,
        passphrase: &str,
    ) -> VaultResult<RevealedSecret> {
        let raw = self.unseal_bytes(blob, passphrase)?;
        let text = std::str::from_utf8(raw.as_slice()).map_err(|_| VaultError::Decryption)?;
        Ok(RevealedSecret::from_string(text.to_owned()))
    }

    /// Unseal to raw bytes, for signing call sites that never need the hex form
    pub fn unseal_bytes(&self, blob: &EncryptedSecret, passphrase: &str) -> VaultResult<SecretBytes> {
        if blob.version != SECRET_ENVELOPE_VERSION {
            return Err(VaultError::InvalidInput(format!(
                "unsupported secret envelope version {}",
                blob.version
            )));
        }
        if let Err(e) = blob.kdf.check_bounds() {
            log::warn!("Rejected secret envelope: {}", e);
            return Err(VaultError::Decryption);
        }
        let key = derive_key(passphrase, &blob.salt, &blob.kdf).map_err(|e| match e {
            VaultError::InvalidInput(msg) => VaultError::InvalidInput(msg),
            _ => VaultError::Decryption,
        })?;
        open(blob.cipher, &key, &blob.nonce, &blob.ciphertext)
    }

    fn seal_bytes(&self, plaintext: &[u8], passphrase: &str) -> VaultResult<EncryptedSecret> {
        let salt = generate_salt();
        let key = derive_key(passphrase, &salt, &self.kdf)?;
        let nonce = generate_nonce();
        let ciphertext = seal(self.cipher, &key, &nonce, plaintext)?;

        Ok(EncryptedSecret {
            version: SECRET_ENVELOPE_VERSION,
            salt,
            nonce,
            ciphertext,
            kdf: self.kdf,
            cipher: self.cipher,
        })
    }
}

/// Normalize and decode a hex secret
///
/// Strips an optional `0x`/`0X` prefix and left-pads odd lengths with `0`.
pub fn decode_secret_hex(input: &str) -> VaultResult<SecretBytes> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(VaultError::InvalidInput("secret hex is empty".into()));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(VaultError::InvalidInput("secret is not valid hex".into()));
    }

    let mut padded = String::with_capacity(digits.len() + 1);
    if digits.len() % 2 == 1 {
        padded.push('0');
    }
    padded.push_str(digits);

    let decoded = hex::decode(padded.as_bytes())
        .map_err(|e| VaultError::InvalidInput(format!("secret is not valid hex: {}", e)));
    secure_erase_string(&mut padded);

    decoded.map(SecretBytes::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> SecretWallet {
        SecretWallet::new(KdfParams::argon2id(1024, 1, 1), CipherSuite::Aes256Gcm)
    }

    #[test]
    fn test_roundtrip_strips_prefix() {
        let secret = format!("0x{}", "ab".repeat(32));
        let sealed = wallet().seal_secret(&secret, "correct horse battery staple").unwrap();
        let revealed = wallet()
            .unseal_secret(&sealed, "correct horse battery staple")
            .unwrap();
        assert_eq!(revealed.expose(), "ab".repeat(32));
    }

    #[test]
    fn test_wrong_passphrase_is_decryption_error() {
        let sealed = wallet().seal_secret(&"ab".repeat(32), "correct horse battery staple").unwrap();
        let err = wallet().unseal_secret(&sealed, "wrong").unwrap_err();
        assert!(matches!(err, VaultError::Decryption));
    }

    #[test]
    fn test_fresh_salt_and_nonce() {
        let a = wallet().seal_secret("deadbeef", "pw").unwrap();
        let b = wallet().seal_secret("deadbeef", "pw").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_eq!(wallet().unseal_secret(&a, "pw").unwrap().expose(), "deadbeef");
        assert_eq!(wallet().unseal_secret(&b, "pw").unwrap().expose(), "deadbeef");
    }

    #[test]
    fn test_odd_length_and_uppercase_normalized() {
        let sealed = wallet().seal_secret("0XABC", "pw").unwrap();
        assert_eq!(wallet().unseal_secret(&sealed, "pw").unwrap().expose(), "0abc");
    }

    #[test]
    fn test_malformed_hex_rejected() {
        for bad in ["", "0x", "zz", "0xg1", "12 34"] {
            let err = wallet().seal_secret(bad, "pw").unwrap_err();
            assert!(matches!(err, VaultError::InvalidInput(_)), "input {:?}", bad);
        }
    }

    #[test]
    fn test_tamper_detected() {
        let sealed = wallet().seal_secret("00112233", "pw").unwrap();
        for i in 0..sealed.ciphertext.len() {
            let mut tampered = sealed.clone();
            tampered.ciphertext[i] ^= 0x80;
            assert!(matches!(
                wallet().unseal_secret(&tampered, "pw"),
                Err(VaultError::Decryption)
            ));
        }
    }

    #[test]
    fn test_phrase_roundtrip_and_erase() {
        let phrase = "abandon ability able about above absent absorb abstract absurd abuse access accident";
        let sealed = wallet().seal_phrase(phrase, "pw").unwrap();
        let mut revealed = wallet().unseal_phrase(&sealed, "pw").unwrap();
        assert_eq!(revealed.expose(), phrase);
        revealed.erase();
        assert!(revealed.is_erased());
        assert_eq!(revealed.expose(), "");
    }

    #[test]
    fn test_phrase_is_sealed_verbatim() {
        let phrase = "  legal winner thank year wave sausage worth useful legal winner thank yellow\n";
        let sealed = wallet().seal_phrase(phrase, "pw").unwrap();
        assert_eq!(wallet().unseal_phrase(&sealed, "pw").unwrap().expose(), phrase);
        assert!(matches!(
            wallet().seal_phrase(" \t ", "pw"),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_envelope_uses_own_kdf_params() {
        let sealed = SecretWallet::new(KdfParams::pbkdf2(1_000), CipherSuite::ChaCha20Poly1305)
            .seal_secret("cafe", "pw")
            .unwrap();
        // A sealer configured differently still opens it.
        assert_eq!(wallet().unseal_secret(&sealed, "pw").unwrap().expose(), "cafe");
    }

    #[test]
    fn test_corrupted_kdf_params_fail_closed() {
        let sealed = wallet().seal_secret("abcd", "pw").unwrap();
        for kdf in [
            KdfParams::argon2id(u32::MAX, 1, 1),
            KdfParams::argon2id(1024, u32::MAX, 1),
            KdfParams::argon2id(1024, 1, u32::MAX),
            KdfParams::pbkdf2(0),
            KdfParams::pbkdf2(u32::MAX),
        ] {
            let mut tampered = sealed.clone();
            tampered.kdf = kdf;
            assert!(
                matches!(wallet().unseal_secret(&tampered, "pw"), Err(VaultError::Decryption)),
                "{:?}",
                kdf
            );
        }

        let mut swapped = sealed.clone();
        swapped.kdf = KdfParams::pbkdf2(1_000);
        assert!(matches!(
            wallet().unseal_secret(&swapped, "pw"),
            Err(VaultError::Decryption)
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let sealed = wallet().seal_secret("cafe", "pw").unwrap();
        let json = serde_json::to_string(&sealed).unwrap();
        assert!(json.contains("\"salt\""));
        assert!(json.contains("\"ciphertext\""));
        let back: EncryptedSecret = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sealed);
    }

    #[test]
    fn test_key_bytes() {
        let sealed = wallet().seal_secret("0x0102", "pw").unwrap();
        let revealed = wallet().unseal_secret(&sealed, "pw").unwrap();
        assert_eq!(revealed.to_key_bytes().unwrap().as_slice(), &[1u8, 2]);
    }
}
