//! ALFA Wallet Vault - Secure Erase
//!
//! Best-effort scrubbing of buffers that held decrypted secrets: random
//! bytes first, zeros second, both in place.
//!
//! This cannot reach copies made elsewhere (reallocations, temporaries the
//! compiler spills, pages the OS swapped out). Secret material is therefore
//! kept in owned byte buffers end-to-end and copied as little as possible.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

/// Overwrite `buffer` with random bytes, then with zeros
pub fn secure_erase(buffer: &mut [u8]) {
    if buffer.is_empty() {
        return;
    }
    OsRng.fill_bytes(buffer);
    buffer.zeroize();
}

/// Erase a vector's full capacity and truncate it to zero length
pub fn secure_erase_vec(buffer: &mut Vec<u8>) {
    let len = buffer.len();
    buffer.resize(buffer.capacity(), 0);
    secure_erase(buffer.as_mut_slice());
    buffer.truncate(len);
    buffer.clear();
}

/// Erase a string in place and leave it empty
pub fn secure_erase_string(s: &mut String) {
    let mut bytes = std::mem::take(s).into_bytes();
    secure_erase_vec(&mut bytes);
}

/// Owned byte buffer that is securely erased on drop
pub struct SecretBytes {
    data: Vec<u8>,
}

impl SecretBytes {
    /// Take ownership of `data`
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Copy a slice into a new buffer
    pub fn from_slice(slice: &[u8]) -> Self {
        Self {
            data: slice.to_vec(),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Scrub now instead of waiting for drop
    pub fn erase(&mut self) {
        secure_erase_vec(&mut self.data);
    }
}

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.erase();
    }
}

impl std::ops::Deref for SecretBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.data.len())
    }
}
