//! ALFA Wallet Vault - Image Carrier
//!
//! Hides a backup transport string in the least significant bits of a PNG.
//!
//! Frame layout, written MSB-first into the low bit of the R, G and B
//! channels in pixel order (alpha is never touched):
//!
//! ```text
//! "ALFW" | payload length (u32 BE) | payload | SHA-256(payload)[..4]
//! ```
//!
//! This conceals a backup, it does not protect it: the payload is already
//! sealed by the vault cipher before it gets here.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use sha2::{Digest, Sha256};

use crate::error::{VaultError, VaultResult};

/// Frame marker
pub const CARRIER_MAGIC: &[u8; 4] = b"ALFW";

/// Magic plus length prefix
pub const FRAME_HEADER_LEN: usize = 8;

/// Truncated SHA-256 trailer
pub const CHECKSUM_LEN: usize = 4;

/// Payload bits carried per pixel
const BITS_PER_PIXEL: usize = 3;

/// Width of generated carriers
const GENERATED_WIDTH: u32 = 256;

/// Hide `transport` inside `carrier`, returning a new PNG
pub fn embed(carrier: &[u8], transport: &str) -> VaultResult<Vec<u8>> {
    embed_bytes(carrier, transport.as_bytes())
}

/// Recover a transport string hidden by [`embed`]
pub fn extract(image_bytes: &[u8]) -> VaultResult<String> {
    let payload = extract_bytes(image_bytes)?;
    String::from_utf8(payload).map_err(|_| VaultError::NotFound)
}

/// Hide arbitrary bytes inside `carrier`
pub fn embed_bytes(carrier: &[u8], payload: &[u8]) -> VaultResult<Vec<u8>> {
    let mut img = image::load_from_memory(carrier)?.to_rgba8();
    let frame = build_frame(payload)?;

    let available = capacity_of(&img);
    if payload.len() > available {
        return Err(VaultError::InvalidInput(format!(
            "carrier image too small: {} bytes fit, {} needed",
            available,
            payload.len()
        )));
    }

    let buf: &mut [u8] = &mut img;
    let bits = frame
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1));
    for (k, bit) in bits.enumerate() {
        let slot = channel_slot(k);
        buf[slot] = (buf[slot] & !1) | bit;
    }

    let encoded = encode_png(img)?;
    log::debug!(
        "Embedded {} payload bytes into a {} byte PNG",
        payload.len(),
        encoded.len()
    );
    Ok(encoded)
}

/// Recover bytes hidden by [`embed_bytes`]. Anything that is not a
/// well-formed frame is `NotFound`.
pub fn extract_bytes(image_bytes: &[u8]) -> VaultResult<Vec<u8>> {
    let img = match image::load_from_memory(image_bytes) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            log::debug!("Carrier did not decode: {}", e);
            return Err(VaultError::NotFound);
        }
    };
    let buf: &[u8] = &img;
    let total_bytes = buf.len() / 4 * BITS_PER_PIXEL / 8;

    if total_bytes < FRAME_HEADER_LEN + CHECKSUM_LEN {
        return Err(VaultError::NotFound);
    }

    let header = read_bytes(buf, 0, FRAME_HEADER_LEN);
    if &header[..4] != CARRIER_MAGIC {
        return Err(VaultError::NotFound);
    }
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if len > total_bytes - FRAME_HEADER_LEN - CHECKSUM_LEN {
        return Err(VaultError::NotFound);
    }

    let payload = read_bytes(buf, FRAME_HEADER_LEN, len);
    let checksum = read_bytes(buf, FRAME_HEADER_LEN + len, CHECKSUM_LEN);
    if checksum[..] != Sha256::digest(&payload)[..CHECKSUM_LEN] {
        return Err(VaultError::NotFound);
    }

    Ok(payload)
}

/// Largest payload, in bytes, that `carrier` can hold
pub fn capacity(carrier: &[u8]) -> VaultResult<usize> {
    let img = image::load_from_memory(carrier)?.to_rgba8();
    Ok(capacity_of(&img))
}

/// Build a plain gradient PNG large enough to carry `payload_len` bytes
pub fn generate_carrier(payload_len: usize) -> VaultResult<Vec<u8>> {
    let bits = (FRAME_HEADER_LEN + payload_len + CHECKSUM_LEN) * 8;
    let pixels = bits.div_ceil(BITS_PER_PIXEL);
    let rows = pixels.div_ceil(GENERATED_WIDTH as usize).max(64);
    let height = u32::try_from(rows)
        .map_err(|_| VaultError::InvalidInput("payload too large for a carrier".into()))?;

    let img = RgbaImage::from_fn(GENERATED_WIDTH, height, |x, y| {
        let r = (x * 255 / GENERATED_WIDTH) as u8;
        let g = ((y * 255) / height.max(1)) as u8;
        let b = ((x + y) % 256) as u8;
        Rgba([r, g, b, 255])
    });
    encode_png(img)
}

fn build_frame(payload: &[u8]) -> VaultResult<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .map_err(|_| VaultError::InvalidInput("payload too large for a carrier".into()))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len() + CHECKSUM_LEN);
    frame.extend_from_slice(CARRIER_MAGIC);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&Sha256::digest(payload)[..CHECKSUM_LEN]);
    Ok(frame)
}

fn capacity_of(img: &RgbaImage) -> usize {
    let pixels = img.width() as usize * img.height() as usize;
    (pixels * BITS_PER_PIXEL / 8).saturating_sub(FRAME_HEADER_LEN + CHECKSUM_LEN)
}

/// Buffer index of the k-th payload bit: R, G, B of each pixel, skipping A
fn channel_slot(k: usize) -> usize {
    (k / BITS_PER_PIXEL) * 4 + (k % BITS_PER_PIXEL)
}

fn read_bytes(buf: &[u8], offset: usize, count: usize) -> Vec<u8> {
    (0..count)
        .map(|i| {
            let first_bit = (offset + i) * 8;
            (0..8).fold(0u8, |acc, j| (acc << 1) | (buf[channel_slot(first_bit + j)] & 1))
        })
        .collect()
}

fn encode_png(img: RgbaImage) -> VaultResult<Vec<u8>> {
    let mut output = Vec::new();
    DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7) as u8, (y * 13) as u8, (x ^ y) as u8, (100 + x % 50) as u8])
        });
        encode_png(img).unwrap()
    }

    #[test]
    fn test_roundtrip_sizes() {
        let carrier = png(128, 128);
        let multi_kb = "QUxGQQ==".repeat(600);
        for payload in ["", "x", multi_kb.as_str()] {
            let stego = embed(&carrier, payload).unwrap();
            assert_eq!(extract(&stego).unwrap(), payload);
        }
    }

    #[test]
    fn test_only_low_bits_of_rgb_change() {
        let carrier = png(32, 32);
        let stego = embed(&carrier, "hello backup").unwrap();

        let before = image::load_from_memory(&carrier).unwrap().to_rgba8();
        let after = image::load_from_memory(&stego).unwrap().to_rgba8();
        assert_eq!(before.dimensions(), after.dimensions());
        for (a, b) in before.pixels().zip(after.pixels()) {
            assert_eq!(a[3], b[3], "alpha must be untouched");
            for c in 0..3 {
                assert_eq!(a[c] & !1, b[c] & !1);
            }
        }
    }

    #[test]
    fn test_plain_image_has_no_payload() {
        assert!(matches!(extract(&png(64, 64)), Err(VaultError::NotFound)));
        assert!(matches!(extract(b"not an image"), Err(VaultError::NotFound)));
        assert!(matches!(extract(&png(1, 1)), Err(VaultError::NotFound)));
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let carrier = png(64, 64);
        let stego = embed(&carrier, "payload that will be damaged").unwrap();
        let mut img = image::load_from_memory(&stego).unwrap().to_rgba8();
        // flip a payload bit just past the header
        let slot = channel_slot(FRAME_HEADER_LEN * 8 + 5);
        let buf: &mut [u8] = &mut img;
        buf[slot] ^= 1;
        let damaged = encode_png(img).unwrap();
        assert!(matches!(extract(&damaged), Err(VaultError::NotFound)));
    }

    #[test]
    fn test_carrier_too_small() {
        let carrier = png(8, 8);
        // 64 px * 3 bits = 24 bytes, 12 of them framing
        assert_eq!(capacity(&carrier).unwrap(), 12);
        assert!(embed(&carrier, &"a".repeat(12)).is_ok());
        assert!(matches!(
            embed(&carrier, &"a".repeat(13)),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_generated_carrier_fits() {
        let payload = "B".repeat(10_000);
        let carrier = generate_carrier(payload.len()).unwrap();
        assert!(capacity(&carrier).unwrap() >= payload.len());
        let stego = embed(&carrier, &payload).unwrap();
        assert_eq!(extract(&stego).unwrap(), payload);
    }

    #[test]
    fn test_non_utf8_payload_is_not_a_transport() {
        let carrier = png(32, 32);
        let stego = embed_bytes(&carrier, &[0xff, 0xfe]).unwrap();
        assert_eq!(extract_bytes(&stego).unwrap(), vec![0xff, 0xfe]);
        assert!(matches!(extract(&stego), Err(VaultError::NotFound)));
    }
}
