//! Big-endian field encoding and decoding for host interface frames.
//!
//! Every multi-byte numeric field exchanged with the module is big-endian,
//! independent of the host's native byte order. This module provides the
//! conversions between typed values and their wire representation, either as
//! standalone arrays or written into / read out of a frame at a fixed offset.
//!
//! ## Field-wise vs. mirrored conversion
//!
//! Frames that carry several fields (the Ensemble message descriptor, for example)
//! are converted one field at a time with the `read_*`/`write_*` helpers, since
//! the fields have different widths and a single reversal of the whole frame would
//! scramble them.
//!
//! The Ensemble UTC time is the one exception: it is produced by mirroring the
//! eight little-endian bytes of the value end to end ([`mirror`]). For a single
//! 64-bit field that yields the same bytes as big-endian encoding.
//!
//! ## Functions
//!
//! - [`encode_u16_be`], [`encode_u32_be`], [`encode_u64_be`]: value to wire bytes
//! - [`decode_u16_be`], [`decode_u32_be`], [`decode_u64_be`]: wire bytes to value
//! - [`read_u16_be`], [`read_i16_be`], [`read_u32_be`], [`read_u64_be`]: decode at an offset
//! - [`write_u32_be`], [`write_u64_be`]: encode at an offset
//! - [`encode_utc_time`], [`decode_utc_time`]: mirrored 8-byte time field
//!
//! ## Limitations
//!
//! - Offset helpers panic when the buffer is shorter than `offset + width`. Callers
//!   validate response lengths before decoding.

/// Encodes a 16-bit value as two big-endian bytes.
pub fn encode_u16_be(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Decodes two big-endian bytes into a 16-bit value.
pub fn decode_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Encodes a 32-bit value as four big-endian bytes.
pub fn encode_u32_be(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Decodes four big-endian bytes into a 32-bit value.
pub fn decode_u32_be(bytes: [u8; 4]) -> u32 {
    u32::from_be_bytes(bytes)
}

/// Encodes a 64-bit value as eight big-endian bytes.
pub fn encode_u64_be(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decodes eight big-endian bytes into a 64-bit value.
pub fn decode_u64_be(bytes: [u8; 8]) -> u64 {
    u64::from_be_bytes(bytes)
}

/// Reads a big-endian `u16` at `offset`.
///
/// # Panics
/// If `buf` holds fewer than `offset + 2` bytes.
pub fn read_u16_be(buf: &[u8], offset: usize) -> u16 {
    decode_u16_be([buf[offset], buf[offset + 1]])
}

/// Reads a big-endian `i16` at `offset`.
///
/// # Panics
/// If `buf` holds fewer than `offset + 2` bytes.
pub fn read_i16_be(buf: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// Reads a big-endian `u32` at `offset`.
///
/// # Panics
/// If `buf` holds fewer than `offset + 4` bytes.
pub fn read_u32_be(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    decode_u32_be(bytes)
}

/// Reads a big-endian `u64` at `offset`.
///
/// # Panics
/// If `buf` holds fewer than `offset + 8` bytes.
pub fn read_u64_be(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    decode_u64_be(bytes)
}

/// Writes `value` big-endian at `offset`.
///
/// # Panics
/// If `buf` holds fewer than `offset + 4` bytes.
pub fn write_u32_be(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&encode_u32_be(value));
}

/// Writes `value` big-endian at `offset`.
///
/// # Panics
/// If `buf` holds fewer than `offset + 8` bytes.
pub fn write_u64_be(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&encode_u64_be(value));
}

/// Mirrors an 8-byte buffer end to end: byte 0 swaps with byte 7, 1 with 6, and so on.
pub fn mirror(bytes: [u8; 8]) -> [u8; 8] {
    let mut out = bytes;
    for i in 0..out.len() / 2 {
        out.swap(i, 7 - i);
    }
    out
}

/// Encodes a UTC time (seconds) for the wire by mirroring its little-endian bytes.
pub fn encode_utc_time(seconds: u64) -> [u8; 8] {
    mirror(seconds.to_le_bytes())
}

/// Decodes a mirrored UTC time field back into seconds.
pub fn decode_utc_time(bytes: [u8; 8]) -> u64 {
    u64::from_le_bytes(mirror(bytes))
}
