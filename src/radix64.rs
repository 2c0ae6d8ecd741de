//! Radix-64 bit codec.
//!
//! Converts between strings of binary digits, hexadecimal digits and the
//! 64-symbol alphabet used in configuration tokens. Every symbol carries six
//! bits; padding is always added at the most-significant (front) end.

use anyhow::{Result, bail};
use lazy_static::lazy_static;

/// Symbol values 0..63, in order. The ordering is part of the wire format.
pub const DIGITS: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_";

const BITS_PER_SYMBOL: usize = 6;
const BITS_PER_HEX: usize = 4;

lazy_static! {
    static ref SYMBOLS: Vec<char> = DIGITS.chars().collect();
    // Reverse lookup for ASCII; anything else is not a symbol.
    static ref SYMBOL_VALUES: [Option<u8>; 128] = {
        let mut table = [None; 128];
        for (value, ch) in DIGITS.chars().enumerate() {
            table[ch as usize] = Some(value as u8);
        }
        table
    };
}

fn symbol_value(ch: char) -> Option<u8> {
    SYMBOL_VALUES.get(ch as usize).copied().flatten()
}

/// Left-pads `s` with `'0'` up to the next multiple of `n`.
fn pad_zero(s: &str, n: usize) -> String {
    let missing = (n - s.len() % n) % n;
    let mut padded = String::with_capacity(s.len() + missing);
    padded.extend(std::iter::repeat('0').take(missing));
    padded.push_str(s);
    padded
}

/// Keeps the last `target_len` characters of an ASCII string when it is longer.
fn keep_last(s: String, target_len: Option<usize>) -> String {
    match target_len {
        Some(len) if len < s.len() => s[s.len() - len..].to_string(),
        _ => s,
    }
}

/// True iff every character is an alphabet symbol. Vacuously true for `""`.
pub fn is_valid_symbol_string(s: &str) -> bool {
    s.chars().all(|ch| symbol_value(ch).is_some())
}

pub fn bin_to_alphabet(bits: &str) -> Result<String> {
    if let Some((pos, ch)) = bits.char_indices().find(|&(_, c)| c != '0' && c != '1') {
        bail!("Character '{}' at pos {} is not a binary digit.", ch, pos);
    }
    let padded = pad_zero(bits, BITS_PER_SYMBOL);
    let encoded = padded
        .as_bytes()
        .chunks(BITS_PER_SYMBOL)
        .map(|group| {
            let value = group.iter().fold(0usize, |acc, &b| (acc << 1) | usize::from(b == b'1'));
            SYMBOLS[value]
        })
        .collect();
    Ok(encoded)
}

/// Decodes symbols into `6 * s.len()` bits, then keeps only the last
/// `target_len` bits if that is shorter.
pub fn alphabet_to_bin(s: &str, target_len: Option<usize>) -> Result<String> {
    let mut bits = String::with_capacity(s.len() * BITS_PER_SYMBOL);
    for (pos, ch) in s.chars().enumerate() {
        match symbol_value(ch) {
            Some(value) => bits.push_str(&format!("{:06b}", value)),
            None => bail!("Character '{}' at pos {} is not a radix-64 symbol.", ch, pos),
        }
    }
    Ok(keep_last(bits, target_len))
}

pub fn hex_to_alphabet(s: &str) -> Result<String> {
    let mut bits = String::with_capacity(s.len() * BITS_PER_HEX);
    for (pos, ch) in s.chars().enumerate() {
        match ch.to_digit(16) {
            Some(value) => bits.push_str(&format!("{:04b}", value)),
            None => bail!("Character '{}' at pos {} is not a hexadecimal digit.", ch, pos),
        }
    }
    bin_to_alphabet(&bits)
}

pub fn alphabet_to_hex(s: &str, target_len: Option<usize>) -> Result<String> {
    let bits = pad_zero(&alphabet_to_bin(s, None)?, BITS_PER_HEX);
    let hex = bits
        .as_bytes()
        .chunks(BITS_PER_HEX)
        .map(|group| {
            let value = group.iter().fold(0u32, |acc, &b| (acc << 1) | u32::from(b == b'1'));
            // value < 16 by construction
            std::char::from_digit(value, 16).unwrap_or('0')
        })
        .collect();
    Ok(keep_last(hex, target_len))
}
