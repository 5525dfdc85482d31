// SPDX-License-Identifier: Apache-2.0

//! Util for decoding UTF-8 strings spread across multiple byte slices, replacing
//! malformed sequences with the replacement character. Each maximal subpart of
//! an ill-formed sequence becomes a single U+FFFD, per the W3C substitution of
//! maximal subparts.

use arrayvec::ArrayVec;
use simdutf8::compat::from_utf8;

pub const REPLACEMENT: char = '\u{FFFD}';
/// The UTF-8 encoding of [`REPLACEMENT`], written for unpaired surrogates and
/// out-of-range code points.
pub const REPLACEMENT_SEQUENCE: [u8; 3] = [0xEF, 0xBF, 0xBD];

// Char width copied from std

// https://tools.ietf.org/html/rfc3629
const UTF8_CHAR_WIDTH: &[u8; 256] = &[
	// 1  2  3  4  5  6  7  8  9  A  B  C  D  E  F
	1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 0
	1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 1
	1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 2
	1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 3
	1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 4
	1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 5
	1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 6
	1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 7
	0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 8
	0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 9
	0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // A
	0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // B
	0, 0, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, // C
	2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, // D
	3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, // E
	4, 4, 4, 4, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // F
];

#[inline]
pub const fn utf8_char_width(b: u8) -> usize {
	UTF8_CHAR_WIDTH[b as usize] as usize
}

/// The first character of a byte slice.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Decoded {
	/// A valid character of the given encoded width.
	Char(char, usize),
	/// A maximal subpart of an ill-formed sequence, to be replaced by a single
	/// U+FFFD. The width is at least 1.
	Malformed(usize),
	/// A valid prefix of a character; the slice ended before its last byte.
	Incomplete,
}

/// Decodes the first character of a non-empty slice.
pub fn decode_prefix(bytes: &[u8]) -> Decoded {
	let lead = bytes[0];
	let width = utf8_char_width(lead);
	match width {
		0 => Decoded::Malformed(1),
		1 => Decoded::Char(lead as char, 1),
		_ => {
			for i in 1..width {
				let Some(&byte) = bytes.get(i) else { return Decoded::Incomplete };
				// The second byte's range narrows for boundary leads, ruling
				// out overlongs, surrogates, and values past U+10FFFF.
				let valid = match (i, lead) {
					(1, 0xE0) => matches!(byte, 0xA0..=0xBF),
					(1, 0xED) => matches!(byte, 0x80..=0x9F),
					(1, 0xF0) => matches!(byte, 0x90..=0xBF),
					(1, 0xF4) => matches!(byte, 0x80..=0x8F),
					_         => matches!(byte, 0x80..=0xBF),
				};
				if !valid { return Decoded::Malformed(i) }
			}

			let mut value = (lead as u32) & (0x7Fu32 >> width);
			for &byte in &bytes[1..width] {
				value = value << 6 | (byte & 0x3F) as u32;
			}
			let char = char::from_u32(value)
				.expect("validated sequences decode to scalar values");
			Decoded::Char(char, width)
		}
	}
}

/// Encodes `code_point` as UTF-8 into `buf`, returning the encoded width.
/// Surrogates and values past U+10FFFF encode the replacement character.
pub fn encode_code_point(code_point: u32, buf: &mut [u8; 4]) -> usize {
	let char = char::from_u32(code_point).unwrap_or(REPLACEMENT);
	char.encode_utf8(buf).len()
}

/// Holds the partial character left at the end of a byte slice until the rest
/// arrives in the next slice.
#[derive(Default)]
pub struct CharBuf {
	buf: ArrayVec<u8, 4>,
}

impl CharBuf {
	pub fn is_empty(&self) -> bool { self.buf.is_empty() }

	/// Stores the valid-prefix bytes left unconsumed at the end of a slice.
	pub fn set(&mut self, bytes: &[u8]) {
		debug_assert!(self.buf.is_empty(), "partial character already buffered");
		self.buf
			.try_extend_from_slice(bytes)
			.expect("character buffer should be large enough");
	}

	/// Resolves the buffered partial character with bytes from the next slice,
	/// consuming from `bytes` and appending to `out` as characters complete.
	pub fn fill(&mut self, bytes: &mut &[u8], out: &mut String) {
		while !self.buf.is_empty() {
			match decode_prefix(&self.buf) {
				Decoded::Char(char, width) => {
					debug_assert_eq!(width, self.buf.len());
					out.push(char);
					self.buf.clear();
					return
				}
				Decoded::Malformed(width) => {
					out.push(REPLACEMENT);
					self.buf.drain(..width);
				}
				Decoded::Incomplete => {
					let Some((&byte, rest)) = bytes.split_first() else { return };
					self.buf.push(byte);
					*bytes = rest;
				}
			}
		}
	}

	/// Flushes at end of input: whatever remains buffered can no longer
	/// complete, so each maximal subpart becomes one replacement character.
	pub fn flush(&mut self, out: &mut String) {
		while !self.buf.is_empty() {
			match decode_prefix(&self.buf) {
				Decoded::Char(char, width) => {
					debug_assert_eq!(width, self.buf.len());
					out.push(char);
					self.buf.clear();
				}
				Decoded::Malformed(width) => {
					out.push(REPLACEMENT);
					self.buf.drain(..width);
				}
				Decoded::Incomplete => {
					out.push(REPLACEMENT);
					self.buf.clear();
				}
			}
		}
	}
}

/// Decodes one slice of a possibly-segmented byte sequence into `out`,
/// substituting malformed sequences. A valid-prefix tail is carried in `part`
/// unless `last` is set, in which case it is substituted immediately.
pub fn decode_lossy(mut bytes: &[u8], part: &mut CharBuf, out: &mut String, last: bool) {
	part.fill(&mut bytes, out);

	loop {
		match from_utf8(bytes) {
			Ok(str) => {
				out.push_str(str);
				break
			}
			Err(err) => {
				let (valid, rest) = bytes.split_at(err.valid_up_to());
				// Checked valid just above.
				out.push_str(std::str::from_utf8(valid).unwrap());

				match err.error_len() {
					Some(width) => {
						out.push(REPLACEMENT);
						bytes = &rest[width..];
					}
					None => {
						part.set(rest);
						break
					}
				}
			}
		}
	}

	if last {
		part.flush(out);
	}
}
