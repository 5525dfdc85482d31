// Copyright 2023 Strixpyrr
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::ops::Deref;
use base64::Engine;
use simdutf8::compat::Utf8Error;
use base64::prelude::{BASE64_STANDARD_NO_PAD, BASE64_URL_SAFE_NO_PAD};
use simdutf8::compat::from_utf8;

/// An immutable string of bytes, as produced by [`snapshot`] and the
/// byte-string reads.
///
/// [`snapshot`]: crate::Buffer::snapshot
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ByteString {
	data: Box<[u8]>,
}

impl ByteString {
	/// Creates an empty byte string.
	pub fn empty() -> Self { Self::default() }

	/// Returns the length in bytes of the byte string.
	pub fn len(&self) -> usize { self.data.len() }

	/// Returns `true` if the byte string contains no bytes.
	pub fn is_empty(&self) -> bool { self.data.is_empty() }

	/// Returns the byte at `index`, or `None` if `index` is out of bounds.
	pub fn get(&self, index: usize) -> Option<u8> {
		self.data.get(index).copied()
	}

	pub fn as_slice(&self) -> &[u8] { &self.data }

	/// Finds the first index at or past `start` where `needle` begins.
	pub fn index_of(&self, needle: &[u8], start: usize) -> Option<usize> {
		if needle.is_empty() {
			return (start <= self.len()).then_some(start)
		}
		if start >= self.len() {
			return None
		}
		self.data[start..]
			.windows(needle.len())
			.position(|window| window == needle)
			.map(|index| index + start)
	}

	/// Returns `true` if the byte string begins with `prefix`.
	pub fn starts_with(&self, prefix: &[u8]) -> bool {
		self.data.starts_with(prefix)
	}

	/// Returns `true` if the byte string ends with `suffix`.
	pub fn ends_with(&self, suffix: &[u8]) -> bool {
		self.data.ends_with(suffix)
	}

	/// Decodes the bytes as UTF-8.
	pub fn utf8(&self) -> Result<&str, Utf8Error> {
		from_utf8(&self.data)
	}

	/// Encodes data into a Base64 string.
	pub fn base64(&self) -> String {
		BASE64_STANDARD_NO_PAD.encode(&self.data)
	}

	/// Encodes data into a Base64 URL string.
	pub fn base64_url(&self) -> String {
		BASE64_URL_SAFE_NO_PAD.encode(&self.data)
	}

	/// Encodes data into a lowercase hex string.
	pub fn hex_lower(&self) -> String {
		base16ct::lower::encode_string(&self.data)
	}

	/// Encodes data into an uppercase hex string.
	pub fn hex_upper(&self) -> String {
		base16ct::upper::encode_string(&self.data)
	}
}

impl Deref for ByteString {
	type Target = [u8];
	fn deref(&self) -> &[u8] { &self.data }
}

impl AsRef<[u8]> for ByteString {
	fn as_ref(&self) -> &[u8] { &self.data }
}

impl From<Vec<u8>> for ByteString {
	fn from(value: Vec<u8>) -> Self {
		Self { data: value.into_boxed_slice() }
	}
}

impl From<&[u8]> for ByteString {
	fn from(value: &[u8]) -> Self {
		Self { data: value.into() }
	}
}

impl From<&str> for ByteString {
	fn from(value: &str) -> Self {
		value.as_bytes().into()
	}
}

impl PartialEq<[u8]> for ByteString {
	fn eq(&self, other: &[u8]) -> bool { *self.data == *other }
}

impl PartialEq<&[u8]> for ByteString {
	fn eq(&self, other: &&[u8]) -> bool { *self.data == **other }
}

impl fmt::Debug for ByteString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ByteString[{}]", self.hex_lower())
	}
}

impl fmt::Display for ByteString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.hex_lower())
	}
}

#[cfg(test)]
mod test {
	use super::ByteString;

	#[test]
	fn index_of() {
		let str = ByteString::from("to be or not to be");
		assert_eq!(str.index_of(b"be", 0), Some(3));
		assert_eq!(str.index_of(b"be", 4), Some(16));
		assert_eq!(str.index_of(b"being", 0), None);
		assert_eq!(str.index_of(b"", 7), Some(7));
	}

	#[test]
	fn affixes() {
		let str = ByteString::from("to be or not to be");
		assert!(str.starts_with(b"to b"));
		assert!(str.ends_with(b"o be"));
		assert!(!str.starts_with(b"be"));
	}

	#[test]
	fn encodings() {
		let str = ByteString::from(&[0xDEu8, 0xAD, 0xBE, 0xEF][..]);
		assert_eq!(str.hex_lower(), "deadbeef");
		assert_eq!(str.hex_upper(), "DEADBEEF");
		assert_eq!(str.base64(), "3q2+7w");
		assert_eq!(str.base64_url(), "3q2-7w");
	}
}
