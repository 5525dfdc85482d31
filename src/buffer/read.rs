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

use std::cmp::{max, min};
use std::io::Write;
use all_asserts::debug_assert_le;
use crate::{Buffer, ByteString, Error, Result};
use crate::error::NumberFormatError;
use crate::error::OperationKind::BufRead;
use crate::streams::{Sink, Source};
use crate::util::utf8::{decode_prefix, utf8_char_width, CharBuf, Decoded, decode_lossy, REPLACEMENT};

impl Buffer {
	/// Walks the head segments, passing each readable slice (clipped to
	/// `max_count`) to `consume`, which returns how many of its bytes it took.
	/// Stops when `consume` takes less than it was offered.
	pub(crate) fn read_segments(
		&mut self,
		mut max_count: usize,
		mut consume: impl FnMut(&[u8]) -> Result<usize>,
	) -> Result<usize> {
		let mut count = 0;
		while max_count > 0 {
			let Some(head) = self.segments.front_mut() else { break };
			let len = min(max_count, head.len());
			let read = consume(&head.data()[..len])?;
			debug_assert_le!(read, len, "consumed more bytes than were offered");
			head.consume(read);
			self.count -= read;
			count += read;
			max_count -= read;
			self.tidy_head();
			if read < len { break }
		}
		Ok(count)
	}

	pub(crate) fn read_std<W: Write>(&mut self, writer: &mut W, count: usize) -> Result<usize> {
		self.read_segments(count, |data| Ok(writer.write(data)?))
	}

	pub fn read_i8(&mut self) -> Result<i8> {
		self.read_u8().map(|n| n as i8)
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		let Some(head) = self.segments.front_mut() else {
			return Err(Error::eos(BufRead))
		};
		let byte = head.pop().expect("head segments are never empty");
		self.count -= 1;
		self.tidy_head();
		Ok(byte)
	}
}

macro_rules! gen_int_reads {
    ($($s_name:ident$s_le_name:ident$s_ty:ident$u_name:ident$u_le_name:ident$u_ty:ident),+) => {
		impl Buffer {
		$(
		pub fn $s_name(&mut self) -> Result<$s_ty> {
			self.$u_name().map(|n| n as $s_ty)
		}

		pub fn $s_le_name(&mut self) -> Result<$s_ty> {
			self.$u_le_name().map(|n| n as $s_ty)
		}

		pub fn $u_name(&mut self) -> Result<$u_ty> {
			Ok($u_ty::from_be_bytes(self.read_array()?))
		}

		pub fn $u_le_name(&mut self) -> Result<$u_ty> {
			Ok($u_ty::from_le_bytes(self.read_array()?))
		}
		)+
		}
	};
}

gen_int_reads! {
	read_i16 read_i16_le i16 read_u16 read_u16_le u16,
	read_i32 read_i32_le i32 read_u32 read_u32_le u32,
	read_i64 read_i64_le i64 read_u64 read_u64_le u64
}

impl Buffer {
	/// Reads an array of `N` bytes, failing with an end-of-stream error when
	/// fewer are buffered.
	pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		if self.count < N {
			return Err(Error::eos(BufRead))
		}
		let mut array = [0; N];
		let mut off = 0;
		self.read_segments(N, |data| {
			array[off..off + data.len()].copy_from_slice(data);
			off += data.len();
			Ok(data.len())
		})?;
		Ok(array)
	}

	/// Reads up to `dst.len()` bytes into a slice, returning the number read.
	pub fn read_into_slice(&mut self, dst: &mut [u8]) -> Result<usize> {
		let mut off = 0;
		self.read_segments(dst.len(), |data| {
			dst[off..off + data.len()].copy_from_slice(data);
			off += data.len();
			Ok(data.len())
		})
	}

	/// Fills `dst` exactly, failing with an end-of-stream error when fewer
	/// bytes are buffered. Nothing is consumed on failure.
	pub fn read_into_slice_exact(&mut self, dst: &mut [u8]) -> Result {
		if self.count < dst.len() {
			return Err(Error::eos(BufRead))
		}
		let read = self.read_into_slice(dst)?;
		debug_assert_eq!(read, dst.len());
		Ok(())
	}

	/// Reads exactly `byte_count` bytes into a [`ByteString`].
	pub fn read_byte_str(&mut self, byte_count: usize) -> Result<ByteString> {
		if self.count < byte_count {
			return Err(Error::eos(BufRead))
		}
		let mut dst = Vec::with_capacity(byte_count);
		self.read_segments(byte_count, |data| {
			dst.extend_from_slice(data);
			Ok(data.len())
		})?;
		Ok(dst.into())
	}

	/// Reads exactly `byte_count` bytes, decoding them into `str` as UTF-8.
	/// Each maximal subpart of an ill-formed sequence, including one truncated
	/// by the end of the range, decodes to a single replacement character.
	pub fn read_utf8(&mut self, str: &mut String, byte_count: usize) -> Result<usize> {
		if self.count < byte_count {
			return Err(Error::eos(BufRead))
		}
		let mut part = CharBuf::default();
		let mut remaining = byte_count;
		self.read_segments(byte_count, |data| {
			remaining -= data.len();
			decode_lossy(data, &mut part, str, remaining == 0);
			Ok(data.len())
		})?;
		Ok(byte_count)
	}

	/// Reads all buffered bytes, decoding them into `str` as UTF-8.
	pub fn read_utf8_to_end(&mut self, str: &mut String) -> Result<usize> {
		let count = self.count;
		self.read_utf8(str, count)
	}

	/// Consumes the line whose `\n` terminator sits at `terminator`, decoding
	/// it into `str` without the terminator. A preceding `\r` is dropped with
	/// the `\n`.
	pub(crate) fn read_line_at(&mut self, str: &mut String, terminator: usize) -> Result {
		if terminator > 0 && self.get(terminator - 1) == Some(b'\r') {
			self.read_utf8(str, terminator - 1)?;
			self.consume_front(2);
		} else {
			self.read_utf8(str, terminator)?;
			self.consume_front(1);
		}
		Ok(())
	}

	/// Decodes one UTF-8 code point. Malformed input decodes to the
	/// replacement character, consuming one maximal subpart; a sequence
	/// truncated by the end of the buffer is consumed entirely.
	pub fn read_utf8_code_point(&mut self) -> Result<char> {
		let Some(lead) = self.get(0) else {
			return Err(Error::eos(BufRead))
		};
		let available = min(max(utf8_char_width(lead), 1), self.count);
		let mut bytes = [0; 4];
		for (index, slot) in bytes[..available].iter_mut().enumerate() {
			if let Some(byte) = self.get(index) {
				*slot = byte;
			}
		}

		match decode_prefix(&bytes[..available]) {
			Decoded::Char(char, width) => {
				self.consume_front(width);
				Ok(char)
			}
			Decoded::Malformed(width) => {
				self.consume_front(width);
				Ok(REPLACEMENT)
			}
			Decoded::Incomplete => {
				self.consume_front(available);
				Ok(REPLACEMENT)
			}
		}
	}

	/// Parses a signed decimal long from the head: an optional leading `-`,
	/// then one or more ASCII digits, ending at the first non-digit. Nothing
	/// is consumed on failure.
	pub fn read_decimal_long(&mut self) -> Result<i64> {
		if self.is_empty() {
			return Err(Error::eos(BufRead))
		}
		let negative = self.get(0) == Some(b'-');
		let start = usize::from(negative);
		let mut index = start;
		// Accumulate negated so i64::MIN parses without overflowing.
		let mut value = 0i64;
		while let Some(byte) = self.get(index) {
			if !byte.is_ascii_digit() { break }
			let digit = i64::from(byte - b'0');
			value = value.checked_mul(10)
						 .and_then(|v| v.checked_sub(digit))
						 .ok_or_else(|| Error::number_format(NumberFormatError::Overflow))?;
			index += 1;
		}

		if index == start {
			return Err(match self.get(index) {
				Some(byte) => Error::number_format(NumberFormatError::NotADigit(byte)),
				None => Error::eos(BufRead),
			})
		}

		self.consume_front(index);
		if negative {
			Ok(value)
		} else {
			value.checked_neg()
				 .ok_or_else(|| Error::number_format(NumberFormatError::Overflow))
		}
	}

	/// Parses an unsigned hexadecimal long of 1 to 16 digits from the head,
	/// ending at the first non-digit. Nothing is consumed on failure.
	pub fn read_hexadecimal_unsigned_long(&mut self) -> Result<u64> {
		let Some(first) = self.get(0) else {
			return Err(Error::eos(BufRead))
		};
		let mut index = 0;
		let mut value = 0u64;
		while let Some(byte) = self.get(index) {
			let digit = match byte {
				b'0'..=b'9' => byte - b'0',
				b'a'..=b'f' => byte - b'a' + 10,
				b'A'..=b'F' => byte - b'A' + 10,
				_ => break,
			};
			if index == 16 {
				return Err(Error::number_format(NumberFormatError::Overflow))
			}
			value = value << 4 | u64::from(digit);
			index += 1;
		}

		if index == 0 {
			return Err(Error::number_format(NumberFormatError::NotAHexDigit(first)))
		}

		self.consume_front(index);
		Ok(value)
	}

	/// Moves all buffered bytes to `sink`, returning the number moved.
	pub fn transfer_to(&mut self, sink: &mut impl Sink) -> Result<usize> {
		sink.drain_all(self)
	}
}

impl Source for Buffer {
	fn fill(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<usize> {
		Ok(sink.splice_from(self, byte_count))
	}

	fn fill_all(&mut self, sink: &mut Buffer) -> Result<usize> {
		let count = self.count;
		Ok(sink.splice_from(self, count))
	}
}
