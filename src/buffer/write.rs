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

use std::cmp::min;
use std::io::Read;
use crate::{Buffer, Error, Result};
use crate::error::BoundsError;
use crate::error::OperationKind::BufWrite;
use crate::streams::{Sink, Source};
use crate::util::utf8::encode_code_point;

impl Buffer {
	/// Walks writable tail segments, passing each free-space slice (clipped to
	/// `count`) to `write`, which returns how many bytes it wrote. Stops when
	/// `write` fills less than it was offered.
	pub(crate) fn write_segments(
		&mut self,
		mut count: usize,
		mut write: impl FnMut(&mut [u8]) -> Result<usize>,
	) -> Result<usize> {
		let mut written = 0;
		while count > 0 {
			let segment = self.writable_segment(1);
			let limit = min(count, segment.capacity());
			let n = match write(&mut segment.free_space()[..limit]) {
				Ok(n) => n,
				Err(error) => {
					self.tidy_tail();
					return Err(error)
				}
			};
			segment.grow(n);
			self.count += n;
			written += n;
			count -= n;
			if n < limit { break }
		}
		self.tidy_tail();
		Ok(written)
	}

	pub(crate) fn write_std<R: Read>(&mut self, reader: &mut R, count: usize) -> Result<usize> {
		self.write_segments(count, |buf| Ok(reader.read(buf)?))
	}

	pub fn write_i8(&mut self, value: i8) -> Result {
		self.write_u8(value as u8)
	}

	pub fn write_u8(&mut self, value: u8) -> Result {
		let segment = self.writable_segment(1);
		segment.push(value);
		self.count += 1;
		Ok(())
	}
}

macro_rules! gen_int_writes {
    ($($name:ident$le_name:ident$ty:ident),+) => {
		impl Buffer {
		$(
		pub fn $name(&mut self, value: $ty) -> Result {
			self.write_from_slice(&value.to_be_bytes())
		}

		pub fn $le_name(&mut self, value: $ty) -> Result {
			self.write_from_slice(&value.to_le_bytes())
		}
		)+
		}
	};
}

gen_int_writes! {
	write_i16 write_i16_le i16,
	write_u16 write_u16_le u16,
	write_i32 write_i32_le i32,
	write_u32 write_u32_le u32,
	write_i64 write_i64_le i64,
	write_u64 write_u64_le u64
}

impl Buffer {
	/// Appends a slice of bytes, claiming segments as needed.
	pub fn write_from_slice(&mut self, mut value: &[u8]) -> Result {
		while !value.is_empty() {
			let segment = self.writable_segment(1);
			let n = segment.push_slice(value);
			self.count += n;
			value = &value[n..];
		}
		Ok(())
	}

	/// Appends a string as UTF-8.
	pub fn write_utf8(&mut self, value: &str) -> Result {
		self.write_from_slice(value.as_bytes())
	}

	/// Appends one code point as UTF-8. Surrogate and out-of-range values are
	/// written as the replacement sequence.
	pub fn write_code_point(&mut self, code_point: u32) -> Result {
		let mut buf = [0; 4];
		let width = encode_code_point(code_point, &mut buf);
		self.write_from_slice(&buf[..width])
	}

	/// Appends a signed decimal long in ASCII.
	pub fn write_decimal_long(&mut self, value: i64) -> Result {
		if value == 0 {
			return self.write_u8(b'0')
		}
		let mut digits = [0; 20];
		let mut index = digits.len();
		let mut magnitude = value.unsigned_abs();
		while magnitude > 0 {
			index -= 1;
			digits[index] = b'0' + (magnitude % 10) as u8;
			magnitude /= 10;
		}
		if value < 0 {
			index -= 1;
			digits[index] = b'-';
		}
		self.write_from_slice(&digits[index..])
	}

	/// Appends an unsigned hexadecimal long in lowercase ASCII, with no
	/// leading zeros.
	pub fn write_hexadecimal_unsigned_long(&mut self, mut value: u64) -> Result {
		const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";
		if value == 0 {
			return self.write_u8(b'0')
		}
		let mut digits = [0; 16];
		let mut index = digits.len();
		while value > 0 {
			index -= 1;
			digits[index] = HEX_DIGITS[(value & 0xF) as usize];
			value >>= 4;
		}
		self.write_from_slice(&digits[index..])
	}

	/// Reads all bytes from `source` into this buffer, returning the number
	/// read.
	pub fn transfer_from(&mut self, source: &mut impl Source) -> Result<usize> {
		source.fill_all(self)
	}

	/// Returns the bytes held in completely-filled segments; the partial tail
	/// is excluded.
	pub(crate) fn complete_segment_bytes(&self) -> usize {
		match self.segments.back() {
			Some(tail) if !tail.is_full() => self.count - tail.len(),
			_ => self.count,
		}
	}
}

impl Sink for Buffer {
	fn drain(&mut self, source: &mut Buffer, byte_count: usize) -> Result<usize> {
		if byte_count > source.count() {
			let err = BoundsError { start: 0, end: byte_count, size: source.count() };
			return Err(Error::illegal_argument(BufWrite, err))
		}
		Ok(self.splice_from(source, byte_count))
	}

	fn drain_all(&mut self, source: &mut Buffer) -> Result<usize> {
		let count = source.count();
		Ok(self.splice_from(source, count))
	}

	fn flush(&mut self) -> Result { Ok(()) }
}
