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

//! Raw and buffered stream contracts. [`Source`] and [`Sink`] are the
//! unbuffered endpoints, moving bytes into and out of a [`Buffer`].
//! [`BufSource`] and [`BufSink`] add typed reads and writes on top of an
//! internal buffer; [`Buffer`] implements all four.

use std::cmp::{max, min};
use std::mem;
use crate::{Buffer, ByteString, Error, Result};
use crate::error::BoundsError;
use crate::error::OperationKind::{BufRead, BufWrite};
use crate::segment::SIZE;
use crate::util::utf8::utf8_char_width;

pub use crate::buffered_wrappers::{BufferedSink, BufferedSource, PeekSource};

/// Base stream contract: closing. Closing is idempotent; closing a closed
/// stream has no effect.
pub trait Stream {
	/// Returns `true` if the stream is closed.
	fn is_closed(&self) -> bool;

	/// Closes the stream. All default streams close automatically when dropped.
	fn close(&mut self) -> Result { Ok(()) }
}

/// An unbuffered data source.
pub trait Source: Stream {
	/// Reads up to `byte_count` bytes into `sink`, returning the number read.
	/// Returns `Ok(0)` for a nonzero `byte_count` only when the source is
	/// exhausted.
	fn fill(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<usize>;

	/// Reads bytes into `sink` until the source is exhausted, returning the
	/// number read.
	fn fill_all(&mut self, sink: &mut Buffer) -> Result<usize> {
		let mut count = 0;
		loop {
			let read = self.fill(sink, SIZE)?;
			if read == 0 { break Ok(count) }
			count += read;
		}
	}
}

/// An unbuffered data sink.
pub trait Sink: Stream {
	/// Moves `byte_count` bytes from `source` into the sink, consuming exactly
	/// that many from `source` on success.
	fn drain(&mut self, source: &mut Buffer, byte_count: usize) -> Result<usize>;

	/// Moves all bytes from `source` into the sink.
	fn drain_all(&mut self, source: &mut Buffer) -> Result<usize> {
		let count = source.count();
		self.drain(source, count)
	}

	/// Writes all buffered data to its final target.
	fn flush(&mut self) -> Result { Ok(()) }
}

impl<S: Stream + ?Sized> Stream for &mut S {
	fn is_closed(&self) -> bool { (**self).is_closed() }
	fn close(&mut self) -> Result { (**self).close() }
}

impl<S: Source + ?Sized> Source for &mut S {
	fn fill(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<usize> {
		(**self).fill(sink, byte_count)
	}
	fn fill_all(&mut self, sink: &mut Buffer) -> Result<usize> {
		(**self).fill_all(sink)
	}
}

impl<S: Sink + ?Sized> Sink for &mut S {
	fn drain(&mut self, source: &mut Buffer, byte_count: usize) -> Result<usize> {
		(**self).drain(source, byte_count)
	}
	fn drain_all(&mut self, source: &mut Buffer) -> Result<usize> {
		(**self).drain_all(source)
	}
	fn flush(&mut self) -> Result { (**self).flush() }
}

/// A stream backed by a [`Buffer`].
pub trait BufStream: Stream {
	fn buf(&self) -> &Buffer;
	fn buf_mut(&mut self) -> &mut Buffer;
}

macro_rules! gen_int_reads {
    ($($be_name:ident$($le_name:ident)?->$ty:ident,)+) => {
		$(gen_int_reads! { $be_name$($le_name)?->$ty })+
	};
	($be_name:ident$le_name:ident->$ty:ident) => {
		gen_int_reads! { $be_name->$ty "big-endian " }
		gen_int_reads! { $le_name->$ty "little-endian " }
	};
	($name:ident->$ty:ident$($endian:literal)?) => {
		#[doc = concat!(" Reads one ",$($endian,)?"[`",stringify!($ty),"`] from the source.")]
		fn $name(&mut self) -> Result<$ty> {
			self.require(mem::size_of::<$ty>())?;
			self.buf_mut().$name()
		}
	}
}

/// A buffered data source.
pub trait BufSource: BufStream + Source {
	/// Reads up to `byte_count` bytes into the buffer, returning whether the
	/// requested count is available. To return an end-of-stream error, use
	/// [`Self::require`].
	fn request(&mut self, byte_count: usize) -> Result<bool>;

	/// Reads at least `byte_count` bytes into the buffer, returning an
	/// end-of-stream error if not successful. To return `true` if the requested
	/// count is available, use [`Self::request`].
	fn require(&mut self, byte_count: usize) -> Result {
		if self.request(byte_count)? {
			Ok(())
		} else {
			Err(Error::eos(BufRead))
		}
	}

	/// Returns `true` if the buffer is empty and the source has no more bytes.
	fn exhausted(&mut self) -> Result<bool> {
		Ok(!self.request(1)?)
	}

	/// Reads all bytes from the source into `sink`.
	fn read_all(&mut self, sink: &mut impl Sink) -> Result<usize> {
		let mut count = 0;
		loop {
			if self.buf().is_empty() && !self.request(SIZE)? { break }
			count += sink.drain_all(self.buf_mut())
						 .map_err(Error::with_op_buf_read)?;
		}
		Ok(count)
	}

	gen_int_reads! {
		read_i8 -> i8,
		read_u8 -> u8,
		read_i16 read_i16_le -> i16,
		read_u16 read_u16_le -> u16,
		read_i32 read_i32_le -> i32,
		read_u32 read_u32_le -> u32,
		read_i64 read_i64_le -> i64,
		read_u64 read_u64_le -> u64,
	}

	/// Removes up to `byte_count` bytes from the source, returning the number
	/// skipped.
	fn skip(&mut self, byte_count: usize) -> Result<usize> {
		let mut count = 0;
		while count < byte_count {
			let remaining = byte_count - count;
			if self.buf().is_empty() && !self.request(min(remaining, SIZE))? { break }
			count += self.buf_mut().skip(remaining)?;
		}
		Ok(count)
	}

	/// Reads bytes into a slice, returning the number of bytes read. Reads
	/// fewer than `dst.len()` bytes only when the source is exhausted.
	fn read_into_slice(&mut self, dst: &mut [u8]) -> Result<usize> {
		let mut count = 0;
		while count < dst.len() {
			let remaining = dst.len() - count;
			if self.buf().is_empty() && !self.request(min(remaining, SIZE))? { break }
			count += self.buf_mut().read_into_slice(&mut dst[count..])?;
		}
		Ok(count)
	}

	/// Reads the exact length of bytes into a slice, returning an end-of-stream
	/// error if the slice could not be filled. Bytes are not consumed from the
	/// buffer if end-of-stream is returned.
	fn read_into_slice_exact(&mut self, dst: &mut [u8]) -> Result {
		self.require(dst.len())?;
		self.buf_mut().read_into_slice_exact(dst)
	}

	/// Reads an array of `N` bytes.
	fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		self.require(N)?;
		self.buf_mut().read_array()
	}

	/// Reads exactly `byte_count` bytes into a [`ByteString`].
	fn read_byte_str(&mut self, byte_count: usize) -> Result<ByteString> {
		self.require(byte_count)?;
		self.buf_mut().read_byte_str(byte_count)
	}

	/// Reads exactly `byte_count` bytes, decoding them into `str` as UTF-8.
	/// Malformed sequences are replaced with `U+FFFD`, one per maximal subpart.
	fn read_utf8(&mut self, str: &mut String, byte_count: usize) -> Result<usize> {
		self.require(byte_count)?;
		self.buf_mut().read_utf8(str, byte_count)
	}

	/// Reads all remaining bytes, decoding them into `str` as UTF-8. Returns
	/// the number of bytes read.
	fn read_utf8_to_end(&mut self, str: &mut String) -> Result<usize> {
		// Buffer the remainder first, so characters never split at refill
		// boundaries.
		while self.request(self.buf().count().saturating_add(SIZE))? { }
		self.buf_mut().read_utf8_to_end(str)
	}

	/// Reads UTF-8 text into `str` until a line terminator, returning whether
	/// the terminator was encountered. Lines end at `\n` or `\r\n`; the
	/// terminator is consumed but not written to the string. A `\r` not
	/// followed by `\n` is a literal byte in the line.
	fn read_utf8_line(&mut self, str: &mut String) -> Result<bool> {
		if let Some(terminator) = self.index_of(b'\n', 0, usize::MAX)? {
			self.buf_mut().read_line_at(str, terminator)?;
			Ok(true)
		} else {
			// No line terminator found, read to end instead.
			self.read_utf8_to_end(str)?;
			Ok(false)
		}
	}

	/// Reads the next line, or `None` if the source is exhausted. The last
	/// line may end without a terminator.
	fn read_line(&mut self) -> Result<Option<String>> {
		if self.exhausted()? {
			return Ok(None)
		}
		let mut line = String::new();
		self.read_utf8_line(&mut line)?;
		Ok(Some(line))
	}

	/// Reads the next line, returning an end-of-stream error if no line
	/// terminator is found within `limit` bytes of content.
	fn read_line_strict(&mut self, limit: usize) -> Result<String> {
		let scan = limit.saturating_add(2);
		let found = match self.index_of(b'\n', 0, scan)? {
			Some(terminator) if terminator <= limit => terminator,
			// A terminator one past the limit still fits when it closes `\r\n`.
			Some(terminator) if self.buf().get(terminator - 1) == Some(b'\r') => terminator,
			_ => return Err(Error::eos(BufRead)),
		};
		let mut line = String::new();
		self.buf_mut().read_line_at(&mut line, found)?;
		Ok(line)
	}

	/// Reads one UTF-8 code point. Malformed input decodes to the replacement
	/// character, consuming one maximal subpart.
	fn read_utf8_code_point(&mut self) -> Result<char> {
		self.require(1)?;
		if let Some(lead) = self.buf().get(0) {
			// A partial refill mid-character is fine; the decoder substitutes.
			let _ = self.request(max(utf8_char_width(lead), 1))?;
		}
		self.buf_mut().read_utf8_code_point()
	}

	/// Reads a signed decimal long: an optional leading `-`, then one or more
	/// ASCII digits, ending at the first non-digit. Fails with a number format
	/// error when no digits are present or the value overflows an [`i64`].
	fn read_decimal_long(&mut self) -> Result<i64> {
		self.require(1)?;
		let mut index = 0;
		loop {
			if !self.request(index + 1)? { break }
			let Some(byte) = self.buf().get(index) else { break };
			let token = if index == 0 {
				byte == b'-' || byte.is_ascii_digit()
			} else {
				byte.is_ascii_digit()
			};
			if !token { break }
			index += 1;
		}
		self.buf_mut().read_decimal_long()
	}

	/// Reads an unsigned hexadecimal long of 1 to 16 digits, ending at the
	/// first non-digit. Fails with a number format error when no digits are
	/// present or more than 16 are.
	fn read_hexadecimal_unsigned_long(&mut self) -> Result<u64> {
		self.require(1)?;
		let mut index = 0;
		loop {
			if !self.request(index + 1)? { break }
			let Some(byte) = self.buf().get(index) else { break };
			if !byte.is_ascii_hexdigit() { break }
			index += 1;
		}
		self.buf_mut().read_hexadecimal_unsigned_long()
	}

	/// Finds the first occurrence of `byte` at an offset in `[start, end)`,
	/// refilling as the scan outgrows the buffer. Returns `None` only once the
	/// source is exhausted or the scan reaches `end`.
	fn index_of(&mut self, byte: u8, start: usize, end: usize) -> Result<Option<usize>> {
		check_range(start, end)?;
		loop {
			if let Some(index) = self.buf().index_of(byte, start, end) {
				return Ok(Some(index))
			}
			let buffered = self.buf().count();
			if buffered >= end || !self.request(buffered.saturating_add(1))? {
				return Ok(None)
			}
		}
	}

	/// Finds the first offset in `[start, end)` where `needle` begins,
	/// refilling as the scan outgrows the buffer.
	fn index_of_slice(&mut self, needle: &[u8], start: usize, end: usize) -> Result<Option<usize>> {
		check_range(start, end)?;
		if needle.is_empty() {
			return Err(Error::illegal_argument(BufRead, BoundsError { start: 0, end: 0, size: 0 }))
		}
		let mut from = start;
		loop {
			if let Some(index) = self.buf().index_of_slice(needle, from, end) {
				return Ok(Some(index))
			}
			let buffered = self.buf().count();
			if buffered >= end || !self.request(buffered.saturating_add(1))? {
				return Ok(None)
			}
			// Offsets this far back were already rejected with the full needle
			// in the buffer; resume where a match could still straddle the old
			// boundary.
			from = max(from, buffered.saturating_sub(needle.len() - 1));
		}
	}

	/// Returns `true` if the next bytes of the source are `needle`.
	fn starts_with(&mut self, needle: &[u8]) -> Result<bool> {
		let _ = self.request(needle.len())?;
		Ok(self.buf().range_equals(0, needle))
	}

	/// Returns a source reading this source's bytes without consuming them.
	/// The peek starts at the current position and sees exactly the bytes a
	/// read would, refilling this source's buffer as it advances past the end.
	/// Closing the peek has no effect on this source.
	fn peek(&mut self) -> BufferedSource<PeekSource<'_, Self>> where Self: Sized {
		BufferedSource::new(PeekSource::new(self))
	}
}

fn check_range(start: usize, end: usize) -> Result {
	if start > end {
		Err(Error::illegal_argument(BufRead, BoundsError { start, end, size: 0 }))
	} else {
		Ok(())
	}
}

macro_rules! gen_int_writes {
    ($($be_name:ident$($le_name:ident)?->$ty:ident,)+) => {
		$(gen_int_writes! { $be_name$($le_name)?->$ty })+
	};
	($be_name:ident$le_name:ident->$ty:ident) => {
		gen_int_writes! { $be_name->$ty "big-endian " }
		gen_int_writes! { $le_name->$ty "little-endian " }
	};
	($name:ident->$ty:ident$($endian:literal)?) => {
		#[doc = concat!(" Writes one ",$($endian,)?"[`",stringify!($ty),"`] to the sink.")]
		fn $name(&mut self, value: $ty) -> Result {
			self.prepare_write()?;
			self.buf_mut().$name(value)?;
			self.emit_complete_segments()
		}
	}
}

/// A buffered data sink.
pub trait BufSink: BufStream + Sink {
	/// Validates that the sink can accept writes. Buffered sinks fail here
	/// once closed.
	fn prepare_write(&mut self) -> Result { Ok(()) }

	/// Forwards buffered data to the underlying sink as segments complete,
	/// keeping the partial tail segment buffered. A no-op for the buffer
	/// itself.
	fn emit_complete_segments(&mut self) -> Result { Ok(()) }

	/// Pushes all buffered data to the underlying sink, without flushing it.
	/// A no-op for the buffer itself.
	fn emit(&mut self) -> Result { Ok(()) }

	gen_int_writes! {
		write_i8 -> i8,
		write_u8 -> u8,
		write_i16 write_i16_le -> i16,
		write_u16 write_u16_le -> u16,
		write_i32 write_i32_le -> i32,
		write_u32 write_u32_le -> u32,
		write_i64 write_i64_le -> i64,
		write_u64 write_u64_le -> u64,
	}

	/// Writes a slice of bytes to the sink.
	fn write_from_slice(&mut self, value: &[u8]) -> Result {
		self.prepare_write()?;
		self.buf_mut().write_from_slice(value)?;
		self.emit_complete_segments()
	}

	/// Writes a string to the sink as UTF-8.
	fn write_utf8(&mut self, value: &str) -> Result {
		self.prepare_write()?;
		self.buf_mut().write_utf8(value)?;
		self.emit_complete_segments()
	}

	/// Writes one code point to the sink as UTF-8. Surrogate and out-of-range
	/// values are written as the replacement sequence.
	fn write_code_point(&mut self, code_point: u32) -> Result {
		self.prepare_write()?;
		self.buf_mut().write_code_point(code_point)?;
		self.emit_complete_segments()
	}

	/// Writes a signed decimal long to the sink, in ASCII.
	fn write_decimal_long(&mut self, value: i64) -> Result {
		self.prepare_write()?;
		self.buf_mut().write_decimal_long(value)?;
		self.emit_complete_segments()
	}

	/// Writes an unsigned hexadecimal long to the sink, in lowercase ASCII.
	fn write_hexadecimal_unsigned_long(&mut self, value: u64) -> Result {
		self.prepare_write()?;
		self.buf_mut().write_hexadecimal_unsigned_long(value)?;
		self.emit_complete_segments()
	}

	/// Writes a byte string to the sink.
	fn write_byte_str(&mut self, value: &ByteString) -> Result {
		self.write_from_slice(value)
	}

	/// Reads exactly `byte_count` bytes from `source` into the sink, emitting
	/// complete segments along the way so the buffer stays bounded. Fails with
	/// an end-of-stream error if `source` is exhausted early.
	fn write(&mut self, source: &mut impl Source, byte_count: usize) -> Result<usize> {
		self.prepare_write()?;
		let mut count = 0;
		while count < byte_count {
			let read = source.fill(self.buf_mut(), min(byte_count - count, SIZE))
							 .map_err(Error::with_op_buf_write)?;
			if read == 0 {
				return Err(Error::eos(BufWrite))
			}
			count += read;
			self.emit_complete_segments()?;
		}
		Ok(count)
	}

	/// Reads from `source` until exhaustion, emitting complete segments along
	/// the way. Returns the number of bytes written.
	fn write_all(&mut self, source: &mut impl Source) -> Result<usize> {
		self.prepare_write()?;
		let mut count = 0;
		loop {
			let read = source.fill(self.buf_mut(), SIZE)
							 .map_err(Error::with_op_buf_write)?;
			if read == 0 { break }
			count += read;
			self.emit_complete_segments()?;
		}
		Ok(count)
	}
}

/// Wraps a [`Source`] in a buffered source.
pub trait SourceExt: Source + Sized {
	/// Wraps the source in a [`BufferedSource`], which owns it and closes it
	/// when closed.
	fn buffered(self) -> BufferedSource<Self> {
		BufferedSource::new(self)
	}
}

impl<S: Source + Sized> SourceExt for S { }

/// Wraps a [`Sink`] in a buffered sink.
pub trait SinkExt: Sink + Sized {
	/// Wraps the sink in a [`BufferedSink`], which owns it and closes it when
	/// closed.
	fn buffered(self) -> BufferedSink<Self> {
		BufferedSink::new(self)
	}
}

impl<S: Sink + Sized> SinkExt for S { }

// Impls for common types

impl Stream for &[u8] {
	fn is_closed(&self) -> bool { false }
}

impl Source for &[u8] {
	fn fill(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<usize> {
		let count = min(byte_count, self.len());
		sink.write_from_slice(&self[..count])
			.map_err(Error::with_op_buf_read)?;
		*self = &self[count..];
		Ok(count)
	}
}

impl Stream for Vec<u8> {
	fn is_closed(&self) -> bool { false }
}

impl Sink for Vec<u8> {
	fn drain(&mut self, source: &mut Buffer, byte_count: usize) -> Result<usize> {
		let count = byte_count;
		if count > source.count() {
			let err = BoundsError { start: 0, end: count, size: source.count() };
			return Err(Error::illegal_argument(BufWrite, err))
		}
		self.reserve(count);
		let mut remaining = count;
		while remaining > 0 {
			remaining -= source.read_from_head(|data| {
				let len = min(data.len(), remaining);
				self.extend_from_slice(&data[..len]);
				len
			});
		}
		Ok(count)
	}
}
