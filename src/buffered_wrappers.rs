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
use crate::{Buffer, Error, Result};
use crate::error::OperationKind::{BufFlush, BufRead, BufWrite};
use crate::segment::SIZE;
use crate::streams::{BufSink, BufSource, BufStream, Sink, Source, Stream};

/// A [`Source`] paired with a buffer of bytes read ahead of the consumer.
pub struct BufferedSource<S: Source> {
	buffer: Buffer,
	source: S,
	closed: bool,
}

impl<S: Source> BufferedSource<S> {
	pub(crate) fn new(source: S) -> Self {
		Self {
			buffer: Buffer::default(),
			source,
			closed: false,
		}
	}

	/// Refills the buffer, rounding the target up to whole segments so short
	/// requests still pull usefully-sized reads from the source.
	fn fill_buf(&mut self, byte_count: usize) -> Result<bool> {
		let count = self.buffer.count();
		let segments = count.saturating_add(byte_count)
							.saturating_add(SIZE - 1) / SIZE;
		let target = segments * SIZE - count;

		let read = self.source
					   .fill(&mut self.buffer, target)
					   .map_err(Error::with_op_buf_read)?;
		Ok(read > 0)
	}
}

impl<S: Source> Stream for BufferedSource<S> {
	fn is_closed(&self) -> bool { self.closed }

	fn close(&mut self) -> Result {
		if !self.closed {
			self.closed = true;
			// Both need a chance to run before returning an error.
			let clear = self.buffer.close();
			let close = self.source.close();
			clear?;
			close
		} else {
			Ok(())
		}
	}
}

impl<S: Source> Source for BufferedSource<S> {
	fn fill(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<usize> {
		if self.closed { return Err(Error::closed(BufRead)) }

		if self.buffer.is_empty() {
			// At most one pull from the source; a short or empty read is the
			// caller's signal, not ours.
			self.fill_buf(byte_count)?;
		}
		self.buffer.fill(sink, byte_count)
	}
}

impl<S: Source> BufStream for BufferedSource<S> {
	fn buf(&self) -> &Buffer { &self.buffer }
	fn buf_mut(&mut self) -> &mut Buffer { &mut self.buffer }
}

impl<S: Source> BufSource for BufferedSource<S> {
	fn request(&mut self, byte_count: usize) -> Result<bool> {
		if self.closed { return Err(Error::closed(BufRead)) }

		while self.buffer.count() < byte_count {
			let deficit = byte_count - self.buffer.count();
			if !self.fill_buf(deficit)? {
				return Ok(false)
			}
		}
		Ok(true)
	}
}

impl<S: Source> Drop for BufferedSource<S> {
	fn drop(&mut self) {
		let _ = self.close();
	}
}

/// A [`Sink`] paired with a buffer of bytes staged ahead of the underlying
/// sink. Completed segments are forwarded as writes fill them; the partial
/// tail stays buffered until [`emit`](BufSink::emit) or a flush.
pub struct BufferedSink<S: Sink> {
	buffer: Buffer,
	sink: S,
	closed: bool,
}

impl<S: Sink> BufferedSink<S> {
	pub(crate) fn new(sink: S) -> Self {
		Self {
			buffer: Buffer::default(),
			sink,
			closed: false,
		}
	}
}

impl<S: Sink> Stream for BufferedSink<S> {
	fn is_closed(&self) -> bool { self.closed }

	fn close(&mut self) -> Result {
		if !self.closed {
			self.closed = true;
			// Emit, flush and close all need a chance to run before returning
			// an error.
			let count = self.buffer.count();
			let emit = self.sink
						   .drain(&mut self.buffer, count)
						   .map_err(Error::with_op_buf_flush);
			let flush = self.sink.flush();
			let close = self.sink.close();
			let clear = self.buffer.close();
			emit?;
			flush?;
			close?;
			clear
		} else {
			Ok(())
		}
	}
}

impl<S: Sink> Sink for BufferedSink<S> {
	fn drain(&mut self, source: &mut Buffer, byte_count: usize) -> Result<usize> {
		self.prepare_write()?;
		let count = self.buffer.drain(source, byte_count)?;
		self.emit_complete_segments()?;
		Ok(count)
	}

	fn flush(&mut self) -> Result {
		if self.closed { return Err(Error::closed(BufFlush)) }

		// Both need a chance to run before returning an error.
		let emit = self.emit();
		let flush = self.sink
						.flush()
						.map_err(Error::with_op_buf_flush);
		emit?;
		flush
	}
}

impl<S: Sink> BufStream for BufferedSink<S> {
	fn buf(&self) -> &Buffer { &self.buffer }
	fn buf_mut(&mut self) -> &mut Buffer { &mut self.buffer }
}

impl<S: Sink> BufSink for BufferedSink<S> {
	fn prepare_write(&mut self) -> Result {
		if self.closed {
			Err(Error::closed(BufWrite))
		} else {
			Ok(())
		}
	}

	fn emit_complete_segments(&mut self) -> Result {
		let count = self.buffer.complete_segment_bytes();
		if count > 0 {
			self.sink
				.drain(&mut self.buffer, count)
				.map_err(Error::with_op_buf_flush)?;
		}
		Ok(())
	}

	fn emit(&mut self) -> Result {
		let count = self.buffer.count();
		if count > 0 {
			self.sink
				.drain(&mut self.buffer, count)
				.map_err(Error::with_op_buf_flush)?;
		}
		Ok(())
	}
}

impl<S: Sink> Drop for BufferedSink<S> {
	fn drop(&mut self) {
		let _ = self.close();
	}
}

/// A source reading a [`BufSource`]'s bytes without consuming them. Bytes past
/// the end of the upstream buffer are pulled in through the upstream's own
/// [`request`](BufSource::request), so the upstream accumulates everything the
/// peek has seen. The exclusive borrow keeps the upstream from being read, or
/// written, behind the peek's back; closing the peek leaves it untouched.
pub struct PeekSource<'a, S: BufSource> {
	source: &'a mut S,
	offset: usize,
}

impl<'a, S: BufSource> PeekSource<'a, S> {
	pub(crate) fn new(source: &'a mut S) -> Self {
		Self { source, offset: 0 }
	}
}

impl<S: BufSource> Stream for PeekSource<'_, S> {
	fn is_closed(&self) -> bool { false }

	// Closing a peek is a no-op on the upstream source.
	fn close(&mut self) -> Result { Ok(()) }
}

impl<S: BufSource> Source for PeekSource<'_, S> {
	fn fill(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<usize> {
		if !self.source.request(self.offset.saturating_add(1))? {
			let buffered = self.source.buf().count();
			if buffered <= self.offset {
				return Ok(0)
			}
		}

		let available = self.source.buf().count() - self.offset;
		let count = min(byte_count, available);
		self.source
			.buf()
			.copy_to(sink, self.offset, count)
			.map_err(Error::with_op_buf_read)?;
		self.offset += count;
		Ok(count)
	}
}
