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
use std::fmt;
use std::rc::Rc;
use all_asserts::{assert_le, debug_assert_le, debug_assert_lt};

/// The size of each segment's block of memory, in bytes.
pub const SIZE: usize = 8192;

/// Segments smaller than this are copied when split instead of shared, to avoid
/// spreading short-lived data across many small shared views.
pub(crate) const SHARE_MINIMUM: usize = 1024;

/// A fixed-size chunk of memory holding a readable region `[pos, limit)` of its
/// block. Blocks are reference-counted; cloning the `Rc` *shares* the block
/// between segments, making it read-only for all of them until every sharer but
/// one is dropped. A segment may only grow its readable region while it holds
/// its block uniquely.
pub(crate) struct Segment {
	block: Rc<[u8; SIZE]>,
	pos: usize,
	limit: usize,
}

impl Segment {
	/// Returns a new empty segment with freshly-allocated memory.
	pub fn fresh() -> Self {
		Self {
			block: Rc::new([0; SIZE]),
			pos: 0,
			limit: 0,
		}
	}

	/// Returns the read position, from `[0, limit]`.
	pub fn pos(&self) -> usize { self.pos }
	/// Returns the write position, from `[pos, SIZE]`.
	pub fn limit(&self) -> usize { self.limit }
	/// Returns the number of readable bytes.
	pub fn len(&self) -> usize { self.limit - self.pos }
	/// Returns the number of bytes that can be written before the block is full.
	pub fn capacity(&self) -> usize { SIZE - self.limit }

	pub fn is_empty(&self) -> bool { self.len() == 0 }
	pub fn is_full (&self) -> bool { self.capacity() == 0 }

	/// Returns `true` if another segment references this segment's block. Shared
	/// blocks are read-only.
	pub fn is_shared(&self) -> bool { Rc::strong_count(&self.block) > 1 }

	/// Returns a slice of the readable data.
	pub fn data(&self) -> &[u8] { &self.block[self.pos..self.limit] }

	/// Returns the byte at `index`, without consuming it.
	pub fn get(&self, index: usize) -> u8 {
		debug_assert_lt!(index, self.len(), "index out of readable bounds");
		self.block[self.pos + index]
	}

	/// Returns a new segment sharing the first `byte_count` readable bytes of
	/// this segment's block. Both views become read-only until one is dropped.
	pub fn share(&self, byte_count: usize) -> Self {
		debug_assert_le!(byte_count, self.len(), "cannot share more than is readable");
		Self {
			block: Rc::clone(&self.block),
			pos: self.pos,
			limit: self.pos + byte_count,
		}
	}

	/// Returns a new segment sharing all readable bytes of this segment's block.
	pub fn share_all(&self) -> Self { self.share(self.len()) }

	/// Returns a new segment whose block is a copy of this one's. The copy owns
	/// its memory and can be written.
	pub fn unshared_copy(&self) -> Self {
		Self {
			block: Rc::new(*self.block),
			pos: self.pos,
			limit: self.limit,
		}
	}

	/// Consumes `n` bytes after reading.
	pub fn consume(&mut self, n: usize) {
		assert_le!(n, self.len(), "consumed past the readable region");
		self.pos += n;
	}

	/// Adds `n` bytes after writing.
	pub fn grow(&mut self, n: usize) {
		assert_le!(n, self.capacity(), "grew past the end of the block");
		self.limit += n;
	}

	/// Clears the segment. The block is untouched; only valid to call when no
	/// other segment shares it.
	pub fn clear(&mut self) {
		self.pos = 0;
		self.limit = 0;
	}

	/// Returns the writable region `[limit, SIZE)` of the block.
	///
	/// # Panics
	///
	/// Panics if the block is shared. Callers check [`is_shared`](Self::is_shared)
	/// before taking write access; reaching the panic is a bug in the buffer, not
	/// a recoverable condition.
	pub fn free_space(&mut self) -> &mut [u8] {
		let limit = self.limit;
		let block = Rc::get_mut(&mut self.block)
			.expect("cannot write to a shared segment");
		&mut block[limit..]
	}

	/// Pushes one byte to the segment, returning `true` if it could be written.
	pub fn push(&mut self, byte: u8) -> bool {
		if self.is_full() { return false }
		self.free_space()[0] = byte;
		self.limit += 1;
		true
	}

	/// Pops one byte from the segment.
	pub fn pop(&mut self) -> Option<u8> {
		if self.is_empty() { return None }
		let byte = self.block[self.pos];
		self.pos += 1;
		Some(byte)
	}

	/// Pushes a slice of bytes to the segment, returning the number of bytes
	/// written.
	pub fn push_slice(&mut self, bytes: &[u8]) -> usize {
		let count = min(self.capacity(), bytes.len());
		if count > 0 {
			self.free_space()[..count].copy_from_slice(&bytes[..count]);
			self.limit += count;
		}
		count
	}

	/// Pops bytes into a slice from the segment, returning the number of bytes
	/// read.
	pub fn pop_into_slice(&mut self, bytes: &mut [u8]) -> usize {
		let count = min(self.len(), bytes.len());
		if count > 0 {
			bytes[..count].copy_from_slice(&self.data()[..count]);
			self.pos += count;
		}
		count
	}

	/// Shifts the readable region to the start of the block, reclaiming the
	/// consumed prefix for writing. The block must not be shared.
	pub fn shift(&mut self) {
		if self.pos == 0 { return }
		let (pos, limit) = (self.pos, self.limit);
		let block = Rc::get_mut(&mut self.block)
			.expect("cannot shift a shared segment");
		block.copy_within(pos..limit, 0);
		self.limit -= pos;
		self.pos = 0;
	}

	/// Moves `byte_count` bytes from this segment into `sink`, shifting `sink`'s
	/// readable region to the start of its block first if the bytes would not
	/// otherwise fit. `sink` must hold its block uniquely.
	pub fn move_into(&mut self, sink: &mut Self, byte_count: usize) -> usize {
		let count = min(byte_count, self.len());
		assert_le!(count, SIZE - sink.len(), "bytes cannot fit in the sink segment");

		if count > sink.capacity() {
			sink.shift();
		}
		let written = sink.push_slice(&self.data()[..count]);
		debug_assert_le!(count, written, "shifted sink should fit all moved bytes");
		self.pos += count;
		count
	}
}

impl fmt::Debug for Segment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Segment")
		 .field("pos", &self.pos)
		 .field("limit", &self.limit)
		 .field("shared", &self.is_shared())
		 .finish_non_exhaustive()
	}
}
