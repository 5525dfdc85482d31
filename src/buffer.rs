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

mod index;
mod read;
mod write;

use std::cmp::min;
use std::collections::VecDeque;
use std::fmt;
use std::io::IoSlice;
use all_asserts::{assert_le, debug_assert_le};
use crate::{ByteString, Error, Result};
use crate::error::BoundsError;
use crate::error::OperationKind::BufCopy;
use crate::pool;
use crate::segment::{Segment, SHARE_MINIMUM, SIZE};
use crate::streams::{BufSink, BufSource, BufStream, Stream};

/// A queue of bytes backed by a ring of segments, readable from the front and
/// writable at the back. The buffer is both a [`Source`](crate::streams::Source)
/// and a [`Sink`](crate::streams::Sink), and implements the buffered ends of
/// both contracts against itself.
#[derive(Default)]
pub struct Buffer {
	segments: VecDeque<Segment>,
	count: usize,
}

impl Buffer {
	/// Creates an empty buffer.
	pub fn new() -> Self { Self::default() }

	/// Returns the number of readable bytes.
	pub fn count(&self) -> usize { self.count }

	/// Returns `true` if the buffer contains no bytes.
	pub fn is_empty(&self) -> bool { self.count == 0 }

	/// Recycles all segments, emptying the buffer.
	pub fn clear(&mut self) {
		for segment in self.segments.drain(..) {
			pool::recycle(segment);
		}
		self.count = 0;
	}

	/// Returns the byte at `index`, without consuming it, or `None` if `index`
	/// is out of bounds.
	pub fn get(&self, mut index: usize) -> Option<u8> {
		if index >= self.count { return None }
		for segment in &self.segments {
			if index < segment.len() {
				return Some(segment.get(index))
			}
			index -= segment.len();
		}
		None
	}

	/// Skips up to `byte_count` bytes, returning the number skipped.
	pub fn skip(&mut self, byte_count: usize) -> Result<usize> {
		Ok(self.consume_front(min(byte_count, self.count)))
	}

	/// Copies `byte_count` bytes at `offset` into `out`, without consuming
	/// them. The copy shares segments with `out` rather than moving memory;
	/// shared segments become read-only until one side drops them.
	pub fn copy_to(&self, out: &mut Buffer, offset: usize, byte_count: usize) -> Result {
		let end = offset.checked_add(byte_count)
						.filter(|&end| end <= self.count)
						.ok_or_else(|| {
							let err = BoundsError {
								start: offset,
								end: offset.saturating_add(byte_count),
								size: self.count,
							};
							Error::illegal_argument(BufCopy, err)
						})?;
		let mut offset = offset;
		let mut remaining = end - offset;

		for segment in &self.segments {
			if remaining == 0 { break }
			let len = segment.len();
			if offset >= len {
				offset -= len;
				continue
			}

			let take = min(len - offset, remaining);
			let mut view = segment.share(offset + take);
			view.consume(offset);
			out.count += take;
			out.push_spliced(view);
			remaining -= take;
			offset = 0;
		}
		Ok(())
	}

	/// Returns an immutable copy of the buffered bytes. The snapshot copies
	/// rather than shares, so it has no effect on the buffer's segments.
	pub fn snapshot(&self) -> ByteString {
		let mut bytes = Vec::with_capacity(self.count);
		for segment in &self.segments {
			bytes.extend_from_slice(segment.data());
		}
		bytes.into()
	}

	/// Merges partial segments to free space, recycling the segments emptied
	/// by the merge. Reduces fragmentation after many small transfers.
	pub fn compact(&mut self) {
		let mut compacted = VecDeque::with_capacity(self.segments.len());
		for mut segment in self.segments.drain(..) {
			match compacted.back_mut() {
				Some(tail) if Self::fits(tail, segment.len()) => {
					let len = segment.len();
					segment.move_into(tail, len);
					pool::recycle(segment);
				}
				_ => compacted.push_back(segment),
			}
		}
		self.segments = compacted;
	}

	// Direct segment access
	//
	// Escape hatches for zero-copy integration with APIs that produce or
	// consume raw slices. The closure contract is strict: the returned count
	// must not exceed the slice it was given.

	/// Invokes `read` with the head segment's readable bytes. The closure
	/// returns the number of bytes it consumed, which are then removed from
	/// the buffer. Returns that count, or 0 if the buffer is empty.
	pub fn read_from_head(&mut self, read: impl FnOnce(&[u8]) -> usize) -> usize {
		let Some(head) = self.segments.front_mut() else { return 0 };
		let consumed = read(head.data());
		assert_le!(consumed, head.len(), "consumed more bytes than were readable");
		head.consume(consumed);
		self.count -= consumed;
		self.tidy_head();
		consumed
	}

	/// Ensures the tail segment has at least `min_capacity` writable bytes,
	/// then invokes `write` with its free space. The closure returns the
	/// number of bytes it wrote, which become readable. Returns that count.
	pub fn write_to_tail(
		&mut self,
		min_capacity: usize,
		write: impl FnOnce(&mut [u8]) -> usize
	) -> usize {
		assert_le!(min_capacity, SIZE, "minimum capacity larger than a segment");
		let tail = self.writable_segment(min_capacity.max(1));
		let written = write(tail.free_space());
		tail.grow(written);
		self.count += written;
		written
	}

	/// Invokes `read` with slices over every segment's readable bytes, in
	/// order. The closure returns the total number of bytes it consumed, which
	/// are then removed from the buffer. Returns that count.
	pub fn read_bulk(&mut self, read: impl FnOnce(&[IoSlice<'_>]) -> usize) -> usize {
		let consumed = {
			let slices: Vec<_> = self.segments
									 .iter()
									 .map(|seg| IoSlice::new(seg.data()))
									 .collect();
			read(&slices)
		};
		assert_le!(consumed, self.count, "consumed more bytes than were readable");
		self.consume_front(consumed)
	}

	// Segment plumbing

	/// Consumes `byte_count` bytes from the front, recycling emptied segments.
	/// The count must not exceed [`Self::count`].
	pub(crate) fn consume_front(&mut self, byte_count: usize) -> usize {
		debug_assert_le!(byte_count, self.count);
		let mut remaining = byte_count;
		while remaining > 0 {
			let head = self.segments
						   .front_mut()
						   .expect("count invariant guarantees a head segment");
			let len = min(remaining, head.len());
			head.consume(len);
			remaining -= len;
			self.count -= len;
			self.tidy_head();
		}
		byte_count
	}

	/// Recycles the head segment if it was left empty.
	pub(crate) fn tidy_head(&mut self) {
		if self.segments.front().is_some_and(Segment::is_empty) {
			let head = self.segments.pop_front().unwrap();
			pool::recycle(head);
		}
	}

	/// Recycles the tail segment if it was left empty.
	pub(crate) fn tidy_tail(&mut self) {
		if self.segments.back().is_some_and(Segment::is_empty) {
			let tail = self.segments.pop_back().unwrap();
			pool::recycle(tail);
		}
	}

	/// Returns a tail segment with at least `min_capacity` writable bytes,
	/// claiming a fresh one from the pool when the current tail is shared or
	/// too full.
	pub(crate) fn writable_segment(&mut self, min_capacity: usize) -> &mut Segment {
		debug_assert_le!(min_capacity, SIZE);
		let needs_fresh = match self.segments.back() {
			None => true,
			Some(tail) => tail.is_shared() || tail.capacity() < min_capacity,
		};
		if needs_fresh {
			self.segments.push_back(pool::take());
		}
		self.segments.back_mut().unwrap()
	}

	/// Moves up to `byte_count` bytes from `source` into this buffer,
	/// returning the number moved. Whole segments move by reference; a needed
	/// prefix of the head is split off, shared when large enough to amortize
	/// and copied otherwise.
	pub(crate) fn splice_from(&mut self, source: &mut Buffer, byte_count: usize) -> usize {
		let moved = min(byte_count, source.count);
		let mut remaining = moved;
		while remaining > 0 {
			let head_len = source.segments
								 .front()
								 .expect("count invariant guarantees a head segment")
								 .len();
			if remaining < head_len {
				let head = source.segments.front_mut().unwrap();
				if remaining < SHARE_MINIMUM && self.tail_fits(remaining) {
					// Too small to be worth a new segment; absorb into the tail.
					let tail = self.segments.back_mut().unwrap();
					head.move_into(tail, remaining);
				} else {
					let prefix = Self::split_head(head, remaining);
					self.push_spliced(prefix);
				}
				source.count -= remaining;
				self.count += remaining;
				remaining = 0;
			} else {
				let segment = source.segments.pop_front().unwrap();
				source.count -= head_len;
				self.count += head_len;
				remaining -= head_len;
				self.push_spliced(segment);
			}
		}
		moved
	}

	/// Splits the first `byte_count` bytes off `head` into a new segment,
	/// advancing `head` past them. Large prefixes share the block; small ones
	/// are copied into a pooled segment.
	fn split_head(head: &mut Segment, byte_count: usize) -> Segment {
		if byte_count >= SHARE_MINIMUM {
			let prefix = head.share(byte_count);
			head.consume(byte_count);
			prefix
		} else {
			let mut prefix = pool::take();
			head.move_into(&mut prefix, byte_count);
			prefix
		}
	}

	/// Appends a spliced segment, first merging its payload into the current
	/// tail when it fits. Byte counts are the caller's responsibility.
	fn push_spliced(&mut self, mut segment: Segment) {
		if let Some(tail) = self.segments.back_mut() {
			if Self::fits(tail, segment.len()) {
				let len = segment.len();
				segment.move_into(tail, len);
				pool::recycle(segment);
				return
			}
		}
		self.segments.push_back(segment);
	}

	/// Returns `true` if the current tail can absorb `byte_count` more bytes,
	/// shifting its consumed prefix if necessary.
	fn tail_fits(&self, byte_count: usize) -> bool {
		self.segments
			.back()
			.is_some_and(|tail| Self::fits(tail, byte_count))
	}

	fn fits(tail: &Segment, byte_count: usize) -> bool {
		!tail.is_shared() && byte_count <= SIZE - tail.len()
	}

	#[cfg(test)]
	pub(crate) fn segment_count(&self) -> usize { self.segments.len() }

	#[cfg(test)]
	pub(crate) fn assert_invariants(&self) {
		let sum: usize = self.segments.iter().map(Segment::len).sum();
		assert_eq!(sum, self.count, "count must equal the summed segment lengths");
		assert!(
			!self.segments.iter().any(Segment::is_empty),
			"no segment may be left empty"
		);
	}
}

impl Drop for Buffer {
	fn drop(&mut self) {
		self.clear();
	}
}

impl Stream for Buffer {
	fn is_closed(&self) -> bool { false }

	fn close(&mut self) -> Result {
		self.clear();
		Ok(())
	}
}

impl BufStream for Buffer {
	fn buf(&self) -> &Buffer { self }
	fn buf_mut(&mut self) -> &mut Buffer { self }
}

impl BufSource for Buffer {
	fn request(&mut self, byte_count: usize) -> Result<bool> {
		Ok(self.count >= byte_count)
	}
}

impl BufSink for Buffer { }

impl fmt::Debug for Buffer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Buffer")
		 .field("count", &self.count)
		 .field("segments", &self.segments)
		 .finish()
	}
}

impl Extend<u8> for Buffer {
	fn extend<T: IntoIterator<Item = u8>>(&mut self, iter: T) {
		for byte in iter {
			let segment = self.writable_segment(1);
			segment.push(byte);
			self.count += 1;
		}
	}
}

impl From<&[u8]> for Buffer {
	fn from(value: &[u8]) -> Self {
		let mut buffer = Self::new();
		let _ = buffer.write_from_slice(value);
		buffer
	}
}

impl From<&str> for Buffer {
	fn from(value: &str) -> Self {
		value.as_bytes().into()
	}
}

#[cfg(test)]
mod test {
	use crate::segment::SIZE;
	use super::Buffer;

	#[test]
	fn conservation() {
		let mut buffer = Buffer::new();
		buffer.write_from_slice(&[0x55; SIZE * 2 + 17]).unwrap();
		assert_eq!(buffer.count(), SIZE * 2 + 17);
		buffer.assert_invariants();
		buffer.skip(SIZE + 1).unwrap();
		buffer.assert_invariants();
		assert_eq!(buffer.count(), SIZE + 16);
	}

	#[test]
	fn head_recycled_on_read() {
		let mut buffer = Buffer::new();
		buffer.write_from_slice(&[1; SIZE * 3]).unwrap();
		assert_eq!(buffer.segment_count(), 3);
		let mut dst = vec![0; SIZE];
		buffer.read_into_slice_exact(&mut dst).unwrap();
		assert_eq!(buffer.segment_count(), 2);
		assert_eq!(buffer.count(), SIZE * 2);
	}

	#[test]
	fn splice_moves_whole_segments() {
		let mut source = Buffer::new();
		source.write_from_slice(&[7; SIZE * 2]).unwrap();
		let mut sink = Buffer::new();
		assert_eq!(sink.splice_from(&mut source, SIZE * 2), SIZE * 2);
		assert_eq!(source.count(), 0);
		assert_eq!(sink.count(), SIZE * 2);
		assert_eq!(sink.segment_count(), 2);
	}

	#[test]
	fn splice_shares_large_prefixes() {
		let mut source = Buffer::new();
		source.write_from_slice(&[7; SIZE]).unwrap();
		let mut sink = Buffer::new();
		sink.splice_from(&mut source, 4096);
		assert_eq!(source.count(), SIZE - 4096);
		assert_eq!(sink.count(), 4096);
	}

	#[test]
	fn copy_to_leaves_source_intact() {
		let mut source = Buffer::from("a longer test string");
		let mut out = Buffer::new();
		source.copy_to(&mut out, 2, 6).unwrap();
		let mut copied = String::new();
		out.read_utf8_to_end(&mut copied).unwrap();
		assert_eq!(copied, "longer");
		let mut original = String::new();
		source.read_utf8_to_end(&mut original).unwrap();
		assert_eq!(original, "a longer test string");
	}

	#[test]
	fn compact_merges_partials() {
		let mut buffer = Buffer::new();
		// Shared views fragment the buffer; dropping the originals afterwards
		// leaves small unshared segments for compact to merge.
		let mut originals = Vec::new();
		for _ in 0..4 {
			let chunk = Buffer::from(&[3u8; 2000][..]);
			chunk.copy_to(&mut buffer, 0, 2000).unwrap();
			originals.push(chunk);
		}
		assert_eq!(buffer.segment_count(), 4);
		drop(originals);

		buffer.compact();
		assert_eq!(buffer.count(), 8000);
		assert_eq!(buffer.segment_count(), 1);
		buffer.assert_invariants();
	}
}
