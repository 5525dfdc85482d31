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
use std::io::Cursor;
use pretty_assertions::{assert_eq, assert_str_eq};
use brio::{Buffer, ErrorKind, ReaderSource, Result, SEGMENT_SIZE};
use brio::streams::{BufSink, BufSource, BufStream, Sink, Source, SourceExt, SinkExt, Stream};

/// A source yielding its data at most `chunk` bytes per fill, to exercise
/// refills.
struct ChunkedSource {
	data: Vec<u8>,
	pos: usize,
	chunk: usize,
}

impl ChunkedSource {
	fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
		Self {
			data: data.into(),
			pos: 0,
			chunk,
		}
	}
}

impl Stream for ChunkedSource {
	fn is_closed(&self) -> bool { false }
}

impl Source for ChunkedSource {
	fn fill(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<usize> {
		let count = min(min(byte_count, self.chunk), self.data.len() - self.pos);
		sink.write_from_slice(&self.data[self.pos..self.pos + count])?;
		self.pos += count;
		Ok(count)
	}
}

/// A sink recording every drain it receives.
#[derive(Default)]
struct RecordingSink {
	bytes: Vec<u8>,
	drains: Vec<usize>,
	flushes: usize,
	closes: usize,
}

impl Stream for RecordingSink {
	fn is_closed(&self) -> bool { false }

	fn close(&mut self) -> Result {
		self.closes += 1;
		Ok(())
	}
}

impl Sink for RecordingSink {
	fn drain(&mut self, source: &mut Buffer, byte_count: usize) -> Result<usize> {
		self.drains.push(byte_count);
		// Qualified to dodge Vec's own `drain`.
		Sink::drain(&mut self.bytes, source, byte_count)
	}

	fn flush(&mut self) -> Result {
		self.flushes += 1;
		Ok(())
	}
}

#[test]
fn typed_reads_across_refills() -> Result {
	let mut source = ChunkedSource::new(0xA1B2C3D4E5F60718u64.to_be_bytes(), 3).buffered();
	assert_eq!(source.read_u32()?, 0xA1B2C3D4);
	assert_eq!(source.read_u32()?, 0xE5F60718);
	Ok(())
}

#[test]
fn request_and_require() -> Result {
	let mut source = ChunkedSource::new(vec![0; 10], 4).buffered();
	assert!(source.request(10)?);
	assert!(!source.request(11)?);
	assert!(source.require(10).is_ok());
	assert_eq!(source.require(11).unwrap_err().kind, ErrorKind::Eos);
	Ok(())
}

#[test]
fn exhausted_after_reads() -> Result {
	let mut source = ChunkedSource::new(b"ab".to_vec(), 1).buffered();
	assert!(!source.exhausted()?);
	source.read_u8()?;
	source.read_u8()?;
	assert!(source.exhausted()?);
	Ok(())
}

#[test]
fn read_into_slice_stops_at_eos() -> Result {
	let mut source = ChunkedSource::new(b"abcdef".to_vec(), 2).buffered();
	let mut dst = [0; 10];
	assert_eq!(source.read_into_slice(&mut dst)?, 6);
	assert_eq!(&dst[..6], b"abcdef");
	Ok(())
}

#[test]
fn lines_across_refills() -> Result {
	let mut source = ChunkedSource::new(b"line1\nline2\r\nline3".to_vec(), 1).buffered();
	assert_eq!(source.read_line()?.as_deref(), Some("line1"));
	assert_eq!(source.read_line()?.as_deref(), Some("line2"));
	assert_eq!(source.read_line()?.as_deref(), Some("line3"));
	assert_eq!(source.read_line()?, None);
	Ok(())
}

#[test]
fn index_of_drives_refills() -> Result {
	let mut data = vec![0u8; SEGMENT_SIZE * 2];
	data.extend_from_slice(b"needle");
	let mut source = ChunkedSource::new(data, 100).buffered();
	assert_eq!(
		source.index_of_slice(b"needle", 0, usize::MAX)?,
		Some(SEGMENT_SIZE * 2)
	);
	assert_eq!(source.index_of(b'z', 0, usize::MAX)?, None);
	Ok(())
}

#[test]
fn peek_does_not_consume() -> Result {
	let mut source = ChunkedSource::new(vec![0x1F, 0x8B, 0x08, 0x00], 2).buffered();

	let mut peek = source.peek();
	assert_eq!(peek.read_u8()?, 0x1F);
	assert_eq!(peek.read_u8()?, 0x8B);
	// The peek reads past what the source had buffered, driving refills.
	assert_eq!(peek.read_u8()?, 0x08);
	assert!(!peek.exhausted()?);
	drop(peek);

	assert_eq!(source.read_u8()?, 0x1F);
	assert_eq!(source.read_u8()?, 0x8B);
	assert_eq!(source.read_u8()?, 0x08);
	assert_eq!(source.read_u8()?, 0x00);
	assert!(source.exhausted()?);
	Ok(())
}

#[test]
fn sequential_peeks_are_independent() -> Result {
	let mut source = ChunkedSource::new(b"repeatable".to_vec(), 3).buffered();

	let mut first = String::new();
	source.peek().read_utf8(&mut first, 10)?;
	let mut second = String::new();
	source.peek().read_utf8(&mut second, 10)?;

	assert_str_eq!(first, "repeatable");
	assert_str_eq!(second, "repeatable");

	let mut consumed = String::new();
	source.read_utf8(&mut consumed, 10)?;
	assert_str_eq!(consumed, "repeatable");
	Ok(())
}

#[test]
fn peek_starts_at_current_position() -> Result {
	let mut source = ChunkedSource::new(b"skip this".to_vec(), 4).buffered();
	source.skip(5)?;
	let mut peeked = String::new();
	source.peek().read_utf8(&mut peeked, 4)?;
	assert_str_eq!(peeked, "this");
	assert_eq!(source.skip(100)?, 4);
	Ok(())
}

#[test]
fn partial_writes_stay_buffered() -> Result {
	let mut sink = RecordingSink::default().buffered();
	sink.write_from_slice(b"small")?;
	// Nothing completed a segment, so nothing was forwarded.
	assert!(sink.buf().count() > 0);
	Ok(())
}

#[test]
fn complete_segments_are_emitted() -> Result {
	let mut sink = RecordingSink::default().buffered();
	sink.write_from_slice(&vec![7; SEGMENT_SIZE + 10])?;
	// The filled segment went through; the partial tail stayed.
	assert_eq!(sink.buf().count(), 10);
	Ok(())
}

#[test]
fn emit_and_flush() -> Result {
	let mut recorder = RecordingSink::default();
	{
		let mut sink = (&mut recorder).buffered();
		sink.write_from_slice(b"abc")?;
		sink.emit()?;
		assert_eq!(sink.buf().count(), 0);
		sink.write_from_slice(b"def")?;
		sink.flush()?;
		sink.close()?;
	}
	assert_eq!(recorder.bytes, b"abcdef");
	// One explicit flush, one from close.
	assert_eq!(recorder.flushes, 2);
	assert_eq!(recorder.closes, 1);
	Ok(())
}

#[test]
fn close_flushes_and_is_idempotent() -> Result {
	let mut recorder = RecordingSink::default();
	{
		let mut sink = (&mut recorder).buffered();
		sink.write_utf8("closing")?;
		sink.close()?;
		sink.close()?;
		let err = sink.write_u8(0).unwrap_err();
		assert_eq!(err.kind, ErrorKind::Closed);
	}
	assert_eq!(recorder.bytes, b"closing");
	assert_eq!(recorder.closes, 1);
	Ok(())
}

#[test]
fn write_from_source_emits_incrementally() -> Result {
	let mut recorder = RecordingSink::default();
	{
		let mut sink = (&mut recorder).buffered();
		let mut source = ChunkedSource::new(vec![9; SEGMENT_SIZE * 3], SEGMENT_SIZE);
		assert_eq!(sink.write_all(&mut source)?, SEGMENT_SIZE * 3);
		// Full segments were forwarded along the way, not accumulated.
		assert_eq!(sink.buf().count(), 0);
		sink.close()?;
	}
	assert_eq!(recorder.bytes.len(), SEGMENT_SIZE * 3);
	Ok(())
}

#[test]
fn write_exact_count_from_source() -> Result {
	let mut recorder = RecordingSink::default();
	{
		let mut sink = (&mut recorder).buffered();
		let mut source = ChunkedSource::new(b"abcdefgh".to_vec(), 3);
		assert_eq!(sink.write(&mut source, 5)?, 5);
		sink.close()?;
	}
	assert_eq!(recorder.bytes, b"abcde");
	Ok(())
}

#[test]
fn write_past_source_end_fails() {
	let mut sink = RecordingSink::default().buffered();
	let mut source = ChunkedSource::new(b"abc".to_vec(), 3);
	let err = sink.write(&mut source, 10).unwrap_err();
	assert_eq!(err.kind, ErrorKind::Eos);
}

#[test]
fn reads_after_close_fail() {
	let mut source = ChunkedSource::new(b"abc".to_vec(), 3).buffered();
	source.close().unwrap();
	assert_eq!(source.read_u8().unwrap_err().kind, ErrorKind::Closed);
}

#[test]
fn source_to_sink_transfer() -> Result {
	let mut source = ChunkedSource::new(b"transfer me in pieces".to_vec(), 4).buffered();
	let mut sink = Vec::new();
	assert_eq!(source.read_all(&mut sink)?, 21);
	assert_eq!(sink, b"transfer me in pieces");
	Ok(())
}

#[test]
fn std_reader_bridge() -> Result {
	let reader = Cursor::new(b"bridged bytes".to_vec());
	let mut source = ReaderSource::new(reader).buffered();
	let mut read = String::new();
	source.read_utf8_to_end(&mut read)?;
	assert_str_eq!(read, "bridged bytes");
	Ok(())
}

#[test]
fn slice_source() -> Result {
	let mut source = (&b"from a slice"[..]).buffered();
	let mut read = String::new();
	source.read_utf8(&mut read, 4)?;
	assert_str_eq!(read, "from");
	Ok(())
}
