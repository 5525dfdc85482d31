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

//! Bridges between this crate's streams and [`std::io`].

use std::io;
use std::io::{Read, Write};
use crate::{Buffer, Error, Result};
use crate::streams::{BufSink, BufSource, Sink, Source, Stream};

/// A [`Source`] reading from a [`Read`] stream.
pub struct ReaderSource<R: Read>(R);

impl<R: Read> ReaderSource<R> {
	pub fn new(reader: R) -> Self { Self(reader) }

	pub fn into_inner(self) -> R { self.0 }
}

impl<R: Read> Stream for ReaderSource<R> {
	fn is_closed(&self) -> bool { false }
}

impl<R: Read> Source for ReaderSource<R> {
	fn fill(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<usize> {
		sink.write_std(&mut self.0, byte_count)
			.map_err(Error::with_op_buf_read)
	}
}

/// A [`Sink`] writing to a [`Write`] stream.
pub struct WriterSink<W: Write>(W);

impl<W: Write> WriterSink<W> {
	pub fn new(writer: W) -> Self { Self(writer) }

	pub fn into_inner(self) -> W { self.0 }
}

impl<W: Write> Stream for WriterSink<W> {
	fn is_closed(&self) -> bool { false }
}

impl<W: Write> Sink for WriterSink<W> {
	fn drain(&mut self, source: &mut Buffer, byte_count: usize) -> Result<usize> {
		source.read_std(&mut self.0, byte_count)
			  .map_err(Error::with_op_buf_write)
	}

	fn flush(&mut self) -> Result {
		self.0
			.flush()
			.map_err(Into::into)
	}
}

/// A wrapper implementing the [`Read`] trait for [`BufSource`].
pub struct SourceReader<S: BufSource>(S);

impl<S: BufSource> From<S> for SourceReader<S> {
	fn from(value: S) -> Self { Self(value) }
}

impl<S: BufSource> Read for SourceReader<S> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let Self(source) = self;
		source.read_into_slice(buf)
			  .map_err(Error::into_io)
	}
}

/// A wrapper implementing the [`Write`] trait for [`BufSink`].
pub struct SinkWriter<S: BufSink>(S);

impl<S: BufSink> From<S> for SinkWriter<S> {
	fn from(value: S) -> Self { Self(value) }
}

impl<S: BufSink> Write for SinkWriter<S> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		let Self(sink) = self;
		sink.write_from_slice(buf)
			.map_err(Error::into_io)?;
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		self.0
			.flush()
			.map_err(Error::into_io)
	}
}

/// Converts a buffered source into a [`Read`] stream.
pub trait IntoRead: BufSource + Sized {
	fn into_read(self) -> SourceReader<Self> { self.into() }
}

/// Converts a buffered sink into a [`Write`] stream.
pub trait IntoWrite: BufSink + Sized {
	fn into_write(self) -> SinkWriter<Self> { self.into() }
}

impl<S: BufSource + Sized> IntoRead for S { }

impl<S: BufSink + Sized> IntoWrite for S { }
