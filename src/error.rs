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

use std::error::Error as StdError;
use std::{error, io, result};
use amplify_derive::Display;
use ErrorKind::{Closed, Eos, IllegalArgument, Io, NumberFormat};
use OperationKind::{BufClear, BufCopy, BufFlush, BufRead, BufWrite};

pub type Result<T = ()> = result::Result<T, Error>;

/// The operation an [`Error`] occurred in, for context.
#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq)]
pub enum OperationKind {
	#[default]
	#[display("unknown operation")]
	Unknown,
	#[display("read from buffer")]
	BufRead,
	#[display("write to buffer")]
	BufWrite,
	#[display("copy buffer")]
	BufCopy,
	#[display("clear buffer")]
	BufClear,
	#[display("flush buffer")]
	BufFlush,
	#[display("{0}")]
	Other(&'static str),
}

#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum ErrorKind {
	/// More bytes were required than the stream could provide.
	#[display("premature end-of-stream")]
	Eos,
	/// A raw endpoint reported failure.
	#[display("IO error")]
	Io,
	/// Operation on a closed stream.
	#[display("stream closed")]
	Closed,
	/// A count or range was negative, overflowing, or out of bounds.
	#[display("illegal argument")]
	IllegalArgument,
	/// No digits, or a value too large, in a numeric read.
	#[display("malformed number")]
	NumberFormat,
	#[display("{0}")]
	Other(&'static str),
}

#[derive(Debug, Display)]
#[display("could not {op}: {kind}")]
pub struct Error {
	pub op: OperationKind,
	pub kind: ErrorKind,
	source: Option<Box<dyn error::Error + Send + Sync + 'static>>,
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		self.source.as_deref().map(|e| e as &(dyn error::Error + 'static))
	}
}

impl From<io::Error> for Error {
	fn from(value: io::Error) -> Self {
		if let io::ErrorKind::UnexpectedEof = value.kind() {
			Self::eos(OperationKind::Unknown)
		} else {
			Self::io(OperationKind::Unknown, value)
		}
	}
}

impl Error {
	pub fn new(
		op: OperationKind,
		kind: ErrorKind,
		source: Option<Box<dyn error::Error + Send + Sync + 'static>>
	) -> Self {
		Self { op, kind, source }
	}

	/// Creates a new "end-of-stream" error.
	pub fn eos(op: OperationKind) -> Self { Self::new(op, Eos, None) }

	/// Creates a new IO error.
	pub fn io(op: OperationKind, error: io::Error) -> Self {
		Self::new(op, Io, Some(error.into()))
	}

	/// Creates a new "closed" error.
	pub fn closed(op: OperationKind) -> Self { Self::new(op, Closed, None) }

	/// Creates a new "illegal argument" error.
	pub fn illegal_argument(op: OperationKind, error: BoundsError) -> Self {
		Self::new(op, IllegalArgument, Some(error.into()))
	}

	/// Creates a new number format error.
	pub fn number_format(error: NumberFormatError) -> Self {
		Self::new(BufRead, NumberFormat, Some(error.into()))
	}

	/// Replaces the operation context.
	pub fn with_operation(mut self, op: OperationKind) -> Self {
		self.op = op;
		self
	}

	/// Convenience shorthand for `with_operation(OperationKind::BufRead)`.
	pub fn with_op_buf_read(self) -> Self { self.with_operation(BufRead) }

	/// Convenience shorthand for `with_operation(OperationKind::BufWrite)`.
	pub fn with_op_buf_write(self) -> Self { self.with_operation(BufWrite) }

	/// Convenience shorthand for `with_operation(OperationKind::BufCopy)`.
	pub fn with_op_buf_copy(self) -> Self { self.with_operation(BufCopy) }

	/// Convenience shorthand for `with_operation(OperationKind::BufClear)`.
	pub fn with_op_buf_clear(self) -> Self { self.with_operation(BufClear) }

	/// Convenience shorthand for `with_operation(OperationKind::BufFlush)`.
	pub fn with_op_buf_flush(self) -> Self { self.with_operation(BufFlush) }

	/// Returns the source downcast into an IO Error, if possible.
	pub fn io_source(&self) -> Option<&io::Error> {
		self.source()?.downcast_ref()
	}

	pub(crate) fn into_io(self) -> io::Error {
		match self.kind {
			Eos => io::Error::new(io::ErrorKind::UnexpectedEof, self),
			Io  => {
				let Some(src) = self.io_source() else {
					return io::Error::other(self)
				};
				io::Error::new(src.kind(), self)
			}
			_   => io::Error::other(self)
		}
	}
}

/// A malformed numeric token in [`read_decimal_long`] or
/// [`read_hexadecimal_unsigned_long`].
///
/// [`read_decimal_long`]: crate::streams::BufSource::read_decimal_long
/// [`read_hexadecimal_unsigned_long`]: crate::streams::BufSource::read_hexadecimal_unsigned_long
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum NumberFormatError {
	#[error("expected a decimal digit, found {0:#04X}")]
	NotADigit(u8),
	#[error("expected a hexadecimal digit, found {0:#04X}")]
	NotAHexDigit(u8),
	#[error("number too large to fit in a 64-bit value")]
	Overflow,
}

/// An index or range outside the readable bounds of a buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("range [{start}, {end}) out of bounds for size {size}")]
pub struct BoundsError {
	pub start: usize,
	pub end: usize,
	pub size: usize,
}
