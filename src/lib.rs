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

//! ## How it works
//!
//! Data is written to and read from reusable chunks of memory called *segments*.
//! When a segment is consumed, it's returned to a *pool*. To write data, segments
//! are claimed from this pool. When the pool is exhausted, new segments are
//! allocated. The pool is thread-local; each thread keeps a small free list with
//! a capped footprint, so claiming and recycling never contend on a lock.
//!
//! ### Segments
//!
//! Segments are fixed-size (8192-byte) chunks of memory arranged in a ring to
//! form a [`Buffer`], a byte queue read from one end and written to the other.
//! Memory within segments can either be owned by or shared between segments,
//! avoiding expensive mem-copy operations as much as possible. Shared memory is
//! read-only; a segment may only be written while it holds its memory uniquely.
//! Small amounts of data under a set threshold (1024 bytes) are copied rather
//! than shared, as a tradeoff between allocation churn and copy cost.
//!
//! Moving bytes between two buffers splices whole segments from one ring to the
//! other instead of copying, splitting the head segment when only a prefix is
//! needed. Fragmentation left behind by small transfers is repaired by merging
//! partial segments back together, either opportunistically during writes or
//! manually with [`Buffer::compact`].
//!
//! ### Streams
//!
//! The raw endpoints are [`Source`] and [`Sink`](streams::Sink): unbuffered
//! streams that move bytes into or out of a [`Buffer`]. [`BufferedSource`] and
//! [`BufferedSink`] wrap a raw endpoint together with an owned buffer, adding
//! typed primitive reads and writes, UTF-8 decoding and encoding, line reading,
//! searching, and a non-consuming [`peek`](streams::BufSource::peek) view. The
//! buffer itself implements both ends, so it can stand in wherever a stream is
//! expected.
//!
//! [`Source`]: streams::Source
//! [`BufferedSource`]: streams::BufferedSource
//! [`BufferedSink`]: streams::BufferedSink

mod buffer;
mod buffered_wrappers;
mod byte_str;
mod error;
mod pool;
mod segment;
mod std_io;
pub mod streams;
mod util;

pub use buffer::*;
pub use byte_str::*;
pub use error::*;
pub use segment::SIZE as SEGMENT_SIZE;
pub use std_io::*;
