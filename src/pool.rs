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

//! The segment pool: a thread-local free list recycling segments between
//! buffers to avoid repeated allocation. Each thread keeps at most
//! [`MAX_POOL_BYTES`] of free segments; recycles beyond the cap, and segments
//! whose block is still shared elsewhere, are dropped.

use std::cell::RefCell;
use crate::segment::{Segment, SIZE};

/// The byte capacity of each thread's free list.
const MAX_POOL_BYTES: usize = 64 * 1024;
const MAX_POOL_SEGMENTS: usize = MAX_POOL_BYTES / SIZE;

thread_local! {
	static POOL: RefCell<Vec<Segment>> = RefCell::new(Vec::with_capacity(MAX_POOL_SEGMENTS));
}

/// Claims a segment, recycled if the free list has one, freshly allocated
/// otherwise. The segment is empty and holds its block uniquely.
pub(crate) fn take() -> Segment {
	POOL.try_with(|pool|
			pool.borrow_mut()
				.pop()
				.unwrap_or_else(Segment::fresh)
		)
		.unwrap_or_else(|_| Segment::fresh())
}

/// Returns a segment to the free list. Segments with shared blocks are
/// discarded, as are recycles beyond the capacity cap. Buffers dropped during
/// thread teardown fall through to plain deallocation.
pub(crate) fn recycle(mut segment: Segment) {
	if segment.is_shared() { return }
	let _ = POOL.try_with(|pool| {
		let mut pool = pool.borrow_mut();
		if pool.len() < MAX_POOL_SEGMENTS {
			segment.clear();
			pool.push(segment);
		}
	});
}
