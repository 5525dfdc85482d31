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

use paste::paste;
use pretty_assertions::assert_eq;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use brio::{Buffer, ErrorKind, SEGMENT_SIZE};
use brio::streams::Sink;

macro_rules! round_trips {
    ($($ty:ident),+) => { paste! { $(
		#[quickcheck]
		fn [<$ty _round_trip>](value: $ty) -> bool {
			let mut buf = Buffer::new();
			buf.[<write_ $ty>](value).unwrap();
			buf.[<read_ $ty>]().unwrap() == value
		}

		#[quickcheck]
		fn [<$ty _round_trip_le>](value: $ty) -> bool {
			let mut buf = Buffer::new();
			buf.[<write_ $ty _le>](value).unwrap();
			buf.[<read_ $ty _le>]().unwrap() == value
		}
	)+ } };
}

round_trips! { u16, i16, u32, i32, u64, i64 }

#[quickcheck]
fn u8_round_trip(value: u8) -> bool {
	let mut buf = Buffer::new();
	buf.write_u8(value).unwrap();
	buf.read_u8().unwrap() == value
}

#[quickcheck]
fn i8_round_trip(value: i8) -> bool {
	let mut buf = Buffer::new();
	buf.write_i8(value).unwrap();
	buf.read_i8().unwrap() == value
}

#[quickcheck]
fn decimal_round_trip(value: i64) -> bool {
	let mut buf = Buffer::new();
	buf.write_decimal_long(value).unwrap();
	buf.read_decimal_long().unwrap() == value && buf.is_empty()
}

#[quickcheck]
fn hexadecimal_round_trip(value: u64) -> bool {
	let mut buf = Buffer::new();
	buf.write_hexadecimal_unsigned_long(value).unwrap();
	buf.read_hexadecimal_unsigned_long().unwrap() == value && buf.is_empty()
}

#[quickcheck]
fn slice_round_trip(data: Vec<u8>) -> bool {
	let mut buf = Buffer::new();
	buf.write_from_slice(&data).unwrap();
	let mut read = vec![0; data.len()];
	buf.read_into_slice_exact(&mut read).unwrap();
	read == data && buf.is_empty()
}

#[quickcheck]
fn transfer_idempotence(data: Vec<u8>) -> bool {
	let mut from = Buffer::from(&data[..]);
	let mut to = Buffer::from(&b"prefix"[..]);
	from.transfer_to(&mut to).unwrap();
	from.count() == 0 &&
	to.count() == data.len() + 6 &&
	to.snapshot().as_slice()[6..] == data
}

#[quickcheck]
fn splice_equals_copy(data: Vec<u8>, count: usize) -> TestResult {
	if count > data.len() { return TestResult::discard() }

	let mut source = Buffer::from(&data[..]);
	let mut sink = Buffer::new();
	sink.drain(&mut source, count).unwrap();

	let spliced_to = sink.snapshot();
	let remainder = source.snapshot();
	TestResult::from_bool(
		*spliced_to == data[..count] && *remainder == data[count..]
	)
}

#[quickcheck]
fn index_of_agreement(data: Vec<u8>, byte: u8) -> bool {
	let buffer = Buffer::from(&data[..]);
	buffer.index_of(byte, 0, usize::MAX) == data.iter().position(|&b| b == byte)
}

#[quickcheck]
fn index_of_slice_agreement(data: Vec<u8>, needle: Vec<u8>) -> TestResult {
	if needle.is_empty() { return TestResult::discard() }

	let buffer = Buffer::from(&data[..]);
	let expected = data.windows(needle.len())
					   .position(|window| window == needle);
	TestResult::from_bool(
		buffer.index_of_slice(&needle, 0, usize::MAX) == expected
	)
}

#[test]
fn int_read_as_bytes() {
	let mut buf = Buffer::new();
	buf.write_u32(0x01020304).unwrap();
	let bytes = [
		buf.read_u8().unwrap(),
		buf.read_u8().unwrap(),
		buf.read_u8().unwrap(),
		buf.read_u8().unwrap(),
	];
	assert_eq!(bytes, [0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn endian_duals() {
	let mut buf = Buffer::new();
	buf.write_u32(0xA1B2C3D4).unwrap();
	assert_eq!(buf.read_u32_le().unwrap(), 0xD4C3B2A1);
}

#[test]
fn bulk_write_segments() {
	let mut buf = Buffer::new();
	buf.write_from_slice(&vec![0xAB; SEGMENT_SIZE * 3]).unwrap();
	assert_eq!(buf.count(), SEGMENT_SIZE * 3);

	let first = buf.read_byte_str(SEGMENT_SIZE).unwrap();
	assert_eq!(first.len(), SEGMENT_SIZE);
	assert!(first.as_slice().iter().all(|&b| b == 0xAB));
	assert_eq!(buf.count(), SEGMENT_SIZE * 2);
}

#[test]
fn typed_read_underflow() {
	let mut buf = Buffer::new();
	buf.write_u8(1).unwrap();
	let err = buf.read_u32().unwrap_err();
	assert_eq!(err.kind, ErrorKind::Eos);
	// The byte is still readable.
	assert_eq!(buf.count(), 1);
}

#[test]
fn decimal_bounds() {
	let mut buf = Buffer::from("-9223372036854775808 9223372036854775807");
	assert_eq!(buf.read_decimal_long().unwrap(), i64::MIN);
	buf.skip(1).unwrap();
	assert_eq!(buf.read_decimal_long().unwrap(), i64::MAX);
}

#[test]
fn decimal_overflow() {
	let mut buf = Buffer::from("9223372036854775808");
	let err = buf.read_decimal_long().unwrap_err();
	assert_eq!(err.kind, ErrorKind::NumberFormat);
}

#[test]
fn decimal_stops_at_non_digit() {
	let mut buf = Buffer::from("-123x4");
	assert_eq!(buf.read_decimal_long().unwrap(), -123);
	assert_eq!(buf.count(), 2);
}

#[test]
fn decimal_without_digits() {
	let mut buf = Buffer::from("x12");
	let err = buf.read_decimal_long().unwrap_err();
	assert_eq!(err.kind, ErrorKind::NumberFormat);
	assert_eq!(buf.count(), 3);

	let mut buf = Buffer::from("-");
	assert_eq!(buf.read_decimal_long().unwrap_err().kind, ErrorKind::Eos);
}

#[test]
fn hexadecimal_mixed_case() {
	let mut buf = Buffer::from("DeadBeef!");
	assert_eq!(buf.read_hexadecimal_unsigned_long().unwrap(), 0xDEADBEEF);
	assert_eq!(buf.count(), 1);
}

#[test]
fn hexadecimal_overflow() {
	let mut buf = Buffer::from("0123456789abcdef0");
	let err = buf.read_hexadecimal_unsigned_long().unwrap_err();
	assert_eq!(err.kind, ErrorKind::NumberFormat);
}

#[test]
fn snapshot_immutability() {
	let mut buf = Buffer::from("before");
	let snapshot = buf.snapshot();
	buf.write_utf8(" and after").unwrap();
	buf.skip(3).unwrap();
	assert_eq!(snapshot, &b"before"[..]);
}

#[test]
fn copy_to_out_of_bounds() {
	let buf = Buffer::from("short");
	let mut out = Buffer::new();
	let err = buf.copy_to(&mut out, 2, 10).unwrap_err();
	assert_eq!(err.kind, ErrorKind::IllegalArgument);
}

#[test]
fn drain_more_than_buffered() {
	let mut source = Buffer::from("abc");
	let mut sink = Buffer::new();
	let err = sink.drain(&mut source, 4).unwrap_err();
	assert_eq!(err.kind, ErrorKind::IllegalArgument);
	assert_eq!(source.count(), 3);
}

#[test]
fn read_bulk_consumes_across_segments() {
	let mut buf = Buffer::new();
	buf.write_from_slice(&vec![1; SEGMENT_SIZE]).unwrap();
	buf.write_from_slice(&[2; 4]).unwrap();

	let mut seen = 0;
	let consumed = buf.read_bulk(|slices| {
		seen = slices.iter().map(|s| s.len()).sum();
		seen
	});
	assert_eq!(consumed, SEGMENT_SIZE + 4);
	assert_eq!(seen, SEGMENT_SIZE + 4);
	assert!(buf.is_empty());
}

#[test]
fn write_to_tail_reserves_capacity() {
	let mut buf = Buffer::new();
	let written = buf.write_to_tail(32, |space| {
		assert!(space.len() >= 32);
		space[..3].copy_from_slice(b"abc");
		3
	});
	assert_eq!(written, 3);
	assert_eq!(buf.snapshot(), &b"abc"[..]);
}

#[test]
fn read_from_head_partial_consume() {
	let mut buf = Buffer::from("hello world");
	let consumed = buf.read_from_head(|data| {
		assert_eq!(data, b"hello world");
		5
	});
	assert_eq!(consumed, 5);
	assert_eq!(buf.snapshot(), &b" world"[..]);
}
