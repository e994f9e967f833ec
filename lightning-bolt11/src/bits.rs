//! Conversion between 5-bit bech32 symbols and a flat stream of bits, and a bounds-checked cursor
//! reading big-endian integers of arbitrary width out of such a stream.
//!
//! Everything after the human readable part of an invoice is a plain bit string chopped into
//! 5-bit symbols by bech32. Fields inside it are not aligned to symbols (route hints are 408
//! bits long, the timestamp is 35 bits, the signature 520), so the codec works on individual
//! bits rather than on bytes.

use bech32::Fe32;

use core::fmt;

/// A structural problem with a bit stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BitsError {
	/// The stream can't be split into 5-bit symbols, its length is not a multiple of 5.
	UnalignedLength(usize),
	/// A read asked for more bits than the stream had left.
	UnexpectedEnd {
		/// Number of bits asked for.
		requested: usize,
		/// Number of bits still unread.
		remaining: usize,
	},
	/// An integer read wider than 64 bits.
	WidthTooLarge(usize),
}

impl fmt::Display for BitsError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			BitsError::UnalignedLength(len) =>
				write!(f, "bit stream of length {} is not a multiple of 5", len),
			BitsError::UnexpectedEnd { requested, remaining } =>
				write!(f, "tried to read {} bits with only {} left", requested, remaining),
			BitsError::WidthTooLarge(width) =>
				write!(f, "can't read a {}-bit wide integer", width),
		}
	}
}

impl std::error::Error for BitsError {}

/// An owned sequence of bits, most significant bit first.
#[derive(Clone, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct BitBuf(Vec<bool>);

impl BitBuf {
	/// Creates an empty buffer.
	pub fn new() -> Self {
		BitBuf(Vec::new())
	}

	/// Unpacks bech32 symbols into their bits.
	pub fn from_fe32s(groups: &[Fe32]) -> Self {
		let mut buf = BitBuf(Vec::with_capacity(groups.len() * 5));
		for group in groups {
			buf.push_fe32(*group);
		}
		buf
	}

	/// Unpacks bytes into their bits.
	pub fn from_bytes(bytes: &[u8]) -> Self {
		let mut buf = BitBuf(Vec::with_capacity(bytes.len() * 8));
		buf.push_bytes(bytes);
		buf
	}

	/// Copies a slice of bits into a new buffer.
	pub fn from_bits(bits: &[bool]) -> Self {
		BitBuf(bits.to_vec())
	}

	/// Number of bits in the buffer.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the buffer holds no bits at all.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// The bits of the buffer.
	pub fn as_bits(&self) -> &[bool] {
		&self.0
	}

	/// Appends a single bit.
	pub fn push_bit(&mut self, bit: bool) {
		self.0.push(bit);
	}

	/// Appends the low `width` bits of `value`, most significant first.
	///
	/// Panics if `width` exceeds 64.
	pub fn push_uint(&mut self, value: u64, width: usize) {
		assert!(width <= 64);
		for shift in (0..width).rev() {
			self.0.push((value >> shift) & 1 == 1);
		}
	}

	/// Appends all bits of the given bytes.
	pub fn push_bytes(&mut self, bytes: &[u8]) {
		for byte in bytes {
			self.push_uint(*byte as u64, 8);
		}
	}

	/// Appends the five bits of a bech32 symbol.
	pub fn push_fe32(&mut self, group: Fe32) {
		self.push_uint(group.to_u8() as u64, 5);
	}

	/// Appends a slice of bits.
	pub fn extend_from_bits(&mut self, bits: &[bool]) {
		self.0.extend_from_slice(bits);
	}

	/// Appends zero bits until the length is a multiple of `multiple`.
	pub fn pad_to_multiple(&mut self, multiple: usize) {
		while self.0.len() % multiple != 0 {
			self.0.push(false);
		}
	}

	/// Packs the buffer into bech32 symbols, failing if its length is not a multiple of 5.
	pub fn to_fe32s(&self) -> Result<Vec<Fe32>, BitsError> {
		bits_to_groups(&self.0)
	}

	/// Packs the buffer into bytes, zero-padding a trailing partial byte.
	pub fn to_bytes_padded(&self) -> Vec<u8> {
		self.0.chunks(8).map(|chunk| {
			chunk.iter().enumerate().fold(0u8, |acc, (i, bit)| acc | ((*bit as u8) << (7 - i)))
		}).collect()
	}

	/// Packs the buffer into bytes, dropping a trailing partial byte.
	pub fn to_bytes_trimmed(&self) -> Vec<u8> {
		bits_to_bytes_trimmed(&self.0)
	}

	/// Returns a cursor reading the buffer from its first bit.
	pub fn reader(&self) -> BitReader<'_> {
		BitReader::new(&self.0)
	}
}

impl fmt::Debug for BitBuf {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "BitBuf({} bits: ", self.0.len())?;
		for bit in self.0.iter() {
			f.write_str(if *bit { "1" } else { "0" })?;
		}
		f.write_str(")")
	}
}

/// Concatenates the five bits of every symbol, most significant bit first.
pub fn groups_to_bits(groups: &[Fe32]) -> BitBuf {
	BitBuf::from_fe32s(groups)
}

/// Splits a bit string into 5-bit symbols. The length must be a multiple of 5.
pub fn bits_to_groups(bits: &[bool]) -> Result<Vec<Fe32>, BitsError> {
	if bits.len() % 5 != 0 {
		return Err(BitsError::UnalignedLength(bits.len()));
	}
	Ok(bits.chunks(5).map(|chunk| {
		let value = chunk.iter().fold(0u8, |acc, bit| (acc << 1) | *bit as u8);
		Fe32::try_from(value).expect("five bits always fit in a field element")
	}).collect())
}

pub(crate) fn bits_to_bytes_trimmed(bits: &[bool]) -> Vec<u8> {
	bits.chunks_exact(8).map(|chunk| {
		chunk.iter().fold(0u8, |acc, bit| (acc << 1) | *bit as u8)
	}).collect()
}

/// A cursor over a borrowed bit string. Every read is bounds-checked and advances the cursor only
/// when it succeeds.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
	bits: &'a [bool],
	position: usize,
}

impl<'a> BitReader<'a> {
	/// Creates a reader positioned at the first bit of `bits`.
	pub fn new(bits: &'a [bool]) -> Self {
		BitReader { bits, position: 0 }
	}

	/// Number of bits consumed so far.
	pub fn position(&self) -> usize {
		self.position
	}

	/// Number of bits left to read.
	pub fn remaining(&self) -> usize {
		self.bits.len() - self.position
	}

	/// Whether every bit has been consumed.
	pub fn is_exhausted(&self) -> bool {
		self.remaining() == 0
	}

	/// Reads the next `count` bits as a slice.
	pub fn read_bits(&mut self, count: usize) -> Result<&'a [bool], BitsError> {
		if count > self.remaining() {
			return Err(BitsError::UnexpectedEnd { requested: count, remaining: self.remaining() });
		}
		let bits = &self.bits[self.position..self.position + count];
		self.position += count;
		Ok(bits)
	}

	/// Reads a big-endian unsigned integer `width` bits wide.
	pub fn read_uint(&mut self, width: usize) -> Result<u64, BitsError> {
		if width > 64 {
			return Err(BitsError::WidthTooLarge(width));
		}
		let bits = self.read_bits(width)?;
		Ok(bits.iter().fold(0u64, |acc, bit| (acc << 1) | *bit as u64))
	}

	/// Reads a big-endian two's complement integer `width` bits wide.
	pub fn read_int(&mut self, width: usize) -> Result<i64, BitsError> {
		let value = self.read_uint(width)?;
		if width == 0 {
			return Ok(0);
		}
		let shift = 64 - width as u32;
		Ok(((value << shift) as i64) >> shift)
	}

	/// Reads the next five bits as a bech32 symbol.
	pub fn read_fe32(&mut self) -> Result<Fe32, BitsError> {
		let value = self.read_uint(5)? as u8;
		Ok(Fe32::try_from(value).expect("five bits always fit in a field element"))
	}

	/// Reads `count` whole bytes.
	pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, BitsError> {
		let bits = self.read_bits(count * 8)?;
		Ok(bits_to_bytes_trimmed(bits))
	}

	/// Reads exactly `N` bytes into an array.
	pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BitsError> {
		let mut res = [0u8; N];
		res.copy_from_slice(&self.read_bytes(N)?);
		Ok(res)
	}
}
