// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Packing and unpacking of the `short_channel_id` carried by route hints.

use core::fmt;

/// Maximum block height that can be used in a `short_channel_id`. This
/// value is based on the 3-bytes available for block height.
pub const MAX_SCID_BLOCK: u64 = 0x00ffffff;

/// Maximum transaction index that can be used in a `short_channel_id`.
/// This value is based on the 3-bytes available for tx index.
pub const MAX_SCID_TX_INDEX: u64 = 0x00ffffff;

/// Maximum vout index that can be used in a `short_channel_id`. This
/// value is based on the 2-bytes available for the vout index.
pub const MAX_SCID_VOUT_INDEX: u64 = 0xffff;

/// A `short_channel_id` construction error
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ShortChannelIdError {
	/// The block height doesn't fit in 3 bytes.
	BlockOverflow,
	/// The transaction index doesn't fit in 3 bytes.
	TxIndexOverflow,
	/// The output index doesn't fit in 2 bytes.
	VoutIndexOverflow,
	/// The string isn't of the form `BLOCKxTXxVOUT`.
	InvalidFormat,
}

impl fmt::Display for ShortChannelIdError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ShortChannelIdError::BlockOverflow => f.write_str("block height exceeds 24 bits"),
			ShortChannelIdError::TxIndexOverflow => f.write_str("transaction index exceeds 24 bits"),
			ShortChannelIdError::VoutIndexOverflow => f.write_str("output index exceeds 16 bits"),
			ShortChannelIdError::InvalidFormat => f.write_str("expected BLOCKxTXxVOUT"),
		}
	}
}

impl std::error::Error for ShortChannelIdError {}

/// Extracts the block height (most significant 3-bytes) from the `short_channel_id`
pub fn block_from_scid(short_channel_id: u64) -> u32 {
	(short_channel_id >> 40) as u32
}

/// Extracts the tx index (bytes [2..4]) from the `short_channel_id`
pub fn tx_index_from_scid(short_channel_id: u64) -> u32 {
	((short_channel_id >> 16) & MAX_SCID_TX_INDEX) as u32
}

/// Extracts the vout (bytes [0..2]) from the `short_channel_id`
pub fn vout_from_scid(short_channel_id: u64) -> u16 {
	(short_channel_id & MAX_SCID_VOUT_INDEX) as u16
}

/// Constructs a `short_channel_id` using the components pieces. Results in an error
/// if the block height, tx index, or vout index overflow the maximum sizes.
pub fn scid_from_parts(block: u64, tx_index: u64, vout_index: u64) -> Result<u64, ShortChannelIdError> {
	if block > MAX_SCID_BLOCK {
		return Err(ShortChannelIdError::BlockOverflow);
	}

	if tx_index > MAX_SCID_TX_INDEX {
		return Err(ShortChannelIdError::TxIndexOverflow);
	}

	if vout_index > MAX_SCID_VOUT_INDEX {
		return Err(ShortChannelIdError::VoutIndexOverflow);
	}

	Ok((block << 40) | (tx_index << 16) | vout_index)
}

/// Parses the `BLOCKxTXxVOUT` form written by [`ReadableScid`].
pub fn scid_from_readable(s: &str) -> Result<u64, ShortChannelIdError> {
	let mut parts = s.split('x').map(|part| part.parse::<u64>());
	match (parts.next(), parts.next(), parts.next(), parts.next()) {
		(Some(Ok(block)), Some(Ok(tx_index)), Some(Ok(vout_index)), None) =>
			scid_from_parts(block, tx_index, vout_index),
		_ => Err(ShortChannelIdError::InvalidFormat),
	}
}

/// Displays a `short_channel_id` as `BLOCKxTXxVOUT`.
pub struct ReadableScid(pub u64);

impl fmt::Display for ReadableScid {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}x{}x{}", block_from_scid(self.0), tx_index_from_scid(self.0), vout_from_scid(self.0))
	}
}
