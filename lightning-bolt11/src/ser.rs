use core::fmt;
use core::fmt::{Display, Formatter};

use bech32::primitives::iter::Fe32IterExt;
use bech32::Hrp;
use bitcoin::hashes::Hash;

use crate::amount::shorten_amount;
use crate::bits::BitBuf;

use super::{Bolt11Bech32, CreationError, Currency, PositiveTimestamp, SiPrefix, TaggedField, constants, tag_char};

impl Display for Currency {
	fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
		f.write_str(self.prefix())
	}
}

impl Display for SiPrefix {
	fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
		write!(f, "{}", self.to_char())
	}
}

/// Writes the human readable part: `ln`, the currency prefix and, if given, the shortened amount.
pub(crate) fn encode_hrp(currency: &Currency, amount_pico_btc: Option<u128>) -> String {
	match amount_pico_btc {
		Some(amount) => format!("ln{}{}", currency, shorten_amount(amount)),
		None => format!("ln{}", currency),
	}
}

/// Appends `int` big-endian in as few 5-bit groups as possible. Zero takes no groups at all.
fn push_minimal_uint(out: &mut BitBuf, int: u64) {
	let significant_bits = 64 - int.leading_zeros() as usize;
	let width = (significant_bits + 4) / 5 * 5;
	// 13 groups are one bit wider than a u64.
	for _ in 64..width {
		out.push_bit(false);
	}
	out.push_uint(int, width.min(64));
}

/// Writes a tagged field: tag, length and payload zero-padded to whole groups.
fn write_tagged_field(out: &mut BitBuf, tag: u8, mut payload: BitBuf) -> Result<(), CreationError> {
	payload.pad_to_multiple(5);
	let len = payload.len() / 5;
	if len > constants::MAX_FIELD_LENGTH {
		return Err(CreationError::FieldTooLong(tag_char(tag)));
	}

	out.push_uint(tag as u64, 5);
	out.push_uint(len as u64, 10);
	out.extend_from_bits(payload.as_bits());
	Ok(())
}

impl TaggedField {
	fn write_to(&self, out: &mut BitBuf) -> Result<(), CreationError> {
		let mut payload = BitBuf::new();
		match *self {
			TaggedField::PaymentHash(ref hash) | TaggedField::DescriptionHash(ref hash) => {
				payload.push_bytes(hash.0.as_byte_array());
			},
			TaggedField::Description(ref description) => {
				payload.push_bytes(description.as_str().as_bytes());
			},
			TaggedField::PayeePubKey(ref pub_key) => {
				payload.push_bytes(&pub_key.0);
			},
			TaggedField::ExpiryTime(ref expiry) => {
				push_minimal_uint(&mut payload, expiry.as_seconds());
			},
			TaggedField::MinFinalCltvExpiryDelta(ref delta) => {
				push_minimal_uint(&mut payload, delta.0);
			},
			TaggedField::Fallback(ref fallback) => {
				fallback.write_bits(&mut payload);
			},
			TaggedField::PrivateRoute(ref route) => {
				route.write_bits(&mut payload);
			},
			TaggedField::PaymentSecret(ref secret) => {
				payload.push_bytes(&secret.0);
			},
			TaggedField::Features(ref features) => {
				payload.extend_from_bits(features.as_bits().as_bits());
			},
			TaggedField::Unknown(ref raw) => {
				return Err(CreationError::UnknownTagOnEncode(raw.tag_char()));
			},
		}
		write_tagged_field(out, self.tag().to_u8(), payload)
	}
}

/// Writes the 35-bit timestamp followed by the tagged fields in the given order.
pub(crate) fn encode_data_part(timestamp: PositiveTimestamp, fields: &[TaggedField]) -> Result<BitBuf, CreationError> {
	for field in fields {
		if let TaggedField::Unknown(ref raw) = field {
			return Err(CreationError::UnknownTagOnEncode(raw.tag_char()));
		}
	}

	let mut data = BitBuf::new();
	data.push_uint(timestamp.as_unix_timestamp(), 35);
	for field in fields {
		field.write_to(&mut data)?;
	}
	Ok(data)
}

/// Appends the checksum to the signed data part and renders the invoice string.
pub(crate) fn to_bech32_string(hrp: &str, data: &BitBuf) -> Result<String, CreationError> {
	let hrp = Hrp::parse(hrp).map_err(|_| CreationError::UnsupportedCurrency)?;
	let symbols = data.to_fe32s().expect("the timestamp, every field and the signature are whole groups");
	Ok(symbols.into_iter().with_checksum::<Bolt11Bech32>(&hrp).chars().collect())
}
