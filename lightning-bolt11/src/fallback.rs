//! On-chain fallback addresses, carried in `f` tagged fields.
//!
//! The payload of an `f` field starts with a 5-bit version. Versions 0 to 16 are segwit witness
//! versions followed by the witness program, 17 and 18 stand for legacy pay-to-pubkey-hash and
//! pay-to-script-hash followed by the 20-byte hash.

use bech32::{segwit, Fe32, Hrp};
use bitcoin::base58;
use bitcoin::hex::DisplayHex;

use crate::bits::{bits_to_bytes_trimmed, BitBuf};
use crate::{CreationError, Currency};

/// Fallback version marking a pay-to-pubkey-hash address.
pub const FALLBACK_VERSION_P2PKH: u8 = 17;

/// Fallback version marking a pay-to-script-hash address.
pub const FALLBACK_VERSION_P2SH: u8 = 18;

/// Fallback address in case no LN payment is possible
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Fallback {
	/// A segwit output, witness version 0 to 16.
	SegWitProgram {
		/// The witness version.
		version: Fe32,
		/// The witness program.
		program: Vec<u8>,
	},
	/// A legacy pay-to-pubkey-hash output.
	PubKeyHash([u8; 20]),
	/// A legacy pay-to-script-hash output.
	ScriptHash([u8; 20]),
	/// A payload with a version this crate doesn't know or a program of the wrong size, kept
	/// verbatim (version bits included).
	Unknown(BitBuf),
}

/// The address encodings a currency uses for its on-chain outputs.
struct AddressParams {
	pub_key_hash: u8,
	script_hash: u8,
	segwit_hrp: &'static str,
}

fn address_params(currency: &Currency) -> Option<AddressParams> {
	match currency {
		Currency::Bitcoin => Some(AddressParams { pub_key_hash: 0, script_hash: 5, segwit_hrp: "bc" }),
		Currency::BitcoinTestnet => Some(AddressParams { pub_key_hash: 111, script_hash: 196, segwit_hrp: "tb" }),
		Currency::Signet => Some(AddressParams { pub_key_hash: 111, script_hash: 196, segwit_hrp: "tb" }),
		Currency::Regtest => Some(AddressParams { pub_key_hash: 111, script_hash: 196, segwit_hrp: "bcrt" }),
		Currency::Simnet => Some(AddressParams { pub_key_hash: 63, script_hash: 123, segwit_hrp: "sb" }),
		Currency::Other(_) => None,
	}
}

impl Fallback {
	/// Parses an on-chain address of the given currency, either a segwit address or a base58check
	/// legacy one.
	pub fn from_address(address: &str, currency: &Currency) -> Result<Fallback, CreationError> {
		let params = address_params(currency).ok_or(CreationError::UnsupportedCurrency)?;

		if let Ok((hrp, version, program)) = segwit::decode(address) {
			if hrp.to_lowercase() != params.segwit_hrp {
				return Err(CreationError::InvalidAddress);
			}
			return Ok(Fallback::SegWitProgram { version, program });
		}

		let payload = base58::decode_check(address).map_err(|_| CreationError::InvalidAddress)?;
		if payload.len() != 21 {
			return Err(CreationError::InvalidAddress);
		}
		let mut hash = [0u8; 20];
		hash.copy_from_slice(&payload[1..]);
		match payload[0] {
			version if version == params.pub_key_hash => Ok(Fallback::PubKeyHash(hash)),
			version if version == params.script_hash => Ok(Fallback::ScriptHash(hash)),
			_ => Err(CreationError::UnsupportedAddressType),
		}
	}

	/// Renders the fallback as an address of the given currency. Payloads that can't be rendered
	/// (unknown versions or currencies) are returned as the hex of their raw bits.
	pub fn to_address(&self, currency: &Currency) -> String {
		let params = match address_params(currency) {
			Some(params) => params,
			None => return self.payload_hex(),
		};
		match self {
			Fallback::PubKeyHash(hash) => base58_address(params.pub_key_hash, hash),
			Fallback::ScriptHash(hash) => base58_address(params.script_hash, hash),
			Fallback::SegWitProgram { version, program } => {
				Hrp::parse(params.segwit_hrp).ok()
					.and_then(|hrp| segwit::encode(hrp, *version, program).ok())
					.unwrap_or_else(|| self.payload_hex())
			},
			Fallback::Unknown(_) => self.payload_hex(),
		}
	}

	/// The version symbol leading the payload.
	pub fn version(&self) -> Option<u8> {
		match self {
			Fallback::SegWitProgram { version, .. } => Some(version.to_u8()),
			Fallback::PubKeyHash(_) => Some(FALLBACK_VERSION_P2PKH),
			Fallback::ScriptHash(_) => Some(FALLBACK_VERSION_P2SH),
			Fallback::Unknown(bits) => bits.reader().read_uint(5).ok().map(|v| v as u8),
		}
	}

	fn payload_hex(&self) -> String {
		let mut bits = BitBuf::new();
		self.write_bits(&mut bits);
		bits.to_bytes_padded().to_lower_hex_string()
	}

	/// Interprets the payload of an `f` field. Never fails, anything unexpected is kept as
	/// [`Fallback::Unknown`].
	pub(crate) fn from_bits(bits: &[bool]) -> Fallback {
		let unknown = || Fallback::Unknown(BitBuf::from_bits(bits));
		let version = match bits.get(..5) {
			Some(version_bits) => version_bits.iter().fold(0u8, |acc, bit| (acc << 1) | *bit as u8),
			None => return unknown(),
		};
		let program = bits_to_bytes_trimmed(&bits[5..]);

		match version {
			0..=16 if (2..=40).contains(&program.len()) => match Fe32::try_from(version) {
				Ok(version) => Fallback::SegWitProgram { version, program },
				Err(_) => unknown(),
			},
			FALLBACK_VERSION_P2PKH | FALLBACK_VERSION_P2SH if program.len() == 20 => {
				let mut hash = [0u8; 20];
				hash.copy_from_slice(&program);
				if version == FALLBACK_VERSION_P2PKH {
					Fallback::PubKeyHash(hash)
				} else {
					Fallback::ScriptHash(hash)
				}
			},
			_ => unknown(),
		}
	}

	pub(crate) fn write_bits(&self, out: &mut BitBuf) {
		match self {
			Fallback::SegWitProgram { version, program } => {
				out.push_fe32(*version);
				out.push_bytes(program);
			},
			Fallback::PubKeyHash(hash) => {
				out.push_uint(FALLBACK_VERSION_P2PKH as u64, 5);
				out.push_bytes(hash);
			},
			Fallback::ScriptHash(hash) => {
				out.push_uint(FALLBACK_VERSION_P2SH as u64, 5);
				out.push_bytes(hash);
			},
			Fallback::Unknown(bits) => out.extend_from_bits(bits.as_bits()),
		}
	}
}

fn base58_address(version: u8, hash: &[u8; 20]) -> String {
	let mut payload = Vec::with_capacity(21);
	payload.push(version);
	payload.extend_from_slice(hash);
	base58::encode_check(&payload)
}
