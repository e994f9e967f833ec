//! Amounts in the human readable part of an invoice.
//!
//! The human readable part carries a BTC amount as a decimal mantissa followed by an optional SI
//! multiplier (`m`, `u`, `n` or `p`). Internally amounts are either pico-BTC (the finest unit the
//! multipliers can express) or millisatoshis (the finest unit lightning can pay).

use crate::{Bolt11ParseError, Bolt11SemanticError, CreationError, ParseOrSemanticError};

/// Millisatoshis in one bitcoin.
pub const MSAT_PER_BTC: u64 = 100_000_000_000;

/// Pico-BTC in one bitcoin.
pub const PICO_BTC_PER_BTC: u128 = 1_000_000_000_000;

/// Pico-BTC in one millisatoshi.
pub const PICO_BTC_PER_MSAT: u128 = 10;

/// The largest amount an invoice may request: the total bitcoin supply, in millisatoshis.
pub const MAX_AMOUNT_MSAT: u64 = 21_000_000 * MSAT_PER_BTC;

/// SI prefixes for the human readable part
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum SiPrefix {
	/// 10^-3
	Milli,
	/// 10^-6
	Micro,
	/// 10^-9
	Nano,
	/// 10^-12
	Pico,
}

impl SiPrefix {
	/// Returns the multiplier to go from a BTC value to picoBTC implied by this SiPrefix.
	/// This is effectively 10^12 * the prefix multiplier
	pub fn multiplier(&self) -> u64 {
		match *self {
			SiPrefix::Milli => 1_000_000_000,
			SiPrefix::Micro => 1_000_000,
			SiPrefix::Nano => 1_000,
			SiPrefix::Pico => 1,
		}
	}

	/// Returns all enum variants of `SiPrefix` sorted in descending order of their associated
	/// multiplier.
	pub fn values_desc() -> &'static [SiPrefix] {
		use crate::SiPrefix::*;
		static VALUES: [SiPrefix; 4] = [Milli, Micro, Nano, Pico];
		&VALUES
	}

	/// The character used for the prefix in the human readable part.
	pub fn to_char(&self) -> char {
		match *self {
			SiPrefix::Milli => 'm',
			SiPrefix::Micro => 'u',
			SiPrefix::Nano => 'n',
			SiPrefix::Pico => 'p',
		}
	}

	/// Parses a multiplier character, `None` if it isn't one.
	pub fn from_char(c: char) -> Option<SiPrefix> {
		match c {
			'm' => Some(SiPrefix::Milli),
			'u' => Some(SiPrefix::Micro),
			'n' => Some(SiPrefix::Nano),
			'p' => Some(SiPrefix::Pico),
			_ => None,
		}
	}
}

/// Writes a pico-BTC amount the way it appears in the human readable part: the smallest mantissa
/// reachable by stepping through `p`, `n`, `u`, `m` and no multiplier, moving on only while the
/// amount divides evenly by 1000.
pub fn shorten_amount(amount_pico_btc: u128) -> String {
	let mut mantissa = amount_pico_btc;
	// Walk from the finest multiplier to the coarsest.
	let mut suffix = Some(SiPrefix::Pico);
	for next in [Some(SiPrefix::Nano), Some(SiPrefix::Micro), Some(SiPrefix::Milli), None] {
		if mantissa == 0 || mantissa % 1000 != 0 {
			break;
		}
		mantissa /= 1000;
		suffix = next;
	}
	match suffix {
		Some(si) => format!("{}{}", mantissa, si.to_char()),
		None => format!("{}", mantissa),
	}
}

/// Parses the amount section of a human readable part (`^\d+[munp]?$`) into millisatoshis.
///
/// Fails with [`Bolt11ParseError::InvalidAmount`] on malformed input or overflow and with
/// [`Bolt11SemanticError::ImpreciseAmount`] if the amount is not a whole number of millisatoshis.
pub fn unshorten_amount(amount: &str) -> Result<u64, ParseOrSemanticError> {
	let (digits, si) = match amount.chars().last().and_then(SiPrefix::from_char) {
		Some(si) => (&amount[..amount.len() - 1], Some(si)),
		None => (amount, None),
	};
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return Err(Bolt11ParseError::InvalidAmount.into());
	}
	let mantissa: u128 = digits.parse().map_err(|_| Bolt11ParseError::InvalidAmount)?;
	let multiplier = si.map(|si| si.multiplier() as u128).unwrap_or(PICO_BTC_PER_BTC);
	let amount_pico_btc = mantissa.checked_mul(multiplier).ok_or(Bolt11ParseError::InvalidAmount)?;
	if amount_pico_btc % PICO_BTC_PER_MSAT != 0 {
		return Err(Bolt11SemanticError::ImpreciseAmount.into());
	}
	u64::try_from(amount_pico_btc / PICO_BTC_PER_MSAT)
		.map_err(|_| Bolt11ParseError::InvalidAmount.into())
}

/// Parses a decimal BTC amount such as `0.0025` or `20` into pico-BTC.
pub fn btc_to_pico_btc(amount_btc: &str) -> Result<u128, CreationError> {
	let (whole, fraction) = match amount_btc.split_once('.') {
		Some((whole, fraction)) => (whole, fraction),
		None => (amount_btc, ""),
	};
	let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
	if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
		return Err(CreationError::InvalidAmount);
	}

	// Digits past the twelfth decimal are below a pico-BTC.
	let (fraction, sub_pico) = fraction.split_at(fraction.len().min(12));
	if sub_pico.bytes().any(|b| b != b'0') {
		return Err(CreationError::Semantic(Bolt11SemanticError::ImpreciseAmount));
	}

	let whole: u128 = if whole.is_empty() { 0 } else {
		whole.parse().map_err(|_| CreationError::InvalidAmount)?
	};
	let fraction_pico: u128 = if fraction.is_empty() { 0 } else {
		let scale = 10u128.pow(12 - fraction.len() as u32);
		fraction.parse::<u128>().map_err(|_| CreationError::InvalidAmount)? * scale
	};
	whole.checked_mul(PICO_BTC_PER_BTC)
		.and_then(|pico| pico.checked_add(fraction_pico))
		.ok_or(CreationError::InvalidAmount)
}
