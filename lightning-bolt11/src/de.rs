use core::fmt;
use core::fmt::{Display, Formatter};
use core::ops::Deref;
use core::str::FromStr;

use bech32::primitives::decode::{CheckedHrpstring, CheckedHrpstringError};
use bech32::Fe32;

use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::Secp256k1;

use crate::amount::unshorten_amount;
use crate::bits::{bits_to_bytes_trimmed, BitBuf, BitReader, BitsError};
use crate::sign::{self, Bolt11InvoiceSignature, SignatureBackend, SIGNATURE_BITS};
use crate::util::config::DecodeConfig;
use crate::util::logger::{Logger, NullLogger};

use super::{Bolt11Bech32, Bolt11Invoice, Bolt11InvoiceFeatures, Bolt11ParseError, Bolt11SemanticError,
	constants, Currency, Description, ExpiryTime, Fallback, InvoiceFields, MinFinalCltvExpiryDelta,
	ParseOrSemanticError, PayeePubKey, PaymentSecret, PositiveTimestamp, PrivateRoute, RawTaggedField,
	Sha256, TaggedField};

use self::hrp_sm::parse_hrp;

/// State machine to parse the hrp
mod hrp_sm {
	use core::ops::Range;

	#[derive(PartialEq, Eq, Debug)]
	enum States {
		Start,
		ParseL,
		ParseN,
		ParseCurrencyPrefix,
		ParseAmountNumber,
		ParseAmountSiPrefix,
	}

	impl States {
		fn next_state(&self, read_symbol: char) -> Result<States, super::Bolt11ParseError> {
			match *self {
				States::Start => {
					if read_symbol == 'l' {
						Ok(States::ParseL)
					} else {
						Err(super::Bolt11ParseError::NotALightningInvoice)
					}
				}
				States::ParseL => {
					if read_symbol == 'n' {
						Ok(States::ParseN)
					} else {
						Err(super::Bolt11ParseError::NotALightningInvoice)
					}
				},
				States::ParseN | States::ParseCurrencyPrefix => {
					if !read_symbol.is_ascii_digit() {
						Ok(States::ParseCurrencyPrefix)
					} else {
						Ok(States::ParseAmountNumber)
					}
				},
				States::ParseAmountNumber => {
					if read_symbol.is_ascii_digit() {
						Ok(States::ParseAmountNumber)
					} else if ['m', 'u', 'n', 'p'].contains(&read_symbol) {
						Ok(States::ParseAmountSiPrefix)
					} else {
						Err(super::Bolt11ParseError::InvalidAmount)
					}
				},
				States::ParseAmountSiPrefix => Err(super::Bolt11ParseError::InvalidAmount),
			}
		}

		fn is_final(&self) -> bool {
			!(*self == States::Start || *self == States::ParseL)
		}
	}

	struct StateMachine {
		state: States,
		position: usize,
		currency_prefix: Option<Range<usize>>,
		amount: Option<Range<usize>>,
	}

	impl StateMachine {
		fn new() -> StateMachine {
			StateMachine {
				state: States::Start,
				position: 0,
				currency_prefix: None,
				amount: None,
			}
		}

		fn update_range(range: &mut Option<Range<usize>>, position: usize) {
			let new_range = match *range {
				None => Range {start: position, end: position + 1},
				Some(ref r) => Range {start: r.start, end: r.end + 1},
			};
			*range = Some(new_range);
		}

		fn step(&mut self, c: char) -> Result<(), super::Bolt11ParseError> {
			let next_state = self.state.next_state(c)?;
			match next_state {
				States::ParseCurrencyPrefix => {
					StateMachine::update_range(&mut self.currency_prefix, self.position)
				},
				States::ParseAmountNumber | States::ParseAmountSiPrefix => {
					StateMachine::update_range(&mut self.amount, self.position)
				},
				_ => {}
			}

			self.position += 1;
			self.state = next_state;
			Ok(())
		}
	}

	/// Splits a lowercase hrp into its currency prefix and its amount (digits plus an optional SI
	/// prefix). Both may be empty.
	pub fn parse_hrp(input: &str) -> Result<(&str, &str), super::Bolt11ParseError> {
		let mut sm = StateMachine::new();
		for c in input.chars() {
			sm.step(c)?;
		}

		if !sm.state.is_final() {
			return Err(super::Bolt11ParseError::NotALightningInvoice);
		}

		let currency = sm.currency_prefix.clone()
			.map(|r| &input[r]).unwrap_or("");
		let amount = sm.amount.clone()
			.map(|r| &input[r]).unwrap_or("");

		Ok((currency, amount))
	}
}

/// Decodes the payload of a known tagged field. Payloads of an unexpected shape yield
/// [`Bolt11ParseError::Skip`], turning the field into an unknown one.
trait FromPayload: Sized {
	fn from_payload(bits: &[bool]) -> Result<Self, Bolt11ParseError>;
}

fn fixed_bytes<const N: usize>(bits: &[bool], symbols: usize) -> Result<[u8; N], Bolt11ParseError> {
	if bits.len() != symbols * 5 {
		return Err(Bolt11ParseError::Skip);
	}
	Ok(BitReader::new(bits).read_array::<N>()?)
}

/// Reads a big-endian integer written with as few 5-bit groups as possible. Leading zeros are
/// tolerated, more than 64 significant bits are not.
fn minimal_uint(bits: &[bool]) -> Result<u64, Bolt11ParseError> {
	let significant = match bits.iter().position(|bit| *bit) {
		Some(first_set) => &bits[first_set..],
		None => return Ok(0),
	};
	if significant.len() > 64 {
		return Err(Bolt11ParseError::Skip);
	}
	Ok(BitReader::new(significant).read_uint(significant.len())?)
}

impl FromPayload for Sha256 {
	fn from_payload(bits: &[bool]) -> Result<Sha256, Bolt11ParseError> {
		// Other lengths are handled by `misshapen_hash_field`.
		let bytes = fixed_bytes::<32>(bits, 52)?;
		Ok(Sha256(sha256::Hash::from_byte_array(bytes)))
	}
}

impl FromPayload for PaymentSecret {
	fn from_payload(bits: &[bool]) -> Result<PaymentSecret, Bolt11ParseError> {
		Ok(PaymentSecret(fixed_bytes::<32>(bits, 52)?))
	}
}

impl FromPayload for PayeePubKey {
	fn from_payload(bits: &[bool]) -> Result<PayeePubKey, Bolt11ParseError> {
		// "A reader MUST skip over […] a n […] field that does not have data_length 53 […]."
		Ok(PayeePubKey(fixed_bytes::<33>(bits, 53)?))
	}
}

impl FromPayload for Description {
	fn from_payload(bits: &[bool]) -> Result<Description, Bolt11ParseError> {
		let bytes = bits_to_bytes_trimmed(bits);
		let description = String::from_utf8(bytes).map_err(|_| Bolt11ParseError::Skip)?;
		Ok(Description::new(description))
	}
}

impl FromPayload for ExpiryTime {
	fn from_payload(bits: &[bool]) -> Result<ExpiryTime, Bolt11ParseError> {
		minimal_uint(bits).map(ExpiryTime::from_seconds)
	}
}

impl FromPayload for MinFinalCltvExpiryDelta {
	fn from_payload(bits: &[bool]) -> Result<MinFinalCltvExpiryDelta, Bolt11ParseError> {
		minimal_uint(bits).map(MinFinalCltvExpiryDelta)
	}
}

impl FromPayload for Bolt11InvoiceFeatures {
	fn from_payload(bits: &[bool]) -> Result<Bolt11InvoiceFeatures, Bolt11ParseError> {
		Ok(Bolt11InvoiceFeatures::from_bits(BitBuf::from_bits(bits)))
	}
}

impl TaggedField {
	fn from_payload<L: Deref>(tag: Fe32, bits: &[bool], logger: &L) -> Result<TaggedField, Bolt11ParseError>
	where L::Target: Logger {
		match tag.to_u8() {
			constants::TAG_PAYMENT_HASH =>
				Ok(TaggedField::PaymentHash(Sha256::from_payload(bits)?)),
			constants::TAG_DESCRIPTION =>
				Ok(TaggedField::Description(Description::from_payload(bits)?)),
			constants::TAG_PAYEE_PUB_KEY =>
				Ok(TaggedField::PayeePubKey(PayeePubKey::from_payload(bits)?)),
			constants::TAG_DESCRIPTION_HASH =>
				Ok(TaggedField::DescriptionHash(Sha256::from_payload(bits)?)),
			constants::TAG_EXPIRY_TIME =>
				Ok(TaggedField::ExpiryTime(ExpiryTime::from_payload(bits)?)),
			constants::TAG_MIN_FINAL_CLTV_EXPIRY_DELTA =>
				Ok(TaggedField::MinFinalCltvExpiryDelta(MinFinalCltvExpiryDelta::from_payload(bits)?)),
			constants::TAG_FALLBACK =>
				Ok(TaggedField::Fallback(Fallback::from_bits(bits))),
			constants::TAG_PRIVATE_ROUTE => {
				let (route, discarded) = PrivateRoute::from_bits(bits);
				if discarded != 0 {
					log_debug!(logger, "Dropped {} trailing bits after {} route hint hops", discarded, route.hops().len());
				}
				Ok(TaggedField::PrivateRoute(route))
			},
			constants::TAG_PAYMENT_SECRET =>
				Ok(TaggedField::PaymentSecret(PaymentSecret::from_payload(bits)?)),
			constants::TAG_FEATURES =>
				Ok(TaggedField::Features(Bolt11InvoiceFeatures::from_payload(bits)?)),
			_ => {
				// "A reader MUST skip over unknown fields"
				log_trace!(logger, "Keeping field with unknown tag '{}' ({} bits)", tag.to_char(), bits.len());
				Err(Bolt11ParseError::Skip)
			}
		}
	}
}

fn parse_tagged_fields<L: Deref>(reader: &mut BitReader, logger: &L) -> Result<Vec<TaggedField>, Bolt11ParseError>
where L::Target: Logger {
	let mut fields = Vec::new();
	while !reader.is_exhausted() {
		let tag = reader.read_fe32()?;
		let len = reader.read_uint(10)? as usize;
		let bits = reader.read_bits(len * 5)?;

		match TaggedField::from_payload(tag, bits, logger) {
			Ok(field) => fields.push(field),
			Err(Bolt11ParseError::Skip) => {
				if let Some(field) = misshapen_hash_field(tag, bits) {
					log_debug!(logger, "Keeping '{}' field of {} bits as a hash, flagged as unknown", tag.to_char(), bits.len());
					fields.push(field);
				} else if is_known_tag(tag) {
					log_debug!(logger, "Keeping malformed '{}' field of {} bits as unknown", tag.to_char(), bits.len());
				}
				fields.push(TaggedField::Unknown(RawTaggedField { tag, data: BitBuf::from_bits(bits) }));
			},
			Err(e) => return Err(e),
		}
	}
	Ok(fields)
}

/// A `p` or `h` field of the wrong length still names the invoice's hash: its whole bytes are kept,
/// cut or zero-padded to 32.
fn misshapen_hash_field(tag: Fe32, bits: &[bool]) -> Option<TaggedField> {
	let mut bytes = [0u8; 32];
	let trimmed = bits_to_bytes_trimmed(bits);
	let len = trimmed.len().min(32);
	bytes[..len].copy_from_slice(&trimmed[..len]);
	let hash = Sha256(sha256::Hash::from_byte_array(bytes));
	match tag.to_u8() {
		constants::TAG_PAYMENT_HASH => Some(TaggedField::PaymentHash(hash)),
		constants::TAG_DESCRIPTION_HASH => Some(TaggedField::DescriptionHash(hash)),
		_ => None,
	}
}

fn is_known_tag(tag: Fe32) -> bool {
	matches!(tag.to_u8(),
		constants::TAG_PAYMENT_HASH | constants::TAG_DESCRIPTION | constants::TAG_PAYEE_PUB_KEY |
		constants::TAG_DESCRIPTION_HASH | constants::TAG_EXPIRY_TIME |
		constants::TAG_MIN_FINAL_CLTV_EXPIRY_DELTA | constants::TAG_FALLBACK |
		constants::TAG_PRIVATE_ROUTE | constants::TAG_PAYMENT_SECRET | constants::TAG_FEATURES)
}

/// Decodes and validates a BOLT11 invoice string, checking its signature against the payee.
///
/// Mixed-case strings are rejected, all-uppercase ones are accepted and normalized to lowercase.
/// Anomalies inside known fields are logged and the field is kept as an unknown one, structural
/// and signature problems are errors.
///
/// ```
/// use lightning_bolt11::{decode, DecodeConfig};
/// use lightning_bolt11::util::logger::NullLogger;
///
/// let invoice = "lnbc2500u1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyq\
/// cyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpu9qrsgquk0rl77nj30yxdy8j\
/// 9vdx85fkpmdla2087ne0xh8nhedh8w27kyke0lp53ut353s06fv3qfegext0eh0ymjpf39tuven09sam30g4vgpfna3rh";
///
/// let decoded = decode(invoice, &DecodeConfig::default(), &NullLogger).unwrap();
/// assert_eq!(decoded.amount_milli_satoshis(), Some(250_000_000));
/// ```
pub fn decode<L: Deref>(s: &str, config: &DecodeConfig, logger: L) -> Result<Bolt11Invoice, ParseOrSemanticError>
where L::Target: Logger {
	let parsed = CheckedHrpstring::new::<Bolt11Bech32>(s)
		.map_err(Bolt11ParseError::BadBech32String)?;
	let hrp = parsed.hrp().to_lowercase();
	if !hrp.starts_with("ln") {
		return Err(Bolt11ParseError::NotALightningInvoice.into());
	}

	let symbols: Vec<Fe32> = parsed.fe32_iter::<&mut dyn Iterator<Item = u8>>().collect();
	let bits = BitBuf::from_fe32s(&symbols);
	if bits.len() < SIGNATURE_BITS {
		return Err(Bolt11ParseError::MissingSignature.into());
	}
	let (data, signature_bits) = bits.as_bits().split_at(bits.len() - SIGNATURE_BITS);

	let (currency_prefix, amount) = parse_hrp(&hrp)?;
	let currency = Currency::from_prefix(currency_prefix);
	if !currency.is_known() && !config.accept_unknown_currency {
		return Err(Bolt11SemanticError::UnknownCurrency.into());
	}
	let amount_milli_satoshis = if amount.is_empty() {
		None
	} else {
		Some(unshorten_amount(amount)?)
	};

	let mut reader = BitReader::new(data);
	let timestamp = reader.read_uint(35).map_err(Bolt11ParseError::MalformedData)?;
	let timestamp = PositiveTimestamp::from_unix_timestamp(timestamp)
		.expect("35 bits can't exceed MAX_TIMESTAMP");
	let tagged_fields = parse_tagged_fields(&mut reader, &logger)?;
	let fields = InvoiceFields::from_tagged_fields(tagged_fields, false)?;
	if fields.payment_secret.is_none() && config.require_payment_secret {
		return Err(Bolt11SemanticError::MissingPaymentSecret.into());
	}

	let signature = Bolt11InvoiceSignature::read_from(&mut BitReader::new(signature_bits))
		.map_err(Bolt11ParseError::MalformedData)?;
	let signable_hash = sign::signable_hash(&hrp, data);
	let payee_pub_key = resolve_payee(&Secp256k1::new(), &signable_hash, &signature, fields.payee_pub_key, &logger)?;

	log_debug!(logger, "Decoded invoice for {} with hash {} paying {}",
		currency_prefix, fields.payment_hash.0, payee_pub_key);

	Ok(Bolt11Invoice {
		currency,
		amount_milli_satoshis,
		timestamp,
		fields,
		payee_pub_key,
		signature,
		signable_hash,
		encoded: s.to_lowercase(),
	})
}

/// Checks the signature against the payee the invoice names or, without an `n` field, recovers the
/// payee from it.
fn resolve_payee<B: SignatureBackend + ?Sized, L: Deref>(
	backend: &B, signable_hash: &[u8; 32], signature: &Bolt11InvoiceSignature,
	included: Option<PayeePubKey>, logger: &L,
) -> Result<PayeePubKey, Bolt11SemanticError> where L::Target: Logger {
	match included {
		Some(pub_key) => {
			log_trace!(logger, "Verifying signature against included payee {}", pub_key);
			if backend.verify(signable_hash, signature, &pub_key) {
				Ok(pub_key)
			} else {
				Err(Bolt11SemanticError::InvalidSignature)
			}
		},
		None => {
			log_trace!(logger, "Recovering payee from signature {} with recovery id {}",
				log_bytes!(*signature.compact()), signature.recovery_id());
			backend.recover_pub_key(signable_hash, signature)
				.ok_or(Bolt11SemanticError::InvalidSignature)
		},
	}
}

/// Parses an invoice with the default [`DecodeConfig`] and without logging.
///
/// ```
/// use lightning_bolt11::Bolt11Invoice;
///
/// let invoice = "lnbc2500u1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyq\
/// cyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpu9qrsgquk0rl77nj30yxdy8j\
/// 9vdx85fkpmdla2087ne0xh8nhedh8w27kyke0lp53ut353s06fv3qfegext0eh0ymjpf39tuven09sam30g4vgpfna3rh";
///
/// assert!(invoice.parse::<Bolt11Invoice>().is_ok());
/// ```
impl FromStr for Bolt11Invoice {
	type Err = ParseOrSemanticError;

	fn from_str(s: &str) -> Result<Self, <Self as FromStr>::Err> {
		decode(s, &DecodeConfig::default(), &NullLogger)
	}
}

impl Display for Bolt11ParseError {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		match *self {
			Bolt11ParseError::BadBech32String(ref e) => {
				write!(f, "Invalid bech32: {}", e)
			},
			Bolt11ParseError::NotALightningInvoice => f.write_str("did not begin with 'ln'"),
			Bolt11ParseError::InvalidAmount => f.write_str("invalid amount in hrp"),
			Bolt11ParseError::MissingSignature => {
				f.write_str("data part too short to hold a signature (should be at least 104 bech32 chars long)")
			},
			Bolt11ParseError::MalformedData(ref e) => {
				write!(f, "malformed data part: {}", e)
			},
			Bolt11ParseError::Skip => {
				f.write_str("the tagged field has to be skipped because of an unexpected, but allowed property")
			},
		}
	}
}

impl Display for ParseOrSemanticError {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ParseOrSemanticError::ParseError(err) => err.fmt(f),
			ParseOrSemanticError::SemanticError(err) => err.fmt(f),
		}
	}
}

impl std::error::Error for Bolt11ParseError {}

impl std::error::Error for ParseOrSemanticError {}

macro_rules! from_error {
	($my_error:expr, $extern_error:ty) => {
		impl From<$extern_error> for Bolt11ParseError {
			fn from(e: $extern_error) -> Self {
				$my_error(e)
			}
		}
	}
}

from_error!(Bolt11ParseError::BadBech32String, CheckedHrpstringError);
from_error!(Bolt11ParseError::MalformedData, BitsError);

impl From<Bolt11ParseError> for ParseOrSemanticError {
	fn from(e: Bolt11ParseError) -> Self {
		ParseOrSemanticError::ParseError(e)
	}
}

impl From<Bolt11SemanticError> for ParseOrSemanticError {
	fn from(e: Bolt11SemanticError) -> Self {
		ParseOrSemanticError::SemanticError(e)
	}
}
