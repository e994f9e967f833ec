#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

#![deny(missing_docs)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! This crate provides data structures to represent
//! [lightning BOLT11](https://github.com/lightning/bolts/blob/master/11-payment-encoding.md)
//! invoices and functions to create, encode and decode these. If you just want to use the standard
//! en-/decoding functionality this should get you started:
//!
//!   * For parsing use `str::parse::<Bolt11Invoice>(&self)` (see the docs of `impl FromStr for Bolt11Invoice`),
//!     or [`decode`] to pick a [`DecodeConfig`] and a [`Logger`]
//!   * For constructing invoices use the [`InvoiceBuilder`]
//!   * For serializing invoices use the [`Display`]/[`ToString`] traits
//!
//! [`Logger`]: crate::util::logger::Logger

#[macro_use]
pub mod util;

pub mod amount;
pub mod bits;
pub mod fallback;
pub mod route;
pub mod scid;
pub mod sign;

mod de;
mod ser;

pub use crate::amount::SiPrefix;
pub use crate::bits::{BitBuf, BitReader, BitsError};
pub use crate::de::decode;
pub use crate::fallback::Fallback;
pub use crate::route::{PrivateRoute, RouteHintHop, RoutingFees};
pub use crate::sign::{Bolt11InvoiceSignature, SignatureBackend};
pub use crate::util::config::DecodeConfig;

use bech32::primitives::decode::CheckedHrpstringError;
use bech32::{Checksum, Fe32};
use bitcoin::hashes::sha256;
use bitcoin::hex::DisplayHex;

use core::fmt::{self, Display, Formatter};
use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

use crate::amount::{MAX_AMOUNT_MSAT, PICO_BTC_PER_MSAT};

/// Bech32 with the string length limit lifted from 90 characters, as invoices routinely exceed
/// it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Bolt11Bech32 {}

impl Checksum for Bolt11Bech32 {
	const CODE_LENGTH: usize = 7089;
	type MidstateRepr = <bech32::Bech32 as Checksum>::MidstateRepr;
	const CHECKSUM_LENGTH: usize = bech32::Bech32::CHECKSUM_LENGTH;
	const GENERATOR_SH: [Self::MidstateRepr; 5] = bech32::Bech32::GENERATOR_SH;
	const TARGET_RESIDUE: Self::MidstateRepr = bech32::Bech32::TARGET_RESIDUE;
}

/// The maximum timestamp as seconds since the Unix epoch allowed by [BOLT 11].
///
/// [BOLT 11]: https://github.com/lightning/bolts/blob/master/11-payment-encoding.md
pub const MAX_TIMESTAMP: u64 = (1 << 35) - 1;

/// Default expiry time as defined by [BOLT 11].
///
/// [BOLT 11]: https://github.com/lightning/bolts/blob/master/11-payment-encoding.md
pub const DEFAULT_EXPIRY_TIME: u64 = 3600;

/// Default minimum final CLTV expiry as defined by [BOLT 11].
///
/// Note that this is *not* the same value as rust-lightning's minimum CLTV expiry.
///
/// [BOLT 11]: https://github.com/lightning/bolts/blob/master/11-payment-encoding.md
pub const DEFAULT_MIN_FINAL_CLTV_EXPIRY_DELTA: u64 = 18;

/// Errors that indicate what is wrong with the invoice. They have some granularity for debug
/// reasons, but should generally result in an "invalid BOLT11 invoice" message for the user.
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Bolt11ParseError {
	BadBech32String(CheckedHrpstringError),
	NotALightningInvoice,
	InvalidAmount,
	MissingSignature,
	MalformedData(BitsError),
	/// Not an error, but used internally to signal that a part of the invoice should be ignored
	/// according to BOLT11
	Skip,
}

/// Indicates that something went wrong while parsing or validating the invoice. Parsing errors
/// should be mostly seen as opaque and are only there for debugging reasons. Semantic errors
/// like wrong signatures, missing fields etc. could mean that someone tampered with the invoice.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ParseOrSemanticError {
	/// The invoice couldn't be decoded
	ParseError(Bolt11ParseError),

	/// The invoice could be decoded but violates the BOLT11 standard
	SemanticError(Bolt11SemanticError),
}

/// Errors that may occur when converting tagged fields into a [`Bolt11Invoice`], on either the
/// decoding or the building side. They relate to the requirements sections in BOLT #11
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Bolt11SemanticError {
	/// The invoice is missing the mandatory payment hash
	MissingPaymentHash,

	/// A field which may appear at most once appears several times
	DuplicateTag(char),

	/// No description or description hash are part of the invoice
	MissingDescription,

	/// The invoice contains both a description and a description hash
	ConflictingDescription,

	/// The invoice is missing the payment secret and the [`DecodeConfig`] requires one
	MissingPaymentSecret,

	/// The invoice is for a currency this crate doesn't know and the [`DecodeConfig`] rejects
	/// those
	UnknownCurrency,

	/// The invoice's amount was not a whole number of millisatoshis
	ImpreciseAmount,

	/// The invoice's signature is invalid
	InvalidSignature,
}

impl Display for Bolt11SemanticError {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Bolt11SemanticError::MissingPaymentHash => f.write_str("The invoice is missing the mandatory payment hash"),
			Bolt11SemanticError::DuplicateTag(tag) => write!(f, "The invoice contains more than one '{}' field", tag),
			Bolt11SemanticError::MissingDescription => f.write_str("No description or description hash are part of the invoice"),
			Bolt11SemanticError::ConflictingDescription => f.write_str("The invoice contains both a description and a description hash"),
			Bolt11SemanticError::MissingPaymentSecret => f.write_str("The invoice is missing the mandatory payment secret"),
			Bolt11SemanticError::UnknownCurrency => f.write_str("The invoice's currency is unknown"),
			Bolt11SemanticError::ImpreciseAmount => f.write_str("The invoice's amount was not a whole number of millisatoshis"),
			Bolt11SemanticError::InvalidSignature => f.write_str("The invoice's signature is invalid"),
		}
	}
}

impl std::error::Error for Bolt11SemanticError { }

/// Errors that may occur when building a new [`Bolt11Invoice`] with the [`InvoiceBuilder`]
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CreationError {
	/// No payment hash was set
	MissingPaymentHash,

	/// No timestamp was set
	MissingTimestamp,

	/// The Unix timestamp of the supplied date is greater than 35-bits
	TimestampOutOfBounds,

	/// The supplied amount is malformed, zero or greater than the total bitcoin supply
	InvalidAmount,

	/// The supplied secret key is not a valid secp256k1 secret key
	InvalidSecretKey,

	/// The supplied payee public key doesn't belong to the secret key the invoice was signed with
	InvalidSignature,

	/// Fallback addresses can't be expressed for the invoice's currency
	UnsupportedCurrency,

	/// The fallback address is neither a pay-to-pubkey-hash nor a pay-to-script-hash address of
	/// the invoice's currency
	UnsupportedAddressType,

	/// The fallback address couldn't be parsed or belongs to another currency
	InvalidAddress,

	/// An unknown tagged field was supplied, only fields with known semantics can be written
	UnknownTagOnEncode(char),

	/// A tagged field doesn't fit into the 1023 characters a field may span
	FieldTooLong(char),

	/// The fields violate an invoice-level rule
	Semantic(Bolt11SemanticError),
}

impl Display for CreationError {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			CreationError::MissingPaymentHash => f.write_str("No payment hash was supplied"),
			CreationError::MissingTimestamp => f.write_str("No timestamp was supplied"),
			CreationError::TimestampOutOfBounds => f.write_str("The Unix timestamp of the supplied date is greater than 35-bits"),
			CreationError::InvalidAmount => f.write_str("The supplied amount is malformed, zero or greater than the total bitcoin supply"),
			CreationError::InvalidSecretKey => f.write_str("The supplied secret key is invalid"),
			CreationError::InvalidSignature => f.write_str("The supplied payee public key doesn't match the signing key"),
			CreationError::UnsupportedCurrency => f.write_str("Fallback addresses are not supported for this currency"),
			CreationError::UnsupportedAddressType => f.write_str("The fallback address type is not supported for this currency"),
			CreationError::InvalidAddress => f.write_str("The fallback address is invalid"),
			CreationError::UnknownTagOnEncode(tag) => write!(f, "Can't encode a field with unknown tag '{}'", tag),
			CreationError::FieldTooLong(tag) => write!(f, "The '{}' field is too long to be encoded", tag),
			CreationError::Semantic(err) => err.fmt(f),
		}
	}
}

impl std::error::Error for CreationError { }

impl From<Bolt11SemanticError> for CreationError {
	fn from(e: Bolt11SemanticError) -> Self {
		CreationError::Semantic(e)
	}
}

/// Enum representing the crypto currencies (or networks) supported by this library
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Currency {
	/// Bitcoin mainnet
	Bitcoin,

	/// Bitcoin testnet
	BitcoinTestnet,

	/// Bitcoin regtest
	Regtest,

	/// Bitcoin simnet
	Simnet,

	/// Bitcoin signet
	Signet,

	/// Any other prefix, kept as found in the human readable part
	Other(String),
}

impl Currency {
	/// Maps the currency prefix of a human readable part to a currency.
	pub fn from_prefix(prefix: &str) -> Currency {
		match prefix {
			"bc" => Currency::Bitcoin,
			"tb" => Currency::BitcoinTestnet,
			"bcrt" => Currency::Regtest,
			"sb" => Currency::Simnet,
			"tbs" => Currency::Signet,
			other => Currency::Other(other.to_owned()),
		}
	}

	/// The prefix identifying the currency in the human readable part.
	pub fn prefix(&self) -> &str {
		match self {
			Currency::Bitcoin => "bc",
			Currency::BitcoinTestnet => "tb",
			Currency::Regtest => "bcrt",
			Currency::Simnet => "sb",
			Currency::Signet => "tbs",
			Currency::Other(prefix) => prefix,
		}
	}

	/// Whether this is one of the currencies BOLT11 defines.
	pub fn is_known(&self) -> bool {
		!matches!(self, Currency::Other(_))
	}
}

/// A timestamp that refers to a date after 1 January 1970.
///
/// # Invariants
///
/// The Unix timestamp representing the stored time has to be positive and no greater than
/// [`MAX_TIMESTAMP`].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct PositiveTimestamp(Duration);

impl PositiveTimestamp {
	/// Creates a `PositiveTimestamp` from a Unix timestamp in the range `0..=MAX_TIMESTAMP`.
	///
	/// Otherwise, returns a [`CreationError::TimestampOutOfBounds`].
	pub fn from_unix_timestamp(unix_seconds: u64) -> Result<Self, CreationError> {
		if unix_seconds <= MAX_TIMESTAMP {
			Ok(Self(Duration::from_secs(unix_seconds)))
		} else {
			Err(CreationError::TimestampOutOfBounds)
		}
	}

	/// Creates a `PositiveTimestamp` from a [`Duration`] since the Unix epoch in the range
	/// `0..=MAX_TIMESTAMP`. Sub-second precision is dropped.
	///
	/// Otherwise, returns a [`CreationError::TimestampOutOfBounds`].
	pub fn from_duration_since_epoch(duration: Duration) -> Result<Self, CreationError> {
		Self::from_unix_timestamp(duration.as_secs())
	}

	/// Returns the Unix timestamp representing the stored time
	pub fn as_unix_timestamp(&self) -> u64 {
		self.0.as_secs()
	}

	/// Returns the duration of the stored time since the Unix epoch
	pub fn as_duration_since_epoch(&self) -> Duration {
		self.0
	}
}

/// SHA-256 hash
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Sha256(pub sha256::Hash);

/// Description string
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Description(String);

impl Description {
	/// Wraps a description string.
	pub fn new(description: String) -> Description {
		Description(description)
	}

	/// Returns the underlying description string
	pub fn into_inner(self) -> String {
		self.0
	}

	/// The description as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for Description {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Payee public key, a compressed secp256k1 point
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PayeePubKey(pub [u8; 33]);

impl Display for PayeePubKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.as_hex())
	}
}

/// 32-byte payment secret, proving to the payee that the payer saw the invoice
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PaymentSecret(pub [u8; 32]);

/// Positive duration that defines when (relatively to the timestamp) in the future the invoice
/// expires
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ExpiryTime(Duration);

impl ExpiryTime {
	/// Construct an `ExpiryTime` from seconds.
	pub fn from_seconds(seconds: u64) -> ExpiryTime {
		ExpiryTime(Duration::from_secs(seconds))
	}

	/// Construct an `ExpiryTime` from a [`Duration`], dropping the sub-second part.
	pub fn from_duration(duration: Duration) -> ExpiryTime {
		Self::from_seconds(duration.as_secs())
	}

	/// Returns the expiry time in seconds
	pub fn as_seconds(&self) -> u64 {
		self.0.as_secs()
	}

	/// Returns a reference to the underlying [`Duration`] (=expiry time)
	pub fn as_duration(&self) -> &Duration {
		&self.0
	}
}

/// `min_final_cltv_expiry_delta` to use for the last HTLC in the route
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct MinFinalCltvExpiryDelta(pub u64);

/// The feature bits of an invoice, as found in its `9` field.
///
/// Bit 0 is the last bit of the field. No check is made that required features are understood.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Bolt11InvoiceFeatures(BitBuf);

impl Bolt11InvoiceFeatures {
	/// Wraps the raw payload of a `9` field.
	pub fn from_bits(bits: BitBuf) -> Self {
		Bolt11InvoiceFeatures(bits)
	}

	/// Creates a feature vector with the given bits set, in as few 5-bit characters as possible.
	pub fn from_set_bits(set_bits: &[usize]) -> Self {
		let len = set_bits.iter().max().map(|max| (max / 5 + 1) * 5).unwrap_or(0);
		let mut bits = vec![false; len];
		for bit in set_bits {
			bits[len - 1 - bit] = true;
		}
		Bolt11InvoiceFeatures(BitBuf::from_bits(&bits))
	}

	/// Whether feature bit `bit` is set.
	pub fn supports(&self, bit: usize) -> bool {
		let bits = self.0.as_bits();
		bit < bits.len() && bits[bits.len() - 1 - bit]
	}

	/// The raw bits of the field.
	pub fn as_bits(&self) -> &BitBuf {
		&self.0
	}

	/// The field packed into bytes from its first bit, with a trailing partial byte dropped.
	pub fn to_trimmed_bytes(&self) -> Vec<u8> {
		self.0.to_bytes_trimmed()
	}
}

/// A tagged field whose tag this crate doesn't interpret, or a known tag whose payload had an
/// unexpected shape. Kept verbatim so the invoice's content isn't silently lost.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct RawTaggedField {
	/// The 5-bit tag.
	pub tag: Fe32,
	/// The payload, a multiple of 5 bits long.
	pub data: BitBuf,
}

impl RawTaggedField {
	/// The bech32 character of the tag.
	pub fn tag_char(&self) -> char {
		self.tag.to_char()
	}
}

/// Tagged field with known tag
///
/// For descriptions of the enum values please refer to the enclosed type's docs.
#[allow(missing_docs)]
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum TaggedField {
	PaymentHash(Sha256),
	Description(Description),
	PayeePubKey(PayeePubKey),
	DescriptionHash(Sha256),
	ExpiryTime(ExpiryTime),
	MinFinalCltvExpiryDelta(MinFinalCltvExpiryDelta),
	Fallback(Fallback),
	PrivateRoute(PrivateRoute),
	PaymentSecret(PaymentSecret),
	Features(Bolt11InvoiceFeatures),
	Unknown(RawTaggedField),
}

/// Tagged field tags, as the values of their bech32 characters.
#[allow(missing_docs)]
pub mod constants {
	pub const TAG_PAYMENT_HASH: u8 = 1;
	pub const TAG_DESCRIPTION: u8 = 13;
	pub const TAG_PAYEE_PUB_KEY: u8 = 19;
	pub const TAG_DESCRIPTION_HASH: u8 = 23;
	pub const TAG_EXPIRY_TIME: u8 = 6;
	pub const TAG_MIN_FINAL_CLTV_EXPIRY_DELTA: u8 = 24;
	pub const TAG_FALLBACK: u8 = 9;
	pub const TAG_PRIVATE_ROUTE: u8 = 3;
	pub const TAG_PAYMENT_SECRET: u8 = 16;
	pub const TAG_FEATURES: u8 = 5;

	/// Maximum length of a tagged field's payload, in 5-bit characters.
	pub const MAX_FIELD_LENGTH: usize = 1023;
}

pub(crate) fn tag_char(tag: u8) -> char {
	Fe32::try_from(tag).map(|fe| fe.to_char()).unwrap_or('?')
}

impl TaggedField {
	/// The tag of the field.
	pub fn tag(&self) -> Fe32 {
		let tag = match *self {
			TaggedField::PaymentHash(_) => constants::TAG_PAYMENT_HASH,
			TaggedField::Description(_) => constants::TAG_DESCRIPTION,
			TaggedField::PayeePubKey(_) => constants::TAG_PAYEE_PUB_KEY,
			TaggedField::DescriptionHash(_) => constants::TAG_DESCRIPTION_HASH,
			TaggedField::ExpiryTime(_) => constants::TAG_EXPIRY_TIME,
			TaggedField::MinFinalCltvExpiryDelta(_) => constants::TAG_MIN_FINAL_CLTV_EXPIRY_DELTA,
			TaggedField::Fallback(_) => constants::TAG_FALLBACK,
			TaggedField::PrivateRoute(_) => constants::TAG_PRIVATE_ROUTE,
			TaggedField::PaymentSecret(_) => constants::TAG_PAYMENT_SECRET,
			TaggedField::Features(_) => constants::TAG_FEATURES,
			TaggedField::Unknown(ref raw) => return raw.tag,
		};
		Fe32::try_from(tag).expect("all tags are valid u5s")
	}
}

/// Description of the invoice: either the text itself or the hash of a longer one
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Bolt11InvoiceDescription {
	/// Description of what the invoice is for
	Direct(Description),

	/// Hash of the description of what the invoice is for
	Hash(Sha256),
}

impl Display for Bolt11InvoiceDescription {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		match self {
			Bolt11InvoiceDescription::Direct(desc) => write!(f, "{}", desc.0),
			Bolt11InvoiceDescription::Hash(hash) => write!(f, "{}", hash.0),
		}
	}
}

/// The tagged fields of an invoice, sorted by meaning, once the invoice-level rules were checked.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
struct InvoiceFields {
	payment_hash: Sha256,
	description: Bolt11InvoiceDescription,
	payee_pub_key: Option<PayeePubKey>,
	payment_secret: Option<PaymentSecret>,
	expiry_time: Option<ExpiryTime>,
	min_final_cltv_expiry_delta: Option<MinFinalCltvExpiryDelta>,
	features: Option<Bolt11InvoiceFeatures>,
	private_routes: Vec<PrivateRoute>,
	fallbacks: Vec<Fallback>,
	unknown_fields: Vec<RawTaggedField>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, tag: u8, reject_repeats: bool) -> Result<(), Bolt11SemanticError> {
	if slot.is_some() && reject_repeats {
		return Err(Bolt11SemanticError::DuplicateTag(tag_char(tag)));
	}
	*slot = Some(value);
	Ok(())
}

impl InvoiceFields {
	/// Sorts fields by meaning, failing if the payment hash or the description are missing.
	///
	/// A repeated `d`, `h`, `n` or `x` field is always an error. A repeated `p`, `s`, `c` or `9`
	/// field is one only with `strict_repeats`, otherwise the last one wins.
	fn from_tagged_fields<I: IntoIterator<Item = TaggedField>>(fields: I, strict_repeats: bool) -> Result<Self, Bolt11SemanticError> {
		let mut payment_hash = None;
		let mut description = None;
		let mut description_hash = None;
		let mut payee_pub_key = None;
		let mut payment_secret = None;
		let mut expiry_time = None;
		let mut min_final_cltv_expiry_delta = None;
		let mut features = None;
		let mut private_routes = Vec::new();
		let mut fallbacks = Vec::new();
		let mut unknown_fields = Vec::new();

		for field in fields {
			match field {
				TaggedField::PaymentHash(hash) =>
					set_once(&mut payment_hash, hash, constants::TAG_PAYMENT_HASH, strict_repeats)?,
				TaggedField::Description(desc) =>
					set_once(&mut description, desc, constants::TAG_DESCRIPTION, true)?,
				TaggedField::DescriptionHash(hash) =>
					set_once(&mut description_hash, hash, constants::TAG_DESCRIPTION_HASH, true)?,
				TaggedField::PayeePubKey(pub_key) =>
					set_once(&mut payee_pub_key, pub_key, constants::TAG_PAYEE_PUB_KEY, true)?,
				TaggedField::PaymentSecret(secret) =>
					set_once(&mut payment_secret, secret, constants::TAG_PAYMENT_SECRET, strict_repeats)?,
				TaggedField::ExpiryTime(expiry) =>
					set_once(&mut expiry_time, expiry, constants::TAG_EXPIRY_TIME, true)?,
				TaggedField::MinFinalCltvExpiryDelta(delta) =>
					set_once(&mut min_final_cltv_expiry_delta, delta, constants::TAG_MIN_FINAL_CLTV_EXPIRY_DELTA, strict_repeats)?,
				TaggedField::Features(f) =>
					set_once(&mut features, f, constants::TAG_FEATURES, strict_repeats)?,
				TaggedField::PrivateRoute(route) => private_routes.push(route),
				TaggedField::Fallback(fallback) => fallbacks.push(fallback),
				TaggedField::Unknown(raw) => unknown_fields.push(raw),
			}
		}

		let description = match (description, description_hash) {
			(Some(desc), None) => Bolt11InvoiceDescription::Direct(desc),
			(None, Some(hash)) => Bolt11InvoiceDescription::Hash(hash),
			(None, None) => return Err(Bolt11SemanticError::MissingDescription),
			(Some(_), Some(_)) => return Err(Bolt11SemanticError::ConflictingDescription),
		};

		Ok(InvoiceFields {
			payment_hash: payment_hash.ok_or(Bolt11SemanticError::MissingPaymentHash)?,
			description,
			payee_pub_key,
			payment_secret,
			expiry_time,
			min_final_cltv_expiry_delta,
			features,
			private_routes,
			fallbacks,
			unknown_fields,
		})
	}
}

/// Represents a syntactically and semantically correct lightning BOLT11 invoice, whose signature
/// was checked against its payee.
///
/// Instances are obtained by decoding a string (see [`decode`] and the `FromStr` impl) or from
/// an [`InvoiceBuilder`], and are immutable.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Bolt11Invoice {
	currency: Currency,
	amount_milli_satoshis: Option<u64>,
	timestamp: PositiveTimestamp,
	fields: InvoiceFields,
	payee_pub_key: PayeePubKey,
	signature: Bolt11InvoiceSignature,
	signable_hash: [u8; 32],
	encoded: String,
}

impl Bolt11Invoice {
	/// Returns the currency for which the invoice was issued
	pub fn currency(&self) -> Currency {
		self.currency.clone()
	}

	/// Returns the amount if specified in the invoice as millisatoshis.
	pub fn amount_milli_satoshis(&self) -> Option<u64> {
		self.amount_milli_satoshis
	}

	/// Returns the amount if specified in the invoice as pico BTC.
	pub fn amount_pico_btc(&self) -> Option<u128> {
		self.amount_milli_satoshis.map(|msat| msat as u128 * PICO_BTC_PER_MSAT)
	}

	/// Returns the invoice's creation time
	pub fn timestamp(&self) -> PositiveTimestamp {
		self.timestamp
	}

	/// Returns the `Bolt11Invoice`'s timestamp as a duration since the Unix epoch
	pub fn duration_since_epoch(&self) -> Duration {
		self.timestamp.as_duration_since_epoch()
	}

	/// Returns the hash to which we will receive the preimage on completion of the payment
	pub fn payment_hash(&self) -> &sha256::Hash {
		&self.fields.payment_hash.0
	}

	/// Return the description or a hash of it for longer ones
	pub fn description(&self) -> &Bolt11InvoiceDescription {
		&self.fields.description
	}

	/// Returns the payee's public key, either the one included in the invoice or the one
	/// recovered from its signature.
	pub fn payee_pub_key(&self) -> &PayeePubKey {
		&self.payee_pub_key
	}

	/// Whether the invoice spelled out its payee's key in an `n` field.
	pub fn payee_pub_key_included(&self) -> bool {
		self.fields.payee_pub_key.is_some()
	}

	/// Get the payment secret if one was included in the invoice
	pub fn payment_secret(&self) -> Option<&PaymentSecret> {
		self.fields.payment_secret.as_ref()
	}

	/// Get the invoice features if they were included in the invoice
	pub fn features(&self) -> Option<&Bolt11InvoiceFeatures> {
		self.fields.features.as_ref()
	}

	/// Returns the invoice's expiry time, if present, otherwise [`DEFAULT_EXPIRY_TIME`].
	pub fn expiry_time(&self) -> Duration {
		self.fields.expiry_time.map(|x| x.0)
			.unwrap_or(Duration::from_secs(DEFAULT_EXPIRY_TIME))
	}

	/// Returns the Duration since the Unix epoch at which the invoice expires, `None` if the
	/// addition overflows.
	pub fn expires_at(&self) -> Option<Duration> {
		self.duration_since_epoch().checked_add(self.expiry_time())
	}

	/// Returns whether the expiry time would pass at the given point in time.
	/// `at_time` is the timestamp as a duration since the Unix epoch.
	pub fn would_expire(&self, at_time: Duration) -> bool {
		self.expires_at().map_or(true, |expires_at| at_time > expires_at)
	}

	/// Returns the invoice's `min_final_cltv_expiry_delta` time, if present, otherwise
	/// [`DEFAULT_MIN_FINAL_CLTV_EXPIRY_DELTA`].
	pub fn min_final_cltv_expiry_delta(&self) -> u64 {
		self.fields.min_final_cltv_expiry_delta.map(|x| x.0)
			.unwrap_or(DEFAULT_MIN_FINAL_CLTV_EXPIRY_DELTA)
	}

	/// Returns the private routes, one per `r` field
	pub fn private_routes(&self) -> &[PrivateRoute] {
		&self.fields.private_routes
	}

	/// Returns the hops of all private routes, in order
	pub fn route_hints(&self) -> Vec<&RouteHintHop> {
		self.fields.private_routes.iter().flat_map(|route| route.hops().iter()).collect()
	}

	/// Returns the fallback addresses
	pub fn fallbacks(&self) -> &[Fallback] {
		&self.fields.fallbacks
	}

	/// Returns the fallback addresses rendered for the invoice's currency
	pub fn fallback_addresses(&self) -> Vec<String> {
		self.fields.fallbacks.iter().map(|fallback| fallback.to_address(&self.currency)).collect()
	}

	/// Returns the tagged fields which were kept without interpretation
	pub fn unknown_fields(&self) -> &[RawTaggedField] {
		&self.fields.unknown_fields
	}

	/// Returns the invoice's signature
	pub fn signature(&self) -> &Bolt11InvoiceSignature {
		&self.signature
	}

	/// Returns the hash the signature commits to
	pub fn signable_hash(&self) -> [u8; 32] {
		self.signable_hash
	}
}

impl Display for Bolt11Invoice {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		f.write_str(&self.encoded)
	}
}

/// Builder for [`Bolt11Invoice`]s. Mistakes made in a setter are remembered and reported by
/// [`InvoiceBuilder::build_signed`].
///
/// ```
/// use bitcoin::hashes::{sha256, Hash};
/// use bitcoin::secp256k1::Secp256k1;
/// use lightning_bolt11::{Currency, InvoiceBuilder};
///
/// let invoice = InvoiceBuilder::new(Currency::Bitcoin)
/// 	.description("Coins pls!".into())
/// 	.payment_hash(sha256::Hash::from_slice(&[0; 32][..]).unwrap())
/// 	.amount_btc("0.0025")
/// 	.timestamp_secs(1496314658)
/// 	.build_signed(&Secp256k1::new(), &[0x42; 32])
/// 	.unwrap();
///
/// assert!(invoice.to_string().starts_with("lnbc2500u1"));
/// ```
#[derive(Clone, Debug)]
pub struct InvoiceBuilder {
	currency: Currency,
	amount_pico_btc: Option<u128>,
	timestamp: Option<PositiveTimestamp>,
	payment_hash: Option<Sha256>,
	tagged_fields: Vec<TaggedField>,
	error: Option<CreationError>,
}

impl InvoiceBuilder {
	/// Construct new, empty `InvoiceBuilder`. The payment hash, a description (or its hash) and
	/// the timestamp have to be set before the invoice can be built.
	pub fn new(currency: Currency) -> Self {
		InvoiceBuilder {
			currency,
			amount_pico_btc: None,
			timestamp: None,
			payment_hash: None,
			tagged_fields: Vec::with_capacity(8),
			error: None,
		}
	}

	fn set_error(&mut self, error: CreationError) {
		if self.error.is_none() {
			self.error = Some(error);
		}
	}

	/// Sets the amount in millisatoshis.
	pub fn amount_milli_satoshis(mut self, amount_msat: u64) -> Self {
		self.amount_pico_btc = Some(amount_msat as u128 * PICO_BTC_PER_MSAT);
		self
	}

	/// Sets the amount from a decimal BTC string such as `"0.0025"`.
	pub fn amount_btc(mut self, amount_btc: &str) -> Self {
		match amount::btc_to_pico_btc(amount_btc) {
			Ok(amount) => self.amount_pico_btc = Some(amount),
			Err(e) => self.set_error(e),
		}
		self
	}

	/// Sets the timestamp.
	pub fn timestamp(mut self, timestamp: PositiveTimestamp) -> Self {
		self.timestamp = Some(timestamp);
		self
	}

	/// Sets the timestamp from seconds since the Unix epoch.
	pub fn timestamp_secs(mut self, unix_seconds: u64) -> Self {
		match PositiveTimestamp::from_unix_timestamp(unix_seconds) {
			Ok(t) => self.timestamp = Some(t),
			Err(e) => self.set_error(e),
		}
		self
	}

	/// Sets the timestamp to a duration since the Unix epoch.
	pub fn duration_since_epoch(self, time: Duration) -> Self {
		self.timestamp_secs(time.as_secs())
	}

	/// Set the payment hash.
	pub fn payment_hash(mut self, hash: sha256::Hash) -> Self {
		self.payment_hash = Some(Sha256(hash));
		self
	}

	/// Set the description.
	pub fn description(mut self, description: String) -> Self {
		self.tagged_fields.push(TaggedField::Description(Description::new(description)));
		self
	}

	/// Set the description hash.
	pub fn description_hash(mut self, description_hash: sha256::Hash) -> Self {
		self.tagged_fields.push(TaggedField::DescriptionHash(Sha256(description_hash)));
		self
	}

	/// Sets the payee's public key, which is then written into the invoice instead of being left
	/// to recovery from the signature.
	pub fn payee_pub_key(mut self, pub_key: PayeePubKey) -> Self {
		self.tagged_fields.push(TaggedField::PayeePubKey(pub_key));
		self
	}

	/// Sets the payment secret.
	pub fn payment_secret(mut self, payment_secret: PaymentSecret) -> Self {
		self.tagged_fields.push(TaggedField::PaymentSecret(payment_secret));
		self
	}

	/// Sets the expiry time, dropping the subsecond part (which is not representable in BOLT 11
	/// invoices).
	pub fn expiry_time(mut self, expiry_time: Duration) -> Self {
		self.tagged_fields.push(TaggedField::ExpiryTime(ExpiryTime::from_duration(expiry_time)));
		self
	}

	/// Sets `min_final_cltv_expiry_delta`.
	pub fn min_final_cltv_expiry_delta(mut self, min_final_cltv_expiry_delta: u64) -> Self {
		self.tagged_fields.push(TaggedField::MinFinalCltvExpiryDelta(MinFinalCltvExpiryDelta(min_final_cltv_expiry_delta)));
		self
	}

	/// Sets the feature bits.
	pub fn features(mut self, features: Bolt11InvoiceFeatures) -> Self {
		self.tagged_fields.push(TaggedField::Features(features));
		self
	}

	/// Adds a fallback address.
	pub fn fallback(mut self, fallback: Fallback) -> Self {
		self.tagged_fields.push(TaggedField::Fallback(fallback));
		self
	}

	/// Adds a fallback address given as an address string of the builder's currency.
	pub fn fallback_address(mut self, address: &str) -> Self {
		match Fallback::from_address(address, &self.currency) {
			Ok(fallback) => self.tagged_fields.push(TaggedField::Fallback(fallback)),
			Err(e) => self.set_error(e),
		}
		self
	}

	/// Adds a private route, written as one `r` field.
	pub fn private_route(mut self, route: PrivateRoute) -> Self {
		self.tagged_fields.push(TaggedField::PrivateRoute(route));
		self
	}

	/// Adds an arbitrary tagged field. Fields are written in the order they were added, after the
	/// payment hash.
	pub fn tagged_field(mut self, field: TaggedField) -> Self {
		self.tagged_fields.push(field);
		self
	}

	/// Checks the fields, signs the invoice with `secret_key` using `backend` and encodes it.
	///
	/// If a payee public key was set, the signature is verified against it so an invoice signed
	/// by the wrong key is never produced.
	pub fn build_signed<B: SignatureBackend + ?Sized>(
		self, backend: &B, secret_key: &[u8; 32],
	) -> Result<Bolt11Invoice, CreationError> {
		if let Some(e) = self.error {
			return Err(e);
		}
		let payment_hash = self.payment_hash.ok_or(CreationError::MissingPaymentHash)?;
		let timestamp = self.timestamp.ok_or(CreationError::MissingTimestamp)?;

		let amount_milli_satoshis = match self.amount_pico_btc {
			Some(pico) => {
				if pico % PICO_BTC_PER_MSAT != 0 {
					return Err(Bolt11SemanticError::ImpreciseAmount.into());
				}
				let msat = pico / PICO_BTC_PER_MSAT;
				if msat == 0 || msat > MAX_AMOUNT_MSAT as u128 {
					return Err(CreationError::InvalidAmount);
				}
				Some(msat as u64)
			},
			None => None,
		};

		let mut tagged_fields = Vec::with_capacity(self.tagged_fields.len() + 1);
		tagged_fields.push(TaggedField::PaymentHash(payment_hash));
		tagged_fields.extend(self.tagged_fields);
		let fields = InvoiceFields::from_tagged_fields(tagged_fields.iter().cloned(), true)?;

		let hrp = ser::encode_hrp(&self.currency, self.amount_pico_btc);
		let mut data = ser::encode_data_part(timestamp, &tagged_fields)?;

		let signable_hash = sign::signable_hash(&hrp, data.as_bits());
		let signature = backend.sign_recoverable(&signable_hash, secret_key)?;
		let payee_pub_key = match fields.payee_pub_key {
			Some(pub_key) => {
				if !backend.verify(&signable_hash, &signature, &pub_key) {
					return Err(CreationError::InvalidSignature);
				}
				pub_key
			},
			None => backend.recover_pub_key(&signable_hash, &signature)
				.ok_or(CreationError::InvalidSignature)?,
		};

		signature.write_to(&mut data);
		let encoded = ser::to_bech32_string(&hrp, &data)?;

		Ok(Bolt11Invoice {
			currency: self.currency,
			amount_milli_satoshis,
			timestamp,
			fields,
			payee_pub_key,
			signature,
			signable_hash,
			encoded,
		})
	}
}

#[cfg(feature = "serde")]
impl Serialize for Bolt11Invoice {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
		serializer.serialize_str(self.to_string().as_str())
	}
}
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Bolt11Invoice {
	fn deserialize<D>(deserializer: D) -> Result<Bolt11Invoice, D::Error> where D: Deserializer<'de> {
		let bolt11 = String::deserialize(deserializer)?
			.parse::<Bolt11Invoice>()
			.map_err(|e| D::Error::custom(format_args!("{:?}", e)))?;

		Ok(bolt11)
	}
}
