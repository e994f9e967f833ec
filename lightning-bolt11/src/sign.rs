//! Signing of invoices and recovery of the payee's key from their signature.
//!
//! An invoice is signed over the SHA-256 of the human readable part's bytes followed by the data
//! part (timestamp and tagged fields) zero-padded to a whole number of bytes. The signature is a
//! 64-byte compact ECDSA signature plus a recovery id, which lets the reader reconstruct the
//! payee's public key when the invoice doesn't include it.
//!
//! The curve operations are reached through [`SignatureBackend`] so the codec doesn't depend on a
//! particular secp256k1 implementation.

use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature};
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, SecretKey, Signing, Verification};

use crate::bits::{BitBuf, BitReader, BitsError};
use crate::{CreationError, PayeePubKey};

/// Number of bits the signature takes up at the end of the data part.
pub const SIGNATURE_BITS: usize = 65 * 8;

/// Recoverable signature
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct Bolt11InvoiceSignature {
	signature: [u8; 64],
	recovery_id: u8,
}

impl Bolt11InvoiceSignature {
	/// Creates a signature from its compact form and recovery id.
	pub fn new(signature: [u8; 64], recovery_id: u8) -> Self {
		Bolt11InvoiceSignature { signature, recovery_id }
	}

	/// The compact (`r || s`) signature.
	pub fn compact(&self) -> &[u8; 64] {
		&self.signature
	}

	/// The recovery id. Only 0 to 3 are meaningful, other values fail key recovery.
	pub fn recovery_id(&self) -> u8 {
		self.recovery_id
	}

	pub(crate) fn read_from(reader: &mut BitReader) -> Result<Self, BitsError> {
		let signature = reader.read_array::<64>()?;
		let recovery_id = reader.read_uint(8)? as u8;
		Ok(Bolt11InvoiceSignature { signature, recovery_id })
	}

	pub(crate) fn write_to(&self, out: &mut BitBuf) {
		out.push_bytes(&self.signature);
		out.push_uint(self.recovery_id as u64, 8);
	}
}

/// The recoverable ECDSA operations invoices need.
pub trait SignatureBackend {
	/// Signs a 32-byte digest, producing a signature from which the public key can be recovered.
	fn sign_recoverable(&self, digest: &[u8; 32], secret_key: &[u8; 32]) -> Result<Bolt11InvoiceSignature, CreationError>;

	/// Checks `signature` over `digest` against `pub_key`.
	fn verify(&self, digest: &[u8; 32], signature: &Bolt11InvoiceSignature, pub_key: &PayeePubKey) -> bool;

	/// Reconstructs the public key which produced `signature` over `digest`.
	fn recover_pub_key(&self, digest: &[u8; 32], signature: &Bolt11InvoiceSignature) -> Option<PayeePubKey>;
}

impl<C: Signing + Verification> SignatureBackend for Secp256k1<C> {
	fn sign_recoverable(&self, digest: &[u8; 32], secret_key: &[u8; 32]) -> Result<Bolt11InvoiceSignature, CreationError> {
		let secret_key = SecretKey::from_slice(secret_key).map_err(|_| CreationError::InvalidSecretKey)?;
		let message = Message::from_digest(*digest);
		let (recovery_id, signature) = self.sign_ecdsa_recoverable(&message, &secret_key).serialize_compact();
		Ok(Bolt11InvoiceSignature::new(signature, recovery_id.to_i32() as u8))
	}

	fn verify(&self, digest: &[u8; 32], signature: &Bolt11InvoiceSignature, pub_key: &PayeePubKey) -> bool {
		let pub_key = match PublicKey::from_slice(&pub_key.0) {
			Ok(pub_key) => pub_key,
			Err(_) => return false,
		};
		let mut signature = match Signature::from_compact(signature.compact()) {
			Ok(signature) => signature,
			Err(_) => return false,
		};
		// Invoices signed with a high S value are still valid.
		signature.normalize_s();
		self.verify_ecdsa(&Message::from_digest(*digest), &signature, &pub_key).is_ok()
	}

	fn recover_pub_key(&self, digest: &[u8; 32], signature: &Bolt11InvoiceSignature) -> Option<PayeePubKey> {
		let recovery_id = RecoveryId::from_i32(signature.recovery_id() as i32).ok()?;
		let signature = RecoverableSignature::from_compact(signature.compact(), recovery_id).ok()?;
		let pub_key = self.recover_ecdsa(&Message::from_digest(*digest), &signature).ok()?;
		Some(PayeePubKey(pub_key.serialize()))
	}
}

/// Calculates the hash an invoice is signed over: SHA-256 of the human readable part followed by
/// the data part padded with zero bits to a byte boundary.
pub fn signable_hash(hrp: &str, data: &[bool]) -> [u8; 32] {
	let mut padded = BitBuf::from_bits(data);
	padded.pad_to_multiple(8);

	let mut preimage = Vec::with_capacity(hrp.len() + padded.len() / 8);
	preimage.extend_from_slice(hrp.as_bytes());
	preimage.extend_from_slice(&padded.to_bytes_padded());
	sha256::Hash::hash(&preimage).to_byte_array()
}
