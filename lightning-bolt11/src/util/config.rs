// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Various user-configurable knobs controlling how strictly invoices are decoded.

/// Options for decoding a BOLT11 invoice.
///
/// `Default::default()` provides sane defaults for most configurations, accepting every invoice
/// the BOLT11 reader requirements allow (plus invoices for currencies this crate doesn't know).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodeConfig {
	/// Whether an invoice whose human readable part names a currency other than `bc`, `tb`,
	/// `bcrt`, `sb` or `tbs` is accepted. Such invoices decode with [`Currency::Other`] and render
	/// their fallback addresses as raw hex.
	///
	/// Default value: `true`
	///
	/// [`Currency::Other`]: crate::Currency::Other
	pub accept_unknown_currency: bool,
	/// Whether an invoice without a payment secret (`s` field) is rejected. BOLT11 made the field
	/// mandatory, but older invoices in the wild omit it.
	///
	/// Default value: `false`
	pub require_payment_secret: bool,
}

impl Default for DecodeConfig {
	fn default() -> Self {
		DecodeConfig {
			accept_unknown_currency: true,
			require_payment_secret: false,
		}
	}
}

impl DecodeConfig {
	/// A configuration rejecting unknown currencies and invoices without a payment secret.
	pub fn strict() -> Self {
		DecodeConfig {
			accept_unknown_currency: false,
			require_payment_secret: true,
		}
	}
}
