use anyhow::{Context, Result};
use bitcoin::hex::DisplayHex;
use clap::Args;
use lightning_bolt11::util::logger::Logger;
use lightning_bolt11::{decode, Bolt11Invoice, Bolt11InvoiceDescription, DecodeConfig, RouteHintHop};
use serde::Serialize;

#[derive(Args)]
pub struct DecodeArgs {
	/// The invoice string
	invoice: String,
	/// Reject invoices without a payment secret or for an unknown currency
	#[arg(long)]
	strict: bool,
}

#[derive(Serialize)]
struct DecodedHop {
	pubkey: String,
	short_channel_id: String,
	fee_base_msat: u32,
	fee_proportional_millionths: u32,
	cltv_expiry_delta: u16,
}

impl From<&RouteHintHop> for DecodedHop {
	fn from(hop: &RouteHintHop) -> Self {
		DecodedHop {
			pubkey: hop.src_node_id.to_lower_hex_string(),
			short_channel_id: hop.readable_short_channel_id().to_string(),
			fee_base_msat: hop.fees.base_msat,
			fee_proportional_millionths: hop.fees.proportional_millionths,
			cltv_expiry_delta: hop.cltv_expiry_delta,
		}
	}
}

#[derive(Serialize)]
struct DecodedUnknownField {
	tag: char,
	data: String,
}

#[derive(Serialize)]
struct DecodedInvoice {
	currency: String,
	amount_msat: Option<u64>,
	timestamp: u64,
	payment_hash: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	description_hash: Option<String>,
	payee: String,
	payee_included: bool,
	payment_secret: Option<String>,
	expiry: u64,
	min_final_cltv_expiry_delta: u64,
	features: Option<String>,
	route_hints: Vec<Vec<DecodedHop>>,
	fallbacks: Vec<String>,
	unknown_tags: Vec<DecodedUnknownField>,
	signature: String,
	recovery_id: u8,
}

impl From<&Bolt11Invoice> for DecodedInvoice {
	fn from(invoice: &Bolt11Invoice) -> Self {
		let (description, description_hash) = match invoice.description() {
			Bolt11InvoiceDescription::Direct(description) => (Some(description.to_string()), None),
			Bolt11InvoiceDescription::Hash(hash) => (None, Some(hash.0.to_string())),
		};
		DecodedInvoice {
			currency: invoice.currency().prefix().to_owned(),
			amount_msat: invoice.amount_milli_satoshis(),
			timestamp: invoice.timestamp().as_unix_timestamp(),
			payment_hash: invoice.payment_hash().to_string(),
			description,
			description_hash,
			payee: invoice.payee_pub_key().to_string(),
			payee_included: invoice.payee_pub_key_included(),
			payment_secret: invoice.payment_secret().map(|secret| secret.0.to_lower_hex_string()),
			expiry: invoice.expiry_time().as_secs(),
			min_final_cltv_expiry_delta: invoice.min_final_cltv_expiry_delta(),
			features: invoice.features().map(|features| features.to_trimmed_bytes().to_lower_hex_string()),
			route_hints: invoice.private_routes().iter()
				.map(|route| route.hops().iter().map(DecodedHop::from).collect())
				.collect(),
			fallbacks: invoice.fallback_addresses(),
			unknown_tags: invoice.unknown_fields().iter()
				.map(|field| DecodedUnknownField {
					tag: field.tag_char(),
					data: field.data.to_bytes_padded().to_lower_hex_string(),
				})
				.collect(),
			signature: invoice.signature().compact().to_lower_hex_string(),
			recovery_id: invoice.signature().recovery_id(),
		}
	}
}

pub fn handle_command<L: Logger>(args: DecodeArgs, logger: &L) -> Result<()> {
	let config = if args.strict { DecodeConfig::strict() } else { DecodeConfig::default() };
	let invoice = decode(args.invoice.trim(), &config, logger)
		.context("Failed to decode invoice")?;
	let json = serde_json::to_string_pretty(&DecodedInvoice::from(&invoice))?;
	println!("{}", json);
	Ok(())
}
