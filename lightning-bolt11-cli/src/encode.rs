use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bitcoin::hashes::sha256;
use bitcoin::hex::FromHex;
use bitcoin::secp256k1::Secp256k1;
use clap::{ArgGroup, Args};
use lightning_bolt11::scid::scid_from_readable;
use lightning_bolt11::util::logger::Logger;
use lightning_bolt11::{
	log_debug, Bolt11InvoiceFeatures, Currency, InvoiceBuilder, PayeePubKey, PaymentSecret,
	PrivateRoute, RouteHintHop, RoutingFees,
};

#[derive(Args)]
#[command(group(
	ArgGroup::new("descriptor")
		.required(true)
		.args(["description", "description_hash"])
))]
pub struct EncodeArgs {
	/// Currency prefix: bc, tb, bcrt, sb, tbs or any other
	#[arg(long, default_value = "bc")]
	currency: String,
	/// Creation time, in seconds since the Unix epoch
	#[arg(long)]
	timestamp: u64,
	/// Payment hash as hex
	#[arg(long)]
	payment_hash: String,
	/// Description of the payment
	#[arg(long)]
	description: Option<String>,
	/// SHA-256 of a longer description, as hex
	#[arg(long)]
	description_hash: Option<String>,
	/// Secret key to sign with, as hex
	#[arg(long)]
	private_key: String,
	/// Amount in BTC, such as 0.0025
	#[arg(long)]
	amount: Option<String>,
	/// Payee public key to include, as hex
	#[arg(long)]
	payee: Option<String>,
	/// Payment secret as hex
	#[arg(long)]
	payment_secret: Option<String>,
	/// Expiry in seconds
	#[arg(long)]
	expiry: Option<u64>,
	/// Minimum final CLTV expiry delta
	#[arg(long)]
	min_final_cltv: Option<u64>,
	/// Feature bits as big-endian hex
	#[arg(long)]
	features: Option<String>,
	/// On-chain fallback address, may be repeated
	#[arg(long)]
	fallback: Vec<String>,
	/// Private route as comma separated PUBKEY/SCID/BASE_MSAT/PPM/CLTV hops, may be repeated
	#[arg(long)]
	route: Vec<String>,
}

/// Parses one `PUBKEY/SCID/BASE_MSAT/PPM/CLTV` hop. The short channel id may be given as an
/// integer or as `BLOCKxTXxVOUT`.
fn parse_hop(s: &str) -> Result<RouteHintHop> {
	let parts: Vec<&str> = s.split('/').collect();
	if parts.len() != 5 {
		bail!("Invalid hop '{}'. Expected 'pubkey/scid/base_msat/ppm/cltv'", s);
	}
	let short_channel_id = match parts[1].parse::<u64>() {
		Ok(scid) => scid,
		Err(_) => scid_from_readable(parts[1])
			.with_context(|| format!("Invalid short channel id '{}'", parts[1]))?,
	};
	Ok(RouteHintHop {
		src_node_id: <[u8; 33]>::from_hex(parts[0])
			.with_context(|| format!("Invalid node id '{}'", parts[0]))?,
		short_channel_id,
		fees: RoutingFees {
			base_msat: parts[2].parse().context("Invalid base fee")?,
			proportional_millionths: parts[3].parse().context("Invalid proportional fee")?,
		},
		cltv_expiry_delta: parts[4].parse().context("Invalid CLTV expiry delta")?,
	})
}

fn parse_route(s: &str) -> Result<PrivateRoute> {
	let hops = s.split(',').map(parse_hop).collect::<Result<Vec<_>>>()?;
	Ok(PrivateRoute::new(hops))
}

/// Reads big-endian feature bytes, bit 0 being the lowest bit of the last byte.
fn parse_features(hex: &str) -> Result<Bolt11InvoiceFeatures> {
	let bytes = Vec::<u8>::from_hex(hex).context("Invalid features hex")?;
	let set_bits: Vec<usize> = bytes.iter().rev().enumerate()
		.flat_map(|(idx, byte)| (0..8usize).filter(move |bit| *byte & (1u8 << *bit) != 0).map(move |bit| idx * 8 + bit))
		.collect();
	Ok(Bolt11InvoiceFeatures::from_set_bits(&set_bits))
}

fn build(args: EncodeArgs) -> Result<String> {
	let currency = Currency::from_prefix(&args.currency.to_lowercase());
	let payment_hash = sha256::Hash::from_str(&args.payment_hash).context("Invalid payment hash")?;
	let private_key = <[u8; 32]>::from_hex(&args.private_key).context("Invalid private key")?;

	let mut builder = InvoiceBuilder::new(currency)
		.timestamp_secs(args.timestamp)
		.payment_hash(payment_hash);
	if let Some(description) = args.description {
		builder = builder.description(description);
	}
	if let Some(hash) = args.description_hash {
		builder = builder.description_hash(sha256::Hash::from_str(&hash).context("Invalid description hash")?);
	}
	if let Some(amount) = args.amount {
		builder = builder.amount_btc(&amount);
	}
	if let Some(payee) = args.payee {
		builder = builder.payee_pub_key(PayeePubKey(<[u8; 33]>::from_hex(&payee).context("Invalid payee")?));
	}
	if let Some(secret) = args.payment_secret {
		builder = builder.payment_secret(PaymentSecret(<[u8; 32]>::from_hex(&secret).context("Invalid payment secret")?));
	}
	if let Some(expiry) = args.expiry {
		builder = builder.expiry_time(Duration::from_secs(expiry));
	}
	if let Some(delta) = args.min_final_cltv {
		builder = builder.min_final_cltv_expiry_delta(delta);
	}
	if let Some(features) = args.features {
		builder = builder.features(parse_features(&features)?);
	}
	for address in args.fallback.iter() {
		builder = builder.fallback_address(address);
	}
	for route in args.route.iter() {
		builder = builder.private_route(parse_route(route)?);
	}

	let invoice = builder.build_signed(&Secp256k1::new(), &private_key)
		.context("Failed to build invoice")?;
	Ok(invoice.to_string())
}

pub fn handle_command<L: Logger>(args: EncodeArgs, logger: &L) -> Result<()> {
	let invoice = build(args)?;
	log_debug!(logger, "Encoded invoice of {} characters", invoice.len());
	println!("{}", invoice);
	Ok(())
}
