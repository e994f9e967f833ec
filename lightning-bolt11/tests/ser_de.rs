use bech32::primitives::iter::Fe32IterExt;
use bech32::{Fe32, Hrp};
use bitcoin::hashes::{sha256, Hash};
use bitcoin::hex::{DisplayHex, FromHex};
use bitcoin::secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use lightning_bolt11::util::logger::{Logger, NullLogger, Record};
use lightning_bolt11::*;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

const PAYMENT_HASH: &str = "0001020304050607080900010203040506070809000102030405060708090102";
const DESCRIPTION_HASH: &str = "3925b6f67e2c340036ed12093dd44e0368df1b6ea26c53dbe4811f58fd5db8c1";
const PAYEE: &str = "03e7156ae33b0a208d0744199163177e909e80176e55d97a2f221ede0f934dd9ad";

fn private_key() -> [u8; 32] {
	<[u8; 32]>::from_hex("e126f68f7eafcc8b74f54d269fe206be715000f94dac067d1c04a8ca3b2db734").unwrap()
}

fn payee() -> PayeePubKey {
	PayeePubKey(<[u8; 33]>::from_hex(PAYEE).unwrap())
}

fn payment_hash() -> sha256::Hash {
	sha256::Hash::from_str(PAYMENT_HASH).unwrap()
}

fn node_id(hex: &str) -> [u8; 33] {
	<[u8; 33]>::from_hex(hex).unwrap()
}

/// Checks the fields every BOLT 11 example invoice shares.
fn check_common(invoice: &Bolt11Invoice) {
	assert_eq!(invoice.timestamp().as_unix_timestamp(), 1496314658);
	assert_eq!(invoice.payment_hash(), &payment_hash());
	assert_eq!(invoice.payment_secret(), Some(&PaymentSecret([0x11; 32])));
	assert_eq!(invoice.payee_pub_key(), &payee());
	assert!(!invoice.payee_pub_key_included());
}

#[test]
fn test_bolt_donation_invoice() {
	let invoice = Bolt11Invoice::from_str(
		"lnbc1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdpl2pkx2ctnv5sxxmmwwd5kgetjypeh2ursdae8g6twvus8g6rfwvs8qun0dfjkxaq9qrsgq357wnc5r2ueh7ck6q93dj32dlqnls087fxdwk8qakdyafkq3yap9us6v52vjjsrvywa6rt52cm9r9zqt8r2t7mlcwspyetp5h2tztugp9lfyql"
	).unwrap();
	check_common(&invoice);
	assert_eq!(invoice.currency(), Currency::Bitcoin);
	assert_eq!(invoice.amount_milli_satoshis(), None);
	assert_eq!(
		invoice.description(),
		&Bolt11InvoiceDescription::Direct(Description::new("Please consider supporting this project".to_owned()))
	);
	assert_eq!(invoice.expiry_time(), Duration::from_secs(DEFAULT_EXPIRY_TIME));
	assert_eq!(invoice.min_final_cltv_expiry_delta(), DEFAULT_MIN_FINAL_CLTV_EXPIRY_DELTA);
	assert_eq!(
		invoice.signature().compact().as_hex().to_string(),
		"8d3ce9e28357337f62da0162d9454df827f83cfe499aeb1c1db349d4d81127425e434ca29929406c23bba1ae8ac6ca32880b38d4bf6ff874024cac34ba9625f1"
	);
	let features = invoice.features().unwrap();
	assert!(features.supports(8));
	assert!(features.supports(14));
	assert_eq!(features.to_trimmed_bytes(), vec![0x82]);
}

#[test]
fn test_bolt_coffee_invoice() {
	let encoded = "lnbc2500u1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpu9qrsgquk0rl77nj30yxdy8j9vdx85fkpmdla2087ne0xh8nhedh8w27kyke0lp53ut353s06fv3qfegext0eh0ymjpf39tuven09sam30g4vgpfna3rh";
	let invoice = Bolt11Invoice::from_str(encoded).unwrap();
	check_common(&invoice);
	assert_eq!(invoice.amount_milli_satoshis(), Some(250_000_000));
	assert_eq!(invoice.amount_pico_btc(), Some(2_500_000_000));
	assert_eq!(invoice.description().to_string(), "1 cup coffee");
	assert_eq!(invoice.expiry_time(), Duration::from_secs(60));
	assert_eq!(invoice.expires_at(), Some(Duration::from_secs(1496314658 + 60)));
	assert_eq!(invoice.signature().recovery_id(), 1);
	assert_eq!(invoice.to_string(), encoded);
}

#[test]
fn test_bolt_unicode_description() {
	let invoice = Bolt11Invoice::from_str(
		"lnbc2500u1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdpquwpc4curk03c9wlrswe78q4eyqc7d8d0xqzpu9qrsgqhtjpauu9ur7fw2thcl4y9vfvh4m9wlfyz2gem29g5ghe2aak2pm3ps8fdhtceqsaagty2vph7utlgj48u0ged6a337aewvraedendscp573dxr"
	).unwrap();
	check_common(&invoice);
	assert_eq!(invoice.description().to_string(), "ナンセンス 1杯");
}

#[test]
fn test_bolt_description_hash_invoice() {
	let invoice = Bolt11Invoice::from_str(
		"lnbc20m1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqhp58yjmdan79s6qqdhdzgynm4zwqd5d7xmw5fk98klysy043l2ahrqs9qrsgq7ea976txfraylvgzuxs8kgcw23ezlrszfnh8r6qtfpr6cxga50aj6txm9rxrydzd06dfeawfk6swupvz4erwnyutnjq7x39ymw6j38gp7ynn44"
	).unwrap();
	check_common(&invoice);
	assert_eq!(invoice.amount_milli_satoshis(), Some(2_000_000_000));
	assert_eq!(
		invoice.description(),
		&Bolt11InvoiceDescription::Hash(Sha256(sha256::Hash::from_str(DESCRIPTION_HASH).unwrap()))
	);
	assert!(invoice.fallbacks().is_empty());
}

#[test]
fn test_bolt_testnet_fallback() {
	let invoice = Bolt11Invoice::from_str(
		"lntb20m1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygshp58yjmdan79s6qqdhdzgynm4zwqd5d7xmw5fk98klysy043l2ahrqspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqfpp3x9et2e20v6pu37c5d9vax37wxq72un989qrsgqdj545axuxtnfemtpwkc45hx9d2ft7x04mt8q7y6t0k2dge9e7h8kpy9p34ytyslj3yu569aalz2xdk8xkd7ltxqld94u8h2esmsmacgpghe9k8"
	).unwrap();
	check_common(&invoice);
	assert_eq!(invoice.currency(), Currency::BitcoinTestnet);
	assert_eq!(
		invoice.fallbacks(),
		&[Fallback::PubKeyHash(<[u8; 20]>::from_hex("3172b5654f6683c8fb146959d347ce303cae4ca7").unwrap())]
	);
	assert_eq!(invoice.fallback_addresses(), vec!["mk2QpYatsKicvFVuTAQLBryyccRXMUaGHP".to_owned()]);
}

#[test]
fn test_bolt_route_hints() {
	let invoice = Bolt11Invoice::from_str(
		"lnbc20m1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqhp58yjmdan79s6qqdhdzgynm4zwqd5d7xmw5fk98klysy043l2ahrqsfpp3qjmp7lwpagxun9pygexvgpjdc4jdj85fr9yq20q82gphp2nflc7jtzrcazrra7wwgzxqc8u7754cdlpfrmccae92qgzqvzq2ps8pqqqqqqpqqqqq9qqqvpeuqafqxu92d8lr6fvg0r5gv0heeeqgcrqlnm6jhphu9y00rrhy4grqszsvpcgpy9qqqqqqgqqqqq7qqzq9qrsgqdfjcdk6w3ak5pca9hwfwfh63zrrz06wwfya0ydlzpgzxkn5xagsqz7x9j4jwe7yj7vaf2k9lqsdk45kts2fd0fkr28am0u4w95tt2nsq76cqw0"
	).unwrap();
	check_common(&invoice);
	assert_eq!(invoice.fallback_addresses(), vec!["1RustyRX2oai4EYYDpQGWvEL62BBGqN9T".to_owned()]);
	assert_eq!(invoice.signature().recovery_id(), 0);

	let expected = PrivateRoute::new(vec![
		RouteHintHop {
			src_node_id: node_id("029e03a901b85534ff1e92c43c74431f7ce72046060fcf7a95c37e148f78c77255"),
			short_channel_id: 0x0102030405060708,
			fees: RoutingFees { base_msat: 1, proportional_millionths: 20 },
			cltv_expiry_delta: 3,
		},
		RouteHintHop {
			src_node_id: node_id("039e03a901b85534ff1e92c43c74431f7ce72046060fcf7a95c37e148f78c77255"),
			short_channel_id: 0x030405060708090a,
			fees: RoutingFees { base_msat: 2, proportional_millionths: 30 },
			cltv_expiry_delta: 4,
		},
	]);
	assert_eq!(invoice.private_routes(), &[expected]);
	assert_eq!(invoice.route_hints().len(), 2);
}

#[test]
fn test_bolt_segwit_and_p2sh_fallbacks() {
	let cases = [
		(
			"lnbc20m1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygshp58yjmdan79s6qqdhdzgynm4zwqd5d7xmw5fk98klysy043l2ahrqspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqfppj3a24vwu6r8ejrss3axul8rxldph2q7z99qrsgqz6qsgww34xlatfj6e3sngrwfy3ytkt29d2qttr8qz2mnedfqysuqypgqex4haa2h8fx3wnypranf3pdwyluftwe680jjcfp438u82xqphf75ym",
			"3EktnHQD7RiAE6uzMj2ZifT9YgRrkSgzQX",
			Some(18),
		),
		(
			"lnbc20m1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygshp58yjmdan79s6qqdhdzgynm4zwqd5d7xmw5fk98klysy043l2ahrqspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqfppqw508d6qejxtdg4y5r3zarvary0c5xw7k9qrsgqt29a0wturnys2hhxpner2e3plp6jyj8qx7548zr2z7ptgjjc7hljm98xhjym0dg52sdrvqamxdezkmqg4gdrvwwnf0kv2jdfnl4xatsqmrnsse",
			"bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
			Some(0),
		),
		(
			"lnbc20m1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygshp58yjmdan79s6qqdhdzgynm4zwqd5d7xmw5fk98klysy043l2ahrqspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqfp4qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q9qrsgq9vlvyj8cqvq6ggvpwd53jncp9nwc47xlrsnenq2zp70fq83qlgesn4u3uyf4tesfkkwwfg3qs54qe426hp3tz7z6sweqdjg05axsrjqp9yrrwc",
			"bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3",
			Some(0),
		),
	];
	for (encoded, address, version) in cases.iter() {
		let invoice = Bolt11Invoice::from_str(encoded).unwrap();
		check_common(&invoice);
		assert_eq!(invoice.fallback_addresses(), vec![address.to_string()]);
		assert_eq!(invoice.fallbacks()[0].version(), *version);
	}
}

#[test]
fn test_pico_amount_and_extra_fields() {
	let invoice = Bolt11Invoice::from_str(
		"lnbc9678785340p1pwmna7lpp5gc3xfm08u9qy06djf8dfflhugl6p7lgza6dsjxq454gxhj9t7a0sd8dgfkx7cmtwd68yetpd5s9xar0wfjn5gpc8qhrsdfq24f5ggrxdaezqsnvda3kkum5wfjkzmfqf3jkgem9wgsyuctwdus9xgrcyqcjcgpzgfskx6eqf9hzqnteypzxz7fzypfhg6trddjhygrcyqezcgpzfysywmm5ypxxjemgw3hxjmn8yptk7untd9hxwg3q2d6xjcmtv4ezq7pqxgsxzmnyyqcjqmt0wfjjq6t5v4khxsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygsxqyjw5qcqp2rzjq0gxwkzc8w6323m55m4jyxcjwmy7stt9hwkwe2qxmy8zpsgg7jcuwz87fcqqeuqqqyqqqqlgqqqqn3qq9q9qrsgqrvgkpnmps664wgkp43l22qsgdw4ve24aca4nymnxddlnp8vh9v2sdxlu5ywdxefsfvm0fq3sesf08uf6q9a2ke0hc9j6z6wlxg5z5kqpu2v9wz"
	).unwrap();
	assert_eq!(invoice.amount_milli_satoshis(), Some(967878534));
	assert_eq!(invoice.timestamp().as_unix_timestamp(), 1572468703);
	assert_eq!(
		invoice.payment_hash(),
		&sha256::Hash::from_str("462264ede7e14047e9b249da94fefc47f41f7d02ee9b091815a5506bc8abf75f").unwrap()
	);
	assert_eq!(
		invoice.description().to_string(),
		"Blockstream Store: 88.85 USD for Blockstream Ledger Nano S x 1, \"Back In My Day\" Sticker x 2, \"I Got Lightning Working\" Sticker x 2 and 1 more items"
	);
	assert_eq!(invoice.expiry_time(), Duration::from_secs(604800));
	assert_eq!(invoice.min_final_cltv_expiry_delta(), 10);

	let hops = invoice.route_hints();
	assert_eq!(hops.len(), 1);
	assert_eq!(hops[0].src_node_id, node_id("03d06758583bb5154774a6eb221b1276c9e82d65bbaceca806d90e20c108f4b1c7"));
	assert_eq!(hops[0].short_channel_id, (589390 << 40) | (3312 << 16) | 1);
	assert_eq!(hops[0].readable_short_channel_id().to_string(), "589390x3312x1");
	assert_eq!(hops[0].fees, RoutingFees { base_msat: 1000, proportional_millionths: 2500 });
	assert_eq!(hops[0].cltv_expiry_delta, 40);
}

#[test]
fn test_uppercase_invoice() {
	let invoice = Bolt11Invoice::from_str(
		"LNBC25M1PVJLUEZPP5QQQSYQCYQ5RQWZQFQQQSYQCYQ5RQWZQFQQQSYQCYQ5RQWZQFQYPQDQ5VDHKVEN9V5SXYETPDEESSP5ZYG3ZYG3ZYG3ZYG3ZYG3ZYG3ZYG3ZYG3ZYG3ZYG3ZYG3ZYG3ZYGS9Q5SQQQQQQQQQQQQQQQQSGQ2A25DXL5HRNTDTN6ZVYDT7D66HYZSYHQS4WDYNAVYS42XGL6SGX9C4G7ME86A27T07MDTFRY458RTJR0V92CNMSWPSJSCGT2VCSE3SGPZ3UAPA"
	).unwrap();
	check_common(&invoice);
	assert_eq!(invoice.amount_milli_satoshis(), Some(2_500_000_000));
	assert_eq!(invoice.description().to_string(), "coffee beans");
	assert!(invoice.features().unwrap().supports(99));
	assert!(invoice.to_string().starts_with("lnbc25m1pvjluezpp5"));
}

#[test]
fn test_unknown_required_feature_is_kept() {
	// Feature bit 100 is even and unknown, the reader is left to decide whether to pay.
	let invoice = Bolt11Invoice::from_str(
		"lnbc25m1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5vdhkven9v5sxyetpdeessp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygs9q4psqqqqqqqqqqqqqqqqsgqtqyx5vggfcsll4wu246hz02kp85x4katwsk9639we5n5yngc3yhqkm35jnjw4len8vrnqnf5ejh0mzj9n3vz2px97evektfm2l6wqccp3y7372"
	).unwrap();
	let features = invoice.features().unwrap();
	assert_eq!(features.as_bits().len(), 105);
	for bit in [8, 14, 99, 100] {
		assert!(features.supports(bit));
	}
	assert!(!features.supports(101));
}

#[test]
fn test_bolt_invalid_invoices() {
	match Bolt11Invoice::from_str(
		"lnbc2500u1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdpquwpc4curk03c9wlrswe78q4eyqc7d8d0xqzpuyk0sg5g70me25alkluzd2x62aysf2pyy8edtjeevuv4p2d5p76r4zkmneet7uvyakky2zr4cusd45tftc9c5fh0nnqpnl2jfll544esqchsrnt"
	) {
		Err(ParseOrSemanticError::ParseError(Bolt11ParseError::BadBech32String(_))) => {},
		other => panic!("checksum error expected, got {:?}", other),
	}
	match Bolt11Invoice::from_str(
		"pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdpquwpc4curk03c9wlrswe78q4eyqc7d8d0xqzpuyk0sg5g70me25alkluzd2x62aysf2pyy8edtjeevuv4p2d5p76r4zkmneet7uvyakky2zr4cusd45tftc9c5fh0nnqpnl2jfll544esqchsrny"
	) {
		Err(ParseOrSemanticError::ParseError(Bolt11ParseError::BadBech32String(_))) => {},
		other => panic!("missing separator error expected, got {:?}", other),
	}
	match Bolt11Invoice::from_str(
		"LNBC2500u1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdpquwpc4curk03c9wlrswe78q4eyqc7d8d0xqzpuyk0sg5g70me25alkluzd2x62aysf2pyy8edtjeevuv4p2d5p76r4zkmneet7uvyakky2zr4cusd45tftc9c5fh0nnqpnl2jfll544esqchsrny"
	) {
		Err(ParseOrSemanticError::ParseError(Bolt11ParseError::BadBech32String(_))) => {},
		other => panic!("mixed case error expected, got {:?}", other),
	}
	assert_eq!(Bolt11Invoice::from_str(
		"lnbc2500u1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpusp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygs9qrsgqwgt7mcn5yqw3yx0w94pswkpq6j9uh6xfqqqtsk4tnarugeektd4hg5975x9am52rz4qskukxdmjemg92vvqz8nvmsye63r5ykel43pgz7zq0g2"
		), Err(ParseOrSemanticError::SemanticError(Bolt11SemanticError::InvalidSignature)));
	assert_eq!(Bolt11Invoice::from_str(
		"lnbc1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdpl2pkx2ctnv5sxxmmwwd5kgetjypeh2ursdae8g6na6hlh"
		), Err(ParseOrSemanticError::ParseError(Bolt11ParseError::MissingSignature)));
	assert_eq!(Bolt11Invoice::from_str(
		"lnbc2500x1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpusp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygs9qrsgqrrzc4cvfue4zp3hggxp47ag7xnrlr8vgcmkjxk3j5jqethnumgkpqp23z9jclu3v0a7e0aruz366e9wqdykw6dxhdzcjjhldxq0w6wgqcnu43j"
		), Err(ParseOrSemanticError::ParseError(Bolt11ParseError::InvalidAmount)));
	assert_eq!(Bolt11Invoice::from_str(
		"lnbc2500000001p1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpusp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygs9qrsgq0lzc236j96a95uv0m3umg28gclm5lqxtqqwk32uuk4k6673k6n5kfvx3d2h8s295fad45fdhmusm8sjudfhlf6dcsxmfvkeywmjdkxcp99202x"
		), Err(ParseOrSemanticError::SemanticError(Bolt11SemanticError::ImpreciseAmount)));
}

fn full_builder() -> InvoiceBuilder {
	let route = PrivateRoute::new(vec![RouteHintHop {
		src_node_id: node_id("029e03a901b85534ff1e92c43c74431f7ce72046060fcf7a95c37e148f78c77255"),
		short_channel_id: 0x0102030405060708,
		fees: RoutingFees { base_msat: 1, proportional_millionths: 20 },
		cltv_expiry_delta: 3,
	}]);
	InvoiceBuilder::new(Currency::Bitcoin)
		.amount_milli_satoshis(123_456)
		.timestamp_secs(1496314658)
		.payment_hash(payment_hash())
		.description("Round trip".to_owned())
		.payment_secret(PaymentSecret([0x11; 32]))
		.expiry_time(Duration::from_secs(600))
		.min_final_cltv_expiry_delta(144)
		.features(Bolt11InvoiceFeatures::from_set_bits(&[8, 14]))
		.fallback_address("1RustyRX2oai4EYYDpQGWvEL62BBGqN9T")
		.fallback_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4")
		.private_route(route)
}

#[test]
fn test_build_then_decode() {
	let secp = Secp256k1::new();
	let invoice = full_builder().build_signed(&secp, &private_key()).unwrap();
	assert!(invoice.to_string().starts_with("lnbc1234560p1pvjluez"));

	let decoded = Bolt11Invoice::from_str(&invoice.to_string()).unwrap();
	assert_eq!(decoded, invoice);
	assert_eq!(decoded.payee_pub_key(), &payee());
	assert_eq!(decoded.expiry_time(), Duration::from_secs(600));
	assert_eq!(decoded.min_final_cltv_expiry_delta(), 144);
	assert_eq!(decoded.fallbacks().len(), 2);
	assert_eq!(decoded.private_routes().len(), 1);
	assert_eq!(decoded.signable_hash(), invoice.signable_hash());
}

#[test]
fn test_build_with_payee_and_description_hash() {
	let secp = Secp256k1::new();
	let secret = SecretKey::from_slice(&[0x42; 32]).unwrap();
	let pub_key = PayeePubKey(PublicKey::from_secret_key(&secp, &secret).serialize());

	let invoice = InvoiceBuilder::new(Currency::Regtest)
		.timestamp_secs(1)
		.payment_hash(payment_hash())
		.description_hash(sha256::Hash::hash(b"a long description"))
		.payee_pub_key(pub_key)
		.build_signed(&secp, &[0x42; 32])
		.unwrap();
	assert!(invoice.to_string().starts_with("lnbcrt1"));

	let decoded = Bolt11Invoice::from_str(&invoice.to_string()).unwrap();
	assert!(decoded.payee_pub_key_included());
	assert_eq!(decoded.payee_pub_key(), &pub_key);
	assert_eq!(decoded.currency(), Currency::Regtest);
	assert_eq!(decoded.amount_milli_satoshis(), None);
	assert_eq!(
		decoded.description(),
		&Bolt11InvoiceDescription::Hash(Sha256(sha256::Hash::hash(b"a long description")))
	);
}

/// Signs with the real curve but vouches for any payee key.
struct CarelessBackend(Secp256k1<All>);

impl SignatureBackend for CarelessBackend {
	fn sign_recoverable(&self, digest: &[u8; 32], secret_key: &[u8; 32]) -> Result<Bolt11InvoiceSignature, CreationError> {
		self.0.sign_recoverable(digest, secret_key)
	}

	fn verify(&self, _digest: &[u8; 32], _signature: &Bolt11InvoiceSignature, _pub_key: &PayeePubKey) -> bool {
		true
	}

	fn recover_pub_key(&self, digest: &[u8; 32], signature: &Bolt11InvoiceSignature) -> Option<PayeePubKey> {
		self.0.recover_pub_key(digest, signature)
	}
}

#[test]
fn test_forged_payee_is_rejected() {
	let invoice = InvoiceBuilder::new(Currency::Bitcoin)
		.timestamp_secs(1496314658)
		.payment_hash(payment_hash())
		.description("forged".to_owned())
		.payee_pub_key(payee())
		.build_signed(&CarelessBackend(Secp256k1::new()), &[0x42; 32])
		.unwrap();
	assert_eq!(
		Bolt11Invoice::from_str(&invoice.to_string()),
		Err(ParseOrSemanticError::SemanticError(Bolt11SemanticError::InvalidSignature))
	);
}

#[test]
fn test_maximum_route_field() {
	// Twelve hops take 980 characters, thirteen would not fit into a single field.
	let hop = RouteHintHop {
		src_node_id: node_id(PAYEE),
		short_channel_id: 42,
		fees: RoutingFees { base_msat: 1000, proportional_millionths: 1 },
		cltv_expiry_delta: 40,
	};
	let invoice = InvoiceBuilder::new(Currency::Bitcoin)
		.timestamp_secs(1496314658)
		.payment_hash(payment_hash())
		.description("twelve hops".to_owned())
		.private_route(PrivateRoute::new(vec![hop.clone(); 12]))
		.build_signed(&Secp256k1::new(), &private_key())
		.unwrap();
	let decoded = Bolt11Invoice::from_str(&invoice.to_string()).unwrap();
	assert_eq!(decoded.route_hints().len(), 12);
	assert!(decoded.route_hints().iter().all(|decoded_hop| **decoded_hop == hop));
}

#[test]
fn test_strict_config() {
	let secp = Secp256k1::new();
	let no_secret = InvoiceBuilder::new(Currency::Bitcoin)
		.timestamp_secs(1496314658)
		.payment_hash(payment_hash())
		.description("no secret".to_owned())
		.build_signed(&secp, &private_key())
		.unwrap()
		.to_string();
	assert!(decode(&no_secret, &DecodeConfig::default(), &NullLogger).is_ok());
	assert_eq!(
		decode(&no_secret, &DecodeConfig::strict(), &NullLogger),
		Err(ParseOrSemanticError::SemanticError(Bolt11SemanticError::MissingPaymentSecret))
	);

	let other_currency = InvoiceBuilder::new(Currency::Other("xyz".to_owned()))
		.timestamp_secs(1496314658)
		.payment_hash(payment_hash())
		.description("elsewhere".to_owned())
		.payment_secret(PaymentSecret([0x11; 32]))
		.build_signed(&secp, &private_key())
		.unwrap()
		.to_string();
	assert!(other_currency.starts_with("lnxyz1"));
	assert_eq!(
		Bolt11Invoice::from_str(&other_currency).unwrap().currency(),
		Currency::Other("xyz".to_owned())
	);
	assert_eq!(
		decode(&other_currency, &DecodeConfig::strict(), &NullLogger),
		Err(ParseOrSemanticError::SemanticError(Bolt11SemanticError::UnknownCurrency))
	);
}

/// Signs and encodes a `lnbc` invoice made of the given fields, written as they are.
fn sign_raw_fields(fields: &[(char, BitBuf)]) -> String {
	let mut data = BitBuf::new();
	data.push_uint(1496314658, 35);
	for (tag, payload) in fields {
		let mut payload = payload.clone();
		payload.pad_to_multiple(5);
		data.push_fe32(Fe32::from_char(*tag).unwrap());
		data.push_uint((payload.len() / 5) as u64, 10);
		data.extend_from_bits(payload.as_bits());
	}
	let digest = sign::signable_hash("lnbc", data.as_bits());
	let signature = Secp256k1::new().sign_recoverable(&digest, &private_key()).unwrap();
	data.push_bytes(signature.compact());
	data.push_uint(signature.recovery_id() as u64, 8);

	let hrp = Hrp::parse("lnbc").unwrap();
	data.to_fe32s().unwrap().into_iter().with_checksum::<Bolt11Bech32>(&hrp).chars().collect()
}

#[test]
fn test_misshapen_payment_hash_is_kept() {
	// 33 bytes take 53 symbols.
	let mut long_hash = BitBuf::from_bytes(payment_hash().as_byte_array());
	long_hash.push_bytes(&[0xff]);
	let encoded = sign_raw_fields(&[
		('p', long_hash),
		('d', BitBuf::from_bytes(b"long hash")),
	]);

	let invoice = Bolt11Invoice::from_str(&encoded).unwrap();
	assert_eq!(invoice.payment_hash(), &payment_hash());
	assert_eq!(invoice.description(), &Bolt11InvoiceDescription::Direct(Description::new("long hash".to_owned())));
	assert_eq!(invoice.payee_pub_key(), &payee());
	assert_eq!(invoice.unknown_fields().len(), 1);
	assert_eq!(invoice.unknown_fields()[0].tag_char(), 'p');
	assert_eq!(invoice.unknown_fields()[0].data.len(), 53 * 5);
}

#[test]
fn test_misshapen_description_hash_is_kept() {
	let description_hash = sha256::Hash::from_str(DESCRIPTION_HASH).unwrap();
	let encoded = sign_raw_fields(&[
		('p', BitBuf::from_bytes(payment_hash().as_byte_array())),
		('h', BitBuf::from_bytes(&description_hash.as_byte_array()[..31])),
	]);

	let invoice = Bolt11Invoice::from_str(&encoded).unwrap();
	let mut truncated = [0u8; 32];
	truncated[..31].copy_from_slice(&description_hash.as_byte_array()[..31]);
	assert_eq!(
		invoice.description(),
		&Bolt11InvoiceDescription::Hash(Sha256(sha256::Hash::from_byte_array(truncated)))
	);
	assert_eq!(invoice.payment_hash(), &payment_hash());
	assert_eq!(invoice.unknown_fields().len(), 1);
	assert_eq!(invoice.unknown_fields()[0].tag_char(), 'h');
	assert_eq!(invoice.unknown_fields()[0].data.len(), 50 * 5);
}

#[test]
fn test_repeated_fields_on_decode() {
	let uint = |value: u64| {
		let mut bits = BitBuf::new();
		bits.push_uint(value, 10);
		bits
	};
	let first_secret = BitBuf::from_bytes(&[0x11; 32]);
	let second_secret = BitBuf::from_bytes(&[0x22; 32]);
	let encoded = sign_raw_fields(&[
		('p', BitBuf::from_bytes(payment_hash().as_byte_array())),
		('d', BitBuf::from_bytes(b"twice")),
		('s', first_secret),
		('c', uint(9)),
		('s', second_secret),
		('c', uint(40)),
	]);
	let invoice = Bolt11Invoice::from_str(&encoded).unwrap();
	assert_eq!(invoice.payment_secret(), Some(&PaymentSecret([0x22; 32])));
	assert_eq!(invoice.min_final_cltv_expiry_delta(), 40);

	let expiry = uint(60);
	let encoded = sign_raw_fields(&[
		('p', BitBuf::from_bytes(payment_hash().as_byte_array())),
		('d', BitBuf::from_bytes(b"twice")),
		('x', expiry.clone()),
		('x', expiry),
	]);
	assert_eq!(
		Bolt11Invoice::from_str(&encoded),
		Err(ParseOrSemanticError::SemanticError(Bolt11SemanticError::DuplicateTag('x')))
	);
}

struct CountingLogger {
	lines: Mutex<Vec<(&'static str, String)>>,
}

impl Logger for CountingLogger {
	fn log(&self, record: Record) {
		self.lines.lock().unwrap().push((record.module_path, record.args.to_string()));
	}
}

#[test]
fn test_decode_logs_success() {
	let logger = CountingLogger { lines: Mutex::new(Vec::new()) };
	let invoice = full_builder().build_signed(&Secp256k1::new(), &private_key()).unwrap();
	decode(&invoice.to_string(), &DecodeConfig::default(), &logger).unwrap();

	let lines = logger.lines.lock().unwrap();
	assert!(lines.iter().all(|(module, _)| *module == "lightning_bolt11::de"));
	assert_eq!(lines.iter().filter(|(_, line)| line.starts_with("Decoded invoice for bc")).count(), 1);
	assert!(lines.iter().all(|(_, line)| !line.contains(&private_key().as_hex().to_string())));
}

#[cfg(feature = "serde")]
#[test]
fn test_serde() {
	let invoice_str = "lnbc2500u1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpu9qrsgquk0rl77nj30yxdy8j9vdx85fkpmdla2087ne0xh8nhedh8w27kyke0lp53ut353s06fv3qfegext0eh0ymjpf39tuven09sam30g4vgpfna3rh";
	let invoice = invoice_str.parse::<Bolt11Invoice>().unwrap();
	let serialized_invoice = serde_json::to_string(&invoice).unwrap();
	let deserialized_invoice: Bolt11Invoice = serde_json::from_str(serialized_invoice.as_str()).unwrap();
	assert_eq!(invoice, deserialized_invoice);
	assert_eq!(invoice_str, deserialized_invoice.to_string().as_str());
	assert_eq!(invoice_str, serialized_invoice.as_str().trim_matches('\"'));

	assert!(serde_json::from_str::<Bolt11Invoice>("\"lnbc1\"").is_err());
}
