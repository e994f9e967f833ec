//! Private route hints, carried in `r` tagged fields.
//!
//! One `r` field holds an ordered path of hops leading to the payee, each 408 bits long: the
//! 33-byte node id of the hop's source, the 8-byte short channel id, a 4-byte base fee, a 4-byte
//! proportional fee and a 2-byte CLTV delta, all big-endian.

use crate::bits::{BitBuf, BitReader, BitsError};
use crate::scid::ReadableScid;

/// Number of bits a single hop takes up in an `r` field.
pub const ROUTE_HINT_HOP_BITS: usize = 33 * 8 + 64 + 32 + 32 + 16;

/// Fees for routing via a given channel or a node
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash, Ord, PartialOrd)]
pub struct RoutingFees {
	/// Flat routing fee in millisatoshis.
	pub base_msat: u32,
	/// Liquidity-based routing fee in millionths of a routed amount.
	/// In other words, 10000 is 1%.
	pub proportional_millionths: u32,
}

/// A channel descriptor for a hop along a payment path.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct RouteHintHop {
	/// The node_id of the non-target end of the route
	pub src_node_id: [u8; 33],
	/// The short_channel_id of this channel
	pub short_channel_id: u64,
	/// The fees which must be paid to use this channel
	pub fees: RoutingFees,
	/// The difference in CLTV values between this node and the next node.
	pub cltv_expiry_delta: u16,
}

impl RouteHintHop {
	/// The short channel id in its `BLOCKxTXxVOUT` form.
	pub fn readable_short_channel_id(&self) -> ReadableScid {
		ReadableScid(self.short_channel_id)
	}

	fn read_from(reader: &mut BitReader) -> Result<RouteHintHop, BitsError> {
		Ok(RouteHintHop {
			src_node_id: reader.read_array::<33>()?,
			short_channel_id: reader.read_uint(64)?,
			fees: RoutingFees {
				base_msat: reader.read_uint(32)? as u32,
				proportional_millionths: reader.read_uint(32)? as u32,
			},
			cltv_expiry_delta: reader.read_uint(16)? as u16,
		})
	}

	fn write_to(&self, out: &mut BitBuf) {
		out.push_bytes(&self.src_node_id);
		out.push_uint(self.short_channel_id, 64);
		out.push_uint(self.fees.base_msat as u64, 32);
		out.push_uint(self.fees.proportional_millionths as u64, 32);
		out.push_uint(self.cltv_expiry_delta as u64, 16);
	}
}

/// Private routing information
///
/// # Invariants
/// The encoded route has to be <1024 5bit characters long (<=639 bytes or <=12 hops)
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PrivateRoute(Vec<RouteHintHop>);

impl PrivateRoute {
	/// Creates a route from its hops, ordered from the first hop after the payer's side towards
	/// the payee.
	pub fn new(hops: Vec<RouteHintHop>) -> PrivateRoute {
		PrivateRoute(hops)
	}

	/// The hops of the route.
	pub fn hops(&self) -> &[RouteHintHop] {
		&self.0
	}

	/// Returns the underlying list of hops
	pub fn into_inner(self) -> Vec<RouteHintHop> {
		self.0
	}

	/// Reads as many whole hops as `bits` holds. Returns the route and the number of trailing bits
	/// too short to form another hop, which are dropped.
	pub(crate) fn from_bits(bits: &[bool]) -> (PrivateRoute, usize) {
		let mut reader = BitReader::new(bits);
		let mut hops = Vec::with_capacity(bits.len() / ROUTE_HINT_HOP_BITS);
		while reader.remaining() >= ROUTE_HINT_HOP_BITS {
			match RouteHintHop::read_from(&mut reader) {
				Ok(hop) => hops.push(hop),
				Err(_) => break,
			}
		}
		(PrivateRoute(hops), reader.remaining())
	}

	pub(crate) fn write_bits(&self, out: &mut BitBuf) {
		for hop in self.0.iter() {
			hop.write_to(out);
		}
	}
}
