//! API groups of the Qortal client.
//!
//! Each group borrows the client and returns the node's JSON payload as-is.
//! Response shapes differ between Core releases, so normalization is left to
//! callers.

mod addresses;
mod arbitrary;
mod names;
mod node;
mod trades;

pub use addresses::AddressesApi;
pub use arbitrary::{ArbitraryApi, QdnSearchQuery};
pub use names::{NamesApi, NamesQuery};
pub use node::NodeApi;
pub use trades::{TradeOffersQuery, TradesApi};

/// Append `key=value` when `value` is set.
fn push_param<T: ToString>(query: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}
