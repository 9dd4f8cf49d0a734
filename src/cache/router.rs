//! # Cache Key Router
//!
//! The single authority mapping gateway domain concepts to cache locations.
//! Every instance of the gateway computes identical keys from identical
//! inputs, so these strings are part of the multi-instance wire contract and
//! are pinned by the tests below. Change one and running deployments stop
//! sharing (and stop invalidating) each other's entries.
//!
//! Keys are grouped so that everything that must invalidate together shares
//! a key: parameter variants of one resource become fields under it.

use crate::cache::location::CacheLocation;
use crate::constants::rate_limit::COUNTER_KEY_PREFIX;

/// Stateless constructor set for every cache location the gateway uses.
#[derive(Debug, Clone, Copy)]
pub struct CacheRouter;

impl CacheRouter {
    /// Details of a single chain: `<chain_id>_chain`.
    pub fn chain(chain_id: &str) -> CacheLocation {
        CacheLocation::new(format!("{chain_id}_chain"), "")
    }

    /// A page of the chain directory: key `chains`, field `<offset>_<limit>`.
    pub fn chains(offset: u32, limit: u32) -> CacheLocation {
        CacheLocation::new("chains", format!("{offset}_{limit}"))
    }

    /// Token balances for an account, keyed per chain and address so a
    /// deletion drops every filter variant at once.
    ///
    /// Addresses are lowercased: mixed-case forms of the same account must
    /// not fragment into separate entries.
    pub fn account_balances(
        chain_id: &str,
        address: &str,
        trusted: bool,
        exclude_spam: bool,
    ) -> CacheLocation {
        CacheLocation::new(
            format!("{chain_id}_balances_{}", address.to_lowercase()),
            format!("{trusted}_{exclude_spam}"),
        )
    }

    /// A page of an account's transaction history.
    pub fn account_transactions(
        chain_id: &str,
        address: &str,
        offset: u32,
        limit: u32,
    ) -> CacheLocation {
        CacheLocation::new(
            format!("{chain_id}_transactions_{}", address.to_lowercase()),
            format!("{offset}_{limit}"),
        )
    }

    /// Oracle price of a token in one currency. Currency codes are
    /// case-insensitive upstream and are normalized to lowercase here.
    pub fn token_price(chain_id: &str, token_address: &str, currency: &str) -> CacheLocation {
        CacheLocation::new(
            format!("{chain_id}_token_price_{}", token_address.to_lowercase()),
            currency.to_lowercase(),
        )
    }

    /// Fixed-window rate limit counter for one client on one route. Plain
    /// key, not a hash: counters live beside the hash keyspace.
    pub fn rate_limit_counter(route: &str, method: &str, client: &str) -> String {
        format!("{COUNTER_KEY_PREFIX}{route}:{method}:{client}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_key() {
        let location = CacheRouter::chain("137");
        assert_eq!(location.key(), "137_chain");
        assert_eq!(location.field(), "");
    }

    #[test]
    fn test_chains_page_key() {
        let location = CacheRouter::chains(0, 20);
        assert_eq!(location.key(), "chains");
        assert_eq!(location.field(), "0_20");
    }

    #[test]
    fn test_balances_key_groups_variants_under_one_key() {
        let all = CacheRouter::account_balances("1", "0xAbC123", true, false);
        let filtered = CacheRouter::account_balances("1", "0xabc123", false, true);
        assert_eq!(all.key(), "1_balances_0xabc123");
        assert_eq!(all.key(), filtered.key());
        assert_eq!(all.field(), "true_false");
        assert_eq!(filtered.field(), "false_true");
    }

    #[test]
    fn test_transactions_page_key() {
        let location = CacheRouter::account_transactions("100", "0xDEAD", 40, 20);
        assert_eq!(location.key(), "100_transactions_0xdead");
        assert_eq!(location.field(), "40_20");
    }

    #[test]
    fn test_token_price_key_normalizes_currency() {
        let location = CacheRouter::token_price("1", "0xToken", "USD");
        assert_eq!(location.key(), "1_token_price_0xtoken");
        assert_eq!(location.field(), "usd");
    }

    #[test]
    fn test_rate_limit_counter_key() {
        assert_eq!(
            CacheRouter::rate_limit_counter("/v1/chains", "GET", "203.0.113.7"),
            "rate_limit:/v1/chains:GET:203.0.113.7"
        );
    }
}
