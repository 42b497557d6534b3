/// Token merging - deduplicates provider observations by address
use crate::tokens::types::TokenRecord;
use std::collections::{hash_map::Entry, HashMap};

/// Fold `incoming` into `target` (same token, later provider)
///
/// Identity and market cap stay with the first observation. Volume, liquidity
/// and transaction count keep the maximum. Momentum, price and protocol take
/// the later value when it carries one.
pub fn merge_token_record(target: &mut TokenRecord, incoming: TokenRecord) {
    target.volume_sol = target.volume_sol.max(incoming.volume_sol);
    target.liquidity_sol = target.liquidity_sol.max(incoming.liquidity_sol);
    target.transaction_count = target.transaction_count.max(incoming.transaction_count);

    target.price_1hr_change = incoming.price_1hr_change;
    if incoming.price_24hr_change.is_some() {
        target.price_24hr_change = incoming.price_24hr_change;
    }
    if incoming.price_7d_change.is_some() {
        target.price_7d_change = incoming.price_7d_change;
    }

    if incoming.price_sol > 0.0 {
        target.price_sol = incoming.price_sol;
    }

    if !incoming.protocol.is_empty() {
        target.protocol = incoming.protocol;
    }

    for source in &incoming.sources {
        target.add_source(source);
    }

    target.last_updated = target.last_updated.max(incoming.last_updated);
}

/// Collapse observations into one record per lower-cased address
///
/// Output order follows the first appearance of each address. Records with an
/// empty address are dropped.
pub fn merge_records<I>(observations: I, now_ms: i64) -> Vec<TokenRecord>
where
    I: IntoIterator<Item = TokenRecord>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<TokenRecord> = Vec::new();

    for record in observations {
        if record.token_address.trim().is_empty() {
            continue;
        }

        match index.entry(record.normalized_address()) {
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                let mut record = record;
                record.last_updated = now_ms;
                merged.push(record);
            }
            Entry::Occupied(slot) => {
                let target = &mut merged[*slot.get()];
                merge_token_record(target, record);
                target.last_updated = now_ms;
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::types::fixtures::record;
    use crate::tokens::types::{SOURCE_DEXSCREENER, SOURCE_GECKOTERMINAL};

    #[test]
    fn test_union_of_sources_and_max_of_volumes() {
        let mut first = record("Mint1", SOURCE_DEXSCREENER);
        first.volume_sol = 1000.0;
        first.liquidity_sol = 10.0;
        first.transaction_count = 40;
        first.market_cap_sol = 5000.0;

        let mut second = record("Mint1", SOURCE_GECKOTERMINAL);
        second.volume_sol = 1500.0;
        second.liquidity_sol = 5.0;
        second.transaction_count = 10;
        second.market_cap_sol = 9000.0;

        let merged = merge_records(vec![first, second], 42);
        assert_eq!(merged.len(), 1);

        let token = &merged[0];
        assert_eq!(token.volume_sol, 1500.0);
        assert_eq!(token.liquidity_sol, 10.0);
        assert_eq!(token.transaction_count, 40);
        assert_eq!(token.market_cap_sol, 5000.0);
        assert_eq!(token.sources, vec![SOURCE_DEXSCREENER, SOURCE_GECKOTERMINAL]);
        assert_eq!(token.last_updated, 42);
    }

    #[test]
    fn test_case_insensitive_dedup() {
        let merged = merge_records(
            vec![
                record("A", SOURCE_DEXSCREENER),
                record("a", SOURCE_GECKOTERMINAL),
                record("B", SOURCE_DEXSCREENER),
            ],
            0,
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].token_address, "A");
        assert_eq!(merged[0].sources.len(), 2);
        assert_eq!(merged[1].token_address, "B");
    }

    #[test]
    fn test_later_observation_overwrites_present_fields() {
        let mut first = record("Mint1", SOURCE_DEXSCREENER);
        first.token_name = "First".to_string();
        first.price_sol = 0.5;
        first.price_1hr_change = 3.0;
        first.price_24hr_change = Some(12.0);
        first.price_7d_change = Some(40.0);
        first.protocol = "raydium".to_string();

        let mut second = record("MINT1", SOURCE_GECKOTERMINAL);
        second.token_name = "Second".to_string();
        second.price_sol = 0.0;
        second.price_1hr_change = 0.0;
        second.price_24hr_change = Some(0.0);
        second.price_7d_change = None;
        second.protocol = "GeckoTerminal".to_string();

        let merged = merge_records(vec![first, second], 0);
        let token = &merged[0];
        assert_eq!(token.token_name, "First");
        assert_eq!(token.price_sol, 0.5);
        assert_eq!(token.price_1hr_change, 0.0);
        assert_eq!(token.price_24hr_change, Some(0.0));
        assert_eq!(token.price_7d_change, Some(40.0));
        assert_eq!(token.protocol, "GeckoTerminal");
    }

    #[test]
    fn test_empty_addresses_are_dropped() {
        let merged = merge_records(vec![record("", SOURCE_DEXSCREENER), record("x", SOURCE_DEXSCREENER)], 0);
        assert_eq!(merged.len(), 1);
    }
}
