/// Filtering and sorting over an aggregated token set
use crate::tokens::types::{
    momentum_for_period, FilterParams, SortDirection, TokenRecord, TokenSortKey,
};
use std::cmp::Ordering;

/// Apply the conjunctive thresholds, then a stable sort
pub fn filter_and_sort(records: &[TokenRecord], filters: &FilterParams) -> Vec<TokenRecord> {
    let mut items: Vec<&TokenRecord> = records.iter().collect();

    if let Some(min) = filters.min_volume {
        items.retain(|t| t.volume_sol >= min);
    }
    if let Some(min) = filters.min_market_cap {
        items.retain(|t| t.market_cap_sol >= min);
    }

    sort_tokens(&mut items, filters);
    items.into_iter().cloned().collect()
}

fn sort_tokens(items: &mut [&TokenRecord], filters: &FilterParams) {
    let ascending = matches!(filters.sort_order, SortDirection::Asc);
    let period = filters.time_period;

    // slice::sort_by is stable, equal keys keep input order
    items.sort_by(|a, b| {
        let ordering = match filters.sort_by {
            TokenSortKey::Volume => cmp_f64(a.volume_sol, b.volume_sol),
            TokenSortKey::MarketCap => cmp_f64(a.market_cap_sol, b.market_cap_sol),
            TokenSortKey::Liquidity => cmp_f64(a.liquidity_sol, b.liquidity_sol),
            TokenSortKey::PriceChange => cmp_f64(
                momentum_for_period(a, period),
                momentum_for_period(b, period),
            ),
        };

        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

fn cmp_f64(lhs: f64, rhs: f64) -> Ordering {
    lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal)
}
