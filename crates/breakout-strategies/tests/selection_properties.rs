//! Property tests for breakout selection over computed averages.

use breakout_core::types::{Market, PriceRecord};
use breakout_indicators::MovingAverageEngine;
use breakout_strategies::{BreakoutConfig, BreakoutFilter};
use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

const DAYS: u64 = 12;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Complete daily histories for a handful of securities.
fn arb_history() -> impl Strategy<Value = Vec<PriceRecord>> {
    prop::collection::vec(prop::collection::vec(1i64..500, DAYS as usize), 1..8).prop_map(
        |securities| {
            securities
                .into_iter()
                .enumerate()
                .flat_map(|(s, closes)| {
                    let id = format!("{}", 1100 + s);
                    closes.into_iter().enumerate().map(move |(day, close)| {
                        PriceRecord::new(
                            id.clone(),
                            id.clone(),
                            Decimal::new(close, 1),
                            base() + Days::new(day as u64),
                            Market::Primary,
                        )
                    })
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn selection_ignores_row_order(records in arb_history(), seed in any::<u64>()) {
        let engine = MovingAverageEngine::new(&[2, 3, 5]).unwrap();
        let filter = BreakoutFilter::new(BreakoutConfig { windows: vec![2, 3, 5] }).unwrap();
        let date1 = base() + Days::new(DAYS - 2);
        let date2 = base() + Days::new(DAYS - 1);

        let rows = engine.compute(&records).value;
        let mut shuffled = rows.clone();
        let k = (seed as usize) % shuffled.len();
        shuffled.rotate_left(k);
        shuffled.reverse();

        prop_assert_eq!(
            filter.select(&rows, date1, date2).value,
            filter.select(&shuffled, date1, date2).value
        );
    }

    #[test]
    fn matches_satisfy_both_conditions(records in arb_history()) {
        let windows = vec![2, 4];
        let engine = MovingAverageEngine::new(&windows).unwrap();
        let filter = BreakoutFilter::new(BreakoutConfig { windows: windows.clone() }).unwrap();
        let date1 = base() + Days::new(DAYS - 2);
        let date2 = base() + Days::new(DAYS - 1);

        let outcome = filter.select(&engine.compute(&records).value, date1, date2).value;
        prop_assert!(!outcome.is_missing_reference());
        for m in outcome.matches() {
            for w in &windows {
                prop_assert!(m.before.close < m.before.averages[w]);
                prop_assert!(m.after.close > m.after.averages[w]);
            }
        }
    }
}
