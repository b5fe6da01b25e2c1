//! Property tests for the numeric core: resolver bounds, baseline spread,
//! severity tiers and grading boundaries.

mod common;

use billpulse::domain::baseline::{BaselineStats, compute_baseline, horizon_changes};
use billpulse::domain::deviation::{Severity, classify};
use billpulse::domain::event::Label;
use billpulse::domain::grader::{Correctness, grade};
use billpulse::domain::price_series::{PricePoint, PriceSeries};
use billpulse::domain::resolver::{Direction, resolve};
use chrono::Duration;
use common::*;
use proptest::prelude::*;

fn baseline(mean: f64, std: f64) -> BaselineStats {
    BaselineStats {
        ticker: "XLV".into(),
        mean_change: mean,
        std_change: std,
        sample_size: 100,
        horizon_days: 30,
    }
}

proptest! {
    #[test]
    fn baseline_std_is_never_negative(
        closes in prop::collection::vec(1.0f64..1000.0, 2..120),
        horizon in 1usize..40,
    ) {
        let points = weekday_points(date(2020, 1, 1), closes.len(), |i| closes[i]);
        let series = PriceSeries::new("XLV", points);
        match compute_baseline(&series, horizon) {
            Ok(stats) => {
                prop_assert!(stats.std_change >= 0.0);
                prop_assert_eq!(stats.sample_size, closes.len() - horizon);
            }
            Err(_) => prop_assert!(closes.len() < horizon + 1),
        }
    }

    #[test]
    fn std_is_zero_exactly_when_all_changes_agree(
        moves in prop::collection::vec(-20.0f64..20.0, 2..80),
        repeat_first in any::<bool>(),
        horizon in 1usize..5,
    ) {
        // Compounding one move over every step gives identical changes up to
        // rounding; otherwise the moves are used as drawn.
        let mut closes = vec![100.0];
        for m in &moves {
            let step = if repeat_first { moves[0] } else { *m };
            let last = closes[closes.len() - 1];
            closes.push(last * (1.0 + step / 100.0));
        }
        prop_assume!(closes.len() > horizon);

        let series = PriceSeries::new(
            "XLF",
            weekday_points(date(2020, 1, 1), closes.len(), |i| closes[i]),
        );
        let changes = horizon_changes(&series, horizon).unwrap();
        let stats = compute_baseline(&series, horizon).unwrap();

        let all_equal = changes.iter().all(|c| *c == changes[0]);
        if all_equal {
            prop_assert_eq!(stats.std_change, 0.0);
        } else {
            prop_assert!(stats.std_change > 0.0);
        }
    }

    #[test]
    fn resolver_stays_inside_bound(
        offsets in prop::collection::btree_set(-60i64..60, 0..20),
        max_offset in 0u32..45,
        backward in any::<bool>(),
    ) {
        let anchor = date(2024, 6, 15);
        let points: Vec<_> = offsets
            .iter()
            .map(|o| PricePoint { date: anchor + Duration::days(*o), close: 10.0 })
            .collect();
        let series = PriceSeries::new("XLK", points);
        let direction = if backward { Direction::Backward } else { Direction::Forward };

        let bound = i64::from(max_offset);
        let expected = if backward {
            offsets.iter().rev().copied().find(|o| (-bound..=-1).contains(o))
        } else {
            offsets.iter().copied().find(|o| (0..=bound).contains(o))
        };

        let resolved = resolve(&series, anchor, direction, max_offset);
        prop_assert_eq!(resolved, expected.map(|o| anchor + Duration::days(o)));
    }

    #[test]
    fn severity_is_monotonic_in_distance_from_mean(
        mean in -5.0f64..5.0,
        std in 0.1f64..10.0,
        a in 0.0f64..50.0,
        b in 0.0f64..50.0,
    ) {
        let stats = baseline(mean, std);
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        let (z_near, sev_near) = classify(mean + near, &stats).unwrap();
        let (z_far, sev_far) = classify(mean - far, &stats).unwrap();
        prop_assert!(z_near >= 0.0);
        prop_assert!(z_far <= 0.0);
        prop_assert!(z_near.abs() <= z_far.abs() + 1e-9);
        prop_assert!(sev_near <= sev_far || (z_far.abs() - z_near.abs()).abs() < 1e-9);
    }

    #[test]
    fn grading_matches_threshold_partition(
        pct in -20.0f64..20.0,
        threshold in 0.0f64..10.0,
    ) {
        let pos = grade(Label::Positive, pct, threshold) == Correctness::Correct;
        let neg = grade(Label::Negative, pct, threshold) == Correctness::Correct;
        let neu = grade(Label::Neutral, pct, threshold) == Correctness::Correct;
        // Exactly one label is correct for any move.
        prop_assert_eq!([pos, neg, neu].iter().filter(|hit| **hit).count(), 1);
    }
}

#[test]
fn severity_boundaries_fall_into_lower_tier() {
    let stats = baseline(0.0, 1.0);
    assert_eq!(classify(1.0, &stats).unwrap().1, Severity::NormalRange);
    assert_eq!(classify(-2.0, &stats).unwrap().1, Severity::ModerateAnomaly);
    assert_eq!(classify(2.0001, &stats).unwrap().1, Severity::MajorAnomaly);
}
