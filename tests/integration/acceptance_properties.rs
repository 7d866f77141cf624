//! Property tests for the acceptance filter and batch evaluation

use chrono::{DateTime, Months, TimeZone, Utc};
use proptest::prelude::*;

use msr_sampler::sampling::{
    evaluate, evaluate_batch, AcceptanceFilter, BucketLayout, DecisionReason, FilterConfig,
    PartialBucketPolicy, RepositoryCandidate,
};

fn cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Instants between 1990-01-01 and the cutoff
fn arb_ts() -> impl Strategy<Value = DateTime<Utc>> {
    (631_152_000i64..1_704_067_200i64).prop_map(|s| DateTime::from_timestamp(s, 0).unwrap())
}

fn arb_history() -> impl Strategy<Value = Vec<DateTime<Utc>>> {
    proptest::collection::vec(arb_ts(), 1..400)
}

fn arb_config() -> impl Strategy<Value = FilterConfig> {
    (
        1u32..30,
        prop::sample::select(vec![1u32, 2, 3, 4, 6, 12]),
        1u32..10,
        any::<bool>(),
    )
        .prop_map(|(years, months, divisor, scaled)| FilterConfig {
            min_span_years: years,
            bucket_months: months,
            threshold_divisor: f64::from(divisor),
            partial_bucket: if scaled {
                PartialBucketPolicy::Scaled
            } else {
                PartialBucketPolicy::AsIs
            },
        })
}

fn steady(identifier: &str, first_year: i32) -> RepositoryCandidate {
    let timestamps = (first_year..2024)
        .flat_map(|year| (1..=12).map(move |month| Utc.with_ymd_and_hms(year, month, 10, 12, 0, 0).unwrap()))
        .collect();
    RepositoryCandidate::new(identifier, timestamps)
}

proptest! {
    #[test]
    fn decision_ignores_timestamp_order(
        (history, shuffled) in arb_history().prop_flat_map(|h| (Just(h.clone()), Just(h).prop_shuffle())),
        config in arb_config(),
    ) {
        let filter = AcceptanceFilter::new(config).unwrap();
        let a = filter.evaluate("p/q", &history, cutoff()).unwrap();
        let b = filter.evaluate("p/q", &shuffled, cutoff()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn evaluation_is_idempotent(history in arb_history(), config in arb_config()) {
        let filter = AcceptanceFilter::new(config).unwrap();
        let first = filter.evaluate("p/q", &history, cutoff()).unwrap();
        let second = filter.evaluate("p/q", &history, cutoff()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn short_histories_are_rejected_for_span(history in arb_history(), config in arb_config()) {
        let filter = AcceptanceFilter::new(config.clone()).unwrap();
        let decision = filter.evaluate("p/q", &history, cutoff()).unwrap();
        let first = *history.iter().min().unwrap();
        let required = first.checked_add_months(Months::new(config.min_span_years * 12)).unwrap();

        if required > cutoff() {
            prop_assert_eq!(decision.reason, DecisionReason::InsufficientSpan);
            prop_assert!(!decision.accepted);
        } else {
            prop_assert_ne!(decision.reason, DecisionReason::InsufficientSpan);
        }
    }

    #[test]
    fn accepted_means_every_bucket_meets_threshold(history in arb_history(), config in arb_config()) {
        let filter = AcceptanceFilter::new(config.clone()).unwrap();
        let decision = filter.evaluate("p/q", &history, cutoff()).unwrap();
        prop_assume!(decision.reason != DecisionReason::InsufficientSpan);

        let first = *history.iter().min().unwrap();
        let layout = BucketLayout::covering(first, cutoff(), config.bucket_months).unwrap();
        let counts = layout.count(&history);
        let threshold = decision.threshold.unwrap();
        prop_assert_eq!(counts.iter().sum::<usize>(), history.len());
        prop_assert_eq!(decision.bucket_count, layout.len());

        if config.partial_bucket == PartialBucketPolicy::AsIs {
            let earliest_low = counts.iter().position(|&c| (c as f64) < threshold);
            match earliest_low {
                None => prop_assert!(decision.accepted),
                Some(index) => {
                    prop_assert_eq!(decision.reason, DecisionReason::LowActivityInterval);
                    let failing = decision.failing_bucket.unwrap();
                    prop_assert_eq!(failing.start, layout.nominal_bounds(index).unwrap().0);
                    prop_assert_eq!(failing.count, counts[index]);
                }
            }
        }
    }

    #[test]
    fn buckets_partition_the_window(first in arb_ts(), months in prop::sample::select(vec![1u32, 3, 6, 12])) {
        let layout = BucketLayout::covering(first, cutoff(), months).unwrap();
        let buckets = layout.buckets(&vec![0; layout.len()]);
        prop_assert!(!buckets.is_empty());
        prop_assert!(buckets[0].start <= first);
        prop_assert_eq!(buckets.last().unwrap().end, cutoff());
        for pair in buckets.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
            prop_assert!(pair[0].start < pair[0].end);
        }
    }

    #[test]
    fn batch_outcome_ignores_candidate_order(
        order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let pool = [
            steady("a/old", 1995),
            steady("b/new", 2012),
            steady("c/old", 2000),
            RepositoryCandidate::new("d/empty", Vec::new()),
            steady("e/old", 1990),
            steady("f/new", 2020),
        ];
        let shuffled: Vec<RepositoryCandidate> = order.iter().map(|&i| pool[i].clone()).collect();

        let filter = AcceptanceFilter::default();
        let expected = evaluate_batch(&filter, &pool, cutoff()).unwrap();
        let outcome = evaluate_batch(&filter, &shuffled, cutoff()).unwrap();
        prop_assert_eq!(&outcome.decisions, &expected.decisions);
        prop_assert_eq!(outcome.accepted("x"), expected.accepted("x"));
    }
}

#[test]
fn uniform_history_is_accepted() {
    let decision = evaluate("apache/steady", steady("x/y", 2000).timestamps(), cutoff()).unwrap();
    assert!(decision.accepted);
    assert_eq!(decision.reason, DecisionReason::Accepted);
    assert_eq!(decision.bucket_count, 48);
}

#[test]
fn silent_half_year_is_rejected_at_its_start() {
    let timestamps: Vec<DateTime<Utc>> = steady("x/y", 2000)
        .timestamps()
        .iter()
        .copied()
        .filter(|ts| !(*ts >= Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap()
            && *ts < Utc.with_ymd_and_hms(2013, 7, 1, 0, 0, 0).unwrap()))
        .collect();
    let decision = evaluate("gnu/gap", &timestamps, cutoff()).unwrap();

    assert_eq!(decision.reason, DecisionReason::LowActivityInterval);
    let failing = decision.failing_bucket.unwrap();
    assert_eq!(failing.start, Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(failing.count, 0);
}

#[test]
fn young_repository_is_rejected_for_span() {
    let decision = evaluate("new/kid", steady("x/y", 2018).timestamps(), cutoff()).unwrap();
    assert_eq!(decision.reason, DecisionReason::InsufficientSpan);
    assert!(!decision.accepted);
    assert!(decision.failing_bucket.is_none());
}

#[test]
fn accepted_list_is_sorted_and_excludes_rejections() {
    let candidates = vec![
        steady("zeta/old", 1999),
        steady("alpha/old", 2001),
        steady("mid/young", 2019),
    ];
    let outcome = evaluate_batch(&AcceptanceFilter::default(), &candidates, cutoff()).unwrap();
    let accepted = outcome.accepted("accepted");
    assert_eq!(accepted.entries(), ["alpha/old".to_string(), "zeta/old".to_string()]);
}
