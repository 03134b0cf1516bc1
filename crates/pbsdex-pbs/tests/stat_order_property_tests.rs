use pbsdex_pbs::coerce::dedupe_keep_order;
use pbsdex_pbs::stats::{StatKey, StatOrder};
use proptest::prelude::*;

fn stat_order() -> impl Strategy<Value = StatOrder> {
    Just(StatKey::ALL.to_vec()).prop_shuffle().prop_map(|keys| {
        let keys: [StatKey; 6] = keys.try_into().expect("six keys");
        StatOrder::new(keys).expect("permutation")
    })
}

fn token() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-C]{1,2}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn stat_mapping_round_trips(order in stat_order(), values in any::<[i32; 6]>()) {
        let values = values.map(i64::from);
        let block = order.map_vector(values);
        prop_assert_eq!(order.map_back(&block), values);
    }

    #[test]
    fn stat_order_display_parses_back(order in stat_order()) {
        let reparsed = StatOrder::parse(&order.to_string()).unwrap();
        prop_assert_eq!(reparsed, order);
    }

    #[test]
    fn base_stats_reads_every_slot(order in stat_order(), values in any::<[u16; 6]>()) {
        let csv = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
        let block = order.base_stats(&csv);
        prop_assert_eq!(order.map_back(&block), values.map(i64::from));
    }

    #[test]
    fn effort_values_always_have_six_slots(order in stat_order(), values in proptest::collection::vec(0u8..=252, 0..10)) {
        let csv = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
        let block = order.effort_values(&csv);
        prop_assert_eq!(block.iter().count(), 6);
        let expected: i64 = values.iter().take(6).map(|&v| i64::from(v)).sum();
        prop_assert_eq!(block.total(), expected);
    }

    #[test]
    fn dedupe_is_idempotent(items in proptest::collection::vec(token(), 0..20)) {
        let once = dedupe_keep_order(&items);
        prop_assert_eq!(dedupe_keep_order(&once), once.clone());
    }

    #[test]
    fn dedupe_is_an_ordered_subsequence_of_distinct_items(items in proptest::collection::vec(token(), 0..20)) {
        let out = dedupe_keep_order(&items);

        let mut rest = items.iter();
        for kept in &out {
            prop_assert!(rest.any(|item| item == kept));
        }
        for (i, a) in out.iter().enumerate() {
            prop_assert!(!out[i + 1..].contains(a));
        }
        for item in &items {
            prop_assert!(out.contains(item));
        }
    }
}
