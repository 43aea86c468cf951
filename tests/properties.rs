//! Property tests for list-to-row expansion.
//!
mod common;
use common::*;
use proptest::prelude::*;
use proptest::test_runner::Config;

fn cell_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9<>&一-龥][a-zA-Z0-9 <>&一-龥]{0,11}"
}

proptest! {
    #![proptest_config(Config::with_cases(32))]

    #[test]
    fn rows_follow_input_order(
        seeds in prop::collection::vec(cell_text(), 0..10),
        intent in cell_text(),
    ) {
        let names: Vec<String> = seeds
            .iter()
            .enumerate()
            .map(|(i, seed)| format!("{}#{}", seed, i))
            .collect();
        let activities: Vec<ActivityRow> = names
            .iter()
            .map(|name| (name.as_str(), "讲解", "练习", intent.as_str()))
            .collect();

        let document = default_processor()
            .render(&valid_data(&payload_with_activities(&activities)))
            .expect("render succeeds");
        let rendered: Vec<String> = activity_rows(document.bytes())
            .into_iter()
            .map(|row| row[0].clone())
            .collect();
        prop_assert_eq!(rendered, names);
    }

    #[test]
    fn changing_one_intent_changes_one_cell(
        count in 1usize..6,
        pick in any::<prop::sample::Index>(),
        replacement in cell_text(),
    ) {
        let target = pick.index(count);
        let names: Vec<String> = (0..count).map(|i| format!("环节{}", i)).collect();
        let intents: Vec<String> = (0..count).map(|i| format!("意图{}", i)).collect();
        let mut changed = intents.clone();
        changed[target] = format!("{}!", replacement);

        let build = |intents: &[String]| {
            let activities: Vec<ActivityRow> = names
                .iter()
                .zip(intents)
                .map(|(name, intent)| (name.as_str(), "讲解", "练习", intent.as_str()))
                .collect();
            let document = default_processor()
                .render(&valid_data(&payload_with_activities(&activities)))
                .expect("render succeeds");
            activity_rows(document.bytes())
        };

        let before = build(&intents);
        let after = build(&changed);
        prop_assert_eq!(before.len(), count);
        prop_assert_eq!(after.len(), count);
        for (i, (old, new)) in before.iter().zip(&after).enumerate() {
            for (column, (a, b)) in old.iter().zip(new).enumerate() {
                if i == target && column == 3 {
                    prop_assert_ne!(a, b);
                    prop_assert_eq!(b, &changed[target]);
                } else {
                    prop_assert_eq!(a, b);
                }
            }
        }
    }
}
