use dcf_core::model::decode_report;
use proptest::prelude::*;
use serde_json::{Value, json};

fn function_json() -> impl Strategy<Value = (Value, u32, bool)> {
    (
        "[a-z_][a-z0-9_]{0,12}",
        "/[a-z]{1,8}/[a-z]{1,8}\\.py",
        1u32..5000,
        0u32..6,
        proptest::option::of(("/[a-z]{1,8}\\.py", 1u32..5000)),
    )
        .prop_map(|(name, file, line, usage_count, last)| {
            let mut value = json!({
                "name": name,
                "file": file,
                "line": line,
                "usage_count": usage_count,
            });
            if let Some((last_file, last_line)) = &last {
                value["last_used"] = json!({ "file": last_file, "line": last_line });
            }
            (value, usage_count, last.is_some())
        })
}

proptest! {
    #[test]
    fn decoded_records_respect_usage_invariant(
        functions in proptest::collection::vec(function_json(), 0..20)
    ) {
        let input: Vec<Value> = functions.iter().map(|(v, _, _)| v.clone()).collect();
        let bytes = serde_json::to_vec(&json!({ "functions": input, "commented_code": [] })).unwrap();

        let report = decode_report(&bytes).unwrap();
        prop_assert_eq!(report.functions.len(), functions.len());

        for (record, (_, usage_count, had_last)) in report.functions.iter().zip(&functions) {
            prop_assert_eq!(record.usage_count, *usage_count);
            // An unused function never carries a last-use site.
            if record.usage_count == 0 {
                prop_assert!(record.last_used.is_none());
            } else {
                prop_assert_eq!(record.last_used.is_some(), *had_last);
            }
            if let Some(site) = &record.last_used {
                prop_assert!(record.usage_count > 0);
                prop_assert!(site.line >= 1);
            }
        }
    }

    #[test]
    fn arbitrary_text_never_panics(input in ".{0,200}") {
        let _ = decode_report(input.as_bytes());
    }
}
