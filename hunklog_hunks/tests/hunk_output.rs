use hunklog_hunks::{HunkOptions, Span, build_stats, format_hunks, generate_hunks};
use serde_json::Value;

fn numbered_lines(range: std::ops::RangeInclusive<usize>) -> String {
    range.map(|n| format!("line {n}\n")).collect()
}

#[test]
fn diff_body_concatenates_hunks_in_order() {
    let spans = vec![
        Span::delete("old head\n"),
        Span::insert("new head\n"),
        Span::equal(numbered_lines(2..=20)),
        Span::delete("old tail\n"),
        Span::insert("new tail\n"),
    ];

    let body = format_hunks(&spans, HunkOptions::default()).expect("diff body");

    let first = body.find("@@ -1,4 +1,4 @@").expect("first header");
    let second = body.find("@@ -18,4 +18,4 @@").expect("second header");
    assert!(first < second);
    assert!(body.ends_with("-old tail\n+new tail\n"));
}

#[test]
fn rendered_scenario_matches_expected_text() {
    // Old file lines 1-10, line 5 replaced, default context.
    let spans = vec![
        Span::equal(numbered_lines(1..=4)),
        Span::delete("foo\n"),
        Span::insert("bar\n"),
        Span::equal(numbered_lines(6..=10)),
    ];

    let hunks = generate_hunks(&spans, HunkOptions::default()).expect("hunks");
    assert_eq!(hunks.len(), 1);
    assert_eq!(hunks[0].old_start, 2);
    assert_eq!(hunks[0].new_start, 2);
    assert_eq!(hunks[0].old_count, 7);
    assert_eq!(hunks[0].new_count, 7);
}

#[test]
fn hunk_json_shape_contract() {
    let spans = vec![
        Span::equal(numbered_lines(1..=4)),
        Span::delete("foo\n"),
        Span::insert("bar\n"),
        Span::equal(numbered_lines(6..=10)),
    ];

    let hunks = generate_hunks(&spans, HunkOptions::default()).expect("hunks");
    let value = serde_json::to_value(&hunks).expect("serialize hunks");

    let list = value.as_array().expect("hunk list");
    assert_eq!(list.len(), 1);

    let hunk = list[0].as_object().expect("hunk object");
    for key in [
        "old_start",
        "new_start",
        "old_count",
        "new_count",
        "anchor",
        "operations",
    ] {
        assert!(hunk.contains_key(key), "missing key: {key}");
    }

    let operations = hunk
        .get("operations")
        .and_then(Value::as_array)
        .expect("operations array");
    let kinds: Vec<&str> = operations
        .iter()
        .filter_map(|op| op.get("kind").and_then(Value::as_str))
        .collect();
    assert!(kinds.contains(&"equal"));
    assert!(kinds.contains(&"delete"));
    assert!(kinds.contains(&"insert"));
}

#[test]
fn stats_summarize_the_whole_hunk_list() {
    let spans = vec![
        Span::delete("a\nb\nc\n"),
        Span::insert("d\n"),
        Span::equal(numbered_lines(4..=20)),
        Span::insert("tail one\ntail two\n"),
    ];

    let hunks = generate_hunks(&spans, HunkOptions::default()).expect("hunks");
    let stats = build_stats(&hunks);

    assert_eq!(stats.hunks, 2);
    assert_eq!(stats.deleted_lines, 3);
    assert_eq!(stats.inserted_lines, 3);

    let value = serde_json::to_value(stats).expect("serialize stats");
    assert_eq!(value["hunks"], 2);
    assert_eq!(value["inserted_lines"], 3);
    assert_eq!(value["deleted_lines"], 3);
}
