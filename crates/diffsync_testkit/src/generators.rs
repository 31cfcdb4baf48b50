//! Property-based test generators.

use proptest::prelude::*;

/// Strategy for document contents: printable text with newlines, empty
/// included.
pub fn document_content() -> impl Strategy<Value = String> {
    proptest::string::string_regex("([ -~]{0,40}\n){0,8}[ -~]{0,40}")
        .expect("valid content regex")
}

/// Strategy for an edited version of existing content.
///
/// Produces a mutation a real editor could make: append, prepend,
/// truncation, or replacement.
pub fn edit_of(content: String) -> impl Strategy<Value = String> {
    let len = content.chars().count();
    prop_oneof![
        // append
        "[ -~]{1,20}".prop_map({
            let content = content.clone();
            move |suffix| format!("{content}{suffix}")
        }),
        // prepend
        "[ -~]{1,20}".prop_map({
            let content = content.clone();
            move |prefix| format!("{prefix}{content}")
        }),
        // truncate
        (0..=len).prop_map({
            let content = content.clone();
            move |keep| -> String { content.chars().take(keep).collect() }
        }),
        // replace outright
        "[ -~]{0,40}",
    ]
}

/// Strategy for relative document paths: one to three segments, forward
/// slashes.
pub fn rel_path() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z][a-z0-9]{0,7}", 1..=3)
        .prop_map(|segments| format!("{}.txt", segments.join("/")))
}

/// Strategy for client identifiers.
pub fn client_id() -> impl Strategy<Value = String> {
    "[a-z]{2,8}"
}
