//! Property-based tests for path containment and pointer tokens.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use std::path::{Path, PathBuf};

    use crate::path::{is_within_root, normalize, resolve_include_path};
    use crate::pointer;
    use proptest::prelude::*;

    // ============================================================================
    // normalize property tests
    // ============================================================================

    proptest! {
        /// Property: normalize is idempotent
        #[test]
        fn normalize_is_idempotent(segments in prop::collection::vec("[a-z]{1,4}|\\.|\\.\\.", 0..8)) {
            let path = PathBuf::from(format!("/{}", segments.join("/")));
            let once = normalize(&path);
            let twice = normalize(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: normalized absolute paths never contain `.` or `..`
        #[test]
        fn normalize_removes_dot_segments(segments in prop::collection::vec("[a-z]{1,4}|\\.|\\.\\.", 0..8)) {
            let path = PathBuf::from(format!("/{}", segments.join("/")));
            let result = normalize(&path);
            let text = result.to_string_lossy();
            prop_assert!(result.is_absolute());
            for part in text.split('/') {
                prop_assert!(part != "." && part != "..", "{} still has dot segments", text);
            }
        }
    }

    // ============================================================================
    // containment property tests
    // ============================================================================

    proptest! {
        /// Property: a root always contains itself and its plain children
        #[test]
        fn root_contains_children(child in "[a-z]{1,8}(/[a-z]{1,8}){0,3}") {
            let root = Path::new("/repo");
            prop_assert!(is_within_root(root, root));
            prop_assert!(is_within_root(root, &root.join(&child)));
        }

        /// Property: a sibling sharing the root as a name prefix is outside
        #[test]
        fn sibling_prefix_is_outside(suffix in "[a-z]{1,8}") {
            let root = Path::new("/repo");
            let sibling = PathBuf::from(format!("/repo{}", suffix));
            prop_assert!(!is_within_root(root, &sibling));
        }

        /// Property: a resolved directive path is either inside the root or an error
        #[test]
        fn resolved_include_stays_in_root(
            include in "(/)?(\\.\\./|[a-z]{1,4}/){0,5}[a-z]{1,4}\\.yaml",
        ) {
            let root = Path::new("/repo");
            let context = Path::new("/repo/a/b/item.yaml");
            if let Ok(resolved) = resolve_include_path(root, &include, context) {
                prop_assert!(is_within_root(root, &resolved));
            }
        }
    }

    // ============================================================================
    // pointer token property tests
    // ============================================================================

    proptest! {
        /// Property: escaping a token then parsing it yields the token back
        #[test]
        fn escaped_token_parses_back(token in ".*") {
            let pointer = format!("/{}", pointer::escape(&token));
            let tokens = pointer::parse(&pointer).unwrap();
            prop_assert_eq!(tokens, vec![token]);
        }

        /// Property: a value written at a fresh key can be read back
        #[test]
        fn set_relative_then_get(keys in prop::collection::vec("[a-z~/]{1,6}", 1..4), n in any::<i64>()) {
            let pointer: String = keys.iter().map(|k| format!("/{}", pointer::escape(k))).collect();
            let mut doc = serde_json::json!({});
            pointer::set_relative(&mut doc, &pointer, serde_json::json!(n)).unwrap();
            prop_assert_eq!(pointer::get(&doc, &pointer).unwrap(), Some(&serde_json::json!(n)));
        }
    }
}
