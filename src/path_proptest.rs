//! Property-based tests for key path parsing.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::error::Error;
    use crate::path::{KeyPath, Step};
    use proptest::prelude::*;

    /// A canonical segment: a key followed by zero to two index suffixes.
    fn segment() -> impl Strategy<Value = String> {
        (
            "[a-zA-Z_][a-zA-Z0-9_-]{0,8}",
            prop::collection::vec(0usize..1000, 0..3),
        )
            .prop_map(|(name, indices)| {
                let mut s = name;
                for idx in indices {
                    s.push_str(&format!("[{}]", idx));
                }
                s
            })
    }

    fn canonical_path() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 1..6).prop_map(|segments| segments.join("."))
    }

    proptest! {
        /// Property: canonical paths survive parse-then-display unchanged
        #[test]
        fn canonical_paths_round_trip(path in canonical_path()) {
            let parsed = KeyPath::parse(&path).unwrap();
            prop_assert_eq!(parsed.to_string(), path);
        }

        /// Property: the first step is always a key
        #[test]
        fn first_step_is_key(path in canonical_path()) {
            let parsed = KeyPath::parse(&path).unwrap();
            prop_assert!(matches!(parsed.steps()[0], Step::Key(_)));
        }

        /// Property: the number of key steps equals the number of dot-separated segments
        #[test]
        fn key_steps_match_segments(path in canonical_path()) {
            let parsed = KeyPath::parse(&path).unwrap();
            let keys = parsed.steps().iter().filter(|s| matches!(s, Step::Key(_))).count();
            prop_assert_eq!(keys, path.split('.').count());
        }

        /// Property: parsing never panics, it either succeeds or reports a syntax error
        #[test]
        fn parse_never_panics(input in ".*") {
            match KeyPath::parse(&input) {
                Ok(path) => prop_assert!(!path.is_empty()),
                Err(err) => {
                    let is_syntax_error = matches!(err, Error::InvalidPathSyntax { .. });
                    prop_assert!(is_syntax_error);
                }
            }
        }

        /// Property: a doubled dot is always rejected
        #[test]
        fn empty_segment_rejected(a in segment(), b in segment()) {
            let path = format!("{}..{}", a, b);
            prop_assert!(KeyPath::parse(&path).is_err());
        }
    }
}
