//! Helpers for chaining `Result`/`Option` values through the dispatch path.
//!
//! Expected failures are values here: argument-count and lookup checks hand
//! back a `CommandError` for the caller to route to the sink.

use std::collections::BTreeMap;

use crate::error::CommandError;

/// Partition outcomes into successes and failures, keeping the original order
/// within each side.
pub fn split_outcomes<T, E>(outcomes: impl IntoIterator<Item = Result<T, E>>) -> (Vec<T>, Vec<E>) {
    let mut oks = Vec::new();
    let mut errs = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(v) => oks.push(v),
            Err(e) => errs.push(e),
        }
    }
    (oks, errs)
}

/// Require exactly `expected` arguments for `command`.
pub fn assert_num_args<'a>(
    expected: usize,
    arguments: &'a [String],
    command: &str,
) -> Result<&'a [String], CommandError> {
    if arguments.len() == expected {
        Ok(arguments)
    } else {
        Err(CommandError::ArgumentCount {
            command: command.to_string(),
            expected,
            actual: arguments.to_vec(),
        })
    }
}

/// Require `key` to be present in `entries`, handing back its value so the
/// check can sit in the middle of a combinator chain.
pub fn assert_exists<'m, V>(entries: &'m BTreeMap<String, V>, key: &str) -> Result<&'m V, CommandError> {
    entries
        .get(key)
        .ok_or_else(|| CommandError::UnknownDiscovery {
            target: key.to_string(),
            known: entries.keys().cloned().collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn split_keeps_order_on_both_sides() {
        let outcomes: Vec<Result<u8, &str>> = vec![Ok(1), Err("a"), Ok(2), Err("b"), Ok(3)];
        let (oks, errs) = split_outcomes(outcomes);
        assert_eq!(oks, vec![1, 2, 3]);
        assert_eq!(errs, vec!["a", "b"]);
    }

    #[rstest]
    #[case(&[], false)]
    #[case(&["lights"], true)]
    #[case(&["a", "b"], false)]
    fn num_args_exactly_one(#[case] given: &[&str], #[case] ok: bool) {
        let given = args(given);
        let res = assert_num_args(1, &given, "discover");
        assert_eq!(res.is_ok(), ok);
        if let Err(CommandError::ArgumentCount {
            command,
            expected,
            actual,
        }) = res
        {
            assert_eq!(command, "discover");
            assert_eq!(expected, 1);
            assert_eq!(actual, given);
        }
    }

    #[test]
    fn exists_short_circuits_chain() {
        let known = BTreeMap::from([("groups".to_string(), 2), ("lights".to_string(), 6)]);
        let hit = assert_exists(&known, "lights").map(|v| v * 2);
        assert_eq!(hit, Ok(12));

        let mut called = false;
        let miss = assert_exists(&known, "nope").map(|v| {
            called = true;
            *v
        });
        assert!(!called, "map must be skipped after a failure");
        assert!(matches!(
            miss,
            Err(CommandError::UnknownDiscovery { ref target, ref known })
                if target == "nope" && known == &["groups", "lights"]
        ));
    }
}
