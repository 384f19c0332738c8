//! Ordered evaluation of match-pattern expressions against group names
//!
//! A pattern expression is a `,`/`:`-delimited list of sub-patterns with
//! Ansible-style semantics: bare names include, `&` intersects, `!` excludes.
//! Only the reduced subset the inventory actually uses is supported:
//! literals, `*` wildcards, and `~`-prefixed regular expressions. Subscript
//! ranges and host-list expansion are out of scope; such syntax falls through
//! to a literal (non-matching) comparison.

use regex::RegexBuilder;

/// Group names matched by `expr` out of `known`, as an ordered set
///
/// Sub-patterns are re-bucketed into a fixed evaluation order (regular, then
/// intersection, then exclusion) regardless of their position in the
/// expression. The fixed order is load-bearing: exclusions always apply after
/// inclusions, and intersections narrow before exclusions remove.
pub fn matching_groups(expr: &str, known: &[String]) -> Vec<String> {
    let mut regular = Vec::new();
    let mut intersection = Vec::new();
    let mut exclude = Vec::new();

    for sub in expr.split([',', ':']) {
        if sub.starts_with('!') {
            exclude.push(sub);
        } else if sub.starts_with('&') {
            intersection.push(sub);
        } else {
            regular.push(sub);
        }
    }

    let mut matches: Vec<String> = Vec::new();

    for sub in regular
        .into_iter()
        .chain(intersection)
        .chain(exclude)
    {
        let bare = sub.strip_prefix(['!', '&']).unwrap_or(sub);
        let candidates = candidates_for(bare, known);

        if sub.starts_with('!') {
            matches.retain(|m| !candidates.contains(m));
        } else if sub.starts_with('&') {
            matches.retain(|m| candidates.contains(m));
        } else {
            for candidate in candidates {
                if !matches.contains(&candidate) {
                    matches.push(candidate);
                }
            }
        }
    }

    matches
}

/// Names from `known` matched by one bare sub-pattern
fn candidates_for(bare: &str, known: &[String]) -> Vec<String> {
    if let Some(body) = bare.strip_prefix('~') {
        regex_candidates(body, known)
    } else if bare.contains('*') {
        // `*` becomes `.*`, anchored at both ends. Remaining characters pass
        // through unescaped.
        let body = format!("^{}$", bare.replace('*', ".*"));
        regex_candidates(&body, known)
    } else {
        known.iter().filter(|name| *name == bare).cloned().collect()
    }
}

fn regex_candidates(body: &str, known: &[String]) -> Vec<String> {
    match RegexBuilder::new(body).case_insensitive(true).build() {
        Ok(re) => known
            .iter()
            .filter(|name| re.is_match(name))
            .cloned()
            .collect(),
        Err(err) => {
            // Recoverable policy: patterns come from user-authored config, so
            // an unparseable body matches nothing instead of aborting.
            tracing::debug!(pattern = body, %err, "unparseable pattern matches nothing");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn known() -> Vec<String> {
        ["a", "b", "ab", "c"].map(String::from).to_vec()
    }

    #[test]
    fn literal_matches_exactly_one_name() {
        assert_eq!(matching_groups("a", &known()), vec!["a"]);
        assert!(matching_groups("nope", &known()).is_empty());
    }

    #[test]
    fn wildcard_is_anchored() {
        assert_eq!(matching_groups("a*", &known()), vec!["a", "ab"]);
        assert_eq!(matching_groups("*b", &known()), vec!["b", "ab"]);
    }

    #[test]
    fn tilde_regex_is_unanchored_and_case_insensitive() {
        let groups = ["Web", "webserver", "db"].map(String::from).to_vec();
        assert_eq!(matching_groups("~^web", &groups), vec!["Web", "webserver"]);
    }

    // Exclusion applies last no matter where it sits in the expression.
    #[rstest]
    #[case("a*,!ab")]
    #[case("!ab,a*")]
    fn exclusion_always_applies_after_inclusion(#[case] expr: &str) {
        assert_eq!(matching_groups(expr, &known()), vec!["a"]);
    }

    // Intersection always evaluates after regular inclusion, so token order
    // in the expression does not change the result.
    #[rstest]
    #[case("a*,&b")]
    #[case("&b,a*")]
    fn intersection_order_independent_of_token_order(#[case] expr: &str) {
        assert!(matching_groups(expr, &known()).is_empty());
    }

    #[test]
    fn colon_delimiter_is_equivalent_to_comma() {
        assert_eq!(
            matching_groups("a:c", &known()),
            matching_groups("a,c", &known())
        );
    }

    #[test]
    fn unparseable_regex_matches_nothing() {
        assert!(matching_groups("~[", &known()).is_empty());
        // ...and does not disturb the rest of the expression
        assert_eq!(matching_groups("~[,c", &known()), vec!["c"]);
    }

    #[test]
    fn union_preserves_first_seen_order() {
        assert_eq!(matching_groups("c,a*", &known()), vec!["c", "a", "ab"]);
    }
}
