//! Fuzzy suggestion engine for unresolved references.
//!
//! Case-insensitive Levenshtein distance over two rolling rows, then ranked
//! formatting: "Did you mean 'X'?" for one close match, "'X' or 'Y'?" for
//! two, or nothing when no candidate is within distance 2 (the error message
//! itself always lists the valid names).

/// Matches at or below this edit distance are offered as suggestions.
const MAX_SUGGEST_DISTANCE: usize = 2;

/// Case-insensitive Levenshtein edit distance.
///
/// Uses two rolling distance vectors instead of the full matrix.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Rank candidates within [`MAX_SUGGEST_DISTANCE`] of `unresolved`,
/// ascending by distance then alphabetically.
fn ranked_matches<'a>(unresolved: &str, candidates: &[&'a str]) -> Vec<&'a str> {
    let mut matches: Vec<(usize, &str)> = candidates
        .iter()
        .map(|c| (edit_distance(unresolved, c), *c))
        .filter(|(d, _)| *d <= MAX_SUGGEST_DISTANCE)
        .collect();
    matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    matches.into_iter().map(|(_, c)| c).collect()
}

/// A "Did you mean …?" suggestion, or `None` when nothing is close enough.
pub fn did_you_mean(unresolved: &str, candidates: &[&str]) -> Option<String> {
    let matches = ranked_matches(unresolved, candidates);
    match matches.as_slice() {
        [] => None,
        [only] => Some(format!("Did you mean '{only}'?")),
        [first, second, ..] => Some(format!("Did you mean '{first}' or '{second}'?")),
    }
}

/// The "valid names" trailer every reference error carries.
pub fn valid_names(kind: &str, candidates: &[&str]) -> String {
    if candidates.is_empty() {
        format!("no {kind}s are declared")
    } else {
        format!("valid {kind}s: {}", candidates.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance_basics() {
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", "abc"), 0);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_edit_distance_transposition_counts_two() {
        assert_eq!(edit_distance("platfromer", "platformer"), 2);
    }

    #[test]
    fn test_edit_distance_case_insensitive() {
        assert_eq!(edit_distance("Player", "player"), 0);
    }

    #[test]
    fn test_did_you_mean_single() {
        let s = did_you_mean("platfromer", &["platformer", "tileset"]);
        assert_eq!(s.as_deref(), Some("Did you mean 'platformer'?"));
    }

    #[test]
    fn test_did_you_mean_two_ranked_alphabetically() {
        let s = did_you_mean("walk", &["wall", "walks"]);
        assert_eq!(s.as_deref(), Some("Did you mean 'wall' or 'walks'?"));
    }

    #[test]
    fn test_did_you_mean_nothing_close() {
        assert_eq!(did_you_mean("zzzzzz", &["platformer"]), None);
    }

    #[test]
    fn test_valid_names_listing() {
        assert_eq!(
            valid_names("scene", &["title", "level1"]),
            "valid scenes: title, level1"
        );
        assert_eq!(valid_names("scene", &[]), "no scenes are declared");
    }
}
