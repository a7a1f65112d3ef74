//! Duplicate-client detection by name.

use serde::Serialize;

use crate::domain::client::ClientRecord;

/// Minimum character-overlap ratio for two first names to count as similar.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// How closely a stored record matches the requested name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// First and last names are identical after normalization.
    Exact,
    /// Same last name, first name a plausible variant.
    Similar,
}

/// A stored record that may be the client named in a new transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub record: ClientRecord,
    pub match_type: MatchType,
    pub score: f64,
}

/// Finds stored records that plausibly belong to `first_name last_name`.
///
/// Records whose last name differs are never returned. The result keeps the
/// order of `records`; candidates are not re-ranked by score.
pub fn find_matches(first_name: &str, last_name: &str, records: &[ClientRecord]) -> Vec<MatchCandidate> {
    let first = normalize(first_name);
    let last = normalize(last_name);

    records
        .iter()
        .filter_map(|record| {
            let stored_first = normalize(record.first_name().unwrap_or_default());
            let stored_last = normalize(record.last_name().unwrap_or_default());
            if stored_last != last {
                return None;
            }
            let (match_type, score) = if stored_first == first {
                (MatchType::Exact, 1.0)
            } else {
                let score = similarity(&first, &stored_first)?;
                (MatchType::Similar, score)
            };
            Some(MatchCandidate {
                record: record.clone(),
                match_type,
                score,
            })
        })
        .collect()
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Score for two differing first names, or `None` when they are unrelated.
///
/// Blank names never match a non-blank one.
fn similarity(a: &str, b: &str) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let ratio = overlap_ratio(a, b);
    if a.contains(b) || b.contains(a) || ratio >= SIMILARITY_THRESHOLD {
        Some(ratio)
    } else {
        None
    }
}

/// Fraction of the shorter name's characters that occur anywhere in the longer one.
///
/// Characters are not consumed, so repeated letters each count. Order-insensitive,
/// so it is a coarse filter rather than an edit distance.
fn overlap_ratio(a: &str, b: &str) -> f64 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let total = shorter.chars().count();
    if total == 0 {
        return 0.0;
    }

    let found = shorter.chars().filter(|c| longer.contains(*c)).count();
    found as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(first: &str, last: &str) -> ClientRecord {
        ClientRecord::for_client(first, last)
    }

    #[test]
    fn nickname_is_a_similar_match() {
        let matches = find_matches("Jon", "Smith", &[record("Jonathan", "Smith")]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_type, MatchType::Similar);
        assert_eq!(matches[0].score, 1.0);
    }

    #[test]
    fn identical_names_are_exact() {
        let matches = find_matches("Amy", "Brown", &[record("Amy", "Brown")]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_type, MatchType::Exact);
    }

    #[test]
    fn different_last_name_is_excluded() {
        assert!(find_matches("Amy", "Brown", &[record("Amy", "Jones")]).is_empty());
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        let matches = find_matches("  AMY ", "brown", &[record("Amy", "Brown")]);
        assert_eq!(matches[0].match_type, MatchType::Exact);
    }

    #[test]
    fn spelling_variants_use_overlap_ratio() {
        // "steven" vs "stephen": s,t,e,e,n of 6 found -> 5/6
        let matches = find_matches("Steven", "Hall", &[record("Stephen", "Hall")]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_type, MatchType::Similar);
        assert!((matches[0].score - 5.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn unrelated_first_names_are_excluded() {
        assert!(find_matches("Bob", "Hall", &[record("Alice", "Hall")]).is_empty());
    }

    #[test]
    fn blank_first_name_only_matches_blank() {
        assert!(find_matches("", "Hall", &[record("Alice", "Hall")]).is_empty());
        let matches = find_matches("", "Hall", &[record("", "Hall")]);
        assert_eq!(matches[0].match_type, MatchType::Exact);
    }

    #[test]
    fn preserves_input_order() {
        let records = [record("Jonathan", "Smith"), record("Amy", "Brown"), record("Jon", "Smith")];
        let matches = find_matches("Jon", "Smith", &records);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].match_type, MatchType::Similar);
        assert_eq!(matches[1].match_type, MatchType::Exact);
    }

    #[test]
    fn repeated_letters_each_count_toward_overlap() {
        assert_eq!(overlap_ratio("aa", "ab"), 1.0);
        assert_eq!(overlap_ratio("abc", "cab"), 1.0);
        assert_eq!(overlap_ratio("mimi", "milo"), 1.0);
    }

    #[test]
    fn first_name_with_repeated_letters_is_similar() {
        let matches = find_matches("Mimi", "Hall", &[record("Milo", "Hall")]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_type, MatchType::Similar);
        assert_eq!(matches[0].score, 1.0);
    }
}
