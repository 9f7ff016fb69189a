//! String normalization shared by metrics and classification.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Lowercase, punctuation replaced by spaces, whitespace collapsed.
pub fn normalize_text(value: &str) -> String {
    let mut folded = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_alphanumeric() {
            folded.extend(c.to_lowercase());
        } else {
            folded.push(' ');
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case- and punctuation-insensitive equality of two non-empty values.
pub fn values_match(a: &str, b: &str) -> bool {
    let a = normalize_text(a);
    !a.is_empty() && a == normalize_text(b)
}

pub fn tokens(value: &str) -> BTreeSet<String> {
    normalize_text(value)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard index of the normalized token sets; 0 when both are empty.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    let union = ta.union(&tb).count();
    if union == 0 {
        return 0.0;
    }
    ta.intersection(&tb).count() as f64 / union as f64
}

/// Splits an author list. `;` wins over `,` and ` and ` since author names
/// themselves often carry a comma ("Doe, J.").
pub fn split_people(value: &str) -> Vec<String> {
    let parts: Vec<&str> = if value.contains(';') {
        value.split(';').collect()
    } else {
        value
            .split(" and ")
            .flat_map(|chunk| chunk.split(','))
            .collect()
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn doi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^10\.\d{4,}/\S+$").expect("DOI pattern compiles"))
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}$").expect("year pattern compiles"))
}

/// Whether `value` is a bare DOI (`10.xxxx/...`), resolver prefixes allowed.
pub fn is_doi(value: &str) -> bool {
    let v = value.trim();
    let v = v
        .strip_prefix("https://doi.org/")
        .or_else(|| v.strip_prefix("http://doi.org/"))
        .or_else(|| v.strip_prefix("doi:"))
        .unwrap_or(v);
    doi_regex().is_match(v.trim())
}

/// Four-digit year in a plausible publication range.
pub fn is_year(value: &str) -> bool {
    let v = value.trim();
    year_regex().is_match(v)
        && v.parse::<u32>()
            .map(|y| (1000..=2100).contains(&y))
            .unwrap_or(false)
}

/// Share of alphanumeric characters among non-whitespace characters.
pub fn alphanumeric_share(value: &str) -> f64 {
    let (alnum, total) = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(a, t), c| {
            (a + usize::from(c.is_alphanumeric()), t + 1)
        });
    if total == 0 {
        0.0
    } else {
        alnum as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Deep-Learning: A  Survey! "), "deep learning a survey");
        assert_eq!(normalize_text("..."), "");
    }

    #[test]
    fn test_values_match_ignores_case_and_punctuation() {
        assert!(values_match("Machine Learning.", "machine-learning"));
        assert!(!values_match("Machine Learning", "Machine Translation"));
        assert!(!values_match("", ""));
    }

    #[test]
    fn test_token_overlap() {
        assert_eq!(token_overlap("a b c", "a b c"), 1.0);
        assert_eq!(token_overlap("a b", "c d"), 0.0);
        assert!((token_overlap("a b c", "a b d") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_split_people() {
        assert_eq!(split_people("Doe, J.; Roe, R."), vec!["Doe, J.", "Roe, R."]);
        assert_eq!(split_people("Jane Doe, Rick Roe and Ann Poe").len(), 3);
        assert!(split_people(" ; ").is_empty());
    }

    #[test]
    fn test_doi_and_year() {
        assert!(is_doi("10.1145/3442188.3445922"));
        assert!(is_doi("https://doi.org/10.1000/xyz"));
        assert!(!is_doi("10.12/short"));
        assert!(!is_doi("not a doi"));
        assert!(is_year("2021"));
        assert!(!is_year("21"));
        assert!(!is_year("0999"));
    }
}
