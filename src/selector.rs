use crate::models::Candidate;

/// Reduce ranked, validated candidates to at most one per wanted year.
///
/// Years are served in the given order, each taking the first unused
/// candidate whose inferred year matches. With no wanted years only the top
/// candidate is kept.
pub fn select_best_matches(candidates: &[Candidate], years: &[i32]) -> Vec<Candidate> {
    if years.is_empty() {
        return candidates.iter().take(1).cloned().collect();
    }

    let mut used = vec![false; candidates.len()];
    let mut selected = Vec::new();
    for &target in years {
        let hit = candidates
            .iter()
            .enumerate()
            .find(|(idx, c)| !used[*idx] && c.inferred_year() == Some(target));
        if let Some((idx, candidate)) = hit {
            used[idx] = true;
            selected.push(candidate.clone());
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn candidate(url: &str, year: Option<i32>) -> Candidate {
        Candidate {
            url: url.to_string(),
            title: "Annual report".to_string(),
            year,
            mimetype: Some("application/pdf".to_string()),
            source: Source::WebSearch,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_one_per_year_never_duplicates() {
        let candidates = vec![
            candidate("https://a.com/1.pdf", Some(2021)),
            candidate("https://a.com/2.pdf", Some(2022)),
            candidate("https://a.com/3.pdf", Some(2021)),
        ];
        let selected = select_best_matches(&candidates, &[2021, 2022]);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].url, "https://a.com/1.pdf");
        assert_eq!(selected[1].url, "https://a.com/2.pdf");
    }

    #[test]
    fn test_missing_year_yields_nothing() {
        let candidates = vec![candidate("https://a.com/1.pdf", Some(2021))];
        let selected = select_best_matches(&candidates, &[2020, 2021]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].year, Some(2021));
    }

    #[test]
    fn test_year_order_follows_request() {
        let candidates = vec![
            candidate("https://a.com/old.pdf", Some(2020)),
            candidate("https://a.com/new.pdf", Some(2023)),
        ];
        let selected = select_best_matches(&candidates, &[2023, 2020]);
        assert_eq!(selected[0].url, "https://a.com/new.pdf");
        assert_eq!(selected[1].url, "https://a.com/old.pdf");
    }

    #[test]
    fn test_no_years_keeps_top_candidate() {
        let candidates = vec![
            candidate("https://a.com/best.pdf", None),
            candidate("https://a.com/second.pdf", Some(2022)),
        ];
        let selected = select_best_matches(&candidates, &[]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].url, "https://a.com/best.pdf");
        assert!(select_best_matches(&[], &[]).is_empty());
    }
}
