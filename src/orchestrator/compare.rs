//! Cross-layout comparison
//!
//! Logical output must not depend on physical layout. Counts are compared
//! for every case. Key sets are compared only for unpaginated cases: with
//! pagination, ties in `k` let two correct engines return different keys.

use super::report::LayoutDivergence;
use crate::cases::Case;
use crate::verifier::Verdict;

/// Compares every layout against the first one
pub fn compare_layouts(
    cases: &[Case],
    layouts: &[(String, Vec<Verdict>)],
) -> Vec<LayoutDivergence> {
    let mut divergences = Vec::new();
    let Some(((baseline_name, baseline), rest)) = layouts.split_first() else {
        return divergences;
    };

    for (name, verdicts) in rest {
        for ((case, base), other) in cases.iter().zip(baseline).zip(verdicts) {
            let counts_differ = base.fingerprint.count != other.fingerprint.count;
            let compare_sets = !case.pagination.is_paginated();
            let sets_differ = compare_sets && base.fingerprint.digest != other.fingerprint.digest;

            if counts_differ || sets_differ {
                divergences.push(LayoutDivergence {
                    case: case.clone(),
                    baseline: baseline_name.clone(),
                    layout: name.clone(),
                    baseline_count: base.fingerprint.count,
                    count: other.fingerprint.count,
                    baseline_digest: compare_sets.then(|| base.fingerprint.digest.clone()),
                    digest: compare_sets.then(|| other.fingerprint.digest.clone()),
                });
            }
        }
    }
    divergences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::{Pagination, Predicate};
    use crate::dataset::CompositeKey;
    use crate::verifier::ResultFingerprint;

    fn verdict(case: &Case, ids: &[i64]) -> Verdict {
        let keys: Vec<CompositeKey> = ids.iter().map(|id| CompositeKey::new(*id, "x")).collect();
        Verdict {
            case_id: case.id.clone(),
            expected_count: ids.len(),
            fingerprint: ResultFingerprint::of(keys.iter()),
            violation: None,
        }
    }

    #[test]
    fn test_identical_layouts_agree() {
        let cases = vec![Case::new(0, Predicate::Equality(1), None, Pagination::None)];
        let layouts = vec![
            ("coarse".to_string(), vec![verdict(&cases[0], &[1, 2])]),
            ("fine".to_string(), vec![verdict(&cases[0], &[2, 1])]),
        ];
        assert!(compare_layouts(&cases, &layouts).is_empty());
    }

    #[test]
    fn test_same_count_different_keys() {
        let cases = vec![
            Case::new(0, Predicate::Equality(1), None, Pagination::None),
            Case::new(1, Predicate::Equality(1), None, Pagination::Limit(2)),
        ];
        let layouts = vec![
            (
                "coarse".to_string(),
                vec![verdict(&cases[0], &[1, 2]), verdict(&cases[1], &[1, 2])],
            ),
            (
                "fine".to_string(),
                vec![verdict(&cases[0], &[1, 3]), verdict(&cases[1], &[1, 3])],
            ),
        ];
        let divergences = compare_layouts(&cases, &layouts);
        // the paginated case may legitimately pick other keys
        assert_eq!(divergences.len(), 1);
        assert_eq!(divergences[0].case.id, "case-0000");
        assert_eq!(divergences[0].layout, "fine");
        assert!(divergences[0].digest.is_some());
    }

    #[test]
    fn test_count_difference_on_paginated_case() {
        let cases = vec![Case::new(0, Predicate::Equality(1), None, Pagination::Limit(5))];
        let layouts = vec![
            ("coarse".to_string(), vec![verdict(&cases[0], &[1, 2, 3])]),
            ("fine".to_string(), vec![verdict(&cases[0], &[1, 2])]),
        ];
        let divergences = compare_layouts(&cases, &layouts);
        assert_eq!(divergences.len(), 1);
        assert_eq!(divergences[0].baseline_count, 3);
        assert_eq!(divergences[0].count, 2);
        assert_eq!(divergences[0].digest, None);
    }

    #[test]
    fn test_single_layout_has_nothing_to_compare() {
        let cases = vec![Case::new(0, Predicate::Equality(1), None, Pagination::None)];
        let layouts = vec![("only".to_string(), vec![verdict(&cases[0], &[1])])];
        assert!(compare_layouts(&cases, &layouts).is_empty());
    }
}
