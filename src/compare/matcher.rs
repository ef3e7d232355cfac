//! The common four-pass matching algorithm shared by the table, index, and
//! constraint comparers (§4.2 "Common matching algorithm"). Matching
//! precedence is exact-name > duplicate-within-side > fingerprint-across-
//! sides, so identically-named objects never surface as renames.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

#[derive(Debug, Clone)]
pub enum MatchOutcome<T> {
    /// Pass A: present under the same key on both sides.
    Matched { source: T, target: T },
    /// Pass C: distinct keys, identical fingerprint.
    Renamed { source: T, target: T },
    /// Pass B: two or more unprocessed objects on one side share a
    /// fingerprint; `canonical` is the first encountered.
    Duplicate { canonical: T, duplicate: T, side: Side },
    /// Pass D: present on only one side after all other passes.
    Missing { object: T, side: Side },
}

/// Runs passes A–D over two already-discovered object sets. `key_fn` should
/// already reflect `options.case_sensitive` (§4.2.2); `rename_eligible`
/// gates pass C (used to exclude PRIMARY KEY per I4).
pub fn match_objects<T, K, F, R>(
    source: Vec<T>,
    target: Vec<T>,
    key_fn: K,
    fingerprint_fn: F,
    rename_eligible: R,
) -> Vec<MatchOutcome<T>>
where
    T: Clone,
    K: Fn(&T) -> String,
    F: Fn(&T) -> String,
    R: Fn(&T) -> bool,
{
    let mut outcomes = Vec::new();

    let (mut remaining_source, mut remaining_target) =
        extract_exact_matches(source, target, &key_fn, &mut outcomes);

    let duplicate_outcomes_source =
        extract_duplicates(&mut remaining_source, &fingerprint_fn, Side::Source);
    let duplicate_outcomes_target =
        extract_duplicates(&mut remaining_target, &fingerprint_fn, Side::Target);
    outcomes.extend(duplicate_outcomes_source);
    outcomes.extend(duplicate_outcomes_target);

    let rename_outcomes = extract_renames(
        &mut remaining_source,
        &mut remaining_target,
        &fingerprint_fn,
        &rename_eligible,
    );
    outcomes.extend(rename_outcomes);

    outcomes.extend(
        remaining_source
            .into_iter()
            .map(|object| MatchOutcome::Missing { object, side: Side::Source }),
    );
    outcomes.extend(
        remaining_target
            .into_iter()
            .map(|object| MatchOutcome::Missing { object, side: Side::Target }),
    );

    outcomes
}

fn extract_exact_matches<T, K>(
    source: Vec<T>,
    mut target: Vec<T>,
    key_fn: &K,
    outcomes: &mut Vec<MatchOutcome<T>>,
) -> (Vec<T>, Vec<T>)
where
    K: Fn(&T) -> String,
{
    let mut remaining_source = Vec::with_capacity(source.len());
    for item in source {
        let key = key_fn(&item);
        if let Some(idx) = target.iter().position(|t| key_fn(t) == key) {
            let matched_target = target.remove(idx);
            outcomes.push(MatchOutcome::Matched { source: item, target: matched_target });
        } else {
            remaining_source.push(item);
        }
    }
    (remaining_source, target)
}

fn extract_duplicates<T, F>(items: &mut Vec<T>, fingerprint_fn: &F, side: Side) -> Vec<MatchOutcome<T>>
where
    T: Clone,
    F: Fn(&T) -> String,
{
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        groups.entry(fingerprint_fn(item)).or_default().push(i);
    }

    let mut pairs: Vec<(usize, usize)> = Vec::new();
    let mut remove_idxs: Vec<usize> = Vec::new();
    for mut idxs in groups.into_values() {
        if idxs.len() > 1 {
            idxs.sort_unstable();
            let canonical_idx = idxs[0];
            for &dup_idx in &idxs[1..] {
                pairs.push((canonical_idx, dup_idx));
                remove_idxs.push(dup_idx);
            }
        }
    }
    pairs.sort_by_key(|&(_, d)| d);

    let outcomes: Vec<MatchOutcome<T>> = pairs
        .into_iter()
        .map(|(c, d)| MatchOutcome::Duplicate {
            canonical: items[c].clone(),
            duplicate: items[d].clone(),
            side,
        })
        .collect();

    remove_idxs.sort_unstable();
    remove_idxs.dedup();
    for idx in remove_idxs.into_iter().rev() {
        items.remove(idx);
    }

    outcomes
}

fn extract_renames<T, F, R>(
    source: &mut Vec<T>,
    target: &mut Vec<T>,
    fingerprint_fn: &F,
    rename_eligible: &R,
) -> Vec<MatchOutcome<T>>
where
    T: Clone,
    F: Fn(&T) -> String,
    R: Fn(&T) -> bool,
{
    let mut source_groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, item) in source.iter().enumerate() {
        if rename_eligible(item) {
            source_groups.entry(fingerprint_fn(item)).or_default().push(i);
        }
    }
    let mut target_groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, item) in target.iter().enumerate() {
        if rename_eligible(item) {
            target_groups.entry(fingerprint_fn(item)).or_default().push(i);
        }
    }

    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for (fingerprint, source_idxs) in &source_groups {
        if let Some(target_idxs) = target_groups.get(fingerprint) {
            let n = source_idxs.len().min(target_idxs.len());
            for i in 0..n {
                pairs.push((source_idxs[i], target_idxs[i]));
            }
        }
    }
    // Deterministic emission order regardless of HashMap iteration order.
    pairs.sort_by_key(|&(s, _)| s);

    let outcomes: Vec<MatchOutcome<T>> = pairs
        .iter()
        .map(|&(si, ti)| MatchOutcome::Renamed { source: source[si].clone(), target: target[ti].clone() })
        .collect();

    let mut source_remove: Vec<usize> = pairs.iter().map(|&(s, _)| s).collect();
    let mut target_remove: Vec<usize> = pairs.iter().map(|&(_, t)| t).collect();
    source_remove.sort_unstable();
    source_remove.dedup();
    target_remove.sort_unstable();
    target_remove.dedup();
    for idx in source_remove.into_iter().rev() {
        source.remove(idx);
    }
    for idx in target_remove.into_iter().rev() {
        target.remove(idx);
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Obj {
        key: String,
        fingerprint: String,
    }

    fn obj(key: &str, fingerprint: &str) -> Obj {
        Obj { key: key.to_string(), fingerprint: fingerprint.to_string() }
    }

    #[test]
    fn exact_name_match_wins_over_fingerprint_match() {
        // Same name on both sides, but also same fingerprint as an object
        // under a different name: the same-named pair must never appear as
        // a rename.
        let source = vec![obj("t.idx_a", "fp1"), obj("t.idx_b", "fp2")];
        let target = vec![obj("t.idx_a", "fp1"), obj("t.idx_c", "fp2")];

        let outcomes = match_objects(
            source,
            target,
            |o: &Obj| o.key.clone(),
            |o: &Obj| o.fingerprint.clone(),
            |_| true,
        );

        let matched = outcomes
            .iter()
            .filter(|o| matches!(o, MatchOutcome::Matched { .. }))
            .count();
        let renamed = outcomes
            .iter()
            .filter(|o| matches!(o, MatchOutcome::Renamed { .. }))
            .count();
        assert_eq!(matched, 1);
        assert_eq!(renamed, 1);
    }

    #[test]
    fn duplicate_within_a_side_is_reported_once_per_extra() {
        let source = vec![obj("t.a", "fp1"), obj("t.b", "fp1"), obj("t.c", "fp1")];
        let target = vec![obj("t.a", "fp1")];

        let outcomes = match_objects(
            source,
            target,
            |o: &Obj| o.key.clone(),
            |o: &Obj| o.fingerprint.clone(),
            |_| true,
        );

        let duplicates: Vec<_> = outcomes
            .iter()
            .filter_map(|o| match o {
                MatchOutcome::Duplicate { duplicate, side: Side::Source, .. } => Some(duplicate.key.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(duplicates.len(), 2);
        assert!(duplicates.contains(&"t.b".to_string()));
        assert!(duplicates.contains(&"t.c".to_string()));
    }

    #[test]
    fn rename_ineligible_objects_fall_through_to_missing() {
        let source = vec![obj("t.pk_old", "fpPK")];
        let target = vec![obj("t.pk_new", "fpPK")];

        let outcomes = match_objects(
            source,
            target,
            |o: &Obj| o.key.clone(),
            |o: &Obj| o.fingerprint.clone(),
            |_| false,
        );

        assert!(outcomes.iter().all(|o| !matches!(o, MatchOutcome::Renamed { .. })));
        let missing_count = outcomes.iter().filter(|o| matches!(o, MatchOutcome::Missing { .. })).count();
        assert_eq!(missing_count, 2);
    }

    #[test]
    fn unmatched_objects_sweep_to_missing() {
        let source = vec![obj("t.only_source", "fpX")];
        let target = vec![obj("t.only_target", "fpY")];

        let outcomes = match_objects(
            source,
            target,
            |o: &Obj| o.key.clone(),
            |o: &Obj| o.fingerprint.clone(),
            |_| true,
        );

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, MatchOutcome::Missing { side: Side::Source, .. })));
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, MatchOutcome::Missing { side: Side::Target, .. })));
    }
}
