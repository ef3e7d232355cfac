//! Direction transform (§4.4.1). For target→source, every diff is remapped:
//! `diff_type` via the fixed table, `source_value`/`target_value` swapped,
//! and the human description rewritten by a placeholder substitution that
//! avoids double-replacing a phrase that already matches its own
//! replacement.

use crate::models::diff::Difference;
use crate::models::sync_script::Direction;

const SOURCE_PLACEHOLDER: &str = "\u{0}EXISTS_ONLY_SOURCE\u{0}";
const TARGET_PLACEHOLDER: &str = "\u{0}EXISTS_ONLY_TARGET\u{0}";
const MISSING_SOURCE_PLACEHOLDER: &str = "\u{0}MISSING_SOURCE\u{0}";
const MISSING_TARGET_PLACEHOLDER: &str = "\u{0}MISSING_TARGET\u{0}";

/// Applies the direction transform. A no-op for source→target.
pub fn transform(differences: Vec<Difference>, direction: Direction) -> Vec<Difference> {
    match direction {
        Direction::SourceToTarget => differences,
        Direction::TargetToSource => differences.into_iter().map(reverse_one).collect(),
    }
}

fn reverse_one(mut diff: Difference) -> Difference {
    diff.diff_type = diff.diff_type.reversed();
    std::mem::swap(&mut diff.source_value, &mut diff.target_value);
    std::mem::swap(&mut diff.source_display, &mut diff.target_display);
    diff.description = reverse_description(&diff.description);
    diff
}

fn reverse_description(description: &str) -> String {
    let placeheld = description
        .replace("exists only in source", SOURCE_PLACEHOLDER)
        .replace("exists only in target", TARGET_PLACEHOLDER)
        .replace("missing in source", MISSING_SOURCE_PLACEHOLDER)
        .replace("missing in target", MISSING_TARGET_PLACEHOLDER);
    placeheld
        .replace(SOURCE_PLACEHOLDER, "exists only in target")
        .replace(TARGET_PLACEHOLDER, "exists only in source")
        .replace(MISSING_SOURCE_PLACEHOLDER, "missing in target")
        .replace(MISSING_TARGET_PLACEHOLDER, "missing in source")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::diff::{DiffType, ObjectType, Severity};

    fn sample() -> Difference {
        Difference {
            diff_type: DiffType::TableMissingTarget,
            severity: Severity::Critical,
            object_type: ObjectType::Table,
            schema: "app".to_string(),
            object_name: "orders".to_string(),
            sub_object_name: None,
            source_value: Some("source-def".to_string()),
            target_value: None,
            source_display: "orders".to_string(),
            target_display: String::new(),
            description: "table `orders` exists only in source".to_string(),
            can_auto_fix: true,
            fix_order: ObjectType::Table.fix_order(),
            warnings: vec![],
        }
    }

    #[test]
    fn source_to_target_is_a_no_op() {
        let diffs = transform(vec![sample()], Direction::SourceToTarget);
        assert_eq!(diffs[0].diff_type, DiffType::TableMissingTarget);
    }

    #[test]
    fn target_to_source_remaps_type_swaps_values_and_description() {
        let diffs = transform(vec![sample()], Direction::TargetToSource);
        let reversed = &diffs[0];
        assert_eq!(reversed.diff_type, DiffType::TableMissingSource);
        assert_eq!(reversed.target_value.as_deref(), Some("source-def"));
        assert_eq!(reversed.source_value, None);
        assert_eq!(reversed.description, "table `orders` exists only in target");
    }

    #[test]
    fn round_trip_restores_the_original() {
        let original = sample();
        let once = transform(vec![original.clone()], Direction::TargetToSource);
        let twice = transform(once, Direction::TargetToSource);
        assert_eq!(twice[0].diff_type, original.diff_type);
        assert_eq!(twice[0].description, original.description);
        assert_eq!(twice[0].source_value, original.source_value);
        assert_eq!(twice[0].target_value, original.target_value);
    }
}
