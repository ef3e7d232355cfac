//! Output framing (§4.4.7, §6 "Canonical DDL framing"). Groups generated
//! statements under section headers and wraps the whole script in the
//! foreign-key-check/SQL-mode bracket.

use crate::models::sync_script::Direction;

/// Which of the four output sections a statement belongs to. Order here is
/// the emission order (§4.4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    TableCreation,
    ColumnModifications,
    IndexModifications,
    ConstraintModifications,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::TableCreation => "TABLE CREATION",
            Section::ColumnModifications => "COLUMN MODIFICATIONS",
            Section::IndexModifications => "INDEX MODIFICATIONS",
            Section::ConstraintModifications => "CONSTRAINT MODIFICATIONS",
        }
    }
}

/// Forward emission order (§4.2.5 dependency order): create/alter the table
/// before the columns/indexes/constraints that reference it.
pub const FORWARD_SECTION_ORDER: [Section; 4] =
    [Section::TableCreation, Section::ColumnModifications, Section::IndexModifications, Section::ConstraintModifications];

/// Rollback undoes in the opposite dependency order: constraints and
/// indexes first, the table dropped last.
pub const ROLLBACK_SECTION_ORDER: [Section; 4] =
    [Section::ConstraintModifications, Section::IndexModifications, Section::ColumnModifications, Section::TableCreation];

/// One generated statement pair plus the metadata the caller folds into the
/// script-level impact flags.
pub struct GeneratedStatement {
    pub section: Section,
    pub forward: String,
    pub rollback: String,
    pub warnings: Vec<String>,
    pub requires_downtime: bool,
    pub data_loss_risk: bool,
    pub duration_estimate_secs: u64,
}

/// Assembles the literal framing of §6: title/direction/description/count
/// header, `SET` bracket, section-grouped bodies.
pub fn frame(
    title: &str,
    description: &str,
    direction: Direction,
    statements: &[&GeneratedStatement],
    section_order: [Section; 4],
    body: impl Fn(&GeneratedStatement) -> &str,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("-- {title}\n"));
    out.push_str(&format!("-- Direction: {}\n", direction.as_str()));
    out.push_str(&format!("-- Description: {description}\n"));
    out.push_str(&format!("-- Total statements: {}\n", statements.len()));
    out.push_str("SET FOREIGN_KEY_CHECKS = 0;\n");
    out.push_str("SET SQL_MODE = 'NO_AUTO_VALUE_ON_ZERO';\n");

    for section in section_order {
        let in_section: Vec<&&GeneratedStatement> = statements.iter().filter(|s| s.section == section).collect();
        if in_section.is_empty() {
            continue;
        }
        out.push_str(&format!("\n-- {}\n", section.title()));
        for statement in in_section {
            let rendered = body(statement);
            out.push_str(rendered);
            if !rendered.ends_with('\n') {
                out.push('\n');
            }
        }
    }

    out.push_str("SET FOREIGN_KEY_CHECKS = 1;\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(section: Section, forward: &str) -> GeneratedStatement {
        GeneratedStatement {
            section,
            forward: forward.to_string(),
            rollback: "DROP TABLE IF EXISTS `app`.`orders`;".to_string(),
            warnings: vec![],
            requires_downtime: false,
            data_loss_risk: false,
            duration_estimate_secs: 5,
        }
    }

    #[test]
    fn frames_with_literal_header_and_set_bracket() {
        let owned = statement(Section::TableCreation, "CREATE TABLE `app`.`orders` (...);");
        let statements = vec![&owned];
        let script = frame("sync script", "one line", Direction::SourceToTarget, &statements, FORWARD_SECTION_ORDER, |s| &s.forward);
        assert!(script.starts_with("-- sync script\n-- Direction: source_to_target\n"));
        assert!(script.contains("SET FOREIGN_KEY_CHECKS = 0;"));
        assert!(script.contains("-- TABLE CREATION"));
        assert!(script.trim_end().ends_with("SET FOREIGN_KEY_CHECKS = 1;"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let owned = statement(Section::IndexModifications, "DROP INDEX idx_a ON orders;");
        let statements = vec![&owned];
        let script = frame("x", "y", Direction::SourceToTarget, &statements, FORWARD_SECTION_ORDER, |s| &s.forward);
        assert!(!script.contains("TABLE CREATION"));
        assert!(script.contains("INDEX MODIFICATIONS"));
    }
}
