//! `build_column_definition` (§4.4.4, critical helper). Renders a complete
//! column definition from a `Column` snapshot so that `MODIFY`/`CHANGE
//! COLUMN` never silently clears an attribute the server would otherwise
//! preserve — the bug class this helper exists to prevent.

use crate::models::catalog::Column;

use super::quoting::quote_comment;

/// `<column_type>[ CHARACTER SET cs][ COLLATE co] <NULL|NOT NULL>[ DEFAULT
/// <expr>][ <extra>][ COMMENT '<escaped>']`.
pub fn build_column_definition(column: &Column) -> String {
    let mut def = column.column_type.clone();

    if let Some(charset) = column.charset.as_deref().filter(|c| !c.is_empty()) {
        def.push_str(&format!(" CHARACTER SET {charset}"));
    }
    if let Some(collation) = column.collation.as_deref().filter(|c| !c.is_empty()) {
        def.push_str(&format!(" COLLATE {collation}"));
    }

    def.push_str(if column.nullable { " NULL" } else { " NOT NULL" });

    if let Some(default) = &column.default {
        def.push_str(&format!(" DEFAULT {}", render_default(default)));
    }

    let extra = column.extra.trim();
    if !extra.is_empty() {
        def.push(' ');
        def.push_str(&extra.to_ascii_uppercase());
    }

    if !column.comment.is_empty() {
        def.push_str(&format!(" COMMENT {}", quote_comment(&column.comment)));
    }

    def
}

/// DEFAULT value rendering rule of §4.4.4: the listed bareword forms and
/// anything starting with `CURRENT_`/`NOW(` are emitted unquoted; everything
/// else is a quoted string literal.
fn render_default(value: &str) -> String {
    let upper = value.trim().to_ascii_uppercase();
    let is_bareword = matches!(upper.as_str(), "CURRENT_TIMESTAMP" | "CURRENT_DATE" | "NULL" | "TRUE" | "FALSE")
        || upper.starts_with("CURRENT_")
        || upper.starts_with("NOW(");
    if is_bareword {
        value.to_string()
    } else {
        super::quoting::quote_default_literal(value)
    }
}

/// `FIRST`/`AFTER \`prev\`` positional clause for `ADD COLUMN` (§4.4.3).
pub fn position_clause(column: &Column) -> String {
    if column.ordinal_position == 1 {
        " FIRST".to_string()
    } else if let Some(prev) = &column.after_column {
        format!(" AFTER {}", super::quoting::quote_ident(prev))
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_column() -> Column {
        Column {
            name: "email".to_string(),
            ordinal_position: 2,
            column_type: "varchar(255)".to_string(),
            data_type: "varchar".to_string(),
            nullable: false,
            default: None,
            extra: String::new(),
            charset: Some("utf8mb4".to_string()),
            collation: Some("utf8mb4_general_ci".to_string()),
            column_key: String::new(),
            comment: "primary contact".to_string(),
            after_column: Some("id".to_string()),
        }
    }

    #[test]
    fn renders_full_definition_with_comment_preserved() {
        let def = build_column_definition(&base_column());
        assert_eq!(
            def,
            "varchar(255) CHARACTER SET utf8mb4 COLLATE utf8mb4_general_ci NOT NULL COMMENT 'primary contact'"
        );
    }

    #[test]
    fn current_timestamp_default_is_unquoted() {
        let mut column = base_column();
        column.default = Some("CURRENT_TIMESTAMP".to_string());
        assert!(build_column_definition(&column).contains("DEFAULT CURRENT_TIMESTAMP"));
    }

    #[test]
    fn literal_default_is_quoted_and_escaped() {
        let mut column = base_column();
        column.default = Some("it's \\ here".to_string());
        let def = build_column_definition(&column);
        assert!(def.contains(r"DEFAULT 'it''s \\ here'"));
    }

    #[test]
    fn first_column_gets_first_clause() {
        let mut column = base_column();
        column.ordinal_position = 1;
        column.after_column = None;
        assert_eq!(position_clause(&column), " FIRST");
    }

    #[test]
    fn later_column_gets_after_clause() {
        assert_eq!(position_clause(&base_column()), " AFTER `id`");
    }
}
