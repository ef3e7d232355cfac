//! SQL identifier and literal quoting (§4.4.5).

/// Wraps an identifier in backticks, doubling any embedded backtick.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `` `schema`.`name` ``.
pub fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// String literal for a DEFAULT clause: single quotes doubled, backslashes
/// doubled (§4.4.4, §4.4.5).
pub fn quote_default_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "''");
    format!("'{escaped}'")
}

/// `COMMENT` literal: single quotes doubled, no backslash doubling (§4.4.4
/// only specifies quote-doubling for comments).
pub fn quote_comment(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtick_in_identifier_is_doubled() {
        assert_eq!(quote_ident("weird`name"), "`weird``name`");
    }

    #[test]
    fn default_literal_escapes_quote_and_backslash() {
        assert_eq!(quote_default_literal(r"O'Brien\n"), r"'O''Brien\\n'");
    }

    #[test]
    fn comment_only_escapes_quote() {
        assert_eq!(quote_comment("it's fine"), "'it''s fine'");
    }
}
