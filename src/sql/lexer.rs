//! Identifier lexer (§4.7 "Identifier lexer"): a single-pass, dialect-
//! agnostic scan that collects lower-cased identifiers while skipping
//! string literals and comments.

use std::collections::BTreeSet;

/// Extract the set of identifiers in `sql`, lower-cased. Single-quoted
/// strings, block comments, and line comments are skipped entirely and
/// contribute nothing to the result, satisfying §8's property: `extract(s)
/// ⊆ lowercase(s)` and no identifier inside a skipped span appears in the
/// output.
///
/// Unterminated strings/comments/quoted identifiers at end-of-input do not
/// raise; whatever was read before running out of input is kept.
pub fn extract_identifiers(sql: &str) -> BTreeSet<String> {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut out = BTreeSet::new();
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        match b {
            b'\'' => {
                i += 1;
                while i < len {
                    if bytes[i] == b'\'' {
                        if i + 1 < len && bytes[i + 1] == b'\'' {
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < len && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(len);
            }
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                i += 2;
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'"' => {
                let start = i;
                i += 1;
                let mut raw = String::new();
                while i < len {
                    if bytes[i] == b'"' {
                        if i + 1 < len && bytes[i + 1] == b'"' {
                            raw.push('"');
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    raw.push(bytes[i] as char);
                    i += 1;
                }
                if i > start {
                    out.insert(raw.to_lowercase());
                }
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let start = i;
                i += 1;
                while i < len && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                out.insert(sql[start..i].to_lowercase());
            }
            _ => {
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_barewords_lowercased() {
        let ids = extract_identifiers("SELECT Foo, bar FROM Baz");
        assert!(ids.contains("select"));
        assert!(ids.contains("foo"));
        assert!(ids.contains("bar"));
        assert!(ids.contains("from"));
        assert!(ids.contains("baz"));
    }

    #[test]
    fn skips_single_quoted_strings() {
        let ids = extract_identifiers("SELECT 'secret_identifier' FROM t");
        assert!(!ids.contains("secret_identifier"));
        assert!(ids.contains("t"));
    }

    #[test]
    fn doubled_apostrophe_is_an_escaped_quote() {
        let ids = extract_identifiers("SELECT 'it''s a trap' FROM t");
        assert!(!ids.contains("trap"));
        assert!(ids.contains("t"));
    }

    #[test]
    fn skips_block_comments() {
        let ids = extract_identifiers("SELECT /* hidden_name */ real_name FROM t");
        assert!(!ids.contains("hidden_name"));
        assert!(ids.contains("real_name"));
    }

    #[test]
    fn skips_line_comments_to_newline() {
        let ids = extract_identifiers("SELECT real_name -- hidden_name\nFROM t");
        assert!(!ids.contains("hidden_name"));
        assert!(ids.contains("real_name"));
    }

    #[test]
    fn double_quoted_identifier_yields_verbatim_text_collapsed_and_lowercased() {
        let ids = extract_identifiers(r#"SELECT * FROM "My""Table""#);
        assert!(ids.contains("my\"table"));
    }

    #[test]
    fn unterminated_string_does_not_panic() {
        let ids = extract_identifiers("SELECT 'unterminated");
        assert!(ids.contains("select"));
    }

    #[test]
    fn unterminated_block_comment_does_not_panic() {
        let ids = extract_identifiers("SELECT foo /* never closes");
        assert!(ids.contains("foo"));
    }

    #[test]
    fn every_identifier_is_lowercase_subset_of_input() {
        let sql = "SELECT Alpha, Beta FROM Gamma";
        let ids = extract_identifiers(sql);
        let lowered = sql.to_lowercase();
        for id in &ids {
            assert!(lowered.contains(id.as_str()));
        }
    }
}
