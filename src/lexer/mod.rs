//! The token scanner splits a markup string into a flat token sequence.
//!
//! Scanning is a single left-to-right pass, linear in the input length, and
//! never backtracks or fails: unterminated groups and environments are
//! tokenized as found so that partially-typed input can still be highlighted
//! live. Unbalanced-group detection is a builder-level concern.
//!
//! Each shape of lexeme has its own matcher function returning the matched
//! byte length; the driver tries them in order at the current position.

use std::sync::Arc;

use crate::types::{SourceLocation, Token, TokenKind};

/// Matches a run of whitespace characters.
fn match_space(s: &str) -> Option<usize> {
    let mut len = 0;
    for c in s.chars() {
        if matches!(c, ' ' | '\r' | '\n' | '\t') {
            len += c.len_utf8();
        } else {
            break;
        }
    }
    (len > 0).then_some(len)
}

/// Matches a backslash followed by an ASCII-alphabetic identifier. Returns
/// the total length including the backslash.
fn match_control_word(s: &str) -> Option<usize> {
    let mut chars = s.chars();
    if chars.next()? != '\\' {
        return None;
    }
    let mut len = 1;
    let mut matched = false;
    for c in chars {
        if c.is_ascii_alphabetic() {
            len += c.len_utf8();
            matched = true;
        } else {
            break;
        }
    }
    matched.then_some(len)
}

/// Matches a digit run with at most one embedded decimal point.
fn match_number(s: &str) -> Option<usize> {
    let mut len = 0;
    let mut seen_dot = false;
    for c in s.chars() {
        if c.is_ascii_digit() {
            len += 1;
        } else if c == '.' && !seen_dot && len > 0 {
            // only accept a dot that is followed by another digit
            if s[len + 1..].starts_with(|d: char| d.is_ascii_digit()) {
                seen_dot = true;
                len += 1;
            } else {
                break;
            }
        } else {
            break;
        }
    }
    (len > 0).then_some(len)
}

/// Matches an environment name argument (`{name}`, optionally preceded by
/// spaces) immediately after `\begin` or `\end`. Returns the byte range of
/// the name within `s` and the total matched length.
fn match_env_name(s: &str) -> Option<(usize, usize, usize)> {
    let skipped = match_space(s).unwrap_or(0);
    let rest = &s[skipped..];
    let rest = rest.strip_prefix('{')?;

    let mut name_len = 0;
    for c in rest.chars() {
        if c.is_ascii_alphabetic() || c == '*' {
            name_len += c.len_utf8();
        } else {
            break;
        }
    }
    if name_len == 0 || !rest[name_len..].starts_with('}') {
        return None;
    }

    let name_start = skipped + 1;
    Some((name_start, name_start + name_len, name_start + name_len + 1))
}

/// The markup token scanner.
pub struct Lexer {
    input: Arc<str>,
    last_index: usize,
}

impl Lexer {
    /// Creates a new scanner over the given markup string.
    #[must_use]
    pub fn new(input: impl Into<Arc<str>>) -> Self {
        Self {
            input: input.into(),
            last_index: 0,
        }
    }

    /// Scans the whole input, consuming the scanner.
    #[must_use]
    pub fn scan(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn token(&self, kind: TokenKind, text: impl Into<String>, start: usize, end: usize) -> Token {
        Token::new(
            kind,
            text.into(),
            Some(SourceLocation::new(Arc::clone(&self.input), start, end)),
        )
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            if self.last_index >= self.input.len() {
                return None;
            }
            let slice = &self.input[self.last_index..];

            if let Some(len) = match_space(slice) {
                self.last_index += len;
                continue;
            }
            if slice.starts_with('%') {
                // comment, skip to end of line
                match slice.find('\n') {
                    Some(rel) => self.last_index += rel + 1,
                    None => self.last_index = self.input.len(),
                }
                continue;
            }

            let start = self.last_index;

            if slice.starts_with('\\') {
                return Some(self.lex_control_sequence(start));
            }

            let ch = slice.chars().next()?;
            let (kind, len) = match ch {
                '{' => (TokenKind::OpenGroup, 1),
                '}' => (TokenKind::CloseGroup, 1),
                '_' => (TokenKind::SubscriptMarker, 1),
                '^' => (TokenKind::SuperscriptMarker, 1),
                '&' => (TokenKind::ColumnSeparator, 1),
                c if c.is_ascii_digit() => {
                    let len = match_number(slice).unwrap_or(1);
                    (TokenKind::Literal, len)
                }
                c => (TokenKind::Literal, c.len_utf8()),
            };
            self.last_index += len;
            let text = &self.input[start..start + len];
            return Some(self.token(kind, text.to_owned(), start, start + len));
        }
    }

    /// Lexes a token starting with a backslash: a row separator, an escaped
    /// brace, a control word (possibly an environment delimiter), a control
    /// symbol, or a trailing lone backslash.
    fn lex_control_sequence(&mut self, start: usize) -> Token {
        let slice = &self.input[start..];

        if slice.starts_with(r"\\") {
            self.last_index += 2;
            return self.token(TokenKind::RowSeparator, r"\\", start, start + 2);
        }

        if let Some(len) = match_control_word(slice) {
            let name = &slice[1..len];
            if matches!(name, "begin" | "end")
                && let Some((name_start, name_end, total)) = match_env_name(&slice[len..])
            {
                let kind = if name == "begin" {
                    TokenKind::EnvironmentBegin
                } else {
                    TokenKind::EnvironmentEnd
                };
                let env = slice[len + name_start..len + name_end].to_owned();
                let end = start + len + total;
                self.last_index = end;
                return self.token(kind, env, start, end);
            }
            self.last_index += len;
            return self.token(TokenKind::Command, name.to_owned(), start, start + len);
        }

        let mut chars = slice.chars();
        chars.next(); // the backslash
        match chars.next() {
            Some(c @ ('{' | '}')) => {
                self.last_index += 1 + c.len_utf8();
                self.token(TokenKind::Literal, c, start, self.last_index)
            }
            Some(c) => {
                self.last_index += 1 + c.len_utf8();
                self.token(TokenKind::Command, c, start, self.last_index)
            }
            None => {
                self.last_index += 1;
                self.token(TokenKind::Literal, "\\", start, start + 1)
            }
        }
    }
}

/// Scans a markup string into its token sequence.
#[must_use]
pub fn scan(markup: &str) -> Vec<Token> {
    Lexer::new(markup).scan()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(markup: &str) -> Vec<TokenKind> {
        scan(markup).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_scan_fraction() {
        let tokens = scan(r"\frac{a}{b}");
        let expected = [
            (TokenKind::Command, "frac"),
            (TokenKind::OpenGroup, "{"),
            (TokenKind::Literal, "a"),
            (TokenKind::CloseGroup, "}"),
            (TokenKind::OpenGroup, "{"),
            (TokenKind::Literal, "b"),
            (TokenKind::CloseGroup, "}"),
        ];
        assert_eq!(tokens.len(), expected.len());
        for (token, (kind, text)) in tokens.iter().zip(expected) {
            assert_eq!(token.kind, kind);
            assert_eq!(token.text, text);
        }
    }

    #[test]
    fn test_scan_environment() {
        let tokens = scan(r"\begin{pmatrix}a&b\\c&d\end{pmatrix}");
        assert_eq!(tokens[0].kind, TokenKind::EnvironmentBegin);
        assert_eq!(tokens[0].text, "pmatrix");
        assert_eq!(
            kinds(r"\begin{pmatrix}a&b\\c&d\end{pmatrix}"),
            vec![
                TokenKind::EnvironmentBegin,
                TokenKind::Literal,
                TokenKind::ColumnSeparator,
                TokenKind::Literal,
                TokenKind::RowSeparator,
                TokenKind::Literal,
                TokenKind::ColumnSeparator,
                TokenKind::Literal,
                TokenKind::EnvironmentEnd,
            ]
        );
    }

    #[test]
    fn test_bare_begin_degrades_to_command() {
        let tokens = scan(r"\begin x");
        assert_eq!(tokens[0].kind, TokenKind::Command);
        assert_eq!(tokens[0].text, "begin");
    }

    #[test]
    fn test_scan_scripts_and_numbers() {
        assert_eq!(
            kinds("x_1^{2.5}"),
            vec![
                TokenKind::Literal,
                TokenKind::SubscriptMarker,
                TokenKind::Literal,
                TokenKind::SuperscriptMarker,
                TokenKind::OpenGroup,
                TokenKind::Literal,
                TokenKind::CloseGroup,
            ]
        );
        let tokens = scan("12.5+3");
        assert_eq!(tokens[0].text, "12.5");
        assert_eq!(tokens[1].text, "+");
        assert_eq!(tokens[2].text, "3");
    }

    #[test]
    fn test_comment_and_whitespace_skipped() {
        let tokens = scan("a % comment\n b");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "a");
        assert_eq!(tokens[1].text, "b");
    }

    #[test]
    fn test_escaped_braces_are_literals() {
        let tokens = scan(r"\{x\}");
        assert_eq!(tokens[0].kind, TokenKind::Literal);
        assert_eq!(tokens[0].text, "{");
        assert_eq!(tokens[2].kind, TokenKind::Literal);
        assert_eq!(tokens[2].text, "}");
    }

    #[test]
    fn test_positions_reported() {
        let tokens = scan(r"a \frac");
        let loc = tokens[1].loc.as_ref().unwrap();
        assert_eq!(loc.start(), 2);
        assert_eq!(loc.end(), 7);
    }

    #[test]
    fn test_unterminated_group_still_tokenizes() {
        // balance problems are the builder's concern
        assert_eq!(
            kinds("{a"),
            vec![TokenKind::OpenGroup, TokenKind::Literal]
        );
    }
}
