//! Complexity and security validation of incoming markup.
//!
//! Validation runs before any markup reaches the tree builder. It enforces
//! the configured size and nesting ceilings, screens the raw text against
//! the dangerous-content patterns, and checks every command identifier
//! against the allow/deny lists. Findings are collected, not short-circuited,
//! so one pass reports everything wrong with an edit.
//!
//! [`sanitize`] is the companion strip operation: it removes every match of
//! the dangerous-content patterns and is idempotent, so a sanitized string
//! can be stored and revalidated without drifting further.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexer::scan;
use crate::parser::{ExprNode, build};
use crate::types::{KeySet, PatternClass, Settings, TokenKind, ValidationError};

/// The dangerous-content patterns, paired with the class they report.
///
/// Order matters: script payloads are matched before generic markup tags so
/// a `<script>` block is reported under its own class.
static UNSAFE_PATTERNS: Lazy<Vec<(PatternClass, Regex)>> = Lazy::new(|| {
    [
        (
            PatternClass::ScriptPayload,
            r"(?is)<\s*script\b[^>]*>.*?<\s*/\s*script\s*>|<\s*script\b[^>]*/?\s*>",
        ),
        (
            PatternClass::ProtocolScheme,
            r"(?i)\b(?:javascript|vbscript|data|file)\s*:",
        ),
        (
            PatternClass::FileAccess,
            r"(?i)\\(?:input|include|includegraphics|openin|openout|read|write|immediate|special|catcode|usepackage|documentclass)\b",
        ),
        (
            PatternClass::MacroDefinition,
            r"(?i)\\(?:def|edef|gdef|xdef|newcommand|renewcommand|providecommand|newenvironment|renewenvironment|let|futurelet|csname|endcsname|expandafter|noexpand)\b",
        ),
        (PatternClass::MarkupTag, r"(?is)<\s*/?\s*[a-z][^>]*>"),
    ]
    .into_iter()
    .map(|(class, pattern)| (class, Regex::new(pattern).unwrap()))
    .collect()
});

/// Strips every dangerous-content match from the markup.
///
/// Runs the pattern set to a fixed point, so content revealed by an earlier
/// removal (`<scr<script>ipt>` style splicing) is removed as well. The
/// result is idempotent: sanitizing sanitized markup is a no-op.
#[must_use]
pub fn sanitize(markup: &str) -> Cow<'_, str> {
    let mut current = Cow::Borrowed(markup);
    loop {
        let mut changed = false;
        for (_, pattern) in UNSAFE_PATTERNS.iter() {
            if let Cow::Owned(stripped) = pattern.replace_all(&current, "") {
                current = Cow::Owned(stripped);
                changed = true;
            }
        }
        if !changed {
            return current;
        }
    }
}

/// Validates markup against the configured limits and pattern screen.
///
/// Returns the sanitized markup when no finding was raised; the returned
/// string then equals the input. On failure every independent finding is
/// reported: the caller rejects the edit and can show all of them at once.
pub fn validate(markup: &str, settings: &Settings) -> Result<String, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let length = markup.chars().count();
    if length > settings.max_length {
        errors.push(ValidationError::TooLong {
            length,
            limit: settings.max_length,
        });
    }

    for (class, pattern) in UNSAFE_PATTERNS.iter() {
        if pattern.is_match(markup) {
            errors.push(ValidationError::UnsafeContent { class: *class });
        }
    }

    let tokens = scan(markup);

    // allow/deny screening over the scanned command identifiers; each
    // offender is reported once no matter how often it appears
    let mut reported: KeySet<&str> = KeySet::default();
    for token in &tokens {
        let is_identifier = matches!(
            token.kind,
            TokenKind::Command | TokenKind::EnvironmentBegin | TokenKind::EnvironmentEnd
        );
        if is_identifier
            && !settings.is_command_allowed(&token.text)
            && reported.insert(token.text.as_str())
        {
            errors.push(ValidationError::DisallowedCommand {
                name: token.text.clone(),
            });
        }
    }

    // structural limits are measured on the best-effort tree so that depth
    // and matrix size are enforced even while the input is unbalanced
    let outcome = build(tokens);
    check_tree(&outcome.root, settings, &mut errors);

    if errors.is_empty() {
        Ok(sanitize(markup).into_owned())
    } else {
        Err(errors)
    }
}

/// Checks the structural ceilings: overall nesting depth, and the dimensions
/// of every matrix in the tree.
fn check_tree(root: &ExprNode, settings: &Settings, errors: &mut Vec<ValidationError>) {
    let depth = root.depth();
    if depth > settings.max_nesting_depth {
        errors.push(ValidationError::TooDeep {
            depth,
            limit: settings.max_nesting_depth,
        });
    }
    check_matrices(root, settings, errors);
}

fn check_matrices(node: &ExprNode, settings: &Settings, errors: &mut Vec<ValidationError>) {
    if let ExprNode::Matrix { rows, .. } = node {
        let row_count = rows.len();
        let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        if row_count > settings.max_rows || col_count > settings.max_cols {
            errors.push(ValidationError::MatrixTooLarge {
                rows: row_count,
                cols: col_count,
                max_rows: settings.max_rows,
                max_cols: settings.max_cols,
            });
        }
    }
    for child in node.children() {
        check_matrices(child, settings, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn test_clean_markup_passes_unchanged() {
        let markup = r"\frac{a}{b}+\sqrt{x}";
        assert_eq!(validate(markup, &settings()).unwrap(), markup);
    }

    #[test]
    fn test_length_ceiling() {
        let tight = Settings::builder().max_length(8).build();
        let errors = validate(r"x+y+z+a+b", &tight).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::TooLong {
                length: 9,
                limit: 8
            }]
        );
    }

    #[test]
    fn test_script_payload_detected() {
        let errors = validate(r"x+<script>alert(1)</script>", &settings()).unwrap_err();
        assert!(errors.contains(&ValidationError::UnsafeContent {
            class: PatternClass::ScriptPayload,
        }));
    }

    #[test]
    fn test_protocol_scheme_detected() {
        let errors = validate("javascript:alert(1)", &settings()).unwrap_err();
        assert!(errors.contains(&ValidationError::UnsafeContent {
            class: PatternClass::ProtocolScheme,
        }));
    }

    #[test]
    fn test_file_access_commands_detected() {
        let errors = validate(r"\input{/etc/passwd}", &settings()).unwrap_err();
        assert!(errors.contains(&ValidationError::UnsafeContent {
            class: PatternClass::FileAccess,
        }));
        // the identifier is also outside the allow-list
        assert!(errors.contains(&ValidationError::DisallowedCommand {
            name: "input".to_owned(),
        }));
    }

    #[test]
    fn test_macro_definition_detected() {
        let errors = validate(r"\def\x{y}", &settings()).unwrap_err();
        assert!(errors.contains(&ValidationError::UnsafeContent {
            class: PatternClass::MacroDefinition,
        }));
    }

    #[test]
    fn test_disallowed_command_reported_once() {
        let errors = validate(r"\evil{a}\evil{b}", &settings()).unwrap_err();
        let disallowed: Vec<_> = errors
            .iter()
            .filter(|e| matches!(e, ValidationError::DisallowedCommand { .. }))
            .collect();
        assert_eq!(disallowed.len(), 1);
    }

    #[test]
    fn test_allow_list_extends_builtins() {
        let mut allowed = KeySet::default();
        allowed.insert("widehat".to_owned());
        let settings = Settings::builder().allowed_commands(allowed).build();
        assert!(validate(r"\widehat{x}", &settings).is_ok());
    }

    #[test]
    fn test_deny_list_overrides_builtins() {
        let mut denied = KeySet::default();
        denied.insert("frac".to_owned());
        let settings = Settings::builder().denied_commands(denied).build();
        let errors = validate(r"\frac{a}{b}", &settings).unwrap_err();
        assert!(errors.contains(&ValidationError::DisallowedCommand {
            name: "frac".to_owned(),
        }));
    }

    #[test]
    fn test_depth_ceiling() {
        let shallow = Settings::builder().max_nesting_depth(2).build();
        assert!(validate(r"\frac{\frac{a}{b}}{c}", &shallow).is_ok());
        let errors = validate(r"\frac{\frac{\frac{a}{b}}{c}}{d}", &shallow).unwrap_err();
        assert!(errors.contains(&ValidationError::TooDeep { depth: 3, limit: 2 }));
    }

    #[test]
    fn test_matrix_dimension_ceiling() {
        let tiny = Settings::builder().max_rows(2).max_cols(2).build();
        assert!(validate(r"\begin{pmatrix}a&b\\c&d\end{pmatrix}", &tiny).is_ok());
        let errors =
            validate(r"\begin{pmatrix}a&b\\c&d\\e&f\end{pmatrix}", &tiny).unwrap_err();
        assert!(errors.contains(&ValidationError::MatrixTooLarge {
            rows: 3,
            cols: 2,
            max_rows: 2,
            max_cols: 2,
        }));
    }

    #[test]
    fn test_sanitize_strips_payloads() {
        assert_eq!(sanitize("x+<script>alert(1)</script>y"), "x+y");
        assert_eq!(sanitize(r"\frac{a}{b}"), r"\frac{a}{b}");
    }

    #[test]
    fn test_sanitize_reaches_a_fixed_point() {
        // removal splices the inner tag back together; one pass is not enough
        let spliced = "<scr<script></script>ipt>alert(1)</script>";
        let sanitized = sanitize(spliced).into_owned();
        assert_eq!(sanitize(&sanitized), sanitized);
        assert!(!sanitized.to_ascii_lowercase().contains("<script"));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for markup in [
            "x+<script src=a>b</script>",
            "javascript:void(0)",
            r"\def\x{1}+\frac{a}{b}",
            "plain x+y",
        ] {
            let once = sanitize(markup).into_owned();
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_multiple_findings_reported_together() {
        let tight = Settings::builder().max_length(10).build();
        let errors = validate("<script>alert(1)</script>", &tight).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
