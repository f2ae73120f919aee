//! Error types for the expression engine.
//!
//! Parse failures are recoverable: the builder hands back a best-effort
//! partial tree next to the error. Validation failures reject the offending
//! input outright and report every independent finding. Nothing in this
//! module is fatal to the process; the coordinator converts all of these
//! into user-facing notices while keeping the last-known-good tree.

use std::fmt;

use strum::Display;
use thiserror::Error;

use crate::types::SourceLocation;

/// Error produced when markup cannot be built into a well-formed tree.
///
/// Carries the categorised reason plus the byte position and length of the
/// offending range, and renders a short excerpt of the input with that range
/// underlined.
#[derive(Debug, Error)]
#[error("parse error: {kind}{context}")]
pub struct ParseError {
    /// Categorised reason for the failure.
    #[source]
    pub kind: Box<ParseErrorKind>,
    /// The start position based on the passed-in token.
    pub position: Option<usize>,
    /// The length of affected text based on the passed-in token.
    pub length: Option<usize>,
    /// Additional context to render alongside the error.
    context: ParseErrorContext,
}

impl ParseError {
    /// Create a new `ParseError` with the given kind and no location.
    pub fn new<T: Into<ParseErrorKind>>(kind: T) -> Self {
        Self::from_kind(kind.into(), ParseErrorContext::None, None, None)
    }

    /// Create a new `ParseError` with location context from a token.
    pub fn with_token<T: Into<ParseErrorKind>>(kind: T, token: &dyn ErrorLocationProvider) -> Self {
        let mut position = None;
        let mut length = None;
        let context = token.loc().filter(|loc| loc.start() <= loc.end()).map_or(
            ParseErrorContext::None,
            |loc| {
                let start = loc.start();
                let end = loc.end();
                position = Some(start);
                length = Some(end.saturating_sub(start));
                ParseErrorContext::Location(loc.clone())
            },
        );

        Self::from_kind(kind.into(), context, position, length)
    }

    fn from_kind(
        kind: ParseErrorKind,
        context: ParseErrorContext,
        position: Option<usize>,
        length: Option<usize>,
    ) -> Self {
        Self {
            kind: Box::new(kind),
            position,
            length,
            context,
        }
    }
}

/// Describes the specific reason for a [`ParseError`].
///
/// Both variants are recoverable: the builder returns a best-effort partial
/// tree alongside the error so callers can still render up to the failure
/// point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// An open delimiter without a matching close, or vice versa. Also
    /// covers a `\begin`/`\end` pair whose environment names disagree.
    #[error("unbalanced group")]
    UnbalancedGroup,
    /// A command's required argument groups are missing, or an environment's
    /// rows have unequal cell counts.
    #[error(r"\{command} expects {expected} argument(s), found {found}")]
    ArityMismatch {
        /// The command or environment that was short of arguments.
        command: String,
        /// How many arguments (or cells per row) were required.
        expected: usize,
        /// How many were actually present.
        found: usize,
    },
}

#[derive(Debug)]
enum ParseErrorContext {
    None,
    Location(SourceLocation),
}

impl fmt::Display for ParseErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Location(SourceLocation { input, start, end }) => {
                let input_len = input.len();
                if *start == input_len {
                    write!(f, " at end of input: ")?;
                } else {
                    write!(f, " at position {}: ", start + 1)?;
                }

                let mut prefix_start = start.saturating_sub(15);
                prefix_start = adjust_char_boundary(input, prefix_start, false);
                if prefix_start > 0 {
                    write!(f, "\u{2026}")?;
                }
                write!(f, "{}", &input[prefix_start..*start])?;
                if end > start {
                    for c in input[*start..*end].chars() {
                        write!(f, "{c}\u{0332}")?;
                    }
                }
                let mut suffix_end = (*end + 15).min(input_len);
                suffix_end = adjust_char_boundary(input, suffix_end, true);
                if suffix_end < input_len {
                    write!(f, "{}", &input[*end..suffix_end])?;
                    write!(f, "\u{2026}")?;
                } else {
                    write!(f, "{}", &input[*end..])?;
                }
                Ok(())
            }
        }
    }
}

const fn adjust_char_boundary(input: &str, mut index: usize, forward: bool) -> usize {
    if forward {
        while index < input.len() && !input.is_char_boundary(index) {
            index += 1;
        }
    } else {
        while index > 0 && !input.is_char_boundary(index) {
            index -= 1;
        }
    }
    index
}

/// Trait for types that can provide error location information.
pub trait ErrorLocationProvider {
    /// Get the source location if available.
    fn loc(&self) -> Option<&SourceLocation>;
}

/// The class of dangerous content a validator pattern matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum PatternClass {
    /// An embedded `<script>` payload.
    ScriptPayload,
    /// A protocol-scheme reference such as `javascript:` or `data:`.
    ProtocolScheme,
    /// A filesystem or include-style command such as `\input`.
    FileAccess,
    /// A macro-definition command such as `\def` or `\newcommand`.
    MacroDefinition,
    /// A raw markup tag that is not a script payload.
    MarkupTag,
}

/// A single finding reported by the complexity and security validator.
///
/// These are non-recoverable for the offending input: the edit is rejected
/// and reported, never silently truncated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The markup exceeds the configured length ceiling.
    #[error("markup is {length} characters long, exceeding the limit of {limit}")]
    TooLong {
        /// Character count of the rejected markup.
        length: usize,
        /// The configured ceiling.
        limit: usize,
    },
    /// A dangerous content pattern matched.
    #[error("markup contains unsafe content: {class}")]
    UnsafeContent {
        /// Which pattern class matched.
        class: PatternClass,
    },
    /// A command identifier outside the allow-list (or on the deny-list).
    #[error(r"command \{name} is not allowed")]
    DisallowedCommand {
        /// The offending identifier.
        name: String,
    },
    /// The expression nests deeper than the configured ceiling.
    #[error("expression nests {depth} levels deep, exceeding the limit of {limit}")]
    TooDeep {
        /// Measured structural depth.
        depth: usize,
        /// The configured ceiling.
        limit: usize,
    },
    /// A matrix exceeds the configured dimension ceilings.
    #[error("matrix of {rows}x{cols} exceeds the limit of {max_rows}x{max_cols}")]
    MatrixTooLarge {
        /// Row count of the offending matrix.
        rows: usize,
        /// Column count of the offending matrix.
        cols: usize,
        /// The configured row ceiling.
        max_rows: usize,
        /// The configured column ceiling.
        max_cols: usize,
    },
}

/// Error produced when a placeholder fill cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillError {
    /// The path does not locate a node in the current tree.
    #[error("path does not locate a node in the tree")]
    InvalidPath,
    /// Applying the replacement would push nesting past the ceiling. The
    /// tree is left untouched.
    #[error("fill would nest {depth} levels deep, exceeding the limit of {limit}")]
    TooDeep {
        /// Depth the tree would reach after the fill.
        depth: usize,
        /// The configured ceiling.
        limit: usize,
    },
}

/// Unified error surface for the engine's entry points.
///
/// The coordinator catches every variant, surfaces it as a notice, and
/// leaves the canonical tree in its last-known-good state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Markup failed to build into a tree.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Markup was rejected by the validator.
    #[error("markup failed validation: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
    /// A structural edit could not be applied.
    #[error(transparent)]
    Fill(#[from] FillError),
    /// A template was requested that was never registered.
    #[error("unknown template: {name}")]
    UnknownTemplate {
        /// The requested template name.
        name: String,
    },
}

impl From<Vec<ValidationError>> for EngineError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Token;
    use crate::types::TokenKind;
    use std::sync::Arc;

    #[test]
    fn test_parse_error_creation() {
        let error = ParseError::new(ParseErrorKind::UnbalancedGroup);
        assert!(matches!(
            error.kind.as_ref(),
            ParseErrorKind::UnbalancedGroup
        ));
        assert!(error.to_string().contains("parse error: unbalanced group"));
        assert_eq!(error.position, None);
        assert_eq!(error.length, None);
    }

    #[test]
    fn test_parse_error_with_token_context() {
        let input = Arc::from(r"\frac{a}{b} } trailing");
        let loc = SourceLocation::new(Arc::clone(&input), 12, 13);
        let token = Token::new(TokenKind::CloseGroup, "}".to_owned(), Some(loc));

        let error = ParseError::with_token(ParseErrorKind::UnbalancedGroup, &token);
        let rendered = error.to_string();
        assert!(rendered.contains("unbalanced group"));
        assert!(rendered.contains("at position 13"));
        assert_eq!(error.position, Some(12));
        assert_eq!(error.length, Some(1));
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::DisallowedCommand {
            name: "input".to_owned(),
        };
        assert_eq!(error.to_string(), r"command \input is not allowed");

        let error = EngineError::Validation(vec![
            ValidationError::TooLong {
                length: 12,
                limit: 10,
            },
            ValidationError::UnsafeContent {
                class: PatternClass::ScriptPayload,
            },
        ]);
        let rendered = error.to_string();
        assert!(rendered.contains("12 characters"));
        assert!(rendered.contains("script-payload"));
    }
}
