use crate::types::{ErrorLocationProvider, SourceLocation};

/// Lexical classification of a scanned token.
///
/// The scanner never rejects input, so this set covers every shape a markup
/// string can decompose into. Structural balance (matching groups, matched
/// environment names) is checked later by the tree builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A backslash-prefixed identifier. The token text carries the
    /// identifier without the backslash (e.g. `frac` for `\frac`).
    Command,
    /// An opening brace delimiter `{`.
    OpenGroup,
    /// A closing brace delimiter `}`.
    CloseGroup,
    /// The subscript marker `_`.
    SubscriptMarker,
    /// The superscript marker `^`.
    SuperscriptMarker,
    /// A run of ordinary characters. Digit runs (with at most one decimal
    /// point) form a single token; every other character stands alone.
    Literal,
    /// `\begin{name}`. The token text carries the environment name.
    EnvironmentBegin,
    /// `\end{name}`. The token text carries the environment name.
    EnvironmentEnd,
    /// The row separator `\\` inside an environment.
    RowSeparator,
    /// The column separator `&` inside an environment.
    ColumnSeparator,
}

/// A single lexical token produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lexical classification of this token.
    pub kind: TokenKind,
    /// The token text. For [`TokenKind::Command`] this is the bare
    /// identifier; for environment delimiters it is the environment name.
    pub text: String,
    /// Where in the input this token was scanned from, for error reporting.
    pub loc: Option<SourceLocation>,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, text: String, loc: Option<SourceLocation>) -> Self {
        Self { kind, text, loc }
    }
}

impl ErrorLocationProvider for Token {
    fn loc(&self) -> Option<&SourceLocation> {
        self.loc.as_ref()
    }
}

impl ErrorLocationProvider for Option<Token> {
    fn loc(&self) -> Option<&SourceLocation> {
        let t = self.as_ref()?;
        t.loc.as_ref()
    }
}
