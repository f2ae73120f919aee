//! The tree builder: recursive descent from a token sequence to an
//! expression tree.
//!
//! One production per node kind; a command token dispatches to a
//! kind-specific sub-parser that knows its argument arity. Unknown commands
//! are not errors, they become [`ExprNode::Function`] leaves carrying the
//! raw name so markup the engine does not specially understand still
//! round-trips.
//!
//! The builder only fails on structurally unbalanced input, and even then
//! recoverably: [`build`] always returns a best-effort tree, with the first
//! error (if any) alongside, so callers can render and highlight up to the
//! failure point.

use phf::phf_set;

use crate::types::{ParseError, ParseErrorKind, SourceLocation, Token, TokenKind};

pub mod expr_node;

pub use expr_node::{ExprNode, FormatStyle, NodeKind};

/// Command identifiers parsed as named function leaves.
static FUNCTION_NAMES: phf::Set<&'static str> = phf_set! {
    "sin", "cos", "tan", "cot", "sec", "csc", "sinh", "cosh", "tanh",
    "log", "ln", "exp", "min", "max", "det", "gcd", "deg", "dim", "arg",
};

/// Command identifiers parsed as named variables.
static GREEK_LETTERS: phf::Set<&'static str> = phf_set! {
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta",
    "eta", "theta", "vartheta", "iota", "kappa", "lambda", "mu", "nu",
    "xi", "pi", "varpi", "rho", "sigma", "varsigma", "tau", "upsilon",
    "phi", "varphi", "chi", "psi", "omega",
    "Gamma", "Delta", "Theta", "Lambda", "Xi", "Pi", "Sigma", "Upsilon",
    "Phi", "Psi", "Omega",
};

/// Command identifiers parsed as named operator symbols.
static SYMBOL_OPERATORS: phf::Set<&'static str> = phf_set! {
    "times", "cdot", "pm", "mp", "div", "ast", "star", "circ", "bullet",
    "leq", "geq", "neq", "approx", "equiv", "sim", "propto", "ll", "gg",
    "subset", "supset", "subseteq", "supseteq", "in", "notin", "ni",
    "cup", "cap", "setminus", "to", "gets", "leftarrow", "rightarrow",
    "Leftarrow", "Rightarrow", "leftrightarrow", "mapsto",
    "infty", "partial", "nabla", "forall", "exists", "neg", "emptyset",
    "angle", "perp", "mid", "ldots", "cdots", "vdots", "ddots", "prime",
    "hbar", "ell", "Re", "Im", "aleph", "wp",
};

/// The result of building a token sequence: a best-effort tree, plus the
/// first structural error encountered, if any.
#[derive(Debug)]
pub struct ParseOutcome {
    /// The built tree. Complete when `error` is `None`, otherwise a partial
    /// tree patched up with placeholders around the failure.
    pub root: ExprNode,
    /// The first structural failure, if the input was unbalanced or short
    /// of required arguments.
    pub error: Option<ParseError>,
}

impl ParseOutcome {
    /// Converts to a strict result, discarding the partial tree on error.
    pub fn into_result(self) -> Result<ExprNode, ParseError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.root),
        }
    }
}

/// Builds a best-effort expression tree from a token sequence.
#[must_use]
pub fn build(tokens: Vec<Token>) -> ParseOutcome {
    let mut parser = Parser {
        tokens,
        index: 0,
        error: None,
    };
    let root = parser.parse_sequence(SequenceEnd::Input);
    ParseOutcome {
        root,
        error: parser.error,
    }
}

/// Builds an expression tree, rejecting structurally unbalanced input.
pub fn try_build(tokens: Vec<Token>) -> Result<ExprNode, ParseError> {
    build(tokens).into_result()
}

/// What terminates the sequence currently being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceEnd {
    /// End of input.
    Input,
    /// A matching `}`.
    Group,
    /// A cell boundary inside an environment (`&`, `\\` or `\end`).
    Cell,
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    error: Option<ParseError>,
}

/// Collapses a parsed item list: empty becomes a placeholder, a singleton
/// becomes the item itself. The builder never emits one-element sequences,
/// which keeps structural round-trip equality well defined.
fn collapse(mut items: Vec<ExprNode>) -> ExprNode {
    match items.len() {
        0 => ExprNode::Placeholder,
        1 => items.remove(0),
        _ => ExprNode::Sequence(items),
    }
}

/// Classifies a literal token into its leaf node.
fn classify(text: &str) -> ExprNode {
    if text.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return ExprNode::Literal(text.to_owned());
    }
    let mut chars = text.chars();
    if let Some(c) = chars.next()
        && chars.next().is_none()
        && c.is_alphabetic()
    {
        return ExprNode::Variable(text.to_owned());
    }
    ExprNode::Operator(text.to_owned())
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Records the first structural error; later ones are byproducts of the
    /// recovery and would only obscure the root cause.
    fn record(&mut self, error: ParseError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// An error positioned at the very end of the input.
    fn record_at_end(&mut self, kind: ParseErrorKind) {
        let loc = self.tokens.last().and_then(|t| t.loc.as_ref()).map(|loc| {
            let len = loc.input.len();
            SourceLocation::new(std::sync::Arc::clone(&loc.input), len, len)
        });
        let error = match loc {
            Some(loc) => ParseError::with_token(kind, &loc),
            None => ParseError::new(kind),
        };
        self.record(error);
    }

    fn parse_sequence(&mut self, end: SequenceEnd) -> ExprNode {
        let mut items = Vec::new();
        loop {
            let Some(kind) = self.peek_kind() else {
                if end == SequenceEnd::Group {
                    self.record_at_end(ParseErrorKind::UnbalancedGroup);
                }
                break;
            };
            match kind {
                TokenKind::CloseGroup => {
                    if end == SequenceEnd::Group {
                        self.bump();
                        break;
                    }
                    // stray close brace: report, skip, keep going
                    let token = self.bump();
                    self.record(ParseError::with_token(
                        ParseErrorKind::UnbalancedGroup,
                        &token,
                    ));
                }
                TokenKind::EnvironmentEnd => {
                    if end == SequenceEnd::Cell {
                        break;
                    }
                    let token = self.bump();
                    self.record(ParseError::with_token(
                        ParseErrorKind::UnbalancedGroup,
                        &token,
                    ));
                }
                TokenKind::RowSeparator | TokenKind::ColumnSeparator
                    if end == SequenceEnd::Cell =>
                {
                    break;
                }
                TokenKind::RowSeparator => {
                    // outside an environment these are plain operators
                    self.bump();
                    items.push(ExprNode::Operator(r"\\".to_owned()));
                }
                TokenKind::ColumnSeparator => {
                    self.bump();
                    items.push(ExprNode::Operator("&".to_owned()));
                }
                _ => items.push(self.parse_scripted_atom()),
            }
        }
        collapse(items)
    }

    /// Parses one atom together with any trailing `^`/`_` script chains.
    /// A leading marker gets an implicit empty base.
    fn parse_scripted_atom(&mut self) -> ExprNode {
        let mut base = match self.peek_kind() {
            Some(TokenKind::SubscriptMarker | TokenKind::SuperscriptMarker) => {
                ExprNode::Placeholder
            }
            _ => self.parse_atom(),
        };
        loop {
            match self.peek_kind() {
                Some(TokenKind::SuperscriptMarker) => {
                    let marker = self.bump();
                    let exponent = self.parse_script_arg(marker.as_ref());
                    base = ExprNode::Power {
                        base: Box::new(base),
                        exponent: Box::new(exponent),
                    };
                }
                Some(TokenKind::SubscriptMarker) => {
                    let marker = self.bump();
                    let subscript = self.parse_script_arg(marker.as_ref());
                    base = ExprNode::Subscript {
                        base: Box::new(base),
                        subscript: Box::new(subscript),
                    };
                }
                _ => break,
            }
        }
        base
    }

    fn parse_atom(&mut self) -> ExprNode {
        let Some(token) = self.bump() else {
            return ExprNode::Placeholder;
        };
        match token.kind {
            TokenKind::Literal => classify(&token.text),
            TokenKind::Command => self.parse_command(&token),
            TokenKind::OpenGroup => self.parse_sequence(SequenceEnd::Group),
            TokenKind::EnvironmentBegin => self.parse_matrix(&token),
            // the caller filters everything else out
            _ => ExprNode::Placeholder,
        }
    }

    /// Parses one required argument: a brace group, or a single following
    /// atomic token. Returns `None` when the argument is missing.
    fn parse_argument(&mut self) -> Option<ExprNode> {
        match self.peek_kind()? {
            TokenKind::OpenGroup => {
                self.bump();
                Some(self.parse_sequence(SequenceEnd::Group))
            }
            TokenKind::Literal => {
                let token = self.bump()?;
                Some(classify(&token.text))
            }
            TokenKind::Command => {
                let token = self.bump()?;
                Some(self.parse_command(&token))
            }
            TokenKind::EnvironmentBegin => {
                let token = self.bump()?;
                Some(self.parse_matrix(&token))
            }
            _ => None,
        }
    }

    /// Parses the argument of a `^` or `_` marker. A missing argument is an
    /// arity mismatch recovered with a placeholder.
    fn parse_script_arg(&mut self, marker: Option<&Token>) -> ExprNode {
        match self.peek_kind() {
            Some(
                TokenKind::OpenGroup
                | TokenKind::Literal
                | TokenKind::Command
                | TokenKind::EnvironmentBegin,
            ) => self.parse_argument().unwrap_or(ExprNode::Placeholder),
            Some(TokenKind::SubscriptMarker | TokenKind::SuperscriptMarker) => {
                // doubled markers chain around an empty slot
                ExprNode::Placeholder
            }
            _ => {
                let kind = ParseErrorKind::ArityMismatch {
                    command: marker.map_or_else(String::new, |m| m.text.clone()),
                    expected: 1,
                    found: 0,
                };
                let error = match marker {
                    Some(marker) => ParseError::with_token(kind, marker),
                    None => ParseError::new(kind),
                };
                self.record(error);
                ExprNode::Placeholder
            }
        }
    }

    fn parse_command(&mut self, token: &Token) -> ExprNode {
        let name = token.text.as_str();
        match name {
            "frac" | "dfrac" | "tfrac" => self.parse_fraction(token),
            "sqrt" => self.parse_root(token),
            "int" | "oint" => {
                let (lower, upper, operand) = self.parse_big_operator(token);
                ExprNode::Integral {
                    lower,
                    upper,
                    operand,
                }
            }
            "sum" => {
                let (lower, upper, operand) = self.parse_big_operator(token);
                ExprNode::Sum {
                    lower,
                    upper,
                    operand,
                }
            }
            "prod" => {
                let (lower, upper, operand) = self.parse_big_operator(token);
                ExprNode::Product {
                    lower,
                    upper,
                    operand,
                }
            }
            "lim" => self.parse_limit(token),
            "text" => {
                let body = self.parse_raw_group(token);
                if body.is_none() {
                    self.record_arity(token, 1, 0);
                }
                ExprNode::TextRun(body.unwrap_or_default())
            }
            "textcolor" => {
                let color = self.parse_raw_group(token);
                let body = self.parse_argument();
                let found = usize::from(color.is_some()) + usize::from(body.is_some());
                if found < 2 {
                    self.record_arity(token, 2, found);
                }
                ExprNode::FormatWrapper {
                    style: FormatStyle::Color(color.unwrap_or_default()),
                    body: Box::new(body.unwrap_or(ExprNode::Placeholder)),
                }
            }
            "mathbf" | "mathit" | "mathrm" | "underline" => {
                let style = match name {
                    "mathbf" => FormatStyle::Bold,
                    "mathit" => FormatStyle::Italic,
                    "mathrm" => FormatStyle::Roman,
                    _ => FormatStyle::Underline,
                };
                let body = self.parse_argument();
                if body.is_none() {
                    self.record_arity(token, 1, 0);
                }
                ExprNode::FormatWrapper {
                    style,
                    body: Box::new(body.unwrap_or(ExprNode::Placeholder)),
                }
            }
            _ if FUNCTION_NAMES.contains(name) => ExprNode::Function {
                name: name.to_owned(),
            },
            _ if GREEK_LETTERS.contains(name) => ExprNode::Variable(name.to_owned()),
            _ if SYMBOL_OPERATORS.contains(name) => ExprNode::Operator(name.to_owned()),
            // unknown commands round-trip as function leaves
            _ => ExprNode::Function {
                name: name.to_owned(),
            },
        }
    }

    fn record_arity(&mut self, token: &Token, expected: usize, found: usize) {
        self.record(ParseError::with_token(
            ParseErrorKind::ArityMismatch {
                command: token.text.clone(),
                expected,
                found,
            },
            token,
        ));
    }

    fn parse_fraction(&mut self, token: &Token) -> ExprNode {
        let numerator = self.parse_argument();
        let denominator = if numerator.is_some() {
            self.parse_argument()
        } else {
            None
        };
        let found = usize::from(numerator.is_some()) + usize::from(denominator.is_some());
        if found < 2 {
            self.record_arity(token, 2, found);
        }
        ExprNode::Fraction {
            numerator: Box::new(numerator.unwrap_or(ExprNode::Placeholder)),
            denominator: Box::new(denominator.unwrap_or(ExprNode::Placeholder)),
        }
    }

    fn parse_root(&mut self, token: &Token) -> ExprNode {
        let index = if self.peek_is_literal("[") {
            self.bump();
            Some(self.parse_bracket_group())
        } else {
            None
        };
        let radicand = self.parse_argument();
        if radicand.is_none() {
            self.record_arity(token, 1, 0);
        }
        ExprNode::Root {
            radicand: Box::new(radicand.unwrap_or(ExprNode::Placeholder)),
            index: index.map(Box::new),
        }
    }

    fn peek_is_literal(&self, text: &str) -> bool {
        self.peek()
            .is_some_and(|t| t.kind == TokenKind::Literal && t.text == text)
    }

    /// Parses up to the closing `]` of an optional bracket argument.
    fn parse_bracket_group(&mut self) -> ExprNode {
        let mut items = Vec::new();
        loop {
            if self.peek().is_none() {
                self.record_at_end(ParseErrorKind::UnbalancedGroup);
                break;
            }
            if self.peek_is_literal("]") {
                self.bump();
                break;
            }
            if matches!(
                self.peek_kind(),
                Some(TokenKind::CloseGroup | TokenKind::EnvironmentEnd)
            ) {
                let token = self.peek().cloned();
                self.record(ParseError::with_token(
                    ParseErrorKind::UnbalancedGroup,
                    &token,
                ));
                break;
            }
            items.push(self.parse_scripted_atom());
        }
        collapse(items)
    }

    /// Parses the optional `_`/`^` bound groups and the required trailing
    /// operand of a big operator.
    fn parse_big_operator(
        &mut self,
        token: &Token,
    ) -> (
        Option<Box<ExprNode>>,
        Option<Box<ExprNode>>,
        Box<ExprNode>,
    ) {
        let mut lower = None;
        let mut upper = None;
        loop {
            match self.peek_kind() {
                Some(TokenKind::SubscriptMarker) if lower.is_none() => {
                    let marker = self.bump();
                    lower = Some(Box::new(self.parse_script_arg(marker.as_ref())));
                }
                Some(TokenKind::SuperscriptMarker) if upper.is_none() => {
                    let marker = self.bump();
                    upper = Some(Box::new(self.parse_script_arg(marker.as_ref())));
                }
                _ => break,
            }
        }
        let operand = self.parse_argument();
        if operand.is_none() {
            self.record_arity(token, 1, 0);
        }
        (
            lower,
            upper,
            Box::new(operand.unwrap_or(ExprNode::Placeholder)),
        )
    }

    fn parse_limit(&mut self, token: &Token) -> ExprNode {
        let subscript = if self.peek_kind() == Some(TokenKind::SubscriptMarker) {
            let marker = self.bump();
            Some(Box::new(self.parse_script_arg(marker.as_ref())))
        } else {
            None
        };
        let operand = self.parse_argument();
        if operand.is_none() {
            self.record_arity(token, 1, 0);
        }
        ExprNode::Limit {
            subscript,
            operand: Box::new(operand.unwrap_or(ExprNode::Placeholder)),
        }
    }

    /// Reads a brace group verbatim, preferring the original input slice so
    /// interior whitespace survives. Returns `None` if no group follows.
    fn parse_raw_group(&mut self, command: &Token) -> Option<String> {
        if self.peek_kind() != Some(TokenKind::OpenGroup) {
            return None;
        }
        self.bump();

        let mut depth = 1usize;
        let mut first: Option<SourceLocation> = None;
        let mut last: Option<SourceLocation> = None;
        let mut fallback = String::new();
        loop {
            let Some(token) = self.bump() else {
                self.record(ParseError::with_token(
                    ParseErrorKind::UnbalancedGroup,
                    command,
                ));
                break;
            };
            match token.kind {
                TokenKind::OpenGroup => depth += 1,
                TokenKind::CloseGroup => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            if first.is_none() {
                first = token.loc.clone();
            }
            last = token.loc.clone();
            fallback.push_str(&surface(&token));
        }

        if let Some(range) = SourceLocation::range(first, last) {
            return Some(range.input()[range.start..range.end].to_owned());
        }
        Some(fallback)
    }

    fn parse_matrix(&mut self, begin: &Token) -> ExprNode {
        let environment = begin.text.clone();
        let mut rows: Vec<Vec<ExprNode>> = Vec::new();
        let mut row: Vec<ExprNode> = Vec::new();
        loop {
            row.push(self.parse_sequence(SequenceEnd::Cell));
            match self.peek_kind() {
                None => {
                    // environment never closed
                    self.record(ParseError::with_token(
                        ParseErrorKind::UnbalancedGroup,
                        begin,
                    ));
                    rows.push(std::mem::take(&mut row));
                    break;
                }
                Some(TokenKind::ColumnSeparator) => {
                    self.bump();
                }
                Some(TokenKind::RowSeparator) => {
                    self.bump();
                    rows.push(std::mem::take(&mut row));
                }
                Some(TokenKind::EnvironmentEnd) => {
                    let end = self.bump();
                    if end.as_ref().is_some_and(|e| e.text != environment) {
                        self.record(ParseError::with_token(
                            ParseErrorKind::UnbalancedGroup,
                            &end,
                        ));
                    }
                    rows.push(std::mem::take(&mut row));
                    break;
                }
                // parse_sequence(Cell) only stops on the kinds above
                Some(_) => break,
            }
        }

        // a terminal \\ leaves one empty trailing row; drop it
        if rows.len() > 1
            && let Some(tail) = rows.last()
            && tail.len() == 1
            && tail[0] == ExprNode::Placeholder
        {
            rows.pop();
        }

        // enforce rectangularity: report ragged input, pad the short rows
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        if let Some(short) = rows.iter().map(Vec::len).min()
            && short != cols
        {
            self.record(ParseError::with_token(
                ParseErrorKind::ArityMismatch {
                    command: environment.clone(),
                    expected: cols,
                    found: short,
                },
                begin,
            ));
            for row in &mut rows {
                row.resize(cols, ExprNode::Placeholder);
            }
        }

        ExprNode::Matrix { environment, rows }
    }
}

/// Reconstructs the surface text of a token, for raw groups scanned from
/// inputs without location data.
fn surface(token: &Token) -> String {
    match token.kind {
        TokenKind::Command => format!("\\{}", token.text),
        TokenKind::EnvironmentBegin => format!("\\begin{{{}}}", token.text),
        TokenKind::EnvironmentEnd => format!("\\end{{{}}}", token.text),
        TokenKind::RowSeparator => r"\\".to_owned(),
        TokenKind::Literal if token.text == "{" => r"\{".to_owned(),
        TokenKind::Literal if token.text == "}" => r"\}".to_owned(),
        _ => token.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::scan;

    fn build_str(markup: &str) -> ParseOutcome {
        build(scan(markup))
    }

    fn try_build_str(markup: &str) -> Result<ExprNode, ParseError> {
        try_build(scan(markup))
    }

    #[test]
    fn test_fraction_of_literals() {
        let root = try_build_str(r"\frac{a}{b}").unwrap();
        assert_eq!(
            root,
            ExprNode::Fraction {
                numerator: Box::new(ExprNode::Variable("a".to_owned())),
                denominator: Box::new(ExprNode::Variable("b".to_owned())),
            }
        );
    }

    #[test]
    fn test_sequence_of_atoms() {
        let root = try_build_str("x+1").unwrap();
        assert_eq!(
            root,
            ExprNode::Sequence(vec![
                ExprNode::Variable("x".to_owned()),
                ExprNode::Operator("+".to_owned()),
                ExprNode::Literal("1".to_owned()),
            ])
        );
    }

    #[test]
    fn test_scripts_nest_in_encounter_order() {
        let root = try_build_str("x_i^2").unwrap();
        assert_eq!(
            root,
            ExprNode::Power {
                base: Box::new(ExprNode::Subscript {
                    base: Box::new(ExprNode::Variable("x".to_owned())),
                    subscript: Box::new(ExprNode::Variable("i".to_owned())),
                }),
                exponent: Box::new(ExprNode::Literal("2".to_owned())),
            }
        );
    }

    #[test]
    fn test_empty_group_is_placeholder() {
        assert_eq!(try_build_str("{}").unwrap(), ExprNode::Placeholder);
        let root = try_build_str(r"\frac{}{}").unwrap();
        assert_eq!(
            root,
            ExprNode::Fraction {
                numerator: Box::new(ExprNode::Placeholder),
                denominator: Box::new(ExprNode::Placeholder),
            }
        );
    }

    #[test]
    fn test_root_with_index() {
        let root = try_build_str(r"\sqrt[3]{x}").unwrap();
        assert_eq!(
            root,
            ExprNode::Root {
                radicand: Box::new(ExprNode::Variable("x".to_owned())),
                index: Some(Box::new(ExprNode::Literal("3".to_owned()))),
            }
        );
    }

    #[test]
    fn test_integral_with_bounds() {
        let root = try_build_str(r"\int_{0}^{1} x").unwrap();
        assert_eq!(
            root,
            ExprNode::Integral {
                lower: Some(Box::new(ExprNode::Literal("0".to_owned()))),
                upper: Some(Box::new(ExprNode::Literal("1".to_owned()))),
                operand: Box::new(ExprNode::Variable("x".to_owned())),
            }
        );
    }

    #[test]
    fn test_unknown_command_becomes_function_leaf() {
        let root = try_build_str(r"\foobar").unwrap();
        assert_eq!(
            root,
            ExprNode::Function {
                name: "foobar".to_owned()
            }
        );
    }

    #[test]
    fn test_known_function_names() {
        let root = try_build_str(r"\sin x").unwrap();
        assert_eq!(
            root,
            ExprNode::Sequence(vec![
                ExprNode::Function {
                    name: "sin".to_owned()
                },
                ExprNode::Variable("x".to_owned()),
            ])
        );
    }

    #[test]
    fn test_text_run_preserves_interior_spaces() {
        let root = try_build_str(r"\text{hello world}").unwrap();
        assert_eq!(root, ExprNode::TextRun("hello world".to_owned()));
    }

    #[test]
    fn test_format_wrappers() {
        let root = try_build_str(r"\mathbf{x}").unwrap();
        assert_eq!(
            root,
            ExprNode::FormatWrapper {
                style: FormatStyle::Bold,
                body: Box::new(ExprNode::Variable("x".to_owned())),
            }
        );

        let root = try_build_str(r"\textcolor{red}{y}").unwrap();
        assert_eq!(
            root,
            ExprNode::FormatWrapper {
                style: FormatStyle::Color("red".to_owned()),
                body: Box::new(ExprNode::Variable("y".to_owned())),
            }
        );
    }

    #[test]
    fn test_matrix_grid() {
        let root = try_build_str(r"\begin{pmatrix}a&b\\c&d\end{pmatrix}").unwrap();
        let ExprNode::Matrix { environment, rows } = root else {
            panic!("expected matrix, got {root:?}");
        };
        assert_eq!(environment, "pmatrix");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1][1], ExprNode::Variable("d".to_owned()));
    }

    #[test]
    fn test_trailing_row_separator_dropped() {
        let root = try_build_str(r"\begin{pmatrix}a\\b\\\end{pmatrix}").unwrap();
        let ExprNode::Matrix { rows, .. } = root else {
            panic!("expected matrix");
        };
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_ragged_matrix_reports_arity_and_pads() {
        let outcome = build_str(r"\begin{pmatrix}a&b\\c\end{pmatrix}");
        let error = outcome.error.expect("ragged rows must be reported");
        assert!(matches!(
            error.kind.as_ref(),
            ParseErrorKind::ArityMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
        // the partial tree is still rectangular
        let ExprNode::Matrix { rows, .. } = outcome.root else {
            panic!("expected matrix");
        };
        assert!(rows.iter().all(|row| row.len() == 2));
        assert_eq!(rows[1][1], ExprNode::Placeholder);
    }

    #[test]
    fn test_unbalanced_open_group() {
        let outcome = build_str(r"\frac{a}{b");
        let error = outcome.error.expect("unterminated group must be reported");
        assert!(matches!(
            error.kind.as_ref(),
            ParseErrorKind::UnbalancedGroup
        ));
        // best-effort tree still contains the fraction
        assert_eq!(outcome.root.kind(), NodeKind::Fraction);
    }

    #[test]
    fn test_stray_close_group_recovers() {
        let outcome = build_str("a}b");
        assert!(outcome.error.is_some());
        assert_eq!(
            outcome.root,
            ExprNode::Sequence(vec![
                ExprNode::Variable("a".to_owned()),
                ExprNode::Variable("b".to_owned()),
            ])
        );
    }

    #[test]
    fn test_missing_fraction_arguments() {
        let outcome = build_str(r"\frac{a}");
        let error = outcome.error.expect("missing argument must be reported");
        assert!(matches!(
            error.kind.as_ref(),
            ParseErrorKind::ArityMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
        assert_eq!(
            outcome.root,
            ExprNode::Fraction {
                numerator: Box::new(ExprNode::Variable("a".to_owned())),
                denominator: Box::new(ExprNode::Placeholder),
            }
        );
    }

    #[test]
    fn test_mismatched_environment_names() {
        let outcome = build_str(r"\begin{pmatrix}a\end{bmatrix}");
        let error = outcome.error.expect("name mismatch must be reported");
        assert!(matches!(
            error.kind.as_ref(),
            ParseErrorKind::UnbalancedGroup
        ));
    }

    #[test]
    fn test_greek_and_symbol_commands() {
        let root = try_build_str(r"\alpha\times\beta").unwrap();
        assert_eq!(
            root,
            ExprNode::Sequence(vec![
                ExprNode::Variable("alpha".to_owned()),
                ExprNode::Operator("times".to_owned()),
                ExprNode::Variable("beta".to_owned()),
            ])
        );
    }

    #[test]
    fn test_empty_input_is_placeholder() {
        assert_eq!(try_build_str("").unwrap(), ExprNode::Placeholder);
    }
}
