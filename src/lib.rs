//! Expression engine for a structural mathematical formula editor
//!
//! The engine keeps a formula in two synchronized representations: a typed
//! expression tree the editor manipulates structurally, and the LaTeX-style
//! markup text the user can edit directly. Markup is scanned, validated and
//! built into a tree; trees serialize back to canonical markup; the
//! coordinator debounces textual edits and keeps the two sides in step.
#![warn(missing_docs)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![warn(clippy::str_to_string)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::panic)]
#![warn(clippy::expect_used)]
#![warn(clippy::unwrap_in_result)]
#![warn(clippy::if_then_some_else_none)]
#![warn(clippy::get_unwrap)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::ref_patterns)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::string_slice)]
#![allow(clippy::pub_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::single_call_fn)]

pub mod coordinator;
pub mod lexer;
pub mod parser;
pub mod placeholder;
pub mod serializer;
pub mod templates;
pub mod types;
pub mod validator;

pub use coordinator::{
    Clock, EditSource, ManualClock, StructuralEdit, SyncCoordinator, SyncState, SystemClock,
};
pub use parser::{ExprNode, FormatStyle, NodeKind, ParseOutcome};
pub use placeholder::{Path, Placeholders};
pub use serializer::serialize;
pub use templates::TemplateSet;
pub use types::{
    EngineError, FillError, ParseError, ParseErrorKind, PatternClass, Settings, SourceLocation,
    Token, TokenKind, ValidationError,
};

/// Validates and builds markup into an expression tree.
///
/// This is the strict entry point used for committed text: the markup must
/// pass the complexity and security screen, and must build without
/// structural errors. For live feedback on partial input use
/// [`parser::build`] on the scanned tokens instead; it hands back a
/// best-effort tree alongside the error.
pub fn parse_markup(markup: &str, settings: &Settings) -> Result<ExprNode, EngineError> {
    validator::validate(markup, settings)?;
    let tokens = lexer::scan(markup);
    Ok(parser::try_build(tokens)?)
}
