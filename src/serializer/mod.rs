//! The serializer turns an expression tree back into canonical markup.
//!
//! Serialization is total: every well-formed tree has a markup rendering,
//! and rebuilding that rendering yields a structurally equal tree. The
//! output is canonical rather than faithful to the original spelling;
//! argument groups are always braced and command words always take a
//! trailing space, so the text can never re-tokenize differently.

use crate::parser::{ExprNode, FormatStyle, NodeKind};

/// Serializes a tree to canonical markup.
#[must_use]
pub fn serialize(root: &ExprNode) -> String {
    let mut out = String::new();
    write_node(root, &mut out);
    // trim the disambiguating spaces, never the space of a trailing `\ `
    while out.ends_with(' ') && !out.ends_with("\\ ") {
        out.pop();
    }
    out
}

/// Writes a command: word names take a disambiguating trailing space,
/// control symbols like `\,` and `\ ` are self-delimiting.
fn write_command(name: &str, out: &mut String) {
    out.push('\\');
    out.push_str(name);
    if name.chars().all(|c| c.is_ascii_alphabetic()) {
        out.push(' ');
    }
}

/// Writes a node as a braced argument group. A placeholder renders as the
/// canonical empty group.
fn write_arg(node: &ExprNode, out: &mut String) {
    out.push('{');
    if *node != ExprNode::Placeholder {
        write_node(node, out);
    }
    out.push('}');
}

/// Writes a script or big-operator base, bracing sequences so the script
/// marker cannot attach to the last sibling alone.
fn write_base(node: &ExprNode, out: &mut String) {
    if node.kind() == NodeKind::Sequence {
        write_arg(node, out);
    } else {
        write_node(node, out);
    }
}

fn write_bounds(lower: Option<&ExprNode>, upper: Option<&ExprNode>, out: &mut String) {
    if let Some(lower) = lower {
        out.push('_');
        write_arg(lower, out);
    }
    if let Some(upper) = upper {
        out.push('^');
        write_arg(upper, out);
    }
}

/// Whether rendered text carries a `&` or `\\` outside any brace group,
/// where an enclosing environment would read it as a cell or row separator.
fn has_unbraced_separator(piece: &str) -> bool {
    let mut depth = 0usize;
    let mut chars = piece.chars();
    while let Some(c) = chars.next() {
        match c {
            // a backslash never opens a group; consume the escaped char
            '\\' => {
                if chars.next() == Some('\\') && depth == 0 {
                    return true;
                }
            }
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '&' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

/// Whether `left`-then-`right` would re-tokenize as a single number.
fn merges_into_number(left: &str, right: &str) -> bool {
    let digitish = |c: char| c.is_ascii_digit() || c == '.';
    left.chars().last().is_some_and(digitish) && right.chars().next().is_some_and(digitish)
}

fn write_node(node: &ExprNode, out: &mut String) {
    match node {
        ExprNode::Literal(text) => out.push_str(text),
        ExprNode::Variable(name) | ExprNode::Operator(name) => {
            if name == r"\\" {
                // a row separator kept outside any environment
                out.push_str(r"\\");
            } else if name == "{" || name == "}" {
                // brace characters must stay escaped or they would reopen
                // a group
                out.push('\\');
                out.push_str(name);
            } else if name.chars().count() == 1 {
                out.push_str(name);
            } else {
                write_command(name, out);
            }
        }
        ExprNode::Function { name } => write_command(name, out),
        ExprNode::Fraction {
            numerator,
            denominator,
        } => {
            out.push_str(r"\frac");
            write_arg(numerator, out);
            write_arg(denominator, out);
        }
        ExprNode::Root { radicand, index } => {
            out.push_str(r"\sqrt");
            if let Some(index) = index {
                out.push('[');
                write_node(index, out);
                out.push(']');
            }
            write_arg(radicand, out);
        }
        ExprNode::Power { base, exponent } => {
            write_base(base, out);
            out.push('^');
            write_arg(exponent, out);
        }
        ExprNode::Subscript { base, subscript } => {
            write_base(base, out);
            out.push('_');
            write_arg(subscript, out);
        }
        ExprNode::Integral {
            lower,
            upper,
            operand,
        } => {
            out.push_str(r"\int");
            write_bounds(lower.as_deref(), upper.as_deref(), out);
            write_arg(operand, out);
        }
        ExprNode::Sum {
            lower,
            upper,
            operand,
        } => {
            out.push_str(r"\sum");
            write_bounds(lower.as_deref(), upper.as_deref(), out);
            write_arg(operand, out);
        }
        ExprNode::Product {
            lower,
            upper,
            operand,
        } => {
            out.push_str(r"\prod");
            write_bounds(lower.as_deref(), upper.as_deref(), out);
            write_arg(operand, out);
        }
        ExprNode::Limit { subscript, operand } => {
            out.push_str(r"\lim");
            if let Some(subscript) = subscript {
                out.push('_');
                write_arg(subscript, out);
            }
            write_arg(operand, out);
        }
        ExprNode::Matrix { environment, rows } => {
            out.push_str(r"\begin{");
            out.push_str(environment);
            out.push('}');
            for (r, row) in rows.iter().enumerate() {
                if r > 0 {
                    out.push_str(r"\\");
                }
                for (c, cell) in row.iter().enumerate() {
                    if c > 0 {
                        out.push('&');
                    }
                    let mut piece = String::new();
                    if *cell == ExprNode::Placeholder {
                        piece.push_str("{}");
                    } else {
                        write_node(cell, &mut piece);
                    }
                    // a cell carrying a bare separator in its own text
                    // would change the grid on rebuild
                    if has_unbraced_separator(&piece) {
                        out.push('{');
                        out.push_str(&piece);
                        out.push('}');
                    } else {
                        out.push_str(&piece);
                    }
                }
            }
            out.push_str(r"\end{");
            out.push_str(environment);
            out.push('}');
        }
        ExprNode::TextRun(text) => {
            out.push_str(r"\text{");
            out.push_str(text);
            out.push('}');
        }
        ExprNode::FormatWrapper { style, body } => {
            out.push('\\');
            out.push_str(style.command());
            if let FormatStyle::Color(color) = style {
                out.push('{');
                out.push_str(color);
                out.push('}');
            }
            write_arg(body, out);
        }
        ExprNode::Sequence(items) => {
            for item in items {
                let mut piece = String::new();
                write_node(item, &mut piece);
                if merges_into_number(out, &piece) {
                    out.push(' ');
                }
                out.push_str(&piece);
            }
        }
        ExprNode::Placeholder => out.push_str("{}"),
    }
}
