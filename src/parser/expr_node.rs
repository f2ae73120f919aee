//! The expression tree node definitions.
//!
//! [`ExprNode`] is the sole structural entity of the engine: a closed tagged
//! union with one variant per node kind, owning its children exclusively
//! through `Box`/`Vec`. No node carries a parent back-reference; paths from
//! the root are computed transiently by the placeholder manager.

use strum::{AsRefStr, Display, EnumDiscriminants, IntoDiscriminant as _};

/// Text formatting applied by a [`ExprNode::FormatWrapper`] node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatStyle {
    /// Bold face (`\mathbf`).
    Bold,
    /// Italic face (`\mathit`).
    Italic,
    /// Upright roman face (`\mathrm`).
    Roman,
    /// Underlined (`\underline`).
    Underline,
    /// Colored content (`\textcolor`), carrying the color value verbatim.
    Color(String),
}

impl FormatStyle {
    /// The command this style serializes back to.
    #[must_use]
    pub const fn command(&self) -> &'static str {
        match self {
            Self::Bold => "mathbf",
            Self::Italic => "mathit",
            Self::Roman => "mathrm",
            Self::Underline => "underline",
            Self::Color(_) => "textcolor",
        }
    }
}

/// A node of the expression tree.
///
/// The tree is finite and acyclic by construction: the builder never reuses
/// a node reference, and ownership is exclusive. Matrix rows are kept
/// rectangular by the builder (ragged input is padded and reported).
///
/// The [`NodeKind`] discriminant enum is derived via `strum`, so matching on
/// kinds stays exhaustive and compile-time checked when a variant is added.
#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(vis(pub))]
#[strum_discriminants(name(NodeKind))]
#[strum_discriminants(doc = "Discriminant tag identifying an expression node kind")]
#[strum_discriminants(derive(Display, Hash, AsRefStr), strum(serialize_all = "lowercase"))]
pub enum ExprNode {
    /// A literal run, typically a number (`12.5`).
    Literal(String),
    /// A variable. Single letters are stored bare (`x`); named symbols
    /// store the command identifier (`alpha`).
    Variable(String),
    /// An operator symbol. Single characters are stored bare (`+`); named
    /// operators store the command identifier (`times`).
    Operator(String),
    /// A two-argument fraction.
    Fraction {
        /// The upper argument.
        numerator: Box<ExprNode>,
        /// The lower argument.
        denominator: Box<ExprNode>,
    },
    /// A radical with an optional index (`\sqrt[3]{x}`).
    Root {
        /// The expression under the radical.
        radicand: Box<ExprNode>,
        /// The optional root index.
        index: Option<Box<ExprNode>>,
    },
    /// A base raised to an exponent (`x^{2}`).
    Power {
        /// The base expression.
        base: Box<ExprNode>,
        /// The exponent.
        exponent: Box<ExprNode>,
    },
    /// A subscripted base (`x_{i}`).
    Subscript {
        /// The base expression.
        base: Box<ExprNode>,
        /// The subscript.
        subscript: Box<ExprNode>,
    },
    /// A named function or unrecognized command, kept as a leaf so unknown
    /// markup round-trips without loss.
    Function {
        /// The command identifier without its backslash.
        name: String,
    },
    /// An integral with optional bounds.
    Integral {
        /// The lower bound, if given.
        lower: Option<Box<ExprNode>>,
        /// The upper bound, if given.
        upper: Option<Box<ExprNode>>,
        /// The integrand.
        operand: Box<ExprNode>,
    },
    /// A summation with optional bounds.
    Sum {
        /// The lower bound, if given.
        lower: Option<Box<ExprNode>>,
        /// The upper bound, if given.
        upper: Option<Box<ExprNode>>,
        /// The summand.
        operand: Box<ExprNode>,
    },
    /// A product with optional bounds.
    Product {
        /// The lower bound, if given.
        lower: Option<Box<ExprNode>>,
        /// The upper bound, if given.
        upper: Option<Box<ExprNode>>,
        /// The factor expression.
        operand: Box<ExprNode>,
    },
    /// A limit with an optional approach expression.
    Limit {
        /// The approach expression (`x \to 0`), if given.
        subscript: Option<Box<ExprNode>>,
        /// The expression the limit applies to.
        operand: Box<ExprNode>,
    },
    /// A rectangular grid of cells in a named environment.
    Matrix {
        /// The environment name (`pmatrix`, `bmatrix`, ...).
        environment: String,
        /// Rows of equal length, in reading order.
        rows: Vec<Vec<ExprNode>>,
    },
    /// A verbatim text run (`\text{...}`).
    TextRun(String),
    /// A formatting wrapper around a single body.
    FormatWrapper {
        /// The applied style.
        style: FormatStyle,
        /// The wrapped content.
        body: Box<ExprNode>,
    },
    /// Two or more siblings in left-to-right reading order. The builder
    /// never produces a sequence with fewer than two elements.
    Sequence(Vec<ExprNode>),
    /// An intentionally empty, navigable, fillable slot. Serializes to the
    /// canonical empty group `{}`.
    Placeholder,
}

impl NodeKind {
    /// Whether this kind counts toward structural nesting depth. Sequences
    /// and leaves do not nest visually and are excluded.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        matches!(
            self,
            Self::Fraction
                | Self::Root
                | Self::Power
                | Self::Subscript
                | Self::Integral
                | Self::Sum
                | Self::Product
                | Self::Limit
                | Self::Matrix
                | Self::FormatWrapper
        )
    }
}

impl ExprNode {
    /// The kind tag of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.discriminant()
    }

    /// The node's children in left-to-right reading order.
    ///
    /// Matrix cells are flattened row-major; a root index precedes its
    /// radicand (matching markup order); absent optional children do not
    /// occupy an index.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Literal(_)
            | Self::Variable(_)
            | Self::Operator(_)
            | Self::Function { .. }
            | Self::TextRun(_)
            | Self::Placeholder => Vec::new(),
            Self::Fraction {
                numerator,
                denominator,
            } => vec![numerator, denominator],
            Self::Root { radicand, index } => match index {
                Some(index) => vec![index, radicand],
                None => vec![radicand],
            },
            Self::Power { base, exponent } => vec![base, exponent],
            Self::Subscript { base, subscript } => vec![base, subscript],
            Self::Integral {
                lower,
                upper,
                operand,
            }
            | Self::Sum {
                lower,
                upper,
                operand,
            }
            | Self::Product {
                lower,
                upper,
                operand,
            } => {
                let mut out: Vec<&Self> = Vec::new();
                if let Some(lower) = lower {
                    out.push(lower);
                }
                if let Some(upper) = upper {
                    out.push(upper);
                }
                out.push(operand);
                out
            }
            Self::Limit { subscript, operand } => match subscript {
                Some(subscript) => vec![subscript, operand],
                None => vec![operand],
            },
            Self::Matrix { rows, .. } => rows.iter().flatten().collect(),
            Self::FormatWrapper { body, .. } => vec![body],
            Self::Sequence(items) => items.iter().collect(),
        }
    }

    /// Mutable access to the child at `index`, using the same ordering as
    /// [`Self::children`].
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Self> {
        match self {
            Self::Literal(_)
            | Self::Variable(_)
            | Self::Operator(_)
            | Self::Function { .. }
            | Self::TextRun(_)
            | Self::Placeholder => None,
            Self::Fraction {
                numerator,
                denominator,
            } => match index {
                0 => Some(numerator),
                1 => Some(denominator),
                _ => None,
            },
            Self::Root { radicand, index: root_index } => {
                let mut slots: Vec<&mut Self> = Vec::new();
                if let Some(root_index) = root_index {
                    slots.push(root_index);
                }
                slots.push(radicand);
                slots.into_iter().nth(index)
            }
            Self::Power { base, exponent } => match index {
                0 => Some(base),
                1 => Some(exponent),
                _ => None,
            },
            Self::Subscript { base, subscript } => match index {
                0 => Some(base),
                1 => Some(subscript),
                _ => None,
            },
            Self::Integral {
                lower,
                upper,
                operand,
            }
            | Self::Sum {
                lower,
                upper,
                operand,
            }
            | Self::Product {
                lower,
                upper,
                operand,
            } => {
                let mut slots: Vec<&mut Self> = Vec::new();
                if let Some(lower) = lower {
                    slots.push(lower);
                }
                if let Some(upper) = upper {
                    slots.push(upper);
                }
                slots.push(operand);
                slots.into_iter().nth(index)
            }
            Self::Limit { subscript, operand } => {
                let mut slots: Vec<&mut Self> = Vec::new();
                if let Some(subscript) = subscript {
                    slots.push(subscript);
                }
                slots.push(operand);
                slots.into_iter().nth(index)
            }
            Self::Matrix { rows, .. } => rows.iter_mut().flatten().nth(index),
            Self::FormatWrapper { body, .. } => (index == 0).then_some(body),
            Self::Sequence(items) => items.get_mut(index),
        }
    }

    /// The number of children of this node.
    #[must_use]
    pub fn child_count(&self) -> usize {
        match self {
            Self::Matrix { rows, .. } => rows.iter().map(Vec::len).sum(),
            Self::Sequence(items) => items.len(),
            other => other.children().len(),
        }
    }

    /// Maximum structural nesting depth of the tree rooted at this node:
    /// the longest chain of structural ancestors on any root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        let own = usize::from(self.kind().is_structural());
        own + self
            .children()
            .iter()
            .map(|child| child.depth())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fraction(numerator: ExprNode, denominator: ExprNode) -> ExprNode {
        ExprNode::Fraction {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
        }
    }

    #[test]
    fn test_kind_discriminants() {
        let node = ExprNode::Placeholder;
        assert_eq!(node.kind(), NodeKind::Placeholder);
        assert_eq!(NodeKind::Fraction.to_string(), "fraction");
        assert!(NodeKind::Fraction.is_structural());
        assert!(!NodeKind::Sequence.is_structural());
        assert!(!NodeKind::Literal.is_structural());
    }

    #[test]
    fn test_depth_counts_structural_ancestors_only() {
        let leaf = ExprNode::Variable("x".to_owned());
        assert_eq!(leaf.depth(), 0);

        let one = fraction(leaf.clone(), ExprNode::Placeholder);
        assert_eq!(one.depth(), 1);

        let seq = ExprNode::Sequence(vec![one.clone(), leaf.clone()]);
        // sequences do not add depth
        assert_eq!(seq.depth(), 1);

        let two = fraction(one, leaf);
        assert_eq!(two.depth(), 2);
    }

    #[test]
    fn test_matrix_children_row_major() {
        let cell = |s: &str| ExprNode::Variable(s.to_owned());
        let matrix = ExprNode::Matrix {
            environment: "pmatrix".to_owned(),
            rows: vec![vec![cell("a"), cell("b")], vec![cell("c"), cell("d")]],
        };
        assert_eq!(matrix.child_count(), 4);
        assert_eq!(matrix.children()[2], &cell("c"));

        let mut mutable = matrix.clone();
        assert_eq!(mutable.child_mut(3), Some(&mut cell("d")));
    }

    #[test]
    fn test_optional_children_do_not_occupy_indices() {
        let sum = ExprNode::Sum {
            lower: None,
            upper: Some(Box::new(ExprNode::Variable("n".to_owned()))),
            operand: Box::new(ExprNode::Placeholder),
        };
        assert_eq!(sum.child_count(), 2);
        assert_eq!(sum.children()[0], &ExprNode::Variable("n".to_owned()));
        assert_eq!(sum.children()[1], &ExprNode::Placeholder);
    }
}
