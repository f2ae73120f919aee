//! Named expression templates for palette insertion.
//!
//! A template is a pre-validated tree fragment registered under a name; the
//! editor's symbol palette instantiates one per click and hands the clone to
//! the coordinator as a structural edit. Templates are parsed once at
//! registration time, so a palette click never runs validation again.

use crate::parse_markup;
use crate::parser::ExprNode;
use crate::types::{EngineError, KeyMap, Settings};

/// A named collection of pre-validated expression fragments.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: KeyMap<String, ExprNode>,
}

impl TemplateSet {
    /// Creates an empty template set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard palette: the common structures, each with placeholders
    /// at its argument positions.
    pub fn standard(settings: &Settings) -> Result<Self, EngineError> {
        let mut set = Self::new();
        for (name, markup) in [
            ("fraction", r"\frac{}{}"),
            ("square-root", r"\sqrt{}"),
            ("nth-root", r"\sqrt[{}]{}"),
            ("power", r"{}^{}"),
            ("subscript", r"{}_{}"),
            ("integral", r"\int_{}^{}{}"),
            ("sum", r"\sum_{}^{}{}"),
            ("product", r"\prod_{}^{}{}"),
            ("limit", r"\lim_{}{}"),
            ("matrix-2x2", r"\begin{pmatrix}{}&{}\\{}&{}\end{pmatrix}"),
            ("cases", r"\begin{cases}{}&{}\\{}&{}\end{cases}"),
        ] {
            set.register(name, markup, settings)?;
        }
        Ok(set)
    }

    /// Validates and parses `markup`, storing the resulting tree under
    /// `name`. Re-registering a name replaces the previous template.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        markup: &str,
        settings: &Settings,
    ) -> Result<(), EngineError> {
        let tree = parse_markup(markup, settings)?;
        self.templates.insert(name.into(), tree);
        Ok(())
    }

    /// Clones the template registered under `name`.
    pub fn instantiate(&self, name: &str) -> Result<ExprNode, EngineError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownTemplate {
                name: name.to_owned(),
            })
    }

    /// Whether a template is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// The registered template names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// The number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no template has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder;

    #[test]
    fn test_register_and_instantiate() {
        let settings = Settings::default();
        let mut set = TemplateSet::new();
        set.register("half", r"\frac{1}{2}", &settings).unwrap();

        let tree = set.instantiate("half").unwrap();
        assert_eq!(
            tree,
            ExprNode::Fraction {
                numerator: Box::new(ExprNode::Literal("1".to_owned())),
                denominator: Box::new(ExprNode::Literal("2".to_owned())),
            }
        );
    }

    #[test]
    fn test_unknown_template() {
        let set = TemplateSet::new();
        let error = set.instantiate("missing").unwrap_err();
        assert!(matches!(
            error,
            EngineError::UnknownTemplate { name } if name == "missing"
        ));
    }

    #[test]
    fn test_registration_validates_markup() {
        let settings = Settings::default();
        let mut set = TemplateSet::new();
        assert!(matches!(
            set.register("bad", r"\frac{a}{", &settings),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            set.register("evil", r"\def\x{1}", &settings),
            Err(EngineError::Validation(_))
        ));
        assert!(set.is_empty());
    }

    #[test]
    fn test_instances_are_independent() {
        let settings = Settings::default();
        let mut set = TemplateSet::new();
        set.register("slot", r"\sqrt{}", &settings).unwrap();

        let mut instance = set.instantiate("slot").unwrap();
        placeholder::fill(
            &mut instance,
            &placeholder::Path::new(vec![0]),
            ExprNode::Variable("x".to_owned()),
            &settings,
        )
        .unwrap();

        // the stored template keeps its placeholder
        let fresh = set.instantiate("slot").unwrap();
        assert_eq!(placeholder::enumerate(&fresh).len(), 1);
    }

    #[test]
    fn test_standard_palette() {
        let settings = Settings::default();
        let set = TemplateSet::standard(&settings).unwrap();
        assert!(set.contains("fraction"));
        assert!(set.contains("matrix-2x2"));
        for name in set.names() {
            let tree = set.instantiate(name).unwrap();
            // every palette entry leaves at least one slot to fill
            assert!(!placeholder::enumerate(&tree).is_empty());
        }
    }
}
