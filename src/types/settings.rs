//! Engine configuration.
//!
//! All limits the validator enforces live here, together with the
//! caller-supplied command allow/deny lists and the coordinator's debounce
//! period. The struct holds resolved values only; the builder applies
//! defaults for anything the caller omitted.

use std::time::Duration;

use bon::bon;
use phf::phf_set;

use crate::types::KeySet;

/// Commands the engine understands out of the box. Anything outside this set
/// must be explicitly allow-listed through [`Settings`] or the validator
/// rejects it with `DisallowedCommand`.
static BUILTIN_COMMANDS: phf::Set<&'static str> = phf_set! {
    // structure
    "frac", "dfrac", "tfrac", "sqrt", "int", "oint", "sum", "prod", "lim",
    // text and formatting
    "text", "mathbf", "mathit", "mathrm", "underline", "textcolor",
    // function names
    "sin", "cos", "tan", "cot", "sec", "csc", "sinh", "cosh", "tanh",
    "log", "ln", "exp", "min", "max", "det", "gcd", "deg", "dim", "arg",
    // greek
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta",
    "eta", "theta", "vartheta", "iota", "kappa", "lambda", "mu", "nu",
    "xi", "pi", "varpi", "rho", "sigma", "varsigma", "tau", "upsilon",
    "phi", "varphi", "chi", "psi", "omega",
    "Gamma", "Delta", "Theta", "Lambda", "Xi", "Pi", "Sigma", "Upsilon",
    "Phi", "Psi", "Omega",
    // operators and relations
    "times", "cdot", "pm", "mp", "div", "ast", "star", "circ", "bullet",
    "leq", "geq", "neq", "approx", "equiv", "sim", "propto", "ll", "gg",
    "subset", "supset", "subseteq", "supseteq", "in", "notin", "ni",
    "cup", "cap", "setminus", "to", "gets", "leftarrow", "rightarrow",
    "Leftarrow", "Rightarrow", "leftrightarrow", "mapsto",
    // symbols
    "infty", "partial", "nabla", "forall", "exists", "neg", "emptyset",
    "angle", "perp", "mid", "ldots", "cdots", "vdots", "ddots", "prime",
    "hbar", "ell", "Re", "Im", "aleph", "wp",
    // spacing
    "quad", "qquad", ",", ";", "!", " ",
    // environment names (validated as identifiers too)
    "matrix", "pmatrix", "bmatrix", "Bmatrix", "vmatrix", "Vmatrix",
    "smallmatrix", "cases",
};

/// Resolved engine configuration.
///
/// The validator is pure and stateless given one of these; both the
/// real-time feedback path and the persistence path run against the same
/// instance, so neither can be more permissive than the other.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Maximum accepted markup length, in characters.
    pub max_length: usize,
    /// Maximum structural nesting depth after any single edit.
    pub max_nesting_depth: usize,
    /// Maximum matrix row count.
    pub max_rows: usize,
    /// Maximum matrix column count.
    pub max_cols: usize,
    /// Extra command identifiers accepted beyond the built-in set.
    pub allowed_commands: KeySet<String>,
    /// Command identifiers rejected even when built in or allow-listed.
    pub denied_commands: KeySet<String>,
    /// Quiescence period before a textual edit is reparsed.
    pub debounce: Duration,
}

#[bon]
impl Settings {
    /// Creates a new [`Settings`] instance, applying defaults for any
    /// omitted option.
    ///
    /// # Default Values
    /// - `max_length`: `10_000`
    /// - `max_nesting_depth`: `50`
    /// - `max_rows`: `100`
    /// - `max_cols`: `100`
    /// - `allowed_commands`: empty
    /// - `denied_commands`: empty
    /// - `debounce`: 300 ms
    #[must_use]
    #[builder]
    pub fn new(
        /// Maximum accepted markup length, in characters.
        max_length: Option<usize>,
        /// Maximum structural nesting depth.
        max_nesting_depth: Option<usize>,
        /// Maximum matrix row count.
        max_rows: Option<usize>,
        /// Maximum matrix column count.
        max_cols: Option<usize>,
        /// Extra command identifiers to accept.
        allowed_commands: Option<KeySet<String>>,
        /// Command identifiers to reject unconditionally.
        denied_commands: Option<KeySet<String>>,
        /// Debounce period for textual edits.
        debounce: Option<Duration>,
    ) -> Self {
        Self {
            max_length: max_length.unwrap_or(10_000),
            max_nesting_depth: max_nesting_depth.unwrap_or(50),
            max_rows: max_rows.unwrap_or(100),
            max_cols: max_cols.unwrap_or(100),
            allowed_commands: allowed_commands.unwrap_or_default(),
            denied_commands: denied_commands.unwrap_or_default(),
            debounce: debounce.unwrap_or(Duration::from_millis(300)),
        }
    }

    /// Whether a command identifier passes the allow/deny lists. The
    /// deny-list overrides everything else.
    #[must_use]
    pub fn is_command_allowed(&self, name: &str) -> bool {
        if self.denied_commands.contains(name) {
            return false;
        }
        BUILTIN_COMMANDS.contains(name) || self.allowed_commands.contains(name)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_length, 10_000);
        assert_eq!(settings.max_nesting_depth, 50);
        assert_eq!(settings.max_rows, 100);
        assert_eq!(settings.max_cols, 100);
        assert_eq!(settings.debounce, Duration::from_millis(300));
    }

    #[test]
    fn test_allow_and_deny_lists() {
        let mut allowed = KeySet::default();
        allowed.insert("widehat".to_owned());
        let mut denied = KeySet::default();
        denied.insert("frac".to_owned());

        let settings = Settings::builder()
            .allowed_commands(allowed)
            .denied_commands(denied)
            .build();

        assert!(settings.is_command_allowed("sqrt"));
        assert!(settings.is_command_allowed("widehat"));
        // deny-list wins over the built-in set
        assert!(!settings.is_command_allowed("frac"));
        assert!(!settings.is_command_allowed("input"));
    }
}
