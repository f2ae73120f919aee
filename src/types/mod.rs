//! Shared type definitions used across the expression engine.

mod error;
mod settings;
mod source_location;
mod tokens;

pub use error::{
    EngineError, ErrorLocationProvider, FillError, ParseError, ParseErrorKind, PatternClass,
    ValidationError,
};
pub use settings::Settings;
pub use source_location::SourceLocation;
pub use tokens::{Token, TokenKind};

use rapidhash::{RapidHashMap, RapidHashSet};

/// Make it easier to switch between different hash backends.
pub type KeyMap<K, V> = RapidHashMap<K, V>;
/// Alias for the default hash set.
pub type KeySet<K> = RapidHashSet<K>;
