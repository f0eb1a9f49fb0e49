//! morphspell
//!
//! Spell checking with Hunspell-style affix and dictionary files: checking
//! words, finding their stems, suggesting corrections and changing the word
//! list at runtime.

mod aff;
mod dic;
mod dictionary;
mod edit;
pub mod encoding;
mod lookup;
mod session;
mod suggest;
mod trie;

pub use aff::{AffixFileError, FlagError};
pub use dic::MalformedDictionaryLine;
pub use dictionary::{Dictionary, InitializeError};
pub use edit::RuleNotFound;
pub use encoding::{Encoding, EncodingError};
pub use session::{Session, SessionError};
pub use suggest::{Suggestion, Suggestions};
