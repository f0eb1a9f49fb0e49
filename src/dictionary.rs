//! High level interface to query dictionary pairs
//!
//! Entrypoint methods are
//! - [`Dictionary::check`]: looks though the dictionary to check is word is valid
//! - [`Dictionary::suggest`]: tries to find words close to provide quick/auto-correction
//! - [`Dictionary::add`] and friends: change the word list at runtime

use crate::{
	aff::{AffFile, AffixFileError},
	dic::{MalformedDictionaryLine, WordList},
	encoding::{self, Encoding, EncodingError},
};
use std::{borrow::Cow, fs, io, path::Path};

/// An affix file and a word list, loaded in memory
#[derive(Debug)]
pub struct Dictionary {
	/// Underlying `.aff` file
	pub(crate) aff: AffFile,
	/// Underlying `.dic` file
	pub(crate) dic: WordList,
	/// Lines of the `.dic` file that were skipped
	malformed: Vec<MalformedDictionaryLine>,
}

/// Ways initializing a [`Dictionary`] could go wrong
#[derive(Debug, thiserror::Error)]
pub enum InitializeError {
	/// Could not parse the `.aff` file
	#[error("malformed affix file: {0}")]
	MalformedAffixFile(#[from] AffixFileError),

	/// Could not decode either file
	#[error(transparent)]
	Encoding(#[from] EncodingError),

	/// Could not correctly open given files
	#[error(transparent)]
	Io(#[from] io::Error),
}

/// Constructors
impl Dictionary {
	/// Build a dictionary from already decoded file contents
	///
	/// Malformed `.dic` lines are skipped, see [`Dictionary::malformed_lines`].
	///
	/// # Errors
	///
	/// Will error if the provided affix file is not able to be parsed.
	pub fn from_slice(aff: &str, dic: &str) -> Result<Self, InitializeError> {
		let aff = AffFile::new(aff)?;

		let mut words = WordList::default();
		let malformed = words.load(dic, &aff.options);

		Ok(Self {
			aff,
			dic: words,
			malformed,
		})
	}

	/// Decode raw file contents with the encoding the affix file declares
	///
	/// # Errors
	///
	/// Will error if either file cannot be decoded or if the affix file is not
	/// able to be parsed.
	pub fn from_bytes(aff: &[u8], dic: &[u8]) -> Result<Self, InitializeError> {
		let encoding = encoding::sniff(aff)?;
		log::debug!("decoding dictionary as {encoding}");

		let aff = encoding::decode(aff, encoding)?;
		let dic = encoding::decode(dic, encoding)?;
		Self::from_slice(&aff, &dic)
	}

	/// Read both files and decode them
	///
	/// # Errors
	///
	/// Will error if either file cannot be read or decoded, or if the affix
	/// file is not able to be parsed.
	pub fn from_paths(aff: &Path, dic: &Path) -> Result<Self, InitializeError> {
		let aff = fs::read(aff)?;
		let dic = fs::read(dic)?;
		Self::from_bytes(&aff, &dic)
	}

	/// Given a path `/path/to/hunspell/en_US`, this function will append `.aff`
	/// and `.dic` and then read those files.
	///
	/// # Errors
	///
	/// Same as [`Dictionary::from_paths`].
	pub fn from_pair(base: &Path) -> Result<Self, InitializeError> {
		Self::from_paths(&base.with_extension("aff"), &base.with_extension("dic"))
	}
}

/// Accessors
impl Dictionary {
	/// Encoding declared by the affix file
	#[must_use]
	pub const fn encoding(&self) -> Encoding {
		self.aff.options.encoding
	}

	/// Language declared by the affix file
	#[must_use]
	pub fn lang(&self) -> Option<&str> {
		self.aff.options.lang.as_deref()
	}

	/// Number of entries in the word list, homonyms included
	#[must_use]
	pub const fn len(&self) -> usize {
		self.dic.len()
	}

	/// Whether the word list holds no entry
	#[must_use]
	pub const fn is_empty(&self) -> bool {
		self.dic.len() == 0
	}

	/// Whether `word` is a stem of the word list, affixes are not considered
	#[must_use]
	pub fn contains(&self, word: &str) -> bool {
		self.dic.contains(word)
	}

	/// Lines of the `.dic` file skipped while loading
	#[must_use]
	pub fn malformed_lines(&self) -> &[MalformedDictionaryLine] {
		&self.malformed
	}

	/// Encode `text` back into the dictionary encoding
	///
	/// # Errors
	///
	/// Fails when `text` holds characters the encoding cannot represent.
	pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, EncodingError> {
		encoding::encode(text, self.encoding())
	}
}
