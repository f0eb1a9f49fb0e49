//! Shared handle over a [`Dictionary`] that can be closed
//!
//! Lookups take a read lock, changes take the write lock. Once closed, the
//! dictionary is dropped and every call returns [`SessionError::Closed`].

use crate::{dictionary::InitializeError, edit::RuleNotFound, Dictionary};
use parking_lot::RwLock;
use std::path::Path;

/// Ways a call on a [`Session`] could go wrong
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
	/// The session was closed before this call
	#[error("session is closed")]
	Closed,

	/// Returned by [`Session::add_with_example`], the word was added anyway
	#[error(transparent)]
	RuleNotFound(#[from] RuleNotFound),
}

/// A dictionary opened from disk, safe to share between threads
#[derive(Debug)]
pub struct Session {
	dictionary: RwLock<Option<Dictionary>>,
}

impl Session {
	/// Load the affix and dictionary files
	///
	/// `key` unlocks encrypted dictionaries, it is accepted but files are
	/// always read as plain text.
	///
	/// # Errors
	///
	/// Fails when the files cannot be read, decoded or parsed, see
	/// [`InitializeError`].
	pub fn open(
		aff_path: impl AsRef<Path>,
		dic_path: impl AsRef<Path>,
		key: Option<&[u8]>,
	) -> Result<Self, InitializeError> {
		if let Some(key) = key {
			log::warn!(
				"ignoring {} bytes of key material, dictionaries are read as plain text",
				key.len()
			);
		}

		let dictionary = Dictionary::from_paths(aff_path.as_ref(), dic_path.as_ref())?;
		log::info!(
			"opened session on `{}` ({} entries)",
			dic_path.as_ref().display(),
			dictionary.len()
		);

		Ok(Self::from(dictionary))
	}

	/// Drop the dictionary, later calls fail
	///
	/// # Errors
	///
	/// Fails with [`SessionError::Closed`] if the session was already closed.
	pub fn close(&self) -> Result<(), SessionError> {
		self.dictionary
			.write()
			.take()
			.map(|_| log::info!("closed session"))
			.ok_or(SessionError::Closed)
	}

	/// Whether [`Session::close`] was not called yet
	#[must_use]
	pub fn is_open(&self) -> bool {
		self.dictionary.read().is_some()
	}

	/// See [`Dictionary::check`]
	///
	/// # Errors
	///
	/// Fails with [`SessionError::Closed`] once the session is closed.
	pub fn check(&self, word: &str) -> Result<bool, SessionError> {
		self.read(|dict| dict.check(word))
	}

	/// See [`Dictionary::stem`]
	///
	/// # Errors
	///
	/// Fails with [`SessionError::Closed`] once the session is closed.
	pub fn stem(&self, word: &str) -> Result<Vec<String>, SessionError> {
		self.read(|dict| dict.stem(word))
	}

	/// Suggested spellings from [`Dictionary::suggest`], best first
	///
	/// # Errors
	///
	/// Fails with [`SessionError::Closed`] once the session is closed.
	pub fn suggest(&self, word: &str) -> Result<Vec<String>, SessionError> {
		self.read(|dict| dict.suggest(word).words().map(ToOwned::to_owned).collect())
	}

	/// See [`Dictionary::add`]
	///
	/// # Errors
	///
	/// Fails with [`SessionError::Closed`] once the session is closed.
	pub fn add(&self, word: &str) -> Result<(), SessionError> {
		self.write(|dict| dict.add(word))
	}

	/// See [`Dictionary::add_with_example`]
	///
	/// # Errors
	///
	/// Fails with [`SessionError::Closed`] once the session is closed, or with
	/// [`SessionError::RuleNotFound`] when `word` was added without flags.
	pub fn add_with_example(&self, word: &str, example: &str) -> Result<(), SessionError> {
		self.write(|dict| dict.add_with_example(word, example))?
			.map_err(SessionError::from)
	}

	/// See [`Dictionary::remove`]
	///
	/// # Errors
	///
	/// Fails with [`SessionError::Closed`] once the session is closed.
	pub fn remove(&self, word: &str) -> Result<(), SessionError> {
		self.write(|dict| dict.remove(word))
	}

	/// Name of the dictionary encoding, like `UTF-8` or `ISO8859-1`
	///
	/// # Errors
	///
	/// Fails with [`SessionError::Closed`] once the session is closed.
	pub fn encoding(&self) -> Result<String, SessionError> {
		self.read(|dict| dict.encoding().to_string())
	}

	fn read<T>(&self, f: impl FnOnce(&Dictionary) -> T) -> Result<T, SessionError> {
		self.dictionary
			.read()
			.as_ref()
			.map(f)
			.ok_or(SessionError::Closed)
	}

	fn write<T>(&self, f: impl FnOnce(&mut Dictionary) -> T) -> Result<T, SessionError> {
		self.dictionary
			.write()
			.as_mut()
			.map(f)
			.ok_or(SessionError::Closed)
	}
}

impl From<Dictionary> for Session {
	fn from(dictionary: Dictionary) -> Self {
		Self {
			dictionary: RwLock::new(Some(dictionary)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	type TestResult = Result<(), Box<dyn std::error::Error>>;

	fn session() -> Result<Session, InitializeError> {
		Dictionary::from_slice("SFX S Y 1\nSFX S 0 s .\n", "2\ncat/S\ndog\n").map(Session::from)
	}

	#[test]
	fn is_shareable() {
		fn assert_send_sync<T: Send + Sync>() {}
		assert_send_sync::<Session>();
		assert_send_sync::<Dictionary>();
	}

	#[test]
	fn operations_go_through() -> TestResult {
		let session = session()?;

		assert_eq!(session.check("cats"), Ok(true));
		assert_eq!(session.stem("cats"), Ok(vec!["cat".to_owned()]));
		assert_eq!(session.suggest("cst")?.first().map(String::as_str), Some("cat"));
		assert_eq!(session.encoding(), Ok("ISO8859-1".to_owned()));

		session.add("bird")?;
		assert_eq!(session.check("bird"), Ok(true));
		session.remove("bird")?;
		assert_eq!(session.check("bird"), Ok(false));

		session.add_with_example("rat", "cat")?;
		assert_eq!(session.check("rats"), Ok(true));
		assert!(matches!(
			session.add_with_example("pig", "cows"),
			Err(SessionError::RuleNotFound(_))
		));
		assert_eq!(session.check("pig"), Ok(true));

		Ok(())
	}

	#[test]
	fn every_call_fails_once_closed() -> TestResult {
		let session = session()?;

		assert!(session.is_open());
		session.close()?;
		assert!(!session.is_open());

		assert_eq!(session.check("cat"), Err(SessionError::Closed));
		assert_eq!(session.stem("cat"), Err(SessionError::Closed));
		assert_eq!(session.suggest("cat"), Err(SessionError::Closed));
		assert_eq!(session.add("cat"), Err(SessionError::Closed));
		assert_eq!(
			session.add_with_example("cat", "dog"),
			Err(SessionError::Closed)
		);
		assert_eq!(session.remove("cat"), Err(SessionError::Closed));
		assert_eq!(session.encoding(), Err(SessionError::Closed));
		assert_eq!(session.close(), Err(SessionError::Closed));

		Ok(())
	}
}
