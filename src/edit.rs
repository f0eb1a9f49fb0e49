//! Runtime changes to the word list of a [`Dictionary`]

use crate::{aff::Flag, dic::MalformedDictionaryLine, Dictionary};

/// No affix rule links the added word to its example
///
/// The word is still added, without any flag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no affix rule turns `{word}` into `{example}`, it was added without flags")]
pub struct RuleNotFound {
	/// Word that was added
	pub word: String,
	/// Example it should have behaved like
	pub example: String,
}

/// Methods for changing the word list
impl Dictionary {
	/// Accept `word` from now on
	///
	/// A forbidden word is allowed again. Adding a word twice changes nothing.
	pub fn add(&mut self, word: &str) {
		let Some(word) = self.normalize(word) else {
			return;
		};

		self.allow(&word);

		if !self.has_standalone_homonym(&word) {
			self.dic.insert_homonym(&word);
		}

		log::debug!("added `{word}`");
	}

	/// Accept `word` and the forms the affix rules derive from it, so it
	/// behaves like `example`
	///
	/// When `example` is a stem, its flags are copied. Otherwise the rules
	/// turning `word` into `example` give their flags.
	///
	/// # Errors
	///
	/// Returns [`RuleNotFound`] when nothing links both words. `word` is
	/// nevertheless added with no flag.
	pub fn add_with_example(&mut self, word: &str, example: &str) -> Result<(), RuleNotFound> {
		let (Some(word), Some(example)) = (self.normalize(word), self.normalize(example)) else {
			return Ok(());
		};

		self.allow(&word);

		let forbidden = self.aff.additional_flags.forbidden_word.as_ref();
		let copied = self
			.dic
			.homonyms(&example)
			.find(|stem| !stem.flags.is_empty())
			.map(|stem| {
				stem.flags
					.iter()
					.filter(|flag| Some(*flag) != forbidden)
					.cloned()
					.collect::<Vec<_>>()
			});

		let flags = match copied {
			Some(flags) => flags,
			None => self.infer_flags(&word, &example),
		};

		if flags.is_empty() {
			self.dic.insert(&word);
			let err = RuleNotFound { word, example };
			log::debug!("{err}");
			return Err(err);
		}

		log::debug!(
			"added `{word}` like `{example}` with flags {}",
			flags.iter().map(ToString::to_string).collect::<String>()
		);
		self.dic.insert_with_flags(&word, flags);

		Ok(())
	}

	/// Stop accepting `word`, every homonym goes away
	pub fn remove(&mut self, word: &str) {
		let Some(word) = self.normalize(word) else {
			return;
		};

		let removed = self.dic.remove(&word);
		log::debug!("removed {removed} entries for `{word}`");
	}

	/// Merge an extra word list, in the same format as `.dic` files
	///
	/// Lines that cannot be read are skipped and returned.
	pub fn load_words(&mut self, words: &str) -> Vec<MalformedDictionaryLine> {
		self.dic.load(words, &self.aff.options)
	}

	/// Drop `FORBIDDENWORD` from the homonyms of `word`
	fn allow(&mut self, word: &str) {
		let Some(forbidden) = self.aff.additional_flags.forbidden_word.as_ref() else {
			return;
		};

		self.dic.strip_flag(word, forbidden);
	}

	/// Whether a homonym of `word` is valid without affixes or compounding
	fn has_standalone_homonym(&self, word: &str) -> bool {
		let flags = &self.aff.additional_flags;
		self.dic.homonyms(word).any(|stem| {
			!stem.has(flags.need_affix.as_ref()) && !stem.has(flags.compound_only.as_ref())
		})
	}

	/// Flags of the rules, or cross product pairs, that turn `word` into `example`
	fn infer_flags(&self, word: &str, example: &str) -> Vec<Flag> {
		let full_strip = self.aff.options.full_strip;
		let produces = |derived: Option<String>| derived.as_deref() == Some(example);

		let mut flags = vec![];
		for (flag, class) in self.aff.classes() {
			let by_prefix = class
				.prefixes
				.iter()
				.any(|index| produces(self.aff.prefixes[*index].apply(word, full_strip)));
			let by_suffix = class
				.suffixes
				.iter()
				.any(|index| produces(self.aff.suffixes[*index].apply(word, full_strip)));

			if by_prefix || by_suffix {
				flags.push(flag.clone());
			}
		}

		if flags.is_empty() {
			for prefix in self.aff.cross_prefixes_for(example) {
				for suffix in self.aff.cross_suffixes_for(example) {
					let derived = suffix
						.apply(word, full_strip)
						.and_then(|suffixed| prefix.apply(&suffixed, full_strip));

					if produces(derived) {
						for flag in [&prefix.flag, &suffix.flag] {
							if !flags.contains(flag) {
								flags.push(flag.clone());
							}
						}
					}
				}
			}
		}

		flags
	}
}
