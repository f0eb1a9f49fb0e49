//! Logic of the [`Dictionary`] to validate a word

use crate::{
	aff::{Affix, Prefix, Suffix},
	dic::Stem,
	Dictionary,
};
use std::{fmt, iter};

/// Maximum word length to check
//
/// This limit is the same in `Hunspell`, it's arbitrary. Longer words still get
/// an exact lookup.
const WORD_LOOKUP_MAX_LENGTH: usize = 100;

/// How many times a compound may be split again, three parts at most
const MAX_COMPOUND_DEPTH: usize = 2;

/// Readings are stricter when looking for words to suggest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
	Check,
	/// Also reject stems flagged `NOSUGGEST`
	Suggest,
}

/// Methods for querying the dictionary
impl Dictionary {
	/// Whether `word` is correctly spelled
	///
	/// Empty input is never correct.
	#[must_use]
	pub fn check(&self, word: &str) -> bool {
		self.normalize(word)
			.is_some_and(|word| self.is_correct(&word, Mode::Check))
	}

	/// Dictionary roots of every valid reading of `word`, in order and without
	/// duplicates
	///
	/// The roots of a compound are joined together.
	#[must_use]
	pub fn stem(&self, word: &str) -> Vec<String> {
		let Some(word) = self.normalize(word) else {
			return vec![];
		};

		let mut stems = Vec::new();
		for form in self.forms(&word, Mode::Check) {
			let root = form.root();
			if !stems.contains(&root) {
				stems.push(root);
			}
		}
		stems
	}

	/// Apply `ICONV`, drop `IGNORE` characters and surrounding blanks
	pub(crate) fn normalize(&self, word: &str) -> Option<String> {
		let options = &self.aff.options;
		let word = options.input_conversion.convert(word.trim());
		let word = options.strip_ignored(&word);

		(!word.is_empty()).then(|| word.into_owned())
	}

	pub(crate) fn is_correct(&self, word: &str, mode: Mode) -> bool {
		!self.forms(word, mode).is_empty()
	}

	/// Every valid reading of an already normalized word
	pub(crate) fn forms(&self, word: &str, mode: Mode) -> Vec<WordForm<'_>> {
		// Get plain forbidden words out of the way
		if self.is_forbidden(word) {
			log::trace!("`{word}` is a forbidden word");
			return vec![];
		}

		if word.len() > WORD_LOOKUP_MAX_LENGTH {
			let form = AffixForm::new(word, word.to_owned());
			return self
				.dic
				.homonyms(word)
				.filter(|entry| self.is_valid_affix_form(&form, entry, mode, false))
				.map(|entry| WordForm::Affix(form.clone().with_entry(entry)))
				.collect();
		}

		let without_dots = word.trim_end_matches('.');
		let candidates = iter::once(word)
			.chain((without_dots != word && !without_dots.is_empty()).then_some(without_dots));

		for candidate in candidates {
			let forms = self.cased_forms(candidate, mode);
			if !forms.is_empty() {
				return forms;
			}
		}

		vec![]
	}

	/// Whether `word` is exactly a stem flagged `FORBIDDENWORD`
	pub(crate) fn is_forbidden(&self, word: &str) -> bool {
		let forbidden = self.aff.additional_flags.forbidden_word.as_ref();
		self.dic.homonyms(word).any(|stem| stem.has(forbidden))
	}

	fn cased_forms(&self, word: &str, mode: Mode) -> Vec<WordForm<'_>> {
		let variants = Casing::variants(word);
		let upcased = Casing::guess(word) == Casing::All;

		let mut forms = Vec::new();
		for (variant, recased) in &variants {
			forms.extend(
				self.affix_forms(variant, mode, *recased, upcased)
					.into_iter()
					.map(WordForm::Affix),
			);
		}

		if forms.is_empty() && self.aff.additional_flags.has_compounding() {
			for (variant, recased) in &variants {
				forms.extend(
					self.compound_forms(variant, mode, *recased)
						.into_iter()
						.map(WordForm::Compound),
				);
				if !forms.is_empty() {
					break;
				}
			}
		}

		forms
	}

	/// Return every valid affix form of this word as interpreted by the dictionary
	///
	/// Uppercase input also reaches mixed case stems, `IPOD` finds `iPod`.
	fn affix_forms(
		&self,
		word: &str,
		mode: Mode,
		recased: bool,
		upcased: bool,
	) -> Vec<AffixForm<'_>> {
		let mut forms = vec![];

		// For every form that could exist, we check it's validity
		for form in self.produce_affix_forms(word) {
			let upcase = upcased
				.then(|| self.dic.upcase_homonyms(&form.stem))
				.into_iter()
				.flatten();

			// Only accept words that appear in the dictionary
			if let Some(entry) = self
				.dic
				.homonyms(&form.stem)
				.chain(upcase)
				.find(|entry| self.is_valid_affix_form(&form, entry, mode, recased))
			{
				log::trace!("{form} is valid");
				forms.push(form.with_entry(entry));
			}
		}

		forms
	}

	/// Wether the given [`AffixForm`] would match current [`Stem`] definition
	fn is_valid_affix_form(
		&self,
		form: &AffixForm<'_>,
		entry: &Stem,
		mode: Mode,
		recased: bool,
	) -> bool {
		let flags = &self.aff.additional_flags;

		if entry.has(flags.forbidden_word.as_ref())
			|| entry.has(flags.compound_only.as_ref())
			|| (recased && entry.has(flags.keep_case.as_ref()))
			|| (mode == Mode::Suggest && entry.has(flags.no_suggest.as_ref()))
			|| (self.aff.options.forbid_warn && entry.has(flags.warn.as_ref()))
		{
			return false;
		}

		let prefix_allowed = form.prefix.map_or(true, |prefix| {
			entry.flags.contains(&prefix.flag)
				|| form
					.outer_suffix()
					.is_some_and(|suffix| suffix.continues_with(&prefix.flag))
		});

		let suffix_allowed = match (form.inner_suffix, form.suffix) {
			// The outer suffix was allowed by the inner one's continuation
			(Some(inner), Some(_)) => entry.flags.contains(&inner.flag),
			(None, Some(suffix)) => {
				entry.flags.contains(&suffix.flag)
					|| form
						.prefix
						.is_some_and(|prefix| prefix.continues_with(&suffix.flag))
			}
			_ => true,
		};

		if !prefix_allowed || !suffix_allowed {
			return false;
		}

		if form.is_bare() {
			return !entry.has(flags.need_affix.as_ref());
		}

		let need_affix = flags.need_affix.as_ref();
		let compound_only = flags.compound_only.as_ref();

		// An affix carrying `NEEDAFFIX` cannot end the word on its own
		let outer_prefix_needs = form.prefix.map(|p| p.continues_with_any(need_affix));
		let outer_suffix_needs = form.outer_suffix().map(|s| s.continues_with_any(need_affix));
		let all_outer_need_affix = outer_prefix_needs
			.into_iter()
			.chain(outer_suffix_needs)
			.all(|needs| needs);

		let in_compound_only = form.prefix.is_some_and(|p| p.continues_with_any(compound_only))
			|| form.suffix.is_some_and(|s| s.continues_with_any(compound_only));

		!all_outer_need_affix && !in_compound_only
	}

	/// Produce every possible [`AffixForm`], it will be validated by [`Dictionary::is_valid_affix_form`] after
	fn produce_affix_forms(&self, word: &str) -> Vec<AffixForm<'_>> {
		let full_strip = self.aff.options.full_strip;

		// whole word without affixes is one possible form
		let mut forms = vec![AffixForm::new(word, word.to_owned())];

		for suffix in self.aff.suffixes_for(word) {
			let Some(stem) = suffix.stem_of(word, full_strip) else {
				continue;
			};

			// Twofold suffixes, the inner one has to allow the outer one
			for inner in self.aff.suffixes_for(&stem) {
				if !inner.continues_with(&suffix.flag) {
					continue;
				}
				if let Some(root) = inner.stem_of(&stem, full_strip) {
					forms.push(AffixForm {
						suffix: Some(suffix),
						inner_suffix: Some(inner),
						..AffixForm::new(word, root)
					});
				}
			}

			forms.push(AffixForm {
				suffix: Some(suffix),
				..AffixForm::new(word, stem)
			});
		}

		for prefix in self.aff.prefixes_for(word) {
			let Some(stem) = prefix.stem_of(word, full_strip) else {
				continue;
			};

			if prefix.cross_product {
				for suffix in self.aff.cross_suffixes_for(&stem) {
					if let Some(root) = suffix.stem_of(&stem, full_strip) {
						forms.push(AffixForm {
							prefix: Some(prefix),
							suffix: Some(suffix),
							..AffixForm::new(word, root)
						});
					}
				}
			}

			forms.push(AffixForm {
				prefix: Some(prefix),
				..AffixForm::new(word, stem)
			});
		}

		forms
	}

	// Compound Forms

	fn compound_forms(&self, word: &str, mode: Mode, recased: bool) -> Vec<Vec<AffixForm<'_>>> {
		let max_parts = self
			.aff
			.options
			.compound_max_word
			.map_or(MAX_COMPOUND_DEPTH + 1, |max| max.min(MAX_COMPOUND_DEPTH + 1));

		let search = CompoundSearch {
			mode,
			recased,
			max_parts,
		};

		let mut found = vec![];
		self.split_compound(word, &search, &mut vec![], &mut found);
		found
	}

	/// Try every way to cut `rest` into parts following `parts`
	fn split_compound<'a>(
		&'a self,
		rest: &str,
		search: &CompoundSearch,
		parts: &mut Vec<AffixForm<'a>>,
		found: &mut Vec<Vec<AffixForm<'a>>>,
	) {
		let min_length = self.aff.options.compound_min_parts_length.max(1);

		if !parts.is_empty() {
			for form in self.compound_part_forms(rest, Position::Last, search) {
				if self.is_duplicated(parts, &form) {
					continue;
				}

				let mut compound = parts.clone();
				compound.push(form);
				log::trace!("found compound {}", CompoundDisplay(&compound));
				found.push(compound);
			}
		}

		if parts.len() + 2 > search.max_parts {
			return;
		}

		let position = if parts.is_empty() {
			Position::Begin
		} else {
			Position::Middle
		};

		for (index, _) in rest.char_indices().skip(min_length) {
			let (head, tail) = rest.split_at(index);
			if tail.chars().count() < min_length {
				break;
			}

			for form in self.compound_part_forms(head, position, search) {
				if self.is_duplicated(parts, &form) {
					continue;
				}

				parts.push(form);
				self.split_compound(tail, search, parts, found);
				parts.pop();
			}
		}
	}

	/// `CHECKCOMPOUNDDUP` forbids repeating the previous part
	fn is_duplicated(&self, parts: &[AffixForm<'_>], form: &AffixForm<'_>) -> bool {
		self.aff.options.compound_check_duplication
			&& parts.last().is_some_and(|last| last.text == form.text)
	}

	/// Readings of `part` allowed at `position` inside a compound
	fn compound_part_forms(
		&self,
		part: &str,
		position: Position,
		search: &CompoundSearch,
	) -> Vec<AffixForm<'_>> {
		let flags = &self.aff.additional_flags;
		let position_flag = match position {
			Position::Begin => flags.compound_begin.as_ref(),
			Position::Middle => flags.compound_middle.as_ref(),
			Position::Last => flags.compound_last.as_ref(),
		};

		let mut forms = vec![];
		for form in self.produce_affix_forms(part) {
			// Only the outer edges of a compound take affixes
			let allowed = form.inner_suffix.is_none()
				&& match position {
					Position::Begin => form.suffix.is_none(),
					Position::Middle => form.is_bare(),
					Position::Last => form.prefix.is_none(),
				};
			if !allowed {
				continue;
			}

			let entry = self.dic.homonyms(&form.stem).find(|entry| {
				(entry.has(flags.compound.as_ref()) || entry.has(position_flag))
					&& !entry.has(flags.forbidden_word.as_ref())
					&& !(search.recased && entry.has(flags.keep_case.as_ref()))
					&& !(search.mode == Mode::Suggest && entry.has(flags.no_suggest.as_ref()))
					&& form.prefix.map_or(true, |p| entry.flags.contains(&p.flag))
					&& form.suffix.map_or(true, |s| entry.flags.contains(&s.flag))
			});

			if let Some(entry) = entry {
				forms.push(form.with_entry(entry));
			}
		}

		forms
	}
}

struct CompoundSearch {
	mode: Mode,
	recased: bool,
	max_parts: usize,
}

#[derive(Debug, Clone, Copy)]
enum Position {
	Begin,
	Middle,
	Last,
}

/// A valid reading of a word
#[derive(Debug, Clone)]
pub(crate) enum WordForm<'a> {
	Affix(AffixForm<'a>),
	Compound(Vec<AffixForm<'a>>),
}

impl WordForm<'_> {
	/// Dictionary root the reading comes from
	pub(crate) fn root(&self) -> String {
		match self {
			Self::Affix(form) => form.root().to_owned(),
			Self::Compound(parts) => parts.iter().map(AffixForm::root).collect(),
		}
	}
}

/// A form a word can be split into with a optional prefix and an optional suffix
#[derive(Debug, Clone)]
pub(crate) struct AffixForm<'a> {
	/// Source text
	text: String,

	/// stem as it may exists in dictionary
	stem: String,
	/// a optional prefix
	prefix: Option<&'a Affix<Prefix>>,
	/// a optional suffix, the outermost one
	suffix: Option<&'a Affix<Suffix>>,
	/// suffix between the stem and [`AffixForm::suffix`]
	inner_suffix: Option<&'a Affix<Suffix>>,

	/// homonym that validated this form
	entry: Option<&'a Stem>,
}

impl<'a> AffixForm<'a> {
	fn new(word: &str, stem: String) -> Self {
		Self {
			text: word.to_owned(),
			stem,
			prefix: None,
			suffix: None,
			inner_suffix: None,
			entry: None,
		}
	}

	fn with_entry(mut self, entry: &'a Stem) -> Self {
		self.entry = Some(entry);
		self
	}

	const fn is_bare(&self) -> bool {
		self.prefix.is_none() && self.suffix.is_none()
	}

	const fn outer_suffix(&self) -> Option<&'a Affix<Suffix>> {
		self.suffix
	}

	fn root(&self) -> &str {
		self.entry.map_or(&self.stem, |entry| &entry.root)
	}
}

impl fmt::Display for AffixForm<'_> {
	/// Must look like
	/// AffixForm(text = prefix + stem + suffix)
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "AffixForm[{} = ", self.text)?;

		if let Some(prefix) = &self.prefix {
			write!(f, "{prefix} + ")?;
		}

		write!(f, "{}", self.stem)?;

		if let Some(inner) = &self.inner_suffix {
			write!(f, " + {inner}")?;
		}
		if let Some(suffix) = &self.suffix {
			write!(f, " + {suffix}")?;
		}

		write!(f, "]")
	}
}

struct CompoundDisplay<'f, 'a>(&'f [AffixForm<'a>]);

impl fmt::Display for CompoundDisplay<'_, '_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (index, part) in self.0.iter().enumerate() {
			if index > 0 {
				write!(f, " | ")?;
			}
			write!(f, "{part}")?;
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Casing {
	/// All lowercase (“foo”)
	No,
	/// Titlecase, only initial letter is capitalized (“Foo”)
	Init,
	/// All uppercase (“FOO”)
	All,
	/// Mixed capitalization (“fooBar”)
	///
	/// `HUH`
	Huh,
	/// Mixed capitalization, first letter is capitalized (“FooBar”)
	///
	/// `HUHINIT`
	HuhInit,
}

impl Casing {
	/// Letters without a case do not count
	pub(crate) fn guess(word: &str) -> Self {
		let upper = word.chars().filter(|c| c.is_uppercase()).count();
		let lower = word.chars().filter(|c| c.is_lowercase()).count();
		let first_is_upper = word
			.chars()
			.find(|c| c.is_uppercase() || c.is_lowercase())
			.is_some_and(char::is_uppercase);

		match (upper, lower) {
			(0, _) => Self::No,
			(_, 0) => Self::All,
			(1, _) if first_is_upper => Self::Init,
			_ if first_is_upper => Self::HuhInit,
			_ => Self::Huh,
		}
	}

	/// Spellings to look up for `word`, flagged when they differ from it
	fn variants(word: &str) -> Vec<(String, bool)> {
		let mut variants = vec![(word.to_owned(), false)];

		match Self::guess(word) {
			Self::Init => variants.push((word.to_lowercase(), true)),
			Self::All => {
				let lower = word.to_lowercase();
				variants.push((titlecase(&lower), true));
				variants.insert(1, (lower, true));
			}
			Self::No | Self::Huh | Self::HuhInit => {}
		}

		variants
	}

	/// Give `word` this casing back
	pub(crate) fn apply(self, word: &str) -> String {
		match self {
			Self::Init => titlecase(word),
			Self::All => word.to_uppercase(),
			Self::No | Self::Huh | Self::HuhInit => word.to_owned(),
		}
	}
}

/// Uppercase the first letter and lowercase the rest
pub(crate) fn titlecase(word: &str) -> String {
	let mut chars = word.chars();
	chars
		.next()
		.map(|first| {
			first
				.to_uppercase()
				.chain(chars.flat_map(char::to_lowercase))
				.collect()
		})
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	type TestResult = Result<(), Box<dyn std::error::Error>>;

	#[test]
	fn guess_casing() {
		assert_eq!(Casing::guess("hello"), Casing::No);
		assert_eq!(Casing::guess("Hello"), Casing::Init);
		assert_eq!(Casing::guess("HELLO"), Casing::All);
		assert_eq!(Casing::guess("helLo"), Casing::Huh);
		assert_eq!(Casing::guess("HeLLo"), Casing::HuhInit);
		assert_eq!(Casing::guess("'Twas"), Casing::Init);
		assert_eq!(Casing::guess("1990s"), Casing::No);
		assert_eq!(titlecase("hELLO"), "Hello");
		assert_eq!(titlecase(""), "");
	}

	#[test]
	fn casing_variants() {
		assert_eq!(
			Casing::variants("HELLO"),
			[
				("HELLO".into(), false),
				("hello".into(), true),
				("Hello".into(), true)
			]
		);
		assert_eq!(Casing::variants("hello"), [("hello".into(), false)]);
	}

	#[test]
	fn suffix_and_trailing_dots() -> TestResult {
		let dict = Dictionary::from_slice("SFX A Y 1\nSFX A 0 ing [^ing]\n", "1\nwalk/A\n")?;

		assert!(dict.check("walk"));
		assert!(dict.check("walking"));
		assert!(dict.check("Walking"));
		assert!(dict.check("WALKING"));
		assert!(dict.check("walk."));
		assert!(!dict.check("walkinging"));
		assert!(!dict.check("walks"));
		assert!(!dict.check(""));
		assert!(!dict.check("  "));
		assert_eq!(dict.stem("walking"), ["walk"]);

		Ok(())
	}

	#[test]
	fn cross_product_and_twofold_suffixes() -> TestResult {
		let aff = "\
PFX U Y 1
PFX U 0 un .

SFX A Y 1
SFX A 0 able/B .

SFX B Y 1
SFX B 0 s .
";
		let dict = Dictionary::from_slice(aff, "2\ndo/UA\nread/A\n")?;

		assert!(dict.check("undo"));
		assert!(dict.check("doable"));
		assert!(dict.check("undoable"));
		assert!(dict.check("doables"));
		assert!(dict.check("readables"));
		assert!(!dict.check("unread"));
		assert!(!dict.check("dos"));

		Ok(())
	}

	#[test]
	fn special_flags() -> TestResult {
		let aff = "\
FORBIDDENWORD !
KEEPCASE K
NEEDAFFIX N
ONLYINCOMPOUND O

SFX S Y 1
SFX S 0 s .
";
		let dic = "\
5
bad/S!
ACME/K
pseudo/NS
inner/O
good/S
";
		let dict = Dictionary::from_slice(aff, dic)?;

		assert!(!dict.check("bad"));
		assert!(!dict.check("bads"));
		assert!(dict.check("ACME"));
		assert!(!dict.check("Acme"));
		assert!(!dict.check("pseudo"));
		assert!(dict.check("pseudos"));
		assert!(!dict.check("inner"));
		assert!(dict.check("Goods"));

		Ok(())
	}

	#[test]
	fn compounds() -> TestResult {
		let aff = "\
COMPOUNDFLAG X
COMPOUNDMIN 3
CHECKCOMPOUNDDUP

SFX S Y 1
SFX S 0 s .
";
		let dict = Dictionary::from_slice(aff, "4\nfoot/XS\nball/XS\ngame/XS\nab/X\n")?;

		assert!(dict.check("football"));
		assert!(dict.check("footballs"));
		assert!(dict.check("footballgame"));
		assert!(!dict.check("footballgameball"));
		assert!(!dict.check("footfoot"));
		assert!(!dict.check("abfoot"));
		assert!(!dict.check("footsball"));
		assert_eq!(dict.stem("footballs"), ["football"]);

		Ok(())
	}
}
