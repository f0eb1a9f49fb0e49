use crate::{
	dic::DataField,
	encoding::{Encoding, EncodingError},
	trie::Trie,
};
use nom::{
	branch::alt,
	bytes::complete::{is_not, tag, take_while1},
	character::complete::{space0, space1, u64 as u64_p},
	combinator::rest,
	sequence::tuple,
	IResult, Parser,
};
use nom_supreme::ParserExt;
use regex::Regex;
use std::{
	borrow::Cow,
	collections::HashMap,
	fmt,
	marker::PhantomData,
	str::FromStr,
};

/// Keyboard layout used for suggestions when the file declares no `KEY`
const DEFAULT_KEYBOARD: &str = "qwertyuiop|asdfghjkl|zxcvbnm";

/// Default minimal length of a compound part
const DEFAULT_COMPOUND_MIN: usize = 3;

/// Structural problems of an affix file, any of them aborts the load
#[derive(Debug, thiserror::Error)]
pub enum AffixFileError {
	/// A counted block is followed by the wrong number of entries
	#[error("line {line}: `{directive}` declares {expected} entries but {found} follow")]
	CountMismatch {
		/// Line of the block header
		line: usize,
		/// Directive of the block
		directive: String,
		/// Count written in the header
		expected: usize,
		/// Entries actually found
		found: usize,
	},

	/// An affix condition is not a valid pattern
	#[error("line {line}: invalid condition `{condition}`: {reason}")]
	InvalidCondition {
		/// Line of the affix rule
		line: usize,
		/// Condition as written
		condition: String,
		/// What is wrong with it
		reason: String,
	},

	/// A flag token does not fit the declared `FLAG` type
	#[error("line {line}: {source}")]
	InvalidFlag {
		/// Line of the offending token
		line: usize,
		/// Flag parsing failure
		source: FlagError,
	},

	/// `FLAG` came after flags were already read with another width
	#[error("line {line}: `FLAG` must be declared before any flag is used")]
	LateFlagType {
		/// Line of the `FLAG` directive
		line: usize,
	},

	/// Any other unreadable line
	#[error("line {line}: {message}")]
	Syntax {
		/// Offending line
		line: usize,
		/// Description of the problem
		message: String,
	},
}

fn syntax(line: usize, message: impl fmt::Display) -> AffixFileError {
	AffixFileError::Syntax {
		line,
		message: message.to_string(),
	}
}

/// Why a flag token could not be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlagError {
	/// Nothing where flags were expected
	#[error("empty flag set")]
	Empty,
	/// Long flags go by pairs of characters
	#[error("`{0}` has an odd number of characters for long flags")]
	OddLength(String),
	/// Numeric flags are comma separated numbers in 1-65000
	#[error("`{0}` is not a valid numeric flag")]
	NotNumeric(String),
	/// A single flag was expected
	#[error("`{0}` should be exactly one flag")]
	NotSingle(String),
	/// Alias number without matching `AF` entry
	#[error("flag alias `{0}` is not defined")]
	UnknownAlias(String),
}

/// Parsed `.aff` file with its rules indexed for lookups
#[derive(Debug)]
pub(crate) struct AffFile {
	pub(crate) options: Options,
	pub(crate) additional_flags: AdditionalFlags,

	pub(crate) prefixes: Vec<Affix<Prefix>>,
	pub(crate) suffixes: Vec<Affix<Suffix>>,

	/// Prefixes keyed by added text
	prefix_index: Trie<usize>,
	/// Suffixes keyed by reversed added text
	suffix_index: Trie<usize>,
	cross_prefix_index: Trie<usize>,
	cross_suffix_index: Trie<usize>,

	classes: HashMap<Flag, AffixClass>,
}

impl AffFile {
	pub(crate) fn new(content: &str) -> Result<Self, AffixFileError> {
		let AffParser {
			options,
			prefixes,
			suffixes,
			additional_flags,
			..
		} = AffParser::default().parse(content)?;

		let mut classes = HashMap::<Flag, AffixClass>::new();

		let mut prefix_index = Trie::default();
		let mut cross_prefix_index = Trie::default();
		for (index, prefix) in prefixes.iter().enumerate() {
			prefix_index.insert(&prefix.add, index);
			if prefix.cross_product {
				cross_prefix_index.insert(&prefix.add, index);
			}
			classes
				.entry(prefix.flag.clone())
				.or_default()
				.prefixes
				.push(index);
		}

		// You need to reverse suffixes
		let mut suffix_index = Trie::default();
		let mut cross_suffix_index = Trie::default();
		for (index, suffix) in suffixes.iter().enumerate() {
			let key = suffix.add.chars().rev().collect::<String>();
			suffix_index.insert(&key, index);
			if suffix.cross_product {
				cross_suffix_index.insert(&key, index);
			}
			classes
				.entry(suffix.flag.clone())
				.or_default()
				.suffixes
				.push(index);
		}

		log::debug!(
			"indexed {} prefixes and {} suffixes ({} cross product) into {} classes",
			prefix_index.len(),
			suffix_index.len(),
			cross_prefix_index.len() + cross_suffix_index.len(),
			classes.len()
		);

		Ok(Self {
			options,
			additional_flags,
			prefixes,
			suffixes,
			prefix_index,
			suffix_index,
			cross_prefix_index,
			cross_suffix_index,
			classes,
		})
	}

	/// Prefixes whose added text starts `word`
	pub(crate) fn prefixes_for(&self, word: &str) -> impl Iterator<Item = &Affix<Prefix>> + '_ {
		self.prefix_index
			.values_along(word)
			.into_iter()
			.map(move |index| &self.prefixes[*index])
	}

	/// Cross product prefixes whose added text starts `word`
	pub(crate) fn cross_prefixes_for(
		&self,
		word: &str,
	) -> impl Iterator<Item = &Affix<Prefix>> + '_ {
		self.cross_prefix_index
			.values_along(word)
			.into_iter()
			.map(move |index| &self.prefixes[*index])
	}

	/// Suffixes whose added text ends `word`
	pub(crate) fn suffixes_for(&self, word: &str) -> impl Iterator<Item = &Affix<Suffix>> + '_ {
		let reversed = word.chars().rev().collect::<String>();
		self.suffix_index
			.values_along(&reversed)
			.into_iter()
			.map(move |index| &self.suffixes[*index])
	}

	/// Cross product suffixes whose added text ends `word`
	pub(crate) fn cross_suffixes_for(
		&self,
		word: &str,
	) -> impl Iterator<Item = &Affix<Suffix>> + '_ {
		let reversed = word.chars().rev().collect::<String>();
		self.cross_suffix_index
			.values_along(&reversed)
			.into_iter()
			.map(move |index| &self.suffixes[*index])
	}

	/// Every affix class with the flag that names it
	pub(crate) fn classes(&self) -> impl Iterator<Item = (&Flag, &AffixClass)> {
		self.classes.iter()
	}

	#[cfg(test)]
	pub(crate) fn class(&self, flag: &Flag) -> Option<&AffixClass> {
		self.classes.get(flag)
	}
}

/// Rules sharing one flag, as indices into [`AffFile::prefixes`] and [`AffFile::suffixes`]
#[derive(Debug, Default)]
pub(crate) struct AffixClass {
	pub(crate) prefixes: Vec<usize>,
	pub(crate) suffixes: Vec<usize>,
}

#[derive(Debug)]
pub(crate) struct Options {
	/// `SET`
	pub(crate) encoding: Encoding,
	/// `FLAG`
	pub(crate) flag_ty: FlagType,
	/// `LANG`
	pub(crate) lang: Option<String>,
	/// `IGNORE`
	pub(crate) ignore: Vec<char>,
	/// `AF`
	/// Flags can be compressed and replaced with an ordinal number
	flag_aliases: Vec<Vec<Flag>>,
	/// `AM`
	morphological_aliases: Vec<Vec<DataField>>,

	// ——— for suggestions
	/// `KEY`
	pub(crate) key: Vec<Vec<char>>,
	/// `TRY`
	pub(crate) try_chars: Vec<char>,
	/// `NOSPLITSUGS`
	pub(crate) no_split_suggestions: bool,
	/// `REP`
	pub(crate) replacements: Vec<Replacement>,
	/// `MAP`
	pub(crate) maps: Vec<Vec<String>>,
	/// `FORBIDWARN`
	pub(crate) forbid_warn: bool,

	// ——— for compounding
	/// `COMPOUNDMIN`
	pub(crate) compound_min_parts_length: usize,
	/// `COMPOUNDWORDMAX`
	pub(crate) compound_max_word: Option<usize>,
	/// `CHECKCOMPOUNDDUP`
	pub(crate) compound_check_duplication: bool,

	// ——— other
	/// `FULLSTRIP`
	pub(crate) full_strip: bool,
	/// `ICONV`
	pub(crate) input_conversion: ConversionTable,
	/// `OCONV`
	pub(crate) output_conversion: ConversionTable,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			encoding: Encoding::default(),
			flag_ty: FlagType::default(),
			lang: None,
			ignore: vec![],
			flag_aliases: vec![],
			morphological_aliases: vec![],
			key: DEFAULT_KEYBOARD
				.split('|')
				.map(|row| row.chars().collect())
				.collect(),
			try_chars: vec![],
			no_split_suggestions: false,
			replacements: vec![],
			maps: vec![],
			forbid_warn: false,
			compound_min_parts_length: DEFAULT_COMPOUND_MIN,
			compound_max_word: None,
			compound_check_duplication: false,
			full_strip: false,
			input_conversion: ConversionTable::default(),
			output_conversion: ConversionTable::default(),
		}
	}
}

impl Options {
	/// Read a flag field, resolving `AF` aliases
	pub(crate) fn flags(&self, field: &str) -> Result<Vec<Flag>, FlagError> {
		if self.flag_aliases.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
			return self.flag_ty.parse_flags(field);
		}

		field
			.parse::<usize>()
			.ok()
			.and_then(|index| self.flag_aliases.get(index.checked_sub(1)?))
			.cloned()
			.ok_or_else(|| FlagError::UnknownAlias(field.to_owned()))
	}

	/// Read morphological fields, resolving `AM` aliases
	pub(crate) fn data_fields(&self, field: &str) -> Result<Vec<DataField>, String> {
		let field = field.trim();
		if self.morphological_aliases.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
			return Ok(DataField::parse_list(field));
		}

		field
			.parse::<usize>()
			.ok()
			.and_then(|index| self.morphological_aliases.get(index.checked_sub(1)?))
			.cloned()
			.ok_or_else(|| format!("morphological alias `{field}` is not defined"))
	}

	pub(crate) fn has_morphological_aliases(&self) -> bool {
		!self.morphological_aliases.is_empty()
	}

	/// Remove `IGNORE` characters from `word`
	pub(crate) fn strip_ignored<'a>(&self, word: &'a str) -> Cow<'a, str> {
		if word.contains(self.ignore.as_slice()) {
			Cow::Owned(word.chars().filter(|c| !self.ignore.contains(c)).collect())
		} else {
			Cow::Borrowed(word)
		}
	}
}

#[derive(Debug, Default)]
pub(crate) struct AdditionalFlags {
	// ——— for suggestions
	/// `NOSUGGEST`
	pub(crate) no_suggest: Option<Flag>,
	/// `WARN`
	pub(crate) warn: Option<Flag>,

	// ——— for compounding
	/// `COMPOUNDFLAG`
	pub(crate) compound: Option<Flag>,
	/// `COMPOUNDBEGIN`
	pub(crate) compound_begin: Option<Flag>,
	/// `COMPOUNDMIDDLE`
	pub(crate) compound_middle: Option<Flag>,
	/// `COMPOUNDLAST`
	pub(crate) compound_last: Option<Flag>,
	/// `ONLYINCOMPOUND`
	pub(crate) compound_only: Option<Flag>,

	// ——— other
	/// `FORBIDDENWORD`
	pub(crate) forbidden_word: Option<Flag>,
	/// `KEEPCASE`
	pub(crate) keep_case: Option<Flag>,
	/// `NEEDAFFIX`, `PSEUDOROOT`
	/// Can't exist on it's own
	pub(crate) need_affix: Option<Flag>,
}

impl AdditionalFlags {
	pub(crate) const fn has_compounding(&self) -> bool {
		self.compound.is_some()
			|| self.compound_begin.is_some()
			|| self.compound_middle.is_some()
			|| self.compound_last.is_some()
	}
}

#[derive(Debug, Clone)]
pub(crate) struct Prefix;
#[derive(Debug, Clone)]
pub(crate) struct Suffix;

/// What differs between prefixes and suffixes at parse time
pub(crate) trait AffixKind {
	/// Directive opening a rule block
	const DIRECTIVE: &'static str;

	/// Anchor a condition pattern on the side the affix is attached to
	fn anchor(pattern: &str) -> String;
}

impl AffixKind for Prefix {
	const DIRECTIVE: &'static str = "PFX";

	fn anchor(pattern: &str) -> String {
		format!("^{pattern}")
	}
}

impl AffixKind for Suffix {
	const DIRECTIVE: &'static str = "SFX";

	fn anchor(pattern: &str) -> String {
		format!("{pattern}$")
	}
}

/// Condition a stem must meet for an affix to apply
///
/// Conditions are sequences of characters, `.` wildcards and `[...]` or
/// `[^...]` classes, checked against the start (prefixes) or the end
/// (suffixes) of the stem.
#[derive(Debug, Clone)]
pub(crate) struct Condition {
	source: String,
	regex: Regex,
}

impl Condition {
	fn new<K: AffixKind>(source: &str) -> Result<Self, String> {
		let mut pattern = String::new();
		let mut chars = source.chars();

		while let Some(c) = chars.next() {
			match c {
				'.' => pattern.push('.'),
				'[' => {
					let mut class = String::from("[");
					let mut members = 0_usize;
					let mut closed = false;

					for c in chars.by_ref() {
						match c {
							']' => {
								closed = true;
								break;
							}
							'^' if members == 0 && class == "[" => class.push('^'),
							c => {
								if matches!(c, '\\' | '[' | '-' | '^' | '&' | '~') {
									class.push('\\');
								}
								class.push(c);
								members += 1;
							}
						}
					}

					if !closed {
						return Err("unclosed `[`".into());
					}
					if members == 0 {
						return Err("empty character class".into());
					}

					class.push(']');
					pattern.push_str(&class);
				}
				']' => return Err("unmatched `]`".into()),
				c => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
			}
		}

		let regex = Regex::new(&K::anchor(&pattern)).map_err(|err| err.to_string())?;

		Ok(Self {
			source: source.to_owned(),
			regex,
		})
	}

	pub(crate) fn is_match(&self, stem: &str) -> bool {
		self.regex.is_match(stem)
	}
}

impl fmt::Display for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.source)
	}
}

/// Represent a flag affix, it could be either a prefix (`PFX`) of a suffix (`SFX`).
/// It works the same for both so `AFX` is used in the following example.
///
/// ```aff
/// AFX A Y 1
/// AFX A   0     re/B    .
/// #   ^fg ^strp ^add/^cont ^cond
/// ````
#[derive(Debug, Clone)]
pub(crate) struct Affix<T> {
	pub(crate) flag: Flag,
	pub(crate) cross_product: bool,

	/// Is either the prefix of the suffix
	pub(crate) add: String,
	pub(crate) strip: String,
	pub(crate) condition: Option<Condition>,
	/// Flags of affixes allowed on top of this one
	pub(crate) continuation: Vec<Flag>,
	pub(crate) data_fields: Vec<DataField>,

	_affix_type: PhantomData<T>,
}

impl<T> Affix<T> {
	pub(crate) fn accepts(&self, stem: &str) -> bool {
		self.condition
			.as_ref()
			.map_or(true, |condition| condition.is_match(stem))
	}

	pub(crate) fn continues_with(&self, flag: &Flag) -> bool {
		self.continuation.contains(flag)
	}

	pub(crate) fn continues_with_any(&self, flag: Option<&Flag>) -> bool {
		flag.is_some_and(|flag| self.continues_with(flag))
	}
}

impl Affix<Prefix> {
	/// Part of `word` that follows the added text
	pub(crate) fn remainder<'w>(&self, word: &'w str) -> Option<&'w str> {
		word.strip_prefix(self.add.as_str())
	}

	pub(crate) fn restore(&self, remainder: &str) -> String {
		format!("{}{remainder}", self.strip)
	}

	/// Stem `word` would come from if it was produced by this prefix
	pub(crate) fn stem_of(&self, word: &str, full_strip: bool) -> Option<String> {
		let remainder = self.remainder(word)?;
		if remainder.is_empty() && (!full_strip || self.strip.is_empty()) {
			return None;
		}

		let stem = self.restore(remainder);
		self.accepts(&stem).then_some(stem)
	}

	/// Word produced by adding this prefix to `stem`
	pub(crate) fn apply(&self, stem: &str, full_strip: bool) -> Option<String> {
		let rest = stem.strip_prefix(self.strip.as_str())?;
		if rest.is_empty() && !full_strip {
			return None;
		}

		self.accepts(stem).then(|| format!("{}{rest}", self.add))
	}
}

impl Affix<Suffix> {
	/// Part of `word` that precedes the added text
	pub(crate) fn remainder<'w>(&self, word: &'w str) -> Option<&'w str> {
		word.strip_suffix(self.add.as_str())
	}

	pub(crate) fn restore(&self, remainder: &str) -> String {
		format!("{remainder}{}", self.strip)
	}

	/// Stem `word` would come from if it was produced by this suffix
	pub(crate) fn stem_of(&self, word: &str, full_strip: bool) -> Option<String> {
		let remainder = self.remainder(word)?;
		if remainder.is_empty() && (!full_strip || self.strip.is_empty()) {
			return None;
		}

		let stem = self.restore(remainder);
		self.accepts(&stem).then_some(stem)
	}

	/// Word produced by adding this suffix to `stem`
	pub(crate) fn apply(&self, stem: &str, full_strip: bool) -> Option<String> {
		let rest = stem.strip_suffix(self.strip.as_str())?;
		if rest.is_empty() && !full_strip {
			return None;
		}

		self.accepts(stem).then(|| format!("{rest}{}", self.add))
	}
}

impl fmt::Display for Affix<Prefix> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Prefix({}-, ", self.add,)?;
		if let Some(condition) = &self.condition {
			write!(f, "on {condition}, ")?;
		}
		write!(
			f,
			"{}{}",
			self.flag,
			if self.cross_product { "×" } else { "" }
		)?;
		if !self.strip.is_empty() {
			write!(f, ", -{}", self.strip)?;
		}
		write!(f, ")")
	}
}

impl fmt::Display for Affix<Suffix> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Suffix(-{}, ", self.add,)?;
		if let Some(condition) = &self.condition {
			write!(f, "on {condition}, ")?;
		}
		write!(
			f,
			"{}{}",
			self.flag,
			if self.cross_product { "×" } else { "" }
		)?;
		if !self.strip.is_empty() {
			write!(f, ", -{}", self.strip)?;
		}
		write!(f, ")")
	}
}

/// One `REP` entry, `^` and `$` anchor the pattern to the word boundaries
#[derive(Debug, Clone)]
pub(crate) struct Replacement {
	pub(crate) from: String,
	pub(crate) to: String,
	pub(crate) at_start: bool,
	pub(crate) at_end: bool,
}

impl Replacement {
	fn new(pattern: &str, rep: &str, anchors: (char, char)) -> Self {
		let (at_start, pattern) = pattern
			.strip_prefix(anchors.0)
			.map_or((false, pattern), |pat| (true, pat));
		let (at_end, pattern) = pattern
			.strip_suffix(anchors.1)
			.map_or((false, pattern), |pat| (true, pat));

		Self {
			from: pattern.to_owned(),
			// Hunspell defines underscores as spaces in replacement
			to: rep.replace('_', " "),
			at_start,
			at_end,
		}
	}

	/// Whether the pattern matches `word` at byte `index`
	pub(crate) fn matches_at(&self, word: &str, index: usize) -> bool {
		!self.from.is_empty()
			&& word[index..].starts_with(self.from.as_str())
			&& (!self.at_start || index == 0)
			&& (!self.at_end || index + self.from.len() == word.len())
	}
}

/// `ICONV` and `OCONV` tables, underscores mark word boundaries
#[derive(Debug, Default)]
pub(crate) struct ConversionTable {
	replacements: Vec<Replacement>,
}

impl ConversionTable {
	fn add(&mut self, pattern: &str, rep: &str) {
		let mut replacement = Replacement::new(pattern, rep, ('_', '_'));
		// Underscores only mark boundaries here, the output is taken as is
		rep.clone_into(&mut replacement.to);
		self.replacements.push(replacement);
	}

	#[cfg(test)]
	fn len(&self) -> usize {
		self.replacements.len()
	}

	/// Replace every pattern occurrence, the longest pattern wins at each position
	pub(crate) fn convert<'a>(&self, word: &'a str) -> Cow<'a, str> {
		if self.replacements.is_empty() {
			return Cow::Borrowed(word);
		}

		let mut converted = String::with_capacity(word.len());
		let mut changed = false;
		let mut index = 0;

		while index < word.len() {
			let best = self
				.replacements
				.iter()
				.filter(|rep| rep.matches_at(word, index))
				.max_by_key(|rep| rep.from.len());

			if let Some(rep) = best {
				converted.push_str(&rep.to);
				index += rep.from.len();
				changed = true;
			} else {
				let Some(c) = word[index..].chars().next() else {
					break;
				};
				converted.push(c);
				index += c.len_utf8();
			}
		}

		if changed {
			Cow::Owned(converted)
		} else {
			Cow::Borrowed(word)
		}
	}
}

/// Meaningful lines of an affix file with their 1-based numbers
struct LineCursor<'a> {
	lines: Vec<(usize, &'a str)>,
	position: usize,
}

impl<'a> LineCursor<'a> {
	fn new(content: &'a str) -> Self {
		let lines = content
			.lines()
			.enumerate()
			.map(|(index, line)| (index + 1, line.trim()))
			.filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
			.collect();

		Self { lines, position: 0 }
	}

	fn peek(&self) -> Option<(usize, &'a str)> {
		self.lines.get(self.position).copied()
	}
}

impl<'a> Iterator for LineCursor<'a> {
	type Item = (usize, &'a str);

	fn next(&mut self) -> Option<Self::Item> {
		let line = self.peek()?;
		self.position += 1;
		Some(line)
	}
}

fn directive_name(i: &str) -> IResult<&str, &str> {
	take_while1(|c: char| c.is_ascii_uppercase() || c == '_')
		.terminated(space0)
		.parse(i)
}

/// `flag cross_product count`
fn affix_header(i: &str) -> IResult<&str, (&str, bool, u64)> {
	tuple((
		is_not(" \t"),
		alt((tag("Y").value(true), tag("N").value(false))).preceded_by(space1),
		u64_p.preceded_by(space1),
	))
	.parse(i)
}

/// `strip add[/flags] [condition] [morphology]`
fn affix_rule_fields(i: &str) -> IResult<&str, (&str, &str, Option<&str>, Option<&str>)> {
	tuple((
		is_not(" \t"),
		is_not(" \t").preceded_by(space1),
		is_not(" \t").preceded_by(space1).opt(),
		rest.preceded_by(space1).opt(),
	))
	.all_consuming()
	.parse(i)
}

/// Two whitespace separated tokens, anything after them is ignored
fn pair(i: &str) -> IResult<&str, (&str, &str)> {
	tuple((is_not(" \t"), is_not(" \t").preceded_by(space1))).parse(i)
}

/// `0` stands for an empty strip or add field
fn zero_is_empty(field: &str) -> &str {
	if field == "0" {
		""
	} else {
		field
	}
}

#[derive(Default)]
struct AffParser {
	options: Options,
	prefixes: Vec<Affix<Prefix>>,
	suffixes: Vec<Affix<Suffix>>,
	additional_flags: AdditionalFlags,

	/// Set once a flag was read, `FLAG` cannot change the width after that
	flags_read: bool,
	/// Rule count of every `PFX`/`SFX` block by directive and flag
	declared: HashMap<(&'static str, String), usize>,
}

impl AffParser {
	fn parse(mut self, content: &str) -> Result<Self, AffixFileError> {
		let content = content.strip_prefix('\u{feff}').unwrap_or(content);
		let mut lines = LineCursor::new(content);

		while let Some((number, line)) = lines.next() {
			self.parse_directive(number, line, &mut lines)?;
		}

		Ok(self)
	}

	/// Takes care of parsing a whole directive, consuming the lines of its block
	#[allow(clippy::too_many_lines)]
	fn parse_directive<'a>(
		&mut self,
		number: usize,
		line: &'a str,
		lines: &mut LineCursor<'a>,
	) -> Result<(), AffixFileError> {
		let Ok((args, name)) = directive_name(line) else {
			log::debug!("line {number}: skipping `{line}`");
			return Ok(());
		};

		match name {
			"SET" => {
				self.options.encoding = args
					.parse()
					.map_err(|err: EncodingError| syntax(number, err))?;
			}
			"FLAG" => {
				if self.flags_read {
					return Err(AffixFileError::LateFlagType { line: number });
				}
				self.options.flag_ty = args
					.parse()
					.map_err(|()| syntax(number, format!("unknown flag type `{args}`")))?;
			}
			"LANG" => self.options.lang = Some(args.to_owned()),
			"IGNORE" => self.options.ignore = args.chars().collect(),
			"AF" => {
				let count = Self::count(number, args)?;
				self.flags_read = true;
				for (line, entry) in Self::block(number, "AF", count, None, lines)? {
					let field = entry.split_whitespace().next().unwrap_or_default();
					let flags = self
						.options
						.flag_ty
						.parse_flags(field)
						.map_err(|source| AffixFileError::InvalidFlag { line, source })?;
					self.options.flag_aliases.push(flags);
				}
			}
			"AM" => {
				let count = Self::count(number, args)?;
				for (_, entry) in Self::block(number, "AM", count, None, lines)? {
					self.options
						.morphological_aliases
						.push(DataField::parse_list(entry));
				}
			}

			// ——— for suggestions
			"KEY" => {
				self.options.key = args
					.split('|')
					.map(|row| row.chars().collect())
					.collect();
			}
			"TRY" => self.options.try_chars = args.chars().collect(),
			"NOSUGGEST" => self.set_flag(number, name, args, |f| &mut f.no_suggest)?,
			"WARN" => self.set_flag(number, name, args, |f| &mut f.warn)?,
			"FORBIDWARN" => self.options.forbid_warn = true,
			"NOSPLITSUGS" => self.options.no_split_suggestions = true,
			"REP" => {
				let count = Self::count(number, args)?;
				for (line, entry) in Self::block(number, "REP", count, None, lines)? {
					let (_, (pattern, rep)) =
						pair(entry).map_err(|_| syntax(line, format!("invalid `REP` entry `{entry}`")))?;
					self.options
						.replacements
						.push(Replacement::new(pattern, rep, ('^', '$')));
				}
			}
			"MAP" => {
				let count = Self::count(number, args)?;
				for (_, entry) in Self::block(number, "MAP", count, None, lines)? {
					let group = entry.split_whitespace().next().unwrap_or_default();
					self.options.maps.push(Self::map_group(group));
				}
			}

			// ——— for compounding
			"COMPOUNDFLAG" => self.set_flag(number, name, args, |f| &mut f.compound)?,
			"COMPOUNDBEGIN" => self.set_flag(number, name, args, |f| &mut f.compound_begin)?,
			"COMPOUNDMIDDLE" => self.set_flag(number, name, args, |f| &mut f.compound_middle)?,
			"COMPOUNDLAST" => self.set_flag(number, name, args, |f| &mut f.compound_last)?,
			"ONLYINCOMPOUND" => self.set_flag(number, name, args, |f| &mut f.compound_only)?,
			"COMPOUNDMIN" => {
				// Hunspell treats values under 1 as 1
				self.options.compound_min_parts_length = Self::count(number, args)?.max(1);
			}
			"COMPOUNDWORDMAX" => {
				self.options.compound_max_word = Some(Self::count(number, args)?);
			}
			"CHECKCOMPOUNDDUP" => self.options.compound_check_duplication = true,
			"COMPOUNDRULE" => {
				let count = Self::count(number, args)?;
				Self::block(number, "COMPOUNDRULE", count, None, lines)?;
				log::warn!("line {number}: `COMPOUNDRULE` is not supported, the {count} rules are ignored");
			}

			// ——— for affix creation
			"PFX" => {
				let mut prefixes = self.affix_block::<Prefix>(number, args, lines)?;
				self.prefixes.append(&mut prefixes);
			}
			"SFX" => {
				let mut suffixes = self.affix_block::<Suffix>(number, args, lines)?;
				self.suffixes.append(&mut suffixes);
			}

			// ——— other
			"FORBIDDENWORD" => self.set_flag(number, name, args, |f| &mut f.forbidden_word)?,
			"KEEPCASE" => self.set_flag(number, name, args, |f| &mut f.keep_case)?,
			"NEEDAFFIX" => self.set_flag(number, name, args, |f| &mut f.need_affix)?,
			"PSEUDOROOT" => {
				log::warn!("line {number}: `PSEUDOROOT` is deprecated, use `NEEDAFFIX`");
				self.set_flag(number, name, args, |f| &mut f.need_affix)?;
			}
			"FULLSTRIP" => self.options.full_strip = true,
			"ICONV" | "OCONV" => {
				let count = Self::count(number, args)?;
				for (line, entry) in Self::block(number, name, count, None, lines)? {
					let (_, (pattern, rep)) = pair(entry)
						.map_err(|_| syntax(line, format!("invalid `{name}` entry `{entry}`")))?;
					let table = if name == "ICONV" {
						&mut self.options.input_conversion
					} else {
						&mut self.options.output_conversion
					};
					table.add(pattern, rep);
				}
			}

			_ => log::debug!("line {number}: ignoring unsupported directive `{name}`"),
		};

		Ok(())
	}

	fn count(number: usize, args: &str) -> Result<usize, AffixFileError> {
		let field = args.split_whitespace().next().unwrap_or_default();
		field
			.parse()
			.map_err(|_| syntax(number, format!("expected a count, found `{args}`")))
	}

	/// Take the `count` entries of a block opened on line `number`
	///
	/// Every entry repeats the directive and, for affixes, the `owner` flag.
	fn block<'a>(
		number: usize,
		directive: &str,
		count: usize,
		owner: Option<&str>,
		lines: &mut LineCursor<'a>,
	) -> Result<Vec<(usize, &'a str)>, AffixFileError> {
		let after_token = |line: &'a str, token: &str| -> Option<&'a str> {
			let rest = line.strip_prefix(token)?;
			rest.starts_with(char::is_whitespace)
				.then(|| rest.trim_start())
		};

		let mut entries = Vec::with_capacity(count);
		while entries.len() < count {
			let entry = lines.peek().and_then(|(line, content)| {
				let rest = after_token(content, directive)?;
				let rest = match owner {
					Some(owner) => after_token(rest, owner)?,
					None => rest,
				};
				Some((line, rest))
			});

			match entry {
				Some(entry) => {
					lines.next();
					entries.push(entry);
				}
				None => {
					return Err(AffixFileError::CountMismatch {
						line: number,
						directive: owner.map_or_else(
							|| directive.to_owned(),
							|owner| format!("{directive} {owner}"),
						),
						expected: count,
						found: entries.len(),
					})
				}
			}
		}

		Ok(entries)
	}

	fn affix_block<'a, K: AffixKind>(
		&mut self,
		number: usize,
		args: &str,
		lines: &mut LineCursor<'a>,
	) -> Result<Vec<Affix<K>>, AffixFileError> {
		let Ok((_, (token, cross_product, count))) = affix_header(args) else {
			let owner = args.split_whitespace().next().unwrap_or_default();
			// A rule line past the end of its block looks like a broken header
			return Err(
				match self.declared.get(&(K::DIRECTIVE, owner.to_owned())) {
					Some(&expected) => AffixFileError::CountMismatch {
						line: number,
						directive: format!("{} {owner}", K::DIRECTIVE),
						expected,
						found: expected + 1,
					},
					None => syntax(number, format!("invalid `{}` header `{args}`", K::DIRECTIVE)),
				},
			);
		};

		let flag = self.flag(number, token)?;
		let count = usize::try_from(count).map_err(|err| syntax(number, err))?;
		if self
			.declared
			.insert((K::DIRECTIVE, token.to_owned()), count)
			.is_some()
		{
			log::warn!("line {number}: `{} {token}` is declared twice, rules are merged", K::DIRECTIVE);
		}

		Self::block(number, K::DIRECTIVE, count, Some(token), lines)?
			.into_iter()
			.map(|(line, entry)| self.affix_rule(line, entry, &flag, cross_product))
			.collect()
	}

	fn affix_rule<K: AffixKind>(
		&mut self,
		line: usize,
		entry: &str,
		flag: &Flag,
		cross_product: bool,
	) -> Result<Affix<K>, AffixFileError> {
		let (_, (strip, add, condition, morphology)) = affix_rule_fields(entry)
			.map_err(|_| syntax(line, format!("invalid `{}` rule `{entry}`", K::DIRECTIVE)))?;

		let (add, continuation) = match add.split_once('/') {
			Some((add, flags)) => {
				self.flags_read = true;
				let continuation = self
					.options
					.flags(flags)
					.map_err(|source| AffixFileError::InvalidFlag { line, source })?;
				(add, continuation)
			}
			None => (add, vec![]),
		};

		let condition = match condition {
			None | Some(".") => None,
			Some(source) => Some(Condition::new::<K>(source).map_err(|reason| {
				AffixFileError::InvalidCondition {
					line,
					condition: source.to_owned(),
					reason,
				}
			})?),
		};

		let data_fields = match morphology {
			// Trailing comments are common after the condition
			Some(morphology) if !morphology.starts_with('#') => self
				.options
				.data_fields(morphology)
				.map_err(|err| syntax(line, err))?,
			_ => vec![],
		};

		Ok(Affix {
			flag: flag.clone(),
			cross_product,
			strip: self.options.strip_ignored(zero_is_empty(strip)).into_owned(),
			add: self.options.strip_ignored(zero_is_empty(add)).into_owned(),
			condition,
			continuation,
			data_fields,
			_affix_type: PhantomData,
		})
	}

	/// Parse a single flag, after which `FLAG` cannot be changed anymore
	fn flag(&mut self, number: usize, token: &str) -> Result<Flag, AffixFileError> {
		self.flags_read = true;
		self.options
			.flag_ty
			.parse_flag(token)
			.map_err(|source| AffixFileError::InvalidFlag {
				line: number,
				source,
			})
	}

	fn set_flag(
		&mut self,
		number: usize,
		directive: &str,
		args: &str,
		place: fn(&mut AdditionalFlags) -> &mut Option<Flag>,
	) -> Result<(), AffixFileError> {
		let token = args.split_whitespace().next().unwrap_or_default();
		let flag = self.flag(number, token)?;
		if let Some(old_flag) = place(&mut self.additional_flags).replace(flag) {
			log::warn!("line {number}: `{directive}` replaces previous flag `{old_flag}`");
		}
		Ok(())
	}

	/// `MAP` groups are characters, parentheses gather multi-character members
	fn map_group(group: &str) -> Vec<String> {
		let mut members = vec![];
		let mut chars = group.chars();
		while let Some(c) = chars.next() {
			if c == '(' {
				let member = chars.by_ref().take_while(|c| *c != ')').collect::<String>();
				if !member.is_empty() {
					members.push(member);
				}
			} else {
				members.push(c.to_string());
			}
		}
		members
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Flag {
	Short(char),
	Long([char; 2]),
	Utf8(char),
	// in 1-65000
	Numeric(u16),
}

impl fmt::Display for Flag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Short(char) | Self::Utf8(char) => write!(f, "{char}"),
			Self::Long([c1, c2]) => write!(f, "{c1}{c2}"),
			Self::Numeric(num) => write!(f, "{num}"),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum FlagType {
	/// `short`
	#[default]
	Short,
	/// `long`
	Long,
	/// `UTF-8`
	Utf8,
	/// `num` (or `numeric`)
	Numeric,
}

impl FlagType {
	/// Split a flag field according to the flag width
	pub(crate) fn parse_flags(&self, field: &str) -> Result<Vec<Flag>, FlagError> {
		if field.is_empty() {
			return Err(FlagError::Empty);
		}

		match self {
			Self::Short => Ok(field.chars().map(Flag::Short).collect()),
			Self::Utf8 => Ok(field.chars().map(Flag::Utf8).collect()),
			Self::Long => {
				let chars = field.chars().collect::<Vec<_>>();
				if chars.len() % 2 != 0 {
					return Err(FlagError::OddLength(field.to_owned()));
				}
				Ok(chars
					.chunks_exact(2)
					.map(|pair| Flag::Long([pair[0], pair[1]]))
					.collect())
			}
			Self::Numeric => field
				.split(',')
				.map(|num| {
					num.parse::<u16>()
						.ok()
						.filter(|num| (1..=65000).contains(num))
						.map(Flag::Numeric)
						.ok_or_else(|| FlagError::NotNumeric(num.to_owned()))
				})
				.collect(),
		}
	}

	/// Parse a token that must hold exactly one flag
	pub(crate) fn parse_flag(&self, token: &str) -> Result<Flag, FlagError> {
		let mut flags = self.parse_flags(token)?;
		match flags.pop() {
			Some(flag) if flags.is_empty() => Ok(flag),
			_ => Err(FlagError::NotSingle(token.to_owned())),
		}
	}
}

impl FromStr for FlagType {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"short" => Ok(Self::Short),
			"long" => Ok(Self::Long),
			"num" | "numeric" => Ok(Self::Numeric),
			"UTF-8" => Ok(Self::Utf8),
			_ => Err(()),
		}
	}
}
