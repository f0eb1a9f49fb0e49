use crate::{
	aff::{self, Flag},
	lookup::{titlecase, Casing},
};
use nom::{
	bytes::complete::{is_not, tag, take},
	error::{Error, ErrorKind},
	IResult, Parser,
};
use nom_supreme::ParserExt;
use std::{
	collections::HashMap,
	fmt::{self, Debug},
};

/// A line of a word list that could not be read, loading goes on without it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {reason}")]
pub struct MalformedDictionaryLine {
	/// 1-based line number, `0` for words added at runtime
	pub line: usize,
	/// What is wrong with the line
	pub reason: String,
}

/// Word list of a dictionary: stems tagged with their affix flags
#[derive(Debug, Default)]
pub(crate) struct WordList {
	/// Homonyms share the same root but not the same flags
	index: HashMap<String, Vec<Stem>>,
	len: usize,
	/// Frequency of every character found in stems
	chars: HashMap<char, usize>,
	/// Titlecased copies of mixed case stems, and of uppercase stems taking
	/// affixes, only reachable from uppercase input
	upcase: HashMap<String, Vec<Stem>>,
}

impl WordList {
	/// Read `.dic` content into the list
	///
	/// The first line may hold an approximate entry count. Lines that cannot be
	/// read are logged, skipped and returned.
	pub(crate) fn load(
		&mut self,
		content: &str,
		options: &aff::Options,
	) -> Vec<MalformedDictionaryLine> {
		let content = content.strip_prefix('\u{feff}').unwrap_or(content);
		let parser = DicParser { options };

		let mut lines = content.lines().enumerate().peekable();
		if let Some((_, first)) = lines.peek() {
			if let Ok(hint) = first.trim().parse::<usize>() {
				self.index.reserve(hint);
				lines.next();
			}
		}

		let before = self.len;
		let mut malformed = vec![];
		for (index, line) in lines {
			// Tab-led lines are comments
			if line.trim().is_empty() || line.starts_with('\t') {
				continue;
			}

			match parser.parse_entry(line.trim_end()) {
				Ok(stem) => self.push(stem),
				Err(reason) => {
					let error = MalformedDictionaryLine {
						line: index + 1,
						reason,
					};
					log::warn!("skipping dictionary {error}");
					malformed.push(error);
				}
			}
		}

		log::info!(
			"loaded {} dictionary entries, skipped {}",
			self.len - before,
			malformed.len()
		);

		malformed
	}

	fn push(&mut self, stem: Stem) {
		for c in stem.root.chars() {
			*self.chars.entry(c).or_default() += 1;
		}
		if let Some(key) = upcase_key(&stem) {
			self.upcase.entry(key).or_default().push(stem.clone());
		}
		self.index.entry(stem.root.clone()).or_default().push(stem);
		self.len += 1;
	}

	/// Rebuild the uppercase copies of `word` after its homonyms changed
	fn refresh_upcase(&mut self, word: &str) {
		let key = titlecase(word);
		if let Some(stems) = self.upcase.get_mut(&key) {
			stems.retain(|stem| stem.root != word);
			if stems.is_empty() {
				self.upcase.remove(&key);
			}
		}

		for stem in self.index.get(word).into_iter().flatten() {
			if let Some(key) = upcase_key(stem) {
				self.upcase.entry(key).or_default().push(stem.clone());
			}
		}
	}

	pub(crate) fn homonyms<'a>(&'a self, stem: &str) -> impl Iterator<Item = &'a Stem> + 'a {
		self.index.get(stem).into_iter().flatten()
	}

	/// Stems an uppercase word may come from once titlecased, like `iPod` for `Ipod`
	pub(crate) fn upcase_homonyms<'a>(&'a self, stem: &str) -> impl Iterator<Item = &'a Stem> + 'a {
		self.upcase.get(stem).into_iter().flatten()
	}

	pub(crate) fn contains(&self, word: &str) -> bool {
		self.index.contains_key(word)
	}

	/// Add `word` without any flag, unless it is already there
	pub(crate) fn insert(&mut self, word: &str) {
		if !self.contains(word) {
			self.push(Stem::new(word, vec![]));
		}
	}

	/// Attach `flags` to the first homonym of `word`, creating it if needed
	pub(crate) fn insert_with_flags(&mut self, word: &str, flags: Vec<Flag>) {
		let Some(stem) = self.index.get_mut(word).and_then(|stems| stems.first_mut()) else {
			self.push(Stem::new(word, flags));
			return;
		};

		for flag in flags {
			if !stem.flags.contains(&flag) {
				stem.flags.push(flag);
			}
		}
		self.refresh_upcase(word);
	}

	/// Take `flag` away from every homonym of `word`
	pub(crate) fn strip_flag(&mut self, word: &str, flag: &Flag) {
		for stem in self.index.get_mut(word).into_iter().flatten() {
			stem.flags.retain(|other| other != flag);
		}
		self.refresh_upcase(word);
	}

	/// Push a new homonym even if `word` is already known
	pub(crate) fn insert_homonym(&mut self, word: &str) {
		self.push(Stem::new(word, vec![]));
	}

	/// Drop every homonym of `word`
	pub(crate) fn remove(&mut self, word: &str) -> usize {
		let Some(stems) = self.index.remove(word) else {
			return 0;
		};

		for c in word.chars() {
			if let Some(count) = self.chars.get_mut(&c) {
				*count = count.saturating_sub(stems.len());
				if *count == 0 {
					self.chars.remove(&c);
				}
			}
		}

		self.refresh_upcase(word);
		self.len -= stems.len();
		stems.len()
	}

	pub(crate) const fn len(&self) -> usize {
		self.len
	}

	/// Characters used by the stems, most frequent first
	pub(crate) fn alphabet(&self) -> Vec<char> {
		let mut chars = self.chars.iter().collect::<Vec<_>>();
		chars.sort_unstable_by(|(c1, n1), (c2, n2)| n2.cmp(n1).then(c1.cmp(c2)));
		chars.into_iter().map(|(c, _)| *c).collect()
	}

	pub(crate) fn stems(&self) -> impl Iterator<Item = &Stem> {
		self.index.values().flatten()
	}
}

fn upcase_key(stem: &Stem) -> Option<String> {
	match Casing::guess(&stem.root) {
		Casing::Huh | Casing::HuhInit => {}
		Casing::All if !stem.flags.is_empty() => {}
		Casing::No | Casing::Init | Casing::All => return None,
	}
	Some(titlecase(&stem.root))
}

struct DicParser<'options> {
	options: &'options aff::Options,
}

impl<'options> DicParser<'options> {
	/// `stem[/flags][<TAB or space>morphology]`
	fn parse_entry(&self, line: &str) -> Result<Stem, String> {
		let (head, morphology) = self.split_morphology(line);

		let (root, flags) = match Self::split_flags(head) {
			(root, Some(flags)) => (
				root,
				self.options.flags(flags).map_err(|err| err.to_string())?,
			),
			(root, None) => (root, vec![]),
		};

		let root = root.replace("\\/", "/");
		let root = self.options.strip_ignored(&root).into_owned();
		if root.is_empty() {
			return Err("empty stem".into());
		}

		let data_fields = match morphology.map(str::trim) {
			Some(morphology) if !morphology.is_empty() => self.options.data_fields(morphology)?,
			_ => vec![],
		};

		Ok(Stem {
			root,
			flags,
			data_fields,
		})
	}

	/// Morphology starts at a tab, or at a space followed by a `xx:` field or
	/// an `AM` alias number, other spaces belong to the stem
	fn split_morphology<'l>(&self, line: &'l str) -> (&'l str, Option<&'l str>) {
		if let Some((head, morphology)) = line.split_once('\t') {
			return (head.trim_end(), Some(morphology));
		}

		let starts_field = |rest: &str| {
			let mut chars = rest.chars();
			chars.next().is_some_and(|c| !c.is_whitespace())
				&& chars.next().is_some_and(|c| !c.is_whitespace())
				&& chars.next() == Some(':')
		};
		let is_alias = |rest: &str| {
			self.options.has_morphological_aliases()
				&& !rest.is_empty()
				&& rest.chars().all(|c| c.is_ascii_digit())
		};

		for (index, _) in line.match_indices(' ') {
			let rest = &line[index + 1..];
			if starts_field(rest) || is_alias(rest.trim()) {
				return (line[..index].trim_end(), Some(rest));
			}
		}

		(line, None)
	}

	/// Split on the first slash that is neither escaped nor leading
	fn split_flags(head: &str) -> (&str, Option<&str>) {
		let mut previous = None;
		for (index, c) in head.char_indices() {
			if c == '/' && index > 0 && previous != Some('\\') {
				return (&head[..index], Some(&head[index + 1..]));
			}
			previous = Some(c);
		}
		(head, None)
	}
}

impl fmt::Display for WordList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{}", self.len)?;
		for stem in self.stems() {
			writeln!(f, "{stem}")?;
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Stem {
	pub(crate) root: String,
	pub(crate) flags: Vec<Flag>,
	pub(crate) data_fields: Vec<DataField>,
}

impl Stem {
	fn new(root: &str, flags: Vec<Flag>) -> Self {
		Self {
			root: root.to_owned(),
			flags,
			data_fields: vec![],
		}
	}

	pub(crate) fn has(&self, flag: Option<&Flag>) -> bool {
		flag.is_some_and(|flag| self.flags.contains(flag))
	}
}

impl fmt::Display for Stem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.root.replace('/', "\\/"))?;
		if !self.flags.is_empty() {
			write!(f, "/")?;
			for flag in &self.flags {
				write!(f, "{flag}")?;
			}
		}
		for data in &self.data_fields {
			write!(f, " {data}")?;
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DataField {
	Alternative(String),
	Stem(String),
	Allomorph(String),
	PartOfSpeech(String),

	DerivationalSuffix(String),
	InflectionalSuffix(String),
	TerminalSuffix(String),

	// There are reserved but not used
	DerivationalPrefix(String),
	InflectionalPrefix(String),
	TerminalPrefix(String),

	SurfacePrefix(String),
	PartsOfCompound(String),

	/// Free text or a field code we do not know, kept as written
	Other(String),
}

impl DataField {
	fn parse(i: &str) -> IResult<&str, Self> {
		let (rest, (discriminant, value)) = take(2usize)
			.terminated(tag(":"))
			.and(is_not(" \t\n"))
			.parse(i)?;

		let value = value.to_owned();
		let field = match discriminant {
			"ph" => Self::Alternative(value),
			"st" => Self::Stem(value),
			"al" => Self::Allomorph(value),
			"po" => Self::PartOfSpeech(value),

			"ds" => Self::DerivationalSuffix(value),
			"is" => Self::InflectionalSuffix(value),
			"ts" => Self::TerminalSuffix(value),

			"dp" => Self::DerivationalPrefix(value),
			"ip" => Self::InflectionalPrefix(value),
			"tp" => Self::TerminalPrefix(value),

			"sp" => Self::SurfacePrefix(value),
			"pa" => Self::PartsOfCompound(value),

			_ => return Err(nom::Err::Error(Error::new(i, ErrorKind::Tag))),
		};

		Ok((rest, field))
	}

	/// Whitespace separated data fields, unknown tokens are kept as [`DataField::Other`]
	pub(crate) fn parse_list(i: &str) -> Vec<Self> {
		i.split_whitespace()
			.map(|token| match Self::parse.all_consuming().parse(token) {
				Ok((_, field)) => field,
				Err(_) => Self::Other(token.to_owned()),
			})
			.collect()
	}
}

impl fmt::Display for DataField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Alternative(alter) => write!(f, "ph:{alter}"),
			Self::Stem(stem) => write!(f, "st:{stem}"),
			Self::Allomorph(al) => write!(f, "al:{al}"),
			Self::PartOfSpeech(po) => write!(f, "po:{po}"),

			Self::DerivationalSuffix(ds) => write!(f, "ds:{ds}"),
			Self::InflectionalSuffix(is) => write!(f, "is:{is}"),
			Self::TerminalSuffix(ts) => write!(f, "ts:{ts}"),

			Self::DerivationalPrefix(dp) => write!(f, "dp:{dp}"),
			Self::InflectionalPrefix(ip) => write!(f, "ip:{ip}"),
			Self::TerminalPrefix(tp) => write!(f, "tp:{tp}"),

			Self::SurfacePrefix(sp) => write!(f, "sp:{sp}"),
			Self::PartsOfCompound(pa) => write!(f, "pa:{pa}"),

			Self::Other(text) => write!(f, "{text}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::aff::{FlagType, Options};

	const TEST_WORD: &str = "hello";

	#[test]
	fn can_parse_every_data_field_form() -> Result<(), nom::Err<nom::error::Error<&'static str>>> {
		macro_rules! test {
			($source:literal => $res:expr) => {{
				use DataField::*;
				let (i, df) = DataField::parse($source)?;
				assert_eq!(df, $res);
				assert_eq!(i, "");
			}};
		}

		test!("ph:hello" => Alternative(TEST_WORD.into()));
		test!("st:hello" => Stem(TEST_WORD.into()));
		test!("al:hello" => Allomorph(TEST_WORD.into()));
		test!("po:hello" => PartOfSpeech(TEST_WORD.into()));

		test!("ds:hello" => DerivationalSuffix(TEST_WORD.into()));
		test!("is:hello" => InflectionalSuffix(TEST_WORD.into()));
		test!("ts:hello" => TerminalSuffix(TEST_WORD.into()));

		test!("dp:hello" => DerivationalPrefix(TEST_WORD.into()));
		test!("ip:hello" => InflectionalPrefix(TEST_WORD.into()));
		test!("tp:hello" => TerminalPrefix(TEST_WORD.into()));

		test!("sp:hello" => SurfacePrefix(TEST_WORD.into()));
		test!("pa:hello" => PartsOfCompound(TEST_WORD.into()));

		assert!(DataField::parse("xx:hello").is_err());

		Ok(())
	}

	#[test]
	fn can_parse_data_field_list() {
		use DataField::*;

		assert_eq!(
			DataField::parse_list(" ph:hello al:hello"),
			[Alternative(TEST_WORD.into()), Allomorph(TEST_WORD.into())]
		);
		assert_eq!(
			DataField::parse_list("ph:hello\tal:hello po:hello"),
			[
				Alternative(TEST_WORD.into()),
				Allomorph(TEST_WORD.into()),
				PartOfSpeech(TEST_WORD.into())
			]
		);
		assert_eq!(
			DataField::parse_list("po:noun free fl:text"),
			[
				PartOfSpeech("noun".into()),
				Other("free".into()),
				Other("fl:text".into())
			]
		);
		assert!(DataField::parse_list("  ").is_empty());
	}

	#[test]
	fn can_parse_entry() -> Result<(), String> {
		use DataField::*;

		let options = Options::default();
		let dic = DicParser { options: &options };

		assert_eq!(
			dic.parse_entry("word/FGS ph:hello")?,
			super::Stem {
				root: "word".into(),
				flags: vec![Flag::Short('F'), Flag::Short('G'), Flag::Short('S')],
				data_fields: vec![Alternative(TEST_WORD.into())],
			}
		);
		assert_eq!(dic.parse_entry("and\\/or/A")?.root, "and/or");
		assert_eq!(dic.parse_entry("/usr")?.root, "/usr");
		assert_eq!(
			dic.parse_entry("cat\tpo:noun")?.data_fields,
			[PartOfSpeech("noun".into())]
		);
		assert_eq!(
			dic.parse_entry("cat\tnoun")?.data_fields,
			[Other("noun".into())]
		);

		Ok(())
	}

	#[test]
	fn spaces_belong_to_the_stem_until_a_field() -> Result<(), String> {
		use DataField::*;

		let options = Options::default();
		let dic = DicParser { options: &options };

		let entry = dic.parse_entry("New York/S po:noun")?;
		assert_eq!(entry.root, "New York");
		assert_eq!(entry.flags, [Flag::Short('S')]);
		assert_eq!(entry.data_fields, [PartOfSpeech("noun".into())]);

		let entry = dic.parse_entry("ice cream")?;
		assert_eq!(entry.root, "ice cream");
		assert!(entry.data_fields.is_empty());

		Ok(())
	}

	#[test]
	fn malformed_lines_are_skipped() {
		let mut options = Options::default();
		options.flag_ty = FlagType::Long;
		let mut words = WordList::default();

		let malformed = words.load("4\nfine/AaBb\nbroken/ABC\nempty/\nalso_fine\n", &options);

		assert_eq!(words.len(), 2);
		assert!(words.contains("fine") && words.contains("also_fine"));
		assert_eq!(
			malformed.iter().map(|err| err.line).collect::<Vec<_>>(),
			[3, 4]
		);
	}

	#[test]
	fn mixed_case_stems_get_an_uppercase_copy() {
		let options = Options::default();
		let mut words = WordList::default();
		words.load("4\niPod/s\nUNICEF/S\nNATO\nhello\n", &options);

		assert_eq!(words.len(), 4);
		assert_eq!(words.upcase_homonyms("Ipod").next().map(|s| s.root.as_str()), Some("iPod"));
		assert_eq!(words.upcase_homonyms("Unicef").count(), 1);
		assert_eq!(words.upcase_homonyms("Nato").count(), 0);
		assert_eq!(words.upcase_homonyms("Hello").count(), 0);
		assert!(!words.contains("Ipod"));

		words.insert_with_flags("iPod", vec![Flag::Short('x')]);
		assert_eq!(
			words.upcase_homonyms("Ipod").next().map(|s| s.flags.clone()),
			Some(vec![Flag::Short('s'), Flag::Short('x')])
		);

		words.remove("iPod");
		assert_eq!(words.upcase_homonyms("Ipod").count(), 0);
	}

	#[test]
	fn insertion_and_removal_keep_the_alphabet() {
		let options = Options::default();
		let mut words = WordList::default();
		words.load("2\nbob\nbib/A\n", &options);

		assert_eq!(words.alphabet(), ['b', 'i', 'o']);

		words.insert("bob");
		assert_eq!(words.len(), 2);

		words.insert_with_flags("bob", vec![Flag::Short('Z')]);
		assert_eq!(
			words.homonyms("bob").next().map(|s| s.flags.clone()),
			Some(vec![Flag::Short('Z')])
		);

		assert_eq!(words.remove("bib"), 1);
		assert_eq!(words.remove("bib"), 0);
		assert_eq!(words.alphabet(), ['b', 'o']);
		assert_eq!(words.len(), 1);
	}
}
