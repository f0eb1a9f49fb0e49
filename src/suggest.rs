//! Logic of the [`Dictionary`] to suggests words
//!
//! Candidates come from cheap hints first (casing, `REP`, `MAP`, keyboard
//! neighbours), then from plain edits of the word. Every candidate is checked
//! against the dictionary and ranked by a weighted edit distance.

use crate::{
	lookup::{titlecase, Casing, Mode},
	Dictionary,
};
use std::{
	borrow::Cow,
	collections::{HashMap, HashSet},
	fmt, slice, vec,
};

/// Never return more than that
pub(crate) const MAX_SUGGESTIONS: usize = 15;

/// Under this count, edits of edits are also tried
const MIN_CANDIDATES: usize = 3;

/// Edits of edits grow too fast for longer words
const MAX_DISTANCE_TWO_LENGTH: usize = 24;

/// Candidates validated for a single word, distance 2 stops once it is reached
const MAX_CANDIDATES_TRIED: usize = 30_000;

/// Cost of an insertion, a deletion, a transposition or an unrelated substitution
const EDIT_COST: usize = 2;

/// Cost of a substitution between related characters
const RELATED_COST: usize = 1;

/// A correction for a misspelled word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
	word: String,
	cost: usize,
}

impl Suggestion {
	/// Suggested spelling
	#[must_use]
	pub fn word(&self) -> &str {
		&self.word
	}

	/// Lower is closer, `0` is the word itself
	#[must_use]
	pub const fn cost(&self) -> usize {
		self.cost
	}
}

impl fmt::Display for Suggestion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.word)
	}
}

/// Ranked corrections, best first
///
/// Iterating does not consume it, [`Suggestions::iter`] can be called again to
/// walk the sequence from the start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
	inner: Vec<Suggestion>,
}

impl Suggestions {
	/// Walk the suggestions from the best one
	pub fn iter(&self) -> slice::Iter<'_, Suggestion> {
		self.inner.iter()
	}

	/// Suggested spellings, best first
	pub fn words(&self) -> impl Iterator<Item = &str> {
		self.inner.iter().map(Suggestion::word)
	}

	/// Number of suggestions
	#[must_use]
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Whether nothing close enough was found
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl IntoIterator for Suggestions {
	type Item = Suggestion;
	type IntoIter = vec::IntoIter<Suggestion>;

	fn into_iter(self) -> Self::IntoIter {
		self.inner.into_iter()
	}
}

impl<'a> IntoIterator for &'a Suggestions {
	type Item = &'a Suggestion;
	type IntoIter = slice::Iter<'a, Suggestion>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Methods for suggesting words based on the dictionary
impl Dictionary {
	/// Corrections for `word`, a correct word comes first with a cost of `0`
	///
	/// Finding nothing is not an error, the sequence is then empty.
	#[must_use]
	pub fn suggest(&self, word: &str) -> Suggestions {
		let Some(word) = self.normalize(word) else {
			return Suggestions::default();
		};

		let suggestions = self.collect(&word).finish();
		log::debug!(
			"found {} suggestions for `{word}`: {:?}",
			suggestions.len(),
			suggestions.words().collect::<Vec<_>>()
		);
		suggestions
	}
}

impl Dictionary {
	/// Run every pass on an already normalized word
	fn collect(&self, word: &str) -> Collector<'_> {
		let mut collector = Collector::new(self, word);

		if self.is_correct(word, Mode::Check) {
			collector.found.insert(word.to_owned(), 0);
		}

		// Edits of edits only run once, on the lowercase form of cased words
		let casing = Casing::guess(word);
		if matches!(casing, Casing::Init | Casing::All) {
			collector.search(word, None, false);
			collector.search(&word.to_lowercase(), Some(casing), true);
		} else {
			collector.search(word, None, true);
		}

		collector
	}
}

/// Keeps track of tried candidates and of the valid ones with their cost
struct Collector<'d> {
	dict: &'d Dictionary,
	word: String,
	chars: Vec<char>,
	alphabet: Vec<char>,

	/// Candidate and whether it was recased, to the word it was accepted as
	tried: HashMap<(String, bool), Option<String>>,
	/// Candidates checked against the dictionary so far
	validated: usize,
	found: HashMap<String, usize>,
}

impl<'d> Collector<'d> {
	fn new(dict: &'d Dictionary, word: &str) -> Self {
		let options = &dict.aff.options;
		let alphabet = if options.try_chars.is_empty() {
			dict.dic.alphabet()
		} else {
			options.try_chars.clone()
		};

		Self {
			dict,
			word: word.to_owned(),
			chars: word.chars().collect(),
			alphabet,
			tried: HashMap::new(),
			validated: 0,
			found: HashMap::new(),
		}
	}

	/// Run every pass on `target`, results get `recase` back
	///
	/// `deep` allows edits of edits when few candidates were found.
	fn search(&mut self, target: &str, recase: Option<Casing>, deep: bool) {
		let dict = self.dict;
		let options = &dict.aff.options;

		// Uppercase letters only help words that already have some
		let lowercase_alphabet = self
			.alphabet
			.iter()
			.copied()
			.filter(|c| !c.is_uppercase())
			.collect::<Vec<_>>();
		let alphabet = if target.chars().any(char::is_uppercase) {
			self.alphabet.clone()
		} else {
			lowercase_alphabet.clone()
		};

		for candidate in [
			target.to_uppercase(),
			target.to_lowercase(),
			titlecase(target),
		] {
			self.offer(candidate, Some(RELATED_COST), recase);
		}

		for candidate in replacements(target, options) {
			self.offer(candidate, Some(RELATED_COST), recase);
		}
		for candidate in mapped(target, &options.maps) {
			self.offer(candidate, Some(RELATED_COST), recase);
		}
		for candidate in keyboard_neighbours(target, &options.key) {
			self.offer(candidate, None, recase);
		}
		for candidate in single_uppercase(target) {
			self.offer(candidate, None, recase);
		}

		let mut edits = edits(target, &alphabet);
		for candidate in &edits {
			self.offer(candidate.clone(), None, recase);
		}

		if !options.no_split_suggestions {
			for (index, _) in target.char_indices().skip(1) {
				let (head, tail) = target.split_at(index);
				self.offer(format!("{head} {tail}"), Some(EDIT_COST), recase);
			}
		}

		log::trace!(
			"{} candidates after one edit of `{target}`",
			self.found.len()
		);

		if deep && self.found.len() < MIN_CANDIDATES && self.chars.len() <= MAX_DISTANCE_TWO_LENGTH {
			let mut seen = HashSet::new();
			edits.retain(|edit| seen.insert(edit.clone()));

			for first in &edits {
				if self.validated >= MAX_CANDIDATES_TRIED {
					log::debug!("stopped edits of edits of `{target}` after {} candidates", self.validated);
					break;
				}

				for candidate in self::edits(first, &lowercase_alphabet) {
					if candidate != target {
						self.offer(candidate, None, recase);
					}
				}
			}

			log::trace!(
				"{} candidates after two edits of `{target}`",
				self.found.len()
			);
		}
	}

	/// Validate `candidate` and record it with its cost
	fn offer(&mut self, candidate: String, hint: Option<usize>, recase: Option<Casing>) {
		if candidate.is_empty() {
			return;
		}

		let key = (candidate, recase.is_some());
		let accepted = match self.tried.get(&key) {
			Some(accepted) => accepted.clone(),
			None if self.validated >= MAX_CANDIDATES_TRIED => return,
			None => {
				self.validated += 1;
				let accepted = self.accept(&key.0, recase);
				self.tried.insert(key, accepted.clone());
				accepted
			}
		};

		let Some(word) = accepted else {
			return;
		};

		let distance = self.distance(&word);
		let cost = hint.map_or(distance, |hint| distance.min(hint));
		self.found
			.entry(word)
			.and_modify(|previous| *previous = (*previous).min(cost))
			.or_insert(cost);
	}

	/// The spelling under which `candidate` is a valid suggestion
	fn accept(&self, candidate: &str, recase: Option<Casing>) -> Option<String> {
		let is_valid = |word: &str| {
			word.split(' ')
				.all(|part| !part.is_empty() && self.dict.is_correct(part, Mode::Suggest))
		};

		if let Some(casing) = recase {
			let recased = casing.apply(candidate);
			if is_valid(&recased) {
				return Some(recased);
			}
		}

		is_valid(candidate).then(|| candidate.to_owned())
	}

	/// Weighted optimal string alignment distance from the searched word
	fn distance(&self, candidate: &str) -> usize {
		let from = &self.chars;
		let to = candidate.chars().collect::<Vec<_>>();

		let mut rows = vec![vec![0; to.len() + 1]; from.len() + 1];
		for (i, row) in rows.iter_mut().enumerate() {
			row[0] = i * EDIT_COST;
		}
		for (j, cell) in rows[0].iter_mut().enumerate() {
			*cell = j * EDIT_COST;
		}

		for i in 1..=from.len() {
			for j in 1..=to.len() {
				let substitution = rows[i - 1][j - 1] + self.substitution_cost(from[i - 1], to[j - 1]);
				let mut best = substitution
					.min(rows[i - 1][j] + EDIT_COST)
					.min(rows[i][j - 1] + EDIT_COST);

				if i > 1 && j > 1 && from[i - 1] == to[j - 2] && from[i - 2] == to[j - 1] {
					best = best.min(rows[i - 2][j - 2] + EDIT_COST);
				}

				rows[i][j] = best;
			}
		}

		rows[from.len()][to.len()]
	}

	fn substitution_cost(&self, a: char, b: char) -> usize {
		if a == b {
			return 0;
		}

		let options = &self.dict.aff.options;
		let (lower_a, lower_b) = (lowercase(a), lowercase(b));

		let case_only = lower_a == lower_b;
		let adjacent = options.key.iter().any(|row| {
			row.windows(2)
				.any(|pair| pair == [lower_a, lower_b] || pair == [lower_b, lower_a])
		});
		let (a, b) = (a.to_string(), b.to_string());
		let related = options
			.maps
			.iter()
			.any(|group| group.contains(&a) && group.contains(&b));

		if case_only || adjacent || related {
			RELATED_COST
		} else {
			EDIT_COST
		}
	}

	fn finish(self) -> Suggestions {
		let mut inner = self
			.found
			.into_iter()
			.map(|(word, cost)| Suggestion { word, cost })
			.collect::<Vec<_>>();

		inner.sort_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.word.cmp(&b.word)));
		inner.truncate(MAX_SUGGESTIONS);

		let conversion = &self.dict.aff.options.output_conversion;
		for suggestion in &mut inner {
			if let Cow::Owned(converted) = conversion.convert(&suggestion.word) {
				suggestion.word = converted;
			}
		}

		log::trace!("ranked suggestions for `{}`", self.word);
		Suggestions { inner }
	}
}

/// Lowercase form of a single character, kept as is when it expands
fn lowercase(c: char) -> char {
	let mut lower = c.to_lowercase();
	match (lower.next(), lower.next()) {
		(Some(lower), None) => lower,
		_ => c,
	}
}

/// Apply every matching `REP` entry once
fn replacements(word: &str, options: &crate::aff::Options) -> Vec<String> {
	let mut candidates = vec![];
	for rep in &options.replacements {
		for (index, _) in word.char_indices() {
			if rep.matches_at(word, index) {
				candidates.push(format!(
					"{}{}{}",
					&word[..index],
					rep.to,
					&word[index + rep.from.len()..]
				));
			}
		}
	}
	candidates
}

/// Swap characters for related ones of the same `MAP` group
fn mapped(word: &str, maps: &[Vec<String>]) -> Vec<String> {
	let mut candidates = vec![];
	for group in maps {
		for (index, _) in word.char_indices() {
			let rest = &word[index..];
			for member in group.iter().filter(|member| rest.starts_with(member.as_str())) {
				for other in group.iter().filter(|other| *other != member) {
					candidates.push(format!(
						"{}{other}{}",
						&word[..index],
						&rest[member.len()..]
					));
				}
			}
		}
	}
	candidates
}

/// Replace each character by its neighbours on the `KEY` rows
fn keyboard_neighbours(word: &str, key: &[Vec<char>]) -> Vec<String> {
	let chars = word.chars().collect::<Vec<_>>();
	let mut candidates = vec![];

	for (index, c) in chars.iter().enumerate() {
		let lower = lowercase(*c);
		for row in key {
			for (position, _) in row.iter().enumerate().filter(|(_, k)| **k == lower) {
				let neighbours = [
					position.checked_sub(1).and_then(|left| row.get(left)),
					row.get(position + 1),
				];
				for neighbour in neighbours.into_iter().flatten() {
					let neighbour = if c.is_uppercase() {
						neighbour.to_uppercase().next().unwrap_or(*neighbour)
					} else {
						*neighbour
					};

					let mut candidate = chars.clone();
					candidate[index] = neighbour;
					candidates.push(candidate.into_iter().collect());
				}
			}
		}
	}

	candidates
}

/// Uppercase one character at a time
fn single_uppercase(word: &str) -> Vec<String> {
	word.char_indices()
		.filter(|(_, c)| c.is_lowercase())
		.map(|(index, c)| {
			let rest = &word[index + c.len_utf8()..];
			format!("{}{}{rest}", &word[..index], c.to_uppercase())
		})
		.collect()
}

/// Deletions and adjacent transpositions, then substitutions, then insertions
fn edits(word: &str, alphabet: &[char]) -> Vec<String> {
	let chars = word.chars().collect::<Vec<_>>();
	let mut edits = vec![];

	for index in 0..chars.len() {
		edits.push(
			chars[..index]
				.iter()
				.chain(&chars[index + 1..])
				.collect(),
		);

		if index + 1 < chars.len() && chars[index] != chars[index + 1] {
			let mut swapped = chars.clone();
			swapped.swap(index, index + 1);
			edits.push(swapped.into_iter().collect());
		}
	}

	for index in 0..chars.len() {
		for c in alphabet.iter().filter(|c| **c != chars[index]) {
			let mut substituted = chars.clone();
			substituted[index] = *c;
			edits.push(substituted.into_iter().collect());
		}
	}

	for index in 0..=chars.len() {
		for c in alphabet {
			let mut inserted = chars.clone();
			inserted.insert(index, *c);
			edits.push(inserted.into_iter().collect());
		}
	}

	edits
}
