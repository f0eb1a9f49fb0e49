//! Behaviour every dictionary should have, whatever its content

mod utils;

use morphspell::Dictionary;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const AFF: &str = "\
SFX A Y 1
SFX A 0 ing [^ing]

SFX S Y 2
SFX S 0 s [^s]
SFX S 0 es s
";

const DIC: &str = "\
5
walk/AS
talk/AS
bus/S
cat/S
kiss/S
";

#[test]
fn every_loaded_word_checks() -> TestResult {
	utils::init_logger();
	let dict = Dictionary::from_slice(AFF, DIC)?;

	for line in DIC.lines().skip(1) {
		let word = line.split('/').next().unwrap_or_default();
		assert!(dict.check(word), "{word} should check");
	}

	Ok(())
}

#[test]
fn underivable_words_fail() -> TestResult {
	utils::init_logger();
	let dict = Dictionary::from_slice(AFF, DIC)?;

	for word in ["walked", "cating", "buss", "kisss", "wal", "xyz"] {
		assert!(!dict.check(word), "{word} should not check");
	}

	Ok(())
}

#[test]
fn affixed_forms_check() -> TestResult {
	utils::init_logger();
	let dict = Dictionary::from_slice(AFF, DIC)?;

	for word in ["walk", "walking", "walks", "buses", "kisses", "cats"] {
		assert!(dict.check(word), "{word} should check");
	}

	Ok(())
}

#[test]
fn add_then_remove() -> TestResult {
	utils::init_logger();
	let mut dict = Dictionary::from_slice(AFF, DIC)?;

	assert!(!dict.check("blorf"));
	dict.add("blorf");
	assert!(dict.check("blorf"));
	dict.remove("blorf");
	assert!(!dict.check("blorf"));

	// Removing loaded words works too
	dict.remove("cat");
	assert!(!dict.check("cat"));
	assert!(!dict.check("cats"));

	Ok(())
}

#[test]
fn valid_word_is_its_own_best_suggestion() -> TestResult {
	utils::init_logger();
	let dict = Dictionary::from_slice(AFF, DIC)?;

	for word in ["walk", "talking", "buses"] {
		let suggestions = dict.suggest(word);
		let first = suggestions.iter().next();
		assert_eq!(first.map(|s| s.word()), Some(word));
		assert_eq!(first.map(morphspell::Suggestion::cost), Some(0));
	}

	Ok(())
}

#[test]
fn suggestions_are_ranked() -> TestResult {
	utils::init_logger();
	let dict = Dictionary::from_slice(AFF, DIC)?;

	let suggestions = dict.suggest("walkz");
	let costs = suggestions.iter().map(morphspell::Suggestion::cost).collect::<Vec<_>>();

	assert!(!costs.is_empty());
	assert!(costs.windows(2).all(|pair| pair[0] <= pair[1]));
	assert!(suggestions.words().any(|word| word == "walks"));

	// Nothing close enough is not an error
	assert!(dict.suggest("qqqqqqqqqqqq").is_empty());

	Ok(())
}

#[test]
fn one_malformed_line_among_a_hundred() -> TestResult {
	utils::init_logger();

	let mut dic = String::from("100\n");
	for index in 0..100 {
		if index == 42 {
			dic.push_str("broken/AAA\n");
		} else {
			dic.push_str(&format!("word{index}/AA\n"));
		}
	}

	let dict = Dictionary::from_slice("FLAG long\nSFX AA Y 1\nSFX AA 0 s .\n", &dic)?;

	assert_eq!(dict.len(), 99);
	assert_eq!(dict.malformed_lines().len(), 1);
	assert!(dict.check("word41s"));
	assert!(!dict.check("broken"));

	Ok(())
}
