use morphspell::Dictionary;

mod utils;

#[test]
fn long_flag_vectors() -> Result<(), Box<dyn std::error::Error>> {
	utils::test_dictionary_pair(
		"\
FLAG long

# 1 -> Aa Bb
# 2 -> Aa
AF 2
AF AaBb
AF Aa

SFX Aa Y 1
SFX Aa 0 s .

SFX Bb Y 1
SFX Bb 0 ed/2 .
",
		"\
2
walk/1
jump/2
",
		&["walk", "walks", "walked", "walkeds", "jump", "jumps"],
		&["jumped", "walking", "walkss"],
		None,
	)
}

#[test]
fn numeric_flag_vectors() -> Result<(), Box<dyn std::error::Error>> {
	utils::test_dictionary_pair(
		"\
FLAG num
AF 1
AF 101,102

SFX 101 Y 1
SFX 101 0 s .

SFX 102 Y 1
SFX 102 0 ing .
",
		"\
2
walk/1
sing
",
		&["walk", "walks", "walking", "sing"],
		&["sings", "singing"],
		None,
	)
}

#[test]
fn morphological_aliases() -> Result<(), Box<dyn std::error::Error>> {
	utils::init_logger();

	let dict = Dictionary::from_slice(
		"\
AF 1
AF A

AM 2
AM po:verb
AM is:present

SFX A Y 1
SFX A 0 s . 2
",
		"\
3
walk/1	1
talk/1 po:verb st:talk
run/9
",
	)?;

	assert!(dict.check("walks"));
	assert!(dict.check("talks"));
	assert_eq!(dict.stem("walks"), ["walk"]);

	// `9` names no alias
	assert!(!dict.check("run"));
	assert_eq!(dict.malformed_lines().len(), 1);
	assert_eq!(dict.malformed_lines()[0].line, 4);

	Ok(())
}
