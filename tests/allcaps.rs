mod utils;

/// Mixed case words, and uppercase ones taking affixes, are also found in uppercase
#[test]
fn mixed_case_words() -> Result<(), Box<dyn std::error::Error>> {
	utils::test_dictionary_pair(
		"\
WORDCHARS '.

SFX S N 1
SFX S   0     's      .
",
		"\
2
OpenOffice.org
UNICEF/S
",
		&["OpenOffice.org", "OPENOFFICE.ORG", "UNICEF", "UNICEF's", "UNICEF'S"],
		&["Openoffice.org", "unicef's"],
		None,
	)
}

/// Forbidden words are case sensitive, uppercase input still reaches `iPod`
#[test]
fn forbidden_mixed_case() -> Result<(), Box<dyn std::error::Error>> {
	utils::test_dictionary_pair(
		"\
# forbidden all caps words are case sensitive
# iPod -> ipodos ('iPodic' in Hungarian)
FORBIDDENWORD *
SFX s N 1
SFX s 0 os .
",
		"\
3
iPod/s
iPodos/*
ipodos
",
		&["iPod", "IPOD", "ipodos", "IPODOS"],
		&["iPodos", "IPodos"],
		None,
	)
}

/// Capitalized and uppercase input falls back to lowercase stems unless they keep their case
#[test]
fn keep_case_words() -> Result<(), Box<dyn std::error::Error>> {
	utils::test_dictionary_pair(
		"\
KEEPCASE K

SFX S Y 1
SFX S 0 s .
",
		"\
3
NASA/K
hello/S
Paris/K
",
		&["hello", "Hello", "HELLO", "hellos", "HELLOS", "NASA", "Paris"],
		&["nasa", "Nasa", "PARIS", "paris"],
		None,
	)
}
