mod utils;

const COMPOUND_AFF: &str = "\
COMPOUNDFLAG Y
COMPOUNDMIN 1
ONLYINCOMPOUND c
";

const COMPOUND_DIC: &str = "\
3
foo/Y
bar/Y
s/Yc
";

#[test]
fn compound_flag() -> Result<(), Box<dyn std::error::Error>> {
	utils::test_dictionary_pair(
		"COMPOUNDFLAG A\n",
		"3\nfoo/A\nbar/A\nxy\n",
		&["foo", "foobar", "barfoo", "foobarfoo"],
		&["xyfoo", "foobarfoobar", "fooxy"],
		None,
	)
}

#[test]
fn compound_positions() -> Result<(), Box<dyn std::error::Error>> {
	utils::test_dictionary_pair(
		"\
COMPOUNDBEGIN B
COMPOUNDMIDDLE M
COMPOUNDLAST E
",
		"3\nfoo/B\nbar/M\nbaz/E\n",
		&["foobaz", "foobarbaz"],
		&["bazfoo", "barbaz", "foobar", "foobazbar"],
		None,
	)
}

#[test]
fn only_in_compound() -> Result<(), Box<dyn std::error::Error>> {
	utils::test_dictionary_pair(
		COMPOUND_AFF,
		COMPOUND_DIC,
		&["foo", "foos", "foosbar"],
		&["s", "S", "barx"],
		None,
	)
}

#[test]
fn compound_word_max() -> Result<(), Box<dyn std::error::Error>> {
	utils::test_dictionary_pair(
		"COMPOUNDFLAG A\nCOMPOUNDWORDMAX 2\n",
		"2\nfoo/A\nbar/A\n",
		&["foobar", "barfoo"],
		&["foobarfoo"],
		None,
	)
}

#[test]
fn compound_affixes() -> Result<(), Box<dyn std::error::Error>> {
	utils::test_dictionary_pair(
		"\
COMPOUNDFLAG A
CHECKCOMPOUNDDUP

PFX P Y 1
PFX P 0 re .

SFX S Y 1
SFX S 0 s .
",
		"2\nwork/APS\nplace/APS\n",
		&["workplace", "workplaces", "reworkplace", "placework"],
		&["worksplace", "workreplace", "workwork"],
		None,
	)
}
