//! Morphspell CLI
//!
//! Checks words against a dictionary pair, results go through the logger so
//! run with `RUST_LOG=info` to see them.

use clap::Parser;
use morphspell::Dictionary;
use std::{
	io::{stdin, stdout, Write},
	path::PathBuf,
};

#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
	/// Dictionary pair without extension, like `/usr/share/hunspell/en_US`
	#[arg(long, env = "HUNSPELL_DICT")]
	dict: PathBuf,

	/// Words to check
	words: Vec<String>,

	/// Read words from standard input until it closes
	#[arg(long, short)]
	interactive: bool,

	/// Also suggest corrections for misspelled words
	#[arg(long, short)]
	suggest: bool,

	/// Also print the stems of correct words
	#[arg(long)]
	stem: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	pretty_env_logger::init();

	let args = Args::parse();

	let dict = Dictionary::from_pair(&args.dict)?;
	for line in dict.malformed_lines() {
		log::debug!("skipped dictionary {line}");
	}

	for word in &args.words {
		check_and_print(&dict, &args, word);
	}

	if args.interactive {
		loop {
			print!("lookup word(s) ❯ ");
			stdout().flush()?;

			let mut input = String::new();
			if stdin().read_line(&mut input)? == 0 {
				break;
			}

			for word in input.split_whitespace() {
				check_and_print(&dict, &args, word);
			}
		}
	} else if args.words.is_empty() {
		return Err("no action provided, give words or use `--interactive`".into());
	}

	Ok(())
}

fn check_and_print(dict: &Dictionary, args: &Args, word: &str) {
	if dict.check(word) {
		log::info!("Word `{word}` was found in the dictionary");

		if args.stem {
			log::info!("Stems of `{word}`: {}", dict.stem(word).join(", "));
		}
	} else {
		log::warn!("Word `{word}` wasn't found in the dictionary");

		if args.suggest {
			let suggestions = dict.suggest(word);
			if suggestions.is_empty() {
				log::info!("No suggestion for `{word}`");
			} else {
				let words = suggestions.words().collect::<Vec<_>>();
				log::info!("Suggestions for `{word}`: {}", words.join(", "));
			}
		}
	}
}
