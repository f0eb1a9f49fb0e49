#![allow(dead_code)]

use morphspell::Dictionary;

#[derive(Debug, thiserror::Error)]
#[error("{0} word failed to be correctly spellchecked")]
struct SpellCheckErrors(usize);

pub(crate) fn init_logger() {
	// Several tests of the same binary may race for it
	let _ = pretty_env_logger::try_init();
}

pub(crate) fn test_dictionary_pair(
	aff: &str,
	dic: &str,
	good: &[&str],
	wrong: &[&str],
	suggestions: Option<&[Vec<&str>]>,
) -> Result<(), Box<dyn std::error::Error>> {
	init_logger();

	let dict = Dictionary::from_slice(aff, dic)?;

	let mut errors = 0;

	errors += good
		.iter()
		.filter(|w| {
			if dict.check(w) {
				log::info!("{w} is indeed fine");
				false
			} else {
				log::error!("{w} is supposed to be fine but is wrong");
				true
			}
		})
		.count();

	errors += wrong
		.iter()
		.filter(|w| {
			if dict.check(w) {
				log::error!("{w} is supposed to be wrong but is fine");
				true
			} else {
				log::info!("{w} is indeed wrong");
				false
			}
		})
		.count();

	if let Some(suggs) = suggestions {
		assert_eq!(suggs.len(), wrong.len());

		for (word, expected) in wrong.iter().zip(suggs) {
			let found = dict.suggest(word);
			let found = found.words().collect::<Vec<_>>();

			for sugg in expected {
				if found.contains(sugg) {
					log::info!("{sugg} is indeed suggested for {word}");
				} else {
					log::error!("{sugg} is supposed to be suggested for {word}, got {found:?}");
					errors += 1;
				}
			}
		}
	}

	if errors == 0 {
		Ok(())
	} else {
		Err(Box::new(SpellCheckErrors(errors)))
	}
}
