//! Character encodings declared by the `SET` directive
//!
//! Dictionaries are distributed in legacy charsets, the encoding is read out of
//! the raw `.aff` bytes before anything else so both files can be decoded.

use std::{borrow::Cow, fmt, slice, str::FromStr};

/// Fallback when an affix file declares no `SET`
pub const DEFAULT_ENCODING: Encoding = Encoding::Iso8859(1);

/// Byte order mark sometimes found at the start of UTF-8 files
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Ways converting between bytes and text could go wrong
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
	/// The `SET` value names no encoding we know of
	#[error("unknown encoding `{0}`")]
	Unknown(String),

	/// Known encoding but no codec for it
	#[error("encoding {0} is recognized but cannot be converted")]
	Unsupported(Encoding),

	/// Bytes are not valid for the declared encoding
	#[error("invalid {encoding} byte sequence at offset {offset}")]
	InvalidBytes {
		/// Declared encoding
		encoding: Encoding,
		/// Offset of the first bad byte
		offset: usize,
	},

	/// Text holds a character the declared encoding has no byte for
	#[error("character `{character}` cannot be represented in {encoding}")]
	Unrepresentable {
		/// Declared encoding
		encoding: Encoding,
		/// Offending character
		character: char,
	},
}

/// Encodings a dictionary may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
	/// `UTF-8`
	Utf8,
	/// `ISO8859-n`, can be 1-10, 13-16
	Iso8859(u8),
	/// `KOI8-R`
	Koi8R,
	/// `KOI8-U`
	Koi8U,
	/// `microsoft-cp1251`
	Cp1251,
	/// `ISCII-DEVANAGARI`
	IsciiDevanagari,
}

impl Default for Encoding {
	fn default() -> Self {
		DEFAULT_ENCODING
	}
}

impl FromStr for Encoding {
	type Err = EncodingError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s
			.trim()
			.chars()
			.filter(|c| !matches!(c, '-' | '_'))
			.collect::<String>()
			.to_ascii_uppercase();

		let encoding = match normalized.as_str() {
			"UTF8" => Self::Utf8,
			"KOI8R" => Self::Koi8R,
			"KOI8U" => Self::Koi8U,
			"CP1251" | "MICROSOFTCP1251" => Self::Cp1251,
			"ISCIIDEVANAGARI" => Self::IsciiDevanagari,
			other => other
				.strip_prefix("ISO8859")
				.and_then(|part| part.parse::<u8>().ok())
				.filter(|part| matches!(part, 1..=10 | 13..=16))
				.map(Self::Iso8859)
				.ok_or_else(|| EncodingError::Unknown(s.trim().to_owned()))?,
		};

		Ok(encoding)
	}
}

impl fmt::Display for Encoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Utf8 => write!(f, "UTF-8"),
			Self::Iso8859(part) => write!(f, "ISO8859-{part}"),
			Self::Koi8R => write!(f, "KOI8-R"),
			Self::Koi8U => write!(f, "KOI8-U"),
			Self::Cp1251 => write!(f, "microsoft-cp1251"),
			Self::IsciiDevanagari => write!(f, "ISCII-DEVANAGARI"),
		}
	}
}

/// Codec of every encoding but UTF-8 and Latin-1
fn codec(encoding: Encoding) -> Option<&'static encoding_rs::Encoding> {
	let codec = match encoding {
		Encoding::Iso8859(2) => encoding_rs::ISO_8859_2,
		Encoding::Iso8859(3) => encoding_rs::ISO_8859_3,
		Encoding::Iso8859(4) => encoding_rs::ISO_8859_4,
		Encoding::Iso8859(5) => encoding_rs::ISO_8859_5,
		Encoding::Iso8859(6) => encoding_rs::ISO_8859_6,
		Encoding::Iso8859(7) => encoding_rs::ISO_8859_7,
		Encoding::Iso8859(8) => encoding_rs::ISO_8859_8,
		// Only known as its Windows superset
		Encoding::Iso8859(9) => encoding_rs::WINDOWS_1254,
		Encoding::Iso8859(10) => encoding_rs::ISO_8859_10,
		Encoding::Iso8859(13) => encoding_rs::ISO_8859_13,
		Encoding::Iso8859(14) => encoding_rs::ISO_8859_14,
		Encoding::Iso8859(15) => encoding_rs::ISO_8859_15,
		Encoding::Iso8859(16) => encoding_rs::ISO_8859_16,
		Encoding::Koi8R => encoding_rs::KOI8_R,
		Encoding::Koi8U => encoding_rs::KOI8_U,
		Encoding::Cp1251 => encoding_rs::WINDOWS_1251,
		Encoding::Utf8 | Encoding::Iso8859(_) | Encoding::IsciiDevanagari => return None,
	};
	Some(codec)
}

/// Look for the declared encoding in raw affix file bytes
///
/// # Errors
///
/// Fails when the `SET` value is not a known encoding name.
pub fn sniff(bytes: &[u8]) -> Result<Encoding, EncodingError> {
	if bytes.starts_with(UTF8_BOM) {
		return Ok(Encoding::Utf8);
	}

	for line in bytes.split(|b| *b == b'\n') {
		let line = line.trim_ascii();
		let Some(value) = line.strip_prefix(b"SET") else {
			continue;
		};
		if !value.first().is_some_and(u8::is_ascii_whitespace) {
			continue;
		}

		return String::from_utf8_lossy(value.trim_ascii()).parse();
	}

	Ok(DEFAULT_ENCODING)
}

/// Decode dictionary bytes into text
///
/// # Errors
///
/// Fails on byte sequences that are invalid for `encoding` or when there is no
/// codec for it.
pub fn decode(bytes: &[u8], encoding: Encoding) -> Result<String, EncodingError> {
	let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

	match encoding {
		Encoding::Utf8 => std::str::from_utf8(bytes)
			.map(ToOwned::to_owned)
			.map_err(|err| EncodingError::InvalidBytes {
				encoding,
				offset: err.valid_up_to(),
			}),
		// Every byte is its own code point
		Encoding::Iso8859(1) => Ok(bytes.iter().copied().map(char::from).collect()),
		other => {
			let codec = codec(other).ok_or(EncodingError::Unsupported(other))?;
			codec
				.decode_without_bom_handling_and_without_replacement(bytes)
				.map(Cow::into_owned)
				.ok_or_else(|| EncodingError::InvalidBytes {
					encoding,
					// Every codec here is single byte
					offset: bytes
						.iter()
						.position(|byte| {
							codec
								.decode_without_bom_handling_and_without_replacement(slice::from_ref(byte))
								.is_none()
						})
						.unwrap_or_default(),
				})
		}
	}
}

/// Encode text back into the dictionary encoding
///
/// # Errors
///
/// Fails when a character has no representation in `encoding` or when there
/// is no codec for it.
pub fn encode(text: &str, encoding: Encoding) -> Result<Cow<'_, [u8]>, EncodingError> {
	match encoding {
		Encoding::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
		Encoding::Iso8859(1) => text
			.chars()
			.map(|character| {
				u8::try_from(u32::from(character)).map_err(|_| EncodingError::Unrepresentable {
					encoding,
					character,
				})
			})
			.collect::<Result<Vec<_>, _>>()
			.map(Cow::Owned),
		other => {
			let codec = codec(other).ok_or(EncodingError::Unsupported(other))?;
			let (bytes, _, had_errors) = codec.encode(text);
			if had_errors {
				let character = text
					.chars()
					.find(|c| codec.encode(c.encode_utf8(&mut [0; 4])).2)
					.unwrap_or_default();
				return Err(EncodingError::Unrepresentable {
					encoding,
					character,
				});
			}
			Ok(bytes)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_encoding_names_loosely() {
		assert_eq!("UTF-8".parse(), Ok(Encoding::Utf8));
		assert_eq!("utf8".parse(), Ok(Encoding::Utf8));
		assert_eq!("ISO8859-15".parse(), Ok(Encoding::Iso8859(15)));
		assert_eq!("ISO-8859-2".parse(), Ok(Encoding::Iso8859(2)));
		assert_eq!("microsoft-cp1251".parse(), Ok(Encoding::Cp1251));
		assert!("ISO8859-12".parse::<Encoding>().is_err());
		assert!("EBCDIC".parse::<Encoding>().is_err());
	}

	#[test]
	fn sniffs_set_directive() {
		let aff = b"# comment\nTRY abc\nSET ISO8859-15\nSFX A Y 1\n";
		assert_eq!(sniff(aff), Ok(Encoding::Iso8859(15)));

		assert_eq!(sniff(b"TRY abc\n"), Ok(DEFAULT_ENCODING));
		assert_eq!(sniff(b"\xEF\xBB\xBFTRY abc\n"), Ok(Encoding::Utf8));
		// `SETTINGS` is not `SET`
		assert_eq!(sniff(b"SETTINGS x\n"), Ok(DEFAULT_ENCODING));
	}

	#[test]
	fn decodes_latin_charsets() -> Result<(), EncodingError> {
		assert_eq!(decode(b"caf\xE9", Encoding::Iso8859(1))?, "café");
		assert_eq!(decode(b"\xA4", Encoding::Iso8859(1))?, "¤");
		assert_eq!(decode(b"\xA4", Encoding::Iso8859(15))?, "€");
		assert_eq!(decode(b"\xA3\xF3d\xBC", Encoding::Iso8859(2))?, "Łódź");
		Ok(())
	}

	#[test]
	fn decodes_cyrillic_charsets() -> Result<(), EncodingError> {
		assert_eq!(decode(b"\xCD\xC9\xD2", Encoding::Koi8R)?, "мир");
		assert_eq!(decode(b"\xEC\xE8\xF0", Encoding::Cp1251)?, "мир");
		assert_eq!(&*encode("мир", Encoding::Koi8R)?, b"\xCD\xC9\xD2");
		assert_eq!(
			encode("мир€", Encoding::Koi8R),
			Err(EncodingError::Unrepresentable {
				encoding: Encoding::Koi8R,
				character: '€'
			})
		);
		Ok(())
	}

	#[test]
	fn rejects_invalid_utf8() {
		let err = decode(b"ab\xFFcd", Encoding::Utf8).unwrap_err();
		assert_eq!(
			err,
			EncodingError::InvalidBytes {
				encoding: Encoding::Utf8,
				offset: 2
			}
		);
	}

	#[test]
	fn encodes_back_to_latin_charsets() -> Result<(), EncodingError> {
		assert_eq!(&*encode("café", Encoding::Iso8859(1))?, b"caf\xE9");
		assert_eq!(&*encode("€", Encoding::Iso8859(15))?, b"\xA4");
		assert!(encode("€", Encoding::Iso8859(1)).is_err());
		assert!(encode("¤", Encoding::Iso8859(15)).is_err());
		Ok(())
	}

	#[test]
	fn unsupported_codecs_are_reported() {
		assert_eq!(
			decode(b"abc", Encoding::IsciiDevanagari),
			Err(EncodingError::Unsupported(Encoding::IsciiDevanagari))
		);
		assert!(encode("abc", Encoding::IsciiDevanagari).is_err());
	}
}
