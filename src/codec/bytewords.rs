//! Bytewords text encoding
//!
//! Maps every byte to one of 256 four-letter words. The minimal style keeps
//! only the first and last letter of each word, which is what frames carry.
//! Every encoding ends with the big-endian CRC-32 of the body so a single
//! misread character is caught before the frame reaches the decoder.

use super::checksum;
use std::fmt;
use std::sync::OnceLock;

const WORDS: &str = "ableacidalsoapexaquaarchatomauntawayaxisbackbaldbarnbeltbetabias\
bluebodybragbrewbulbbuzzcalmcashcatschefcityclawcodecolacookcost\
cruxcurlcuspcyandarkdatadaysdelidicedietdoordowndrawdropdrumdull\
dutyeacheasyechoedgeepicevenexamexiteyesfactfairfernfigsfilmfish\
fizzflapflewfluxfoxyfreefrogfuelfundgalagamegeargemsgiftgirlglow\
goodgraygrimgurugushgyrohalfhanghardhawkheathelphighhillholyhope\
hornhutsicedideaidleinchinkyintoirisironitemjadejazzjoinjoltjowl\
judojugsjumpjunkjurykeepkenokeptkeyskickkilnkingkitekiwiknoblamb\
lavalazyleaflegsliarlimplionlistlogoloudloveluaulucklungmainmany\
mathmazememomenumeowmildmintmissmonknailnavyneednewsnextnoonnote\
numbobeyoboeomitonyxopenovalowlspaidpartpeckplaypluspoempoolpose\
puffpumapurrquadquizraceramprealredorichroadrockroofrubyruinruns\
rustsafesagascarsetssilkskewslotsoapsolosongstubsurfswantacotask\
taxitenttiedtimetinytoiltombtoystriptunatwinuglyundouniturgeuser\
vastveryvetovialvibeviewvisavoidvowswallwandwarmwaspwavewaxywebs\
whatwhenwhizwolfworkyankyawnyellyogayurtzapszerozestzinczonezoom";

const CHECKSUM_LEN: usize = 4;

/// Output style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Full words separated by spaces
    Standard,
    /// Full words separated by hyphens
    Uri,
    /// First and last letter of each word, no separator
    Minimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BytewordsError {
    /// Token is not one of the 256 words (or minimal pairs)
    InvalidWord(String),
    /// Minimal input has an odd number of letters
    InvalidLength(usize),
    /// Fewer than four bytes decoded, so no checksum is present
    MissingChecksum,
    /// Trailing checksum does not match the body
    ChecksumMismatch { expected: u32, actual: u32 },
}

impl fmt::Display for BytewordsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWord(word) => write!(f, "Invalid byteword: '{}'", word),
            Self::InvalidLength(len) => write!(f, "Invalid minimal bytewords length: {}", len),
            Self::MissingChecksum => write!(f, "Bytewords too short to hold a checksum"),
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "Bytewords checksum mismatch: expected {:08x}, got {:08x}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for BytewordsError {}

#[inline]
fn word(byte: u8) -> &'static str {
    let start = byte as usize * 4;
    &WORDS[start..start + 4]
}

/// Index table keyed by (first letter, last letter)
fn minimal_table() -> &'static [Option<u8>; 26 * 26] {
    static TABLE: OnceLock<[Option<u8>; 26 * 26]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [None; 26 * 26];
        for byte in 0..=u8::MAX {
            let w = word(byte).as_bytes();
            if let Some(i) = pair_index(w[0], w[3]) {
                table[i] = Some(byte);
            }
        }
        table
    })
}

#[inline]
fn pair_index(first: u8, last: u8) -> Option<usize> {
    let first = first.to_ascii_lowercase();
    let last = last.to_ascii_lowercase();
    if !first.is_ascii_lowercase() || !last.is_ascii_lowercase() {
        return None;
    }
    Some((first - b'a') as usize * 26 + (last - b'a') as usize)
}

fn lookup_pair(first: u8, last: u8) -> Option<u8> {
    pair_index(first, last).and_then(|i| minimal_table()[i])
}

fn lookup_word(token: &str) -> Option<u8> {
    let bytes = token.as_bytes();
    if bytes.len() != 4 {
        return None;
    }
    let byte = lookup_pair(bytes[0], bytes[3])?;
    word(byte).eq_ignore_ascii_case(token).then_some(byte)
}

/// Encode `data` (plus its checksum) in the given style
pub fn encode(data: &[u8], style: Style) -> String {
    let mut output = String::new();
    encode_into(data, style, &mut output);
    output
}

/// Encode into provided buffer
///
/// Appends to `output` without clearing it.
pub fn encode_into(data: &[u8], style: Style, output: &mut String) {
    let crc = checksum(data).to_be_bytes();
    let per_byte = match style {
        Style::Minimal => 2,
        Style::Standard | Style::Uri => 5,
    };
    output.reserve((data.len() + CHECKSUM_LEN) * per_byte);

    for (i, &byte) in data.iter().chain(crc.iter()).enumerate() {
        let w = word(byte);
        match style {
            Style::Minimal => {
                output.push_str(&w[..1]);
                output.push_str(&w[3..]);
            }
            Style::Standard | Style::Uri => {
                if i > 0 {
                    output.push(if style == Style::Uri { '-' } else { ' ' });
                }
                output.push_str(w);
            }
        }
    }
}

/// Decode bytewords in the given style, verifying and stripping the checksum
///
/// Case-insensitive.
pub fn decode(encoded: &str, style: Style) -> Result<Vec<u8>, BytewordsError> {
    let mut data = match style {
        Style::Minimal => decode_minimal(encoded)?,
        Style::Standard => decode_words(encoded, ' ')?,
        Style::Uri => decode_words(encoded, '-')?,
    };

    if data.len() < CHECKSUM_LEN {
        return Err(BytewordsError::MissingChecksum);
    }

    let body_len = data.len() - CHECKSUM_LEN;
    let mut trailer = [0u8; CHECKSUM_LEN];
    trailer.copy_from_slice(&data[body_len..]);
    data.truncate(body_len);

    let expected = u32::from_be_bytes(trailer);
    let actual = checksum(&data);
    if expected != actual {
        return Err(BytewordsError::ChecksumMismatch { expected, actual });
    }
    Ok(data)
}

fn decode_minimal(encoded: &str) -> Result<Vec<u8>, BytewordsError> {
    let bytes = encoded.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(BytewordsError::InvalidLength(bytes.len()));
    }

    bytes
        .chunks_exact(2)
        .map(|pair| {
            lookup_pair(pair[0], pair[1])
                .ok_or_else(|| BytewordsError::InvalidWord(String::from_utf8_lossy(pair).into()))
        })
        .collect()
}

fn decode_words(encoded: &str, separator: char) -> Result<Vec<u8>, BytewordsError> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }
    encoded
        .split(separator)
        .map(|token| lookup_word(token).ok_or_else(|| BytewordsError::InvalidWord(token.into())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SAMPLE: [u8; 5] = [0, 1, 2, 128, 255];

    #[test]
    fn word_list_is_unique_and_sorted() {
        let words: Vec<&str> = (0..=u8::MAX).map(word).collect();
        assert_eq!(words.len(), 256);
        assert!(words.windows(2).all(|w| w[0] < w[1]));

        let pairs: HashSet<(u8, u8)> = words
            .iter()
            .map(|w| (w.as_bytes()[0], w.as_bytes()[3]))
            .collect();
        assert_eq!(pairs.len(), 256);
    }

    #[test]
    fn encodes_known_vectors() {
        assert_eq!(encode(&SAMPLE, Style::Minimal), "aeadaolazmjendeoti");
        assert_eq!(
            encode(&SAMPLE, Style::Standard),
            "able acid also lava zoom jade need echo taxi"
        );
        assert_eq!(
            encode(&SAMPLE, Style::Uri),
            "able-acid-also-lava-zoom-jade-need-echo-taxi"
        );
    }

    #[test]
    fn empty_body_is_checksum_only() {
        assert_eq!(encode(&[], Style::Minimal), "aeaeaeae");
        assert_eq!(decode("aeaeaeae", Style::Minimal).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn decodes_every_style() {
        for style in [Style::Minimal, Style::Standard, Style::Uri] {
            let text = encode(&SAMPLE, style);
            assert_eq!(decode(&text, style).unwrap(), SAMPLE);
        }
    }

    #[test]
    fn decode_is_case_insensitive() {
        assert_eq!(
            decode("AEADAOLAZMJENDEOTI", Style::Minimal).unwrap(),
            SAMPLE
        );
        assert_eq!(
            decode("Able Acid Also Lava Zoom Jade Need Echo Taxi", Style::Standard).unwrap(),
            SAMPLE
        );
    }

    #[test]
    fn rejects_single_letter_change() {
        // "lazm" -> "lozm": valid pair, wrong checksum
        let err = decode("aeadaolozmjendeoti", Style::Minimal).unwrap_err();
        assert!(matches!(err, BytewordsError::ChecksumMismatch { .. }));
    }

    #[test]
    fn rejects_unknown_pair() {
        let err = decode("aeadaoqqzmjendeoti", Style::Minimal).unwrap_err();
        assert_eq!(err, BytewordsError::InvalidWord("qq".into()));
    }

    #[test]
    fn rejects_unknown_word() {
        let err = decode("able acid also lava zoom jade need echo tuxi", Style::Standard)
            .unwrap_err();
        assert_eq!(err, BytewordsError::InvalidWord("tuxi".into()));
    }

    #[test]
    fn rejects_odd_and_short_input() {
        assert_eq!(
            decode("aea", Style::Minimal).unwrap_err(),
            BytewordsError::InvalidLength(3)
        );
        assert_eq!(
            decode("aeae", Style::Minimal).unwrap_err(),
            BytewordsError::MissingChecksum
        );
    }

    #[test]
    fn encode_into_appends() {
        let mut out = String::from("ur:bytes/");
        encode_into(&[], Style::Minimal, &mut out);
        assert_eq!(out, "ur:bytes/aeaeaeae");
    }
}
