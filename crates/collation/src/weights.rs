//! Character level weights shared by every rule based collator.
//!
//! A character maps to one or more collation elements. Each element carries
//! a primary weight (base letter), a secondary weight (diacritic) and a
//! tertiary weight (case). All weights are at least 2 so that the level
//! separator stays the smallest value in a key.

/// Diacritic classes, in secondary weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Accent {
    None,
    Acute,
    Grave,
    Breve,
    Circumflex,
    Caron,
    Ring,
    Diaeresis,
    DoubleAcute,
    Tilde,
    Dot,
    Cedilla,
    Ogonek,
    Macron,
    Stroke,
}

impl Accent {
    fn weight(self) -> u32 {
        2 + self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Space = 1,
    Punctuation = 2,
    Digit = 3,
    Letter = 4,
}

const TERTIARY_LOWER: u32 = 2;
const TERTIARY_UPPER: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Element {
    pub primary: u32,
    pub secondary: u32,
    pub tertiary: u32,
}

/// How letters are mapped to primary weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LetterOrder {
    /// Case folded at primary level; case only breaks ties at tertiary level.
    CaseInsensitive,
    /// Case significant at primary level with upper and lower interleaved:
    /// `A < a < B < b`.
    CaseInterleaved,
}

fn weight(class: CharClass, value: u32) -> u32 {
    ((class as u32) << 24) | value
}

fn letter_weight(base: char, upper: bool, order: LetterOrder) -> u32 {
    let cp = base as u32;
    match order {
        LetterOrder::CaseInsensitive => weight(CharClass::Letter, cp),
        LetterOrder::CaseInterleaved => {
            weight(CharClass::Letter, cp * 2 + if upper { 0 } else { 1 })
        }
    }
}

/// Primary weight slotted directly after `z`, used by tailorings that
/// append letters to the Latin alphabet.
pub(crate) fn after_z(offset: u32, upper: bool, order: LetterOrder) -> u32 {
    let z = letter_weight('z', false, order);
    match order {
        LetterOrder::CaseInsensitive => z + offset,
        LetterOrder::CaseInterleaved => z + offset * 2 - u32::from(upper),
    }
}

fn to_lower(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}

/// Collation elements for a single base character. Returns nothing for
/// ignorable characters (controls, format characters).
pub(crate) fn base_element(ch: char, order: LetterOrder) -> Option<Element> {
    if ch.is_control() || is_format(ch) {
        return None;
    }

    let upper = ch.is_uppercase();
    let tertiary = if upper { TERTIARY_UPPER } else { TERTIARY_LOWER };

    if ch.is_whitespace() {
        return Some(Element {
            primary: weight(CharClass::Space, ch as u32),
            secondary: Accent::None.weight(),
            tertiary,
        });
    }

    if ch.is_numeric() {
        let value = ch.to_digit(10).map_or(ch as u32, |d| '0' as u32 + d);
        return Some(Element {
            primary: weight(CharClass::Digit, value),
            secondary: Accent::None.weight(),
            tertiary,
        });
    }

    if ch.is_alphabetic() {
        let (base, accent) = decompose(to_lower(ch));
        return Some(Element {
            primary: letter_weight(base, upper, order),
            secondary: accent.weight(),
            tertiary,
        });
    }

    Some(Element {
        primary: weight(CharClass::Punctuation, ch as u32),
        secondary: Accent::None.weight(),
        tertiary,
    })
}

/// Element for a letter whose primary weight was chosen by a tailoring.
pub(crate) fn tailored_element(primary: u32, accent: Accent, upper: bool) -> Element {
    Element {
        primary,
        secondary: accent.weight(),
        tertiary: if upper { TERTIARY_UPPER } else { TERTIARY_LOWER },
    }
}

/// Elements for a letter that expands to several base letters
/// (`ß` → `ss`, German `ä` → `ae`). The first element keeps the accent so
/// the expansion still sorts after its plain spelling at secondary level.
pub(crate) fn expansion(
    letters: &str,
    accent: Accent,
    upper: bool,
    order: LetterOrder,
) -> Vec<Element> {
    letters
        .chars()
        .enumerate()
        .map(|(i, base)| Element {
            primary: letter_weight(base, upper, order),
            secondary: if i == 0 { accent.weight() } else { Accent::None.weight() },
            tertiary: if upper { TERTIARY_UPPER } else { TERTIARY_LOWER },
        })
        .collect()
}

fn is_format(ch: char) -> bool {
    matches!(ch, '\u{00AD}' | '\u{200B}'..='\u{200F}' | '\u{2060}' | '\u{FEFF}')
}

/// Split a lowercase letter into its base letter and diacritic.
pub(crate) fn decompose(ch: char) -> (char, Accent) {
    use Accent::*;

    match ch {
        'à' => ('a', Grave),
        'á' => ('a', Acute),
        'â' => ('a', Circumflex),
        'ã' => ('a', Tilde),
        'ä' => ('a', Diaeresis),
        'å' => ('a', Ring),
        'ā' => ('a', Macron),
        'ă' => ('a', Breve),
        'ą' => ('a', Ogonek),
        'ç' => ('c', Cedilla),
        'ć' => ('c', Acute),
        'ĉ' => ('c', Circumflex),
        'ċ' => ('c', Dot),
        'č' => ('c', Caron),
        'ď' => ('d', Caron),
        'đ' => ('d', Stroke),
        'è' => ('e', Grave),
        'é' => ('e', Acute),
        'ê' => ('e', Circumflex),
        'ë' => ('e', Diaeresis),
        'ē' => ('e', Macron),
        'ĕ' => ('e', Breve),
        'ė' => ('e', Dot),
        'ę' => ('e', Ogonek),
        'ě' => ('e', Caron),
        'ĝ' => ('g', Circumflex),
        'ğ' => ('g', Breve),
        'ġ' => ('g', Dot),
        'ģ' => ('g', Cedilla),
        'ĥ' => ('h', Circumflex),
        'ħ' => ('h', Stroke),
        'ì' => ('i', Grave),
        'í' => ('i', Acute),
        'î' => ('i', Circumflex),
        'ï' => ('i', Diaeresis),
        'ĩ' => ('i', Tilde),
        'ī' => ('i', Macron),
        'ĭ' => ('i', Breve),
        'į' => ('i', Ogonek),
        'ĵ' => ('j', Circumflex),
        'ķ' => ('k', Cedilla),
        'ĺ' => ('l', Acute),
        'ļ' => ('l', Cedilla),
        'ľ' => ('l', Caron),
        'ŀ' => ('l', Dot),
        'ł' => ('l', Stroke),
        'ñ' => ('n', Tilde),
        'ń' => ('n', Acute),
        'ņ' => ('n', Cedilla),
        'ň' => ('n', Caron),
        'ò' => ('o', Grave),
        'ó' => ('o', Acute),
        'ô' => ('o', Circumflex),
        'õ' => ('o', Tilde),
        'ö' => ('o', Diaeresis),
        'ø' => ('o', Stroke),
        'ō' => ('o', Macron),
        'ŏ' => ('o', Breve),
        'ő' => ('o', DoubleAcute),
        'ŕ' => ('r', Acute),
        'ŗ' => ('r', Cedilla),
        'ř' => ('r', Caron),
        'ś' => ('s', Acute),
        'ŝ' => ('s', Circumflex),
        'ş' => ('s', Cedilla),
        'š' => ('s', Caron),
        'ţ' => ('t', Cedilla),
        'ť' => ('t', Caron),
        'ŧ' => ('t', Stroke),
        'ù' => ('u', Grave),
        'ú' => ('u', Acute),
        'û' => ('u', Circumflex),
        'ü' => ('u', Diaeresis),
        'ũ' => ('u', Tilde),
        'ū' => ('u', Macron),
        'ŭ' => ('u', Breve),
        'ů' => ('u', Ring),
        'ű' => ('u', DoubleAcute),
        'ų' => ('u', Ogonek),
        'ŵ' => ('w', Circumflex),
        'ý' => ('y', Acute),
        'ÿ' => ('y', Diaeresis),
        'ŷ' => ('y', Circumflex),
        'ź' => ('z', Acute),
        'ż' => ('z', Dot),
        'ž' => ('z', Caron),
        // Greek tonos and dialytika
        'ά' => ('α', Acute),
        'έ' => ('ε', Acute),
        'ή' => ('η', Acute),
        'ί' => ('ι', Acute),
        'ό' => ('ο', Acute),
        'ύ' => ('υ', Acute),
        'ώ' => ('ω', Acute),
        'ϊ' => ('ι', Diaeresis),
        'ϋ' => ('υ', Diaeresis),
        'ς' => ('σ', None),
        // Cyrillic
        'ё' => ('е', Diaeresis),
        'й' => ('и', Breve),
        _ => (ch, None),
    }
}
