use crate::{
    Collator,
    alphabet::{Alphabet, Script},
    key::{CollationKey, LEVEL_SEPARATOR},
    locale::Locale,
    weights::{self, Accent, Element, LetterOrder},
};
use tracing::debug;

/// Locale specific adjustments applied on top of the default letter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tailoring {
    letter_order: LetterOrder,
    backward_secondary: bool,
    umlaut_expansion: bool,
    nordic_letters: bool,
    script: Script,
}

impl Tailoring {
    pub fn for_locale(locale: &Locale) -> Self {
        let mut tailoring = Self {
            letter_order: LetterOrder::CaseInsensitive,
            backward_secondary: false,
            umlaut_expansion: false,
            nordic_letters: false,
            script: Script::Latin,
        };

        if locale.is_posix() {
            tailoring.letter_order = LetterOrder::CaseInterleaved;
            return tailoring;
        }

        match locale.language() {
            "fr" if locale.country() == Some("CA") => tailoring.backward_secondary = true,
            "de" => tailoring.umlaut_expansion = true,
            "sv" | "fi" => {
                tailoring.nordic_letters = true;
                tailoring.script = Script::Nordic;
            }
            "el" => tailoring.script = Script::Greek,
            "ru" | "uk" | "bg" | "sr" | "be" | "mk" => tailoring.script = Script::Cyrillic,
            "ja" | "ko" | "ar" | "he" | "th" | "hi" | "fa" => {
                tailoring.script = Script::Unbucketed
            }
            _ => {}
        }

        tailoring
    }

    pub fn script(&self) -> Script {
        self.script
    }

    pub fn is_case_significant(&self) -> bool {
        self.letter_order == LetterOrder::CaseInterleaved
    }

    pub fn has_backward_secondary(&self) -> bool {
        self.backward_secondary
    }
}

/// Multi-level collator driven by a [`Tailoring`].
///
/// Keys are laid out as `primary.. SEP secondary.. SEP tertiary..`, so plain
/// lexicographic comparison of keys gives the three level comparison.
#[derive(Debug, Clone)]
pub struct RuleCollator {
    locale: Locale,
    tailoring: Tailoring,
    alphabet: Alphabet,
}

impl RuleCollator {
    pub fn new(locale: Locale) -> Self {
        let tailoring = Tailoring::for_locale(&locale);
        let mut collator = Self {
            locale,
            tailoring,
            alphabet: Alphabet::new(Vec::new(), |_| CollationKey::underflow()),
        };

        let letters = tailoring.script().letters();
        collator.alphabet = Alphabet::new(letters, |label| collator.primary_key(label));

        debug!(
            locale = %collator.locale,
            labels = collator.alphabet.len(),
            backward_secondary = tailoring.backward_secondary,
            "built rule collator"
        );

        collator
    }

    pub fn tailoring(&self) -> &Tailoring {
        &self.tailoring
    }

    fn elements(&self, text: &str) -> Vec<Element> {
        let order = self.tailoring.letter_order;
        let mut out = Vec::with_capacity(text.len());

        for ch in text.chars() {
            let upper = ch.is_uppercase();
            let lower = ch.to_lowercase().next().unwrap_or(ch);

            match lower {
                'ß' => out.extend(weights::expansion("ss", Accent::None, upper, order)),
                'æ' => out.extend(weights::expansion("ae", Accent::None, upper, order)),
                'œ' => out.extend(weights::expansion("oe", Accent::None, upper, order)),
                'å' | 'ä' | 'ö' if self.tailoring.nordic_letters => {
                    let offset = match lower {
                        'å' => 1,
                        'ä' => 2,
                        _ => 3,
                    };
                    out.push(weights::tailored_element(
                        weights::after_z(offset, upper, order),
                        Accent::None,
                        upper,
                    ));
                }
                'ä' | 'ö' | 'ü' if self.tailoring.umlaut_expansion => {
                    let (base, accent) = weights::decompose(lower);
                    let mut spelled = String::with_capacity(2);
                    spelled.push(base);
                    spelled.push('e');
                    out.extend(weights::expansion(&spelled, accent, upper, order));
                }
                _ => out.extend(weights::base_element(ch, order)),
            }
        }

        out
    }

    /// Primary level only, no separators. Used for bucket start keys.
    fn primary_key(&self, text: &str) -> CollationKey {
        CollationKey::from_weights(self.elements(text).iter().map(|e| e.primary).collect())
    }
}

impl Collator for RuleCollator {
    fn locale(&self) -> &Locale {
        &self.locale
    }

    fn sort_key(&self, text: &str) -> CollationKey {
        let elements = self.elements(text);
        let mut key = Vec::with_capacity(elements.len() * 3 + 2);

        key.extend(elements.iter().map(|e| e.primary));
        key.push(LEVEL_SEPARATOR);

        if self.tailoring.backward_secondary {
            key.extend(elements.iter().rev().map(|e| e.secondary));
        } else {
            key.extend(elements.iter().map(|e| e.secondary));
        }
        key.push(LEVEL_SEPARATOR);

        key.extend(elements.iter().map(|e| e.tertiary));

        CollationKey::from_weights(key)
    }

    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    fn collator(locale: &str) -> RuleCollator {
        RuleCollator::new(Locale::parse(locale).unwrap())
    }

    fn sorted(locale: &str, words: &[&str]) -> Vec<String> {
        let c = collator(locale);
        let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        out.sort_by_key(|w| c.sort_key(w));
        out
    }

    #[test]
    fn posix_interleaves_case_at_primary_level() {
        assert_eq!(
            sorted("POSIX", &["bad", "Bat", "Bad", "Caron", "bat"]),
            vec!["Bad", "Bat", "bad", "bat", "Caron"]
        );
    }

    #[test]
    fn en_orders_case_after_accents() {
        assert_eq!(
            sorted("en_US.UTF-8", &["Bäd", "bad", "bäd", "Bad"]),
            vec!["bad", "Bad", "bäd", "Bäd"]
        );
    }

    #[test]
    fn french_canadian_reads_accents_backward() {
        let words = ["Côté", "Côte", "Coté", "Cote"];
        assert_eq!(sorted("en_US", &words), vec!["Cote", "Coté", "Côte", "Côté"]);
        assert_eq!(sorted("fr_CA", &words), vec!["Cote", "Côte", "Coté", "Côté"]);
    }

    #[test]
    fn german_expands_umlauts() {
        assert_eq!(
            sorted("de_DE", &["Muffler", "Müller"]),
            vec!["Müller", "Muffler"]
        );
        assert_eq!(
            sorted("en_US", &["Muffler", "Müller"]),
            vec!["Muffler", "Müller"]
        );
    }

    #[test]
    fn sharp_s_matches_double_s_at_primary() {
        let c = collator("en_US");
        let a = c.sort_key("Strasse");
        let b = c.sort_key("Straße");
        let primary_len = a.weights().iter().position(|w| *w == LEVEL_SEPARATOR).unwrap();
        assert_eq!(a.weights()[..primary_len], b.weights()[..primary_len]);
    }

    #[test]
    fn punctuation_sorts_before_letters() {
        assert_eq!(
            sorted("en_US", &["blackbird", "black-birds", "blackbirds", "black-bird"]),
            vec!["black-bird", "black-birds", "blackbird", "blackbirds"]
        );
    }

    #[test]
    fn empty_string_sorts_first() {
        let c = collator("en_US");
        assert_eq!(c.compare("", "a"), Ordering::Less);
        assert_eq!(c.compare("", " "), Ordering::Less);
        assert!(CollationKey::underflow() < c.sort_key(""));
    }

    #[test]
    fn swedish_places_extra_letters_after_z() {
        assert_eq!(
            sorted("sv_SE", &["Örn", "Zorn", "Ära", "Åsa"]),
            vec!["Zorn", "Åsa", "Ära", "Örn"]
        );
        let c = collator("sv_SE");
        assert_eq!(c.labels().len(), 30);
        assert_eq!(c.labels()[c.alphabetic_index("Örn")], "Ö");
    }

    #[test]
    fn latin_alphabet_has_underflow_and_letters() {
        let c = collator("en_US.UTF-8");
        let labels = c.labels();
        assert_eq!(labels.len(), 27);
        assert_eq!(labels[1], "A");
        assert_eq!(labels[3], "C");
        assert_eq!(labels[13], "M");
    }

    #[test]
    fn buckets_follow_first_letter() {
        for locale in ["POSIX", "en_US", "de_DE", "fr_CA"] {
            let c = collator(locale);
            assert_eq!(c.alphabetic_index(""), 0, "{locale}");
            assert_eq!(c.alphabetic_index("bad"), 2, "{locale}");
            assert_eq!(c.alphabetic_index("Bad"), 2, "{locale}");
            assert_eq!(c.alphabetic_index("Côté"), 3, "{locale}");
            assert_eq!(c.alphabetic_index("Müller"), 13, "{locale}");
            assert_eq!(c.alphabetic_index("42"), 0, "{locale}");
        }
    }

    #[test]
    fn greek_and_cyrillic_use_native_letters() {
        let el = collator("el_GR");
        assert_eq!(el.labels()[1], "Α");
        assert_eq!(el.labels()[el.alphabetic_index("Ωμέγα")], "Ω");
        let ru = collator("ru_RU");
        assert_eq!(ru.labels()[ru.alphabetic_index("Москва")], "М");
    }

    #[test]
    fn unbucketed_scripts_keep_only_underflow() {
        let ja = collator("ja_JP");
        assert!(ja.alphabet().is_degenerate());
        assert_eq!(ja.alphabetic_index("東京"), 0);
    }

    #[test]
    fn chinese_keeps_latin_labels() {
        let zh = collator("zh_CN");
        assert_eq!(zh.labels().len(), 27);
    }
}
