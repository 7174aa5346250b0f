//! Devanagari → Roman ASCII transliteration for handle generation.
//!
//! Small syllable-aware mapping: consonants carry an inherent "a" that is
//! suppressed by a matra, a virama, or a word boundary (Hindi schwa
//! deletion). Output is lowercase ASCII suitable for slugs and social
//! handles; anything unmapped is dropped.

/// True if the text contains any Devanagari code point (U+0900..U+097F).
pub fn has_devanagari(text: &str) -> bool {
    text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

fn consonant(c: char) -> Option<&'static str> {
    Some(match c {
        'क' => "k",
        'ख' => "kh",
        'ग' => "g",
        'घ' => "gh",
        'ङ' => "n",
        'च' => "ch",
        'छ' => "chh",
        'ज' => "j",
        'झ' => "jh",
        'ञ' => "n",
        'ट' => "t",
        'ठ' => "th",
        'ड' => "d",
        'ढ' => "dh",
        'ण' => "n",
        'त' => "t",
        'थ' => "th",
        'द' => "d",
        'ध' => "dh",
        'न' => "n",
        'प' => "p",
        'फ' => "ph",
        'ब' => "b",
        'भ' => "bh",
        'म' => "m",
        'य' => "y",
        'र' => "r",
        'ल' => "l",
        'ळ' => "l",
        'व' => "v",
        'श' => "sh",
        'ष' => "sh",
        'स' => "s",
        'ह' => "h",
        // Precomposed nukta forms
        '\u{0958}' => "q",  // क़
        '\u{0959}' => "kh", // ख़
        '\u{095A}' => "g",  // ग़
        '\u{095B}' => "z",  // ज़
        '\u{095C}' => "r",  // ड़ (retroflex flap)
        '\u{095D}' => "rh", // ढ़
        '\u{095E}' => "f",  // फ़
        '\u{095F}' => "y",  // य़
        _ => return None,
    })
}

fn independent_vowel(c: char) -> Option<&'static str> {
    Some(match c {
        'अ' => "a",
        'आ' => "a",
        'इ' => "i",
        'ई' => "i",
        'उ' => "u",
        'ऊ' => "u",
        'ऋ' => "ri",
        'ए' => "e",
        'ऐ' => "ai",
        'ओ' => "o",
        'औ' => "au",
        'ऑ' => "o",
        _ => return None,
    })
}

fn matra(c: char) -> Option<&'static str> {
    Some(match c {
        '\u{093E}' => "a",  // ा
        '\u{093F}' => "i",  // ि
        '\u{0940}' => "i",  // ी
        '\u{0941}' => "u",  // ु
        '\u{0942}' => "u",  // ू
        '\u{0943}' => "ri", // ृ
        '\u{0947}' => "e",  // े
        '\u{0948}' => "ai", // ै
        '\u{094B}' => "o",  // ो
        '\u{094C}' => "au", // ौ
        '\u{0949}' => "o",  // ॉ
        _ => return None,
    })
}

/// Fold decomposed consonant+nukta pairs into their precomposed forms so the
/// consonant table sees a single char either way.
fn fold_nukta(text: &str) -> String {
    const PAIRS: [(&str, char); 8] = [
        ("\u{0921}\u{093C}", '\u{095C}'),
        ("\u{0922}\u{093C}", '\u{095D}'),
        ("\u{0915}\u{093C}", '\u{0958}'),
        ("\u{0916}\u{093C}", '\u{0959}'),
        ("\u{0917}\u{093C}", '\u{095A}'),
        ("\u{091C}\u{093C}", '\u{095B}'),
        ("\u{092B}\u{093C}", '\u{095E}'),
        ("\u{092F}\u{093C}", '\u{095F}'),
    ];
    let mut text = text.to_string();
    for (pair, folded) in PAIRS {
        if text.contains(pair) {
            text = text.replace(pair, &folded.to_string());
        }
    }
    text
}

/// Devanagari text → clean lowercase Roman ASCII. Non-Devanagari ASCII
/// passes through lowercased; everything else is dropped.
pub fn transliterate(text: &str) -> String {
    let text = fold_nukta(text);
    let mut out = String::with_capacity(text.len());
    // A consonant was emitted and its inherent "a" is still pending.
    let mut pending_a = false;

    fn flush(out: &mut String, pending: &mut bool) {
        if *pending {
            out.push('a');
            *pending = false;
        }
    }

    for c in text.chars() {
        if let Some(sound) = consonant(c) {
            flush(&mut out, &mut pending_a);
            out.push_str(sound);
            pending_a = true;
        } else if let Some(v) = matra(c) {
            pending_a = false;
            out.push_str(v);
        } else if let Some(v) = independent_vowel(c) {
            flush(&mut out, &mut pending_a);
            out.push_str(v);
        } else if c.is_whitespace() || c == '।' || c == '॥' {
            // Word boundary: the trailing inherent vowel is deleted, not spoken.
            pending_a = false;
            out.push(' ');
        } else {
            match c {
                '\u{094D}' => pending_a = false, // virama kills the inherent vowel
                '\u{0902}' | '\u{0901}' => {
                    // anusvara / chandrabindu
                    flush(&mut out, &mut pending_a);
                    out.push('n');
                }
                '\u{0903}' | '\u{093C}' => {} // visarga, stray nukta: drop
                '०'..='९' => {
                    pending_a = false;
                    out.push((b'0' + (c as u32 - '०' as u32) as u8) as char);
                }
                c if c.is_ascii() => {
                    pending_a = false;
                    out.push(c.to_ascii_lowercase());
                }
                _ => {}
            }
        }
    }
    // Word-final schwa deletion: a trailing pending "a" is dropped.

    // Collapse runs of whitespace left by dropped characters.
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_devanagari() {
        assert!(has_devanagari("बांसवाड़ा"));
        assert!(has_devanagari("Kota की कहानी"));
        assert!(!has_devanagari("Banswara Ki Kahani"));
    }

    #[test]
    fn simple_words() {
        assert_eq!(transliterate("कोटा"), "kota");
        assert_eq!(transliterate("बूंदी"), "bundi");
        assert_eq!(transliterate("कहानी"), "kahani");
    }

    #[test]
    fn nukta_flap_romanizes_to_r() {
        assert_eq!(transliterate("बांसवाड़ा"), "bansavara");
        // Decomposed consonant + nukta folds to the same output
        assert_eq!(transliterate("बांसवाड\u{093C}ा"), "bansavara");
    }

    #[test]
    fn virama_and_final_schwa() {
        // प्र = pa + virama + ra → "pra"; the word-final consonant drops
        // its inherent vowel.
        assert_eq!(transliterate("प्रताप"), "pratap");
    }

    #[test]
    fn phrases_keep_word_breaks() {
        assert_eq!(transliterate("कोटा की कहानी"), "kota ki kahani");
    }

    #[test]
    fn mixed_ascii_passes_through() {
        assert_eq!(transliterate("Kota कहानी 2"), "kota kahani 2");
    }
}
