//! Title → social handle generation.
//!
//! Pure and deterministic: the same title and brand prefix always produce the
//! same handle set. Handles one Hindi (Devanagari) or English title and emits
//! platform-legal names for Instagram, Facebook, and YouTube.
//!
//! Platform rules enforced here:
//! - Instagram: a-z 0-9 _ . | max 30 | no doubled dots, no dot at start/end
//! - Facebook username: a-z A-Z 0-9 . | max 50 | min 5 (padded "Official")
//! - YouTube handle: a-z A-Z 0-9 _ - . | max 30 | min 3 (padded "Official")

mod translit;

pub use translit::{has_devanagari, transliterate};

use socialforge_common::SocialHandles;

/// Official English spellings for known district names — used directly
/// instead of transliteration when the title matches.
const DISTRICT_CANONICAL: [(&str, &str); 12] = [
    ("banswara", "Banswara"),
    ("dungarpur", "Dungarpur"),
    ("pratapgarh", "Pratapgarh"),
    ("udaipur", "Udaipur"),
    ("rajsamand", "Rajsamand"),
    ("salumbar", "Salumbar"),
    ("kota", "Kota"),
    ("bundi", "Bundi"),
    ("baran", "Baran"),
    ("jhalawar", "Jhalawar"),
    ("chittorgarh", "Chittorgarh"),
    ("bhilwara", "Bhilwara"),
];

/// Title (Hindi or English) → clean lowercase Roman form.
fn to_roman(title: &str) -> String {
    let lower = title.trim().to_lowercase();
    if let Some((_, canonical)) = DISTRICT_CANONICAL.iter().find(|(k, _)| *k == lower) {
        return canonical.to_lowercase();
    }
    if has_devanagari(title) {
        transliterate(title)
    } else {
        lower
    }
}

/// "बांसवाड़ा की कहानी" → "bansavara-ki-kahani"
pub fn to_slug(title: &str) -> String {
    let roman = to_roman(title);
    let mut slug = String::with_capacity(roman.len());
    let mut last_sep = true;
    for c in roman.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_sep = false;
        } else if !last_sep {
            slug.push('-');
            last_sep = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn roman_words(title: &str) -> Vec<String> {
    to_roman(title)
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Title-case every whitespace-separated word ("kota ke kisse" → "Kota Ke Kisse").
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// --- Instagram ---

fn clean_ig(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '.')
        .collect()
}

fn ig_safe(handle: &str) -> String {
    let mut out = String::with_capacity(handle.len());
    let mut last_dot = false;
    for c in handle.chars() {
        if c == '.' {
            if !last_dot {
                out.push('.');
                last_dot = true;
            }
        } else {
            out.push(c);
            last_dot = false;
        }
    }
    truncate_chars(out.trim_matches('.'), 30)
        .trim_matches('.')
        .to_string()
}

/// "Banswara" → "stage.banswara"
pub fn generate_ig_handle(title: &str, prefix: &str) -> String {
    let core: String = roman_words(title).concat();
    let core = clean_ig(&core);
    let prefix = clean_ig(prefix);
    let handle = if prefix.is_empty() {
        core
    } else {
        format!("{prefix}.{core}")
    };
    ig_safe(&handle)
}

// --- Facebook ---

fn clean_fb(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect()
}

/// "Banswara Ki Kahani" → "StageBanswaraKiKahani"
pub fn generate_fb_username(title: &str, prefix: &str) -> String {
    let core: String = roman_words(title).iter().map(|w| capitalize(w)).collect();
    let mut username = truncate_chars(&clean_fb(&format!("{prefix}{core}")), 50);
    if username.chars().count() < 5 {
        username.push_str("Official");
    }
    username
}

/// Display name — keeps Devanagari for Hindi titles.
pub fn generate_fb_page_name(title: &str, prefix: &str) -> String {
    if has_devanagari(title) {
        truncate_chars(&format!("{prefix} {}", title.trim()), 75)
    } else {
        truncate_chars(&format!("{prefix} {}", title_case(title)), 75)
    }
}

// --- YouTube ---

fn clean_yt_handle(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let mut out = String::with_capacity(kept.len());
    let mut last_dot = false;
    for c in kept.chars() {
        if c == '.' {
            if !last_dot {
                out.push('.');
                last_dot = true;
            }
        } else {
            out.push(c);
            last_dot = false;
        }
    }
    out.trim_matches(|c| c == '.' || c == '-').to_string()
}

/// "Banswara" → "StageBanswara"
pub fn generate_yt_handle(title: &str, prefix: &str) -> String {
    let core: String = roman_words(title).iter().map(|w| capitalize(w)).collect();
    let mut handle = truncate_chars(&clean_yt_handle(&format!("{prefix}{core}")), 30);
    if handle.chars().count() < 3 {
        handle.push_str("Official");
    }
    handle
}

/// Display name — keeps Devanagari for regional SEO.
pub fn generate_yt_channel_name(title: &str, prefix: &str) -> String {
    if has_devanagari(title) {
        truncate_chars(&format!("{prefix} {}", title.trim()), 100)
    } else {
        truncate_chars(&format!("{prefix} {}", title_case(title)), 100)
    }
}

/// Generate the full handle set for a title.
///
/// The brand prefix is cased per platform: "STAGE Banswara" (display),
/// "StageBanswara" (usernames), "stage.banswara" (Instagram).
pub fn generate(title: &str, brand_prefix: &str) -> SocialHandles {
    let prefix_title = capitalize(&brand_prefix.to_lowercase());
    let prefix_upper = brand_prefix.to_uppercase();
    let prefix_lower = brand_prefix.to_lowercase();

    SocialHandles {
        input_title: title.trim().to_string(),
        roman_form: to_roman(title),
        slug: to_slug(title),
        ig_handle: generate_ig_handle(title, &prefix_lower),
        fb_page_name: generate_fb_page_name(title, &prefix_upper),
        fb_username: generate_fb_username(title, &prefix_title),
        yt_channel_name: generate_yt_channel_name(title, &prefix_upper),
        yt_handle: generate_yt_handle(title, &prefix_title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_title_full_set() {
        let h = generate("Banswara", "STAGE");
        assert_eq!(h.slug, "banswara");
        assert_eq!(h.ig_handle, "stage.banswara");
        assert_eq!(h.fb_page_name, "STAGE Banswara");
        assert_eq!(h.fb_username, "StageBanswara");
        assert_eq!(h.yt_channel_name, "STAGE Banswara");
        assert_eq!(h.yt_handle, "StageBanswara");
    }

    #[test]
    fn multi_word_title() {
        let h = generate("Kota Ke Kisse", "STAGE");
        assert_eq!(h.slug, "kota-ke-kisse");
        assert_eq!(h.ig_handle, "stage.kotakekisse");
        assert_eq!(h.fb_username, "StageKotaKeKisse");
        assert_eq!(h.fb_page_name, "STAGE Kota Ke Kisse");
        assert_eq!(h.yt_handle, "StageKotaKeKisse");
    }

    #[test]
    fn devanagari_title_keeps_display_name() {
        let h = generate("कोटा की कहानी", "STAGE");
        assert_eq!(h.roman_form, "kota ki kahani");
        assert_eq!(h.slug, "kota-ki-kahani");
        assert_eq!(h.ig_handle, "stage.kotakikahani");
        // Display names keep the Devanagari script
        assert_eq!(h.fb_page_name, "STAGE कोटा की कहानी");
        assert_eq!(h.yt_channel_name, "STAGE कोटा की कहानी");
        assert_eq!(h.fb_username, "StageKotaKiKahani");
    }

    #[test]
    fn canonical_district_wins_over_transliteration() {
        assert_eq!(to_slug("BANSWARA"), "banswara");
        assert_eq!(to_slug("Chittorgarh"), "chittorgarh");
    }

    #[test]
    fn ig_handle_is_capped_and_dot_safe() {
        let h = generate_ig_handle("A Very Long Title That Goes On And On Forever", "stage");
        assert!(h.chars().count() <= 30);
        assert!(!h.starts_with('.'));
        assert!(!h.ends_with('.'));
        assert!(!h.contains(".."));
    }

    #[test]
    fn short_names_get_padded() {
        let fb = generate_fb_username("A", "");
        assert!(fb.chars().count() >= 5);
        assert_eq!(fb, "AOfficial");

        let yt = generate_yt_handle("", "");
        assert_eq!(yt, "Official");
    }

    #[test]
    fn deterministic() {
        let a = generate("Udaipur", "STAGE");
        let b = generate("Udaipur", "STAGE");
        assert_eq!(a, b);
    }

    #[test]
    fn slug_strips_punctuation() {
        assert_eq!(to_slug("Kota: Ke!! Kisse"), "kota-ke-kisse");
        assert_eq!(to_slug("  spaced   out  "), "spaced-out");
    }
}
