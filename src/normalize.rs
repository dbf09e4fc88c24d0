//! File name normalization.
//!
//! Names are made filesystem-safe in two steps: Cyrillic letters are
//! transliterated to Latin, then every remaining non-word character is
//! replaced with an underscore. The extension is re-attached unchanged.

use regex::Regex;
use std::sync::LazyLock;

/// Lowercase Cyrillic letters and their Latin spelling.
const TRANSLITERATION: &[(char, &str)] = &[
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "e"),
    ('ж', "j"),
    ('з', "z"),
    ('и', "i"),
    ('й', "j"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "sch"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('ю', "yu"),
    // Spelled out in full, not collapsed to "u".
    ('я', "ja"),
    ('є', "je"),
    ('і', "i"),
    ('ї', "ji"),
    ('ґ', "g"),
];

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W").expect("static regex is valid"));

/// Returns the Latin spelling of a Cyrillic letter, or `None` for any other char.
///
/// Uppercase letters get the mapping with its first letter capitalized.
///
/// # Examples
///
/// ```
/// use filesort::normalize::transliterate_char;
///
/// assert_eq!(transliterate_char('щ').as_deref(), Some("sch"));
/// assert_eq!(transliterate_char('Щ').as_deref(), Some("Sch"));
/// assert_eq!(transliterate_char('ъ').as_deref(), Some(""));
/// assert_eq!(transliterate_char('q'), None);
/// ```
pub fn transliterate_char(c: char) -> Option<String> {
    if let Some((_, latin)) = TRANSLITERATION.iter().find(|(cyr, _)| *cyr == c) {
        return Some((*latin).to_string());
    }

    let lower = c.to_lowercase().next()?;
    if lower == c {
        return None;
    }
    let (_, latin) = TRANSLITERATION.iter().find(|(cyr, _)| *cyr == lower)?;
    let mut chars = latin.chars();
    Some(match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    })
}

/// Transliterates every Cyrillic letter in `text`, keeping other characters.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match transliterate_char(c) {
            Some(latin) => out.push_str(&latin),
            None => out.push(c),
        }
    }
    out
}

/// Builds a filesystem-safe file name from a stem and its suffix.
///
/// The suffix is appended as given, leading dot included.
///
/// # Examples
///
/// ```
/// use filesort::normalize::normalize;
///
/// assert_eq!(normalize("Отчёт 2024", ".docx"), "Otchet_2024.docx");
/// assert_eq!(normalize("my-photo (1)", ".JPG"), "my_photo__1_.JPG");
/// assert_eq!(normalize("", ".gitignore"), ".gitignore");
/// ```
pub fn normalize(stem: &str, suffix: &str) -> String {
    let latin = transliterate(stem);
    let mut name = NON_WORD.replace_all(&latin, "_").into_owned();
    name.push_str(suffix);
    name
}

/// Splits a file name into its stem and suffix.
///
/// The suffix starts at the last dot, unless that dot is the first or the
/// last character of the name, in which case there is no suffix.
///
/// # Examples
///
/// ```
/// use filesort::normalize::split_name;
///
/// assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
/// assert_eq!(split_name(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_name("README"), ("README", ""));
/// ```
pub fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(i) if i > 0 && i < file_name.len() - 1 => file_name.split_at(i),
        _ => (file_name, ""),
    }
}

/// Normalizes a whole file name, keeping its suffix.
pub fn normalize_file_name(file_name: &str) -> String {
    let (stem, suffix) = split_name(file_name);
    normalize(stem, suffix)
}
