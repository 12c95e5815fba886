//! Accent folding for utterances sent to the dialogue service
//!
//! The bot's patterns are written without accents, so a recognized
//! "¿Quién lleva sombrero?" only matches once folded to "¿Quien ...".

/// Map an accented vowel to its plain counterpart
const fn fold(c: char) -> char {
    match c {
        'á' => 'a',
        'é' => 'e',
        'í' => 'i',
        'ó' => 'o',
        'ú' | 'ü' => 'u',
        'Á' => 'A',
        'É' => 'E',
        'Í' => 'I',
        'Ó' => 'O',
        'Ú' | 'Ü' => 'U',
        other => other,
    }
}

/// Replace accented and diaeresis vowels with plain ones
///
/// `ñ` and Spanish punctuation pass through unchanged. Idempotent.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.chars().map(fold).collect()
}

/// Uppercase the first character, leaving the rest as recognized
#[must_use]
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize("camión"), "camion");
    }

    #[test]
    fn test_full_accent_set() {
        assert_eq!(normalize("áéíóúüÁÉÍÓÚÜ"), "aeiouuAEIOUU");
    }

    #[test]
    fn test_other_characters_pass_through() {
        assert_eq!(normalize("¿Niño? ¡Sí!"), "¿Niño? ¡Si!");
        assert_eq!(normalize("plain ascii 123"), "plain ascii 123");
    }

    #[test]
    fn test_idempotent() {
        let samples = ["", "pingüino", "ÁRBOL", "¿Quién es?", "ya normal"];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("tiene gafas"), "Tiene gafas");
        assert_eq!(capitalize_first("élla"), "Élla");
        assert_eq!(capitalize_first("Ya"), "Ya");
        assert_eq!(capitalize_first(""), "");
    }
}
