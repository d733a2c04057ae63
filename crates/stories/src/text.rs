// Text folding and matching shared by the classifier and the CTA selector.

const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

pub fn strip_zero_width(s: &str) -> String {
    s.chars().filter(|c| !ZERO_WIDTH.contains(c)).collect()
}

pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Case-folded, accent-stripped, whitespace-collapsed comparison form.
pub fn fold(s: &str) -> String {
    let lowered: String = s.to_lowercase().chars().map(strip_accent).collect();
    collapse_ws(&lowered)
}

/// Folded text as space-padded words, for whole-word lookups.
pub fn word_padded(folded: &str) -> String {
    let words: Vec<&str> = folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    format!(" {} ", words.join(" "))
}

/// `term` (folded) appears as whole words in `padded`.
pub fn has_word(padded: &str, term: &str) -> bool {
    padded.contains(&format!(" {} ", term))
}

/// True when the strings differ by exactly one inserted or deleted char.
pub fn one_edit_apart(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() < b.len() { (&a, &b) } else { (&b, &a) };
    if long.len() != short.len() + 1 {
        return false;
    }

    let mut i = 0;
    while i < short.len() && short[i] == long[i] {
        i += 1;
    }
    short[i..] == long[i + 1..]
}

pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_dash = true;
    for ch in fold(s).chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let slug: String = out.trim_matches('-').chars().take(60).collect();
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold() {
        assert_eq!(fold("  Réserver\u{a0} MAINTENANT "), "reserver maintenant");
        assert_eq!(fold("Démo"), "demo");
    }

    #[test]
    fn test_strip_zero_width() {
        assert_eq!(strip_zero_width("Sign\u{200B}up\u{FEFF}"), "Signup");
    }

    #[test]
    fn test_whole_word_lookup() {
        let padded = word_padded(&fold("Build your UI-kit, fast"));
        assert!(has_word(&padded, "ui"));
        assert!(has_word(&padded, "your ui"));
        assert!(!has_word(&padded, "buil"));
    }

    #[test]
    fn test_one_edit_apart() {
        assert!(one_edit_apart("reserver", "reserve"));
        assert!(one_edit_apart("reserve", "reserver"));
        assert!(one_edit_apart("demo", "dmo"));
        assert!(!one_edit_apart("demo", "demo"));
        assert!(!one_edit_apart("signin", "signup"));
        assert!(!one_edit_apart("ab", "abcd"));
        assert!(one_edit_apart("", "a"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("get started"), "Get Started");
        assert_eq!(title_case("reserver"), "Reserver");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Sign in through Connexion!"), "sign-in-through-connexion");
        assert_eq!(slugify("Réserver — en ligne"), "reserver-en-ligne");
        assert_eq!(slugify("***"), "page");
        assert!(slugify(&"word ".repeat(40)).len() <= 60);
        assert!(!slugify(&"word ".repeat(40)).ends_with('-'));
    }
}
