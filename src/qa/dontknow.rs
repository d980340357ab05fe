/// Rule-based detection of degenerate "no answer" generations.
///
/// Matching is case- and punctuation-insensitive: both the answer and the
/// phrase are lowercased, stripped of non-alphanumeric characters and
/// whitespace-collapsed before a containment check.
const DONT_KNOW_EN: [&str; 6] = [
    "i don't know",
    "i do not know",
    "don't know",
    "unknown",
    "no answer",
    "cannot answer",
];

const DONT_KNOW_KO: [&str; 4] = ["몰라요", "모르겠습니다", "모르겠어요", "알 수 없습니다"];

const DONT_KNOW_JA: [&str; 3] = ["わかりません", "分かりません", "知りません"];

pub fn supported_languages() -> &'static [&'static str] {
    &["en", "ko", "ja"]
}

pub fn phrases(language: &str) -> &'static [&'static str] {
    match language {
        "ko" => &DONT_KNOW_KO,
        "ja" => &DONT_KNOW_JA,
        _ => &DONT_KNOW_EN,
    }
}

pub fn is_dont_know(answer: &str, language: &str) -> bool {
    let normalized = normalize(answer);
    if normalized.is_empty() {
        return true;
    }
    phrases(language)
        .iter()
        .any(|phrase| normalized.contains(&normalize(phrase)))
}

fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else {
                ' '
            }
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_phrase_matches() {
        assert!(is_dont_know("I don't know", "en"));
        assert!(is_dont_know("몰라요", "ko"));
        assert!(is_dont_know("わかりません", "ja"));
    }

    #[test]
    fn matching_ignores_case_and_punctuation() {
        assert!(is_dont_know("I DON'T KNOW.", "en"));
        assert!(is_dont_know("i dont know!!!", "en"));
        assert!(is_dont_know("Sorry, I don't know the answer.", "en"));
    }

    #[test]
    fn grounded_answers_pass() {
        assert!(!is_dont_know("Paris is the capital of France.", "en"));
        assert!(!is_dont_know("The unknown-unknowns framework was coined in 2002, by Rumsfeld, who knew.", "ja"));
    }

    #[test]
    fn empty_answers_are_degenerate() {
        assert!(is_dont_know("", "en"));
        assert!(is_dont_know("   ", "en"));
    }
}
