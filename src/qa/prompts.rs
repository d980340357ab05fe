use crate::generate::Prompt;

fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "ko" => "Korean",
        "ja" => "Japanese",
        other => other,
    }
}

/// Factoid-style question from a passage: answerable with a short fact
/// stated in the passage itself.
pub fn factoid_query(passage: &str, language: &str) -> Prompt {
    Prompt {
        system: format!(
            "You write evaluation questions for a retrieval system. \
             Generate exactly one factoid question that can be answered \
             from the given passage alone, phrased in {}. Output only the \
             question.",
            language_name(language)
        ),
        user: format!("Passage:\n{passage}"),
    }
}

/// Complete-sentence ground-truth answer for a query/passage pair.
pub fn basic_answer(passage: &str, query: &str, language: &str) -> Prompt {
    Prompt {
        system: format!(
            "Answer the question using only the given passage. Reply with \
             one complete sentence in {}. If the passage does not contain \
             the answer, reply with \"I don't know\".",
            language_name(language)
        ),
        user: format!("Passage:\n{passage}\n\nQuestion:\n{query}"),
    }
}

/// Minimal-phrase ground-truth answer variant.
pub fn concise_answer(passage: &str, query: &str, language: &str) -> Prompt {
    Prompt {
        system: format!(
            "Answer the question using only the given passage. Reply with \
             the shortest phrase that answers it, in {}, with no full \
             sentence around it. If the passage does not contain the \
             answer, reply with \"I don't know\".",
            language_name(language)
        ),
        user: format!("Passage:\n{passage}\n\nQuestion:\n{query}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_carry_passage_and_query() {
        let prompt = basic_answer("Paris is the capital.", "What is the capital?", "en");
        assert!(prompt.user.contains("Paris is the capital."));
        assert!(prompt.user.contains("What is the capital?"));
        assert!(prompt.system.contains("English"));
    }

    #[test]
    fn unknown_language_codes_pass_through() {
        let prompt = factoid_query("text", "fr");
        assert!(prompt.system.contains("fr"));
    }
}
