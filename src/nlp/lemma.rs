// Noun-default lemmatizer: irregular-form table plus morphy-style suffix rules.
// A candidate lemma is rejected when it is a stopword or shorter than three
// letters, and rules run until the token stops changing, so applying the
// lemmatizer twice gives the same result as applying it once.
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use super::stopwords::is_stopword;

const MIN_LEMMA_LEN: usize = 3;
const MAX_PASSES: usize = 8;

static IRREGULAR: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("countrymen", "countryman"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("mice", "mouse"),
        ("lice", "louse"),
        ("data", "datum"),
        ("media", "medium"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("analyses", "analysis"),
        ("crises", "crisis"),
        ("theses", "thesis"),
        ("diagnoses", "diagnosis"),
        ("hypotheses", "hypothesis"),
        ("indices", "index"),
        ("matrices", "matrix"),
        ("lives", "life"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("leaves", "leaf"),
        ("wolves", "wolf"),
        ("halves", "half"),
        ("shelves", "shelf"),
        ("thieves", "thief"),
        ("selves", "self"),
        ("loaves", "loaf"),
        ("calves", "calf"),
    ]
    .iter()
    .copied()
    .collect()
});

// Singular nouns that end in consonant + "men".
const SINGULAR_MEN: &[&str] = &["dolmen", "tegmen", "carmen", "germen"];

// Words whose trailing "s" is part of the base form.
static INVARIANT: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "news", "series", "species", "means", "physics", "politics", "economics",
        "mathematics", "athletics", "ethics", "statistics", "logistics", "analytics",
        "electronics", "genetics", "aerobics", "gas", "lens", "chaos", "bias", "atlas",
        "canvas", "alias", "christmas", "texas", "kansas", "arkansas", "paris", "pants",
        "scissors", "glasses", "headquarters", "barracks", "diabetes", "measles",
        "mumps", "always", "perhaps", "towards", "afterwards", "sometimes", "whereas",
        "yes", "thus", "plus", "minus", "bus", "us", "was", "has", "does", "sales",
        "earnings", "savings", "goods", "arms", "congress", "progress", "process",
        "access", "success", "business", "address", "witness", "boss", "loss", "class",
        "pass", "mass", "glass", "grass", "press", "stress", "dress", "mess",
    ]
    .iter()
    .copied()
    .collect()
});

/// Lemmatize a single token. Tokens with characters outside `a-z` are
/// returned unchanged.
pub fn lemmatize_token(token: &str) -> String {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_lowercase()) {
        return token.to_string();
    }
    let mut current = token.to_string();
    for _ in 0..MAX_PASSES {
        let next = step(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn step(word: &str) -> String {
    match candidate(word) {
        Some(lemma) if acceptable(&lemma) => lemma,
        _ => word.to_string(),
    }
}

fn acceptable(lemma: &str) -> bool {
    lemma.len() >= MIN_LEMMA_LEN && !is_stopword(lemma)
}

fn candidate(word: &str) -> Option<String> {
    if let Some(base) = IRREGULAR.get(word) {
        return Some((*base).to_string());
    }
    if INVARIANT.contains(word) {
        return None;
    }

    if let Some(stem) = word.strip_suffix("men") {
        if SINGULAR_MEN.contains(&word) {
            return None;
        }
        let before = stem.chars().last()?;
        if word.len() > 5 && !"aeiouy".contains(before) {
            return Some(format!("{stem}man"));
        }
        return None;
    }

    if !word.ends_with('s') {
        return None;
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") || word.ends_with("ous") {
        return None;
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() >= 3 {
            return Some(format!("{stem}y"));
        }
        return word.strip_suffix('s').map(str::to_string);
    }
    if let Some(stem) = word.strip_suffix("sses") {
        return Some(format!("{stem}ss"));
    }
    if word.ends_with("ses") {
        // buses, viruses -> drop "es"; cases, houses -> drop "s"
        let without_es = &word[..word.len() - 2];
        if without_es.ends_with("us") {
            return Some(without_es.to_string());
        }
        return word.strip_suffix('s').map(str::to_string);
    }
    if let Some(stem) = word.strip_suffix("zzes") {
        return Some(format!("{stem}z"));
    }
    for suffix in ["xes", "ches", "shes"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            let kept = &suffix[..suffix.len() - 2];
            return Some(format!("{stem}{kept}"));
        }
    }
    word.strip_suffix('s').map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        assert_eq!(lemmatize_token("markets"), "market");
        assert_eq!(lemmatize_token("cities"), "city");
        assert_eq!(lemmatize_token("boxes"), "box");
        assert_eq!(lemmatize_token("churches"), "church");
        assert_eq!(lemmatize_token("classes"), "class");
        assert_eq!(lemmatize_token("cases"), "case");
        assert_eq!(lemmatize_token("viruses"), "virus");
        assert_eq!(lemmatize_token("ties"), "tie");
    }

    #[test]
    fn test_irregular_and_invariant() {
        assert_eq!(lemmatize_token("children"), "child");
        assert_eq!(lemmatize_token("chairmen"), "chairman");
        assert_eq!(lemmatize_token("data"), "datum");
        assert_eq!(lemmatize_token("news"), "news");
        assert_eq!(lemmatize_token("politics"), "politics");
        assert_eq!(lemmatize_token("famous"), "famous");
        assert_eq!(lemmatize_token("analysis"), "analysis");
        assert_eq!(lemmatize_token("specimen"), "specimen");
    }

    #[test]
    fn test_singular_men_words_kept() {
        assert_eq!(lemmatize_token("dolmen"), "dolmen");
        assert_eq!(lemmatize_token("dolmens"), "dolmen");
        assert_eq!(lemmatize_token("tegmen"), "tegmen");
        assert_eq!(lemmatize_token("sportsmen"), "sportsman");
    }

    #[test]
    fn test_never_produces_stopword_or_short_lemma() {
        // "hes" would become the stopword "he"
        assert_eq!(lemmatize_token("hes"), "hes");
        assert_eq!(lemmatize_token("ups"), "ups");
        assert_eq!(lemmatize_token("its"), "its");
    }

    #[test]
    fn test_non_alphabetic_untouched() {
        assert_eq!(lemmatize_token("don't"), "don't");
        assert_eq!(lemmatize_token("."), ".");
        assert_eq!(lemmatize_token("Cats"), "Cats");
        assert_eq!(lemmatize_token(""), "");
    }

    #[test]
    fn test_idempotent() {
        for word in ["markets", "buses", "quizzes", "mice", "analyses", "lives", "series", "glasses", "stories"] {
            let once = lemmatize_token(word);
            assert_eq!(lemmatize_token(&once), once, "not idempotent for {word}");
        }
    }

    #[test]
    fn test_irregular_targets_are_fixed_points() {
        for base in IRREGULAR.values() {
            assert_eq!(lemmatize_token(base), *base);
        }
    }
}
