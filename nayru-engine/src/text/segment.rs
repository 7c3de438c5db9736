//! Sentence segmentation (`spec.md` §4.1).
//!
//! Splits at sentence-ending punctuation followed by whitespace and an
//! uppercase letter / digit / quote, or at paragraph breaks. Decimals
//! (`3.14`) never reach that lookahead at all — the digit right after
//! the period isn't whitespace — while abbreviations (`Mr.`, `e.g.`)
//! are caught separately by checking the word immediately before the
//! punctuation against a known-abbreviation list. The segmenter never
//! fails; on pathological input it falls back to one segment equal to
//! the trimmed input (`spec.md` §4.1, Failure clause).

const SENTENCE_ENDERS: &[char] = &['.', '!', '?', '。', '！', '？'];

/// Trailing words that a period after them never ends a sentence.
/// Checked case-insensitively against the word immediately preceding
/// the punctuation (`spec.md` §4.1: "Abbreviations ... MUST NOT split").
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "al", "cf", "e.g", "i.e", "inc", "co", "ltd",
];

/// Split `text` (already cleaned) into trimmed, non-empty sentences.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();

    for paragraph in text.split("\n\n") {
        sentences.extend(split_paragraph(paragraph));
    }

    if sentences.is_empty() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
    }

    sentences
}

fn split_paragraph(paragraph: &str) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if SENTENCE_ENDERS.contains(&c) && is_real_sentence_end(&chars, i) {
            let segment: String = chars[start..=i].iter().collect();
            let trimmed = segment.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
            // Skip the whitespace run that justified the split.
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            start = j;
            i = j;
            continue;
        }
        i += 1;
    }

    if start < chars.len() {
        let tail: String = chars[start..].iter().collect();
        let trimmed = tail.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    }

    out
}

/// The punctuation at `idx` ends a sentence only if the preceding word
/// isn't a known abbreviation, and it's followed by whitespace and then
/// an uppercase letter, digit, opening quote, or end of text
/// (`spec.md` §4.1).
fn is_real_sentence_end(chars: &[char], idx: usize) -> bool {
    if ends_with_abbreviation(chars, idx) {
        return false;
    }
    let Some(&next) = chars.get(idx + 1) else {
        return true;
    };
    if !next.is_whitespace() {
        return false;
    }
    let mut j = idx + 1;
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    match chars.get(j) {
        None => true,
        Some(&c) => c.is_uppercase() || c.is_ascii_digit() || c == '"' || c == '\'' || c == '“' || c == '‘',
    }
}

/// Scans backward from the punctuation at `idx` to the preceding
/// whitespace (or start of text), and checks whether that word is a
/// known abbreviation. Embedded periods (`e.g`) aren't whitespace, so
/// the scan reaches all the way back to `e` when called on the final
/// period of `e.g.`.
fn ends_with_abbreviation(chars: &[char], idx: usize) -> bool {
    let mut start = idx;
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    let word: String = chars[start..idx].iter().collect();
    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_sentences() {
        assert_eq!(
            split_into_sentences("Hello. World."),
            vec!["Hello.", "World."]
        );
    }

    #[test]
    fn does_not_split_abbreviations() {
        let sentences = split_into_sentences("Mr. Smith went home. He was tired.");
        assert_eq!(sentences, vec!["Mr. Smith went home.", "He was tired."]);
    }

    #[test]
    fn does_not_split_dotted_abbreviations() {
        let sentences = split_into_sentences("Bring snacks, e.g. chips. Then relax.");
        assert_eq!(sentences, vec!["Bring snacks, e.g. chips.", "Then relax."]);
    }

    #[test]
    fn does_not_split_decimals() {
        let sentences = split_into_sentences("Pi is about 3.14 in most classrooms.");
        assert_eq!(sentences, vec!["Pi is about 3.14 in most classrooms."]);
    }

    #[test]
    fn splits_on_paragraph_breaks() {
        let sentences = split_into_sentences("First paragraph\n\nSecond paragraph");
        assert_eq!(sentences, vec!["First paragraph", "Second paragraph"]);
    }

    #[test]
    fn pathological_input_yields_one_chunk() {
        let sentences = split_into_sentences("no terminal punctuation at all");
        assert_eq!(sentences, vec!["no terminal punctuation at all"]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_into_sentences("").is_empty());
        assert!(split_into_sentences("   ").is_empty());
    }
}
