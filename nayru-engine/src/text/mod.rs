mod clean;
mod merge;
mod segment;

pub use clean::clean;
pub use merge::merge_sentences;
pub use segment::split_into_sentences;

/// Clean, segment and merge raw text into the ordered list of chunk
/// texts for one utterance (`spec.md` §4.1). Paragraph breaks in the
/// cleaned text are tracked so merging never crosses them.
pub fn prepare_chunk_texts(raw: &str) -> Vec<String> {
    let cleaned = clean(raw);
    let mut sentences = Vec::new();
    let mut paragraph_of = Vec::new();

    for (paragraph_idx, paragraph) in cleaned.split("\n\n").enumerate() {
        for sentence in split_into_sentences(paragraph) {
            sentences.push(sentence);
            paragraph_of.push(paragraph_idx);
        }
    }

    if sentences.is_empty() {
        let trimmed = cleaned.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![trimmed.to_string()];
    }

    merge_sentences(&sentences, &paragraph_of)
}
