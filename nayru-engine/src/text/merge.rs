//! Merge consecutive sentences into larger chunks to cut upstream call
//! count and first-audio latency jitter (`spec.md` §4.1).

pub const MERGE_TARGET: usize = 280;
pub const MERGE_MAX: usize = 500;

/// Merge `sentences` (the output of a single paragraph's segmentation,
/// concatenated across paragraphs by the caller with a paragraph-break
/// marker already accounted for) while the combined length stays under
/// `MERGE_TARGET`, never crossing `MERGE_MAX`, and never merging across
/// a paragraph break.
///
/// `paragraph_of[i]` gives the paragraph index sentence `i` belongs to,
/// so merging never crosses a boundary.
pub fn merge_sentences(sentences: &[String], paragraph_of: &[usize]) -> Vec<String> {
    debug_assert_eq!(sentences.len(), paragraph_of.len());

    let mut merged = Vec::new();
    let mut current = String::new();
    let mut current_paragraph: Option<usize> = None;

    for (sentence, &paragraph) in sentences.iter().zip(paragraph_of) {
        let same_paragraph = current_paragraph == Some(paragraph);
        let candidate_len = current.len() + 1 + sentence.len();

        if !current.is_empty() && same_paragraph && current.len() < MERGE_TARGET && candidate_len <= MERGE_MAX {
            current.push(' ');
            current.push_str(sentence);
        } else {
            if !current.is_empty() {
                merged.push(std::mem::take(&mut current));
            }
            current = sentence.clone();
            current_paragraph = Some(paragraph);
        }
    }

    if !current.is_empty() {
        merged.push(current);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_short_sentences() {
        let sentences = vec!["One.".to_string(), "Two.".to_string(), "Three.".to_string()];
        let paragraphs = vec![0, 0, 0];
        let merged = merge_sentences(&sentences, &paragraphs);
        assert_eq!(merged, vec!["One. Two. Three."]);
    }

    #[test]
    fn never_merges_across_paragraph_break() {
        let sentences = vec!["One.".to_string(), "Two.".to_string()];
        let paragraphs = vec![0, 1];
        let merged = merge_sentences(&sentences, &paragraphs);
        assert_eq!(merged, vec!["One.".to_string(), "Two.".to_string()]);
    }

    #[test]
    fn stops_merging_past_merge_max() {
        let long_a = "a".repeat(300);
        let long_b = "b".repeat(300);
        let sentences = vec![long_a.clone(), long_b.clone()];
        let paragraphs = vec![0, 0];
        let merged = merge_sentences(&sentences, &paragraphs);
        assert_eq!(merged, vec![long_a, long_b]);
    }

    #[test]
    fn stops_merging_once_target_reached() {
        let a = "a".repeat(200);
        let b = "b".repeat(200);
        let c = "c".repeat(200);
        let sentences = vec![a.clone(), b.clone(), c.clone()];
        let paragraphs = vec![0, 0, 0];
        let merged = merge_sentences(&sentences, &paragraphs);
        // a+b already exceeds MERGE_TARGET (280) but stays under MERGE_MAX (500),
        // so they merge once; c starts a fresh chunk.
        assert_eq!(merged, vec![format!("{a} {b}"), c]);
    }
}
