//! Stage 1: text → Chunks (`spec.md` §4.1). Runs inline in `Engine::speak`
//! — synchronous and quick, it never suspends (`spec.md` §5).

use crate::config::Config;
use crate::text::prepare_chunk_texts;
use crate::types::Chunk;

pub fn prepare(epoch: u64, text: &str, config: &Config) -> Vec<Chunk> {
    prepare_chunk_texts(text)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            epoch,
            index_in_utterance: index as u32,
            text,
            voice: config.voice.clone(),
            speed: config.speed,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_epoch_and_sequential_index() {
        let config = Config::new("http://localhost:8880", "af_heart", 1.0);
        let chunks = prepare(7, "Hello. World.", &config);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.epoch == 7));
        assert_eq!(chunks[0].index_in_utterance, 0);
        assert_eq!(chunks[1].index_in_utterance, 1);
        assert_eq!(chunks[0].voice, "af_heart");
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let config = Config::new("http://localhost:8880", "af_heart", 1.0);
        assert!(prepare(1, "", &config).is_empty());
    }
}
