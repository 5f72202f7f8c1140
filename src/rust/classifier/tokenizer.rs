//! Text → token ids.
//!
//! Two artefact formats are understood: a HuggingFace `tokenizer.json`, and a BERT
//! `vocab.txt` for Japanese models whose tokenizer splits words with a morphological
//! analyzer (UniDic) before running WordPiece over each word.

use std::fmt;
use std::path::Path;

use lindera::dictionary::DictionaryConfig;
use lindera::mode::Mode;
use lindera::tokenizer::{Tokenizer as Segmenter, TokenizerConfig};
use lindera::DictionaryKind;
use log::info;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::pre_tokenizers::whitespace::WhitespaceSplit;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::{NormalizedString, Tokenizer, TruncationParams};

use super::error::ClassifierError;

pub const VOCAB_FILE: &str = "vocab.txt";

const UNK_TOKEN: &str = "[UNK]";
const CLS_TOKEN: &str = "[CLS]";
const SEP_TOKEN: &str = "[SEP]";

/// UniDic word splitter; NFKC-normalizes first and drops whitespace, as MeCab does.
pub struct WordSegmenter {
    segmenter: Segmenter,
}

impl fmt::Debug for WordSegmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordSegmenter").field("dictionary", &"unidic").finish()
    }
}

impl WordSegmenter {
    pub fn unidic() -> Result<Self, ClassifierError> {
        let config = TokenizerConfig {
            dictionary: DictionaryConfig {
                kind: Some(DictionaryKind::UniDic),
                path: None,
            },
            user_dictionary: None,
            mode: Mode::Normal,
        };
        let segmenter = Segmenter::from_config(config)
            .map_err(|e| ClassifierError::TokenizerError(format!("Failed to load UniDic: {}", e)))?;
        Ok(Self { segmenter })
    }

    pub fn split(&self, text: &str) -> Result<Vec<String>, ClassifierError> {
        let mut normalized = NormalizedString::from(text);
        normalized.nfkc();

        let tokens = self
            .segmenter
            .tokenize(normalized.get())
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        Ok(tokens
            .iter()
            .flat_map(|token| token.text.split_whitespace())
            .map(str::to_string)
            .collect())
    }
}

/// The tokenizer paired with a classifier.
#[derive(Debug)]
pub enum TextTokenizer {
    /// A HuggingFace `tokenizer.json`.
    Pretrained(Tokenizer),
    /// UniDic word split, then WordPiece over a BERT `vocab.txt`.
    Japanese {
        segmenter: WordSegmenter,
        wordpiece: Tokenizer,
    },
}

impl TextTokenizer {
    /// Picks the format from the file name: `vocab.txt` is WordPiece, anything else is
    /// read as `tokenizer.json`.
    pub fn from_file(path: &Path) -> Result<Self, ClassifierError> {
        if path.file_name().is_some_and(|name| name == VOCAB_FILE) {
            Self::from_vocab(path)
        } else {
            Tokenizer::from_file(path)
                .map(TextTokenizer::Pretrained)
                .map_err(|e| ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e)))
        }
    }

    pub fn from_vocab(path: &Path) -> Result<Self, ClassifierError> {
        let model = WordPiece::from_file(&path.to_string_lossy())
            .unk_token(UNK_TOKEN.to_string())
            .build()
            .map_err(|e| ClassifierError::BuildError(format!("Failed to build WordPiece model: {}", e)))?;

        let mut wordpiece = Tokenizer::new(model);
        let special = |token: &str| {
            wordpiece
                .token_to_id(token)
                .map(|id| (token.to_string(), id))
                .ok_or_else(|| ClassifierError::BuildError(format!("{} is missing from {}", token, path.display())))
        };
        let (sep, cls) = (special(SEP_TOKEN)?, special(CLS_TOKEN)?);
        wordpiece.with_pre_tokenizer(WhitespaceSplit);
        wordpiece.with_post_processor(BertProcessing::new(sep, cls));
        info!("WordPiece vocabulary of {} tokens loaded", wordpiece.get_vocab_size(false));

        Ok(TextTokenizer::Japanese {
            segmenter: WordSegmenter::unidic()?,
            wordpiece,
        })
    }

    /// Caps encodings at `max_length` ids, special tokens included.
    pub fn with_truncation(&mut self, max_length: usize) -> Result<(), ClassifierError> {
        let tokenizer = match self {
            TextTokenizer::Pretrained(tokenizer) => tokenizer,
            TextTokenizer::Japanese { wordpiece, .. } => wordpiece,
        };
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        Ok(())
    }

    /// Token ids with `[CLS]`/`[SEP]` (or the tokenizer's own special tokens).
    pub fn encode(&self, text: &str) -> Result<Vec<u32>, ClassifierError> {
        let encoding = match self {
            TextTokenizer::Pretrained(tokenizer) => tokenizer.encode(text, true),
            TextTokenizer::Japanese { segmenter, wordpiece } => {
                let words = segmenter.split(text)?.join(" ");
                wordpiece.encode(words.as_str(), true)
            }
        }
        .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const VOCAB: &[&str] = &["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "今日", "は", "晴れ", "##れ"];

    fn vocab_file(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("emotion_radar-tokenizer-test")
            .join(format!("{}-{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(VOCAB_FILE);
        fs::write(&path, VOCAB.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_vocab_file_selects_wordpiece() {
        let tokenizer = TextTokenizer::from_file(&vocab_file("select")).unwrap();
        assert!(matches!(tokenizer, TextTokenizer::Japanese { .. }));
    }

    #[test]
    fn test_words_are_split_before_wordpiece() {
        let tokenizer = TextTokenizer::from_file(&vocab_file("split")).unwrap();
        assert_eq!(tokenizer.encode("今日は").unwrap(), vec![2, 5, 6, 3]);
    }

    #[test]
    fn test_whitespace_only_text_still_encodes() {
        let tokenizer = TextTokenizer::from_file(&vocab_file("blank")).unwrap();
        assert_eq!(tokenizer.encode("   ").unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_truncation_keeps_sep() {
        let mut tokenizer = TextTokenizer::from_file(&vocab_file("truncate")).unwrap();
        tokenizer.with_truncation(4).unwrap();
        let ids = tokenizer.encode("今日は今日は今日は").unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids.first(), Some(&2));
        assert_eq!(ids.last(), Some(&3));
    }

    #[test]
    fn test_segmenter_normalizes_full_width() {
        let segmenter = WordSegmenter::unidic().unwrap();
        let words = segmenter.split("ＡＢＣ　今日").unwrap();
        assert!(words.iter().all(|w| !w.trim().is_empty()));
        assert_eq!(words.last().map(String::as_str), Some("今日"));
        assert!(words.concat().starts_with("ABC"));
    }

    #[test]
    fn test_vocab_without_special_tokens() {
        let path = vocab_file("nospecial");
        fs::write(&path, "今日\nは").unwrap();
        assert!(matches!(TextTokenizer::from_file(&path), Err(ClassifierError::BuildError(_))));
    }
}
