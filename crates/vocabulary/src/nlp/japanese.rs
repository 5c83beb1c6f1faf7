use std::fmt;

use lindera::dictionary::{DictionaryKind, load_embedded_dictionary};
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;
use lindera::tokenizer::Tokenizer as LinderaTokenizer;
use wordfreq::WordFreq;

use crate::error::ExtractorError;
use crate::language::{Language, is_katakana, katakana_to_hiragana};

use super::model::LanguageModel;
use super::token::{EntityKind, Pos, Token, zipf_of};

/// Morphological analyser over the embedded IPADIC dictionary, with
/// frequencies from `wordfreq`.
pub struct JapaneseModel {
    tokenizer: LinderaTokenizer,
    frequencies: WordFreq,
}

impl fmt::Debug for JapaneseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JapaneseModel")
            .field("dictionary", &"ipadic")
            .finish_non_exhaustive()
    }
}

impl JapaneseModel {
    pub fn new(frequencies: WordFreq) -> Result<Self, ExtractorError> {
        let dictionary = load_embedded_dictionary(DictionaryKind::IPADIC)
            .map_err(|e| ExtractorError::Unavailable(format!("IPADIC dictionary: {e}")))?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        Ok(Self {
            tokenizer: LinderaTokenizer::new(segmenter),
            frequencies,
        })
    }

    fn zipf(&self, surface: &str, lemma: &str) -> Option<f32> {
        let surface = zipf_of(self.frequencies.word_frequency(surface));
        let lemma = zipf_of(self.frequencies.word_frequency(lemma));
        match (surface, lemma) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

/// IPADIC feature columns: POS and three sub-categories, conjugation type
/// and form, base form, reading, pronunciation.
fn map_pos(details: &[&str]) -> (Pos, Option<EntityKind>) {
    let sub = |i: usize| details.get(i).copied().unwrap_or("*");
    let pos = match details.first().copied().unwrap_or("*") {
        "名詞" => match sub(1) {
            "固有名詞" => {
                let entity = match sub(2) {
                    "組織" => Some(EntityKind::Organization),
                    "地域" => Some(EntityKind::Place),
                    "一般" => Some(EntityKind::Product),
                    _ => None,
                };
                return (Pos::ProperNoun, entity);
            }
            "数" => Pos::Number,
            "接尾" => Pos::Suffix,
            "代名詞" => Pos::Pronoun,
            "形容動詞語幹" => Pos::Adjective,
            "非自立" | "特殊" | "動詞非自立的" => Pos::Other,
            "接続詞的" => Pos::Conjunction,
            _ => Pos::Noun,
        },
        "動詞" => match sub(1) {
            "非自立" => Pos::Auxiliary,
            "接尾" => Pos::Suffix,
            _ => Pos::Verb,
        },
        "形容詞" => match sub(1) {
            "非自立" => Pos::Auxiliary,
            _ => Pos::Adjective,
        },
        "助動詞" => Pos::Auxiliary,
        "助詞" => Pos::Particle,
        "副詞" => Pos::Adverb,
        "連体詞" => Pos::Determiner,
        "接続詞" => Pos::Conjunction,
        "感動詞" | "フィラー" => Pos::Interjection,
        "接頭詞" => Pos::Prefix,
        "記号" => Pos::Punctuation,
        _ => Pos::Other,
    };
    (pos, None)
}

fn is_katakana_word(surface: &str) -> bool {
    surface.chars().all(|c| is_katakana(c) || c == 'ー')
}

impl LanguageModel for JapaneseModel {
    fn language(&self) -> Language {
        Language::Japanese
    }

    fn name(&self) -> &str {
        "lindera-ipadic"
    }

    fn analyze(&self, text: &str) -> Result<Vec<Token>, ExtractorError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut analysed = self
            .tokenizer
            .tokenize(text)
            .map_err(|e| ExtractorError::Failed(format!("tokenizer: {e}")))?;

        let mut tokens = Vec::with_capacity(analysed.len());
        for token in analysed.iter_mut() {
            let surface = token.surface.to_string();
            if surface.trim().is_empty() {
                continue;
            }
            let span = token.byte_start..token.byte_end;
            let details = token.details();
            let (pos, entity) = map_pos(&details);

            let field = |i: usize| details.get(i).copied().filter(|v| !v.is_empty() && *v != "*");
            let known = details.first().is_some_and(|p| *p != "UNK") && field(7).is_some();
            let lemma = field(6).unwrap_or(surface.as_str()).to_string();
            let reading = match field(7) {
                Some(kana) => Some(katakana_to_hiragana(kana)),
                None if is_katakana_word(&surface) => Some(katakana_to_hiragana(&surface)),
                None => None,
            };

            tokens.push(Token {
                zipf: self.zipf(&surface, &lemma),
                surface,
                lemma,
                pos,
                known,
                reading,
                entity,
                span,
            });
        }
        Ok(tokens)
    }
}
