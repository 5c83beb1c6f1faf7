use std::fmt;
use std::ops::Range;

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;
use wordfreq::WordFreq;

use crate::error::ExtractorError;
use crate::language::{Language, is_latin};

use super::lexicon::{LexEntry, PosLexicon};
use super::model::LanguageModel;
use super::token::{Pos, Token, zipf_of};

/// English analyser: UAX #29 word segmentation, a part-of-speech lexicon
/// reached through inflection stripping or the Snowball stem, and corpus
/// frequencies from `wordfreq`.
pub struct EnglishModel {
    lexicon: PosLexicon,
    frequencies: WordFreq,
    stemmer: Stemmer,
}

impl fmt::Debug for EnglishModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnglishModel")
            .field("lexicon", &self.lexicon.len())
            .finish_non_exhaustive()
    }
}

struct Tagged {
    token: Token,
    allowed: Vec<Pos>,
}

impl EnglishModel {
    pub fn new(lexicon_source: &str, frequencies: WordFreq) -> Result<Self, ExtractorError> {
        let stemmer = Stemmer::create(Algorithm::English);
        let lexicon = PosLexicon::parse(lexicon_source, "pos_en.tsv", &stemmer)?;
        Ok(Self {
            lexicon,
            frequencies,
            stemmer,
        })
    }

    fn zipf(&self, word: &str) -> Option<f32> {
        zipf_of(self.frequencies.word_frequency(word))
    }

    fn tag_word(&self, word: &str, offset: usize, sentence_start: bool) -> Tagged {
        let span = offset..offset + word.len();
        let lower = word.to_lowercase().replace('\u{2019}', "'");

        let found = self
            .lexicon
            .get(&lower)
            .map(|entry| (entry, entry.primary_pos()))
            .or_else(|| self.lookup_inflected(&lower))
            .or_else(|| {
                self.lexicon
                    .get_by_stem(&self.stemmer.stem(&lower))
                    .map(|entry| (entry, entry.primary_pos()))
            });
        if let Some((entry, pos)) = found {
            return self.known(word, &lower, span, entry, pos);
        }

        let pos = if !word.chars().any(is_latin) {
            Pos::Other
        } else if !sentence_start && word.chars().next().is_some_and(char::is_uppercase) {
            Pos::ProperNoun
        } else {
            guess_by_suffix(&lower)
        };
        let mut token = Token::guessed(word, pos, span);
        token.zipf = self.zipf(&lower);
        token.lemma = lower;
        Tagged {
            token,
            allowed: vec![pos],
        }
    }

    fn known(&self, word: &str, lower: &str, span: Range<usize>, entry: &LexEntry, pos: Pos) -> Tagged {
        let zipf = match (self.zipf(lower), self.zipf(&entry.lemma.to_lowercase())) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        Tagged {
            token: Token {
                surface: word.to_string(),
                lemma: entry.lemma.clone(),
                pos,
                known: true,
                reading: None,
                zipf,
                entity: entry.entity.filter(|_| pos == Pos::ProperNoun),
                span,
            },
            allowed: entry.pos.clone(),
        }
    }

    /// Prefers a base whose entry allows the tag the suffix implies, so
    /// "using" resolves to "use" rather than "us".
    fn lookup_inflected(&self, lower: &str) -> Option<(&LexEntry, Pos)> {
        let bases = inflection_bases(lower);
        bases
            .iter()
            .find_map(|(base, expected)| {
                self.lexicon
                    .get(base)
                    .filter(|entry| entry.allows(*expected))
                    .map(|entry| (entry, *expected))
            })
            .or_else(|| {
                bases.iter().find_map(|(base, _)| {
                    self.lexicon.get(base).map(|entry| (entry, entry.primary_pos()))
                })
            })
    }
}

/// Candidate base forms for an inflected word, most specific first.
fn inflection_bases(word: &str) -> Vec<(String, Pos)> {
    let mut bases = Vec::new();
    if let Some(stem) = word.strip_suffix("'s") {
        bases.push((stem.to_string(), Pos::Noun));
    }
    if let Some(stem) = word.strip_suffix("ing").filter(|s| s.len() >= 2) {
        push_verb_stems(&mut bases, stem);
    }
    if let Some(stem) = word.strip_suffix("ed").filter(|s| s.len() >= 2) {
        bases.push((word[..word.len() - 1].to_string(), Pos::Verb));
        push_verb_stems(&mut bases, stem);
    }
    if let Some(stem) = word.strip_suffix("ies").filter(|s| s.len() >= 2) {
        bases.push((format!("{stem}y"), Pos::Noun));
    }
    if let Some(stem) = word.strip_suffix("es").filter(|s| s.len() >= 2) {
        bases.push((stem.to_string(), Pos::Noun));
    }
    if let Some(stem) = word.strip_suffix('s').filter(|s| s.len() >= 2 && !s.ends_with('s')) {
        bases.push((stem.to_string(), Pos::Noun));
    }
    bases
}

fn push_verb_stems(bases: &mut Vec<(String, Pos)>, stem: &str) {
    bases.push((stem.to_string(), Pos::Verb));
    bases.push((format!("{stem}e"), Pos::Verb));
    let mut chars = stem.chars().rev();
    if let (Some(last), Some(prev)) = (chars.next(), chars.next()) {
        if last == prev && !"aeiou".contains(last) {
            bases.push((stem[..stem.len() - last.len_utf8()].to_string(), Pos::Verb));
        }
    }
}

fn guess_by_suffix(word: &str) -> Pos {
    const ADJ: &[&str] = &["ous", "ful", "ive", "able", "ible", "al", "ic", "less"];
    const NOUN: &[&str] = &["tion", "sion", "ness", "ment", "ity", "ship", "ism"];
    if word.chars().all(|c| c.is_ascii_digit()) {
        Pos::Number
    } else if word.ends_with("ly") {
        Pos::Adverb
    } else if word.ends_with("ing") || word.ends_with("ed") || word.ends_with("ize") {
        Pos::Verb
    } else if NOUN.iter().any(|s| word.ends_with(s)) {
        Pos::Noun
    } else if ADJ.iter().any(|s| word.ends_with(s)) {
        Pos::Adjective
    } else {
        Pos::Noun
    }
}

fn is_sentence_end(word: &str) -> bool {
    matches!(word, "." | "!" | "?" | "…")
}

impl LanguageModel for EnglishModel {
    fn language(&self) -> Language {
        Language::English
    }

    fn name(&self) -> &str {
        "english-wordfreq"
    }

    fn analyze(&self, text: &str) -> Result<Vec<Token>, ExtractorError> {
        let mut tagged: Vec<Tagged> = Vec::new();
        let mut sentence_start = true;

        for (offset, word) in text.split_word_bound_indices() {
            if word.chars().all(char::is_whitespace) {
                continue;
            }
            if !word.chars().any(char::is_alphanumeric) {
                tagged.push(Tagged {
                    token: Token::guessed(word, Pos::Punctuation, offset..offset + word.len()),
                    allowed: vec![Pos::Punctuation],
                });
                if is_sentence_end(word) {
                    sentence_start = true;
                }
                continue;
            }
            tagged.push(self.tag_word(word, offset, sentence_start));
            sentence_start = false;
        }

        // Disambiguate words the lexicon lists under several tags.
        for i in 1..tagged.len() {
            if tagged[i].allowed.len() < 2 {
                continue;
            }
            let prev = &tagged[i - 1].token;
            let wants = match prev.pos {
                Pos::Determiner | Pos::Adjective => Some(Pos::Noun),
                Pos::Pronoun | Pos::Auxiliary => Some(Pos::Verb),
                Pos::Particle if prev.lemma == "to" => Some(Pos::Verb),
                _ => None,
            };
            if let Some(pos) = wants.filter(|p| tagged[i].allowed.contains(p)) {
                tagged[i].token.pos = pos;
            }
        }

        Ok(tagged.into_iter().map(|t| t.token).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::model::shared_models;

    fn analyze(text: &str) -> Vec<Token> {
        shared_models().model_for(Language::English).unwrap().analyze(text).unwrap()
    }

    fn find<'a>(tokens: &'a [Token], surface: &str) -> &'a Token {
        tokens.iter().find(|t| t.surface == surface).unwrap()
    }

    #[test]
    fn test_adjective_noun() {
        let tokens = analyze("good stream!");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].pos, Pos::Adjective);
        assert_eq!(tokens[1].pos, Pos::Noun);
        assert!(tokens[1].known);
        assert!(tokens[1].zipf.is_some());
        assert_eq!(tokens[1].span, 5..11);
        assert_eq!(tokens[2].pos, Pos::Punctuation);
    }

    #[test]
    fn test_context_picks_verb_after_pronoun() {
        let tokens = analyze("we stream every day");
        assert_eq!(tokens[1].pos, Pos::Verb);
        let tokens = analyze("the stream");
        assert_eq!(tokens[1].pos, Pos::Noun);
    }

    #[test]
    fn test_everyday_verbs_and_nouns() {
        let tokens = analyze("we drink water and eat rice every morning");
        assert_eq!(find(&tokens, "drink").pos, Pos::Verb);
        assert_eq!(find(&tokens, "water").pos, Pos::Noun);
        assert_eq!(find(&tokens, "eat").pos, Pos::Verb);
        assert_eq!(find(&tokens, "rice").pos, Pos::Noun);
        // Frequent words sit high on the Zipf scale.
        assert!(find(&tokens, "water").zipf.unwrap() > 4.5);
    }

    #[test]
    fn test_irregular_past_resolves_to_lemma() {
        let tokens = analyze("my mother bought a beautiful dress");
        let bought = find(&tokens, "bought");
        assert_eq!(bought.lemma, "buy");
        assert_eq!(bought.pos, Pos::Verb);
        assert_eq!(find(&tokens, "mother").pos, Pos::Noun);
        assert_eq!(find(&tokens, "beautiful").pos, Pos::Adjective);
    }

    #[test]
    fn test_inflections_resolve_to_lemma() {
        let tokens = analyze("she picked it up while streaming games");
        let picked = &tokens[1];
        assert_eq!(picked.lemma, "pick");
        assert_eq!(picked.pos, Pos::Verb);
        let streaming = find(&tokens, "streaming");
        assert_eq!(streaming.lemma, "stream");
        assert_eq!(streaming.pos, Pos::Verb);
        assert_eq!(find(&tokens, "games").lemma, "game");
    }

    #[test]
    fn test_doubled_consonant_and_silent_e() {
        let tokens = analyze("they were chatting and used it");
        assert_eq!(tokens[2].lemma, "chat");
        assert_eq!(tokens[4].lemma, "use");
    }

    #[test]
    fn test_unknown_words_are_guessed() {
        let tokens = analyze("Honestly the Pekora collab was hilarious");
        let pekora = find(&tokens, "Pekora");
        assert_eq!(pekora.pos, Pos::ProperNoun);
        assert!(!pekora.known);
        assert_eq!(pekora.entity, None);
        let hilarious = find(&tokens, "hilarious");
        assert_eq!(hilarious.pos, Pos::Adjective);
        assert!(!hilarious.known);
    }

    #[test]
    fn test_lexicon_entities() {
        let tokens = analyze("we watched it on Twitch");
        let twitch = find(&tokens, "Twitch");
        assert_eq!(twitch.pos, Pos::ProperNoun);
        assert_eq!(twitch.entity, Some(crate::nlp::token::EntityKind::Organization));
    }

    #[test]
    fn test_capital_at_sentence_start_is_not_proper() {
        let tokens = analyze("Wow. Grinding is fun");
        let grinding = find(&tokens, "Grinding");
        assert_eq!(grinding.lemma, "grind");
        assert_ne!(grinding.pos, Pos::ProperNoun);
    }
}
