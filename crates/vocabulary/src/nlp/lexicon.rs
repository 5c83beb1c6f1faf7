use std::collections::HashMap;

use rust_stemmers::Stemmer;

use crate::error::ExtractorError;

use super::token::{EntityKind, Pos};

#[derive(Debug, Clone, PartialEq)]
pub struct LexEntry {
    pub lemma: String,
    /// Allowed tags, most likely first.
    pub pos: Vec<Pos>,
    pub entity: Option<EntityKind>,
}

impl LexEntry {
    pub fn primary_pos(&self) -> Pos {
        self.pos.first().copied().unwrap_or(Pos::Other)
    }

    pub fn allows(&self, pos: Pos) -> bool {
        self.pos.contains(&pos)
    }
}

/// Part-of-speech dictionary for English surface forms.
///
/// Format: one entry per line, tab separated `surface lemma POS[|POS] entity`,
/// `*` for no entity label and `#` for comment lines. The first entry for a
/// surface wins. Entries are also indexed by Snowball stem so inflections
/// missing from the file still find their base entry.
#[derive(Debug, Clone, Default)]
pub struct PosLexicon {
    entries: HashMap<String, LexEntry>,
    stems: HashMap<String, String>,
}

impl PosLexicon {
    pub fn parse(source: &str, name: &str, stemmer: &Stemmer) -> Result<Self, ExtractorError> {
        let mut lexicon = PosLexicon::default();
        for (line_no, line) in source.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let bad = |msg: String| ExtractorError::Unavailable(format!("{name}:{}: {msg}", line_no + 1));
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 4 {
                return Err(bad(format!("expected 4 columns, found {}", fields.len())));
            }
            let pos = fields[2]
                .split('|')
                .map(str::parse::<Pos>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(bad)?;
            let entity = match fields[3] {
                "*" | "" => None,
                label => Some(label.parse::<EntityKind>().map_err(bad)?),
            };

            let surface = fields[0].to_lowercase();
            lexicon
                .stems
                .entry(stemmer.stem(&surface).into_owned())
                .or_insert_with(|| surface.clone());
            lexicon.entries.entry(surface).or_insert(LexEntry {
                lemma: fields[1].to_string(),
                pos,
                entity,
            });
        }

        if lexicon.entries.is_empty() {
            return Err(ExtractorError::Unavailable(format!("{name}: lexicon is empty")));
        }
        Ok(lexicon)
    }

    pub fn get(&self, surface: &str) -> Option<&LexEntry> {
        self.entries.get(surface)
    }

    /// Entry whose surface shares `stem`.
    pub fn get_by_stem(&self, stem: &str) -> Option<&LexEntry> {
        self.stems.get(stem).and_then(|surface| self.entries.get(surface))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_stemmers::Algorithm;

    use super::*;

    fn stemmer() -> Stemmer {
        Stemmer::create(Algorithm::English)
    }

    #[test]
    fn test_parse_entries() {
        let source = "# comment\nstream\tstream\tNOUN|VERB\t*\n\nTwitch\tTwitch\tPROPN\tORG\n";
        let lexicon = PosLexicon::parse(source, "test", &stemmer()).unwrap();
        assert_eq!(lexicon.len(), 2);
        let stream = lexicon.get("stream").unwrap();
        assert_eq!(stream.primary_pos(), Pos::Noun);
        assert!(stream.allows(Pos::Verb));
        let twitch = lexicon.get("twitch").unwrap();
        assert_eq!(twitch.entity, Some(EntityKind::Organization));
        assert_eq!(twitch.lemma, "Twitch");
    }

    #[test]
    fn test_stem_index() {
        let lexicon = PosLexicon::parse("subscribe\tsubscribe\tVERB\t*\n", "test", &stemmer()).unwrap();
        let stemmed = stemmer().stem("subscribing").into_owned();
        assert_eq!(lexicon.get_by_stem(&stemmed).unwrap().lemma, "subscribe");
    }

    #[test]
    fn test_first_entry_wins() {
        let source = "ok\tokay\tINTJ\t*\nok\tok\tADJ\t*\n";
        let lexicon = PosLexicon::parse(source, "test", &stemmer()).unwrap();
        assert_eq!(lexicon.get("ok").unwrap().lemma, "okay");
    }

    #[test]
    fn test_malformed_lines_are_unavailable() {
        for source in ["a\tb\tNOUN\n", "a\ta\tWHAT\t*\n", "a\ta\tPROPN\tPERSON\n", "# only\n"] {
            assert!(matches!(
                PosLexicon::parse(source, "bad", &stemmer()),
                Err(ExtractorError::Unavailable(_))
            ));
        }
    }

    #[test]
    fn test_builtin_lexicon_parses() {
        let lexicon = PosLexicon::parse(include_str!("../../data/pos_en.tsv"), "en", &stemmer()).unwrap();
        assert_eq!(lexicon.get("bought").unwrap().lemma, "buy");
        assert_eq!(lexicon.get("water").unwrap().primary_pos(), Pos::Noun);
        assert_eq!(lexicon.get("drink").unwrap().primary_pos(), Pos::Verb);
    }
}
