use std::ops::Range;
use std::str::FromStr;

/// Coarse part-of-speech tags, a subset of the Universal Dependencies set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pos {
    Noun,
    ProperNoun,
    Pronoun,
    Verb,
    Auxiliary,
    Adjective,
    Adverb,
    Particle,
    Adposition,
    Determiner,
    Conjunction,
    Interjection,
    Prefix,
    Suffix,
    Number,
    Punctuation,
    Symbol,
    Other,
}

impl Pos {
    /// Open-class words that can carry learnable meaning on their own.
    pub fn is_content(self) -> bool {
        matches!(
            self,
            Pos::Noun | Pos::ProperNoun | Pos::Verb | Pos::Adjective | Pos::Adverb
        )
    }

    pub fn is_nominal(self) -> bool {
        matches!(self, Pos::Noun | Pos::ProperNoun)
    }
}

impl FromStr for Pos {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NOUN" => Pos::Noun,
            "PROPN" => Pos::ProperNoun,
            "PRON" => Pos::Pronoun,
            "VERB" => Pos::Verb,
            "AUX" => Pos::Auxiliary,
            "ADJ" => Pos::Adjective,
            "ADV" => Pos::Adverb,
            "PART" => Pos::Particle,
            "ADP" => Pos::Adposition,
            "DET" => Pos::Determiner,
            "CONJ" | "CCONJ" | "SCONJ" => Pos::Conjunction,
            "INTJ" => Pos::Interjection,
            "PREFIX" => Pos::Prefix,
            "SUFFIX" => Pos::Suffix,
            "NUM" => Pos::Number,
            "PUNCT" => Pos::Punctuation,
            "SYM" => Pos::Symbol,
            "X" => Pos::Other,
            other => return Err(format!("unknown POS tag {other:?}")),
        })
    }
}

/// Named-entity classes worth studying. People are never tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Organization,
    Place,
    Event,
    Facility,
    Product,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Organization => "organization",
            EntityKind::Place => "place",
            EntityKind::Event => "event",
            EntityKind::Facility => "facility",
            EntityKind::Product => "product",
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ORG" => EntityKind::Organization,
            "GPE" | "LOC" => EntityKind::Place,
            "EVENT" => EntityKind::Event,
            "FAC" => EntityKind::Facility,
            "PRODUCT" => EntityKind::Product,
            other => return Err(format!("unknown entity label {other:?}")),
        })
    }
}

/// One analysed word.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub surface: String,
    pub lemma: String,
    pub pos: Pos,
    /// The tag came from a dictionary rather than a guess.
    pub known: bool,
    /// Hiragana reading, Japanese only.
    pub reading: Option<String>,
    /// Zipf frequency (log10 of occurrences per billion words); `None` for
    /// words the frequency list has never seen.
    pub zipf: Option<f32>,
    pub entity: Option<EntityKind>,
    /// Byte range within the analysed text.
    pub span: Range<usize>,
}

impl Token {
    /// A token of the given tag with no dictionary backing.
    pub fn guessed(surface: &str, pos: Pos, span: Range<usize>) -> Self {
        Self {
            surface: surface.to_string(),
            lemma: surface.to_string(),
            pos,
            known: false,
            reading: None,
            zipf: None,
            entity: None,
            span,
        }
    }
}

/// Converts a relative word frequency to the Zipf scale.
pub fn zipf_of(frequency: f32) -> Option<f32> {
    (frequency > 0.0).then(|| (frequency.log10() + 9.0).max(0.0))
}
