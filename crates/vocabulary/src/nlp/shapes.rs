//! Multi-token shape detection over a tagged single-language run.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::candidate::{CandidateExpression, DifficultyHint, ExpressionType, ExtractorKind};
use crate::language::Language;

use super::idioms::Idiom;
use super::token::{Pos, Token};

/// Particles that turn a verb into a phrasal verb.
const PHRASAL_PARTICLES: &[&str] = &[
    "up", "down", "in", "out", "on", "off", "over", "under", "away", "back", "through", "along",
    "across", "by", "forward", "around",
];

/// Beginner vocabulary that is never worth a card on its own.
const SKIP_WORDS: &[&str] = &[
    "good", "bad", "big", "small", "new", "old", "great", "little", "nice", "right", "first",
    "last", "long", "other", "own", "thing", "things", "way", "time", "day", "people", "man",
    "year", "get", "go", "make", "do", "have", "be", "say", "see", "know", "think", "take", "come",
    "want", "look", "use", "like", "just", "very", "really", "now", "then", "here", "there", "so",
    "also", "too", "much", "lot", "well", "yes", "yeah", "okay", "oh", "する", "ある", "いる",
    "なる", "こと", "もの", "事", "物", "人", "いい", "良い", "今", "今日",
];

/// Japanese auxiliaries that follow the て particle, with their meaning.
const TE_AUXILIARIES: &[(&str, &str)] = &[
    ("いる", "ongoing action or resulting state (〜ている)"),
    ("いく", "continuing from now on (〜ていく)"),
    ("くる", "change leading up to now (〜てくる)"),
    ("みる", "try doing (〜てみる)"),
    ("しまう", "completion or regret (〜てしまう)"),
    ("おく", "doing in advance (〜ておく)"),
];

/// Contracted forms that absorb the て particle.
const CONTRACTED_AUXILIARIES: &[(&str, &str)] = &[
    ("てる", "ongoing action, casual (〜てる)"),
    ("ちゃう", "completion or regret, casual (〜ちゃう)"),
    ("とく", "doing in advance, casual (〜とく)"),
];

/// Everything a shape detector needs about one run.
pub(crate) struct ShapeContext<'a> {
    pub text: &'a str,
    pub tokens: &'a [Token],
    pub language: Language,
    pub idioms: &'a [Idiom],
    pub min_pmi: f64,
    pub max_word_zipf: f32,
}

/// Runs every detector. Spans are relative to `ctx.text`.
pub(crate) fn find_all(ctx: &ShapeContext<'_>) -> Vec<CandidateExpression> {
    let mut found = idioms(ctx);
    match ctx.language {
        Language::English => found.extend(phrasal_verbs(ctx)),
        Language::Japanese => found.extend(grammar_patterns(ctx)),
        Language::Mixed => {}
    }
    found.extend(collocations(ctx));
    found.extend(compounds(ctx));
    found.extend(entities(ctx));
    found.extend(common_words(ctx));
    found
}

fn is_skip_word(lemma: &str) -> bool {
    SKIP_WORDS.contains(&lemma)
}

/// The tag is backed by a dictionary, or the word carries its own reading.
fn is_attested(token: &Token) -> bool {
    token.known || token.reading.is_some()
}

/// Rarest Zipf frequency among content tokens; `None` if any of them is
/// missing from the frequency list.
fn zipf_hint(tokens: &[Token]) -> Option<f32> {
    let content: Vec<&Token> = tokens.iter().filter(|t| t.pos.is_content()).collect();
    let scored: Vec<&Token> = if content.is_empty() {
        tokens.iter().filter(|t| t.pos != Pos::Punctuation).collect()
    } else {
        content
    };
    let mut min: Option<f32> = None;
    for token in scored {
        let zipf = token.zipf?;
        min = Some(min.map_or(zipf, |m| m.min(zipf)));
    }
    min
}

/// Concatenated reading, when every token has one.
fn reading(tokens: &[Token]) -> Option<String> {
    tokens.iter().map(|t| t.reading.as_deref()).collect::<Option<String>>()
}

fn span_of(tokens: &[Token]) -> Range<usize> {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => first.span.start..last.span.end,
        _ => 0..0,
    }
}

fn build(
    ctx: &ShapeContext<'_>,
    tokens: &[Token],
    span: Range<usize>,
    text: String,
    expression_type: ExpressionType,
) -> CandidateExpression {
    let mut candidate = CandidateExpression::new(
        text,
        ctx.language,
        ExtractorKind::Nlp,
        expression_type,
        0,
        span,
        DifficultyHint::Frequency(zipf_hint(tokens)),
    );
    if ctx.language == Language::Japanese {
        candidate.reading = reading(tokens);
    }
    candidate
}

/// `build` over a contiguous token run, using the covered source text.
fn build_run(ctx: &ShapeContext<'_>, tokens: &[Token], expression_type: ExpressionType) -> CandidateExpression {
    let span = span_of(tokens);
    let text = ctx.text[span.clone()].to_string();
    build(ctx, tokens, span, text, expression_type)
}

fn idioms(ctx: &ShapeContext<'_>) -> Vec<CandidateExpression> {
    let mut found = Vec::new();
    for idiom in ctx.idioms {
        for m in idiom.regex.find_iter(ctx.text).filter(|m| !m.is_empty()) {
            let inside: Vec<Token> = ctx
                .tokens
                .iter()
                .filter(|t| t.span.start >= m.start() && t.span.end <= m.end())
                .cloned()
                .collect();
            let covered: usize = inside.iter().map(|t| t.span.len()).sum();
            let mut candidate = build(
                ctx,
                &inside,
                m.range(),
                m.as_str().to_string(),
                ExpressionType::Idiom,
            )
            .with_tags(idiom.tags.iter().cloned())
            .with_note("Idiomatic expression - meaning may not be literal");
            // A reading is only meaningful if the tokens span the whole match.
            if covered != m.len() {
                candidate.reading = None;
            }
            candidate.gloss_hint = idiom.gloss.clone();
            found.push(candidate);
        }
    }
    found
}

/// Verb, optional object pronoun, then a particle: "pick it up" ⇒ "pick up".
fn phrasal_verbs(ctx: &ShapeContext<'_>) -> Vec<CandidateExpression> {
    let tokens = ctx.tokens;
    let mut found = Vec::new();
    for (i, verb) in tokens.iter().enumerate() {
        if verb.pos != Pos::Verb || !verb.known {
            continue;
        }
        let mut j = i + 1;
        if tokens.get(j).is_some_and(|t| t.pos == Pos::Pronoun) {
            j += 1;
        }
        let Some(particle) = tokens.get(j) else {
            continue;
        };
        let is_particle = matches!(particle.pos, Pos::Adposition | Pos::Adverb | Pos::Particle)
            && PHRASAL_PARTICLES.contains(&particle.lemma.as_str());
        if !is_particle {
            continue;
        }
        let unit = &tokens[i..=j];
        found.push(
            build(
                ctx,
                unit,
                span_of(unit),
                format!("{} {}", verb.lemma, particle.lemma),
                ExpressionType::PhrasalVerb,
            )
            .with_note(format!("Phrasal verb: {} + {}", verb.lemma, particle.lemma)),
        );
    }
    found
}

/// Verb + て + auxiliary, or verb + contracted auxiliary, with any trailing
/// auxiliaries: 頑張っていきます, 見てる, 忘れちゃった.
fn grammar_patterns(ctx: &ShapeContext<'_>) -> Vec<CandidateExpression> {
    let tokens = ctx.tokens;
    let mut found = Vec::new();
    for (i, verb) in tokens.iter().enumerate() {
        if verb.pos != Pos::Verb {
            continue;
        }
        let te = tokens
            .get(i + 1)
            .is_some_and(|t| t.pos == Pos::Particle && matches!(t.surface.as_str(), "て" | "で"));
        let (gloss, mut end) = if te {
            match auxiliary_gloss(TE_AUXILIARIES, tokens.get(i + 2)) {
                Some(gloss) => (gloss, i + 3),
                None => continue,
            }
        } else {
            match auxiliary_gloss(CONTRACTED_AUXILIARIES, tokens.get(i + 1)) {
                Some(gloss) => (gloss, i + 2),
                None => continue,
            }
        };
        while tokens.get(end).is_some_and(|t| t.pos == Pos::Auxiliary) {
            end += 1;
        }
        found.push(
            build_run(ctx, &tokens[i..end], ExpressionType::GrammarPattern)
                .with_gloss_hint(gloss)
                .with_tags(["grammar"]),
        );
    }
    found
}

fn auxiliary_gloss(table: &[(&str, &'static str)], token: Option<&Token>) -> Option<&'static str> {
    let token = token.filter(|t| t.pos == Pos::Auxiliary)?;
    table
        .iter()
        .find(|(lemma, _)| *lemma == token.lemma)
        .map(|(_, gloss)| *gloss)
}

/// Adjective + noun, both taken from the dictionary, with at least one of
/// them beyond beginner vocabulary.
fn is_collocation_pair(first: &Token, second: &Token) -> bool {
    first.pos == Pos::Adjective
        && second.pos == Pos::Noun
        && first.known
        && is_attested(second)
        && !(is_skip_word(&first.lemma) && is_skip_word(&second.lemma))
}

/// Adjacent adjective-noun pairs whose in-text PMI clears the threshold.
fn collocations(ctx: &ShapeContext<'_>) -> Vec<CandidateExpression> {
    let tokens = ctx.tokens;
    let content: Vec<&str> = tokens
        .iter()
        .filter(|t| t.pos.is_content())
        .map(|t| t.lemma.as_str())
        .collect();
    let total = content.len() as f64;
    let mut unigrams: HashMap<&str, usize> = HashMap::new();
    for &lemma in &content {
        *unigrams.entry(lemma).or_default() += 1;
    }

    let pairs: Vec<usize> = (0..tokens.len().saturating_sub(1))
        .filter(|&i| is_collocation_pair(&tokens[i], &tokens[i + 1]))
        .collect();
    let mut bigrams: HashMap<(&str, &str), usize> = HashMap::new();
    for &i in &pairs {
        *bigrams
            .entry((tokens[i].lemma.as_str(), tokens[i + 1].lemma.as_str()))
            .or_default() += 1;
    }

    let mut found = Vec::new();
    for i in pairs {
        let (a, b) = (tokens[i].lemma.as_str(), tokens[i + 1].lemma.as_str());
        let joint = bigrams.get(&(a, b)).copied().unwrap_or(0) as f64;
        let denom = (unigrams.get(a).copied().unwrap_or(1) * unigrams.get(b).copied().unwrap_or(1)) as f64;
        let pmi = (joint * total / denom).log2();
        if pmi < ctx.min_pmi {
            continue;
        }
        found.push(
            build_run(ctx, &tokens[i..=i + 1], ExpressionType::Collocation)
                .with_note(format!("Common collocation with '{b}'")),
        );
    }
    found
}

/// Noun chains taken from the dictionary; Japanese chains may also carry a
/// prefix, suffixes and numbers. All-proper-noun chains are left to the
/// entity detector.
fn compounds(ctx: &ShapeContext<'_>) -> Vec<CandidateExpression> {
    let tokens = ctx.tokens;
    let japanese = ctx.language == Language::Japanese;
    let starts = |t: &Token| t.pos.is_nominal() || (japanese && matches!(t.pos, Pos::Number | Pos::Prefix));
    let continues = |t: &Token| t.pos.is_nominal() || (japanese && matches!(t.pos, Pos::Suffix | Pos::Number));

    let mut found = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if !starts(&tokens[i]) {
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < tokens.len() && continues(&tokens[end]) {
            end += 1;
        }
        let chain = &tokens[i..end];
        let nouns = chain.iter().filter(|t| t.pos == Pos::Noun).count();
        let attested = chain.iter().all(|t| t.pos == Pos::Number || is_attested(t));
        let shaped = if japanese {
            nouns >= 1
        } else {
            nouns == chain.len() && chain.iter().all(|t| t.known)
        };
        if chain.len() >= 2 && attested && shaped {
            found.push(build_run(ctx, chain, ExpressionType::Compound));
        }
        i = end;
    }
    found
}

/// Runs of proper nouns with at least one organization, place, event,
/// facility or product among them. Names of people are never tagged.
fn entities(ctx: &ShapeContext<'_>) -> Vec<CandidateExpression> {
    let tokens = ctx.tokens;
    let mut found = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].pos != Pos::ProperNoun {
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < tokens.len() && tokens[end].pos == Pos::ProperNoun {
            end += 1;
        }
        let run = &tokens[i..end];
        if let Some(kind) = run.iter().find_map(|t| t.entity) {
            let mut candidate = build_run(ctx, run, ExpressionType::Entity)
                .with_note(format!("Named entity ({})", kind.as_str()));
            candidate.entity = Some(kind);
            found.push(candidate);
        }
        i = end;
    }
    found
}

/// Single content words rarer than the configured Zipf frequency, or
/// absent from the frequency list.
fn common_words(ctx: &ShapeContext<'_>) -> Vec<CandidateExpression> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for token in ctx.tokens {
        if !token.pos.is_content() || token.pos == Pos::ProperNoun || is_skip_word(&token.lemma) {
            continue;
        }
        let chars = token.surface.chars().count();
        let rare = token.zipf.is_none_or(|z| z < ctx.max_word_zipf);
        let eligible = match ctx.language {
            Language::English => {
                chars >= 3
                    && token.surface.chars().all(char::is_alphabetic)
                    && (token.zipf.is_some() || chars >= 4)
            }
            Language::Japanese => chars >= 2 && is_attested(token),
            Language::Mixed => false,
        };
        if !rare || !eligible || !seen.insert(token.lemma.as_str()) {
            continue;
        }
        // Inflected words are listed under their dictionary form; the
        // reading is filled in later from the lemma.
        let inflected = token.lemma != token.surface;
        let text = match ctx.language {
            Language::English => token.lemma.to_lowercase(),
            _ => token.lemma.clone(),
        };
        let mut candidate = build(
            ctx,
            std::slice::from_ref(token),
            token.span.clone(),
            text,
            ExpressionType::Common,
        );
        if inflected {
            candidate.reading = None;
        }
        found.push(candidate);
    }
    found
}
