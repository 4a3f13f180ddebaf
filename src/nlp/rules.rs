use std::time::Instant;

use regex::Regex;

use super::annotation::{Annotation, Entity, SentenceSpan, Token};
use super::error::AnnotateError;
use super::{svg, Annotator};

/// Default working budget per input, in bytes of text
pub const DEFAULT_TEXT_BUDGET: usize = 1024 * 1024;

/// Closed-class word lists and suffix hints for one language
struct TagTables {
    determiners: &'static [&'static str],
    pronouns: &'static [&'static str],
    adpositions: &'static [&'static str],
    conjunctions: &'static [&'static str],
    auxiliaries: &'static [&'static str],
    adverb_suffixes: &'static [&'static str],
    adjective_suffixes: &'static [&'static str],
    verb_suffixes: &'static [&'static str],
}

static EN_TABLES: TagTables = TagTables {
    determiners: &["the", "a", "an", "this", "that", "these", "those"],
    pronouns: &[
        "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "who",
        "what",
    ],
    adpositions: &[
        "of", "in", "on", "at", "by", "for", "with", "from", "to", "into", "over", "under",
        "about", "after", "before", "between",
    ],
    conjunctions: &["and", "or", "but", "nor", "so", "yet"],
    auxiliaries: &[
        "is", "are", "was", "were", "am", "be", "been", "being", "do", "does", "did", "have",
        "has", "had", "will", "would", "can", "could", "shall", "should", "may", "might", "must",
    ],
    adverb_suffixes: &["ly"],
    adjective_suffixes: &["ous", "ful", "ive", "able", "ible", "ic"],
    verb_suffixes: &["ing", "ed", "ize", "ise"],
};

static NL_TABLES: TagTables = TagTables {
    determiners: &["de", "het", "een", "deze", "die", "dit", "dat"],
    pronouns: &[
        "ik", "jij", "je", "hij", "zij", "ze", "wij", "we", "jullie", "u", "mij", "hem", "haar",
        "ons", "hen", "hun", "wie", "wat",
    ],
    adpositions: &[
        "van", "in", "op", "aan", "bij", "voor", "met", "uit", "naar", "over", "onder", "tussen",
        "na",
    ],
    conjunctions: &["en", "of", "maar", "want", "dus"],
    auxiliaries: &[
        "is", "zijn", "was", "waren", "ben", "bent", "wordt", "worden", "werd", "werden", "heb",
        "hebt", "heeft", "hebben", "had", "hadden", "zal", "zullen", "zou", "zouden", "kan",
        "kunnen", "moet", "moeten", "mag", "mogen",
    ],
    adverb_suffixes: &[],
    adjective_suffixes: &["lijk", "ig", "isch"],
    verb_suffixes: &["en"],
};

static DE_TABLES: TagTables = TagTables {
    determiners: &[
        "der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "einer",
    ],
    pronouns: &[
        "ich", "du", "er", "sie", "es", "wir", "ihr", "mich", "dich", "ihn", "uns", "euch", "wer",
        "was",
    ],
    adpositions: &[
        "von", "in", "auf", "an", "bei", "für", "mit", "aus", "nach", "über", "unter", "zwischen",
    ],
    conjunctions: &["und", "oder", "aber", "denn", "sondern"],
    auxiliaries: &[
        "ist", "sind", "war", "waren", "bin", "bist", "wird", "werden", "wurde", "wurden", "habe",
        "hast", "hat", "haben", "hatte", "hatten", "kann", "können", "muss", "müssen", "soll",
        "sollen", "will", "wollen", "mag", "darf",
    ],
    adverb_suffixes: &[],
    adjective_suffixes: &["lich", "ig", "isch", "bar"],
    verb_suffixes: &["en", "te"],
};

static FR_TABLES: TagTables = TagTables {
    determiners: &["le", "la", "les", "un", "une", "des", "du", "de"],
    pronouns: &[
        "je", "tu", "il", "elle", "nous", "vous", "ils", "elles", "me", "te", "se", "moi", "toi",
        "lui", "qui", "que", "quoi",
    ],
    adpositions: &[
        "à", "dans", "sur", "pour", "avec", "par", "sans", "sous", "entre", "vers", "chez",
    ],
    conjunctions: &["et", "ou", "mais", "donc", "car", "ni"],
    auxiliaries: &[
        "est", "sont", "était", "étaient", "être", "été", "suis", "es", "sera", "seront", "a",
        "ont", "avait", "avaient", "avoir", "eu", "peut", "peuvent", "doit", "doivent", "va",
        "vont",
    ],
    adverb_suffixes: &["ment"],
    adjective_suffixes: &["eux", "euse", "ique", "able", "ible"],
    verb_suffixes: &["er", "ir", "ait", "ent"],
};

static ES_TABLES: TagTables = TagTables {
    determiners: &["el", "la", "los", "las", "un", "una", "unos", "unas"],
    pronouns: &[
        "yo", "tú", "él", "ella", "nosotros", "vosotros", "ellos", "ellas", "me", "te", "se",
        "nos", "os", "quien", "que",
    ],
    adpositions: &[
        "de", "en", "a", "por", "para", "con", "sin", "sobre", "entre", "hacia", "desde", "hasta",
    ],
    conjunctions: &["y", "o", "pero", "sino", "aunque", "ni"],
    auxiliaries: &[
        "es", "son", "era", "eran", "ser", "sido", "soy", "eres", "será", "serán", "está",
        "están", "estaba", "estaban", "estar", "ha", "han", "había", "habían", "haber", "puede",
        "pueden", "debe", "deben", "va", "van",
    ],
    adverb_suffixes: &["mente"],
    adjective_suffixes: &["oso", "osa", "ivo", "iva", "ble", "ico", "ica"],
    verb_suffixes: &["ar", "er", "ir", "aba", "ando", "iendo"],
};

// The multi-language fallback carries no word lists at all. Tagging
// degrades to punctuation, numbers, capitalization and the defaults.
static XX_TABLES: TagTables = TagTables {
    determiners: &[],
    pronouns: &[],
    adpositions: &[],
    conjunctions: &[],
    auxiliaries: &[],
    adverb_suffixes: &[],
    adjective_suffixes: &[],
    verb_suffixes: &[],
};

fn tables_for(language: &str) -> &'static TagTables {
    match language {
        "en" => &EN_TABLES,
        "nl" => &NL_TABLES,
        "de" => &DE_TABLES,
        "fr" => &FR_TABLES,
        "es" => &ES_TABLES,
        _ => &XX_TABLES,
    }
}

/// Deterministic rule-based pipeline.
///
/// Tokenization, tagging, lemmas, head attachment and entity spans all
/// come from small hand-written rules, so the pipeline is cheap to keep
/// resident and needs no model files on disk.
pub struct RuleAnnotator {
    language: String,
    tables: &'static TagTables,
    text_budget: usize,
    email_re: Regex,
    url_re: Regex,
    date_re: Regex,
}

impl RuleAnnotator {
    /// Build a pipeline for the given two-letter language code.
    /// Unknown codes get the generic multi-language tables.
    pub fn new(language: &str) -> Self {
        RuleAnnotator {
            language: language.to_string(),
            tables: tables_for(language),
            text_budget: DEFAULT_TEXT_BUDGET,
            email_re: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
                .expect("hardcoded pattern is valid"),
            url_re: Regex::new(r"(?:https?://|www\.)[^\s]+").expect("hardcoded pattern is valid"),
            date_re: Regex::new(r"\b\d{4}-\d{2}-\d{2}\b|\b\d{1,2}/\d{1,2}/\d{2,4}\b")
                .expect("hardcoded pattern is valid"),
        }
    }

    /// Override the per-input working budget in bytes
    pub fn with_text_budget(mut self, bytes: usize) -> Self {
        self.text_budget = bytes;
        self
    }

    fn tag_word(&self, word: &str, sentence_initial: bool) -> &'static str {
        if !word.chars().next().is_some_and(char::is_alphanumeric) {
            return "PUNCT";
        }
        if word.chars().all(|c| c.is_ascii_digit()) {
            return "NUM";
        }
        let lower = word.to_lowercase();
        let tables = self.tables;
        if tables.determiners.contains(&lower.as_str()) {
            return "DET";
        }
        if tables.pronouns.contains(&lower.as_str()) {
            return "PRON";
        }
        if tables.adpositions.contains(&lower.as_str()) {
            return "ADP";
        }
        if tables.conjunctions.contains(&lower.as_str()) {
            return "CCONJ";
        }
        if tables.auxiliaries.contains(&lower.as_str()) {
            return "AUX";
        }
        if !sentence_initial && word.chars().next().is_some_and(char::is_uppercase) {
            return "PROPN";
        }
        let suffix_match = |suffixes: &'static [&'static str]| {
            suffixes
                .iter()
                .copied()
                .any(|s| lower.ends_with(s) && lower.len() > s.len())
        };
        if suffix_match(tables.adverb_suffixes) {
            return "ADV";
        }
        if suffix_match(tables.adjective_suffixes) {
            return "ADJ";
        }
        if suffix_match(tables.verb_suffixes) {
            return "VERB";
        }
        "NOUN"
    }

    fn lemma_of(&self, word: &str, pos: &str) -> String {
        let lower = word.to_lowercase();
        if self.language == "en" {
            match lower.as_str() {
                "is" | "are" | "was" | "were" | "am" | "been" | "being" => return "be".to_string(),
                "has" | "had" => return "have".to_string(),
                _ => {}
            }
            if pos == "NOUN" && lower.len() > 3 && lower.ends_with('s') && !lower.ends_with("ss") {
                return lower[..lower.len() - 1].to_string();
            }
        }
        lower
    }

    fn extract_entities(&self, text: &str, tokens: &[Token]) -> Vec<Entity> {
        let mut entities: Vec<Entity> = Vec::new();
        for (re, label) in [
            (&self.url_re, "URL"),
            (&self.email_re, "EMAIL"),
            (&self.date_re, "DATE"),
        ] {
            for m in re.find_iter(text) {
                if !overlaps_any(&entities, m.start(), m.end()) {
                    entities.push(Entity {
                        text: m.as_str().to_string(),
                        label: label.to_string(),
                        start: m.start(),
                        end: m.end(),
                    });
                }
            }
        }

        // Adjacent PROPN tokens collapse into one NAME span. Punctuation
        // between words breaks adjacency because it is its own token.
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].pos == "PROPN" {
                let mut j = i;
                while j + 1 < tokens.len() && tokens[j + 1].pos == "PROPN" {
                    j += 1;
                }
                let start = tokens[i].start;
                let end = tokens[j].start + tokens[j].text.len();
                if !overlaps_any(&entities, start, end) {
                    entities.push(Entity {
                        text: text[start..end].to_string(),
                        label: "NAME".to_string(),
                        start,
                        end,
                    });
                }
                i = j + 1;
            } else {
                i += 1;
            }
        }

        entities.sort_by_key(|e| e.start);
        entities
    }
}

impl Annotator for RuleAnnotator {
    fn annotate(&self, text: &str, want_svg: bool) -> Result<Annotation, AnnotateError> {
        if text.len() > self.text_budget {
            return Err(AnnotateError::ResourceExhausted {
                detail: format!(
                    "input of {} bytes exceeds the {} byte budget",
                    text.len(),
                    self.text_budget
                ),
            });
        }

        let started = Instant::now();
        let raw = tokenize(text);
        let ranges = sentence_ranges(&raw);

        let sentences: Vec<SentenceSpan> = ranges
            .iter()
            .map(|&(s, e)| SentenceSpan {
                start: raw[s].start,
                end: raw[e - 1].start + raw[e - 1].text.len(),
            })
            .collect();

        let mut tokens = Vec::with_capacity(raw.len());
        for &(s, e) in &ranges {
            let pos_tags: Vec<&'static str> =
                (s..e).map(|i| self.tag_word(raw[i].text, i == s)).collect();
            let root_rel = root_of(&pos_tags);
            let root_abs = s + root_rel;
            for (rel, i) in (s..e).enumerate() {
                let pos = pos_tags[rel];
                let dep = if rel == root_rel {
                    "ROOT"
                } else {
                    dep_for(pos, rel, root_rel)
                };
                tokens.push(Token {
                    text: raw[i].text.to_string(),
                    lemma: self.lemma_of(raw[i].text, pos),
                    pos: pos.to_string(),
                    dep: dep.to_string(),
                    head: root_abs,
                    start: raw[i].start,
                });
            }
        }

        let entities = self.extract_entities(text, &tokens);
        let svg = want_svg.then(|| svg::render_arcs(&tokens));

        Ok(Annotation {
            parse_msec: started.elapsed().as_millis() as u64,
            tokens,
            sentences,
            entities,
            svg,
        })
    }
}

struct RawToken<'a> {
    text: &'a str,
    start: usize,
}

/// Split text into word and punctuation tokens with byte offsets.
/// Apostrophes inside a word stay attached, so "don't" is one token.
fn tokenize(text: &str) -> Vec<RawToken<'_>> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() || (ch == '\'' && word_start.is_some()) {
            if word_start.is_none() {
                word_start = Some(idx);
            }
        } else {
            if let Some(start) = word_start.take() {
                tokens.push(RawToken {
                    text: &text[start..idx],
                    start,
                });
            }
            if !ch.is_whitespace() {
                tokens.push(RawToken {
                    text: &text[idx..idx + ch.len_utf8()],
                    start: idx,
                });
            }
        }
    }
    if let Some(start) = word_start {
        tokens.push(RawToken {
            text: &text[start..],
            start,
        });
    }
    tokens
}

/// Token index ranges of sentences, end exclusive.
/// A sentence closes at ".", "!" or "?" and the terminator belongs to it.
fn sentence_ranges(raw: &[RawToken<'_>]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (i, tok) in raw.iter().enumerate() {
        if matches!(tok.text, "." | "!" | "?") {
            ranges.push((start, i + 1));
            start = i + 1;
        }
    }
    if start < raw.len() {
        ranges.push((start, raw.len()));
    }
    ranges
}

/// Sentence-relative index of the head token: the first verb, else the
/// first auxiliary, else the first word at all.
fn root_of(pos_tags: &[&'static str]) -> usize {
    if let Some(i) = pos_tags.iter().position(|p| *p == "VERB") {
        return i;
    }
    if let Some(i) = pos_tags.iter().position(|p| *p == "AUX") {
        return i;
    }
    pos_tags.iter().position(|p| *p != "PUNCT").unwrap_or(0)
}

fn dep_for(pos: &str, index: usize, root: usize) -> &'static str {
    match pos {
        "PUNCT" => "punct",
        "DET" => "det",
        "ADJ" => "amod",
        "ADV" => "advmod",
        "ADP" => "case",
        "NUM" => "nummod",
        "CCONJ" => "cc",
        "AUX" => "aux",
        "VERB" => "conj",
        "NOUN" | "PROPN" | "PRON" => {
            if index < root {
                "nsubj"
            } else {
                "obj"
            }
        }
        _ => "dep",
    }
}

fn overlaps_any(entities: &[Entity], start: usize, end: usize) -> bool {
    entities.iter().any(|e| start < e.end && e.start < end)
}
