// Named Entity Recognition using patterns and gazetteers.
// Labels follow the OntoNotes tag set (PERSON, ORG, GPE, ...). Overlapping
// candidates are resolved by label priority, then by span length.
use std::fmt;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Person,
    Org,
    Gpe,
    Loc,
    Norp,
    Date,
    Money,
    Percent,
}

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Org => "ORG",
            Self::Gpe => "GPE",
            Self::Loc => "LOC",
            Self::Norp => "NORP",
            Self::Date => "DATE",
            Self::Money => "MONEY",
            Self::Percent => "PERCENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PERSON" => Some(Self::Person),
            "ORG" => Some(Self::Org),
            "GPE" => Some(Self::Gpe),
            "LOC" => Some(Self::Loc),
            "NORP" => Some(Self::Norp),
            "DATE" => Some(Self::Date),
            "MONEY" => Some(Self::Money),
            "PERCENT" => Some(Self::Percent),
            _ => None,
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    /// Byte offsets into the recognized text. Not part of the exported record.
    #[serde(skip)]
    pub start: usize,
    #[serde(skip)]
    pub end: usize,
}

struct Pattern {
    label: EntityLabel,
    regex: Regex,
    priority: u8,
    // capitalised-word heuristic; matches go through `trim_person`
    heuristic: bool,
}

// Capitalized words that start sentences far more often than names.
const LEADING_NOISE: &[&str] = &[
    "The", "A", "An", "In", "On", "At", "But", "And", "Or", "If", "When", "While", "After",
    "Before", "This", "That", "These", "Those", "It", "He", "She", "They", "We", "As", "For",
    "Today", "Yesterday", "Meanwhile", "However", "According",
];

const PERSON_SKIP: &[&str] = &["Inc", "Corp", "LLC", "Ltd", "University", "College", "Group"];

const GPE_NAMES: &[&str] = &[
    "United States", "United Kingdom", "New York", "Los Angeles", "San Francisco",
    "Hong Kong", "South Korea", "North Korea", "New Zealand", "South Africa", "Saudi Arabia",
    "USA", "UK", "America", "Canada", "Mexico", "Brazil", "Argentina", "France", "Germany",
    "Italy", "Spain", "Portugal", "Ireland", "Russia", "Ukraine", "Poland", "China", "Japan",
    "India", "Pakistan", "Iran", "Iraq", "Israel", "Gaza", "Egypt", "Turkey", "Nigeria",
    "Kenya", "Australia", "Taiwan", "Singapore", "Indonesia", "Vietnam", "California",
    "Texas", "Florida", "Washington", "London", "Paris", "Berlin", "Moscow", "Kyiv", "Tokyo",
    "Beijing", "Shanghai", "Delhi", "Mumbai", "Chicago", "Boston", "Seattle", "Miami",
    "Austin", "Denver", "Atlanta", "Brussels", "Geneva", "Dubai", "Sydney", "Toronto",
];

const LOC_NAMES: &[&str] = &[
    "Europe", "Asia", "Africa", "Middle East", "Latin America", "North America",
    "South America", "Antarctica", "Arctic", "Atlantic", "Pacific", "Mediterranean",
    "Silicon Valley", "Wall Street",
];

const NORP_NAMES: &[&str] = &[
    "American", "Americans", "British", "Chinese", "Russian", "Russians", "Ukrainian",
    "Ukrainians", "European", "Europeans", "French", "German", "Germans", "Japanese",
    "Indian", "Israeli", "Israelis", "Palestinian", "Palestinians", "Iranian", "Mexican",
    "Canadian", "Democrat", "Democrats", "Republican", "Republicans", "Muslim", "Muslims",
    "Christian", "Christians", "Jewish", "Catholic",
];

const ORG_NAMES: &[&str] = &[
    "NASA", "FBI", "CIA", "NATO", "United Nations", "European Union", "EU", "IMF",
    "World Bank", "Federal Reserve", "Fed", "Congress", "Senate", "White House", "Pentagon",
    "Supreme Court", "World Health Organization", "WHO", "OPEC", "Google", "Apple",
    "Microsoft", "Amazon", "Meta", "Tesla", "OpenAI", "Nvidia", "Reuters",
];

const ORG_SUFFIX: &str = r"\b((?:[A-Z][A-Za-z&]+ )+(?:Inc|LLC|Corp|Corporation|Ltd|Limited|Company|Co|Group|Institute|University|College|Bank|Agency|Party|Association|Foundation)\b\.?)";

const PERSON: &str = r"\b(?:(?:Mr|Mrs|Ms|Dr|Sen|Rep|Gov)\.? |(?:President|Senator|Governor|Minister|Chancellor|Judge|CEO) )?([A-Z][a-z]+(?:-[A-Z][a-z]+)?(?: [A-Z]\.)?(?: [A-Z][a-z]+(?:-[A-Z][a-z]+)?){1,2})\b";

const DATE: &str = r"\b(?:\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}-\d{1,2}-\d{1,2}|(?:January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)\.? \d{1,2}(?:st|nd|rd|th)?(?:, \d{4})?|\d{1,2} (?:January|February|March|April|May|June|July|August|September|October|November|December)(?: \d{4})?|(?:January|February|March|April|June|July|August|September|October|November|December) \d{4}|(?:Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)|(?:last|next|this) (?:week|month|year))\b";

const MONEY: &str = r"(?:[$€£]\s?\d+(?:,\d{3})*(?:\.\d+)?(?: (?:million|billion|trillion))?|\b\d+(?:,\d{3})*(?:\.\d+)?(?: (?:million|billion|trillion))? (?:dollars|euros|pounds|USD|EUR|GBP)\b)";

const PERCENT: &str = r"\b\d+(?:\.\d+)?(?:%| percent\b)";

/// Compiled entity patterns. Built once per process and shared read-only.
pub struct EntityRecognizer {
    patterns: Vec<Pattern>,
}

impl EntityRecognizer {
    /// Build the recognizer, optionally extended with a gazetteer file of
    /// `LABEL<TAB>surface` lines. Any load failure is fatal.
    pub fn new(gazetteer: Option<&Path>) -> Result<Self, PipelineError> {
        let mut patterns = vec![
            compile(EntityLabel::Money, MONEY, 0)?,
            compile(EntityLabel::Percent, PERCENT, 0)?,
            compile(EntityLabel::Date, DATE, 0)?,
        ];

        if let Some(path) = gazetteer {
            for (label, names) in load_gazetteer(path)? {
                patterns.push(compile(label, &alternation(&names), 1)?);
            }
        }

        patterns.push(compile(EntityLabel::Org, &alternation(ORG_NAMES), 2)?);
        patterns.push(compile(EntityLabel::Org, ORG_SUFFIX, 2)?);
        patterns.push(compile(EntityLabel::Gpe, &alternation(GPE_NAMES), 3)?);
        patterns.push(compile(EntityLabel::Loc, &alternation(LOC_NAMES), 3)?);
        patterns.push(compile(EntityLabel::Norp, &alternation(NORP_NAMES), 4)?);
        patterns.push(Pattern {
            heuristic: true,
            ..compile(EntityLabel::Person, PERSON, 5)?
        });

        info!(patterns = patterns.len(), "entity recognizer loaded");
        Ok(Self { patterns })
    }

    /// Entities in order of appearance. Repeated mentions are all kept.
    pub fn recognize(&self, text: &str) -> Vec<Entity> {
        let mut candidates: Vec<(u8, Entity)> = Vec::new();

        for pattern in &self.patterns {
            for cap in pattern.regex.captures_iter(text) {
                let m = match cap.get(1).or_else(|| cap.get(0)) {
                    Some(m) => m,
                    None => continue,
                };
                let span = if pattern.heuristic {
                    match trim_person(text, m.start(), m.end()) {
                        Some(span) => span,
                        None => continue,
                    }
                } else {
                    (m.start(), m.end())
                };
                candidates.push((
                    pattern.priority,
                    Entity {
                        text: text[span.0..span.1].to_string(),
                        label: pattern.label,
                        start: span.0,
                        end: span.1,
                    },
                ));
            }
        }

        candidates.sort_by(|(pa, a), (pb, b)| {
            pa.cmp(pb)
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then(a.start.cmp(&b.start))
        });

        let mut accepted: Vec<Entity> = Vec::new();
        for (_, entity) in candidates {
            if accepted.iter().all(|e| entity.end <= e.start || entity.start >= e.end) {
                accepted.push(entity);
            }
        }
        accepted.sort_by_key(|e| e.start);
        debug!(entities = accepted.len(), "entities recognized");
        accepted
    }
}

fn compile(label: EntityLabel, pattern: &str, priority: u8) -> Result<Pattern, PipelineError> {
    let regex = Regex::new(pattern)
        .map_err(|e| PipelineError::resource(format!("ner-pattern-{label}"), e))?;
    Ok(Pattern {
        label,
        regex,
        priority,
        heuristic: false,
    })
}

fn alternation<S: AsRef<str>>(names: &[S]) -> String {
    let mut escaped: Vec<String> = names.iter().map(|n| regex::escape(n.as_ref())).collect();
    // longest first so "New York" wins over "York"
    escaped.sort_by(|a, b| b.len().cmp(&a.len()));
    format!(r"\b(?:{})\b", escaped.join("|"))
}

fn load_gazetteer(path: &Path) -> Result<Vec<(EntityLabel, Vec<String>)>, PipelineError> {
    let resource = format!("ner-gazetteer {}", path.display());
    let contents = fs::read_to_string(path).map_err(|e| PipelineError::resource(&resource, e))?;

    let mut groups: Vec<(EntityLabel, Vec<String>)> = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (label, surface) = line.split_once('\t').ok_or_else(|| {
            PipelineError::resource(&resource, format!("line {}: expected LABEL<TAB>surface", lineno + 1))
        })?;
        let label = EntityLabel::parse(label).ok_or_else(|| {
            PipelineError::resource(&resource, format!("line {}: unknown label {label:?}", lineno + 1))
        })?;
        let surface = surface.trim();
        if surface.is_empty() {
            continue;
        }
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, names)) => names.push(surface.to_string()),
            None => groups.push((label, vec![surface.to_string()])),
        }
    }
    Ok(groups)
}

// Drop sentence-initial noise words and company-looking matches from a
// PERSON candidate. A name needs at least two words.
fn trim_person(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let span = &text[start..end];
    if PERSON_SKIP.iter().any(|w| span.contains(w)) {
        return None;
    }
    let mut offset = 0;
    for word in span.split(' ') {
        if LEADING_NOISE.contains(&word) {
            offset += word.len() + 1;
        } else {
            break;
        }
    }
    if offset >= span.len() {
        return None;
    }
    let name = &span[offset..];
    if name.split(' ').count() < 2 {
        return None;
    }
    Some((start + offset, end))
}
