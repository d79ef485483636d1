//! Weighted signal tables for the lexical tier
//!
//! A [`SignalTable`] holds the red, amber and green phrase sets the lexical
//! matcher compiles. Tables are plain values: build the built-in one with
//! [`SignalTable::builtin`], or load a replacement from YAML, and hand it to
//! [`LexicalMatcher::new`](crate::lexical::LexicalMatcher::new).
//!
//! Weights express specificity. A generic word such as "boiler" carries
//! weight 1; an explicit phrase such as "gas leak" carries weight 3.

use jobtriage_core::{Error, Result, TrafficLight};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Weight for a generic, single-word signal
pub const GENERIC: u8 = 1;

/// Weight for an explicit, unambiguous phrase
pub const EXPLICIT: u8 = 3;

/// A single phrase in a signal table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSignalEntry")]
pub struct SignalEntry {
    /// Phrase to match (case-insensitive, on word boundaries)
    pub phrase: String,

    /// Specificity weight, at least 1
    pub weight: u8,

    /// Amber only: the job needs someone on site, not just a video
    pub requires_visit: bool,
}

impl SignalEntry {
    /// Create an entry with the given weight
    pub fn new(phrase: impl Into<String>, weight: u8) -> Self {
        Self {
            phrase: phrase.into(),
            weight,
            requires_visit: false,
        }
    }

    /// Mark this entry as needing a site visit
    pub fn with_visit(mut self) -> Self {
        self.requires_visit = true;
        self
    }
}

/// Entry as written in YAML: either a bare phrase or a full mapping
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawSignalEntry {
    Phrase(String),
    Full {
        phrase: String,
        #[serde(default = "default_weight")]
        weight: u8,
        #[serde(default, alias = "requiresVisit")]
        requires_visit: bool,
    },
}

impl From<RawSignalEntry> for SignalEntry {
    fn from(raw: RawSignalEntry) -> Self {
        match raw {
            RawSignalEntry::Phrase(phrase) => SignalEntry::new(phrase, GENERIC),
            RawSignalEntry::Full {
                phrase,
                weight,
                requires_visit,
            } => SignalEntry {
                phrase,
                weight,
                requires_visit,
            },
        }
    }
}

fn default_weight() -> u8 {
    GENERIC
}

/// Red, amber and green phrase sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalTable {
    /// Specialist or high-complexity triggers
    #[serde(default)]
    pub red: Vec<SignalEntry>,

    /// Vague or multi-symptom language that needs an assessment
    #[serde(default)]
    pub amber: Vec<SignalEntry>,

    /// Specific, bounded, historically safe tasks
    #[serde(default)]
    pub green: Vec<SignalEntry>,
}

impl SignalTable {
    /// The built-in UK home-services table
    pub fn builtin() -> Self {
        let mut red = weighted(
            EXPLICIT,
            &[
                "gas leak",
                "gas leaking",
                "smell of gas",
                "smell gas",
                "smells of gas",
                "gas smell",
                "carbon monoxide",
                "co alarm",
                "structural crack",
                "structural cracks",
                "subsidence",
                "load bearing",
                "load-bearing",
                "supporting wall",
                "asbestos",
                "artex",
                "rewire",
                "rewiring",
                "consumer unit",
                "fuse box",
                "fuse board",
                "sparking",
                "burning smell",
                "exposed wires",
                "exposed wiring",
                "no power",
                "power keeps tripping",
                "all the sockets",
                "electrics keep tripping",
                "damp to the touch",
                "wet to the touch",
                "peeling paint from damp",
                "paint peeling from damp",
                "rising damp",
                "roof leak",
                "leaking roof",
                "roof is leaking",
                "chimney stack",
                "collapsed ceiling",
                "ceiling collapse",
                "ceiling has collapsed",
                "sagging ceiling",
            ],
        );
        red.extend(weighted(
            GENERIC,
            &[
                "gas",
                "boiler",
                "roof",
                "chimney",
                "structural",
                "electrics",
                "wiring",
                "tripping",
                "flue",
            ],
        ));

        let mut amber = weighted(
            GENERIC,
            &[
                "leak",
                "leaks",
                "leaking",
                "damp",
                "mould",
                "mouldy",
                "mold",
                "moldy",
                "crack",
                "cracks",
                "cracked",
                "condensation",
                "water stain",
                "stain on the ceiling",
                "blocked",
                "drain",
                "drains",
                "rot",
                "rotten",
                "woodworm",
                "noise",
                "noisy",
                "not sure what's wrong",
                "not sure what is wrong",
                "don't know what's wrong",
                "no idea what's wrong",
                "something wrong",
                "keeps happening",
                "on and off",
                "intermittent",
                "a few things",
                "several things",
                "various jobs",
            ],
        );
        amber.extend(
            [
                "whole house",
                "throughout the house",
                "several rooms",
                "multiple rooms",
                "extension",
                "loft conversion",
                "kitchen refit",
                "bathroom refit",
            ]
            .into_iter()
            .map(|phrase| SignalEntry::new(phrase, GENERIC).with_visit()),
        );

        let green = weighted(
            GENERIC,
            &[
                "dripping tap",
                "leaky tap",
                "leaking tap",
                "tap washer",
                "replace a tap",
                "replace tap",
                "hang",
                "hanging",
                "mount",
                "mounting",
                "tv bracket",
                "shelf",
                "shelves",
                "picture",
                "pictures",
                "mirror",
                "curtain pole",
                "curtain rail",
                "blinds",
                "flat pack",
                "flat-pack",
                "flatpack",
                "assemble",
                "assembly",
                "toilet seat",
                "door handle",
                "door handles",
                "lock",
                "door lock",
                "change a lock",
                "light bulb",
                "smoke alarm battery",
                "reseal bath",
                "silicone",
                "sealant",
            ],
        );

        Self { red, amber, green }
    }

    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let table: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid signal table: {}", e)))?;
        table.validate()?;
        Ok(table)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Entries for one traffic light
    pub fn entries(&self, light: TrafficLight) -> &[SignalEntry] {
        match light {
            TrafficLight::Red => &self.red,
            TrafficLight::Amber => &self.amber,
            TrafficLight::Green => &self.green,
        }
    }

    /// Total number of phrases across all lights
    pub fn len(&self) -> usize {
        self.red.len() + self.amber.len() + self.green.len()
    }

    /// True when no phrases are configured at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject blank phrases, zero weights and duplicates across lights
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for light in [TrafficLight::Red, TrafficLight::Amber, TrafficLight::Green] {
            for entry in self.entries(light) {
                let phrase = normalize(&entry.phrase);
                if phrase.is_empty() {
                    return Err(Error::config(format!("Blank {} signal phrase", light)));
                }
                if entry.weight == 0 {
                    return Err(Error::config(format!(
                        "Signal '{}' has zero weight",
                        entry.phrase
                    )));
                }
                if !seen.insert(phrase) {
                    return Err(Error::config(format!(
                        "Signal '{}' appears more than once",
                        entry.phrase
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for SignalTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Lowercase, collapse whitespace runs and fold typographic apostrophes.
///
/// Applied to both phrases and descriptions so they compare the way they match.
pub(crate) fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .replace(['\u{2018}', '\u{2019}', '\u{02BC}'], "'")
}

fn weighted(weight: u8, phrases: &[&str]) -> Vec<SignalEntry> {
    phrases
        .iter()
        .map(|phrase| SignalEntry::new(*phrase, weight))
        .collect()
}
