//! Lexical signal matcher (Tier 1)
//!
//! Compiles a [`SignalTable`] into a single Aho-Corasick automaton and scores
//! a description by the signals it contains. Matching is pure and synchronous:
//! the same description always yields the same result.

use crate::signals::{normalize, SignalTable};
use aho_corasick::{AhoCorasick, MatchKind};
use jobtriage_core::{ClassificationResult, Error, RecommendedRoute, Result, TrafficLight};

const CATALOG_CONFIDENCE: u32 = 90;
const CATALOG_AMBER_PENALTY: u32 = 10;
const CATALOG_GREEN_BONUS: u32 = 5;

const RED_BASE: u32 = 60;
const RED_STEP: u32 = 10;
const RED_CAP: u32 = 95;

const AMBER_BASE: u32 = 45;
const AMBER_STEP: u32 = 10;
const AMBER_CAP: u32 = 65;

const GREEN_BASE: u32 = 70;
const GREEN_STEP: u32 = 5;
const GREEN_CAP: u32 = 85;

/// Confidence when no signal fires at all
const UNRECOGNISED_CONFIDENCE: u8 = 40;

#[derive(Debug, Clone)]
struct CompiledSignal {
    phrase: String,
    light: TrafficLight,
    weight: u8,
    requires_visit: bool,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    start: usize,
    end: usize,
    signal: usize,
}

/// Fast keyword matcher over red, amber and green signal sets
pub struct LexicalMatcher {
    automaton: AhoCorasick,
    signals: Vec<CompiledSignal>,
}

impl LexicalMatcher {
    /// Compile a signal table. Fails if the table does not validate.
    pub fn new(table: SignalTable) -> Result<Self> {
        table.validate()?;

        let mut signals = Vec::with_capacity(table.len());
        for light in [TrafficLight::Red, TrafficLight::Amber, TrafficLight::Green] {
            for entry in table.entries(light) {
                signals.push(CompiledSignal {
                    phrase: normalize(&entry.phrase),
                    light,
                    weight: entry.weight,
                    requires_visit: entry.requires_visit,
                });
            }
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(signals.iter().map(|s| s.phrase.as_str()))
            .map_err(|e| Error::classifier(format!("Failed to build signal matcher: {}", e)))?;

        Ok(Self { automaton, signals })
    }

    /// Matcher over the built-in signal table
    pub fn builtin() -> Result<Self> {
        Self::new(SignalTable::builtin())
    }

    /// Number of compiled phrases
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Classify a description by its lexical signals.
    ///
    /// Decision order: blank text is an ambiguous amber; any red signal refers
    /// to a specialist even when the catalog matched; a catalog match is
    /// green; amber signals, or no signals at all, are amber; green signals
    /// alone are green.
    pub fn tier1_keyword_match(&self, description: &str, catalog_matched: bool) -> ClassificationResult {
        if description.trim().is_empty() {
            let mut result = ClassificationResult::lexical(TrafficLight::Amber, 0);
            result.needs_review = true;
            return result;
        }

        let text = normalize(description);
        let hits = self.find_signals(&text);
        let tally = Tally::collect(&self.signals, &hits);

        let mut result = if !tally.red.is_empty() {
            let confidence = (RED_BASE + RED_STEP * tally.red_weight).min(RED_CAP);
            let mut result = ClassificationResult::lexical(TrafficLight::Red, confidence as u8);
            result.needs_specialist = true;
            result
        } else if catalog_matched {
            let mut confidence = CATALOG_CONFIDENCE;
            if !tally.amber.is_empty() {
                confidence -= CATALOG_AMBER_PENALTY;
            }
            if !tally.green.is_empty() {
                confidence += CATALOG_GREEN_BONUS;
            }
            ClassificationResult::lexical(TrafficLight::Green, confidence as u8)
        } else if !tally.amber.is_empty() {
            let confidence = (AMBER_BASE + AMBER_STEP * tally.amber.len() as u32).min(AMBER_CAP);
            let mut result = ClassificationResult::lexical(TrafficLight::Amber, confidence as u8);
            if tally.requires_visit {
                result.recommended_route = RecommendedRoute::Visit;
            }
            result
        } else if !tally.green.is_empty() {
            let confidence = (GREEN_BASE + GREEN_STEP * tally.green.len() as u32).min(GREEN_CAP);
            ClassificationResult::lexical(TrafficLight::Green, confidence as u8)
        } else {
            let mut result = ClassificationResult::lexical(TrafficLight::Amber, UNRECOGNISED_CONFIDENCE);
            result.needs_review = true;
            result
        };

        result.signals = tally.into_signals(&self.signals);
        result
    }

    /// Word-boundary matches with contained matches removed, in text order.
    ///
    /// A red hit is only dropped when a longer red phrase covers it, so a
    /// custom green or amber phrase can never hide a red word.
    fn find_signals(&self, text: &str) -> Vec<Hit> {
        let mut candidates: Vec<Hit> = self
            .automaton
            .find_overlapping_iter(text)
            .filter(|m| on_word_boundary(text, m.start(), m.end()))
            .map(|m| Hit {
                start: m.start(),
                end: m.end(),
                signal: m.pattern().as_usize(),
            })
            .collect();

        // Earliest start first, longest first among equal starts; any earlier
        // kept hit then starts at or before the current one
        candidates.sort_unstable_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut kept = Vec::with_capacity(candidates.len());
        let mut covered_to = 0;
        let mut red_covered_to = 0;
        for hit in candidates {
            let red = self.signals[hit.signal].light == TrafficLight::Red;
            let limit = if red { red_covered_to } else { covered_to };
            if hit.end <= limit {
                continue;
            }

            covered_to = covered_to.max(hit.end);
            if red {
                red_covered_to = red_covered_to.max(hit.end);
            }
            kept.push(hit);
        }

        kept
    }
}

impl std::fmt::Debug for LexicalMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexicalMatcher")
            .field("signals", &self.signals.len())
            .finish()
    }
}

fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// Distinct phrases per light, each in order of first occurrence
#[derive(Default)]
struct Tally {
    red: Vec<usize>,
    amber: Vec<usize>,
    green: Vec<usize>,
    red_weight: u32,
    requires_visit: bool,
}

impl Tally {
    fn collect(signals: &[CompiledSignal], hits: &[Hit]) -> Self {
        let mut tally = Self::default();

        for hit in hits {
            let signal = &signals[hit.signal];
            let bucket = match signal.light {
                TrafficLight::Red => &mut tally.red,
                TrafficLight::Amber => &mut tally.amber,
                TrafficLight::Green => &mut tally.green,
            };
            if bucket.contains(&hit.signal) {
                continue;
            }
            bucket.push(hit.signal);

            match signal.light {
                TrafficLight::Red => tally.red_weight += u32::from(signal.weight),
                TrafficLight::Amber => tally.requires_visit |= signal.requires_visit,
                TrafficLight::Green => {}
            }
        }

        tally
    }

    fn into_signals(self, signals: &[CompiledSignal]) -> Vec<String> {
        self.red
            .into_iter()
            .chain(self.amber)
            .chain(self.green)
            .map(|i| signals[i].phrase.clone())
            .collect()
    }
}
