//! Segment token grammars.
//!
//! The command line carries a flat list of tokens after the pause and fade
//! values. Two grammars turn that list into ordered descriptors: strict
//! triples and a lenient form where start and end may be left out.

use clap::ValueEnum;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CutError;

lazy_static! {
    static ref TIME_TOKEN: Regex = Regex::new(r"^\d+(:\d+)*$").expect("valid time token pattern");
}

/// One requested segment, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDescriptor {
    /// 1-based position used in diagnostics
    pub index: usize,
    pub source: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl SegmentDescriptor {
    fn new(index: usize, source: &str, start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            index,
            source: source.to_string(),
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        }
    }
}

pub trait SegmentResolver {
    fn resolve(&self, tokens: &[String]) -> Result<Vec<SegmentDescriptor>, CutError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// `source start end`, repeated
    Strict,
    /// `source [start [end]]`, repeated
    #[default]
    Lenient,
}

impl Grammar {
    pub fn resolver(self) -> Box<dyn SegmentResolver> {
        match self {
            Grammar::Strict => Box::new(StrictTriples),
            Grammar::Lenient => Box::new(LenientTokens),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StrictTriples;

impl SegmentResolver for StrictTriples {
    fn resolve(&self, tokens: &[String]) -> Result<Vec<SegmentDescriptor>, CutError> {
        if tokens.len() % 3 != 0 {
            return Err(CutError::Arity {
                count: tokens.len(),
            });
        }

        Ok(tokens
            .chunks_exact(3)
            .enumerate()
            .map(|(idx, triple)| {
                SegmentDescriptor::new(idx + 1, &triple[0], Some(&triple[1]), Some(&triple[2]))
            })
            .collect())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LenientTokens;

impl SegmentResolver for LenientTokens {
    fn resolve(&self, tokens: &[String]) -> Result<Vec<SegmentDescriptor>, CutError> {
        let mut descriptors = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let source = &tokens[i];
            let mut start = None;
            let mut end = None;

            if let Some(next) = tokens.get(i + 1)
                && is_time_token(next)
            {
                start = Some(next.as_str());
                i += 1;
                if let Some(next) = tokens.get(i + 1)
                    && is_time_token(next)
                {
                    end = Some(next.as_str());
                    i += 1;
                }
            }

            descriptors.push(SegmentDescriptor::new(
                descriptors.len() + 1,
                source,
                start,
                end,
            ));
            i += 1;
        }

        Ok(descriptors)
    }
}

/// Whether a token is a time value under the lenient grammar.
///
/// Purely syntactic: digits optionally joined by `:`. Fractions are not
/// time tokens here.
pub fn is_time_token(token: &str) -> bool {
    TIME_TOKEN.is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn strict_groups_triples_in_order() {
        let input = tokens(&["a.mp4", "0", "5", "b.mp4", "1:00", "1:30"]);
        let descriptors = StrictTriples.resolve(&input).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0], SegmentDescriptor::new(1, "a.mp4", Some("0"), Some("5")));
        assert_eq!(
            descriptors[1],
            SegmentDescriptor::new(2, "b.mp4", Some("1:00"), Some("1:30"))
        );
    }

    #[test]
    fn strict_keeps_fractional_times_as_given() {
        let input = tokens(&["a.mp3", "1.5", "2:10.25"]);
        let descriptors = StrictTriples.resolve(&input).unwrap();
        assert_eq!(descriptors[0].start.as_deref(), Some("1.5"));
        assert_eq!(descriptors[0].end.as_deref(), Some("2:10.25"));
    }

    #[test]
    fn strict_rejects_incomplete_groups() {
        let input = tokens(&["a.mp4", "0", "5", "b.mp4"]);
        assert!(matches!(
            StrictTriples.resolve(&input),
            Err(CutError::Arity { count: 4 })
        ));
    }

    #[test]
    fn strict_with_no_tokens_is_empty() {
        assert!(StrictTriples.resolve(&[]).unwrap().is_empty());
    }

    #[test]
    fn lenient_allows_missing_windows() {
        let input = tokens(&[
            "whole.mp3",
            "from.mp3",
            "0:10",
            "window.mp3",
            "5",
            "20",
            "last.mp3",
        ]);
        let descriptors = LenientTokens.resolve(&input).unwrap();
        assert_eq!(
            descriptors,
            vec![
                SegmentDescriptor::new(1, "whole.mp3", None, None),
                SegmentDescriptor::new(2, "from.mp3", Some("0:10"), None),
                SegmentDescriptor::new(3, "window.mp3", Some("5"), Some("20")),
                SegmentDescriptor::new(4, "last.mp3", None, None),
            ]
        );
    }

    #[test]
    fn lenient_consumes_at_most_two_time_tokens() {
        let input = tokens(&["a.mp3", "1", "2", "3"]);
        let descriptors = LenientTokens.resolve(&input).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[1].source, "3");
        assert_eq!(descriptors[1].start, None);
    }

    #[test]
    fn lenient_treats_urls_as_sources() {
        let input = tokens(&["https://youtu.be/k4yXQkG2s1E?si=x", "00:39", "01:06"]);
        let descriptors = LenientTokens.resolve(&input).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].start.as_deref(), Some("00:39"));
        assert_eq!(descriptors[0].end.as_deref(), Some("01:06"));
    }

    #[test]
    fn time_token_grammar_is_digits_and_colons() {
        assert!(is_time_token("12"));
        assert!(is_time_token("1:02:03"));
        assert!(!is_time_token("12.5"));
        assert!(!is_time_token("1:"));
        assert!(!is_time_token(":1"));
        assert!(!is_time_token("clip.mp4"));
        assert!(!is_time_token(""));
    }

    #[test]
    fn grammar_selects_matching_strategy() {
        let input = tokens(&["a.mp3", "0", "5", "b.mp3"]);
        assert!(Grammar::Strict.resolver().resolve(&input).is_err());
        assert_eq!(Grammar::Lenient.resolver().resolve(&input).unwrap().len(), 2);
    }
}
