//! Find and replace over paragraph text

use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::model::ParagraphStore;

/// What to look for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub pattern: String,
    pub case_sensitive: bool,
    pub whole_word: bool,

    /// Treat `pattern` as a regular expression (and allow `$1` in replacements)
    pub regex: bool,
}

impl SearchQuery {
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn whole_word(mut self, yes: bool) -> Self {
        self.whole_word = yes;
        self
    }

    pub fn regex(mut self, yes: bool) -> Self {
        self.regex = yes;
        self
    }

    pub fn compile(&self) -> Result<Regex, regex::Error> {
        let body = if self.regex {
            self.pattern.clone()
        } else {
            regex::escape(&self.pattern)
        };
        let body = if self.whole_word {
            format!(r"\b(?:{})\b", body)
        } else {
            body
        };

        RegexBuilder::new(&body)
            .case_insensitive(!self.case_sensitive)
            .build()
    }
}

/// One occurrence; byte offsets into the paragraph text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub paragraph: usize,
    pub start: usize,
    pub end: usize,
}

pub fn find_all(store: &ParagraphStore, pattern: &Regex) -> Vec<SearchMatch> {
    store
        .paragraphs()
        .iter()
        .flat_map(|p| {
            pattern.find_iter(&p.text).map(move |m| SearchMatch {
                paragraph: p.index,
                start: m.start(),
                end: m.end(),
            })
        })
        .collect()
}

/// Replace every match in every paragraph; returns new texts and the count
pub fn replace_all(
    store: &ParagraphStore,
    pattern: &Regex,
    replacement: &str,
    expand: bool,
) -> (Vec<String>, usize) {
    let mut count = 0;
    let texts = store
        .paragraphs()
        .iter()
        .map(|p| {
            let hits = pattern.find_iter(&p.text).count();
            if hits == 0 {
                return p.text.clone();
            }
            count += hits;
            if expand {
                pattern.replace_all(&p.text, replacement).into_owned()
            } else {
                pattern.replace_all(&p.text, NoExpand(replacement)).into_owned()
            }
        })
        .collect();

    (texts, count)
}
