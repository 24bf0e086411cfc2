//! Path predicates built once per search from a pattern string.
use crate::error::{Result, RfindError};
use regex::Regex;

/// The pattern value that stands for "no pattern given".
pub const MATCH_EVERYTHING: &str = "//";

const FLAG_CHARS: &str = "imsx";

/// A regex body plus the modifiers carried by an optional `/body/flags` wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    body: String,
    flags: String,
}

impl Pattern {
    /// Split a user pattern into body and flags.
    ///
    /// `/\.html?$/i` is delimited; anything else, including a string with an
    /// opening slash but no valid closing part, is taken whole as the body.
    pub fn parse(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix('/') {
            if let Some(end) = rest.rfind('/') {
                let (body, flags) = (&rest[..end], &rest[end + 1..]);
                if flags.chars().all(|c| FLAG_CHARS.contains(c)) {
                    let mut unique = String::new();
                    for c in flags.chars() {
                        if !unique.contains(c) {
                            unique.push(c);
                        }
                    }
                    return Self {
                        body: body.to_string(),
                        flags: unique,
                    };
                }
            }
        }

        Self {
            body: text.to_string(),
            flags: String::new(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// The body with its flags as a leading inline group, e.g. `(?i)\.html?$`.
    ///
    /// Both the `regex` crate and perl accept this form.
    pub fn inline(&self) -> String {
        if self.flags.is_empty() {
            self.body.clone()
        } else {
            format!("(?{}){}", self.flags, self.body)
        }
    }

    pub fn compile(&self) -> Result<Regex> {
        let source = self.inline();
        Regex::new(&source).map_err(|source| RfindError::Pattern {
            pattern: self.body.clone(),
            source,
        })
    }
}

/// Accept/reject decision for a single path, fixed for a whole traversal.
#[derive(Debug, Clone)]
pub enum MatchPredicate {
    AcceptAll,
    AcceptIfMatches(Regex),
    RejectIfMatches(Regex),
}

impl MatchPredicate {
    /// Build the predicate for `pattern`, compiling it unless it is
    /// [`MATCH_EVERYTHING`]. A bad regex fails here, not during traversal.
    pub fn new(pattern: &str, negated: bool) -> Result<Self> {
        if pattern == MATCH_EVERYTHING {
            return Ok(MatchPredicate::AcceptAll);
        }

        let regex = Pattern::parse(pattern).compile()?;
        Ok(if negated {
            MatchPredicate::RejectIfMatches(regex)
        } else {
            MatchPredicate::AcceptIfMatches(regex)
        })
    }

    #[inline]
    pub fn accept(&self, path: &str) -> bool {
        match self {
            MatchPredicate::AcceptAll => true,
            MatchPredicate::AcceptIfMatches(re) => re.is_match(path),
            MatchPredicate::RejectIfMatches(re) => !re.is_match(path),
        }
    }

    pub fn is_accept_all(&self) -> bool {
        matches!(self, MatchPredicate::AcceptAll)
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, MatchPredicate::RejectIfMatches(_))
    }

    /// The compiled regex, if any. Its source is the inline form of the pattern.
    pub fn regex(&self) -> Option<&Regex> {
        match self {
            MatchPredicate::AcceptAll => None,
            MatchPredicate::AcceptIfMatches(re) | MatchPredicate::RejectIfMatches(re) => Some(re),
        }
    }
}
