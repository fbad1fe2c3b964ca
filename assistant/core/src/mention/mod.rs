//! Inline Mention References
//!
//! Mentions embed a reference to another record (a person, document,
//! organization, issue, log, meeting, or letter) inside free-form message
//! text using a bracketed token syntax:
//!
//! ```text
//! @[person:Ada Lovelace]
//! @[document:Q3 Report|the report]
//! ```
//!
//! This module is the codec: [`encode`] produces the canonical token for a
//! resolved reference, and [`detect_token`] recognizes a well-formed token
//! for round-trip insertion. The autocomplete state machine that produces
//! references interactively lives in [`autocomplete`].

pub mod autocomplete;

use serde::{Deserialize, Serialize};

/// The kind of record a mention points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionKind {
    /// A person record
    Person,
    /// A document in the store
    Document,
    /// An organization record
    Organization,
    /// An issue record
    Issue,
    /// A log entry
    Log,
    /// A meeting record
    Meeting,
    /// A letter record
    Letter,
}

impl MentionKind {
    /// Wire/token name of this kind
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Document => "document",
            Self::Organization => "organization",
            Self::Issue => "issue",
            Self::Log => "log",
            Self::Meeting => "meeting",
            Self::Letter => "letter",
        }
    }

    /// Parse a token/wire name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "person" => Some(Self::Person),
            "document" => Some(Self::Document),
            "organization" => Some(Self::Organization),
            "issue" => Some(Self::Issue),
            "log" => Some(Self::Log),
            "meeting" => Some(Self::Meeting),
            "letter" => Some(Self::Letter),
            _ => None,
        }
    }
}

impl std::fmt::Display for MentionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved reference to another record
///
/// The mention search endpoint returns these as
/// `{"id": ..., "name": ..., "type": ..., "aliases": [...]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionReference {
    /// Record identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Kind of record
    #[serde(rename = "type")]
    pub kind: MentionKind,
    /// Ordered aliases; the first is the default display alias
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl MentionReference {
    /// Create a reference without aliases
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: MentionKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            aliases: Vec::new(),
        }
    }

    /// The default display alias, if any
    #[must_use]
    pub fn default_alias(&self) -> Option<&str> {
        self.aliases.first().map(String::as_str)
    }
}

/// Encode a reference as an inline token
///
/// Produces `@[kind:name]`, or `@[kind:name|alias]` when an alias is
/// given. Name and alias are embedded verbatim: a name containing `]` or
/// `|` produces a token that will not round-trip through
/// [`detect_token`].
#[must_use]
pub fn encode(reference: &MentionReference, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => format!("@[{}:{}|{}]", reference.kind, reference.name, alias),
        None => format!("@[{}:{}]", reference.kind, reference.name),
    }
}

/// A token recognized by [`detect_token`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionToken<'a> {
    /// Kind of record the token names
    pub kind: MentionKind,
    /// Referenced name
    pub name: &'a str,
    /// Display alias, if the token carries one
    pub alias: Option<&'a str>,
}

/// Recognize a whole string as one well-formed mention token
///
/// This is detection for round-trip insertion, not a general re-parser of
/// stored content. Tokens whose body contains a stray `]` fail detection
/// rather than mis-parsing (the encoding side does not escape).
#[must_use]
pub fn detect_token(text: &str) -> Option<MentionToken<'_>> {
    let body = text.strip_prefix("@[")?.strip_suffix(']')?;
    if body.contains(']') {
        return None;
    }

    let (kind_name, rest) = body.split_once(':')?;
    let kind = MentionKind::parse(kind_name)?;

    let (name, alias) = match rest.split_once('|') {
        Some((name, alias)) => (name, Some(alias)),
        None => (rest, None),
    };
    if name.is_empty() {
        return None;
    }

    Some(MentionToken { kind, name, alias })
}
