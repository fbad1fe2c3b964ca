//! Mention Autocomplete State Machine
//!
//! Watches a text buffer and caret for an active mention trigger (an
//! eligible `@` with no whitespace between it and the caret), holds the
//! candidate list fetched from the search collaborator, and runs the
//! keyboard-navigable selection machine: wrap-around Up/Down, Enter to
//! commit the encoded token into the buffer, Escape or loss of the
//! trigger to dismiss.
//!
//! The controller is a pure state machine over `(buffer, caret)` plus key
//! presses; fetching candidates (with whatever debouncing or caching the
//! collaborator wants) stays outside. Call [`MentionAutocomplete::update`]
//! after every edit or caret move, feed results back through
//! [`MentionAutocomplete::set_candidates`], and route keys through
//! [`MentionAutocomplete::on_key`] while active.

use std::time::{Duration, Instant};

use crate::mention::{encode, MentionReference};

/// Default grace window after focus loss before the popup dismisses
pub const DEFAULT_FOCUS_GRACE: Duration = Duration::from_millis(150);

/// Keys the autocomplete machine consumes while active
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutocompleteKey {
    /// Move selection down (wraps to the first candidate)
    Down,
    /// Move selection up (wraps to the last candidate)
    Up,
    /// Commit the selected candidate
    Enter,
    /// Dismiss without committing
    Escape,
}

/// An active mention trigger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionQuery {
    /// Byte offset of the `@` in the buffer
    pub anchor: usize,
    /// Live query text between the `@` and the caret
    pub query: String,
}

/// A committed mention insertion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionCommit {
    /// The buffer with the encoded token spliced over the `@query` span
    pub buffer: String,
    /// Caret position after the inserted token (byte offset)
    pub caret: usize,
    /// The reference that was committed
    pub reference: MentionReference,
}

/// Outcome of routing one key press through the machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The machine was inactive (or had nothing to commit); the key was
    /// not consumed
    Ignored,
    /// Selection moved
    Navigated,
    /// A candidate was committed; apply the new buffer and caret
    Committed(MentionCommit),
    /// The popup was dismissed without committing
    Dismissed,
}

/// Detect an active mention trigger at the caret
///
/// Scans left from the caret for the nearest `@`. The trigger is active
/// iff that `@` is at the start of the buffer or immediately preceded by
/// a non-word character, and no whitespace occurs between the `@` and the
/// caret. Returns the anchor and the live query text.
#[must_use]
pub fn detect_trigger(buffer: &str, caret: usize) -> Option<MentionQuery> {
    let before = buffer.get(..caret)?;
    let anchor = before.rfind('@')?;

    let query = &before[anchor + 1..];
    if query.chars().any(char::is_whitespace) {
        return None;
    }

    if let Some(prev) = before[..anchor].chars().next_back() {
        if prev.is_alphanumeric() || prev == '_' {
            return None;
        }
    }

    Some(MentionQuery {
        anchor,
        query: query.to_string(),
    })
}

#[derive(Debug)]
struct ActiveMention {
    query: MentionQuery,
    candidates: Vec<MentionReference>,
    selected: usize,
    focus_lost_at: Option<Instant>,
}

/// The autocomplete controller
///
/// Inactive until [`MentionAutocomplete::update`] observes an active
/// trigger; back to inactive on commit, dismissal, trigger loss, or focus
/// loss beyond the grace window.
#[derive(Debug)]
pub struct MentionAutocomplete {
    active: Option<ActiveMention>,
    grace: Duration,
}

impl MentionAutocomplete {
    /// Create a controller with the default focus grace window
    #[must_use]
    pub fn new() -> Self {
        Self::with_grace(DEFAULT_FOCUS_GRACE)
    }

    /// Create a controller with a custom focus grace window
    #[must_use]
    pub fn with_grace(grace: Duration) -> Self {
        Self {
            active: None,
            grace,
        }
    }

    /// Reconcile with the current buffer and caret
    ///
    /// Returns the live query to hand to the search collaborator when a
    /// trigger is active, `None` otherwise. The selection resets to the
    /// first candidate whenever the query text changes; candidates from
    /// the previous query stay visible until
    /// [`MentionAutocomplete::set_candidates`] replaces them.
    pub fn update(&mut self, buffer: &str, caret: usize) -> Option<&str> {
        self.expire_focus_grace();

        match detect_trigger(buffer, caret) {
            Some(query) => {
                match self.active {
                    Some(ref mut active) => {
                        if active.query != query {
                            active.selected = 0;
                        }
                        active.query = query;
                        active.focus_lost_at = None;
                    }
                    None => {
                        self.active = Some(ActiveMention {
                            query,
                            candidates: Vec::new(),
                            selected: 0,
                            focus_lost_at: None,
                        });
                    }
                }
                self.active.as_ref().map(|a| a.query.query.as_str())
            }
            None => {
                self.active = None;
                None
            }
        }
    }

    /// Replace the candidate list for the current query
    ///
    /// Order is the collaborator's relevance ranking and is preserved.
    pub fn set_candidates(&mut self, candidates: Vec<MentionReference>) {
        if let Some(active) = &mut self.active {
            active.candidates = candidates;
            if active.selected >= active.candidates.len() {
                active.selected = 0;
            }
        }
    }

    /// Route one key press through the machine
    ///
    /// `buffer` must be the same text last passed to
    /// [`MentionAutocomplete::update`]; the commit splice is computed
    /// against it.
    pub fn on_key(&mut self, key: AutocompleteKey, buffer: &str) -> KeyOutcome {
        self.expire_focus_grace();

        let Some(active) = &mut self.active else {
            return KeyOutcome::Ignored;
        };

        match key {
            AutocompleteKey::Down => {
                if active.candidates.is_empty() {
                    return KeyOutcome::Ignored;
                }
                active.selected = (active.selected + 1) % active.candidates.len();
                KeyOutcome::Navigated
            }
            AutocompleteKey::Up => {
                if active.candidates.is_empty() {
                    return KeyOutcome::Ignored;
                }
                let count = active.candidates.len();
                active.selected = (active.selected + count - 1) % count;
                KeyOutcome::Navigated
            }
            AutocompleteKey::Enter => {
                let Some(reference) = active.candidates.get(active.selected).cloned() else {
                    return KeyOutcome::Ignored;
                };
                let token = encode(&reference, reference.default_alias());

                let anchor = active.query.anchor;
                let span_end = anchor + 1 + active.query.query.len();
                let mut spliced =
                    String::with_capacity(buffer.len() - (span_end - anchor) + token.len());
                spliced.push_str(&buffer[..anchor]);
                spliced.push_str(&token);
                spliced.push_str(&buffer[span_end..]);
                let caret = anchor + token.len();

                self.active = None;
                KeyOutcome::Committed(MentionCommit {
                    buffer: spliced,
                    caret,
                    reference,
                })
            }
            AutocompleteKey::Escape => {
                self.active = None;
                KeyOutcome::Dismissed
            }
        }
    }

    /// Note that the input lost focus
    ///
    /// The popup survives for the grace window (so a click on the popup
    /// itself does not dismiss it), then deactivates.
    pub fn focus_lost(&mut self) {
        if let Some(active) = &mut self.active {
            active.focus_lost_at.get_or_insert_with(Instant::now);
        }
    }

    /// Note that the input regained focus within the grace window
    pub fn focus_regained(&mut self) {
        self.expire_focus_grace();
        if let Some(active) = &mut self.active {
            active.focus_lost_at = None;
        }
    }

    /// Whether a trigger is active (and not expired by focus loss)
    #[must_use]
    pub fn is_active(&self) -> bool {
        match &self.active {
            Some(active) => active
                .focus_lost_at
                .map_or(true, |lost| lost.elapsed() <= self.grace),
            None => false,
        }
    }

    /// The live query, when active
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.query.query.as_str())
    }

    /// Current candidates (empty when inactive)
    #[must_use]
    pub fn candidates(&self) -> &[MentionReference] {
        self.active.as_ref().map_or(&[], |a| a.candidates.as_slice())
    }

    /// Selected candidate index, when there are candidates
    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.active
            .as_ref()
            .filter(|a| !a.candidates.is_empty())
            .map(|a| a.selected)
    }

    fn expire_focus_grace(&mut self) {
        let expired = self.active.as_ref().is_some_and(|active| {
            active
                .focus_lost_at
                .is_some_and(|lost| lost.elapsed() > self.grace)
        });
        if expired {
            self.active = None;
        }
    }
}

impl Default for MentionAutocomplete {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mention::MentionKind;

    fn candidates() -> Vec<MentionReference> {
        vec![
            MentionReference::new("p_1", "Ada Lovelace", MentionKind::Person),
            MentionReference::new("p_2", "Alan Turing", MentionKind::Person),
            MentionReference::new("o_1", "Analytical Engines Ltd", MentionKind::Organization),
        ]
    }

    #[test]
    fn test_trigger_at_buffer_start() {
        let query = detect_trigger("@ad", 3).unwrap();
        assert_eq!(query.anchor, 0);
        assert_eq!(query.query, "ad");
    }

    #[test]
    fn test_trigger_after_space() {
        let query = detect_trigger("see @do", 7).unwrap();
        assert_eq!(query.anchor, 4);
        assert_eq!(query.query, "do");
    }

    #[test]
    fn test_no_trigger_after_word_character() {
        assert!(detect_trigger("a@b", 3).is_none());
        assert!(detect_trigger("user_@b", 7).is_none());
    }

    #[test]
    fn test_no_trigger_across_whitespace() {
        assert!(detect_trigger("@ad hoc", 7).is_none());
    }

    #[test]
    fn test_trigger_after_punctuation() {
        let query = detect_trigger("(cc: @al", 8).unwrap();
        assert_eq!(query.anchor, 5);
        assert_eq!(query.query, "al");
    }

    #[test]
    fn test_empty_query_right_after_at() {
        let query = detect_trigger("hello @", 7).unwrap();
        assert_eq!(query.query, "");
    }

    #[test]
    fn test_caret_mid_buffer() {
        // caret between "do" and the trailing text
        let query = detect_trigger("see @do now", 7).unwrap();
        assert_eq!(query.query, "do");
    }

    #[test]
    fn test_caret_not_on_char_boundary_is_inactive() {
        // caret inside the multi-byte "é"
        assert!(detect_trigger("@é", 2).is_none());
    }

    #[test]
    fn test_navigation_wraps_both_ways() {
        let mut ac = MentionAutocomplete::new();
        ac.update("@a", 2);
        ac.set_candidates(candidates());
        assert_eq!(ac.selected_index(), Some(0));

        ac.on_key(AutocompleteKey::Up, "@a");
        assert_eq!(ac.selected_index(), Some(2), "Up from 0 wraps to last");

        ac.on_key(AutocompleteKey::Down, "@a");
        assert_eq!(ac.selected_index(), Some(0), "Down from last wraps to 0");

        ac.on_key(AutocompleteKey::Down, "@a");
        assert_eq!(ac.selected_index(), Some(1));
    }

    #[test]
    fn test_query_change_resets_selection() {
        let mut ac = MentionAutocomplete::new();
        ac.update("@a", 2);
        ac.set_candidates(candidates());
        ac.on_key(AutocompleteKey::Down, "@a");
        assert_eq!(ac.selected_index(), Some(1));

        ac.update("@al", 3);
        assert_eq!(ac.selected_index(), Some(0));
    }

    #[test]
    fn test_enter_commits_with_first_alias() {
        let mut ac = MentionAutocomplete::new();
        let buffer = "ping @ad please";
        ac.update(buffer, 8); // caret after "@ad"

        let mut reference = MentionReference::new("p_1", "Ada Lovelace", MentionKind::Person);
        reference.aliases.push("Ada".to_string());
        ac.set_candidates(vec![reference]);

        let KeyOutcome::Committed(commit) = ac.on_key(AutocompleteKey::Enter, buffer) else {
            panic!("expected commit");
        };
        assert_eq!(commit.buffer, "ping @[person:Ada Lovelace|Ada] please");
        assert_eq!(commit.caret, "ping @[person:Ada Lovelace|Ada]".len());
        assert!(!ac.is_active());
    }

    #[test]
    fn test_enter_without_candidates_is_ignored() {
        let mut ac = MentionAutocomplete::new();
        ac.update("@zz", 3);
        assert_eq!(ac.on_key(AutocompleteKey::Enter, "@zz"), KeyOutcome::Ignored);
        assert!(ac.is_active());
    }

    #[test]
    fn test_escape_dismisses() {
        let mut ac = MentionAutocomplete::new();
        ac.update("@a", 2);
        ac.set_candidates(candidates());
        assert_eq!(ac.on_key(AutocompleteKey::Escape, "@a"), KeyOutcome::Dismissed);
        assert!(!ac.is_active());
    }

    #[test]
    fn test_caret_leaving_trigger_deactivates() {
        let mut ac = MentionAutocomplete::new();
        ac.update("see @do", 7);
        assert!(ac.is_active());

        // a space after the query breaks the trigger
        assert!(ac.update("see @do ", 8).is_none());
        assert!(!ac.is_active());
    }

    #[test]
    fn test_focus_grace_window() {
        let mut ac = MentionAutocomplete::with_grace(Duration::from_millis(0));
        ac.update("@a", 2);
        ac.set_candidates(candidates());

        ac.focus_lost();
        std::thread::sleep(Duration::from_millis(5));
        assert!(!ac.is_active());
        assert_eq!(ac.on_key(AutocompleteKey::Enter, "@a"), KeyOutcome::Ignored);
    }

    #[test]
    fn test_focus_regained_within_grace_keeps_state() {
        let mut ac = MentionAutocomplete::with_grace(Duration::from_secs(5));
        ac.update("@a", 2);
        ac.set_candidates(candidates());

        ac.focus_lost();
        ac.focus_regained();
        assert!(ac.is_active());
        assert_eq!(ac.selected_index(), Some(0));
    }
}
