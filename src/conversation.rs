//! Conversation state: the transcript and the single-flight gate.
//!
//! A [`Conversation`] is the only writer of its transcript.  Sending is split
//! in two so the gate is explicit:
//!
//! 1. [`Conversation::begin_submit`] appends the user turn, moves the gate
//!    from [`RequestState::Idle`] to [`RequestState::Awaiting`] and hands back
//!    a [`PendingRequest`] holding the transcript exactly as it must be sent.
//! 2. [`Conversation::finish_submit`] takes the reply, appends exactly one
//!    assistant turn and returns the gate to idle.
//!
//! [`Conversation::submit`] runs both steps around a [`CompletionClient`] call.
//!
//! `clear` is accepted at any time.  Each clear bumps the transcript version;
//! a reply for a request issued against an older version is dropped rather
//! than landing in the fresh transcript.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};

use crate::completion::{CompletionBackend, CompletionClient, Reply};
use crate::error::{Error, Result};
use crate::observability::{
    CONVERSATION_CLEARS, CONVERSATION_REJECTED, CONVERSATION_STALE, CONVERSATION_SUBMITS,
};
use crate::types::{Turn, Usage};

const TRANSCRIPT_FORMAT_VERSION: u8 = 1;

/// The single-flight gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// No request outstanding; a submit will be accepted.
    Idle,
    /// A request is outstanding; submits are rejected until it resolves.
    Awaiting {
        /// Identifies the outstanding request.
        request_id: u64,
    },
}

/// Why a submit was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The text was empty after trimming.
    Empty,
    /// Another request is still outstanding.
    Busy,
}

/// A request that has been accepted but not yet answered.
///
/// Produced only by [`Conversation::begin_submit`] and consumed by
/// [`Conversation::finish_submit`].
#[derive(Debug)]
#[must_use = "a pending request holds the conversation busy until it is finished"]
pub struct PendingRequest {
    request_id: u64,
    version: u64,
    transcript: Vec<Turn>,
}

impl PendingRequest {
    /// The transcript to send, ending with the new user turn.
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }
}

/// What happened to a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing changed.
    Rejected(Rejection),
    /// The reply was appended as an assistant turn.
    Replied(Reply),
    /// The transcript was cleared while waiting; the reply was dropped.
    Stale(Reply),
}

impl SubmitOutcome {
    /// The reply that was appended, if any.
    pub fn appended(&self) -> Option<&Reply> {
        match self {
            SubmitOutcome::Replied(reply) => Some(reply),
            _ => None,
        }
    }
}

/// Aggregated stats for a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationStats {
    /// Turns currently in the transcript.
    pub turns: usize,
    /// Requests issued this session.
    pub requests: u64,
    /// Replies that were canned fallbacks.
    pub fallbacks: u64,
    /// Replies dropped because the transcript was cleared first.
    pub stale_replies: u64,
    /// Token usage summed over all requests.
    pub total_usage: Usage,
    /// Token usage of the most recent request, if reported.
    pub last_usage: Option<Usage>,
}

/// The transcript plus the state that guards it.
#[derive(Debug)]
pub struct Conversation {
    transcript: Vec<Turn>,
    state: RequestState,
    version: u64,
    next_request_id: u64,
    staged: Option<String>,
    stats: ConversationStats,
}

impl Conversation {
    /// Creates an empty, idle conversation.
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            state: RequestState::Idle,
            version: 0,
            next_request_id: 0,
            staged: None,
            stats: ConversationStats::default(),
        }
    }

    /// The transcript, oldest turn first.
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Returns the number of turns in the conversation.
    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    /// True when nothing has been said yet (or since the last clear).
    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// The single-flight gate.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// True while a request is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, RequestState::Awaiting { .. })
    }

    /// Stages text for the next submit without touching the transcript.
    pub fn stage_suggestion(&mut self, text: impl Into<String>) {
        self.staged = Some(text.into());
    }

    /// Stages the suggestion at `index` (zero-based).  Returns the staged text,
    /// or `None` and leaves any earlier staging alone if `index` is out of range.
    pub fn select_suggestion(&mut self, suggestions: &[String], index: usize) -> Option<&str> {
        let suggestion = suggestions.get(index)?;
        self.staged = Some(suggestion.clone());
        self.staged.as_deref()
    }

    /// The staged text, if any.
    pub fn staged(&self) -> Option<&str> {
        self.staged.as_deref()
    }

    /// Removes and returns the staged text.
    pub fn take_staged(&mut self) -> Option<String> {
        self.staged.take()
    }

    /// Accepts `text` as the next user turn.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] and leaves everything untouched when the
    /// trimmed text is empty or another request is outstanding.
    pub fn begin_submit(&mut self, text: &str) -> std::result::Result<PendingRequest, Rejection> {
        let text = trim_input(text);
        let rejection = if text.is_empty() {
            Some(Rejection::Empty)
        } else if self.is_busy() {
            Some(Rejection::Busy)
        } else {
            None
        };
        if let Some(rejection) = rejection {
            CONVERSATION_REJECTED.click();
            tracing::debug!(?rejection, "submit ignored");
            return Err(rejection);
        }

        CONVERSATION_SUBMITS.click();
        self.transcript.push(Turn::user(text));
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.state = RequestState::Awaiting { request_id };
        self.stats.requests += 1;
        Ok(PendingRequest {
            request_id,
            version: self.version,
            transcript: self.transcript.clone(),
        })
    }

    /// Resolves a pending request with its reply and returns the gate to idle.
    pub fn finish_submit(&mut self, pending: PendingRequest, reply: Reply) -> SubmitOutcome {
        if self.state == (RequestState::Awaiting { request_id: pending.request_id }) {
            self.state = RequestState::Idle;
        }
        if reply.is_fallback() {
            self.stats.fallbacks += 1;
        }
        if let Some(usage) = reply.usage {
            self.stats.total_usage = self.stats.total_usage + usage;
            self.stats.last_usage = Some(usage);
        }
        if pending.version != self.version {
            CONVERSATION_STALE.click();
            self.stats.stale_replies += 1;
            tracing::info!(
                request_id = pending.request_id,
                "transcript cleared while waiting; dropping reply"
            );
            return SubmitOutcome::Stale(reply);
        }
        self.transcript.push(Turn::assistant(reply.text.clone()));
        SubmitOutcome::Replied(reply)
    }

    /// Sends `text` and appends the reply.
    ///
    /// Never fails: rejected input leaves the conversation untouched and any
    /// provider failure becomes a fallback reply.
    pub async fn submit<B: CompletionBackend>(
        &mut self,
        text: &str,
        client: &CompletionClient<B>,
    ) -> SubmitOutcome {
        let pending = match self.begin_submit(text) {
            Ok(pending) => pending,
            Err(rejection) => return SubmitOutcome::Rejected(rejection),
        };
        let reply = client.complete(pending.transcript()).await;
        self.finish_submit(pending, reply)
    }

    /// Submits the staged text, consuming it if it was accepted.
    pub async fn submit_staged<B: CompletionBackend>(
        &mut self,
        client: &CompletionClient<B>,
    ) -> SubmitOutcome {
        let Some(text) = self.staged.clone() else {
            return SubmitOutcome::Rejected(Rejection::Empty);
        };
        let outcome = self.submit(&text, client).await;
        if !matches!(outcome, SubmitOutcome::Rejected(_)) {
            self.staged = None;
        }
        outcome
    }

    /// Empties the transcript.  An outstanding request keeps running, but its
    /// reply will be dropped.
    pub fn clear(&mut self) {
        CONVERSATION_CLEARS.click();
        self.transcript.clear();
        self.version += 1;
    }

    /// Returns the current conversation statistics snapshot.
    pub fn stats(&self) -> ConversationStats {
        ConversationStats {
            turns: self.transcript.len(),
            ..self.stats.clone()
        }
    }

    /// Saves the transcript to the specified path.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile::new(&self.transcript);
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })?;
        writer
            .flush()
            .map_err(|err| Error::io("failed to write transcript file", err))
    }

    /// Loads a transcript from disk, replacing the current conversation history.
    ///
    /// Refused while a request is outstanding.
    pub fn load_transcript_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if self.is_busy() {
            return Err(Error::validation(
                "cannot load a transcript while a reply is pending",
                None,
            ));
        }
        let file = File::open(path.as_ref())
            .map_err(|err| Error::io("failed to open transcript file", err))?;
        let reader = BufReader::new(file);
        let transcript: TranscriptFile = from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse transcript", Some(Box::new(err)))
        })?;
        if transcript.version != TRANSCRIPT_FORMAT_VERSION {
            return Err(Error::validation(
                format!("unsupported transcript version {}", transcript.version),
                Some("version".to_string()),
            ));
        }
        self.transcript = transcript.turns;
        self.version += 1;
        Ok(())
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Trims whitespace plus U+FEFF, which `str::trim` keeps.
fn trim_input(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

#[derive(Serialize, Deserialize)]
struct TranscriptFile {
    version: u8,
    turns: Vec<Turn>,
}

impl TranscriptFile {
    fn new(turns: &[Turn]) -> Self {
        Self {
            version: TRANSCRIPT_FORMAT_VERSION,
            turns: turns.to_vec(),
        }
    }
}
