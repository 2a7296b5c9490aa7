use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::warn;

// ---------------------------------------------------------------------------
// OutputSink
// ---------------------------------------------------------------------------

struct SinkState {
    /// Bytes written since the last snapshot.
    raw: Vec<u8>,
    /// Tail of the previous snapshot that could not be decoded yet: an
    /// incomplete UTF-8 sequence or a partial line separator.
    carry: Vec<u8>,
    /// Lines absorbed since the last reset. When the last absorbed chunk had
    /// no trailing separator the final entry is a partial line; a terminated
    /// final line leaves an empty trailing entry.
    lines: Vec<String>,
    /// Pump threads that have not reached end of stream yet.
    open_streams: usize,
    /// No more bytes will arrive; `carry` is flushed on the next snapshot.
    finished: bool,
}

impl SinkState {
    fn has_pending(&self) -> bool {
        !self.raw.is_empty() || (self.finished && !self.carry.is_empty())
    }
}

/// Shared accumulator for everything the debugger prints.
///
/// Pump threads call [`write`](Self::write); the controller calls
/// [`snapshot`](Self::snapshot) to look at the lines received so far and
/// [`reset`](Self::reset) once it has consumed a reply. A single mutex
/// covers every operation and a condition variable wakes the controller
/// when new bytes land.
pub struct OutputSink {
    state: Mutex<SinkState>,
    data_ready: Condvar,
    separator: String,
}

impl OutputSink {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(SinkState {
                raw: Vec::new(),
                carry: Vec::new(),
                lines: Vec::new(),
                open_streams: 0,
                finished: false,
            }),
            data_ready: Condvar::new(),
            separator: separator.into(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Append raw bytes and wake every waiter.
    pub fn write(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let mut state = self.lock();
        state.raw.extend_from_slice(bytes);
        drop(state);
        self.data_ready.notify_all();
    }

    /// Absorb pending bytes into the line list and return all lines since the
    /// last reset.
    pub fn snapshot(&self) -> Vec<String> {
        let mut state = self.lock();
        self.absorb(&mut state);
        state.lines.clone()
    }

    /// Return the accumulated lines and clear them.
    ///
    /// Bytes not yet absorbed by a snapshot are left alone.
    pub fn reset(&self) -> Vec<String> {
        let mut state = self.lock();
        std::mem::take(&mut state.lines)
    }

    /// True when bytes were written that no snapshot has absorbed yet,
    /// including a held-back tail that [`finish`](Self::finish) released.
    pub fn has_new_data(&self) -> bool {
        self.lock().has_pending()
    }

    /// Mark the end of input. A held-back tail (an incomplete UTF-8 sequence
    /// or a partial separator) is decoded lossily by the next snapshot
    /// instead of waiting for bytes that will never come.
    pub fn finish(&self) {
        self.lock().finished = true;
        self.data_ready.notify_all();
    }

    /// Block until unabsorbed bytes exist or `timeout` elapses.
    ///
    /// Spurious wakeups are absorbed; the return value says whether new data
    /// is available.
    pub fn wait_for_data(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .data_ready
            .wait_timeout_while(guard, timeout, |state| !state.has_pending())
            .unwrap_or_else(|e| e.into_inner());
        guard.has_pending()
    }

    // -- stream bookkeeping used by the pump threads --

    pub(crate) fn attach_stream(&self) {
        let mut state = self.lock();
        state.open_streams += 1;
        state.finished = false;
    }

    pub(crate) fn close_stream(&self) {
        let mut state = self.lock();
        state.open_streams = state.open_streams.saturating_sub(1);
        if state.open_streams == 0 {
            state.finished = true;
        }
        drop(state);
        self.data_ready.notify_all();
    }

    /// Wait until every attached stream has hit end of stream.
    pub fn wait_for_streams_closed(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        while guard.open_streams > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .data_ready
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(|e| {
            warn!("output sink lock was poisoned, recovering");
            e.into_inner()
        })
    }

    fn absorb(&self, state: &mut SinkState) {
        if !state.has_pending() {
            return;
        }
        let mut bytes = std::mem::take(&mut state.carry);
        bytes.append(&mut state.raw);

        let text = if state.finished {
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            let (mut text, undecoded) = decode_complete(&bytes);
            let mut carry = Vec::new();
            if let Some(partial) = partial_separator_suffix(&text, &self.separator) {
                carry.extend_from_slice(text[text.len() - partial..].as_bytes());
                text.truncate(text.len() - partial);
            }
            carry.extend_from_slice(undecoded);
            state.carry = carry;
            text
        };

        if text.is_empty() {
            return;
        }
        let mut segments = text.split(self.separator.as_str());
        if let Some(first) = segments.next() {
            // continuation of a line that had no terminator yet
            match state.lines.last_mut() {
                Some(last) => last.push_str(first),
                None => state.lines.push(first.to_string()),
            }
        }
        state.lines.extend(segments.map(str::to_string));
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::new(dh_core::markers::LINE_SEPARATOR)
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("OutputSink")
            .field("pending_bytes", &state.raw.len())
            .field("lines", &state.lines.len())
            .field("open_streams", &state.open_streams)
            .field("finished", &state.finished)
            .finish()
    }
}

/// Decode as much of `bytes` as possible. Invalid sequences become U+FFFD;
/// an incomplete sequence at the very end is returned undecoded so the next
/// chunk can complete it.
fn decode_complete(bytes: &[u8]) -> (String, &[u8]) {
    let mut out = String::with_capacity(bytes.len());
    let mut input = bytes;
    loop {
        match std::str::from_utf8(input) {
            Ok(valid) => {
                out.push_str(valid);
                return (out, &[]);
            }
            Err(e) => {
                let (valid, after) = input.split_at(e.valid_up_to());
                out.push_str(&String::from_utf8_lossy(valid));
                match e.error_len() {
                    None => return (out, after),
                    Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        input = &after[len..];
                    }
                }
            }
        }
    }
}

/// Length of the longest proper prefix of `separator` that `text` ends with.
fn partial_separator_suffix(text: &str, separator: &str) -> Option<usize> {
    (1..separator.len())
        .rev()
        .find(|&k| separator.get(..k).is_some_and(|prefix| text.ends_with(prefix)))
}
