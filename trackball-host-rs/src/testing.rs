//! Test doubles shared by the unit tests.

use std::collections::VecDeque;

use embassy_time::{Duration, Instant, Timer};

use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Unplugged;

/// What the transport does once its scripted bytes run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WhenDrained {
    Hang,
    Close,
    Fail,
}

/// Transport that logs writes and replays a fixed byte script.
pub(crate) struct ScriptedTransport {
    pub written: Vec<u8>,
    pub replies: VecDeque<u8>,
    /// Bytes that become readable at a given instant, oldest first.
    pub late: VecDeque<(Instant, Vec<u8>)>,
    /// One reply queued per write, like a device answering a command.
    pub answers: VecDeque<Vec<u8>>,
    /// Largest chunk returned by one `read`.
    pub chunk: usize,
    pub busy_polls: usize,
    pub when_drained: WhenDrained,
    pub fail_writes: bool,
}

impl ScriptedTransport {
    pub fn replying(bytes: &[u8]) -> Self {
        Self {
            written: Vec::new(),
            replies: bytes.iter().copied().collect(),
            late: VecDeque::new(),
            answers: VecDeque::new(),
            chunk: usize::MAX,
            busy_polls: 0,
            when_drained: WhenDrained::Hang,
            fail_writes: false,
        }
    }

    pub fn push_replies(&mut self, bytes: &[u8]) {
        self.replies.extend(bytes.iter().copied());
    }

    /// Make `bytes` readable `delay` from now.
    pub fn arriving_after(&mut self, delay: Duration, bytes: &[u8]) {
        self.late.push_back((Instant::now() + delay, bytes.to_vec()));
    }

    /// Queue `bytes` as the reply to the next unanswered write.
    pub fn answer_with(&mut self, bytes: &[u8]) {
        self.answers.push_back(bytes.to_vec());
    }
}

impl Transport for ScriptedTransport {
    type Error = Unplugged;

    async fn write(&mut self, bytes: &[u8]) -> Result<(), Unplugged> {
        if self.fail_writes {
            return Err(Unplugged);
        }
        self.written.extend_from_slice(bytes);
        if let Some(answer) = self.answers.pop_front() {
            self.replies.extend(answer);
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Unplugged> {
        if self.replies.is_empty() {
            if let Some(&(at, _)) = self.late.front() {
                // Cancelling here keeps the batch queued.
                Timer::at(at).await;
                if let Some((_, bytes)) = self.late.pop_front() {
                    self.replies.extend(bytes);
                }
            }
        }
        if self.replies.is_empty() {
            match self.when_drained {
                WhenDrained::Hang => core::future::pending::<()>().await,
                WhenDrained::Close => return Ok(0),
                WhenDrained::Fail => return Err(Unplugged),
            }
        }
        let n = buf.len().min(self.chunk).min(self.replies.len());
        for slot in buf[..n].iter_mut() {
            *slot = self.replies.pop_front().unwrap_or(0);
        }
        Ok(n)
    }

    fn is_busy(&mut self) -> bool {
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            true
        } else {
            false
        }
    }
}
