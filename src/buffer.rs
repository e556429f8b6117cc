/// Fixed-capacity destination buffer for record materialization
///
/// The resolution host hands every lookup a single flat byte buffer and
/// expects string fields to be packed into it back to back. Capacity is
/// checked before each field write; running out of space is reported as a
/// try-again outcome so the host can retry with a larger buffer. A failed
/// write never consumes capacity and never writes past the checked bound.
use crate::error::{ResolveError, ResolveResult};

/// Bounded writer over a caller-owned byte buffer.
pub struct RecordBuffer<'a> {
    remaining: &'a mut [u8],
}

impl<'a> RecordBuffer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { remaining: buf }
    }

    /// Bytes still available for field writes.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Copy `value` plus a terminating NUL (the host calling convention) into
    /// the buffer and return the stored string.
    pub fn write_str(&mut self, value: &str) -> ResolveResult<&'a str> {
        let needed = value.len() + 1;
        if needed > self.remaining.len() {
            return Err(ResolveError::BufferTooSmall {
                needed,
                remaining: self.remaining.len(),
            });
        }
        let buf = std::mem::take(&mut self.remaining);
        let (head, rest) = buf.split_at_mut(needed);
        head[..value.len()].copy_from_slice(value.as_bytes());
        head[value.len()] = 0;
        self.remaining = rest;

        let (text, _nul) = head.split_at_mut(value.len());
        let stored = std::str::from_utf8_mut(text)
            .map_err(|e| ResolveError::Parse(format!("buffered string is not utf-8: {}", e)))?;
        Ok(&*stored)
    }
}
