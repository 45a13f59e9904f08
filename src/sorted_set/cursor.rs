//! Incremental enumeration with ZSCAN.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use bytes::Bytes;
use tracing::trace;

use super::{decode_entries, SortedSet};
use crate::backend::{arg, command, Backend};
use crate::error::{Error, Result};
use crate::member::{Entry, Member};
use crate::types::Value;

/// One ZSCAN reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPage {
    /// Cursor to pass to the next call; 0 once the scan is complete.
    pub cursor: u64,
    /// Members on this page, with their scores.
    pub entries: Vec<Entry>,
}

impl ScanPage {
    /// Whether this is the final page.
    pub fn is_last(&self) -> bool {
        self.cursor == 0
    }
}

impl<B: Backend> SortedSet<B> {
    /// Fetch one page of members starting at `cursor` (ZSCAN).
    ///
    /// Start with cursor 0 and continue with the returned cursor until it is
    /// 0 again. An empty `pattern` matches everything; a `count_hint` of 0
    /// leaves the page size to the store. Members may repeat across pages.
    pub fn scan(&self, cursor: u64, pattern: &str, count_hint: usize) -> Result<ScanPage> {
        let mut args = command("ZSCAN", &self.key);
        args.push(arg(cursor));
        if !pattern.is_empty() {
            args.push(Bytes::from_static(b"MATCH"));
            args.push(arg(pattern));
        }
        if count_hint > 0 {
            args.push(Bytes::from_static(b"COUNT"));
            args.push(arg(count_hint));
        }
        parse_scan_reply(self.call(args)?)
    }

    /// Lazily iterate every member matching `pattern`, one page at a time.
    ///
    /// The iterator ends once the store reports cursor 0. If a page request
    /// fails, the error is yielded once and iteration stops.
    pub fn select(&self, pattern: &str) -> MemberScan<'_, B> {
        MemberScan {
            set: self,
            pattern: pattern.to_owned(),
            count_hint: 0,
            cursor: 0,
            buffer: VecDeque::new(),
            finished: false,
        }
    }
}

fn parse_scan_reply(reply: Value) -> Result<ScanPage> {
    let mut parts = reply.into_array()?.into_iter();
    let (Some(cursor), Some(entries), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::Protocol("scan reply must be [cursor, entries]".into()));
    };
    let raw = cursor.into_bytes()?;
    let cursor = std::str::from_utf8(&raw)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| Error::Protocol("scan cursor is not an unsigned integer".into()))?;
    Ok(ScanPage {
        cursor,
        entries: decode_entries(entries, true)?,
    })
}

/// Pull-based iterator over the members of a sorted set, backed by ZSCAN.
///
/// Created by [`SortedSet::select`].
#[derive(Debug)]
pub struct MemberScan<'a, B> {
    set: &'a SortedSet<B>,
    pattern: String,
    count_hint: usize,
    cursor: u64,
    buffer: VecDeque<Member>,
    finished: bool,
}

impl<'a, B: Backend> MemberScan<'a, B> {
    /// Ask the store for pages of roughly `n` members.
    pub fn count_hint(mut self, n: usize) -> Self {
        self.count_hint = n;
        self
    }

    /// Whether a further call to `next` may still produce a value.
    pub fn has_more(&self) -> bool {
        !self.buffer.is_empty() || !self.finished
    }

    fn fetch(&mut self) -> Result<()> {
        let page = self.set.scan(self.cursor, &self.pattern, self.count_hint)?;
        trace!(
            cursor = self.cursor,
            next = page.cursor,
            members = page.entries.len(),
            "fetched scan page"
        );
        self.cursor = page.cursor;
        self.finished = page.is_last();
        self.buffer.extend(page.entries.into_iter().map(|e| e.member));
        Ok(())
    }
}

impl<'a, B: Backend> Iterator for MemberScan<'a, B> {
    type Item = Result<Member>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(member) = self.buffer.pop_front() {
                return Some(Ok(member));
            }
            if self.finished {
                return None;
            }
            if let Err(e) = self.fetch() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}

impl<'a, B: Backend> FusedIterator for MemberScan<'a, B> {}
