//! Fountain decoder
//!
//! Recovers fragments by peeling: a part whose fragment set contains a known
//! fragment (or a known mixed set) is XOR-reduced by it, and any part that
//! reduces to a single fragment is queued as recovered. Parts may arrive in
//! any order and any number of times.

use super::{xor_into, FragmentChooser, Receipt};
use crate::codec::{checksum, Part};
use crate::constants::{EXPECTED_PARTS_FACTOR, MAX_INCOMPLETE_PROGRESS};
use crate::error::DecodeError;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use tracing::{debug, trace, warn};

/// Values every part of one message shares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHeader {
    pub seq_len: usize,
    pub message_len: usize,
    pub checksum: u32,
    pub fragment_len: usize,
}

impl SessionHeader {
    fn of(part: &Part) -> Self {
        Self {
            seq_len: part.seq_len,
            message_len: part.message_len,
            checksum: part.checksum,
            fragment_len: part.fragment_len(),
        }
    }

    /// Reject a part that belongs to a different message
    pub fn check(&self, part: &Part) -> Result<(), DecodeError> {
        if part.checksum != self.checksum {
            return Err(DecodeError::foreign(
                "checksum",
                format_args!("{:08x}", self.checksum),
                format_args!("{:08x}", part.checksum),
            ));
        }
        if part.message_len != self.message_len {
            return Err(DecodeError::foreign(
                "message length",
                self.message_len,
                part.message_len,
            ));
        }
        if part.seq_len != self.seq_len {
            return Err(DecodeError::foreign(
                "sequence length",
                self.seq_len,
                part.seq_len,
            ));
        }
        if part.fragment_len() != self.fragment_len {
            return Err(DecodeError::foreign(
                "fragment length",
                self.fragment_len,
                part.fragment_len(),
            ));
        }
        Ok(())
    }
}

type Indexes = BTreeSet<usize>;

/// A part reduced to its fragment set and data
#[derive(Debug, Clone)]
struct Pending {
    indexes: Indexes,
    data: Vec<u8>,
}

impl Pending {
    /// Subtract `other` if its fragment set is contained in ours
    fn reduce_by(&mut self, other_indexes: &Indexes, other_data: &[u8]) {
        if other_indexes.is_subset(&self.indexes) {
            self.indexes = self.indexes.difference(other_indexes).copied().collect();
            xor_into(&mut self.data, other_data);
        }
    }
}

#[derive(Debug)]
struct Session {
    header: SessionHeader,
    chooser: FragmentChooser,
}

#[derive(Debug, Default)]
pub struct FountainDecoder {
    session: Option<Session>,
    /// Recovered fragments by index
    simple: BTreeMap<usize, Vec<u8>>,
    /// Unresolved mixed parts keyed by fragment set
    mixed: BTreeMap<Indexes, Vec<u8>>,
    queue: VecDeque<Pending>,
    seen: HashSet<u32>,
    processed: usize,
    outcome: Option<Result<Bytes, DecodeError>>,
}

impl FountainDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one part
    ///
    /// The first part fixes the session header. Parts of another message
    /// fail with `Foreign` and leave the decoder untouched.
    pub fn receive(&mut self, part: &Part) -> Result<Receipt, DecodeError> {
        if let Some(Err(e)) = &self.outcome {
            return Err(e.clone());
        }

        let session = match self.session.take() {
            Some(session) => {
                if let Err(e) = session.header.check(part) {
                    self.session = Some(session);
                    return Err(e);
                }
                session
            }
            None => {
                let header = SessionHeader::of(part);
                debug!(
                    "Session started: {} fragments of {} bytes, message {} bytes",
                    header.seq_len, header.fragment_len, header.message_len
                );
                Session {
                    chooser: FragmentChooser::new(header.seq_len),
                    header,
                }
            }
        };
        let indexes: Indexes = session
            .chooser
            .choose(part.seq_num, part.checksum)
            .into_iter()
            .collect();
        self.session = Some(session);

        if self.is_complete() || !self.seen.insert(part.seq_num) {
            trace!("Duplicate part {}", part.seq_num);
            return Ok(Receipt::Duplicate);
        }
        self.processed += 1;
        trace!("Part {} covers {:?}", part.seq_num, indexes);

        self.queue.push_back(Pending {
            indexes,
            data: part.data.to_vec(),
        });
        self.drain_queue();

        match &self.outcome {
            Some(Err(e)) => Err(e.clone()),
            _ => Ok(Receipt::Accepted),
        }
    }

    fn drain_queue(&mut self) {
        while self.outcome.is_none() {
            let Some(pending) = self.queue.pop_front() else {
                break;
            };
            if pending.indexes.len() == 1 {
                self.process_simple(pending);
            } else {
                self.process_mixed(pending);
            }
        }
        if self.outcome.is_some() {
            self.queue.clear();
            self.mixed.clear();
        }
    }

    fn process_simple(&mut self, pending: Pending) {
        let Some(&index) = pending.indexes.iter().next() else {
            return;
        };
        if self.simple.contains_key(&index) {
            return;
        }

        let reducer: Indexes = [index].into_iter().collect();
        self.reduce_mixed_by(&reducer, &pending.data);
        self.simple.insert(index, pending.data);
        trace!("Recovered fragment {}", index);

        if let Some(header) = self.header().copied() {
            if self.simple.len() == header.seq_len {
                self.finish(header);
            }
        }
    }

    fn process_mixed(&mut self, mut pending: Pending) {
        if self.mixed.contains_key(&pending.indexes) {
            return;
        }

        for (&index, data) in &self.simple {
            if pending.indexes.contains(&index) {
                pending.indexes.remove(&index);
                xor_into(&mut pending.data, data);
            }
        }
        for (indexes, data) in &self.mixed {
            pending.reduce_by(indexes, data);
        }

        match pending.indexes.len() {
            0 => {}
            1 => self.queue.push_back(pending),
            _ => {
                self.reduce_mixed_by(&pending.indexes, &pending.data);
                self.mixed.insert(pending.indexes, pending.data);
            }
        }
    }

    /// Reduce every stored mixed part by a newly known set
    fn reduce_mixed_by(&mut self, indexes: &Indexes, data: &[u8]) {
        let old = std::mem::take(&mut self.mixed);
        for (key, value) in old {
            let mut reduced = Pending {
                indexes: key,
                data: value,
            };
            reduced.reduce_by(indexes, data);
            match reduced.indexes.len() {
                0 => {}
                1 => self.queue.push_back(reduced),
                _ => {
                    self.mixed.insert(reduced.indexes, reduced.data);
                }
            }
        }
    }

    fn finish(&mut self, header: SessionHeader) {
        let mut message = Vec::with_capacity(header.seq_len * header.fragment_len);
        for fragment in self.simple.values() {
            message.extend_from_slice(fragment);
        }
        message.truncate(header.message_len);

        let actual = checksum(&message);
        if actual == header.checksum {
            debug!(
                "Message recovered after {} parts ({} bytes)",
                self.processed, header.message_len
            );
            self.outcome = Some(Ok(Bytes::from(message)));
        } else {
            warn!(
                "Recovered message fails checksum: expected {:08x}, got {:08x}",
                header.checksum, actual
            );
            self.outcome = Some(Err(DecodeError::Corrupted {
                expected: header.checksum,
                actual,
            }));
        }
    }

    /// The recovered message, once complete
    pub fn result(&self) -> Result<&Bytes, DecodeError> {
        match &self.outcome {
            Some(Ok(message)) => Ok(message),
            Some(Err(e)) => Err(e.clone()),
            None => Err(DecodeError::Incomplete {
                recovered: self.simple.len(),
                expected: self.expected_fragment_count(),
            }),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, Some(Ok(_)))
    }

    /// Whether a fatal error ended the session
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Some(Err(_)))
    }

    pub fn header(&self) -> Option<&SessionHeader> {
        self.session.as_ref().map(|s| &s.header)
    }

    /// Pure fragment count, 0 before the first part
    pub fn expected_fragment_count(&self) -> usize {
        self.header().map(|h| h.seq_len).unwrap_or(0)
    }

    pub fn recovered_fragment_count(&self) -> usize {
        self.simple.len()
    }

    /// Distinct parts accepted so far
    pub fn processed_parts_count(&self) -> usize {
        self.processed
    }

    /// Rough completion estimate in `[0, 1]`
    pub fn estimated_percent_complete(&self) -> f64 {
        if self.is_complete() {
            return 1.0;
        }
        let Some(header) = self.header() else {
            return 0.0;
        };
        let expected = header.seq_len as f64 * EXPECTED_PARTS_FACTOR;
        (self.processed as f64 / expected).min(MAX_INCOMPLETE_PROGRESS)
    }
}
