//! Fountain coding of a message into fixed-size parts
//!
//! The message is zero-padded and split into `F` equal fragments. Parts with
//! sequence numbers `1..=F` carry one fragment each. Higher sequence numbers
//! carry the XOR of a pseudo-random fragment subset whose size follows a
//! 1/d degree distribution. The subset is a pure function of the sequence
//! number and the message checksum, so the decoder rebuilds it without any
//! extra bytes on the wire.

pub mod decoder;
pub mod encoder;
pub mod sampler;
pub mod xoshiro;

pub use decoder::FountainDecoder;
pub use encoder::FountainEncoder;

use bytes::Bytes;
use sampler::WeightedSampler;
use xoshiro::Xoshiro256;

/// Outcome of feeding one part (or frame) to a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    /// New information was recorded
    Accepted,
    /// Already seen (or the payload is already complete); nothing changed
    Duplicate,
}

/// Fragment length for a message of `message_len` bytes
///
/// Picks the smallest fragment count whose fragments fit in
/// `max_fragment_len`, never splitting below `min_fragment_len` bytes.
/// `min_fragment_len` is clamped to `1..=max_fragment_len`.
pub fn fragment_len(message_len: usize, min_fragment_len: usize, max_fragment_len: usize) -> usize {
    let max = max_fragment_len.max(1);
    let min = min_fragment_len.clamp(1, max);
    if message_len == 0 {
        return 0;
    }

    let max_count = message_len.div_ceil(min);
    (1..=max_count)
        .map(|count| message_len.div_ceil(count))
        .find(|&len| len <= max)
        .unwrap_or(min)
}

/// Split `message` into zero-padded fragments of `fragment_len` bytes
pub fn partition(message: &[u8], fragment_len: usize) -> Vec<Bytes> {
    if fragment_len == 0 {
        return Vec::new();
    }
    message
        .chunks(fragment_len)
        .map(|chunk| {
            let mut fragment = chunk.to_vec();
            fragment.resize(fragment_len, 0);
            Bytes::from(fragment)
        })
        .collect()
}

/// XOR `source` into `target` (equal lengths)
#[inline]
pub(crate) fn xor_into(target: &mut [u8], source: &[u8]) {
    debug_assert_eq!(target.len(), source.len());
    for (t, s) in target.iter_mut().zip(source) {
        *t ^= s;
    }
}

/// Maps sequence numbers to fragment index sets
///
/// Holds the degree sampler so it is built once per message rather than
/// once per part.
#[derive(Debug, Clone)]
pub struct FragmentChooser {
    seq_len: usize,
    degrees: WeightedSampler,
}

impl FragmentChooser {
    pub fn new(seq_len: usize) -> Self {
        let weights: Vec<f64> = (0..seq_len.max(1)).map(|i| 1.0 / (i + 1) as f64).collect();
        Self {
            seq_len,
            degrees: WeightedSampler::new(&weights),
        }
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Fragment indexes (0-based) combined into part `seq_num`
    ///
    /// Pure parts yield one index. Mixed parts yield a shuffle prefix, in
    /// draw order.
    pub fn choose(&self, seq_num: u32, checksum: u32) -> Vec<usize> {
        if seq_num as usize <= self.seq_len {
            return vec![seq_num.saturating_sub(1) as usize];
        }

        let mut seed = [0u8; 8];
        seed[..4].copy_from_slice(&seq_num.to_be_bytes());
        seed[4..].copy_from_slice(&checksum.to_be_bytes());
        let mut rng = Xoshiro256::from_seed(&seed);

        let degree = self.degrees.next(&mut rng) + 1;
        // O(seq_len) per mixed part, bounded by MAX_SEQ_LEN. Removing from
        // an ordered list keeps the draw order other UR decoders expect.
        let mut remaining: Vec<usize> = (0..self.seq_len).collect();
        let mut chosen = Vec::with_capacity(degree);
        while chosen.len() < degree && !remaining.is_empty() {
            let i = rng.next_int(0, remaining.len() as u64 - 1) as usize;
            chosen.push(remaining.remove(i.min(remaining.len() - 1)));
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_len() {
        assert_eq!(fragment_len(37, 10, 10), 10);
        assert_eq!(fragment_len(5, 10, 100), 5);
        assert_eq!(fragment_len(259, 10, 30), 29);
        assert_eq!(fragment_len(12345, 1005, 1955), 1764);
        assert_eq!(fragment_len(12345, 1005, 30000), 12345);
        assert_eq!(fragment_len(0, 10, 100), 0);
    }

    #[test]
    fn test_fragment_len_clamps_min_to_max() {
        // min above max would otherwise allow fragments longer than max
        assert_eq!(fragment_len(100, 50, 7), 7);
        assert_eq!(fragment_len(5, 10, 1), 1);
    }

    #[test]
    fn test_partition_pads_last_fragment() {
        let message: Vec<u8> = (0u8..37).collect();
        let fragments = partition(&message, 10);
        assert_eq!(fragments.len(), 4);
        assert!(fragments.iter().all(|f| f.len() == 10));
        assert_eq!(&fragments[3][..], &[30, 31, 32, 33, 34, 35, 36, 0, 0, 0]);
    }

    #[test]
    fn test_xor_into() {
        let mut a = vec![0b1010, 0xff];
        xor_into(&mut a, &[0b0110, 0x0f]);
        assert_eq!(a, vec![0b1100, 0xf0]);
    }

    #[test]
    fn test_pure_parts_choose_own_fragment() {
        let chooser = FragmentChooser::new(9);
        for seq in 1..=9u32 {
            assert_eq!(chooser.choose(seq, 0xdead_beef), vec![seq as usize - 1]);
        }
    }

    #[test]
    fn test_mixed_parts_match_reference() {
        let mut rng = Xoshiro256::from_seed(b"Wolf");
        let mut message = vec![0x59, 0x01, 0x00];
        message.extend(rng.next_data(256));
        let checksum = crate::codec::checksum(&message);

        let chooser = FragmentChooser::new(9);
        assert_eq!(chooser.choose(10, checksum), vec![0]);
        assert_eq!(chooser.choose(11, checksum), vec![2]);
        assert_eq!(chooser.choose(12, checksum), vec![6, 2]);
        assert_eq!(chooser.choose(13, checksum), vec![3, 7, 8]);
        assert_eq!(chooser.choose(14, checksum), vec![0, 6]);
        assert_eq!(chooser.choose(15, checksum), vec![6, 5]);
    }

    #[test]
    fn test_chooser_at_fragment_limit() {
        use crate::constants::MAX_SEQ_LEN;

        let chooser = FragmentChooser::new(MAX_SEQ_LEN);
        let seq = MAX_SEQ_LEN as u32;
        for seq_num in seq + 1..seq + 50 {
            let mut indexes = chooser.choose(seq_num, 0x1234_5678);
            let degree = indexes.len();
            assert!(degree >= 1);
            assert!(indexes.iter().all(|&i| i < MAX_SEQ_LEN));
            indexes.sort_unstable();
            indexes.dedup();
            assert_eq!(indexes.len(), degree);
        }
    }

    #[test]
    fn test_mixed_indexes_distinct_and_in_range() {
        let chooser = FragmentChooser::new(17);
        for seq in 18..500u32 {
            let mut indexes = chooser.choose(seq, 42);
            assert!(!indexes.is_empty());
            assert!(indexes.iter().all(|&i| i < 17));
            indexes.sort_unstable();
            indexes.dedup();
            assert_eq!(indexes.len(), chooser.choose(seq, 42).len());
        }
    }
}
