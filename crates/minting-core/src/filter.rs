//! Same-type ancestor lookup on an interleaved PoW/PoS chain.
//!
//! Retargeting for one proof type must only ever see blocks of that type.
//! Walks are iterative so long chains cannot exhaust the stack.

use crate::chain::{BlockHeader, ChainView, ProofType};

/// Most recent header of type `want`, starting at `start` itself.
///
/// Returns `None` when the root of the view is passed without a match.
pub fn most_recent_of_type<'a, C>(chain: &'a C, start: &'a BlockHeader, want: ProofType) -> Option<&'a BlockHeader>
where
    C: ChainView + ?Sized,
{
    let mut current = start;
    loop {
        if current.proof_type == want {
            return Some(current);
        }
        current = chain.prev(current)?;
    }
}

/// Iterator over headers of one proof type, newest first.
pub struct AncestorsOfType<'a, C: ?Sized> {
    chain: &'a C,
    next: Option<&'a BlockHeader>,
    want: ProofType,
}

impl<'a, C: ChainView + ?Sized> Iterator for AncestorsOfType<'a, C> {
    type Item = &'a BlockHeader;

    fn next(&mut self) -> Option<Self::Item> {
        let found = most_recent_of_type(self.chain, self.next?, self.want);
        self.next = found.and_then(|header| self.chain.prev(header));
        found
    }
}

/// Headers of type `want` from `start` (inclusive) back to the root.
pub fn ancestors_of_type<'a, C>(chain: &'a C, start: &'a BlockHeader, want: ProofType) -> AncestorsOfType<'a, C>
where
    C: ChainView + ?Sized,
{
    AncestorsOfType {
        chain,
        next: Some(start),
        want,
    }
}

/// Most recent header of type `want` strictly before `header`.
pub fn previous_of_type<'a, C>(chain: &'a C, header: &'a BlockHeader, want: ProofType) -> Option<&'a BlockHeader>
where
    C: ChainView + ?Sized,
{
    let prev = chain.prev(header)?;
    most_recent_of_type(chain, prev, want)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::CompactTarget;
    use crate::params::Height;

    /// Build a chain from a pattern string, 'w' for PoW and 's' for PoS.
    fn chain_from(pattern: &str) -> Vec<BlockHeader> {
        pattern
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let proof_type = if c == 's' { ProofType::Stake } else { ProofType::Work };
                BlockHeader::new(i as Height, 1_000 + 60 * i as i64, CompactTarget(0x1d00ffff), proof_type)
            })
            .collect()
    }

    #[test]
    fn test_none_without_match() {
        let chain = chain_from("wwww");
        let tip = chain.last().unwrap();
        assert!(most_recent_of_type(&chain, tip, ProofType::Stake).is_none());
    }

    #[test]
    fn test_matching_start_is_returned() {
        let chain = chain_from("wsws");
        let tip = chain.last().unwrap();
        let found = most_recent_of_type(&chain, tip, ProofType::Stake).unwrap();
        assert!(core::ptr::eq(found, tip));
    }

    #[test]
    fn test_skips_other_type() {
        let chain = chain_from("wsswss");
        let tip = chain.last().unwrap();
        let found = most_recent_of_type(&chain, tip, ProofType::Work).unwrap();
        assert_eq!(found.height, 3);
    }

    #[test]
    fn test_previous_of_type() {
        let chain = chain_from("wswsw");
        let tip = chain.last().unwrap();
        assert_eq!(previous_of_type(&chain, tip, ProofType::Work).map(|h| h.height), Some(2));
        assert!(previous_of_type(&chain, &chain[0], ProofType::Work).is_none());
    }

    #[test]
    fn test_ancestors_of_type_order() {
        let chain = chain_from("wsswsws");
        let tip = chain.last().unwrap();

        let stake: Vec<Height> = ancestors_of_type(&chain, tip, ProofType::Stake).map(|h| h.height).collect();
        assert_eq!(stake, vec![6, 4, 2, 1]);

        let work: Vec<Height> = ancestors_of_type(&chain, tip, ProofType::Work).map(|h| h.height).collect();
        assert_eq!(work, vec![5, 3, 0]);
    }

    #[test]
    fn test_long_walk_is_iterative() {
        let mut pattern = String::from("s");
        pattern.push_str(&"w".repeat(200_000));
        let chain = chain_from(&pattern);
        let tip = chain.last().unwrap();
        assert_eq!(most_recent_of_type(&chain, tip, ProofType::Stake).map(|h| h.height), Some(0));
    }
}
