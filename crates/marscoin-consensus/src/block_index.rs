//! Read-only view over the header chain.

/// A node in the block-index chain, as seen by the difficulty algorithms.
///
/// The chain is a singly-linked list by `prev`; genesis has no
/// predecessor. Implementations own the storage (an arena, reference
/// counting, a database cache); the difficulty code only ever walks
/// backwards through this view and never retains references past a call.
pub trait BlockIndexView: Sized {
    /// Height of this block; genesis is 0.
    fn height(&self) -> i32;

    /// Block timestamp in seconds. Not guaranteed to be monotonic along
    /// the chain; miners may skew within protocol-allowed bounds.
    fn time(&self) -> i64;

    /// Compact difficulty target this block was mined against.
    fn nbits(&self) -> u32;

    /// The previous block, or `None` for genesis.
    fn prev(&self) -> Option<&Self>;

    /// The ancestor `n` links back, or genesis if the chain is shorter.
    fn walk_back(&self, n: i64) -> &Self {
        let mut node = self;
        for _ in 0..n {
            match node.prev() {
                Some(prev) => node = prev,
                None => break,
            }
        }
        node
    }
}
