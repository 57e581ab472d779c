//! Test-chain builders for consensus tests.
//!
//! Chains here are owned linked lists: the tip owns its whole ancestor
//! chain, which is exactly the shape the difficulty algorithms walk.
//! Builders are deterministic; no randomness, no clocks.

use marscoin_consensus::BlockIndexView;

/// An owned block-index node.
#[derive(Debug)]
pub struct TestBlock {
    pub height: i32,
    pub time: i64,
    pub nbits: u32,
    pub prev: Option<Box<TestBlock>>,
}

impl BlockIndexView for TestBlock {
    fn height(&self) -> i32 {
        self.height
    }

    fn time(&self) -> i64 {
        self.time
    }

    fn nbits(&self) -> u32 {
        self.nbits
    }

    fn prev(&self) -> Option<&Self> {
        self.prev.as_deref()
    }
}

impl Drop for TestBlock {
    // The default recursive drop would blow the stack on retarget-window
    // sized chains.
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(mut node) = prev {
            prev = node.prev.take();
        }
    }
}

/// Deterministic chain builder.
///
/// A chain can start at any height, so tests build just the window an
/// algorithm walks instead of the whole history from genesis.
pub struct ChainBuilder {
    tip: Box<TestBlock>,
}

impl ChainBuilder {
    /// Start a chain at genesis.
    pub fn genesis(time: i64, nbits: u32) -> Self {
        Self::from_anchor(0, time, nbits)
    }

    /// Start a chain mid-history; the base block has no predecessor.
    pub fn from_anchor(height: i32, time: i64, nbits: u32) -> Self {
        ChainBuilder {
            tip: Box::new(TestBlock {
                height,
                time,
                nbits,
                prev: None,
            }),
        }
    }

    /// Append one block with an absolute timestamp.
    pub fn add_block(mut self, time: i64, nbits: u32) -> Self {
        let height = self.tip.height + 1;
        self.tip = Box::new(TestBlock {
            height,
            time,
            nbits,
            prev: Some(self.tip),
        });
        self
    }

    /// Append `n` blocks, each `gap` seconds after its parent.
    pub fn add_spaced(mut self, n: usize, gap: i64, nbits: u32) -> Self {
        for _ in 0..n {
            let time = self.tip.time + gap;
            self = self.add_block(time, nbits);
        }
        self
    }

    /// The current tip.
    pub fn tip(&self) -> &TestBlock {
        &self.tip
    }
}
