//! Block receipt summarizing one block of Dex messages.
//!
//! The receipt is produced by `end_block` and commits to the full module
//! store through its state root.

use ssz_rs::prelude::*;
use sha2::{Digest, Sha256};

/// Summary of a processed block.
///
/// ## State Root
///
/// The 32-byte state root is a SHA-256 hash over every key and value of
/// the module store in key order. Two engines that processed the same
/// messages produce the same root.
///
/// ## Example
///
/// ```
/// use tick_dex::types::BlockReceipt;
///
/// let receipt = BlockReceipt::new(7, 1_700_000_000, 12, 1, 3, [0u8; 32]);
/// assert_eq!(receipt.messages_succeeded(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct BlockReceipt {
    pub height: u64,

    /// Block time in unix seconds
    pub block_time: u64,

    pub messages_processed: u64,

    /// Messages rolled back because their handler returned an error
    pub messages_failed: u64,

    /// Expired tranches moved to the inactive set by the sweep
    pub orders_purged: u64,

    /// State root after the block (SHA-256, 32 bytes)
    pub state_root: [u8; 32],
}

impl BlockReceipt {
    pub fn new(
        height: u64,
        block_time: u64,
        messages_processed: u64,
        messages_failed: u64,
        orders_purged: u64,
        state_root: [u8; 32],
    ) -> Self {
        Self {
            height,
            block_time,
            messages_processed,
            messages_failed,
            orders_purged,
            state_root,
        }
    }

    /// Compute SHA-256 hash of the given data
    pub fn compute_hash(data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    /// Get the state root as a hex string
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }

    pub fn messages_succeeded(&self) -> u64 {
        self.messages_processed.saturating_sub(self.messages_failed)
    }

    /// No message reached the Dex in this block
    pub fn is_empty(&self) -> bool {
        self.messages_processed == 0
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_new() {
        let receipt = BlockReceipt::new(3, 1_700_000_000, 10, 2, 1, [1u8; 32]);
        assert_eq!(receipt.height, 3);
        assert_eq!(receipt.messages_succeeded(), 8);
        assert_eq!(receipt.orders_purged, 1);
        assert!(!receipt.is_empty());
        assert!(BlockReceipt::default().is_empty());
    }

    #[test]
    fn test_receipt_hash_determinism() {
        let hash1 = BlockReceipt::compute_hash(b"test data");
        let hash2 = BlockReceipt::compute_hash(b"test data");
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, BlockReceipt::compute_hash(b"different data"));
    }

    #[test]
    fn test_receipt_state_root_hex() {
        let receipt = BlockReceipt::new(1, 0, 0, 0, 0, [0xAB; 32]);
        let hex = receipt.state_root_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("abab"));
    }

    #[test]
    fn test_receipt_ssz_roundtrip() {
        let receipt = BlockReceipt::new(9, 1_700_000_000, 100, 4, 2, [0xCD; 32]);
        let bytes = ssz_rs::serialize(&receipt).expect("Failed to serialize");
        // 5 * 8 + 32
        assert_eq!(bytes.len(), 72);
        let decoded: BlockReceipt = ssz_rs::deserialize(&bytes).expect("Failed to deserialize");
        assert_eq!(decoded, receipt);
    }
}
