//! Packed validation word.
//!
//! Layout of the 256-bit big-endian word:
//! - bits 0..160: aggregator / failure region (0 = success, 1 = signature failure)
//! - bits 160..208: `valid_until`
//! - bits 208..256: `valid_after`

use crate::{be_u48, read_be_u48, Address, ValidityWindow, B256, MAX_U48};

/// Aggregator value signalling a failed signature.
pub const SIG_VALIDATION_FAILED: Address = Address([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
]);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationData {
    pub aggregator: Address,
    pub valid_until: u64,
    pub valid_after: u64,
}

impl ValidationData {
    pub fn success(window: ValidityWindow) -> Self {
        Self {
            aggregator: Address::ZERO,
            valid_until: window.valid_until,
            valid_after: window.valid_after,
        }
    }

    /// Soft failure with an unbounded window.
    pub fn failed() -> Self {
        Self {
            aggregator: SIG_VALIDATION_FAILED,
            valid_until: 0,
            valid_after: 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.aggregator == SIG_VALIDATION_FAILED
    }

    pub fn window(&self) -> ValidityWindow {
        ValidityWindow::new(self.valid_after, self.valid_until)
    }

    pub fn pack(&self) -> B256 {
        let mut word = [0u8; 32];
        word[..6].copy_from_slice(&be_u48(self.valid_after & MAX_U48));
        word[6..12].copy_from_slice(&be_u48(self.valid_until & MAX_U48));
        word[12..].copy_from_slice(self.aggregator.as_ref());
        word
    }

    pub fn unpack(word: &B256) -> Self {
        let mut after = [0u8; 6];
        after.copy_from_slice(&word[..6]);
        let mut until = [0u8; 6];
        until.copy_from_slice(&word[6..12]);
        Self {
            aggregator: Address::from_word(word),
            valid_until: read_be_u48(&until),
            valid_after: read_be_u48(&after),
        }
    }
}

/// Packs a result word from a failure flag and a window.
pub fn pack_validation_data(failed: bool, valid_until: u64, valid_after: u64) -> B256 {
    ValidationData {
        aggregator: if failed {
            SIG_VALIDATION_FAILED
        } else {
            Address::ZERO
        },
        valid_until,
        valid_after,
    }
    .pack()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(word: &B256, lo: usize, hi: usize) -> u64 {
        // bit 0 is the least significant bit of word[31]
        let mut value = 0u64;
        for bit in (lo..hi).rev() {
            let byte = word[31 - bit / 8];
            value = (value << 1) | ((byte >> (bit % 8)) & 1) as u64;
        }
        value
    }

    #[test]
    fn test_success_and_failure_words() {
        assert_eq!(pack_validation_data(false, 0, 0), [0u8; 32]);
        let mut one = [0u8; 32];
        one[31] = 1;
        assert_eq!(pack_validation_data(true, 0, 0), one);
    }

    #[test]
    fn test_window_bit_offsets() {
        let word = pack_validation_data(false, 1_700_000_100, 1_700_000_000);
        assert_eq!(bits(&word, 0, 160), 0);
        assert_eq!(bits(&word, 160, 208), 1_700_000_100);
        assert_eq!(bits(&word, 208, 256), 1_700_000_000);
    }

    #[test]
    fn test_unpack_inverts_pack() {
        let data = ValidationData {
            aggregator: SIG_VALIDATION_FAILED,
            valid_until: 77,
            valid_after: 5,
        };
        assert_eq!(ValidationData::unpack(&data.pack()), data);
        assert!(data.is_failed());
    }
}
