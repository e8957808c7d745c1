//! Access policy helpers for word-granular instruction and data memory.

use crate::FaultCode;

/// Byte width of every modeled memory access.
pub const WORD_ACCESS_BYTES: u32 = 4;

/// What the data path does with an unaligned or out-of-range word access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryAccessPolicy {
    /// Reject the access with a fault; the instruction commits nothing.
    #[default]
    Strict,
    /// Drop the two low address bits and wrap modulo the memory size.
    Truncate,
}

/// Validates program-counter alignment for an instruction fetch.
///
/// # Errors
///
/// Returns [`FaultCode::MisalignedFetch`] when `pc` is not a multiple of 4.
pub const fn validate_fetch_alignment(pc: u32) -> Result<(), FaultCode> {
    if pc % WORD_ACCESS_BYTES == 0 {
        Ok(())
    } else {
        Err(FaultCode::MisalignedFetch)
    }
}

/// Validates alignment for a 32-bit data access.
///
/// # Errors
///
/// Returns [`FaultCode::UnalignedDataAccess`] when `addr` is not a multiple
/// of 4.
pub const fn validate_word_alignment(addr: u32) -> Result<(), FaultCode> {
    if addr % WORD_ACCESS_BYTES == 0 {
        Ok(())
    } else {
        Err(FaultCode::UnalignedDataAccess)
    }
}

/// Resolves a data address to the byte offset of a word inside a memory of
/// `size_bytes` bytes according to `policy`.
///
/// `size_bytes` is expected to be a non-zero multiple of 4.
///
/// # Errors
///
/// Under [`MemoryAccessPolicy::Strict`], returns
/// [`FaultCode::UnalignedDataAccess`] for unaligned addresses and
/// [`FaultCode::DataOutOfBounds`] when the word does not fit in memory.
/// [`MemoryAccessPolicy::Truncate`] never fails for a non-empty memory.
pub const fn resolve_data_address(
    addr: u32,
    size_bytes: usize,
    policy: MemoryAccessPolicy,
) -> Result<usize, FaultCode> {
    match policy {
        MemoryAccessPolicy::Strict => {
            if let Err(fault) = validate_word_alignment(addr) {
                return Err(fault);
            }
            let offset = addr as usize;
            if offset + WORD_ACCESS_BYTES as usize > size_bytes {
                return Err(FaultCode::DataOutOfBounds);
            }
            Ok(offset)
        }
        MemoryAccessPolicy::Truncate => {
            if size_bytes < WORD_ACCESS_BYTES as usize {
                return Err(FaultCode::DataOutOfBounds);
            }
            let aligned = (addr & !(WORD_ACCESS_BYTES - 1)) as usize;
            let words = size_bytes / WORD_ACCESS_BYTES as usize;
            Ok((aligned / WORD_ACCESS_BYTES as usize % words) * WORD_ACCESS_BYTES as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        resolve_data_address, validate_fetch_alignment, validate_word_alignment,
        MemoryAccessPolicy,
    };
    use crate::FaultCode;

    #[test]
    fn fetch_alignment_rejects_non_word_pcs() {
        assert_eq!(validate_fetch_alignment(0), Ok(()));
        assert_eq!(validate_fetch_alignment(0x0000_1000), Ok(()));
        for pc in [1, 2, 3, 0xFFFF_FFFF] {
            assert_eq!(validate_fetch_alignment(pc), Err(FaultCode::MisalignedFetch));
        }
    }

    #[test]
    fn word_alignment_outcome_is_deterministic_for_low_addresses() {
        for addr in 0_u32..=0x400 {
            if addr % 4 == 0 {
                assert_eq!(validate_word_alignment(addr), Ok(()));
            } else {
                assert_eq!(
                    validate_word_alignment(addr),
                    Err(FaultCode::UnalignedDataAccess)
                );
            }
        }
    }

    #[test]
    fn strict_policy_rejects_unaligned_and_out_of_range() {
        let policy = MemoryAccessPolicy::Strict;
        assert_eq!(resolve_data_address(0, 16, policy), Ok(0));
        assert_eq!(resolve_data_address(12, 16, policy), Ok(12));
        assert_eq!(
            resolve_data_address(2, 16, policy),
            Err(FaultCode::UnalignedDataAccess)
        );
        assert_eq!(
            resolve_data_address(16, 16, policy),
            Err(FaultCode::DataOutOfBounds)
        );
        assert_eq!(
            resolve_data_address(u32::MAX - 3, 16, policy),
            Err(FaultCode::DataOutOfBounds)
        );
    }

    #[test]
    fn truncate_policy_aligns_and_wraps() {
        let policy = MemoryAccessPolicy::Truncate;
        assert_eq!(resolve_data_address(3, 16, policy), Ok(0));
        assert_eq!(resolve_data_address(7, 16, policy), Ok(4));
        assert_eq!(resolve_data_address(16, 16, policy), Ok(0));
        assert_eq!(resolve_data_address(0xFFFF_FFFF, 16, policy), Ok(12));
        assert_eq!(
            resolve_data_address(0, 0, policy),
            Err(FaultCode::DataOutOfBounds)
        );
    }

    #[test]
    fn default_policy_is_strict() {
        assert_eq!(MemoryAccessPolicy::default(), MemoryAccessPolicy::Strict);
    }
}
