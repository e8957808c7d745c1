//! Instruction and data memory backing stores.
//!
//! The core is Harvard: instructions live in a word-indexed instruction
//! memory the harness loads directly, data lives in a flat little-endian
//! byte store reached only through `LW`/`SW`.

/// Alignment and address-resolution policy helpers.
pub mod access;

pub use access::{
    resolve_data_address, validate_fetch_alignment, validate_word_alignment, MemoryAccessPolicy,
    WORD_ACCESS_BYTES,
};

use crate::FaultCode;

/// Word-addressed instruction memory, zero-filled at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InstructionMemory {
    words: Box<[u32]>,
}

impl InstructionMemory {
    /// Allocates `capacity_words` zeroed instruction slots.
    #[must_use]
    pub fn new(capacity_words: usize) -> Self {
        Self {
            words: vec![0; capacity_words].into_boxed_slice(),
        }
    }

    /// Number of instruction slots.
    #[must_use]
    pub fn capacity_words(&self) -> usize {
        self.words.len()
    }

    /// Fetches the instruction word at byte address `pc`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::MisalignedFetch`] for a PC that is not a multiple
    /// of 4 and [`FaultCode::FetchOutOfBounds`] past the end of memory.
    pub fn fetch(&self, pc: u32) -> Result<u32, FaultCode> {
        validate_fetch_alignment(pc)?;
        self.words
            .get((pc / WORD_ACCESS_BYTES) as usize)
            .copied()
            .ok_or(FaultCode::FetchOutOfBounds)
    }

    /// Writes one instruction word at byte address `addr`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`InstructionMemory::fetch`].
    pub fn write_word(&mut self, addr: u32, word: u32) -> Result<(), FaultCode> {
        validate_fetch_alignment(addr)?;
        let slot = self
            .words
            .get_mut((addr / WORD_ACCESS_BYTES) as usize)
            .ok_or(FaultCode::FetchOutOfBounds)?;
        *slot = word;
        Ok(())
    }

    /// Copies `program` into memory starting at address 0.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::FetchOutOfBounds`] if the program does not fit;
    /// memory is left untouched in that case.
    pub fn load_program(&mut self, program: &[u32]) -> Result<(), FaultCode> {
        let target = self
            .words
            .get_mut(..program.len())
            .ok_or(FaultCode::FetchOutOfBounds)?;
        target.copy_from_slice(program);
        Ok(())
    }

    /// Zero-fills every slot.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Borrows the raw word image.
    #[must_use]
    pub fn as_words(&self) -> &[u32] {
        &self.words
    }
}

/// Flat byte-addressable data memory with little-endian word access.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DataMemory {
    bytes: Box<[u8]>,
}

impl DataMemory {
    /// Allocates `size_bytes` zeroed bytes, rounded down to whole words.
    #[must_use]
    pub fn new(size_bytes: usize) -> Self {
        let size = size_bytes - size_bytes % WORD_ACCESS_BYTES as usize;
        Self {
            bytes: vec![0; size].into_boxed_slice(),
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-sized memory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reads a little-endian word at `addr`, resolved through `policy`.
    ///
    /// # Errors
    ///
    /// See [`resolve_data_address`].
    pub fn read_word(&self, addr: u32, policy: MemoryAccessPolicy) -> Result<u32, FaultCode> {
        let offset = resolve_data_address(addr, self.bytes.len(), policy)?;
        let mut word = [0_u8; 4];
        word.copy_from_slice(&self.bytes[offset..offset + 4]);
        Ok(u32::from_le_bytes(word))
    }

    /// Writes a little-endian word at `addr`, resolved through `policy`.
    ///
    /// # Errors
    ///
    /// See [`resolve_data_address`].
    pub fn write_word(
        &mut self,
        addr: u32,
        value: u32,
        policy: MemoryAccessPolicy,
    ) -> Result<(), FaultCode> {
        let offset = resolve_data_address(addr, self.bytes.len(), policy)?;
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Borrows the raw byte image.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
