use thiserror::Error;

/// Fault classes used for reporting aggregation in the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Decoder rejected an instruction encoding or register index.
    Decode,
    /// Instruction fetch or data access violated the memory policy.
    Memory,
}

/// Stable fault taxonomy for the reference model.
///
/// None of these are architectural traps. A fault stops the model at the
/// offending instruction with no side effects committed and is reported to
/// the harness through [`crate::StepOutcome::Fault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// Opcode or funct field combination outside the modeled instruction set.
    #[error("illegal instruction encoding")]
    IllegalEncoding = 0x01,
    /// Register index wider than five bits supplied through a host API.
    #[error("register index out of range")]
    RegisterIndexOutOfRange = 0x02,
    /// Program counter is not word aligned.
    #[error("instruction fetch from misaligned program counter")]
    MisalignedFetch = 0x03,
    /// Program counter points past the end of instruction memory.
    #[error("instruction fetch outside instruction memory")]
    FetchOutOfBounds = 0x04,
    /// Word load/store used an address that is not a multiple of four.
    #[error("unaligned 32-bit data access")]
    UnalignedDataAccess = 0x05,
    /// Word load/store reached past the end of data memory.
    #[error("data access outside data memory")]
    DataOutOfBounds = 0x06,
}

impl FaultCode {
    /// Converts a fault code to its stable numeric value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable numeric value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::IllegalEncoding),
            0x02 => Some(Self::RegisterIndexOutOfRange),
            0x03 => Some(Self::MisalignedFetch),
            0x04 => Some(Self::FetchOutOfBounds),
            0x05 => Some(Self::UnalignedDataAccess),
            0x06 => Some(Self::DataOutOfBounds),
            _ => None,
        }
    }

    /// Returns the reporting class for this fault code.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::IllegalEncoding | Self::RegisterIndexOutOfRange => FaultClass::Decode,
            Self::MisalignedFetch
            | Self::FetchOutOfBounds
            | Self::UnalignedDataAccess
            | Self::DataOutOfBounds => FaultClass::Memory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FaultClass, FaultCode};

    #[test]
    fn stable_code_roundtrip_is_bijective_for_defined_values() {
        for code in 0x01u8..=0x06 {
            let fault = FaultCode::from_u8(code).expect("defined taxonomy code");
            assert_eq!(fault.as_u8(), code);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(FaultCode::from_u8(0x00).is_none());
        assert!(FaultCode::from_u8(0x07).is_none());
        assert!(FaultCode::from_u8(0xFF).is_none());
    }

    #[test]
    fn class_mapping_matches_fault_taxonomy() {
        assert_eq!(FaultCode::IllegalEncoding.class(), FaultClass::Decode);
        assert_eq!(
            FaultCode::RegisterIndexOutOfRange.class(),
            FaultClass::Decode
        );
        assert_eq!(FaultCode::MisalignedFetch.class(), FaultClass::Memory);
        assert_eq!(FaultCode::FetchOutOfBounds.class(), FaultClass::Memory);
        assert_eq!(FaultCode::UnalignedDataAccess.class(), FaultClass::Memory);
        assert_eq!(FaultCode::DataOutOfBounds.class(), FaultClass::Memory);
    }

    #[test]
    fn messages_are_lowercase_and_stable() {
        assert_eq!(
            FaultCode::IllegalEncoding.to_string(),
            "illegal instruction encoding"
        );
        assert_eq!(
            FaultCode::DataOutOfBounds.to_string(),
            "data access outside data memory"
        );
    }
}
