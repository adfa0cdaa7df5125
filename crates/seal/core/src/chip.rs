//! Chip profiles for the supported NTAG21x models
//!
//! The capability container (page 3) carries the NDEF data area size in byte 2,
//! which is unique per model and doubles as the chip code.

use derive_more::Display;

use crate::{Error, Result};

/// Page holding the capability container
pub const CAPABILITY_CONTAINER_PAGE: u16 = 3;

/// Index of the chip code within the capability container
pub const CHIP_CODE_INDEX: usize = 2;

/// Supported chip models
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipModel {
    /// NTAG213, 144 bytes user memory
    #[display("NTAG213")]
    Ntag213,
    /// NTAG215, 504 bytes user memory
    #[display("NTAG215")]
    Ntag215,
    /// NTAG216, 888 bytes user memory
    #[display("NTAG216")]
    Ntag216,
}

/// Fixed memory layout of a chip model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipProfile {
    /// Chip model
    pub model: ChipModel,
    /// First configuration page (CFG0, holding AUTH0); CFG1 follows it
    pub config_page: u16,
    /// Password register page
    pub password_page: u16,
    /// PACK register page
    pub pack_page: u16,
}

const NTAG213: ChipProfile = ChipProfile {
    model: ChipModel::Ntag213,
    config_page: 0x29,
    password_page: 0x2B,
    pack_page: 0x2C,
};

const NTAG215: ChipProfile = ChipProfile {
    model: ChipModel::Ntag215,
    config_page: 0x83,
    password_page: 0x85,
    pack_page: 0x86,
};

const NTAG216: ChipProfile = ChipProfile {
    model: ChipModel::Ntag216,
    config_page: 0xE3,
    password_page: 0xE5,
    pack_page: 0xE6,
};

impl ChipProfile {
    /// Look up the profile for a capability container chip code
    pub const fn from_code(code: u8) -> Result<Self> {
        match code {
            0x12 => Ok(NTAG213),
            0x3E => Ok(NTAG215),
            0x6D => Ok(NTAG216),
            other => Err(Error::UnknownChip(other)),
        }
    }

    /// Resolve the profile from the 4-byte capability container
    pub fn from_capability_container(cc: &[u8]) -> Result<Self> {
        let code = cc
            .get(CHIP_CODE_INDEX)
            .copied()
            .ok_or(Error::field_length("capability container", 4, cc.len()))?;
        Self::from_code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        let p = ChipProfile::from_code(0x12).unwrap();
        assert_eq!(p.model, ChipModel::Ntag213);
        assert_eq!((p.config_page, p.password_page, p.pack_page), (0x29, 0x2B, 0x2C));

        let p = ChipProfile::from_code(0x3E).unwrap();
        assert_eq!(p.model, ChipModel::Ntag215);
        assert_eq!((p.config_page, p.password_page, p.pack_page), (0x83, 0x85, 0x86));

        let p = ChipProfile::from_code(0x6D).unwrap();
        assert_eq!(p.model, ChipModel::Ntag216);
        assert_eq!((p.config_page, p.password_page, p.pack_page), (0xE3, 0xE5, 0xE6));
    }

    #[test]
    fn test_unknown_codes() {
        for code in [0x00, 0x06, 0x13, 0x3F, 0x6C, 0xFF] {
            assert!(matches!(
                ChipProfile::from_code(code),
                Err(Error::UnknownChip(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_capability_container() {
        let cc = [0xE1, 0x10, 0x3E, 0x00];
        assert_eq!(
            ChipProfile::from_capability_container(&cc).unwrap().model,
            ChipModel::Ntag215
        );
        assert!(matches!(
            ChipProfile::from_capability_container(&[0xE1, 0x10]),
            Err(Error::InvalidFieldLength { .. })
        ));
        assert_eq!(ChipModel::Ntag216.to_string(), "NTAG216");
    }
}
