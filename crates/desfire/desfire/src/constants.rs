/// ISO/IEC 7816-4 DF name of the DESFire application
pub const DESFIRE_AID: [u8; 7] = [0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x00];

/// Application id of the PICC level (master) application
pub const ROOT_APPLICATION: u32 = 0x00_0000;
/// Largest three-byte application id
pub const MAX_APPLICATION_ID: u32 = 0xFF_FFFF;

/// Highest key number inside an application
pub const MAX_KEY_NO: u8 = 0x0F;

/// Class byte wrapping DESFire native commands
pub const NATIVE_CLA: u8 = 0x90;
/// SW1 of a wrapped native answer; SW2 then holds the DESFire status
pub const NATIVE_SW1: u8 = 0x91;

/// ISO/IEC 7816-4 class bytes
pub mod cla {
    /// No secure messaging, last or only command of a chain
    pub const WITHOUT_SM_LAST: u8 = 0x00;
    /// Secure messaging with header authentication, last or only command of a chain
    pub const WITH_SM_LAST: u8 = 0x0C;
    /// No secure messaging, more commands follow
    pub const WITHOUT_SM_CONTINUED: u8 = 0x10;
    /// Secure messaging with header authentication, more commands follow
    pub const WITH_SM_CONTINUED: u8 = 0x1C;
}

/// ISO/IEC 7816-4 instructions used outside the native command set
pub mod ins {
    /// SELECT FILE
    pub const SELECT_FILE: u8 = 0xA4;
}

/// SELECT FILE parameters
pub mod select {
    /// Select by DF name
    pub const BY_NAME: u8 = 0x04;
    /// First or only occurrence, return FCI
    pub const FIRST_OCCURRENCE: u8 = 0x00;
}

/// Key number flags for the new key type, only honoured in the root application
pub mod key_flags {
    /// New key is 3K3DES
    pub const THREE_KEY_TDES: u8 = 0x40;
    /// New key is AES
    pub const AES: u8 = 0x80;
}

/// Version byte appended to an AES key in the ChangeKey cryptogram
pub const AES_KEY_VERSION: u8 = 0x00;

/// Seed of the CRC32 used in cryptograms
pub const CRC32_SEED: u32 = 0xFFFF_FFFF;
