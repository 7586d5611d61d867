//! DESFire native instruction codes

use core::fmt;

/// Native command set, legacy and EV1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Instruction {
    // Security
    AuthenticateLegacy = 0x0A,
    ChangeKeySettings = 0x54,
    GetKeySettings = 0x45,
    ChangeKey = 0xC4,
    GetKeyVersion = 0x64,

    // PICC level
    CreateApplication = 0xCA,
    DeleteApplication = 0xDA,
    GetApplicationIds = 0x6A,
    SelectApplication = 0x5A,
    FormatPicc = 0xFC,
    GetVersion = 0x60,

    // Application level
    GetFileIds = 0x6F,
    GetFileSettings = 0xF5,
    ChangeFileSettings = 0x5F,
    CreateStdDataFile = 0xCD,
    CreateBackupDataFile = 0xCB,
    CreateValueFile = 0xCC,
    CreateLinearRecordFile = 0xC1,
    CreateCyclicRecordFile = 0xC0,
    DeleteFile = 0xDF,

    // Data manipulation
    ReadData = 0xBD,
    WriteData = 0x3D,
    GetValue = 0x6C,
    Credit = 0x0C,
    Debit = 0xDC,
    LimitedCredit = 0x1C,
    WriteRecord = 0x3B,
    ReadRecords = 0xBB,
    ClearRecordFile = 0xEB,
    CommitTransaction = 0xC7,
    AbortTransaction = 0xA7,

    // Continuation
    AdditionalFrame = 0xAF,

    // EV1
    AuthenticateIso = 0x1A,
    AuthenticateAes = 0xAA,
    FreeMemory = 0x6E,
    GetDfNames = 0x6D,
    GetCardUid = 0x51,
    GetIsoFileIds = 0x61,
    SetConfiguration = 0x5C,
}

impl Instruction {
    /// Wire code
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ({:#04x})", self.code())
    }
}

impl From<Instruction> for u8 {
    fn from(ins: Instruction) -> Self {
        ins.code()
    }
}
