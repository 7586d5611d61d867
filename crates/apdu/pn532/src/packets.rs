//! Request and response layouts for the controller commands

use core::fmt;

use bytes::Bytes;
use desfire_apdu_core::{ByteBuffer, Result};

/// Answer to GetFirmwareVersion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    /// IC identifier, `0x32` for a PN532
    pub ic: u8,
    /// Firmware version
    pub version: u8,
    /// Firmware revision
    pub revision: u8,
    /// Supported protocol bitmap
    pub support: u8,
}

impl FirmwareVersion {
    /// Parse the four response bytes
    pub fn parse(buf: &mut ByteBuffer) -> Result<Self> {
        Ok(Self {
            ic: buf.read_u8()?,
            version: buf.read_u8()?,
            revision: buf.read_u8()?,
            support: buf.read_u8()?,
        })
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PN5{:02x} firmware {}.{} (support {:#04x})",
            self.ic, self.version, self.revision, self.support
        )
    }
}

/// SAM data flow mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SamMode {
    /// No SAM is used
    Normal = 0x01,
    /// The SAM is hidden behind the controller
    VirtualCard = 0x02,
    /// Host, controller and SAM all on the bus
    WiredCard = 0x03,
    /// SAM and controller both reachable from the antenna
    DualCard = 0x04,
}

/// SAMConfiguration parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamConfiguration {
    /// Data flow mode
    pub mode: SamMode,
    /// Virtual card timeout in 50 ms units
    pub timeout: u8,
    /// Whether the controller drives its IRQ pin
    pub use_irq: bool,
}

impl Default for SamConfiguration {
    fn default() -> Self {
        Self {
            mode: SamMode::Normal,
            timeout: 0x14,
            use_irq: true,
        }
    }
}

impl SamConfiguration {
    /// Append the parameters to a request
    pub fn write_to(&self, buf: &mut ByteBuffer) {
        buf.put_u8(self.mode as u8)
            .put_u8(self.timeout)
            .put_u8(u8::from(self.use_irq));
    }
}

/// Baud rate and modulation used while listing targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum BaudModulation {
    /// ISO/IEC 14443 Type A at 106 kbps
    #[default]
    TypeA106 = 0x00,
    /// FeliCa polling at 212 kbps
    FeliCa212 = 0x01,
    /// FeliCa polling at 424 kbps
    FeliCa424 = 0x02,
    /// ISO/IEC 14443-3 Type B at 106 kbps
    TypeB106 = 0x03,
    /// Innovision Jewel at 106 kbps
    Jewel106 = 0x04,
}

/// InListPassiveTarget parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InListPassiveTargetRequest {
    /// Maximum number of targets to activate, at most 2
    pub max_targets: u8,
    /// Baud rate and modulation
    pub brty: BaudModulation,
    /// Modulation-specific initiator data
    pub initiator_data: Bytes,
}

impl InListPassiveTargetRequest {
    /// Append the parameters to a request
    pub fn write_to(&self, buf: &mut ByteBuffer) {
        buf.put_u8(self.max_targets)
            .put_u8(self.brty as u8)
            .put_slice(&self.initiator_data);
    }
}

/// Answer to InListPassiveTarget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InListPassiveTargetResponse {
    /// Number of targets activated
    pub target_count: u8,
    /// Raw target data, layout depends on the modulation
    pub target_data: Bytes,
}

impl InListPassiveTargetResponse {
    /// Parse the count and keep the rest as target data
    pub fn parse(buf: &mut ByteBuffer) -> Result<Self> {
        Ok(Self {
            target_count: buf.read_u8()?,
            target_data: buf.read_remaining(),
        })
    }

    /// Decode the first target as Type A, if any was found
    pub fn first_type_a(&self) -> Result<Option<TargetDataTypeA>> {
        if self.target_count == 0 {
            return Ok(None);
        }
        TargetDataTypeA::parse(&mut ByteBuffer::from(self.target_data.clone())).map(Some)
    }
}

/// Target data of an ISO/IEC 14443 Type A card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDataTypeA {
    /// Logical target number assigned by the controller
    pub tg: u8,
    /// Answer to request, Type A
    pub atqa: [u8; 2],
    /// Select acknowledge
    pub sak: u8,
    /// Card UID
    pub uid: Bytes,
    /// Answer to select, without its length byte
    pub ats: Bytes,
}

impl TargetDataTypeA {
    /// Parse `Tg ATQA(2) SAK UIDLen UID [ATSLen ATS]`
    pub fn parse(buf: &mut ByteBuffer) -> Result<Self> {
        let tg = buf.read_u8()?;
        let atqa = [buf.read_u8()?, buf.read_u8()?];
        let sak = buf.read_u8()?;

        let uid_len = buf.read_u8()?;
        let uid = buf.read_bytes(usize::from(uid_len))?;

        // ATSLen counts itself
        let ats = match buf.read_u8() {
            Ok(ats_len) if ats_len > 1 => buf.read_bytes(usize::from(ats_len) - 1)?,
            _ => Bytes::new(),
        };

        Ok(Self {
            tg,
            atqa,
            sak,
            uid,
            ats,
        })
    }

    /// Identify the card family from ATQA and SAK
    pub fn card_type(&self) -> CardType {
        CardType::identify(self.atqa, self.sak)
    }
}

/// Card families recognisable from discovery data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    /// MIFARE Mini, 320 bytes
    MifareMini,
    /// MIFARE Classic 1K
    MifareClassic1k,
    /// MIFARE Classic 4K
    MifareClassic4k,
    /// MIFARE Ultralight
    MifareUltralight,
    /// MIFARE DESFire
    MifareDesfire,
    /// Anything else
    Unknown,
}

impl CardType {
    /// Static ATQA/SAK lookup
    pub const fn identify(atqa: [u8; 2], sak: u8) -> Self {
        match (atqa, sak) {
            ([0x00, 0x04], 0x09) => Self::MifareMini,
            ([0x00, 0x04], 0x08) => Self::MifareClassic1k,
            ([0x00, 0x02], 0x18) => Self::MifareClassic4k,
            ([0x00, 0x44], 0x00) => Self::MifareUltralight,
            ([0x03, 0x44], 0x20) => Self::MifareDesfire,
            _ => Self::Unknown,
        }
    }
}
