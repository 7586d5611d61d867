//! Wire constants for the PN532 high-speed UART link

use core::time::Duration;

/// Preamble followed by the two start code bytes
pub const PREAMBLE: [u8; 3] = [0x00, 0x00, 0xFF];
/// Postamble closing every frame
pub const POSTAMBLE: u8 = 0x00;
/// Acknowledgement frame sent by the controller after each command frame
pub const ACK: [u8; 6] = [0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00];
/// Sequence that brings the controller out of low-VBAT mode
pub const WAKEUP: [u8; 5] = [0x55, 0x55, 0x00, 0x00, 0x00];

/// Largest packet the controller exchanges in a normal information frame
pub const MAX_PACKET_SIZE: usize = 255;

/// How long the controller may take to acknowledge a command frame
pub const ACK_WAIT_TIME: Duration = Duration::from_millis(10);
/// Default deadline for a response frame
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(1000);
/// Sleep between empty serial polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Frame identifiers (TFI)
pub mod tfi {
    /// Host to controller
    pub const TO_CONTROLLER: u8 = 0xD4;
    /// Controller to host
    pub const TO_HOST: u8 = 0xD5;
}

/// Controller command codes
pub mod command {
    /// Read the IC type and firmware revision
    pub const GET_FIRMWARE_VERSION: u8 = 0x02;
    /// Select the SAM data flow mode
    pub const SAM_CONFIGURATION: u8 = 0x14;
    /// Configure RF timings and retries
    pub const RF_CONFIGURATION: u8 = 0x32;
    /// Exchange a data block with an activated target
    pub const IN_DATA_EXCHANGE: u8 = 0x40;
    /// Detect and activate targets in passive mode
    pub const IN_LIST_PASSIVE_TARGET: u8 = 0x4A;
    /// Release an activated target
    pub const IN_RELEASE: u8 = 0x52;
}

/// RFConfiguration items
pub mod rf_item {
    /// MxRtyATR, MxRtyPSL and MxRtyPassiveActivation
    pub const MAX_RETRIES: u8 = 0x05;
}

/// Mask of the error code inside a controller status byte
pub const STATUS_ERROR_MASK: u8 = 0x3F;
