//! Configuration options for the PN532 link and controller

use core::time::Duration;

use crate::constants::{
    ACK_WAIT_TIME, DEFAULT_POLL_INTERVAL, DEFAULT_RESPONSE_TIMEOUT, MAX_PACKET_SIZE,
};

/// Configuration options for the PN532 transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pn532Config {
    /// Deadline for the acknowledgement frame after a command
    pub ack_timeout: Duration,

    /// Deadline for each field of a response frame
    pub response_timeout: Duration,

    /// Sleep between serial polls that returned no byte
    pub poll_interval: Duration,

    /// Size of the receive buffer handed to the link for each response
    pub max_packet_size: usize,
}

impl Default for Pn532Config {
    fn default() -> Self {
        Self {
            ack_timeout: ACK_WAIT_TIME,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}

impl Pn532Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the acknowledgement deadline
    pub const fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Set the response deadline
    pub const fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set the poll interval
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the receive buffer size
    pub const fn with_max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_overrides() {
        let config = Pn532Config::new();
        assert_eq!(config.ack_timeout, Duration::from_millis(10));
        assert_eq!(config.response_timeout, Duration::from_millis(1000));
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert_eq!(config.max_packet_size, 255);

        let config = config
            .with_response_timeout(Duration::from_millis(50))
            .with_poll_interval(Duration::ZERO);
        assert_eq!(config.response_timeout, Duration::from_millis(50));
        assert_eq!(config.poll_interval, Duration::ZERO);
        assert_eq!(config.ack_timeout, ACK_WAIT_TIME);
    }
}
