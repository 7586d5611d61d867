//! Simulated DESFire EV1 card for integration tests
//!
//! The card keeps one AES key per slot of a single key set, answers the AES
//! three-pass authentication, verifies ChangeKey cryptograms under its own
//! copy of the session key and chaining value, and serves GetVersion over
//! three frames.

#![allow(dead_code, unreachable_pub)]

use std::sync::{Arc, Mutex, PoisonError};

use desfire::{
    Aes128Cbc, CbcCipher,
    checksum::DesfireCrc32,
    constants::{CRC32_SEED, DESFIRE_AID},
    crypto::rotate_left,
};
use desfire_apdu_core::{Bytes, CardTransport, Command, TransportError};
use desfire_transport_pn532::{Frame, constants::command, mock::ack_and_response};

/// Hardware, software and production frames of GetVersion
pub const VERSION_FRAMES: [&[u8]; 3] = [
    &[0x04, 0x01, 0x01, 0x01, 0x00, 0x1A, 0x05],
    &[0x04, 0x01, 0x01, 0x01, 0x04, 0x1A, 0x05],
    &[
        0x04, 0x52, 0x5B, 0x7A, 0x2A, 0x2E, 0x80, 0xBA, 0x54, 0xD3, 0x50, 0x35, 0x17, 0x12,
    ],
];

/// Nonce the card uses unless a test overrides it
pub const DEFAULT_RND_B: [u8; 16] = [
    0x10, 0x21, 0x32, 0x43, 0x54, 0x65, 0x76, 0x87, 0x98, 0xA9, 0xBA, 0xCB, 0xDC, 0xED, 0xFE,
    0x0F,
];

#[derive(Debug)]
enum Pending {
    Idle,
    Challenge { key_no: u8, rnd_b: [u8; 16], iv: [u8; 16] },
    Version(usize),
}

#[derive(Debug, Clone)]
pub struct CardSession {
    pub key_no: u8,
    pub rnd_a: [u8; 16],
    pub rnd_b: [u8; 16],
    pub key: [u8; 16],
    pub iv: [u8; 16],
}

#[derive(Debug)]
pub struct SimulatedCard {
    pub keys: Vec<[u8; 16]>,
    pub applications: Vec<u32>,
    pub rnd_b: [u8; 16],
    /// Flip a bit in the final authentication answer
    pub corrupt_final: bool,
    pub selected: Option<u32>,
    pub session: Option<CardSession>,
    /// Encoded key number and new key of every accepted ChangeKey
    pub changed: Vec<(u8, [u8; 16])>,
    pub received: Vec<Vec<u8>>,
    pending: Pending,
}

impl SimulatedCard {
    pub fn new(keys: Vec<[u8; 16]>) -> Self {
        Self {
            keys,
            applications: vec![0x000001, 0xC0FFEE],
            rnd_b: DEFAULT_RND_B,
            corrupt_final: false,
            selected: None,
            session: None,
            changed: Vec::new(),
            received: Vec::new(),
            pending: Pending::Idle,
        }
    }

    /// Answer one command APDU with `body || SW1 SW2`
    pub fn process(&mut self, apdu: &[u8]) -> Vec<u8> {
        self.received.push(apdu.to_vec());

        let Ok(command) = Command::from_bytes(apdu) else {
            return vec![0x67, 0x00];
        };
        let data = command.data.clone().unwrap_or_default();

        if command.cla == 0x00 && command.ins == 0xA4 {
            if data.as_ref() == DESFIRE_AID {
                self.selected = Some(0);
                self.session = None;
                return vec![0x90, 0x00];
            }
            return vec![0x6A, 0x82];
        }

        if command.cla != 0x90 {
            return vec![0x6E, 0x00];
        }

        let pending = std::mem::replace(&mut self.pending, Pending::Idle);
        let (mut body, status) = match (command.ins, pending) {
            (0xAA, _) => self.challenge(&data),
            (0xAF, Pending::Challenge { key_no, rnd_b, iv }) => {
                self.verify_token(key_no, rnd_b, iv, &data)
            }
            (0xAF, Pending::Version(next)) => self.version_frame(next),
            (0x60, _) => self.version_frame(0),
            (0x6A, _) => (
                self.applications
                    .iter()
                    .flat_map(|aid| aid.to_le_bytes()[..3].to_vec())
                    .collect(),
                0x00,
            ),
            (0x5A, _) => self.select(&data),
            (0xC4, _) => self.change_key(&data),
            _ => (Vec::new(), 0x1C),
        };

        body.extend_from_slice(&[0x91, status]);
        body
    }

    fn challenge(&mut self, data: &[u8]) -> (Vec<u8>, u8) {
        self.session = None;
        let Some(&key_no) = data.first() else {
            return (Vec::new(), 0x7E);
        };
        let Some(key) = self.keys.get(usize::from(key_no)) else {
            return (Vec::new(), 0x40);
        };

        let mut iv = [0u8; 16];
        let rnd_b_enc = Aes128Cbc.encrypt(key, &mut iv, &self.rnd_b).unwrap();
        self.pending = Pending::Challenge {
            key_no,
            rnd_b: self.rnd_b,
            iv,
        };
        (rnd_b_enc, 0xAF)
    }

    fn verify_token(
        &mut self,
        key_no: u8,
        rnd_b: [u8; 16],
        mut iv: [u8; 16],
        data: &[u8],
    ) -> (Vec<u8>, u8) {
        if data.len() != 32 {
            return (Vec::new(), 0x7E);
        }

        let key = self.keys[usize::from(key_no)];
        let token = Aes128Cbc.decrypt(&key, &mut iv, data).unwrap();
        if token[16..] != rotate_left(&rnd_b) {
            return (Vec::new(), 0xAE);
        }

        let mut rnd_a = [0u8; 16];
        rnd_a.copy_from_slice(&token[..16]);

        let mut answer = Aes128Cbc.encrypt(&key, &mut iv, &rotate_left(&rnd_a)).unwrap();
        if self.corrupt_final {
            answer[0] ^= 0x01;
        }

        let mut session_key = [0u8; 16];
        session_key[..4].copy_from_slice(&rnd_a[..4]);
        session_key[4..8].copy_from_slice(&rnd_b[..4]);
        session_key[8..12].copy_from_slice(&rnd_a[12..]);
        session_key[12..].copy_from_slice(&rnd_b[12..]);

        self.session = Some(CardSession {
            key_no,
            rnd_a,
            rnd_b,
            key: session_key,
            iv: [0u8; 16],
        });
        (answer, 0x00)
    }

    fn version_frame(&mut self, index: usize) -> (Vec<u8>, u8) {
        let Some(frame) = VERSION_FRAMES.get(index) else {
            return (Vec::new(), 0xCA);
        };
        if index + 1 < VERSION_FRAMES.len() {
            self.pending = Pending::Version(index + 1);
            (frame.to_vec(), 0xAF)
        } else {
            (frame.to_vec(), 0x00)
        }
    }

    fn select(&mut self, data: &[u8]) -> (Vec<u8>, u8) {
        if data.len() != 3 {
            return (Vec::new(), 0x7E);
        }
        let aid = u32::from_le_bytes([data[0], data[1], data[2], 0]);
        if aid != 0 && !self.applications.contains(&aid) {
            return (Vec::new(), 0xA0);
        }
        self.selected = Some(aid);
        self.session = None;
        (Vec::new(), 0x00)
    }

    fn change_key(&mut self, data: &[u8]) -> (Vec<u8>, u8) {
        let Some((&key_byte, encrypted)) = data.split_first() else {
            return (Vec::new(), 0x7E);
        };
        let Some(session) = self.session.as_mut() else {
            return (Vec::new(), 0xAE);
        };
        if session.key_no != key_byte & 0x0F {
            return (Vec::new(), 0x9D);
        }
        if encrypted.len() != 32 {
            return (Vec::new(), 0x7E);
        }

        let plain = Aes128Cbc
            .decrypt(&session.key, &mut session.iv, encrypted)
            .unwrap();

        let mut crc = DesfireCrc32::new(CRC32_SEED);
        crc.update(&[0xC4, key_byte]).update(&plain[..17]);
        if plain[17..21] != crc.to_le_bytes() || plain[21..].iter().any(|&b| b != 0) {
            return (Vec::new(), 0x1E);
        }

        let mut new_key = [0u8; 16];
        new_key.copy_from_slice(&plain[..16]);
        let slot = usize::from(key_byte & 0x0F);
        self.keys[slot] = new_key;
        self.changed.push((key_byte, new_key));
        (Vec::new(), 0x00)
    }
}

impl CardTransport for SimulatedCard {
    type Error = TransportError;

    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Self::Error> {
        Ok(Bytes::from(self.process(command)))
    }
}

/// Serial responder for a PN532 with `card` activated as target 1
pub fn pn532_responder(
    card: Arc<Mutex<SimulatedCard>>,
) -> impl FnMut(&[u8]) -> Vec<u8> + Send + 'static {
    move |written| {
        let Ok(frame) = Frame::decode(written) else {
            return Vec::new();
        };
        let Some((&code, args)) = frame.payload.split_first() else {
            return Vec::new();
        };

        let mut reply = vec![code.wrapping_add(1)];
        if code == command::IN_DATA_EXCHANGE {
            match args.split_first() {
                Some((0x01, apdu)) => {
                    let answer = card
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .process(apdu);
                    reply.push(0x00);
                    reply.extend_from_slice(&answer);
                }
                // Target not activated
                _ => reply.push(0x27),
            }
        }

        ack_and_response(&reply).unwrap()
    }
}
