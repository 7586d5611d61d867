//! DESFire session over an APDU transport
//!
//! [`Desfire`] wraps native commands in ISO/IEC 7816-4 APDUs (`CLA 90`),
//! tracks the selected application and the authenticated key, and holds the
//! session key together with its CBC chaining value. The chaining value only
//! ever moves forward: every cipher call made within the session continues
//! from where the previous one stopped.

use std::fmt;

use bytes::Bytes;
use desfire_apdu_core::{ByteBuffer, CardTransport, Command, Response};
use rand::{RngCore, rng};
use tracing::{Level, debug, info, trace, warn};
use zeroize::Zeroizing;

use crate::{
    Error, Result,
    constants::{
        DESFIRE_AID, MAX_APPLICATION_ID, MAX_KEY_NO, NATIVE_CLA, NATIVE_SW1, ROOT_APPLICATION,
        cla, ins, select,
    },
    crypto::{Aes128Cbc, BLOCK_SIZE, CbcCipher, rotate_left},
    cryptogram,
    instruction::Instruction,
    key::{DesfireKey, KeyType, derive_session_key},
    status::DesfireStatus,
};

/// State established by a successful authentication
struct Session {
    /// Key number the session was opened with
    key_no: u8,
    /// Diversified session key
    key: DesfireKey,
    /// CBC chaining value, as long as the session key
    iv: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key_no", &self.key_no)
            .field("key_type", &self.key.key_type())
            .finish_non_exhaustive()
    }
}

/// A DESFire card reached through a [`CardTransport`]
pub struct Desfire<T: CardTransport, C: CbcCipher = Aes128Cbc> {
    /// The underlying transport
    transport: T,
    /// Block cipher for authentication and key changes
    cipher: C,
    /// Application id of the current application
    selected_application: u32,
    /// Authentication state, `None` until `authenticate` succeeds
    session: Option<Session>,
    /// Status of the most recent native command
    last_status: Option<DesfireStatus>,
}

impl<T: CardTransport, C: CbcCipher> fmt::Debug for Desfire<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Desfire")
            .field("transport", &self.transport)
            .field("selected_application", &self.selected_application)
            .field("session", &self.session)
            .field("last_status", &self.last_status)
            .finish()
    }
}

impl<T: CardTransport> Desfire<T> {
    /// Create a session using AES-128-CBC
    pub const fn new(transport: T) -> Self {
        Self::with_cipher(transport, Aes128Cbc)
    }
}

impl<T: CardTransport, C: CbcCipher> Desfire<T, C> {
    /// Create a session with a custom cipher implementation
    pub const fn with_cipher(transport: T, cipher: C) -> Self {
        Self {
            transport,
            cipher,
            selected_application: ROOT_APPLICATION,
            session: None,
            last_status: None,
        }
    }

    /// Select the DESFire application by its ISO DF name
    ///
    /// Succeeds only on `90 00`. Authentication is dropped and the root
    /// application becomes current.
    pub fn connect(&mut self) -> Result<()> {
        let command = Command::new_with_data_and_le(
            cla::WITHOUT_SM_LAST,
            ins::SELECT_FILE,
            select::BY_NAME,
            select::FIRST_OCCURRENCE,
            Bytes::from_static(&DESFIRE_AID),
            0x00,
        );

        let response = self.exchange(&command)?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "DESFire application select failed");
            return Err(Error::SelectFailed(response.status()));
        }

        self.session = None;
        self.selected_application = ROOT_APPLICATION;
        debug!("DESFire application selected");
        Ok(())
    }

    /// Send one native command and return the response body
    ///
    /// The status byte is latched in [`last_status`](Self::last_status).
    /// `OperationOk` and `AdditionalFrame` are successes; any other status is
    /// returned as [`Error::Status`].
    pub fn transceive(&mut self, ins: Instruction, input: &[u8]) -> Result<Bytes> {
        let command = Command::new_with_data_and_le(
            NATIVE_CLA,
            ins.code(),
            0x00,
            0x00,
            Bytes::copy_from_slice(input),
            0x00,
        );

        let response = self.exchange(&command)?;
        let sw = response.status();
        if sw.sw1 != NATIVE_SW1 {
            debug!(%ins, %sw, "Native answer without 91 status class");
        }

        let status = DesfireStatus::from_code(sw.sw2);
        self.last_status = Some(status);
        log_status(ins, status);

        if status.is_success() {
            Ok(response.into_payload())
        } else {
            Err(Error::Status(status))
        }
    }

    /// Send a native command and collect every continuation frame
    ///
    /// While the card answers `AdditionalFrame`, an `AF` command with no data
    /// fetches the next frame. The bodies are concatenated in order.
    pub fn transceive_chained(&mut self, ins: Instruction, input: &[u8]) -> Result<Bytes> {
        let mut out = ByteBuffer::new();
        let mut frame = self.transceive(ins, input)?;
        let mut frames = 1usize;

        loop {
            out.put_slice(&frame);
            if self.last_status != Some(DesfireStatus::AdditionalFrame) {
                break;
            }
            frame = self.transceive(Instruction::AdditionalFrame, &[])?;
            frames += 1;
        }

        trace!(%ins, frames, data = %hex::encode(out.as_slice()), "Chained exchange complete");
        Ok(out.into_bytes())
    }

    /// Three-pass mutual authentication with `key`
    ///
    /// Only AES keys are supported. On success the session key is derived
    /// from both nonces and the chaining value starts from zero. Any earlier
    /// authentication is cleared first, also when this one fails.
    pub fn authenticate(&mut self, key_no: u8, key: &DesfireKey) -> Result<()> {
        let key_type = key.key_type();
        let ins = match key_type.auth_instruction() {
            Some(ins) if key_type == KeyType::Aes => ins,
            _ => return Err(Error::UnsupportedKeyType(key_type)),
        };

        self.session = None;
        debug!(key_no, %key_type, "Authenticating");

        // Card challenge: E(RndB)
        let rnd_b_enc = self.transceive(ins, &[key_no])?;
        check_len(&rnd_b_enc, BLOCK_SIZE)?;

        let mut iv = Zeroizing::new([0u8; BLOCK_SIZE]);
        let plain = Zeroizing::new(self.cipher.decrypt(
            key.as_bytes(),
            iv.as_mut_slice(),
            &rnd_b_enc,
        )?);
        check_len(&plain, BLOCK_SIZE)?;
        let mut rnd_b = Zeroizing::new([0u8; BLOCK_SIZE]);
        rnd_b.copy_from_slice(&plain);

        let mut rnd_a = Zeroizing::new([0u8; BLOCK_SIZE]);
        rng().fill_bytes(rnd_a.as_mut_slice());

        // Answer: E(RndA || RndB')
        let mut token = Zeroizing::new(Vec::with_capacity(2 * BLOCK_SIZE));
        token.extend_from_slice(rnd_a.as_slice());
        token.extend_from_slice(&rotate_left(rnd_b.as_slice()));
        let token_enc = self.cipher.encrypt(key.as_bytes(), iv.as_mut_slice(), &token)?;

        let rnd_a_rot_enc = self.transceive(Instruction::AdditionalFrame, &token_enc)?;
        check_len(&rnd_a_rot_enc, BLOCK_SIZE)?;

        let rnd_a_rot = Zeroizing::new(self.cipher.decrypt(
            key.as_bytes(),
            iv.as_mut_slice(),
            &rnd_a_rot_enc,
        )?);
        if *rnd_a_rot != rotate_left(rnd_a.as_slice()) {
            warn!(key_no, "Card response does not match RndA'");
            return Err(Error::AuthenticationFailed);
        }

        let session_key = derive_session_key(&rnd_a, &rnd_b, key_type);
        let iv = Zeroizing::new(vec![0x00; session_key.len()]);
        self.session = Some(Session {
            key_no,
            key: session_key,
            iv,
        });

        debug!(key_no, "Authenticated");
        Ok(())
    }

    /// Replace the authenticated key with `new_key`
    ///
    /// The cryptogram is encrypted under the session key, continuing the
    /// session chaining value. Only AES sessions changing to an AES key are
    /// supported.
    pub fn change_key(&mut self, key_no: u8, new_key: &DesfireKey) -> Result<()> {
        let slot = key_no & MAX_KEY_NO;
        let root = self.selected_application == ROOT_APPLICATION;

        let Some(session) = self.session.as_mut().filter(|s| s.key_no == slot) else {
            warn!(slot, "Key change requested for a key that is not authenticated");
            return Err(Error::NotAuthenticated(slot));
        };

        let session_type = session.key.key_type();
        if session_type != KeyType::Aes {
            return Err(Error::UnsupportedKeyType(session_type));
        }
        if new_key.key_type() != KeyType::Aes {
            return Err(Error::UnsupportedKeyType(new_key.key_type()));
        }

        let key_byte = cryptogram::key_number(slot, new_key.key_type(), root);
        let plain = cryptogram::build(key_byte, new_key)?;
        let encrypted = self
            .cipher
            .encrypt(session.key.as_bytes(), &mut session.iv, &plain)?;

        let mut payload = ByteBuffer::with_capacity(1 + encrypted.len());
        payload.put_u8(key_byte).put_slice(&encrypted);

        debug!(slot, key_byte, new_type = %new_key.key_type(), "Changing key");
        self.transceive(Instruction::ChangeKey, payload.as_slice())?;
        Ok(())
    }

    /// Select an application by its three-byte id
    ///
    /// Authentication does not survive an application change.
    pub fn select_application(&mut self, aid: u32) -> Result<()> {
        if aid > MAX_APPLICATION_ID {
            return Err(Error::InvalidApplicationId(aid));
        }

        self.session = None;
        self.transceive(Instruction::SelectApplication, &aid.to_le_bytes()[..3])?;
        self.selected_application = aid;
        debug!(aid = format_args!("{aid:06X}"), "Application selected");
        Ok(())
    }

    /// Raw manufacturing data: hardware, software and production frames
    pub fn get_version(&mut self) -> Result<Bytes> {
        self.transceive_chained(Instruction::GetVersion, &[])
    }

    /// Ids of every application on the card
    pub fn get_application_ids(&mut self) -> Result<Vec<u32>> {
        let data = self.transceive_chained(Instruction::GetApplicationIds, &[])?;
        if data.len() % 3 != 0 {
            return Err(Error::InvalidResponseLength {
                expected: data.len().next_multiple_of(3),
                actual: data.len(),
            });
        }

        Ok(data
            .chunks_exact(3)
            .map(|aid| u32::from_le_bytes([aid[0], aid[1], aid[2], 0x00]))
            .collect())
    }

    /// Status of the most recent native command
    pub const fn last_status(&self) -> Option<DesfireStatus> {
        self.last_status
    }

    /// Key number of the current authentication
    pub fn authenticated_key(&self) -> Option<u8> {
        self.session.as_ref().map(|s| s.key_no)
    }

    /// Application id of the current application
    pub const fn selected_application(&self) -> u32 {
        self.selected_application
    }

    /// Session key of the current authentication
    pub fn session_key(&self) -> Option<&DesfireKey> {
        self.session.as_ref().map(|s| &s.key)
    }

    /// Get a reference to the transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session and return the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn exchange(&mut self, command: &Command) -> Result<Response> {
        let raw = self
            .transport
            .transmit_raw(&command.to_bytes()?)
            .map_err(Into::<desfire_apdu_core::Error>::into)?;
        Ok(Response::from_bytes(&raw)?)
    }
}

const fn check_len(data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(Error::InvalidResponseLength {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn log_status(ins: Instruction, status: DesfireStatus) {
    let level = status.tracing_level();
    if level == Level::DEBUG {
        debug!(%ins, %status, "Card status");
    } else if level == Level::INFO {
        info!(%ins, %status, "Card status");
    } else {
        warn!(%ins, %status, "Card status");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use desfire_apdu_core::TransportError;
    use hex_literal::hex;

    use super::*;

    #[derive(Debug, Default)]
    struct ScriptedCard {
        answers: VecDeque<Vec<u8>>,
        sent: Vec<Vec<u8>>,
    }

    impl ScriptedCard {
        fn new(answers: &[&[u8]]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_vec()).collect(),
                sent: Vec::new(),
            }
        }
    }

    impl CardTransport for ScriptedCard {
        type Error = TransportError;

        fn do_transmit_raw(&mut self, command: &[u8]) -> std::result::Result<Bytes, Self::Error> {
            self.sent.push(command.to_vec());
            self.answers
                .pop_front()
                .map(Bytes::from)
                .ok_or(TransportError::Timeout)
        }
    }

    #[test]
    fn test_connect() {
        let mut card = Desfire::new(ScriptedCard::new(&[&hex!("90 00")]));
        card.connect().unwrap();
        assert_eq!(
            card.transport().sent,
            vec![hex!("00 A4 04 00 07 D2 76 00 00 85 01 00 00").to_vec()]
        );

        let mut card = Desfire::new(ScriptedCard::new(&[&hex!("6A 82")]));
        let err = card.connect().unwrap_err();
        assert!(matches!(err, Error::SelectFailed(sw) if sw.to_u16() == 0x6A82));
    }

    #[test]
    fn test_transceive_wraps_native_command() {
        let mut card = Desfire::new(ScriptedCard::new(&[&hex!("01 02 03 91 00")]));
        let body = card.transceive(Instruction::GetKeySettings, &[0x01]).unwrap();

        assert_eq!(body.as_ref(), &hex!("01 02 03"));
        assert_eq!(card.transport().sent[0], hex!("90 45 00 00 01 01 00"));
        assert_eq!(card.last_status(), Some(DesfireStatus::OperationOk));
    }

    #[test]
    fn test_transceive_latches_failure_status() {
        let mut card = Desfire::new(ScriptedCard::new(&[&hex!("91 AE"), &hex!("91 0C")]));

        let err = card.transceive(Instruction::GetVersion, &[]).unwrap_err();
        assert_eq!(err.status(), Some(DesfireStatus::AuthenticationError));
        assert_eq!(card.last_status(), Some(DesfireStatus::AuthenticationError));
        assert_eq!(card.transport().sent[0], hex!("90 60 00 00 00 00"));

        let err = card.transceive(Instruction::GetVersion, &[]).unwrap_err();
        assert_eq!(err.status(), Some(DesfireStatus::NoChanges));
    }

    #[test]
    fn test_transport_errors_propagate() {
        let mut card = Desfire::new(ScriptedCard::default());
        let err = card.transceive(Instruction::GetVersion, &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Apdu(desfire_apdu_core::Error::Transport(TransportError::Timeout))
        ));
        assert_eq!(card.last_status(), None);
    }

    #[test]
    fn test_truncated_answer() {
        let mut card = Desfire::new(ScriptedCard::new(&[&hex!("91")]));
        assert!(matches!(
            card.transceive(Instruction::GetVersion, &[]),
            Err(Error::Apdu(desfire_apdu_core::Error::Response(_)))
        ));
    }

    #[test]
    fn test_chained_frames_concatenate() {
        let mut card = Desfire::new(ScriptedCard::new(&[
            &hex!("01 02 91 AF"),
            &hex!("03 04 91 AF"),
            &hex!("05 91 00"),
        ]));

        let data = card.get_version().unwrap();
        assert_eq!(data.as_ref(), &hex!("01 02 03 04 05"));

        let sent = &card.transport().sent;
        assert_eq!(sent[0], hex!("90 60 00 00 00 00"));
        assert_eq!(sent[1], hex!("90 AF 00 00 00 00"));
        assert_eq!(sent[2], hex!("90 AF 00 00 00 00"));
    }

    #[test]
    fn test_application_ids() {
        let mut card = Desfire::new(ScriptedCard::new(&[&hex!("01 00 00 56 34 12 91 00")]));
        assert_eq!(card.get_application_ids().unwrap(), vec![0x000001, 0x123456]);

        let mut card = Desfire::new(ScriptedCard::new(&[&hex!("01 00 91 00")]));
        assert!(matches!(
            card.get_application_ids(),
            Err(Error::InvalidResponseLength { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_select_application() {
        let mut card = Desfire::new(ScriptedCard::new(&[&hex!("91 00"), &hex!("91 A0")]));

        card.select_application(0x123456).unwrap();
        assert_eq!(card.selected_application(), 0x123456);
        assert_eq!(card.transport().sent[0], hex!("90 5A 00 00 03 56 34 12 00"));

        assert!(card.select_application(0xABCDEF).is_err());
        assert_eq!(card.selected_application(), 0x123456);
        assert_eq!(card.last_status(), Some(DesfireStatus::ApplicationNotFound));

        assert!(matches!(
            card.select_application(0x0100_0000),
            Err(Error::InvalidApplicationId(0x0100_0000))
        ));
        assert_eq!(card.transport().sent.len(), 2);
    }

    #[test]
    fn test_change_key_requires_authentication() {
        let mut card = Desfire::new(ScriptedCard::default());
        let err = card.change_key(0x00, &DesfireKey::aes(&[0; 16])).unwrap_err();

        assert!(matches!(err, Error::NotAuthenticated(0)));
        assert!(card.transport().sent.is_empty());
    }

    #[test]
    fn test_authenticate_rejects_legacy_keys() {
        let mut card = Desfire::new(ScriptedCard::default());
        for key in [
            DesfireKey::des(&[0; 8]),
            DesfireKey::tdes(&[0; 16]),
            DesfireKey::three_k_tdes(&[0; 24]),
            DesfireKey::new(KeyType::None, &[]),
        ] {
            assert!(matches!(
                card.authenticate(0x00, &key),
                Err(Error::UnsupportedKeyType(t)) if t == key.key_type()
            ));
        }
        assert!(card.transport().sent.is_empty());
    }

    #[test]
    fn test_authenticate_checks_challenge_length() {
        let mut card = Desfire::new(ScriptedCard::new(&[&hex!("00112233 91 AF")]));
        let err = card.authenticate(0x00, &DesfireKey::aes(&[0; 16])).unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidResponseLength { expected: 16, actual: 4 }
        ));
        assert_eq!(card.transport().sent[0], hex!("90 AA 00 00 01 00 00"));
        assert_eq!(card.authenticated_key(), None);
    }

    #[test]
    fn test_debug_output() {
        let card = Desfire::new(ScriptedCard::default());
        let debug = format!("{card:?}");
        assert!(debug.contains("selected_application: 0"));
        assert!(debug.contains("session: None"));
    }
}
