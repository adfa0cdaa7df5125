mod common;

use common::{NtagSimulator, key};
use nfc_seal::label::LABEL_PAGE;
use nfc_seal::prelude::*;
use nfc_seal::{FormatError, IssuerPublicKey};

const UID: [u8; 7] = [0x04, 0x5E, 0x21, 0x8A, 0x3F, 0x61, 0x80];

#[test]
fn test_roundtrip_all_chips() {
    let key = IssuerKey::random(&mut rand_v8::thread_rng());

    for tag in [
        NtagSimulator::ntag213(UID),
        NtagSimulator::ntag215(UID),
        NtagSimulator::ntag216(UID),
    ] {
        let claim = LabelClaim::from_u64(0x0102_0304_0506_0708, 99);

        let mut session = TagSession::open(tag).unwrap();
        let written = session.write_label(claim, &key).unwrap();

        let read = session.read_label().unwrap();
        assert_eq!(read, written);
        assert_eq!(read.claim, claim);

        let verified = session.verify_label(&key.public_key()).unwrap();
        assert!(verified.is_genuine());
        assert_eq!(
            IssuerPublicKey::recover(&verified.seed, &verified.record.signature).unwrap(),
            key.public_key()
        );
    }
}

#[test]
fn test_label_survives_new_session() {
    let key = key(0x21);
    let claim = LabelClaim::from_u64(1, 0x42);

    let mut session = TagSession::open(NtagSimulator::ntag213(UID)).unwrap();
    session.write_label(claim, &key).unwrap();
    let tag = session.into_inner();

    let mut session = TagSession::open(tag).unwrap();
    let verified = session.verify_label(&key.public_key()).unwrap();
    assert!(verified.is_genuine());
    assert_eq!(verified.record.claim.sequence_number_u64(), 0x42);
}

#[test]
fn test_wrong_key_is_forged() {
    let mut session = TagSession::open(NtagSimulator::ntag215(UID)).unwrap();
    session
        .write_label(LabelClaim::from_u64(1, 1), &key(0x21))
        .unwrap();

    let verified = session.verify_label(&key(0x22).public_key()).unwrap();
    assert_eq!(verified.verdict, Verdict::Forged);
}

#[test]
fn test_label_copied_to_another_tag() {
    let key = key(0x21);
    let mut original = TagSession::open(NtagSimulator::ntag213(UID)).unwrap();
    original
        .write_label(LabelClaim::from_u64(1, 7), &key)
        .unwrap();
    let label = original.into_inner().page_data(LABEL_PAGE, 144).to_vec();

    // Same label bytes on a tag with another UID
    let mut clone = NtagSimulator::ntag213([0x04, 0, 0, 0, 0, 0, 0x01]);
    clone.page_data_mut(LABEL_PAGE, 144).copy_from_slice(&label);

    let mut session = TagSession::open(clone).unwrap();
    let verified = session.verify_label(&key.public_key()).unwrap();
    assert_eq!(verified.verdict, Verdict::Forged);
}

#[test]
fn test_tampered_label() {
    let mut session = TagSession::open(NtagSimulator::ntag213(UID)).unwrap();
    session
        .write_label(LabelClaim::from_u64(1, 7), &key(0x21))
        .unwrap();

    let mut tag = session.into_inner();
    // TLV(2) + record header(4) + id(16) puts the sequence number at offset 40
    tag.page_data_mut(LABEL_PAGE, 144)[40 + 7] ^= 0x01;

    let mut session = TagSession::open(tag).unwrap();
    let err = session.read_label().unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch { .. }));
    assert!(err.is_tamper_evidence());
}

#[test]
fn test_foreign_record() {
    let mut tag = NtagSimulator::ntag213(UID);
    // NDEF URI record "https://a.b"
    let message = [0xD1, 0x01, 0x04, 0x55, 0x04, b'a', b'.', b'b'];
    let area = tag.page_data_mut(LABEL_PAGE, 12);
    area[0] = 0x03;
    area[1] = message.len() as u8;
    area[2..10].copy_from_slice(&message);
    area[10] = 0xFE;

    let mut session = TagSession::open(tag).unwrap();
    assert!(matches!(
        session.read_label(),
        Err(Error::IncompatibleFormat(FormatError::MalformedRecord(_)))
    ));
}

#[test]
fn test_blank_tag() {
    let mut session = TagSession::open(NtagSimulator::ntag216(UID)).unwrap();
    let err = session.read_label().unwrap_err();
    assert!(matches!(err, Error::NoLabel));
    assert!(!err.is_tamper_evidence());
}

#[test]
fn test_missing_vendor_signature() {
    let tag = NtagSimulator::ntag213(UID).without_vendor_signature();
    assert!(matches!(
        TagSession::open(tag),
        Err(Error::SignatureUnavailable(5))
    ));
}

#[test]
fn test_key_ring_selects_by_sequence() {
    let first = key(0x01);
    let second = key(0x02);
    let mut ring = IssuerKeyRing::new();
    ring.insert(9, 0, 999, first.public_key()).unwrap();
    ring.insert(9, 1000, 1999, second.public_key()).unwrap();

    let mut session = TagSession::open(NtagSimulator::ntag213(UID)).unwrap();
    session
        .write_label(LabelClaim::from_u64(9, 1500), &second)
        .unwrap();
    assert!(session.verify_with(&ring).unwrap().is_genuine());

    // Signed with the key of the wrong range
    session
        .write_label(LabelClaim::from_u64(9, 1501), &first)
        .unwrap();
    assert_eq!(session.verify_with(&ring).unwrap().verdict, Verdict::Forged);
}
