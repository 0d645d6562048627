use super::*;
use crate::fingerprint::FINGERPRINT;
use crate::textattrs::Software;

#[test]
fn test_message_integrity_add_check() -> Result<()> {
    let i = MessageIntegrity::new_short_term_integrity("password".to_owned());
    let mut m = Message::new();
    m.transaction_id = TransactionId::new();
    m.write_header();
    Software::new(ATTR_SOFTWARE, "software".to_owned()).add_to(&mut m)?;
    i.add_to(&mut m)?;
    i.check(&mut m)?;
    Ok(())
}

#[test]
fn test_message_integrity_mutation_detected() -> Result<()> {
    let i = MessageIntegrity::new_short_term_integrity("password".to_owned());
    let mut m = Message::new();
    m.transaction_id = TransactionId::new();
    m.write_header();
    Software::new(ATTR_SOFTWARE, "software".to_owned()).add_to(&mut m)?;
    i.add_to(&mut m)?;

    // Flipping any covered byte must break the check.
    let pos = m.attributes.0[0].pos;
    m.raw[pos] ^= 0x01;
    assert_eq!(m.check(&[Box::new(i)]), Err(Error::ErrIntegrityMismatch));
    Ok(())
}

#[test]
fn test_message_integrity_wrong_key() -> Result<()> {
    let i = MessageIntegrity::new_short_term_integrity("password".to_owned());
    let mut m = Message::new();
    m.transaction_id = TransactionId::new();
    m.write_header();
    i.add_to(&mut m)?;

    let other = MessageIntegrity::new_short_term_integrity("guess".to_owned());
    assert_eq!(other.check(&mut m), Err(Error::ErrIntegrityMismatch));
    Ok(())
}

#[test]
fn test_message_integrity_with_fingerprint() -> Result<()> {
    // FINGERPRINT added after the integrity attribute is excluded from
    // the integrity computation.
    let i = MessageIntegrity::new_short_term_integrity("password".to_owned());
    let mut m = Message::new();
    m.transaction_id = TransactionId::new();
    m.write_header();
    i.add_to(&mut m)?;
    FINGERPRINT.add_to(&mut m)?;
    i.check(&mut m)?;
    Ok(())
}

#[test]
fn test_fingerprint_before_integrity_rejected() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    FINGERPRINT.add_to(&mut m)?;
    let i = MessageIntegrity::new_short_term_integrity("password".to_owned());
    assert_eq!(
        i.add_to(&mut m),
        Err(Error::ErrFingerprintBeforeIntegrity)
    );
    Ok(())
}

#[test]
fn test_message_integrity_missing() {
    let i = MessageIntegrity::new_short_term_integrity("password".to_owned());
    let mut m = Message::new();
    m.write_header();
    assert_eq!(i.check(&mut m), Err(Error::ErrAttributeNotFound));
}

#[test]
fn test_long_term_key_is_md5() {
    // MD5 of "user:realm:pass" per the long-term credential mechanism.
    let i = MessageIntegrity::new_long_term_integrity(
        "user".to_owned(),
        "realm".to_owned(),
        "pass".to_owned(),
    );
    assert_eq!(i.0.len(), 16);
    let same = MessageIntegrity::new_long_term_integrity(
        "user".to_owned(),
        "realm".to_owned(),
        "pass".to_owned(),
    );
    assert_eq!(i, same);
    let different = MessageIntegrity::new_long_term_integrity(
        "user".to_owned(),
        "realm".to_owned(),
        "word".to_owned(),
    );
    assert_ne!(i, different);
}
