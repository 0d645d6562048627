use super::*;

#[test]
fn test_text_attribute_roundtrip() -> Result<()> {
    let tests = [
        (ATTR_USERNAME, "user:pass"),
        (ATTR_REALM, "example.org"),
        (ATTR_NONCE, "f//499k954d6OL34oL9FSTvy64sA"),
        (ATTR_SOFTWARE, "STUN test client"),
    ];
    for (attr, text) in tests {
        let mut m = Message::new();
        m.write_header();
        TextAttribute::new(attr, text.to_owned()).add_to(&mut m)?;
        let got = TextAttribute::get_from_as(&m, attr)?;
        assert_eq!(got.text, text, "{attr}: {} != {text}", got.text);
    }
    Ok(())
}

#[test]
fn test_username_overflow() {
    let mut m = Message::new();
    m.write_header();
    let before = m.raw.len();
    let long = "a".repeat(514);
    let err = Username::new(ATTR_USERNAME, long).add_to(&mut m).unwrap_err();
    assert_eq!(err, Error::ErrAttributeSizeOverflow);
    // The failed setter must not mutate the message.
    assert_eq!(m.raw.len(), before);
    assert_eq!(m.length, 0);
}

#[test]
fn test_username_max_length_ok() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    let text = "a".repeat(513);
    Username::new(ATTR_USERNAME, text.clone()).add_to(&mut m)?;
    let got = TextAttribute::get_from_as(&m, ATTR_USERNAME)?;
    assert_eq!(got.text, text);
    Ok(())
}

#[test]
fn test_nonce_overflow() {
    let mut m = Message::new();
    m.write_header();
    let before_len = m.length;
    let long = "b".repeat(764);
    let err = Nonce::new(ATTR_NONCE, long).add_to(&mut m).unwrap_err();
    assert_eq!(err, Error::ErrAttributeSizeOverflow);
    assert_eq!(m.length, before_len);
    assert!(!m.contains(ATTR_NONCE));
}

#[test]
fn test_software_getter() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    Software::new(ATTR_SOFTWARE, "test vector".to_owned()).add_to(&mut m)?;
    let mut got = Software::new(ATTR_SOFTWARE, String::new());
    got.get_from(&m)?;
    assert_eq!(got.text, "test vector");
    assert_eq!(got.to_string(), "test vector");
    Ok(())
}

#[test]
fn test_text_attribute_not_found() {
    let m = Message::new();
    assert_eq!(
        TextAttribute::get_from_as(&m, ATTR_SOFTWARE).unwrap_err(),
        Error::ErrAttributeNotFound
    );
}
