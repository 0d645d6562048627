use super::*;

#[test]
fn test_unknown_attributes_roundtrip() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    let attrs = UnknownAttributes(vec![
        ATTR_DONT_FRAGMENT,
        ATTR_CHANNEL_NUMBER,
        ATTR_REALM,
    ]);
    attrs.add_to(&mut m)?;

    let mut got = UnknownAttributes::default();
    got.get_from(&m)?;
    assert_eq!(got, attrs, "{got} (got) != {attrs} (expected)");
    Ok(())
}

#[test]
fn test_unknown_attributes_padding() -> Result<()> {
    // An odd number of types leaves 2 padding bytes that decode must
    // ignore.
    let mut m = Message::new();
    m.write_header();
    UnknownAttributes(vec![ATTR_SOFTWARE]).add_to(&mut m)?;
    assert_eq!(m.get(ATTR_UNKNOWN_ATTRIBUTES)?.len(), 2);

    let mut got = UnknownAttributes::default();
    got.get_from(&m)?;
    assert_eq!(got.0, vec![ATTR_SOFTWARE]);
    Ok(())
}

#[test]
fn test_unknown_attributes_bad_size() {
    let mut m = Message::new();
    m.write_header();
    m.add(ATTR_UNKNOWN_ATTRIBUTES, &[0x80, 0x22, 0x00]);
    let mut got = UnknownAttributes::default();
    assert_eq!(
        got.get_from(&m).unwrap_err(),
        Error::ErrBadUnknownAttrsSize
    );
}

#[test]
fn test_unknown_attributes_not_found() {
    let m = Message::new();
    let mut got = UnknownAttributes::default();
    assert_eq!(got.get_from(&m).unwrap_err(), Error::ErrAttributeNotFound);
}
