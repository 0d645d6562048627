use super::*;

#[test]
fn test_error_code_attribute_roundtrip() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    let attr = ErrorCodeAttribute {
        code: ErrorCode(404),
        reason: b"not found!".to_vec(),
    };
    attr.add_to(&mut m)?;

    let mut got = ErrorCodeAttribute::default();
    got.get_from(&m)?;
    assert_eq!(got, attr, "{got} (got) != {attr} (expected)");
    Ok(())
}

#[test]
fn test_error_code_default_reasons() -> Result<()> {
    let codes = [
        (CODE_TRY_ALTERNATE, "Try Alternate"),
        (CODE_BAD_REQUEST, "Bad Request"),
        (CODE_UNAUTHORIZED, "Unauthorized"),
        (CODE_UNKNOWN_ATTRIBUTE, "Unknown Attribute"),
        (CODE_STALE_NONCE, "Stale Nonce"),
        (CODE_SERVER_ERROR, "Server Error"),
    ];
    for (code, reason) in codes {
        let mut m = Message::new();
        m.write_header();
        code.add_to(&mut m)?;
        let mut got = ErrorCodeAttribute::default();
        got.get_from(&m)?;
        assert_eq!(got.code, code);
        assert_eq!(got.reason, reason.as_bytes());
    }
    Ok(())
}

#[test]
fn test_error_code_wire_layout() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    CODE_STALE_NONCE.add_to(&mut m)?;
    let v = m.get(ATTR_ERROR_CODE)?;
    // Two reserved bytes, class 4, number 38.
    assert_eq!(&v[..4], &[0, 0, 4, 38]);
    assert_eq!(&v[4..], b"Stale Nonce");
    Ok(())
}

#[test]
fn test_error_code_no_default_reason() {
    let mut m = Message::new();
    m.write_header();
    let err = ErrorCode(999).add_to(&mut m).unwrap_err();
    assert_eq!(err, Error::ErrNoDefaultReason);
}

#[test]
fn test_error_code_short_value() {
    let mut m = Message::new();
    m.write_header();
    m.add(ATTR_ERROR_CODE, &[0, 0, 4]);
    let mut got = ErrorCodeAttribute::default();
    assert_eq!(got.get_from(&m).unwrap_err(), Error::ErrUnexpectedEof);
}
