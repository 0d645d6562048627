use super::*;

#[test]
fn test_priority_roundtrip() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    let p = PriorityAttr(0x6e0001ff);
    p.add_to(&mut m)?;

    let mut got = PriorityAttr::default();
    got.get_from(&m)?;
    assert_eq!(got, p);
    Ok(())
}

#[test]
fn test_priority_bad_size() {
    let mut m = Message::new();
    m.write_header();
    m.add(ATTR_PRIORITY, &[1, 2]);
    let mut got = PriorityAttr::default();
    assert_eq!(
        got.get_from(&m).unwrap_err(),
        Error::ErrAttributeSizeInvalid
    );
}

#[test]
fn test_use_candidate() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    assert!(!UseCandidateAttr::is_set(&m));
    UseCandidateAttr::new().add_to(&mut m)?;
    assert!(UseCandidateAttr::is_set(&m));
    assert_eq!(m.get(ATTR_USE_CANDIDATE)?.len(), 0);
    Ok(())
}

#[test]
fn test_controlling_roundtrip() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    let c = AttrControlling(0x932f_f9b1_5126_3b36);
    c.add_to(&mut m)?;

    let mut got = AttrControlling::default();
    got.get_from(&m)?;
    assert_eq!(got, c);
    Ok(())
}

#[test]
fn test_controlled_roundtrip() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    let c = AttrControlled(0x932f_f9b1_5126_3b36);
    c.add_to(&mut m)?;

    let mut got = AttrControlled::default();
    got.get_from(&m)?;
    assert_eq!(got, c);

    // The two control attributes do not alias each other.
    let mut other = AttrControlling::default();
    assert_eq!(
        other.get_from(&m).unwrap_err(),
        Error::ErrAttributeNotFound
    );
    Ok(())
}
