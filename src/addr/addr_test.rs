use super::*;

#[test]
fn test_mapped_address_roundtrip_v4() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    let addr = MappedAddress {
        ip: "122.12.34.5".parse().unwrap(),
        port: 5412,
    };
    addr.add_to(&mut m)?;

    let mut got = MappedAddress::default();
    got.get_from(&m)?;
    assert_eq!(got, addr, "{got} (got) != {addr} (expected)");
    Ok(())
}

#[test]
fn test_mapped_address_roundtrip_v6() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    let addr = MappedAddress {
        ip: "::1".parse().unwrap(),
        port: 5412,
    };
    addr.add_to(&mut m)?;

    let mut got = MappedAddress::default();
    got.get_from(&m)?;
    assert_eq!(got, addr);
    Ok(())
}

#[test]
fn test_mapped_address_not_found() {
    let m = Message::new();
    let mut got = MappedAddress::default();
    assert_eq!(
        got.get_from(&m).unwrap_err(),
        Error::ErrAttributeNotFound
    );
}

#[test]
fn test_mapped_address_bad_family() {
    let mut m = Message::new();
    m.write_header();
    m.add(ATTR_MAPPED_ADDRESS, &[0x00, 0x07, 0x11, 0x22, 1, 2, 3, 4]);
    let mut got = MappedAddress::default();
    assert_eq!(got.get_from(&m).unwrap_err(), Error::ErrBadAddressFamily);
}

#[test]
fn test_mapped_address_bad_ip_length() {
    let mut m = Message::new();
    m.write_header();
    m.add(ATTR_MAPPED_ADDRESS, &[0x00, 0x01, 0x11, 0x22, 1, 2, 3]);
    let mut got = MappedAddress::default();
    assert_eq!(got.get_from(&m).unwrap_err(), Error::ErrBadIpLength);
}

#[test]
fn test_alternate_server_roundtrip() -> Result<()> {
    let mut m = Message::new();
    m.write_header();
    let server = AlternateServer {
        addr: MappedAddress {
            ip: "192.0.2.1".parse().unwrap(),
            port: 3478,
        },
    };
    server.add_to(&mut m)?;
    assert!(m.contains(ATTR_ALTERNATE_SERVER));

    let mut got = AlternateServer::default();
    got.get_from(&m)?;
    assert_eq!(got, server);
    Ok(())
}
