use crate::base::neterror::NetError;
use std::io;

#[test]
fn test_net_error_roundtrip() {
    let err = NetError::ConnectionRefused;
    let code = err.as_i32();
    assert_eq!(code, -102);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::ConnectionRefused));

    let timed_out = NetError::from(NetError::ConnectionTimedOut.as_i32());
    assert!(matches!(timed_out, NetError::ConnectionTimedOut));
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(-9999);
    assert!(matches!(err, NetError::Unknown(-9999)));
}

#[test]
fn test_connection_failed_to_code_follows_source() {
    let refused = NetError::connection_failed_to(
        "10.0.0.1",
        80,
        io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
    );
    assert_eq!(refused.as_i32(), -102);

    let timed_out = NetError::connection_failed_to(
        "10.0.0.1",
        80,
        io::Error::new(io::ErrorKind::TimedOut, "connect timeout"),
    );
    assert_eq!(timed_out.as_i32(), -118);
    assert_eq!(timed_out.io_kind(), Some(io::ErrorKind::TimedOut));
}

#[test]
fn test_taxonomy_helpers() {
    let dns = NetError::DnsServerFailed {
        domain: "example.com".into(),
        rcode: 3,
    };
    assert!(dns.is_resolution_failure());
    assert!(!dns.is_connection_failure());

    let conn = NetError::connection_failed_to(
        "example.com",
        443,
        io::Error::new(io::ErrorKind::ConnectionReset, "reset"),
    );
    assert!(conn.is_connection_failure());
    assert!(!conn.is_resolution_failure());

    let deadline =
        NetError::deadline_not_set("read", io::Error::new(io::ErrorKind::NotConnected, "gone"));
    assert!(deadline.is_deadline_error());
    assert_eq!(deadline.as_i32(), -10000);
}

#[test]
fn test_custom_codes_outside_chromium_ranges() {
    // Chromium allocates down to roughly -1000; custom codes live far below.
    let deadline =
        NetError::deadline_not_set("write", io::Error::new(io::ErrorKind::Other, "closed"));
    assert!(deadline.as_i32() < -1000);
}
