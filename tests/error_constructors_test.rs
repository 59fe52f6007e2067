use serre::error::SerreError;

#[test]
fn acquisition_error_constructors() {
    assert!(matches!(
        SerreError::transport("x"),
        SerreError::Transport { .. }
    ));
    assert!(matches!(SerreError::decode("x"), SerreError::Decode { .. }));
    assert!(SerreError::transport("x").is_acquisition_error());
    assert!(SerreError::decode("x").is_acquisition_error());
    assert!(!SerreError::config("x").is_acquisition_error());
}

#[test]
fn service_error_constructors() {
    assert!(matches!(SerreError::config("x"), SerreError::Config { .. }));
    assert!(matches!(SerreError::io("x"), SerreError::Io { .. }));
    assert!(matches!(SerreError::auth("x"), SerreError::Auth { .. }));
    assert!(matches!(SerreError::storage("x"), SerreError::Storage { .. }));
    assert!(matches!(SerreError::web("x"), SerreError::Web { .. }));
}

#[test]
fn validation_error_display() {
    let err = SerreError::validation("device.port", "Port must be greater than 0");
    assert_eq!(
        err.to_string(),
        "Validation error: device.port - Port must be greater than 0"
    );
}

#[test]
fn conversions_from_library_errors() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(SerreError::from(io), SerreError::Io { .. }));

    let json = serde_json::from_str::<u32>("nope").unwrap_err();
    assert!(matches!(
        SerreError::from(json),
        SerreError::Serialization { .. }
    ));
}
