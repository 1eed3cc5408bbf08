//! Tests for the error system.

use function_helpers::error::HelperError;

#[test]
fn error_messages_are_stable() {
    assert_eq!(
        HelperError::NoRuntime.to_string(),
        "No Tokio runtime available to schedule deferred executions"
    );
    assert_eq!(
        HelperError::Configuration("bad".to_string()).to_string(),
        "Configuration error: bad"
    );
    assert_eq!(
        HelperError::NotInstalled("h".to_string()).to_string(),
        "Nothing installed under 'h'"
    );
    assert_eq!(
        HelperError::TypeMismatch {
            name: "h".to_string(),
            expected: "u32",
        }
        .to_string(),
        "Registry entry 'h' is not a u32"
    );
}

#[test]
fn error_helper_groupings_are_stable() {
    struct Case {
        error: HelperError,
        configuration: bool,
        once_state: bool,
    }

    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml");
    let toml_error = toml::from_str::<toml::Value>("= broken").unwrap_err();

    let cases = vec![
        Case {
            error: HelperError::NoRuntime,
            configuration: false,
            once_state: false,
        },
        Case {
            error: HelperError::OncePoisoned,
            configuration: false,
            once_state: true,
        },
        Case {
            error: HelperError::OnceInProgress,
            configuration: false,
            once_state: true,
        },
        Case {
            error: HelperError::Configuration("x".to_string()),
            configuration: true,
            once_state: false,
        },
        Case {
            error: HelperError::from(io_error),
            configuration: true,
            once_state: false,
        },
        Case {
            error: HelperError::from(toml_error),
            configuration: true,
            once_state: false,
        },
        Case {
            error: HelperError::NotInstalled("h".to_string()),
            configuration: false,
            once_state: false,
        },
    ];

    for case in cases {
        assert_eq!(
            case.error.is_configuration(),
            case.configuration,
            "{:?}",
            case.error
        );
        assert_eq!(case.error.is_once_state(), case.once_state, "{:?}", case.error);
    }
}

#[test]
fn helper_error_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<HelperError>();
}
