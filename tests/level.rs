//! Tests for log level functionality.

use logspool::Level;

#[test]
fn level_ordering() {
    assert!(Level::Trace < Level::Debug);
    assert!(Level::Debug < Level::Info);
    assert!(Level::Info < Level::Warn);
    assert!(Level::Warn < Level::Error);
    assert!(Level::Error < Level::Critical);
}

#[test]
fn level_display() {
    assert_eq!(Level::Trace.to_string(), "trace");
    assert_eq!(Level::Debug.to_string(), "debug");
    assert_eq!(Level::Info.to_string(), "info");
    assert_eq!(Level::Warn.to_string(), "warn");
    assert_eq!(Level::Error.to_string(), "error");
    assert_eq!(Level::Critical.to_string(), "critical");
}

#[test]
fn level_from_str() {
    assert_eq!("trace".parse::<Level>().unwrap(), Level::Trace);
    assert_eq!("DEBUG".parse::<Level>().unwrap(), Level::Debug);
    assert_eq!("Info".parse::<Level>().unwrap(), Level::Info);
    assert_eq!("warning".parse::<Level>().unwrap(), Level::Warn);
    assert_eq!("err".parse::<Level>().unwrap(), Level::Error);
    assert_eq!("fatal".parse::<Level>().unwrap(), Level::Critical);
}

#[test]
fn level_from_str_invalid() {
    assert!("invalid".parse::<Level>().is_err());
}

#[test]
fn level_default() {
    assert_eq!(Level::default(), Level::Info);
}

#[test]
fn repr_round_trips() {
    for level in Level::all() {
        assert_eq!(Level::from_repr(level.repr()), level);
    }
}

#[test]
fn plain_prefix_table_has_no_escapes() {
    for prefix in Level::prefix_table(false) {
        assert!(!prefix.contains('\x1b'));
        assert!(prefix.starts_with('['));
        assert!(prefix.ends_with("] "));
    }
}

#[test]
fn colored_prefix_table_resets_styling() {
    for prefix in Level::prefix_table(true) {
        assert!(prefix.contains("\x1b[38;2;"));
        assert!(prefix.contains("\x1b[0m"));
    }
}
