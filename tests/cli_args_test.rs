//! Tests for command-line argument parsing
//!
//! Note: These tests verify the argument parser configuration by creating
//! a test parser with the same structure as the main binary.

use clap::{value_parser, Arg, ArgAction, Command as ClapCommand};
use std::path::PathBuf;

/// Create a command with the same argument structure as the main binary
fn create_test_command() -> ClapCommand {
    ClapCommand::new("neck-tracker")
        .version("0.1.0")
        .about("Stabilized head pose tracking")
        .arg(
            Arg::new("landmarks")
                .short('l')
                .long("landmarks")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .required_unless_present("print-config")
                .help("Recorded landmarks, one JSON object per line"),
        )
        .arg(
            Arg::new("config")
                .short('C')
                .long("config")
                .value_name("PATH")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("PIXELS")
                .value_parser(value_parser!(u32))
                .help("Frame width"),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("PIXELS")
                .value_parser(value_parser!(u32))
                .help("Frame height"),
        )
        .arg(
            Arg::new("alpha")
                .short('a')
                .long("alpha")
                .value_name("VALUE")
                .value_parser(value_parser!(f64))
                .help("Low-pass alpha"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debug output"),
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .action(ArgAction::SetTrue)
                .help("Print an example configuration file and exit"),
        )
}

#[test]
fn test_help_argument() {
    let cmd = create_test_command();
    let result = cmd.try_get_matches_from(vec!["neck-tracker", "--help"]);

    // Help should cause an error (but a specific help error)
    assert!(result.is_err());
    let err = result.unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}

#[test]
fn test_landmarks_required() {
    let cmd = create_test_command();
    let result = cmd.try_get_matches_from(vec!["neck-tracker"]);

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::MissingRequiredArgument);
}

#[test]
fn test_print_config_without_landmarks() {
    let cmd = create_test_command();
    let result = cmd.try_get_matches_from(vec!["neck-tracker", "--print-config"]);

    assert!(result.is_ok());
    assert!(result.unwrap().get_flag("print-config"));
}

#[test]
fn test_landmarks_argument() {
    let cmd = create_test_command();
    let result = cmd.try_get_matches_from(vec!["neck-tracker", "--landmarks", "session.jsonl"]);

    assert!(result.is_ok());
    let matches = result.unwrap();
    assert_eq!(
        matches.get_one::<PathBuf>("landmarks"),
        Some(&PathBuf::from("session.jsonl"))
    );
    assert!(!matches.get_flag("debug"));
}

#[test]
fn test_frame_size_arguments() {
    let cmd = create_test_command();
    let result = cmd.try_get_matches_from(vec![
        "neck-tracker",
        "-l",
        "session.jsonl",
        "--width",
        "1280",
        "--height",
        "720",
    ]);

    assert!(result.is_ok());
    let matches = result.unwrap();
    assert_eq!(matches.get_one::<u32>("width"), Some(&1280));
    assert_eq!(matches.get_one::<u32>("height"), Some(&720));
}

#[test]
fn test_invalid_numeric_arguments() {
    for args in [
        vec!["neck-tracker", "-l", "a.jsonl", "--width", "-5"],
        vec!["neck-tracker", "-l", "a.jsonl", "--alpha", "fast"],
    ] {
        let cmd = create_test_command();
        assert!(cmd.try_get_matches_from(args.clone()).is_err(), "Should reject: {args:?}");
    }
}

#[test]
fn test_multiple_arguments() {
    let cmd = create_test_command();
    let result = cmd.try_get_matches_from(vec![
        "neck-tracker",
        "--landmarks",
        "session.jsonl",
        "--config",
        "tracker.yaml",
        "--alpha",
        "0.35",
        "--debug",
    ]);

    assert!(result.is_ok());
    let matches = result.unwrap();
    assert_eq!(
        matches.get_one::<String>("config").map(|s| s.as_str()),
        Some("tracker.yaml")
    );
    assert_eq!(matches.get_one::<f64>("alpha"), Some(&0.35));
    assert!(matches.get_flag("debug"));
}
