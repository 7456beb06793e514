//! Tests for the get subcommand.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use segdl_core::SegmentPolicy;
use std::path::Path;

#[test]
fn cli_parse_get_defaults() {
    match parse(&["segdl", "get", "https://example.com/file.iso"]) {
        CliCommand::Get {
            url,
            dir,
            segments,
            output,
            sha256,
        } => {
            assert_eq!(url, "https://example.com/file.iso");
            assert!(dir.is_none());
            assert!(segments.is_none());
            assert!(output.is_none());
            assert!(sha256.is_none());
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_all_flags() {
    match parse(&[
        "segdl",
        "get",
        "https://example.com/x",
        "-d",
        "/tmp",
        "-s",
        "6",
        "-o",
        "y.bin",
        "--sha256",
        "abcd",
    ]) {
        CliCommand::Get {
            dir,
            segments,
            output,
            sha256,
            ..
        } => {
            assert_eq!(dir.as_deref(), Some(Path::new("/tmp")));
            assert_eq!(segments, Some(SegmentPolicy::Fixed(6)));
            assert_eq!(output.as_deref(), Some("y.bin"));
            assert_eq!(sha256.as_deref(), Some("abcd"));
        }
        _ => panic!("expected Get with flags"),
    }
}

#[test]
fn cli_parse_get_auto_segments() {
    match parse(&["segdl", "get", "https://example.com/x", "--segments", "AUTO"]) {
        CliCommand::Get { segments, .. } => assert_eq!(segments, Some(SegmentPolicy::Auto)),
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_rejects_bad_segment_count() {
    for bad in ["0", "-3", "many"] {
        let r = Cli::try_parse_from(["segdl", "get", "https://example.com/x", "-s", bad]);
        assert!(r.is_err(), "segments {:?} should be rejected", bad);
    }
}

#[test]
fn cli_parse_get_requires_url() {
    assert!(Cli::try_parse_from(["segdl", "get"]).is_err());
}
