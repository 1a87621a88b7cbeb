//! Output suppression predicates for the wrapped tools
//!
//! The Microsoft tools print banners, progress chatter, and version-specific
//! warnings on standard output that vary between runs and machines. Build
//! logs need to diff cleanly, so each wrapper strips the known noise for its
//! tool and passes everything else through untouched.

use std::collections::HashSet;

/// Keep-predicate for linker output
///
/// Drops the export-library notice and the LTCG progress lines, which appear
/// or disappear depending on what the inputs export.
pub fn keep_linker_line(line: &str) -> bool {
    !line.starts_with("   Creating library ")
        && !line.starts_with("Generating code")
        && !line.starts_with("Finished generating code")
}

/// Keep-predicate for manifest tool output
///
/// Warning 81010002 flags XML blocks the OS loader accepts but the manifest
/// tool does not recognize; it is noise for our inputs.
pub fn keep_manifest_line(line: &str) -> bool {
    !line.is_empty() && !line.contains("manifest authoring warning 81010002")
}

/// Keep-predicate for assembler output
pub fn keep_asm_line(line: &str) -> bool {
    !line.is_empty()
        && !line.starts_with("Copyright (C) Microsoft Corporation")
        && !line.starts_with("Microsoft (R) Macro Assembler")
        && !line.starts_with(" Assembling: ")
}

/// Keep-predicate for resource compiler output
///
/// Older rc versions do not support `/nologo`, so the banner is stripped
/// here instead.
pub fn keep_rc_line(line: &str) -> bool {
    !line.is_empty()
        && !line.starts_with("Microsoft (R) Windows (R) Resource Compiler")
        && !line.starts_with("Copyright (C) Microsoft Corporation")
}

const MIDL_PROCESSING_PREFIXES: [&str; 2] = ["Processing ", "64 bit Processing "];

/// Filter buffered MIDL output
///
/// MIDL announces every file it touches as a `Processing <path>` line and
/// then echoes the bare filename again; neither is quietable from the
/// command line. Two passes: collect the announced basenames, then drop the
/// announcements and their echoes.
pub fn filter_midl_output(raw: &str) -> Vec<&str> {
    let mut announced: HashSet<&str> = HashSet::new();
    for line in raw.lines() {
        for prefix in MIDL_PROCESSING_PREFIXES {
            if let Some(path) = line.strip_prefix(prefix) {
                announced.insert(file_name(path));
            }
        }
    }
    raw.lines()
        .filter(|line| {
            !MIDL_PROCESSING_PREFIXES
                .iter()
                .any(|prefix| line.starts_with(prefix))
                && !announced.contains(line)
        })
        .collect()
}

/// Final path component, accepting both separator styles
///
/// The announced paths are Windows paths regardless of which host this
/// wrapper runs on.
fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("   Creating library ui.dll.lib and object ui.dll.exp", false)]
    #[case("Generating code", false)]
    #[case("Finished generating code", false)]
    #[case("main.obj : error LNK2019: unresolved external", true)]
    #[case("", true)]
    fn test_linker_filter(#[case] line: &str, #[case] kept: bool) {
        assert_eq!(keep_linker_line(line), kept);
    }

    #[rstest]
    #[case("app.manifest : manifest authoring warning 81010002: ...", false)]
    #[case("", false)]
    #[case("app.manifest : manifest authoring error 81010001: ...", true)]
    fn test_manifest_filter(#[case] line: &str, #[case] kept: bool) {
        assert_eq!(keep_manifest_line(line), kept);
    }

    #[rstest]
    #[case("Microsoft (R) Macro Assembler Version 14.29", false)]
    #[case("Copyright (C) Microsoft Corporation.  All rights reserved.", false)]
    #[case(" Assembling: src/cpu.asm", false)]
    #[case("", false)]
    #[case("src/cpu.asm(12): error A2008: syntax error", true)]
    fn test_asm_filter(#[case] line: &str, #[case] kept: bool) {
        assert_eq!(keep_asm_line(line), kept);
    }

    #[rstest]
    #[case("Microsoft (R) Windows (R) Resource Compiler Version 10.0", false)]
    #[case("Copyright (C) Microsoft Corporation.  All rights reserved.", false)]
    #[case("", false)]
    #[case("app.rc(3): error RC2135: file not found", true)]
    fn test_rc_filter(#[case] line: &str, #[case] kept: bool) {
        assert_eq!(keep_rc_line(line), kept);
    }

    #[test]
    fn test_midl_drops_announcements_and_echoes() {
        let raw = "Processing C:\\Program Files (x86)\\Microsoft SDKs\\include\\objidl.idl\n\
                   objidl.idl\n\
                   64 bit Processing C:\\sdk\\include\\oaidl.idl\n\
                   oaidl.idl\n\
                   midl : command line error MIDL1001 : cannot open input file\n";
        let kept = filter_midl_output(raw);
        assert_eq!(
            kept,
            vec!["midl : command line error MIDL1001 : cannot open input file"]
        );
    }

    #[test]
    fn test_midl_keeps_unannounced_filename_lines() {
        // A bare filename line only disappears when a Processing line
        // announced it.
        let raw = "objidl.idl\nProcessing C:\\sdk\\include\\oaidl.idl\noaidl.idl\n";
        let kept = filter_midl_output(raw);
        assert_eq!(kept, vec!["objidl.idl"]);
    }

    #[test]
    fn test_midl_passthrough_without_announcements() {
        let raw = "error MIDL2025 : syntax error\nline two\n";
        assert_eq!(
            filter_midl_output(raw),
            vec!["error MIDL2025 : syntax error", "line two"]
        );
    }

    #[test]
    fn test_file_name_handles_both_separators() {
        assert_eq!(file_name("C:\\sdk\\include\\objidl.idl"), "objidl.idl");
        assert_eq!(file_name("include/oaidl.idl"), "oaidl.idl");
        assert_eq!(file_name("plain.idl"), "plain.idl");
    }
}
