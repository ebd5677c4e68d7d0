//! Interface status cleanup.
//!
//! Turns the fixed-width status tables printed by Cisco devices into one
//! comma-delimited record per line. The substitutions are lexical and run
//! in a fixed order: the same words appear legitimately inside interface
//! descriptions, so a generic tokenizer would split rows in the wrong place.

use std::sync::LazyLock;

use regex::Regex;

/// Field delimiter of normalized records.
pub const DELIMITER: char = ',';

/// Column words of `show ip interface brief` that carry no information.
const IOS_HEADER_TOKENS: [&str; 10] = [
    "OK?", "Method", "YES", "NO", "unset", "NVRAM", "IPCP", "CONFIG", "TFTP", "manual",
];

/// Status words of NX-OS `show interface status`, in substitution order.
const NXOS_STATUS_TOKENS: [&str; 7] = [
    "connected",
    "sfpAbsent",
    "noOperMem",
    "disabled",
    "down",
    "notconnec",
    "linkFlapE",
];

static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(" {2,}").unwrap());

/// Clean one line of IOS-family interface output.
pub fn clean_ios_line(line: &str) -> String {
    let mut out = line.to_string();
    for token in IOS_HEADER_TOKENS {
        out = out.replace(token, "");
    }

    let out = SPACE_RUN.replace_all(out.trim_end(), ",");
    out.replace("down down", "down,down")
        .replace(" unassigned", ",unassigned")
        .replace("unassigned ", "unassigned,")
}

/// Clean one line of NX-OS interface output.
pub fn clean_nxos_line(line: &str) -> String {
    let mut out = line.trim_end().to_string();
    for token in NXOS_STATUS_TOKENS {
        out = out.replace(&format!(" {token}"), &format!(",{token}"));
        out = out.replace(&format!("{token} "), &format!("{token},"));
    }
    out
}

/// Normalize a whole IOS-family table, one record per non-blank line.
pub fn ios_interface_status(raw: &str) -> Vec<String> {
    normalize_lines(raw, clean_ios_line)
}

/// Normalize a whole NX-OS table, one record per non-blank line.
pub fn nxos_interface_status(raw: &str) -> Vec<String> {
    normalize_lines(raw, clean_nxos_line)
}

fn normalize_lines(raw: &str, clean: fn(&str) -> String) -> Vec<String> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(clean)
        .collect()
}
