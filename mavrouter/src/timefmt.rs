//! Translates a Go reference-time layout (e.g. `2006-01-02_15-04-05`) into a
//! [`chrono`](https://docs.rs/chrono) strftime format string.
//!
//! The dump-path template (spec §6, `--dump-path`) borrows Go's reference-time idiom rather
//! than strftime directly, since that's what the router this system replaces exposes on its
//! CLI. Translating once at startup keeps the rest of the dump manager oblivious to the
//! distinction and lets it just call [`chrono::DateTime::format`].

/// Longest tokens first, so e.g. `2006` is matched before a lone `2` would be.
const TOKENS: &[(&str, &str)] = &[
    ("2006", "%Y"),
    ("06", "%y"),
    ("January", "%B"),
    ("Jan", "%b"),
    ("Monday", "%A"),
    ("Mon", "%a"),
    ("01", "%m"),
    ("02", "%d"),
    ("15", "%H"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    (".000000000", "%.9f"),
    (".000000", "%.6f"),
    (".000", "%.3f"),
    ("Z07:00", "%:z"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("MST", "%Z"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

/// Translates a Go reference-time layout into a `chrono` format string.
///
/// Characters that don't match a recognized token (separators such as `-`, `_`, `:`, `.`, or
/// a file extension) are copied through unchanged — `chrono::format` only treats `%`-prefixed
/// sequences specially, so they remain literal.
pub fn translate(go_layout: &str) -> String {
    let mut out = String::with_capacity(go_layout.len() + 8);
    let bytes = go_layout.as_bytes();
    let mut i = 0;

    'outer: while i < bytes.len() {
        for (token, replacement) in TOKENS {
            if go_layout[i..].starts_with(token) {
                out.push_str(replacement);
                i += token.len();
                continue 'outer;
            }
        }
        // `%` is special to chrono; a literal one in the template must be escaped.
        if bytes[i] == b'%' {
            out.push_str("%%");
        } else {
            out.push(bytes[i] as char);
        }
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    #[test]
    fn translates_the_default_dump_template() {
        assert_eq!(translate("2006-01-02_15-04-05"), "%Y-%m-%d_%H-%M-%S");
    }

    #[test]
    fn renders_the_spec_scenario_literally() {
        let layout = translate("2006-01-02_15-04-05");
        let t = Local.with_ymd_and_hms(2009, 5, 20, 22, 15, 25).unwrap();
        assert_eq!(t.format(&layout).to_string(), "2009-05-20_22-15-25");
    }

    #[test]
    fn passes_through_unrecognized_literal_characters() {
        let layout = translate("dump/2006-01-02.tlog");
        let t = Local.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(t.format(&layout).to_string(), "dump/2024-01-02.tlog");
    }
}
