//! # Invoice Numbering
//!
//! Derives the next sequential invoice number from the existing sale
//! records of a calendar year.
//!
//! ## Format
//! `NNN/YYYY` - numeric sequence zero-padded to three digits, slash, year.
//! Sequences are independent per year: `"017/2024"` has no effect on the
//! 2025 sequence.
//!
//! ## Known Weak Invariant
//! The sequence is scan-max+1 over whatever numbers exist at read time.
//! Two independent processes sharing a backing store can compute the same
//! "next" number for the same year. The storage layer narrows the window
//! with a transactional assign, but does not (deliberately) replace the
//! design with a distributed sequence.

/// Parses `NNN/YYYY` into `(sequence, year)`.
///
/// Returns `None` for anything that does not match the format; malformed
/// entries in the history are skipped by the sequencer, not errors.
pub fn parse_invoice_number(s: &str) -> Option<(u32, i32)> {
    let (seq, year) = s.split_once('/')?;
    if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let seq: u32 = seq.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    if !(1000..=9999).contains(&year) {
        return None;
    }
    Some((seq, year))
}

/// Formats a sequence number for a year, e.g. `format_invoice_number(4, 2025)`
/// → `"004/2025"`.
pub fn format_invoice_number(seq: u32, year: i32) -> String {
    format!("{seq:03}/{year}")
}

/// Computes the next invoice number for `year` given the invoice numbers
/// already assigned.
///
/// Takes the maximum numeric prefix among entries of that year (malformed
/// entries ignored) and returns max+1; an empty year starts at `"001/<year>"`.
///
/// ## Example
/// ```rust
/// use prevente_core::invoice::next_invoice_number;
///
/// let existing = ["001/2025", "003/2025", "017/2024"];
/// assert_eq!(next_invoice_number(2025, existing), "004/2025");
/// assert_eq!(next_invoice_number(2026, ["x"; 0]), "001/2026");
/// ```
pub fn next_invoice_number<I, S>(year: i32, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max_seq = existing
        .into_iter()
        .filter_map(|s| parse_invoice_number(s.as_ref()))
        .filter(|&(_, y)| y == year)
        .map(|(seq, _)| seq)
        .max()
        .unwrap_or(0);

    format_invoice_number(max_seq + 1, year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_starts_at_one() {
        let none: [&str; 0] = [];
        assert_eq!(next_invoice_number(2025, none), "001/2025");
    }

    #[test]
    fn increments_past_the_year_maximum() {
        assert_eq!(next_invoice_number(2025, ["001/2025"]), "002/2025");
        assert_eq!(next_invoice_number(2025, ["002/2025", "001/2025"]), "003/2025");
    }

    #[test]
    fn other_years_do_not_affect_the_sequence() {
        assert_eq!(next_invoice_number(2025, ["017/2024", "099/2023"]), "001/2025");
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let existing = ["banana", "/2025", "12/", "1a/2025", "005/2025"];
        assert_eq!(next_invoice_number(2025, existing), "006/2025");
    }

    #[test]
    fn grows_past_three_digits() {
        assert_eq!(next_invoice_number(2025, ["999/2025"]), "1000/2025");
    }

    #[test]
    fn parse_round_trip() {
        assert_eq!(parse_invoice_number("004/2025"), Some((4, 2025)));
        assert_eq!(parse_invoice_number(&format_invoice_number(12, 2024)), Some((12, 2024)));
        assert_eq!(parse_invoice_number("004-2025"), None);
        assert_eq!(parse_invoice_number("004/25"), None);
    }
}
