//! Text rendering of lookup results

use crate::db::LocationRecord;
use std::fmt::Write;

/// Most records rendered in one reply
pub const MAX_LISTED: usize = 10;

pub const NO_MATCHES: &str = "I couldn't find any matching resources in the database.";

/// Render records as a numbered list in the order given
pub fn format_results(records: &[LocationRecord]) -> String {
    if records.is_empty() {
        return NO_MATCHES.to_string();
    }

    let mut out = format!("I found {} resource(s):\n\n", records.len());
    for (i, record) in records.iter().take(MAX_LISTED).enumerate() {
        let _ = writeln!(out, "{}. **{}**", i + 1, record.name);
        let _ = writeln!(out, "   📍 Location: {}", record.location);
        if let Some(link) = &record.link {
            let _ = writeln!(out, "   🔗 Website: {link}");
        }
        let _ = write!(out, "   ℹ️ {}\n\n", record.description);
    }

    if records.len() > MAX_LISTED {
        let _ = write!(
            out,
            "\n_Showing first {MAX_LISTED} results of {} total._",
            records.len()
        );
    }
    out
}
