// fixtures/naming.rs - Per-test table names
//
// The scoped runner makes no promise about isolation: two tests that share a
// table while running in parallel will see each other's rows. Giving every
// test its own table name is the simplest way around that.

use uuid::Uuid;

/// PostgreSQL truncates identifiers longer than this many bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

const SUFFIX_LEN: usize = 8;

/// Replace everything that is not an ASCII letter, digit or underscore with
/// an underscore, so the result can be used as an unquoted SQL identifier.
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Build a table name that is unique per call, e.g.
/// `customers_counts_premium_3f9a1c2e`.
///
/// The test name is sanitized and truncated so the whole name stays within
/// [`MAX_IDENTIFIER_LEN`].
pub fn unique_table_name(prefix: &str, test_name: &str) -> String {
    let mut base = format!(
        "{}_{}",
        sanitize_identifier(prefix),
        sanitize_identifier(test_name)
    );

    if !base.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        base.insert_str(0, "t_");
    }

    // Sanitized names are pure ASCII, so byte truncation is safe
    base.truncate(MAX_IDENTIFIER_LEN - SUFFIX_LEN - 1);

    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", base, &suffix[..SUFFIX_LEN])
}
