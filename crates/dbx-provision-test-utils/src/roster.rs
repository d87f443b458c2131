//! CSV roster fixtures

use std::io::Write;
use tempfile::NamedTempFile;

/// One group, three users; `existing@example.com` is pre-seeded in most tests
pub const THREE_USERS: &str = "\
Group Name,User Email
data-eng,john.doe@example.com
data-eng,existing@example.com
data-eng,jane@example.com
";

/// Extra columns and padded cells
pub const WITH_EXTRA_COLUMNS: &str = "\
Team,Group Name,User Email,Notes
core, analysts , ann.lee@example.com ,first
core,analysts,bob@example.com,
";

/// A valid row around two invalid emails
pub const WITH_INVALID_EMAILS: &str = "\
Group Name,User Email
ops,not-an-email
ops,@example.com
ops,ok.user@example.com
";

/// Write `content` to a temporary `.csv` file, deleted when dropped
pub fn write_roster(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("create temp roster");
    file.write_all(content.as_bytes()).expect("write temp roster");
    file
}
