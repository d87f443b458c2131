//! Group/user rosters loaded from CSV
//!
//! A roster is a CSV with a header row containing at least `Group Name` and
//! `User Email`. Every row names the same group; only the first row's group
//! name is used.

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Header of the group name column
pub const GROUP_NAME_COLUMN: &str = "Group Name";

/// Header of the user email column
pub const USER_EMAIL_COLUMN: &str = "User Email";

/// Roster loading errors
#[derive(Debug, Error)]
pub enum RosterError {
    /// Malformed CSV
    #[error("Failed to parse roster CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Header row lacks a required column
    #[error("roster is missing the '{0}' column")]
    MissingColumn(&'static str),

    /// Header row but no data rows
    #[error("roster has no rows")]
    Empty,

    /// The first row, which decides the group, has a blank group name
    #[error("roster row 1 has an empty 'Group Name'")]
    EmptyGroupName,

    /// Failed to read the roster file
    #[error("Failed to read roster file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One `(group, email)` row
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterRow {
    #[serde(rename = "Group Name")]
    pub group_name: String,
    #[serde(rename = "User Email")]
    pub user_email: String,
}

/// Rows of one roster, all destined for the same group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    group_name: String,
    rows: Vec<RosterRow>,
}

impl Roster {
    /// Build a roster from rows; the first row decides the group
    pub fn from_rows(rows: Vec<RosterRow>) -> Result<Self, RosterError> {
        let group_name = rows.first().ok_or(RosterError::Empty)?.group_name.clone();
        if group_name.trim().is_empty() {
            return Err(RosterError::EmptyGroupName);
        }

        for (idx, row) in rows.iter().enumerate().skip(1) {
            if row.group_name != group_name {
                warn!(
                    row = idx + 1,
                    expected = %group_name,
                    found = %row.group_name,
                    "Roster row names a different group; using the first row's group"
                );
            }
        }

        Ok(Self { group_name, rows })
    }

    /// Parse CSV content
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RosterError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv.headers()?;
        for column in [GROUP_NAME_COLUMN, USER_EMAIL_COLUMN] {
            if !headers.iter().any(|h| h == column) {
                return Err(RosterError::MissingColumn(column));
            }
        }

        let rows = csv
            .deserialize::<RosterRow>()
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_rows(rows)
    }

    /// Parse CSV text
    pub fn from_csv_str(content: &str) -> Result<Self, RosterError> {
        Self::from_reader(content.as_bytes())
    }

    /// Load a roster from a local CSV file
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let file = std::fs::File::open(path).map_err(|source| RosterError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Group every row is added to
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
