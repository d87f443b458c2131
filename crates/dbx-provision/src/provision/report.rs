//! Terminal rendering of identity provisioning results

use crate::provision::identity::{ProvisionReport, RowResult, UserAction};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

fn user_label(action: UserAction) -> &'static str {
    match action {
        UserAction::Existing => "existing",
        UserAction::Created => "created",
    }
}

/// One row per roster entry: row number, email, user, membership, detail
pub fn report_table(report: &ProvisionReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Row"),
            Cell::new("Email"),
            Cell::new("User"),
            Cell::new("Membership"),
            Cell::new("Detail"),
        ]);

    for outcome in &report.rows {
        let (user, membership, detail) = match &outcome.result {
            RowResult::Added { user_id, user } => (
                user_label(*user),
                Cell::new("added").fg(Color::Green),
                user_id.clone(),
            ),
            RowResult::AlreadyMember { user_id, user } => (
                user_label(*user),
                Cell::new("already member"),
                user_id.clone(),
            ),
            RowResult::Invalid { reason } => {
                ("-", Cell::new("skipped").fg(Color::Yellow), reason.clone())
            }
            RowResult::Failed { stage, error } => (
                "-",
                Cell::new("failed").fg(Color::Red),
                format!("{stage}: {error}"),
            ),
        };

        table.add_row(vec![
            Cell::new(outcome.row),
            Cell::new(&outcome.email),
            Cell::new(user),
            membership,
            Cell::new(detail),
        ]);
    }

    table
}

/// Print the group line, the row table and the summary counts to stdout
pub fn print_report(report: &ProvisionReport) {
    let verb = if report.group_created { "created" } else { "existing" };
    println!(
        "\nGroup '{}' ({verb}, id {})\n",
        report.group_name, report.group_id
    );
    println!("{}", report_table(report));

    let s = report.summary();
    println!(
        "\n{} rows: {} added, {} already members, {} users created, {} invalid, {} failed",
        s.rows, s.members_added, s.already_members, s.users_created, s.invalid, s.failed
    );
}
