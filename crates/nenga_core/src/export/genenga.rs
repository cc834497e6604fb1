//! Projection of card records into genenga rows.

use crate::model::nenga::{MourningStatus, NengaEntry, PrintingStatus, YearNumber};
use crate::repo::error::RepoResult;
use crate::repo::nenga_repo::NengaLedger;
use log::info;

/// Export switches. `Default` matches the CLI defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Print only cards sent as a reply.
    pub later_only: bool,
    /// Suppress households in mourning.
    pub exclude_mourning: bool,
    /// One column per zipcode digit (stock genenga) instead of one column.
    pub split_zipcode: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            later_only: false,
            exclude_mourning: true,
            split_zipcode: true,
        }
    }
}

/// One output row in genenga column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenengaRow(Vec<String>);

impl GenengaRow {
    pub fn from_columns(columns: Vec<String>) -> Self {
        Self(columns)
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }
}

/// Decides the print flag of one record.
///
/// Mourning suppression wins over every printing status.
pub fn should_print(
    printing: PrintingStatus,
    mourning: MourningStatus,
    options: &ExportOptions,
) -> bool {
    if options.exclude_mourning && mourning == MourningStatus::InMourning {
        return false;
    }
    if options.later_only {
        printing == PrintingStatus::SentAsReply
    } else {
        matches!(printing, PrintingStatus::Sent | PrintingStatus::SentAsReply)
    }
}

/// Builds the genenga row for one record.
///
/// Layout: flag, family name, given name, joint name 1, address 1,
/// address 2, then the zipcode (seven columns when split).
pub fn project_row(entry: &NengaEntry, options: &ExportOptions) -> GenengaRow {
    let flag = should_print(entry.record.printing, entry.record.mourning, options);
    let address = &entry.address;

    let mut columns = vec![
        if flag { "1" } else { "0" }.to_string(),
        address.family_name.clone(),
        address.given_name.clone(),
        address.joint_name1.clone().unwrap_or_default(),
        address.address1.clone(),
        address.address2.clone().unwrap_or_default(),
    ];
    if options.split_zipcode {
        columns.extend(address.zipcode.chars().map(String::from));
    } else {
        columns.push(address.zipcode.clone());
    }

    GenengaRow(columns)
}

/// Projects every record of `year`, ascending record id.
pub fn export_year<L: NengaLedger>(
    ledger: &L,
    year: YearNumber,
    options: &ExportOptions,
) -> RepoResult<Vec<GenengaRow>> {
    let entries = ledger.list_entries_by_year(year)?;
    let rows: Vec<GenengaRow> = entries
        .iter()
        .map(|entry| project_row(entry, options))
        .collect();
    let printed = rows
        .iter()
        .filter(|row| row.columns().first().map(String::as_str) == Some("1"))
        .count();

    info!(
        "event=genenga_project module=export status=ok year={} rows={} printed={} later_only={} exclude_mourning={} split_zipcode={}",
        year,
        rows.len(),
        printed,
        options.later_only,
        options.exclude_mourning,
        options.split_zipcode
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::{should_print, ExportOptions};
    use crate::model::nenga::{MourningStatus, PrintingStatus};

    #[test]
    fn any_sent_status_prints_by_default() {
        let options = ExportOptions::default();
        assert!(!should_print(PrintingStatus::NotSent, MourningStatus::Normal, &options));
        assert!(should_print(PrintingStatus::Sent, MourningStatus::Normal, &options));
        assert!(should_print(PrintingStatus::SentAsReply, MourningStatus::Normal, &options));
    }

    #[test]
    fn later_only_prints_replies_only() {
        let options = ExportOptions {
            later_only: true,
            ..ExportOptions::default()
        };
        assert!(!should_print(PrintingStatus::Sent, MourningStatus::Normal, &options));
        assert!(should_print(PrintingStatus::SentAsReply, MourningStatus::Normal, &options));
    }

    #[test]
    fn mourning_is_suppressed_only_when_excluded() {
        let excluded = ExportOptions::default();
        let included = ExportOptions {
            exclude_mourning: false,
            ..ExportOptions::default()
        };
        assert!(!should_print(PrintingStatus::Sent, MourningStatus::InMourning, &excluded));
        assert!(should_print(PrintingStatus::Sent, MourningStatus::InMourning, &included));
    }
}
