//! Workbook exporters.
//!
//! - Workbook: in-memory sheets and XLSX serialization
//! - Percentages: user ids per offered percentage
//! - Sms: offer links per locale
//! - Deposits: user ids per requested deposit

pub mod deposits;
pub mod percentages;
pub mod sms;
pub mod workbook;

pub use deposits::export_deposits;
pub use percentages::export_percentages;
pub use sms::{export_sms, offer_link};
pub use workbook::{Sheet, Workbook};

use serde::Serialize;
use std::fmt;

use crate::error::ExportResult;

/// The three workbooks a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Percentages,
    Sms,
    Deposits,
}

impl ExportKind {
    pub const ALL: [ExportKind; 3] = [ExportKind::Percentages, ExportKind::Sms, ExportKind::Deposits];

    /// Short name used in URLs.
    pub fn slug(self) -> &'static str {
        match self {
            ExportKind::Percentages => "percentages",
            ExportKind::Sms => "sms",
            ExportKind::Deposits => "deposits",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    /// File name for a run tagged `tag`, e.g. `SMS-10.18-142501.xlsx`.
    pub fn file_name(self, tag: &str) -> String {
        let prefix = match self {
            ExportKind::Percentages => "Percentages",
            ExportKind::Sms => "SMS",
            ExportKind::Deposits => "RequestedDep",
        };
        format!("{}-{}.xlsx", prefix, tag)
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Workbooks from one pipeline run, built independently of each other.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    pub percentages: Workbook,
    pub sms: Workbook,
    pub deposits: Workbook,
}

impl ExportBundle {
    pub fn get(&self, kind: ExportKind) -> &Workbook {
        match kind {
            ExportKind::Percentages => &self.percentages,
            ExportKind::Sms => &self.sms,
            ExportKind::Deposits => &self.deposits,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExportKind, &Workbook)> {
        ExportKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    /// XLSX bytes for every workbook; fails before anything is returned if
    /// any one of them cannot be serialized.
    pub fn to_xlsx(&self) -> ExportResult<Vec<(ExportKind, Vec<u8>)>> {
        self.iter()
            .map(|(kind, wb)| Ok((kind, wb.to_xlsx_bytes()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(ExportKind::Percentages.file_name("10.18-090000"), "Percentages-10.18-090000.xlsx");
        assert_eq!(ExportKind::Sms.file_name("t"), "SMS-t.xlsx");
        assert_eq!(ExportKind::Deposits.file_name("t"), "RequestedDep-t.xlsx");
    }

    #[test]
    fn test_slug_round_trip() {
        for kind in ExportKind::ALL {
            assert_eq!(ExportKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(ExportKind::from_slug("SMS"), None);
    }
}
