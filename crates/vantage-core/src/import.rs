//! CSV import parsers for ad platform campaign exports

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{CampaignStatus, NewCampaign};

/// Supported ad platform CSV dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportFormat {
    /// Meta Ads campaign export
    MetaAds,
    /// Google Ads campaign export
    GoogleAds,
}

impl ImportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetaAds => "meta",
            Self::GoogleAds => "google",
        }
    }

    /// Platform label stamped on imported campaigns
    pub fn platform_label(&self) -> &'static str {
        match self {
            Self::MetaAds => "Meta",
            Self::GoogleAds => "Google",
        }
    }
}

impl std::str::FromStr for ImportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "meta" | "meta_ads" | "facebook" => Ok(Self::MetaAds),
            "google" | "google_ads" | "adwords" => Ok(Self::GoogleAds),
            _ => Err(format!("Unknown import format: {}", s)),
        }
    }
}

impl std::fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one import run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStats {
    /// Rows inserted
    pub imported: usize,
    /// Rows skipped as already present
    pub skipped: usize,
}

/// Parse CSV data from an ad platform export into campaigns for one client
pub fn parse_csv<R: Read>(reader: R, format: ImportFormat, client_id: i64) -> Result<Vec<NewCampaign>> {
    match format {
        ImportFormat::MetaAds => parse_meta(reader, client_id),
        ImportFormat::GoogleAds => parse_google(reader, client_id),
    }
}

/// Detect the export format from the CSV header line
///
/// Returns None if the format is not recognized.
pub fn detect_format(header: &str) -> Option<ImportFormat> {
    let header = header.trim();

    // Meta: "Campaign name,Amount spent (USD),Purchases conversion value,..."
    if header.starts_with("Campaign name,Amount spent (USD),Purchases conversion value") {
        return Some(ImportFormat::MetaAds);
    }

    // Google: "Campaign,Cost,Conv. value,Campaign state,..."
    if header.starts_with("Campaign,Cost,Conv. value,Campaign state") {
        return Some(ImportFormat::GoogleAds);
    }

    None
}

/// Dedup hash for an imported row
///
/// Imports are idempotent per (client, campaign name, start date): the same
/// file imported twice inserts nothing new.
pub fn import_hash(client_id: i64, name: &str, start_date: &NaiveDate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(client_id.to_be_bytes());
    hasher.update(name.as_bytes());
    hasher.update(start_date.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse Meta Ads CSV format
/// Format: Campaign name,Amount spent (USD),Purchases conversion value,Ad delivery,Reporting starts,Reporting ends
fn parse_meta<R: Read>(reader: R, client_id: i64) -> Result<Vec<NewCampaign>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut campaigns = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        // Header is line 1
        let row = i + 2;
        let record = result?;

        let name = required_field(&record, 0, "campaign name").map_err(|e| with_row(row, e))?;

        let budget = match record.get(1).map(str::trim) {
            Some("") | None => 0.0,
            Some(s) => parse_amount(s).map_err(|e| with_row(row, e))?,
        };

        let revenue = optional_amount(&record, 2).map_err(|e| with_row(row, e))?;

        let delivery = record.get(3).map(str::trim).unwrap_or_default();
        let status = if delivery.eq_ignore_ascii_case("active") {
            CampaignStatus::Ongoing
        } else {
            CampaignStatus::Completed
        };

        let start_str = required_field(&record, 4, "reporting start").map_err(|e| with_row(row, e))?;
        let start_date = parse_date(&start_str).map_err(|e| with_row(row, e))?;
        let end_date = optional_date(&record, 5).map_err(|e| with_row(row, e))?;

        campaigns.push(NewCampaign {
            name,
            platform: Some(ImportFormat::MetaAds.platform_label().to_string()),
            budget,
            // A still-delivering campaign has no finalized revenue
            revenue: if status == CampaignStatus::Ongoing { None } else { revenue },
            status,
            start_date,
            end_date,
            client_id,
        });
    }

    debug!("Parsed {} Meta Ads campaigns", campaigns.len());
    Ok(campaigns)
}

/// Parse Google Ads CSV format
/// Format: Campaign,Cost,Conv. value,Campaign state,Start date,End date
fn parse_google<R: Read>(reader: R, client_id: i64) -> Result<Vec<NewCampaign>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut campaigns = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let row = i + 2;
        let record = result?;

        let name = required_field(&record, 0, "campaign name").map_err(|e| with_row(row, e))?;

        let budget = match record.get(1).map(str::trim) {
            Some("") | None => 0.0,
            Some(s) => parse_amount(s).map_err(|e| with_row(row, e))?,
        };

        let revenue = optional_amount(&record, 2).map_err(|e| with_row(row, e))?;

        let state = record.get(3).map(str::trim).unwrap_or_default();
        let status = if state.eq_ignore_ascii_case("enabled") {
            CampaignStatus::Ongoing
        } else {
            CampaignStatus::Completed
        };

        let start_str = required_field(&record, 4, "start date").map_err(|e| with_row(row, e))?;
        let start_date = parse_date(&start_str).map_err(|e| with_row(row, e))?;
        let end_date = optional_date(&record, 5).map_err(|e| with_row(row, e))?;

        campaigns.push(NewCampaign {
            name,
            platform: Some(ImportFormat::GoogleAds.platform_label().to_string()),
            budget,
            revenue: if status == CampaignStatus::Ongoing { None } else { revenue },
            status,
            start_date,
            end_date,
            client_id,
        });
    }

    debug!("Parsed {} Google Ads campaigns", campaigns.len());
    Ok(campaigns)
}

fn required_field(record: &StringRecord, index: usize, what: &str) -> Result<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| Error::Import(format!("Missing {}", what)))
}

/// Empty cells (and Google's `--` placeholder) mean no value
fn optional_amount(record: &StringRecord, index: usize) -> Result<Option<f64>> {
    match record.get(index).map(str::trim) {
        Some("") | Some("--") | None => Ok(None),
        Some(s) => parse_amount(s).map(Some),
    }
}

fn optional_date(record: &StringRecord, index: usize) -> Result<Option<NaiveDate>> {
    match record.get(index).map(str::trim) {
        Some("") | Some("--") | None => Ok(None),
        Some(s) => parse_date(s).map(Some),
    }
}

fn with_row(row: usize, e: Error) -> Error {
    match e {
        Error::Import(msg) => Error::Import(format!("Row {}: {}", row, msg)),
        other => other,
    }
}

/// Parse a date string in the formats ad platforms export
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-03-01
        "%m/%d/%Y", // 03/01/2024
        "%m/%d/%y", // 03/01/24
        "%b %d, %Y", // Mar 1, 2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s.trim().replace(['$', ',', ' '], "");

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const META_HEADER: &str =
        "Campaign name,Amount spent (USD),Purchases conversion value,Ad delivery,Reporting starts,Reporting ends";
    const GOOGLE_HEADER: &str = "Campaign,Cost,Conv. value,Campaign state,Start date,End date";

    #[test]
    fn test_detect_meta() {
        assert_eq!(detect_format(META_HEADER), Some(ImportFormat::MetaAds));
    }

    #[test]
    fn test_detect_google() {
        assert_eq!(detect_format(GOOGLE_HEADER), Some(ImportFormat::GoogleAds));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_format("Date,Description,Amount"), None);
        assert_eq!(detect_format(""), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("meta".parse::<ImportFormat>().unwrap(), ImportFormat::MetaAds);
        assert_eq!("Google".parse::<ImportFormat>().unwrap(), ImportFormat::GoogleAds);
        assert!("bing".parse::<ImportFormat>().is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(
            parse_date("03/01/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_date("soon").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("980").unwrap(), 980.0);
        assert!(parse_amount("n/a").is_err());
    }

    #[test]
    fn test_parse_meta() {
        let csv = format!(
            "{}\n\
             Spring Launch,\"$1,200.00\",1800.50,active,2024-03-01,\n\
             Winter Clearance,800,950,inactive,2024-01-05,2024-02-01",
            META_HEADER
        );

        let campaigns = parse_csv(csv.as_bytes(), ImportFormat::MetaAds, 7).unwrap();
        assert_eq!(campaigns.len(), 2);

        let spring = &campaigns[0];
        assert_eq!(spring.name, "Spring Launch");
        assert_eq!(spring.platform.as_deref(), Some("Meta"));
        assert_eq!(spring.budget, 1200.0);
        // Active rows import as ongoing with no finalized revenue
        assert_eq!(spring.status, CampaignStatus::Ongoing);
        assert_eq!(spring.revenue, None);
        assert_eq!(spring.end_date, None);
        assert_eq!(spring.client_id, 7);

        let winter = &campaigns[1];
        assert_eq!(winter.status, CampaignStatus::Completed);
        assert_eq!(winter.revenue, Some(950.0));
        assert_eq!(
            winter.end_date,
            Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        );
    }

    #[test]
    fn test_parse_google() {
        let csv = format!(
            "{}\n\
             Brand Search,450.75,900,Enabled,2024-02-10,--\n\
             Display Retargeting,\"2,000\",1500,Paused,2023-11-01,2024-01-15",
            GOOGLE_HEADER
        );

        let campaigns = parse_csv(csv.as_bytes(), ImportFormat::GoogleAds, 3).unwrap();
        assert_eq!(campaigns.len(), 2);

        let search = &campaigns[0];
        assert_eq!(search.name, "Brand Search");
        assert_eq!(search.platform.as_deref(), Some("Google"));
        assert_eq!(search.status, CampaignStatus::Ongoing);
        assert_eq!(search.revenue, None);
        assert_eq!(search.end_date, None);

        let display = &campaigns[1];
        assert_eq!(display.budget, 2000.0);
        assert_eq!(display.status, CampaignStatus::Completed);
        assert_eq!(display.revenue, Some(1500.0));
    }

    #[test]
    fn test_parse_meta_empty_spend_defaults_to_zero() {
        let csv = format!("{}\nNever Delivered,,,inactive,2024-03-01,", META_HEADER);
        let campaigns = parse_csv(csv.as_bytes(), ImportFormat::MetaAds, 1).unwrap();
        assert_eq!(campaigns[0].budget, 0.0);
        assert_eq!(campaigns[0].revenue, None);
    }

    #[test]
    fn test_malformed_row_reports_row_number() {
        let csv = format!(
            "{}\nGood Row,100,200,inactive,2024-03-01,\nBad Row,100,200,inactive,not-a-date,",
            META_HEADER
        );
        let err = parse_csv(csv.as_bytes(), ImportFormat::MetaAds, 1).unwrap_err();
        match err {
            Error::Import(msg) => {
                assert!(msg.contains("Row 3"), "message: {}", msg);
                assert!(msg.contains("not-a-date"), "message: {}", msg);
            }
            other => panic!("expected import error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_name_fails() {
        let csv = format!("{}\n,100,200,active,2024-03-01,", META_HEADER);
        let err = parse_csv(csv.as_bytes(), ImportFormat::MetaAds, 1).unwrap_err();
        assert!(matches!(err, Error::Import(_)));
    }

    #[test]
    fn test_import_hash_is_stable_per_client_name_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let a = import_hash(1, "Spring Launch", &date);
        let b = import_hash(1, "Spring Launch", &date);
        assert_eq!(a, b);

        assert_ne!(a, import_hash(2, "Spring Launch", &date));
        assert_ne!(a, import_hash(1, "Summer Push", &date));
        assert_ne!(
            a,
            import_hash(1, "Spring Launch", &NaiveDate::from_ymd_opt(2024, 3, 2).unwrap())
        );
    }
}
