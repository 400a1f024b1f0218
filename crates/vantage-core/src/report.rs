//! Client report composition and export
//!
//! Pure shaping of a per-client report plus the capture-and-paginate export.
//! The rendered report region arrives as a raster snapshot through the
//! `RenderSurface` trait (the capture boundary); pagination is pure math over
//! the snapshot's pixel size. The exported document is a self-contained JSON
//! print package (layout plan, PNG snapshot, integrity digest) consumed by
//! the downstream PDF rasterizer.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{Error, Result};
use crate::metrics::{self, UNKNOWN_PLATFORM};
use crate::models::{Campaign, CampaignStatus, Client, RoiPoint};
use crate::roi::campaign_roi;

/// Placeholder stored until an insight has been requested for the report
pub const INSIGHT_PLACEHOLDER: &str = "No AI insight generated yet.";

// ========== Report Content ==========

/// One campaign row in a client report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCampaignRow {
    pub name: String,
    /// Platform label, with missing platforms already rolled to "Unknown"
    pub platform: String,
    pub status: CampaignStatus,
    pub budget: f64,
    pub revenue: f64,
    pub roi: f64,
}

/// Per-client report content, shaped for rendering and export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientReport {
    pub client: Client,
    pub generated_at: DateTime<Utc>,
    pub campaign_count: usize,
    pub total_budget: f64,
    pub total_revenue: f64,
    /// Mean of the per-campaign ROIs
    pub average_roi: f64,
    pub campaigns: Vec<ReportCampaignRow>,
    pub roi_series: Vec<RoiPoint>,
    pub insight: String,
}

/// Shape a client's report from their campaign rows.
///
/// Campaigns belonging to other clients are ignored, so callers can pass an
/// unfiltered snapshot. Without an insight the report carries
/// [`INSIGHT_PLACEHOLDER`].
pub fn compose_client_report(
    client: &Client,
    campaigns: &[Campaign],
    insight: Option<String>,
) -> ClientReport {
    let summary = metrics::client_metrics(client, campaigns);

    let rows = summary
        .campaigns
        .iter()
        .map(|c| ReportCampaignRow {
            name: c.name.clone(),
            platform: c
                .platform
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string()),
            status: c.status,
            budget: c.budget,
            revenue: c.effective_revenue(),
            roi: campaign_roi(c),
        })
        .collect();

    let roi_series = metrics::roi_series(&summary.campaigns);

    ClientReport {
        client: summary.client,
        generated_at: Utc::now(),
        campaign_count: summary.campaigns.len(),
        total_budget: summary.total_budget,
        total_revenue: summary.total_revenue,
        average_roi: summary.average_roi,
        campaigns: rows,
        roi_series,
        insight: insight.unwrap_or_else(|| INSIGHT_PLACEHOLDER.to_string()),
    }
}

// ========== Capture Boundary ==========

/// A captured raster image of the rendered report region
#[derive(Debug, Clone)]
pub struct ReportSnapshot {
    /// Pixel width of the capture
    pub width: u32,
    /// Pixel height of the capture
    pub height: u32,
    /// PNG-encoded image bytes
    pub png: Vec<u8>,
}

/// Source of report snapshots
///
/// The rendering itself happens outside this crate (a browser, a headless
/// renderer); implementations only hand over the finished raster.
pub trait RenderSurface {
    fn capture(&self) -> Result<ReportSnapshot>;
}

/// Render surface backed by a `data:image/png;base64,` URL
///
/// This is how captures arrive over the export endpoint: the frontend
/// rasterizes the report region and posts the canvas data URL.
pub struct DataUrlSurface {
    data_url: String,
}

impl DataUrlSurface {
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }
}

impl RenderSurface for DataUrlSurface {
    fn capture(&self) -> Result<ReportSnapshot> {
        let encoded = self
            .data_url
            .strip_prefix("data:image/png;base64,")
            .ok_or_else(|| {
                Error::Precondition("Report snapshot must be a base64 PNG data URL".to_string())
            })?;
        let png = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Precondition(format!("Report snapshot is not valid base64: {}", e)))?;
        let (width, height) = png_dimensions(&png)?;
        Ok(ReportSnapshot { width, height, png })
    }
}

/// Read the pixel size from a PNG header (signature + IHDR chunk)
fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return Err(Error::Precondition(
            "Report snapshot is not a PNG image".to_string(),
        ));
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    Ok((width, height))
}

// ========== Pagination ==========

/// Page geometry for an exported report, in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl PageSpec {
    /// A4 portrait with a 10 mm margin
    pub const A4_PORTRAIT: PageSpec = PageSpec {
        width: 210.0,
        height: 297.0,
        margin: 10.0,
    };

    /// Usable width between the margins
    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    /// Usable height between the margins
    pub fn content_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }
}

/// Placement of the full snapshot image on one page
///
/// Every page draws the whole image; pages after the first shift it up by
/// the content height already consumed, so the next strip lands between the
/// margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePlacement {
    /// Page index, starting at 0
    pub page: usize,
    /// Vertical offset of the image's top edge, in mm (negative past page 0)
    pub y_offset: f64,
}

/// Pagination plan for a captured snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePlan {
    pub spec: PageSpec,
    /// Scaled image width in mm (always the content width)
    pub image_width: f64,
    /// Scaled image height in mm
    pub image_height: f64,
    pub placements: Vec<PagePlacement>,
}

impl PagePlan {
    /// Lay a snapshot out across pages.
    ///
    /// The image scales to the content width with proportional height, then
    /// pages are appended while remaining height exceeds one content height.
    pub fn paginate(canvas_width: u32, canvas_height: u32, spec: PageSpec) -> Result<PagePlan> {
        if canvas_width == 0 || canvas_height == 0 {
            return Err(Error::Precondition(
                "Report snapshot is empty".to_string(),
            ));
        }

        let image_width = spec.content_width();
        let image_height = canvas_height as f64 * image_width / canvas_width as f64;
        let page_span = spec.content_height();

        let mut placements = vec![PagePlacement {
            page: 0,
            y_offset: spec.margin,
        }];
        let mut height_left = image_height - page_span;
        while height_left > 0.0 {
            let page = placements.len();
            placements.push(PagePlacement {
                page,
                y_offset: spec.margin - page as f64 * page_span,
            });
            height_left -= page_span;
        }

        Ok(PagePlan {
            spec,
            image_width,
            image_height,
            placements,
        })
    }

    pub fn page_count(&self) -> usize {
        self.placements.len()
    }
}

// ========== Export ==========

/// Self-contained print package written by [`export_client_report`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintPackage {
    pub report: ClientReport,
    pub layout: PagePlan,
    pub snapshot: SnapshotBlock,
}

/// Captured snapshot as stored in the print package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotBlock {
    pub width: u32,
    pub height: u32,
    /// SHA-256 of the raw PNG bytes, hex encoded
    pub sha256: String,
    pub png_base64: String,
}

/// What an export wrote and where
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub file_name: String,
    pub path: PathBuf,
    pub pages: usize,
    pub sha256: String,
    pub size: u64,
}

/// Capture, paginate, and write one client report document.
///
/// The file lands in `out_dir` under the sanitized client name (see
/// [`report_file_name`]), written to a temp file first and renamed into
/// place. An unavailable or empty capture fails with a precondition error
/// before anything is written.
pub fn export_client_report(
    surface: &dyn RenderSurface,
    report: &ClientReport,
    out_dir: &Path,
) -> Result<ReportDocument> {
    let snapshot = surface.capture()?;
    if snapshot.png.is_empty() {
        return Err(Error::Precondition(
            "Report snapshot is empty".to_string(),
        ));
    }
    let plan = PagePlan::paginate(snapshot.width, snapshot.height, PageSpec::A4_PORTRAIT)?;

    let sha256 = hex::encode(Sha256::digest(&snapshot.png));
    let package = PrintPackage {
        report: report.clone(),
        layout: plan.clone(),
        snapshot: SnapshotBlock {
            width: snapshot.width,
            height: snapshot.height,
            sha256: sha256.clone(),
            png_base64: base64::engine::general_purpose::STANDARD.encode(&snapshot.png),
        },
    };

    fs::create_dir_all(out_dir)?;
    let file_name = report_file_name(&report.client.name);
    let path = out_dir.join(&file_name);
    let body = serde_json::to_vec_pretty(&package)?;

    let mut tmp = tempfile::NamedTempFile::new_in(out_dir)?;
    tmp.write_all(&body)?;
    tmp.persist(&path).map_err(|e| Error::Io(e.error))?;

    info!(
        file = %path.display(),
        pages = plan.page_count(),
        "Exported client report"
    );

    Ok(ReportDocument {
        file_name,
        path,
        pages: plan.page_count(),
        sha256,
        size: body.len() as u64,
    })
}

/// Sanitize a client display name into the export file name.
///
/// Runs of anything outside `[A-Za-z0-9]` collapse to `-` (client names can
/// contain path separators) and an empty result falls back to `client`, then
/// the fixed `_Report.json` suffix is appended: `Acme Corp` becomes
/// `Acme-Corp_Report.json`.
pub fn report_file_name(client_name: &str) -> String {
    let sanitizer = Regex::new(r"[^A-Za-z0-9]+").expect("valid regex");
    let base = sanitizer.replace_all(client_name, "-");
    let base = base.trim_matches('-');
    if base.is_empty() {
        "client_Report.json".to_string()
    } else {
        format!("{}_Report.json", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MembershipTier;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_client(name: &str) -> Client {
        Client {
            id: 1,
            name: name.to_string(),
            email: "owner@acme.com".to_string(),
            phone: None,
            company: Some("Acme Corp".to_string()),
            membership: MembershipTier::Gold,
            is_active: true,
            owner_email: Some("manager@agency.com".to_string()),
            created_at: Utc::now(),
        }
    }

    fn sample_campaign(id: i64, client_id: i64, name: &str, budget: f64, revenue: Option<f64>) -> Campaign {
        Campaign {
            id,
            name: name.to_string(),
            platform: Some("Meta".to_string()),
            budget,
            revenue,
            status: CampaignStatus::Ongoing,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: None,
            client_id,
            created_at: Utc::now(),
        }
    }

    /// Just enough of a PNG header for dimension parsing
    fn fake_png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    struct FixedSurface {
        snapshot: ReportSnapshot,
    }

    impl RenderSurface for FixedSurface {
        fn capture(&self) -> Result<ReportSnapshot> {
            Ok(self.snapshot.clone())
        }
    }

    #[test]
    fn test_a4_content_box() {
        let spec = PageSpec::A4_PORTRAIT;
        assert_eq!(spec.content_width(), 190.0);
        assert_eq!(spec.content_height(), 277.0);
    }

    #[test]
    fn test_paginate_single_page() {
        let plan = PagePlan::paginate(1000, 1000, PageSpec::A4_PORTRAIT).unwrap();
        assert_eq!(plan.image_width, 190.0);
        assert_eq!(plan.image_height, 190.0);
        assert_eq!(plan.page_count(), 1);
        assert_eq!(plan.placements[0].y_offset, 10.0);
    }

    #[test]
    fn test_paginate_two_pages() {
        // 800x2000 px scales to 190x475 mm; 475 > 277 needs a second page
        let plan = PagePlan::paginate(800, 2000, PageSpec::A4_PORTRAIT).unwrap();
        assert_eq!(plan.image_height, 475.0);
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.placements[1].page, 1);
        assert_eq!(plan.placements[1].y_offset, 10.0 - 277.0);
    }

    #[test]
    fn test_paginate_three_pages_continues_slices() {
        let plan = PagePlan::paginate(600, 2000, PageSpec::A4_PORTRAIT).unwrap();
        assert_eq!(plan.page_count(), 3);
        // Each page shifts the image up by one more content height
        assert_eq!(plan.placements[1].y_offset, 10.0 - 277.0);
        assert_eq!(plan.placements[2].y_offset, 10.0 - 554.0);
    }

    #[test]
    fn test_paginate_exact_fit_stays_single_page() {
        // 1900x2770 px scales to exactly 190x277 mm
        let plan = PagePlan::paginate(1900, 2770, PageSpec::A4_PORTRAIT).unwrap();
        assert_eq!(plan.image_height, 277.0);
        assert_eq!(plan.page_count(), 1);
    }

    #[test]
    fn test_paginate_rejects_empty_canvas() {
        assert!(matches!(
            PagePlan::paginate(0, 500, PageSpec::A4_PORTRAIT),
            Err(Error::Precondition(_))
        ));
        assert!(matches!(
            PagePlan::paginate(500, 0, PageSpec::A4_PORTRAIT),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("Acme Corp"), "Acme-Corp_Report.json");
        assert_eq!(report_file_name("  spaced   out  "), "spaced-out_Report.json");
        assert_eq!(report_file_name(""), "client_Report.json");
        assert_eq!(report_file_name("   "), "client_Report.json");
        // Path separators and punctuation must not leak into the name
        assert_eq!(report_file_name("A/B Testing Co."), "A-B-Testing-Co_Report.json");
    }

    #[test]
    fn test_compose_client_report() {
        let client = sample_client("Acme Corp");
        let mut other = sample_campaign(3, 99, "Not ours", 500.0, None);
        other.platform = None;
        let campaigns = vec![
            sample_campaign(1, 1, "Spring Launch", 1000.0, Some(1500.0)),
            sample_campaign(2, 1, "Summer Push", 500.0, Some(600.0)),
            other,
        ];

        let report = compose_client_report(&client, &campaigns, None);

        assert_eq!(report.campaign_count, 2);
        assert_eq!(report.total_budget, 1500.0);
        assert_eq!(report.total_revenue, 2100.0);
        // Mean of 50% and 20%
        assert!((report.average_roi - 35.0).abs() < 1e-9);
        assert_eq!(report.campaigns[0].roi, 50.0);
        assert_eq!(report.roi_series.len(), 2);
        assert_eq!(report.insight, INSIGHT_PLACEHOLDER);
    }

    #[test]
    fn test_compose_rolls_missing_platform_to_unknown() {
        let client = sample_client("Acme Corp");
        let mut campaign = sample_campaign(1, 1, "Spring Launch", 1000.0, None);
        campaign.platform = None;

        let report = compose_client_report(&client, &[campaign], Some("Looks strong.".to_string()));

        assert_eq!(report.campaigns[0].platform, "Unknown");
        assert_eq!(report.insight, "Looks strong.");
    }

    #[test]
    fn test_png_dimensions() {
        let (w, h) = png_dimensions(&fake_png(800, 600)).unwrap();
        assert_eq!((w, h), (800, 600));

        assert!(png_dimensions(b"not a png at all, nope").is_err());
        assert!(png_dimensions(&[]).is_err());
    }

    #[test]
    fn test_data_url_surface_capture() {
        let png = fake_png(640, 480);
        let data_url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );

        let snapshot = DataUrlSurface::new(data_url).capture().unwrap();
        assert_eq!(snapshot.width, 640);
        assert_eq!(snapshot.height, 480);
        assert_eq!(snapshot.png, png);
    }

    #[test]
    fn test_data_url_surface_rejects_non_png() {
        let surface = DataUrlSurface::new("data:image/jpeg;base64,AAAA");
        assert!(matches!(surface.capture(), Err(Error::Precondition(_))));

        let surface = DataUrlSurface::new("data:image/png;base64,!!!not-base64!!!");
        assert!(matches!(surface.capture(), Err(Error::Precondition(_))));
    }

    #[test]
    fn test_export_client_report() {
        let dir = TempDir::new().unwrap();
        let client = sample_client("Acme Corp");
        let campaigns = vec![sample_campaign(1, 1, "Spring Launch", 1000.0, Some(1500.0))];
        let report = compose_client_report(&client, &campaigns, None);

        let png = fake_png(800, 2000);
        let surface = FixedSurface {
            snapshot: ReportSnapshot {
                width: 800,
                height: 2000,
                png: png.clone(),
            },
        };

        let doc = export_client_report(&surface, &report, dir.path()).unwrap();

        assert_eq!(doc.file_name, "Acme-Corp_Report.json");
        assert_eq!(doc.pages, 2);
        assert!(doc.path.exists());

        // The written package round-trips and matches the digest
        let body = fs::read(&doc.path).unwrap();
        let package: PrintPackage = serde_json::from_slice(&body).unwrap();
        assert_eq!(package.layout.page_count(), 2);
        assert_eq!(package.snapshot.sha256, doc.sha256);
        assert_eq!(package.snapshot.sha256, hex::encode(Sha256::digest(&png)));
        assert_eq!(package.report.client.name, "Acme Corp");

        // No temp files left behind
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_export_rejects_empty_capture() {
        let dir = TempDir::new().unwrap();
        let client = sample_client("Acme Corp");
        let report = compose_client_report(&client, &[], None);

        let surface = FixedSurface {
            snapshot: ReportSnapshot {
                width: 0,
                height: 0,
                png: Vec::new(),
            },
        };

        let result = export_client_report(&surface, &report, dir.path());
        assert!(matches!(result, Err(Error::Precondition(_))));
        // Nothing was written
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
