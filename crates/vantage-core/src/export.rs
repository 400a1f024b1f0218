//! Export functionality for campaigns and the client roster
//!
//! Supports:
//! - Campaign CSV/JSON export with filtering (client, status), joined with
//!   the client name and the derived ROI column
//! - Client roster CSV/JSON export, scoped to the viewer

use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CampaignStatus, Viewer};
use crate::roi;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Options for campaign export
#[derive(Debug, Clone, Default)]
pub struct CampaignExportOptions {
    /// Restrict to one client's campaigns
    pub client_id: Option<i64>,
    /// Restrict to one status
    pub status: Option<CampaignStatus>,
}

/// A campaign with its client name and derived ROI for export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignExport {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub name: String,
    pub platform: Option<String>,
    pub status: String,
    pub budget: f64,
    pub revenue: Option<f64>,
    pub roi: f64,
    pub start_date: String,
    pub end_date: Option<String>,
    pub created_at: String,
}

/// A client roster row for export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientExport {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub membership: String,
    pub is_active: bool,
    pub owner_email: Option<String>,
    /// Number of campaigns attached to the client
    pub campaign_count: i64,
    pub created_at: String,
}

impl Database {
    /// Export campaigns to CSV format
    ///
    /// Columns: id, client, name, platform, status, budget, revenue, roi,
    /// start_date, end_date
    pub fn export_campaigns_csv(&self, opts: &CampaignExportOptions) -> Result<String> {
        let campaigns = self.export_campaigns(opts)?;

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record([
            "id",
            "client",
            "name",
            "platform",
            "status",
            "budget",
            "revenue",
            "roi",
            "start_date",
            "end_date",
        ])?;

        for c in campaigns {
            wtr.write_record([
                c.id.to_string(),
                c.client_name,
                c.name,
                c.platform.unwrap_or_default(),
                c.status,
                format!("{:.2}", c.budget),
                c.revenue.map(|r| format!("{:.2}", r)).unwrap_or_default(),
                format!("{:.2}", c.roi),
                c.start_date,
                c.end_date.unwrap_or_default(),
            ])?;
        }

        writer_to_string(wtr)
    }

    /// Export campaigns with filtering, joined with their client's name
    pub fn export_campaigns(&self, opts: &CampaignExportOptions) -> Result<Vec<CampaignExport>> {
        let conn = self.conn()?;

        let mut sql = String::from(
            r#"
            SELECT ca.id, ca.client_id, cl.name, ca.name, ca.platform, ca.status,
                   ca.budget, ca.revenue, ca.start_date, ca.end_date, ca.created_at
            FROM campaigns ca
            JOIN clients cl ON cl.id = ca.client_id
            WHERE 1 = 1
            "#,
        );

        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(client_id) = opts.client_id {
            sql.push_str(&format!(" AND ca.client_id = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(client_id));
        }

        if let Some(status) = opts.status {
            sql.push_str(&format!(" AND ca.status = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(status.as_str().to_lowercase()));
        }

        sql.push_str(" ORDER BY ca.start_date ASC, ca.id ASC");

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let campaigns = stmt
            .query_map(params_refs.as_slice(), |row| {
                let status_str: String = row.get(5)?;
                let budget: f64 = row.get(6)?;
                let revenue: Option<f64> = row.get(7)?;
                Ok(CampaignExport {
                    id: row.get(0)?,
                    client_id: row.get(1)?,
                    client_name: row.get(2)?,
                    name: row.get(3)?,
                    platform: row.get(4)?,
                    status: status_str
                        .parse::<CampaignStatus>()
                        .unwrap_or_default()
                        .as_str()
                        .to_string(),
                    budget,
                    revenue,
                    roi: roi::roi(budget, revenue),
                    start_date: row.get(8)?,
                    end_date: row.get(9)?,
                    created_at: row.get(10)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(campaigns)
    }

    /// Export the client roster to CSV format
    ///
    /// Columns: id, name, email, phone, company, membership, active,
    /// campaigns, manager
    pub fn export_clients_csv(&self, viewer: &Viewer) -> Result<String> {
        let clients = self.export_clients(viewer)?;

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record([
            "id",
            "name",
            "email",
            "phone",
            "company",
            "membership",
            "active",
            "campaigns",
            "manager",
        ])?;

        for c in clients {
            wtr.write_record([
                c.id.to_string(),
                c.name,
                c.email,
                c.phone.unwrap_or_default(),
                c.company.unwrap_or_default(),
                c.membership,
                c.is_active.to_string(),
                c.campaign_count.to_string(),
                c.owner_email.unwrap_or_default(),
            ])?;
        }

        writer_to_string(wtr)
    }

    /// Export clients visible to the viewer, with campaign counts
    pub fn export_clients(&self, viewer: &Viewer) -> Result<Vec<ClientExport>> {
        use rusqlite::params;
        let conn = self.conn()?;

        let sql_all = r#"
            SELECT cl.id, cl.name, cl.email, cl.phone, cl.company, cl.membership,
                   cl.is_active, cl.owner_email, cl.created_at, COUNT(ca.id)
            FROM clients cl
            LEFT JOIN campaigns ca ON ca.client_id = cl.id
            GROUP BY cl.id
            ORDER BY cl.id ASC
            "#;
        let sql_scoped = r#"
            SELECT cl.id, cl.name, cl.email, cl.phone, cl.company, cl.membership,
                   cl.is_active, cl.owner_email, cl.created_at, COUNT(ca.id)
            FROM clients cl
            LEFT JOIN campaigns ca ON ca.client_id = cl.id
            WHERE cl.owner_email = ?1
            GROUP BY cl.id
            ORDER BY cl.id ASC
            "#;

        let mut stmt = if viewer.is_admin() {
            conn.prepare(sql_all)?
        } else {
            conn.prepare(sql_scoped)?
        };

        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<ClientExport> {
            let membership_str: String = row.get(5)?;
            let is_active_int: i64 = row.get(6)?;
            Ok(ClientExport {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                phone: row.get(3)?,
                company: row.get(4)?,
                membership: membership_str
                    .parse::<crate::models::MembershipTier>()
                    .unwrap_or_default()
                    .as_str()
                    .to_string(),
                is_active: is_active_int != 0,
                owner_email: row.get(7)?,
                created_at: row.get(8)?,
                campaign_count: row.get(9)?,
            })
        };

        let clients = if viewer.is_admin() {
            stmt.query_map([], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![viewer.email], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        Ok(clients)
    }
}

fn writer_to_string(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| Error::Export(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Export(format!("CSV is not UTF-8: {}", e)))
}
