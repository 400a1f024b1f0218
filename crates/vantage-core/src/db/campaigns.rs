//! Campaign operations
//!
//! Campaigns are shared workspace data: listings are not viewer-filtered
//! (client visibility is enforced where clients themselves are read). Lists
//! come back newest-first (`id DESC`) to match the management UI ordering.

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Campaign, CampaignWithClient, NewCampaign, UpdateCampaign};

impl Database {
    /// Create a campaign attached to an existing client
    pub fn create_campaign(&self, new: &NewCampaign) -> Result<Campaign> {
        new.validate()?;
        self.ensure_client_exists(new.client_id)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO campaigns (client_id, name, platform, budget, revenue, status, start_date, end_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                new.client_id,
                new.name.trim(),
                new.platform,
                new.budget,
                new.revenue,
                new.status.as_str().to_lowercase(),
                new.start_date.to_string(),
                new.end_date.map(|d| d.to_string()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_campaign(id)?
            .ok_or_else(|| Error::NotFound(format!("Campaign {} not found after insert", id)))
    }

    /// Insert an imported campaign, skipping duplicates based on import_hash
    ///
    /// Returns `None` when a row with the same hash already exists.
    pub fn insert_imported_campaign(
        &self,
        new: &NewCampaign,
        import_hash: &str,
    ) -> Result<Option<i64>> {
        new.validate()?;
        self.ensure_client_exists(new.client_id)?;

        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM campaigns WHERE import_hash = ?",
                params![import_hash],
                |row| row.get(0),
            )
            .ok();
        if existing.is_some() {
            return Ok(None);
        }

        conn.execute(
            r#"
            INSERT INTO campaigns (client_id, name, platform, budget, revenue, status, start_date, end_date, import_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                new.client_id,
                new.name.trim(),
                new.platform,
                new.budget,
                new.revenue,
                new.status.as_str().to_lowercase(),
                new.start_date.to_string(),
                new.end_date.map(|d| d.to_string()),
                import_hash,
            ],
        )?;

        Ok(Some(conn.last_insert_rowid()))
    }

    /// List all campaigns with their client's name, newest first
    pub fn list_campaigns(&self) -> Result<Vec<CampaignWithClient>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT ca.id, ca.name, ca.platform, ca.budget, ca.revenue, ca.status,
                   ca.start_date, ca.end_date, ca.client_id, cl.name, ca.created_at
            FROM campaigns ca
            JOIN clients cl ON cl.id = ca.client_id
            ORDER BY ca.id DESC
            "#,
        )?;

        let campaigns = stmt
            .query_map([], |row| Self::row_to_campaign_with_client(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(campaigns)
    }

    /// List one client's campaigns, newest first
    pub fn list_campaigns_for_client(&self, client_id: i64) -> Result<Vec<Campaign>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, platform, budget, revenue, status, start_date, end_date, client_id, created_at
             FROM campaigns WHERE client_id = ? ORDER BY id DESC",
        )?;

        let campaigns = stmt
            .query_map(params![client_id], |row| Self::row_to_campaign(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(campaigns)
    }

    /// List every campaign row, newest first (dashboard snapshot input)
    pub fn list_all_campaigns(&self) -> Result<Vec<Campaign>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, platform, budget, revenue, status, start_date, end_date, client_id, created_at
             FROM campaigns ORDER BY id DESC",
        )?;

        let campaigns = stmt
            .query_map([], |row| Self::row_to_campaign(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(campaigns)
    }

    /// Get a single campaign by ID
    pub fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        let conn = self.conn()?;
        let campaign = conn
            .query_row(
                "SELECT id, name, platform, budget, revenue, status, start_date, end_date, client_id, created_at
                 FROM campaigns WHERE id = ?",
                params![id],
                |row| Self::row_to_campaign(row),
            )
            .ok();

        Ok(campaign)
    }

    /// Replace a campaign's fields (full edit-and-resubmit cycle)
    pub fn update_campaign(&self, id: i64, changes: &UpdateCampaign) -> Result<Campaign> {
        changes.validate()?;
        self.get_campaign(id)?
            .ok_or_else(|| Error::NotFound(format!("Campaign {} not found", id)))?;
        self.ensure_client_exists(changes.client_id)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE campaigns
            SET client_id = ?, name = ?, platform = ?, budget = ?, revenue = ?,
                status = ?, start_date = ?, end_date = ?
            WHERE id = ?
            "#,
            params![
                changes.client_id,
                changes.name.trim(),
                changes.platform,
                changes.budget,
                changes.revenue,
                changes.status.as_str().to_lowercase(),
                changes.start_date.to_string(),
                changes.end_date.map(|d| d.to_string()),
                id,
            ],
        )?;
        drop(conn);

        self.get_campaign(id)?
            .ok_or_else(|| Error::NotFound(format!("Campaign {} not found after update", id)))
    }

    /// Mark a campaign completed and record its final revenue
    pub fn complete_campaign(&self, id: i64, revenue: f64) -> Result<Campaign> {
        if !revenue.is_finite() {
            return Err(Error::Validation("Final revenue must be a number".into()));
        }
        self.get_campaign(id)?
            .ok_or_else(|| Error::NotFound(format!("Campaign {} not found", id)))?;

        let conn = self.conn()?;
        conn.execute(
            "UPDATE campaigns SET status = 'completed', revenue = ? WHERE id = ?",
            params![revenue, id],
        )?;
        drop(conn);

        self.get_campaign(id)?
            .ok_or_else(|| Error::NotFound(format!("Campaign {} not found after update", id)))
    }

    /// Delete a campaign
    pub fn delete_campaign(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM campaigns WHERE id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Campaign {} not found", id)));
        }
        Ok(())
    }

    /// Count all campaigns
    pub fn count_campaigns(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM campaigns", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Pool connections don't re-run the foreign_keys pragma, so referential
    /// integrity for inserts is checked here explicitly.
    fn ensure_client_exists(&self, client_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM clients WHERE id = ?",
                params![client_id],
                |row| row.get(0),
            )
            .ok();
        match exists {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!("Client {} not found", client_id))),
        }
    }

    /// Helper to convert a row to Campaign
    /// Column order: id, name, platform, budget, revenue, status, start_date,
    ///               end_date, client_id, created_at
    pub(crate) fn row_to_campaign(row: &rusqlite::Row) -> rusqlite::Result<Campaign> {
        let status_str: String = row.get(5)?;
        let start_date_str: String = row.get(6)?;
        let end_date_str: Option<String> = row.get(7)?;
        let created_at_str: String = row.get(9)?;
        Ok(Campaign {
            id: row.get(0)?,
            name: row.get(1)?,
            platform: row.get(2)?,
            budget: row.get(3)?,
            revenue: row.get(4)?,
            status: status_str.parse().unwrap_or_default(),
            start_date: chrono::NaiveDate::parse_from_str(&start_date_str, "%Y-%m-%d")
                .unwrap_or_default(),
            end_date: end_date_str
                .and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            client_id: row.get(8)?,
            created_at: parse_datetime(&created_at_str),
        })
    }

    /// Same as `row_to_campaign` with the joined client name at index 9
    /// (created_at shifts to index 10)
    fn row_to_campaign_with_client(row: &rusqlite::Row) -> rusqlite::Result<CampaignWithClient> {
        let status_str: String = row.get(5)?;
        let start_date_str: String = row.get(6)?;
        let end_date_str: Option<String> = row.get(7)?;
        let created_at_str: String = row.get(10)?;
        Ok(CampaignWithClient {
            id: row.get(0)?,
            name: row.get(1)?,
            platform: row.get(2)?,
            budget: row.get(3)?,
            revenue: row.get(4)?,
            status: status_str.parse().unwrap_or_default(),
            start_date: chrono::NaiveDate::parse_from_str(&start_date_str, "%Y-%m-%d")
                .unwrap_or_default(),
            end_date: end_date_str
                .and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            client_id: row.get(8)?,
            client_name: row.get(9)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
