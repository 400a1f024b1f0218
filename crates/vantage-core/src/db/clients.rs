//! Client roster operations
//!
//! Every read and write is scoped to a [`Viewer`]: admins operate on the full
//! roster, owners only on clients whose `owner_email` matches their own.
//! Listings are returned in insertion order (`id ASC`) so downstream ranking
//! stays deterministic.

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Client, NewClient, UpdateClient, Viewer};

impl Database {
    /// Create a client, stamped with the viewer as its account manager
    pub fn create_client(&self, viewer: &Viewer, new: &NewClient) -> Result<Client> {
        new.validate()?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO clients (name, email, phone, company, membership, is_active, owner_email)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                new.name.trim(),
                new.email.trim(),
                new.phone,
                new.company,
                new.membership.as_str().to_lowercase(),
                new.is_active,
                viewer.email,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_client(viewer, id)?
            .ok_or_else(|| Error::NotFound(format!("Client {} not found after insert", id)))
    }

    /// List clients visible to the viewer, in insertion order
    pub fn list_clients(&self, viewer: &Viewer) -> Result<Vec<Client>> {
        let conn = self.conn()?;

        let mut stmt = if viewer.is_admin() {
            conn.prepare(
                "SELECT id, name, email, phone, company, membership, is_active, owner_email, created_at
                 FROM clients ORDER BY id ASC",
            )?
        } else {
            conn.prepare(
                "SELECT id, name, email, phone, company, membership, is_active, owner_email, created_at
                 FROM clients WHERE owner_email = ? ORDER BY id ASC",
            )?
        };

        let clients = if viewer.is_admin() {
            stmt.query_map([], |row| Self::row_to_client(row))?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![viewer.email], |row| Self::row_to_client(row))?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        Ok(clients)
    }

    /// Get a client by ID, if it exists and is visible to the viewer
    pub fn get_client(&self, viewer: &Viewer, id: i64) -> Result<Option<Client>> {
        let conn = self.conn()?;
        let client = conn
            .query_row(
                "SELECT id, name, email, phone, company, membership, is_active, owner_email, created_at
                 FROM clients WHERE id = ?",
                params![id],
                |row| Self::row_to_client(row),
            )
            .ok();

        Ok(client.filter(|c| Self::client_visible(viewer, c)))
    }

    /// Apply a field-level update to a visible client
    pub fn update_client(&self, viewer: &Viewer, id: i64, changes: &UpdateClient) -> Result<Client> {
        let existing = self
            .get_client(viewer, id)?
            .ok_or_else(|| Error::NotFound(format!("Client {} not found", id)))?;

        if let Some(name) = &changes.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("Client name is required".into()));
            }
        }
        if let Some(email) = &changes.email {
            if email.trim().is_empty() {
                return Err(Error::Validation("Client email is required".into()));
            }
        }

        let name = changes.name.clone().unwrap_or(existing.name);
        let email = changes.email.clone().unwrap_or(existing.email);
        let phone = changes.phone.clone().or(existing.phone);
        let company = changes.company.clone().or(existing.company);
        let membership = changes.membership.unwrap_or(existing.membership);
        let is_active = changes.is_active.unwrap_or(existing.is_active);

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE clients
            SET name = ?, email = ?, phone = ?, company = ?, membership = ?, is_active = ?
            WHERE id = ?
            "#,
            params![
                name.trim(),
                email.trim(),
                phone,
                company,
                membership.as_str().to_lowercase(),
                is_active,
                id,
            ],
        )?;
        drop(conn);

        self.get_client(viewer, id)?
            .ok_or_else(|| Error::NotFound(format!("Client {} not found after update", id)))
    }

    /// Delete a visible client and all of its campaigns
    pub fn delete_client(&self, viewer: &Viewer, id: i64) -> Result<()> {
        // Visibility check before any write
        self.get_client(viewer, id)?
            .ok_or_else(|| Error::NotFound(format!("Client {} not found", id)))?;

        let conn = self.conn()?;

        // Use explicit transaction for atomicity
        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| {
            conn.execute("DELETE FROM campaigns WHERE client_id = ?", params![id])?;
            conn.execute("DELETE FROM clients WHERE id = ?", params![id])?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])?;
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    /// Count clients visible to the viewer
    pub fn count_clients(&self, viewer: &Viewer) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = if viewer.is_admin() {
            conn.query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?
        } else {
            conn.query_row(
                "SELECT COUNT(*) FROM clients WHERE owner_email = ?",
                params![viewer.email],
                |row| row.get(0),
            )?
        };
        Ok(count)
    }

    fn client_visible(viewer: &Viewer, client: &Client) -> bool {
        viewer.is_admin() || client.owner_email.as_deref() == Some(viewer.email.as_str())
    }

    /// Helper to convert a row to Client
    /// Column order: id, name, email, phone, company, membership, is_active, owner_email, created_at
    pub(crate) fn row_to_client(row: &rusqlite::Row) -> rusqlite::Result<Client> {
        let membership_str: String = row.get(5)?;
        let is_active_int: i64 = row.get(6)?;
        let created_at_str: String = row.get(8)?;
        Ok(Client {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            company: row.get(4)?,
            membership: membership_str.parse().unwrap_or_default(),
            is_active: is_active_int != 0,
            owner_email: row.get(7)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
