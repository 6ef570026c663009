//! SQLite catalog implementation.

use crate::{Error, Material, MaterialId, MaterialSummary, Member, Result};
use policy::Rank;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use tracing::debug;

const MATERIAL_COLUMNS: &str =
    "id, title, kind, required_rank, url, description, created_at, updated_at";

/// SQLite-backed catalog of training materials and members.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open or create a catalog at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let catalog = Self { conn };
        catalog.init_schema()?;
        Ok(catalog)
    }

    /// Create an in-memory catalog (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let catalog = Self { conn };
        catalog.init_schema()?;
        Ok(catalog)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS materials (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                kind TEXT NOT NULL,
                required_rank TEXT NOT NULL,
                url TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_materials_created
                ON materials(created_at);
            CREATE TABLE IF NOT EXISTS members (
                username TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                rank TEXT
            );
            "#,
        )?;
        Ok(())
    }

    /// Add a new material.
    pub fn insert_material(&self, material: &Material) -> Result<()> {
        self.conn.execute(
            "INSERT INTO materials (id, title, kind, required_rank, url, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                material.id.as_str(),
                material.title,
                material.kind.as_str(),
                material.required_rank.name(),
                material.url,
                material.description,
                material.created_at.to_rfc3339(),
                material.updated_at.to_rfc3339(),
            ],
        )?;
        debug!(id = %material.id, rank = %material.required_rank, "material inserted");
        Ok(())
    }

    /// Replace an existing material's fields.
    pub fn update_material(&self, material: &Material) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE materials
             SET title = ?2, kind = ?3, required_rank = ?4, url = ?5, description = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                material.id.as_str(),
                material.title,
                material.kind.as_str(),
                material.required_rank.name(),
                material.url,
                material.description,
                material.updated_at.to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("material {}", material.id)));
        }
        debug!(id = %material.id, "material updated");
        Ok(())
    }

    /// Remove a material.
    pub fn delete_material(&self, id: &MaterialId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM materials WHERE id = ?1", [id.as_str()])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("material {id}")));
        }
        debug!(%id, "material deleted");
        Ok(())
    }

    /// Load one material with its locator.
    pub fn get_material(&self, id: &MaterialId) -> Result<Material> {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, [id.as_str()], MaterialRow::from_row)
            .optional()?;

        match row {
            Some(row) => row.into_material(),
            None => Err(Error::NotFound(format!("material {id}"))),
        }
    }

    /// List materials in the order they were added.
    ///
    /// `search` filters by a case-insensitive substring of the title.
    pub fn list_materials(&self, search: Option<&str>) -> Result<Vec<MaterialSummary>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let sql = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials
             WHERE ?1 IS NULL OR instr(lower(title), lower(?1)) > 0
             ORDER BY created_at, rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([search], MaterialRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|row| row.into_material().map(|m| m.summary()))
            .collect()
    }

    /// Insert or replace a member.
    pub fn upsert_member(&self, member: &Member) -> Result<()> {
        self.conn.execute(
            "INSERT INTO members (username, display_name, rank) VALUES (?1, ?2, ?3)
             ON CONFLICT(username) DO UPDATE SET display_name = excluded.display_name, rank = excluded.rank",
            params![
                member.username,
                member.display_name,
                member.rank.map(Rank::name),
            ],
        )?;
        Ok(())
    }

    /// Load a member by username.
    pub fn get_member(&self, username: &str) -> Result<Member> {
        self.conn
            .query_row(
                "SELECT username, display_name, rank FROM members WHERE username = ?1",
                [username],
                member_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("member {username}")))
    }

    /// List all members by username.
    pub fn list_members(&self) -> Result<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username, display_name, rank FROM members ORDER BY username")?;
        let members = stmt
            .query_map([], member_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members)
    }
}

struct MaterialRow {
    id: String,
    title: String,
    kind: String,
    required_rank: String,
    url: String,
    description: Option<String>,
    created_at: String,
    updated_at: String,
}

impl MaterialRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            kind: row.get(2)?,
            required_rank: row.get(3)?,
            url: row.get(4)?,
            description: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_material(self) -> Result<Material> {
        let parse_time = |field: &str, value: &str| {
            value
                .parse()
                .map_err(|e| Error::InvalidRecord(format!("material {} {field}: {e}", self.id)))
        };

        Ok(Material {
            kind: self.kind.parse()?,
            required_rank: stored_rank(&self.required_rank),
            created_at: parse_time("created_at", &self.created_at)?,
            updated_at: parse_time("updated_at", &self.updated_at)?,
            id: MaterialId(self.id),
            title: self.title,
            url: self.url,
            description: self.description,
        })
    }
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    let rank: Option<String> = row.get(2)?;
    Ok(Member {
        username: row.get(0)?,
        display_name: row.get(1)?,
        rank: rank.as_deref().map(stored_rank),
    })
}

/// Read a stored rank name, normalizing names that are no longer in the table.
fn stored_rank(name: &str) -> Rank {
    let rank = Rank::resolve(Some(name));
    if rank == Rank::LOWEST && name != Rank::LOWEST.name() {
        debug!(name, "unrecognized stored rank, treating as lowest");
    }
    rank
}
