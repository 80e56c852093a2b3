//! SQLite library database.
//!
//! Holds every record the launcher owns: installed versions, project files,
//! reusable launch arguments and scripts, and install locations.
//!
//! The database is stored in the platform data directory as `blendio.db`.

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};
use std::path::PathBuf;

use crate::models::{
    InstallLocation, InstalledVersion, LaunchArgument, ListFilter, ProjectFile, Script,
    now_timestamp,
};

/// Database manager for the launcher library
pub struct Database {
    conn: Connection,
}

const VERSION_COLUMNS: &str = "id, version, variant_type, download_url, is_default, \
     installation_directory_path, executable_file_path, created, modified, accessed";
const PROJECT_FILE_COLUMNS: &str =
    "id, file_path, file_name, last_used_version_id, created, modified, accessed";
const LAUNCH_ARGUMENT_COLUMNS: &str = "id, is_default, argument_string, \
     last_used_project_file_id, last_used_script_id, created, modified, accessed";
const SCRIPT_COLUMNS: &str = "id, script_file_path, created, modified, accessed";
const LOCATION_COLUMNS: &str = "id, repo_directory_path, is_default, created, modified, accessed";

fn version_from_row(row: &Row<'_>) -> rusqlite::Result<InstalledVersion> {
    Ok(InstalledVersion {
        id: row.get(0)?,
        version: row.get(1)?,
        variant_type: row.get(2)?,
        download_url: row.get(3)?,
        is_default: row.get::<_, i32>(4)? != 0,
        installation_directory_path: row.get(5)?,
        executable_file_path: row.get(6)?,
        created: row.get(7)?,
        modified: row.get(8)?,
        accessed: row.get(9)?,
    })
}

fn project_file_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectFile> {
    Ok(ProjectFile {
        id: row.get(0)?,
        file_path: row.get(1)?,
        file_name: row.get(2)?,
        last_used_version_id: row.get(3)?,
        created: row.get(4)?,
        modified: row.get(5)?,
        accessed: row.get(6)?,
    })
}

fn launch_argument_from_row(row: &Row<'_>) -> rusqlite::Result<LaunchArgument> {
    Ok(LaunchArgument {
        id: row.get(0)?,
        is_default: row.get::<_, i32>(1)? != 0,
        argument_string: row.get(2)?,
        last_used_project_file_id: row.get(3)?,
        last_used_script_id: row.get(4)?,
        created: row.get(5)?,
        modified: row.get(6)?,
        accessed: row.get(7)?,
    })
}

fn script_from_row(row: &Row<'_>) -> rusqlite::Result<Script> {
    Ok(Script {
        id: row.get(0)?,
        script_file_path: row.get(1)?,
        created: row.get(2)?,
        modified: row.get(3)?,
        accessed: row.get(4)?,
    })
}

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<InstallLocation> {
    Ok(InstallLocation {
        id: row.get(0)?,
        repo_directory_path: row.get(1)?,
        is_default: row.get::<_, i32>(2)? != 0,
        created: row.get(3)?,
        modified: row.get(4)?,
        accessed: row.get(5)?,
    })
}

impl Database {
    /// Get the database file path
    pub fn db_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "blendio", "Blendio")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("blendio.db"))
    }

    /// Open or create the database
    pub fn open() -> Result<Self> {
        let path = Self::db_path()?;
        let conn = Connection::open(&path)?;

        let db = Self { conn };
        db.init_schema()?;

        tracing::info!("Opened database at {:?}", path);
        Ok(db)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS installed_versions (
                id TEXT PRIMARY KEY,
                version TEXT NOT NULL,
                variant_type TEXT NOT NULL,
                download_url TEXT,
                is_default INTEGER NOT NULL DEFAULT 0,
                installation_directory_path TEXT NOT NULL,
                executable_file_path TEXT NOT NULL UNIQUE,
                created TEXT NOT NULL,
                modified TEXT NOT NULL,
                accessed TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS project_files (
                id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL UNIQUE,
                file_name TEXT NOT NULL,
                last_used_version_id TEXT,
                created TEXT NOT NULL,
                modified TEXT NOT NULL,
                accessed TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS launch_arguments (
                id TEXT PRIMARY KEY,
                is_default INTEGER NOT NULL DEFAULT 0,
                argument_string TEXT NOT NULL UNIQUE,
                last_used_project_file_id TEXT,
                last_used_script_id TEXT,
                created TEXT NOT NULL,
                modified TEXT NOT NULL,
                accessed TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS scripts (
                id TEXT PRIMARY KEY,
                script_file_path TEXT NOT NULL UNIQUE,
                created TEXT NOT NULL,
                modified TEXT NOT NULL,
                accessed TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS install_locations (
                id TEXT PRIMARY KEY,
                repo_directory_path TEXT NOT NULL UNIQUE,
                is_default INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL,
                modified TEXT NOT NULL,
                accessed TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Run a filtered SELECT. `id` wins over `path`; `limit` applies last.
    fn select<T>(
        &self,
        table: &str,
        columns: &str,
        path_column: &str,
        order_by: &str,
        filter: &ListFilter,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut sql = format!("SELECT {columns} FROM {table}");
        let mut args: Vec<&dyn ToSql> = Vec::new();

        if let Some(id) = &filter.id {
            sql.push_str(" WHERE id = ?1");
            args.push(id);
        } else if let Some(path) = &filter.path {
            sql.push_str(&format!(" WHERE {path_column} = ?1"));
            args.push(path);
        }
        sql.push_str(&format!(" ORDER BY {order_by}"));
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(args.as_slice(), map)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Mark exactly one row of `table` as default
    fn set_exclusive_default(&self, table: &str, id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            &format!("UPDATE {table} SET is_default = 1, modified = ?2 WHERE id = ?1"),
            params![id, now_timestamp()],
        )?;
        if changed == 0 {
            anyhow::bail!("No record with id {} in {}", id, table);
        }
        tx.execute(
            &format!("UPDATE {table} SET is_default = 0 WHERE id != ?1"),
            params![id],
        )?;
        tx.commit()?;
        Ok(())
    }

    // Installed versions

    pub fn list_versions(&self, filter: &ListFilter) -> Result<Vec<InstalledVersion>> {
        self.select(
            "installed_versions",
            VERSION_COLUMNS,
            "executable_file_path",
            "version DESC, variant_type",
            filter,
            version_from_row,
        )
    }

    pub fn get_version(&self, id: &str) -> Result<Option<InstalledVersion>> {
        Ok(self.list_versions(&ListFilter::by_id(id))?.into_iter().next())
    }

    pub fn insert_version(&self, version: &InstalledVersion) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO installed_versions ({VERSION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                version.id,
                version.version,
                version.variant_type,
                version.download_url,
                version.is_default as i32,
                version.installation_directory_path,
                version.executable_file_path,
                version.created,
                version.modified,
                version.accessed,
            ],
        )?;
        Ok(())
    }

    pub fn delete_version(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM installed_versions WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn set_default_version(&self, id: &str) -> Result<()> {
        self.set_exclusive_default("installed_versions", id)
    }

    pub fn touch_version(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE installed_versions SET accessed = ?2 WHERE id = ?1",
            params![id, now_timestamp()],
        )?;
        Ok(())
    }

    /// Make the first version default when none is
    pub fn ensure_default_version(&self) -> Result<()> {
        let has_default: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM installed_versions WHERE is_default = 1)",
            [],
            |row| row.get(0),
        )?;
        if has_default {
            return Ok(());
        }
        if let Some(first) = self.list_versions(&ListFilter::recent(1))?.into_iter().next() {
            self.set_default_version(&first.id)?;
        }
        Ok(())
    }

    // Project files

    pub fn list_project_files(&self, filter: &ListFilter) -> Result<Vec<ProjectFile>> {
        self.select(
            "project_files",
            PROJECT_FILE_COLUMNS,
            "file_path",
            "accessed DESC",
            filter,
            project_file_from_row,
        )
    }

    pub fn get_project_file(&self, id: &str) -> Result<Option<ProjectFile>> {
        Ok(self
            .list_project_files(&ListFilter::by_id(id))?
            .into_iter()
            .next())
    }

    pub fn insert_project_file(&self, file: &ProjectFile) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO project_files ({PROJECT_FILE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                file.id,
                file.file_path,
                file.file_name,
                file.last_used_version_id,
                file.created,
                file.modified,
                file.accessed,
            ],
        )?;
        Ok(())
    }

    pub fn delete_project_file(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM project_files WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Record that `id` was just opened with `version_id`
    pub fn touch_project_file(&self, id: &str, version_id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE project_files SET accessed = ?2, last_used_version_id = ?3 WHERE id = ?1",
            params![id, now_timestamp(), version_id],
        )?;
        Ok(())
    }

    // Launch arguments

    pub fn list_launch_arguments(&self, filter: &ListFilter) -> Result<Vec<LaunchArgument>> {
        self.select(
            "launch_arguments",
            LAUNCH_ARGUMENT_COLUMNS,
            "argument_string",
            "accessed DESC",
            filter,
            launch_argument_from_row,
        )
    }

    pub fn find_launch_argument(&self, text: &str) -> Result<Option<LaunchArgument>> {
        Ok(self
            .list_launch_arguments(&ListFilter::by_path(text))?
            .into_iter()
            .next())
    }

    pub fn insert_launch_argument(&self, argument: &LaunchArgument) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO launch_arguments ({LAUNCH_ARGUMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                argument.id,
                argument.is_default as i32,
                argument.argument_string,
                argument.last_used_project_file_id,
                argument.last_used_script_id,
                argument.created,
                argument.modified,
                argument.accessed,
            ],
        )?;
        Ok(())
    }

    /// Record a reuse of an existing argument string
    pub fn touch_launch_argument(
        &self,
        id: &str,
        project_file_id: Option<&str>,
        script_id: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE launch_arguments SET accessed = ?2,
                 last_used_project_file_id = COALESCE(?3, last_used_project_file_id),
                 last_used_script_id = COALESCE(?4, last_used_script_id)
             WHERE id = ?1",
            params![id, now_timestamp(), project_file_id, script_id],
        )?;
        Ok(())
    }

    // Scripts

    pub fn list_scripts(&self, filter: &ListFilter) -> Result<Vec<Script>> {
        self.select(
            "scripts",
            SCRIPT_COLUMNS,
            "script_file_path",
            "accessed DESC",
            filter,
            script_from_row,
        )
    }

    pub fn get_script(&self, id: &str) -> Result<Option<Script>> {
        Ok(self.list_scripts(&ListFilter::by_id(id))?.into_iter().next())
    }

    pub fn insert_script(&self, script: &Script) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO scripts ({SCRIPT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            params![
                script.id,
                script.script_file_path,
                script.created,
                script.modified,
                script.accessed,
            ],
        )?;
        Ok(())
    }

    pub fn touch_script(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE scripts SET accessed = ?2 WHERE id = ?1",
            params![id, now_timestamp()],
        )?;
        Ok(())
    }

    // Install locations

    pub fn list_locations(&self, filter: &ListFilter) -> Result<Vec<InstallLocation>> {
        self.select(
            "install_locations",
            LOCATION_COLUMNS,
            "repo_directory_path",
            "created",
            filter,
            location_from_row,
        )
    }

    pub fn insert_location(&self, location: &InstallLocation) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO install_locations ({LOCATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                location.id,
                location.repo_directory_path,
                location.is_default as i32,
                location.created,
                location.modified,
                location.accessed,
            ],
        )?;
        Ok(())
    }

    pub fn set_default_location(&self, id: &str) -> Result<()> {
        self.set_exclusive_default("install_locations", id)
    }

    pub fn delete_location(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM install_locations WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn default_location(&self) -> Result<Option<InstallLocation>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {LOCATION_COLUMNS} FROM install_locations WHERE is_default = 1"),
                [],
                location_from_row,
            )
            .optional()?)
    }
}
