//! Record Table
//!
//! A small in-memory CRUD table of people with a role and a status.
//!
//! Ids are assigned as `count + 1`, so deleting a record and adding another
//! can produce a duplicate id. Deleting an id removes every record carrying
//! it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "Active",
            RecordStatus::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status filter for listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(RecordStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: RecordStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Only(RecordStatus::Active)),
            "inactive" => Ok(StatusFilter::Only(RecordStatus::Inactive)),
            other => Err(RecordError::InvalidStatus(other.to_string())),
        }
    }
}

/// One row of the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub name: String,
    pub role: String,
    pub status: RecordStatus,
}

/// Record table errors
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record not found: {0}")]
    NotFound(u64),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl From<csv::Error> for RecordError {
    fn from(err: csv::Error) -> Self {
        RecordError::Export(err.to_string())
    }
}

/// In-memory record table
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    records: Vec<Record>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two sample rows the table starts with
    pub fn with_sample_data() -> Self {
        let mut table = Self::new();
        table.add("John Doe", "Engineer");
        table.add("Jane Smith", "Project Manager");
        table
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append an Active record with id `len + 1`
    pub fn add(&mut self, name: impl Into<String>, role: impl Into<String>) -> Record {
        let record = Record {
            id: self.records.len() as u64 + 1,
            name: name.into(),
            role: role.into(),
            status: RecordStatus::Active,
        };
        tracing::debug!(id = record.id, name = %record.name, "Record added");
        self.records.push(record.clone());
        record
    }

    /// First record with `id`
    pub fn get(&self, id: u64) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Change name and role of the first record with `id`; status is kept
    pub fn edit(
        &mut self,
        id: u64,
        name: impl Into<String>,
        role: impl Into<String>,
    ) -> Result<Record, RecordError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RecordError::NotFound(id))?;

        record.name = name.into();
        record.role = role.into();
        Ok(record.clone())
    }

    /// Remove every record with `id`; returns how many were removed
    pub fn delete(&mut self, id: u64) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = before - self.records.len();
        tracing::debug!(id, removed, "Records deleted");
        removed
    }

    pub fn filter(&self, filter: StatusFilter) -> Vec<Record> {
        self.records
            .iter()
            .filter(|r| filter.matches(r.status))
            .cloned()
            .collect()
    }

    /// CSV with header `ID,Name,Role,Status`
    pub fn to_csv(&self) -> Result<String, RecordError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["ID", "Name", "Role", "Status"])?;
        for record in &self.records {
            writer.write_record([
                record.id.to_string().as_str(),
                record.name.as_str(),
                record.role.as_str(),
                record.status.as_str(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| RecordError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| RecordError::Export(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data() {
        let table = RecordTable::with_sample_data();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().name, "John Doe");
        assert_eq!(table.get(2).unwrap().role, "Project Manager");
        assert!(table
            .records()
            .iter()
            .all(|r| r.status == RecordStatus::Active));
    }

    #[test]
    fn test_add_assigns_count_plus_one() {
        let mut table = RecordTable::with_sample_data();
        let record = table.add("Ada", "Analyst");
        assert_eq!(record.id, 3);
        assert_eq!(record.status, RecordStatus::Active);
    }

    #[test]
    fn test_delete_then_add_can_duplicate_ids() {
        let mut table = RecordTable::with_sample_data();
        assert_eq!(table.delete(1), 1);
        assert_eq!(table.len(), 1);

        // count is 1 again, so the new record reuses id 2
        let record = table.add("Ada", "Analyst");
        assert_eq!(record.id, 2);

        assert_eq!(table.delete(2), 2);
        assert!(table.is_empty());
        assert_eq!(table.delete(42), 0);
    }

    #[test]
    fn test_edit_only_name_and_role() {
        let mut table = RecordTable::with_sample_data();
        table.records[0].status = RecordStatus::Inactive;

        let record = table.edit(1, "Johnny", "Staff Engineer").unwrap();
        assert_eq!(record.name, "Johnny");
        assert_eq!(record.role, "Staff Engineer");
        assert_eq!(record.status, RecordStatus::Inactive);
        assert_eq!(table.get(2).unwrap().name, "Jane Smith");

        assert!(matches!(
            table.edit(9, "x", "y"),
            Err(RecordError::NotFound(9))
        ));
    }

    #[test]
    fn test_filter() {
        let mut table = RecordTable::with_sample_data();
        table.records[1].status = RecordStatus::Inactive;

        assert_eq!(table.filter(StatusFilter::All).len(), 2);
        let active = table.filter("Active".parse().unwrap());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "John Doe");
        assert_eq!(
            table.filter(StatusFilter::Only(RecordStatus::Inactive))[0].id,
            2
        );
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_csv_export() {
        let mut table = RecordTable::with_sample_data();
        table.add("Doe, Jr.", "Intern");

        let csv = table.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "ID,Name,Role,Status");
        assert_eq!(lines[1], "1,John Doe,Engineer,Active");
        assert_eq!(lines[2], "2,Jane Smith,Project Manager,Active");
        assert_eq!(lines[3], "3,\"Doe, Jr.\",Intern,Active");
    }
}
