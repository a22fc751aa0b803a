//! Report storage: in-memory maps with optional JSON-file persistence.
//!
//! Reports are addressable by internal id and by the unpredictable public
//! id handed to customers. Expiry is enforced on read: an expired report is
//! invisible to callers before it is physically purged. Disk writes are
//! atomic (tmp + rename) to prevent corruption if the process dies
//! mid-flush.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use log::debug;

use crate::core::report::Report;

pub struct ReportStore {
    dir: Option<PathBuf>,
    reports: HashMap<String, Report>,
    public_index: HashMap<String, String>,
}

impl ReportStore {
    /// Volatile store, nothing touches disk.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            reports: HashMap::new(),
            public_index: HashMap::new(),
        }
    }

    /// Disk-backed store; existing reports in `dir` are loaded eagerly.
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).with_context(|| format!("cannot create {}", dir.display()))?;

        let mut store = Self {
            dir: Some(dir.clone()),
            reports: HashMap::new(),
            public_index: HashMap::new(),
        };

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .ok()
                .and_then(|data| serde_json::from_str::<Report>(&data).ok())
            {
                Some(report) => store.index(report),
                None => debug!("skipping unreadable report file {}", path.display()),
            }
        }

        Ok(store)
    }

    /// Stores a report and returns its internal id.
    pub fn store_report(&mut self, report: Report) -> Result<String> {
        let id = report.id.clone();
        self.persist(&report)?;
        self.index(report);
        Ok(id)
    }

    /// Fetches by internal id. Expired reports read as absent.
    pub fn get_report(&self, id: &str) -> Option<&Report> {
        self.reports.get(id).filter(|r| !is_expired(r))
    }

    /// Fetches by the external-facing public id.
    pub fn get_by_public_id(&self, public_id: &str) -> Option<&Report> {
        let id = self.public_index.get(public_id)?;
        self.get_report(id)
    }

    /// Physically removes expired reports from memory and disk. Returns
    /// how many were purged.
    pub fn purge_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .reports
            .values()
            .filter(|r| is_expired(r))
            .map(|r| r.id.clone())
            .collect();

        for id in &expired {
            if let Some(report) = self.reports.remove(id) {
                self.public_index.remove(&report.public_id);
                if let Some(path) = self.report_path(id) {
                    let _ = fs::remove_file(path);
                }
            }
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    fn index(&mut self, report: Report) {
        self.public_index.insert(report.public_id.clone(), report.id.clone());
        self.reports.insert(report.id.clone(), report);
    }

    /// Atomic write: serialize to .tmp, then rename over the real file.
    fn persist(&self, report: &Report) -> Result<()> {
        let Some(path) = self.report_path(&report.id) else {
            return Ok(());
        };
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn report_path(&self, id: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{}.json", id)))
    }
}

fn is_expired(report: &Report) -> bool {
    matches!(report.expires_at, Some(at) if at <= Utc::now())
}
