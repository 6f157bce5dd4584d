use super::{
    PersistenceError, PersistenceResult, TaskRecord, records_from_schedule, schedule_from_records,
};
use crate::{Schedule, TaskFrequency, TaskKind, Timeframe};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// One entry of the JSON interchange format: times are in hours, dates are
/// `YYYYMMDD`, and `Type` holds the category.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JsonTaskEntry {
    name: String,
    #[serde(rename = "Type")]
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    start_time: f64,
    duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frequency: Option<u32>,
}

impl From<&TaskRecord> for JsonTaskEntry {
    fn from(record: &TaskRecord) -> Self {
        let recurring = record.kind == TaskKind::Recurring;
        Self {
            name: record.name.clone(),
            category: record.category.clone(),
            date: (!recurring).then(|| record.start_date.clone()),
            start_date: recurring.then(|| record.start_date.clone()),
            start_time: f64::from(record.start_minute) / 60.0,
            duration: f64::from(record.duration_minute) / 60.0,
            end_date: record.end_date.clone(),
            frequency: record.frequency.map(TaskFrequency::value),
        }
    }
}

impl JsonTaskEntry {
    fn kind(&self) -> TaskKind {
        if self.category == TaskKind::Cancellation.as_str() {
            TaskKind::Cancellation
        } else if self.end_date.is_none() {
            TaskKind::Transient
        } else {
            TaskKind::Recurring
        }
    }

    fn into_record(self) -> PersistenceResult<TaskRecord> {
        let kind = self.kind();
        let timeframe = Timeframe::from_hours(self.start_time, self.duration)?;
        let start_date = match kind {
            TaskKind::Recurring => self.start_date,
            _ => self.date,
        }
        .ok_or_else(|| {
            PersistenceError::InvalidData(format!("task '{}' has no date", self.name))
        })?;
        Ok(TaskRecord {
            name: self.name,
            category: self.category,
            kind,
            start_date,
            end_date: self.end_date,
            start_minute: timeframe.start(),
            duration_minute: timeframe.duration(),
            frequency: self.frequency.map(TaskFrequency::from_value),
        })
    }
}

pub fn save_schedule_to_json<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> PersistenceResult<()> {
    let entries: Vec<JsonTaskEntry> = records_from_schedule(schedule)
        .iter()
        .map(JsonTaskEntry::from)
        .collect();
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &entries)?;
    info!(path = %path.as_ref().display(), tasks = entries.len(), "schedule saved as json");
    Ok(())
}

pub fn load_schedule_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let file = File::open(path.as_ref())?;
    let entries: Vec<JsonTaskEntry> = serde_json::from_reader(file)?;
    let records = entries
        .into_iter()
        .map(JsonTaskEntry::into_record)
        .collect::<PersistenceResult<Vec<_>>>()?;
    let schedule = schedule_from_records(records)?;
    info!(path = %path.as_ref().display(), tasks = schedule.len(), "schedule loaded from json");
    Ok(schedule)
}

pub fn save_schedule_to_csv<P: AsRef<Path>>(schedule: &Schedule, path: P) -> PersistenceResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    let records = records_from_schedule(schedule);
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(path = %path.as_ref().display(), tasks = records.len(), "schedule saved as csv");
    Ok(())
}

pub fn load_schedule_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for record in reader.deserialize::<TaskRecord>() {
        records.push(record?);
    }
    let schedule = schedule_from_records(records)?;
    info!(path = %path.as_ref().display(), tasks = schedule.len(), "schedule loaded from csv");
    Ok(schedule)
}
