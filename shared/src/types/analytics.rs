use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::catalog::{ValidationError, parse_day};

const MAX_PLATFORM_LEN: usize = 64;

/// Counts are stored as SQLite INTEGER, which is a signed 64-bit value.
pub const MAX_STREAM_COUNT: u64 = i64::MAX as u64;

/// One day of stream counts for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub day: NaiveDate,
    pub platform: String,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamRecordInput {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub release_id: Option<String>,
}

impl StreamRecordInput {
    pub fn validate(self) -> Result<StreamRecord, ValidationError> {
        let day = parse_day("day", &self.day)?;
        let platform = self.platform.trim().to_string();
        if platform.is_empty() {
            return Err(ValidationError::MissingField("platform"));
        }
        if platform.chars().count() > MAX_PLATFORM_LEN {
            return Err(ValidationError::TooLong {
                field: "platform",
                max: MAX_PLATFORM_LEN,
            });
        }
        if self.count > MAX_STREAM_COUNT {
            return Err(ValidationError::OutOfRange {
                field: "count",
                max: MAX_STREAM_COUNT,
            });
        }
        Ok(StreamRecord {
            day,
            platform,
            count: self.count,
            release_id: self
                .release_id
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
        })
    }
}

/// Accepts either one record or an array of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StreamBatch {
    Many(Vec<StreamRecordInput>),
    One(StreamRecordInput),
}

impl StreamBatch {
    pub fn into_vec(self) -> Vec<StreamRecordInput> {
        match self {
            StreamBatch::Many(v) => v,
            StreamBatch::One(r) => vec![r],
        }
    }
}

/// Filter for the analytics query; every bound is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub release_id: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<u64>,
    pub total: u64,
}

/// Chart-ready series: `data[i]` of every dataset lines up with `labels[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
    pub total: u64,
}

impl ChartSeries {
    /// Pivot raw records into one dataset per platform over the sorted set
    /// of days. Duplicate (day, platform) rows are summed and gaps are 0.
    pub fn from_records(records: &[StreamRecord]) -> Self {
        let days: BTreeSet<NaiveDate> = records.iter().map(|r| r.day).collect();
        let index: BTreeMap<NaiveDate, usize> =
            days.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut by_platform: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
        for r in records {
            let data = by_platform
                .entry(r.platform.as_str())
                .or_insert_with(|| vec![0; days.len()]);
            data[index[&r.day]] = data[index[&r.day]].saturating_add(r.count);
        }

        let datasets: Vec<ChartDataset> = by_platform
            .into_iter()
            .map(|(label, data)| ChartDataset {
                label: label.to_string(),
                total: data.iter().fold(0u64, |acc, n| acc.saturating_add(*n)),
                data,
            })
            .collect();

        let total = datasets
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.total));

        Self {
            labels: days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect(),
            datasets,
            total,
        }
    }
}
