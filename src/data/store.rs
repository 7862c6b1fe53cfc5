use std::fmt;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use itertools::Itertools;
use polars::prelude::*;
use thiserror::Error;

/// Trailing currency marker some exporters append to the stake column.
pub const STAKE_SUFFIX: char = 'τ';

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("The file {0} was not found.")]
    Missing(String),
    #[error("failed to read metrics log: {0}")]
    Table(#[from] PolarsError),
    #[error("row {row}: unparseable timestamp {value:?}")]
    Timestamp { row: usize, value: String },
}

/// The five observed quantities tracked per hotkey.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Stake,
    Trust,
    Consensus,
    Incentive,
    Emission,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Stake,
        Metric::Trust,
        Metric::Consensus,
        Metric::Incentive,
        Metric::Emission,
    ];

    /// Column name in the metrics log.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Stake => "stake",
            Metric::Trust => "trust",
            Metric::Consensus => "consensus",
            Metric::Incentive => "incentive",
            Metric::Emission => "emission",
        }
    }

    /// Capitalized form used in menus and chart titles.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Stake => "Stake",
            Metric::Trust => "Trust",
            Metric::Consensus => "Consensus",
            Metric::Incentive => "Incentive",
            Metric::Emission => "Emission",
        }
    }

    pub fn value(self, record: &MetricRecord) -> f64 {
        match self {
            Metric::Stake => record.stake,
            Metric::Trust => record.trust,
            Metric::Consensus => record.consensus,
            Metric::Incentive => record.incentive,
            Metric::Emission => record.emission,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One normalized row of the metrics log.
#[derive(Clone, Debug)]
pub struct MetricRecord {
    pub timestamp: NaiveDateTime,
    pub hotkey: String,
    pub stake: f64,
    pub trust: f64,
    pub consensus: f64,
    pub incentive: f64,
    pub emission: f64,
}

/// One metric of one hotkey over time, timestamps ascending.
#[derive(Clone, Debug)]
pub struct MetricSeries {
    pub hotkey: String,
    pub metric: Metric,
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

impl MetricSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// In-memory copy of the metrics log, loaded once at startup and read-only
/// for the rest of the process.
#[derive(Debug)]
pub struct DataStore {
    records: Vec<MetricRecord>,
}

impl DataStore {
    /// Load and normalize the metrics log. Callers check existence first so
    /// the two startup files get distinct messages; a vanished file still
    /// maps to `StoreError::Missing`.
    pub fn load(path: &Path) -> Result<DataStore, StoreError> {
        if !path.exists() {
            return Err(StoreError::Missing(path.display().to_string()));
        }
        let df = CsvReader::from_path(path)?.has_header(true).finish()?;

        let timestamps = df.column("timestamp")?.cast(&DataType::Utf8)?;
        let timestamps = timestamps.utf8()?;
        let hotkeys = df.column("hotkey")?.cast(&DataType::Utf8)?;
        let hotkeys = hotkeys.utf8()?;
        let stake = stake_column(&df)?;
        let trust = float_column(&df, "trust")?;
        let consensus = float_column(&df, "consensus")?;
        let incentive = float_column(&df, "incentive")?;
        let emission = float_column(&df, "emission")?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let raw = timestamps.get(i).unwrap_or("");
            let timestamp = parse_timestamp(raw).ok_or_else(|| StoreError::Timestamp {
                // 1-based, counting the header line
                row: i + 2,
                value: raw.to_string(),
            })?;
            records.push(MetricRecord {
                timestamp,
                hotkey: hotkeys.get(i).unwrap_or("").to_string(),
                stake: stake[i],
                trust: trust[i],
                consensus: consensus[i],
                incentive: incentive[i],
                emission: emission[i],
            });
        }
        Ok(DataStore { records })
    }

    pub fn from_records(records: Vec<MetricRecord>) -> DataStore {
        DataStore { records }
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unique hotkeys in encounter order.
    pub fn distinct_hotkeys(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.hotkey.clone())
            .unique()
            .collect()
    }

    /// All rows for one hotkey, timestamp ascending.
    pub fn records_for(&self, hotkey: &str) -> Vec<&MetricRecord> {
        let mut rows: Vec<&MetricRecord> = self
            .records
            .iter()
            .filter(|r| r.hotkey == hotkey)
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        rows
    }

    pub fn series(&self, hotkey: &str, metric: Metric) -> MetricSeries {
        let rows = self.records_for(hotkey);
        MetricSeries {
            hotkey: hotkey.to_string(),
            metric,
            timestamps: rows.iter().map(|r| r.timestamp).collect(),
            values: rows.iter().map(|r| metric.value(r)).collect(),
        }
    }
}

/// Strip the trailing currency marker and parse; unparsable values become
/// NaN like any other malformed numeric cell.
pub fn normalize_stake(raw: &str) -> f64 {
    raw.trim()
        .trim_end_matches(STAKE_SUFFIX)
        .trim_end()
        .parse()
        .unwrap_or(f64::NAN)
}

fn stake_column(df: &DataFrame) -> Result<Vec<f64>, StoreError> {
    let series = df.column("stake")?;
    match series.dtype() {
        // Suffixed stake values read as text
        DataType::Utf8 => Ok(series
            .utf8()?
            .into_iter()
            .map(|v| normalize_stake(v.unwrap_or("")))
            .collect()),
        _ => float_column(df, "stake"),
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, StoreError> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Accepts RFC 3339 plus the common date/datetime spellings seen in exports.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_log() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,hotkey,stake,trust,consensus,incentive,emission").unwrap();
        writeln!(file, "2024-05-01 10:00:00,H2,50.0τ,0.4,0.3,0.2,0.05").unwrap();
        writeln!(file, "2024-05-01 10:00:00,H1,123.45τ,0.9,0.8,0.7,0.1").unwrap();
        writeln!(file, "2024-05-01 11:00:00,H1,124.0τ,0.95,0.81,0.71,0.11").unwrap();
        writeln!(file, "2024-05-01 11:00:00,H2,51.5τ,0.41,0.31,0.21,0.06").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn stake_suffix_is_stripped() {
        assert_eq!(normalize_stake("123.45τ"), 123.45);
        assert_eq!(normalize_stake(" 7τ "), 7.0);
        assert_eq!(normalize_stake("9.5"), 9.5);
        assert!(normalize_stake("not a number").is_nan());
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2024-05-01 10:00:00").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00+00:00").is_some());
        assert!(parse_timestamp("2024-05-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn load_normalizes_stake_and_timestamps() {
        let file = sample_log();
        let store = DataStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 4);
        let first = &store.records()[1];
        assert_eq!(first.hotkey, "H1");
        assert_eq!(first.stake, 123.45);
        assert_eq!(first.trust, 0.9);
    }

    #[test]
    fn missing_log_is_an_error() {
        let err = DataStore::load(Path::new("no/such/hotkeys.log")).unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));
    }

    #[test]
    fn distinct_hotkeys_keep_encounter_order() {
        let file = sample_log();
        let store = DataStore::load(file.path()).unwrap();
        assert_eq!(store.distinct_hotkeys(), vec!["H2", "H1"]);
    }

    #[test]
    fn records_for_sorts_by_timestamp() {
        let file = sample_log();
        let store = DataStore::load(file.path()).unwrap();
        let rows = store.records_for("H1");
        assert_eq!(rows.len(), 2);
        assert!(rows[0].timestamp < rows[1].timestamp);
    }

    #[test]
    fn series_carries_metric_values_in_time_order() {
        let file = sample_log();
        let store = DataStore::load(file.path()).unwrap();
        let series = store.series("H1", Metric::Trust);
        assert_eq!(series.len(), 2);
        assert_eq!(series.values, vec![0.9, 0.95]);
        assert!(series.timestamps[0] < series.timestamps[1]);
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let file = sample_log();
        let a = DataStore::load(file.path()).unwrap();
        let b = DataStore::load(file.path()).unwrap();
        assert_eq!(a.distinct_hotkeys(), b.distinct_hotkeys());
        for hotkey in a.distinct_hotkeys() {
            let sa = a.series(&hotkey, Metric::Emission);
            let sb = b.series(&hotkey, Metric::Emission);
            assert_eq!(sa.timestamps, sb.timestamps);
            assert_eq!(sa.values, sb.values);
        }
    }
}
