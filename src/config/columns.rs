use serde::{Deserialize, Serialize};

fn default_key_column() -> String {
    "min".to_string()
}

fn default_count_column() -> String {
    "request_count".to_string()
}

fn default_anomaly_column() -> String {
    "is_anomaly".to_string()
}

/// Maps the snapshot header names onto the three fields of a row.
///
/// The defaults match the columns written by the upstream minute-count
/// producer (`min,request_count,is_anomaly`). Header matching is exact after
/// trimming surrounding whitespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Column holding the bucket key.
    #[serde(default = "default_key_column")]
    pub key: String,

    /// Column holding the request count.
    #[serde(default = "default_count_column")]
    pub count: String,

    /// Column holding the anomaly flag. The column may be absent from a
    /// snapshot, in which case every row is treated as not anomalous.
    #[serde(default = "default_anomaly_column")]
    pub anomaly: String,
}

impl ColumnMapping {
    /// Creates a mapping from explicit column names.
    pub fn new(
        key: impl Into<String>,
        count: impl Into<String>,
        anomaly: impl Into<String>,
    ) -> Self {
        Self { key: key.into(), count: count.into(), anomaly: anomaly.into() }
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            key: default_key_column(),
            count: default_count_column(),
            anomaly: default_anomaly_column(),
        }
    }
}
