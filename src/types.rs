use serde::{Deserialize, Serialize};

/// Names of the id, time and target columns of a panel table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelColumns {
    pub id_col: String,
    pub time_col: String,
    pub target_col: String,
}

impl Default for PanelColumns {
    fn default() -> Self {
        Self {
            id_col: "unique_id".to_string(),
            time_col: "ds".to_string(),
            target_col: "y".to_string(),
        }
    }
}

impl PanelColumns {
    pub fn new(id_col: &str, time_col: &str, target_col: &str) -> Self {
        Self {
            id_col: id_col.to_string(),
            time_col: time_col.to_string(),
            target_col: target_col.to_string(),
        }
    }
}

/// Group identifier of a single row.
///
/// Integer ids compare numerically, string and categorical ids lexically.
/// A single column never mixes the two variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Int(i64),
    Str(String),
}
