use std::{collections::VecDeque, path::Path, rc::Rc};

use rand::{seq::SliceRandom, Rng};
use serde_json::Value;
use tracing::{info, warn};

use crate::config;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One normalized item of the source dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct DataItem {
    pub name: String,
    pub count: f64,
    /// The item exactly as it appeared in the source.
    pub payload: Value,
}

impl DataItem {
    /// Builds an item from an arbitrary JSON value. A missing or non-numeric
    /// `count` becomes 0 and a missing or non-string `name` becomes empty.
    pub fn normalize(key: &str, payload: Value) -> Self {
        let count = match payload.get("count") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0).max(0.0),
            Some(other) => {
                warn!(key, count = %other, "non-numeric count, using 0");
                0.0
            }
            None => 0.0,
        };
        let name = match payload.get("name") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                warn!(key, name = %other, "non-string name, using empty");
                String::new()
            }
            None => String::new(),
        };
        Self {
            name,
            count,
            payload,
        }
    }
}

/// One unit of input awaiting admission into the bubble pool.
#[derive(Clone, Debug)]
pub struct Occurrence {
    pub key: Rc<str>,
    pub item: Rc<DataItem>,
}

#[derive(Clone, Debug, Default)]
pub struct Dataset {
    items: Vec<(Rc<str>, Rc<DataItem>)>,
}

impl Dataset {
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Accepts an object of `key -> item`, or an array whose indices are the
    /// keys. Any other top level value gives an empty dataset.
    pub fn from_json_str(raw: &str) -> Result<Self, DataError> {
        let value: Value = serde_json::from_str(raw)?;
        let items: Vec<(Rc<str>, Rc<DataItem>)> = match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, item)| {
                    let normalized = DataItem::normalize(&key, item);
                    (Rc::from(key), Rc::new(normalized))
                })
                .collect(),
            Value::Array(list) => list
                .into_iter()
                .enumerate()
                .map(|(idx, item)| {
                    let key = idx.to_string();
                    let normalized = DataItem::normalize(&key, item);
                    (Rc::from(key), Rc::new(normalized))
                })
                .collect(),
            other => {
                warn!(kind = %kind_of(&other), "dataset is neither object nor array");
                Vec::new()
            }
        };
        info!(items = items.len(), "dataset loaded");
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&DataItem> {
        self.items
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, item)| &**item)
    }

    /// Expands counts into a shuffled backlog. The largest count becomes
    /// `OCCURRENCE_SCALE` entries and the rest scale in proportion, rounding up.
    pub fn occurrences(&self, rng: &mut impl Rng) -> VecDeque<Occurrence> {
        let max = self
            .items
            .iter()
            .map(|(_, item)| item.count)
            .fold(0.0, f64::max);
        if max <= 0.0 {
            return VecDeque::new();
        }

        let mut backlog = Vec::new();
        for (key, item) in &self.items {
            let copies = (item.count / max * config::OCCURRENCE_SCALE).ceil() as usize;
            backlog.extend((0..copies).map(|_| Occurrence {
                key: Rc::clone(key),
                item: Rc::clone(item),
            }));
        }
        backlog.shuffle(rng);
        info!(occurrences = backlog.len(), "occurrence backlog built");
        backlog.into()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
