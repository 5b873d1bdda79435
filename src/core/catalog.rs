// Atom kinds, molecule recipes, and the read-only catalog fixed at startup.
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::inventory::Levels;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AtomKind {
    Carbon,
    Hydrogen,
    Oxygen,
}

impl AtomKind {
    pub const ALL: [AtomKind; 3] = [AtomKind::Carbon, AtomKind::Hydrogen, AtomKind::Oxygen];

    /// Command keyword, as it appears on the wire.
    pub fn keyword(self) -> &'static str {
        match self {
            AtomKind::Carbon => "CARBON",
            AtomKind::Hydrogen => "HYDROGEN",
            AtomKind::Oxygen => "OXYGEN",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "CARBON" => Some(AtomKind::Carbon),
            "HYDROGEN" => Some(AtomKind::Hydrogen),
            "OXYGEN" => Some(AtomKind::Oxygen),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AtomKind::Carbon => "carbon",
            AtomKind::Hydrogen => "hydrogen",
            AtomKind::Oxygen => "oxygen",
        }
    }
}

impl fmt::Display for AtomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-unit atom requirements of one molecule.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Recipe {
    pub carbon: u64,
    pub hydrogen: u64,
    pub oxygen: u64,
}

impl Recipe {
    pub const fn new(carbon: u64, hydrogen: u64, oxygen: u64) -> Self {
        Self {
            carbon,
            hydrogen,
            oxygen,
        }
    }

    pub fn amount(&self, kind: AtomKind) -> u64 {
        match kind {
            AtomKind::Carbon => self.carbon,
            AtomKind::Hydrogen => self.hydrogen,
            AtomKind::Oxygen => self.oxygen,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.carbon == 0 && self.hydrogen == 0 && self.oxygen == 0
    }

    /// Total requirement for `count` units; `None` when the multiplication
    /// overflows u64.
    pub fn requirement(&self, count: u64) -> Option<Levels> {
        Some(Levels {
            carbon: self.carbon.checked_mul(count)?,
            hydrogen: self.hydrogen.checked_mul(count)?,
            oxygen: self.oxygen.checked_mul(count)?,
        })
    }
}

/// One entry of an operator-supplied recipes file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RecipeRecord {
    pub name: String,
    #[serde(default)]
    pub carbon: u64,
    #[serde(default)]
    pub hydrogen: u64,
    #[serde(default)]
    pub oxygen: u64,
}

const BUILTIN: &[(&str, Recipe)] = &[
    ("WATER", Recipe::new(0, 2, 1)),
    ("CARBON DIOXIDE", Recipe::new(1, 0, 2)),
    ("GLUCOSE", Recipe::new(6, 12, 6)),
    ("ALCOHOL", Recipe::new(2, 6, 1)),
    ("SOFT DRINK", Recipe::new(7, 14, 9)),
    ("VODKA", Recipe::new(8, 20, 8)),
    ("CHAMPAGNE", Recipe::new(3, 8, 4)),
];

/// Name-keyed recipe table. Read-only for the process lifetime; lookups are
/// case-sensitive exact matches, names may contain embedded spaces.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: BTreeMap<String, Recipe>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(name, recipe)| (name.to_string(), *recipe))
            .collect();
        Self { entries }
    }

    pub fn from_records(records: Vec<RecipeRecord>) -> Result<Self, Error> {
        if records.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("recipe catalog must contain at least one molecule"));
        }
        let mut entries = BTreeMap::new();
        for record in records {
            if record.name.trim().is_empty() {
                return Err(
                    Error::new(ErrorKind::Usage).with_message("recipe name must not be empty")
                );
            }
            let recipe = Recipe::new(record.carbon, record.hydrogen, record.oxygen);
            if recipe.is_empty() {
                return Err(Error::new(ErrorKind::Usage).with_message(format!(
                    "recipe {:?} requires no atoms at all",
                    record.name
                )));
            }
            if entries.insert(record.name.clone(), recipe).is_some() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("duplicate recipe name {:?}", record.name)));
            }
        }
        Ok(Self { entries })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read recipes file {}", path.display()))
                .with_source(err)
        })?;
        let records: Vec<RecipeRecord> = serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid recipes file {}", path.display()))
                .with_hint("Expected a JSON array of {name, carbon, hydrogen, oxygen} records.")
                .with_source(err)
        })?;
        Self::from_records(records)
    }

    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.entries.get(name)
    }

    /// Entries in stable (lexicographic) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Recipe)> {
        self.entries
            .iter()
            .map(|(name, recipe)| (name.as_str(), recipe))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
