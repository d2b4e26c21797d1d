//! Logical databases and the database selector
//!
//! A logical database is one of the fixed named domains a command can target.
//! Each one is bound to a relational schema, a document-store database and an
//! allow-list of table/collection names. The bindings live in an immutable
//! [`DatabaseCatalog`] built from configuration and handed to the dispatchers.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ExecutionError};

/// Whole-word, case-insensitive aliases, in alternation order.
static ALIAS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(bike\s+store|adventureworks|fifa)\b").expect("alias pattern is valid")
});

/// The fixed set of logical databases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalDatabase {
    #[serde(rename = "Bike Store", alias = "bike_store", alias = "bikestore")]
    BikeStore,
    #[serde(rename = "AdventureWorks", alias = "adventure_works")]
    AdventureWorks,
    #[serde(rename = "FIFA", alias = "fifa")]
    Fifa,
}

impl LogicalDatabase {
    /// All logical databases, in display order
    pub const ALL: [LogicalDatabase; 3] = [
        LogicalDatabase::BikeStore,
        LogicalDatabase::AdventureWorks,
        LogicalDatabase::Fifa,
    ];

    /// Canonical display name
    pub fn name(&self) -> &'static str {
        match self {
            LogicalDatabase::BikeStore => "Bike Store",
            LogicalDatabase::AdventureWorks => "AdventureWorks",
            LogicalDatabase::Fifa => "FIFA",
        }
    }

    /// Map a matched alias back to its database.
    ///
    /// Whitespace inside "bike store" may be any run of whitespace.
    fn from_alias(alias: &str) -> Option<Self> {
        let folded = alias
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        match folded.as_str() {
            "bike store" => Some(LogicalDatabase::BikeStore),
            "adventureworks" => Some(LogicalDatabase::AdventureWorks),
            "fifa" => Some(LogicalDatabase::Fifa),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogicalDatabase {
    type Err = ConfigError;

    /// Accepts display names and physical-style names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "bike store" | "bikestore" => Ok(LogicalDatabase::BikeStore),
            "adventureworks" | "adventure works" => Ok(LogicalDatabase::AdventureWorks),
            "fifa" => Ok(LogicalDatabase::Fifa),
            _ => Err(ConfigError::InvalidValue {
                field: "database".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Detect which logical database a piece of free text refers to.
///
/// The first alias found scanning left to right wins; partial words such as
/// "fifas" or "bike storehouse" do not match.
pub fn detect(text: &str) -> Option<LogicalDatabase> {
    ALIAS_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| LogicalDatabase::from_alias(m.as_str()))
}

/// Physical names and allow-list for one logical database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseBinding {
    /// Logical database this binding belongs to
    pub database: LogicalDatabase,

    /// Relational schema name
    pub schema: String,

    /// Document-store database name
    pub mongo_database: String,

    /// Tables / collections that belong to this database
    #[serde(default)]
    pub tables: Vec<String>,
}

impl DatabaseBinding {
    /// Whether `name` is in the allow-list
    pub fn allows(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t == name)
    }
}

/// Immutable logical-database map shared by the dispatchers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseCatalog {
    bindings: Vec<DatabaseBinding>,
    enforce_allow_list: bool,
}

impl DatabaseCatalog {
    /// Build a catalog from explicit bindings
    pub fn new(bindings: Vec<DatabaseBinding>, enforce_allow_list: bool) -> Self {
        Self {
            bindings,
            enforce_allow_list,
        }
    }

    /// Look up the binding for a logical database
    pub fn binding(&self, db: LogicalDatabase) -> Result<&DatabaseBinding, ExecutionError> {
        self.bindings
            .iter()
            .find(|b| b.database == db)
            .ok_or_else(|| ExecutionError::InvalidDatabase(db.to_string()))
    }

    /// Relational schema for a logical database
    pub fn schema(&self, db: LogicalDatabase) -> Result<&str, ExecutionError> {
        self.binding(db).map(|b| b.schema.as_str())
    }

    /// Document-store database for a logical database
    pub fn mongo_database(&self, db: LogicalDatabase) -> Result<&str, ExecutionError> {
        self.binding(db).map(|b| b.mongo_database.as_str())
    }

    /// Reject collections outside the allow-list when enforcement is on
    pub fn check_collection(
        &self,
        db: LogicalDatabase,
        collection: &str,
    ) -> Result<(), ExecutionError> {
        let binding = self.binding(db)?;
        if self.enforce_allow_list && !binding.allows(collection) {
            return Err(ExecutionError::UnknownCollection {
                database: db.to_string(),
                collection: collection.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for DatabaseCatalog {
    fn default() -> Self {
        Self::new(default_bindings(), false)
    }
}

/// The three stock bindings
pub fn default_bindings() -> Vec<DatabaseBinding> {
    fn binding(db: LogicalDatabase, name: &str, tables: &[&str]) -> DatabaseBinding {
        DatabaseBinding {
            database: db,
            schema: name.to_string(),
            mongo_database: name.to_string(),
            tables: tables.iter().map(|t| t.to_string()).collect(),
        }
    }

    vec![
        binding(
            LogicalDatabase::BikeStore,
            "bike_store",
            &["customers", "orders", "products"],
        ),
        binding(
            LogicalDatabase::AdventureWorks,
            "adventure_works",
            &["product", "sales"],
        ),
        binding(LogicalDatabase::Fifa, "fifa", &["players", "matches", "goals"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_each_alias() {
        assert_eq!(
            detect("List products from Bike Store"),
            Some(LogicalDatabase::BikeStore)
        );
        assert_eq!(
            detect("total sales in adventureworks"),
            Some(LogicalDatabase::AdventureWorks)
        );
        assert_eq!(detect("top scorers FIFA 2018"), Some(LogicalDatabase::Fifa));
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(detect("BIKE STORE orders"), Some(LogicalDatabase::BikeStore));
        assert_eq!(detect("AdVeNtUrEwOrKs"), Some(LogicalDatabase::AdventureWorks));
    }

    #[test]
    fn test_detect_collapses_inner_whitespace() {
        assert_eq!(detect("the bike   store"), Some(LogicalDatabase::BikeStore));
        assert_eq!(detect("bike\tstore"), Some(LogicalDatabase::BikeStore));
    }

    #[test]
    fn test_detect_requires_whole_words() {
        assert_eq!(detect("fifas and bike storehouse"), None);
        assert_eq!(detect("superfifa"), None);
    }

    #[test]
    fn test_detect_none() {
        assert_eq!(detect("how many customers are there?"), None);
        assert_eq!(detect(""), None);
    }

    #[test]
    fn test_detect_leftmost_wins() {
        assert_eq!(
            detect("compare FIFA players with Bike Store customers"),
            Some(LogicalDatabase::Fifa)
        );
        assert_eq!(
            detect("bike store vs fifa"),
            Some(LogicalDatabase::BikeStore)
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "bike_store".parse::<LogicalDatabase>().unwrap(),
            LogicalDatabase::BikeStore
        );
        assert_eq!(
            "AdventureWorks".parse::<LogicalDatabase>().unwrap(),
            LogicalDatabase::AdventureWorks
        );
        assert_eq!("fifa".parse::<LogicalDatabase>().unwrap(), LogicalDatabase::Fifa);
        assert!("northwind".parse::<LogicalDatabase>().is_err());
    }

    #[test]
    fn test_default_catalog_bindings() {
        let catalog = DatabaseCatalog::default();
        assert_eq!(catalog.schema(LogicalDatabase::BikeStore).unwrap(), "bike_store");
        assert_eq!(
            catalog.mongo_database(LogicalDatabase::AdventureWorks).unwrap(),
            "adventure_works"
        );
        assert_eq!(catalog.schema(LogicalDatabase::Fifa).unwrap(), "fifa");
    }

    #[test]
    fn test_missing_binding_is_invalid_database() {
        let catalog = DatabaseCatalog::new(vec![], false);
        assert_eq!(
            catalog.schema(LogicalDatabase::Fifa),
            Err(ExecutionError::InvalidDatabase("FIFA".to_string()))
        );
    }

    #[test]
    fn test_allow_list_enforcement() {
        let relaxed = DatabaseCatalog::default();
        assert!(relaxed.check_collection(LogicalDatabase::Fifa, "stadiums").is_ok());

        let strict = DatabaseCatalog::new(default_bindings(), true);
        assert!(strict.check_collection(LogicalDatabase::Fifa, "players").is_ok());
        assert!(matches!(
            strict.check_collection(LogicalDatabase::Fifa, "stadiums"),
            Err(ExecutionError::UnknownCollection { .. })
        ));
    }
}
