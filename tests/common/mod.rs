//! In-memory backends for driving the interpreter without live databases

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mongodb::bson::{Bson, Document, oid::ObjectId};
use mongodb::options::UpdateModifications;
use serde_json::Value as JsonValue;

use nlquery::catalog::DatabaseCatalog;
use nlquery::error::{ExecutionError, Result};
use nlquery::executor::{DocumentStore, FindSpec, Interpreter, Target};
use nlquery::sql::{SqlBackend, TabularData};

/// Relational fixture: canned result sets keyed by exact SQL text
#[derive(Default)]
pub struct FixtureSql {
    pub results: HashMap<String, TabularData>,
    pub affected: u64,
    pub log: Mutex<Vec<(String, String)>>,
}

impl FixtureSql {
    pub fn with_result(mut self, sql: &str, columns: &[&str], rows: Vec<Vec<JsonValue>>) -> Self {
        self.results.insert(
            sql.to_string(),
            TabularData {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
            },
        );
        self
    }

    pub fn statements(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlBackend for FixtureSql {
    async fn query(&self, schema: &str, sql: &str) -> Result<TabularData> {
        self.log
            .lock()
            .unwrap()
            .push((schema.to_string(), sql.to_string()));
        self.results.get(sql).cloned().ok_or_else(|| {
            ExecutionError::Backend(format!("(1064) You have an error in your SQL syntax near '{sql}'"))
                .into()
        })
    }

    async fn execute(&self, schema: &str, sql: &str) -> Result<u64> {
        self.log
            .lock()
            .unwrap()
            .push((schema.to_string(), sql.to_string()));
        Ok(self.affected)
    }
}

/// Document fixture: collections per database, top-level equality filters,
/// `$set` updates, `$match`/`$limit` pipelines
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<String, BTreeMap<String, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn seed(&self, database: &str, collection: &str, docs: Vec<Document>) {
        self.data
            .lock()
            .unwrap()
            .entry(database.to_string())
            .or_default()
            .insert(collection.to_string(), docs);
    }

    pub fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        self.data
            .lock()
            .unwrap()
            .get(database)
            .and_then(|colls| colls.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    fn with<T>(&self, target: Target<'_>, f: impl FnOnce(&mut Vec<Document>) -> T) -> T {
        let mut data = self.data.lock().unwrap();
        let docs = data
            .entry(target.database.to_string())
            .or_default()
            .entry(target.collection.to_string())
            .or_default();
        f(docs)
    }

    fn matching(&self, target: Target<'_>, filter: &Document) -> Vec<Document> {
        self.with(target, |docs| {
            docs.iter().filter(|d| matches(d, filter)).cloned().collect()
        })
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, value)| doc.get(key) == Some(value))
}

fn compare(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    fn number(v: &Bson) -> Option<f64> {
        match v {
            Bson::Int32(n) => Some(f64::from(*n)),
            Bson::Int64(n) => Some(*n as f64),
            Bson::Double(f) => Some(*f),
            _ => None,
        }
    }
    match (a, b) {
        (Some(Bson::String(x)), Some(Bson::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => number(x)
            .zip(number(y))
            .and_then(|(x, y)| x.partial_cmp(&y))
            .unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn window(docs: Vec<Document>, skip: Option<u64>, limit: Option<u64>) -> Vec<Document> {
    let skipped = docs.into_iter().skip(skip.unwrap_or(0) as usize);
    match limit.filter(|n| *n > 0) {
        Some(n) => skipped.take(n as usize).collect(),
        None => skipped.collect(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .get(database)
            .map(|colls| colls.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn find(&self, target: Target<'_>, spec: FindSpec) -> Result<Vec<Document>> {
        let mut docs = self.matching(target, &spec.filter);
        if let Some(sort) = &spec.sort {
            docs.sort_by(|a, b| {
                sort.iter()
                    .map(|(field, direction)| {
                        let ordering = compare(a.get(field), b.get(field));
                        if matches!(direction, Bson::Int64(n) if *n < 0)
                            || matches!(direction, Bson::Int32(n) if *n < 0)
                        {
                            ordering.reverse()
                        } else {
                            ordering
                        }
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }
        let limit = spec.limit.map(i64::unsigned_abs);
        let docs = window(docs, spec.skip, limit);
        Ok(match &spec.projection {
            Some(projection) => docs
                .into_iter()
                .map(|doc| {
                    doc.into_iter()
                        .filter(|(k, _)| k == "_id" || projection.contains_key(k))
                        .collect()
                })
                .collect(),
            None => docs,
        })
    }

    async fn find_one(
        &self,
        target: Target<'_>,
        filter: Document,
        _projection: Option<Document>,
    ) -> Result<Option<Document>> {
        Ok(self.matching(target, &filter).into_iter().next())
    }

    async fn count_documents(&self, target: Target<'_>, filter: Document) -> Result<u64> {
        Ok(self.matching(target, &filter).len() as u64)
    }

    async fn insert_one(&self, target: Target<'_>, mut document: Document) -> Result<Bson> {
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }
        let id = document.get("_id").cloned().unwrap_or(Bson::Null);
        self.with(target, |docs| docs.push(document));
        Ok(id)
    }

    async fn insert_many(
        &self,
        target: Target<'_>,
        documents: Vec<Document>,
    ) -> Result<Vec<Bson>> {
        let mut ids = Vec::new();
        for document in documents {
            ids.push(self.insert_one(target, document).await?);
        }
        Ok(ids)
    }

    async fn update(
        &self,
        target: Target<'_>,
        filter: Document,
        update: UpdateModifications,
        many: bool,
    ) -> Result<(u64, u64)> {
        let UpdateModifications::Document(update) = update else {
            return Err(ExecutionError::Backend("pipelines are not supported".to_string()).into());
        };
        let set = update.get_document("$set").cloned().unwrap_or_default();
        Ok(self.with(target, |docs| {
            let mut matched = 0;
            let mut modified = 0;
            for doc in docs.iter_mut().filter(|d| matches(d, &filter)) {
                matched += 1;
                let mut changed = false;
                for (key, value) in &set {
                    if doc.get(key) != Some(value) {
                        doc.insert(key.clone(), value.clone());
                        changed = true;
                    }
                }
                if changed {
                    modified += 1;
                }
                if !many {
                    break;
                }
            }
            (matched, modified)
        }))
    }

    async fn delete(&self, target: Target<'_>, filter: Document, many: bool) -> Result<u64> {
        Ok(self.with(target, |docs| {
            let before = docs.len();
            if many {
                docs.retain(|d| !matches(d, &filter));
            } else if let Some(pos) = docs.iter().position(|d| matches(d, &filter)) {
                docs.remove(pos);
            }
            (before - docs.len()) as u64
        }))
    }

    async fn distinct(
        &self,
        target: Target<'_>,
        field: &str,
        filter: Document,
    ) -> Result<Vec<Bson>> {
        let mut values: Vec<Bson> = Vec::new();
        for doc in self.matching(target, &filter) {
            if let Some(value) = doc.get(field)
                && !values.contains(value)
            {
                values.push(value.clone());
            }
        }
        Ok(values)
    }

    async fn drop_collection(&self, target: Target<'_>) -> Result<()> {
        if let Some(colls) = self.data.lock().unwrap().get_mut(target.database) {
            colls.remove(target.collection);
        }
        Ok(())
    }

    async fn aggregate(
        &self,
        target: Target<'_>,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>> {
        let mut docs = self.with(target, |docs| docs.clone());
        for stage in pipeline {
            if let Ok(filter) = stage.get_document("$match") {
                docs.retain(|d| matches(d, filter));
            } else if let Some(n) = stage.get("$limit").and_then(Bson::as_i64) {
                docs.truncate(n as usize);
            } else {
                return Err(ExecutionError::Backend(format!("unsupported stage {stage}")).into());
            }
        }
        Ok(docs)
    }
}

/// Interpreter over fresh fixtures with the stock catalog
pub fn interpreter(sql: FixtureSql) -> (Interpreter, Arc<FixtureSql>, Arc<MemoryStore>) {
    let sql = Arc::new(sql);
    let store = Arc::new(MemoryStore::default());
    let interpreter = Interpreter::new(sql.clone(), store.clone(), DatabaseCatalog::default());
    (interpreter, sql, store)
}
