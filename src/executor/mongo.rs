//! Mongo dispatcher and document-store backend
//!
//! [`MongoDispatcher`] resolves a logical database to its document-store
//! database, folds cursor modifiers into a [`FindSpec`], and runs the command
//! on a [`DocumentStore`]. [`MongoStore`] is the driver-backed store used
//! outside tests.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{Bson, Document};
use mongodb::options::{FindOneOptions, FindOptions, UpdateModifications};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, info, warn};

use super::convert::{bson_to_json, document_to_json};
use super::result::ExecutionResult;
use crate::catalog::{DatabaseCatalog, LogicalDatabase};
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::parser::{CursorModifier, OperationKind, ParsedMongoCommand, ShellCommand};

/// A collection inside a physical document-store database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    pub database: &'a str,
    pub collection: &'a str,
}

/// Everything a `find` needs, after folding the chained modifiers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    pub filter: Document,
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
    pub min: Option<Document>,
    pub max: Option<Document>,

    /// `count()` was chained; the result is a scalar
    pub count: bool,
}

impl FindSpec {
    /// Fold a `find` command's arguments and modifiers, in parse order
    ///
    /// A later modifier of the same kind replaces an earlier one. An empty
    /// projection selects every field.
    pub fn from_command(cmd: &ParsedMongoCommand) -> Self {
        let mut spec = FindSpec {
            filter: cmd.filter(),
            projection: cmd.document_arg(1).filter(|p| !p.is_empty()).cloned(),
            ..Default::default()
        };

        for modifier in &cmd.modifiers {
            match modifier {
                CursorModifier::Sort(pairs) => spec.sort = Some(pairs.iter().cloned().collect()),
                CursorModifier::Skip(n) => spec.skip = Some(*n),
                CursorModifier::Limit(n) => spec.limit = Some(*n),
                CursorModifier::Min(doc) => spec.min = Some(doc.clone()),
                CursorModifier::Max(doc) => spec.max = Some(doc.clone()),
                CursorModifier::Project(doc) => {
                    spec.projection = Some(doc.clone()).filter(|p| !p.is_empty())
                }
                CursorModifier::Count => spec.count = true,
            }
        }

        spec
    }
}

/// A document store the dispatcher can run operations on
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>>;

    async fn find(&self, target: Target<'_>, spec: FindSpec) -> Result<Vec<Document>>;

    async fn find_one(
        &self,
        target: Target<'_>,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>>;

    /// Count documents matching `filter`
    async fn count_documents(&self, target: Target<'_>, filter: Document) -> Result<u64>;

    /// Insert one document and return its `_id`
    async fn insert_one(&self, target: Target<'_>, document: Document) -> Result<Bson>;

    /// Insert documents and return their `_id`s in input order
    async fn insert_many(&self, target: Target<'_>, documents: Vec<Document>)
    -> Result<Vec<Bson>>;

    /// Update one or many documents, returning (matched, modified)
    async fn update(
        &self,
        target: Target<'_>,
        filter: Document,
        update: UpdateModifications,
        many: bool,
    ) -> Result<(u64, u64)>;

    /// Delete one or many documents, returning the deleted count
    async fn delete(&self, target: Target<'_>, filter: Document, many: bool) -> Result<u64>;

    async fn distinct(
        &self,
        target: Target<'_>,
        field: &str,
        filter: Document,
    ) -> Result<Vec<Bson>>;

    async fn drop_collection(&self, target: Target<'_>) -> Result<()>;

    async fn aggregate(&self, target: Target<'_>, pipeline: Vec<Document>)
    -> Result<Vec<Document>>;
}

/// Runs parsed shell commands against the database bound to a logical database
#[derive(Clone)]
pub struct MongoDispatcher {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<DatabaseCatalog>,
}

impl MongoDispatcher {
    /// Create a dispatcher over a store and catalog
    pub fn new(store: Arc<dyn DocumentStore>, catalog: Arc<DatabaseCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Execute a parsed command; never fails
    ///
    /// # Arguments
    /// * `command` - Parsed shell command
    /// * `db` - Target logical database
    ///
    /// # Returns
    /// * `ExecutionResult` - Documents, ScalarCount, Acknowledgement, or Error
    pub async fn execute(&self, command: &ShellCommand, db: LogicalDatabase) -> ExecutionResult {
        match self.try_execute(command, db).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Mongo execution on {} failed: {}", db, e);
                ExecutionResult::error(e.to_string())
            }
        }
    }

    async fn try_execute(
        &self,
        command: &ShellCommand,
        db: LogicalDatabase,
    ) -> Result<ExecutionResult> {
        let database = self.catalog.mongo_database(db)?;

        let cmd = match command {
            ShellCommand::ListCollections => {
                info!("Listing collections of '{}'", database);
                let names = self.store.list_collection_names(database).await?;
                return Ok(ExecutionResult::Documents {
                    items: names.into_iter().map(JsonValue::String).collect(),
                });
            }
            ShellCommand::Collection(cmd) => cmd,
        };

        self.catalog.check_collection(db, &cmd.collection)?;
        let target = Target {
            database,
            collection: &cmd.collection,
        };
        info!("Running {} on {}.{}", cmd.operation, database, cmd.collection);

        let result = match cmd.operation {
            OperationKind::Find => {
                let spec = FindSpec::from_command(cmd);
                debug!("Find options: {:?}", spec);
                if spec.count {
                    // Cursor count() ignores skip and limit
                    let n = self.store.count_documents(target, spec.filter).await?;
                    ExecutionResult::ScalarCount { n }
                } else {
                    documents(self.store.find(target, spec).await?)
                }
            }
            OperationKind::FindOne => {
                let projection = cmd.document_arg(1).filter(|p| !p.is_empty()).cloned();
                let found = self.store.find_one(target, cmd.filter(), projection).await?;
                documents(found.into_iter().collect())
            }
            OperationKind::InsertOne => {
                let document = cmd.filter();
                let id = self.store.insert_one(target, document).await?;
                ExecutionResult::acknowledgement([
                    ("acknowledged", json!(true)),
                    ("insertedId", bson_to_json(&id)),
                ])
            }
            OperationKind::InsertMany => {
                let ids = self.store.insert_many(target, cmd.documents_arg(0)).await?;
                ExecutionResult::acknowledgement([
                    ("acknowledged", json!(true)),
                    (
                        "insertedIds",
                        JsonValue::Array(ids.iter().map(bson_to_json).collect()),
                    ),
                ])
            }
            OperationKind::UpdateOne | OperationKind::UpdateMany => {
                let update = match cmd.args.get(1) {
                    Some(Bson::Array(_)) => UpdateModifications::Pipeline(cmd.documents_arg(1)),
                    _ => UpdateModifications::Document(
                        cmd.document_arg(1).cloned().unwrap_or_default(),
                    ),
                };
                let many = cmd.operation == OperationKind::UpdateMany;
                let (matched, modified) =
                    self.store.update(target, cmd.filter(), update, many).await?;
                ExecutionResult::acknowledgement([
                    ("acknowledged", json!(true)),
                    ("matchedCount", json!(matched)),
                    ("modifiedCount", json!(modified)),
                ])
            }
            OperationKind::DeleteOne | OperationKind::DeleteMany => {
                let many = cmd.operation == OperationKind::DeleteMany;
                let deleted = self.store.delete(target, cmd.filter(), many).await?;
                ExecutionResult::acknowledgement([
                    ("acknowledged", json!(true)),
                    ("deletedCount", json!(deleted)),
                ])
            }
            OperationKind::CountDocuments | OperationKind::Count => {
                let n = self.store.count_documents(target, cmd.filter()).await?;
                ExecutionResult::ScalarCount { n }
            }
            OperationKind::Distinct => {
                let field = cmd.string_arg(0).unwrap_or_default();
                let filter = cmd.document_arg(1).cloned().unwrap_or_default();
                let values = self.store.distinct(target, field, filter).await?;
                ExecutionResult::Documents {
                    items: values.iter().map(bson_to_json).collect(),
                }
            }
            OperationKind::Drop => {
                self.store.drop_collection(target).await?;
                ExecutionResult::acknowledgement([("dropped", json!(true))])
            }
            OperationKind::Aggregate => {
                let pipeline = cmd.documents_arg(0);
                debug!("Aggregate pipeline with {} stage(s)", pipeline.len());
                documents(self.store.aggregate(target, pipeline).await?)
            }
        };

        debug!("{} returned {} item(s)", cmd.operation, result.len());
        Ok(result)
    }
}

fn documents(docs: Vec<Document>) -> ExecutionResult {
    ExecutionResult::Documents {
        items: docs.iter().map(document_to_json).collect(),
    }
}

/// [`DocumentStore`] on the MongoDB driver
pub struct MongoStore {
    connections: Arc<ConnectionManager>,
}

impl MongoStore {
    /// Create a store drawing clients from `connections`
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// Run `op` on one collection and release the client afterwards
    async fn with_collection<T, F, Fut>(&self, target: Target<'_>, op: F) -> Result<T>
    where
        F: FnOnce(Collection<Document>) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let handle = self.connections.mongo().await?;
        let collection = handle
            .client()
            .database(target.database)
            .collection::<Document>(target.collection);
        let result = op(collection).await;
        handle.release().await;
        result
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>> {
        let handle = self.connections.mongo().await?;
        let result = handle
            .client()
            .database(database)
            .list_collection_names()
            .await
            .map_err(Into::into);
        handle.release().await;
        result
    }

    async fn find(&self, target: Target<'_>, spec: FindSpec) -> Result<Vec<Document>> {
        self.with_collection(target, |coll| async move {
            let mut options = FindOptions::default();
            options.projection = spec.projection;
            options.sort = spec.sort;
            options.skip = spec.skip;
            options.limit = spec.limit;
            options.min = spec.min;
            options.max = spec.max;

            let cursor = coll.find(spec.filter).with_options(options).await?;
            Ok(cursor.try_collect().await?)
        })
        .await
    }

    async fn find_one(
        &self,
        target: Target<'_>,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>> {
        self.with_collection(target, |coll| async move {
            let mut options = FindOneOptions::default();
            options.projection = projection;
            Ok(coll.find_one(filter).with_options(options).await?)
        })
        .await
    }

    async fn count_documents(&self, target: Target<'_>, filter: Document) -> Result<u64> {
        self.with_collection(target, |coll| async move {
            Ok(coll.count_documents(filter).await?)
        })
        .await
    }

    async fn insert_one(&self, target: Target<'_>, document: Document) -> Result<Bson> {
        self.with_collection(target, |coll| async move {
            let result = coll.insert_one(document).await?;
            Ok(result.inserted_id)
        })
        .await
    }

    async fn insert_many(
        &self,
        target: Target<'_>,
        documents: Vec<Document>,
    ) -> Result<Vec<Bson>> {
        self.with_collection(target, |coll| async move {
            let result = coll.insert_many(documents).await?;
            let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
            ids.sort_by_key(|(index, _)| *index);
            Ok(ids.into_iter().map(|(_, id)| id).collect())
        })
        .await
    }

    async fn update(
        &self,
        target: Target<'_>,
        filter: Document,
        update: UpdateModifications,
        many: bool,
    ) -> Result<(u64, u64)> {
        self.with_collection(target, |coll| async move {
            let result = if many {
                coll.update_many(filter, update).await?
            } else {
                coll.update_one(filter, update).await?
            };
            Ok((result.matched_count, result.modified_count))
        })
        .await
    }

    async fn delete(&self, target: Target<'_>, filter: Document, many: bool) -> Result<u64> {
        self.with_collection(target, |coll| async move {
            let result = if many {
                coll.delete_many(filter).await?
            } else {
                coll.delete_one(filter).await?
            };
            Ok(result.deleted_count)
        })
        .await
    }

    async fn distinct(
        &self,
        target: Target<'_>,
        field: &str,
        filter: Document,
    ) -> Result<Vec<Bson>> {
        let field = field.to_string();
        self.with_collection(target, |coll| async move {
            Ok(coll.distinct(field, filter).await?)
        })
        .await
    }

    async fn drop_collection(&self, target: Target<'_>) -> Result<()> {
        self.with_collection(target, |coll| async move { Ok(coll.drop().await?) })
            .await
    }

    async fn aggregate(
        &self,
        target: Target<'_>,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>> {
        self.with_collection(target, |coll| async move {
            let cursor = coll.aggregate(pipeline).await?;
            Ok(cursor.try_collect().await?)
        })
        .await
    }
}
