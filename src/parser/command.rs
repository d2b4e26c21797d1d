//! Command type definitions
//!
//! A parsed shell command is either the bare collection listing or one
//! operation on a named collection, optionally followed by cursor modifiers
//! when the operation is `find`.

use std::fmt;

use mongodb::bson::{Bson, Document};

use super::expr_converter::{ExpressionConverter, write_document, write_value};
use super::mongo_ast::{CallExpr, ChainExpr};
use crate::error::{ExecutionError, NlqError, ParseError, Result};
use crate::utils::validate::is_valid_collection_name;

/// Represents a parsed shell command
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    /// db.getCollectionNames()
    ListCollections,

    /// db.<collection>.<operation>(...)
    Collection(ParsedMongoCommand),
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellCommand::ListCollections => f.write_str("db.getCollectionNames()"),
            ShellCommand::Collection(cmd) => write!(f, "{cmd}"),
        }
    }
}

/// Collection operations understood by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Find,
    FindOne,
    InsertOne,
    InsertMany,
    UpdateOne,
    UpdateMany,
    DeleteOne,
    DeleteMany,
    CountDocuments,
    Count,
    Distinct,
    Drop,
    Aggregate,
}

impl OperationKind {
    /// Look up an operation by its shell method name
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "find" => OperationKind::Find,
            "findOne" => OperationKind::FindOne,
            "insertOne" => OperationKind::InsertOne,
            "insertMany" => OperationKind::InsertMany,
            "updateOne" => OperationKind::UpdateOne,
            "updateMany" => OperationKind::UpdateMany,
            "deleteOne" => OperationKind::DeleteOne,
            "deleteMany" => OperationKind::DeleteMany,
            "countDocuments" => OperationKind::CountDocuments,
            "count" => OperationKind::Count,
            "distinct" => OperationKind::Distinct,
            "drop" => OperationKind::Drop,
            "aggregate" => OperationKind::Aggregate,
            _ => return None,
        };
        Some(kind)
    }

    /// Shell method name
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Find => "find",
            OperationKind::FindOne => "findOne",
            OperationKind::InsertOne => "insertOne",
            OperationKind::InsertMany => "insertMany",
            OperationKind::UpdateOne => "updateOne",
            OperationKind::UpdateMany => "updateMany",
            OperationKind::DeleteOne => "deleteOne",
            OperationKind::DeleteMany => "deleteMany",
            OperationKind::CountDocuments => "countDocuments",
            OperationKind::Count => "count",
            OperationKind::Distinct => "distinct",
            OperationKind::Drop => "drop",
            OperationKind::Aggregate => "aggregate",
        }
    }

    /// Whether the operation mutates the collection
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            OperationKind::InsertOne
                | OperationKind::InsertMany
                | OperationKind::UpdateOne
                | OperationKind::UpdateMany
                | OperationKind::DeleteOne
                | OperationKind::DeleteMany
                | OperationKind::Drop
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cursor modifier chained after `find`, applied in order
#[derive(Debug, Clone, PartialEq)]
pub enum CursorModifier {
    /// sort({field: direction, ...})
    Sort(Vec<(String, Bson)>),
    /// skip(n)
    Skip(u64),
    /// limit(n)
    Limit(i64),
    /// min({index bound})
    Min(Document),
    /// max({index bound})
    Max(Document),
    /// project({projection}) or projection({projection})
    Project(Document),
    /// count()
    Count,
}

impl fmt::Display for CursorModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorModifier::Sort(pairs) => {
                let doc: Document = pairs.iter().cloned().collect();
                f.write_str("sort(")?;
                write_document(f, &doc)?;
                f.write_str(")")
            }
            CursorModifier::Skip(n) => write!(f, "skip({n})"),
            CursorModifier::Limit(n) => write!(f, "limit({n})"),
            CursorModifier::Min(doc) => {
                f.write_str("min(")?;
                write_document(f, doc)?;
                f.write_str(")")
            }
            CursorModifier::Max(doc) => {
                f.write_str("max(")?;
                write_document(f, doc)?;
                f.write_str(")")
            }
            CursorModifier::Project(doc) => {
                f.write_str("project(")?;
                write_document(f, doc)?;
                f.write_str(")")
            }
            CursorModifier::Count => f.write_str("count()"),
        }
    }
}

/// One operation on one collection
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMongoCommand {
    /// Target collection
    pub collection: String,

    /// Operation to run
    pub operation: OperationKind,

    /// Operation arguments, already checked against the operation's shape
    pub args: Vec<Bson>,

    /// Cursor modifiers, only ever present for `find`
    pub modifiers: Vec<CursorModifier>,
}

impl ParsedMongoCommand {
    /// Build a command from a parsed call chain, validating arguments
    pub fn from_chain(chain: ChainExpr) -> Result<Self> {
        let mut calls = chain.calls.into_iter();
        let Some(first) = calls.next() else {
            return Err(ParseError::InvalidCommand(format!(
                "db.{} must be followed by an operation call",
                chain.collection
            ))
            .into());
        };

        if !is_valid_collection_name(&chain.collection) {
            return Err(ParseError::InvalidCommand(format!(
                "'{}' is not a valid collection name",
                chain.collection
            ))
            .into());
        }

        let operation = OperationKind::from_name(&first.name)
            .ok_or_else(|| ExecutionError::UnsupportedOperation(first.name.clone()))?;
        let args = first
            .arguments
            .iter()
            .map(ExpressionConverter::expr_to_bson)
            .collect();
        let args = validate_args(operation, args)?;

        let mut modifiers = Vec::new();
        for call in calls {
            // Terminal no-ops on a cursor
            if matches!(call.name.as_str(), "toArray" | "pretty")
                && call.arguments.is_empty()
                && matches!(operation, OperationKind::Find | OperationKind::Aggregate)
            {
                continue;
            }
            if operation != OperationKind::Find {
                return Err(ExecutionError::UnsupportedOperation(format!(
                    "{operation}().{}",
                    call.name
                ))
                .into());
            }
            if modifiers.last() == Some(&CursorModifier::Count) {
                return Err(ParseError::InvalidArgument {
                    operation: "count".to_string(),
                    message: format!("nothing can follow count(), found {}()", call.name),
                }
                .into());
            }
            modifiers.push(parse_modifier(&call)?);
        }

        Ok(Self {
            collection: chain.collection,
            operation,
            args,
            modifiers,
        })
    }

    /// Document argument at `index`, if present
    pub fn document_arg(&self, index: usize) -> Option<&Document> {
        match self.args.get(index) {
            Some(Bson::Document(doc)) => Some(doc),
            _ => None,
        }
    }

    /// First argument as a filter, empty when omitted
    pub fn filter(&self) -> Document {
        self.document_arg(0).cloned().unwrap_or_default()
    }

    /// Documents of an array argument at `index`
    pub fn documents_arg(&self, index: usize) -> Vec<Document> {
        match self.args.get(index) {
            Some(Bson::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_document().cloned())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// String argument at `index`, if present
    pub fn string_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(Bson::as_str)
    }
}

impl fmt::Display for ParsedMongoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_plain_identifier(&self.collection) {
            write!(f, "db.{}", self.collection)?;
        } else {
            f.write_str("db.getCollection(")?;
            write_value(f, &Bson::String(self.collection.clone()))?;
            f.write_str(")")?;
        }

        write!(f, ".{}(", self.operation)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_value(f, arg)?;
        }
        f.write_str(")")?;

        for modifier in &self.modifiers {
            write!(f, ".{modifier}")?;
        }
        Ok(())
    }
}

/// A collection name usable as `db.<name>` without quoting
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
    starts_well
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        && !matches!(
            name,
            "db" | "getCollectionNames" | "true" | "false" | "null" | "undefined"
        )
}

fn invalid(operation: OperationKind, message: impl Into<String>) -> ParseError {
    ParseError::InvalidArgument {
        operation: operation.name().to_string(),
        message: message.into(),
    }
}

/// Check argument count and shape for an operation
fn validate_args(operation: OperationKind, mut args: Vec<Bson>) -> Result<Vec<Bson>> {
    let count = args.len();
    let all_documents = |items: &[Bson]| items.iter().all(|b| matches!(b, Bson::Document(_)));

    match operation {
        OperationKind::Find | OperationKind::FindOne => {
            if count > 2 || !all_documents(&args) {
                return Err(invalid(operation, "expected ([filter], [projection]) documents").into());
            }
        }
        OperationKind::InsertOne => {
            if count != 1 || !all_documents(&args) {
                return Err(invalid(operation, "expected exactly one document").into());
            }
        }
        OperationKind::InsertMany => match args.as_slice() {
            [Bson::Array(items)] if items.is_empty() => {
                return Err(invalid(operation, "requires at least one document").into());
            }
            [Bson::Array(items)] if all_documents(items) => {}
            _ => return Err(invalid(operation, "expected one array of documents").into()),
        },
        OperationKind::UpdateOne | OperationKind::UpdateMany => {
            if count != 2 {
                return Err(invalid(
                    operation,
                    format!("expected 2 arguments (filter, update), got {count}"),
                )
                .into());
            }
            let update_ok = match &args[1] {
                Bson::Document(_) => true,
                Bson::Array(stages) => all_documents(stages),
                _ => false,
            };
            if !matches!(args[0], Bson::Document(_)) || !update_ok {
                return Err(invalid(
                    operation,
                    "expected a filter document and an update document or pipeline",
                )
                .into());
            }
        }
        OperationKind::DeleteOne | OperationKind::DeleteMany => {
            if count != 1 || !all_documents(&args) {
                return Err(invalid(operation, "expected exactly one filter document").into());
            }
        }
        OperationKind::CountDocuments | OperationKind::Count => {
            if count > 1 || !all_documents(&args) {
                return Err(invalid(operation, "expected an optional filter document").into());
            }
        }
        OperationKind::Distinct => {
            let shape_ok = match args.as_slice() {
                [Bson::String(_)] => true,
                [Bson::String(_), Bson::Document(_)] => true,
                _ => false,
            };
            if !shape_ok {
                return Err(invalid(operation, "expected (field, [filter])").into());
            }
        }
        OperationKind::Drop => {
            if count != 0 {
                return Err(invalid(operation, "takes no arguments").into());
            }
        }
        OperationKind::Aggregate => {
            let is_pipeline =
                matches!(args.as_slice(), [Bson::Array(stages)] if all_documents(stages));
            if !is_pipeline {
                if !all_documents(&args) {
                    return Err(invalid(operation, "expected a pipeline array of stages").into());
                }
                // aggregate(stage1, stage2, ...) is the same pipeline
                args = vec![Bson::Array(std::mem::take(&mut args))];
            }
        }
    }

    Ok(args)
}

/// Parse one cursor modifier call
fn parse_modifier(call: &CallExpr) -> Result<CursorModifier> {
    let args: Vec<Bson> = call
        .arguments
        .iter()
        .map(ExpressionConverter::expr_to_bson)
        .collect();

    let invalid_modifier = |message: &str| -> NlqError {
        ParseError::InvalidArgument {
            operation: call.name.clone(),
            message: message.to_string(),
        }
        .into()
    };

    let single_document = || match args.as_slice() {
        [Bson::Document(doc)] => Ok(doc.clone()),
        _ => Err(invalid_modifier("expected one document")),
    };

    let modifier = match call.name.as_str() {
        "sort" => {
            let doc = single_document()?;
            CursorModifier::Sort(doc.into_iter().collect())
        }
        "skip" => match args.as_slice() {
            [value] => match as_integer(value) {
                Some(n) if n >= 0 => CursorModifier::Skip(n as u64),
                _ => return Err(invalid_modifier("expected a non-negative integer")),
            },
            _ => return Err(invalid_modifier("expected one integer")),
        },
        "limit" => match args.as_slice() {
            [value] => match as_integer(value) {
                Some(n) => CursorModifier::Limit(n),
                None => return Err(invalid_modifier("expected an integer")),
            },
            _ => return Err(invalid_modifier("expected one integer")),
        },
        "min" => CursorModifier::Min(single_document()?),
        "max" => CursorModifier::Max(single_document()?),
        "project" | "projection" => CursorModifier::Project(single_document()?),
        "count" => {
            if !args.is_empty() {
                return Err(invalid_modifier("takes no arguments"));
            }
            CursorModifier::Count
        }
        other => {
            return Err(ExecutionError::UnsupportedOperation(format!("find().{other}")).into());
        }
    };

    Ok(modifier)
}

/// Integral numeric value, accepting floats with no fractional part
fn as_integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Some(*f as i64),
        _ => None,
    }
}
