//! End-to-end runs through the interpreter with in-memory backends

mod common;

use std::sync::Arc;

use mongodb::bson::doc;
use serde_json::json;

use common::{FixtureSql, MemoryStore, interpreter};
use nlquery::catalog::{DatabaseBinding, DatabaseCatalog, LogicalDatabase, default_bindings};
use nlquery::{ExecutionResult, Interpreter, RawCommand};

#[tokio::test]
async fn sql_read_is_normalized_before_dispatch() {
    let sql = FixtureSql::default().with_result(
        "SELECT CONCAT(first_name, ' ', last_name) AS full_name FROM customers LIMIT 1",
        &["full_name"],
        vec![vec![json!("Debra Burks")]],
    );
    let (interpreter, backend, _) = interpreter(sql);

    let result = interpreter
        .run(
            &RawCommand::sql(
                "```sql\nSELECT first_name || ' ' || last_name AS full_name\nFROM customers\nLIMIT 1\n```",
            ),
            Some(LogicalDatabase::BikeStore),
        )
        .await;

    assert_eq!(
        result,
        ExecutionResult::Rows {
            columns: vec!["full_name".to_string()],
            data: vec![vec![json!("Debra Burks")]],
        }
    );
    assert_eq!(backend.statements()[0].0, "bike_store");
}

#[tokio::test]
async fn sql_write_reports_zero_rows() {
    let (interpreter, backend, _) = interpreter(FixtureSql::default());
    let result = interpreter
        .run(
            &RawCommand::sql("DELETE FROM players WHERE player_id = -1"),
            Some(LogicalDatabase::Fifa),
        )
        .await;
    assert_eq!(result, ExecutionResult::RowCount { n: 0 });
    assert_eq!(
        backend.statements(),
        vec![(
            "fifa".to_string(),
            "DELETE FROM players WHERE player_id = -1".to_string()
        )]
    );
}

#[tokio::test]
async fn sql_backend_failure_is_an_error_result() {
    let (interpreter, _, _) = interpreter(FixtureSql::default());
    let result = interpreter
        .run(
            &RawCommand::sql("SELECT * FROM salez"),
            Some(LogicalDatabase::AdventureWorks),
        )
        .await;
    match result {
        ExecutionResult::Error { message } => assert!(message.contains("(1064)")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn database_is_detected_from_text_when_not_given() {
    let sql = FixtureSql::default().with_result(
        "SELECT name FROM players -- FIFA",
        &["name"],
        vec![],
    );
    let (interpreter, backend, _) = interpreter(sql);
    let result = interpreter
        .run(&RawCommand::sql("SELECT name FROM players -- FIFA"), None)
        .await;
    assert_eq!(
        result,
        ExecutionResult::Rows {
            columns: vec!["name".to_string()],
            data: vec![],
        }
    );
    assert_eq!(backend.statements()[0].0, "fifa");
}

#[tokio::test]
async fn mongo_crud_round() {
    let (interpreter, _, store) = interpreter(FixtureSql::default());
    let bike_store = Some(LogicalDatabase::BikeStore);

    let inserted = interpreter
        .run(
            &RawCommand::mongo(
                r#"db.customers.insertOne({"first_name":"John","last_name":"Doe","state":"California"})"#,
            ),
            bike_store,
        )
        .await;
    let fields = match &inserted {
        ExecutionResult::Acknowledgement { fields } => fields,
        other => panic!("expected acknowledgement, got {other:?}"),
    };
    assert_eq!(fields["acknowledged"], json!(true));
    assert!(!fields["insertedId"].as_str().unwrap().is_empty());

    let updated = interpreter
        .run(
            &RawCommand::mongo(
                "db.customers.updateOne({last_name: 'Doe'}, {$set: {state: 'Texas'}})",
            ),
            bike_store,
        )
        .await;
    assert_eq!(
        updated,
        ExecutionResult::acknowledgement([
            ("acknowledged", json!(true)),
            ("matchedCount", json!(1)),
            ("modifiedCount", json!(1)),
        ])
    );
    assert_eq!(
        store.documents("bike_store", "customers")[0]
            .get_str("state")
            .unwrap(),
        "Texas"
    );

    let count = interpreter
        .run(
            &RawCommand::mongo("db.customers.countDocuments({state: 'Texas'})"),
            bike_store,
        )
        .await;
    assert_eq!(count, ExecutionResult::ScalarCount { n: 1 });

    let deleted = interpreter
        .run(
            &RawCommand::mongo("db.customers.deleteMany({last_name: 'Doe'})"),
            bike_store,
        )
        .await;
    assert_eq!(
        deleted,
        ExecutionResult::acknowledgement([
            ("acknowledged", json!(true)),
            ("deletedCount", json!(1)),
        ])
    );
    assert!(store.documents("bike_store", "customers").is_empty());
}

#[tokio::test]
async fn mongo_find_applies_modifiers_in_order() {
    let (interpreter, _, store) = interpreter(FixtureSql::default());
    store.seed(
        "bike_store",
        "products",
        vec![
            doc! { "_id": 1i64, "product_name": "Trek 820", "list_price": 379.99 },
            doc! { "_id": 2i64, "product_name": "Surly Straggler", "list_price": 1549.0 },
            doc! { "_id": 3i64, "product_name": "Electra Townie", "list_price": 549.99 },
        ],
    );

    let result = interpreter
        .run(
            &RawCommand::mongo(
                r#"db.products.find({}, {}).sort({"list_price":-1}).skip(1).limit(1)"#,
            ),
            Some(LogicalDatabase::BikeStore),
        )
        .await;
    assert_eq!(
        result,
        ExecutionResult::Documents {
            items: vec![json!({"_id": 3, "product_name": "Electra Townie", "list_price": 549.99})]
        }
    );

    let counted = interpreter
        .run(
            &RawCommand::mongo("db.products.find().skip(1).limit(1).count()"),
            Some(LogicalDatabase::BikeStore),
        )
        .await;
    assert_eq!(counted, ExecutionResult::ScalarCount { n: 3 });
}

#[tokio::test]
async fn mongo_collection_listing_and_distinct() {
    let (interpreter, _, store) = interpreter(FixtureSql::default());
    store.seed(
        "fifa",
        "players",
        vec![
            doc! { "name": "Pelé", "nationality": "Brazil" },
            doc! { "name": "Zico", "nationality": "Brazil" },
            doc! { "name": "Zidane", "nationality": "France" },
        ],
    );
    store.seed("fifa", "goals", vec![]);

    let names = interpreter
        .run(&RawCommand::mongo("db.getCollectionNames()"), Some(LogicalDatabase::Fifa))
        .await;
    assert_eq!(
        names,
        ExecutionResult::Documents {
            items: vec![json!("goals"), json!("players")]
        }
    );

    let nationalities = interpreter
        .run(
            &RawCommand::mongo("db.players.distinct('nationality')"),
            Some(LogicalDatabase::Fifa),
        )
        .await;
    assert_eq!(
        nationalities,
        ExecutionResult::Documents {
            items: vec![json!("Brazil"), json!("France")]
        }
    );
}

#[tokio::test]
async fn mongo_drop_removes_collection() {
    let (interpreter, _, store) = interpreter(FixtureSql::default());
    store.seed("fifa", "players", vec![doc! { "name": "Pelé" }]);
    store.seed("fifa", "old_matches", vec![doc! { "year": 1970 }]);

    let dropped = interpreter
        .run(&RawCommand::mongo("db.old_matches.drop()"), Some(LogicalDatabase::Fifa))
        .await;
    assert_eq!(
        dropped,
        ExecutionResult::acknowledgement([("dropped", json!(true))])
    );

    let names = interpreter
        .run(&RawCommand::mongo("db.getCollectionNames()"), Some(LogicalDatabase::Fifa))
        .await;
    assert_eq!(
        names,
        ExecutionResult::Documents {
            items: vec![json!("players")]
        }
    );
}

#[tokio::test]
async fn mongo_aggregate_and_fenced_input() {
    let (interpreter, _, store) = interpreter(FixtureSql::default());
    store.seed(
        "fifa",
        "matches",
        vec![
            doc! { "year": 2018i64, "stage": "Final" },
            doc! { "year": 2022i64, "stage": "Final" },
            doc! { "year": 2022i64, "stage": "Group" },
        ],
    );

    let result = interpreter
        .run(
            &RawCommand::mongo(
                "```javascript\ndb.matches.aggregate([{ $match: { stage: 'Final' } }, { $limit: 1 }]);\n```",
            ),
            Some(LogicalDatabase::Fifa),
        )
        .await;
    assert_eq!(
        result,
        ExecutionResult::Documents {
            items: vec![json!({"year": 2018, "stage": "Final"})]
        }
    );
}

#[tokio::test]
async fn mongo_parse_failures_are_error_results() {
    let (interpreter, _, _) = interpreter(FixtureSql::default());

    let unbalanced = interpreter
        .run(
            &RawCommand::mongo("db.products.find({brand: 'Trek'}"),
            Some(LogicalDatabase::BikeStore),
        )
        .await;
    assert!(unbalanced.is_error());

    let unsupported = interpreter
        .run(
            &RawCommand::mongo("db.products.mapReduce({})"),
            Some(LogicalDatabase::BikeStore),
        )
        .await;
    assert_eq!(
        unsupported,
        ExecutionResult::error("Unsupported operation: mapReduce")
    );

    let one_arg_update = interpreter
        .run(
            &RawCommand::mongo("db.products.updateOne({product_id: 1})"),
            Some(LogicalDatabase::BikeStore),
        )
        .await;
    assert!(one_arg_update.is_error());
}

#[tokio::test]
async fn instances_keep_their_own_catalogs() {
    let renamed: Vec<DatabaseBinding> = default_bindings()
        .into_iter()
        .map(|mut binding| {
            binding.schema = format!("staging_{}", binding.schema);
            binding
        })
        .collect();

    let sql = Arc::new(FixtureSql::default());
    let store = Arc::new(MemoryStore::default());
    let staging = Interpreter::new(sql.clone(), store.clone(), DatabaseCatalog::new(renamed, false));
    let stock = Interpreter::new(sql.clone(), store, DatabaseCatalog::default());

    let command = RawCommand::sql("UPDATE orders SET order_status = 4 WHERE order_id = 1");
    staging.run(&command, Some(LogicalDatabase::BikeStore)).await;
    stock.run(&command, Some(LogicalDatabase::BikeStore)).await;

    let schemas: Vec<String> = sql.statements().into_iter().map(|(s, _)| s).collect();
    assert_eq!(schemas, vec!["staging_bike_store", "bike_store"]);
}

#[tokio::test]
async fn results_serialize_with_type_tag() {
    let (interpreter, _, _) = interpreter(FixtureSql::default());
    let result = interpreter
        .run(&RawCommand::mongo("db.orders.count()"), Some(LogicalDatabase::BikeStore))
        .await;
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"type": "scalarCount", "n": 0})
    );
}
