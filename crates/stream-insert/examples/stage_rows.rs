//! Stages rows from a JSON file and shows the request and a mapped failure.
//!
//! Usage: `cargo run --example stage_rows -- rows.json`
//! where `rows.json` holds an array of flat JSON objects.

use std::fs;

use stream_insert::{
    ErrorProto, InsertAllRequest, InsertAllResponse, InsertErrors, Inserter, PutError, Row,
    RowSaver, Rows, Transport, TransportError, Value,
};

fn to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => Value::Float64(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(to_value).collect()),
        serde_json::Value::Object(map) => Value::Record(to_row(map)),
    }
}

fn to_row(map: &serde_json::Map<String, serde_json::Value>) -> Row {
    map.iter().map(|(k, v)| (k.clone(), to_value(v))).collect()
}

/// Prints the request and rejects the last row.
struct PrintAndRejectLast;

impl Transport for PrintAndRejectLast {
    fn insert_all(&self, request: &InsertAllRequest) -> Result<InsertAllResponse, TransportError> {
        println!("{}", serde_json::to_string_pretty(request)?);
        Ok(InsertAllResponse {
            insert_errors: vec![InsertErrors {
                index: request.rows.len() as i64 - 1,
                errors: vec![ErrorProto {
                    reason: "invalid".into(),
                    message: "rejected by example transport".into(),
                    ..Default::default()
                }],
            }],
        })
    }
}

fn main() {
    let rows: Vec<Row> = match std::env::args().nth(1) {
        Some(path) => {
            let data = fs::read(&path).expect("Failed to read file");
            let parsed: Vec<serde_json::Map<String, serde_json::Value>> =
                serde_json::from_slice(&data).expect("Expected a JSON array of objects");
            parsed.iter().map(to_row).collect()
        }
        None => vec![
            Row::from([("city".to_string(), Value::from("Lisbon"))]),
            Row::from([("city".to_string(), Value::from("Porto"))]),
        ],
    };
    println!("Staging {} rows", rows.len());

    let inserter = Inserter::new(PrintAndRejectLast);
    match inserter.put(Rows::savers(rows.into_iter().map(RowSaver::new))) {
        Ok(()) => println!("All rows inserted"),
        Err(PutError::Rows(rejected)) => {
            for e in &rejected {
                println!("row {} (insert id {}): {}", e.row_index, e.insert_id, e.errors);
            }
        }
        Err(e) => eprintln!("Insert failed: {e}"),
    }
}
