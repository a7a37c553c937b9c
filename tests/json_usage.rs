//! End-to-end reading and writing of JSON documents through hand-written
//! `ToJson`/`FromJson` impls.

use json_twine::{
    from_file, json, to_file, DumpOptions, Error, FromJson, Map, Result, ToJson, Value,
};
use std::fs;

#[derive(Debug, Clone, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

impl ToJson for Point {
    fn to_json(&self) -> Value {
        let mut j = Value::Null;
        j["x"] = self.x.into();
        j["y"] = self.y.into();
        j
    }
}

impl FromJson for Point {
    fn from_json(value: &Value) -> Result<Self> {
        Ok(Point {
            x: value.get_as("x")?,
            y: value.get_as("y")?,
        })
    }
}

#[derive(Debug, PartialEq)]
struct Money {
    currency: String,
    value: f64,
}

impl FromJson for Money {
    fn from_json(value: &Value) -> Result<Self> {
        Ok(Money {
            currency: value.get_as("currency")?,
            value: value.get_as("value")?,
        })
    }
}

const DOCUMENT: &str = r#"{
    "pi": 3.25,
    "happy": true,
    "name": "Niels",
    "nothing": null,
    "object": {
        "currency": "USD",
        "value": 42.99
    },
    "objectlist": [
        {"x": 1.0, "y": 2.0},
        {"x": 3.0, "y": 34.0},
        {"x": 8.0, "y": 62.0}
    ]
}"#;

fn write_document(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("file.json");
    fs::write(&path, DOCUMENT).unwrap();
    path
}

#[test]
fn test_read_document() {
    let dir = tempfile::tempdir().unwrap();
    let json = from_file(write_document(&dir)).unwrap();

    let pi = &json["pi"];
    assert!(pi.is_number());
    let num: f64 = pi.decode().unwrap();
    assert_eq!(num, 3.25);

    let name = &json["name"];
    assert!(name.is_string());
    let s: String = name.decode().unwrap();
    assert_eq!(s, "Niels");

    let obj = &json["object"];
    assert_eq!(json["object"]["currency"].as_str(), Some("USD"));
    assert_eq!(obj["currency"].as_str(), Some("USD"));

    let m = Money::from_json(obj).unwrap();
    let m2: Money = json.get_as("object").unwrap();
    assert_eq!(m, m2);
    assert_eq!(
        m,
        Money {
            currency: "USD".to_string(),
            value: 42.99,
        }
    );

    let list: Vec<Point> = json.get_as("objectlist").unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[2], Point { x: 8.0, y: 62.0 });
}

#[test]
fn test_read_preserves_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let json = from_file(write_document(&dir)).unwrap();
    let serialized = json.dump(0);
    assert!(serialized.starts_with(r#"{"pi":3.25,"happy":true,"name":"Niels","nothing":null"#));

    let reparsed: Value = serialized.parse().unwrap();
    assert_eq!(reparsed, json);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = from_file(dir.path().join("file.json")).unwrap_err();
    assert!(err.is_io());
    assert!(err.to_string().contains("file.json"));
}

#[test]
fn test_observing_index_leaves_document_untouched() {
    let json: Value = DOCUMENT.parse().unwrap();
    let before = json.clone();
    assert!(json["not_there"].is_null());
    assert!(json["object"]["nope"]["deeper"].is_null());
    assert_eq!(json, before);
}

#[test]
fn test_strict_decode_reports_path() {
    let json = json!({
        "objectlist": [{"x": 1.0, "y": 2.0}, {"x": 3.0}]
    });
    let err = json.get_as::<Vec<Point>>("objectlist").unwrap_err();
    assert_eq!(err.to_string(), "objectlist[1]: missing field `y`");
    assert!(err.is_missing_field());

    let err = Money::from_json(&json!({"value": 9.99})).unwrap_err();
    assert_eq!(err, Error::missing_field("currency"));

    let err = Money::from_json(&json!({"value": "9.99", "currency": "EUR"})).unwrap_err();
    assert_eq!(err.to_string(), "value: type mismatch: expected number, found string");
}

#[test]
fn test_extra_keys_are_ignored() {
    let p = Point::from_json(&json!({"x": 1.0, "y": 2.0, "z": 3.0})).unwrap();
    assert_eq!(p, Point { x: 1.0, y: 2.0 });
}

#[test]
fn test_write_document() {
    let mut json = Value::Null;
    json["apple"] = "gross".into();
    json["grape"]["jelly"] = "yummy".into();

    let mut internal = Value::Null;
    internal["muahahah"] = 1234.into();
    internal["v2"] = true.into();
    json["intval"] = internal;

    let expected = "{\n    \"apple\": \"gross\",\n    \"grape\": {\n        \"jelly\": \"yummy\"\n    },\n    \"intval\": {\n        \"muahahah\": 1234,\n        \"v2\": true\n    }\n}";
    assert_eq!(json.dump(4), expected);
    assert_eq!(
        json,
        json!({
            "apple": "gross",
            "grape": {"jelly": "yummy"},
            "intval": {"muahahah": 1234, "v2": true}
        })
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output.json");
    fs::write(&path, "previous content that is much longer than the new one").unwrap();
    to_file(&path, &json, DumpOptions::pretty()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", expected));
    assert_eq!(from_file(&path).unwrap(), json);
}

#[test]
fn test_assign_points() {
    let mut json = json!({"apple": "gross"});
    let points = vec![
        Point { x: 1.0, y: 2.0 },
        Point { x: 3.0, y: 34.0 },
        Point { x: 8.0, y: 62.0 },
    ];

    json.assign(&points);
    let serialized = json.dump(2);
    assert_eq!(
        serialized,
        "[\n  {\n    \"x\": 1.0,\n    \"y\": 2.0\n  },\n  {\n    \"x\": 3.0,\n    \"y\": 34.0\n  },\n  {\n    \"x\": 8.0,\n    \"y\": 62.0\n  }\n]"
    );

    let back: Vec<Point> = serialized.parse::<Value>().unwrap().decode().unwrap();
    assert_eq!(back, points);
}

#[test]
fn test_encode_is_idempotent() {
    let p = Point { x: 1.0, y: 2.0 };
    let first = p.to_json();
    let second = p.to_json();
    assert_eq!(first, second);
    assert_eq!(first.dump(0), r#"{"x":1.0,"y":2.0}"#);

    let mut target = json!({"x": 0.0, "y": 0.0, "stale": [1, 2]});
    target.assign(&p);
    assert_eq!(target, first);
    assert!(target.get("stale").is_none());
}

#[test]
fn test_map_of_points() {
    let mut shapes = Map::new();
    shapes.insert("origin".to_string(), Point { x: 0.0, y: 0.0 }.to_json());
    shapes.insert("corner".to_string(), Point { x: 1.0, y: 1.0 }.to_json());
    let tree = Value::Object(shapes);

    let corner: Point = tree.get_as("corner").unwrap();
    assert_eq!(corner, Point { x: 1.0, y: 1.0 });
    assert_eq!(tree.dump(0), r#"{"origin":{"x":0.0,"y":0.0},"corner":{"x":1.0,"y":1.0}}"#);
}
