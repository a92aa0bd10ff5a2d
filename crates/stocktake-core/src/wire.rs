//! # Wire Normalization
//!
//! The single boundary where backend JSON becomes strict domain types.
//!
//! ## Why One Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Normalization Boundary                            │
//! │                                                                         │
//! │  Backend JSON (loose)               Domain types (strict)               │
//! │  ─────────────────────              ─────────────────────               │
//! │  "counted_quantity": "4"   ──┐                                          │
//! │  "counted_quantity": 4.0   ──┼──►   counted_qty: 4                      │
//! │  "countedQuantity": 4      ──┘                                          │
//! │                                                                         │
//! │  "product": {"id": 7, ...} ──┐                                          │
//! │  "product_id": "7"         ──┴──►   product_id: "7"                     │
//! │                                                                         │
//! │  "counted_quantity": "x"   ─────►   CoreError::Wire  (never defaulted)  │
//! │                                                                         │
//! │  Business logic downstream never sees an Option-or-string quantity.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The backend's own `difference` field is ignored on purpose: right after a
//! write it may not have settled yet, and [`StockTakeItem::difference`]
//! derives the same value from the quantities.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::types::{
    LookupResult, ProductHit, SessionStatus, StockTakeItem, StockTakeSession, VariationHit,
};

type Object = Map<String, Value>;

// =============================================================================
// Items
// =============================================================================

/// Parses the item list of a session.
///
/// Accepts a bare array or an envelope (`{"data": [...]}` / `{"items": [...]}`).
pub fn parse_items(value: &Value) -> CoreResult<Vec<StockTakeItem>> {
    let list = match value {
        Value::Array(list) => list,
        Value::Object(obj) => match pick(obj, &["data", "items"]) {
            Some(Value::Array(list)) => list,
            _ => return Err(CoreError::wire("items", "expected an array of items")),
        },
        _ => return Err(CoreError::wire("items", "expected an array of items")),
    };

    list.iter().map(parse_item).collect()
}

/// Parses a single stock-take line.
pub fn parse_item(value: &Value) -> CoreResult<StockTakeItem> {
    let obj = as_object(value, "item")?;

    let id = id_field(obj, &["id"], "item.id")?;

    let (product_id, product_name, barcode) = match obj.get("product") {
        Some(Value::Object(product)) => (
            id_field(product, &["id"], "item.product.id")?,
            optional_text(product, &["name"]).unwrap_or_default(),
            optional_text(product, &["barcode"]),
        ),
        Some(Value::Null) | None => (
            id_field(obj, &["product_id", "productId"], "item.product_id")?,
            optional_text(obj, &["product_name", "productName"]).unwrap_or_default(),
            optional_text(obj, &["barcode"]),
        ),
        Some(_) => return Err(CoreError::wire("item.product", "expected an object")),
    };

    let expected_qty = match pick(obj, &["expected_quantity", "expectedQuantity"]) {
        Some(v) => quantity(v, "item.expected_quantity")?,
        None => {
            return Err(CoreError::wire(
                "item.expected_quantity",
                "missing expected quantity",
            ))
        }
    };

    let counted_qty = match pick(obj, &["counted_quantity", "countedQuantity"]) {
        Some(Value::Null) | None => 0,
        Some(v) => quantity(v, "item.counted_quantity")?,
    };
    if counted_qty < 0 {
        return Err(CoreError::wire(
            "item.counted_quantity",
            format!("counted quantity cannot be negative (got {})", counted_qty),
        ));
    }

    Ok(StockTakeItem {
        id,
        product_id,
        product_name,
        barcode,
        expected_qty,
        counted_qty,
    })
}

// =============================================================================
// Session
// =============================================================================

/// Parses a session summary (bare object or `{"data": {...}}`).
pub fn parse_session(value: &Value) -> CoreResult<StockTakeSession> {
    let obj = as_object(value, "session")?;
    let obj = match pick(obj, &["data"]) {
        Some(Value::Object(inner)) => inner,
        _ => obj,
    };

    let id = id_field(obj, &["id"], "session.id")?;

    let outlet_id = match obj.get("outlet") {
        Some(Value::Object(outlet)) => id_field(outlet, &["id"], "session.outlet.id")?,
        _ => id_field(obj, &["outlet_id", "outletId"], "session.outlet_id")?,
    };

    let operating_date = match pick(obj, &["operating_date", "operatingDate"]) {
        Some(Value::String(s)) => parse_date(s)?,
        _ => {
            return Err(CoreError::wire(
                "session.operating_date",
                "missing operating date",
            ))
        }
    };

    let status = match pick(obj, &["status"]) {
        Some(Value::String(s)) => parse_status(s)?,
        _ => return Err(CoreError::wire("session.status", "missing status")),
    };

    Ok(StockTakeSession {
        id,
        outlet_id,
        operating_date,
        description: optional_text(obj, &["description"]),
        status,
    })
}

/// Parses a session status string.
pub fn parse_status(raw: &str) -> CoreResult<SessionStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "running" | "in_progress" | "open" => Ok(SessionStatus::Running),
        "completed" | "done" => Ok(SessionStatus::Completed),
        other => Err(CoreError::wire(
            "session.status",
            format!("unknown status '{}'", other),
        )),
    }
}

fn parse_date(raw: &str) -> CoreResult<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive())
        .map_err(|_| {
            CoreError::wire(
                "session.operating_date",
                format!("'{}' is not a date", raw),
            )
        })
}

// =============================================================================
// Product Lookup
// =============================================================================

/// Parses the product-lookup response.
pub fn parse_lookup(value: &Value) -> CoreResult<LookupResult> {
    let obj = as_object(value, "lookup")?;
    let obj = match pick(obj, &["data"]) {
        Some(Value::Object(inner)) => inner,
        _ => obj,
    };

    let mut result = LookupResult::default();

    for product in list_field(obj, "products")? {
        let p = as_object(product, "lookup.products[]")?;
        result.products.push(ProductHit {
            id: id_field(p, &["id"], "lookup.products[].id")?,
            name: optional_text(p, &["name"]),
            barcode: optional_text(p, &["barcode"]),
        });
    }

    for variation in list_field(obj, "variations")? {
        let v = as_object(variation, "lookup.variations[]")?;
        result.variations.push(VariationHit {
            id: id_field(v, &["id"], "lookup.variations[].id")?,
            product_id: id_field(
                v,
                &["product_id", "productId"],
                "lookup.variations[].product_id",
            )?,
            barcode: optional_text(v, &["barcode"]),
        });
    }

    Ok(result)
}

// =============================================================================
// Field Helpers
// =============================================================================

fn as_object<'a>(value: &'a Value, field: &str) -> CoreResult<&'a Object> {
    value
        .as_object()
        .ok_or_else(|| CoreError::wire(field, "expected an object"))
}

/// First present key wins; also used to unwrap `data`/`items` envelopes.
fn pick<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

/// Identifiers arrive as strings or integers.
fn id_field(obj: &Object, keys: &[&str], field: &str) -> CoreResult<String> {
    match pick(obj, keys) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Some(_) => Err(CoreError::wire(field, "expected a string or integer id")),
        None => Err(CoreError::wire(field, "missing id")),
    }
}

fn optional_text(obj: &Object, keys: &[&str]) -> Option<String> {
    match pick(obj, keys) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Quantities arrive as integers, integral floats, or numeric strings.
fn quantity(value: &Value, field: &str) -> CoreResult<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(CoreError::wire(field, format!("{} is not a whole number", n))),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| CoreError::wire(field, format!("'{}' is not a whole number", s))),
        other => Err(CoreError::wire(
            field,
            format!("expected a number, got {}", type_name(other)),
        )),
    }
}

fn list_field<'a>(obj: &'a Object, key: &str) -> CoreResult<&'a [Value]> {
    match obj.get(key) {
        Some(Value::Array(list)) => Ok(list.as_slice()),
        Some(Value::Null) | None => Ok(&[]),
        Some(_) => Err(CoreError::wire(key, "expected an array")),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
