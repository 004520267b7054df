//! Event records as extracted by the model.
//!
//! Records are deliberately lenient: every field may be missing or `null`,
//! and a value of the wrong shape (prices as a list, performers as a single
//! string, ...) is kept verbatim in `extra` under its original key instead
//! of failing the record. Unrecognised keys land in `extra` too, so a record
//! serializes back to what the model sent.

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Keys the model is asked to produce.
pub const RECORD_KEYS: [&str; 7] = [
    "title",
    "date",
    "time",
    "venue",
    "ticket_prices",
    "performers",
    "additional_info",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRecord {
    pub title: String,
    /// `YYYY-MM-DD` when the model follows instructions.
    pub date: String,
    /// `HH:MM` when the model follows instructions.
    pub time: String,
    pub venue: Venue,
    pub ticket_prices: BTreeMap<String, Value>,
    pub performers: Vec<String>,
    pub additional_info: Option<String>,
    /// Unknown keys, and known keys whose value had an unexpected shape.
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for EventRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::<String, Value>::deserialize(deserializer)?;
        Ok(EventRecord {
            title: take(&mut extra, "title"),
            date: take(&mut extra, "date"),
            time: take(&mut extra, "time"),
            venue: take(&mut extra, "venue"),
            ticket_prices: take(&mut extra, "ticket_prices"),
            performers: take(&mut extra, "performers"),
            additional_info: take(&mut extra, "additional_info"),
            extra,
        })
    }
}

/// Remove `key` and decode it as `T`. `null` gives the default; a value that
/// does not fit `T` goes back into `map` untouched.
fn take<T: DeserializeOwned + Default>(map: &mut Map<String, Value>, key: &str) -> T {
    match map.remove(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => match T::deserialize(&value) {
            Ok(typed) => typed,
            Err(_) => {
                map.insert(key.to_string(), value);
                T::default()
            }
        },
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        // A raw value kept in `extra` takes the place of the typed default.
        let typed = |key: &str| !self.extra.contains_key(key);

        if typed("title") {
            map.serialize_entry("title", &self.title)?;
        }
        if typed("date") {
            map.serialize_entry("date", &self.date)?;
        }
        if typed("time") {
            map.serialize_entry("time", &self.time)?;
        }
        if typed("venue") {
            map.serialize_entry("venue", &self.venue)?;
        }
        if typed("ticket_prices") {
            map.serialize_entry("ticket_prices", &self.ticket_prices)?;
        }
        if typed("performers") {
            map.serialize_entry("performers", &self.performers)?;
        }
        if let Some(info) = self.additional_info.as_ref().filter(|_| typed("additional_info")) {
            map.serialize_entry("additional_info", info)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Venue {
    pub name: String,
    pub address: String,
}

// Models sometimes answer with a bare venue name instead of an object.
impl<'de> Deserialize<'de> for Venue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Fields {
            #[serde(default, deserialize_with = "null_as_default")]
            name: String,
            #[serde(default, deserialize_with = "null_as_default")]
            address: String,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Name(String),
            Fields(Fields),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::Name(name) => Venue {
                name,
                address: String::new(),
            },
            Shape::Fields(f) => Venue {
                name: f.name,
                address: f.address,
            },
        })
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_record_deserializes() {
        let rec: EventRecord = serde_json::from_value(json!({
            "title": "Jazz Night",
            "date": "2024-05-01",
            "time": "20:00",
            "venue": {"name": "Blue Note", "address": "131 W 3rd St"},
            "ticket_prices": {"General": 35, "VIP": "$80"},
            "performers": ["Trio A"],
            "additional_info": "21+"
        }))
        .unwrap();

        assert_eq!(rec.title, "Jazz Night");
        assert_eq!(rec.venue.name, "Blue Note");
        assert_eq!(rec.ticket_prices["General"], json!(35));
        assert_eq!(rec.ticket_prices["VIP"], json!("$80"));
        assert_eq!(rec.performers, ["Trio A"]);
        assert_eq!(rec.additional_info.as_deref(), Some("21+"));
        assert!(rec.extra.is_empty());
    }

    #[test]
    fn missing_and_null_fields_default() {
        let rec: EventRecord =
            serde_json::from_value(json!({"title": "Jazz Night", "venue": null, "performers": null}))
                .unwrap();
        assert_eq!(rec.title, "Jazz Night");
        assert_eq!(rec.venue, Venue::default());
        assert!(rec.performers.is_empty());
        assert!(rec.ticket_prices.is_empty());
        assert_eq!(rec.additional_info, None);
        assert!(rec.extra.is_empty());
    }

    #[test]
    fn bare_venue_names_are_accepted() {
        let rec: EventRecord = serde_json::from_value(json!({"venue": "Warehouse 9"})).unwrap();
        assert_eq!(rec.venue.name, "Warehouse 9");
        assert_eq!(rec.venue.address, "");
    }

    #[test]
    fn unexpected_shapes_are_kept_raw() {
        let input = json!({
            "title": "Rave",
            "ticket_prices": [{"category": "GA", "price": 30}],
            "performers": "DJ One, DJ Two",
            "date": 20240501
        });
        let rec: EventRecord = serde_json::from_value(input.clone()).unwrap();

        assert_eq!(rec.title, "Rave");
        assert!(rec.ticket_prices.is_empty());
        assert!(rec.performers.is_empty());
        assert_eq!(rec.extra["ticket_prices"], json!([{"category": "GA", "price": 30}]));
        assert_eq!(rec.extra["performers"], json!("DJ One, DJ Two"));

        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back["ticket_prices"], input["ticket_prices"]);
        assert_eq!(back["performers"], input["performers"]);
        assert_eq!(back["date"], json!(20240501));
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let input = json!({"title": "Rave", "url": "https://tickets.example/rave"});
        let rec: EventRecord = serde_json::from_value(input).unwrap();
        assert_eq!(rec.extra["url"], json!("https://tickets.example/rave"));

        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back["url"], json!("https://tickets.example/rave"));
        assert!(back.get("additional_info").is_none());
    }

    #[test]
    fn serialization_starts_with_the_title() {
        let rec = EventRecord {
            title: "Jazz Night".into(),
            ..EventRecord::default()
        };
        let text = serde_json::to_string(&rec).unwrap();
        assert!(text.starts_with(r#"{"title":"Jazz Night","date":"""#));
    }
}
