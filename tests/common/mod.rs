//! Shared helpers for integration tests
//!
//! `write_city_db` produces a tiny IPv4 MaxMind DB (GeoIP2-City layout) with a
//! single network, so lookups can be tested without shipping a GeoLite2 file.

use std::fs;
use std::path::Path;

const METADATA_MARKER: &[u8] = b"\xab\xcd\xefMaxMind.com";
const DATA_SECTION_SEPARATOR: [u8; 16] = [0; 16];

/// Location stored for the single network of a test database
pub struct CityFixture<'a> {
    pub country: &'a str,
    pub iso_code: &'a str,
    pub city: &'a str,
    pub latitude: f64,
    pub longitude: f64,
}

pub const LONDON: CityFixture<'static> = CityFixture {
    country: "United Kingdom",
    iso_code: "GB",
    city: "London",
    latitude: 51.5142,
    longitude: -0.0931,
};

enum Value<'a> {
    Str(&'a str),
    Double(f64),
    U16(u16),
    U32(u32),
    U64(u64),
    Map(Vec<(&'a str, Value<'a>)>),
    Array(Vec<Value<'a>>),
}

fn control(out: &mut Vec<u8>, type_num: u8, size: usize) {
    assert!(size < 29, "value too large for the fixture encoder");
    if type_num <= 7 {
        out.push((type_num << 5) | size as u8);
    } else {
        // Extended types: zero type bits, then the type offset byte
        out.push(size as u8);
        out.push(type_num - 7);
    }
}

fn encode(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Str(s) => {
            control(out, 2, s.len());
            out.extend_from_slice(s.as_bytes());
        }
        Value::Double(d) => {
            control(out, 3, 8);
            out.extend_from_slice(&d.to_be_bytes());
        }
        Value::U16(n) => {
            control(out, 5, 2);
            out.extend_from_slice(&n.to_be_bytes());
        }
        Value::U32(n) => {
            control(out, 6, 4);
            out.extend_from_slice(&n.to_be_bytes());
        }
        Value::Map(entries) => {
            control(out, 7, entries.len());
            for (key, value) in entries {
                encode(out, &Value::Str(key));
                encode(out, value);
            }
        }
        Value::U64(n) => {
            control(out, 9, 8);
            out.extend_from_slice(&n.to_be_bytes());
        }
        Value::Array(items) => {
            control(out, 11, items.len());
            for item in items {
                encode(out, item);
            }
        }
    }
}

fn names(name: &str) -> Value<'_> {
    Value::Map(vec![("en", Value::Str(name))])
}

/// Write a database where every address in `network/prefix_len` resolves to
/// `fixture` and every other IPv4 address is absent.
pub fn write_city_db(path: &Path, network: [u8; 4], prefix_len: usize, fixture: &CityFixture) {
    assert!((1..=32).contains(&prefix_len));

    let node_count = prefix_len as u32;
    // Record values above node_count point into the data section
    let data_pointer = node_count + DATA_SECTION_SEPARATOR.len() as u32;

    let mut db = Vec::new();
    for depth in 0..prefix_len {
        let bit = (network[depth / 8] >> (7 - depth % 8)) & 1;
        let next = if depth + 1 == prefix_len {
            data_pointer
        } else {
            depth as u32 + 1
        };
        let (left, right) = if bit == 0 {
            (next, node_count)
        } else {
            (node_count, next)
        };
        // 24-bit records
        db.extend_from_slice(&left.to_be_bytes()[1..]);
        db.extend_from_slice(&right.to_be_bytes()[1..]);
    }

    db.extend_from_slice(&DATA_SECTION_SEPARATOR);

    let record = Value::Map(vec![
        ("city", Value::Map(vec![("names", names(fixture.city))])),
        (
            "country",
            Value::Map(vec![
                ("iso_code", Value::Str(fixture.iso_code)),
                ("names", names(fixture.country)),
            ]),
        ),
        (
            "location",
            Value::Map(vec![
                ("latitude", Value::Double(fixture.latitude)),
                ("longitude", Value::Double(fixture.longitude)),
            ]),
        ),
    ]);
    encode(&mut db, &record);

    let metadata = Value::Map(vec![
        ("binary_format_major_version", Value::U16(2)),
        ("binary_format_minor_version", Value::U16(0)),
        ("build_epoch", Value::U64(1_700_000_000)),
        ("database_type", Value::Str("GeoIP2-City")),
        (
            "description",
            Value::Map(vec![("en", Value::Str("peerwatch test database"))]),
        ),
        ("ip_version", Value::U16(4)),
        ("languages", Value::Array(vec![Value::Str("en")])),
        ("node_count", Value::U32(node_count)),
        ("record_size", Value::U16(24)),
    ]);
    db.extend_from_slice(METADATA_MARKER);
    encode(&mut db, &metadata);

    fs::write(path, db).unwrap();
}
