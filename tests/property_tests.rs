//! Property-based tests for rust_structured_logger using proptest

use proptest::prelude::*;
use rust_structured_logger::prelude::*;

fn json_logger(sink: &BufferSink) -> Logger {
    Logger::builder()
        .min_level(Level::TRACE)
        .writer(JsonWriterConfig::new(sink.clone()))
        .build()
}

fn parse_record(sink: &BufferSink) -> serde_json::Value {
    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    serde_json::from_str(&lines[0]).expect("record is valid JSON")
}

fn standard_level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::TRACE),
        Just(Level::DEBUG),
        Just(Level::INFO),
        Just(Level::WARN),
        Just(Level::ERROR),
        Just(Level::FATAL),
    ]
}

fn scalar_attrib() -> impl Strategy<Value = Attrib> {
    let key = "[a-z]{1,8}";
    prop_oneof![
        key.prop_map(Attrib::nil),
        (key, any::<bool>()).prop_map(|(k, v)| Attrib::bool(k, v)),
        (key, any::<i64>()).prop_map(|(k, v)| Attrib::int(k, v)),
        (key, any::<u64>()).prop_map(|(k, v)| Attrib::uint(k, v)),
        (key, any::<f64>()).prop_map(|(k, v)| Attrib::float(k, v)),
        (key, any::<String>()).prop_map(|(k, v)| Attrib::string(k, v)),
        (key, any::<[u8; 16]>()).prop_map(|(k, v)| Attrib::uuid(k, v)),
        (key, prop::collection::vec(any::<i64>(), 0..5)).prop_map(|(k, v)| Attrib::ints(k, v)),
        (key, prop::collection::vec(".*", 0..5)).prop_map(|(k, v)| Attrib::strings(k, &v)),
    ]
}

fn attribs() -> impl Strategy<Value = Attribs> {
    prop::collection::vec(scalar_attrib(), 0..8).prop_map(Attribs::from)
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// Standard level names resolve back to their level, in any case
    #[test]
    fn test_level_name_roundtrip(level in standard_level(), upper in any::<bool>()) {
        let levels = Levels::default();
        let name = levels.name(level).into_owned();
        let name = if upper { name } else { name.to_lowercase() };
        prop_assert_eq!(levels.level_of_name(&name).unwrap(), level);
    }

    /// Threshold filtering agrees with level ordering
    #[test]
    fn test_threshold_matches_ordering(threshold in any::<i8>(), level in any::<i8>()) {
        let filter = LevelThreshold(Level(threshold));
        let ctx = LogContext::new();
        prop_assert_eq!(filter.is_active(&ctx, Level(level)), level >= threshold);
    }
}

// ============================================================================
// Record Encoding Tests
// ============================================================================

proptest! {
    /// Arbitrary message text and string values always produce one valid JSON line
    #[test]
    fn test_string_fields_stay_valid_json(text in ".*", key in "[a-z_]{1,10}", value in ".*") {
        prop_assume!(!["time", "level", "message"].contains(&key.as_str()));
        let sink = BufferSink::new();
        json_logger(&sink).info(&text).str(&key, &value).log();

        let record = parse_record(&sink);
        prop_assert_eq!(record["message"].as_str(), Some(text.as_str()));
        prop_assert_eq!(record[key.as_str()].as_str(), Some(value.as_str()));
    }

    /// Numeric fields survive encoding, non-finite floats become strings
    #[test]
    fn test_numeric_fields(i in any::<i64>(), u in any::<u64>(), f in any::<f64>()) {
        let sink = BufferSink::new();
        json_logger(&sink).info("n").int("i", i).uint("u", u).float("f", f).log();

        let record = parse_record(&sink);
        prop_assert_eq!(record["i"].as_i64(), Some(i));
        prop_assert_eq!(record["u"].as_u64(), Some(u));
        if f.is_finite() {
            let parsed = record["f"].as_f64().unwrap();
            prop_assert!((parsed - f).abs() <= f.abs() * 1e-15 + f64::MIN_POSITIVE, "{} != {}", parsed, f);
        } else {
            prop_assert!(record["f"].is_string());
        }
    }

    /// Each key appears once per record, holding its first value
    #[test]
    fn test_first_value_wins(values in prop::collection::vec(any::<i64>(), 1..10)) {
        let sink = BufferSink::new();
        let mut msg = json_logger(&sink).info("dups");
        for v in &values {
            msg = msg.int("k", *v);
        }
        msg.log();

        let line = sink.contents();
        prop_assert_eq!(line.matches("\"k\":").count(), 1);
        prop_assert_eq!(parse_record(&sink)["k"].as_i64(), Some(values[0]));
    }

    /// A set of attribs appended to an object is always valid JSON
    #[test]
    fn test_append_json_is_valid(set in attribs()) {
        let mut buf = b"{".to_vec();
        for attrib in set.iter() {
            attrib.append_json(&mut buf);
        }
        if buf.last() == Some(&b',') {
            buf.pop();
        }
        buf.push(b'}');
        let parsed = serde_json::from_slice::<serde_json::Value>(&buf);
        prop_assert!(parsed.is_ok(), "invalid JSON: {}", String::from_utf8_lossy(&buf));
    }
}

// ============================================================================
// Attribs Merge Tests
// ============================================================================

proptest! {
    /// `append_unique` keeps every entry of the receiver, then adds only new keys
    #[test]
    fn test_append_unique_receiver_wins(child in attribs(), parent in attribs()) {
        let merged = child.append_unique(&parent);

        for (i, attrib) in child.iter().enumerate() {
            prop_assert_eq!(merged.iter().nth(i), Some(attrib));
        }
        for attrib in parent.iter() {
            prop_assert!(merged.has(attrib.key()));
            if child.has(attrib.key()) {
                prop_assert_eq!(merged.get(attrib.key()), child.get(attrib.key()));
            }
        }
        prop_assert!(merged.len() <= child.len() + parent.len());
    }

    /// Merging a set into itself changes nothing
    #[test]
    fn test_append_unique_idempotent(set in attribs()) {
        let merged = set.append_unique(&set);
        let keys = |a: &Attribs| a.iter().map(|x| x.key().to_string()).collect::<Vec<_>>();
        prop_assert_eq!(keys(&merged), keys(&set));
    }

    /// Clones are independent of the original
    #[test]
    fn test_clone_independence(set in attribs(), extra in scalar_attrib()) {
        let mut copy = set.clone();
        copy.push(extra);
        prop_assert_eq!(copy.len(), set.len() + 1);
    }

    /// Sub-logger fields win over the parent's, the parent's others are kept
    #[test]
    fn test_sub_logger_merge(parent_val in any::<i64>(), child_val in any::<i64>()) {
        let sink = BufferSink::new();
        let logger = Logger::builder()
            .writer(JsonWriterConfig::new(sink.clone()))
            .attrib(Attrib::int("shared", parent_val))
            .attrib(Attrib::int("parent_only", parent_val))
            .build();

        let child = logger.with().int("shared", child_val).sub_logger();
        child.info("x").log();

        let record = parse_record(&sink);
        prop_assert_eq!(record["shared"].as_i64(), Some(child_val));
        prop_assert_eq!(record["parent_only"].as_i64(), Some(parent_val));
    }
}
