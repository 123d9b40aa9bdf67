//! Integration tests for the structured logger
//!
//! These tests verify:
//! - Exact JSON Lines output
//! - Duplicate key suppression within a record
//! - Sub-logger and context field inheritance
//! - Level filtering without side effects
//! - Multi-writer fan-out and file output
//! - Struct field expansion and redaction

use chrono::{DateTime, TimeZone, Utc};
use rust_structured_logger::core::any::redact;
use rust_structured_logger::core::{AllLevelsActive, JoinLevelFilters, REDACTED};
use rust_structured_logger::prelude::*;
use serde::Serialize;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
}

fn json_writer(sink: &BufferSink) -> JsonWriterConfig {
    JsonWriterConfig::new(sink.clone()).with_custom_timestamp("%Y-%m-%d %H:%M:%S")
}

fn json_logger(sink: &BufferSink) -> Logger {
    Logger::builder().clock(fixed_clock).writer(json_writer(sink)).build()
}

fn parse_line(line: &str) -> serde_json::Value {
    serde_json::from_str(line).expect("record is valid JSON")
}

#[test]
fn test_exact_json_record() {
    let sink = BufferSink::new();
    let logger = json_logger(&sink);

    logger.info("hi").str("user", "alice").int("id", 7).log();

    assert_eq!(
        sink.contents(),
        "{\"time\":\"2006-01-02 15:04:05\",\"level\":\"INFO\",\"message\":\"hi\",\"user\":\"alice\",\"id\":7}\n"
    );
}

#[test]
fn test_duplicate_key_first_wins() {
    let sink = BufferSink::new();
    let logger = json_logger(&sink);

    logger.info("dup").str("x", "a").str("x", "b").ints("x", &[1, 2]).log();

    let line = sink.contents();
    assert!(line.contains(r#""x":"a""#));
    assert!(!line.contains(r#""x":"b""#));
    assert_eq!(line.matches("\"x\"").count(), 1);
    parse_line(line.trim_end());
}

#[test]
fn test_sub_logger_fields_come_first() {
    let sink = BufferSink::new();
    let logger = json_logger(&sink);

    let service_log = logger.with().str("service", "api").sub_logger();
    service_log.info("request").int("req", 1).log();

    let line = sink.contents();
    let service = line.find(r#""service":"api""#).expect("service field");
    let req = line.find(r#""req":1"#).expect("req field");
    assert!(service < req);
}

#[test]
fn test_sub_logger_child_wins() {
    let sink = BufferSink::new();
    let logger = Logger::builder()
        .clock(fixed_clock)
        .writer(json_writer(&sink))
        .attrib(Attrib::string("env", "prod"))
        .attrib(Attrib::string("region", "eu"))
        .build();

    let child = logger.with().str("env", "staging").sub_logger();
    child.info("deploy").str("env", "ignored").log();

    let record = parse_line(&sink.lines()[0]);
    assert_eq!(record["env"], "staging");
    assert_eq!(record["region"], "eu");

    // The parent is untouched
    logger.info("parent").log();
    let record = parse_line(&sink.lines()[1]);
    assert_eq!(record["env"], "prod");
}

#[test]
fn test_nil_uuid_is_null() {
    let sink = BufferSink::new();
    let logger = json_logger(&sink);

    logger.info("ids").uuid("id", &[0u8; 16]).log();
    assert!(sink.contents().contains(r#""id":null"#));
}

#[test]
fn test_uuid_field_and_any_uuid() {
    let sink = BufferSink::new();
    let logger = json_logger(&sink);
    let id = uuid::Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();

    logger
        .info("ids")
        .uuid("a", id.as_bytes())
        .any("b", &id)
        .any("c", &uuid::Uuid::nil())
        .log();

    let record = parse_line(&sink.lines()[0]);
    assert_eq!(record["a"], "67e55044-10b1-426f-9247-bb680e5fe0c8");
    assert_eq!(record["b"], "67e55044-10b1-426f-9247-bb680e5fe0c8");
    assert!(record["c"].is_null());
}

#[test]
fn test_inactive_level_writes_nothing() {
    let sink = BufferSink::new();
    let writer = json_writer(&sink);
    let config: Arc<JsonWriterConfig> = Arc::new(writer);
    let logger = Logger::builder()
        .min_level(Level::INFO)
        .shared_writer(config.clone())
        .build();

    let msg = logger.debug("hidden").str("k", "v");
    assert!(!msg.is_active());
    msg.log();

    assert!(sink.is_empty());
    assert_eq!(config.allocated_writers(), 0);
}

#[test]
fn test_nop_logger_is_safe() {
    let logger = Logger::nop();
    logger
        .error("ignored")
        .str("a", "b")
        .any("v", &vec![1, 2, 3])
        .struct_fields(&std::collections::BTreeMap::from([("k", 1)]))
        .log();

    let sub = logger.with().str("a", "b").sub_logger();
    assert!(sub.is_nop());
    assert!(sub.flush_underlying().is_ok());
}

#[test]
fn test_multi_writer_fan_out() {
    let json_sink = BufferSink::new();
    let text_sink = BufferSink::new();
    let logger = Logger::builder()
        .clock(fixed_clock)
        .writer(json_writer(&json_sink))
        .writer(TextWriterConfig::new(text_sink.clone()).with_custom_timestamp("%H:%M:%S"))
        .build();

    logger.warn("disk").uint("free_mb", 12u32).bool("critical", true).log();

    assert_eq!(
        json_sink.contents(),
        "{\"time\":\"2006-01-02 15:04:05\",\"level\":\"WARN\",\"message\":\"disk\",\"free_mb\":12,\"critical\":true}\n"
    );
    assert_eq!(text_sink.contents(), "15:04:05 |WARN| disk free_mb=12 critical=true\n");
}

#[test]
fn test_per_writer_level_filter() {
    let all = BufferSink::new();
    let errors_only = BufferSink::new();
    let logger = Logger::builder()
        .level_filter(AllLevelsActive)
        .writer(json_writer(&all))
        .writer(json_writer(&errors_only).with_level_filter(LevelThreshold(Level::ERROR)))
        .build();

    logger.debug("a").log();
    logger.error("b").log();

    assert_eq!(all.lines().len(), 2);
    assert_eq!(errors_only.lines().len(), 1);
    assert!(errors_only.contents().contains(r#""message":"b""#));
}

#[test]
fn test_context_attribs_and_filter() {
    let sink = BufferSink::new();
    // Debug records only for contexts that carry a trace id
    let debug_traced = |ctx: &LogContext, level: Level| {
        level >= Level::INFO || ctx.attribs().has("trace_id")
    };
    let logger = Logger::builder()
        .clock(fixed_clock)
        .level_filter(
            JoinLevelFilters::new(vec![Arc::new(LevelThreshold(Level::DEBUG)) as Arc<dyn LevelFilter>])
                .with(debug_traced),
        )
        .writer(json_writer(&sink))
        .build();

    let ctx = LogContext::new();
    logger.debug_ctx(&ctx, "plain").log();
    assert!(sink.is_empty());

    let (traced_log, traced_ctx) = logger
        .with()
        .str("trace_id", "t-1")
        .sub_logger_context(&ctx);
    logger.debug_ctx(&traced_ctx, "traced").log();
    traced_log.info("via logger").log();

    let lines = sink.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(parse_line(&lines[0])["trace_id"], "t-1");
    assert_eq!(parse_line(&lines[1])["trace_id"], "t-1");
}

#[test]
fn test_file_sink_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("records.jsonl");

    let sink = FileSink::new(&log_file).expect("Failed to create file sink");
    let logger = Logger::builder()
        .writer(JsonWriterConfig::new(sink))
        .build();

    for i in 0..10 {
        logger.info("entry").int("n", i).log();
    }
    logger.flush_underlying().expect("Failed to flush");

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 10);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(parse_line(line)["n"], i as i64);
    }
}

#[test]
fn test_log_injection_prevention() {
    let sink = BufferSink::new();
    let logger = Logger::builder()
        .writer(TextWriterConfig::new(sink.clone()))
        .build();

    logger
        .info("User login\nERROR Fake error injected")
        .str("note", "a\nb")
        .str("key\n2006-01-02 |ERROR| forged", "v")
        .strs("list\r\n", &["x"])
        .log();

    let content = sink.contents();
    assert_eq!(content.lines().count(), 1, "Log should be a single line");
    assert!(content.contains("\\n"));
    assert!(content.contains(" key\\n2006-01-02 |ERROR| forged=\"v\""));
    assert!(content.contains(" list\\r\\n=[\"x\"]"));
}

#[test]
fn test_builtin_keys_are_not_duplicated() {
    let sink = BufferSink::new();
    let logger = Logger::builder()
        .clock(fixed_clock)
        .writer(json_writer(&sink))
        .attrib(Attrib::string("level", "forged"))
        .build();

    logger
        .info("real")
        .str("message", "forged")
        .any("time", &0)
        .str("user", "alice")
        .log();

    let line = sink.contents();
    assert_eq!(
        line,
        "{\"time\":\"2006-01-02 15:04:05\",\"level\":\"INFO\",\"message\":\"real\",\"user\":\"alice\"}\n"
    );
    for key in ["\"time\"", "\"level\"", "\"message\""] {
        assert_eq!(line.matches(key).count(), 1, "{} repeated", key);
    }
}

#[derive(Serialize)]
struct Request {
    method: &'static str,
    path: String,
    #[serde(rename = "status_code")]
    status: u16,
    #[serde(serialize_with = "redact")]
    token: String,
    password: String,
}

#[test]
fn test_struct_fields_and_redaction() {
    let sink = BufferSink::new();
    let logger = json_logger(&sink);
    let req = Request {
        method: "GET",
        path: "/health".to_string(),
        status: 200,
        token: "abc".to_string(),
        password: "hunter2".to_string(),
    };

    logger
        .info("served")
        .tagged_struct_fields(&req, &["password"])
        .log();

    let record = parse_line(&sink.lines()[0]);
    assert_eq!(record["method"], "GET");
    assert_eq!(record["path"], "/health");
    assert_eq!(record["status_code"], 200);
    assert_eq!(record["token"], REDACTED);
    assert_eq!(record["password"], REDACTED);
    assert!(!sink.contents().contains("hunter2"));
}

#[test]
fn test_any_composites_and_invalid_json() {
    let sink = BufferSink::new();
    let logger = json_logger(&sink);

    logger
        .info("mixed")
        .any("point", &serde_json::json!({"x": 1, "y": 2}))
        .any("tags", &["a", "b"])
        .json("raw", "  {\"ok\": true} ")
        .json("broken", "{not json")
        .json("empty", "")
        .log();

    let record = parse_line(&sink.lines()[0]);
    assert_eq!(record["point"]["x"], 1);
    assert_eq!(record["tags"], serde_json::json!(["a", "b"]));
    assert_eq!(record["raw"], serde_json::json!({"ok": true}));
    assert!(record["broken"].is_string());
    assert!(record["empty"].is_null());
}

#[test]
fn test_custom_levels_and_names() {
    let sink = BufferSink::new();
    let notice = Level(5);
    let logger = Logger::builder()
        .clock(fixed_clock)
        .levels(Levels::new().with_name(notice, "NOTICE"))
        .writer(json_writer(&sink))
        .build();

    logger.new_message(notice, "custom").log();
    logger.new_message(Level(7), "unnamed").log();

    let lines = sink.lines();
    assert_eq!(parse_line(&lines[0])["level"], "NOTICE");
    assert_eq!(parse_line(&lines[1])["level"], "7");
}

#[test]
fn test_shorthands_follow_levels_table() {
    let sink = BufferSink::new();
    let notice = Level(5);
    let mut levels = Levels::new().with_name(notice, "NOTICE");
    levels.info = notice;
    let logger = Logger::builder()
        .clock(fixed_clock)
        .levels(levels)
        .min_level(notice)
        .writer(json_writer(&sink))
        .build();

    assert!(logger.info("hi").is_active());
    logger.info("hi").log();
    rust_structured_logger::info!(logger, "via {}", "macro").log();
    logger.warn("warned").log();

    let lines = sink.lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(parse_line(&lines[0])["level"], "NOTICE");
    assert_eq!(parse_line(&lines[1])["message"], "via macro");
    assert_eq!(parse_line(&lines[1])["level"], "NOTICE");
    assert_eq!(parse_line(&lines[2])["level"], "WARN");
}
