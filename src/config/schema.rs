use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "target": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "url": { "type": "string", "minLength": 1 },
                    "targets_file": { "type": "string" },
                    "method": { "type": "string", "enum": ["GET", "POST", "PUT", "get", "post", "put"] },
                    "data": { "type": "string" },
                    "cookie": { "type": "string" },
                    "headers": { "type": "array", "items": { "$ref": "#/$defs/header" } },
                    "test_parameter": { "type": "array", "items": { "type": "string" } },
                    "direct": { "type": "boolean" },
                    "dbms": { "type": "string" }
                }
            },
            "session": {
                "type": "object",
                "properties": {
                    "file": { "type": "string" },
                    "flush": { "type": "boolean" }
                }
            },
            "output": {
                "type": "object",
                "properties": {
                    "directory": { "type": "string" },
                    "xml_file": { "type": "string" }
                }
            },
            "enumeration": {
                "type": "object",
                "properties": {
                    "dump_table": { "type": "boolean" },
                    "dump_all": { "type": "boolean" },
                    "search": { "type": "boolean" }
                }
            },
            "files": {
                "type": "object",
                "properties": {
                    "read": { "type": "string" },
                    "write": { "type": "string" }
                }
            }
        },
        "$defs": {
            "header": {
                "type": "object",
                "required": ["name", "value"],
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "value": { "type": "string" }
                }
            }
        }
    })
});
