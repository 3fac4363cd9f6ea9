use chrono::NaiveDateTime;
use pipekit_envelope::{
    decode, encode, fanout, prepare_incoming, send, Envelope, MemoryDestination,
};
use serde_json::{json, Value};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

fn is_timestamp(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|raw| NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).is_ok())
}

#[test]
fn stamped_envelope_wire_shape() {
    let envelope = prepare_incoming("ingest", Envelope::new(json!({ "upc": "008811234567" })));
    let wire: Value = decode(&encode(&envelope).unwrap()).unwrap();

    assert!(wire["job_id"].is_string());
    assert_eq!(wire["ancestor_ids"], json!([]));
    assert!(is_timestamp(&wire["originated_at"]));
    assert_eq!(wire["message"], json!({ "upc": "008811234567" }));

    let event = &wire["events"][0];
    assert_eq!(event["app"], "ingest");
    assert!(event["event_id"].is_string());
    assert!(is_timestamp(&event["received_at"]));
    assert!(event.get("updated_at").is_none());
}

#[test]
fn sent_envelope_carries_updated_at() {
    let envelope = prepare_incoming("ingest", Envelope::new(json!(null)));
    let mut destination = MemoryDestination::new();
    send(envelope, &mut destination, None).unwrap();

    let wire: Value = decode(&destination.last_sent().unwrap().payload).unwrap();
    assert!(is_timestamp(&wire["events"][0]["updated_at"]));
}

#[test]
fn timestamps_sort_with_event_order() {
    let first = prepare_incoming("a", Envelope::new(json!(1)));
    let second = prepare_incoming("b", first);
    let wire: Value = decode(&encode(&second).unwrap()).unwrap();

    let received: Vec<&str> = wire["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["received_at"].as_str().unwrap())
        .collect();
    assert!(received[0] <= received[1]);
    assert!(wire["originated_at"].as_str().unwrap() <= received[0]);
}

#[test]
fn decode_encode_preserves_foreign_envelopes() {
    let raw = json!({
        "job_id": "5d9f1e1a-0000-4000-8000-000000000001",
        "ancestor_ids": ["5d9f1e1a-0000-4000-8000-000000000000"],
        "originated_at": "2016-03-01T10:00:00.000000",
        "events": [
            {
                "app": "ftp-watcher",
                "event_id": "e-1",
                "received_at": "2016-03-01T10:00:00.000000",
                "updated_at": "2016-03-01T10:00:01.500000"
            }
        ],
        "message": { "amw_key": "A1" },
        "trace": { "sampled": true }
    });

    let envelope: Envelope = serde_json::from_value(raw.clone()).unwrap();
    let wire: Value = decode(&encode(&envelope).unwrap()).unwrap();
    assert_eq!(wire, raw);
}

#[test]
fn fanout_children_are_distinct_jobs() {
    let parent = prepare_incoming("splitter", Envelope::new(json!({ "tracks": [1, 2, 3] })));
    let children: Vec<_> = (0..3).map(|_| fanout(&parent)).collect();

    for child in &children {
        assert_eq!(child.ancestor_ids, vec![parent.job_id.clone()]);
    }
    assert_ne!(children[0].job_id, children[1].job_id);
    assert_ne!(children[1].job_id, children[2].job_id);
}

#[test]
fn upstream_timestamps_pass_through_a_stage_untouched() {
    let raw = json!({
        "job_id": "5d9f1e1a-0000-4000-8000-000000000002",
        "originated_at": "2016-03-01",
        "events": [
            {
                "app": "ftp-watcher",
                "received_at": "2016-03-01T12:30:05+02:00",
                "updated_at": "2016-03-01T12:30:05.123456789"
            }
        ],
        "message": { "amw_key": "A2" }
    });
    let envelope: Envelope = decode(raw.to_string().as_bytes()).unwrap();
    let envelope = prepare_incoming("ingest", envelope);

    let mut destination = MemoryDestination::new();
    send(envelope, &mut destination, None).unwrap();
    let wire: Value = decode(&destination.last_sent().unwrap().payload).unwrap();

    assert_eq!(wire["originated_at"], "2016-03-01");
    assert_eq!(wire["events"][0], raw["events"][0]);
    assert!(is_timestamp(&wire["events"][1]["received_at"]));
    assert!(is_timestamp(&wire["events"][1]["updated_at"]));
}
