use super::*;

#[test]
fn memory_sink_keeps_order_and_last_value() {
    let sink = MemoryEventSink::new();
    sink.emit(MonitorEvent::new("file/video/width", 1920u32));
    sink.emit(MonitorEvent::new("file/video/field", "upper"));
    sink.emit(MonitorEvent::new("file/video/width", 1280u32));

    assert_eq!(sink.events().len(), 3);
    assert_eq!(sink.last("file/video/width"), Some(EventValue::Int(1280)));
    assert_eq!(
        sink.last("file/video/field"),
        Some(EventValue::Str("upper".to_string()))
    );
    assert_eq!(sink.last("file/video/codec"), None);

    assert_eq!(sink.take().len(), 3);
    assert!(sink.events().is_empty());
}

#[test]
fn values_serialize_untagged() {
    let json = serde_json::to_string(&MonitorEvent::new("a/b", 0.5)).unwrap();
    assert_eq!(json, r#"{"path":"a/b","value":0.5}"#);
    assert_eq!(EventValue::from("x").to_string(), "x");
    assert_eq!(EventValue::from(-3i64).to_string(), "-3");
}

#[test]
fn null_and_tracing_sinks_accept_events() {
    NullEventSink.emit(MonitorEvent::new("x", 1i64));
    TracingEventSink.emit(MonitorEvent::new("x", 1i64));
}
