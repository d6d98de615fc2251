// Tests for output formatting
//
// A shared buffer stands in for stdout so the rendered text can be checked.

use super::*;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, quiet, Box::new(buffer.clone()));
    (writer, buffer)
}

fn user(id: u64, name: &str) -> User {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "address": {
            "street": "Main", "suite": "1", "city": "Town", "zipcode": "0",
            "geo": {"lat": "0", "lng": "0"}
        },
        "phone": "555",
        "website": "example.com",
        "company": {"name": "Acme", "catchPhrase": "Things", "bs": "stuff"}
    }))
    .unwrap()
}

#[test]
fn test_users_table_human() {
    let (mut out, buffer) = writer(OutputFormat::Human, false);
    out.users_table(&[user(1, "Ada"), user(12, "Grace")]).unwrap();

    let text = buffer.contents();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("ID │ Name"));
    assert!(lines[1].contains("─┼─"));
    assert!(lines[2].starts_with("1  │ Ada"));
    assert!(lines[3].contains("grace@example.com"));
}

#[test]
fn test_table_skipped_for_machine_formats() {
    let (mut out, buffer) = writer(OutputFormat::Json, false);
    out.users_table(&[user(1, "Ada")]).unwrap();
    out.info("hidden").unwrap();
    assert!(buffer.contents().is_empty());
}

#[test]
fn test_data_json() {
    let (mut out, buffer) = writer(OutputFormat::Json, false);
    out.data(&serde_json::json!({"status": 200})).unwrap();
    assert_eq!(buffer.contents(), "{\"status\":200}\n");
}

#[test]
fn test_data_yaml() {
    let (mut out, buffer) = writer(OutputFormat::Yaml, false);
    out.data(&serde_json::json!({"status": 200})).unwrap();
    assert_eq!(buffer.contents(), "status: 200\n");
}

#[test]
fn test_quiet_suppresses_messages_but_not_warnings() {
    let (mut out, buffer) = writer(OutputFormat::Human, true);
    out.info("info").unwrap();
    out.success("done").unwrap();
    out.warning("careful").unwrap();
    assert_eq!(buffer.contents(), "WARNING: careful\n");
}
