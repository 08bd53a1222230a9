//! Shared fixtures for node tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use glomers_id::{MachineId, SnowflakeGenerator};
use serde_json::{Value, json};

use crate::Node;

/// In-memory output stream whose contents stay readable after the node
/// takes ownership of a clone.
#[derive(Debug, Default, Clone)]
pub(crate) struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Decodes every line written so far.
    pub(crate) fn replies(&self) -> Vec<Value> {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(|line| serde_json::from_str(line).expect("reply is valid JSON"))
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builds a node with no handlers writing into `output`.
pub(crate) fn test_node(output: &SharedBuffer) -> Node {
    Node::new(SnowflakeGenerator::new(MachineId::new(1)), output.clone())
}

/// Serialises a request envelope as one input line.
pub(crate) fn request_line(src: &str, dest: &str, body: Value) -> String {
    let mut line = json!({"src": src, "dest": dest, "body": body}).to_string();
    line.push('\n');
    line
}

/// A well-formed handshake for `node_id` within `peers`.
pub(crate) fn init_line(msg_id: u64, node_id: &str, peers: &[&str]) -> String {
    request_line(
        "c0",
        node_id,
        json!({"type": "init", "msg_id": msg_id, "node_id": node_id, "node_ids": peers}),
    )
}
