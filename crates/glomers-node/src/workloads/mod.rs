//! Workload handlers bundled with the node binary.
//!
//! | Tag | Reply | Behaviour |
//! |---|---|---|
//! | `echo` | `echo_ok` | returns every body field unchanged |
//! | `generate` | `generate_ok` | returns a fresh cluster-unique `id` |
//! | `broadcast` | `broadcast_ok` | records the integer `message` |
//! | `read` | `read_ok` | returns every recorded message |
//! | `topology` | `topology_ok` | acknowledges the suggested topology |
//!
//! Broadcast values are kept in memory on the receiving node only.

mod broadcast;
mod echo;
mod unique_ids;

pub use broadcast::{Broadcast, BroadcastLog, Read, Topology};
pub use echo::Echo;
pub use unique_ids::Generate;

use crate::dispatch::Node;

/// Registers every bundled workload on `node`.
pub fn register_all(node: &mut Node) {
    let log = BroadcastLog::default();
    node.register(echo::ECHO_TYPE, Echo)
        .register(unique_ids::GENERATE_TYPE, Generate)
        .register(broadcast::BROADCAST_TYPE, Broadcast::new(log.clone()))
        .register(broadcast::READ_TYPE, Read::new(log))
        .register(broadcast::TOPOLOGY_TYPE, Topology);
}
