//! # Demo Fabric
//!
//! Seeds an `InMemoryFabric` with synthetic stand-ins for the remote
//! services so the console can be exercised without a broker: a
//! host-response service answering the paged search protocol over a fixed
//! process table, an endpoint-management service answering `system.find`,
//! and a background publisher emitting telemetry and reputation-change
//! events.

use fabric_bus::topics::{
    SERVICE_ENDPOINT_MGMT, SERVICE_HOST_RESPONSE, TOPIC_FILE_FIRST_INSTANCE,
    TOPIC_FILE_REP_CHANGE,
};
use fabric_bus::{InMemoryFabric, ServiceError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Process names the demo host "runs", unsorted on purpose so the sort
/// parameters visibly matter.
const DEMO_PROCESSES: [&str; 7] = [
    "systemd", "sshd", "nginx", "postgres", "cron", "agetty", "rsyslogd",
];

/// Build a fabric with both demo services registered.
#[must_use]
pub fn demo_fabric() -> Arc<InMemoryFabric> {
    let fabric = Arc::new(InMemoryFabric::new());
    fabric.register_service(SERVICE_HOST_RESPONSE, Arc::new(host_response_service));
    fabric.register_service(SERVICE_ENDPOINT_MGMT, Arc::new(endpoint_mgmt_service));
    fabric
}

/// Paged search over the fixed process table.
fn host_response_service(operation: &str, params: &Value) -> Result<Value, ServiceError> {
    match operation {
        "create" => Ok(json!({
            "searchId": "demo-search",
            "resultCount": DEMO_PROCESSES.len(),
        })),
        "getResults" => {
            let offset = params["offset"].as_u64().unwrap_or(0) as usize;
            let limit = params["limit"].as_u64().unwrap_or(0) as usize;
            let descending = params["sortDirection"].as_str() == Some("desc");

            let mut names: Vec<&str> = DEMO_PROCESSES.to_vec();
            names.sort_unstable();
            if descending {
                names.reverse();
            }

            let end = (offset + limit).min(names.len());
            let items: Vec<Value> = names
                .get(offset..end)
                .unwrap_or(&[])
                .iter()
                .map(|name| json!({ "output": { "Processes|name": name } }))
                .collect();
            Ok(json!({ "items": items }))
        }
        other => Err(ServiceError::new(
            -32601,
            format!("unknown host-response operation: {other}"),
        )),
    }
}

/// Free-text find over a synthetic system inventory.
fn endpoint_mgmt_service(operation: &str, params: &Value) -> Result<Value, ServiceError> {
    if operation != "system.find" {
        return Err(ServiceError::new(
            -32601,
            format!("unknown endpoint-mgmt operation: {operation}"),
        ));
    }
    let needle = params["searchText"].as_str().unwrap_or("").to_lowercase();
    let inventory = [
        ("WKS-042", "workstation", "10.0.4.2"),
        ("SRV-DB-01", "server", "10.0.1.10"),
        ("LAPTOP-MK", "laptop", "10.0.7.33"),
    ];
    let systems: Vec<Value> = inventory
        .iter()
        .filter(|(name, kind, _)| {
            needle.is_empty()
                || name.to_lowercase().contains(&needle)
                || kind.contains(&needle)
        })
        .map(|(name, kind, ip)| json!({ "name": name, "kind": kind, "ip": ip }))
        .collect();
    Ok(json!({ "total": systems.len(), "systems": systems }))
}

/// A reputation-change payload in the threat-intelligence wire schema,
/// arrays long enough to carry every contract slot.
#[must_use]
pub fn demo_reputation_payload() -> Vec<u8> {
    let reputations = |levels: [i64; 6]| -> Value {
        json!(levels
            .iter()
            .map(|l| json!({ "trustLevel": l }))
            .collect::<Vec<_>>())
    };
    json!({
        "hashes": {
            "md5": "d41d8cd98f00b204e9800998ecf8427e",
            "sha1": "da39a3ee5e6b4b0d3255bfef95601890afd80709",
            "sha256": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        "oldReputations": reputations([0, 50, 0, 70, 0, 30]),
        "newReputations": reputations([0, 85, 0, 99, 0, 15]),
    })
    .to_string()
    .into_bytes()
}

/// Emit a telemetry event and a reputation change on a fixed interval until
/// the fabric disconnects.
pub fn spawn_demo_publisher(fabric: Arc<InMemoryFabric>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let mut sequence = 0u64;
        loop {
            ticker.tick().await;
            if !fabric.is_connected() {
                debug!("Demo publisher stopping (fabric disconnected)");
                break;
            }
            sequence += 1;

            let telemetry = format!("demo first-instance event #{sequence}");
            let _ = fabric
                .publish_event(TOPIC_FILE_FIRST_INSTANCE, telemetry.into_bytes())
                .await;
            let _ = fabric
                .publish_event(TOPIC_FILE_REP_CHANGE, demo_reputation_payload())
                .await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_response_sorted_window() {
        let page = host_response_service(
            "getResults",
            &json!({ "offset": 0, "limit": 3, "sortBy": "Processes|name", "sortDirection": "asc" }),
        )
        .unwrap();
        let names: Vec<&str> = page["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["output"]["Processes|name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["agetty", "cron", "nginx"]);
    }

    #[test]
    fn test_endpoint_mgmt_filters() {
        let result = endpoint_mgmt_service("system.find", &json!({ "searchText": "laptop" }))
            .unwrap();
        assert_eq!(result["total"], 1);
        assert_eq!(result["systems"][0]["name"], "LAPTOP-MK");
    }

    #[test]
    fn test_demo_reputation_payload_normalizes() {
        let record = fabric_events::decode_reputation_change(&demo_reputation_payload()).unwrap();
        assert_eq!(record.changes.len(), 3);
    }
}
