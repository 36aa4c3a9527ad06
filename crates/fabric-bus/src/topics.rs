//! # Topic and Service Identifiers
//!
//! The fixed topic strings the console subscribes to and the service ids it
//! issues requests against. Topics are fabric-wide contracts; changing one
//! here without the services following is a silent subscription to nothing.

/// File reputation changes from the threat-intelligence service.
pub const TOPIC_FILE_REP_CHANGE: &str = "/fabric/event/intel/file/repchange";

/// Certificate reputation changes from the threat-intelligence service.
pub const TOPIC_CERT_REP_CHANGE: &str = "/fabric/event/intel/cert/repchange";

/// First-instance notifications (a file seen for the first time).
pub const TOPIC_FILE_FIRST_INSTANCE: &str = "/fabric/event/intel/file/firstinstance";

/// Detonation / sandbox file report events.
pub const TOPIC_DETONATION_REPORT: &str = "/fabric/event/detonation/file/report";

/// Service id of the host-response service (paged search protocol).
pub const SERVICE_HOST_RESPONSE: &str = "host-response";

/// Service id of the endpoint-management service (free-text find).
pub const SERVICE_ENDPOINT_MGMT: &str = "endpoint-mgmt";

/// Activity topic for a specific endpoint-management service instance.
#[must_use]
pub fn endpoint_mgmt_activity_topic(instance_id: &str) -> String {
    format!("/fabric/service/endpoint-mgmt/remote/{instance_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_topic_embeds_instance() {
        assert_eq!(
            endpoint_mgmt_activity_topic("mgmt1"),
            "/fabric/service/endpoint-mgmt/remote/mgmt1"
        );
    }
}
