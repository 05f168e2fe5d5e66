//! Replica request parameters.

use crate::directory::ResolvedService;
use crate::transport::FormParams;

/// Suffix appended to the live service name to form the replica name.
pub const REPLICA_NAME_SUFFIX: &str = "_replica";

/// Export format requested from `createReplica`.
pub const DATA_FORMAT: &str = "filegdb";

/// Sync model requested from `createReplica` (plain export, no sync).
pub const SYNC_MODEL: &str = "none";

/// Parameters for one `createReplica` call.
///
/// Built once per job from the resolved service. The export policy is fixed:
/// every live layer, attachments embedded, asynchronous File Geodatabase
/// output. Catalog layer/table selections are not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaRequest {
    replica_name: String,
    layers: Vec<u32>,
    return_attachments: bool,
    return_attachments_by_url: bool,
    asynchronous: bool,
}

impl ReplicaRequest {
    pub fn for_service(service: &ResolvedService) -> Self {
        Self {
            replica_name: format!("{}{}", service.name, REPLICA_NAME_SUFFIX),
            layers: service.live_layer_ids.clone(),
            return_attachments: true,
            return_attachments_by_url: false,
            asynchronous: true,
        }
    }

    pub fn replica_name(&self) -> &str {
        &self.replica_name
    }

    pub fn layers(&self) -> &[u32] {
        &self.layers
    }

    /// Encode as the `createReplica` form.
    pub fn to_form(&self, token: &str) -> FormParams {
        FormParams::new()
            .with("f", "json")
            .with("replicaName", self.replica_name.as_str())
            .with("layers", self.layers.as_slice())
            .with("returnAttachments", self.return_attachments)
            .with("returnAttachmentsDatabyURL", self.return_attachments_by_url)
            .with("syncModel", SYNC_MODEL)
            .with("dataFormat", DATA_FORMAT)
            .with("async", self.asynchronous)
            .with("token", token)
    }
}
