//! Service directory lookup.
//!
//! Lists the hosted services under the organisation's REST services root and
//! resolves catalog entries to live endpoints by their stable item identifier.
//! Names are not used for matching because they can drift after a rename.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::session::Session;
use crate::transport::{Transport, TransportError};

/// Errors that can occur during directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The services root could not be listed.
    #[error("Failed to list services at {url}: {source}")]
    Listing {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The services root answered with an unexpected shape.
    #[error("Unexpected service listing from {url}: {source}")]
    MalformedListing {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// No live service carries the requested item id.
    #[error("No live service matches service id {service_id}")]
    NotFound { service_id: String },

    /// The portal rejected the session token during a metadata lookup.
    #[error("Token rejected while reading service metadata: {0}")]
    TokenRejected(#[source] TransportError),
}

impl DirectoryError {
    /// True when the portal rejected the token; re-authenticating may help.
    pub fn is_token_rejected(&self) -> bool {
        match self {
            DirectoryError::TokenRejected(_) => true,
            DirectoryError::Listing { source, .. } => source.is_token_rejected(),
            _ => false,
        }
    }
}

/// A service as listed by the services root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub url: String,
}

#[derive(Deserialize)]
struct ServiceListing {
    services: Vec<ServiceEntry>,
}

/// The subset of feature service metadata needed for matching and export.
#[derive(Deserialize)]
struct ServiceMetadata {
    #[serde(rename = "serviceItemId")]
    service_item_id: Option<String>,
    #[serde(default)]
    layers: Vec<LayerRef>,
}

#[derive(Deserialize)]
struct LayerRef {
    id: u32,
}

/// A catalog entry matched to a live service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    /// Item id shared by the catalog entry and the live service
    pub service_id: String,
    /// Live service name (used for the replica name and endpoint)
    pub name: String,
    /// Live service URL (metadata endpoint)
    pub endpoint_url: String,
    /// `createReplica` endpoint for this service
    pub replica_url: String,
    /// Live layer ids, in the order the service reports them
    pub live_layer_ids: Vec<u32>,
}

/// Directory of live services under one REST services root.
///
/// The listing is fetched once and cached for the lifetime of the directory.
pub struct ServiceDirectory<'a, T: Transport> {
    transport: &'a T,
    services_url: String,
    services: Option<Vec<ServiceEntry>>,
}

impl<'a, T: Transport> ServiceDirectory<'a, T> {
    /// Create a directory for `services_url`
    /// (e.g. `https://services.arcgis.com/<org>/arcgis/rest/services`).
    pub fn new(transport: &'a T, services_url: impl Into<String>) -> Self {
        let services_url: String = services_url.into();
        Self {
            transport,
            services_url: services_url.trim_end_matches('/').to_string(),
            services: None,
        }
    }

    pub fn services_url(&self) -> &str {
        &self.services_url
    }

    /// List live services, fetching them on first use.
    pub fn list_services(&mut self, session: &Session) -> Result<&[ServiceEntry], DirectoryError> {
        if self.services.is_none() {
            let body = self
                .transport
                .send(&self.services_url, &session.json_params())
                .map_err(|source| DirectoryError::Listing {
                    url: self.services_url.clone(),
                    source,
                })?;

            let listing: ServiceListing =
                serde_json::from_value(body).map_err(|source| DirectoryError::MalformedListing {
                    url: self.services_url.clone(),
                    source,
                })?;

            info!(
                url = %self.services_url,
                count = listing.services.len(),
                "Service listing fetched"
            );
            self.services = Some(listing.services);
        }

        Ok(self.services.as_deref().unwrap_or_default())
    }

    /// Resolve a catalog service id to a live service.
    ///
    /// Each listed service's metadata is read in listing order and the first
    /// whose `serviceItemId` equals `service_id` wins. A metadata call that
    /// fails is logged and that service is skipped, unless the token was
    /// rejected, in which case the error is returned.
    pub fn resolve(
        &mut self,
        session: &Session,
        service_id: &str,
    ) -> Result<ResolvedService, DirectoryError> {
        let services = self.list_services(session)?.to_vec();
        let params = session.json_params();

        for entry in services {
            let body = match self.transport.send(&entry.url, &params) {
                Ok(body) => body,
                Err(e) if e.is_token_rejected() => return Err(DirectoryError::TokenRejected(e)),
                Err(e) => {
                    warn!(service = %entry.name, error = %e, "Metadata lookup failed, skipping service");
                    continue;
                }
            };

            let metadata: ServiceMetadata = match serde_json::from_value(body) {
                Ok(m) => m,
                Err(e) => {
                    warn!(service = %entry.name, error = %e, "Unexpected metadata shape, skipping service");
                    continue;
                }
            };

            if metadata.service_item_id.as_deref() != Some(service_id) {
                continue;
            }

            debug!(
                service = %entry.name,
                service_id = service_id,
                layers = metadata.layers.len(),
                "Service resolved"
            );
            return Ok(ResolvedService {
                service_id: service_id.to_string(),
                replica_url: format!(
                    "{}/{}/FeatureServer/createReplica",
                    self.services_url, entry.name
                ),
                name: entry.name,
                endpoint_url: entry.url,
                live_layer_ids: metadata.layers.into_iter().map(|l| l.id).collect(),
            });
        }

        Err(DirectoryError::NotFound {
            service_id: service_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ScriptedResponse, ScriptedTransport};
    use chrono::Local;
    use serde_json::json;

    const ROOT: &str = "https://services.example.com/org/arcgis/rest/services";

    fn session() -> Session {
        Session::new("tok", Local::now())
    }

    fn service_url(name: &str) -> String {
        format!("{}/{}/FeatureServer", ROOT, name)
    }

    fn scripted_directory() -> ScriptedTransport {
        let transport = ScriptedTransport::new();
        transport.push_json(
            ROOT,
            json!({"services": [
                {"name": "Roads", "url": service_url("Roads"), "type": "FeatureServer"},
                {"name": "Parcels", "url": service_url("Parcels"), "type": "FeatureServer"}
            ]}),
        );
        transport.push_json(
            &service_url("Roads"),
            json!({"serviceItemId": "road-id", "layers": [{"id": 0}]}),
        );
        transport.push_json(
            &service_url("Parcels"),
            json!({"serviceItemId": "abc", "layers": [{"id": 0}, {"id": 2}, {"id": 1}]}),
        );
        transport
    }

    #[test]
    fn test_resolve_matches_by_item_id() {
        let transport = scripted_directory();
        let mut directory = ServiceDirectory::new(&transport, ROOT);

        let resolved = directory.resolve(&session(), "abc").unwrap();
        assert_eq!(resolved.name, "Parcels");
        assert_eq!(resolved.endpoint_url, service_url("Parcels"));
        assert_eq!(
            resolved.replica_url,
            format!("{}/Parcels/FeatureServer/createReplica", ROOT)
        );
        assert_eq!(resolved.live_layer_ids, vec![0, 2, 1]);
    }

    #[test]
    fn test_listing_is_cached() {
        let transport = scripted_directory();
        let mut directory = ServiceDirectory::new(&transport, ROOT);

        directory.resolve(&session(), "abc").unwrap();
        directory.resolve(&session(), "road-id").unwrap();
        assert_eq!(transport.call_count(ROOT), 1);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let transport = scripted_directory();
        let mut directory = ServiceDirectory::new(&transport, ROOT);

        let err = directory.resolve(&session(), "missing").unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound { ref service_id } if service_id == "missing"));
    }

    #[test]
    fn test_first_match_wins() {
        let transport = ScriptedTransport::new();
        transport.push_json(
            ROOT,
            json!({"services": [
                {"name": "A", "url": service_url("A")},
                {"name": "B", "url": service_url("B")}
            ]}),
        );
        transport.push_json(&service_url("A"), json!({"serviceItemId": "dup", "layers": []}));
        transport.push_json(&service_url("B"), json!({"serviceItemId": "dup", "layers": []}));

        let mut directory = ServiceDirectory::new(&transport, ROOT);
        let resolved = directory.resolve(&session(), "dup").unwrap();
        assert_eq!(resolved.name, "A");
        assert_eq!(transport.call_count(&service_url("B")), 0);
    }

    #[test]
    fn test_failed_metadata_is_skipped() {
        let transport = ScriptedTransport::new();
        transport.push_json(
            ROOT,
            json!({"services": [
                {"name": "Roads", "url": service_url("Roads")},
                {"name": "Parcels", "url": service_url("Parcels")}
            ]}),
        );
        transport.push(&service_url("Roads"), ScriptedResponse::Status(500));
        transport.push_json(
            &service_url("Parcels"),
            json!({"serviceItemId": "abc", "layers": [{"id": 0}]}),
        );

        let mut directory = ServiceDirectory::new(&transport, ROOT);
        let resolved = directory.resolve(&session(), "abc").unwrap();
        assert_eq!(resolved.name, "Parcels");
    }

    #[test]
    fn test_token_rejection_is_propagated() {
        let transport = ScriptedTransport::new();
        transport.push_json(ROOT, json!({"services": [{"name": "A", "url": service_url("A")}]}));
        transport.push_json(
            &service_url("A"),
            json!({"error": {"code": 498, "message": "Invalid token."}}),
        );

        let mut directory = ServiceDirectory::new(&transport, ROOT);
        let err = directory.resolve(&session(), "abc").unwrap_err();
        assert!(err.is_token_rejected());
    }

    #[test]
    fn test_listing_failure() {
        let transport = ScriptedTransport::new();
        transport.push(ROOT, ScriptedResponse::Unreachable);

        let mut directory = ServiceDirectory::new(&transport, ROOT);
        let err = directory.list_services(&session()).unwrap_err();
        assert!(matches!(err, DirectoryError::Listing { .. }));
    }

    #[test]
    fn test_malformed_listing() {
        let transport = ScriptedTransport::new();
        transport.push_json(ROOT, json!({"folders": []}));

        let mut directory = ServiceDirectory::new(&transport, ROOT);
        let err = directory.list_services(&session()).unwrap_err();
        assert!(matches!(err, DirectoryError::MalformedListing { .. }));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let transport = ScriptedTransport::new();
        let directory = ServiceDirectory::new(&transport, format!("{}/", ROOT));
        assert_eq!(directory.services_url(), ROOT);
    }
}
