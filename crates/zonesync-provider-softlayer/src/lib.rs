// # SoftLayer DNS Provider
//
// This crate provides a SoftLayer DNS provider for zonesync, talking to the
// SoftLayer REST API (v3.1).
//
// SoftLayer stores one value per resource record row, each with a numeric
// ID, so the provider exposes a by-row mutator. MX and SRV rows are created
// and edited through their typed services, everything else through the
// generic resource record service.
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - Provider fails fast if the user name or API key is missing
//
// ## API Reference
//
// - Zone lookup: GET `SoftLayer_Account/getDomains` with an object filter
// - Rows: GET `SoftLayer_Dns_Domain/:id/getResourceRecords`
// - Create: POST `<service>/createObject`
// - Edit: POST `<service>/:id/editObject`
// - Delete: DELETE `SoftLayer_Dns_Domain_ResourceRecord/:id`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use zonesync_core::config::ProviderConfig;
use zonesync_core::model::{NativeRecords, NativeRow, Record, RecordType, RowDelta, ZoneRef};
use zonesync_core::normalize::ProviderPolicy;
use zonesync_core::traits::{DnsProvider, DnsProviderFactory, Mutator, RowApi};
use zonesync_core::translate::row::ROW_MIN_TTL;
use zonesync_core::{Error, Result};

/// SoftLayer REST API base URL
pub const SOFTLAYER_API_BASE: &str = "https://api.softlayer.com/rest/v3.1";

/// Name servers every SoftLayer zone is served from
pub const NAMESERVERS: [&str; 2] = ["ns1.softlayer.com", "ns2.softlayer.com"];

const PROVIDER: &str = "softlayer";

const RECORD_SERVICE: &str = "SoftLayer_Dns_Domain_ResourceRecord";
const MX_SERVICE: &str = "SoftLayer_Dns_Domain_ResourceRecord_MxType";
const SRV_SERVICE: &str = "SoftLayer_Dns_Domain_ResourceRecord_SrvType";

/// Record types SoftLayer can store
const SUPPORTED_TYPES: &[RecordType] = &[
    RecordType::A,
    RecordType::Aaaa,
    RecordType::Cname,
    RecordType::Mx,
    RecordType::Ns,
    RecordType::Ptr,
    RecordType::Srv,
    RecordType::Txt,
];

/// Constraints SoftLayer places on records
pub fn policy() -> ProviderPolicy {
    ProviderPolicy::new(ROW_MIN_TTL)
}

/// Service handling rows of `rtype`
fn service_for(rtype: RecordType) -> &'static str {
    match rtype {
        RecordType::Mx => MX_SERVICE,
        RecordType::Srv => SRV_SERVICE,
        _ => RECORD_SERVICE,
    }
}

/// SoftLayer wraps call arguments in a `parameters` array
#[derive(Serialize)]
struct Parameters<'a, T> {
    parameters: [&'a T; 1],
}

/// The fields of a zone this client reads
#[derive(Debug, Deserialize)]
struct Domain {
    id: u64,
    name: String,
}

/// Thin client for the SoftLayer REST API
///
/// Every method issues exactly one request and never retries.
#[derive(Clone)]
pub struct SoftLayerClient {
    username: String,
    /// ⚠️ NEVER log this value
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for SoftLayerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftLayerClient")
            .field("username", &self.username)
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SoftLayerClient {
    /// Create a client
    ///
    /// Fails if the user name or API key is empty.
    pub fn new(
        username: &str,
        api_key: &str,
        endpoint_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if username.is_empty() || api_key.is_empty() {
            return Err(Error::config(
                "SoftLayer UserName and APIKey must be provided",
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            username: username.to_string(),
            api_key: api_key.to_string(),
            base_url: endpoint_url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| SOFTLAYER_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            http,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.api_key))
    }

    /// Send a request; any non-2xx status becomes a transport error
    /// carrying the raw status and body
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(Error::transport(PROVIDER, status.as_u16(), body))
    }

    async fn json<T: serde::de::DeserializeOwned>(&self, response: Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| Error::http(format!("Failed to parse response: {}", e)))
    }

    /// Zones of the account whose name equals `name`
    ///
    /// ```http
    /// GET /SoftLayer_Account/getDomains.json?objectFilter={"domains":{"name":{"operation":"_= example.com"}}}
    /// ```
    async fn find_domains(&self, name: &str) -> Result<Vec<Domain>> {
        let filter = serde_json::json!({
            "domains": { "name": { "operation": format!("_= {}", name) } }
        });
        let response = self
            .send(
                self.request(Method::GET, "SoftLayer_Account/getDomains.json")
                    .query(&[
                        ("objectFilter", filter.to_string()),
                        ("objectMask", "mask[id,name]".to_string()),
                    ]),
            )
            .await?;
        self.json(response).await
    }

    /// Every row of a zone
    ///
    /// ```http
    /// GET /SoftLayer_Dns_Domain/123/getResourceRecords.json
    /// ```
    pub async fn resource_records(&self, domain_id: u64) -> Result<Vec<NativeRow>> {
        let response = self
            .send(self.request(
                Method::GET,
                &format!("SoftLayer_Dns_Domain/{}/getResourceRecords.json", domain_id),
            ))
            .await?;
        self.json(response).await
    }
}

#[async_trait]
impl RowApi for SoftLayerClient {
    /// ```http
    /// POST /SoftLayer_Dns_Domain_ResourceRecord_MxType/createObject.json
    /// {"parameters": [{"host": "@", "data": "mail.example.com.", "type": "mx", ...}]}
    /// ```
    async fn create_row(&self, row: &NativeRow) -> Result<()> {
        let rtype: RecordType = row.record_type.parse()?;
        tracing::debug!("Creating {} row {} -> {}", rtype, row.host, row.data);
        self.send(
            self.request(
                Method::POST,
                &format!("{}/createObject.json", service_for(rtype)),
            )
            .json(&Parameters { parameters: [row] }),
        )
        .await?;
        Ok(())
    }

    /// ```http
    /// POST /SoftLayer_Dns_Domain_ResourceRecord/42/editObject.json
    /// {"parameters": [{"data": "192.0.2.9"}]}
    /// ```
    async fn update_row(&self, id: u64, rtype: RecordType, delta: &RowDelta) -> Result<()> {
        tracing::debug!("Editing {} row {}: {}", rtype, id, delta.fields().join(", "));
        self.send(
            self.request(
                Method::POST,
                &format!("{}/{}/editObject.json", service_for(rtype), id),
            )
            .json(&Parameters { parameters: [delta] }),
        )
        .await?;
        Ok(())
    }

    /// ```http
    /// DELETE /SoftLayer_Dns_Domain_ResourceRecord/42.json
    /// ```
    async fn delete_row(&self, id: u64) -> Result<()> {
        tracing::debug!("Deleting row {}", id);
        self.send(self.request(
            Method::DELETE,
            &format!("{}/{}.json", RECORD_SERVICE, id),
        ))
        .await?;
        Ok(())
    }
}

/// SoftLayer DNS provider
#[derive(Debug)]
pub struct SoftLayerProvider {
    client: Arc<SoftLayerClient>,
    policy: ProviderPolicy,
}

impl SoftLayerProvider {
    /// Create a provider
    pub fn new(client: SoftLayerClient) -> Self {
        Self {
            client: Arc::new(client),
            policy: policy(),
        }
    }
}

#[async_trait]
impl DnsProvider for SoftLayerProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    fn mutator(&self) -> Mutator {
        Mutator::ByRow(self.client.clone())
    }

    fn audit_records(&self, records: &[Record]) -> Result<()> {
        if let Some(record) = records
            .iter()
            .find(|record| !SUPPORTED_TYPES.contains(&record.rtype))
        {
            return Err(Error::validation(
                record.key().to_string(),
                format!("SoftLayer does not support {} records", record.rtype),
            ));
        }
        Ok(())
    }

    async fn lookup_zone(&self, zone: &str) -> Result<ZoneRef> {
        let name = zone.trim_end_matches('.');
        let domains = self.client.find_domains(name).await?;

        match domains.as_slice() {
            [] => Err(Error::not_found(format!(
                "didn't find a domain matching {}",
                name
            ))),
            [domain] => {
                tracing::debug!("Resolved {} to SoftLayer domain {}", domain.name, domain.id);
                Ok(ZoneRef::with_id(name, domain.id))
            }
            many => Err(Error::ambiguous(name, many.len())),
        }
    }

    async fn fetch_existing(&self, zone: &ZoneRef) -> Result<NativeRecords> {
        let id = zone.id.ok_or_else(|| {
            Error::consistency(format!("zone {} has no SoftLayer domain ID", zone.name))
        })?;
        let rows = self.client.resource_records(id).await?;
        Ok(NativeRecords::Rows(rows))
    }

    async fn nameservers(&self, _zone: &ZoneRef) -> Result<Vec<String>> {
        Ok(NAMESERVERS.iter().map(|ns| ns.to_string()).collect())
    }
}

/// Factory for creating SoftLayer providers
pub struct SoftLayerFactory;

impl DnsProviderFactory for SoftLayerFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Softlayer {
                username,
                api_key,
                endpoint_url,
                timeout_secs,
            } => {
                let client = SoftLayerClient::new(
                    username,
                    api_key,
                    endpoint_url.clone(),
                    Duration::from_secs(*timeout_secs),
                )?;
                Ok(Box::new(SoftLayerProvider::new(client)))
            }
            _ => Err(Error::config("Invalid config for SoftLayer provider")),
        }
    }
}

/// Register the SoftLayer provider with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// zonesync_provider_softlayer::register(&registry);
/// assert!(registry.has_provider("softlayer"));
/// ```
pub fn register(registry: &zonesync_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(SoftLayerFactory));
}
