// # Gandi LiveDNS Provider
//
// This crate provides a Gandi LiveDNS v5 provider for zonesync.
//
// LiveDNS stores records as record sets keyed by (name, type) and mutates
// them per label, so the provider exposes a by-label mutator:
//
// - new record sets are created one per type
// - a changed label has all of its record sets replaced in one PUT
// - a deleted label has all of its record sets removed in one DELETE
//
// ## Label casing
//
// LiveDNS looks labels up case-sensitively when updating. Updates and
// deletes therefore use the exact-case label returned by the API, which the
// correction compiler takes from each record's original record set.
//
// ## Security Requirements
//
// - Token and API key NEVER appear in logs or Debug output
// - Provider fails fast if neither credential is set
//
// ## API Reference
//
// - LiveDNS v5: https://api.gandi.net/docs/livedns/
// - Zone: GET `/domains/:fqdn`
// - List record sets: GET `/domains/:fqdn/records`
// - Create record set: POST `/domains/:fqdn/records`
// - Replace label: PUT `/domains/:fqdn/records/:name`
// - Delete label: DELETE `/domains/:fqdn/records/:name`
// - Name servers: GET `/domains/:fqdn/nameservers`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use zonesync_core::config::ProviderConfig;
use zonesync_core::model::{NativeRecordSet, NativeRecords, Record, RecordType, ZoneRef};
use zonesync_core::normalize::ProviderPolicy;
use zonesync_core::traits::{DnsProvider, DnsProviderFactory, Mutator, RecordSetApi};
use zonesync_core::{Error, Result};

/// LiveDNS API base URL
pub const GANDI_API_BASE: &str = "https://api.gandi.net/v5/livedns";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "gandi";

/// Lowest TTL LiveDNS accepts
pub const MIN_TTL: u32 = 300;

/// Highest TTL LiveDNS accepts (30 days)
pub const MAX_TTL: u32 = 2_592_000;

/// Suffix of the name servers LiveDNS serves zones from
pub const OWN_NS_SUFFIX: &str = ".gandi.net.";

/// Constraints LiveDNS places on records
pub fn policy() -> ProviderPolicy {
    ProviderPolicy::new(MIN_TTL)
        .with_max_ttl(MAX_TTL)
        .with_alias_apex_only()
        .with_apex_ns([OWN_NS_SUFFIX])
}

/// How requests authenticate
#[derive(Clone)]
enum Credential {
    /// Personal access token
    Bearer(String),
    /// Legacy API key
    Apikey(String),
}

/// Thin client for the LiveDNS REST API
///
/// Every method issues exactly one request and never retries.
#[derive(Clone)]
pub struct LiveDnsClient {
    /// ⚠️ NEVER log this value
    credential: Credential,
    sharing_id: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

// Custom Debug implementation that hides the credential
impl std::fmt::Debug for LiveDnsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveDnsClient")
            .field("credential", &"<REDACTED>")
            .field("sharing_id", &self.sharing_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Serialize)]
struct Items<'a> {
    items: &'a [NativeRecordSet],
}

impl LiveDnsClient {
    /// Create a client
    ///
    /// A token takes precedence over an API key. Fails if neither is set.
    pub fn new(
        token: &str,
        api_key: &str,
        sharing_id: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let credential = if !token.is_empty() {
            Credential::Bearer(token.to_string())
        } else if !api_key.is_empty() {
            Credential::Apikey(api_key.to_string())
        } else {
            return Err(Error::config(
                "missing Gandi personal access token (or api_key)",
            ));
        };

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credential,
            sharing_id: sharing_id.filter(|id| !id.is_empty()),
            base_url: base_url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| GANDI_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            http,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, url);
        request = match &self.credential {
            Credential::Bearer(token) => request.bearer_auth(token),
            Credential::Apikey(key) => request.header(AUTHORIZATION, format!("Apikey {}", key)),
        };
        if let Some(sharing_id) = &self.sharing_id {
            request = request.query(&[("sharing_id", sharing_id)]);
        }
        request
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

    /// Check that the zone is served by LiveDNS
    ///
    /// ```http
    /// GET /domains/example.com
    /// ```
    pub async fn get_domain(&self, fqdn: &str) -> Result<()> {
        match self.send(self.request(Method::GET, &format!("/domains/{}", fqdn))).await {
            Ok(_) => Ok(()),
            Err(Error::Transport { code: 404, .. }) => {
                Err(Error::not_found(format!("Zone not found: {}", fqdn)))
            }
            Err(e) => Err(e),
        }
    }

    /// Every record set of a zone
    ///
    /// ```http
    /// GET /domains/example.com/records
    /// ```
    pub async fn list_records(&self, fqdn: &str) -> Result<Vec<NativeRecordSet>> {
        let response = self
            .send(self.request(Method::GET, &format!("/domains/{}/records", fqdn)))
            .await?;
        self.json(response).await
    }

    /// Name servers of a zone
    ///
    /// ```http
    /// GET /domains/example.com/nameservers
    /// ```
    pub async fn list_nameservers(&self, fqdn: &str) -> Result<Vec<String>> {
        let response = self
            .send(self.request(Method::GET, &format!("/domains/{}/nameservers", fqdn)))
            .await?;
        self.json(response).await
    }
}

#[async_trait]
impl RecordSetApi for LiveDnsClient {
    /// ```http
    /// POST /domains/example.com/records
    /// {"rrset_name": "www", "rrset_type": "A", "rrset_ttl": 300, "rrset_values": ["192.0.2.1"]}
    /// ```
    async fn create_record_set(
        &self,
        zone: &str,
        label: &str,
        rtype: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        let set = NativeRecordSet {
            rrset_name: label.to_string(),
            rrset_type: rtype.to_string(),
            rrset_ttl: ttl,
            rrset_values: values.to_vec(),
        };
        tracing::debug!("Creating record set {} {} in {}", label, rtype, zone);
        self.send(
            self.request(Method::POST, &format!("/domains/{}/records", zone))
                .json(&set),
        )
        .await?;
        Ok(())
    }

    /// ```http
    /// PUT /domains/example.com/records/Www
    /// {"items": [...]}
    /// ```
    async fn update_by_label(&self, zone: &str, label: &str, sets: &[NativeRecordSet]) -> Result<()> {
        tracing::debug!("Replacing {} record sets at {} in {}", sets.len(), label, zone);
        self.send(
            self.request(Method::PUT, &format!("/domains/{}/records/{}", zone, label))
                .json(&Items { items: sets }),
        )
        .await?;
        Ok(())
    }

    /// ```http
    /// DELETE /domains/example.com/records/Www
    /// ```
    async fn delete_by_label(&self, zone: &str, label: &str) -> Result<()> {
        tracing::debug!("Deleting every record set at {} in {}", label, zone);
        self.send(self.request(Method::DELETE, &format!("/domains/{}/records/{}", zone, label)))
            .await?;
        Ok(())
    }
}

/// Gandi LiveDNS provider
#[derive(Debug)]
pub struct GandiProvider {
    client: Arc<LiveDnsClient>,
    policy: ProviderPolicy,
    /// Dump fetched record sets at debug level
    debug: bool,
}

impl GandiProvider {
    /// Create a provider
    pub fn new(client: LiveDnsClient, debug: bool) -> Result<Self> {
        let policy = policy();
        policy.validate()?;
        Ok(Self {
            client: Arc::new(client),
            policy,
            debug,
        })
    }
}

#[async_trait]
impl DnsProvider for GandiProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    fn mutator(&self) -> Mutator {
        Mutator::ByLabel(self.client.clone())
    }

    /// LOC is not supported; DS is only supported below the apex
    fn audit_records(&self, records: &[Record]) -> Result<()> {
        for record in records {
            match record.rtype {
                RecordType::Loc => {
                    return Err(Error::validation(
                        record.key().to_string(),
                        "Gandi does not support LOC records",
                    ));
                }
                RecordType::Ds if record.is_apex() => {
                    return Err(Error::validation(
                        record.key().to_string(),
                        "Gandi only supports DS records below the apex",
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn lookup_zone(&self, zone: &str) -> Result<ZoneRef> {
        let fqdn = zone.trim_end_matches('.').to_ascii_lowercase();
        self.client.get_domain(&fqdn).await?;
        Ok(ZoneRef::named(fqdn))
    }

    async fn fetch_existing(&self, zone: &ZoneRef) -> Result<NativeRecords> {
        let sets = self.client.list_records(&zone.name).await?;
        if self.debug {
            for set in &sets {
                tracing::debug!(
                    "{}: {} {} {} {:?}",
                    zone.name,
                    set.rrset_name,
                    set.rrset_type,
                    set.rrset_ttl,
                    set.rrset_values
                );
            }
        }
        Ok(NativeRecords::RecordSets(sets))
    }

    async fn nameservers(&self, zone: &ZoneRef) -> Result<Vec<String>> {
        self.client.list_nameservers(&zone.name).await
    }
}

/// Factory for creating Gandi providers
pub struct GandiFactory;

impl DnsProviderFactory for GandiFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Gandi {
                token,
                api_key,
                sharing_id,
                api_url,
                debug,
            } => {
                let debug = *debug
                    || std::env::var("ZONESYNC_GANDI_DEBUG")
                        .map(|value| value.eq_ignore_ascii_case("true") || value == "1")
                        .unwrap_or(false);

                let client = LiveDnsClient::new(token, api_key, sharing_id.clone(), api_url.clone())?;
                Ok(Box::new(GandiProvider::new(client, debug)?))
            }
            _ => Err(Error::config("Invalid config for Gandi provider")),
        }
    }
}

/// Register the Gandi provider with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// zonesync_provider_gandi::register(&registry);
/// assert!(registry.has_provider("gandi"));
/// ```
pub fn register(registry: &zonesync_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(GandiFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: &str, api_key: &str) -> ProviderConfig {
        ProviderConfig::Gandi {
            token: token.to_string(),
            api_key: api_key.to_string(),
            sharing_id: None,
            api_url: None,
            debug: false,
        }
    }

    #[test]
    fn test_factory_creation() {
        let provider = GandiFactory.create(&config("token", "")).unwrap();
        assert_eq!(provider.provider_name(), "gandi");
        assert!(matches!(provider.mutator(), Mutator::ByLabel(_)));
    }

    #[test]
    fn test_factory_missing_credentials() {
        assert!(matches!(
            GandiFactory.create(&config("", "")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_credentials_not_exposed_in_debug() {
        let client = LiveDnsClient::new("secret_token_12345", "", None, None).unwrap();
        let provider = GandiProvider::new(client, false).unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("GandiProvider"));
    }

    #[test]
    fn test_policy_is_consistent() {
        let policy = policy();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.min_ttl, 300);
        assert_eq!(policy.max_ttl, Some(2_592_000));
        assert!(policy.alias_apex_only);
    }

    #[test]
    fn test_audit_rejects_loc_and_apex_ds() {
        let client = LiveDnsClient::new("token", "", None, None).unwrap();
        let provider = GandiProvider::new(client, false).unwrap();

        let loc = Record::new("example.com", "here", RecordType::Loc, "52 22 23.000 N 4 53 32.000 E -2.00m");
        assert!(matches!(provider.audit_records(&[loc]), Err(Error::Validation { .. })));

        let apex_ds = Record::new("example.com", "@", RecordType::Ds, "1 13 2 abcd");
        assert!(provider.audit_records(&[apex_ds]).is_err());

        let child_ds = Record::new("example.com", "sub", RecordType::Ds, "1 13 2 abcd");
        assert!(provider.audit_records(&[child_ds]).is_ok());
    }

    #[test]
    fn test_api_url_trailing_slash_is_trimmed() {
        let client =
            LiveDnsClient::new("token", "", None, Some("http://localhost:8080/v5/livedns/".into())).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/v5/livedns");
    }
}
