//! AWS Route 53 REST client
//!
//! Talks to the Route 53 XML API directly over reqwest, signing each request
//! with AWS Signature V4.
//!
//! Required IAM Policy:
//! - route53:ListHostedZonesByName
//! - route53:ListResourceRecordSets
//! - route53:ChangeResourceRecordSets

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::credentials::Route53Credentials;
use super::traits::{
    RecordChangeBatch, RecordSetCursor, RecordSetPage, ResourceRecordSet, Route53Api,
};
use crate::errors::DnsError;
use crate::models::HostedZone;

const AWS_ROUTE53_ENDPOINT: &str = "https://route53.amazonaws.com";
const API_VERSION: &str = "2013-04-01";
/// Route 53 is a global service; requests are always signed for us-east-1.
const SIGNING_REGION: &str = "us-east-1";
const SIGNING_SERVICE: &str = "route53";

/// AWS Signature V4 signing implementation
mod aws_signing {
    use chrono::{DateTime, Utc};
    use hmac::{Hmac, Mac};
    use sha2::{Digest, Sha256};

    type HmacSha256 = Hmac<Sha256>;

    pub struct SigningParams<'a> {
        pub access_key: &'a str,
        pub secret_key: &'a str,
        pub region: &'a str,
        pub service: &'a str,
        pub now: DateTime<Utc>,
    }

    pub fn amz_date(now: &DateTime<Utc>) -> String {
        now.format("%Y%m%dT%H%M%SZ").to_string()
    }

    /// Returns the `Authorization` header value. Every entry in `headers` is
    /// signed, so callers must pass the exact headers they send.
    pub fn sign_request(
        method: &str,
        uri: &str,
        query_string: &str,
        headers: &[(&str, &str)],
        payload: &str,
        params: &SigningParams<'_>,
    ) -> String {
        let date_stamp = params.now.format("%Y%m%d").to_string();
        let amz_date = amz_date(&params.now);

        let payload_hash = hex::encode(Sha256::digest(payload.as_bytes()));

        let mut sorted_headers: Vec<(String, &str)> = headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), *v))
            .collect();
        sorted_headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers_str = sorted_headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let mut canonical_headers = String::new();
        for (key, value) in &sorted_headers {
            canonical_headers.push_str(&format!("{}:{}\n", key, value.trim()));
        }

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, uri, query_string, canonical_headers, signed_headers_str, payload_hash
        );

        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));

        let credential_scope = format!(
            "{}/{}/{}/aws4_request",
            date_stamp, params.region, params.service
        );
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date, credential_scope, canonical_request_hash
        );

        let k_date = hmac_sha256(format!("AWS4{}", params.secret_key).as_bytes(), &date_stamp);
        let k_region = hmac_sha256(&k_date, params.region);
        let k_service = hmac_sha256(&k_region, params.service);
        let k_signing = hmac_sha256(&k_service, "aws4_request");
        let signature = hex::encode(hmac_sha256(&k_signing, &string_to_sign));

        format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            params.access_key, credential_scope, signed_headers_str, signature
        )
    }

    fn hmac_sha256(key: &[u8], data: &str) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        mac.update(data.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Route 53 API response structures
#[derive(Debug, Deserialize)]
struct ListHostedZonesByNameResponse {
    #[serde(rename = "HostedZones")]
    hosted_zones: Option<HostedZonesWrapper>,
}

#[derive(Debug, Deserialize)]
struct HostedZonesWrapper {
    #[serde(rename = "HostedZone", default)]
    hosted_zone: Vec<HostedZoneXml>,
}

#[derive(Debug, Deserialize)]
struct HostedZoneXml {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ListResourceRecordSetsResponse {
    #[serde(rename = "ResourceRecordSets")]
    resource_record_sets: Option<ResourceRecordSetsWrapper>,
    #[serde(rename = "IsTruncated", default)]
    is_truncated: bool,
    #[serde(rename = "NextRecordName")]
    next_record_name: Option<String>,
    #[serde(rename = "NextRecordType")]
    next_record_type: Option<String>,
    #[serde(rename = "NextRecordIdentifier")]
    next_record_identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceRecordSetsWrapper {
    #[serde(rename = "ResourceRecordSet", default)]
    resource_record_set: Vec<ResourceRecordSetXml>,
}

#[derive(Debug, Deserialize, Clone)]
struct ResourceRecordSetXml {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(rename = "TTL")]
    ttl: Option<u32>,
    #[serde(rename = "ResourceRecords")]
    resource_records: Option<ResourceRecordsWrapper>,
}

#[derive(Debug, Deserialize, Clone)]
struct ResourceRecordsWrapper {
    #[serde(rename = "ResourceRecord", default)]
    resource_record: Vec<ResourceRecordXml>,
}

#[derive(Debug, Deserialize, Clone)]
struct ResourceRecordXml {
    #[serde(rename = "Value")]
    value: String,
}

/// `<ErrorResponse><Error><Code/><Message/></Error></ErrorResponse>`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "Error")]
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message")]
    message: Option<String>,
}

/// `<InvalidChangeBatch><Messages><Message/>...</Messages></InvalidChangeBatch>`
#[derive(Debug, Deserialize)]
struct InvalidChangeBatchResponse {
    #[serde(rename = "Messages")]
    messages: Option<MessagesWrapper>,
}

#[derive(Debug, Deserialize)]
struct MessagesWrapper {
    #[serde(rename = "Message", default)]
    message: Vec<String>,
}

/// Change batch request for Route 53
#[derive(Debug, Serialize)]
struct ChangeResourceRecordSetsRequest {
    #[serde(rename = "ChangeBatch")]
    change_batch: ChangeBatch,
}

#[derive(Debug, Serialize)]
struct ChangeBatch {
    #[serde(rename = "Comment")]
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(rename = "Changes")]
    changes: Changes,
}

#[derive(Debug, Serialize)]
struct Changes {
    #[serde(rename = "Change")]
    change: Vec<Change>,
}

#[derive(Debug, Serialize)]
struct Change {
    #[serde(rename = "Action")]
    action: String,
    #[serde(rename = "ResourceRecordSet")]
    resource_record_set: ChangeResourceRecordSet,
}

#[derive(Debug, Serialize)]
struct ChangeResourceRecordSet {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(rename = "TTL")]
    ttl: u32,
    #[serde(rename = "ResourceRecords")]
    resource_records: ChangeResourceRecords,
}

#[derive(Debug, Serialize)]
struct ChangeResourceRecords {
    #[serde(rename = "ResourceRecord")]
    resource_record: Vec<ChangeResourceRecord>,
}

#[derive(Debug, Serialize)]
struct ChangeResourceRecord {
    #[serde(rename = "Value")]
    value: String,
}

/// Signed Route 53 client
pub struct Route53Client {
    client: Client,
    credentials: Route53Credentials,
    endpoint: Url,
    host: String,
}

impl Route53Client {
    /// Create a new Route 53 client with the given credentials
    pub fn new(credentials: Route53Credentials) -> Result<Self, DnsError> {
        if credentials.access_key_id.is_empty() || credentials.secret_access_key.is_empty() {
            return Err(DnsError::InvalidCredentials(
                "access key id and secret access key are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DnsError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint_str = credentials
            .endpoint_url
            .clone()
            .unwrap_or_else(|| AWS_ROUTE53_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint_str)
            .map_err(|e| DnsError::Validation(format!("Invalid endpoint {}: {}", endpoint_str, e)))?;
        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(DnsError::Validation(format!(
                    "Endpoint has no host: {}",
                    endpoint_str
                )))
            }
        };

        Ok(Self {
            client,
            credentials,
            endpoint,
            host,
        })
    }

    /// Canonical query string: keys sorted, keys and values percent-encoded
    fn canonical_query(query: &[(&str, &str)]) -> String {
        let mut pairs: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| {
                (
                    urlencoding::encode(k).into_owned(),
                    urlencoding::encode(v).into_owned(),
                )
            })
            .collect();
        pairs.sort();
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Make a signed request to Route 53 API
    async fn api_request(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&str>,
    ) -> Result<String, DnsError> {
        let query_string = Self::canonical_query(query);
        let base = self.endpoint.as_str().trim_end_matches('/');
        let url = if query_string.is_empty() {
            format!("{}{}", base, path)
        } else {
            format!("{}{}?{}", base, path, query_string)
        };
        let payload = body.unwrap_or("");

        let now: DateTime<Utc> = Utc::now();
        let amz_date = aws_signing::amz_date(&now);

        let mut headers: Vec<(&str, &str)> =
            vec![("host", self.host.as_str()), ("x-amz-date", amz_date.as_str())];
        if let Some(token) = self.credentials.session_token.as_deref() {
            headers.push(("x-amz-security-token", token));
        }

        let authorization = aws_signing::sign_request(
            method,
            path,
            &query_string,
            &headers,
            payload,
            &aws_signing::SigningParams {
                access_key: &self.credentials.access_key_id,
                secret_key: &self.credentials.secret_access_key,
                region: SIGNING_REGION,
                service: SIGNING_SERVICE,
                now,
            },
        );

        let mut request = match method {
            "GET" => self.client.get(&url),
            "POST" => self.client.post(&url),
            _ => {
                return Err(DnsError::ApiError(format!(
                    "Unsupported method: {}",
                    method
                )))
            }
        };

        request = request
            .header("X-Amz-Date", amz_date.as_str())
            .header("Authorization", authorization)
            .header("Content-Type", "application/xml");

        if let Some(token) = self.credentials.session_token.as_deref() {
            request = request.header("X-Amz-Security-Token", token);
        }

        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        debug!("Route53 API request: {} {}", method, path);

        let response = request
            .send()
            .await
            .map_err(|e| DnsError::ApiError(format!("API request failed: {}", e)))?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| DnsError::ApiError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status.as_u16(), &response_body));
        }

        Ok(response_body)
    }

    /// Turn a non-2xx body into a typed provider fault when it is one of
    /// Route 53's XML error documents.
    fn parse_error(status: u16, body: &str) -> DnsError {
        if body.contains("<InvalidChangeBatch") {
            if let Ok(parsed) = quick_xml::de::from_str::<InvalidChangeBatchResponse>(body) {
                let messages = parsed.messages.map(|m| m.message).unwrap_or_default();
                return DnsError::Service {
                    code: "InvalidChangeBatch".to_string(),
                    message: messages.join("; "),
                };
            }
        }

        match quick_xml::de::from_str::<ErrorResponse>(body) {
            Ok(parsed) => DnsError::Service {
                code: parsed.error.code,
                message: parsed.error.message.unwrap_or_default(),
            },
            Err(_) => DnsError::ApiError(format!("API returned status {}: {}", status, body)),
        }
    }

    fn strip_zone_prefix(id: &str) -> String {
        id.trim_start_matches("/hostedzone/").to_string()
    }

    fn convert_record_set(record_set: ResourceRecordSetXml) -> ResourceRecordSet {
        ResourceRecordSet {
            name: record_set.name,
            record_type: record_set.record_type,
            ttl: record_set.ttl,
            values: record_set
                .resource_records
                .map(|w| w.resource_record.into_iter().map(|r| r.value).collect())
                .unwrap_or_default(),
        }
    }

    fn build_change_body(batch: &RecordChangeBatch) -> Result<String, DnsError> {
        let change_request = ChangeResourceRecordSetsRequest {
            change_batch: ChangeBatch {
                comment: batch.comment.clone(),
                changes: Changes {
                    change: batch
                        .changes
                        .iter()
                        .map(|change| Change {
                            action: change.action.to_string(),
                            resource_record_set: ChangeResourceRecordSet {
                                name: change.record_set.name.clone(),
                                record_type: change.record_set.record_type.clone(),
                                ttl: change.record_set.ttl.unwrap_or(300),
                                resource_records: ChangeResourceRecords {
                                    resource_record: change
                                        .record_set
                                        .values
                                        .iter()
                                        .map(|value| ChangeResourceRecord {
                                            value: value.clone(),
                                        })
                                        .collect(),
                                },
                            },
                        })
                        .collect(),
                },
            },
        };

        let body = quick_xml::se::to_string(&change_request)
            .map_err(|e| DnsError::Serialization(format!("Failed to serialize request: {}", e)))?;

        // Add XML namespace
        Ok(body.replace(
            "<ChangeResourceRecordSetsRequest>",
            &format!(
                "<ChangeResourceRecordSetsRequest xmlns=\"https://route53.amazonaws.com/doc/{}/\">",
                API_VERSION
            ),
        ))
    }
}

#[async_trait]
impl Route53Api for Route53Client {
    async fn list_hosted_zones_by_name(&self, dns_name: &str) -> Result<Vec<HostedZone>, DnsError> {
        let path = format!("/{}/hostedzonesbyname", API_VERSION);
        let response = self
            .api_request("GET", &path, &[("dnsname", dns_name)], None)
            .await?;

        let parsed: ListHostedZonesByNameResponse = quick_xml::de::from_str(&response)
            .map_err(|e| DnsError::Serialization(format!("Failed to parse response: {}", e)))?;

        Ok(parsed
            .hosted_zones
            .map(|w| w.hosted_zone)
            .unwrap_or_default()
            .into_iter()
            .map(|zone| HostedZone {
                id: Self::strip_zone_prefix(&zone.id),
                name: zone.name,
            })
            .collect())
    }

    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordSetCursor>,
    ) -> Result<RecordSetPage, DnsError> {
        let path = format!(
            "/{}/hostedzone/{}/rrset",
            API_VERSION,
            Self::strip_zone_prefix(zone_id)
        );
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(cursor) = start {
            query.push(("name", cursor.name.as_str()));
            query.push(("type", cursor.record_type.as_str()));
            if let Some(identifier) = cursor.identifier.as_deref() {
                query.push(("identifier", identifier));
            }
        }
        let response = self.api_request("GET", &path, &query, None).await?;

        let parsed: ListResourceRecordSetsResponse = quick_xml::de::from_str(&response)
            .map_err(|e| DnsError::Serialization(format!("Failed to parse response: {}", e)))?;

        let next = match (
            parsed.is_truncated,
            parsed.next_record_name,
            parsed.next_record_type,
        ) {
            (true, Some(name), Some(record_type)) => Some(RecordSetCursor {
                name,
                record_type,
                identifier: parsed.next_record_identifier,
            }),
            _ => None,
        };

        Ok(RecordSetPage {
            record_sets: parsed
                .resource_record_sets
                .map(|w| w.resource_record_set)
                .unwrap_or_default()
                .into_iter()
                .map(Self::convert_record_set)
                .collect(),
            next,
        })
    }

    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: &RecordChangeBatch,
    ) -> Result<(), DnsError> {
        let body = Self::build_change_body(batch)?;
        let path = format!(
            "/{}/hostedzone/{}/rrset",
            API_VERSION,
            Self::strip_zone_prefix(zone_id)
        );
        self.api_request("POST", &path, &[], Some(&body)).await?;
        Ok(())
    }
}
