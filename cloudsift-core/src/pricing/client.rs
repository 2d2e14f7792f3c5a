use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::calculators::PricingFilter;
use crate::error::PricingError;

const GET_PRODUCTS_TARGET: &str = "AWSPriceListService.GetProducts";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// Source of price list documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PricingClient: Send + Sync {
    /// Price list documents of `service_code` matching every filter.
    async fn get_products(
        &self,
        service_code: &str,
        filters: &[PricingFilter],
    ) -> anyhow::Result<Vec<Value>>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetProductsRequest<'a> {
    service_code: &'a str,
    filters: &'a [PricingFilter],
    format_version: &'static str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetProductsResponse {
    #[serde(default)]
    price_list: Vec<Value>,
}

/// Price list client speaking the JSON 1.1 `GetProducts` protocol.
///
/// Requests are sent unsigned, so `endpoint` has to be a gateway that adds
/// AWS credentials. There is deliberately no built-in endpoint.
#[derive(Debug, Clone)]
pub struct HttpPricingClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpPricingClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PricingClient for HttpPricingClient {
    async fn get_products(
        &self,
        service_code: &str,
        filters: &[PricingFilter],
    ) -> anyhow::Result<Vec<Value>> {
        let body = GetProductsRequest {
            service_code,
            filters,
            format_version: "aws_v1",
            max_results: 100,
        };

        debug!(target: "pricing", service_code, filters = filters.len(), "requesting price list");
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Amz-Target", GET_PRODUCTS_TARGET)
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .body(serde_json::to_vec(&body)?)
            .send()
            .await
            .with_context(|| format!("price list request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("price list request returned {status}: {detail}");
        }

        let parsed: GetProductsResponse = response
            .json()
            .await
            .context("malformed price list response")?;

        // Price list entries arrive as JSON documents encoded in strings.
        Ok(parsed
            .price_list
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(raw) => serde_json::from_str(&raw).ok(),
                other => Some(other),
            })
            .collect())
    }
}

/// First parseable on-demand USD price among the documents.
///
/// Entries are visited in document order; malformed entries are skipped.
pub fn parse_first_price(price_list: &[Value]) -> Result<f64, PricingError> {
    if price_list.is_empty() {
        return Err(PricingError::NoPricing);
    }

    price_list
        .iter()
        .filter_map(|document| document.pointer("/terms/OnDemand")?.as_object())
        .flat_map(|on_demand| on_demand.values())
        .filter_map(|term| term.get("priceDimensions")?.as_object())
        .flat_map(|dimensions| dimensions.values())
        .filter_map(|dimension| dimension.pointer("/pricePerUnit/USD")?.as_str())
        .find_map(|price| price.trim().parse::<f64>().ok())
        .ok_or(PricingError::NoValidPrice)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(usd: &str) -> Value {
        json!({
            "product": {"sku": "ABC"},
            "terms": {
                "OnDemand": {
                    "ABC.JRTCKXETXF": {
                        "priceDimensions": {
                            "ABC.JRTCKXETXF.6YS6EN2CT7": {
                                "unit": "Hrs",
                                "pricePerUnit": {"USD": usd}
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn empty_list_has_no_pricing() {
        assert!(matches!(parse_first_price(&[]), Err(PricingError::NoPricing)));
    }

    #[test]
    fn first_valid_price_wins() {
        let list = vec![
            json!({"terms": {}}),
            document("not-a-number"),
            document("0.0104000000"),
            document("9.99"),
        ];
        assert_eq!(parse_first_price(&list).unwrap(), 0.0104);
    }

    #[test]
    fn nothing_usable_is_an_error() {
        let list = vec![json!({"terms": {"OnDemand": "oops"}}), document("n/a")];
        assert!(matches!(
            parse_first_price(&list),
            Err(PricingError::NoValidPrice)
        ));
    }

    #[test]
    fn request_body_uses_api_field_names() {
        let filters = vec![PricingFilter::term_match("location", "EU (Ireland)")];
        let body = GetProductsRequest {
            service_code: "AmazonEC2",
            filters: &filters,
            format_version: "aws_v1",
            max_results: 100,
        };
        let encoded = serde_json::to_value(&body).unwrap();
        assert_eq!(encoded["ServiceCode"], "AmazonEC2");
        assert_eq!(encoded["Filters"][0]["Type"], "TERM_MATCH");
        assert_eq!(encoded["Filters"][0]["Field"], "location");
    }
}
