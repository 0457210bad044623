//! Translation from local request parameters to upstream URLs

use keyloop_core::validate::require;
use keyloop_core::{Credentials, GatewayResult};
use url::Url;

/// Percent-encode a value for use as a single path segment.
///
/// `set_path` leaves `/`, `?`, `#` and `%` alone, so they are encoded here
/// to keep an identifier like `"A/B"` from splitting into two segments.
fn encode_path_segment(id: &str) -> String {
    id.replace('%', "%25")
        .replace('/', "%2F")
        .replace('?', "%3F")
        .replace('#', "%23")
}

/// Builds upstream URLs for one enterprise/store pair
#[derive(Debug, Clone)]
pub struct UpstreamRoutes {
    base_url: Url,
    enterprise_id: String,
    store_id: String,
}

impl UpstreamRoutes {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            base_url: credentials.base_url().clone(),
            enterprise_id: credentials.enterprise_id().to_string(),
            store_id: credentials.store_id().to_string(),
        }
    }

    /// `POST {base}/oauth/client_credential/accesstoken`
    pub fn token(&self) -> Url {
        self.join(&["oauth", "client_credential", "accesstoken"])
    }

    /// `GET {base}/{enterprise}/{store}/v3/customers/{customer_id}`
    pub fn customer(&self, customer_id: &str) -> GatewayResult<Url> {
        let customer_id = require("customerId", Some(customer_id))?;
        Ok(self.store(&["v3", "customers", customer_id]))
    }

    /// `GET {base}/{enterprise}/{store}/v1/parts?brandCode=&partCode=`
    pub fn parts_search(&self, brand_code: &str, part_code: &str) -> GatewayResult<Url> {
        let brand_code = require("brandCode", Some(brand_code))?;
        let part_code = require("partCode", Some(part_code))?;

        let mut url = self.store(&["v1", "parts"]);
        url.query_pairs_mut()
            .append_pair("brandCode", brand_code)
            .append_pair("partCode", part_code);
        Ok(url)
    }

    /// `GET {base}/{enterprise}/{store}/v1/parts/{part_id}/price-availability`
    pub fn price_availability(&self, part_id: &str) -> GatewayResult<Url> {
        let part_id = require("partId", Some(part_id))?;
        Ok(self.store(&["v1", "parts", part_id, "price-availability"]))
    }

    /// `GET {base}/{enterprise}/{store}/v1/parts/brands`
    pub fn brands(&self) -> Url {
        self.store(&["v1", "parts", "brands"])
    }

    /// `POST {base}/{enterprise}/{store}/v1/parts-orders`
    pub fn parts_orders(&self) -> Url {
        self.store(&["v1", "parts-orders"])
    }

    fn store(&self, segments: &[&str]) -> Url {
        let mut all = Vec::with_capacity(segments.len() + 2);
        all.push(self.enterprise_id.as_str());
        all.push(self.store_id.as_str());
        all.extend_from_slice(segments);
        self.join(&all)
    }

    fn join(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        let mut path = url.path().trim_end_matches('/').to_string();
        for segment in segments {
            path.push('/');
            path.push_str(&encode_path_segment(segment));
        }
        url.set_path(&path);
        url.set_query(None);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyloop_core::GatewayError;

    fn routes(base: &str) -> UpstreamRoutes {
        let creds = Credentials::new(base, "id", "secret", "ent", "store").unwrap();
        UpstreamRoutes::new(&creds)
    }

    #[test]
    fn test_upstream_urls() {
        let r = routes("https://api.eu-stage.keyloop.io");
        assert_eq!(
            r.token().as_str(),
            "https://api.eu-stage.keyloop.io/oauth/client_credential/accesstoken"
        );
        assert_eq!(
            r.customer("C-1").unwrap().as_str(),
            "https://api.eu-stage.keyloop.io/ent/store/v3/customers/C-1"
        );
        assert_eq!(
            r.parts_search("B1", "123").unwrap().as_str(),
            "https://api.eu-stage.keyloop.io/ent/store/v1/parts?brandCode=B1&partCode=123"
        );
        assert_eq!(
            r.price_availability("P1").unwrap().as_str(),
            "https://api.eu-stage.keyloop.io/ent/store/v1/parts/P1/price-availability"
        );
        assert_eq!(
            r.brands().as_str(),
            "https://api.eu-stage.keyloop.io/ent/store/v1/parts/brands"
        );
        assert_eq!(
            r.parts_orders().as_str(),
            "https://api.eu-stage.keyloop.io/ent/store/v1/parts-orders"
        );
    }

    #[test]
    fn test_base_path_is_preserved() {
        let r = routes("https://host/gateway/");
        assert_eq!(
            r.brands().as_str(),
            "https://host/gateway/ent/store/v1/parts/brands"
        );
    }

    #[test]
    fn test_identifiers_are_encoded() {
        let r = routes("http://localhost:9000");
        assert_eq!(
            r.customer("a/b?c").unwrap().as_str(),
            "http://localhost:9000/ent/store/v3/customers/a%2Fb%3Fc"
        );
        assert_eq!(
            r.parts_search("B 1", "12&3").unwrap().query(),
            Some("brandCode=B+1&partCode=12%263")
        );
    }

    #[test]
    fn test_blank_parameters_fail_validation() {
        let r = routes("http://localhost:9000");
        assert!(matches!(r.customer(" "), Err(GatewayError::Validation(_))));
        assert!(matches!(
            r.parts_search("", "123"),
            Err(GatewayError::Validation(_))
        ));
        assert!(matches!(
            r.parts_search("B1", ""),
            Err(GatewayError::Validation(_))
        ));
        assert!(matches!(
            r.price_availability(""),
            Err(GatewayError::Validation(_))
        ));
    }
}
