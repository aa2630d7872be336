use std::collections::HashMap;

/// Page size the client always asks for. Not user controlled.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Field name -> value, as a submitted form would produce.
pub type FormFields = HashMap<String, String>;

pub fn form_fields<I, K, V>(pairs: I) -> FormFields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A user-initiated form submission.
///
/// Implementations wrap whatever delivers the submit (a browser event, a CLI
/// invocation). The controller calls `prevent_default` before reading fields,
/// on every submission.
pub trait SubmitEvent {
    fn prevent_default(&mut self);
    fn fields(&self) -> FormFields;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub fuzzy: bool,
    pub page_size: u32,
}

impl SearchRequest {
    /// Builds the request from submitted fields. A missing `query` is an empty query;
    /// fuzzy matching is on only when the `fuzzy` field is exactly `"on"`.
    pub fn from_fields(fields: &FormFields, config: &ClientConfig) -> Self {
        Self {
            query: fields.get("query").cloned().unwrap_or_default(),
            fuzzy: fields.get("fuzzy").is_some_and(|v| v == "on"),
            page_size: config.page_size,
        }
    }

    pub fn fuzziness(&self) -> u8 {
        u8::from(self.fuzzy)
    }

    /// Path and query string for the search service, with `q` percent-encoded.
    pub fn endpoint(&self) -> String {
        format!(
            "/search?q={}&fuzziness={}&page[size]={}",
            urlencoding::encode(&self.query),
            self.fuzziness(),
            self.page_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(pairs: &[(&str, &str)]) -> SearchRequest {
        SearchRequest::from_fields(&form_fields(pairs.iter().copied()), &ClientConfig::default())
    }

    #[test]
    fn test_fuzzy_only_when_exactly_on() {
        assert_eq!(request(&[("query", "x"), ("fuzzy", "on")]).fuzziness(), 1);
        for value in ["off", "", "ON", "true", "1", " on"] {
            assert_eq!(
                request(&[("query", "x"), ("fuzzy", value)]).fuzziness(),
                0,
                "fuzzy={:?}",
                value
            );
        }
        assert_eq!(request(&[("query", "x")]).fuzziness(), 0);
    }

    #[test]
    fn test_endpoint_shape() {
        let req = request(&[("query", "romeo"), ("fuzzy", "on")]);
        assert_eq!(req.endpoint(), "/search?q=romeo&fuzziness=1&page[size]=1000");
    }

    #[test]
    fn test_endpoint_encodes_query() {
        let req = request(&[("query", "a&b #c+d é")]);
        assert_eq!(
            req.endpoint(),
            "/search?q=a%26b%20%23c%2Bd%20%C3%A9&fuzziness=0&page[size]=1000"
        );
    }

    #[test]
    fn test_page_size_comes_from_config_not_fields() {
        let fields = form_fields([("query", "x"), ("page[size]", "7"), ("pageSize", "7")]);
        let legacy = ClientConfig { page_size: 5000 };
        let req = SearchRequest::from_fields(&fields, &legacy);
        assert_eq!(req.page_size, 5000);
        assert!(req.endpoint().ends_with("&page[size]=5000"));
    }

    #[test]
    fn test_missing_query_is_empty() {
        let req = request(&[("fuzzy", "on")]);
        assert_eq!(req.query, "");
        assert!(req.endpoint().starts_with("/search?q=&"));
    }
}
