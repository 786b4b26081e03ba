//! Query-string construction for the chart and data endpoints.

use url::form_urlencoded;

/// Endpoint returning the rendered concentration chart (GET).
pub const CHART_ENDPOINT: &str = "concentration.svg";
/// Endpoint returning the sampled curve as CSV (GET).
pub const CSV_ENDPOINT: &str = "concentration.csv";
/// Endpoint accepting a POSTed form and answering with an image URL.
pub const RENDER_ENDPOINT: &str = "render";

/// Serializes name/value pairs as `application/x-www-form-urlencoded`,
/// preserving their order.
pub fn encode_fields(fields: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in fields {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

/// Builds `<endpoint>?<urlencoded fields>&dummy=<dummy_ms>`.
///
/// `dummy_ms` is the cache-busting token: passing the current time in
/// milliseconds makes otherwise-identical requests unique, so the browser
/// cannot serve a stale cached artifact.
pub fn chart_query(endpoint: &str, fields: &[(String, String)], dummy_ms: u64) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in fields {
        serializer.append_pair(name, value);
    }
    serializer.append_pair("dummy", &dummy_ms.to_string());
    format!("{}?{}", endpoint, serializer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn chart_url_appends_fields_and_dummy() {
        let url = chart_query(CHART_ENDPOINT, &fields(&[("dose", "10"), ("interval", "12")]), 7);
        assert_eq!(url, "concentration.svg?dose=10&interval=12&dummy=7");
    }

    #[test]
    fn csv_url_shares_the_query_suffix() {
        let f = fields(&[("dose", "10"), ("interval", "12")]);
        let chart = chart_query(CHART_ENDPOINT, &f, 1234);
        let csv = chart_query(CSV_ENDPOINT, &f, 1234);
        assert_eq!(csv, "concentration.csv?dose=10&interval=12&dummy=1234");
        assert_eq!(
            chart.split_once('?').unwrap().1,
            csv.split_once('?').unwrap().1
        );
    }

    #[test]
    fn values_are_urlencoded() {
        let url = chart_query(CHART_ENDPOINT, &fields(&[("doses", "10 20"), ("hl", "1.5h")]), 0);
        assert_eq!(url, "concentration.svg?doses=10+20&hl=1.5h&dummy=0");
    }

    #[test]
    fn dummy_tokens_differ_across_submissions() {
        let f = fields(&[("dose", "10")]);
        assert_ne!(chart_query(CHART_ENDPOINT, &f, 1000), chart_query(CHART_ENDPOINT, &f, 1001));
    }

    #[test]
    fn encode_fields_preserves_order() {
        assert_eq!(
            encode_fields(&fields(&[("b", "2"), ("a", "1")])),
            "b=2&a=1"
        );
    }
}
