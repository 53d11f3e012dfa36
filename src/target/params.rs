use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use crate::config::TargetConfig;
use crate::errors::SqlsentryError;
use super::param_dict::{param_to_dict, ParamDict};
use super::source::ParameterSource;

/// Raw value registered for direct (non-HTTP) connections.
pub const DIRECT_CONNECTION: &str = "direct connection";

/// Synthetic key under which a `*`-marked URL is recorded.
pub const URI_KEY: &str = "URI";

/// Accepted spellings of the User-Agent source in the test-parameter filter.
const USER_AGENT_ALIASES: &[&str] = &["user-agent", "useragent", "ua"];

static XML_PAYLOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*<(\?xml|soap:|ns).*>").expect("static regex")
});

/// Parameter sources derived from one target's request description.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterMap {
    /// Raw string found at each source.
    pub raw: BTreeMap<ParameterSource, String>,
    /// Sources that may be used as injection points, split into name/value pairs.
    pub testable: BTreeMap<ParameterSource, ParamDict>,
}

impl ParameterMap {
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn raw(&self, source: ParameterSource) -> Option<&str> {
        self.raw.get(&source).map(String::as_str)
    }

    pub fn testable(&self, source: ParameterSource) -> Option<&ParamDict> {
        self.testable.get(&source)
    }

    pub fn is_testable(&self, source: ParameterSource) -> bool {
        self.testable.contains_key(&source)
    }

    /// The POST body was recognised as XML/SOAP.
    pub fn is_xml(&self) -> bool {
        self.raw.contains_key(&ParameterSource::PostXml)
    }

    fn register_dict(&mut self, source: ParameterSource, dict: ParamDict) -> bool {
        if dict.is_empty() {
            return false;
        }
        self.testable.insert(source, dict);
        true
    }
}

pub fn is_xml_payload(data: &str) -> bool {
    XML_PAYLOAD.is_match(data)
}

fn user_agent_requested(test_parameter: &[String]) -> bool {
    test_parameter.is_empty()
        || test_parameter.iter().any(|p| {
            USER_AGENT_ALIASES.iter().any(|alias| p.eq_ignore_ascii_case(alias))
        })
}

/// Derive the testable parameter set for the current target.
///
/// `conf` is updated in place: the `*` marker is stripped from the URL,
/// newlines in POST data become spaces, and a POST body forces the method
/// to POST.
pub fn extract_parameters(conf: &mut TargetConfig) -> Result<ParameterMap, SqlsentryError> {
    let mut map = ParameterMap::default();

    if conf.direct {
        map.raw.insert(ParameterSource::Direct, DIRECT_CONNECTION.to_string());
        return Ok(map);
    }

    let mut testable = false;

    if let Some(query) = conf.get_query().filter(|q| !q.is_empty()).map(str::to_string) {
        let dict = param_to_dict(ParameterSource::Get, &query, &conf.test_parameter)?;
        map.raw.insert(ParameterSource::Get, query);
        testable |= map.register_dict(ParameterSource::Get, dict);
    }

    let has_data = conf.data.as_deref().is_some_and(|d| !d.is_empty());
    if conf.method == Some(Method::POST) && !has_data {
        return Err(SqlsentryError::Syntax(
            "HTTP POST method requires data to post".into(),
        ));
    }

    if has_data {
        let data = conf.data.as_deref().unwrap_or_default().replace('\n', " ");
        let place = if is_xml_payload(&data) {
            ParameterSource::PostXml
        } else {
            ParameterSource::Post
        };
        let dict = param_to_dict(place, &data, &conf.test_parameter)?;
        map.raw.insert(place, data.clone());
        testable |= map.register_dict(place, dict);

        conf.data = Some(data);
        conf.method = Some(Method::POST);
    }

    if conf.url.contains('*') {
        let marked = conf.url.clone();
        map.raw.insert(ParameterSource::Uri, marked.clone());
        map.testable.insert(
            ParameterSource::Uri,
            ParamDict::from([(URI_KEY.to_string(), marked)]),
        );
        conf.url = conf.url.replace('*', "");
        testable = true;
    }

    if let Some(cookie) = conf.cookie.as_deref().filter(|c| !c.is_empty()) {
        let dict = param_to_dict(ParameterSource::Cookie, cookie, &conf.test_parameter)?;
        map.raw.insert(ParameterSource::Cookie, cookie.to_string());
        testable |= map.register_dict(ParameterSource::Cookie, dict);
    }

    for (name, value) in &conf.headers {
        if !name.eq_ignore_ascii_case("User-Agent") {
            continue;
        }
        // Header values go out verbatim, never URL-encoded
        map.raw.insert(ParameterSource::UserAgent, value.clone());
        if user_agent_requested(&conf.test_parameter) {
            map.testable.insert(
                ParameterSource::UserAgent,
                ParamDict::from([("User-Agent".to_string(), value.clone())]),
            );
            testable = true;
        }
    }

    if map.is_empty() {
        return Err(SqlsentryError::MissingParameters(
            "you did not provide any GET, POST and Cookie parameter, neither an User-Agent header"
                .into(),
        ));
    }
    if !testable {
        return Err(SqlsentryError::FilteredParameters(
            "all testable parameters you provided are not present within the GET, POST and Cookie parameters"
                .into(),
        ));
    }

    debug!(
        sources = ?map.raw.keys().collect::<Vec<_>>(),
        testable = ?map.testable.keys().collect::<Vec<_>>(),
        "Parameters extracted"
    );

    Ok(map)
}
