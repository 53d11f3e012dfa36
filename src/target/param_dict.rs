use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use crate::errors::SqlsentryError;
use super::source::ParameterSource;

/// Name/value pairs found in one parameter source.
pub type ParamDict = BTreeMap<String, String>;

/// Parse `parameters` as found in `place`, keeping only the names allowed by
/// the user's test-parameter filter (an empty filter allows everything).
///
/// Values are kept exactly as they appear in the request: no URL decoding,
/// no whitespace trimming.
pub fn param_to_dict(
    place: ParameterSource,
    parameters: &str,
    test_parameter: &[String],
) -> Result<ParamDict, SqlsentryError> {
    let dict = match place {
        ParameterSource::PostXml => xml_to_dict(parameters, test_parameter)?,
        _ => pairs_to_dict(place, parameters, test_parameter),
    };

    warn_missing_filtered(place, &dict, test_parameter);

    Ok(dict)
}

fn allowed(name: &str, test_parameter: &[String]) -> bool {
    test_parameter.is_empty() || test_parameter.iter().any(|p| p == name)
}

fn pairs_to_dict(place: ParameterSource, parameters: &str, test_parameter: &[String]) -> ParamDict {
    let normalized = parameters.replace(", ", ",");
    let separator = if place == ParameterSource::Cookie { ';' } else { '&' };

    let mut dict = ParamDict::new();
    for element in normalized.split(separator) {
        let parts: Vec<&str> = element.split('=').collect();
        // Values carrying a literal '=' are ambiguous and left out
        if parts.len() != 2 {
            continue;
        }
        let name = parts[0].replace(' ', "");
        if allowed(&name, test_parameter) {
            dict.insert(name, parts[1].to_string());
        }
    }
    dict
}

struct OpenElement {
    name: String,
    local: String,
    text: String,
    has_children: bool,
}

/// Every leaf element of the document becomes a parameter keyed by its
/// qualified tag name; the filter matches the local name.
fn xml_to_dict(xml: &str, test_parameter: &[String]) -> Result<ParamDict, SqlsentryError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut dict = ParamDict::new();
    let insert_leaf = |element: OpenElement, dict: &mut ParamDict| {
        if allowed(&element.local, test_parameter) {
            dict.insert(element.name, element.text);
        }
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                stack.push(OpenElement {
                    name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
                    local: String::from_utf8_lossy(e.local_name().as_ref()).to_string(),
                    text: String::new(),
                    has_children: false,
                });
            }
            Ok(Event::Empty(e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                insert_leaf(
                    OpenElement {
                        name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
                        local: String::from_utf8_lossy(e.local_name().as_ref()).to_string(),
                        text: String::new(),
                        has_children: false,
                    },
                    &mut dict,
                );
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(invalid_xml)?;
                // Indentation between elements
                if text.trim().is_empty() {
                    continue;
                }
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    if !element.has_children {
                        insert_leaf(element, &mut dict);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(invalid_xml(e)),
            _ => {}
        }
    }

    if let Some(unclosed) = stack.last() {
        return Err(invalid_xml(format!("unclosed element <{}>", unclosed.name)));
    }

    Ok(dict)
}

fn invalid_xml(detail: impl std::fmt::Display) -> SqlsentryError {
    SqlsentryError::Syntax(format!("POST data looks like XML but could not be parsed ({})", detail))
}

fn warn_missing_filtered(place: ParameterSource, dict: &ParamDict, test_parameter: &[String]) {
    if test_parameter.is_empty() {
        return;
    }

    if dict.is_empty() {
        let names = test_parameter.join(", ");
        if test_parameter.len() > 1 {
            warn!(place = %place, "the testable parameters '{}' you provided are not into the {}", names, place);
        } else {
            warn!(place = %place, "the testable parameter '{}' you provided is not into the {}", names, place);
        }
    } else if test_parameter.len() != dict.len() {
        for parameter in test_parameter {
            let present = dict.contains_key(parameter)
                || dict.keys().any(|k| k.rsplit(':').next() == Some(parameter.as_str()));
            if !present {
                warn!(place = %place, "the testable parameter '{}' you provided is not into the {}", parameter, place);
            }
        }
    }
}
