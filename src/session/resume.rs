use tracing::{info, warn};

use crate::target::{Dbms, InjectionType, ParameterSource, TargetState};

/// Receives every accepted session-log record, including values that a
/// longer duplicate later supersedes. Implementations must be idempotent.
pub trait ResumeSink {
    fn resume(&mut self, expression: &str, url: &str, value: &str);
}

/// Sink that ignores everything; used for read-only session inspection.
pub struct NoResume;

impl ResumeSink for NoResume {
    fn resume(&mut self, _expression: &str, _url: &str, _value: &str) {}
}

impl<F> ResumeSink for F
where
    F: FnMut(&str, &str, &str),
{
    fn resume(&mut self, expression: &str, url: &str, value: &str) {
        self(expression, url, value)
    }
}

/// Absorbs fingerprint and injection-point records for the current target
/// URL into its [`TargetState`].
pub struct TargetResumer<'a> {
    state: &'a mut TargetState,
    url: &'a str,
    forced_dbms: Option<Dbms>,
}

impl<'a> TargetResumer<'a> {
    pub fn new(state: &'a mut TargetState, url: &'a str, forced_dbms: Option<Dbms>) -> Self {
        Self { state, url, forced_dbms }
    }

    fn resume_place(&mut self, value: &str) {
        let place = match value.parse::<ParameterSource>() {
            Ok(place) => place,
            Err(e) => {
                warn!("unable to resume injection point: {}", e);
                return;
            }
        };
        if !self.state.parameters.is_testable(place) {
            warn!(
                "there is an injection in {} parameter but you did not provided it this time",
                place
            );
            return;
        }
        if self.state.inj_place != Some(place) {
            info!("resuming injection point '{}' from session file", place);
        }
        self.state.inj_place = Some(place);
    }

    fn resume_parameter(&mut self, value: &str) {
        if let Some(place) = self.state.inj_place {
            let provided = self
                .state
                .parameters
                .testable(place)
                .is_some_and(|dict| dict.contains_key(value));
            if !provided {
                warn!(
                    "there is an injection in {} parameter '{}' but you did not provided it this time",
                    place, value
                );
                return;
            }
        }
        if self.state.inj_parameter.as_deref() != Some(value) {
            info!("resuming injection parameter '{}' from session file", value);
        }
        self.state.inj_parameter = Some(value.to_string());
    }

    fn resume_dbms(&mut self, value: &str) {
        let Some((dbms, version)) = Dbms::parse_fingerprint(value) else {
            warn!("unable to resume back-end DBMS '{}': unsupported DBMS", value);
            return;
        };
        if let Some(forced) = self.forced_dbms {
            if forced != dbms {
                warn!(
                    "you provided '{}' as back-end DBMS, but from a past scan information on the target URL sqlsentry assumes the back-end DBMS is {}. Ignoring the session value",
                    forced, dbms
                );
                return;
            }
        }
        if self.state.dbms != Some(dbms) || self.state.dbms_version != version {
            info!("resuming back-end DBMS '{}' from session file", value);
        }
        self.state.dbms = Some(dbms);
        self.state.dbms_version = version;
        self.state.dbms_detected = true;
    }
}

fn parse_number(expression: &str, value: &str) -> Option<u32> {
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("invalid '{}' value '{}' in session file", expression, value);
            None
        }
    }
}

impl ResumeSink for TargetResumer<'_> {
    fn resume(&mut self, expression: &str, url: &str, value: &str) {
        if url != self.url {
            return;
        }

        match expression {
            "Injection point" => self.resume_place(value),
            "Injection parameter" => self.resume_parameter(value),
            "Injection type" => match value.parse::<InjectionType>() {
                Ok(kind) => self.state.inj_type = Some(kind),
                Err(e) => warn!("unable to resume injection type: {}", e),
            },
            "Parenthesis" => {
                if let Some(n) = parse_number(expression, value) {
                    self.state.parenthesis = Some(n);
                }
            }
            "DBMS" => self.resume_dbms(value),
            "Union comment" => self.state.union.comment = value.to_string(),
            "Union count" => {
                if let Some(n) = parse_number(expression, value) {
                    self.state.union.count = Some(n);
                }
            }
            "Union position" => {
                if let Some(n) = parse_number(expression, value) {
                    self.state.union.position = Some(n);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::ParamDict;

    const URL: &str = "http://x/a.php?id=1";

    fn state_with_get_id() -> TargetState {
        let mut state = TargetState::new();
        state.parameters.raw.insert(ParameterSource::Get, "id=1".into());
        state.parameters.testable.insert(
            ParameterSource::Get,
            ParamDict::from([("id".to_string(), "1".to_string())]),
        );
        state
    }

    #[test]
    fn test_resume_injection_point_and_parameter() {
        let mut state = state_with_get_id();
        let mut resumer = TargetResumer::new(&mut state, URL, None);
        resumer.resume("Injection point", URL, "GET");
        resumer.resume("Injection parameter", URL, "id");
        resumer.resume("Injection type", URL, "numeric");
        resumer.resume("Parenthesis", URL, "1");
        assert_eq!(state.inj_place, Some(ParameterSource::Get));
        assert_eq!(state.inj_parameter.as_deref(), Some("id"));
        assert_eq!(state.inj_type, Some(InjectionType::Numeric));
        assert_eq!(state.parenthesis, Some(1));
    }

    #[test]
    fn test_place_not_provided_this_time_is_ignored() {
        let mut state = state_with_get_id();
        let mut resumer = TargetResumer::new(&mut state, URL, None);
        resumer.resume("Injection point", URL, "Cookie");
        resumer.resume("Injection point", URL, "GET");
        resumer.resume("Injection parameter", URL, "name");
        assert_eq!(state.inj_place, Some(ParameterSource::Get));
        assert_eq!(state.inj_parameter, None);
    }

    #[test]
    fn test_resume_dbms() {
        let mut state = state_with_get_id();
        let mut resumer = TargetResumer::new(&mut state, URL, None);
        resumer.resume("DBMS", URL, "MySQL 5.0");
        assert_eq!(state.dbms, Some(Dbms::MySQL));
        assert_eq!(state.dbms_version, vec!["5.0".to_string()]);
        assert!(state.dbms_detected);
    }

    #[test]
    fn test_forced_dbms_wins() {
        let mut state = state_with_get_id();
        let mut resumer = TargetResumer::new(&mut state, URL, Some(Dbms::PostgreSQL));
        resumer.resume("DBMS", URL, "MySQL 5.0");
        assert_eq!(state.dbms, None);
        assert!(!state.dbms_detected);
    }

    #[test]
    fn test_other_urls_and_expressions_ignored() {
        let mut state = state_with_get_id();
        let mut resumer = TargetResumer::new(&mut state, URL, None);
        resumer.resume("DBMS", "x", "MySQL");
        resumer.resume("SELECT user()", URL, "root@localhost");
        resumer.resume("Union count", URL, "many");
        assert!(state.dbms.is_none());
        assert_eq!(state.union.count, None);
    }

    #[test]
    fn test_union_metadata_idempotent() {
        let mut state = state_with_get_id();
        let mut resumer = TargetResumer::new(&mut state, URL, None);
        for _ in 0..2 {
            resumer.resume("Union comment", URL, "--");
            resumer.resume("Union count", URL, "3");
            resumer.resume("Union position", URL, "2");
        }
        assert_eq!(state.union.comment, "--");
        assert_eq!(state.union.count, Some(3));
        assert_eq!(state.union.position, Some(2));
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        let mut sink = |expression: &str, url: &str, value: &str| {
            seen.push(format!("{url}|{expression}|{value}"));
        };
        sink.resume("id", "http://x/", "AA");
        assert_eq!(seen, vec!["http://x/|id|AA".to_string()]);
    }
}
