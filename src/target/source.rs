use serde::{Deserialize, Serialize};

/// Where a testable value was found in the request description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParameterSource {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "POSTxml")]
    PostXml,
    Cookie,
    #[serde(rename = "User-Agent")]
    UserAgent,
    #[serde(rename = "URI")]
    Uri,
    Direct,
}

impl ParameterSource {
    pub const ALL: [ParameterSource; 7] = [
        Self::Get,
        Self::Post,
        Self::PostXml,
        Self::Cookie,
        Self::UserAgent,
        Self::Uri,
        Self::Direct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::PostXml => "POSTxml",
            Self::Cookie => "Cookie",
            Self::UserAgent => "User-Agent",
            Self::Uri => "URI",
            Self::Direct => "Direct",
        }
    }
}

impl std::fmt::Display for ParameterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ParameterSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown parameter source '{}'", s))
    }
}
