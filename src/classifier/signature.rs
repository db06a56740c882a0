use std::sync::OnceLock;

use woothee::parser::Parser;

use super::{Classification, Classifier};

const WOOTHEE_CRAWLER: &str = "crawler";
const WOOTHEE_UNKNOWN: &str = "UNKNOWN";

static PARSER: OnceLock<Parser> = OnceLock::new();

/// Shared woothee parser, built on first use
fn parser() -> &'static Parser {
    PARSER.get_or_init(Parser::new)
}

/// Signature based classifier.
///
/// Extra signatures are checked first as case-insensitive substrings and the
/// matched signature becomes the crawler name. Anything else is looked up in
/// the woothee user-agent database.
#[derive(Debug, Clone, Default)]
pub struct SignatureClassifier {
    /// (lowercased needle, display name)
    signatures: Vec<(String, String)>,
}

impl SignatureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signatures<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let signatures = signatures
            .into_iter()
            .map(Into::into)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| (s.to_lowercase(), s))
            .collect();

        Self { signatures }
    }

    fn match_signature(&self, user_agent: &str) -> Option<&str> {
        if self.signatures.is_empty() {
            return None;
        }

        let lowered = user_agent.to_lowercase();
        self.signatures
            .iter()
            .find(|(needle, _)| lowered.contains(needle.as_str()))
            .map(|(_, name)| name.as_str())
    }
}

impl Classifier for SignatureClassifier {
    fn classify(&self, user_agent: &str) -> Classification {
        let user_agent = user_agent.trim();
        if user_agent.is_empty() {
            return Classification::Human;
        }

        if let Some(name) = self.match_signature(user_agent) {
            return Classification::Crawler {
                name: name.to_string(),
            };
        }

        match parser().parse(user_agent) {
            Some(result) if result.category == WOOTHEE_CRAWLER => {
                let name = if result.name.is_empty() || result.name == WOOTHEE_UNKNOWN {
                    WOOTHEE_CRAWLER.to_string()
                } else {
                    result.name.to_string()
                };
                Classification::Crawler { name }
            }
            _ => Classification::Human,
        }
    }
}
