//! Daily quote payloads.

use serde::{Deserialize, Serialize};

/// Quote of the day as served by `GET /api/today`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Quote text.
    pub quote: String,
    /// Who said it.
    pub author: String,
}

/// One entry of the upstream ZenQuotes `today` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ZenQuote {
    /// Quote text.
    pub q: String,
    /// Author.
    pub a: String,
}

impl From<ZenQuote> for Quote {
    fn from(z: ZenQuote) -> Self {
        Self {
            quote: z.q,
            author: z.a,
        }
    }
}
