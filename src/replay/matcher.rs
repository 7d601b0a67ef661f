//! Recorded entry selection.
//!
//! # Pipeline
//! ```text
//! (url, method) ─▶ lookup_candidates   exact key, then http:// → https://
//!               ─▶ narrow_by_cookies   exact cookie-set matches, if any
//!                                      (skipped when the request has none)
//!               ─▶ select_by_method    GET: first with a body; POST: first
//! ```
//!
//! # Design Decisions
//! - Each step is a pure function over the candidate list
//! - Cookie narrowing is soft: with no exact match all candidates stay
//! - A request without cookies skips narrowing entirely
//! - POST bodies are not compared; the first POST in capture order wins
//! - Methods other than GET and POST never match

use crate::archive::index::ArchiveIndex;
use crate::archive::model::Entry;
use crate::replay::cookies::CookieSet;

/// Select the recorded entry that best answers a request.
pub fn match_request<'a>(
    index: &'a ArchiveIndex,
    url: &str,
    method: &str,
    cookies: &CookieSet,
) -> Option<&'a Entry> {
    let candidates = lookup_candidates(index, url, method)?;
    let narrowed = narrow_by_cookies(candidates, cookies);
    select_by_method(method, &narrowed)
}

/// Entries for the exact key; an `http://` URL also tries its `https://`
/// twin.
pub fn lookup_candidates<'a>(index: &'a ArchiveIndex, url: &str, method: &str) -> Option<&'a [Entry]> {
    index.lookup(url, method).or_else(|| {
        let rest = url.strip_prefix("http://")?;
        index.lookup(&format!("https://{rest}"), method)
    })
}

/// Candidates whose recorded request cookies equal the caller's, or all of
/// them when none do. A request without cookies keeps every candidate.
/// Capture order is preserved.
pub fn narrow_by_cookies<'a>(candidates: &'a [Entry], cookies: &CookieSet) -> Vec<&'a Entry> {
    if cookies.is_empty() {
        return candidates.iter().collect();
    }

    let exact: Vec<&Entry> = candidates
        .iter()
        .filter(|e| CookieSet::from_recorded(&e.request.cookies) == *cookies)
        .collect();

    if exact.is_empty() {
        candidates.iter().collect()
    } else {
        exact
    }
}

/// Tie-break rule for a request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// First candidate with a non-empty body, else the first candidate.
    PreferBody,
    /// First candidate.
    First,
}

impl Selection {
    /// Rule for `method`, or `None` when the method is not replayed.
    pub fn for_method(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Self::PreferBody),
            "POST" => Some(Self::First),
            _ => None,
        }
    }

    pub fn select<'a>(self, candidates: &[&'a Entry]) -> Option<&'a Entry> {
        match self {
            Self::PreferBody => candidates
                .iter()
                .find(|e| e.response.content.has_body())
                .or_else(|| candidates.first())
                .copied(),
            Self::First => candidates.first().copied(),
        }
    }
}

pub fn select_by_method<'a>(method: &str, candidates: &[&'a Entry]) -> Option<&'a Entry> {
    Selection::for_method(method)?.select(candidates)
}
