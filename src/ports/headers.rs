//! Inbound request header lookup used to build the VAU-CID.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read-only view of the request headers of the M1 request.
///
/// Header names are case-insensitive in HTTP; implementations try the exact
/// name first and fall back to an ASCII case-insensitive scan.
pub trait RequestHeaders {
    fn header(&self, name: &str) -> Option<&str>;
}

fn scan<'a>(mut entries: impl Iterator<Item = (&'a String, &'a String)>, name: &str) -> Option<&'a str> {
    entries
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

impl<S: BuildHasher> RequestHeaders for HashMap<String, String, S> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(String::as_str)
            .or_else(|| scan(self.iter(), name))
    }
}

impl RequestHeaders for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(String::as_str)
            .or_else(|| scan(self.iter(), name))
    }
}

impl RequestHeaders for [(&str, &str)] {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}
