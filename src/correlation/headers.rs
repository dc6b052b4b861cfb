//! The resolved correlation header set.
//!
//! Holds the headers found (or synthesized) for one request, in the order
//! they were resolved, plus the subset of names that must be echoed on the
//! response and on downstream requests.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Correlation headers resolved for a single request.
///
/// Header names are `HeaderName`s, so identity is case-insensitive. A name
/// appears at most once; the first insertion wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationHeaders {
    entries: Vec<(HeaderName, Vec<String>)>,
    required: Vec<HeaderName>,
    primary: Option<String>,
}

impl CorrelationHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header unless its name is already present.
    ///
    /// Empty values are dropped. Returns `true` if the header was inserted.
    pub fn insert_if_absent<I, V>(&mut self, name: HeaderName, values: I) -> bool
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        if self.contains(&name) {
            return false;
        }
        let values = values
            .into_iter()
            .map(Into::into)
            .filter(|v| !v.is_empty())
            .collect();
        self.entries.push((name, values));
        true
    }

    /// Flag a header name as required on egress.
    pub fn mark_required(&mut self, name: HeaderName) {
        if !self.required.contains(&name) {
            self.required.push(name);
        }
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Values for a header, if present.
    pub fn get(&self, name: &HeaderName) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn is_required(&self, name: &HeaderName) -> bool {
        self.required.contains(name)
    }

    /// Names flagged as required, in the order they were flagged.
    pub fn required_names(&self) -> &[HeaderName] {
        &self.required
    }

    /// Entries in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &[String])> {
        self.entries.iter().map(|(n, v)| (n, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The primary correlation identifier.
    ///
    /// For a resolved set this is the identifier the resolver settled on.
    /// Otherwise it is the first value of the first entry.
    pub fn primary_id(&self) -> Option<&str> {
        self.primary.as_deref().or_else(|| self.first_value())
    }

    /// Project the required headers into a new set.
    ///
    /// Every entry of the projection is required.
    pub fn required_subset(&self) -> Self {
        let entries: Vec<_> = self
            .entries
            .iter()
            .filter(|(name, _)| self.required.contains(name))
            .cloned()
            .collect();
        let required = entries.iter().map(|(name, _)| name.clone()).collect();

        Self {
            entries,
            required,
            primary: self.primary.clone(),
        }
    }

    /// Copy every required header the target does not already carry.
    ///
    /// Existing headers on the target are never touched.
    pub fn merge_into(&self, target: &mut HeaderMap) {
        for (name, values) in &self.entries {
            if !self.required.contains(name) || target.contains_key(name) {
                continue;
            }
            for value in values {
                match HeaderValue::from_str(value) {
                    Ok(value) => {
                        target.append(name.clone(), value);
                    }
                    Err(_) => {
                        tracing::warn!(
                            header = %name,
                            "Correlation value is not a valid header value, skipping"
                        );
                    }
                }
            }
        }
    }

    /// The required headers as a standalone `HeaderMap`.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        self.merge_into(&mut map);
        map
    }

    pub(crate) fn set_primary(&mut self, id: String) {
        self.primary = Some(id);
    }

    /// Give `name` the single value `id` if it is missing or has no values.
    pub(crate) fn populate(&mut self, name: &HeaderName, id: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, values)) if values.is_empty() => values.push(id.to_string()),
            Some(_) => {}
            None => self.entries.push((name.clone(), vec![id.to_string()])),
        }
    }

    /// Drop entries left without any value.
    pub(crate) fn prune_empty(&mut self) {
        self.entries.retain(|(_, values)| !values.is_empty());
    }

    /// First value of the first-inserted entry.
    pub(crate) fn first_value(&self) -> Option<&str> {
        self.entries
            .first()
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}
