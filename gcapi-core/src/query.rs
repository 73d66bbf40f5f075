//! Request target construction.
//!
//! A [`QueryBuilder`] assembles one [`RequestTarget`] per API call: the
//! versioned path plus an ordered, unique-by-key list of query parameters.
//! Nothing here touches the network or the session.
//!
//! # Example
//!
//! ```rust
//! use gcapi_core::fields::GeocacheField;
//! use gcapi_core::query::{Coordinates, QueryBuilder};
//!
//! let target = QueryBuilder::new("https", "api.groundspeak.com", "geocaches/search")
//!     .radius(Coordinates::new(65.0, 25.4), 10)
//!     .fields(&[GeocacheField::ReferenceCode, GeocacheField::Name])
//!     .paging(0, 50)
//!     .build();
//!
//! assert!(target.to_url().is_ok());
//! ```

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use thiserror::Error;
use url::Url;

use crate::config::ApiEndpointConfig;
use crate::fields::{LogField, QueryToken, TrackableField, join_tokens};

/// Version segment of every API path.
pub const API_VERSION: &str = "v1.0";

/// Characters left as-is in parameter values. `+` is encoded (`%2B`) so the
/// server never reads it as a space.
const QUERY_VALUE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b':')
    .remove(b',')
    .remove(b'(')
    .remove(b')');

/// Characters left as-is in a single path segment.
const PATH_SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Escape a caller-supplied value (a reference code or user) for use as one
/// path segment, so `/`, `?` and `#` cannot change the target.
pub fn path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT_SET).to_string()
}

const FILTER_PARAM: &str = "q";
const FIELDS_PARAM: &str = "fields";
const SPATIAL_FILTER_KEYS: [&str; 3] = ["box", "location", "radius"];

/// Error type for query construction.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A sub-field list was requested before the field list was set.
    #[error("fields must be set before expanding {attribute}")]
    FieldsNotSet { attribute: String },

    /// The assembled target is not a valid URL.
    #[error("invalid request URL {url:?}: {source}")]
    BadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `[lat,lon]` with exactly six decimals.
    ///
    /// Rust float formatting never consults the locale, so the decimal
    /// separator is always `.`.
    pub fn query_string(&self) -> String {
        format!("[{:.6},{:.6}]", self.latitude, self.longitude)
    }
}

/// A fully assembled request location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    scheme: String,
    host: String,
    path: String,
    params: Vec<(String, String)>,
}

impl RequestTarget {
    /// Value of a query parameter, unencoded.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All query parameters in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Path below the host, starting with the version segment.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Render and validate the target.
    pub fn to_url(&self) -> Result<Url, QueryError> {
        let raw = self.to_string();
        Url::parse(&raw).map_err(|source| QueryError::BadUrl { url: raw, source })
    }
}

impl std::fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.host, self.path)?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(
                f,
                "{}{}={}",
                sep,
                utf8_percent_encode(key, QUERY_VALUE_SET),
                utf8_percent_encode(value, QUERY_VALUE_SET)
            )?;
        }
        Ok(())
    }
}

/// Builder for a [`RequestTarget`].
///
/// Setters consume and return the builder. The two that depend on an earlier
/// `fields` call return a `Result`.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    target: RequestTarget,
}

impl QueryBuilder {
    /// Start a target rooted at `{scheme}://{host}/v1.0/{base_path}`.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, base_path: &str) -> Self {
        Self {
            target: RequestTarget {
                scheme: scheme.into(),
                host: host.into(),
                path: format!("{}/{}", API_VERSION, base_path.trim_start_matches('/')),
                params: Vec::new(),
            },
        }
    }

    /// Start a target on the configured API origin.
    pub fn create(config: &ApiEndpointConfig, base_path: &str) -> Self {
        Self::new(config.api_scheme.clone(), config.api_host.clone(), base_path)
    }

    /// Set a parameter, replacing any earlier value for the same key.
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value.into());
        self
    }

    /// Append `+key:value` to the structured `q` filter.
    pub fn filter(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.push_filter(key, value.as_ref());
        self
    }

    /// Set the `fields` selector.
    pub fn fields<T: QueryToken>(self, fields: &[T]) -> Self {
        self.param(FIELDS_PARAM, join_tokens(fields))
    }

    /// Replace the bare `attribute` entry of `fields` with
    /// `attribute[sub,fields]`.
    pub fn expand_field<T: QueryToken>(
        mut self,
        attribute: &str,
        sub_fields: &[T],
    ) -> Result<Self, QueryError> {
        let current = self
            .target
            .param(FIELDS_PARAM)
            .ok_or_else(|| QueryError::FieldsNotSet {
                attribute: attribute.to_string(),
            })?;

        let expanded = format!("{}[{}]", attribute, join_tokens(sub_fields));
        let rewritten = split_top_level(current)
            .into_iter()
            .map(|entry| if entry == attribute { expanded.as_str() } else { entry })
            .collect::<Vec<_>>()
            .join(",");

        self.set(FIELDS_PARAM, rewritten);
        Ok(self)
    }

    /// Inline up to `logs` geocache logs and `trackables` trackables.
    ///
    /// Counts of zero add nothing; when both are zero the builder is returned
    /// unchanged.
    pub fn expansion(
        mut self,
        logs: u32,
        log_fields: &[LogField],
        trackables: u32,
        trackable_fields: &[TrackableField],
    ) -> Result<Self, QueryError> {
        let mut fields = self
            .target
            .param(FIELDS_PARAM)
            .ok_or_else(|| QueryError::FieldsNotSet {
                attribute: "geocachelogs".to_string(),
            })?
            .to_string();

        let mut expand = Vec::new();
        if logs > 0 {
            fields.push_str(&format!(",geocachelogs[{}]", join_tokens(log_fields)));
            expand.push(format!("geocachelogs:{}", logs));
        }
        if trackables > 0 {
            fields.push_str(&format!(",trackables[{}]", join_tokens(trackable_fields)));
            expand.push(format!("trackables:{}", trackables));
        }

        if !expand.is_empty() {
            self.set(FIELDS_PARAM, fields);
            self.set("expand", expand.join(","));
        }
        Ok(self)
    }

    /// Set `skip` and `take`, leaving out either one when it is zero.
    pub fn paging(mut self, skip: u32, take: u32) -> Self {
        if skip > 0 {
            self.set("skip", skip.to_string());
        }
        if take > 0 {
            self.set("take", take.to_string());
        }
        self
    }

    /// Restrict results to a bounding box. Replaces any radius filter.
    pub fn bounding_box(mut self, upper_left: Coordinates, lower_right: Coordinates) -> Self {
        self.remove_spatial_filters();
        let value = format!(
            "[{},{}]",
            upper_left.query_string(),
            lower_right.query_string()
        );
        self.push_filter("box", &value);
        self
    }

    /// Restrict results to a circle. Replaces any bounding box filter.
    pub fn radius(mut self, center: Coordinates, miles: u32) -> Self {
        self.remove_spatial_filters();
        self.push_filter("location", &center.query_string());
        self.push_filter("radius", &format!("{}mi", miles));
        self
    }

    /// Full or lite geocache payloads.
    pub fn lite(self, lite: bool) -> Self {
        self.param("lite", lite.to_string())
    }

    /// Set the `type` parameter.
    pub fn types<T: QueryToken>(self, types: &[T]) -> Self {
        self.param("type", join_tokens(types))
    }

    /// Set the `types` parameter (list kinds).
    pub fn list_types<T: QueryToken>(self, types: &[T]) -> Self {
        self.param("types", join_tokens(types))
    }

    pub fn reference_codes<T: AsRef<str>>(self, codes: &[T]) -> Self {
        self.param("referenceCodes", join_plain(codes))
    }

    pub fn usernames<T: AsRef<str>>(self, names: &[T]) -> Self {
        self.param("usernames", join_plain(names))
    }

    /// Exclude geocaches found by `username`.
    pub fn exclude_found_by(self, username: &str) -> Self {
        self.filter("fby", format!("not({})", username))
    }

    pub fn terrain(self, from: u8, to: u8) -> Self {
        self.filter("terr", format!("{}-{}", from, to))
    }

    pub fn difficulty(self, from: u8, to: u8) -> Self {
        self.filter("diff", format!("{}-{}", from, to))
    }

    pub fn sizes<T: QueryToken>(self, sizes: &[T]) -> Self {
        self.filter("size", join_tokens(sizes))
    }

    pub fn min_favorite_points(self, points: u32) -> Self {
        self.filter("minFav", points.to_string())
    }

    /// Finish construction.
    pub fn build(self) -> RequestTarget {
        self.target
    }

    fn set(&mut self, key: &str, value: String) {
        let params = &mut self.target.params;
        params.retain(|(k, _)| k != key);
        params.push((key.to_string(), value));
    }

    fn push_filter(&mut self, key: &str, value: &str) {
        let mut q = self.target.param(FILTER_PARAM).unwrap_or_default().to_string();
        q.push_str(&format!("+{}:{}", key, value));
        self.set(FILTER_PARAM, q);
    }

    fn remove_spatial_filters(&mut self) {
        let Some(q) = self.target.param(FILTER_PARAM) else {
            return;
        };

        let kept: String = q
            .split('+')
            .filter(|clause| !clause.is_empty())
            .filter(|clause| {
                let key = clause.split(':').next().unwrap_or_default();
                !SPATIAL_FILTER_KEYS.contains(&key)
            })
            .map(|clause| format!("+{}", clause))
            .collect();

        if kept.is_empty() {
            self.target.params.retain(|(k, _)| k != FILTER_PARAM);
        } else {
            self.set(FILTER_PARAM, kept);
        }
    }
}

fn join_plain<T: AsRef<str>>(values: &[T]) -> String {
    values.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}

/// Split on commas that are not inside `[...]`.
fn split_top_level(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}
