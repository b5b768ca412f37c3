//! Composite ("modified") identifiers.
//!
//! A device type or device can be addressed as a narrowed variant by
//! appending modifier parameters to its id:
//!
//! ```text
//! plug-strip$service_group_selection=sg1
//! ^^^^^^^^^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^
//!  pure id    url-query-encoded modifiers
//! ```
//!
//! These ids are never stored. They are part of the wire contract: every
//! composite id handed to a client must round-trip through [`split`] and
//! [`join`].

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;
use url::form_urlencoded;

/// Separates the pure id from the encoded modifiers
pub const ID_MODIFIER_SEPARATOR: char = '$';

/// Modifier key narrowing to one service group
pub const SERVICE_GROUP_SELECTION: &str = "service_group_selection";

/// Decoded modifier parameters: key → ordered values
pub type ModifierParameters = BTreeMap<String, Vec<String>>;

/// Why a modifier suffix could not be decoded
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModifierError {
    /// `%` not followed by two hex digits
    #[error("invalid escape sequence in {0:?}")]
    InvalidEscape(String),
    /// `;` is not a valid pair separator
    #[error("invalid semicolon separator in {0:?}")]
    Semicolon(String),
    /// Pair with an empty key
    #[error("empty modifier key in {0:?}")]
    EmptyKey(String),
}

/// Strictly decode a url-query-encoded modifier string
pub fn decode(encoded: &str) -> Result<ModifierParameters, ModifierError> {
    let mut params = ModifierParameters::new();
    for pair in encoded.split('&').filter(|p| !p.is_empty()) {
        if pair.contains(';') {
            return Err(ModifierError::Semicolon(pair.to_string()));
        }
        if !has_valid_escapes(pair) {
            return Err(ModifierError::InvalidEscape(pair.to_string()));
        }
        for (key, value) in form_urlencoded::parse(pair.as_bytes()) {
            if key.is_empty() {
                return Err(ModifierError::EmptyKey(pair.to_string()));
            }
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    Ok(params)
}

fn has_valid_escapes(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Canonical encoding: keys sorted, values in order, percent escaped,
/// pairs joined with `&`.
///
/// ```
/// # use devmeta_core::modifier::{encode, ModifierParameters};
/// let mut params = ModifierParameters::new();
/// params.insert("b".to_string(), vec!["2".to_string()]);
/// params.insert("a".to_string(), vec!["x y".to_string(), "z".to_string()]);
/// assert_eq!(encode(&params), "a=x+y&a=z&b=2");
/// ```
pub fn encode(params: &ModifierParameters) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, values) in params {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

/// Split an id into its pure part and its modifiers.
///
/// Ids without separator have no modifiers. A suffix that cannot be decoded
/// is dropped with a warning: the pure id is still returned, as if no
/// modifier had been requested.
///
/// ```
/// # use devmeta_core::modifier::split;
/// let (pure, params) = split("dt1$service_group_selection=sg1");
/// assert_eq!(pure, "dt1");
/// assert_eq!(params.unwrap()["service_group_selection"], vec!["sg1".to_string()]);
///
/// assert_eq!(split("dt1"), ("dt1", None));
/// assert_eq!(split("dt1$bad=%zz"), ("dt1", None));
/// ```
pub fn split(id: &str) -> (&str, Option<ModifierParameters>) {
    let Some((pure_id, encoded)) = id.split_once(ID_MODIFIER_SEPARATOR) else {
        return (id, None);
    };
    match decode(encoded) {
        Ok(params) if params.is_empty() => (pure_id, None),
        Ok(params) => (pure_id, Some(params)),
        Err(e) => {
            warn!(id = %id, error = %e, "Ignoring undecodable id modifier");
            (pure_id, None)
        }
    }
}

/// Append encoded modifiers to a pure id, or return it unchanged when
/// there are none.
///
/// ```
/// # use devmeta_core::modifier::{join, ModifierParameters};
/// assert_eq!(join("dt1", &ModifierParameters::new()), "dt1");
/// ```
pub fn join(pure_id: &str, params: &ModifierParameters) -> String {
    if params.is_empty() {
        pure_id.to_string()
    } else {
        format!("{}{}{}", pure_id, ID_MODIFIER_SEPARATOR, encode(params))
    }
}

/// A recognized modifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    /// Narrow to the services of one service group (plus ungrouped ones)
    ServiceGroupSelection(String),
}

impl Modifier {
    /// Parameter key of this modifier
    pub fn key(&self) -> &'static str {
        match self {
            Modifier::ServiceGroupSelection(_) => SERVICE_GROUP_SELECTION,
        }
    }

    /// Interpret decoded parameters. Unknown keys and keys without a value
    /// are skipped with a warning.
    pub fn from_parameters(params: &ModifierParameters) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        for (key, values) in params {
            match key.as_str() {
                SERVICE_GROUP_SELECTION => match values.as_slice() {
                    [] => warn!(key = %key, "Modifier without value"),
                    [value] => modifiers.push(Modifier::ServiceGroupSelection(value.clone())),
                    [value, ..] => {
                        warn!(key = %key, count = values.len(), "Modifier expects one value, using first");
                        modifiers.push(Modifier::ServiceGroupSelection(value.clone()));
                    }
                },
                _ => warn!(key = %key, "Unknown id modifier"),
            }
        }
        modifiers
    }

    /// Encode modifiers as parameters
    pub fn to_parameters(modifiers: &[Modifier]) -> ModifierParameters {
        let mut params = ModifierParameters::new();
        for modifier in modifiers {
            match modifier {
                Modifier::ServiceGroupSelection(key) => params
                    .entry(modifier.key().to_string())
                    .or_default()
                    .push(key.clone()),
            }
        }
        params
    }
}

/// Composite id addressing the service group `key` of `pure_id`.
///
/// ```
/// # use devmeta_core::modifier::service_group_selection_id;
/// assert_eq!(
///     service_group_selection_id("plug-strip", "sg1"),
///     "plug-strip$service_group_selection=sg1"
/// );
/// ```
pub fn service_group_selection_id(pure_id: &str, key: &str) -> String {
    join(
        pure_id,
        &Modifier::to_parameters(&[Modifier::ServiceGroupSelection(key.to_string())]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(pairs: &[(&str, &[&str])]) -> ModifierParameters {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn round_trip_preserves_parameters() {
        let cases = vec![
            params(&[("service_group_selection", &["sg1"])]),
            params(&[("a", &["1", "2"]), ("b", &["x&y=z"])]),
            params(&[("key with space", &["välue/ü$"])]),
        ];
        for p in cases {
            let id = join("urn:infai:ses:device-type:1", &p);
            let (pure, decoded) = split(&id);
            assert_eq!(pure, "urn:infai:ses:device-type:1");
            assert_eq!(decoded, Some(p));
        }
    }

    #[test]
    fn split_uses_first_separator() {
        let (pure, decoded) = split("dt1$k=a$b");
        assert_eq!(pure, "dt1");
        assert_eq!(decoded, Some(params(&[("k", &["a$b"])])));
    }

    #[test]
    fn split_degrades_on_malformed_suffix() {
        assert_eq!(split("dt1$k=1;j=2"), ("dt1", None));
        assert_eq!(split("dt1$=value"), ("dt1", None));
        assert_eq!(split("dt1$k=%4"), ("dt1", None));
        assert_eq!(split("dt1$"), ("dt1", None));
    }

    #[test]
    fn encode_sorts_keys() {
        let p = params(&[("z", &["1"]), ("a", &["2"]), ("m", &["3", "0"])]);
        assert_eq!(encode(&p), "a=2&m=3&m=0&z=1");
    }

    #[test]
    fn multiple_keys_joined_with_ampersand() {
        let p = params(&[("service_group_selection", &["sg1"]), ("x", &["y"])]);
        assert_eq!(join("dt", &p), "dt$service_group_selection=sg1&x=y");
    }

    #[test]
    fn modifiers_from_parameters() {
        let p = params(&[
            ("service_group_selection", &["sg1", "sg2"]),
            ("unknown", &["x"]),
        ]);
        assert_eq!(
            Modifier::from_parameters(&p),
            vec![Modifier::ServiceGroupSelection("sg1".to_string())]
        );
        assert!(Modifier::from_parameters(&params(&[("service_group_selection", &[])])).is_empty());
    }
}
