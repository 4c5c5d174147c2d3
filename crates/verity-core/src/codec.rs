//! Model codec: JSON decoding, strict DTOs, polymorphic dispatch and the
//! typed helpers for references and auto-assigned fields.
//!
//! # Strict and permissive models
//!
//! A model with required properties is *strict*: it rejects unknown keys and
//! reports the first missing required property by name. Declare one with
//! `#[serde(remote = "Self", deny_unknown_fields)]` and [`strict_model!`]:
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use verity_core::strict_model;
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! #[serde(remote = "Self", deny_unknown_fields)]
//! pub struct Credentials {
//!     pub username: String,
//!     pub password: String,
//! }
//!
//! strict_model!(Credentials, ["username", "password"]);
//!
//! let err = verity_core::codec::decode::<Credentials>(br#"{"username":"admin"}"#, None)
//!     .unwrap_err();
//! assert_eq!(err, verity_core::Error::MissingRequired("password".into()));
//! ```
//!
//! Every other model is *permissive* and keeps unknown keys in a trailing
//! `#[serde(flatten)] additional_properties` map.

use crate::content::{is_json_mime, is_xml_mime};
use crate::error::{Error, Result};
use crate::nullable::Nullable;
use regex::Regex;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Models that require certain properties to be present.
pub trait RequiredProperties {
    /// Wire names of the required properties.
    const REQUIRED: &'static [&'static str];
}

/// Fail with a "no value given for required property" error for the first
/// required key absent from a JSON object.
///
/// Non-object inputs pass through so the typed decoder reports them.
///
/// # Errors
///
/// Returns a custom deserializer error naming the missing property.
pub fn check_required<E: de::Error>(
    value: &serde_json::Value,
    required: &[&str],
) -> std::result::Result<(), E> {
    let Some(object) = value.as_object() else {
        return Ok(());
    };
    match required.iter().find(|key| !object.contains_key(**key)) {
        Some(missing) => Err(E::custom(format!(
            "no value given for required property `{missing}`"
        ))),
        None => Ok(()),
    }
}

fn classified_error_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(
            r"(no value given for required property|ambiguous oneOf payload for|no matching variant for) `([^`]+)`",
        )
        .expect("codec error regex must compile")
    })
}

/// Map a serde error onto the error taxonomy.
///
/// Missing required properties and polymorphic dispatch failures keep their
/// own variants even when raised by a nested model.
#[must_use]
pub fn classify_decode_error(err: &serde_json::Error) -> Error {
    let message = err.to_string();
    if let Some(caps) = classified_error_regex().captures(&message) {
        let name = caps[2].to_string();
        return match &caps[1] {
            "no value given for required property" => Error::MissingRequired(name),
            "ambiguous oneOf payload for" => Error::AmbiguousOneOf(name),
            _ => Error::NoMatchingVariant(name),
        };
    }
    Error::Decoding(message)
}

/// Decode a response body into `T` according to its content type.
///
/// JSON-family types and an absent content type decode as JSON. XML is not
/// supported.
///
/// # Errors
///
/// Returns a decoding-kind error when the body does not match `T` or the
/// content type cannot be decoded.
pub fn decode<T: DeserializeOwned>(body: &[u8], content_type: Option<&str>) -> Result<T> {
    match content_type.map(str::trim).filter(|ct| !ct.is_empty()) {
        None => decode_json(body),
        Some(ct) if is_json_mime(ct) => decode_json(body),
        Some(ct) if is_xml_mime(ct) => Err(Error::Decoding(format!(
            "XML responses are not supported (content type `{ct}`)"
        ))),
        Some(ct) => Err(Error::Decoding(format!(
            "undefined response type `{ct}`"
        ))),
    }
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|err| classify_decode_error(&err))
}

/// Decode a body as UTF-8 text regardless of its content type.
///
/// # Errors
///
/// Returns [`Error::Decoding`] if the body is not valid UTF-8.
pub fn decode_text(body: &[u8]) -> Result<String> {
    String::from_utf8(body.to_vec()).map_err(|err| Error::Decoding(err.to_string()))
}

/// Encode a value as a JSON body.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the value cannot be serialized.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|err| Error::InvalidArgument(format!("failed to encode body: {err}")))
}

#[doc(hidden)]
pub mod __private {
    pub use serde_json::Value;

    pub fn try_variant<T: serde::de::DeserializeOwned>(value: &Value) -> Option<T> {
        <T as serde::Deserialize>::deserialize(value).ok()
    }
}

/// Implement [`RequiredProperties`], `Serialize` and `Deserialize` for a
/// model derived with `#[serde(remote = "Self", deny_unknown_fields)]`.
///
/// Deserialization first checks the listed keys against the raw object and
/// then decodes strictly.
#[macro_export]
macro_rules! strict_model {
    ($ty:ident, [$($field:literal),* $(,)?]) => {
        impl $crate::codec::RequiredProperties for $ty {
            const REQUIRED: &'static [&'static str] = &[$($field),*];
        }

        impl ::serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                $ty::serialize(self, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let value = <$crate::codec::__private::Value as ::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                $crate::codec::check_required::<D::Error>(
                    &value,
                    <Self as $crate::codec::RequiredProperties>::REQUIRED,
                )?;
                $ty::deserialize(value).map_err(<D::Error as ::serde::de::Error>::custom)
            }
        }
    };
}

/// Declare a oneOf model: an enum whose payload is exactly one variant.
///
/// Serialization writes the active variant directly. Deserialization tries
/// every variant; exactly one must succeed.
#[macro_export]
macro_rules! one_of {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident($ty:ty)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $($(#[$vmeta])* $variant($ty)),+
        }

        impl $name {
            /// Decode from a JSON value, requiring exactly one matching variant.
            ///
            /// # Errors
            ///
            /// Returns `AmbiguousOneOf` or `NoMatchingVariant`.
            pub fn from_value(
                value: &$crate::codec::__private::Value,
            ) -> $crate::Result<Self> {
                let mut matched = ::std::vec::Vec::new();
                $(
                    if let Some(inner) = $crate::codec::__private::try_variant::<$ty>(value) {
                        matched.push(Self::$variant(inner));
                    }
                )+
                match matched.len() {
                    0 => Err($crate::Error::NoMatchingVariant(stringify!($name).to_string())),
                    1 => Ok(matched.remove(0)),
                    _ => Err($crate::Error::AmbiguousOneOf(stringify!($name).to_string())),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                match self {
                    $(Self::$variant(inner) => ::serde::Serialize::serialize(inner, serializer)),+
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let value = <$crate::codec::__private::Value as ::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                Self::from_value(&value).map_err(|err| {
                    let message = match err {
                        $crate::Error::AmbiguousOneOf(name) => {
                            format!("ambiguous oneOf payload for `{name}`")
                        }
                        _ => format!("no matching variant for `{}`", stringify!($name)),
                    };
                    <D::Error as ::serde::de::Error>::custom(message)
                })
            }
        }
    };
}

/// Declare an anyOf model: a struct holding every variant that matched.
///
/// At least one variant must match on decode. Serialization writes the first
/// present variant.
#[macro_export]
macro_rules! any_of {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$fmeta:meta])* $field:ident: $ty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $($(#[$fmeta])* pub $field: ::std::option::Option<$ty>),+
        }

        impl $name {
            /// Decode from a JSON value, keeping every matching variant.
            ///
            /// # Errors
            ///
            /// Returns `NoMatchingVariant` when no variant matches.
            pub fn from_value(
                value: &$crate::codec::__private::Value,
            ) -> $crate::Result<Self> {
                let decoded = Self {
                    $($field: $crate::codec::__private::try_variant::<$ty>(value)),+
                };
                if decoded.is_empty() {
                    return Err($crate::Error::NoMatchingVariant(stringify!($name).to_string()));
                }
                Ok(decoded)
            }

            /// True when no variant is present.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())+
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                $(
                    if let Some(inner) = &self.$field {
                        return ::serde::Serialize::serialize(inner, serializer);
                    }
                )+
                Err(<S::Error as ::serde::ser::Error>::custom(concat!(
                    "no variant of `", stringify!($name), "` is set"
                )))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let value = <$crate::codec::__private::Value as ::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                Self::from_value(&value).map_err(|_| {
                    <D::Error as ::serde::de::Error>::custom(concat!(
                        "no matching variant for `", stringify!($name), "`"
                    ))
                })
            }
        }
    };
}

/// Kind of object a reference points at, as carried in `<field>_ref_type_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// `badge`
    Badge,
    /// `device_settings`
    DeviceSettings,
    /// `endpoint`
    Endpoint,
    /// `endpoint_bundle`
    EndpointBundle,
    /// `eth_port_profile_`
    EthPortProfile,
    /// `eth_port_settings`
    EthPortSettings,
    /// `gateway`
    Gateway,
    /// `gateway_profile`
    GatewayProfile,
    /// `lag`
    Lag,
    /// `route_map`
    RouteMap,
    /// `service`
    Service,
    /// `switchpoint`
    Switchpoint,
    /// `tenant`
    Tenant,
    /// Any type this client does not know yet
    Other(String),
}

impl ResourceType {
    /// Wire form of the type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Badge => "badge",
            Self::DeviceSettings => "device_settings",
            Self::Endpoint => "endpoint",
            Self::EndpointBundle => "endpoint_bundle",
            Self::EthPortProfile => "eth_port_profile_",
            Self::EthPortSettings => "eth_port_settings",
            Self::Gateway => "gateway",
            Self::GatewayProfile => "gateway_profile",
            Self::Lag => "lag",
            Self::RouteMap => "route_map",
            Self::Service => "service",
            Self::Switchpoint => "switchpoint",
            Self::Tenant => "tenant",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for ResourceType {
    fn from(s: &str) -> Self {
        match s {
            "badge" => Self::Badge,
            "device_settings" => Self::DeviceSettings,
            "endpoint" => Self::Endpoint,
            "endpoint_bundle" => Self::EndpointBundle,
            "eth_port_profile_" => Self::EthPortProfile,
            "eth_port_settings" => Self::EthPortSettings,
            "gateway" => Self::Gateway,
            "gateway_profile" => Self::GatewayProfile,
            "lag" => Self::Lag,
            "route_map" => Self::RouteMap,
            "service" => Self::Service,
            "switchpoint" => Self::Switchpoint,
            "tenant" => Self::Tenant,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for ResourceType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResourceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// A pointer to another object together with the object's type.
///
/// On the wire this is the pair `<field>` and `<field>_ref_type_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Type of the referenced object
    pub target: ResourceType,
    /// Name of the referenced object
    pub name: String,
}

impl Reference {
    /// Create a reference.
    pub fn new(target: ResourceType, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
        }
    }

    /// Rebuild a reference from its wire pair.
    ///
    /// Returns `None` when the name is absent or empty or the type is absent.
    #[must_use]
    pub fn from_wire(name: Option<&str>, ref_type: Option<&str>) -> Option<Self> {
        let name = name.filter(|n| !n.is_empty())?;
        Some(Self::new(ResourceType::from(ref_type?), name))
    }

    /// Split an optional reference into its wire pair; `None` leaves both
    /// fields absent.
    #[must_use]
    pub fn into_wire(reference: Option<Self>) -> (Option<String>, Option<String>) {
        match reference {
            Some(Self { target, name }) => (Some(name), Some(target.as_str().to_string())),
            None => (None, None),
        }
    }
}

/// A value the server may assign on its own.
///
/// On the wire this is the pair `<field>` and `<field>_auto_assigned_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment<T> {
    /// Let the server choose
    Auto,
    /// Use this value
    Explicit(T),
}

impl<T> Assignment<T> {
    /// Rebuild from the wire pair.
    ///
    /// Returns `None` when the value is not auto-assigned and carries no
    /// value.
    #[must_use]
    pub fn from_wire(value: Nullable<T>, auto_assigned: Option<bool>) -> Option<Self> {
        if auto_assigned == Some(true) {
            return Some(Self::Auto);
        }
        value.into_option().map(Self::Explicit)
    }

    /// Split into the wire pair. `Auto` sends an explicit `null` value.
    #[must_use]
    pub fn into_wire(self) -> (Nullable<T>, Option<bool>) {
        match self {
            Self::Auto => (Nullable::Null, Some(true)),
            Self::Explicit(value) => (Nullable::Value(value), Some(false)),
        }
    }
}

/// Generate typed accessors for a `<field>` / `<field>_ref_type_` pair.
///
/// Both fields must be `Option<String>`.
#[macro_export]
macro_rules! reference_field {
    ($ty:ty { $getter:ident, $setter:ident => $field:ident, $ref_field:ident }) => {
        impl $ty {
            #[doc = concat!("`", stringify!($field), "` as a typed reference.")]
            #[must_use]
            pub fn $getter(&self) -> ::std::option::Option<$crate::codec::Reference> {
                $crate::codec::Reference::from_wire(
                    self.$field.as_deref(),
                    self.$ref_field.as_deref(),
                )
            }

            #[doc = concat!("Set `", stringify!($field), "` and its reference type.")]
            pub fn $setter(&mut self, reference: ::std::option::Option<$crate::codec::Reference>) {
                let (name, ref_type) = $crate::codec::Reference::into_wire(reference);
                self.$field = name;
                self.$ref_field = ref_type;
            }
        }
    };
}

/// Generate typed accessors for a `<field>` / `<field>_auto_assigned_` pair.
///
/// The value field must be `Nullable<T>` and the flag `Option<bool>`.
#[macro_export]
macro_rules! auto_assigned_field {
    ($ty:ty { $getter:ident, $setter:ident => $field:ident: $inner:ty, $flag:ident }) => {
        impl $ty {
            #[doc = concat!("`", stringify!($field), "` as an assignment.")]
            #[must_use]
            pub fn $getter(&self) -> ::std::option::Option<$crate::codec::Assignment<$inner>> {
                $crate::codec::Assignment::from_wire(self.$field.clone(), self.$flag)
            }

            #[doc = concat!("Set `", stringify!($field), "` and its auto-assignment flag.")]
            pub fn $setter(&mut self, assignment: $crate::codec::Assignment<$inner>) {
                let (value, flag) = assignment.into_wire();
                self.$field = value;
                self.$flag = flag;
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(remote = "Self", deny_unknown_fields)]
    struct Credentials {
        username: String,
        password: String,
    }

    crate::strict_model!(Credentials, ["username", "password"]);

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(remote = "Self", deny_unknown_fields)]
    struct LoginRequest {
        auth: Credentials,
    }

    crate::strict_model!(LoginRequest, ["auth"]);

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Connection {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        #[serde(
            rename = "endpoint_ref_type_",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        endpoint_ref_type: Option<String>,
        #[serde(default, skip_serializing_if = "Nullable::is_absent")]
        vni: Nullable<i32>,
        #[serde(
            rename = "vni_auto_assigned_",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        vni_auto_assigned: Option<bool>,
        #[serde(flatten)]
        additional_properties: BTreeMap<String, serde_json::Value>,
    }

    crate::reference_field!(Connection { endpoint_reference, set_endpoint_reference => endpoint, endpoint_ref_type });
    crate::auto_assigned_field!(Connection { vni_assignment, set_vni_assignment => vni: i32, vni_auto_assigned });

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(remote = "Self", deny_unknown_fields)]
    struct TokenReply {
        token: String,
    }

    crate::strict_model!(TokenReply, ["token"]);

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(remote = "Self", deny_unknown_fields)]
    struct FailureReply {
        error: String,
    }

    crate::strict_model!(FailureReply, ["error"]);

    crate::one_of! {
        enum Reply {
            Token(TokenReply),
            Failure(FailureReply),
        }
    }

    crate::one_of! {
        enum Loose {
            Text(String),
            Words(String),
        }
    }

    crate::any_of! {
        struct Flexible {
            number: i64,
            float: f64,
        }
    }

    #[test]
    fn strict_model_round_trips() {
        let creds = Credentials {
            username: "admin".into(),
            password: "secret".into(),
        };
        let bytes = encode_json(&creds).unwrap();
        assert_eq!(decode::<Credentials>(&bytes, Some("application/json")).unwrap(), creds);
    }

    #[test]
    fn strict_model_reports_missing_required() {
        let err = decode::<Credentials>(br#"{"username":"admin"}"#, None).unwrap_err();
        assert_eq!(err, Error::MissingRequired("password".into()));
    }

    #[test]
    fn nested_missing_required_is_reported() {
        let err = decode::<LoginRequest>(br#"{"auth":{"username":"admin"}}"#, None).unwrap_err();
        assert_eq!(err, Error::MissingRequired("password".into()));
        assert_eq!(err.kind(), crate::error::ErrorKind::Decoding);
    }

    #[test]
    fn strict_model_rejects_unknown_fields() {
        let err = decode::<Credentials>(
            br#"{"username":"a","password":"b","otp":"c"}"#,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Decoding(ref msg) if msg.contains("otp")));
    }

    #[test]
    fn permissive_model_keeps_unknown_fields() {
        let payload = json!({"endpoint": "sw1", "endpoint_ref_type_": "switchpoint", "color": "blue"});
        let conn: Connection = serde_json::from_value(payload.clone()).unwrap();
        assert_eq!(conn.additional_properties.get("color"), Some(&json!("blue")));
        assert_eq!(serde_json::to_value(&conn).unwrap(), payload);
    }

    #[test]
    fn reference_accessors_use_wire_pair() {
        let mut conn = Connection::default();
        conn.set_endpoint_reference(Some(Reference::new(ResourceType::Switchpoint, "leaf1")));
        assert_eq!(
            serde_json::to_value(&conn).unwrap(),
            json!({"endpoint": "leaf1", "endpoint_ref_type_": "switchpoint"})
        );
        assert_eq!(
            conn.endpoint_reference(),
            Some(Reference::new(ResourceType::Switchpoint, "leaf1"))
        );

        conn.set_endpoint_reference(None);
        assert_eq!(serde_json::to_value(&conn).unwrap(), json!({}));
    }

    #[test]
    fn unknown_resource_type_is_preserved() {
        let parsed: ResourceType = serde_json::from_value(json!("pb_routing")).unwrap();
        assert_eq!(parsed, ResourceType::Other("pb_routing".into()));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), json!("pb_routing"));
        assert_eq!(ResourceType::EthPortProfile.to_string(), "eth_port_profile_");
    }

    #[test]
    fn assignment_accessors_use_wire_pair() {
        let mut conn = Connection::default();
        conn.set_vni_assignment(Assignment::Auto);
        assert_eq!(
            serde_json::to_value(&conn).unwrap(),
            json!({"vni": null, "vni_auto_assigned_": true})
        );
        assert_eq!(conn.vni_assignment(), Some(Assignment::Auto));

        conn.set_vni_assignment(Assignment::Explicit(10_000));
        assert_eq!(
            serde_json::to_value(&conn).unwrap(),
            json!({"vni": 10000, "vni_auto_assigned_": false})
        );
        assert_eq!(conn.vni_assignment(), Some(Assignment::Explicit(10_000)));

        assert_eq!(Connection::default().vni_assignment(), None);
    }

    #[test]
    fn one_of_picks_the_single_match() {
        let reply: Reply = decode(br#"{"token":"abc"}"#, None).unwrap();
        assert_eq!(
            reply,
            Reply::Token(TokenReply {
                token: "abc".into()
            })
        );
        assert_eq!(serde_json::to_value(&reply).unwrap(), json!({"token": "abc"}));
    }

    #[test]
    fn one_of_without_match_fails() {
        let err = decode::<Reply>(br#"{"unexpected":1}"#, None).unwrap_err();
        assert_eq!(err, Error::NoMatchingVariant("Reply".into()));
    }

    #[test]
    fn one_of_with_two_matches_is_ambiguous() {
        let err = decode::<Loose>(br#""hello""#, None).unwrap_err();
        assert_eq!(err, Error::AmbiguousOneOf("Loose".into()));
    }

    #[test]
    fn any_of_keeps_every_match() {
        let both: Flexible = decode(b"42", None).unwrap();
        assert_eq!(both.number, Some(42));
        assert_eq!(both.float, Some(42.0));
        assert_eq!(serde_json::to_value(&both).unwrap(), json!(42));

        let only_float: Flexible = decode(b"1.5", None).unwrap();
        assert_eq!(only_float.number, None);
        assert_eq!(only_float.float, Some(1.5));

        let err = decode::<Flexible>(br#""nope""#, None).unwrap_err();
        assert_eq!(err, Error::NoMatchingVariant("Flexible".into()));
    }

    #[test]
    fn empty_any_of_does_not_serialize() {
        assert!(serde_json::to_value(Flexible::default()).is_err());
    }

    #[test]
    fn xml_and_unknown_types_are_rejected() {
        let err = decode::<serde_json::Value>(b"<a/>", Some("application/xml")).unwrap_err();
        assert!(matches!(err, Error::Decoding(_)));
        let err = decode::<serde_json::Value>(b"x", Some("application/octet-stream")).unwrap_err();
        assert!(matches!(err, Error::Decoding(_)));
    }

    #[test]
    fn json_suffix_types_decode() {
        let value: serde_json::Value =
            decode(br#"{"a":1}"#, Some("application/problem+json; charset=utf-8")).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn text_decoding() {
        assert_eq!(decode_text(b"6.4.2").unwrap(), "6.4.2");
        assert!(decode_text(&[0xff, 0xfe]).is_err());
    }
}
