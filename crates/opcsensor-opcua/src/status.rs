// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA status codes.
//!
//! Only the codes the bridge inspects or reports are named here; any other
//! code still round-trips and renders as hex.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const KNOWN_CODES: &[(u32, &str)] = &[
    (0x0000_0000, "Good"),
    (0x4000_0000, "Uncertain"),
    (0x4092_0000, "UncertainInitialValue"),
    (0x8000_0000, "Bad"),
    (0x8001_0000, "BadUnexpectedError"),
    (0x8002_0000, "BadInternalError"),
    (0x8005_0000, "BadCommunicationError"),
    (0x8007_0000, "BadDecodingError"),
    (0x800A_0000, "BadTimeout"),
    (0x800B_0000, "BadServiceUnsupported"),
    (0x800C_0000, "BadShutdown"),
    (0x800D_0000, "BadServerNotConnected"),
    (0x800F_0000, "BadNothingToDo"),
    (0x8010_0000, "BadTooManyOperations"),
    (0x801F_0000, "BadUserAccessDenied"),
    (0x8022_0000, "BadSecureChannelIdInvalid"),
    (0x8025_0000, "BadSessionIdInvalid"),
    (0x8026_0000, "BadSessionClosed"),
    (0x8027_0000, "BadSessionNotActivated"),
    (0x8028_0000, "BadSubscriptionIdInvalid"),
    (0x8033_0000, "BadNodeIdInvalid"),
    (0x8034_0000, "BadNodeIdUnknown"),
    (0x8035_0000, "BadAttributeIdInvalid"),
    (0x803A_0000, "BadNotReadable"),
    (0x803B_0000, "BadNotWritable"),
    (0x803C_0000, "BadOutOfRange"),
    (0x803D_0000, "BadNotSupported"),
    (0x8073_0000, "BadWriteNotSupported"),
    (0x8074_0000, "BadTypeMismatch"),
    (0x808A_0000, "BadNotConnected"),
    (0x80AE_0000, "BadConnectionClosed"),
];

/// An OPC UA status code.
///
/// The top two bits carry the severity: `00` good, `01` uncertain, `10` bad.
/// Serializes as its label and deserializes from a name, a `0x` hex string
/// or a raw number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// The operation succeeded.
    pub const GOOD: Self = Self(0x0000_0000);
    /// Generic uncertain status.
    pub const UNCERTAIN: Self = Self(0x4000_0000);
    /// Generic bad status.
    pub const BAD: Self = Self(0x8000_0000);
    /// Unexpected error.
    pub const BAD_UNEXPECTED_ERROR: Self = Self(0x8001_0000);
    /// Internal error.
    pub const BAD_INTERNAL_ERROR: Self = Self(0x8002_0000);
    /// Communication error.
    pub const BAD_COMMUNICATION_ERROR: Self = Self(0x8005_0000);
    /// Decoding error.
    pub const BAD_DECODING_ERROR: Self = Self(0x8007_0000);
    /// Request timed out.
    pub const BAD_TIMEOUT: Self = Self(0x800A_0000);
    /// Service not supported.
    pub const BAD_SERVICE_UNSUPPORTED: Self = Self(0x800B_0000);
    /// Server is shutting down.
    pub const BAD_SHUTDOWN: Self = Self(0x800C_0000);
    /// Server is not connected.
    pub const BAD_SERVER_NOT_CONNECTED: Self = Self(0x800D_0000);
    /// Nothing to do.
    pub const BAD_NOTHING_TO_DO: Self = Self(0x800F_0000);
    /// Too many operations in one request.
    pub const BAD_TOO_MANY_OPERATIONS: Self = Self(0x8010_0000);
    /// User has no access.
    pub const BAD_USER_ACCESS_DENIED: Self = Self(0x801F_0000);
    /// Secure channel id is not valid.
    pub const BAD_SECURE_CHANNEL_ID_INVALID: Self = Self(0x8022_0000);
    /// Session id is not valid.
    pub const BAD_SESSION_ID_INVALID: Self = Self(0x8025_0000);
    /// Session was closed by the client.
    pub const BAD_SESSION_CLOSED: Self = Self(0x8026_0000);
    /// Session has not been activated.
    pub const BAD_SESSION_NOT_ACTIVATED: Self = Self(0x8027_0000);
    /// Subscription id is not valid.
    pub const BAD_SUBSCRIPTION_ID_INVALID: Self = Self(0x8028_0000);
    /// Node id syntax is invalid.
    pub const BAD_NODE_ID_INVALID: Self = Self(0x8033_0000);
    /// Node id does not exist on the server.
    pub const BAD_NODE_ID_UNKNOWN: Self = Self(0x8034_0000);
    /// Attribute is not supported for the node.
    pub const BAD_ATTRIBUTE_ID_INVALID: Self = Self(0x8035_0000);
    /// Access level does not allow reading.
    pub const BAD_NOT_READABLE: Self = Self(0x803A_0000);
    /// Access level does not allow writing.
    pub const BAD_NOT_WRITABLE: Self = Self(0x803B_0000);
    /// Value is out of range.
    pub const BAD_OUT_OF_RANGE: Self = Self(0x803C_0000);
    /// Requested operation is not supported.
    pub const BAD_NOT_SUPPORTED: Self = Self(0x803D_0000);
    /// Value written was accepted but with a different type.
    pub const BAD_TYPE_MISMATCH: Self = Self(0x8074_0000);
    /// Writing is not supported.
    pub const BAD_WRITE_NOT_SUPPORTED: Self = Self(0x8073_0000);
    /// Not connected.
    pub const BAD_NOT_CONNECTED: Self = Self(0x808A_0000);
    /// Connection was closed.
    pub const BAD_CONNECTION_CLOSED: Self = Self(0x80AE_0000);
    /// Value was not yet available.
    pub const UNCERTAIN_INITIAL_VALUE: Self = Self(0x4092_0000);

    /// Creates a status code from its raw value.
    #[inline]
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the severity is good.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Returns `true` if the severity is uncertain.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & 0xC000_0000 == 0x4000_0000
    }

    /// Returns `true` if the severity is bad.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Returns the symbolic name, ignoring the info bits in the low word.
    pub fn name(&self) -> Option<&'static str> {
        let code = self.0 & 0xFFFF_0000;
        KNOWN_CODES
            .iter()
            .find(|(bits, _)| *bits == code)
            .map(|(_, name)| *name)
    }

    /// Looks up a status code by its symbolic name.
    pub fn from_name(name: &str) -> Option<Self> {
        KNOWN_CODES
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name))
            .map(|(bits, _)| Self(*bits))
    }

    /// Returns a human-readable label: the symbolic name or `0xXXXXXXXX`.
    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => format!("0x{:08X}", self.0),
        }
    }

    /// Returns `true` if this code reports an invalidated session or channel.
    pub fn is_session_invalidation(&self) -> bool {
        matches!(
            *self,
            Self::BAD_SESSION_ID_INVALID
                | Self::BAD_SESSION_NOT_ACTIVATED
                | Self::BAD_SECURE_CHANNEL_ID_INVALID
                | Self::BAD_SESSION_CLOSED
        )
    }

    /// Returns `true` if this code reports a dropped transport.
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            *self,
            Self::BAD_CONNECTION_CLOSED
                | Self::BAD_NOT_CONNECTED
                | Self::BAD_SERVER_NOT_CONNECTED
                | Self::BAD_COMMUNICATION_ERROR
        )
    }
}

/// Renders a raw status code as its label.
pub fn status_code_name(code: u32) -> String {
    StatusCode(code).label()
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<u32> for StatusCode {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl FromStr for StatusCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            return u32::from_str_radix(&hex.replace('_', ""), 16)
                .map(Self)
                .map_err(|e| format!("invalid status code '{}': {}", s, e));
        }
        Self::from_name(s).ok_or_else(|| format!("unknown status code '{}'", s))
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bits(u32),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bits(bits) => Ok(Self(bits)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bits() {
        assert!(StatusCode::GOOD.is_good());
        assert!(!StatusCode::GOOD.is_bad());
        assert!(StatusCode::UNCERTAIN_INITIAL_VALUE.is_uncertain());
        assert!(!StatusCode::UNCERTAIN_INITIAL_VALUE.is_good());
        assert!(StatusCode::BAD_NODE_ID_UNKNOWN.is_bad());
        assert!(!StatusCode::BAD_NODE_ID_UNKNOWN.is_uncertain());
    }

    #[test]
    fn test_labels() {
        assert_eq!(StatusCode::GOOD.label(), "Good");
        assert_eq!(StatusCode::BAD_NOT_WRITABLE.label(), "BadNotWritable");
        // info bits do not change the name
        assert_eq!(StatusCode(0x8034_0400).label(), "BadNodeIdUnknown");
        assert_eq!(StatusCode(0x81FF_0000).label(), "0x81FF0000");
        assert_eq!(StatusCode::BAD_TIMEOUT.to_string(), "BadTimeout");
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!(
            "BadSessionIdInvalid".parse::<StatusCode>().unwrap(),
            StatusCode::BAD_SESSION_ID_INVALID
        );
        assert_eq!("0x80AE0000".parse::<StatusCode>().unwrap(), StatusCode::BAD_CONNECTION_CLOSED);
        assert!("BadNonsense".parse::<StatusCode>().is_err());

        let codes: Vec<StatusCode> =
            serde_json::from_str(r#"["badsecurechannelidinvalid", 2149908480]"#).unwrap();
        assert_eq!(codes[0], StatusCode::BAD_SECURE_CHANNEL_ID_INVALID);
        assert_eq!(codes[1], StatusCode::BAD_SESSION_ID_INVALID);
        assert_eq!(
            serde_json::to_string(&StatusCode::BAD_NOT_WRITABLE).unwrap(),
            "\"BadNotWritable\""
        );
    }

    #[test]
    fn test_classification_helpers() {
        assert!(StatusCode::BAD_SESSION_ID_INVALID.is_session_invalidation());
        assert!(StatusCode::BAD_SECURE_CHANNEL_ID_INVALID.is_session_invalidation());
        assert!(!StatusCode::BAD_TIMEOUT.is_session_invalidation());
        assert!(StatusCode::BAD_CONNECTION_CLOSED.is_connection_loss());
        assert!(!StatusCode::BAD_NODE_ID_UNKNOWN.is_connection_loss());
    }

    #[test]
    fn test_status_code_name() {
        assert_eq!(status_code_name(0), "Good");
        assert_eq!(status_code_name(0x803B_0000), "BadNotWritable");
        assert_eq!(status_code_name(0x8FFF_0000), "0x8FFF0000");
    }
}
