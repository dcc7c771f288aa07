// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA addressing and typing primitives.
//!
//! - **NodeId**: the four OPC UA node identifier kinds with string parsing
//! - **OpcUaDataType**: scalar data types accepted by typed writes
//! - **SecurityMode**: message security requested from the endpoint
//!
//! # Examples
//!
//! ```
//! use opcsensor_opcua::types::NodeId;
//!
//! let node: NodeId = "ns=2;i=3".parse().unwrap();
//! assert_eq!(node, NodeId::numeric(2, 3));
//! assert_eq!(node.to_string(), "ns=2;i=3");
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigurationError, OpcUaError};

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA Node Identifier.
///
/// The textual form is `ns=<index>;<kind>=<value>` where kind is `i`
/// (numeric), `s` (string), `g` (GUID) or `b` (base64 opaque). The `ns=`
/// prefix is omitted for namespace 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    /// Namespace index.
    pub namespace_index: u16,

    /// Identifier within the namespace.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node ID.
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque node ID.
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Returns the numeric identifier, if numeric.
    pub fn as_numeric(&self) -> Option<u32> {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string identifier, if string.
    pub fn as_string(&self) -> Option<&str> {
        match &self.identifier {
            NodeIdentifier::String(v) => Some(v),
            _ => None,
        }
    }

    /// Converts to the OPC UA string format.
    pub fn to_opc_string(&self) -> String {
        if self.namespace_index == 0 {
            self.identifier.to_string()
        } else {
            format!("ns={};{}", self.namespace_index, self.identifier)
        }
    }

    /// Parses every entry of a node list, failing on the first bad one.
    pub fn parse_all<S: AsRef<str>>(nodes: &[S]) -> Result<Vec<NodeId>, OpcUaError> {
        nodes.iter().map(|s| s.as_ref().parse()).collect()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = OpcUaError;

    /// Parses a NodeId from OPC UA string format.
    ///
    /// Supported formats:
    /// - `ns=2;i=1001` (numeric)
    /// - `ns=2;s=MyNode` (string)
    /// - `ns=2;g=550e8400-e29b-41d4-a716-446655440000` (GUID)
    /// - `ns=2;b=SGVsbG8=` (opaque, base64 encoded)
    /// - `i=1001` / `s=MyNode` (namespace 0)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: String| {
            OpcUaError::configuration(ConfigurationError::invalid_node_id(s, reason))
        };

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns_str, id) = rest
                    .split_once(';')
                    .ok_or_else(|| invalid("Missing identifier after namespace".into()))?;
                let ns: u16 = ns_str
                    .parse()
                    .map_err(|_| invalid(format!("Invalid namespace index '{}'", ns_str)))?;
                (ns, id)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            let value: u32 = id
                .parse()
                .map_err(|_| invalid("Invalid numeric identifier".into()))?;
            NodeIdentifier::Numeric(value)
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            if id.is_empty() {
                return Err(invalid("Empty string identifier".into()));
            }
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            let uuid = Uuid::parse_str(id).map_err(|e| invalid(format!("Invalid GUID: {}", e)))?;
            NodeIdentifier::Guid(uuid)
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            let bytes = BASE64
                .decode(id)
                .map_err(|e| invalid(format!("Invalid base64: {}", e)))?;
            NodeIdentifier::Opaque(bytes)
        } else {
            return Err(invalid(
                "Unknown identifier type. Expected i=, s=, g=, or b=".into(),
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

impl Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_opc_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// OPC UA node identifier kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),

    /// String identifier.
    String(String),

    /// GUID identifier.
    Guid(Uuid),

    /// Opaque identifier (application-specific byte array).
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={}", v),
            Self::String(v) => write!(f, "s={}", v),
            Self::Guid(v) => write!(f, "g={}", v),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// OpcUaDataType
// =============================================================================

/// Scalar OPC UA built-in types that a write can target explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OpcUaDataType {
    /// Boolean value.
    Boolean,
    /// Signed 8-bit integer.
    SByte,
    /// Unsigned 8-bit integer.
    Byte,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    UInt64,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    #[default]
    Double,
    /// UTF-8 string.
    String,
    /// Date and time.
    DateTime,
    /// GUID.
    Guid,
    /// Byte string.
    ByteString,
}

impl OpcUaDataType {
    /// Returns the OPC UA built-in type id.
    pub const fn type_id(&self) -> u32 {
        match self {
            Self::Boolean => 1,
            Self::SByte => 2,
            Self::Byte => 3,
            Self::Int16 => 4,
            Self::UInt16 => 5,
            Self::Int32 => 6,
            Self::UInt32 => 7,
            Self::Int64 => 8,
            Self::UInt64 => 9,
            Self::Float => 10,
            Self::Double => 11,
            Self::String => 12,
            Self::DateTime => 13,
            Self::Guid => 14,
            Self::ByteString => 15,
        }
    }

    /// Returns `true` for integer types.
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::SByte
                | Self::Byte
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    /// Returns the display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::SByte => "SByte",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Guid => "Guid",
            Self::ByteString => "ByteString",
        }
    }
}

impl fmt::Display for OpcUaDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OpcUaDataType {
    type Err = OpcUaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bool" | "boolean" => Ok(Self::Boolean),
            "sbyte" | "int8" | "i8" => Ok(Self::SByte),
            "byte" | "uint8" | "u8" => Ok(Self::Byte),
            "int16" | "i16" => Ok(Self::Int16),
            "uint16" | "u16" => Ok(Self::UInt16),
            "int32" | "i32" | "int" => Ok(Self::Int32),
            "uint32" | "u32" => Ok(Self::UInt32),
            "int64" | "i64" | "long" => Ok(Self::Int64),
            "uint64" | "u64" => Ok(Self::UInt64),
            "float" | "f32" => Ok(Self::Float),
            "double" | "f64" => Ok(Self::Double),
            "string" | "str" => Ok(Self::String),
            "datetime" => Ok(Self::DateTime),
            "guid" | "uuid" => Ok(Self::Guid),
            "bytestring" | "bytes" => Ok(Self::ByteString),
            _ => Err(OpcUaError::configuration(ConfigurationError::invalid_value(
                "type",
                format!("unknown data type '{}'", s),
            ))),
        }
    }
}

// =============================================================================
// SecurityMode
// =============================================================================

/// OPC UA message security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// No security (messages are neither signed nor encrypted).
    #[default]
    None,

    /// Messages are signed but not encrypted.
    Sign,

    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

impl SecurityMode {
    /// Returns `true` if this mode provides no security.
    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Sign => "Sign",
            Self::SignAndEncrypt => "SignAndEncrypt",
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SecurityMode {
    type Err = OpcUaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "none" | "nosecurity" => Ok(Self::None),
            "sign" | "signed" => Ok(Self::Sign),
            "signandencrypt" | "signencrypt" | "encrypted" => Ok(Self::SignAndEncrypt),
            _ => Err(OpcUaError::configuration(ConfigurationError::invalid_value(
                "security_mode",
                format!("unknown security mode '{}'", s),
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
