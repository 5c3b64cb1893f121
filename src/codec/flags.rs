//! Flag set rendering.

use serde::{Deserialize, Serialize};

use super::hex_u32;

/// One named value of a flag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDefinition {
    pub flag: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl FlagDefinition {
    pub fn new(flag: u32, name: impl Into<String>) -> Self {
        Self {
            flag,
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Render a flag value as the name of the definition equal to it, or as a
/// hex number when no single definition matches.
///
/// No decomposition into several names happens here; use
/// [`describe_with_separator`] for that.
pub fn describe(value: u32, definitions: &[FlagDefinition]) -> String {
    match definitions.iter().find(|def| def.flag == value) {
        Some(def) => def.name.clone(),
        None => hex_u32(value),
    }
}

/// Decompose a flag value into the names of every definition whose bits are
/// all set, joined by `separator`.
///
/// Bits that no definition accounts for are appended as one hex token. A
/// value equal to a zero-valued definition renders as that name; any other
/// value that matches nothing renders as hex.
pub fn describe_with_separator(value: u32, definitions: &[FlagDefinition], separator: char) -> String {
    if value == 0 {
        return describe(0, definitions);
    }

    let mut parts: Vec<String> = Vec::new();
    let mut covered = 0u32;
    for def in definitions {
        if def.flag != 0 && value & def.flag == def.flag {
            parts.push(def.name.clone());
            covered |= def.flag;
        }
    }

    let remaining = value & !covered;
    if remaining != 0 {
        parts.push(hex_u32(remaining));
    }

    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(part);
    }
    out
}
