use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

use crate::error::Error;
use crate::options::{Format, LabelWidth, Precision};
use crate::types::{Dictionary, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Endian::Little => "LSB",
            Endian::Big => "MSB",
        }
    }
}

/// Binary layout declared by `arch "LSB;label=32;scalar=64"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arch {
    pub endian: Endian,
    pub label: LabelWidth,
    pub scalar: Precision,
}

impl Default for Arch {
    fn default() -> Self {
        Self {
            endian: Endian::native(),
            label: LabelWidth::Bits32,
            scalar: Precision::Double,
        }
    }
}

impl FromStr for Arch {
    type Err = Error;

    /// Unknown fields are ignored; missing fields keep their defaults.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut arch = Arch::default();
        for field in text.split(';').map(str::trim).filter(|field| !field.is_empty()) {
            match field.split_once('=') {
                None if field == "LSB" => arch.endian = Endian::Little,
                None if field == "MSB" => arch.endian = Endian::Big,
                Some(("label", "32")) => arch.label = LabelWidth::Bits32,
                Some(("label", "64")) => arch.label = LabelWidth::Bits64,
                Some(("scalar", "32")) => arch.scalar = Precision::Single,
                Some(("scalar", "64")) => arch.scalar = Precision::Double,
                Some(("label" | "scalar", _)) => {
                    return Err(Error::decode(0, "label or scalar width of 32 or 64"));
                }
                _ => {}
            }
        }
        Ok(arch)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};label={};scalar={}",
            self.endian.as_str(),
            self.label.bits(),
            self.scalar.bits()
        )
    }
}

/// Typed view of the `FoamFile` header dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub version: Option<f64>,
    pub format: Option<Format>,
    pub class: Option<SmolStr>,
    pub location: Option<String>,
    pub object: Option<SmolStr>,
    pub arch: Option<Arch>,
}

impl Header {
    /// Reads the known entries; malformed or missing ones are left unset.
    pub fn from_dict(dict: &Dictionary) -> Self {
        let text = |key: &str| dict.get(key).and_then(Value::as_str);
        Self {
            version: dict.get("version").and_then(Value::as_f64),
            format: text("format").and_then(Format::from_word),
            class: text("class").map(SmolStr::new),
            location: text("location").map(str::to_owned),
            object: text("object").map(SmolStr::new),
            arch: text("arch").and_then(|arch| arch.parse().ok()),
        }
    }

    pub fn to_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        if let Some(version) = self.version {
            dict.push("version", version);
        }
        if let Some(format) = self.format {
            dict.push("format", Value::word(format.as_str()));
        }
        if let Some(arch) = self.arch {
            dict.push("arch", Value::string(arch.to_string()));
        }
        if let Some(class) = &self.class {
            dict.push("class", Value::Word(class.clone()));
        }
        if let Some(location) = &self.location {
            dict.push("location", Value::string(location.clone()));
        }
        if let Some(object) = &self.object {
            dict.push("object", Value::Word(object.clone()));
        }
        dict
    }
}
