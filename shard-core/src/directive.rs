use std::collections::{BTreeMap, BTreeSet};

/// Separator between the directives of a single field annotation.
pub const DIRECTIVE_DELIMITER: char = ';';

/// Boolean directive, present or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    PrimaryKey,
    UniqueKey,
}

impl Attribute {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "pk" | "primary-key" => Some(Self::PrimaryKey),
            "uk" | "unique-key" => Some(Self::UniqueKey),
            _ => None,
        }
    }
}

/// Directive carrying a value, written as `name(value)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parameter {
    Column,
}

impl Parameter {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "column" => Some(Self::Column),
            _ => None,
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Directives {
    pub attributes: BTreeSet<Attribute>,
    pub parameters: BTreeMap<Parameter, String>,
}

impl Directives {
    pub fn has(&self, attribute: Attribute) -> bool {
        self.attributes.contains(&attribute)
    }
    pub fn get(&self, parameter: Parameter) -> Option<&str> {
        self.parameters.get(&parameter).map(String::as_str)
    }
}

/// Parse a field annotation like `pk;column(account_id)`.
///
/// Names are matched case-insensitively, parameter values are kept verbatim. Unknown
/// or malformed segments are ignored.
pub fn parse_directives(raw: &str, delimiter: char) -> Directives {
    let mut result = Directives::default();
    for segment in raw.split(delimiter) {
        let segment = segment.trim();
        let lowercase = segment.to_ascii_lowercase();
        if let Some(attribute) = Attribute::from_name(&lowercase) {
            result.attributes.insert(attribute);
            continue;
        }
        let (Some(open), Some(close)) = (segment.find('('), segment.find(')')) else {
            continue;
        };
        if open == 0 || close != segment.len() - 1 || close < open {
            continue;
        }
        if let Some(parameter) = Parameter::from_name(&lowercase[..open]) {
            result
                .parameters
                .insert(parameter, segment[open + 1..close].to_owned());
        }
    }
    result
}
