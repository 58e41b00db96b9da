use std::str::FromStr;

use snapkeep_core::{AppError, AppResult};
use snapkeep_domain::ResourceTag;

/// Resource kind the selection tag is looked up on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagType {
    /// The tag is set on volumes directly.
    #[default]
    Volume,
    /// The tag is set on instances; their attached volumes are rotated.
    Instance,
}

impl TagType {
    /// Returns stable tag type value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Instance => "instance",
        }
    }
}

impl FromStr for TagType {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "volume" => Ok(Self::Volume),
            "instance" => Ok(Self::Instance),
            _ => Err(AppError::Configuration(format!(
                "unknown tag type '{value}', expected 'volume' or 'instance'"
            ))),
        }
    }
}

/// Tag criteria used to find the volumes of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSelector {
    /// Tag key and value to match.
    pub tag: ResourceTag,
    /// Resource kind the tag is set on.
    pub tag_type: TagType,
    /// Restricts instance lookups to running instances.
    pub running_only: bool,
}

impl Default for VolumeSelector {
    fn default() -> Self {
        Self {
            tag: ResourceTag::new("MakeSnapshot", "true"),
            tag_type: TagType::Volume,
            running_only: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TagType;

    #[test]
    fn tag_type_parses_known_values_only() {
        assert_eq!("volume".parse::<TagType>().ok(), Some(TagType::Volume));
        assert_eq!("instance".parse::<TagType>().ok(), Some(TagType::Instance));
        assert!("image".parse::<TagType>().is_err());
        assert!("Volume".parse::<TagType>().is_err());
    }
}
