pub mod love;
pub mod track;
pub mod xml;

/// Artwork sizes served by Last.fm.
///
/// The integer values are what the `size` attribute of a cached `<image>` holds. They are
/// persisted, do not renumber them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
    Mega,
}

impl ImageSize {
    pub const ALL: [ImageSize; 5] = [
        ImageSize::Small,
        ImageSize::Medium,
        ImageSize::Large,
        ImageSize::ExtraLarge,
        ImageSize::Mega,
    ];

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Small),
            1 => Some(Self::Medium),
            2 => Some(Self::Large),
            3 => Some(Self::ExtraLarge),
            4 => Some(Self::Mega),
            _ => None,
        }
    }

    pub fn to_i32(self) -> i32 {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
            Self::ExtraLarge => 3,
            Self::Mega => 4,
        }
    }

    /// The value of `size` in web service responses.
    pub fn name(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::ExtraLarge => "extralarge",
            Self::Mega => "mega",
        }
    }
}

/// Where a play came from. Persisted as an integer, unknown values read back as `Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Unknown,
    LastFmRadio,
    Player,
    MediaDevice,
    /// Shoutcast, BBC Radio 1, etc.
    NonPersonalisedBroadcast,
    /// Pandora, but not Last.fm.
    PersonalisedRecommendation,
}

impl Default for Source {
    fn default() -> Self {
        Self::Unknown
    }
}

impl Source {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::LastFmRadio,
            2 => Self::Player,
            3 => Self::MediaDevice,
            4 => Self::NonPersonalisedBroadcast,
            5 => Self::PersonalisedRecommendation,
            _ => Self::Unknown,
        }
    }

    pub fn to_i32(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::LastFmRadio => 1,
            Self::Player => 2,
            Self::MediaDevice => 3,
            Self::NonPersonalisedBroadcast => 4,
            Self::PersonalisedRecommendation => 5,
        }
    }
}
