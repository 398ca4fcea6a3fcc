//! Media cue values carried by image, music and sound-effect cells.

/// What a media cell asks the presentation layer to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCue {
    /// Empty cell: leave the current value unchanged.
    Keep,
    /// `clear` / `none`: remove the image or background.
    Clear,
    /// `stop`: halt music playback.
    Stop,
    /// A URL or short asset name.
    Asset(String),
}

impl MediaCue {
    pub fn parse(cell: Option<&str>) -> Self {
        match cell.map(str::trim) {
            None | Some("") => Self::Keep,
            Some("clear") | Some("none") => Self::Clear,
            Some("stop") => Self::Stop,
            Some(other) => Self::Asset(other.to_string()),
        }
    }
}

/// Resolve an asset reference against an optional base URL.
///
/// Sentinels and absolute `http(s)://` URLs pass through untouched; short
/// names are joined onto the base with exactly one slash.
pub fn resolve_asset_url(base: Option<&str>, value: &str) -> String {
    if matches!(value, "clear" | "none" | "stop") {
        return value.to_string();
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return value.to_string();
    }
    match base {
        Some(base) if !base.is_empty() => {
            if base.ends_with('/') {
                format!("{base}{value}")
            } else {
                format!("{base}/{value}")
            }
        }
        _ => value.to_string(),
    }
}
