use std::fmt;
use std::str::FromStr;

use crate::foundation::error::PreloadError;

/// Resource categories a manifest may list.
///
/// Each category maps to exactly one fetch primitive slot in [`crate::FetchRouter`] and to one
/// image folder in the host cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Battle animation sheets.
    Animations,
    /// Battle background floors.
    Battlebacks1,
    /// Battle background walls.
    Battlebacks2,
    /// Front-view enemy graphics.
    Enemies,
    /// Map character sheets.
    Characters,
    /// Face sets.
    Faces,
    /// Parallax backgrounds.
    Parallaxes,
    /// Free-form pictures.
    Pictures,
    /// Side-view actor sheets.
    SvActors,
    /// Side-view enemy graphics.
    SvEnemies,
    /// System skin images.
    System,
    /// Tileset sheets.
    Tilesets,
    /// Title screen backgrounds.
    Titles1,
    /// Title screen frames.
    Titles2,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 14;

    /// Every category in declaration order.
    pub const ALL: [Category; Self::COUNT] = [
        Category::Animations,
        Category::Battlebacks1,
        Category::Battlebacks2,
        Category::Enemies,
        Category::Characters,
        Category::Faces,
        Category::Parallaxes,
        Category::Pictures,
        Category::SvActors,
        Category::SvEnemies,
        Category::System,
        Category::Tilesets,
        Category::Titles1,
        Category::Titles2,
    ];

    /// Manifest key for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Animations => "animations",
            Category::Battlebacks1 => "battlebacks1",
            Category::Battlebacks2 => "battlebacks2",
            Category::Enemies => "enemies",
            Category::Characters => "characters",
            Category::Faces => "faces",
            Category::Parallaxes => "parallaxes",
            Category::Pictures => "pictures",
            Category::SvActors => "sv_actors",
            Category::SvEnemies => "sv_enemies",
            Category::System => "system",
            Category::Tilesets => "tilesets",
            Category::Titles1 => "titles1",
            Category::Titles2 => "titles2",
        }
    }

    /// Resolve a manifest key. Returns `None` for keys outside the fixed set.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == key)
    }

    /// Dense index in `0..COUNT`, used for table lookups.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Image folder relative to the project root, with trailing `/`.
    pub fn folder(self) -> String {
        format!("img/{}/", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PreloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| PreloadError::manifest(format!("unknown category '{s}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/category.rs"]
mod tests;
