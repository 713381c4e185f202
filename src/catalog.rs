//! Prompt catalog: the rooms and design styles the visualizer can render.
//!
//! Space prompts describe geometry and fixed features of the flat; style
//! prompts describe palette, materials and atmosphere. A generation request
//! is the style prompt followed by the space prompt.

use serde::Serialize;
use thiserror::Error;

/// Separator joining space and style ids into a selection key.
/// Catalog ids never contain it.
pub const KEY_SEPARATOR: char = '-';

/// A room of the flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpaceVariant {
    pub id: &'static str,
    pub name: &'static str,
    /// Geometry and furniture layout
    pub prompt: &'static str,
}

/// A design direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleVariant {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Materials, colors and atmosphere
    pub prompt: &'static str,
    /// Swatch color shown next to the style
    pub accent: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown space: {0}")]
    UnknownSpace(String),

    #[error("unknown style: {0}")]
    UnknownStyle(String),
}

pub const SPACES: &[SpaceVariant] = &[
    SpaceVariant {
        id: "living",
        name: "客廳",
        prompt: "Interior design visualization of a living room.\n\
                 Perspective focused on the depth of the room (4.9 meters).\n\
                 Key Architectural Feature: A continuous wall of vertical slats (grille) that seamlessly hides the bedroom doors (hidden doors/invisible doors).\n\
                 Opposite wall is a feature wall.\n\
                 Includes a minimalist sofa and a low suspended TV platform.\n\
                 Layout width 3.9 meters.\n\
                 High quality, 4k render, architectural photography style.",
    },
    SpaceVariant {
        id: "dining",
        name: "餐廚",
        prompt: "Interior design visualization of a dining area and kitchen connection.\n\
                 Layout width 3.9 meters.\n\
                 A dining table peninsula integrated with the kitchen cabinetry to maximize space.\n\
                 Floor-to-ceiling cabinets.\n\
                 Pendant lights over the dining area.\n\
                 Clean, airy atmosphere.\n\
                 High quality, 4k render.",
    },
    SpaceVariant {
        id: "master",
        name: "主臥",
        prompt: "Interior design visualization of a master bedroom.\n\
                 Features a built-in wardrobe maximizing vertical space.\n\
                 A headboard panel with indirect lighting to soften the beam overhead.\n\
                 Cozy atmosphere.\n\
                 High quality, 4k render.",
    },
    SpaceVariant {
        id: "secondary",
        name: "次臥",
        prompt: "Interior design visualization of a small versatile room (study/guest room).\n\
                 Raised floor platform (Tatami style or wooden platform) with storage underneath.\n\
                 A compact desk area near the window.\n\
                 High quality, 4k render.",
    },
    SpaceVariant {
        id: "bathroom",
        name: "衛浴",
        prompt: "Interior design visualization of a modern bathroom.\n\
                 Floating vanity cabinet.\n\
                 Large mirror with backlight.\n\
                 Stone or tile finishes.\n\
                 Spa-like atmosphere.\n\
                 High quality, 4k render.",
    },
];

pub const STYLES: &[StyleVariant] = &[
    StyleVariant {
        id: "japandi",
        name: "日式侘寂",
        description: "溫潤木質與留白",
        prompt: "Japanese Japandi style. Color palette: Warm beige, off-white, and light oak wood. Atmosphere: Zen, serene, minimalist, natural light. Materials: Matte mineral paint, natural wood, linen fabrics.",
        accent: "#d4c5b0",
    },
    StyleVariant {
        id: "luxury",
        name: "現代輕奢",
        description: "石材金屬質感",
        prompt: "Modern Luxury style. Color palette: High contrast black, white, and grey with brass/gold accents. Atmosphere: Sophisticated, expensive, hotel-like. Materials: Marble stone, glossy surfaces, leather, velvet, brass metal details.",
        accent: "#292524",
    },
    StyleVariant {
        id: "scandi",
        name: "北歐極簡",
        description: "明亮灰階色調",
        prompt: "Scandinavian Minimalist style. Color palette: Bright white, light grey, and pale wood. Atmosphere: Hygge, cozy, airy, bright. Materials: White painted walls, light birch wood, soft wool textures, functional furniture.",
        accent: "#e5e7eb",
    },
    StyleVariant {
        id: "industrial",
        name: "工業 Loft",
        description: "水泥灰與鐵件",
        prompt: "Modern Industrial Loft style. Color palette: Concrete grey, black, and dark walnut wood. Atmosphere: Raw, edgy, moody. Materials: Exposed concrete walls, black iron/metal details, dark leather, track lighting.",
        accent: "#57534e",
    },
];

pub fn default_space() -> &'static SpaceVariant {
    &SPACES[0]
}

pub fn default_style() -> &'static StyleVariant {
    &STYLES[0]
}

pub fn find_space(id: &str) -> Result<&'static SpaceVariant, CatalogError> {
    SPACES
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| CatalogError::UnknownSpace(id.to_string()))
}

pub fn find_style(id: &str) -> Result<&'static StyleVariant, CatalogError> {
    STYLES
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| CatalogError::UnknownStyle(id.to_string()))
}

/// Full generation prompt: style first, then the room.
pub fn compose_prompt(space: &SpaceVariant, style: &StyleVariant) -> String {
    format!("{}\n\n{}", style.prompt, space.prompt)
}

/// Cache key addressing one space × style rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SelectionKey(String);

impl SelectionKey {
    pub fn new(space: &SpaceVariant, style: &StyleVariant) -> Self {
        Self(format!("{}{}{}", space.id, KEY_SEPARATOR, style.id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
