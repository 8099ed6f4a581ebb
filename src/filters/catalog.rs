//! Catalog of inspection filters.
//!
//! Each entry is a named filtergraph expression template. Templates carry two
//! kinds of `${token}` placeholders:
//!
//! - parameters, declared per filter with a default and resolved per slot
//!   (see [`FilterSlot`](super::chain::FilterSlot))
//! - geometry tokens (`${width}`, `${height}`, `${dar}`, `${window_width}`,
//!   `${window_height}`, `${fontfile}`), resolved at compose time
//!
//! | Filter | Parameters | Shows |
//! |--------|------------|-------|
//! | **Normal** | - | Source picture |
//! | **Waveform** | `intensity` | Luma waveform per column |
//! | **Vectorscope** | `intensity` | Chroma distribution |
//! | **Bit Plane (10 slices)** | `bit` | One bit of 10-bit luma |
//! | **Histogram** | `level_height` | Per-component levels |
//! | **Field Split** | - | Top/bottom fields side by side |
//! | **Broadcast Range Pixels** | `color` | Pixels outside broadcast range |
//! | **Frame Metadata** | - | Frame number burned in |
//! | **Aspect Fit** | - | Picture scaled to the viewport at source DAR |
//! | **Adjust Signal** | `contrast`, `brightness`, `saturation` | Global signal adjustment |

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ============================================================================
// Capability
// ============================================================================

/// Which slot kind a filter may occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotCapability {
    /// Per-view filter, one of the split branches.
    View,
    /// Signal adjustment applied before the split.
    Adjustment,
}

/// A filter parameter and its default value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamDef {
    pub name: &'static str,
    pub default: &'static str,
}

const fn param(name: &'static str, default: &'static str) -> ParamDef {
    ParamDef { name, default }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterDef {
    pub name: &'static str,
    pub template: &'static str,
    pub params: &'static [ParamDef],
    pub capability: SlotCapability,
}

impl FilterDef {
    pub fn fits(&self, slot: SlotCapability) -> bool {
        self.capability == slot
    }

    pub fn default_param(&self, name: &str) -> Option<&'static str> {
        self.params.iter().find(|p| p.name == name).map(|p| p.default)
    }
}

// ============================================================================
// Definitions
// ============================================================================

const INTENSITY: &[ParamDef] = &[param("intensity", "0.1")];
const BIT_PLANE: &[ParamDef] = &[param("bit", "1")];
const HISTOGRAM: &[ParamDef] = &[param("level_height", "200")];
const BRNG: &[ParamDef] = &[param("color", "yellow")];
const ADJUST: &[ParamDef] = &[
    param("contrast", "1"),
    param("brightness", "0"),
    param("saturation", "1"),
];

const FILTERS: &[FilterDef] = &[
    FilterDef {
        name: "Normal",
        template: "setsar=1/1",
        params: &[],
        capability: SlotCapability::View,
    },
    FilterDef {
        name: "Waveform",
        template: "waveform=intensity=${intensity}:mode=column:mirror=1:components=1:display=overlay:graticule=green:flags=numbers+dots,scale=${width}:${height},setsar=1/1",
        params: INTENSITY,
        capability: SlotCapability::View,
    },
    FilterDef {
        name: "Vectorscope",
        template: "vectorscope=mode=color3:intensity=${intensity}:graticule=green:flags=name,setsar=1/1",
        params: INTENSITY,
        capability: SlotCapability::View,
    },
    FilterDef {
        name: "Bit Plane (10 slices)",
        template: "format=yuv444p10le,lutyuv=y=if(bitand(val\\,pow(2\\,10-${bit}))\\,1023\\,0):u=512:v=512,setsar=1/1",
        params: BIT_PLANE,
        capability: SlotCapability::View,
    },
    FilterDef {
        name: "Histogram",
        template: "format=yuv444p,histogram=level_height=${level_height}:display_mode=stack,scale=${width}:${height},setsar=1/1",
        params: HISTOGRAM,
        capability: SlotCapability::View,
    },
    FilterDef {
        name: "Field Split",
        template: "il=l=d:c=d,setsar=1/1",
        params: &[],
        capability: SlotCapability::View,
    },
    FilterDef {
        name: "Broadcast Range Pixels",
        template: "signalstats=out=brng:color=${color},setsar=1/1",
        params: BRNG,
        capability: SlotCapability::View,
    },
    FilterDef {
        name: "Frame Metadata",
        template: "drawtext=fontfile=${fontfile}:text=%{n}:fontcolor=white:box=1:boxcolor=black@0.6:x=8:y=8",
        params: &[],
        capability: SlotCapability::View,
    },
    FilterDef {
        name: "Aspect Fit",
        template: "scale=${window_width}:${window_height}:force_original_aspect_ratio=decrease,setdar=${dar}",
        params: &[],
        capability: SlotCapability::View,
    },
    FilterDef {
        name: "Adjust Signal",
        template: "eq=contrast=${contrast}:brightness=${brightness}:saturation=${saturation}",
        params: ADJUST,
        capability: SlotCapability::Adjustment,
    },
];

/// All filters by name, in menu order.
pub static CATALOG: LazyLock<IndexMap<&'static str, FilterDef>> =
    LazyLock::new(|| FILTERS.iter().map(|f| (f.name, *f)).collect());

pub fn lookup(name: &str) -> Option<&'static FilterDef> {
    CATALOG.get(name)
}

/// Filters a slot of the given kind may hold, in menu order.
pub fn names_for(slot: SlotCapability) -> impl Iterator<Item = &'static str> {
    CATALOG.values().filter(move |f| f.fits(slot)).map(|f| f.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tokens::placeholders;

    #[test]
    fn test_lookup() {
        let waveform = lookup("Waveform").unwrap();
        assert_eq!(waveform.default_param("intensity"), Some("0.1"));
        assert!(waveform.fits(SlotCapability::View));
        assert!(lookup("Nope").is_none());
    }

    #[test]
    fn test_adjustment_subset() {
        let adjust: Vec<_> = names_for(SlotCapability::Adjustment).collect();
        assert_eq!(adjust, vec!["Adjust Signal"]);
        assert!(!names_for(SlotCapability::View).any(|n| n == "Adjust Signal"));
        assert_eq!(names_for(SlotCapability::View).next(), Some("Normal"));
    }

    #[test]
    fn test_every_placeholder_is_declared_or_geometry() {
        const GEOMETRY: &[&str] = &["width", "height", "dar", "window_width", "window_height", "fontfile"];
        for filter in CATALOG.values() {
            for token in placeholders(filter.template) {
                assert!(
                    GEOMETRY.contains(&token.as_str()) || filter.default_param(&token).is_some(),
                    "{}: undeclared ${{{}}}",
                    filter.name,
                    token
                );
            }
        }
    }
}
