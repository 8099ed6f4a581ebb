//! Ordered filter slots plus the global adjustment slot.
//!
//! Slots are created once and never destroyed: selecting fills a slot,
//! clearing empties it, reordering moves it. Disabled slots keep their
//! selection and parameters but are skipped when the graph is composed.

use indexmap::IndexMap;
use log::debug;

use super::catalog::{self, FilterDef, SlotCapability};
use super::tokens::substitute;

/// Number of per-view slots.
pub const MAX_SLOTS: usize = 6;

/// Addresses a slot in the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotId {
    View(usize),
    Adjustment,
}

impl SlotId {
    fn capability(self) -> SlotCapability {
        match self {
            SlotId::View(_) => SlotCapability::View,
            SlotId::Adjustment => SlotCapability::Adjustment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    UnknownFilter(String),
    /// Filter exists but is not allowed in this slot kind.
    NotAllowed { filter: String, slot: SlotId },
    SlotOutOfRange(usize),
    EmptySlot(SlotId),
    UnknownParam { filter: String, param: String },
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainError::UnknownFilter(name) => write!(f, "Unknown filter: {}", name),
            ChainError::NotAllowed { filter, slot } => {
                write!(f, "Filter '{}' not allowed in {:?}", filter, slot)
            }
            ChainError::SlotOutOfRange(i) => {
                write!(f, "Slot {} out of range (0..{})", i, MAX_SLOTS)
            }
            ChainError::EmptySlot(slot) => write!(f, "{:?} is empty", slot),
            ChainError::UnknownParam { filter, param } => {
                write!(f, "Filter '{}' has no parameter '{}'", filter, param)
            }
        }
    }
}

impl std::error::Error for ChainError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSlot {
    filter: Option<&'static FilterDef>,
    enabled: bool,
    /// Overrides of catalog defaults
    params: IndexMap<String, String>,
}

impl FilterSlot {
    pub fn filter(&self) -> Option<&'static FilterDef> {
        self.filter
    }

    pub fn filter_name(&self) -> Option<&'static str> {
        self.filter.map(|f| f.name)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
    }

    /// Current value of a parameter: override, else catalog default.
    pub fn param(&self, name: &str) -> Option<String> {
        let filter = self.filter?;
        self.params
            .get(name)
            .cloned()
            .or_else(|| filter.default_param(name).map(str::to_string))
    }

    /// Expression with parameters resolved; geometry tokens remain.
    /// `None` when the slot is empty or disabled.
    pub fn expression(&self) -> Option<String> {
        let filter = self.filter.filter(|_| self.enabled)?;
        let resolved = substitute(filter.template, |name| {
            filter.default_param(name).and_then(|_| self.param(name))
        });
        Some(resolved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChain {
    slots: Vec<FilterSlot>,
    adjustment: FilterSlot,
}

impl Default for FilterChain {
    fn default() -> Self {
        Self {
            slots: vec![FilterSlot::default(); MAX_SLOTS],
            adjustment: FilterSlot::default(),
        }
    }
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[FilterSlot] {
        &self.slots
    }

    pub fn adjustment(&self) -> &FilterSlot {
        &self.adjustment
    }

    pub fn slot(&self, id: SlotId) -> Result<&FilterSlot, ChainError> {
        match id {
            SlotId::View(i) => self.slots.get(i).ok_or(ChainError::SlotOutOfRange(i)),
            SlotId::Adjustment => Ok(&self.adjustment),
        }
    }

    fn slot_mut(&mut self, id: SlotId) -> Result<&mut FilterSlot, ChainError> {
        match id {
            SlotId::View(i) => self.slots.get_mut(i).ok_or(ChainError::SlotOutOfRange(i)),
            SlotId::Adjustment => Ok(&mut self.adjustment),
        }
    }

    /// Put `name` into a slot and enable it. Parameters reset to defaults.
    pub fn select(&mut self, id: SlotId, name: &str) -> Result<(), ChainError> {
        let filter = catalog::lookup(name).ok_or_else(|| ChainError::UnknownFilter(name.to_string()))?;
        if !filter.fits(id.capability()) {
            return Err(ChainError::NotAllowed {
                filter: name.to_string(),
                slot: id,
            });
        }
        let slot = self.slot_mut(id)?;
        slot.filter = Some(filter);
        slot.enabled = true;
        slot.params.clear();
        debug!("{:?} <- {}", id, name);
        Ok(())
    }

    pub fn clear(&mut self, id: SlotId) -> Result<(), ChainError> {
        *self.slot_mut(id)? = FilterSlot::default();
        Ok(())
    }

    pub fn set_enabled(&mut self, id: SlotId, enabled: bool) -> Result<(), ChainError> {
        let slot = self.slot_mut(id)?;
        if slot.is_empty() {
            return Err(ChainError::EmptySlot(id));
        }
        slot.enabled = enabled;
        Ok(())
    }

    pub fn set_param(&mut self, id: SlotId, param: &str, value: &str) -> Result<(), ChainError> {
        let slot = self.slot_mut(id)?;
        let filter = slot.filter.ok_or(ChainError::EmptySlot(id))?;
        if filter.default_param(param).is_none() {
            return Err(ChainError::UnknownParam {
                filter: filter.name.to_string(),
                param: param.to_string(),
            });
        }
        slot.params.insert(param.to_string(), value.to_string());
        Ok(())
    }

    /// Move a view slot from `from` to `to`, shifting the ones in between.
    pub fn move_slot(&mut self, from: usize, to: usize) -> Result<(), ChainError> {
        for i in [from, to] {
            if i >= self.slots.len() {
                return Err(ChainError::SlotOutOfRange(i));
            }
        }
        if from != to {
            let slot = self.slots.remove(from);
            self.slots.insert(to, slot);
        }
        Ok(())
    }

    /// Fill view slots from `names` (missing/`None` entries stay empty) and
    /// set the adjustment. Earlier selections are discarded.
    pub fn load_defaults(&mut self, names: &[Option<String>], adjustment: Option<&str>) -> Result<(), ChainError> {
        *self = Self::default();
        self.select_defaults(names)?;
        if let Some(name) = adjustment {
            self.select(SlotId::Adjustment, name)?;
        }
        Ok(())
    }

    /// Select `names` into the leading view slots. `None` entries, later
    /// slots and the adjustment keep their current state.
    pub fn select_defaults(&mut self, names: &[Option<String>]) -> Result<(), ChainError> {
        for (i, name) in names.iter().take(MAX_SLOTS).enumerate() {
            if let Some(name) = name {
                self.select(SlotId::View(i), name)?;
            }
        }
        Ok(())
    }

    /// Selected filter names per view slot, for persistence.
    pub fn slot_names(&self) -> Vec<Option<String>> {
        self.slots
            .iter()
            .map(|s| s.filter_name().map(str::to_string))
            .collect()
    }

    /// Expressions of enabled, non-empty view slots in slot order.
    pub fn view_expressions(&self) -> Vec<String> {
        self.slots.iter().filter_map(FilterSlot::expression).collect()
    }

    /// Adjustment expression, empty when none.
    pub fn adjustment_expression(&self) -> String {
        self.adjustment.expression().unwrap_or_default()
    }
}
