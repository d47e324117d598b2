//! Picking which place to enrich for an itinerary day

use serde::{Deserialize, Serialize};

/// Anything carrying an optional place name
pub trait Located {
    fn location(&self) -> Option<&str>;
}

/// Minimal itinerary entry as seen by the weather layer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ItineraryItem {
    pub area: Option<String>,
}

impl ItineraryItem {
    #[must_use]
    pub fn new(area: Option<&str>) -> Self {
        Self {
            area: area.map(str::to_string),
        }
    }
}

impl Located for ItineraryItem {
    fn location(&self) -> Option<&str> {
        self.area.as_deref()
    }
}

/// First non-empty location in list order
#[must_use]
pub fn first_location<T: Located>(items: &[T]) -> Option<&str> {
    items
        .iter()
        .filter_map(|item| item.location())
        .find(|location| !location.is_empty())
}
