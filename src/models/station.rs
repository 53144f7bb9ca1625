use serde::{Deserialize, Serialize};
use validator::Validate;

/// Station metadata from the QCLCD station file, keyed by WBAN.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Station {
    #[validate(length(min = 1))]
    pub wban: String,

    pub name: String,

    pub state: String,

    pub location: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    pub ground_height: Option<i32>,

    /// Offset from UTC in hours, as published in the station file.
    pub time_zone: Option<i32>,
}

impl Station {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wban: String,
        name: String,
        state: String,
        location: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
        ground_height: Option<i32>,
        time_zone: Option<i32>,
    ) -> Self {
        Self {
            wban,
            name,
            state,
            location,
            latitude,
            longitude,
            ground_height,
            time_zone,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn display_name(&self) -> String {
        if self.state.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.state)
        }
    }
}
