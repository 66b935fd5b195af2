use foundation::math::GeoPoint;
use serde::{Deserialize, Serialize};

/// A departure/arrival pair, as fed in from route data.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub departure: GeoPoint,
    pub arrival: GeoPoint,
}

impl Route {
    pub fn new(departure: GeoPoint, arrival: GeoPoint) -> Self {
        Self { departure, arrival }
    }
}
