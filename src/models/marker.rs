use serde::{Deserialize, Serialize};

pub const DEFAULT_MARKER_NOTE: &str = "여기에 적 출현!";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapMarker {
    pub id: u64,
    pub position: LatLng,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMarkerRequest {
    pub position: LatLng,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMarkerRequest {
    pub note: Option<String>,
}

/// Trimmed note, or the default one when blank or absent.
pub fn marker_note(note: Option<String>) -> String {
    note.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_MARKER_NOTE.to_string())
}
