use tracing::info;

use crate::{
    error::{AppError, Result},
    models::marker::{marker_note, CreateMarkerRequest, MapMarker},
    services::storage::{keys, CollectionStore},
};

#[derive(Clone)]
pub struct MarkerService {
    store: CollectionStore,
}

impl MarkerService {
    pub fn new(store: CollectionStore) -> Self {
        Self { store }
    }

    pub fn list_markers(&self) -> Vec<MapMarker> {
        self.store.load(keys::MAP_MARKERS)
    }

    pub fn add_marker(&self, request: CreateMarkerRequest) -> Result<MapMarker> {
        let position = request.position;
        if !(-90.0..=90.0).contains(&position.lat) || !(-180.0..=180.0).contains(&position.lng) {
            return Err(AppError::validation("Marker position is out of range"));
        }

        let mut markers = self.list_markers();
        let id = markers
            .iter()
            .map(|m| m.id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| AppError::internal("Marker id space exhausted"))?;

        let marker = MapMarker {
            id,
            position,
            note: marker_note(request.note),
        };
        markers.push(marker.clone());
        self.store.save(keys::MAP_MARKERS, &markers)?;

        info!("Map marker {} added", marker.id);
        Ok(marker)
    }

    pub fn update_note(&self, id: u64, note: Option<String>) -> Result<MapMarker> {
        let mut markers = self.list_markers();
        let marker = markers
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::not_found("Marker"))?;
        marker.note = marker_note(note);
        let updated = marker.clone();

        self.store.save(keys::MAP_MARKERS, &markers)?;
        info!("Map marker {} note updated", id);
        Ok(updated)
    }

    pub fn remove_marker(&self, id: u64) -> Result<()> {
        let mut markers = self.list_markers();
        let before = markers.len();
        markers.retain(|m| m.id != id);
        if markers.len() == before {
            return Err(AppError::not_found("Marker"));
        }

        self.store.save(keys::MAP_MARKERS, &markers)?;
        info!("Map marker {} removed", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::marker::{LatLng, DEFAULT_MARKER_NOTE};

    fn request(lat: f64, lng: f64, note: Option<&str>) -> CreateMarkerRequest {
        CreateMarkerRequest {
            position: LatLng { lat, lng },
            note: note.map(str::to_string),
        }
    }

    #[test]
    fn markers_get_sequential_ids_and_default_note() {
        let service = MarkerService::new(CollectionStore::in_memory());

        let first = service.add_marker(request(37.5, 127.0, None)).unwrap();
        let second = service.add_marker(request(37.6, 127.1, Some("sniper nest"))).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(first.note, DEFAULT_MARKER_NOTE);
        assert_eq!(second.id, 2);
        assert_eq!(second.note, "sniper nest");
        assert_eq!(service.list_markers().len(), 2);
    }

    #[test]
    fn removing_markers() {
        let service = MarkerService::new(CollectionStore::in_memory());
        let marker = service.add_marker(request(10.0, 10.0, None)).unwrap();

        service.remove_marker(marker.id).unwrap();
        assert!(service.list_markers().is_empty());
        assert!(matches!(service.remove_marker(marker.id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn note_edits_keep_id_and_position() {
        let service = MarkerService::new(CollectionStore::in_memory());
        let marker = service.add_marker(request(37.5, 127.0, None)).unwrap();
        let other = service.add_marker(request(1.0, 2.0, Some("keep"))).unwrap();

        let edited = service
            .update_note(marker.id, Some(" 2층 창문 ".to_string()))
            .unwrap();
        assert_eq!(edited.id, marker.id);
        assert_eq!(edited.position, marker.position);
        assert_eq!(edited.note, "2층 창문");
        assert_eq!(service.list_markers(), vec![edited.clone(), other]);

        let cleared = service.update_note(marker.id, Some("   ".to_string())).unwrap();
        assert_eq!(cleared.note, DEFAULT_MARKER_NOTE);

        assert!(matches!(
            service.update_note(99, Some("x".to_string())),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn add_declines_when_ids_are_exhausted() {
        let store = CollectionStore::in_memory();
        let taken = MapMarker {
            id: u64::MAX,
            position: LatLng { lat: 0.0, lng: 0.0 },
            note: "edge".to_string(),
        };
        store.save(keys::MAP_MARKERS, &[taken.clone()]).unwrap();
        let service = MarkerService::new(store);

        assert!(matches!(
            service.add_marker(request(1.0, 1.0, None)),
            Err(AppError::Internal(_))
        ));
        assert_eq!(service.list_markers(), vec![taken]);
    }

    #[test]
    fn out_of_range_position_is_rejected() {
        let service = MarkerService::new(CollectionStore::in_memory());
        assert!(service.add_marker(request(91.0, 0.0, None)).is_err());
        assert!(service.add_marker(request(f64::NAN, 0.0, None)).is_err());
    }
}
