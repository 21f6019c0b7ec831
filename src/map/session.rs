use crate::geofile::feature::{Feature, FeatureMap};

use super::{
    buffer::{generate_buffers, BufferRadius},
    display::MapDisplay,
    filter::{DietMatch, FilterState},
    popup::{Popup, PopupContent},
    predicate::Predicate,
    render::{RenderSync, RESTAURANTS_LAYER},
    scene::SceneDisplay,
    store::FeatureStore,
};

/// State of one map session.
///
/// Owns everything the map's controls mutate. Event handlers get it by `&mut` together with the
/// display, and every change is pushed to the display before the handler returns.
#[derive(Debug)]
pub struct MapSession {
    store: FeatureStore,
    filters: FilterState,
    legend_visible: bool,
    radius: Option<BufferRadius>,
    buffers: Vec<Feature>,
    popup: Option<Popup>,
    render: RenderSync,
}

impl Default for MapSession {
    fn default() -> Self {
        Self::new(DietMatch::default())
    }
}

impl MapSession {
    pub fn new(diet_match: DietMatch) -> Self {
        if diet_match == DietMatch::YesOrOnly {
            log::info!("Diet filters match both \"yes\" and \"only\"");
        }
        Self {
            store: FeatureStore::new(),
            filters: FilterState::new(diet_match),
            legend_visible: true,
            radius: None,
            buffers: Vec::new(),
            popup: None,
            render: RenderSync::default(),
        }
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn predicate(&self) -> Predicate {
        self.filters.predicate()
    }

    pub fn legend_visible(&self) -> bool {
        self.legend_visible
    }

    pub fn radius(&self) -> Option<BufferRadius> {
        self.radius
    }

    pub fn buffers(&self) -> &[Feature] {
        &self.buffers
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn is_map_loaded(&self) -> bool {
        self.render.is_loaded()
    }

    /// Install the map layers and replay whatever state built up before the map loaded.
    pub fn on_map_load(&mut self, display: &mut dyn MapDisplay) -> anyhow::Result<()> {
        self.render.install(
            display,
            &self.store,
            &self.filters.predicate(),
            self.legend_visible,
        )?;
        if self.radius.is_some() {
            self.render.show_buffers(display, self.buffers.clone())?;
        }
        Ok(())
    }

    pub fn on_dataset_loaded(
        &mut self,
        features: Vec<Feature>,
        display: &mut dyn MapDisplay,
    ) -> anyhow::Result<bool> {
        if !self.store.load(features) {
            return Ok(false);
        }
        self.render.sync_data(display, &self.store)?;
        Ok(true)
    }

    /// The map keeps working on an empty store when the dataset could not be fetched.
    pub fn on_dataset_failed(&mut self, reason: &str) {
        log::warn!("Could not load restaurant dataset, the map stays empty: {}", reason);
    }

    pub fn set_attribute_filter(
        &mut self,
        raw: &str,
        display: &mut dyn MapDisplay,
    ) -> anyhow::Result<Predicate> {
        let predicate = self.filters.set_attribute_filter(raw);
        self.apply(predicate, display)
    }

    pub fn set_cuisine_filter(
        &mut self,
        raw: &str,
        display: &mut dyn MapDisplay,
    ) -> anyhow::Result<Predicate> {
        let predicate = self.filters.set_cuisine_filter(raw);
        self.apply(predicate, display)
    }

    fn apply(
        &mut self,
        predicate: Predicate,
        display: &mut dyn MapDisplay,
    ) -> anyhow::Result<Predicate> {
        log::info!("Filter changed to {}", predicate.to_expression());
        self.render.apply_predicate(display, &predicate)?;
        Ok(predicate)
    }

    pub fn set_legend_visible(
        &mut self,
        visible: bool,
        display: &mut dyn MapDisplay,
    ) -> anyhow::Result<()> {
        self.legend_visible = visible;
        self.render.set_legend_visible(display, visible)
    }

    /// Place the click point. Only the first click of a session places one.
    pub fn click(&mut self, lon: f64, lat: f64, display: &mut dyn MapDisplay) -> anyhow::Result<bool> {
        if !self.store.add_click_point(lon, lat)? {
            return Ok(false);
        }
        log::info!("Placed click point at ({}, {})", lon, lat);
        self.render.sync_data(display, &self.store)?;
        if let Some(click_point) = self.store.click_point() {
            self.render.show_click_point(display, click_point)?;
        }
        if let Some(radius) = self.radius {
            self.show_buffers(radius, display)?;
        }
        Ok(true)
    }

    /// React to a radius checkbox. Checking one replaces any other buffer, unchecking the active
    /// one clears the buffer layer.
    pub fn toggle_buffer(
        &mut self,
        radius: BufferRadius,
        checked: bool,
        display: &mut dyn MapDisplay,
    ) -> anyhow::Result<()> {
        if checked {
            self.radius = Some(radius);
            return self.show_buffers(radius, display);
        }
        if self.radius != Some(radius) {
            log::debug!("Radius {} is not active, nothing to clear", radius);
            return Ok(());
        }
        self.radius = None;
        self.buffers.clear();
        self.render.clear_buffers(display)
    }

    fn show_buffers(
        &mut self,
        radius: BufferRadius,
        display: &mut dyn MapDisplay,
    ) -> anyhow::Result<()> {
        self.buffers = generate_buffers(&self.store, radius.km());
        self.render.show_buffers(display, self.buffers.clone())
    }

    pub fn hover_enter(
        &mut self,
        coordinates: geo::Point,
        properties: &FeatureMap,
        display: &mut dyn MapDisplay,
    ) -> anyhow::Result<()> {
        // Nothing is drawn before the map loads, so nothing can be hovered.
        if !self.render.is_loaded() {
            log::debug!("Ignoring hover before map load");
            return Ok(());
        }
        let popup = Popup {
            coordinates,
            content: PopupContent::describe(properties),
        };
        self.render.show_popup(display, &popup)?;
        self.popup = Some(popup);
        Ok(())
    }

    pub fn hover_leave(&mut self, display: &mut dyn MapDisplay) -> anyhow::Result<()> {
        if self.popup.take().is_some() {
            self.render.hide_popup(display)?;
        }
        Ok(())
    }

    /// Restaurants currently drawn on `display`.
    pub fn visible_features<'a>(&self, display: &'a SceneDisplay) -> anyhow::Result<Vec<&'a Feature>> {
        if !self.render.is_loaded() {
            return Ok(Vec::new());
        }
        display.rendered_features(RESTAURANTS_LAYER)
    }

    /// Tear down the display state and start over as a freshly constructed session.
    pub fn reset(&mut self, display: &mut dyn MapDisplay) -> anyhow::Result<()> {
        self.render.uninstall(display)?;
        *self = Self::new(self.filters.diet_match());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use crate::{
        geofile::feature::{Feature, FeatureMap},
        map::{
            buffer::{BufferRadius, RADIUS_KEY},
            display::MapDisplay,
            predicate::Predicate,
            render::{BUFFER_LAYER, CLICK_POINT_LAYER, RESTAURANTS_SOURCE},
            scene::SceneDisplay,
        },
    };

    use super::MapSession;

    fn restaurant(attributes: &[(&str, &str)]) -> Feature {
        Feature::new(
            geo::Geometry::Point(geo::Point::new(-79.39, 43.66)),
            attributes
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect::<FeatureMap>(),
        )
    }

    #[fixture]
    fn loaded() -> (MapSession, SceneDisplay) {
        let mut session = MapSession::default();
        let mut display = SceneDisplay::new();
        session.on_map_load(&mut display).unwrap();
        session
            .on_dataset_loaded(
                vec![
                    restaurant(&[("cuisine", "korean")]),
                    restaurant(&[("cuisine", "salad"), ("diet:vegetarian", "yes")]),
                ],
                &mut display,
            )
            .unwrap();
        (session, display)
    }

    #[rstest]
    fn test_salad_scenario(loaded: (MapSession, SceneDisplay)) {
        let (mut session, mut display) = loaded;
        assert_eq!(2, session.visible_features(&display).unwrap().len());

        session.set_cuisine_filter("salad", &mut display).unwrap();
        let visible = session.visible_features(&display).unwrap();
        assert_eq!(
            vec![&restaurant(&[("cuisine", "salad"), ("diet:vegetarian", "yes")])],
            visible
        );
    }

    #[rstest]
    fn test_dataset_before_map_load() {
        let mut session = MapSession::default();
        let mut display = SceneDisplay::new();
        session
            .on_dataset_loaded(vec![restaurant(&[("cuisine", "thai")])], &mut display)
            .unwrap();
        session.set_cuisine_filter("korean", &mut display).unwrap();
        assert!(display.layers().is_empty());

        session.on_map_load(&mut display).unwrap();
        assert!(session.visible_features(&display).unwrap().is_empty());
        session.set_cuisine_filter("All", &mut display).unwrap();
        assert_eq!(1, session.visible_features(&display).unwrap().len());
    }

    #[rstest]
    fn test_failed_dataset_leaves_map_empty() {
        let mut session = MapSession::default();
        let mut display = SceneDisplay::new();
        session.on_map_load(&mut display).unwrap();
        session.on_dataset_failed("connection refused");

        session.set_attribute_filter("diet:halal", &mut display).unwrap();
        session
            .toggle_buffer(BufferRadius::OneKm, true, &mut display)
            .unwrap();
        assert!(session.visible_features(&display).unwrap().is_empty());
        assert!(display.rendered_features(BUFFER_LAYER).unwrap().is_empty());
    }

    #[rstest]
    fn test_second_click_ignored(loaded: (MapSession, SceneDisplay)) {
        let (mut session, mut display) = loaded;
        assert!(session.click(-79.38, 43.65, &mut display).unwrap());
        assert!(!session.click(-79.30, 43.70, &mut display).unwrap());
        assert_eq!(3, session.store().len());
        assert_eq!(Some(3), display.source(RESTAURANTS_SOURCE).map(|f| f.len()));
        assert_eq!(1, display.rendered_features(CLICK_POINT_LAYER).unwrap().len());
        // The click point has no cuisine, so it is never drawn as a restaurant.
        assert_eq!(2, session.visible_features(&display).unwrap().len());
    }

    #[rstest]
    fn test_radius_toggles_are_exclusive(loaded: (MapSession, SceneDisplay)) {
        let (mut session, mut display) = loaded;
        session.click(-79.38, 43.65, &mut display).unwrap();

        session
            .toggle_buffer(BufferRadius::OneKm, true, &mut display)
            .unwrap();
        session
            .toggle_buffer(BufferRadius::TwoKm, true, &mut display)
            .unwrap();
        let buffers = display.rendered_features(BUFFER_LAYER).unwrap();
        assert_eq!(1, buffers.len());
        assert_eq!(buffers[0].attribute(RADIUS_KEY), Some("2"));
        assert_eq!(Some(BufferRadius::TwoKm), session.radius());

        // Unchecking a radius that is not shown changes nothing.
        session
            .toggle_buffer(BufferRadius::OneKm, false, &mut display)
            .unwrap();
        assert!(display.has_layer(BUFFER_LAYER));

        session
            .toggle_buffer(BufferRadius::TwoKm, false, &mut display)
            .unwrap();
        assert!(!display.has_layer(BUFFER_LAYER));
        assert!(session.buffers().is_empty());
        assert_eq!(None, session.radius());
    }

    #[rstest]
    fn test_buffer_follows_late_click(loaded: (MapSession, SceneDisplay)) {
        let (mut session, mut display) = loaded;
        session
            .toggle_buffer(BufferRadius::HalfKm, true, &mut display)
            .unwrap();
        assert!(display.rendered_features(BUFFER_LAYER).unwrap().is_empty());

        session.click(-79.38, 43.65, &mut display).unwrap();
        assert_eq!(1, display.rendered_features(BUFFER_LAYER).unwrap().len());
    }

    #[rstest]
    fn test_hover_popup(loaded: (MapSession, SceneDisplay)) {
        let (mut session, mut display) = loaded;
        let properties = FeatureMap::from([
            ("name".to_string(), "Greens".to_string()),
            ("cuisine".to_string(), "salad".to_string()),
        ]);
        session
            .hover_enter(geo::Point::new(-79.39, 43.66), &properties, &mut display)
            .unwrap();
        let popup = display.popup().unwrap();
        assert_eq!(Some("Greens".to_string()), popup.content.name);
        assert!(popup.content.vegetarian);
        assert_eq!(Some(popup), session.popup());

        session.hover_leave(&mut display).unwrap();
        assert!(display.popup().is_none());
        assert!(session.popup().is_none());
        session.hover_leave(&mut display).unwrap();
    }

    #[rstest]
    fn test_hover_before_map_load_opens_nothing() {
        let mut session = MapSession::default();
        let mut display = SceneDisplay::new();
        let properties = FeatureMap::from([("cuisine".to_string(), "korean".to_string())]);
        session
            .hover_enter(geo::Point::new(-79.39, 43.66), &properties, &mut display)
            .unwrap();
        assert!(session.popup().is_none());

        session.on_map_load(&mut display).unwrap();
        assert!(display.popup().is_none());
        assert!(session.popup().is_none());
    }

    #[rstest]
    fn test_legend_visibility(loaded: (MapSession, SceneDisplay)) {
        let (mut session, mut display) = loaded;
        session.set_legend_visible(false, &mut display).unwrap();
        assert!(!display.legend_visible());
        assert!(!session.legend_visible());
    }

    #[rstest]
    fn test_reset(loaded: (MapSession, SceneDisplay)) {
        let (mut session, mut display) = loaded;
        session.set_cuisine_filter("korean", &mut display).unwrap();
        session.click(-79.38, 43.65, &mut display).unwrap();
        session
            .toggle_buffer(BufferRadius::OneKm, true, &mut display)
            .unwrap();

        session.reset(&mut display).unwrap();
        assert!(display.layers().is_empty());
        assert!(session.store().is_empty());
        assert!(!session.store().has_click_point());
        assert!(!session.is_map_loaded());
        assert_eq!(None, session.radius());
        assert_eq!(Predicate::has("cuisine"), session.predicate());

        session.on_map_load(&mut display).unwrap();
        assert!(session.is_map_loaded());
    }
}
