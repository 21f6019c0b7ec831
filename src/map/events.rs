use std::collections::HashMap;

use anyhow::Context;
use strum::IntoEnumIterator;

use crate::geofile::feature::{Feature, FeatureMap};

use super::{
    buffer::BufferRadius, display::MapDisplay, render::RESTAURANTS_LAYER, session::MapSession,
};

/// The UI controls that emit change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    DietSubmit,
    CuisineSubmit,
    Legend,
    Radius(BufferRadius),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlValue {
    Selection(String),
    Checked(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Load,
    DatasetLoaded(Vec<Feature>),
    DatasetFailed(String),
    Click {
        lon: f64,
        lat: f64,
    },
    MouseEnter {
        layer: String,
        coordinates: geo::Point,
        properties: FeatureMap,
    },
    MouseLeave {
        layer: String,
    },
    ControlChange {
        control: ControlId,
        value: ControlValue,
    },
}

/// Where an event comes from. Handlers subscribe to sources, not to individual events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventSource {
    Load,
    Dataset,
    Click,
    MouseEnter(String),
    MouseLeave(String),
    Control(ControlId),
}

impl MapEvent {
    pub fn source(&self) -> EventSource {
        match self {
            MapEvent::Load => EventSource::Load,
            MapEvent::DatasetLoaded(_) | MapEvent::DatasetFailed(_) => EventSource::Dataset,
            MapEvent::Click { .. } => EventSource::Click,
            MapEvent::MouseEnter { layer, .. } => EventSource::MouseEnter(layer.clone()),
            MapEvent::MouseLeave { layer } => EventSource::MouseLeave(layer.clone()),
            MapEvent::ControlChange { control, .. } => EventSource::Control(*control),
        }
    }
}

pub type Handler = fn(&mut MapSession, &mut dyn MapDisplay, &MapEvent) -> anyhow::Result<()>;

struct Subscription {
    name: &'static str,
    handler: Handler,
}

/// Single-threaded event dispatcher.
///
/// Handlers subscribed to the same source run in subscription order, each to completion, before
/// `dispatch` returns.
#[derive(Default)]
pub struct Dispatcher {
    subscriptions: HashMap<EventSource, Vec<Subscription>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wiring of the restaurant map: every control, the map click and hover on the
    /// restaurants layer.
    pub fn standard() -> Self {
        let mut dispatcher = Self::new();
        dispatcher
            .on(EventSource::Load, "install-layers", handle_load)
            .on(EventSource::Dataset, "populate-store", handle_dataset)
            .on(EventSource::Click, "place-click-point", handle_click)
            .on(
                EventSource::MouseEnter(RESTAURANTS_LAYER.to_string()),
                "open-popup",
                handle_mouse_enter,
            )
            .on(
                EventSource::MouseLeave(RESTAURANTS_LAYER.to_string()),
                "close-popup",
                handle_mouse_leave,
            )
            .on(
                EventSource::Control(ControlId::DietSubmit),
                "diet-filter",
                handle_diet_submit,
            )
            .on(
                EventSource::Control(ControlId::CuisineSubmit),
                "cuisine-filter",
                handle_cuisine_submit,
            )
            .on(
                EventSource::Control(ControlId::Legend),
                "legend-visibility",
                handle_legend,
            );
        for radius in BufferRadius::iter() {
            dispatcher.on(
                EventSource::Control(ControlId::Radius(radius)),
                "buffer-radius",
                handle_radius,
            );
        }
        dispatcher
    }

    pub fn on(&mut self, source: EventSource, name: &'static str, handler: Handler) -> &mut Self {
        self.subscriptions
            .entry(source)
            .or_default()
            .push(Subscription { name, handler });
        self
    }

    pub fn handler_names(&self, source: &EventSource) -> Vec<&'static str> {
        self.subscriptions
            .get(source)
            .map(|subscriptions| subscriptions.iter().map(|s| s.name).collect())
            .unwrap_or_default()
    }

    pub fn dispatch(
        &self,
        session: &mut MapSession,
        display: &mut dyn MapDisplay,
        event: &MapEvent,
    ) -> anyhow::Result<()> {
        let source = event.source();
        let Some(subscriptions) = self.subscriptions.get(&source) else {
            log::trace!("No handler for {:?}", source);
            return Ok(());
        };
        for subscription in subscriptions {
            (subscription.handler)(session, display, event)
                .with_context(|| format!("Handler {} failed on {:?}", subscription.name, source))?;
        }
        Ok(())
    }
}

fn handle_load(
    session: &mut MapSession,
    display: &mut dyn MapDisplay,
    _event: &MapEvent,
) -> anyhow::Result<()> {
    session.on_map_load(display)
}

fn handle_dataset(
    session: &mut MapSession,
    display: &mut dyn MapDisplay,
    event: &MapEvent,
) -> anyhow::Result<()> {
    match event {
        MapEvent::DatasetLoaded(features) => {
            session.on_dataset_loaded(features.clone(), display)?;
        }
        MapEvent::DatasetFailed(reason) => session.on_dataset_failed(reason),
        _ => {}
    }
    Ok(())
}

fn handle_click(
    session: &mut MapSession,
    display: &mut dyn MapDisplay,
    event: &MapEvent,
) -> anyhow::Result<()> {
    if let MapEvent::Click { lon, lat } = event {
        session.click(*lon, *lat, display)?;
    }
    Ok(())
}

fn handle_mouse_enter(
    session: &mut MapSession,
    display: &mut dyn MapDisplay,
    event: &MapEvent,
) -> anyhow::Result<()> {
    if let MapEvent::MouseEnter {
        coordinates,
        properties,
        ..
    } = event
    {
        session.hover_enter(*coordinates, properties, display)?;
    }
    Ok(())
}

fn handle_mouse_leave(
    session: &mut MapSession,
    display: &mut dyn MapDisplay,
    _event: &MapEvent,
) -> anyhow::Result<()> {
    session.hover_leave(display)
}

fn control_value(event: &MapEvent) -> Option<&ControlValue> {
    match event {
        MapEvent::ControlChange { value, .. } => Some(value),
        _ => None,
    }
}

fn handle_diet_submit(
    session: &mut MapSession,
    display: &mut dyn MapDisplay,
    event: &MapEvent,
) -> anyhow::Result<()> {
    match control_value(event) {
        Some(ControlValue::Selection(value)) => {
            session.set_attribute_filter(value, display)?;
        }
        other => log::warn!("Diet control sent {:?}, expected a selection", other),
    }
    Ok(())
}

fn handle_cuisine_submit(
    session: &mut MapSession,
    display: &mut dyn MapDisplay,
    event: &MapEvent,
) -> anyhow::Result<()> {
    match control_value(event) {
        Some(ControlValue::Selection(value)) => {
            session.set_cuisine_filter(value, display)?;
        }
        other => log::warn!("Cuisine control sent {:?}, expected a selection", other),
    }
    Ok(())
}

fn handle_legend(
    session: &mut MapSession,
    display: &mut dyn MapDisplay,
    event: &MapEvent,
) -> anyhow::Result<()> {
    match control_value(event) {
        Some(ControlValue::Checked(visible)) => session.set_legend_visible(*visible, display),
        other => {
            log::warn!("Legend control sent {:?}, expected a checkbox state", other);
            Ok(())
        }
    }
}

fn handle_radius(
    session: &mut MapSession,
    display: &mut dyn MapDisplay,
    event: &MapEvent,
) -> anyhow::Result<()> {
    match event {
        MapEvent::ControlChange {
            control: ControlId::Radius(radius),
            value: ControlValue::Checked(checked),
        } => session.toggle_buffer(*radius, *checked, display),
        other => {
            log::warn!("Radius control sent {:?}, expected a checkbox state", other);
            Ok(())
        }
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
            render::{BUFFER_LAYER, RESTAURANTS_LAYER},
            scene::SceneDisplay,
            session::MapSession,
        },
    };

    use super::{ControlId, ControlValue, Dispatcher, EventSource, MapEvent};

    fn restaurant(attributes: &[(&str, &str)]) -> Feature {
        Feature::new(
            geo::Geometry::Point(geo::Point::new(-79.39, 43.66)),
            attributes
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect::<FeatureMap>(),
        )
    }

    fn control(control: ControlId, value: ControlValue) -> MapEvent {
        MapEvent::ControlChange { control, value }
    }

    fn select(value: &str) -> ControlValue {
        ControlValue::Selection(value.to_string())
    }

    #[fixture]
    fn started() -> (Dispatcher, MapSession, SceneDisplay) {
        let dispatcher = Dispatcher::standard();
        let mut session = MapSession::default();
        let mut display = SceneDisplay::new();
        for event in [
            MapEvent::Load,
            MapEvent::DatasetLoaded(vec![
                restaurant(&[("cuisine", "korean")]),
                restaurant(&[("cuisine", "salad"), ("diet:vegetarian", "yes")]),
                restaurant(&[("cuisine", "thai"), ("diet:vegetarian", "only")]),
            ]),
        ] {
            dispatcher.dispatch(&mut session, &mut display, &event).unwrap();
        }
        (dispatcher, session, display)
    }

    #[rstest]
    fn test_filter_controls(started: (Dispatcher, MapSession, SceneDisplay)) {
        let (dispatcher, mut session, mut display) = started;
        assert_eq!(3, session.visible_features(&display).unwrap().len());

        dispatcher
            .dispatch(
                &mut session,
                &mut display,
                &control(ControlId::DietSubmit, select("diet:vegetarian")),
            )
            .unwrap();
        let visible = session.visible_features(&display).unwrap();
        assert_eq!(1, visible.len());
        assert_eq!(visible[0].attribute("cuisine"), Some("salad"));

        dispatcher
            .dispatch(
                &mut session,
                &mut display,
                &control(ControlId::CuisineSubmit, select("korean")),
            )
            .unwrap();
        assert!(session.visible_features(&display).unwrap().is_empty());

        dispatcher
            .dispatch(
                &mut session,
                &mut display,
                &control(ControlId::DietSubmit, select("All")),
            )
            .unwrap();
        let visible = session.visible_features(&display).unwrap();
        assert_eq!(vec![&restaurant(&[("cuisine", "korean")])], visible);
    }

    #[rstest]
    fn test_click_and_radius(started: (Dispatcher, MapSession, SceneDisplay)) {
        let (dispatcher, mut session, mut display) = started;
        for event in [
            MapEvent::Click {
                lon: -79.38,
                lat: 43.65,
            },
            control(
                ControlId::Radius(BufferRadius::OneKm),
                ControlValue::Checked(true),
            ),
            control(
                ControlId::Radius(BufferRadius::TwoKm),
                ControlValue::Checked(true),
            ),
        ] {
            dispatcher.dispatch(&mut session, &mut display, &event).unwrap();
        }
        let buffers = display.rendered_features(BUFFER_LAYER).unwrap();
        assert_eq!(1, buffers.len());
        assert_eq!(buffers[0].attribute(RADIUS_KEY), Some("2"));

        dispatcher
            .dispatch(
                &mut session,
                &mut display,
                &control(
                    ControlId::Radius(BufferRadius::TwoKm),
                    ControlValue::Checked(false),
                ),
            )
            .unwrap();
        assert!(!display.has_layer(BUFFER_LAYER));
    }

    #[rstest]
    fn test_hover_only_on_restaurants_layer(started: (Dispatcher, MapSession, SceneDisplay)) {
        let (dispatcher, mut session, mut display) = started;
        let enter = |layer: &str| MapEvent::MouseEnter {
            layer: layer.to_string(),
            coordinates: geo::Point::new(-79.39, 43.66),
            properties: FeatureMap::from([("cuisine".to_string(), "korean".to_string())]),
        };

        dispatcher
            .dispatch(&mut session, &mut display, &enter("buffer-layer"))
            .unwrap();
        assert!(display.popup().is_none());

        dispatcher
            .dispatch(&mut session, &mut display, &enter(RESTAURANTS_LAYER))
            .unwrap();
        assert!(display.popup().is_some());

        dispatcher
            .dispatch(
                &mut session,
                &mut display,
                &MapEvent::MouseLeave {
                    layer: RESTAURANTS_LAYER.to_string(),
                },
            )
            .unwrap();
        assert!(display.popup().is_none());
    }

    #[rstest]
    fn test_mismatched_control_value_is_ignored(started: (Dispatcher, MapSession, SceneDisplay)) {
        let (dispatcher, mut session, mut display) = started;
        dispatcher
            .dispatch(
                &mut session,
                &mut display,
                &control(ControlId::Legend, select("hidden")),
            )
            .unwrap();
        assert!(display.legend_visible());

        dispatcher
            .dispatch(
                &mut session,
                &mut display,
                &control(ControlId::Legend, ControlValue::Checked(false)),
            )
            .unwrap();
        assert!(!display.legend_visible());
    }

    #[rstest]
    fn test_handlers_run_in_subscription_order() {
        fn hide_legend(
            session: &mut MapSession,
            display: &mut dyn MapDisplay,
            _event: &MapEvent,
        ) -> anyhow::Result<()> {
            session.set_legend_visible(false, display)
        }
        fn show_legend(
            session: &mut MapSession,
            display: &mut dyn MapDisplay,
            _event: &MapEvent,
        ) -> anyhow::Result<()> {
            session.set_legend_visible(true, display)
        }

        let mut dispatcher = Dispatcher::standard();
        dispatcher
            .on(EventSource::Click, "hide-legend", hide_legend)
            .on(EventSource::Click, "show-legend", show_legend);
        assert_eq!(
            vec!["place-click-point", "hide-legend", "show-legend"],
            dispatcher.handler_names(&EventSource::Click)
        );

        let mut session = MapSession::default();
        let mut display = SceneDisplay::new();
        dispatcher
            .dispatch(&mut session, &mut display, &MapEvent::Load)
            .unwrap();
        dispatcher
            .dispatch(
                &mut session,
                &mut display,
                &MapEvent::Click {
                    lon: -79.38,
                    lat: 43.65,
                },
            )
            .unwrap();
        assert!(session.legend_visible());
        assert!(session.store().has_click_point());
    }

    #[rstest]
    fn test_handler_errors_carry_context() {
        let dispatcher = Dispatcher::standard();
        let mut session = MapSession::default();
        let mut display = SceneDisplay::new();
        let err = dispatcher
            .dispatch(
                &mut session,
                &mut display,
                &MapEvent::Click {
                    lon: f64::NAN,
                    lat: 43.65,
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("place-click-point"));
    }

    #[rstest]
    fn test_unsubscribed_source_is_noop() {
        let dispatcher = Dispatcher::new();
        let mut session = MapSession::default();
        let mut display = SceneDisplay::new();
        dispatcher
            .dispatch(&mut session, &mut display, &MapEvent::Load)
            .unwrap();
        assert!(!session.is_map_loaded());
    }
}
