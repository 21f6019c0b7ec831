//! Headless restaurant map: filter, hover and buffer a GeoJSON restaurant dataset the way the
//! interactive map does, against any display implementing [`map::display::MapDisplay`].
pub mod config;
pub mod dataset;
pub mod geofile;
pub mod map;
