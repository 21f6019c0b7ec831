pub mod buffer;
pub mod display;
pub mod events;
pub mod filter;
pub mod popup;
pub mod predicate;
pub mod render;
pub mod scene;
pub mod session;
pub mod store;
pub mod style;
