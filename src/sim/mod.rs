pub mod event;
pub mod gallery;
pub mod music;
pub mod prefs;
pub mod slideshow;
pub mod title;
pub mod world;
