pub mod carousel;
pub mod content;
pub mod gesture;
pub mod ramp;
pub mod timer;
