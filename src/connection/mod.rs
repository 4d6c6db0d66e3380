// Connection - Rendering context status

pub mod status;
