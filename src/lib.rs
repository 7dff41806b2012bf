pub mod dem_pipeline;
pub mod logger;
