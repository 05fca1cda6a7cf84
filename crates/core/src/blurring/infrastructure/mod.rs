mod bilateral;
pub mod blurrer_factory;
pub mod edge_aware_region_blurrer;
mod gaussian;
mod roi;
pub mod standard_region_blurrer;
