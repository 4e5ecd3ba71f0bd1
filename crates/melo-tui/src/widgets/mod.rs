pub mod icons;
pub mod status_indicator;
