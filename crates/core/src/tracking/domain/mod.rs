pub mod associator;
pub mod bounding_box;
pub mod detection;
pub mod detector;
pub mod feature;
pub mod feature_extractor;
pub mod frame_source;
pub mod labeled_frame;
pub mod motion_filter;
pub mod roi_gate;
pub mod track;
pub mod track_manager;
