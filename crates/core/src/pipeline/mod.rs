pub mod track_pipeline;
