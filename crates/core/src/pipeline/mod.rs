pub mod infrastructure;
pub mod pipeline_executor;
pub mod pipeline_logger;
pub mod track_objects_use_case;
