mod counter_label;
pub mod trajectory_annotator;
