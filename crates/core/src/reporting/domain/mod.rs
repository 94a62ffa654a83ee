pub mod report;
pub mod report_generator;
pub mod report_writer;
