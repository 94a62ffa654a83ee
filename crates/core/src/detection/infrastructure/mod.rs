pub mod jsonl_detection_provider;
