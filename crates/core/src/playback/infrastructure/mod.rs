pub mod annotating_sink;
