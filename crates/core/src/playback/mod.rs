pub mod domain;
pub mod frame_loop;
pub mod frame_loop_logger;
pub mod infrastructure;
pub mod player_session;
