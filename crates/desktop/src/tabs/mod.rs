pub mod appearance_tab;
pub mod detection_tab;
pub mod player_tab;
