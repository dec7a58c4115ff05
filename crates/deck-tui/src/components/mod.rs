pub mod ambient_mixer;
pub mod control_bar;
pub mod help_overlay;
pub mod notes;
pub mod pomodoro;
pub mod station_selector;
pub mod tasks;
pub mod theme_picker;
