use std::path::{Path, PathBuf};

/// What the Play/Pause control asks the video source to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
}

/// Text on the Play/Pause control: the action a click will perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayPauseLabel {
    Play,
    Pause,
}

impl PlayPauseLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayPauseLabel::Play => "Play",
            PlayPauseLabel::Pause => "Pause",
        }
    }
}

impl std::fmt::Display for PlayPauseLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the three controls are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlVisibility {
    pub file_picker: bool,
    /// `None` hides the control.
    pub play_pause: Option<PlayPauseLabel>,
    pub clear: bool,
}

/// Playback state behind the player controls.
///
/// Mutated only by user actions (plus [`PlaybackState::mark_stopped`] when
/// the video runs out). Control visibility is derived from it and never
/// stored separately, so the two cannot drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    file: Option<PathBuf>,
    playing: bool,
    clear_shown: bool,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A newly selected file starts paused, replacing any previous one.
    pub fn select_file(&mut self, path: &Path) {
        self.file = Some(path.to_path_buf());
        self.playing = false;
        self.clear_shown = true;
    }

    /// Flips between playing and paused. `None` when no file is loaded.
    pub fn toggle_play_pause(&mut self) -> Option<PlaybackCommand> {
        self.file.as_ref()?;
        self.playing = !self.playing;
        Some(if self.playing {
            PlaybackCommand::Play
        } else {
            PlaybackCommand::Pause
        })
    }

    /// Drops the file and returns to the initial state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Playback stopped on its own (end of video or a fatal error).
    pub fn mark_stopped(&mut self) {
        self.playing = false;
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn clear_shown(&self) -> bool {
        self.clear_shown
    }

    pub fn visibility(&self) -> ControlVisibility {
        let label = if self.playing {
            PlayPauseLabel::Pause
        } else {
            PlayPauseLabel::Play
        };
        ControlVisibility {
            file_picker: !self.clear_shown,
            play_pause: self.file.is_some().then_some(label),
            clear: self.clear_shown,
        }
    }
}
