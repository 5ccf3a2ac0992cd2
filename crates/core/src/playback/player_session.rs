use std::path::Path;

use thiserror::Error;

use crate::playback::domain::playback_issue::PlaybackIssue;
use crate::playback::domain::playback_state::{ControlVisibility, PlaybackCommand, PlaybackState};
use crate::playback::frame_loop::{FrameLoop, FrameLoopError, LoopExit, LoopParts, LoopState, Pacing};
use crate::shared::dimensions::Dimensions;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Playback(#[from] PlaybackIssue),
    #[error(transparent)]
    Loop(#[from] FrameLoopError),
    #[error("cannot start playback: {0}")]
    NotStarted(String),
    /// A previous worker panicked and took the video source with it.
    #[error("playback worker was lost; restart the player")]
    WorkerLost,
}

/// Wires the player controls to the video source and the frame loop.
///
/// Owns the parts of the loop while it is idle and hands them to the
/// worker on Play. Every control action first takes them back, so a loop
/// can never outlive the action that should have stopped it.
pub struct PlayerSession {
    state: PlaybackState,
    frame_loop: FrameLoop,
    parts: Option<LoopParts>,
    display: Option<Dimensions>,
}

impl PlayerSession {
    pub fn new(parts: LoopParts, pacing: Pacing) -> Self {
        Self {
            state: PlaybackState::new(),
            frame_loop: FrameLoop::new(pacing),
            parts: Some(parts),
            display: None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn visibility(&self) -> ControlVisibility {
        self.state.visibility()
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.state() == LoopState::Running
    }

    /// Size the video is shown at, which overlays must match.
    pub fn display_dimensions(&self) -> Option<Dimensions> {
        self.display
    }

    /// Loads `path` paused, replacing the current file. A file that
    /// cannot be opened is reported to the sink and leaves nothing loaded.
    pub fn select_file(&mut self, path: &Path) -> Result<(), SessionError> {
        self.reclaim()?;
        let parts = loaded_parts(&mut self.parts)?;
        parts.sink.clear();

        match parts.source.load(path) {
            Ok(_) => {
                self.display = parts.source.display_dimensions();
                self.state.select_file(path);
                Ok(())
            }
            Err(issue) => {
                log::warn!("{issue}");
                parts.sink.report(issue.clone());
                self.display = None;
                self.state.clear();
                Err(issue.into())
            }
        }
    }

    /// Play/Pause click. Returns the command carried out, or `None` when
    /// no file is loaded.
    pub fn toggle_play_pause(&mut self) -> Result<Option<PlaybackCommand>, SessionError> {
        self.poll()?;
        let Some(command) = self.state.toggle_play_pause() else {
            return Ok(None);
        };

        match command {
            PlaybackCommand::Play => {
                if let Err(e) = self.play() {
                    self.state.mark_stopped();
                    return Err(e);
                }
            }
            PlaybackCommand::Pause => self.reclaim()?,
        }
        Ok(Some(command))
    }

    /// Stops playback, releases the file and blanks the overlay.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.reclaim()?;
        let parts = loaded_parts(&mut self.parts)?;
        parts.source.clear();
        parts.sink.clear();
        self.display = None;
        self.state.clear();
        Ok(())
    }

    /// Collects a loop that stopped on its own. Call periodically.
    pub fn poll(&mut self) -> Result<Option<LoopExit>, SessionError> {
        match self.frame_loop.try_finish()? {
            Some((parts, exit)) => Ok(Some(self.finished(parts, exit))),
            None => Ok(None),
        }
    }

    /// Blocks until the running loop stops on its own. `None` when idle.
    pub fn wait(&mut self) -> Result<Option<LoopExit>, SessionError> {
        match self.frame_loop.wait()? {
            Some((parts, exit)) => Ok(Some(self.finished(parts, exit))),
            None => Ok(None),
        }
    }

    fn play(&mut self) -> Result<(), SessionError> {
        let mut parts = self.parts.take().ok_or(SessionError::WorkerLost)?;
        if parts.source.has_ended() {
            if let Err(issue) = parts.source.rewind() {
                parts.sink.report(issue.clone());
                self.parts = Some(parts);
                return Err(issue.into());
            }
        }
        self.frame_loop.start(parts).map_err(|e| {
            log::warn!("Cannot start playback: {e}");
            let message = e.to_string();
            match e.into_parts() {
                Some(parts) => {
                    self.parts = Some(parts);
                    SessionError::NotStarted(message)
                }
                None => SessionError::WorkerLost,
            }
        })
    }

    fn reclaim(&mut self) -> Result<(), SessionError> {
        if let Some((parts, exit)) = self.frame_loop.stop()? {
            self.finished(parts, exit);
        }
        Ok(())
    }

    fn finished(&mut self, parts: LoopParts, exit: LoopExit) -> LoopExit {
        log::debug!("Playback loop returned: {exit:?}");
        self.parts = Some(parts);
        self.state.mark_stopped();
        exit
    }
}

fn loaded_parts(parts: &mut Option<LoopParts>) -> Result<&mut LoopParts, SessionError> {
    parts.as_mut().ok_or(SessionError::WorkerLost)
}
