//! Music playback module for voice channel audio.

mod commands;
mod controls;
mod playback;
mod queue;

pub use commands::{music_commands, queue_description};
pub use controls::{CUSTOM_ID_PREFIX, MusicButton, control_rows, handle as handle_control};
pub use playback::{PlaybackContext, play_next, start_if_idle, stop_playback};
pub use queue::{Cue, GuildPlayer, Jukebox, Song};
