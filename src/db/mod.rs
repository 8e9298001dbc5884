//! Persistence module split across logical submodules. Every function takes
//! the connection owned by the caller; nothing here holds global state.

mod audio;
mod connection;
mod images;

pub use audio::{
    audio_path_in_use, delete_audio, delete_audio_with_covers, fetch_audio, find_audio,
    insert_audio,
};
pub use connection::{clear_all, ensure_schema, open_in_memory};
pub use images::{delete_image, fetch_images, image_path_in_use, insert_image};
