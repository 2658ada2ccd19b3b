// demos/notes_app/src/models/mod.rs

//! Contains data structures managed by the note store.

pub mod note;

pub use note::Note;
