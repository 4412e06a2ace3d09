#![forbid(unsafe_code)]

mod main_branches;
mod main_images;
mod main_note_images;
mod main_notes;
mod schema;

/// Bundled init scripts in application order.
pub(super) const SCRIPTS: &[(&str, &str)] = &[
    ("schema", schema::SQL),
    ("main_notes", main_notes::SQL),
    ("main_branches", main_branches::SQL),
    ("main_images", main_images::SQL),
    ("main_note_images", main_note_images::SQL),
];
