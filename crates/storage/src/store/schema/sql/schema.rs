#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE notes (
          note_id TEXT PRIMARY KEY NOT NULL,
          title TEXT NOT NULL DEFAULT 'note',
          content TEXT,
          note_type TEXT NOT NULL DEFAULT 'text',
          mime TEXT NOT NULL DEFAULT 'text/html',
          is_protected INTEGER NOT NULL DEFAULT 0,
          is_deleted INTEGER NOT NULL DEFAULT 0,
          date_created TEXT NOT NULL,
          date_modified TEXT NOT NULL
        );

        -- Placement of a note in the tree. The root note hangs under parent 'none'.
        CREATE TABLE branches (
          branch_id TEXT PRIMARY KEY NOT NULL,
          note_id TEXT NOT NULL,
          parent_note_id TEXT NOT NULL,
          note_position INTEGER NOT NULL,
          prefix TEXT,
          is_expanded INTEGER NOT NULL DEFAULT 0,
          is_deleted INTEGER NOT NULL DEFAULT 0,
          date_modified TEXT NOT NULL,
          FOREIGN KEY(note_id) REFERENCES notes(note_id) ON DELETE RESTRICT
        );

        CREATE INDEX idx_branches_parent_position
          ON branches(parent_note_id, note_position);
        CREATE INDEX idx_branches_note ON branches(note_id);

        CREATE TABLE images (
          image_id TEXT PRIMARY KEY NOT NULL,
          name TEXT NOT NULL,
          format TEXT NOT NULL,
          checksum TEXT,
          data BLOB,
          is_deleted INTEGER NOT NULL DEFAULT 0,
          date_created TEXT NOT NULL,
          date_modified TEXT NOT NULL
        );

        CREATE TABLE note_images (
          note_image_id TEXT PRIMARY KEY NOT NULL,
          note_id TEXT NOT NULL,
          image_id TEXT NOT NULL,
          is_deleted INTEGER NOT NULL DEFAULT 0,
          date_created TEXT NOT NULL,
          date_modified TEXT NOT NULL,
          FOREIGN KEY(note_id) REFERENCES notes(note_id) ON DELETE CASCADE,
          FOREIGN KEY(image_id) REFERENCES images(image_id) ON DELETE CASCADE
        );

        CREATE INDEX idx_note_images_note ON note_images(note_id);

        CREATE TABLE options (
          name TEXT PRIMARY KEY NOT NULL,
          value TEXT,
          is_synced INTEGER NOT NULL DEFAULT 0,
          date_modified TEXT NOT NULL
        );

        -- Append-only: one row per origin id this store ever handed out.
        CREATE TABLE origin_records (
          id TEXT PRIMARY KEY NOT NULL,
          created_at TEXT NOT NULL
        );

        CREATE TABLE sync (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          entity_name TEXT NOT NULL,
          entity_id TEXT NOT NULL,
          sync_date TEXT NOT NULL,
          UNIQUE(entity_name, entity_id)
        );

        CREATE INDEX idx_sync_date ON sync(sync_date);
"#;
