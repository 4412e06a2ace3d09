#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"
        INSERT INTO notes(note_id, title, content, date_created, date_modified) VALUES
          ('root', 'root', NULL, '2018-01-01T00:00:00.000Z', '2018-01-01T00:00:00.000Z'),
          ('welcome', 'Welcome',
           '<p>Notes live in a tree. Drag a note onto another to move it.</p>',
           '2018-01-01T00:00:00.000Z', '2018-01-01T00:00:00.000Z'),
          ('formatting', 'Formatting',
           '<p>Headings, lists and <b>bold</b> text are supported.</p>',
           '2018-01-01T00:00:00.000Z', '2018-01-01T00:00:00.000Z'),
          ('sync_help', 'Synchronization',
           '<p>Point the sync server host option at a server to share this document.</p>',
           '2018-01-01T00:00:00.000Z', '2018-01-01T00:00:00.000Z');
"#;
