#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"
        INSERT INTO branches(branch_id, note_id, parent_note_id, note_position, is_expanded, date_modified) VALUES
          ('root', 'root', 'none', 0, 1, '2018-01-01T00:00:00.000Z'),
          ('welcome', 'welcome', 'root', 10, 1, '2018-01-01T00:00:00.000Z'),
          ('formatting', 'formatting', 'welcome', 10, 0, '2018-01-01T00:00:00.000Z'),
          ('sync_help', 'sync_help', 'root', 20, 0, '2018-01-01T00:00:00.000Z');
"#;
