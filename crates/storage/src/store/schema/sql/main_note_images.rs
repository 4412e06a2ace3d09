#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"
        INSERT INTO note_images(note_image_id, note_id, image_id, date_created, date_modified) VALUES
          ('welcome_pixel', 'welcome', 'pixel', '2018-01-01T00:00:00.000Z', '2018-01-01T00:00:00.000Z');
"#;
