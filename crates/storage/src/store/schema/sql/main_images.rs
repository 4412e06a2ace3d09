#![forbid(unsafe_code)]

// 1x1 transparent GIF.
pub(super) const SQL: &str = r#"
        INSERT INTO images(image_id, name, format, checksum, data, date_created, date_modified) VALUES
          ('pixel', 'pixel.gif', 'gif', NULL,
           X'47494638396101000100800000000000FFFFFF21F90401000000002C00000000010001000002024401003B',
           '2018-01-01T00:00:00.000Z', '2018-01-01T00:00:00.000Z');
"#;
