//! Edge case tests for geolab-upload
//!
//! Category limits, rejected types and the data URL path end to end.

use geolab_upload::*;

const MB: u64 = 1024 * 1024;

fn uploader() -> Uploader<MemoryStore> {
    Uploader::new(MemoryStore::new("https://cdn.geolab.example"))
}

// ============================================================================
// POLICY
// ============================================================================

#[test]
fn test_pdf_size_boundary() {
    let policy = UploadPolicy::default();
    assert!(policy.validate(FileCategory::Document, "application/pdf", 49 * MB).is_ok());
    assert!(matches!(
        policy.validate(FileCategory::Document, "application/pdf", 51 * MB),
        Err(UploadError::FileTooLarge { .. })
    ));
}

#[test]
fn test_zip_rejected_for_documents() {
    let policy = UploadPolicy::default();
    assert!(matches!(
        policy.validate(FileCategory::Document, "application/zip", 1),
        Err(UploadError::UnsupportedFileType { .. })
    ));
}

#[test]
fn test_every_category_has_distinct_ceiling() {
    let policy = UploadPolicy::default();
    let limits: Vec<u64> = FileCategory::ALL
        .iter()
        .map(|c| policy.rule(*c).max_bytes)
        .collect();
    assert_eq!(limits, vec![50 * MB, 200 * MB, 10 * MB]);
}

#[test]
fn test_error_messages_are_descriptive() {
    let err = UploadPolicy::default()
        .validate(FileCategory::Image, "image/png", 11 * MB)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("file is {} bytes, image uploads are limited to {} bytes", 11 * MB, 10 * MB)
    );

    let err = UploadPolicy::default()
        .validate(FileCategory::Document, "application/zip", 1)
        .unwrap_err();
    assert_eq!(err.to_string(), "file type application/zip is not allowed for document");
}

// ============================================================================
// UPLOADS
// ============================================================================

#[test]
fn test_large_pdf_upload() {
    let up = uploader();
    let ok = smol::block_on(up.upload_at(
        1,
        FileCategory::Document,
        "atlas.pdf",
        "application/pdf",
        vec![0; (49 * MB) as usize],
    ));
    assert_eq!(ok.unwrap().key, "resources/1-atlas.pdf");

    let too_big = smol::block_on(up.upload_at(
        2,
        FileCategory::Document,
        "atlas.pdf",
        "application/pdf",
        vec![0; (51 * MB) as usize],
    ));
    assert!(matches!(too_big, Err(UploadError::FileTooLarge { .. })));
    assert_eq!(up.store().len(), 1);
}

#[test]
fn test_data_url_type_must_match_category() {
    let up = uploader();
    let err = smol::block_on(up.upload_data_url(
        FileCategory::Document,
        "clip.mp4",
        "data:video/mp4;base64,AAAA",
    ))
    .unwrap_err();
    assert!(matches!(err, UploadError::UnsupportedFileType { .. }));
    assert!(up.store().is_empty());
}

#[test]
fn test_keys_are_unique_per_timestamp() {
    let up = uploader();
    let a = smol::block_on(up.upload_at(10, FileCategory::Image, "map.png", "image/png", vec![1])).unwrap();
    let b = smol::block_on(up.upload_at(11, FileCategory::Image, "map.png", "image/png", vec![2])).unwrap();
    assert_ne!(a.key, b.key);
    assert_eq!(up.store().len(), 2);
}

#[test]
fn test_resolve_unknown_key() {
    let up = uploader();
    assert!(matches!(
        smol::block_on(up.resolve("resources/missing")),
        Err(UploadError::NotFound(_))
    ));
}
