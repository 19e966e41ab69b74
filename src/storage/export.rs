// Storage - Zip export of documents, transcripts and raw text
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{is_plain_file_name, Uploads};
use crate::annotation::ExportPayload;
use crate::database::Document;

/// Write a zip archive for `documents` into `exports_dir` and return its path.
///
/// Per document: `images/<image>` (when the file exists),
/// `data/<id>.ner_annotations.json` and `data/<id>.raw_text.txt`.
/// A document that cannot be added is logged and skipped.
pub fn build_export_zip(documents: &[Document], uploads: &Uploads, exports_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(exports_dir)
        .context("Failed to create exports directory")?;

    let file_name = format!("export-{}.zip", chrono::Utc::now().timestamp_millis());
    let zip_path = exports_dir.join(file_name);
    let file = File::create(&zip_path)
        .with_context(|| format!("Failed to create archive {}", zip_path.display()))?;

    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for document in documents {
        if let Err(e) = add_document(&mut zip, options, document, uploads) {
            log::error!("Error adding document {} to export: {:#}", document.id, e);
        }
    }

    zip.finish().context("Failed to finalize archive")?;

    log::info!("Exported {} documents to {}", documents.len(), zip_path.display());
    Ok(zip_path)
}

fn add_document(
    zip: &mut ZipWriter<File>,
    options: FileOptions,
    document: &Document,
    uploads: &Uploads,
) -> Result<()> {
    if let Some(image_path) = uploads.resolve(&document.image_path).filter(|p| p.exists()) {
        let image_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| document.id.clone());
        let bytes = std::fs::read(&image_path)
            .with_context(|| format!("Failed to read image {}", image_path.display()))?;
        zip.start_file(format!("images/{}", image_name), options)?;
        zip.write_all(&bytes)?;
    }

    let payload = ExportPayload::from_transcript(&document.transcript_or_empty());
    let json = serde_json::to_string_pretty(&payload)
        .context("Failed to serialize export payload")?;

    zip.start_file(format!("data/{}.ner_annotations.json", document.id), options)?;
    zip.write_all(json.as_bytes())?;

    zip.start_file(format!("data/{}.raw_text.txt", document.id), options)?;
    zip.write_all(payload.raw_text.as_bytes())?;

    Ok(())
}

/// Map a download name to an archive inside `exports_dir`
pub fn resolve_export(exports_dir: &Path, file_name: &str) -> Option<PathBuf> {
    (is_plain_file_name(file_name) && file_name.ends_with(".zip"))
        .then(|| exports_dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{decode, EntityToken};
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> String {
        let mut entry = archive.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_export_bundle_contents() {
        let dir = tempdir().unwrap();
        let uploads = Uploads::open_in(dir.path()).unwrap();
        let image_path = uploads.save("scan.png", b"image").unwrap();

        let mut transcribed = Document::new("p1".to_string(), "scan".to_string(), image_path.clone());
        transcribed.transcript = Some(decode("[Bob]{person} wrote\nhome"));
        let untranscribed = Document::new("p1".to_string(), "blank".to_string(), "uploads/missing.png".to_string());

        let exports_dir = dir.path().join("exports");
        let zip_path = build_export_zip(&[transcribed.clone(), untranscribed.clone()], &uploads, &exports_dir).unwrap();
        assert!(zip_path.starts_with(&exports_dir));

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let image_name = image_path.trim_start_matches("uploads/");
        assert!(archive.by_name(&format!("images/{}", image_name)).is_ok());

        let raw = read_entry(&mut archive, &format!("data/{}.raw_text.txt", transcribed.id));
        assert_eq!(raw, "Bob wrote\nhome");

        let json = read_entry(&mut archive, &format!("data/{}.ner_annotations.json", transcribed.id));
        let payload: ExportPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload.annotations[0], EntityToken::tagged("Bob", "person"));
        assert_eq!(payload.raw_text, raw);

        let empty = read_entry(&mut archive, &format!("data/{}.ner_annotations.json", untranscribed.id));
        let payload: ExportPayload = serde_json::from_str(&empty).unwrap();
        assert!(payload.annotations.is_empty());
        assert_eq!(archive.len(), 5);
    }

    #[test]
    fn test_resolve_export() {
        let dir = tempdir().unwrap();
        assert!(resolve_export(dir.path(), "export-1.zip").is_some());
        assert!(resolve_export(dir.path(), "../export-1.zip").is_none());
        assert!(resolve_export(dir.path(), "docscribe.db").is_none());
    }
}
