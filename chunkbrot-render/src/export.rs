//! PNG export of the display surface with embedded metadata (tEXt chunks).

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::error::RenderError;
use crate::renderer::RenderSnapshot;
use crate::surface::DisplaySurface;

/// Metadata to embed in an exported PNG as tEXt chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportMetadata {
    pub mode: String,
    pub top_left: String,
    pub bottom_right: String,
    pub seed: String,
    pub max_iterations: u32,
    pub theme: String,
}

impl From<&RenderSnapshot> for ExportMetadata {
    fn from(snap: &RenderSnapshot) -> Self {
        Self {
            mode: snap.mode.label().to_string(),
            top_left: snap.viewport.top_left.to_string(),
            bottom_right: snap.viewport.bottom_right.to_string(),
            seed: snap.seed.to_string(),
            max_iterations: snap.params.max_iterations,
            theme: snap.gradient.name().to_string(),
        }
    }
}

impl ExportMetadata {
    fn pairs(&self) -> Vec<(String, String)> {
        vec![
            ("ChunkBrot.Mode".into(), self.mode.clone()),
            ("ChunkBrot.TopLeft".into(), self.top_left.clone()),
            ("ChunkBrot.BottomRight".into(), self.bottom_right.clone()),
            ("ChunkBrot.Seed".into(), self.seed.clone()),
            ("ChunkBrot.MaxIterations".into(), self.max_iterations.to_string()),
            ("ChunkBrot.Theme".into(), self.theme.clone()),
        ]
    }
}

/// Write the surface as an RGBA PNG at `path`.
///
/// Unpainted pixels stay transparent in the file.
pub fn export_png(
    surface: &DisplaySurface,
    path: &Path,
    metadata: &ExportMetadata,
) -> crate::Result<()> {
    let file = File::create(path).map_err(|source| RenderError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), surface.width, surface.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.add_text_chunk("Software".to_string(), "ChunkBrot".to_string())?;
    encoder.add_text_chunk(
        "Description".to_string(),
        format!(
            "{} - {} to {}, seed {}, {} iterations",
            metadata.mode,
            metadata.top_left,
            metadata.bottom_right,
            metadata.seed,
            metadata.max_iterations
        ),
    )?;
    for (key, value) in metadata.pairs() {
        encoder.add_text_chunk(key, value)?;
    }

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&surface.pixels)?;
    writer.finish()?;

    debug!(
        width = surface.width,
        height = surface.height,
        path = %path.display(),
        "Exported PNG"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ExportMetadata {
        ExportMetadata {
            mode: "Julia".into(),
            top_left: "-2 + 2i".into(),
            bottom_right: "2 - 2i".into(),
            seed: "-0.5 + 0.25i".into(),
            max_iterations: 200,
            theme: "Classic".into(),
        }
    }

    #[test]
    fn export_embeds_text_chunks() {
        let mut surface = DisplaySurface::new(3, 2);
        surface.blit(0, 0, 2, &[255, 0, 0, 255].repeat(4));

        let dir = std::env::temp_dir().join("chunkbrot_test_export");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("export.png");
        export_png(&surface, &path, &metadata()).expect("export should succeed");

        let decoder = png::Decoder::new(File::open(&path).expect("file should exist"));
        let reader = decoder.read_info().expect("should read info");
        let info = reader.info();
        assert_eq!((info.width, info.height), (3, 2));
        let texts = &info.uncompressed_latin1_text;
        assert!(texts
            .iter()
            .any(|t| t.keyword == "Software" && t.text == "ChunkBrot"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "ChunkBrot.Mode" && t.text == "Julia"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "ChunkBrot.Seed" && t.text == "-0.5 + 0.25i"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn export_to_missing_directory_fails() {
        let surface = DisplaySurface::new(1, 1);
        let path = std::env::temp_dir()
            .join("chunkbrot_no_such_dir")
            .join("nested")
            .join("out.png");
        assert!(matches!(
            export_png(&surface, &path, &metadata()),
            Err(RenderError::Io { .. })
        ));
    }
}
