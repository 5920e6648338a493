use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use image_compressor_lib::core::{
    ColorMode, OutputFormat, ProcessingSettings, WatermarkPosition, WatermarkSettings, WebpMode,
};

#[derive(Parser)]
#[command(name = "image-compressor")]
#[command(about = "Compress and convert images locally")]
#[command(version)]
pub struct Cli {
    /// JSON config file
    #[arg(short, long, global = true, env = "IMAGE_COMPRESSOR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compress image files and directories
    Compress(CompressArgs),

    /// Manage saved presets
    Presets {
        #[command(subcommand)]
        action: PresetAction,
    },

    /// Show or clear the compression history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Write settings, presets and history to a JSON file
    Export { file: PathBuf },

    /// Load settings, presets and history from a JSON file
    Import { file: PathBuf },
}

#[derive(Subcommand)]
pub enum PresetAction {
    List,
    Delete { name: String },
    Rename { old: String, new: String },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    Show,
    Clear,
}

/// Flags left out keep the value of the base settings (the last run's, or
/// the chosen preset's); every flag can also set a value back.
#[derive(Args)]
pub struct CompressArgs {
    /// Image files or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "compressed")]
    pub out_dir: PathBuf,

    /// Write every result into this ZIP archive instead of the output directory
    #[arg(long, value_name = "FILE")]
    pub zip: Option<PathBuf>,

    /// Output format: original, jpeg, png or webp
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Quality (1-100)
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Target width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Keep the source dimensions, clearing any saved width and height
    #[arg(long, conflicts_with_all = ["width", "height"])]
    pub no_resize: bool,

    /// Color mode: rgb or grayscale
    #[arg(long)]
    pub color_mode: Option<ColorMode>,

    /// PNG compression level (0-9)
    #[arg(long)]
    pub png_compression: Option<u8>,

    /// WebP mode: lossy or lossless
    #[arg(long)]
    pub webp_mode: Option<WebpMode>,

    /// Keep image metadata where the encoder supports it (true or false)
    #[arg(long, value_name = "BOOL")]
    pub keep_metadata: Option<bool>,

    /// Draw this text as a watermark
    #[arg(long, value_name = "TEXT")]
    pub watermark: Option<String>,

    /// Watermark font size in pixels
    #[arg(long, value_name = "PX")]
    pub watermark_size: Option<u32>,

    /// Watermark color as #RRGGBB
    #[arg(long, value_name = "HEX")]
    pub watermark_color: Option<String>,

    /// Watermark opacity (0.0-1.0)
    #[arg(long)]
    pub watermark_opacity: Option<f32>,

    /// Watermark corner: top-left, top-right, bottom-left or bottom-right
    #[arg(long)]
    pub watermark_position: Option<WatermarkPosition>,

    /// Turn off a saved watermark
    #[arg(long, conflicts_with = "watermark")]
    pub no_watermark: bool,

    /// Start from a saved preset instead of the last used settings
    #[arg(long)]
    pub preset: Option<String>,

    /// Save the resulting settings as a preset
    #[arg(long)]
    pub save_preset: Option<String>,
}

impl CompressArgs {
    /// Applies the flags that were given on top of `base`.
    pub fn apply(&self, mut base: ProcessingSettings) -> ProcessingSettings {
        if let Some(format) = self.format {
            base.output_format = format;
        }
        if let Some(quality) = self.quality {
            base.quality = quality;
        }
        if self.no_resize {
            base.width = None;
            base.height = None;
        } else if self.width.is_some() || self.height.is_some() {
            base.width = self.width;
            base.height = self.height;
        }
        if let Some(mode) = self.color_mode {
            base.color_mode = mode;
        }
        if let Some(level) = self.png_compression {
            base.png_compression = level;
        }
        if let Some(mode) = self.webp_mode {
            base.webp_mode = mode;
        }
        if let Some(keep) = self.keep_metadata {
            base.keep_metadata = keep;
        }
        self.apply_watermark(&mut base);
        base
    }

    fn apply_watermark(&self, base: &mut ProcessingSettings) {
        if self.no_watermark {
            if let Some(mark) = base.watermark.as_mut() {
                mark.enabled = false;
            }
            return;
        }

        let touched = self.watermark.is_some()
            || self.watermark_size.is_some()
            || self.watermark_color.is_some()
            || self.watermark_opacity.is_some()
            || self.watermark_position.is_some();
        if !touched {
            return;
        }

        let mut mark = base.watermark.take().unwrap_or_else(WatermarkSettings::default);
        if let Some(text) = &self.watermark {
            mark.text = text.clone();
            mark.enabled = true;
        }
        if let Some(size) = self.watermark_size {
            mark.font_size = size;
        }
        if let Some(color) = &self.watermark_color {
            mark.color = color.clone();
        }
        if let Some(opacity) = self.watermark_opacity {
            mark.opacity = opacity;
        }
        if let Some(position) = self.watermark_position {
            mark.position = position;
        }
        base.watermark = Some(mark);
    }
}
