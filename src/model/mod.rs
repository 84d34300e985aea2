//! Style selection, device selection, and the pretrained-model registry.

mod loader;

pub use loader::load_generator;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};
use crate::net::Generator;

/// The trained styles shipped as pretrained generator checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Hosoda,
    Hayao,
    Shinkai,
    Paprika,
}

impl Style {
    /// Every trained style, in checkpoint-release order.
    pub const ALL: [Self; 4] = [Self::Hosoda, Self::Hayao, Self::Shinkai, Self::Paprika];

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Hosoda => "Hosoda",
            Self::Hayao => "Hayao",
            Self::Shinkai => "Shinkai",
            Self::Paprika => "Paprika",
        }
    }

    /// Get the weight archive filename for this style.
    #[must_use]
    pub fn weight_filename(&self) -> String {
        format!("{}_net_G_float.safetensors", self.name())
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Style {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownStyle {
                name: s.to_string(),
            })
    }
}

/// Compute device for the forward pass. A binary choice with no fallback
/// negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Gpu,
}

impl Device {
    /// Check that the device can actually run a forward pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] for [`Device::Gpu`]: no
    /// accelerator backend is compiled into this crate.
    pub fn ensure_available(&self) -> Result<()> {
        match self {
            Self::Cpu => Ok(()),
            Self::Gpu => Err(Error::ConfigurationError {
                reason: "GPU requested but no accelerator backend is available".to_string(),
            }),
        }
    }
}

/// Immutable mapping from style to its loaded generator.
///
/// Built once at startup and read-only afterward; generators live for the
/// registry's lifetime and there is no reload or invalidation.
#[derive(Debug)]
pub struct StyleRegistry {
    models: HashMap<Style, Generator>,
}

impl StyleRegistry {
    /// Load every trained style from `dir`, expecting one weight archive per
    /// style named `<Style>_net_G_float.safetensors`.
    ///
    /// # Errors
    ///
    /// Returns an error if any archive is missing, unreadable, or does not
    /// match the generator architecture.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::load_styles(dir, &Style::ALL)
    }

    /// Load a subset of styles from `dir`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`StyleRegistry::load`].
    pub fn load_styles<P: AsRef<Path>>(dir: P, styles: &[Style]) -> Result<Self> {
        let dir = dir.as_ref();

        let pb = ProgressBar::new(styles.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Loading styles [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("valid template")
                .progress_chars("#>-"),
        );

        let mut models = HashMap::new();
        for style in styles {
            pb.set_message(style.name());
            let path = self::weight_path(dir, *style);
            tracing::info!("loading {style} generator weights from {}", path.display());
            models.insert(*style, load_generator(&path)?);
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(Self { models })
    }

    /// Look up the generator for a style.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStyle`] if the style was not loaded into this
    /// registry.
    pub fn get(&self, style: Style) -> Result<&Generator> {
        self.models.get(&style).ok_or_else(|| Error::UnknownStyle {
            name: style.name().to_string(),
        })
    }

    /// Styles held by this registry.
    pub fn styles(&self) -> impl Iterator<Item = Style> + '_ {
        self.models.keys().copied()
    }

    #[cfg(test)]
    pub(crate) fn from_models(models: HashMap<Style, Generator>) -> Self {
        Self { models }
    }
}

fn weight_path(dir: &Path, style: Style) -> PathBuf {
    dir.join(style.weight_filename())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_parse_round_trip() {
        for style in Style::ALL {
            assert_eq!(style.name().parse::<Style>().unwrap(), style);
        }
        assert_eq!("shinkai".parse::<Style>().unwrap(), Style::Shinkai);
    }

    #[test]
    fn test_unknown_style_rejected() {
        let err = "Miyazaki".parse::<Style>().unwrap_err();
        match err {
            Error::UnknownStyle { name } => assert_eq!(name, "Miyazaki"),
            other => panic!("expected UnknownStyle, got {other:?}"),
        }
    }

    #[test]
    fn test_weight_filename() {
        assert_eq!(
            Style::Shinkai.weight_filename(),
            "Shinkai_net_G_float.safetensors"
        );
    }

    #[test]
    fn test_gpu_unavailable() {
        assert!(Device::Cpu.ensure_available().is_ok());
        let err = Device::Gpu.ensure_available().unwrap_err();
        assert!(matches!(err, Error::ConfigurationError { .. }));
    }
}
