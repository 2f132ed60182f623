// 该文件是 Daolu （道路） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::Frame, lane::LaneDetection, output::Render};

/// 把三个输出缓冲区分别保存为 `<stem>-<name>.<ext>`
pub struct SaveImageFileOutput {
  path: PathBuf,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveImageFileOutput::new(uri.path()))
  }
}

impl SaveImageFileOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// 缓冲区 `name` 对应的文件路径，没有扩展名时使用 png
  pub fn buffer_path(&self, name: &str) -> PathBuf {
    let stem = self
      .path
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_else(|| "out".to_string());
    let ext = self
      .path
      .extension()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_else(|| "png".to_string());
    self.path.with_file_name(format!("{}-{}.{}", stem, name, ext))
  }
}

impl Render<Frame, LaneDetection> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, _frame: &Frame, result: &LaneDetection) -> Result<(), Self::Error> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    for (name, image) in result.buffers() {
      let path = self.buffer_path(name);
      image.save(&path).map_err(SaveImageFileError::ImageError)?;
      warn!("保存图像到文件: {}", path.display());
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn buffer_paths_share_stem() {
    let output = SaveImageFileOutput::new("/tmp/run/out.png");
    assert_eq!(
      output.buffer_path("road"),
      PathBuf::from("/tmp/run/out-road.png")
    );
    let bare = SaveImageFileOutput::new("/tmp/run/result");
    assert_eq!(
      bare.buffer_path("core"),
      PathBuf::from("/tmp/run/result-core.png")
    );
  }
}
