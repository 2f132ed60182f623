// 该文件是 Daolu （道路） 项目的一部分。
// src/input/frame_directory.rs - 帧序列目录输入
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

use image::ImageReader;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::Frame};

const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

#[derive(Error, Debug)]
pub enum FrameDirectoryInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("目录中没有图像帧: {0}")]
  EmptyDirectory(PathBuf),
}

/// 按文件名顺序读取目录中的图像帧，模拟视频流
pub struct FrameDirectoryInput {
  frames: std::vec::IntoIter<PathBuf>,
  index: usize,
}

fn is_frame_file(path: &Path) -> bool {
  path.is_file()
    && path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
      .unwrap_or(false)
}

impl FrameDirectoryInput {
  pub fn open(directory: impl AsRef<Path>) -> Result<Self, FrameDirectoryInputError> {
    let directory = directory.as_ref();
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(directory)? {
      let path = entry?.path();
      if is_frame_file(&path) {
        frames.push(path);
      }
    }
    if frames.is_empty() {
      return Err(FrameDirectoryInputError::EmptyDirectory(
        directory.to_path_buf(),
      ));
    }
    frames.sort();
    info!("目录 {} 中共 {} 帧", directory.display(), frames.len());

    Ok(Self {
      frames: frames.into_iter(),
      index: 0,
    })
  }
}

impl FromUrlWithScheme for FrameDirectoryInput {
  const SCHEME: &'static str = "frames";
}

impl FromUrl for FrameDirectoryInput {
  type Error = FrameDirectoryInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(FrameDirectoryInputError::SchemeMismatch);
    }
    Self::open(url.path())
  }
}

impl Iterator for FrameDirectoryInput {
  type Item = Frame;

  /// 解码失败时返回空帧，由任务循环当作流结束处理
  fn next(&mut self) -> Option<Self::Item> {
    let path = self.frames.next()?;
    let index = self.index;
    self.index += 1;

    let decoded = ImageReader::open(&path)
      .map_err(image::ImageError::IoError)
      .and_then(|reader| reader.decode());
    match decoded {
      Ok(image) => Some(Frame::new(index, image.to_rgb8())),
      Err(e) => {
        error!("无法解码帧 {}: {}", path.display(), e);
        Some(Frame::empty(index))
      }
    }
  }
}
