// 该文件是 Daolu （道路） 项目的一部分。
// src/frame.rs - 帧定义
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

use image::RgbImage;

/// 输入流中的一帧，宽或高为 0 的帧表示流结束
#[derive(Debug, Clone, Default)]
pub struct Frame {
  index: usize,
  image: RgbImage,
}

impl Frame {
  pub fn new(index: usize, image: RgbImage) -> Self {
    Self { index, image }
  }

  /// 流结束标记
  pub fn empty(index: usize) -> Self {
    Self {
      index,
      image: RgbImage::new(0, 0),
    }
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn is_empty(&self) -> bool {
    self.width() == 0 || self.height() == 0
  }
}

/// 可以表示流结束的帧类型
pub trait EndOfStream {
  fn is_end_of_stream(&self) -> bool;
}

impl EndOfStream for Frame {
  fn is_end_of_stream(&self) -> bool {
    self.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_sized_frame_ends_stream() {
    assert!(Frame::empty(3).is_end_of_stream());
    assert!(Frame::new(0, RgbImage::new(4, 0)).is_end_of_stream());
    assert!(!Frame::new(0, RgbImage::new(4, 2)).is_end_of_stream());
  }
}
