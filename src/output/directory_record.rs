// 该文件是 Daolu （道路） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::PathBuf;

use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  lane::{LaneDetection, ORIGINAL_BUFFER},
  output::Render,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 按日期分目录记录每帧结果
///
/// 默认只记录找到车道的帧并只保存标注帧；
/// `?always` 记录所有帧，`?buffers` 额外保存诊断图与掩码。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  always: bool,
  all_buffers: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");
    let all_buffers = uri.query_pairs().any(|(k, _)| k == "buffers");

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
      always,
      all_buffers,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_path(&self, now: DateTime<Utc>, index: usize, name: &str) -> PathBuf {
    self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()))
      .join(format!(
        "{}-{:06}-{}.png",
        now.format("%H-%M-%S"),
        index,
        name
      ))
  }
}

impl Render<Frame, LaneDetection> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &Frame, result: &LaneDetection) -> Result<(), Self::Error> {
    if !self.always && !result.found() {
      return Ok(());
    }

    let now = Utc::now();
    for (name, image) in result.buffers() {
      if !self.all_buffers && name != ORIGINAL_BUFFER {
        continue;
      }
      let path = self.frame_path(now, frame.index(), name);
      if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
      }
      image.save(&path)?;
      debug!("记录帧 {} 到 {}", frame.index(), path.display());
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn frame_path_is_grouped_by_date() {
    let url = url::Url::parse("folder:///var/lane?always").expect("url");
    let output = DirectoryRecordOutput::from_url(&url).expect("output");
    assert!(output.always);
    assert!(!output.all_buffers);

    let now = Utc
      .with_ymd_and_hms(2026, 3, 7, 9, 5, 1)
      .single()
      .expect("valid time");
    assert_eq!(
      output.frame_path(now, 42, "road"),
      PathBuf::from("/var/lane/2026/03/07/09-05-01-000042-road.png")
    );
  }
}
