// 该文件是 Daolu （道路） 项目的一部分。
// src/bin/lane_continueshot.rs - 连续帧车道检测
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use daolu::{
  FromUrl,
  input::InputWrapper,
  lane::{LaneDetector, controls::Control},
  output::OutputWrapper,
  task::{ContinuousTask, Task},
};
use tracing::info;

/// Daolu 连续帧车道检测参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测器配置
  #[arg(long, value_name = "DETECTOR", default_value = "lane://?sharpen&downscale=2")]
  pub detector: Url,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,

  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,

  /// 每帧缩小倍数，0 或 1 表示不缩放；给出时覆盖检测器配置中的 downscale
  #[arg(long, value_name = "N")]
  pub downscale: Option<u32>,

  #[arg(long, value_name = "TH1")]
  pub canny_low: Option<i32>,
  #[arg(long, value_name = "TH2")]
  pub canny_high: Option<i32>,
  #[arg(long, value_name = "VOTES")]
  pub hough_threshold: Option<i32>,
  #[arg(long, value_name = "PIXELS")]
  pub min_line_length: Option<i32>,
  #[arg(long, value_name = "PIXELS")]
  pub max_line_gap: Option<i32>,
  #[arg(long, value_name = "KERNEL")]
  pub blur: Option<i32>,
}

impl Args {
  fn overrides(&self) -> [(Control, Option<i32>); 6] {
    [
      (Control::CannyLow, self.canny_low),
      (Control::CannyHigh, self.canny_high),
      (Control::HoughThreshold, self.hough_threshold),
      (Control::MinLineLength, self.min_line_length),
      (Control::MaxLineGap, self.max_line_gap),
      (Control::BlurKernel, self.blur),
    ]
  }

  fn build_detector(&self) -> Result<LaneDetector> {
    let mut detector = LaneDetector::from_url(&self.detector)?;
    if let Some(factor) = self.downscale {
      detector = detector.with_frame_downscale(factor);
    }
    for (control, value) in self.overrides() {
      if let Some(value) = value {
        let applied = detector.adjust(control, value)?;
        info!("{} = {}", control.label(), applied);
      }
    }
    Ok(detector)
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("检测器配置: {}", args.detector);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let detector = args.build_detector()?;

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .interruptible()
    .run_task(input, detector, output)?;

  Ok(())
}
