// 该文件是 Daolu （道路） 项目的一部分。
// src/lane/controls.rs - 可调参数控制表
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

use std::ops::RangeInclusive;

use crate::lane::params::{LaneParams, ParamsError};

/// 对外暴露的整数控制量，每项可独立调节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
  CannyLow,
  CannyHigh,
  HoughThreshold,
  MinLineLength,
  MaxLineGap,
  BlurKernel,
}

impl Control {
  pub const ALL: [Control; 6] = [
    Control::CannyLow,
    Control::CannyHigh,
    Control::HoughThreshold,
    Control::MinLineLength,
    Control::MaxLineGap,
    Control::BlurKernel,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Control::CannyLow => "Th1 Canny",
      Control::CannyHigh => "Th2 Canny",
      Control::HoughThreshold => "Threshold Hough",
      Control::MinLineLength => "Min Length Line",
      Control::MaxLineGap => "Max Line Gap",
      Control::BlurKernel => "Blur Kernel",
    }
  }

  pub fn from_label(label: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|c| c.label() == label)
  }

  pub fn range(self) -> RangeInclusive<i32> {
    match self {
      Control::CannyLow | Control::CannyHigh => 0..=250,
      _ => 0..=100,
    }
  }

  /// 读取当前取值
  pub fn current(self, params: &LaneParams) -> i32 {
    let value = match self {
      Control::CannyLow => params.canny.low,
      Control::CannyHigh => params.canny.high,
      Control::HoughThreshold => params.hough.threshold,
      Control::MinLineLength => params.hough.min_line_length,
      Control::MaxLineGap => params.hough.max_line_gap,
      Control::BlurKernel => params.blur_kernel,
    };
    value as i32
  }

  /// 将取值截断到范围内后写入参数，返回实际写入的值
  ///
  /// 中值滤波核必须为正奇数；范围内的偶数或 0 直接拒绝且不修改参数。
  pub fn apply(self, params: &mut LaneParams, value: i32) -> Result<i32, ParamsError> {
    let range = self.range();
    let mut clamped = value.clamp(*range.start(), *range.end());
    // 超出上限的奇数核截断到范围内最大的奇数
    if self == Control::BlurKernel && value > *range.end() && clamped % 2 == 0 {
      clamped -= 1;
    }
    let v = clamped as u32;

    match self {
      Control::CannyLow => params.canny.low = v,
      Control::CannyHigh => params.canny.high = v,
      Control::HoughThreshold => params.hough.threshold = v,
      Control::MinLineLength => params.hough.min_line_length = v,
      Control::MaxLineGap => params.hough.max_line_gap = v,
      Control::BlurKernel => {
        if v == 0 || v % 2 == 0 {
          return Err(ParamsError::ControlValue {
            name: self.label(),
            value,
          });
        }
        params.blur_kernel = v;
      }
    }
    Ok(clamped)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn labels_round_trip() {
    for control in Control::ALL {
      assert_eq!(Control::from_label(control.label()), Some(control));
    }
    assert_eq!(Control::from_label("unknown"), None);
  }

  #[test]
  fn ranges_follow_control_surface() {
    assert_eq!(Control::CannyLow.range(), 0..=250);
    assert_eq!(Control::CannyHigh.range(), 0..=250);
    assert_eq!(Control::MaxLineGap.range(), 0..=100);
  }

  #[test]
  fn apply_clamps_to_range() {
    let mut params = LaneParams::default();
    assert_eq!(Control::CannyHigh.apply(&mut params, 400), Ok(250));
    assert_eq!(params.canny.high, 250);
    assert_eq!(Control::MinLineLength.apply(&mut params, -3), Ok(0));
    assert_eq!(params.hough.min_line_length, 0);
  }

  #[test]
  fn controls_are_independent() {
    let mut params = LaneParams::default();
    let before = params.clone();
    Control::HoughThreshold
      .apply(&mut params, 42)
      .expect("in range");
    assert_eq!(params.hough.threshold, 42);
    assert_eq!(params.hough.min_line_length, before.hough.min_line_length);
    assert_eq!(params.hough.max_line_gap, before.hough.max_line_gap);
    assert_eq!(params.canny, before.canny);
  }

  #[test]
  fn even_blur_kernel_is_rejected() {
    let mut params = LaneParams::default();
    assert!(Control::BlurKernel.apply(&mut params, 4).is_err());
    assert_eq!(params.blur_kernel, 3);
    assert_eq!(Control::BlurKernel.apply(&mut params, 5), Ok(5));
    assert_eq!(Control::BlurKernel.current(&params), 5);
  }

  #[test]
  fn oversized_blur_kernel_clamps_to_largest_odd() {
    let mut params = LaneParams::default();
    assert_eq!(Control::BlurKernel.apply(&mut params, 101), Ok(99));
    assert_eq!(params.blur_kernel, 99);
    assert_eq!(Control::BlurKernel.apply(&mut params, 1000), Ok(99));
    assert!(Control::BlurKernel.apply(&mut params, -5).is_err());
    assert_eq!(params.blur_kernel, 99);
  }
}
