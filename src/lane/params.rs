// 该文件是 Daolu （道路） 项目的一部分。
// src/lane/params.rs - 车道检测参数
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

use thiserror::Error;

use crate::lane::{
  contour::ChainApproximation, filter::FilterChain, morphology::StructuringElement,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
  #[error("中值滤波核大小必须为正奇数，实际为 {0}")]
  BlurKernel(u32),
  #[error("结构元素为空")]
  EmptyElement,
  #[error("结构元素 {width}x{height} 过大")]
  ElementTooLarge { width: u32, height: u32 },
  #[error("目标尺寸 {width}x{height} 只有一个维度为 0，无法确定是否缩放")]
  PartialTargetSize { width: u32, height: u32 },
  #[error("种子点 ({x}, {y}) 超出 [0, 1) 范围")]
  SeedOutOfRange { x: f32, y: f32 },
  #[error("霍夫参数 rho={rho}, theta={theta} 必须为正数")]
  HoughResolution { rho: f32, theta: f32 },
  #[error("线宽必须为正数")]
  LineThickness,
  #[error("控制量 {name} 的取值 {value} 无效")]
  ControlValue { name: &'static str, value: i32 },
}

/// 缩放目标尺寸，`0x0` 表示不缩放
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetSize {
  pub width: u32,
  pub height: u32,
}

impl TargetSize {
  pub const DISABLED: TargetSize = TargetSize {
    width: 0,
    height: 0,
  };

  pub fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  pub fn is_enabled(&self) -> bool {
    self.width > 0 && self.height > 0
  }

  pub fn validate(&self) -> Result<(), ParamsError> {
    if (self.width == 0) != (self.height == 0) {
      return Err(ParamsError::PartialTargetSize {
        width: self.width,
        height: self.height,
      });
    }
    Ok(())
  }
}

/// Canny 双阈值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannyThresholds {
  pub low: u32,
  pub high: u32,
}

impl Default for CannyThresholds {
  fn default() -> Self {
    Self { low: 20, high: 70 }
  }
}

impl CannyThresholds {
  /// 按 (小, 大) 顺序返回，两个阈值互相独立调节时可能颠倒
  pub fn ordered(&self) -> (f32, f32) {
    let (low, high) = if self.low <= self.high {
      (self.low, self.high)
    } else {
      (self.high, self.low)
    };
    (low as f32, high as f32)
  }
}

/// 概率霍夫变换参数，各项互相独立
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughParams {
  /// 距离分辨率（像素）
  pub rho: f32,
  /// 角度分辨率（弧度）
  pub theta: f32,
  /// 累加器票数阈值
  pub threshold: u32,
  /// 最短线段长度
  pub min_line_length: u32,
  /// 同一直线上允许合并的最大间隙
  pub max_line_gap: u32,
}

impl Default for HoughParams {
  fn default() -> Self {
    Self {
      rho: 1.0,
      theta: std::f32::consts::PI / 180.0,
      threshold: 5,
      min_line_length: 10,
      max_line_gap: 15,
    }
  }
}

impl HoughParams {
  pub fn validate(&self) -> Result<(), ParamsError> {
    if !(self.rho > 0.0 && self.theta > 0.0) {
      return Err(ParamsError::HoughResolution {
        rho: self.rho,
        theta: self.theta,
      });
    }
    Ok(())
  }
}

/// 以帧宽高比例表示的漫水填充种子点，每帧按实际尺寸换算
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedPoint {
  x: f32,
  y: f32,
}

impl Default for SeedPoint {
  // 水平居中，高度 75% 处，假定车道位于画面中下部
  fn default() -> Self {
    Self { x: 0.5, y: 0.75 }
  }
}

impl SeedPoint {
  pub fn new(x: f32, y: f32) -> Result<Self, ParamsError> {
    if !((0.0..1.0).contains(&x) && (0.0..1.0).contains(&y)) {
      return Err(ParamsError::SeedOutOfRange { x, y });
    }
    Ok(Self { x, y })
  }

  /// 换算为 `width x height` 帧上的像素坐标
  pub fn locate(&self, width: u32, height: u32) -> (u32, u32) {
    let x = (width as f32 * self.x) as u32;
    let y = (height as f32 * self.y) as u32;
    (
      x.min(width.saturating_sub(1)),
      y.min(height.saturating_sub(1)),
    )
  }
}

/// 车道检测参数
///
/// 只在两帧之间修改；`LaneDetector::detect` 以只读借用读取，
/// 处理过程中参数不会变化。
#[derive(Debug, Clone, PartialEq)]
pub struct LaneParams {
  /// 中值滤波核大小（正奇数）
  pub blur_kernel: u32,
  /// 预处理闭运算结构元素
  pub close_element: StructuringElement,
  pub target_size: TargetSize,
  pub filters: FilterChain,
  pub canny: CannyThresholds,
  pub hough: HoughParams,
  /// 霍夫线段描边线宽
  pub line_thickness: u32,
  pub seeds: Vec<SeedPoint>,
  pub chain_approximation: ChainApproximation,
}

impl Default for LaneParams {
  fn default() -> Self {
    Self {
      blur_kernel: 3,
      close_element: StructuringElement::ellipse(4, 4),
      target_size: TargetSize::DISABLED,
      filters: FilterChain::default(),
      canny: CannyThresholds::default(),
      hough: HoughParams::default(),
      line_thickness: 2,
      seeds: vec![SeedPoint::default()],
      chain_approximation: ChainApproximation::Simple,
    }
  }
}

impl LaneParams {
  pub fn validate(&self) -> Result<(), ParamsError> {
    if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
      return Err(ParamsError::BlurKernel(self.blur_kernel));
    }
    if self.close_element.is_empty() {
      return Err(ParamsError::EmptyElement);
    }
    if !self.close_element.fits_mask() {
      return Err(ParamsError::ElementTooLarge {
        width: self.close_element.width(),
        height: self.close_element.height(),
      });
    }
    if self.line_thickness == 0 {
      return Err(ParamsError::LineThickness);
    }
    self.target_size.validate()?;
    self.hough.validate()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    assert_eq!(LaneParams::default().validate(), Ok(()));
  }

  #[test]
  fn rejects_even_blur_kernel() {
    let params = LaneParams {
      blur_kernel: 4,
      ..Default::default()
    };
    assert_eq!(params.validate(), Err(ParamsError::BlurKernel(4)));
  }

  #[test]
  fn rejects_half_disabled_target_size() {
    let params = LaneParams {
      target_size: TargetSize::new(320, 0),
      ..Default::default()
    };
    assert_eq!(
      params.validate(),
      Err(ParamsError::PartialTargetSize {
        width: 320,
        height: 0
      })
    );
    assert!(!TargetSize::new(0, 240).is_enabled());
    assert!(TargetSize::new(320, 240).is_enabled());
  }

  #[test]
  fn rejects_element_too_large_for_mask() {
    let params = LaneParams {
      close_element: StructuringElement::rect(300, 3),
      ..Default::default()
    };
    assert_eq!(
      params.validate(),
      Err(ParamsError::ElementTooLarge {
        width: 300,
        height: 3
      })
    );
  }

  #[test]
  fn default_seed_is_centre_three_quarters_down() {
    assert_eq!(SeedPoint::default().locate(640, 480), (320, 360));
    assert_eq!(SeedPoint::default().locate(1, 1), (0, 0));
  }

  #[test]
  fn seed_outside_frame_is_rejected() {
    assert!(SeedPoint::new(1.0, 0.5).is_err());
    assert!(SeedPoint::new(0.5, -0.1).is_err());
    assert!(SeedPoint::new(0.0, 0.99).is_ok());
  }

  #[test]
  fn canny_thresholds_are_ordered() {
    let swapped = CannyThresholds { low: 90, high: 10 };
    assert_eq!(swapped.ordered(), (10.0, 90.0));
  }
}
