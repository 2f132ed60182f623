// 该文件是 Daolu （道路） 项目的一部分。
// src/lane.rs - 车道区域检测流水线
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

pub mod contour;
pub mod controls;
pub mod filter;
pub mod hough;
pub mod morphology;
pub mod params;
pub mod region;
pub mod stroke;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::median_filter;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{Detector, FromUrl, FromUrlWithScheme, frame::Frame};

use self::contour::{LaneContour, draw_contour_mut, find_lane_contours, select_largest};
use self::controls::Control;
use self::filter::{ConvolutionKernel, FilterError};
use self::hough::reconstruct_barrier;
use self::morphology::{StructuringElement, close};
use self::region::grow_region;

pub use self::params::{CannyThresholds, HoughParams, LaneParams, ParamsError, SeedPoint, TargetSize};

/// 标注后的原始帧
pub const ORIGINAL_BUFFER: &str = "original";
/// 边缘与线段诊断图
pub const CORE_BUFFER: &str = "core";
/// 车道区域掩码
pub const ROAD_BUFFER: &str = "road";

#[derive(Error, Debug)]
pub enum LaneError {
  #[error("参数错误: {0}")]
  Params(#[from] ParamsError),
  #[error("滤波器错误: {0}")]
  Filter(#[from] FilterError),
  #[error("输入帧为空")]
  EmptyFrame,
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("URI 参数 {key} 无效: {value}")]
  InvalidQuery { key: String, value: String },
}

/// 单帧检测结果
#[derive(Debug, Clone)]
pub struct LaneDetection {
  /// 描回线段并膨胀后的边缘图（处理分辨率）
  pub core: GrayImage,
  /// 车道区域掩码，只含 0 与 255（处理分辨率）
  pub road: GrayImage,
  /// 画有车道边界的原始帧副本
  pub annotated: RgbImage,
  /// 掩码上的全部轮廓（处理分辨率）
  pub contours: Vec<LaneContour>,
  /// 被选为车道边界的轮廓序号
  pub lane_index: Option<usize>,
  /// 还原到原始分辨率的车道边界
  pub lane: Option<LaneContour>,
  /// 霍夫线段数
  pub segments: usize,
  /// 处理分辨率到原始分辨率的缩放比例
  pub scale: (f64, f64),
}

impl LaneDetection {
  pub fn found(&self) -> bool {
    self.lane.is_some()
  }

  /// 按名称列出三个输出缓冲区
  pub fn buffers(&self) -> [(&'static str, DynamicImage); 3] {
    [
      (ORIGINAL_BUFFER, DynamicImage::ImageRgb8(self.annotated.clone())),
      (CORE_BUFFER, DynamicImage::ImageLuma8(self.core.clone())),
      (ROAD_BUFFER, DynamicImage::ImageLuma8(self.road.clone())),
    ]
  }
}

/// 车道区域检测器
///
/// 参数只能在两帧之间通过 `&mut self` 的方法修改；`detect` 只读借用，
/// 同一帧处理过程中参数保持不变。
#[derive(Debug, Clone, Default)]
pub struct LaneDetector {
  params: LaneParams,
  frame_downscale: Option<u32>,
}

impl LaneDetector {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_params(params: LaneParams) -> Result<Self, ParamsError> {
    params.validate()?;
    Ok(Self {
      params,
      frame_downscale: None,
    })
  }

  /// 每帧处理前按帧尺寸的 `1 / factor` 重新设置目标尺寸，0 或 1 表示不缩放
  pub fn with_frame_downscale(mut self, factor: u32) -> Self {
    self.frame_downscale = (factor > 1).then_some(factor);
    self
  }

  pub fn frame_downscale(&self) -> Option<u32> {
    self.frame_downscale
  }

  pub fn params(&self) -> &LaneParams {
    &self.params
  }

  pub fn target_size(&self) -> TargetSize {
    self.params.target_size
  }

  pub fn set_blur_kernel(&mut self, kernel: u32) -> Result<(), ParamsError> {
    if kernel == 0 || kernel % 2 == 0 {
      return Err(ParamsError::BlurKernel(kernel));
    }
    self.params.blur_kernel = kernel;
    Ok(())
  }

  pub fn set_close_element(&mut self, element: StructuringElement) -> Result<(), ParamsError> {
    if element.is_empty() {
      return Err(ParamsError::EmptyElement);
    }
    if !element.fits_mask() {
      return Err(ParamsError::ElementTooLarge {
        width: element.width(),
        height: element.height(),
      });
    }
    self.params.close_element = element;
    Ok(())
  }

  pub fn add_filter(&mut self, filter: ConvolutionKernel) {
    self.params.filters.push(filter);
  }

  pub fn set_target_size(&mut self, size: TargetSize) -> Result<(), ParamsError> {
    size.validate()?;
    self.params.target_size = size;
    Ok(())
  }

  pub fn set_canny_thresholds(&mut self, thresholds: CannyThresholds) {
    self.params.canny = thresholds;
  }

  pub fn set_theta(&mut self, theta: f32) -> Result<(), ParamsError> {
    let hough = HoughParams {
      theta,
      ..self.params.hough
    };
    hough.validate()?;
    self.params.hough = hough;
    Ok(())
  }

  pub fn set_rho(&mut self, rho: f32) -> Result<(), ParamsError> {
    let hough = HoughParams {
      rho,
      ..self.params.hough
    };
    hough.validate()?;
    self.params.hough = hough;
    Ok(())
  }

  pub fn set_hough_threshold(&mut self, threshold: u32) {
    self.params.hough.threshold = threshold;
  }

  pub fn set_min_line_length(&mut self, length: u32) {
    self.params.hough.min_line_length = length;
  }

  pub fn set_max_line_gap(&mut self, gap: u32) {
    self.params.hough.max_line_gap = gap;
  }

  pub fn set_line_thickness(&mut self, thickness: u32) -> Result<(), ParamsError> {
    if thickness == 0 {
      return Err(ParamsError::LineThickness);
    }
    self.params.line_thickness = thickness;
    Ok(())
  }

  /// 追加一个种子点，默认种子点始终保留
  pub fn add_seed(&mut self, seed: SeedPoint) {
    self.params.seeds.push(seed);
  }

  pub fn set_chain_approximation(&mut self, approximation: contour::ChainApproximation) {
    self.params.chain_approximation = approximation;
  }

  /// 通过控制表调节参数，返回截断后的取值
  pub fn adjust(&mut self, control: Control, value: i32) -> Result<i32, ParamsError> {
    control.apply(&mut self.params, value)
  }

  /// 第 1-5 步：灰度、缩放、闭运算、中值滤波、卷积滤波链
  pub fn preprocess(&self, frame: &RgbImage) -> Result<GrayImage, LaneError> {
    let params = &self.params;
    if frame.width() == 0 || frame.height() == 0 {
      return Err(LaneError::EmptyFrame);
    }

    let mut working = imageops::grayscale(frame);

    if params.target_size.is_enabled() {
      working = imageops::resize(
        &working,
        params.target_size.width,
        params.target_size.height,
        FilterType::Triangle,
      );
    }

    working = close(&working, &params.close_element);
    let radius = params.blur_kernel / 2;
    working = median_filter(&working, radius, radius);
    Ok(params.filters.apply(working))
  }

  /// 第 1-6 步，输出 Canny 边缘图
  pub fn edge_map(&self, frame: &RgbImage) -> Result<GrayImage, LaneError> {
    let working = self.preprocess(frame)?;
    let (low, high) = self.params.canny.ordered();
    Ok(canny(&working, low, high))
  }

  /// 处理一帧，依次执行全部九个步骤
  pub fn detect(&self, frame: &RgbImage) -> Result<LaneDetection, LaneError> {
    let params = &self.params;
    params.validate()?;

    let edges = self.edge_map(frame)?;
    let (core, segments) = reconstruct_barrier(edges, &params.hough, params.line_thickness);

    let (work_width, work_height) = core.dimensions();
    let seeds: Vec<(u32, u32)> = params
      .seeds
      .iter()
      .map(|seed| seed.locate(work_width, work_height))
      .collect();
    let road = grow_region(core.clone(), &seeds);

    let contours = find_lane_contours(&road, params.chain_approximation);
    let scale = (
      frame.width() as f64 / work_width as f64,
      frame.height() as f64 / work_height as f64,
    );

    let mut annotated = frame.clone();
    let lane_index = select_largest(&contours);
    let lane = lane_index.map(|i| contours[i].rescaled(scale));
    if let Some(lane) = &lane {
      draw_contour_mut(&mut annotated, lane);
    }

    debug!(
      "线段 {} 条, 轮廓 {} 个, 车道轮廓点数 {}",
      segments.len(),
      contours.len(),
      lane.as_ref().map(LaneContour::len).unwrap_or(0)
    );

    Ok(LaneDetection {
      core,
      road,
      annotated,
      contours,
      lane_index,
      lane,
      segments: segments.len(),
      scale,
    })
  }
}

impl Detector for LaneDetector {
  type Input = Frame;
  type Output = LaneDetection;
  type Error = LaneError;

  fn prepare(&mut self, input: &Frame) -> Result<(), Self::Error> {
    if let Some(factor) = self.frame_downscale {
      let size = TargetSize::new(input.width() / factor, input.height() / factor);
      let size = if size.is_enabled() {
        size
      } else {
        TargetSize::DISABLED
      };
      self.set_target_size(size)?;
    }
    Ok(())
  }

  fn process(&self, input: &Frame) -> Result<LaneDetection, LaneError> {
    self.detect(input.image())
  }
}

const LANE_SCHEME: &str = "lane";

fn parse_query<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, LaneError> {
  value.parse().map_err(|_| LaneError::InvalidQuery {
    key: key.to_string(),
    value: value.to_string(),
  })
}

impl FromUrlWithScheme for LaneDetector {
  const SCHEME: &'static str = LANE_SCHEME;
}

impl FromUrl for LaneDetector {
  type Error = LaneError;

  /// 例如 `lane://?canny_low=20&canny_high=70&downscale=2&sharpen&seed=0.5,0.9`
  ///
  /// `sharpen` 与 `kernel=c0,c1,...` 按出现顺序追加到滤波链。
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(LaneError::SchemeMismatch(url.scheme().to_string()));
    }

    let mut detector = LaneDetector::new();
    for (key, value) in url.query_pairs() {
      let (key, value) = (key.as_ref(), value.as_ref());
      match key {
        "blur" => detector.set_blur_kernel(parse_query(key, value)?)?,
        "canny_low" => detector.params.canny.low = parse_query(key, value)?,
        "canny_high" => detector.params.canny.high = parse_query(key, value)?,
        "rho" => detector.set_rho(parse_query(key, value)?)?,
        "theta" => detector.set_theta(parse_query::<f32>(key, value)?.to_radians())?,
        "hough_threshold" => detector.set_hough_threshold(parse_query(key, value)?),
        "min_line_length" => detector.set_min_line_length(parse_query(key, value)?),
        "max_line_gap" => detector.set_max_line_gap(parse_query(key, value)?),
        "thickness" => detector.set_line_thickness(parse_query(key, value)?)?,
        "downscale" => detector = detector.with_frame_downscale(parse_query(key, value)?),
        "sharpen" => detector.add_filter(ConvolutionKernel::sharpen()),
        "kernel" => {
          let coefficients = value
            .split(',')
            .map(|c| parse_query::<f32>(key, c.trim()))
            .collect::<Result<Vec<_>, _>>()?;
          detector.add_filter(ConvolutionKernel::try_from(coefficients)?);
        }
        "seed" => {
          let (x, y) = value.split_once(',').ok_or_else(|| LaneError::InvalidQuery {
            key: key.to_string(),
            value: value.to_string(),
          })?;
          detector.add_seed(SeedPoint::new(parse_query(key, x)?, parse_query(key, y)?)?);
        }
        "approximation" => {
          detector.set_chain_approximation(match value {
            "none" => contour::ChainApproximation::None,
            "simple" => contour::ChainApproximation::Simple,
            _ => {
              return Err(LaneError::InvalidQuery {
                key: key.to_string(),
                value: value.to_string(),
              });
            }
          });
        }
        _ => {
          return Err(LaneError::InvalidQuery {
            key: key.to_string(),
            value: value.to_string(),
          });
        }
      }
    }

    Ok(detector)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn striped_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
      if (x / 16) % 2 == 0 {
        Rgb([255, 255, 255])
      } else {
        Rgb([0, 0, 0])
      }
    })
  }

  #[test]
  fn preprocess_keeps_size_without_resize() {
    let detector = LaneDetector::new();
    let frame = striped_frame(97, 61);
    assert_eq!(detector.preprocess(&frame).map(|g| g.dimensions()).ok(), Some((97, 61)));
    assert_eq!(detector.edge_map(&frame).map(|g| g.dimensions()).ok(), Some((97, 61)));
  }

  #[test]
  fn preprocess_resizes_to_target() {
    let mut detector = LaneDetector::new();
    detector
      .set_target_size(TargetSize::new(40, 30))
      .expect("valid target");
    let frame = striped_frame(80, 60);
    assert_eq!(detector.preprocess(&frame).map(|g| g.dimensions()).ok(), Some((40, 30)));
  }

  #[test]
  fn empty_frame_is_rejected() {
    let detector = LaneDetector::new();
    assert!(matches!(
      detector.detect(&RgbImage::new(0, 0)),
      Err(LaneError::EmptyFrame)
    ));
  }

  #[test]
  fn half_disabled_target_is_rejected() {
    let mut detector = LaneDetector::new();
    assert!(detector.set_target_size(TargetSize::new(0, 10)).is_err());
    assert_eq!(detector.target_size(), TargetSize::DISABLED);
  }

  #[test]
  fn prepare_recomputes_target_from_frame() {
    let mut detector = LaneDetector::new().with_frame_downscale(2);
    let frame = Frame::new(0, striped_frame(64, 48));
    detector.prepare(&frame).expect("prepare");
    assert_eq!(detector.target_size(), TargetSize::new(32, 24));

    let tiny = Frame::new(1, striped_frame(1, 1));
    detector.prepare(&tiny).expect("prepare");
    assert_eq!(detector.target_size(), TargetSize::DISABLED);
  }

  #[test]
  fn scale_is_inverse_of_downscale() {
    let mut detector = LaneDetector::new();
    detector
      .set_target_size(TargetSize::new(32, 24))
      .expect("valid target");
    let detection = detector.detect(&striped_frame(64, 48)).expect("detect");
    assert_eq!(detection.scale, (2.0, 2.0));
    assert_eq!(detection.road.dimensions(), (32, 24));
    assert_eq!(detection.annotated.dimensions(), (64, 48));
  }

  #[test]
  fn from_url_reads_query() {
    let url = Url::parse("lane://?canny_low=30&canny_high=90&max_line_gap=7&sharpen&downscale=2")
      .expect("url");
    let detector = LaneDetector::from_url(&url).expect("detector");
    assert_eq!(detector.params().canny, CannyThresholds { low: 30, high: 90 });
    assert_eq!(detector.params().hough.max_line_gap, 7);
    assert_eq!(detector.params().filters.len(), 1);
    assert_eq!(detector.frame_downscale(), Some(2));
  }

  #[test]
  fn from_url_registers_kernels_in_order() {
    let url = Url::parse("lane://?kernel=0,0,0,0,1,0,0,0,0&sharpen").expect("url");
    let detector = LaneDetector::from_url(&url).expect("detector");
    let kernels: Vec<&[f32]> = detector
      .params()
      .filters
      .iter()
      .map(|k| k.coefficients())
      .collect();
    assert_eq!(kernels.len(), 2);
    assert_eq!(kernels[0], &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0][..]);
    assert_eq!(kernels[1], ConvolutionKernel::sharpen().coefficients());
  }

  #[test]
  fn from_url_rejects_non_square_kernel() {
    let url = Url::parse("lane://?kernel=1,2,3").expect("url");
    assert!(matches!(
      LaneDetector::from_url(&url),
      Err(LaneError::Filter(FilterError::NotSquare { len: 3 }))
    ));
    let garbage = Url::parse("lane://?kernel=1,x,3,4").expect("url");
    assert!(matches!(
      LaneDetector::from_url(&garbage),
      Err(LaneError::InvalidQuery { .. })
    ));
  }

  #[test]
  fn from_url_rejects_unknown_scheme_and_keys() {
    let wrong = Url::parse("camera://0").expect("url");
    assert!(matches!(
      LaneDetector::from_url(&wrong),
      Err(LaneError::SchemeMismatch(_))
    ));
    let unknown = Url::parse("lane://?colour=red").expect("url");
    assert!(matches!(
      LaneDetector::from_url(&unknown),
      Err(LaneError::InvalidQuery { .. })
    ));
  }
}
