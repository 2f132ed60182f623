// 该文件是 Daolu （道路） 项目的一部分。
// src/lane/filter.rs - 线性卷积滤波链
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

use image::{GrayImage, Luma};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
  #[error("卷积核为空")]
  Empty,
  #[error("卷积核长度 {len} 不是完全平方数")]
  NotSquare { len: usize },
}

/// 线性滤波能力：输入灰度图，输出同位深的灰度图
pub trait LinearFilter {
  fn apply(&self, image: &GrayImage) -> GrayImage;
}

impl<F: LinearFilter + ?Sized> LinearFilter for Box<F> {
  fn apply(&self, image: &GrayImage) -> GrayImage {
    (**self).apply(image)
  }
}

/// 方形卷积核，系数按行优先排列
#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionKernel {
  size: usize,
  coefficients: Box<[f32]>,
}

impl ConvolutionKernel {
  pub fn new(coefficients: Vec<f32>) -> Result<Self, FilterError> {
    if coefficients.is_empty() {
      return Err(FilterError::Empty);
    }

    let len = coefficients.len();
    let size = (len as f64).sqrt().round() as usize;
    if size * size != len {
      return Err(FilterError::NotSquare { len });
    }

    Ok(Self {
      size,
      coefficients: coefficients.into_boxed_slice(),
    })
  }

  /// 3x3 锐化核：中心 2.0，八邻域 -0.1
  pub fn sharpen() -> Self {
    Self {
      size: 3,
      coefficients: Box::new([-0.1, -0.1, -0.1, -0.1, 2.0, -0.1, -0.1, -0.1, -0.1]),
    }
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn coefficients(&self) -> &[f32] {
    &self.coefficients
  }
}

impl TryFrom<Vec<f32>> for ConvolutionKernel {
  type Error = FilterError;

  fn try_from(coefficients: Vec<f32>) -> Result<Self, Self::Error> {
    Self::new(coefficients)
  }
}

// 反射边界（不重复边缘像素）：-1 -> 1, n -> n - 2
fn reflect_101(mut i: i64, n: i64) -> usize {
  if n == 1 {
    return 0;
  }
  loop {
    if i < 0 {
      i = -i;
    } else if i >= n {
      i = 2 * n - 2 - i;
    } else {
      return i as usize;
    }
  }
}

impl LinearFilter for ConvolutionKernel {
  /// 相关运算，锚点在核中心，结果四舍五入后饱和到 `u8`
  fn apply(&self, image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as i64, height as i64);
    let anchor = (self.size / 2) as i64;
    let src = image.as_raw();

    GrayImage::from_fn(width, height, |x, y| {
      let mut acc = 0.0f32;
      for ky in 0..self.size {
        let sy = reflect_101(y as i64 + ky as i64 - anchor, h);
        let row = &src[sy * width as usize..(sy + 1) * width as usize];
        for kx in 0..self.size {
          let sx = reflect_101(x as i64 + kx as i64 - anchor, w);
          acc += self.coefficients[ky * self.size + kx] * row[sx] as f32;
        }
      }
      Luma([acc.round_ties_even().clamp(0.0, 255.0) as u8])
    })
  }
}

/// 按注册顺序串联的滤波链，每个滤波器作用于上一个的输出
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain<F = ConvolutionKernel> {
  filters: Vec<F>,
}

impl<F> Default for FilterChain<F> {
  fn default() -> Self {
    Self {
      filters: Vec::new(),
    }
  }
}

impl<F: LinearFilter> FilterChain<F> {
  pub fn push(&mut self, filter: F) {
    self.filters.push(filter);
  }

  pub fn len(&self) -> usize {
    self.filters.len()
  }

  pub fn is_empty(&self) -> bool {
    self.filters.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &F> {
    self.filters.iter()
  }

  pub fn apply(&self, image: GrayImage) -> GrayImage {
    self
      .filters
      .iter()
      .fold(image, |frame, filter| filter.apply(&frame))
  }
}
