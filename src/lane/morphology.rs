// 该文件是 Daolu （道路） 项目的一部分。
// src/lane/morphology.rs - 形态学结构元素与膨胀/腐蚀/闭运算
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
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};

/// 结构元素形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementShape {
  /// 实心矩形
  Rect,
  /// 内切椭圆
  Ellipse,
}

/// 锚点需能放进 `Mask` 的 u8 坐标
pub const MAX_ELEMENT_SIZE: u32 = 255;

/// 形态学结构元素
///
/// 锚点固定在 `(width / 2, height / 2)`，偶数尺寸的元素锚点偏向右下。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
  width: u32,
  height: u32,
  cells: Vec<bool>,
}

impl StructuringElement {
  /// 按形状和尺寸生成结构元素
  pub fn new(shape: ElementShape, width: u32, height: u32) -> Self {
    let (w, h) = (width as i64, height as i64);
    let mut cells = vec![false; (width as usize) * (height as usize)];

    let r = h / 2;
    let c = w / 2;
    let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

    for i in 0..h {
      let (j1, j2) = match shape {
        ElementShape::Rect => (0, w),
        ElementShape::Ellipse => {
          let dy = i - r;
          if dy.abs() <= r {
            let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i64;
            ((c - dx).max(0), (c + dx + 1).min(w))
          } else {
            (0, 0)
          }
        }
      };
      for j in j1..j2 {
        cells[(i * w + j) as usize] = true;
      }
    }

    Self {
      width,
      height,
      cells,
    }
  }

  pub fn rect(width: u32, height: u32) -> Self {
    Self::new(ElementShape::Rect, width, height)
  }

  pub fn ellipse(width: u32, height: u32) -> Self {
    Self::new(ElementShape::Ellipse, width, height)
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn anchor(&self) -> (u32, u32) {
    (self.width / 2, self.height / 2)
  }

  pub fn contains(&self, x: u32, y: u32) -> bool {
    x < self.width && y < self.height && self.cells[(y * self.width + x) as usize]
  }

  /// 元素中没有任何有效单元
  pub fn is_empty(&self) -> bool {
    !self.cells.iter().any(|&c| c)
  }

  /// 尺寸能否转换为 [`Mask`]
  pub fn fits_mask(&self) -> bool {
    self.width <= MAX_ELEMENT_SIZE && self.height <= MAX_ELEMENT_SIZE
  }

  /// 腐蚀用的掩码
  pub fn mask(&self) -> Mask {
    let (ax, ay) = self.anchor();
    let image = GrayImage::from_fn(self.width, self.height, |x, y| {
      Luma([if self.contains(x, y) { 255 } else { 0 }])
    });
    Mask::from_image(&image, ax as u8, ay as u8)
  }

  /// 膨胀用的掩码：元素旋转 180°，锚点随之镜像
  pub fn reflected_mask(&self) -> Mask {
    let (ax, ay) = self.anchor();
    let (w, h) = (self.width, self.height);
    let image = GrayImage::from_fn(w, h, |x, y| {
      Luma([if self.contains(w - 1 - x, h - 1 - y) { 255 } else { 0 }])
    });
    Mask::from_image(&image, (w - 1 - ax) as u8, (h - 1 - ay) as u8)
  }

  fn usable(&self) -> bool {
    !self.is_empty() && self.fits_mask()
  }
}

/// 灰度膨胀：输出取反射元素覆盖范围内的最大值，越界像素忽略
pub fn dilate(image: &GrayImage, element: &StructuringElement) -> GrayImage {
  if !element.usable() {
    return image.clone();
  }
  grayscale_dilate(image, &element.reflected_mask())
}

/// 灰度腐蚀：输出取元素覆盖范围内的最小值，越界像素忽略
pub fn erode(image: &GrayImage, element: &StructuringElement) -> GrayImage {
  if !element.usable() {
    return image.clone();
  }
  grayscale_erode(image, &element.mask())
}

/// 闭运算：先膨胀后腐蚀，填补小于元素的孔洞与缝隙
///
/// 膨胀与腐蚀分别使用反射前后的元素，偶数尺寸的元素也不会让图形整体平移。
pub fn close(image: &GrayImage, element: &StructuringElement) -> GrayImage {
  erode(&dilate(image, element), element)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rect_element_is_full() {
    let element = StructuringElement::rect(4, 4);
    assert_eq!(element.anchor(), (2, 2));
    assert!((0..4).all(|y| (0..4).all(|x| element.contains(x, y))));
  }

  #[test]
  fn ellipse_element_drops_corners() {
    let element = StructuringElement::ellipse(4, 4);
    assert!(!element.contains(0, 0));
    assert!(element.contains(2, 2));
    assert!(element.contains(0, 2));
    assert!(!element.is_empty());
  }

  #[test]
  fn reflected_mask_mirrors_even_element() {
    // 4x4 矩形锚点为 (2, 2)，单点膨胀后覆盖 x-2..=x+1
    let mut image = GrayImage::new(9, 9);
    image.put_pixel(4, 4, Luma([255]));
    let out = dilate(&image, &StructuringElement::rect(4, 4));
    for y in 0..9 {
      for x in 0..9 {
        let inside = (2..=5).contains(&x) && (2..=5).contains(&y);
        assert_eq!(out.get_pixel(x, y)[0] == 255, inside, "({x}, {y})");
      }
    }
    let back = erode(&out, &StructuringElement::rect(4, 4));
    assert_eq!(back, image);
  }

  #[test]
  fn oversized_element_is_not_mask_compatible() {
    assert!(StructuringElement::rect(12, 12).fits_mask());
    assert!(!StructuringElement::rect(300, 3).fits_mask());
  }

  #[test]
  fn dilate_grows_single_pixel_to_element() {
    let mut image = GrayImage::new(9, 9);
    image.put_pixel(4, 4, Luma([255]));
    let out = dilate(&image, &StructuringElement::rect(3, 3));
    for y in 0..9 {
      for x in 0..9 {
        let inside = (3..=5).contains(&x) && (3..=5).contains(&y);
        assert_eq!(out.get_pixel(x, y)[0] == 255, inside, "({x}, {y})");
      }
    }
  }

  #[test]
  fn close_keeps_rectangle_with_even_element() {
    let mut image = GrayImage::new(100, 80);
    for y in 21..=58 {
      for x in 21..=78 {
        image.put_pixel(x, y, Luma([255]));
      }
    }
    let out = close(&image, &StructuringElement::rect(12, 12));
    assert_eq!(out, image);
  }

  #[test]
  fn close_fills_small_gap() {
    let mut image = GrayImage::new(20, 5);
    for x in 0..20 {
      if x != 10 {
        image.put_pixel(x, 2, Luma([255]));
      }
    }
    let out = close(&image, &StructuringElement::rect(3, 3));
    assert_eq!(out.get_pixel(10, 2)[0], 255);
  }
}
