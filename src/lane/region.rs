// 该文件是 Daolu （道路） 项目的一部分。
// src/lane/region.rs - 漫水填充生成车道区域掩码
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
use imageproc::drawing::flood_fill_mut;
use tracing::{debug, warn};

use crate::lane::morphology::{StructuringElement, close};

/// 背景值
pub const BACKGROUND: u8 = 0;
/// 车道区域值
pub const FOREGROUND: u8 = 255;
/// 填充过程中的中间标记值，二值化时转为 [`FOREGROUND`]
pub const FILL_MARKER: u8 = 100;

const _: () = assert!(FILL_MARKER != BACKGROUND && FILL_MARKER != FOREGROUND);

/// 区域掩码闭运算用的固定结构元素
pub fn region_close_element() -> StructuringElement {
  StructuringElement::rect(12, 12)
}

fn count_value(image: &GrayImage, value: u8) -> usize {
  image.pixels().filter(|p| p[0] == value).count()
}

/// 四连通漫水填充
///
/// 从种子点开始，把与之连通的背景像素改为 `value`，遇到任何非背景像素即停止。
/// 种子点越界、不在背景上或 `value` 等于背景值时不做任何事。返回填充的像素数。
pub fn flood_fill(image: &mut GrayImage, seed: (u32, u32), value: u8) -> usize {
  let (width, height) = image.dimensions();
  if value == BACKGROUND || seed.0 >= width || seed.1 >= height {
    return 0;
  }
  if image.get_pixel(seed.0, seed.1)[0] != BACKGROUND {
    return 0;
  }

  let before = count_value(image, value);
  flood_fill_mut(image, seed.0, seed.1, Luma([value]));
  count_value(image, value) - before
}

/// 标记值转为前景，其余全部转为背景
pub fn binarize_marker(image: &mut GrayImage, marker: u8) {
  for pixel in image.pixels_mut() {
    pixel[0] = if pixel[0] == marker {
      FOREGROUND
    } else {
      BACKGROUND
    };
  }
}

/// 由线段屏障图生成车道区域掩码：逐个种子漫水填充、二值化、闭运算
pub fn grow_region(mut barrier: GrayImage, seeds: &[(u32, u32)]) -> GrayImage {
  let (width, height) = barrier.dimensions();
  for &seed in seeds {
    if seed.0 >= width || seed.1 >= height {
      warn!("种子点 {:?} 超出帧范围 {}x{}，跳过", seed, width, height);
      continue;
    }
    let filled = flood_fill(&mut barrier, seed, FILL_MARKER);
    debug!("种子点 {:?} 填充 {} 个像素", seed, filled);
  }

  binarize_marker(&mut barrier, FILL_MARKER);
  close(&barrier, &region_close_element())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rectangle_barrier() -> GrayImage {
    let mut barrier = GrayImage::new(100, 80);
    for x in 20..=79 {
      barrier.put_pixel(x, 20, Luma([255]));
      barrier.put_pixel(x, 59, Luma([255]));
    }
    for y in 20..=59 {
      barrier.put_pixel(20, y, Luma([255]));
      barrier.put_pixel(79, y, Luma([255]));
    }
    barrier
  }

  #[test]
  fn fill_marker_is_not_a_terminal_value() {
    assert_ne!(FILL_MARKER, BACKGROUND);
    assert_ne!(FILL_MARKER, FOREGROUND);
  }

  #[test]
  fn flood_fill_stops_at_barrier() {
    let mut image = rectangle_barrier();
    let filled = flood_fill(&mut image, (50, 40), FILL_MARKER);
    assert_eq!(filled, 58 * 38);
    assert_eq!(image.get_pixel(21, 21)[0], FILL_MARKER);
    assert_eq!(image.get_pixel(20, 21)[0], 255);
    assert_eq!(image.get_pixel(5, 5)[0], BACKGROUND);
  }

  #[test]
  fn flood_fill_is_four_connected() {
    // 对角相接的两个像素不连通
    let mut image = GrayImage::from_pixel(3, 3, Luma([255]));
    image.put_pixel(0, 0, Luma([0]));
    image.put_pixel(1, 1, Luma([0]));
    assert_eq!(flood_fill(&mut image, (1, 1), FILL_MARKER), 1);
    assert_eq!(image.get_pixel(0, 0)[0], 0);
  }

  #[test]
  fn second_fill_counts_only_its_own_pixels() {
    let mut image = rectangle_barrier();
    let inside = flood_fill(&mut image, (50, 40), FILL_MARKER);
    let outside = flood_fill(&mut image, (2, 2), FILL_MARKER);
    assert_eq!(inside, 58 * 38);
    assert_eq!(outside, 100 * 80 - 60 * 40);
    assert_eq!(flood_fill(&mut image, (50, 40), FILL_MARKER), 0);
  }

  #[test]
  fn seed_on_barrier_is_noop() {
    let mut image = rectangle_barrier();
    let before = image.clone();
    assert_eq!(flood_fill(&mut image, (20, 40), FILL_MARKER), 0);
    assert_eq!(image, before);
  }

  #[test]
  fn mask_is_exact_rectangle_interior() {
    let mask = grow_region(rectangle_barrier(), &[(50, 40)]);
    for (x, y, pixel) in mask.enumerate_pixels() {
      let inside = (21..=78).contains(&x) && (21..=58).contains(&y);
      let expected = if inside { FOREGROUND } else { BACKGROUND };
      assert_eq!(pixel[0], expected, "({x}, {y})");
    }
  }

  #[test]
  fn mask_is_binary() {
    let mut barrier = rectangle_barrier();
    barrier.put_pixel(5, 5, Luma([FILL_MARKER - 1]));
    barrier.put_pixel(6, 6, Luma([37]));
    let mask = grow_region(barrier, &[(50, 40), (2, 2)]);
    assert!(mask.pixels().all(|p| p[0] == BACKGROUND || p[0] == FOREGROUND));
  }

  #[test]
  fn compounding_seeds_share_marker() {
    let once = grow_region(rectangle_barrier(), &[(50, 40)]);
    let twice = grow_region(rectangle_barrier(), &[(50, 40), (30, 30)]);
    assert_eq!(once, twice);
  }

  #[test]
  fn out_of_range_seed_is_skipped() {
    let mask = grow_region(rectangle_barrier(), &[(500, 400)]);
    assert!(mask.pixels().all(|p| p[0] == BACKGROUND));
  }
}
